extern crate emergency_net;

use emergency_net::{
    availability::StationStatus,
    config::SessionConfig,
    datastr::network::Network,
    dispatch::{DispatchOutcome, ResourceKind, ResourcePools},
    incident::IncidentId,
    IncidentReport, Session, SessionError,
};
use std::io::Write;

fn default_session() -> Session {
    Session::new(Network::default_topology(), &SessionConfig::default())
}

fn seeded(seed: u64) -> Session {
    let config = SessionConfig {
        seed,
        ..SessionConfig::default()
    };
    Session::new(Network::default_topology(), &config)
}

#[test]
fn fire_goes_to_the_closer_pool_station() {
    //  StationX --12-- Plaza --7-- StationY
    let mut network = Network::new();
    network.add_link("StationX", "Plaza", 12).unwrap();
    network.add_link("Plaza", "StationY", 7).unwrap();
    let mut pools = ResourcePools::new();
    pools.extend(ResourceKind::FireCrew, ["StationX", "StationY"]);

    let mut session = Session::with_pools(network, pools, &SessionConfig::default());
    let incident = session.report_incident(&IncidentReport::new("Plaza", 4, "fire", "kitchen")).unwrap();

    let fire = incident.assignment.get(ResourceKind::FireCrew).unwrap();
    assert_eq!(fire.station, "StationY");
    assert_eq!(fire.distance, 7);
    assert_eq!(fire.eta_minutes, 7);
    assert_eq!(fire.route, vec!["StationY", "Plaza"]);
    assert!(fire.resource_id.starts_with("FIRE"));
    assert_eq!(incident.assigned_station.as_deref(), Some("StationY"));
    assert_eq!(incident.assignment.outcome(), DispatchOutcome::Full);
}

#[test]
fn eta_follows_the_configured_model() {
    let config = SessionConfig::from_lookup(|var| match var {
        "ETA_BASE_MINUTES" => Some("3".to_string()),
        "ETA_MINUTES_PER_UNIT" => Some("2".to_string()),
        _ => None,
    })
    .unwrap();
    let mut session = Session::new(Network::default_topology(), &config);
    let incident = session.report_incident(&IncidentReport::new("Station1", 1, "theft", "")).unwrap();

    // police from Station4, 18 away
    let police = incident.assignment.get(ResourceKind::Police).unwrap();
    assert_eq!(police.distance, 18);
    assert_eq!(police.eta_minutes, 3 + 2 * 18);
}

#[test]
fn unmapped_category_gets_police() {
    let mut session = default_session();
    let incident = session.report_incident(&IncidentReport::new("Station1", 2, "Alien Landing", "")).unwrap();

    assert_eq!(incident.category.name(), "alien_landing");
    let kinds: Vec<ResourceKind> = incident.assignment.dispatches.keys().copied().collect();
    assert_eq!(kinds, vec![ResourceKind::Police]);
    assert_eq!(incident.assignment.get(ResourceKind::Police).unwrap().station, "Station4");
}

#[test]
fn ad_hoc_locations_are_grafted_transiently() {
    let mut session = default_session();
    let incident = session.report_incident(&IncidentReport::new("Harbor", 3, "flood", "pier")).unwrap().clone();

    let distance = incident.station_distance.unwrap();
    assert!((5..=25).contains(&distance));
    assert!(incident.assigned_station.is_some());
    for dispatch in incident.assignment.dispatches.values() {
        assert_eq!(dispatch.route.last().map(String::as_str), Some("Harbor"));
    }

    assert!(!session.network().contains("Harbor"));
    assert_eq!(session.network().num_stations(), 6);
    assert_eq!(session.network().count_edges(), 10);
    assert!(session.tracker().unavailable().is_empty());
}

#[test]
fn dispatch_is_deterministic_for_a_seed() {
    let reports = [
        IncidentReport::new("Harbor", 3, "explosion", ""),
        IncidentReport::new("Station3", 2, "natural disaster", ""),
        IncidentReport::new("Market", 1, "public_health", ""),
    ];

    let mut first = seeded(17);
    let mut second = seeded(17);
    for report in &reports {
        let a = first.report_incident(report).unwrap().clone();
        let b = second.report_incident(report).unwrap().clone();
        assert_eq!(a.assignment, b.assignment);
        assert_eq!(a.assigned_station, b.assigned_station);
        assert_eq!(a.station_distance, b.station_distance);
    }
}

#[test]
fn no_reachable_station_still_records_the_incident() {
    let mut network = Network::default_topology();
    network.add_station("Island");
    let mut session = Session::new(network, &SessionConfig::default());

    let incident = session.report_incident(&IncidentReport::new("Island", 5, "medical", "")).unwrap();
    assert_eq!(incident.assigned_station, None);
    assert_eq!(incident.assignment.outcome(), DispatchOutcome::NoResourceAvailable);
    assert_eq!(incident.assignment.missing, vec![ResourceKind::Ambulance]);
    assert_eq!(session.station_status("Island"), Ok(StationStatus::Unavailable));
    assert_eq!(session.incidents().stats().pending, 1);
}

#[test]
fn batch_equals_sequential() {
    let reports = vec![
        IncidentReport::new("Station2", 4, "fire", ""),
        IncidentReport::new("Harbor", 2, "medical", ""),
        IncidentReport::new("Station2", 1, "theft", ""),
        IncidentReport::new("Station5", 3, "accident", ""),
        IncidentReport::new("Market", 5, "explosion", ""),
        IncidentReport::new("Station4", 2, "flood", ""),
        IncidentReport::new("Station1", 2, "violence", ""),
    ];

    let mut sequential = seeded(3);
    let expected: Vec<Result<IncidentId, SessionError>> =
        reports.iter().map(|report| sequential.report_incident(report).map(|incident| incident.id)).collect();

    let mut batched = seeded(3);
    let results = batched.report_incidents(&reports);

    assert_eq!(results, expected);
    assert_eq!(results[2], Err(SessionError::StationOutOfService("Station2".to_string())));
    assert_eq!(batched.tracker().unavailable(), sequential.tracker().unavailable());
    assert_eq!(batched.notifications(), sequential.notifications());
    assert_eq!(batched.network_stats(), sequential.network_stats());

    let summary = |session: &Session| {
        session
            .incidents()
            .all()
            .iter()
            .map(|i| (i.id, i.location.clone(), i.assigned_station.clone(), i.station_distance, i.assignment.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(summary(&batched), summary(&sequential));
}

#[test]
fn pending_incidents_are_attended_by_urgency() {
    //      A
    //      | 1
    //  B --+-- Hub -- C
    //    1         1
    let mut network = Network::new();
    network.add_link("Hub", "A", 1).unwrap();
    network.add_link("Hub", "B", 1).unwrap();
    network.add_link("Hub", "C", 1).unwrap();
    let mut session = Session::new(network, &SessionConfig::default());

    let minor = session.report_incident(&IncidentReport::new("A", 1, "theft", "")).unwrap().id;
    let major = session.report_incident(&IncidentReport::new("B", 5, "theft", "")).unwrap().id;

    let pending: Vec<IncidentId> = session.pending_for_station("Hub").unwrap().iter().map(|i| i.id).collect();
    assert_eq!(pending, vec![major, minor]);

    assert_eq!(session.attend_next_for_station("Hub"), Ok(Some(major)));
    assert_eq!(session.station_status("B"), Ok(StationStatus::Operational));
    assert_eq!(session.station_status("A"), Ok(StationStatus::Unavailable));
    assert_eq!(session.attend_next_for_station("Hub"), Ok(Some(minor)));
    assert_eq!(session.attend_next_for_station("Hub"), Ok(None));
    assert_eq!(session.incidents().stats().attended, 2);
}

#[test]
fn failures_move_incidents_and_notifications_are_deduplicated() {
    let mut session = default_session();
    let id = session.report_incident(&IncidentReport::new("Station4", 3, "theft", "")).unwrap().id;
    assert_eq!(session.incident(id).unwrap().assigned_station.as_deref(), Some("Station5"));

    session.fail_station("Station5").unwrap();
    assert_eq!(session.incident(id).unwrap().assigned_station.as_deref(), Some("Station2"));
    assert_eq!(session.restore_station("Station5"), Ok(true));
    assert_eq!(session.restore_station("Station5"), Ok(false));

    let count = session.notifications().len();
    session.fail_station("Station3").unwrap();
    session.restore_station("Station3").unwrap();
    session.fail_station("Station3").unwrap();
    session.restore_station("Station3").unwrap();
    assert_eq!(session.notifications().len(), count + 2);

    // losing every other station leaves the incident without owner
    for station in ["Station1", "Station2", "Station3", "Station5", "Station6"] {
        session.fail_station(station).unwrap();
    }
    assert_eq!(session.incident(id).unwrap().assigned_station, None);
    assert_eq!(session.restore_all(), 6);
}

#[test]
fn stats_count_station_load() {
    let mut session = default_session();
    session.report_incident(&IncidentReport::new("Station4", 3, "theft", "")).unwrap();

    let stats = session.network_stats();
    assert_eq!((stats.node_count, stats.edge_count), (6, 10));
    assert_eq!(stats.unavailable, vec!["Station4"]);
    assert_eq!(stats.incidents.total, 1);
    assert_eq!(stats.station_load["Station5"], 1);
    assert_eq!(stats.station_load["Station6"], 1);
    assert_eq!(stats.station_load["Station1"], 0);
    assert_eq!(stats.incidents_by_category.get("theft"), Some(&1));
}

#[test]
fn pools_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "fire_crew Station6").unwrap();
    writeln!(file, "teleporter Station1").unwrap();
    file.flush().unwrap();

    let config = SessionConfig {
        resource_pools_file: Some(file.path().to_path_buf()),
        ..SessionConfig::default()
    };
    let mut session = Session::from_config(&config).unwrap();
    let incident = session.report_incident(&IncidentReport::new("Station1", 3, "environmental", "")).unwrap();

    assert_eq!(incident.assignment.get(ResourceKind::FireCrew).unwrap().distance, 27);
    assert_eq!(incident.assignment.missing, vec![ResourceKind::Environmental]);
    assert_eq!(incident.assignment.outcome(), DispatchOutcome::Partial);
}

#[test]
fn export_marks_availability_and_routes() {
    let mut session = default_session();
    session.fail_station("Station3").unwrap();
    let route = session.shortest_route("Station1", "Station6").unwrap();
    let export = session.export(Some(&route));

    assert_eq!(export.nodes.len(), 6);
    assert!(!export.nodes.iter().find(|n| n.name == "Station3").unwrap().available);
    assert_eq!(export.edges.len(), 10);
    assert_eq!(export.edges.iter().filter(|e| e.highlighted).count(), route.path.len() - 1);
    assert_eq!(export.nodes[0].label, "1");
}
