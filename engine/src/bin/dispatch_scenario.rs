// Replays an incident scenario against a session and reports every step as JSON.
// Usage: dispatch_scenario [scenario.json]
//
// A scenario is a JSON array of events, for example
// [{ "report": { "location": "Station2", "severity": 3, "category": "fire" } }, { "fail": "Station4" }]
// Without a scenario file a small built-in scenario is replayed.

#[macro_use]
extern crate emergency_net;
use emergency_net::{config::SessionConfig, report::*, IncidentReport, Session, SessionError};
use serde::{Deserialize, Serialize};
use std::{env, error::Error, fs::File, io::BufReader};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Event {
    Report(IncidentReport),
    Batch(Vec<IncidentReport>),
    Fail(String),
    Restore(String),
    RestoreAll,
    AttendNext(String),
    Route { from: String, to: String },
}

fn builtin_scenario() -> Vec<Event> {
    vec![
        Event::Report(IncidentReport::new("Station2", 4, "fire", "warehouse fire")),
        Event::Report(IncidentReport::new("Harbor", 2, "flood", "pier flooded")),
        Event::Fail("Station4".to_string()),
        Event::Batch(vec![
            IncidentReport::new("Station6", 3, "traffic accident", "two cars"),
            IncidentReport::new("Market", 1, "disturbance", "noise"),
        ]),
        Event::Route {
            from: "Station1".to_string(),
            to: "Station6".to_string(),
        },
        Event::AttendNext("Station3".to_string()),
        Event::RestoreAll,
    ]
}

fn report_outcome<T: Serialize>(outcome: Result<T, SessionError>) {
    match outcome {
        Ok(result) => report!("result", result),
        Err(err) => report!("error", err.to_string()),
    }
}

// A failing event is reported and the replay continues with the next one.
fn replay(session: &mut Session, events: Vec<Event>) {
    let mut events_ctxt = push_collection_context("events".to_string());
    for event in events {
        let _event_ctxt = events_ctxt.push_collection_item();
        report!("event", format!("{:?}", event));

        match event {
            Event::Report(incident) => report_outcome(session.report_incident(&incident)),
            Event::Batch(incidents) => {
                let results: Vec<String> = session
                    .report_incidents(&incidents)
                    .into_iter()
                    .map(|result| result.map_or_else(|err| err.to_string(), |id| id.to_string()))
                    .collect();
                report!("result", results);
            }
            Event::Fail(station) => report_outcome(session.fail_station(&station)),
            Event::Restore(station) => report_outcome(session.restore_station(&station)),
            Event::RestoreAll => report!("result", session.restore_all()),
            Event::AttendNext(station) => report_outcome(session.attend_next_for_station(&station)),
            Event::Route { from, to } => report_outcome(session.shortest_route(&from, &to)),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let _reporter = enable_reporting("dispatch_scenario");

    let events: Vec<Event> = match env::args().nth(1) {
        Some(path) => {
            report!("scenario", path);
            serde_json::from_reader(BufReader::new(File::open(path)?))?
        }
        None => builtin_scenario(),
    };

    let config = SessionConfig::from_env()?;
    report!("config", config);
    let mut session = Session::from_config(&config)?;

    replay(&mut session, events);

    report!("notifications", session.notifications());
    report!("stats", session.network_stats());
    report!("export", session.export(None));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use emergency_net::datastr::network::Network;

    #[test]
    fn unknown_stations_do_not_stop_the_replay() {
        let mut session = Session::new(Network::default_topology(), &SessionConfig::default());
        let events = vec![
            Event::Fail("Nowhere".to_string()),
            Event::Restore("Nowhere".to_string()),
            Event::AttendNext("Nowhere".to_string()),
            Event::Route {
                from: "Nowhere".to_string(),
                to: "Station1".to_string(),
            },
            Event::Report(IncidentReport::new("Station2", 4, "fire", "")),
            Event::Fail("Station5".to_string()),
        ];

        replay(&mut session, events);

        assert_eq!(session.incidents().all().len(), 1);
        assert_eq!(session.station_status("Station5"), Ok(emergency_net::availability::StationStatus::Unavailable));
    }
}
