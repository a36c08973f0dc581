//! The simulation session.
//!
//! A `Session` owns the network, the availability state, the dispatcher and all incidents.
//! Every operation of the simulation goes through it.
//!
//! Reporting an incident places it at the nearest operational station other than its location,
//! dispatches resources and then takes the location station out of service.
//! Pending incidents owned by a station that leaves service are placed again.

use crate::{
    algo::{
        alternatives::alternative_routes,
        dijkstra::{nearest_neighbor::closest_candidate, DijkstraNearestNeighbor, Server},
        Query, Route,
    },
    availability::{AvailabilityTracker, StationStatus},
    config::{ConfigError, SessionConfig},
    datastr::{
        graph::*,
        network::{Network, StationLinks},
        view::NetworkView,
    },
    dispatch::{Assignment, Category, Dispatcher, ResourcePools},
    export::NetworkExport,
    incident::{AttendError, Incident, IncidentId, IncidentLog, IncidentStats},
};
use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no such station: {0}")]
    UnknownStation(String),
    #[error("station {0} is out of service")]
    StationOutOfService(String),
    #[error("no such incident: {0}")]
    UnknownIncident(IncidentId),
    #[error("incident {0} was already attended")]
    AlreadyAttended(IncidentId),
}

impl From<AttendError> for SessionError {
    fn from(err: AttendError) -> Self {
        match err {
            AttendError::Unknown(id) => SessionError::UnknownIncident(id),
            AttendError::AlreadyAttended(id) => SessionError::AlreadyAttended(id),
        }
    }
}

/// An incident as reported by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentReport {
    pub location: String,
    pub severity: u32,
    pub category: String,
    #[serde(default)]
    pub description: String,
}

impl IncidentReport {
    pub fn new(location: &str, severity: u32, category: &str, description: &str) -> Self {
        Self {
            location: location.to_string(),
            severity,
            category: category.to_string(),
            description: description.to_string(),
        }
    }
}

/// A pending incident that moved to another station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub incident: IncidentId,
    pub from: String,
    /// `None` if no operational station is reachable anymore
    pub to: Option<String>,
    pub distance: Option<Weight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub unavailable: Vec<String>,
    pub incidents: IncidentStats,
    pub incidents_by_category: BTreeMap<String, usize>,
    /// how often each station was assigned an incident or sent a unit
    pub station_load: BTreeMap<String, usize>,
}

// Everything needed to commit one incident, computed against a fixed unavailable set.
#[derive(Debug, Clone)]
struct Plan {
    id: IncidentId,
    category: Category,
    location_station: Option<NodeId>,
    owner: Option<(NodeId, Weight)>,
    assignment: Assignment,
    // network stations the plan's routes and choices depend on
    touched: BTreeSet<NodeId>,
}

impl Plan {
    fn depends_on_any(&self, stations: &BTreeSet<NodeId>) -> bool {
        self.touched.iter().any(|station| stations.contains(station))
    }
}

#[derive(Debug)]
pub struct Session {
    network: Network,
    tracker: AvailabilityTracker,
    dispatcher: Dispatcher,
    incidents: IncidentLog,
    notifications: Vec<String>,
    station_load: Vec<usize>,
}

impl Session {
    pub fn new(network: Network, config: &SessionConfig) -> Self {
        Self::with_pools(network, ResourcePools::default_pools(), config)
    }

    pub fn with_pools(network: Network, pools: ResourcePools, config: &SessionConfig) -> Self {
        let station_load = vec![0; network.num_stations()];
        Session {
            dispatcher: Dispatcher::new(pools, config.eta, config.seed, config.graft_weight_min..=config.graft_weight_max),
            network,
            tracker: AvailabilityTracker::new(),
            incidents: IncidentLog::new(),
            notifications: Vec::new(),
            station_load,
        }
    }

    /// Load topology and pools as configured.
    pub fn from_config(config: &SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pools = config.load_pools()?;
        let (network, _) = config.load_network();
        Ok(Self::with_pools(network, pools, config))
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn tracker(&self) -> &AvailabilityTracker {
        &self.tracker
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn incidents(&self) -> &IncidentLog {
        &self.incidents
    }

    pub fn incident(&self, id: IncidentId) -> Result<&Incident, SessionError> {
        self.incidents.get(id).ok_or(SessionError::UnknownIncident(id))
    }

    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    fn notify(&mut self, message: String) {
        if !self.notifications.contains(&message) {
            self.notifications.push(message);
        }
    }

    fn station(&self, name: &str) -> Result<NodeId, SessionError> {
        self.network.station_id(name).ok_or_else(|| SessionError::UnknownStation(name.to_string()))
    }

    pub fn station_status(&self, name: &str) -> Result<StationStatus, SessionError> {
        Ok(self.tracker.status(self.station(name)?))
    }

    pub fn current_view(&self) -> NetworkView<'_> {
        self.tracker.current_view(&self.network)
    }

    pub fn report_incident(&mut self, report: &IncidentReport) -> Result<&Incident, SessionError> {
        let plan = self.plan(self.incidents.next_id(), report, self.tracker.unavailable())?;
        let id = self.commit(plan, report);
        self.incident(id)
    }

    /// Report several incidents at once.
    /// Planning runs in parallel against the current state, committing happens in order.
    /// Plans invalidated by an earlier commit of the batch are redone, so the outcome
    /// equals reporting the incidents one by one.
    pub fn report_incidents(&mut self, reports: &[IncidentReport]) -> Vec<Result<IncidentId, SessionError>> {
        let _ctx = crate::report::push_context("batch".to_string());
        report!("num_incidents", reports.len());

        let first_id = self.incidents.next_id().0;
        let snapshot = self.tracker.snapshot();
        let plans: Vec<Result<Plan, SessionError>> = {
            let session = &*self;
            reports
                .par_iter()
                .enumerate()
                .map(|(index, report)| session.plan(IncidentId(first_id + index as u32), report, &snapshot))
                .collect()
        };

        let mut results = Vec::with_capacity(reports.len());
        let mut num_replanned = 0;
        for (plan, report) in plans.into_iter().zip(reports) {
            let next_id = self.incidents.next_id();
            let gone: BTreeSet<NodeId> = self.tracker.unavailable().difference(&snapshot).copied().collect();
            let plan = match plan {
                Ok(plan) if plan.id == next_id && !plan.depends_on_any(&gone) => Ok(plan),
                Err(err) if gone.is_empty() => Err(err),
                _ => {
                    num_replanned += 1;
                    self.plan(next_id, report, self.tracker.unavailable())
                }
            };
            results.push(plan.map(|plan| self.commit(plan, report)));
        }

        report!("num_replanned", num_replanned);
        results
    }

    fn plan(&self, id: IncidentId, report: &IncidentReport, unavailable: &BTreeSet<NodeId>) -> Result<Plan, SessionError> {
        let category = Category::parse(&report.category);
        let location_station = self.network.station_id(&report.location);
        if let Some(station) = location_station {
            if unavailable.contains(&station) {
                return Err(SessionError::StationOutOfService(report.location.clone()));
            }
        }

        let mut view = self.network.filtered_view(unavailable);
        let location = self.dispatcher.locate(&mut view, &report.location, id);
        let tree = view.shortest_paths(location, None);

        let candidates: Vec<NodeId> = view.operational_stations().filter(|&station| station != location).collect();
        let owner = closest_candidate(&tree, &candidates);
        let assignment = self.dispatcher.dispatch(&view, location, id, category.required_kinds());

        let mut touched: BTreeSet<NodeId> = location_station.into_iter().collect();
        if let Some((_, station)) = owner {
            touched.extend(tree.path(station).into_iter().filter(|&node| !view.is_grafted(node)));
        }
        for dispatch in assignment.dispatches.values() {
            touched.extend(dispatch.route.iter().filter_map(|label| self.network.station_id(label)));
        }

        Ok(Plan {
            id,
            category,
            location_station,
            owner: owner.map(|(distance, station)| (station, distance)),
            assignment,
            touched,
        })
    }

    fn commit(&mut self, plan: Plan, report: &IncidentReport) -> IncidentId {
        let owner_name = plan.owner.map(|(station, _)| self.network.station_name(station).to_string());
        let incident = Incident {
            id: plan.id,
            location: report.location.clone(),
            severity: report.severity,
            category: plan.category,
            description: report.description.clone(),
            reported_at: Utc::now(),
            attended_at: None,
            assigned_station: owner_name.clone(),
            station_distance: plan.owner.map(|(_, distance)| distance),
            assignment: plan.assignment,
        };

        if let Some((station, _)) = plan.owner {
            self.station_load[station as usize] += 1;
        }
        for dispatch in incident.assignment.dispatches.values() {
            if let Some(station) = self.network.station_id(&dispatch.station) {
                self.station_load[station as usize] += 1;
            }
        }

        let message = match (&owner_name, plan.owner) {
            (Some(owner), Some((_, distance))) => format!(
                "{} {} (severity {}) at {} assigned to {} at distance {}",
                incident.id, incident.category, incident.severity, incident.location, owner, distance
            ),
            _ => format!(
                "{} {} (severity {}) at {}: no operational station reachable",
                incident.id, incident.category, incident.severity, incident.location
            ),
        };

        report!("incident", {
            "id": incident.id.to_string(),
            "location": incident.location,
            "category": incident.category,
            "assigned_station": incident.assigned_station,
            "outcome": incident.assignment.outcome()
        });

        let id = self.incidents.push(incident);

        if let Some(station) = plan.location_station {
            if self.tracker.mark_unavailable(station) {
                self.replace_pending_owned_by(station);
            }
        }
        self.notify(message);

        id
    }

    /// Place every pending incident owned by `station` at the nearest remaining station.
    fn replace_pending_owned_by(&mut self, station: NodeId) -> Vec<Replacement> {
        let name = self.network.station_name(station).to_string();
        let owned: Vec<IncidentId> = self.incidents.pending_for_station(&name).iter().map(|incident| incident.id).collect();

        let mut replacements = Vec::with_capacity(owned.len());
        for id in owned {
            let location = match self.incidents.get(id) {
                Some(incident) => incident.location.clone(),
                None => continue,
            };
            let placed = self.nearest_station_for(id, &location);

            if let Some(incident) = self.incidents.get_mut(id) {
                incident.assigned_station = placed.as_ref().map(|(name, _)| name.clone());
                incident.station_distance = placed.as_ref().map(|&(_, distance)| distance);
            }
            if let Some((new_owner, _)) = &placed {
                if let Some(new_station) = self.network.station_id(new_owner) {
                    self.station_load[new_station as usize] += 1;
                }
            }

            let replacement = Replacement {
                incident: id,
                from: name.clone(),
                to: placed.as_ref().map(|(name, _)| name.clone()),
                distance: placed.map(|(_, distance)| distance),
            };
            self.notify(match (&replacement.to, replacement.distance) {
                (Some(to), Some(distance)) => format!("{} moved from {} to {} at distance {}", id, name, to, distance),
                _ => format!("{} lost its station {}, no operational station reachable", id, name),
            });
            replacements.push(replacement);
        }

        report!("replacements", replacements);
        replacements
    }

    // The location itself stays in the view even when it is out of service,
    // every search starts there and never passes through it again.
    fn nearest_station_for(&self, id: IncidentId, location: &str) -> Option<(String, Weight)> {
        let mut excluded = self.tracker.snapshot();
        let location_station = self.network.station_id(location);
        if let Some(station) = location_station {
            excluded.remove(&station);
        }
        let mut view = self.network.filtered_view(&excluded);
        let source = self.dispatcher.locate(&mut view, location, id);

        let candidates: Vec<NodeId> = view.operational_stations().filter(|&station| station != source).collect();
        DijkstraNearestNeighbor::new(view.graph())
            .query(source, &candidates)
            .map(|(distance, station)| (view.label(station).to_string(), distance))
    }

    /// Take a station out of service and move the pending incidents it owned.
    pub fn fail_station(&mut self, name: &str) -> Result<Vec<Replacement>, SessionError> {
        let station = self.station(name)?;
        if !self.tracker.mark_unavailable(station) {
            return Ok(Vec::new());
        }
        report!("station_failed", name);
        self.notify(format!("{} failed and is out of service", name));
        Ok(self.replace_pending_owned_by(station))
    }

    /// Returns whether the station was out of service.
    pub fn restore_station(&mut self, name: &str) -> Result<bool, SessionError> {
        let station = self.station(name)?;
        let restored = self.tracker.restore(station);
        if restored {
            report!("station_restored", name);
            self.notify(format!("{} is operational again", name));
        }
        Ok(restored)
    }

    pub fn restore_all(&mut self) -> usize {
        let restored = self.tracker.restore_all();
        if restored > 0 {
            self.notify(format!("all {} out of service stations are operational again", restored));
        }
        restored
    }

    /// Mark an incident attended, its location station is back in service.
    pub fn attend(&mut self, id: IncidentId) -> Result<&Incident, SessionError> {
        let location = self.incidents.attend(id, Utc::now())?.location.clone();
        if let Some(station) = self.network.station_id(&location) {
            if self.tracker.restore(station) {
                self.notify(format!("{} attended, {} is operational again", id, location));
            }
        }
        self.incident(id)
    }

    /// Attend the most urgent pending incident owned by `station`.
    pub fn attend_next_for_station(&mut self, station: &str) -> Result<Option<IncidentId>, SessionError> {
        let next = self.pending_for_station(station)?.first().map(|incident| incident.id);
        match next {
            Some(id) => {
                self.attend(id)?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    pub fn pending_for_station(&self, station: &str) -> Result<Vec<&Incident>, SessionError> {
        self.station(station)?;
        Ok(self.incidents.pending_for_station(station))
    }

    /// Shortest route between two stations in the current view.
    /// Out of service endpoints yield an unreachable route.
    pub fn shortest_route(&self, from: &str, to: &str) -> Result<Route, SessionError> {
        let (from, to) = (self.station(from)?, self.station(to)?);
        let view = self.current_view();
        if !view.contains(from) || !view.contains(to) {
            return Ok(Route::unreachable());
        }

        Ok(match Server::new(view.graph()).query(Query { from, to }) {
            Some(result) => Route {
                path: view.labels(result.path()),
                distance: Some(result.distance()),
            },
            None => Route::unreachable(),
        })
    }

    /// Up to `k` routes, each avoiding the arcs of all routes found before.
    pub fn alternative_routes(&self, from: &str, to: &str, k: usize) -> Result<Vec<Route>, SessionError> {
        let (from, to) = (self.station(from)?, self.station(to)?);
        let view = self.current_view();
        if !view.contains(from) || !view.contains(to) {
            return Ok(Vec::new());
        }

        Ok(alternative_routes(view.graph(), from, to, k)
            .into_iter()
            .map(|result| Route {
                path: view.labels(result.path()),
                distance: Some(result.distance()),
            })
            .collect())
    }

    pub fn network_stats(&self) -> NetworkStats {
        NetworkStats {
            node_count: self.network.num_stations(),
            edge_count: self.network.count_edges(),
            unavailable: self.tracker.unavailable().iter().map(|&station| self.network.station_name(station).to_string()).collect(),
            incidents: self.incidents.stats(),
            incidents_by_category: self.incidents.by_category(),
            station_load: self
                .network
                .stations()
                .map(|(id, name)| (name.to_string(), self.station_load[id as usize]))
                .collect(),
        }
    }

    pub fn topology(&self) -> Vec<StationLinks> {
        self.network.topology()
    }

    pub fn export(&self, highlight: Option<&Route>) -> NetworkExport {
        let export = NetworkExport::new(&self.network, &self.tracker);
        match highlight {
            Some(route) => export.highlight(route),
            None => export,
        }
    }
}
