//! Incidents and the log that keeps them.
//!
//! Incidents are never deleted. Attending one moves it from the pending to the attended partition.

use crate::{
    datastr::graph::Weight,
    dispatch::{Assignment, Category},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

/// Sequential incident number, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IncidentId(pub u32);

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "E{:04}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Incident {
    pub id: IncidentId,
    /// station name or ad hoc location label
    pub location: String,
    pub severity: u32,
    pub category: Category,
    pub description: String,
    pub reported_at: DateTime<Utc>,
    pub attended_at: Option<DateTime<Utc>>,
    /// station owning the incident, `None` if no operational station was reachable
    pub assigned_station: Option<String>,
    pub station_distance: Option<Weight>,
    pub assignment: Assignment,
}

impl Incident {
    pub fn is_attended(&self) -> bool {
        self.attended_at.is_some()
    }

    pub fn assigned_resources(&self) -> Vec<&str> {
        self.assignment.resource_ids()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IncidentStats {
    pub total: usize,
    pub pending: usize,
    pub attended: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendError {
    Unknown(IncidentId),
    AlreadyAttended(IncidentId),
}

#[derive(Debug, Clone, Default)]
pub struct IncidentLog {
    // incident with id `i` lives at index `i - 1`
    incidents: Vec<Incident>,
}

impl IncidentLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> IncidentId {
        IncidentId(self.incidents.len() as u32 + 1)
    }

    /// Appends an incident, its id has to be `next_id()`.
    pub(crate) fn push(&mut self, incident: Incident) -> IncidentId {
        debug_assert_eq!(incident.id, self.next_id());
        let id = incident.id;
        self.incidents.push(incident);
        id
    }

    pub fn get(&self, id: IncidentId) -> Option<&Incident> {
        (id.0 as usize).checked_sub(1).and_then(|index| self.incidents.get(index))
    }

    pub(crate) fn get_mut(&mut self, id: IncidentId) -> Option<&mut Incident> {
        (id.0 as usize).checked_sub(1).and_then(move |index| self.incidents.get_mut(index))
    }

    pub fn all(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn pending(&self) -> impl Iterator<Item = &Incident> + '_ {
        self.incidents.iter().filter(|incident| !incident.is_attended())
    }

    pub fn attended(&self) -> impl Iterator<Item = &Incident> + '_ {
        self.incidents.iter().filter(|incident| incident.is_attended())
    }

    /// Pending incidents owned by `station`, most severe first, then oldest first.
    pub fn pending_for_station(&self, station: &str) -> Vec<&Incident> {
        let mut owned: Vec<&Incident> = self
            .pending()
            .filter(|incident| incident.assigned_station.as_deref() == Some(station))
            .collect();
        owned.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.reported_at.cmp(&b.reported_at)).then(a.id.cmp(&b.id)));
        owned
    }

    pub fn attend(&mut self, id: IncidentId, at: DateTime<Utc>) -> Result<&Incident, AttendError> {
        let incident = self.get_mut(id).ok_or(AttendError::Unknown(id))?;
        if incident.is_attended() {
            return Err(AttendError::AlreadyAttended(id));
        }
        incident.attended_at = Some(at);
        Ok(incident)
    }

    pub fn stats(&self) -> IncidentStats {
        let attended = self.attended().count();
        IncidentStats {
            total: self.incidents.len(),
            pending: self.incidents.len() - attended,
            attended,
        }
    }

    /// Number of incidents per category name
    pub fn by_category(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for incident in &self.incidents {
            *counts.entry(incident.category.name().to_string()).or_insert(0) += 1;
        }
        counts
    }
}
