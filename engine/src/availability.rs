//! Tracks which stations are out of service.
//!
//! Stations go out of service when they fail or when an incident at the station consumes them.
//! They come back through an explicit restore or when that incident is attended.
//! All transitions are idempotent.

use crate::datastr::{graph::NodeId, network::Network, view::NetworkView};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StationStatus {
    Operational,
    Unavailable,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityTracker {
    unavailable: BTreeSet<NodeId>,
}

impl AvailabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the station was operational before.
    pub fn mark_unavailable(&mut self, station: NodeId) -> bool {
        self.unavailable.insert(station)
    }

    /// Returns whether the station was unavailable before.
    pub fn restore(&mut self, station: NodeId) -> bool {
        self.unavailable.remove(&station)
    }

    /// Returns the number of restored stations.
    pub fn restore_all(&mut self) -> usize {
        let restored = self.unavailable.len();
        self.unavailable.clear();
        restored
    }

    pub fn status(&self, station: NodeId) -> StationStatus {
        if self.unavailable.contains(&station) {
            StationStatus::Unavailable
        } else {
            StationStatus::Operational
        }
    }

    pub fn is_operational(&self, station: NodeId) -> bool {
        self.status(station) == StationStatus::Operational
    }

    pub fn unavailable(&self) -> &BTreeSet<NodeId> {
        &self.unavailable
    }

    /// Copy of the current unavailable set, for planning against a fixed state.
    pub fn snapshot(&self) -> BTreeSet<NodeId> {
        self.unavailable.clone()
    }

    pub fn current_view<'n>(&self, network: &'n Network) -> NetworkView<'n> {
        network.filtered_view(&self.unavailable)
    }
}
