//! Routing algorithms on station networks.

use crate::datastr::graph::*;
use serde::Serialize;

pub mod alternatives;
pub mod dijkstra;

/// Simply a source-target pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub from: NodeId,
    pub to: NodeId,
}

/// Result of a point to point query.
/// Unreachable targets have no result at all, so distance and path are always consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    distance: Weight,
    path: Vec<NodeId>,
}

impl QueryResult {
    pub fn new(distance: Weight, path: Vec<NodeId>) -> Self {
        Self { distance, path }
    }

    pub fn distance(&self) -> Weight {
        self.distance
    }

    pub fn path(&self) -> &[NodeId] {
        &self.path
    }
}

/// A route between two labeled locations, as handed out to callers.
/// `distance` is `None` and `path` empty when there is no route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub path: Vec<String>,
    pub distance: Option<Weight>,
}

impl Route {
    pub fn unreachable() -> Self {
        Self { path: Vec::new(), distance: None }
    }

    pub fn is_reachable(&self) -> bool {
        self.distance.is_some()
    }
}
