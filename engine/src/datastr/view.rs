//! Filtered projection of a `Network` that routing runs on.
//!
//! A view keeps the node ids of the network so results can be mapped back without translation.
//! Excluded stations stay in the id space but have no links and are never reachable.
//! Ad hoc locations can be grafted onto a view as extra nodes behind the network ids.
//! Grafts only live as long as the view, the network itself is never touched.

use super::graph::*;
use super::network::Network;
use crate::algo::dijkstra::{self, ShortestPathTree};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct NetworkView<'n> {
    network: &'n Network,
    graph: AdjacencyGraph,
    in_view: Vec<bool>,
    // labels of grafted nodes, node id is `network.num_stations() + index`
    grafted: Vec<String>,
}

impl<'n> NetworkView<'n> {
    pub(crate) fn filtered(network: &'n Network, excluded: &BTreeSet<NodeId>) -> Self {
        let in_view: Vec<bool> = (0..network.num_stations() as NodeId).map(|id| !excluded.contains(&id)).collect();

        let adjacency = network
            .graph()
            .adjacency_lists()
            .iter()
            .enumerate()
            .map(|(tail, links)| {
                if !in_view[tail] {
                    return Vec::new();
                }
                links.iter().filter(|link| in_view[link.node as usize]).copied().collect()
            })
            .collect();

        Self {
            network,
            graph: AdjacencyGraph::from_adjacency_lists(adjacency),
            in_view,
            grafted: Vec::new(),
        }
    }

    pub fn network(&self) -> &'n Network {
        self.network
    }

    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.num_nodes()
    }

    pub fn is_grafted(&self, node: NodeId) -> bool {
        node as usize >= self.network.num_stations() && (node as usize) < self.num_nodes()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        match self.in_view.get(node as usize) {
            Some(&in_view) => in_view,
            None => self.is_grafted(node),
        }
    }

    /// Resolve a label to a node in this view.
    /// Stations excluded from the view do not resolve unless a node with their label was grafted.
    pub fn node_id(&self, label: &str) -> Option<NodeId> {
        if let Some(id) = self.network.station_id(label) {
            if self.in_view[id as usize] {
                return Some(id);
            }
        }
        self.grafted
            .iter()
            .position(|grafted| grafted == label)
            .map(|index| (self.network.num_stations() + index) as NodeId)
    }

    pub fn label(&self, node: NodeId) -> &str {
        let num_stations = self.network.num_stations();
        if (node as usize) < num_stations {
            self.network.station_name(node)
        } else {
            &self.grafted[node as usize - num_stations]
        }
    }

    /// Network stations in the view, in id order.
    pub fn operational_stations(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.in_view.iter().enumerate().filter(|(_, &in_view)| in_view).map(|(id, _)| id as NodeId)
    }

    /// Add a node with the given label, linked to the given stations.
    /// Connections to stations outside the view are dropped.
    /// A label that already resolves in the view is returned as is.
    pub fn graft(&mut self, label: &str, connections: &[(NodeId, Weight)]) -> NodeId {
        if let Some(id) = self.node_id(label) {
            return id;
        }

        let node = self.graph.add_node();
        self.grafted.push(label.to_string());
        for &(station, weight) in connections {
            if (station as usize) < self.in_view.len() && self.in_view[station as usize] {
                self.graph.add_undirected(node, station, weight);
            }
        }
        node
    }

    /// Graft a node linked to every operational station with a weight from `weight_of(station)`.
    pub fn graft_to_operational(&mut self, label: &str, mut weight_of: impl FnMut(NodeId) -> Weight) -> NodeId {
        if let Some(id) = self.node_id(label) {
            return id;
        }
        let connections: Vec<(NodeId, Weight)> = self.operational_stations().map(|station| (station, weight_of(station))).collect();
        self.graft(label, &connections)
    }

    /// Dijkstra from `source`, optionally stopping once `target` is settled.
    /// Returns an empty tree if `source` is not part of the view.
    pub fn shortest_paths(&self, source: NodeId, target: Option<NodeId>) -> ShortestPathTree {
        if !self.contains(source) {
            return ShortestPathTree::empty();
        }
        dijkstra::shortest_paths(&self.graph, source, target)
    }

    /// Labels along a node path.
    pub fn labels(&self, path: &[NodeId]) -> Vec<String> {
        path.iter().map(|&node| self.label(node).to_string()).collect()
    }
}
