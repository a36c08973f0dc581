//! Plain network data for external renderers.

use crate::{
    algo::Route,
    availability::AvailabilityTracker,
    datastr::{graph::*, network::Network},
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportNode {
    pub name: String,
    /// short display label, the numeric suffix of the name if it has one
    pub label: String,
    pub available: bool,
    pub ad_hoc: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportEdge {
    pub a: String,
    pub b: String,
    /// lightest of all parallel links, `None` for links to ad hoc nodes
    pub weight: Option<Weight>,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkExport {
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
    pub path: Option<Route>,
}

fn short_label(name: &str) -> String {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 && digits < name.len() {
        name[name.len() - digits..].to_string()
    } else {
        name.to_string()
    }
}

impl NetworkExport {
    pub fn new(network: &Network, tracker: &AvailabilityTracker) -> Self {
        let nodes = network
            .stations()
            .map(|(id, name)| ExportNode {
                name: name.to_string(),
                label: short_label(name),
                available: tracker.is_operational(id),
                ad_hoc: false,
            })
            .collect();

        let mut pairs: BTreeMap<(NodeId, NodeId), Weight> = BTreeMap::new();
        for (tail, _) in network.stations() {
            for link in network.graph().links(tail) {
                let pair = (std::cmp::min(tail, link.node), std::cmp::max(tail, link.node));
                let weight = pairs.entry(pair).or_insert(link.weight);
                *weight = std::cmp::min(*weight, link.weight);
            }
        }
        let edges = pairs
            .into_iter()
            .map(|((a, b), weight)| ExportEdge {
                a: network.station_name(a).to_string(),
                b: network.station_name(b).to_string(),
                weight: Some(weight),
                highlighted: false,
            })
            .collect();

        NetworkExport { nodes, edges, path: None }
    }

    /// Mark the edges along `route`. Route nodes outside the network are added as ad hoc nodes.
    pub fn highlight(mut self, route: &Route) -> Self {
        for name in &route.path {
            if !self.nodes.iter().any(|node| &node.name == name) {
                self.nodes.push(ExportNode {
                    name: name.clone(),
                    label: name.clone(),
                    available: true,
                    ad_hoc: true,
                });
            }
        }

        let steps: HashSet<(&str, &str)> = route
            .path
            .windows(2)
            .flat_map(|step| [(step[0].as_str(), step[1].as_str()), (step[1].as_str(), step[0].as_str())])
            .collect();
        for edge in &mut self.edges {
            edge.highlighted = steps.contains(&(edge.a.as_str(), edge.b.as_str()));
        }

        let ad_hoc_steps: Vec<ExportEdge> = route
            .path
            .windows(2)
            .filter(|step| !self.edges.iter().any(|edge| edge.highlighted && connects(edge, &step[0], &step[1])))
            .map(|step| ExportEdge {
                a: step[0].clone(),
                b: step[1].clone(),
                weight: None,
                highlighted: true,
            })
            .collect();
        self.edges.extend(ad_hoc_steps);

        self.path = Some(route.clone());
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn connects(edge: &ExportEdge, u: &str, v: &str) -> bool {
    (edge.a == u && edge.b == v) || (edge.a == v && edge.b == u)
}
