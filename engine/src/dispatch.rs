//! Resource dispatch for incidents.
//!
//! Each incident category maps to the resource kinds it needs.
//! For every kind the closest station of the kind's pool sends one unit.

use crate::{
    algo::dijkstra::{nearest_neighbor::closest_candidate, ShortestPathTree},
    datastr::{graph::*, view::NetworkView},
    incident::IncidentId,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, fmt, ops::RangeInclusive};

pub mod pools;

pub use crate::config::EtaModel;
pub use pools::ResourcePools;

/// Incident categories.
/// Anything not in the table is kept as `Unclassified` with its normalized label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Fire,
    Accident,
    Theft,
    Flood,
    Explosion,
    Medical,
    Disturbance,
    NaturalDisaster,
    TrafficAccident,
    Violence,
    PublicHealth,
    Environmental,
    Unclassified(String),
}

impl Category {
    pub const KNOWN: [Category; 12] = [
        Category::Fire,
        Category::Accident,
        Category::Theft,
        Category::Flood,
        Category::Explosion,
        Category::Medical,
        Category::Disturbance,
        Category::NaturalDisaster,
        Category::TrafficAccident,
        Category::Violence,
        Category::PublicHealth,
        Category::Environmental,
    ];

    /// Case insensitive, spaces and hyphens count as underscores.
    pub fn parse(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();

        Self::KNOWN
            .iter()
            .find(|category| category.name() == normalized)
            .cloned()
            .unwrap_or(Category::Unclassified(normalized))
    }

    pub fn name(&self) -> &str {
        match self {
            Category::Fire => "fire",
            Category::Accident => "accident",
            Category::Theft => "theft",
            Category::Flood => "flood",
            Category::Explosion => "explosion",
            Category::Medical => "medical",
            Category::Disturbance => "disturbance",
            Category::NaturalDisaster => "natural_disaster",
            Category::TrafficAccident => "traffic_accident",
            Category::Violence => "violence",
            Category::PublicHealth => "public_health",
            Category::Environmental => "environmental",
            Category::Unclassified(label) => label,
        }
    }

    pub fn required_kinds(&self) -> &'static [ResourceKind] {
        use ResourceKind::*;
        match self {
            Category::Fire => &[FireCrew],
            Category::Accident => &[Ambulance, Police],
            Category::Theft => &[Police],
            Category::Flood => &[FireCrew, Ambulance],
            Category::Explosion => &[FireCrew, Ambulance, Police],
            Category::Medical => &[Ambulance],
            Category::Disturbance => &[Police],
            Category::NaturalDisaster => &[Rescue, FireCrew, Ambulance, Police],
            Category::TrafficAccident => &[Ambulance, Police],
            Category::Violence => &[Police],
            Category::PublicHealth => &[Health, Ambulance],
            Category::Environmental => &[Environmental, FireCrew],
            Category::Unclassified(_) => &[ResourceKind::DEFAULT],
        }
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    FireCrew,
    Ambulance,
    Police,
    Rescue,
    Health,
    Environmental,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::FireCrew,
        ResourceKind::Ambulance,
        ResourceKind::Police,
        ResourceKind::Rescue,
        ResourceKind::Health,
        ResourceKind::Environmental,
    ];

    /// Kind sent to unclassified incidents
    pub const DEFAULT: ResourceKind = ResourceKind::Police;

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::FireCrew => "fire_crew",
            ResourceKind::Ambulance => "ambulance",
            ResourceKind::Police => "police",
            ResourceKind::Rescue => "rescue",
            ResourceKind::Health => "health",
            ResourceKind::Environmental => "environmental",
        }
    }

    /// Prefix of resource identifiers
    pub fn code(self) -> &'static str {
        match self {
            ResourceKind::FireCrew => "FIRE",
            ResourceKind::Ambulance => "AMB",
            ResourceKind::Police => "POL",
            ResourceKind::Rescue => "RES",
            ResourceKind::Health => "HLT",
            ResourceKind::Environmental => "ENV",
        }
    }

    /// Accepts names and codes, case insensitive.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(label) || kind.code().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One unit sent from a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    pub kind: ResourceKind,
    pub station: String,
    pub resource_id: String,
    pub distance: Weight,
    pub eta_minutes: u32,
    /// from the station to the incident location
    pub route: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Full,
    Partial,
    NoResourceAvailable,
}

/// Result of dispatching one incident.
/// Kinds without a reachable station are listed in `missing`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub dispatches: BTreeMap<ResourceKind, Dispatch>,
    pub missing: Vec<ResourceKind>,
}

impl Assignment {
    pub fn outcome(&self) -> DispatchOutcome {
        if self.dispatches.is_empty() {
            DispatchOutcome::NoResourceAvailable
        } else if self.missing.is_empty() {
            DispatchOutcome::Full
        } else {
            DispatchOutcome::Partial
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dispatches.is_empty()
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&Dispatch> {
        self.dispatches.get(&kind)
    }

    pub fn resource_ids(&self) -> Vec<&str> {
        self.dispatches.values().map(|dispatch| dispatch.resource_id.as_str()).collect()
    }
}

// splitmix64 finalizer
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Derive an independent stream seed from the root seed and a key.
pub fn mix_seed(seed: u64, key: &[u64]) -> u64 {
    key.iter().fold(splitmix64(seed), |state, &part| splitmix64(state ^ part))
}

const GRAFT_STREAM: u64 = 1;
const UNIT_STREAM: u64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatcher {
    pools: ResourcePools,
    eta: EtaModel,
    seed: u64,
    graft_weights: RangeInclusive<Weight>,
}

impl Dispatcher {
    pub fn new(pools: ResourcePools, eta: EtaModel, seed: u64, graft_weights: RangeInclusive<Weight>) -> Self {
        Self {
            pools,
            eta,
            seed,
            graft_weights,
        }
    }

    /// Synthetic distance between an ad hoc location of `incident` and `station`.
    pub fn graft_weight(&self, incident: IncidentId, station: NodeId) -> Weight {
        if self.graft_weights.is_empty() {
            return *self.graft_weights.start();
        }
        let mut rng = StdRng::seed_from_u64(mix_seed(self.seed, &[GRAFT_STREAM, incident.0 as u64, station as u64]));
        rng.gen_range(self.graft_weights.clone())
    }

    /// Resolve `label` in the view, grafting it onto all operational stations if it is not part of it.
    pub fn locate(&self, view: &mut NetworkView, label: &str, incident: IncidentId) -> NodeId {
        match view.node_id(label) {
            Some(node) => node,
            None => view.graft_to_operational(label, |station| self.graft_weight(incident, station)),
        }
    }

    pub fn resource_id(&self, incident: IncidentId, kind: ResourceKind) -> String {
        let mut rng = StdRng::seed_from_u64(mix_seed(self.seed, &[UNIT_STREAM, incident.0 as u64, kind as u64]));
        format!("{}{}", kind.code(), rng.gen_range(1..=9))
    }

    /// Send the closest unit of every kind in `kinds` to `location`.
    /// The location itself never sends a unit, stations outside the view are skipped.
    pub fn dispatch(&self, view: &NetworkView, location: NodeId, incident: IncidentId, kinds: &[ResourceKind]) -> Assignment {
        let tree = view.shortest_paths(location, None);
        let mut assignment = Assignment::default();

        for &kind in kinds {
            if assignment.dispatches.contains_key(&kind) {
                continue;
            }
            match self.closest_unit(view, &tree, location, kind) {
                Some((distance, station)) => {
                    let mut route = tree.path(station);
                    route.reverse();
                    assignment.dispatches.insert(
                        kind,
                        Dispatch {
                            kind,
                            station: view.label(station).to_string(),
                            resource_id: self.resource_id(incident, kind),
                            distance,
                            eta_minutes: self.eta.eta_minutes(distance),
                            route: view.labels(&route),
                        },
                    );
                }
                None => assignment.missing.push(kind),
            }
        }

        report!("dispatch", {
            "incident": incident.to_string(),
            "outcome": assignment.outcome(),
            "dispatched": assignment.dispatches.values().map(|d| (d.resource_id.clone(), d.station.clone())).collect::<Vec<_>>(),
            "missing": assignment.missing
        });

        assignment
    }

    fn closest_unit(&self, view: &NetworkView, tree: &ShortestPathTree, location: NodeId, kind: ResourceKind) -> Option<(Weight, NodeId)> {
        let candidates: Vec<NodeId> = self
            .pools
            .candidates(kind)
            .iter()
            .filter_map(|station| view.node_id(station))
            .filter(|&station| station != location && !view.is_grafted(station))
            .collect();
        closest_candidate(tree, &candidates)
    }
}
