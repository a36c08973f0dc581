//! The station network.
//!
//! Holds every station and every link that was ever loaded or inserted.
//! Stations are never removed, an outage is modeled by excluding a station from a [`NetworkView`].
//!
//! Topology files contain one link per line: `<station> <station> <weight>`.
//! Blank lines and lines starting with `#` are ignored, malformed lines are skipped.

use super::graph::*;
use super::view::NetworkView;
use serde::Serialize;
use std::{
    collections::{BTreeSet, HashMap},
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("could not read topology from {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("weight {0} is out of range (must be below {max})", max = INFINITY)]
    WeightOutOfRange(Weight),
    #[error("no such station: {0}")]
    UnknownStation(String),
}

/// Reasons a single topology line is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecord {
    #[error("expected 3 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid weight {0:?}")]
    InvalidWeight(String),
    #[error("negative weight {0}")]
    NegativeWeight(i64),
    #[error("weight {0} is out of range")]
    WeightOutOfRange(i64),
}

/// Parse one topology line.
/// `Ok(None)` for blank and comment lines.
pub fn parse_record(line: &str) -> Result<Option<(&str, &str, Weight)>, MalformedRecord> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(MalformedRecord::FieldCount(fields.len()));
    }

    let weight: i64 = fields[2].parse().map_err(|_| MalformedRecord::InvalidWeight(fields[2].to_string()))?;
    if weight < 0 {
        return Err(MalformedRecord::NegativeWeight(weight));
    }
    if weight >= INFINITY as i64 {
        return Err(MalformedRecord::WeightOutOfRange(weight));
    }

    Ok(Some((fields[0], fields[1], weight as Weight)))
}

/// Outcome of parsing a topology source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// link records inserted
    pub records: usize,
    /// malformed lines that were skipped
    pub skipped: usize,
}

/// Where the topology of a network came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TopologySource {
    File(PathBuf),
    Default,
}

const DEFAULT_TOPOLOGY: [(&str, &str, Weight); 10] = [
    ("Station1", "Station2", 10),
    ("Station1", "Station3", 15),
    ("Station2", "Station3", 5),
    ("Station2", "Station4", 8),
    ("Station3", "Station4", 12),
    ("Station3", "Station5", 20),
    ("Station4", "Station5", 7),
    ("Station1", "Station5", 25),
    ("Station4", "Station6", 9),
    ("Station5", "Station6", 6),
];

/// A station and its outgoing links, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationLinks {
    pub station: String,
    pub links: Vec<NeighborLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborLink {
    pub station: String,
    pub weight: Weight,
}

#[derive(Debug, Clone, Default)]
pub struct Network {
    // station name of each node id
    names: Vec<String>,
    ids: HashMap<String, NodeId>,
    graph: AdjacencyGraph,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in six station network used when no topology file can be read.
    pub fn default_topology() -> Self {
        let mut network = Self::new();
        for (u, v, weight) in DEFAULT_TOPOLOGY {
            network.insert_link(u, v, weight);
        }
        network
    }

    /// Parse topology records from a reader.
    /// Only read errors fail, malformed records and lines that are not UTF-8 are counted and skipped.
    pub fn parse_topology<R: BufRead>(reader: R) -> std::io::Result<(Self, LoadSummary)> {
        let mut network = Self::new();
        let mut summary = LoadSummary::default();

        for line in reader.split(b'\n') {
            let line = match String::from_utf8(line?) {
                Ok(line) => line,
                Err(_) => {
                    summary.skipped += 1;
                    continue;
                }
            };
            match parse_record(&line) {
                Ok(Some((u, v, weight))) => {
                    network.insert_link(u, v, weight);
                    summary.records += 1;
                }
                Ok(None) => (),
                Err(_) => summary.skipped += 1,
            }
        }

        Ok((network, summary))
    }

    pub fn try_load_topology<P: AsRef<Path>>(path: P) -> Result<(Self, LoadSummary), NetworkError> {
        let path = path.as_ref();
        let load_error = |source| NetworkError::Load {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(load_error)?;
        let (network, summary) = Self::parse_topology(BufReader::new(file)).map_err(load_error)?;

        report!("topology", {
            "source": path.display().to_string(),
            "num_stations": network.num_stations(),
            "num_links": network.count_edges(),
            "records": summary.records,
            "skipped_records": summary.skipped
        });

        Ok((network, summary))
    }

    /// Load the topology file, falling back to the default topology if it can't be read.
    pub fn load_topology_or_default<P: AsRef<Path>>(path: P) -> (Self, TopologySource) {
        match Self::try_load_topology(path.as_ref()) {
            Ok((network, _)) => (network, TopologySource::File(path.as_ref().to_path_buf())),
            Err(err) => {
                report!("topology_load_error", err.to_string());
                let network = Self::default_topology();
                report!("topology", {
                    "source": "default",
                    "num_stations": network.num_stations(),
                    "num_links": network.count_edges()
                });
                (network, TopologySource::Default)
            }
        }
    }

    /// Insert an undirected link, registering both endpoints as stations.
    /// Calling this again for the same pair adds a parallel link.
    pub fn add_link(&mut self, u: &str, v: &str, weight: Weight) -> Result<(), NetworkError> {
        if weight >= INFINITY {
            return Err(NetworkError::WeightOutOfRange(weight));
        }
        self.insert_link(u, v, weight);
        Ok(())
    }

    fn insert_link(&mut self, u: &str, v: &str, weight: Weight) {
        let u = self.add_station(u);
        let v = self.add_station(v);
        self.graph.add_undirected(u, v, weight);
    }

    /// Id of the station with the given name, registering it if it is new.
    pub fn add_station(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.graph.add_node();
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    pub fn station_id(&self, name: &str) -> Option<NodeId> {
        self.ids.get(name).copied()
    }

    pub fn require_station(&self, name: &str) -> Result<NodeId, NetworkError> {
        self.station_id(name).ok_or_else(|| NetworkError::UnknownStation(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    pub fn station_name(&self, id: NodeId) -> &str {
        &self.names[id as usize]
    }

    pub fn num_stations(&self) -> usize {
        self.names.len()
    }

    /// Stations in id order
    pub fn stations(&self) -> impl Iterator<Item = (NodeId, &str)> + '_ {
        self.names.iter().enumerate().map(|(id, name)| (id as NodeId, name.as_str()))
    }

    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    /// Number of station pairs connected by at least one link.
    pub fn count_edges(&self) -> usize {
        count_undirected_pairs(&self.graph)
    }

    /// Projection without the excluded stations and all links touching them.
    /// Recomputed on every call.
    pub fn filtered_view(&self, excluded: &BTreeSet<NodeId>) -> NetworkView<'_> {
        NetworkView::filtered(self, excluded)
    }

    /// Full adjacency sorted by station name.
    pub fn topology(&self) -> Vec<StationLinks> {
        let mut listing: Vec<StationLinks> = self
            .stations()
            .map(|(id, name)| StationLinks {
                station: name.to_string(),
                links: self
                    .graph
                    .links(id)
                    .iter()
                    .map(|link| NeighborLink {
                        station: self.station_name(link.node).to_string(),
                        weight: link.weight,
                    })
                    .collect(),
            })
            .collect();
        listing.sort_by(|a, b| a.station.cmp(&b.station));
        listing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn skips_comments_blanks_and_malformed_records() {
        let topology = "# stations of the north district\n\
                        A B 10\n\
                        \n\
                        B C\n\
                        B C 5 extra\n\
                        C D -3\n\
                        C D ten\n\
                        \t# indented comment\n\
                        A C 20\n";
        let (network, summary) = Network::parse_topology(Cursor::new(topology)).unwrap();

        assert_eq!(summary, LoadSummary { records: 2, skipped: 4 });
        assert_eq!(network.num_stations(), 3);
        assert_eq!(network.count_edges(), 2);
        assert!(!network.contains("D"));
    }

    #[test]
    fn invalid_utf8_only_skips_its_line() {
        let topology: &[u8] = b"A B 10\r\nB \xff\xfe 3\nB C 5";
        let (network, summary) = Network::parse_topology(Cursor::new(topology)).unwrap();

        assert_eq!(summary, LoadSummary { records: 2, skipped: 1 });
        assert_eq!(network.num_stations(), 3);
        assert!(network.contains("C"));
    }

    #[test]
    fn record_parsing() {
        assert_eq!(parse_record("  "), Ok(None));
        assert_eq!(parse_record("#A B 1"), Ok(None));
        assert_eq!(parse_record("A B 7"), Ok(Some(("A", "B", 7))));
        assert_eq!(parse_record("A B -1"), Err(MalformedRecord::NegativeWeight(-1)));
        assert_eq!(parse_record("A B"), Err(MalformedRecord::FieldCount(2)));
        assert_eq!(parse_record("A B 1.5"), Err(MalformedRecord::InvalidWeight("1.5".to_string())));
    }

    #[test]
    fn parallel_links_are_not_merged() {
        let mut network = Network::new();
        network.add_link("A", "B", 4).unwrap();
        network.add_link("A", "B", 4).unwrap();
        network.add_link("B", "A", 9).unwrap();

        let a = network.station_id("A").unwrap();
        assert_eq!(network.graph().links(a).len(), 3);
        assert_eq!(network.count_edges(), 1);
    }

    #[test]
    fn rejects_weights_at_infinity() {
        let mut network = Network::new();
        assert!(matches!(network.add_link("A", "B", INFINITY), Err(NetworkError::WeightOutOfRange(_))));
        assert_eq!(network.num_stations(), 0);
    }

    #[test]
    fn default_topology_shape() {
        let network = Network::default_topology();
        assert_eq!(network.num_stations(), 6);
        assert_eq!(network.count_edges(), 10);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let (network, source) = Network::load_topology_or_default("/nonexistent/topology.txt");
        assert_eq!(source, TopologySource::Default);
        assert_eq!(network.num_stations(), 6);
        assert!(Network::try_load_topology("/nonexistent/topology.txt").is_err());
    }

    #[test]
    fn topology_listing_is_sorted_and_ordered() {
        let mut network = Network::new();
        network.add_link("B", "A", 2).unwrap();
        network.add_link("B", "C", 1).unwrap();

        let listing = network.topology();
        let names: Vec<&str> = listing.iter().map(|s| s.station.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(
            listing[1].links,
            vec![
                NeighborLink { station: "A".to_string(), weight: 2 },
                NeighborLink { station: "C".to_string(), weight: 1 }
            ]
        );
    }
}
