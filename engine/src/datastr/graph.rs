//! Graph vocabulary shared by the station network and the routing algorithms.
//!
//! Stations are identified by dense `NodeId`s from `0` to `n-1`.
//! All links are stored as directed arcs; an undirected station link is two arcs of equal weight.

use std::collections::HashSet;

/// Node ids are 32bit unsigned ints
pub type NodeId = u32;
/// Basic weights are 32bit unsigned ints
pub type Weight = u32;
/// A sufficiently large infinity constant.
/// Set to `u32::MAX / 2` so that `INFINITY + x` for `x <= INFINITY` does not overflow.
pub const INFINITY: Weight = std::u32::MAX / 2;

/// Simple struct for weighted links.
/// No behaviour, just a pure data struct.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Link {
    pub node: NodeId,
    pub weight: Weight,
}

/// Base trait for graphs.
/// Interesting behaviour will be added through subtraits.
pub trait Graph {
    fn num_nodes(&self) -> usize;
    fn num_arcs(&self) -> usize;
    fn degree(&self, node: NodeId) -> usize;
}

pub trait LinkIterable<L>: Graph {
    /// Type of the outgoing neighbor iterator.
    type Iter<'a>: Iterator<Item = L>
    where
        Self: 'a;

    /// Get a iterator over the outgoing links of the given node.
    fn link_iter(&self, node: NodeId) -> Self::Iter<'_>;
}

/// Adjacency list graph.
/// Each node keeps an ordered sequence of outgoing links.
/// Parallel links are kept, nothing gets merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyGraph {
    adjacency: Vec<Vec<Link>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_adjacency_lists(adjacency: Vec<Vec<Link>>) -> Self {
        Self { adjacency }
    }

    /// Append an isolated node and return its id
    pub fn add_node(&mut self) -> NodeId {
        self.adjacency.push(Vec::new());
        (self.adjacency.len() - 1) as NodeId
    }

    /// Insert both arcs of an undirected link.
    /// A self loop ends up twice in the adjacency of its node.
    pub fn add_undirected(&mut self, u: NodeId, v: NodeId, weight: Weight) {
        self.adjacency[u as usize].push(Link { node: v, weight });
        self.adjacency[v as usize].push(Link { node: u, weight });
    }

    /// Remove every arc `tail -> head` (all parallels). The reverse direction stays.
    pub fn remove_arcs(&mut self, tail: NodeId, head: NodeId) {
        self.adjacency[tail as usize].retain(|link| link.node != head);
    }

    pub fn links(&self, node: NodeId) -> &[Link] {
        &self.adjacency[node as usize]
    }

    pub fn adjacency_lists(&self) -> &[Vec<Link>] {
        &self.adjacency
    }
}

impl Graph for AdjacencyGraph {
    fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    fn num_arcs(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    fn degree(&self, node: NodeId) -> usize {
        self.adjacency[node as usize].len()
    }
}

impl LinkIterable<Link> for AdjacencyGraph {
    type Iter<'a> = std::iter::Copied<std::slice::Iter<'a, Link>>;

    #[inline]
    fn link_iter(&self, node: NodeId) -> Self::Iter<'_> {
        self.adjacency[node as usize].iter().copied()
    }
}

fn link_head(link: &Link) -> NodeId {
    link.node
}

impl LinkIterable<NodeId> for AdjacencyGraph {
    type Iter<'a> = std::iter::Map<std::slice::Iter<'a, Link>, fn(&Link) -> NodeId>;

    fn link_iter(&self, node: NodeId) -> Self::Iter<'_> {
        self.adjacency[node as usize].iter().map(link_head as fn(&Link) -> NodeId)
    }
}

/// Number of distinct unordered node pairs with at least one arc between them.
pub fn count_undirected_pairs<G: LinkIterable<NodeId>>(graph: &G) -> usize {
    let mut pairs = HashSet::new();
    for node in 0..graph.num_nodes() as NodeId {
        for neighbor in graph.link_iter(node) {
            pairs.insert((std::cmp::min(node, neighbor), std::cmp::max(node, neighbor)));
        }
    }
    pairs.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parallel_links_are_kept_but_counted_once() {
        let mut graph = AdjacencyGraph::new();
        let a = graph.add_node();
        let b = graph.add_node();
        let c = graph.add_node();
        graph.add_undirected(a, b, 3);
        graph.add_undirected(a, b, 4);
        graph.add_undirected(b, c, 1);

        assert_eq!(graph.degree(a), 2);
        assert_eq!(graph.num_arcs(), 6);
        assert_eq!(count_undirected_pairs(&graph), 2);
    }

    #[test]
    fn removing_arcs_is_directed() {
        let mut graph = AdjacencyGraph::new();
        let a = graph.add_node();
        let b = graph.add_node();
        graph.add_undirected(a, b, 3);
        graph.add_undirected(a, b, 5);
        graph.remove_arcs(a, b);

        assert!(graph.links(a).is_empty());
        assert_eq!(graph.links(b), &[Link { node: a, weight: 3 }, Link { node: a, weight: 5 }]);
    }
}
