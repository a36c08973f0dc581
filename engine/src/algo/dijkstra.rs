//! Plain Dijkstra with a lazy deletion binary heap.

use super::*;
use std::{cmp::Reverse, collections::BinaryHeap};

pub mod nearest_neighbor;
pub mod query;

pub use nearest_neighbor::DijkstraNearestNeighbor;
pub use query::Server;

/// Priority Queue entries
#[derive(Copy, Clone, Eq, PartialEq, Debug, PartialOrd, Ord)]
pub struct State<W> {
    pub key: W,
    pub node: NodeId,
}

/// Search counters of a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub num_queue_pops: usize,
    pub num_queue_pushs: usize,
    pub num_relaxed_arcs: usize,
}

/// Distances and predecessors of one single source search.
/// Indexed by the node ids of the graph the search ran on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortestPathTree {
    source: Option<NodeId>,
    distances: Vec<Weight>,
    predecessors: Vec<Option<NodeId>>,
    stats: SearchStats,
}

impl ShortestPathTree {
    /// The tree of a search that could not start.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_none()
    }

    pub fn source(&self) -> Option<NodeId> {
        self.source
    }

    /// Tentative distance, `None` for unreached nodes.
    /// With early termination only the target and nodes settled before it are final.
    pub fn distance(&self, node: NodeId) -> Option<Weight> {
        self.distances.get(node as usize).copied().filter(|&dist| dist < INFINITY)
    }

    pub fn distances(&self) -> &[Weight] {
        &self.distances
    }

    pub fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        self.predecessors.get(node as usize).copied().flatten()
    }

    pub fn predecessors(&self) -> &[Option<NodeId>] {
        &self.predecessors
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Node path from the source to `target`, empty if there is none.
    pub fn path(&self, target: NodeId) -> Vec<NodeId> {
        match self.source {
            Some(source) => reconstruct_path(&self.predecessors, source, target),
            None => Vec::new(),
        }
    }
}

/// Single source Dijkstra over `graph`.
/// If `target` is given, the search stops as soon as it is settled.
pub fn shortest_paths<G: LinkIterable<Link>>(graph: &G, source: NodeId, target: Option<NodeId>) -> ShortestPathTree {
    let n = graph.num_nodes();
    if source as usize >= n {
        return ShortestPathTree::empty();
    }

    let mut distances = vec![INFINITY; n];
    let mut predecessors = vec![None; n];
    let mut settled = vec![false; n];
    let mut queue: BinaryHeap<Reverse<State<Weight>>> = BinaryHeap::new();
    let mut stats = SearchStats::default();

    distances[source as usize] = 0;
    queue.push(Reverse(State { key: 0, node: source }));
    stats.num_queue_pushs += 1;

    while let Some(Reverse(State { key, node })) = queue.pop() {
        stats.num_queue_pops += 1;
        if settled[node as usize] {
            continue;
        }
        settled[node as usize] = true;

        if Some(node) == target {
            break;
        }

        for link in graph.link_iter(node) {
            stats.num_relaxed_arcs += 1;
            let head = link.node as usize;
            if settled[head] {
                continue;
            }
            let dist = key.saturating_add(link.weight);
            if dist < distances[head] {
                distances[head] = dist;
                predecessors[head] = Some(node);
                queue.push(Reverse(State { key: dist, node: link.node }));
                stats.num_queue_pushs += 1;
            }
        }
    }

    ShortestPathTree {
        source: Some(source),
        distances,
        predecessors,
        stats,
    }
}

/// Walk predecessors back from `target`.
/// The path is only returned if the walk ends at `source`, otherwise it is empty.
/// `source == target` yields `[source]`.
pub fn reconstruct_path(predecessors: &[Option<NodeId>], source: NodeId, target: NodeId) -> Vec<NodeId> {
    let mut path = vec![target];
    let mut current = target;
    while current != source {
        match predecessors.get(current as usize).copied().flatten() {
            // a predecessor chain can never be longer than the number of nodes
            Some(pred) if path.len() < predecessors.len() => {
                path.push(pred);
                current = pred;
            }
            _ => return Vec::new(),
        }
    }

    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn graph(n: usize, links: &[(NodeId, NodeId, Weight)]) -> AdjacencyGraph {
        let mut graph = AdjacencyGraph::new();
        for _ in 0..n {
            graph.add_node();
        }
        for &(u, v, w) in links {
            graph.add_undirected(u, v, w);
        }
        graph
    }

    #[test]
    fn source_has_distance_zero_and_trivial_path() {
        let g = graph(2, &[(0, 1, 4)]);
        let tree = shortest_paths(&g, 0, None);
        assert_eq!(tree.distance(0), Some(0));
        assert_eq!(tree.path(0), vec![0]);
        assert_eq!(tree.path(1), vec![0, 1]);
    }

    #[test]
    fn distances_at_infinity_count_as_unreached() {
        let g = graph(3, &[(0, 1, INFINITY - 1), (1, 2, INFINITY - 1)]);
        let tree = shortest_paths(&g, 0, None);
        assert_eq!(tree.distance(1), Some(INFINITY - 1));
        assert_eq!(tree.distance(2), None);
        assert!(tree.path(2).is_empty());
    }

    #[test]
    fn zero_weight_links() {
        let g = graph(3, &[(0, 1, 0), (1, 2, 0)]);
        let tree = shortest_paths(&g, 0, None);
        assert_eq!(tree.distance(2), Some(0));
        assert_eq!(tree.path(2), vec![0, 1, 2]);
    }

    #[test]
    fn self_loops_and_parallel_links() {
        let g = graph(2, &[(0, 0, 1), (0, 1, 9), (0, 1, 3)]);
        let tree = shortest_paths(&g, 0, None);
        assert_eq!(tree.distance(1), Some(3));
        assert_eq!(tree.predecessor(0), None);
    }

    #[test]
    fn broken_predecessor_chains_give_empty_paths() {
        // 2 has a predecessor, but the chain ends at 1 instead of the source 0
        let predecessors = vec![None, None, Some(1)];
        assert!(reconstruct_path(&predecessors, 0, 2).is_empty());
        // no predecessor at all
        assert!(reconstruct_path(&predecessors, 0, 1).is_empty());
        // cyclic predecessors terminate
        let predecessors = vec![None, Some(2), Some(1)];
        assert!(reconstruct_path(&predecessors, 0, 2).is_empty());
        assert!(reconstruct_path(&predecessors, 0, 7).is_empty());
    }

    #[test]
    fn early_exit_keeps_target_distance() {
        let g = graph(4, &[(0, 1, 1), (1, 2, 1), (2, 3, 1), (0, 3, 10)]);
        let full = shortest_paths(&g, 0, None);
        let early = shortest_paths(&g, 0, Some(2));
        assert_eq!(early.distance(2), full.distance(2));
        assert_eq!(early.path(2), full.path(2));
        assert!(early.stats().num_queue_pops <= full.stats().num_queue_pops);
    }

    // exhaustive minimum over all simple paths
    fn brute_force(g: &AdjacencyGraph, current: NodeId, target: NodeId, visited: &mut Vec<bool>, acc: Weight, best: &mut Option<Weight>) {
        if current == target {
            *best = Some(best.map_or(acc, |b| b.min(acc)));
            return;
        }
        visited[current as usize] = true;
        for link in g.links(current) {
            if !visited[link.node as usize] {
                brute_force(g, link.node, target, visited, acc + link.weight, best);
            }
        }
        visited[current as usize] = false;
    }

    #[test]
    fn matches_exhaustive_search_on_random_graphs() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let n = rng.gen_range(1..8);
            let m = rng.gen_range(0..15);
            let links: Vec<_> = (0..m)
                .map(|_| (rng.gen_range(0..n) as NodeId, rng.gen_range(0..n) as NodeId, rng.gen_range(0..20)))
                .collect();
            let g = graph(n, &links);
            let source = rng.gen_range(0..n) as NodeId;
            let tree = shortest_paths(&g, source, None);

            for target in 0..n as NodeId {
                let mut best = None;
                brute_force(&g, source, target, &mut vec![false; n], 0, &mut best);
                assert_eq!(tree.distance(target), best);

                let path = tree.path(target);
                match best {
                    None => assert!(path.is_empty()),
                    Some(dist) => {
                        assert_eq!(path.first(), Some(&source));
                        assert_eq!(path.last(), Some(&target));
                        let length: Weight = path
                            .windows(2)
                            .map(|arc| g.links(arc[0]).iter().filter(|link| link.node == arc[1]).map(|link| link.weight).min().unwrap())
                            .sum();
                        assert_eq!(length, dist);
                    }
                }
            }
        }
    }
}
