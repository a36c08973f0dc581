use super::*;

/// Finds the closest of a set of candidate nodes.
///
/// Links are symmetric, so the distance from a candidate to the source equals the distance
/// from the source to the candidate and a single search from the source covers all candidates.
pub struct DijkstraNearestNeighbor<'g, G> {
    graph: &'g G,
}

impl<'g, G: LinkIterable<Link>> DijkstraNearestNeighbor<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self { graph }
    }

    /// The closest candidate, first in candidate order on ties.
    pub fn query(&self, source: NodeId, candidates: &[NodeId]) -> Option<(Weight, NodeId)> {
        closest_candidate(&shortest_paths(self.graph, source, None), candidates)
    }
}

/// Closest reachable candidate in an existing tree, first in candidate order on ties.
pub fn closest_candidate(tree: &ShortestPathTree, candidates: &[NodeId]) -> Option<(Weight, NodeId)> {
    let mut closest: Option<(Weight, NodeId)> = None;
    for &candidate in candidates {
        if let Some(dist) = tree.distance(candidate) {
            if closest.map_or(true, |(best, _)| dist < best) {
                closest = Some((dist, candidate));
            }
        }
    }
    closest
}
