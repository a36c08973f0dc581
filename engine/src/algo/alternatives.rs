//! Alternative routes by successive arc removal.
//!
//! After each route is found, every arc along it is removed (in travel direction, all parallels)
//! and the search is repeated on the reduced graph.

use super::*;
use crate::algo::dijkstra::Server;

/// Up to `k` routes from `from` to `to`, in the order they were found.
/// Stops at the first round without a route. A route without arcs (`from == to`) is only reported once.
pub fn alternative_routes(graph: &AdjacencyGraph, from: NodeId, to: NodeId, k: usize) -> Vec<QueryResult> {
    let mut working = graph.clone();
    let mut routes = Vec::new();

    while routes.len() < k {
        let result = match Server::new(&working).query(Query { from, to }) {
            Some(result) => result,
            None => break,
        };

        let arcs: Vec<(NodeId, NodeId)> = result.path().windows(2).map(|arc| (arc[0], arc[1])).collect();
        routes.push(result);
        if arcs.is_empty() {
            break;
        }
        for (tail, head) in arcs {
            working.remove_arcs(tail, head);
        }
    }

    routes
}
