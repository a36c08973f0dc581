use super::*;

/// Point to point query server on a borrowed graph.
pub struct Server<'g, G> {
    graph: &'g G,
}

impl<'g, G: LinkIterable<Link>> Server<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self { graph }
    }

    pub fn query(&self, query: Query) -> Option<QueryResult> {
        report!("algo", "Dijkstra Query");
        let tree = shortest_paths(self.graph, query.from, Some(query.to));
        report_stats(tree.stats());

        let distance = tree.distance(query.to)?;
        Some(QueryResult::new(distance, tree.path(query.to)))
    }

    pub fn one_to_all(&self, from: NodeId) -> ShortestPathTree {
        report!("algo", "Dijkstra One To All");
        let tree = shortest_paths(self.graph, from, None);
        report_stats(tree.stats());
        tree
    }
}

fn report_stats(stats: SearchStats) {
    report!("num_queue_pops", stats.num_queue_pops);
    report!("num_queue_pushs", stats.num_queue_pushs);
    report!("num_relaxed_arcs", stats.num_relaxed_arcs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_targets_have_no_result() {
        let mut graph = AdjacencyGraph::new();
        let a = graph.add_node();
        let b = graph.add_node();
        let c = graph.add_node();
        graph.add_undirected(a, b, 2);

        let server = Server::new(&graph);
        let result = server.query(Query { from: a, to: b }).unwrap();
        assert_eq!(result.distance(), 2);
        assert_eq!(result.path(), &[a, b]);
        assert_eq!(server.query(Query { from: a, to: c }), None);
        assert_eq!(server.one_to_all(b).distance(a), Some(2));
    }
}
