use serde::Serialize;

/// One significant correlation between two distinct variables (`i < j`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    pub i: usize,
    pub j: usize,
    pub statistic: f64,
    pub pvalue: f64,
}

/// Variables as nodes, significant correlations as weighted edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjacencyGraph {
    nodes: Vec<String>,
    edges: Vec<Edge>,
}

impl AdjacencyGraph {
    pub(crate) fn new(nodes: Vec<String>, edges: Vec<Edge>) -> Self {
        AdjacencyGraph { nodes, edges }
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        let (i, j) = if a < b { (a, b) } else { (b, a) };
        self.edges.iter().any(|e| e.i == i && e.j == j)
    }

    /// Edges as `(var_1, var_2, edge)` name triples.
    pub fn named_edges(&self) -> impl Iterator<Item = (&str, &str, &Edge)> {
        self.edges
            .iter()
            .map(|e| (self.nodes[e.i].as_str(), self.nodes[e.j].as_str(), e))
    }

    /// Number of edges touching each node.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.nodes.len()];
        for e in &self.edges {
            degrees[e.i] += 1;
            degrees[e.j] += 1;
        }
        degrees
    }
}
