use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::data::VariableGroups;
use crate::embed::EmbeddingPositions;
use crate::error::Result;
use crate::stats::{Correction, TargetCorrelation};

use super::graph::AdjacencyGraph;

#[derive(Debug, Serialize)]
struct EdgeRow<'a> {
    var_1: &'a str,
    var_2: &'a str,
    statistic: f64,
    pvalue: f64,
}

/// Write the retained edges as CSV: `var_1,var_2,statistic,pvalue`.
pub fn write_edge_list<W: Write>(graph: &AdjacencyGraph, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    // An empty graph still gets its header.
    if graph.n_edges() == 0 {
        wtr.write_record(["var_1", "var_2", "statistic", "pvalue"])?;
    }
    for (var_1, var_2, edge) in graph.named_edges() {
        wtr.serialize(EdgeRow {
            var_1,
            var_2,
            statistic: edge.statistic,
            pvalue: edge.pvalue,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_edge_list(graph: &AdjacencyGraph, path: &Path) -> Result<()> {
    write_edge_list(graph, BufWriter::new(File::create(path)?))?;
    log::info!("wrote {} edges to {}", graph.n_edges(), path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct NodeRecord<'a> {
    name: &'a str,
    x: f64,
    y: f64,
    degree: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_correlation: Option<f64>,
}

/// Everything needed to redraw a network elsewhere.
#[derive(Debug, Serialize)]
pub struct NetworkDocument<'a> {
    method: &'a str,
    correction: Correction,
    alpha: f64,
    nodes: Vec<NodeRecord<'a>>,
    edges: Vec<EdgeRow<'a>>,
}

impl<'a> NetworkDocument<'a> {
    pub fn new(
        graph: &'a AdjacencyGraph,
        positions: &'a EmbeddingPositions,
        groups: Option<&'a VariableGroups>,
        target: Option<&'a TargetCorrelation>,
        (method, correction, alpha): (&'a str, Correction, f64),
    ) -> Self {
        let degrees = graph.degrees();
        let nodes = graph
            .nodes()
            .iter()
            .zip(degrees)
            .map(|(name, degree)| {
                let [x, y] = positions.get(name).unwrap_or([f64::NAN; 2]);
                NodeRecord {
                    name,
                    x,
                    y,
                    degree,
                    group: groups.and_then(|g| g.group_of(name)),
                    target_correlation: target.and_then(|t| t.get(name)),
                }
            })
            .collect();
        let edges = graph
            .named_edges()
            .map(|(var_1, var_2, e)| EdgeRow {
                var_1,
                var_2,
                statistic: e.statistic,
                pvalue: e.pvalue,
            })
            .collect();
        NetworkDocument {
            method,
            correction,
            alpha,
            nodes,
            edges,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        log::info!(
            "wrote network ({} nodes, {} edges) to {}",
            self.nodes.len(),
            self.edges.len(),
            path.display()
        );
        Ok(())
    }
}
