//! The correlation network: matrices, significance filtering, layout and
//! drawing composed into one object.
//!
//! ```text
//!   Dataset ─► Correlater ─► matrices ─► significance_filter(alpha) ─► AdjacencyGraph
//!      │                        │                                          │
//!      └────────► Embedder ◄────┘                                          ▼
//!                    │                                               NetworkPlotter
//!                    └──────────────► EmbeddingPositions ──────────────────┘
//! ```

pub mod export;
pub mod filter;
pub mod graph;

use std::path::Path;

use crate::config::NetworkConfig;
use crate::data::{Dataset, VariableGroups};
use crate::embed::{embed_variables, Embedder, EmbeddingPositions};
use crate::error::Result;
use crate::plot::{render, NetworkPlotter, PlotOptions, Scene};
use crate::stats::{Correction, CorrelationMatrix, Correlater, SignificanceMatrix, TargetCorrelation};

pub use export::NetworkDocument;
pub use filter::{significance_filter, validate_alpha};
pub use graph::{AdjacencyGraph, Edge};

/// A computed correlation network.
///
/// Correlations and positions are computed once; changing `alpha` only
/// re-runs the filter.
pub struct CorrelNet {
    dataset: Dataset,
    correlater: Correlater,
    embedder: Box<dyn Embedder>,
    alpha: f64,
    correlations: CorrelationMatrix,
    significance: SignificanceMatrix,
    graph: AdjacencyGraph,
    positions: EmbeddingPositions,
    groups: Option<VariableGroups>,
    target: Option<TargetCorrelation>,
    plotter: NetworkPlotter,
}

impl std::fmt::Debug for CorrelNet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelNet")
            .field("variables", &self.dataset.n_vars())
            .field("observations", &self.dataset.n_obs())
            .field("correlater", &self.correlater)
            .field("embedder", &self.embedder.name())
            .field("alpha", &self.alpha)
            .field("edges", &self.graph.n_edges())
            .finish()
    }
}

impl CorrelNet {
    /// Correlate, filter at `alpha` and lay out `dataset`.
    pub fn new(
        dataset: Dataset,
        correlater: Correlater,
        embedder: Box<dyn Embedder>,
        alpha: f64,
    ) -> Result<Self> {
        validate_alpha(alpha)?;
        let (correlations, significance) = correlater.pairwise(&dataset)?;
        let graph = significance_filter(&correlations, &significance, alpha)?;
        let positions = embed_variables(embedder.as_ref(), &dataset, &correlations)?;
        log::info!(
            "network: {} variables, {} significant edges at alpha={alpha}",
            graph.n_nodes(),
            graph.n_edges()
        );
        Ok(CorrelNet {
            dataset,
            correlater,
            embedder,
            alpha,
            correlations,
            significance,
            graph,
            positions,
            groups: None,
            target: None,
            plotter: NetworkPlotter::default(),
        })
    }

    /// Colour nodes by their correlation with `target` (one value per observation).
    pub fn with_target(mut self, target: &[f64]) -> Result<Self> {
        self.target = Some(TargetCorrelation::compute(
            &self.dataset,
            target,
            self.correlater.test(),
        )?);
        Ok(self)
    }

    /// Style nodes by group; every variable needs a label.
    pub fn with_groups(mut self, groups: VariableGroups) -> Result<Self> {
        groups.ensure_covers(self.dataset.names())?;
        self.groups = Some(groups);
        Ok(self)
    }

    pub fn with_plot_options(mut self, options: PlotOptions) -> Self {
        self.plotter = NetworkPlotter::new(options);
        self
    }

    /// Re-filter at a new threshold, keeping correlations and layout.
    pub fn set_alpha(&mut self, alpha: f64) -> Result<()> {
        self.graph = significance_filter(&self.correlations, &self.significance, alpha)?;
        self.alpha = alpha;
        Ok(())
    }

    /// The graph at another threshold, without changing this network.
    pub fn graph_at(&self, alpha: f64) -> Result<AdjacencyGraph> {
        significance_filter(&self.correlations, &self.significance, alpha)
    }

    /// Lay the variables out again with another strategy.
    pub fn set_embedder(&mut self, embedder: Box<dyn Embedder>) -> Result<()> {
        self.positions = embed_variables(embedder.as_ref(), &self.dataset, &self.correlations)?;
        self.embedder = embedder;
        Ok(())
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn method_name(&self) -> &str {
        self.correlater.method_name()
    }

    pub fn correction(&self) -> Correction {
        self.correlater.correction()
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    pub fn correlations(&self) -> &CorrelationMatrix {
        &self.correlations
    }

    pub fn significance(&self) -> &SignificanceMatrix {
        &self.significance
    }

    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    pub fn positions(&self) -> &EmbeddingPositions {
        &self.positions
    }

    pub fn groups(&self) -> Option<&VariableGroups> {
        self.groups.as_ref()
    }

    pub fn target(&self) -> Option<&TargetCorrelation> {
        self.target.as_ref()
    }

    pub fn plot_options(&self) -> &PlotOptions {
        &self.plotter.options
    }

    pub fn scene(&self) -> Result<Scene> {
        self.plotter.scene(
            &self.graph,
            &self.positions,
            self.groups.as_ref(),
            self.target.as_ref(),
            self.correlater.method_name(),
        )
    }

    /// Draw the network to `path` (`.png` or `.svg`).
    pub fn plot(&self, path: &Path) -> Result<()> {
        render(&self.scene()?, path)
    }

    pub fn document(&self) -> NetworkDocument<'_> {
        NetworkDocument::new(
            &self.graph,
            &self.positions,
            self.groups.as_ref(),
            self.target.as_ref(),
            (self.correlater.method_name(), self.correlater.correction(), self.alpha),
        )
    }

    pub fn save_edge_list(&self, path: &Path) -> Result<()> {
        export::save_edge_list(&self.graph, path)
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        self.document().save(path)
    }
}

/// Build a network from a configuration.
///
/// `target`, when given, must have one value per observation; `groups` must
/// label every variable.
pub fn correlnet(
    dataset: Dataset,
    target: Option<&[f64]>,
    groups: Option<VariableGroups>,
    config: &NetworkConfig,
) -> Result<CorrelNet> {
    config.validate()?;
    let mut net = CorrelNet::new(dataset, config.correlater(), config.embedder(), config.alpha)?
        .with_plot_options(config.plot.clone());
    if let Some(target) = target {
        net = net.with_target(target)?;
    }
    if let Some(groups) = groups {
        net = net.with_groups(groups)?;
    }
    Ok(net)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{EmbeddingKind, RandomEmbedding};
    use crate::error::CorrelNetError;
    use crate::stats::CorrelationMethod;

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            ("a", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]),
            ("b", vec![1.2, 1.9, 3.1, 4.2, 4.8, 6.1, 7.0]),
            ("c", vec![4.0, 1.0, 6.0, 2.0, 7.0, 3.0, 5.0]),
        ])
        .unwrap()
    }

    fn random_net() -> CorrelNet {
        CorrelNet::new(
            dataset(),
            Correlater::new(CorrelationMethod::Pearson, Correction::None),
            Box::new(RandomEmbedding::new(Some(19))),
            0.05,
        )
        .unwrap()
    }

    #[test]
    fn builds_all_stages() {
        let net = random_net();
        assert_eq!(net.correlations().n(), 3);
        assert_eq!(net.positions().len(), 3);
        assert!(net.graph().has_edge(0, 1));
        assert!(!net.graph().has_edge(0, 2));
        assert_eq!(net.embedder_name(), "random");
    }

    #[test]
    fn alpha_changes_only_refilter() {
        let mut net = random_net();
        let positions = net.positions().clone();
        net.set_alpha(1.0).unwrap();
        assert_eq!(net.graph().n_edges(), 3);
        assert_eq!(net.positions(), &positions);
        assert!(matches!(net.set_alpha(0.0), Err(CorrelNetError::InvalidAlpha(_))));
        // failed update leaves the previous graph in place
        assert_eq!(net.alpha(), 1.0);
        assert_eq!(net.graph().n_edges(), 3);
    }

    #[test]
    fn target_and_groups_are_validated() {
        let net = random_net();
        assert!(matches!(
            net.with_target(&[1.0, 2.0]),
            Err(CorrelNetError::LengthMismatch { expected: 7, actual: 2, .. })
        ));
        let groups: VariableGroups = [("a", "g")].into_iter().collect();
        assert!(random_net().with_groups(groups).is_err());

        let net = random_net()
            .with_target(&[7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0])
            .unwrap();
        let target = net.target().unwrap();
        assert!((target.get("a").unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn functional_entry_point_follows_config() {
        let config = NetworkConfig {
            method: CorrelationMethod::Spearman,
            embedding: EmbeddingKind::Random,
            alpha: 1.0,
            seed: Some(3),
            ..NetworkConfig::default()
        };
        let net = correlnet(dataset(), None, None, &config).unwrap();
        assert_eq!(net.method_name(), "spearman");
        assert_eq!(net.correction(), Correction::Bonferroni);
        assert_eq!(net.graph().n_edges(), 3);

        let again = correlnet(dataset(), None, None, &config).unwrap();
        assert_eq!(net.positions(), again.positions());
    }

    #[test]
    fn reembedding_keeps_graph() {
        let mut net = random_net();
        let before = net.positions().clone();
        net.set_embedder(Box::new(RandomEmbedding::new(Some(20)))).unwrap();
        assert_ne!(net.positions(), &before);
        assert!(net.graph().has_edge(0, 1));
    }
}
