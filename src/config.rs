use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::embed::{Embedder, EmbeddingKind, TsneParams};
use crate::error::{CorrelNetError, Result};
use crate::network::validate_alpha;
use crate::plot::PlotOptions;
use crate::stats::{Correction, CorrelationMethod, Correlater};

/// Every knob of the pipeline, with the defaults of the command line tool.
///
/// Loaded from JSON; missing fields keep their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub method: CorrelationMethod,
    pub correction: Correction,
    pub alpha: f64,
    pub embedding: EmbeddingKind,
    pub tsne: TsneParams,
    /// Seed for random layouts and the t-SNE start; `None` is non-deterministic.
    pub seed: Option<u64>,
    /// z-score raw variables before `var_tsne`.
    pub standardize: bool,
    /// Use |r| rows for `correl_tsne`.
    pub use_abs: bool,
    pub plot: PlotOptions,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            method: CorrelationMethod::default(),
            correction: Correction::default(),
            alpha: 0.05,
            embedding: EmbeddingKind::default(),
            tsne: TsneParams::default(),
            seed: None,
            standardize: true,
            use_abs: true,
            plot: PlotOptions::default(),
        }
    }
}

impl NetworkConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: NetworkConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_alpha(self.alpha)?;
        self.tsne.validate()?;
        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(CorrelNetError::InvalidParameter {
                name: "plot size",
                reason: format!("{}x{} has no area", self.plot.width, self.plot.height),
            });
        }
        if self.plot.min_edge_width > self.plot.max_edge_width {
            return Err(CorrelNetError::InvalidParameter {
                name: "edge width",
                reason: format!(
                    "min {} exceeds max {}",
                    self.plot.min_edge_width, self.plot.max_edge_width
                ),
            });
        }
        Ok(())
    }

    pub fn correlater(&self) -> Correlater {
        Correlater::new(self.method, self.correction)
    }

    pub fn embedder(&self) -> Box<dyn Embedder> {
        self.embedding
            .embedder(&self.tsne, self.standardize, self.use_abs, self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"method": "kendall", "alpha": 0.01, "embedding": "correl_tsne", "plot": {{"width": 640}}}}"#
        )
        .unwrap();
        let config = NetworkConfig::load(file.path()).unwrap();
        assert_eq!(config.method, CorrelationMethod::Kendall);
        assert_eq!(config.alpha, 0.01);
        assert_eq!(config.embedding, EmbeddingKind::CorrelTsne);
        assert_eq!(config.correction, Correction::Bonferroni);
        assert_eq!(config.plot.width, 640);
        assert_eq!(config.plot.height, 800);
        assert_eq!(config.tsne.perplexity, 30.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"alpha": 2.0}}"#).unwrap();
        assert!(matches!(
            NetworkConfig::load(file.path()),
            Err(CorrelNetError::InvalidAlpha(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"method": "foo"}}"#).unwrap();
        assert!(matches!(NetworkConfig::load(file.path()), Err(CorrelNetError::Json(_))));
    }

    #[test]
    fn builds_the_configured_strategies() {
        let config = NetworkConfig {
            method: CorrelationMethod::Spearman,
            embedding: EmbeddingKind::Random,
            ..NetworkConfig::default()
        };
        assert_eq!(config.correlater().method_name(), "spearman");
        assert_eq!(config.embedder().name(), "random");
    }
}
