//! Embedders that compute the 2D position of each variable in the network.
//!
//! Every strategy consumes the same shape of input, one vector per variable
//! ([`VariableVectors`]), and declares through [`VectorSource`] which vectors
//! it wants: the raw observations or the rows of the correlation matrix.

pub mod random;
pub mod tsne;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::Dataset;
use crate::error::{CorrelNetError, Result};
use crate::stats::CorrelationMatrix;

pub use random::RandomEmbedding;
pub use tsne::TsneParams;

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// One vector per variable, all of the same dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableVectors {
    names: Vec<String>,
    vectors: Vec<Vec<f64>>,
}

impl VariableVectors {
    pub fn new(names: Vec<String>, vectors: Vec<Vec<f64>>) -> Result<Self> {
        if names.len() != vectors.len() {
            return Err(CorrelNetError::mismatch(
                "number of variable vectors",
                names.len(),
                vectors.len(),
            ));
        }
        if let Some(first) = vectors.first() {
            if let Some(bad) = vectors.iter().find(|v| v.len() != first.len()) {
                return Err(CorrelNetError::mismatch(
                    "variable vector dimension",
                    first.len(),
                    bad.len(),
                ));
            }
        }
        Ok(VariableVectors { names, vectors })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn vectors(&self) -> &[Vec<f64>] {
        &self.vectors
    }
}

/// Which vectors describe a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorSource {
    /// The observed values, optionally z-scored per variable.
    RawValues { standardize: bool },
    /// The variable's row of the correlation matrix, optionally absolute.
    CorrelationRows { use_abs: bool },
}

impl VectorSource {
    pub fn vectors(&self, dataset: &Dataset, corr: &CorrelationMatrix) -> Result<VariableVectors> {
        match *self {
            VectorSource::RawValues { standardize } => {
                let vectors = dataset
                    .columns()
                    .iter()
                    .map(|col| if standardize { standardized(col) } else { col.clone() })
                    .collect();
                if standardize {
                    log::debug!("standardizing variables before embedding");
                }
                VariableVectors::new(dataset.names().to_vec(), vectors)
            }
            VectorSource::CorrelationRows { use_abs } => {
                let vectors = (0..corr.n())
                    .map(|i| {
                        corr.row(i)
                            .iter()
                            .map(|&r| if use_abs { r.abs() } else { r })
                            .collect()
                    })
                    .collect();
                VariableVectors::new(corr.names().to_vec(), vectors)
            }
        }
    }
}

/// Zero mean, unit (population) variance over the observed values.
/// Missing values stay missing; a constant column becomes all zeros.
fn standardized(col: &[f64]) -> Vec<f64> {
    let observed: Vec<f64> = col.iter().copied().filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return col.to_vec();
    }
    let n = observed.len() as f64;
    let mean = observed.iter().sum::<f64>() / n;
    let std = (observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    let scale = if std > 0.0 { std } else { 1.0 };
    col.iter().map(|v| (v - mean) / scale).collect()
}

/// Variable → (x, y).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingPositions {
    names: Vec<String>,
    coords: Vec<[f64; 2]>,
}

impl EmbeddingPositions {
    pub fn new(names: Vec<String>, coords: Vec<[f64; 2]>) -> Result<Self> {
        if names.len() != coords.len() {
            return Err(CorrelNetError::mismatch(
                "number of positions",
                names.len(),
                coords.len(),
            ));
        }
        Ok(EmbeddingPositions { names, coords })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn coords(&self) -> &[[f64; 2]] {
        &self.coords
    }

    pub fn get(&self, variable: &str) -> Option<[f64; 2]> {
        self.names
            .iter()
            .position(|n| n == variable)
            .map(|i| self.coords[i])
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Strategy trait and implementations
// ---------------------------------------------------------------------------

pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Which vectors [`Embedder::embed`] expects.
    fn source(&self) -> VectorSource;

    fn embed(&self, vectors: &VariableVectors) -> Result<EmbeddingPositions>;
}

/// Build the vectors an embedder asks for and embed them.
pub fn embed_variables(
    embedder: &dyn Embedder,
    dataset: &Dataset,
    corr: &CorrelationMatrix,
) -> Result<EmbeddingPositions> {
    let vectors = embedder.source().vectors(dataset, corr)?;
    log::debug!("embedding {} variables with {}", vectors.names().len(), embedder.name());
    embedder.embed(&vectors)
}

/// t-SNE of the raw (optionally standardised) variable values.
#[derive(Debug, Clone, Default)]
pub struct DirectEmbedding {
    pub standardize: bool,
    pub tsne: TsneParams,
}

impl Embedder for DirectEmbedding {
    fn name(&self) -> &str {
        "var_tsne"
    }

    fn source(&self) -> VectorSource {
        VectorSource::RawValues {
            standardize: self.standardize,
        }
    }

    fn embed(&self, vectors: &VariableVectors) -> Result<EmbeddingPositions> {
        let coords = tsne::fit(vectors.vectors(), &self.tsne)?;
        EmbeddingPositions::new(vectors.names().to_vec(), coords)
    }
}

/// t-SNE of each variable's correlation vector.
#[derive(Debug, Clone, Default)]
pub struct CorrelationVectorEmbedding {
    pub use_abs: bool,
    pub tsne: TsneParams,
}

impl Embedder for CorrelationVectorEmbedding {
    fn name(&self) -> &str {
        "correl_tsne"
    }

    fn source(&self) -> VectorSource {
        VectorSource::CorrelationRows {
            use_abs: self.use_abs,
        }
    }

    fn embed(&self, vectors: &VariableVectors) -> Result<EmbeddingPositions> {
        let coords = tsne::fit(vectors.vectors(), &self.tsne)?;
        EmbeddingPositions::new(vectors.names().to_vec(), coords)
    }
}

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmbeddingKind {
    #[serde(rename = "random")]
    Random,
    #[default]
    #[serde(rename = "var_tsne")]
    VarTsne,
    #[serde(rename = "correl_tsne")]
    CorrelTsne,
}

impl EmbeddingKind {
    pub const ALL: [EmbeddingKind; 3] = [
        EmbeddingKind::Random,
        EmbeddingKind::VarTsne,
        EmbeddingKind::CorrelTsne,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingKind::Random => "random",
            EmbeddingKind::VarTsne => "var_tsne",
            EmbeddingKind::CorrelTsne => "correl_tsne",
        }
    }

    /// Instantiate the strategy. `seed` also seeds the t-SNE initial layout.
    pub fn embedder(
        &self,
        tsne: &TsneParams,
        standardize: bool,
        use_abs: bool,
        seed: Option<u64>,
    ) -> Box<dyn Embedder> {
        let tsne = TsneParams {
            seed: tsne.seed.or(seed),
            ..tsne.clone()
        };
        match self {
            EmbeddingKind::Random => Box::new(RandomEmbedding::new(seed)),
            EmbeddingKind::VarTsne => Box::new(DirectEmbedding { standardize, tsne }),
            EmbeddingKind::CorrelTsne => Box::new(CorrelationVectorEmbedding { use_abs, tsne }),
        }
    }
}

impl fmt::Display for EmbeddingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingKind {
    type Err = CorrelNetError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(EmbeddingKind::Random),
            "var_tsne" | "direct" => Ok(EmbeddingKind::VarTsne),
            "correl_tsne" | "correlation" => Ok(EmbeddingKind::CorrelTsne),
            _ => Err(CorrelNetError::InvalidEmbedding(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Correction, CorrelationMethod, Correlater};

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            ("a", vec![1.0, 2.0, 3.0, f64::NAN]),
            ("b", vec![2.0, 1.0, 4.0, 3.0]),
            ("k", vec![5.0, 5.0, 5.0, 5.0]),
        ])
        .unwrap()
    }

    #[test]
    fn standardizing_ignores_missing_values() {
        let z = standardized(&[1.0, 2.0, 3.0, f64::NAN]);
        assert!((z[0] + 1.224_744_871_391_589).abs() < 1e-12);
        assert_eq!(z[1], 0.0);
        assert!(z[3].is_nan());
        assert_eq!(standardized(&[5.0, 5.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn correlation_rows_can_be_absolute() {
        let ds = Dataset::from_columns(vec![
            ("a", vec![1.0, 2.0, 3.0]),
            ("b", vec![3.0, 2.0, 1.0]),
        ])
        .unwrap();
        let (corr, _) = Correlater::new(CorrelationMethod::Pearson, Correction::None)
            .pairwise(&ds)
            .unwrap();
        let v = VectorSource::CorrelationRows { use_abs: true }
            .vectors(&ds, &corr)
            .unwrap();
        assert!(v.vectors()[0].iter().all(|&r| r > 0.0));
        let v = VectorSource::CorrelationRows { use_abs: false }
            .vectors(&ds, &corr)
            .unwrap();
        assert!(v.vectors()[0][1] < 0.0);
    }

    #[test]
    fn raw_values_keep_dataset_order() {
        let ds = dataset();
        let (corr, _) = Correlater::new(CorrelationMethod::Pearson, Correction::None)
            .pairwise(&ds)
            .unwrap();
        let v = VectorSource::RawValues { standardize: false }
            .vectors(&ds, &corr)
            .unwrap();
        assert_eq!(v.names(), ds.names());
        assert_eq!(v.vectors()[1], vec![2.0, 1.0, 4.0, 3.0]);
    }

    #[test]
    fn every_strategy_positions_every_variable() {
        let ds = dataset();
        let (corr, _) = Correlater::new(CorrelationMethod::Pearson, Correction::None)
            .pairwise(&ds)
            .unwrap();
        let tsne = TsneParams {
            n_iter: 100,
            ..TsneParams::default()
        };
        for kind in EmbeddingKind::ALL {
            let embedder = kind.embedder(&tsne, true, true, Some(3));
            let pos = embed_variables(embedder.as_ref(), &ds, &corr).unwrap();
            assert_eq!(pos.names(), ds.names(), "{kind}");
            assert!(pos.coords().iter().flatten().all(|v| v.is_finite()), "{kind}");
        }
    }

    #[test]
    fn embedding_names_parse() {
        assert_eq!("correl_tsne".parse::<EmbeddingKind>().unwrap(), EmbeddingKind::CorrelTsne);
        assert!(matches!(
            "umap".parse::<EmbeddingKind>(),
            Err(CorrelNetError::InvalidEmbedding(_))
        ));
    }

    #[test]
    fn mismatched_vectors_are_rejected() {
        assert!(VariableVectors::new(vec!["a".into()], vec![]).is_err());
        assert!(VariableVectors::new(
            vec!["a".into(), "b".into()],
            vec![vec![1.0], vec![1.0, 2.0]]
        )
        .is_err());
    }
}
