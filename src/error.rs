use thiserror::Error;

/// Everything that can go wrong while building or drawing a correlation network.
///
/// All variants are local validation failures; nothing here is retried.
#[derive(Debug, Error)]
pub enum CorrelNetError {
    #[error("correlation method '{0}' is not supported (expected pearson, spearman or kendall)")]
    InvalidMethod(String),

    #[error("embedding '{0}' is not supported (expected random, var_tsne or correl_tsne)")]
    InvalidEmbedding(String),

    #[error("correction '{0}' is not supported (expected none, bonferroni, holm or fdr_bh)")]
    InvalidCorrection(String),

    #[error("only {n} usable observations for ({var_1}, {var_2}), need at least 2")]
    InsufficientData {
        var_1: String,
        var_2: String,
        n: usize,
    },

    #[error("alpha must lie in (0, 1], got {0}")]
    InvalidAlpha(f64),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("{what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("dataset has no numeric variables")]
    EmptyDataset,

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CorrelNetError>;

impl CorrelNetError {
    pub(crate) fn mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        CorrelNetError::LengthMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }
}
