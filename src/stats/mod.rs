//! Pairwise correlation with significance tests.
//!
//! ```text
//!   Dataset ──► Correlater ──► (CorrelationMatrix, SignificanceMatrix)
//!                  │
//!                  ├─ CorrelationTest  (pearson | spearman | kendall)
//!                  └─ Correction       (none | bonferroni | holm | fdr_bh)
//! ```

pub mod correction;
pub mod correlater;
pub mod method;
pub mod rank;
pub mod target;

pub use correction::Correction;
pub use correlater::{CorrelationMatrix, Correlater, LabeledMatrix, SignificanceMatrix};
pub use method::{CorrelationMethod, CorrelationTest, Kendall, PairStatistic, Pearson, Spearman};
pub use target::TargetCorrelation;
