//! Correlation networks.
//!
//! Pairwise correlations between the variables of a dataset are filtered by
//! significance and drawn as a graph: one node per variable, one edge per
//! significant correlation, positions from a 2D embedding of the variables.
//!
//! ```no_run
//! use correlnet::{correlnet, data::loader, NetworkConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dataset = loader::load_file("measurements.csv".as_ref(), &Default::default())?;
//! let net = correlnet(dataset, None, None, &NetworkConfig::default())?;
//! net.plot("network.svg".as_ref())?;
//! # Ok(())
//! # }
//! ```

pub mod color;
pub mod config;
pub mod data;
pub mod embed;
pub mod error;
pub mod network;
pub mod plot;
pub mod stats;

pub use config::NetworkConfig;
pub use data::{Dataset, VariableGroups};
pub use embed::{Embedder, EmbeddingKind, EmbeddingPositions};
pub use error::{CorrelNetError, Result};
pub use network::{correlnet, AdjacencyGraph, CorrelNet};
pub use stats::{Correction, CorrelationMethod, Correlater};
