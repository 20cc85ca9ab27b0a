/// Data layer: core types, loading, and column selection.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (numeric columns only)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  named columns, NaN = missing
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  pick columns, split off the target
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;

pub use model::{Dataset, VariableGroups};
