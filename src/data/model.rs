use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{CorrelNetError, Result};

// ---------------------------------------------------------------------------
// Dataset – the numeric table the network is built from
// ---------------------------------------------------------------------------

/// A rectangular table of numeric observations.
///
/// Rows are samples, columns are named variables. Missing cells are kept as
/// `NaN` and dropped pairwise when correlating.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_obs: usize,
}

impl Dataset {
    /// Build a dataset from named columns.
    ///
    /// Fails when there are no columns, when names repeat, or when the
    /// columns do not all have the same length.
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(CorrelNetError::mismatch(
                "number of column names",
                columns.len(),
                names.len(),
            ));
        }
        if columns.is_empty() {
            return Err(CorrelNetError::EmptyDataset);
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(CorrelNetError::DuplicateColumn(name.clone()));
            }
        }

        let n_obs = columns[0].len();
        for (name, col) in names.iter().zip(&columns) {
            if col.len() != n_obs {
                return Err(CorrelNetError::mismatch(
                    format!("length of column '{name}'"),
                    n_obs,
                    col.len(),
                ));
            }
        }

        Ok(Dataset {
            names,
            columns,
            n_obs,
        })
    }

    /// Build a dataset from `(name, values)` pairs.
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self> {
        let (names, columns): (Vec<String>, Vec<Vec<f64>>) =
            columns.into_iter().map(|(n, c)| (n.into(), c)).unzip();
        Dataset::new(names, columns)
    }

    /// Variable names, in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of variables (columns).
    pub fn n_vars(&self) -> usize {
        self.names.len()
    }

    /// Number of observations (rows).
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    pub fn column(&self, idx: usize) -> &[f64] {
        &self.columns[idx]
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Position of a variable by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&[f64]> {
        self.index_of(name).map(|i| self.column(i))
    }

    /// Whether any cell is missing.
    pub fn has_missing(&self) -> bool {
        self.columns.iter().flatten().any(|v| v.is_nan())
    }

    /// Split into owned names and columns.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<f64>>) {
        (self.names, self.columns)
    }
}

// ---------------------------------------------------------------------------
// VariableGroups – optional variable → group label mapping
// ---------------------------------------------------------------------------

/// Group labels per variable, used only to style nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableGroups {
    labels: BTreeMap<String, String>,
}

impl VariableGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variable: impl Into<String>, group: impl Into<String>) {
        self.labels.insert(variable.into(), group.into());
    }

    pub fn group_of(&self, variable: &str) -> Option<&str> {
        self.labels.get(variable).map(String::as_str)
    }

    /// Sorted set of distinct group labels.
    pub fn unique_groups(&self) -> BTreeSet<&str> {
        self.labels.values().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Check that every variable has a group.
    pub fn ensure_covers(&self, variables: &[String]) -> Result<()> {
        let missing = variables
            .iter()
            .filter(|v| !self.labels.contains_key(v.as_str()))
            .count();
        if missing > 0 {
            return Err(CorrelNetError::mismatch(
                "variables with a group label",
                variables.len(),
                variables.len() - missing,
            ));
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableGroups {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        VariableGroups {
            labels: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_columns() {
        let err = Dataset::from_columns(vec![("a", vec![1.0, 2.0]), ("b", vec![1.0])]).unwrap_err();
        assert!(matches!(err, CorrelNetError::LengthMismatch { .. }));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Dataset::from_columns(vec![("a", vec![1.0]), ("a", vec![2.0])]).unwrap_err();
        assert!(matches!(err, CorrelNetError::DuplicateColumn(name) if name == "a"));
    }

    #[test]
    fn rejects_empty() {
        let err = Dataset::new(Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, CorrelNetError::EmptyDataset));
    }

    #[test]
    fn lookup_by_name() {
        let ds = Dataset::from_columns(vec![("a", vec![1.0, f64::NAN]), ("b", vec![3.0, 4.0])]).unwrap();
        assert_eq!(ds.n_vars(), 2);
        assert_eq!(ds.n_obs(), 2);
        assert_eq!(ds.column_by_name("b"), Some(&[3.0, 4.0][..]));
        assert!(ds.has_missing());
        assert_eq!(ds.index_of("zzz"), None);
    }

    #[test]
    fn groups_must_cover_variables() {
        let groups: VariableGroups = [("a", "g1"), ("b", "g2")].into_iter().collect();
        assert!(groups.ensure_covers(&["a".into(), "b".into()]).is_ok());
        assert!(groups.ensure_covers(&["a".into(), "c".into()]).is_err());
        assert_eq!(groups.unique_groups().len(), 2);
    }
}
