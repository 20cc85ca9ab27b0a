use crate::error::{CorrelNetError, Result};

use super::model::Dataset;

// ---------------------------------------------------------------------------
// Column selection: which variables take part in the network
// ---------------------------------------------------------------------------

/// Keep only the named columns, in the order given.
///
/// An empty selection means "no filter" and returns the dataset unchanged.
pub fn select_columns(dataset: Dataset, columns: &[String]) -> Result<Dataset> {
    if columns.is_empty() {
        return Ok(dataset);
    }
    let indices = columns
        .iter()
        .map(|c| {
            dataset
                .index_of(c)
                .ok_or_else(|| CorrelNetError::UnknownColumn(c.clone()))
        })
        .collect::<Result<Vec<usize>>>()?;

    let (names, mut cols) = dataset.into_parts();
    let picked_names = indices.iter().map(|&i| names[i].clone()).collect();
    let picked_cols = indices
        .iter()
        .map(|&i| std::mem::take(&mut cols[i]))
        .collect();
    Dataset::new(picked_names, picked_cols)
}

/// Remove the target column from the dataset and return it separately.
///
/// The remaining dataset must still contain at least one variable.
pub fn split_target(dataset: Dataset, target: &str) -> Result<(Dataset, Vec<f64>)> {
    let idx = dataset
        .index_of(target)
        .ok_or_else(|| CorrelNetError::UnknownColumn(target.to_string()))?;
    let (mut names, mut cols) = dataset.into_parts();
    names.remove(idx);
    let target_values = cols.remove(idx);
    Ok((Dataset::new(names, cols)?, target_values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            ("a", vec![1.0, 2.0]),
            ("b", vec![3.0, 4.0]),
            ("c", vec![5.0, 6.0]),
        ])
        .unwrap()
    }

    #[test]
    fn empty_selection_keeps_everything() {
        let ds = select_columns(sample(), &[]).unwrap();
        assert_eq!(ds.n_vars(), 3);
    }

    #[test]
    fn selection_follows_requested_order() {
        let ds = select_columns(sample(), &["c".into(), "a".into()]).unwrap();
        assert_eq!(ds.names(), &["c".to_string(), "a".to_string()]);
        assert_eq!(ds.column(0), &[5.0, 6.0]);
    }

    #[test]
    fn unknown_column_is_reported() {
        let err = select_columns(sample(), &["nope".into()]).unwrap_err();
        assert!(matches!(err, CorrelNetError::UnknownColumn(c) if c == "nope"));
    }

    #[test]
    fn target_is_split_off() {
        let (ds, target) = split_target(sample(), "b").unwrap();
        assert_eq!(target, vec![3.0, 4.0]);
        assert_eq!(ds.names(), &["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn target_cannot_be_the_only_column() {
        let ds = Dataset::from_columns(vec![("y", vec![1.0])]).unwrap();
        assert!(matches!(split_target(ds, "y"), Err(CorrelNetError::EmptyDataset)));
    }
}
