use serde::Serialize;

use crate::data::Dataset;
use crate::error::{CorrelNetError, Result};

use super::correlater::correlate_pair;
use super::method::CorrelationTest;

/// Correlation of every variable with a target vector, used to colour nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetCorrelation {
    names: Vec<String>,
    values: Vec<f64>,
    pvalues: Vec<f64>,
}

impl TargetCorrelation {
    /// Correlate each dataset column with `target`.
    ///
    /// The target must have one value per observation; missing values on
    /// either side are dropped pairwise.
    pub fn compute(dataset: &Dataset, target: &[f64], test: &dyn CorrelationTest) -> Result<Self> {
        if target.len() != dataset.n_obs() {
            return Err(CorrelNetError::mismatch(
                "target length",
                dataset.n_obs(),
                target.len(),
            ));
        }
        let mut values = Vec::with_capacity(dataset.n_vars());
        let mut pvalues = Vec::with_capacity(dataset.n_vars());
        for (i, name) in dataset.names().iter().enumerate() {
            let stat = correlate_pair(test, (name.as_str(), dataset.column(i)), ("target", target))?;
            if !stat.is_defined() {
                log::warn!("correlation of '{name}' with the target is undefined");
            }
            values.push(stat.statistic);
            pvalues.push(stat.pvalue);
        }
        log::debug!("annotated {} variables with {} target correlation", values.len(), test.name());
        Ok(TargetCorrelation {
            names: dataset.names().to_vec(),
            values,
            pvalues,
        })
    }

    /// Build from precomputed values, one per variable.
    pub fn from_values(names: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(CorrelNetError::mismatch(
                "number of target correlations",
                names.len(),
                values.len(),
            ));
        }
        let pvalues = vec![f64::NAN; values.len()];
        Ok(TargetCorrelation {
            names,
            values,
            pvalues,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn pvalues(&self) -> &[f64] {
        &self.pvalues
    }

    pub fn get(&self, variable: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == variable)
            .map(|i| self.values[i])
    }

    /// Check that every variable has a target correlation.
    pub fn ensure_covers(&self, variables: &[String]) -> Result<()> {
        let covered = variables.iter().filter(|v| self.get(v).is_some()).count();
        if covered != variables.len() {
            return Err(CorrelNetError::mismatch(
                "variables with a target correlation",
                variables.len(),
                covered,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::method::{Kendall, Pearson};

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            ("up", vec![1.0, 2.0, 3.0, 4.0]),
            ("down", vec![4.0, 3.0, 2.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn signs_follow_the_target() {
        let target = [10.0, 20.0, 30.0, 40.0];
        let tc = TargetCorrelation::compute(&dataset(), &target, &Pearson).unwrap();
        assert!((tc.get("up").unwrap() - 1.0).abs() < 1e-12);
        assert!((tc.get("down").unwrap() + 1.0).abs() < 1e-12);

        let tc = TargetCorrelation::compute(&dataset(), &target, &Kendall).unwrap();
        assert_eq!(tc.values(), &[1.0, -1.0]);
    }

    #[test]
    fn target_length_must_match() {
        let err = TargetCorrelation::compute(&dataset(), &[1.0, 2.0], &Pearson).unwrap_err();
        assert!(matches!(
            err,
            CorrelNetError::LengthMismatch { expected: 4, actual: 2, .. }
        ));
    }

    #[test]
    fn coverage_check() {
        let tc = TargetCorrelation::from_values(vec!["a".into()], vec![0.5]).unwrap();
        assert!(tc.ensure_covers(&["a".into()]).is_ok());
        assert!(tc.ensure_covers(&["a".into(), "b".into()]).is_err());
    }
}
