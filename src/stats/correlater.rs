use std::sync::Arc;

use crate::data::Dataset;
use crate::error::{CorrelNetError, Result};

use super::correction::Correction;
use super::method::{CorrelationMethod, CorrelationTest, PairStatistic};

// ---------------------------------------------------------------------------
// Labelled square matrices
// ---------------------------------------------------------------------------

/// A square matrix indexed by variable, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix {
    names: Arc<[String]>,
    values: Vec<f64>,
}

impl LabeledMatrix {
    fn filled(names: Arc<[String]>, value: f64) -> Self {
        let n = names.len();
        LabeledMatrix {
            names,
            values: vec![value; n * n],
        }
    }

    pub fn n(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n() + j]
    }

    pub fn get_by_name(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.get(i, j))
    }

    /// Row `i`: the values of variable `i` against every variable.
    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.n();
        &self.values[i * n..(i + 1) * n]
    }

    fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        let n = self.n();
        self.values[i * n + j] = value;
        self.values[j * n + i] = value;
    }
}

/// Pairwise coefficients in [-1, 1], symmetric, unit diagonal.
/// Undefined pairs hold `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix(LabeledMatrix);

/// Pairwise p-values parallel to a [`CorrelationMatrix`]; diagonal is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificanceMatrix(LabeledMatrix);

impl std::ops::Deref for CorrelationMatrix {
    type Target = LabeledMatrix;

    fn deref(&self) -> &LabeledMatrix {
        &self.0
    }
}

impl std::ops::Deref for SignificanceMatrix {
    type Target = LabeledMatrix;

    fn deref(&self) -> &LabeledMatrix {
        &self.0
    }
}

impl CorrelationMatrix {
    /// Off-diagonal pairs (i < j) whose coefficient is undefined.
    pub fn undefined_pairs(&self) -> Vec<(usize, usize)> {
        let n = self.n();
        (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .filter(|&(i, j)| self.get(i, j).is_nan())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Correlater
// ---------------------------------------------------------------------------

/// Computes corrected pairwise correlations between all dataset variables.
pub struct Correlater {
    test: Box<dyn CorrelationTest>,
    correction: Correction,
}

impl std::fmt::Debug for Correlater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Correlater")
            .field("method", &self.test.name())
            .field("correction", &self.correction)
            .finish()
    }
}

impl Correlater {
    pub fn new(method: CorrelationMethod, correction: Correction) -> Self {
        Self::with_test(method.test(), correction)
    }

    /// Use a custom correlation test.
    pub fn with_test(test: Box<dyn CorrelationTest>, correction: Correction) -> Self {
        Correlater { test, correction }
    }

    /// Select the method by name (`pearson`, `spearman` or `kendall`).
    pub fn from_name(method: &str, correction: Correction) -> Result<Self> {
        Ok(Self::new(method.parse()?, correction))
    }

    pub fn method_name(&self) -> &str {
        self.test.name()
    }

    pub fn correction(&self) -> Correction {
        self.correction
    }

    pub fn test(&self) -> &dyn CorrelationTest {
        self.test.as_ref()
    }

    /// Correlate every pair of variables.
    ///
    /// Rows with a missing value in either variable are dropped per pair.
    pub fn pairwise(&self, dataset: &Dataset) -> Result<(CorrelationMatrix, SignificanceMatrix)> {
        let names: Arc<[String]> = dataset.names().into();
        let n = names.len();
        let mut corr = LabeledMatrix::filled(names.clone(), 1.0);
        let mut sig = LabeledMatrix::filled(names.clone(), 0.0);

        let mut family: Vec<(usize, usize, f64)> = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                log::debug!("computing correlation: {},{}", names[i], names[j]);
                let stat = correlate_pair(
                    self.test.as_ref(),
                    (names[i].as_str(), dataset.column(i)),
                    (names[j].as_str(), dataset.column(j)),
                )?;
                corr.set_symmetric(i, j, stat.statistic);
                sig.set_symmetric(i, j, stat.pvalue);
                if stat.is_defined() {
                    family.push((i, j, stat.pvalue));
                }
            }
        }

        if self.correction != Correction::None && !family.is_empty() {
            log::debug!(
                "applying {} correction to {} p-values",
                self.correction,
                family.len()
            );
            let raw: Vec<f64> = family.iter().map(|&(_, _, p)| p).collect();
            let adjusted = self.correction.adjust(&raw);
            for (&(i, j, _), p) in family.iter().zip(adjusted) {
                sig.set_symmetric(i, j, p);
            }
        }

        let corr = CorrelationMatrix(corr);
        let undefined = corr.undefined_pairs();
        if !undefined.is_empty() {
            let shown: Vec<String> = undefined
                .iter()
                .take(10)
                .map(|&(i, j)| format!("({}, {})", names[i], names[j]))
                .collect();
            log::warn!(
                "{} correlation(s) are undefined (constant input): {}{}",
                undefined.len(),
                shown.join(", "),
                if undefined.len() > shown.len() { ", ..." } else { "" }
            );
        }
        log::info!(
            "computed {} {} correlations over {} variables",
            n * n.saturating_sub(1) / 2,
            self.test.name(),
            n
        );

        Ok((corr, SignificanceMatrix(sig)))
    }
}

/// Run one test on the complete observations of two columns.
pub(crate) fn correlate_pair(
    test: &dyn CorrelationTest,
    (name_x, x): (&str, &[f64]),
    (name_y, y): (&str, &[f64]),
) -> Result<PairStatistic> {
    if x.len() != y.len() {
        return Err(CorrelNetError::mismatch(
            format!("length of '{name_y}' (to match '{name_x}')"),
            x.len(),
            y.len(),
        ));
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .unzip();
    if xs.len() < 2 {
        return Err(CorrelNetError::InsufficientData {
            var_1: name_x.to_string(),
            var_2: name_y.to_string(),
            n: xs.len(),
        });
    }
    Ok(test.test(&xs, &ys))
}
