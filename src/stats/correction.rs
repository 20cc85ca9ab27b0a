use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CorrelNetError;

/// Multiple-comparison correction applied to the pairwise p-values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Correction {
    #[serde(rename = "none")]
    None,
    #[default]
    #[serde(rename = "bonferroni")]
    Bonferroni,
    #[serde(rename = "holm")]
    Holm,
    /// Benjamini–Hochberg false discovery rate.
    #[serde(rename = "fdr_bh")]
    BenjaminiHochberg,
}

impl Correction {
    pub const ALL: [Correction; 4] = [
        Correction::None,
        Correction::Bonferroni,
        Correction::Holm,
        Correction::BenjaminiHochberg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Correction::None => "none",
            Correction::Bonferroni => "bonferroni",
            Correction::Holm => "holm",
            Correction::BenjaminiHochberg => "fdr_bh",
        }
    }

    /// Adjust a family of p-values. Output order matches input order and
    /// every value is clipped to 1.
    pub fn adjust(&self, pvalues: &[f64]) -> Vec<f64> {
        let m = pvalues.len() as f64;
        match self {
            Correction::None => pvalues.to_vec(),
            Correction::Bonferroni => pvalues.iter().map(|p| (p * m).min(1.0)).collect(),
            Correction::Holm => {
                let order = ascending_order(pvalues);
                let mut adjusted = vec![0.0; pvalues.len()];
                let mut running_max: f64 = 0.0;
                for (rank, &idx) in order.iter().enumerate() {
                    let candidate = ((m - rank as f64) * pvalues[idx]).min(1.0);
                    running_max = running_max.max(candidate);
                    adjusted[idx] = running_max;
                }
                adjusted
            }
            Correction::BenjaminiHochberg => {
                let order = ascending_order(pvalues);
                let mut adjusted = vec![0.0; pvalues.len()];
                let mut running_min: f64 = 1.0;
                for (rank, &idx) in order.iter().enumerate().rev() {
                    let candidate = pvalues[idx] * m / (rank as f64 + 1.0);
                    running_min = running_min.min(candidate);
                    adjusted[idx] = running_min;
                }
                adjusted
            }
        }
    }
}

fn ascending_order(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    order
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Correction {
    type Err = CorrelNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Correction::None),
            "bonferroni" => Ok(Correction::Bonferroni),
            "holm" => Ok(Correction::Holm),
            "fdr_bh" | "bh" => Ok(Correction::BenjaminiHochberg),
            _ => Err(CorrelNetError::InvalidCorrection(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
        }
    }

    const P: [f64; 4] = [0.01, 0.04, 0.03, 0.20];

    #[test]
    fn bonferroni_scales_and_clips() {
        assert_all_close(&Correction::Bonferroni.adjust(&P), &[0.04, 0.16, 0.12, 0.8]);
        assert_all_close(&Correction::Bonferroni.adjust(&[0.5, 0.6]), &[1.0, 1.0]);
    }

    #[test]
    fn holm_step_down() {
        // sorted: 0.01*4, 0.03*3, 0.04*2, 0.20*1 → 0.04, 0.09, 0.08→0.09, 0.2
        assert_all_close(&Correction::Holm.adjust(&P), &[0.04, 0.09, 0.09, 0.2]);
    }

    #[test]
    fn benjamini_hochberg_step_up() {
        // sorted: 0.01*4/1, 0.03*4/2, 0.04*4/3, 0.20*4/4, then a running
        // minimum from the largest p-value down.
        let third = 0.04 * 4.0 / 3.0;
        assert_all_close(
            &Correction::BenjaminiHochberg.adjust(&P),
            &[0.04, third, third, 0.2],
        );
    }

    #[test]
    fn none_is_identity() {
        assert_all_close(&Correction::None.adjust(&P), &P);
    }

    #[test]
    fn names_round_trip() {
        for c in Correction::ALL {
            assert_eq!(c.as_str().parse::<Correction>().unwrap(), c);
        }
        assert!(matches!(
            "sidak".parse::<Correction>(),
            Err(CorrelNetError::InvalidCorrection(_))
        ));
    }
}
