use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::error::CorrelNetError;

use super::rank::{average_ranks, tie_groups};

/// Coefficient and two-sided p-value for one pair of variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairStatistic {
    pub statistic: f64,
    pub pvalue: f64,
}

impl PairStatistic {
    pub const UNDEFINED: PairStatistic = PairStatistic {
        statistic: f64::NAN,
        pvalue: f64::NAN,
    };

    pub fn is_defined(&self) -> bool {
        !self.statistic.is_nan() && !self.pvalue.is_nan()
    }
}

/// A correlation coefficient together with its significance test.
///
/// Callers pass complete observations only (no `NaN`). Fewer than two
/// observations, slices of different length and constant inputs all come
/// back as [`PairStatistic::UNDEFINED`].
pub trait CorrelationTest: Send + Sync {
    /// Short name, used in logs and as the colour bar label.
    fn name(&self) -> &str;

    fn test(&self, x: &[f64], y: &[f64]) -> PairStatistic;
}

// ---------------------------------------------------------------------------
// Method selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    Spearman,
    Kendall,
}

impl CorrelationMethod {
    pub const ALL: [CorrelationMethod; 3] = [
        CorrelationMethod::Pearson,
        CorrelationMethod::Spearman,
        CorrelationMethod::Kendall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
            CorrelationMethod::Kendall => "kendall",
        }
    }

    /// The test implementing this method.
    pub fn test(&self) -> Box<dyn CorrelationTest> {
        match self {
            CorrelationMethod::Pearson => Box::new(Pearson),
            CorrelationMethod::Spearman => Box::new(Spearman),
            CorrelationMethod::Kendall => Box::new(Kendall),
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationMethod {
    type Err = CorrelNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            "kendall" => Ok(CorrelationMethod::Kendall),
            _ => Err(CorrelNetError::InvalidMethod(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Pearson
// ---------------------------------------------------------------------------

/// Product-moment correlation with a t-test on n − 2 degrees of freedom.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pearson;

impl CorrelationTest for Pearson {
    fn name(&self) -> &str {
        "pearson"
    }

    fn test(&self, x: &[f64], y: &[f64]) -> PairStatistic {
        if !comparable(x, y) || is_constant(x) || is_constant(y) {
            return PairStatistic::UNDEFINED;
        }
        let n = x.len();
        let r = pearson_r(x, y);
        if r.is_nan() {
            return PairStatistic::UNDEFINED;
        }
        PairStatistic {
            statistic: r,
            pvalue: r_pvalue(r, n),
        }
    }
}

fn comparable(x: &[f64], y: &[f64]) -> bool {
    x.len() == y.len() && x.len() >= 2
}

/// Exact comparison: a centred constant column can leave rounding residue
/// in its sum of squares.
fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

fn pearson_r(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Two-sided p-value of a correlation coefficient from the t distribution.
fn r_pvalue(r: f64, n: usize) -> f64 {
    if n <= 2 {
        // Two points always lie on a line.
        return 1.0;
    }
    let df = (n - 2) as f64;
    let one_minus_r2 = 1.0 - r * r;
    if one_minus_r2 <= 0.0 {
        return 0.0;
    }
    let t = r * (df / one_minus_r2).sqrt();
    StudentsT::new(0.0, 1.0, df)
        .map(|dist| (2.0 * dist.sf(t.abs())).min(1.0))
        .unwrap_or(f64::NAN)
}

// ---------------------------------------------------------------------------
// Spearman
// ---------------------------------------------------------------------------

/// Rank correlation: Pearson on average ranks, same t-test.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spearman;

impl CorrelationTest for Spearman {
    fn name(&self) -> &str {
        "spearman"
    }

    fn test(&self, x: &[f64], y: &[f64]) -> PairStatistic {
        Pearson.test(&average_ranks(x), &average_ranks(y))
    }
}

// ---------------------------------------------------------------------------
// Kendall
// ---------------------------------------------------------------------------

/// Largest sample size for which the exact null distribution is used.
const KENDALL_EXACT_MAX_N: usize = 33;

/// Kendall's tau-b.
///
/// Without ties and for small samples the p-value comes from the exact
/// distribution of discordant pairs; otherwise from the normal
/// approximation with tie-corrected variance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kendall;

impl CorrelationTest for Kendall {
    fn name(&self) -> &str {
        "kendall"
    }

    fn test(&self, x: &[f64], y: &[f64]) -> PairStatistic {
        if !comparable(x, y) {
            return PairStatistic::UNDEFINED;
        }
        let n = x.len();
        let (mut concordant, mut discordant) = (0u64, 0u64);
        let (mut tied_x, mut tied_y) = (0u64, 0u64);
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = x[i] - x[j];
                let dy = y[i] - y[j];
                if dx == 0.0 {
                    tied_x += 1;
                }
                if dy == 0.0 {
                    tied_y += 1;
                }
                if dx == 0.0 || dy == 0.0 {
                    continue;
                }
                if (dx > 0.0) == (dy > 0.0) {
                    concordant += 1;
                } else {
                    discordant += 1;
                }
            }
        }

        let total = (n * (n - 1) / 2) as f64;
        let denom = ((total - tied_x as f64) * (total - tied_y as f64)).sqrt();
        if denom == 0.0 {
            return PairStatistic::UNDEFINED;
        }
        let con_minus_dis = concordant as f64 - discordant as f64;
        let tau = (con_minus_dis / denom).clamp(-1.0, 1.0);

        let pvalue = if tied_x == 0 && tied_y == 0 && n <= KENDALL_EXACT_MAX_N {
            let c = discordant.min(concordant) as usize;
            kendall_exact_pvalue(n, c)
        } else {
            kendall_normal_pvalue(x, y, con_minus_dis)
        };

        PairStatistic {
            statistic: tau,
            pvalue,
        }
    }
}

/// Two-sided exact p-value: 2·P(D ≤ c) where D counts inversions of a
/// uniformly random permutation of `n` items.
fn kendall_exact_pvalue(n: usize, c: usize) -> f64 {
    // dist[k] = P(permutation of the first m items has k inversions)
    let mut dist = vec![1.0f64];
    for m in 2..=n {
        let max_inv = dist.len() - 1 + (m - 1);
        let mut next = vec![0.0; max_inv + 1];
        for (k, &p) in dist.iter().enumerate() {
            let share = p / m as f64;
            for slot in next.iter_mut().skip(k).take(m) {
                *slot += share;
            }
        }
        dist = next;
    }
    let tail: f64 = dist.iter().take(c + 1).sum();
    (2.0 * tail).min(1.0)
}

fn kendall_normal_pvalue(x: &[f64], y: &[f64], con_minus_dis: f64) -> f64 {
    let n = x.len() as f64;
    let (x_pairs, x_t3, x_t5) = tie_terms(x);
    let (y_pairs, y_t3, y_t5) = tie_terms(y);

    let m = n * (n - 1.0);
    let mut var = (m * (2.0 * n + 5.0) - x_t5 - y_t5) / 18.0 + (2.0 * x_pairs * y_pairs) / m;
    if n > 2.0 {
        var += x_t3 * y_t3 / (9.0 * m * (n - 2.0));
    }
    if var <= 0.0 {
        return f64::NAN;
    }
    let z = con_minus_dis / var.sqrt();
    (2.0 * Normal::standard().sf(z.abs())).min(1.0)
}

/// Σ t(t−1)/2, Σ t(t−1)(t−2) and Σ t(t−1)(2t+5) over tie groups of size t.
fn tie_terms(values: &[f64]) -> (f64, f64, f64) {
    tie_groups(values)
        .into_iter()
        .map(|t| t as f64)
        .fold((0.0, 0.0, 0.0), |(a, b, c), t| {
            (
                a + t * (t - 1.0) / 2.0,
                b + t * (t - 1.0) * (t - 2.0),
                c + t * (t - 1.0) * (2.0 * t + 5.0),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn method_names_parse() {
        assert_eq!("Pearson".parse::<CorrelationMethod>().unwrap(), CorrelationMethod::Pearson);
        assert_eq!("kendall".parse::<CorrelationMethod>().unwrap(), CorrelationMethod::Kendall);
        let err = "foo".parse::<CorrelationMethod>().unwrap_err();
        assert!(matches!(err, CorrelNetError::InvalidMethod(m) if m == "foo"));
    }

    #[test]
    fn pearson_known_value() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let s = Pearson.test(&x, &y);
        assert!(close(s.statistic, 0.774_596_669_241_483_4, 1e-12));
        assert!(close(s.pvalue, 0.124_027_062_657_588_9, 1e-7));
    }

    #[test]
    fn pearson_perfect_line_has_zero_pvalue() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [-2.0, -4.0, -6.0, -8.0];
        let s = Pearson.test(&x, &y);
        assert!(close(s.statistic, -1.0, 1e-12));
        assert!(s.pvalue < 1e-10);
    }

    #[test]
    fn pearson_two_points() {
        let s = Pearson.test(&[1.0, 2.0], &[3.0, 1.0]);
        assert!(close(s.statistic, -1.0, 1e-12));
        assert_eq!(s.pvalue, 1.0);
    }

    #[test]
    fn constant_input_is_undefined() {
        let s = Pearson.test(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]);
        assert!(!s.is_defined());
        assert!(!Kendall.test(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_defined());
    }

    #[test]
    fn spearman_is_monotone_invariant() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y: Vec<f64> = x.iter().map(|v: &f64| v.powi(3)).collect();
        let s = Spearman.test(&x, &y);
        assert!(close(s.statistic, 1.0, 1e-12));
    }

    #[test]
    fn spearman_with_ties() {
        let x = [1.0, 2.0, 2.0, 3.0];
        let y = [1.0, 3.0, 2.0, 4.0];
        let s = Spearman.test(&x, &y);
        // ranks x = [1, 2.5, 2.5, 4], y = [1, 3, 2, 4]
        assert!(close(s.statistic, 0.948_683_298_050_513_8, 1e-12));
    }

    #[test]
    fn kendall_exact_small_sample() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [3.0, 4.0, 1.0, 2.0, 5.0];
        let s = Kendall.test(&x, &y);
        assert!(close(s.statistic, 0.2, 1e-12));
        // 4 discordant pairs: 2 * P(D <= 4) for n = 5 = 2 * 49/120
        assert!(close(s.pvalue, 98.0 / 120.0, 1e-12));
    }

    #[test]
    fn kendall_exact_extremes() {
        assert!(close(kendall_exact_pvalue(4, 0), 2.0 / 24.0, 1e-12));
        assert_eq!(kendall_exact_pvalue(3, 3), 1.0);
    }

    #[test]
    fn kendall_with_ties_uses_tau_b() {
        let x = [1.0, 2.0, 2.0, 3.0, 4.0];
        let y = [1.0, 2.0, 3.0, 3.0, 4.0];
        let s = Kendall.test(&x, &y);
        // C = 8, D = 0, one tie in each variable: tau_b = 8 / sqrt(9 * 9)
        assert!(close(s.statistic, 8.0 / 9.0, 1e-12));
        // var(S) = 14.7667 after the tie correction, z = 2.0818
        assert!(close(s.pvalue, 0.037_356_472_445_581_76, 1e-9));
    }

    #[test]
    fn kendall_large_sample_uses_normal_approximation() {
        let x: Vec<f64> = (0..40).map(f64::from).collect();
        let y: Vec<f64> = (0..40).map(|i| ((7 * i) % 40) as f64).collect();
        let s = Kendall.test(&x, &y);
        // C = 447, D = 333 out of 780 pairs
        assert!(close(s.statistic, 114.0 / 780.0, 1e-12));
        assert!(close(s.pvalue, 0.184_106_119_496_079_75, 1e-9));
    }

    #[test]
    fn spearman_pvalue_matches_t_test() {
        let s = Spearman.test(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 1.0, 4.0, 3.0, 5.0]);
        assert!(close(s.statistic, 0.8, 1e-12));
        // t = 2.3094 on 3 degrees of freedom
        assert!(close(s.pvalue, 0.104_088_038_661_827_81, 1e-9));
    }

    #[test]
    fn decimal_constant_is_undefined() {
        // the mean of [0.1; 3] is not exactly 0.1
        let k = [0.1, 0.1, 0.1];
        for other in [[1.0, 2.0, 4.0], [3.0, 1.0, 2.0]] {
            assert!(!Pearson.test(&k, &other).is_defined());
            assert!(!Spearman.test(&k, &other).is_defined());
            assert!(!Kendall.test(&k, &other).is_defined());
        }
        let third = [1.0 / 3.0; 7];
        let ramp = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert!(!Pearson.test(&ramp, &third).is_defined());
    }

    #[test]
    fn short_or_mismatched_input_is_undefined() {
        for test in [&Pearson as &dyn CorrelationTest, &Spearman, &Kendall] {
            assert!(!test.test(&[], &[]).is_defined(), "{}", test.name());
            assert!(!test.test(&[1.0], &[2.0]).is_defined(), "{}", test.name());
            assert!(!test.test(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_defined(), "{}", test.name());
        }
    }
}
