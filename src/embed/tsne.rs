//! Exact t-SNE for small inputs (one point per variable).
//!
//! Perplexity is calibrated per point by binary search, then the 2D layout
//! is optimised by gradient descent with early exaggeration, momentum and
//! adaptive gains.

use serde::{Deserialize, Serialize};

use crate::error::{CorrelNetError, Result};

use super::random::{gauss, seeded_rng};

const EARLY_EXAGGERATION: f64 = 12.0;
const EXAGGERATION_ITERS: usize = 250;
const INITIAL_MOMENTUM: f64 = 0.5;
const FINAL_MOMENTUM: f64 = 0.8;
const MIN_GAIN: f64 = 0.01;
const P_FLOOR: f64 = 1e-12;
const PERPLEXITY_TOL: f64 = 1e-5;
const PERPLEXITY_STEPS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TsneParams {
    /// Effective number of neighbours.
    pub perplexity: f64,
    /// Gradient descent iterations.
    pub n_iter: usize,
    /// Seed for the initial layout.
    pub seed: Option<u64>,
}

impl Default for TsneParams {
    fn default() -> Self {
        TsneParams {
            perplexity: 30.0,
            n_iter: 1000,
            seed: None,
        }
    }
}

impl TsneParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.perplexity > 0.0 && self.perplexity.is_finite()) {
            return Err(CorrelNetError::InvalidParameter {
                name: "perplexity",
                reason: format!("must be positive, got {}", self.perplexity),
            });
        }
        if self.n_iter == 0 {
            return Err(CorrelNetError::InvalidParameter {
                name: "n_iter",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Reduce `data` (one row per point) to 2D.
pub fn fit(data: &[Vec<f64>], params: &TsneParams) -> Result<Vec<[f64; 2]>> {
    params.validate()?;
    let n = data.len();
    if n <= 1 {
        return Ok(vec![[0.0, 0.0]; n]);
    }

    let mut perplexity = params.perplexity;
    if perplexity >= n as f64 {
        let clamped = ((n - 1) as f64 / 3.0).max(1.0);
        log::warn!("perplexity {perplexity} >= {n} points, using {clamped:.2}");
        perplexity = clamped;
    }

    if data.iter().flatten().any(|v| v.is_nan()) {
        log::warn!("replacing NaNs with 0 for t-SNE");
    }
    let dist = squared_distances(data);
    let p = joint_probabilities(&dist, n, perplexity);

    log::info!("fitting t-SNE on {n} points (perplexity {perplexity:.2})...");
    Ok(optimise(&p, n, params))
}

fn squared_distances(data: &[Vec<f64>]) -> Vec<f64> {
    let n = data.len();
    let clean = |v: f64| if v.is_nan() { 0.0 } else { v };
    let mut dist = vec![0.0; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d: f64 = data[i]
                .iter()
                .zip(&data[j])
                .map(|(&a, &b)| (clean(a) - clean(b)).powi(2))
                .sum();
            dist[i * n + j] = d;
            dist[j * n + i] = d;
        }
    }
    dist
}

/// Symmetrised affinities P_ij = (p_j|i + p_i|j) / 2n.
fn joint_probabilities(dist: &[f64], n: usize, perplexity: f64) -> Vec<f64> {
    let target_entropy = perplexity.ln();
    let mut cond = vec![0.0; n * n];

    for i in 0..n {
        let row = &dist[i * n..(i + 1) * n];
        // Shift by the nearest neighbour distance; P is unchanged.
        let d_min = (0..n)
            .filter(|&j| j != i)
            .map(|j| row[j])
            .fold(f64::INFINITY, f64::min);

        let mut beta = 1.0;
        let (mut lo, mut hi) = (f64::NEG_INFINITY, f64::INFINITY);
        let mut probs = vec![0.0; n];
        for _ in 0..PERPLEXITY_STEPS {
            let mut sum = 0.0;
            let mut weighted = 0.0;
            for j in 0..n {
                if j == i {
                    probs[j] = 0.0;
                    continue;
                }
                let d = row[j] - d_min;
                let pj = (-d * beta).exp();
                probs[j] = pj;
                sum += pj;
                weighted += d * pj;
            }
            let sum = sum.max(f64::MIN_POSITIVE);
            let entropy = sum.ln() + beta * weighted / sum;
            for pj in probs.iter_mut() {
                *pj /= sum;
            }

            let diff = entropy - target_entropy;
            if diff.abs() < PERPLEXITY_TOL {
                break;
            }
            if diff > 0.0 {
                lo = beta;
                beta = if hi.is_infinite() { beta * 2.0 } else { (beta + hi) / 2.0 };
            } else {
                hi = beta;
                beta = if lo.is_infinite() { beta / 2.0 } else { (beta + lo) / 2.0 };
            }
        }
        cond[i * n..(i + 1) * n].copy_from_slice(&probs);
    }

    let denom = 2.0 * n as f64;
    let mut p = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                p[i * n + j] = ((cond[i * n + j] + cond[j * n + i]) / denom).max(P_FLOOR);
            }
        }
    }
    p
}

fn optimise(p: &[f64], n: usize, params: &TsneParams) -> Vec<[f64; 2]> {
    let mut rng = seeded_rng(params.seed);
    let mut y: Vec<[f64; 2]> = (0..n)
        .map(|_| [gauss(&mut rng) * 1e-4, gauss(&mut rng) * 1e-4])
        .collect();
    let mut update = vec![[0.0; 2]; n];
    let mut gains = vec![[1.0f64; 2]; n];
    let learning_rate = (n as f64 / EARLY_EXAGGERATION / 4.0).max(50.0);

    let mut num = vec![0.0; n * n];
    let mut grad = vec![[0.0; 2]; n];

    for iter in 0..params.n_iter {
        let (exaggeration, momentum) = if iter < EXAGGERATION_ITERS {
            (EARLY_EXAGGERATION, INITIAL_MOMENTUM)
        } else {
            (1.0, FINAL_MOMENTUM)
        };

        // Student-t kernel between embedded points.
        let mut sum_num = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let dx = y[i][0] - y[j][0];
                let dy = y[i][1] - y[j][1];
                let q = 1.0 / (1.0 + dx * dx + dy * dy);
                num[i * n + j] = q;
                num[j * n + i] = q;
                sum_num += 2.0 * q;
            }
        }
        let sum_num = sum_num.max(f64::MIN_POSITIVE);

        for (i, g) in grad.iter_mut().enumerate() {
            let mut gx = 0.0;
            let mut gy = 0.0;
            for j in 0..n {
                if i == j {
                    continue;
                }
                let q = num[i * n + j];
                let mult = (exaggeration * p[i * n + j] - q / sum_num) * q;
                gx += mult * (y[i][0] - y[j][0]);
                gy += mult * (y[i][1] - y[j][1]);
            }
            *g = [4.0 * gx, 4.0 * gy];
        }

        for i in 0..n {
            for d in 0..2 {
                if update[i][d] * grad[i][d] < 0.0 {
                    gains[i][d] += 0.2;
                } else {
                    gains[i][d] = (gains[i][d] * 0.8).max(MIN_GAIN);
                }
                update[i][d] = momentum * update[i][d] - learning_rate * gains[i][d] * grad[i][d];
                y[i][d] += update[i][d];
            }
        }

        let mean_x = y.iter().map(|p| p[0]).sum::<f64>() / n as f64;
        let mean_y = y.iter().map(|p| p[1]).sum::<f64>() / n as f64;
        for point in y.iter_mut() {
            point[0] -= mean_x;
            point[1] -= mean_y;
        }

        if log::log_enabled!(log::Level::Debug) && (iter + 1) % 250 == 0 {
            log::debug!(
                "t-SNE iteration {}: KL divergence {:.4}",
                iter + 1,
                kl_divergence(p, &num, sum_num, n)
            );
        }
    }
    y
}

fn kl_divergence(p: &[f64], num: &[f64], sum_num: f64, n: usize) -> f64 {
    let mut kl = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let pij = p[i * n + j];
                let qij = (num[i * n + j] / sum_num).max(P_FLOOR);
                kl += pij * (pij / qij).ln();
            }
        }
    }
    kl
}
