use crate::error::{CorrelNetError, Result};
use crate::stats::{CorrelationMatrix, SignificanceMatrix};

use super::graph::{AdjacencyGraph, Edge};

/// Check that `alpha` is a usable significance threshold.
pub fn validate_alpha(alpha: f64) -> Result<()> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(())
    } else {
        Err(CorrelNetError::InvalidAlpha(alpha))
    }
}

/// Keep the pairs whose p-value clears `alpha`.
///
/// An edge `(i, j)` with `i < j` is kept iff `p(i, j) <= alpha`. Self-loops
/// and undefined p-values never become edges.
pub fn significance_filter(
    corr: &CorrelationMatrix,
    sig: &SignificanceMatrix,
    alpha: f64,
) -> Result<AdjacencyGraph> {
    validate_alpha(alpha)?;
    if corr.n() != sig.n() {
        return Err(CorrelNetError::mismatch(
            "significance matrix size",
            corr.n(),
            sig.n(),
        ));
    }

    let n = corr.n();
    let mut edges = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let pvalue = sig.get(i, j);
            let statistic = corr.get(i, j);
            if pvalue.is_nan() || statistic.is_nan() {
                continue;
            }
            if pvalue <= alpha {
                edges.push(Edge {
                    i,
                    j,
                    statistic,
                    pvalue,
                });
            }
        }
    }
    log::debug!(
        "significance filter kept {} of {} pairs at alpha={alpha}",
        edges.len(),
        n * n.saturating_sub(1) / 2
    );
    Ok(AdjacencyGraph::new(corr.names().to_vec(), edges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::stats::{Correction, CorrelationMethod, Correlater};

    fn matrices() -> (CorrelationMatrix, SignificanceMatrix) {
        let ds = Dataset::from_columns(vec![
            ("a", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]),
            ("b", vec![1.1, 2.2, 2.9, 4.1, 5.2, 5.8, 7.1, 8.0]),
            ("c", vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]),
            ("k", vec![1.0; 8]),
        ])
        .unwrap();
        Correlater::new(CorrelationMethod::Pearson, Correction::None)
            .pairwise(&ds)
            .unwrap()
    }

    #[test]
    fn alpha_bounds() {
        let (corr, sig) = matrices();
        for bad in [0.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(
                significance_filter(&corr, &sig, bad),
                Err(CorrelNetError::InvalidAlpha(_))
            ));
        }
    }

    #[test]
    fn alpha_one_keeps_every_defined_pair() {
        let (corr, sig) = matrices();
        let graph = significance_filter(&corr, &sig, 1.0).unwrap();
        // 6 pairs, 3 of them involve the constant column
        assert_eq!(graph.n_edges(), 3);
        assert!(graph.edges().iter().all(|e| e.i < e.j));
    }

    #[test]
    fn tiny_alpha_keeps_none() {
        let (corr, sig) = matrices();
        let graph = significance_filter(&corr, &sig, 1e-300).unwrap();
        assert_eq!(graph.n_edges(), 0);
        assert_eq!(graph.n_nodes(), 4);
    }

    #[test]
    fn strong_pair_survives() {
        let (corr, sig) = matrices();
        let graph = significance_filter(&corr, &sig, 0.05).unwrap();
        assert!(graph.has_edge(1, 0));
        let named: Vec<_> = graph.named_edges().map(|(a, b, _)| (a, b)).collect();
        assert!(named.contains(&("a", "b")));
        assert_eq!(graph.degrees()[3], 0);
    }
}
