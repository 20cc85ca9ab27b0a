use proptest::prelude::*;

use correlnet::network::significance_filter;
use correlnet::{Correction, CorrelationMethod, Correlater, Dataset};

fn same(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// 2..6 variables with 3..15 observations each.
fn dataset() -> impl Strategy<Value = Dataset> {
    (2usize..6, 3usize..15).prop_flat_map(|(p, n)| {
        prop::collection::vec(prop::collection::vec(-100.0f64..100.0, n), p).prop_map(|cols| {
            let named = cols
                .into_iter()
                .enumerate()
                .map(|(i, c)| (format!("v{i}"), c))
                .collect();
            Dataset::from_columns(named).unwrap()
        })
    })
}

fn method() -> impl Strategy<Value = CorrelationMethod> {
    prop::sample::select(CorrelationMethod::ALL.to_vec())
}

fn correction() -> impl Strategy<Value = Correction> {
    prop::sample::select(Correction::ALL.to_vec())
}

proptest! {
    /// The correlation matrix is symmetric with a unit diagonal.
    #[test]
    fn matrices_are_symmetric(ds in dataset(), method in method(), correction in correction()) {
        let (corr, sig) = Correlater::new(method, correction).pairwise(&ds).unwrap();
        for i in 0..corr.n() {
            prop_assert_eq!(corr.get(i, i), 1.0);
            for j in 0..corr.n() {
                prop_assert!(same(corr.get(i, j), corr.get(j, i)));
                prop_assert!(same(sig.get(i, j), sig.get(j, i)));
                let r = corr.get(i, j);
                prop_assert!(r.is_nan() || (-1.0 - 1e-12..=1.0 + 1e-12).contains(&r));
                let p = sig.get(i, j);
                prop_assert!(p.is_nan() || (0.0..=1.0).contains(&p));
            }
        }
    }

    /// Raising alpha only ever adds edges.
    #[test]
    fn edges_grow_with_alpha(ds in dataset(), method in method(), a in 1e-4f64..1.0, b in 1e-4f64..1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (corr, sig) = Correlater::new(method, Correction::None).pairwise(&ds).unwrap();
        let strict = significance_filter(&corr, &sig, lo).unwrap();
        let loose = significance_filter(&corr, &sig, hi).unwrap();
        for e in strict.edges() {
            prop_assert!(loose.has_edge(e.i, e.j));
        }
        prop_assert!(strict.n_edges() <= loose.n_edges());
    }

    /// A constant column never correlates with anything, whatever its value.
    #[test]
    fn constant_columns_are_undefined(
        ds in dataset(),
        level in prop_oneof![Just(0.1), Just(1.0 / 3.0), Just(-2.7), -100.0f64..100.0],
        method in method(),
    ) {
        let mut columns: Vec<(String, Vec<f64>)> = ds
            .names()
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), ds.column(i).to_vec()))
            .collect();
        columns.push(("const".to_string(), vec![level; ds.n_obs()]));
        let ds = Dataset::from_columns(columns).unwrap();

        let (corr, sig) = Correlater::new(method, Correction::Bonferroni).pairwise(&ds).unwrap();
        let k = corr.n() - 1;
        for i in 0..k {
            prop_assert!(corr.get(i, k).is_nan());
            prop_assert!(sig.get(i, k).is_nan());
            prop_assert!(corr.undefined_pairs().contains(&(i, k)));
        }
        let graph = significance_filter(&corr, &sig, 1.0).unwrap();
        prop_assert_eq!(graph.degrees()[k], 0);
    }

    /// Corrections never make a p-value smaller.
    #[test]
    fn corrections_are_conservative(raw in prop::collection::vec(0.0f64..=1.0, 1..30), correction in correction()) {
        let adjusted = correction.adjust(&raw);
        prop_assert_eq!(adjusted.len(), raw.len());
        for (p, q) in raw.iter().zip(&adjusted) {
            prop_assert!(*q >= p - 1e-12);
            prop_assert!(*q <= 1.0);
        }
    }
}
