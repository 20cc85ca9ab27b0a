use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::Result;

use super::{Embedder, EmbeddingPositions, VariableVectors, VectorSource};

/// Seeded generator; `None` draws the seed from the OS.
pub(crate) fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Box-Muller transform for a standard normal draw.
pub fn gauss<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Places every variable at an independent standard normal (x, y).
#[derive(Debug, Clone, Default)]
pub struct RandomEmbedding {
    pub seed: Option<u64>,
}

impl RandomEmbedding {
    pub fn new(seed: Option<u64>) -> Self {
        RandomEmbedding { seed }
    }
}

impl Embedder for RandomEmbedding {
    fn name(&self) -> &str {
        "random"
    }

    fn source(&self) -> VectorSource {
        // Only the names are used; correlation rows are already computed.
        VectorSource::CorrelationRows { use_abs: false }
    }

    fn embed(&self, vectors: &VariableVectors) -> Result<EmbeddingPositions> {
        let mut rng = seeded_rng(self.seed);
        let coords = vectors
            .names()
            .iter()
            .map(|_| [gauss(&mut rng), gauss(&mut rng)])
            .collect();
        EmbeddingPositions::new(vectors.names().to_vec(), coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors() -> VariableVectors {
        VariableVectors::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![0.0], vec![1.0], vec![2.0]],
        )
        .unwrap()
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let a = RandomEmbedding::new(Some(19)).embed(&vectors()).unwrap();
        let b = RandomEmbedding::new(Some(19)).embed(&vectors()).unwrap();
        assert_eq!(a, b);
        let c = RandomEmbedding::new(Some(20)).embed(&vectors()).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn one_position_per_variable() {
        let pos = RandomEmbedding::new(None).embed(&vectors()).unwrap();
        assert_eq!(pos.len(), 3);
        assert!(pos.get("b").is_some());
        assert!(pos.coords().iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn gauss_has_roughly_unit_variance() {
        let mut rng = seeded_rng(Some(7));
        let draws: Vec<f64> = (0..20_000).map(|_| gauss(&mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        let var = draws.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / draws.len() as f64;
        assert!(mean.abs() < 0.05);
        assert!((var - 1.0).abs() < 0.05);
    }
}
