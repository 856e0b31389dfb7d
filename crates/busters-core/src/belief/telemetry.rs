use super::distribution::DiscreteDistribution;
use serde::Serialize;

/// Summary statistics of a belief distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BeliefMetrics {
    /// Shannon entropy in bits.
    pub entropy: f64,
    /// Largest probability assigned to a single key.
    pub peak: f64,
    /// Number of keys with positive probability.
    pub support: usize,
}

impl BeliefMetrics {
    /// Metrics of `belief` after normalization; an empty or massless belief
    /// yields all zeros.
    pub fn from_distribution<K: Ord + Clone>(belief: &DiscreteDistribution<K>) -> Self {
        let total = belief.total();
        if !(total > 0.0) {
            return Self {
                entropy: 0.0,
                peak: 0.0,
                support: 0,
            };
        }

        let mut entropy = 0.0;
        let mut peak: f64 = 0.0;
        let mut support = 0;
        for (_, weight) in belief {
            let p = weight / total;
            if p <= 0.0 {
                continue;
            }
            support += 1;
            peak = peak.max(p);
            entropy -= p * p.log2();
        }
        Self {
            entropy,
            peak,
            support,
        }
    }
}
