use rand::Rng;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Non-negative weights over discrete keys.
///
/// Keys are kept in ascending order, which fixes both the `arg_max` tie-break
/// and the walk order used by `sample`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteDistribution<K: Ord> {
    weights: BTreeMap<K, f64>,
}

impl<K: Ord> Default for DiscreteDistribution<K> {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> DiscreteDistribution<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight of `key`; absent keys read as zero and are not inserted.
    pub fn get(&self, key: &K) -> f64 {
        self.weights.get(key).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, key: K, weight: f64) {
        self.weights.insert(key, weight);
    }

    /// Adds `weight` to the current weight of `key`.
    pub fn add(&mut self, key: K, weight: f64) {
        *self.weights.entry(key).or_insert(0.0) += weight;
    }

    pub fn contains(&self, key: &K) -> bool {
        self.weights.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Scales weights to sum to one. A zero total leaves the weights unchanged.
    pub fn normalize(&mut self) {
        let total = self.total();
        if total == 0.0 {
            return;
        }
        for weight in self.weights.values_mut() {
            *weight /= total;
        }
    }

    pub fn normalized(&self) -> Self {
        let mut copy = self.clone();
        copy.normalize();
        copy
    }

    /// Key with the largest weight; ties go to the smallest key.
    pub fn arg_max(&self) -> Option<K> {
        let mut best: Option<(&K, f64)> = None;
        for (key, weight) in &self.weights {
            match best {
                Some((_, top)) if *weight <= top => {}
                _ => best = Some((key, *weight)),
            }
        }
        best.map(|(key, _)| key.clone())
    }

    /// Draws a key with probability proportional to its weight.
    ///
    /// Returns `None` when the distribution is empty or carries no mass.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<K> {
        let total = self.total();
        if !(total > 0.0) {
            return None;
        }
        let pick = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        let mut last = None;
        for (key, weight) in &self.weights {
            if *weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            last = Some(key);
            if pick < cumulative {
                break;
            }
        }
        last.cloned()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, K, f64> {
        self.weights.iter()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, K, f64> {
        self.weights.keys()
    }
}

impl<K: Ord> FromIterator<(K, f64)> for DiscreteDistribution<K> {
    /// Repeated keys accumulate.
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut weights = BTreeMap::new();
        for (key, weight) in iter {
            *weights.entry(key).or_insert(0.0) += weight;
        }
        Self { weights }
    }
}

impl<K: Ord> Extend<(K, f64)> for DiscreteDistribution<K> {
    fn extend<I: IntoIterator<Item = (K, f64)>>(&mut self, iter: I) {
        for (key, weight) in iter {
            *self.weights.entry(key).or_insert(0.0) += weight;
        }
    }
}

impl<'a, K: Ord> IntoIterator for &'a DiscreteDistribution<K> {
    type Item = (&'a K, &'a f64);
    type IntoIter = btree_map::Iter<'a, K, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.weights.iter()
    }
}
