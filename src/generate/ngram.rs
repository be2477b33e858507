//! Count-based n-gram predictor.
//!
//! Trained from corpus windows: for each (context, target) pair, the target
//! is counted under every suffix of the context up to `order` ids long.
//! Prediction backs off from the longest matching suffix to shorter ones
//! and finally to the unigram table, with additive smoothing so every id
//! keeps some probability.
//!
//! Persisted with bincode.

use super::Predictor;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Additive smoothing applied to every count.
const DEFAULT_SMOOTHING: f64 = 0.01;

/// Next-id counts for one context. Key: next id. Value: occurrences.
type CountTable = BTreeMap<u32, u32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NgramPredictor {
    vocabulary_size: usize,
    order: usize,
    smoothing: f64,
    /// `tables[k]` maps a context suffix of length `k` to next-id counts.
    /// `tables[0]` holds the unigram counts under the empty key.
    tables: Vec<BTreeMap<Vec<u32>, CountTable>>,
}

impl NgramPredictor {
    /// Creates an untrained predictor (uniform output).
    pub fn new(vocabulary_size: usize, order: usize) -> Self {
        Self {
            vocabulary_size,
            order,
            smoothing: DEFAULT_SMOOTHING,
            tables: vec![BTreeMap::new(); order + 1],
        }
    }

    /// Trains a predictor from `(context, target)` pairs.
    ///
    /// # Arguments
    ///
    /// * `pairs` - Training windows, e.g. from [`crate::corpus::windows`]
    /// * `vocabulary_size` - Length of every predicted distribution
    /// * `order` - Longest context suffix to condition on
    pub fn train<'a>(
        pairs: impl IntoIterator<Item = (&'a [u32], u32)>,
        vocabulary_size: usize,
        order: usize,
    ) -> Self {
        let mut model = Self::new(vocabulary_size, order);
        let mut count = 0usize;
        for (context, target) in pairs {
            model.observe(context, target);
            count += 1;
        }
        tracing::info!(pairs = count, order, vocabulary_size, "Trained n-gram predictor");
        model
    }

    /// Counts one occurrence of `target` after `context`.
    pub fn observe(&mut self, context: &[u32], target: u32) {
        let longest = self.order.min(context.len());
        for (k, table) in self.tables.iter_mut().enumerate().take(longest + 1) {
            let suffix = context[context.len() - k..].to_vec();
            *table.entry(suffix).or_default().entry(target).or_insert(0) += 1;
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Distribution over ids given the recent context.
    pub fn distribution(&self, context: &[u32]) -> Vec<f64> {
        let longest = self.order.min(context.len());
        for k in (0..=longest).rev() {
            if let Some(counts) = self.tables[k].get(&context[context.len() - k..]) {
                return self.smoothed(counts);
            }
        }
        self.smoothed(&CountTable::new())
    }

    fn smoothed(&self, counts: &CountTable) -> Vec<f64> {
        let mut probabilities = vec![self.smoothing; self.vocabulary_size];
        for (&id, &count) in counts {
            if let Some(slot) = probabilities.get_mut(id as usize) {
                *slot += count as f64;
            }
        }
        let total: f64 = probabilities.iter().sum();
        if total > 0.0 {
            for p in &mut probabilities {
                *p /= total;
            }
        }
        probabilities
    }

    /// Saves the model to binary format.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, bincode::serialize(self)?)?;
        Ok(())
    }

    /// Loads a model saved by [`NgramPredictor::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(bincode::deserialize(&fs::read(path)?)?)
    }
}

impl Predictor for NgramPredictor {
    fn predict(&mut self, context: &[u32]) -> anyhow::Result<Vec<f64>> {
        Ok(self.distribution(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::windows;

    fn argmax(probabilities: &[f64]) -> usize {
        probabilities
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
            .0
    }

    #[test]
    fn test_untrained_is_uniform() {
        let model = NgramPredictor::new(4, 2);
        assert_eq!(model.distribution(&[1, 2]), vec![0.25; 4]);
    }

    #[test]
    fn test_learns_deterministic_cycle() {
        let stream: Vec<u32> = [0, 1, 2].iter().copied().cycle().take(60).collect();
        let model = NgramPredictor::train(windows(&stream, 4), 3, 2);

        assert_eq!(argmax(&model.distribution(&[0, 1])), 2);
        assert_eq!(argmax(&model.distribution(&[1, 2])), 0);

        let probabilities = model.distribution(&[2, 0]);
        assert!((probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(probabilities.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_backs_off_to_shorter_context() {
        let mut model = NgramPredictor::new(3, 2);
        model.observe(&[0, 1], 2);

        // [2, 1] was never seen, but the suffix [1] was
        assert_eq!(argmax(&model.distribution(&[2, 1])), 2);
        // Nothing matches [0]: fall back to unigram counts
        assert_eq!(argmax(&model.distribution(&[0])), 2);
    }

    #[test]
    fn test_binary_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let stream = [0, 1, 1, 0, 2, 1, 0];
        let model = NgramPredictor::train(windows(&stream, 2), 3, 2);

        model.save(&path).unwrap();
        assert_eq!(NgramPredictor::load(&path).unwrap(), model);
    }
}
