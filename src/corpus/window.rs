//! Sliding-window training pairs.
//!
//! One-hot shaping is left to whatever trains the predictor; pairs are
//! handed off as plain id sequences.

use serde::{Deserialize, Serialize};

/// A context of `sequence_length` ids and the id that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPair {
    pub context: Vec<u32>,
    pub target: u32,
}

/// Iterates `(context, target)` slices without copying.
///
/// Yields `max(0, len - sequence_length)` items.
pub fn windows(ids: &[u32], sequence_length: usize) -> impl Iterator<Item = (&[u32], u32)> + '_ {
    ids.windows(sequence_length + 1)
        .map(move |w| (&w[..sequence_length], w[sequence_length]))
}

/// Builds every training pair of the stream.
///
/// Pair `i` has context `ids[i..i + sequence_length]` and target
/// `ids[i + sequence_length]`. A stream no longer than the window yields
/// no pairs.
pub fn window(ids: &[u32], sequence_length: usize) -> Vec<TrainingPair> {
    windows(ids, sequence_length)
        .map(|(context, target)| TrainingPair {
            context: context.to_vec(),
            target,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_count_and_targets() {
        let ids: Vec<u32> = (10..20).collect();
        let pairs = window(&ids, 4);

        assert_eq!(pairs.len(), 6);
        for (i, pair) in pairs.iter().enumerate() {
            assert_eq!(pair.context, ids[i..i + 4].to_vec());
            assert_eq!(pair.target, ids[i + 4]);
        }
    }

    #[test]
    fn test_short_streams_yield_nothing() {
        assert!(window(&[1, 2, 3], 3).is_empty());
        assert!(window(&[1, 2], 3).is_empty());
        assert!(window(&[], 3).is_empty());
        assert_eq!(window(&[1, 2, 3, 4], 3).len(), 1);
    }

    #[test]
    fn test_lazy_iterator_matches() {
        let ids = [5, 1, 4, 1, 5, 9, 2, 6];
        let lazy: Vec<_> = windows(&ids, 3)
            .map(|(c, t)| TrainingPair {
                context: c.to_vec(),
                target: t,
            })
            .collect();
        assert_eq!(lazy, window(&ids, 3));
    }
}
