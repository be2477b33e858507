//! Autoregressive melody generation.
//!
//! - sampling.rs: temperature-scaled resampling of a probability vector
//! - generator.rs: the seeding/sampling loop over an external predictor
//! - ngram.rs: a count-based predictor trained from corpus windows, so the
//!   pipeline can run end to end without a neural model

mod generator;
mod ngram;
mod sampling;

pub use generator::{Generation, GenerationOptions, MelodyGenerator, Termination};
pub use ngram::NgramPredictor;
pub use sampling::{reweight, sample_with_temperature};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Anything that maps a context window to a distribution over the
/// vocabulary.
///
/// `context` holds at most `sequence_length` vocabulary ids, oldest first.
/// The returned vector must have one non-negative entry per vocabulary id
/// and sum to 1. Errors are passed through the generator unchanged.
pub trait Predictor {
    fn predict(&mut self, context: &[u32]) -> anyhow::Result<Vec<f64>>;
}

impl<F> Predictor for F
where
    F: FnMut(&[u32]) -> anyhow::Result<Vec<f64>>,
{
    fn predict(&mut self, context: &[u32]) -> anyhow::Result<Vec<f64>> {
        self(context)
    }
}

/// Cooperative cancellation flag checked between sampling iterations.
///
/// Clones share the same flag, so one can be handed to another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that generation stop at the next iteration boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_predictor() {
        let mut calls = 0;
        let mut predictor = |context: &[u32]| {
            calls += 1;
            Ok::<_, anyhow::Error>(vec![1.0 / context.len().max(1) as f64])
        };
        assert_eq!(predictor.predict(&[1, 2]).unwrap(), vec![0.5]);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!flag.is_cancelled());
        other.cancel();
        assert!(flag.is_cancelled());
    }
}
