//! Error types shared by the encoding, corpus, and generation stages.
//!
//! Per-score failures (`InputRejected`, `KeyDetectionFailure`,
//! `UnsupportedMode`) are isolated by the preprocessing pipeline. Vocabulary
//! mismatches and decoder violations surface to the caller.

use crate::midi::{MidiImportError, Mode};

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the melody pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A score violated a structural or duration constraint and was dropped.
    #[error("score rejected: {0}")]
    InputRejected(String),

    /// The key of a score could not be estimated.
    #[error("key detection failed: {0}")]
    KeyDetectionFailure(String),

    /// The key was detected but its mode has no canonical tonic.
    #[error("unsupported key mode: {0}")]
    UnsupportedMode(Mode),

    /// A symbol is missing from the vocabulary (or is not a valid token).
    #[error("unknown symbol `{0}`")]
    UnknownSymbol(String),

    /// An id is outside the vocabulary range.
    #[error("unknown vocabulary id {0}")]
    UnknownId(u32),

    /// A symbol sequence cannot be decoded into events.
    #[error("malformed symbol sequence: {0}")]
    MalformedSequence(String),

    /// Sampling temperature must be finite and strictly positive.
    #[error("invalid temperature {0}: must be > 0")]
    InvalidTemperature(f64),

    /// Generation requires at least one vocabulary entry.
    #[error("vocabulary is empty")]
    EmptyVocabulary,

    /// A persisted vocabulary does not describe a bijection onto 0..n.
    #[error("invalid vocabulary: {0}")]
    InvalidVocabulary(String),

    /// A predictor returned something that is not a usable distribution.
    #[error("invalid probability distribution: {0}")]
    InvalidDistribution(String),

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure reported by an external predictor, passed through untouched.
    #[error(transparent)]
    Predictor(anyhow::Error),

    #[error(transparent)]
    MidiImport(#[from] MidiImportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary encoding error: {0}")]
    Binary(#[from] bincode::Error),
}

impl Error {
    /// Returns true for failures that only invalidate a single score.
    ///
    /// The preprocessing pipeline logs and skips these instead of aborting.
    pub fn is_per_score(&self) -> bool {
        matches!(
            self,
            Error::InputRejected(_)
                | Error::KeyDetectionFailure(_)
                | Error::UnsupportedMode(_)
                | Error::MidiImport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_score_classification() {
        assert!(Error::InputRejected("bad".into()).is_per_score());
        assert!(Error::UnsupportedMode(Mode::Dorian).is_per_score());
        assert!(!Error::UnknownSymbol("x".into()).is_per_score());
        assert!(!Error::EmptyVocabulary.is_per_score());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(Error::UnknownId(7).to_string(), "unknown vocabulary id 7");
        assert_eq!(
            Error::UnsupportedMode(Mode::Lydian).to_string(),
            "unsupported key mode: lydian"
        );
    }
}
