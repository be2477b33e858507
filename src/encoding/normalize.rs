//! Key normalization.
//!
//! Every score is transposed so that major pieces share one tonic and minor
//! pieces share another, shrinking the vocabulary the predictor has to
//! learn. The interval is computed per call from the score's own key; no
//! state is carried between scores.

use crate::error::{Error, Result};
use crate::midi::{detect_key, Key, Mode, PitchClass, Score};

/// The two tonics every score is transposed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalKeys {
    pub major: PitchClass,
    pub minor: PitchClass,
}

impl Default for CanonicalKeys {
    /// C major and A minor.
    fn default() -> Self {
        Self {
            major: PitchClass::new(0),
            minor: PitchClass::new(9),
        }
    }
}

/// Semitones needed to move `key` onto its canonical tonic.
///
/// The nearest transposition (-6..=5) is chosen.
///
/// # Errors
///
/// Returns `UnsupportedMode` for keys that are neither major nor minor
pub fn transposition_interval(key: Key, canonical: CanonicalKeys) -> Result<i8> {
    let target = match key.mode {
        Mode::Major => canonical.major,
        Mode::Minor => canonical.minor,
        other => return Err(Error::UnsupportedMode(other)),
    };
    Ok(key.tonic.nearest_interval_to(target))
}

/// Transposes scores to the canonical keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyNormalizer {
    canonical: CanonicalKeys,
}

impl KeyNormalizer {
    pub fn new(canonical: CanonicalKeys) -> Self {
        Self { canonical }
    }

    /// The declared key if present, otherwise the estimated one.
    pub fn resolve_key(&self, score: &Score) -> Result<Key> {
        match score.key {
            Some(key) => Ok(key),
            None => detect_key(&score.events),
        }
    }

    /// Returns a copy of `score` transposed to its canonical key.
    ///
    /// Rests are unaffected. The returned score's declared key is the
    /// canonical one.
    ///
    /// # Errors
    ///
    /// - `KeyDetectionFailure` if no key is declared and none can be estimated
    /// - `UnsupportedMode` if the key is not major or minor
    /// - `InputRejected` if a transposed pitch leaves the MIDI range
    pub fn normalize(&self, score: &Score) -> Result<Score> {
        let key = self.resolve_key(score)?;
        let interval = transposition_interval(key, self.canonical)?;

        let events = score
            .events
            .iter()
            .map(|event| {
                event.transposed(interval).ok_or_else(|| {
                    Error::InputRejected(format!(
                        "{}: pitch out of range after transposing by {}",
                        score.name, interval
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(score = %score.name, %key, interval, "normalized key");

        Ok(Score {
            name: score.name.clone(),
            key: Some(Key::new(key.tonic.transposed(interval), key.mode)),
            events,
        })
    }
}
