//! Pipeline configuration.
//!
//! Loaded from a JSON file; any field left out takes its default. The
//! defaults reproduce the folk-song setup the pipeline was built around:
//! sixteenth-note time steps, a 64-symbol context window, and C major /
//! A minor as the canonical keys.

use crate::encoding::{CanonicalKeys, DurationSet};
use crate::error::{Error, Result};
use crate::midi::{PitchClass, DEFAULT_TEMPO, MAX_TEMPO, MIN_TEMPO};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default context window length (symbols).
pub const DEFAULT_SEQUENCE_LENGTH: usize = 64;

/// Default quantization step in quarter-lengths (a sixteenth note).
pub const DEFAULT_TIME_STEP: f64 = 0.25;

/// Settings shared by preprocessing, training, and generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Context window length; also the length of the delimiter run
    /// between pieces.
    pub sequence_length: usize,

    /// Quarter-lengths represented by one symbol slot.
    pub time_step: f64,

    /// Durations a score may contain to be admitted.
    pub acceptable_durations: DurationSet,

    /// Canonical tonic for major-mode scores.
    pub major_tonic: String,

    /// Canonical tonic for minor-mode scores.
    pub minor_tonic: String,

    /// File name of the persisted vocabulary, relative to the output dir.
    pub mapping_file: String,

    /// File name of the single-file corpus, relative to the output dir.
    pub corpus_file: String,

    /// Directory for per-score encoded text, relative to the output dir.
    pub encoded_dir: String,

    /// Tempo (BPM) used when writing generated melodies to MIDI.
    pub tempo: u32,

    /// Maximum context order of the bundled n-gram predictor.
    pub predictor_order: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sequence_length: DEFAULT_SEQUENCE_LENGTH,
            time_step: DEFAULT_TIME_STEP,
            acceptable_durations: DurationSet::default(),
            major_tonic: "C".to_string(),
            minor_tonic: "A".to_string(),
            mapping_file: "mapping.json".to_string(),
            corpus_file: "file_dataset".to_string(),
            encoded_dir: "encoded".to_string(),
            tempo: DEFAULT_TEMPO,
            predictor_order: 3,
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from a JSON file and validates it.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or if a value is
    /// out of range
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.sequence_length == 0 {
            return Err(Error::InvalidConfig(
                "sequence_length must be at least 1".to_string(),
            ));
        }
        if self.time_step.is_nan() || self.time_step <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.acceptable_durations.is_empty() {
            return Err(Error::InvalidConfig(
                "acceptable_durations must not be empty".to_string(),
            ));
        }
        if !(MIN_TEMPO..=MAX_TEMPO).contains(&self.tempo) {
            return Err(Error::InvalidConfig(format!(
                "tempo must be between {} and {} bpm, got {}",
                MIN_TEMPO, MAX_TEMPO, self.tempo
            )));
        }
        if self.predictor_order == 0 {
            return Err(Error::InvalidConfig(
                "predictor_order must be at least 1".to_string(),
            ));
        }
        self.canonical_keys()?;
        Ok(())
    }

    /// Parses the canonical tonics.
    pub fn canonical_keys(&self) -> Result<CanonicalKeys> {
        Ok(CanonicalKeys {
            major: self.major_tonic.parse::<PitchClass>()?,
            minor: self.minor_tonic.parse::<PitchClass>()?,
        })
    }
}
