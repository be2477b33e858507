//! melodygen - Symbolic melody preprocessing and generation.
//!
//! Turns a directory of monophonic scores (MIDI or JSON) into a
//! time-stepped symbol corpus with a persisted vocabulary, and samples new
//! melodies from any next-symbol predictor with temperature control.

pub mod config;
pub mod corpus;
pub mod encoding;
pub mod error;
pub mod generate;
pub mod midi;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use corpus::{preprocess, run_preprocess, PreprocessReport, Vocabulary};
pub use encoding::{decode, encode, Symbol};
pub use error::{Error, Result};
pub use generate::{
    CancelFlag, Generation, GenerationOptions, MelodyGenerator, NgramPredictor, Predictor,
    Termination,
};
pub use midi::{Event, Key, Mode, Score};
