//! End-to-end preprocessing: scores -> encoded corpus + vocabulary.
//!
//! Scores are filtered, normalized, and encoded independently on the rayon
//! pool. Results are collected in input order before assembly, so the corpus
//! stream (and every training pair derived from it) is reproducible.

use super::{assemble, save_corpus, Vocabulary};
use crate::config::PipelineConfig;
use crate::encoding::{encode, has_acceptable_durations, symbols_to_string, KeyNormalizer, Symbol};
use crate::error::{Error, Result};
use crate::midi::{load_scores, Score};
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Counts collected while preprocessing a corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessReport {
    /// Scores handed to the pipeline.
    pub loaded: usize,
    /// Scores dropped by the duration filter or another input check.
    pub rejected: usize,
    /// Scores whose key could not be normalized.
    pub failed: usize,
    /// Scores that made it into the corpus.
    pub encoded: usize,
}

/// Output of a preprocessing run.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Encoded scores in corpus order.
    pub scores: Vec<Vec<Symbol>>,
    /// All scores joined with delimiter runs.
    pub corpus: Vec<Symbol>,
    pub vocabulary: Vocabulary,
    pub report: PreprocessReport,
}

/// Filters, normalizes, and encodes one score.
///
/// # Errors
///
/// - `InputRejected` if the score has no events or a duration outside the
///   acceptable set
/// - `KeyDetectionFailure` / `UnsupportedMode` from key normalization
pub fn encode_score(
    score: &Score,
    config: &PipelineConfig,
    normalizer: &KeyNormalizer,
) -> Result<Vec<Symbol>> {
    if score.is_empty() {
        return Err(Error::InputRejected(format!("{}: no events", score.name)));
    }
    if !has_acceptable_durations(&score.events, &config.acceptable_durations) {
        return Err(Error::InputRejected(format!(
            "{}: contains a duration outside the acceptable set",
            score.name
        )));
    }

    let normalized = normalizer.normalize(score)?;
    encode(&normalized.events, config.time_step)
}

/// Runs the pipeline over in-memory scores.
///
/// Per-score failures are logged and skipped. Any other failure aborts.
pub fn preprocess(scores: &[Score], config: &PipelineConfig) -> Result<Preprocessed> {
    config.validate()?;
    let normalizer = KeyNormalizer::new(config.canonical_keys()?);

    let results: Vec<Result<Vec<Symbol>>> = scores
        .par_iter()
        .map(|score| encode_score(score, config, &normalizer))
        .collect();

    let mut report = PreprocessReport {
        loaded: scores.len(),
        ..Default::default()
    };
    let mut encoded = Vec::with_capacity(scores.len());

    for (score, result) in scores.iter().zip(results) {
        match result {
            Ok(symbols) => encoded.push(symbols),
            Err(e @ Error::InputRejected(_)) => {
                tracing::debug!("Rejected {}: {}", score.name, e);
                report.rejected += 1;
            }
            Err(e) if e.is_per_score() => {
                tracing::warn!("Skipping {}: {}", score.name, e);
                report.failed += 1;
            }
            Err(e) => return Err(e),
        }
    }
    report.encoded = encoded.len();

    let corpus = assemble(&encoded, config.sequence_length);
    let vocabulary = Vocabulary::build(&corpus);

    tracing::info!(
        loaded = report.loaded,
        rejected = report.rejected,
        failed = report.failed,
        encoded = report.encoded,
        corpus_len = corpus.len(),
        vocabulary_len = vocabulary.len(),
        "Preprocessing finished"
    );

    Ok(Preprocessed {
        scores: encoded,
        corpus,
        vocabulary,
        report,
    })
}

/// Loads a dataset directory, preprocesses it, and writes the artifacts.
///
/// Writes `config.corpus_file` and `config.mapping_file` into `output_dir`,
/// plus one text file per encoded score under `config.encoded_dir` when
/// `write_encoded` is set.
pub fn run_preprocess<P: AsRef<Path>, Q: AsRef<Path>>(
    dataset_dir: P,
    output_dir: Q,
    config: &PipelineConfig,
    write_encoded: bool,
) -> Result<Preprocessed> {
    let output_dir = output_dir.as_ref();
    let scores = load_scores(dataset_dir)?;
    let preprocessed = preprocess(&scores, config)?;

    fs::create_dir_all(output_dir)?;
    if write_encoded {
        let encoded_dir = output_dir.join(&config.encoded_dir);
        fs::create_dir_all(&encoded_dir)?;
        for (i, symbols) in preprocessed.scores.iter().enumerate() {
            fs::write(encoded_dir.join(i.to_string()), symbols_to_string(symbols))?;
        }
    }

    save_corpus(&preprocessed.corpus, output_dir.join(&config.corpus_file))?;
    preprocessed
        .vocabulary
        .save(output_dir.join(&config.mapping_file))?;

    Ok(preprocessed)
}
