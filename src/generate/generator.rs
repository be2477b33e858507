//! Seeded autoregressive generation.
//!
//! The generator walks three states:
//!
//! - Seeding: prepend `sequence_length` delimiters to the seed ("a piece
//!   starts here") and map everything to vocabulary ids
//! - Sampling: predict on the last `sequence_length` ids, draw the next id
//!   with temperature, append it; stop on a delimiter, an exhausted step
//!   budget, or cancellation
//! - Terminated: hand back the seed plus every generated symbol, without
//!   the terminating delimiter
//!
//! Sampling is strictly sequential: every draw depends on the previous one.

use super::{sample_with_temperature, CancelFlag, Predictor};
use crate::corpus::Vocabulary;
use crate::encoding::Symbol;
use crate::error::{Error, Result};
use rand::Rng;
use std::collections::VecDeque;

/// Parameters for one generation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Maximum number of sampling iterations.
    pub steps: usize,
    /// Context window length fed to the predictor.
    pub sequence_length: usize,
    /// Sampling temperature, must be > 0.
    pub temperature: f64,
}

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The predictor emitted the end-of-piece delimiter.
    Delimiter,
    /// The step budget ran out first.
    StepBudget,
    /// The cancel flag was raised between iterations.
    Cancelled,
}

/// The result of a generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// Seed symbols followed by generated symbols.
    pub melody: Vec<Symbol>,
    pub termination: Termination,
    /// Sampling iterations performed.
    pub steps_taken: usize,
}

enum State {
    Seeding,
    Sampling {
        context: VecDeque<u32>,
        melody: Vec<Symbol>,
        steps_taken: usize,
    },
    Terminated(Generation),
}

/// Samples melodies from a predictor over a fixed vocabulary.
pub struct MelodyGenerator<'v, P> {
    vocabulary: &'v Vocabulary,
    predictor: P,
}

impl<'v, P: Predictor> MelodyGenerator<'v, P> {
    /// Creates a generator.
    ///
    /// # Errors
    ///
    /// Returns `EmptyVocabulary` if the vocabulary has no entries
    pub fn new(vocabulary: &'v Vocabulary, predictor: P) -> Result<Self> {
        if vocabulary.is_empty() {
            return Err(Error::EmptyVocabulary);
        }
        Ok(Self {
            vocabulary,
            predictor,
        })
    }

    /// Runs generation to completion.
    ///
    /// # Arguments
    ///
    /// * `seed` - Opening symbols, e.g. parsed from `"64 _ 69 _ _ _"`
    /// * `options` - Step budget, window length, and temperature
    /// * `rng` - Source of randomness for the draws
    /// * `cancel` - Checked before every sampling iteration
    ///
    /// # Errors
    ///
    /// - `InvalidTemperature` if the temperature is not positive
    /// - `UnknownSymbol` if a seed symbol (or the delimiter) is not in the
    ///   vocabulary
    /// - `InvalidDistribution` if the predictor output does not match the
    ///   vocabulary size or has no positive mass
    /// - `Predictor` for failures raised by the predictor itself
    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        seed: &[Symbol],
        options: &GenerationOptions,
        rng: &mut R,
        cancel: &CancelFlag,
    ) -> Result<Generation> {
        let mut state = State::Seeding;
        loop {
            state = match state {
                State::Seeding => self.seed(seed, options)?,
                State::Sampling {
                    context,
                    melody,
                    steps_taken,
                } => self.sample(context, melody, steps_taken, options, rng, cancel)?,
                State::Terminated(generation) => {
                    tracing::info!(
                        termination = ?generation.termination,
                        steps = generation.steps_taken,
                        length = generation.melody.len(),
                        "Generation finished"
                    );
                    return Ok(generation);
                }
            };
        }
    }

    fn seed(&self, seed: &[Symbol], options: &GenerationOptions) -> Result<State> {
        if !(options.temperature.is_finite() && options.temperature > 0.0) {
            return Err(Error::InvalidTemperature(options.temperature));
        }

        let delimiter = self.vocabulary.lookup(Symbol::Delimiter)?;
        let mut context: VecDeque<u32> =
            std::iter::repeat(delimiter).take(options.sequence_length).collect();
        for &symbol in seed {
            context.push_back(self.vocabulary.lookup(symbol)?);
        }

        Ok(State::Sampling {
            context,
            melody: seed.to_vec(),
            steps_taken: 0,
        })
    }

    fn sample<R: Rng + ?Sized>(
        &mut self,
        mut context: VecDeque<u32>,
        mut melody: Vec<Symbol>,
        steps_taken: usize,
        options: &GenerationOptions,
        rng: &mut R,
        cancel: &CancelFlag,
    ) -> Result<State> {
        let finish = |melody, termination| {
            State::Terminated(Generation {
                melody,
                termination,
                steps_taken,
            })
        };

        if steps_taken >= options.steps {
            return Ok(finish(melody, Termination::StepBudget));
        }
        if cancel.is_cancelled() {
            return Ok(finish(melody, Termination::Cancelled));
        }

        // Only the last `sequence_length` ids are ever shown to the predictor
        while context.len() > options.sequence_length {
            context.pop_front();
        }

        let probabilities = self
            .predictor
            .predict(context.make_contiguous())
            .map_err(Error::Predictor)?;
        if probabilities.len() != self.vocabulary.len() {
            return Err(Error::InvalidDistribution(format!(
                "predictor returned {} probabilities for a vocabulary of {}",
                probabilities.len(),
                self.vocabulary.len()
            )));
        }

        let id = sample_with_temperature(&probabilities, options.temperature, rng)? as u32;
        let symbol = self.vocabulary.reverse(id)?;
        let steps_taken = steps_taken + 1;
        tracing::debug!(step = steps_taken, id, %symbol, "sampled");

        if symbol == Symbol::Delimiter {
            return Ok(State::Terminated(Generation {
                melody,
                termination: Termination::Delimiter,
                steps_taken,
            }));
        }

        context.push_back(id);
        melody.push(symbol);
        Ok(State::Sampling {
            context,
            melody,
            steps_taken,
        })
    }
}
