//! Symbols -> events (inverse of the encoder under the same time-step).

use super::Symbol;
use crate::error::{Error, Result};
use crate::midi::Event;

/// Decodes a run-length symbol sequence back into notes and rests.
///
/// Each pitch or rest symbol opens a new event lasting one time-step, and
/// each sustain marker directly after it extends that event by one more
/// step. A delimiter closes the current event and is otherwise skipped, so
/// a sustain marker after a delimiter has nothing to extend.
///
/// # Arguments
///
/// * `symbols` - Encoded sequence, e.g. the output of the generator
/// * `time_step` - Quarter-lengths per symbol slot used when encoding
///
/// # Errors
///
/// Returns `MalformedSequence` if a sustain marker precedes any identity
/// symbol (at the start, or right after a delimiter)
pub fn decode(symbols: &[Symbol], time_step: f64) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    // (identity symbol, number of steps)
    let mut current: Option<(Symbol, usize)> = None;

    let close = |current: Option<(Symbol, usize)>, events: &mut Vec<Event>| {
        if let Some((symbol, steps)) = current {
            let duration = steps as f64 * time_step;
            events.push(match symbol {
                Symbol::Pitch(pitch) => Event::note(pitch, duration),
                _ => Event::rest(duration),
            });
        }
    };

    for (index, &symbol) in symbols.iter().enumerate() {
        if symbol.is_onset() {
            close(current.take(), &mut events);
            current = Some((symbol, 1));
        } else if symbol == Symbol::Sustain {
            match current.as_mut() {
                Some((_, steps)) => *steps += 1,
                None => {
                    return Err(Error::MalformedSequence(format!(
                        "sustain marker at position {} has no preceding note or rest",
                        index
                    )))
                }
            }
        } else {
            close(current.take(), &mut events);
        }
    }
    close(current, &mut events);

    Ok(events)
}
