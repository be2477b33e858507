//! Events -> fixed time-step symbols.

use super::Symbol;
use crate::error::{Error, Result};
use crate::midi::{Event, EventKind};

/// Number of time-step slots an event of `duration` occupies.
pub(crate) fn step_count(duration: f64, time_step: f64) -> Result<usize> {
    if time_step.is_nan() || time_step <= 0.0 {
        return Err(Error::InvalidConfig(format!(
            "time step must be positive, got {}",
            time_step
        )));
    }
    let steps = (duration / time_step).round();
    if steps.is_nan() || steps < 1.0 {
        return Err(Error::InputRejected(format!(
            "duration {} is shorter than one time step of {}",
            duration, time_step
        )));
    }
    Ok(steps as usize)
}

/// Encodes events as a time series of symbols.
///
/// For each event, emits its identity (pitch or rest) once followed by
/// `steps - 1` sustain markers, where `steps = round(duration / time_step)`.
///
/// # Examples
///
/// ```
/// use melodygen::encoding::{encode, Symbol};
/// use melodygen::midi::Event;
///
/// let symbols = encode(&[Event::note(60, 1.0), Event::rest(0.5)], 0.25).unwrap();
/// assert_eq!(symbols.len(), 6);
/// assert_eq!(symbols[0], Symbol::Pitch(60));
/// assert_eq!(symbols[4], Symbol::Rest);
/// ```
///
/// # Errors
///
/// Returns `InputRejected` if an event is shorter than half a time step
pub fn encode(events: &[Event], time_step: f64) -> Result<Vec<Symbol>> {
    let mut symbols = Vec::new();
    for event in events {
        let steps = step_count(event.duration, time_step)?;
        symbols.push(match event.kind {
            EventKind::Note { pitch } => Symbol::Pitch(pitch),
            EventKind::Rest => Symbol::Rest,
        });
        symbols.extend(std::iter::repeat(Symbol::Sustain).take(steps - 1));
    }
    Ok(symbols)
}
