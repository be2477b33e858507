//! Acceptable-duration filtering.
//!
//! Scores containing any event whose duration is outside the acceptable set
//! are dropped wholesale before normalization; they are never corrected.

use crate::midi::Event;
use serde::{Deserialize, Serialize};

/// Durations (in quarter-lengths) admitted by default: sixteenth through
/// whole note, including dotted eighth, dotted quarter, and dotted half.
pub const DEFAULT_DURATIONS: [f64; 8] = [0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0];

/// Tolerance for comparing imported (tick-derived) durations.
const DURATION_EPSILON: f64 = 1e-6;

/// A fixed, finite set of allowed durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationSet(Vec<f64>);

impl DurationSet {
    pub fn new(durations: impl IntoIterator<Item = f64>) -> Self {
        Self(durations.into_iter().collect())
    }

    /// Returns true if `duration` is a member of the set.
    pub fn contains(&self, duration: f64) -> bool {
        self.0
            .iter()
            .any(|&allowed| (allowed - duration).abs() < DURATION_EPSILON)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for DurationSet {
    fn default() -> Self {
        Self::new(DEFAULT_DURATIONS)
    }
}

/// Returns true iff every event's duration is in `acceptable`.
pub fn has_acceptable_durations(events: &[Event], acceptable: &DurationSet) -> bool {
    events.iter().all(|event| acceptable.contains(event.duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_listed_durations() {
        let events = vec![Event::note(60, 0.25), Event::rest(1.5), Event::note(62, 4.0)];
        assert!(has_acceptable_durations(&events, &DurationSet::default()));
    }

    #[test]
    fn test_rejects_triplets() {
        let events = vec![Event::note(60, 1.0), Event::note(62, 1.0 / 3.0)];
        assert!(!has_acceptable_durations(&events, &DurationSet::default()));
    }

    #[test]
    fn test_empty_score_is_acceptable() {
        assert!(has_acceptable_durations(&[], &DurationSet::default()));
    }

    #[test]
    fn test_custom_set() {
        let set = DurationSet::new([1.0]);
        assert!(set.contains(1.0 + 1e-9));
        assert!(!set.contains(0.5));
    }
}
