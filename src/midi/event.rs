//! Monophonic score events.
//!
//! An event is either a pitched note or a rest, with a duration measured in
//! quarter-lengths (1.0 = one quarter note). Events carry no onset: a score
//! is an ordered, non-overlapping sequence, so onsets are implied by the
//! running sum of durations.

use serde::{Deserialize, Serialize};

/// What an event sounds like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EventKind {
    /// A pitched note. 60 = Middle C (C4).
    Note { pitch: u8 },
    /// Silence.
    Rest,
}

/// A single note or rest with a quarter-length duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(flatten)]
    pub kind: EventKind,

    /// Duration in quarter-lengths. Always positive for well-formed scores.
    pub duration: f64,
}

impl Event {
    /// Creates a note event.
    ///
    /// # Arguments
    ///
    /// * `pitch` - MIDI note number (0-127)
    /// * `duration` - Duration in quarter-lengths
    ///
    /// # Examples
    ///
    /// ```
    /// use melodygen::midi::Event;
    ///
    /// // Middle C, one quarter note
    /// let note = Event::note(60, 1.0);
    /// assert_eq!(note.pitch(), Some(60));
    /// ```
    pub fn note(pitch: u8, duration: f64) -> Self {
        Self {
            kind: EventKind::Note {
                pitch: pitch.min(127),
            },
            duration,
        }
    }

    /// Creates a rest event.
    pub fn rest(duration: f64) -> Self {
        Self {
            kind: EventKind::Rest,
            duration,
        }
    }

    /// Returns the MIDI pitch, or None for rests.
    pub fn pitch(&self) -> Option<u8> {
        match self.kind {
            EventKind::Note { pitch } => Some(pitch),
            EventKind::Rest => None,
        }
    }

    /// Transposes the event by a number of semitones.
    ///
    /// Rests are returned unchanged.
    ///
    /// # Arguments
    ///
    /// * `semitones` - Number of semitones to transpose (can be negative)
    ///
    /// # Returns
    ///
    /// The transposed event, or None if the pitch would leave 0-127
    pub fn transposed(&self, semitones: i8) -> Option<Self> {
        match self.kind {
            EventKind::Rest => Some(*self),
            EventKind::Note { pitch } => {
                let new_pitch = pitch as i16 + semitones as i16;
                if (0..=127).contains(&new_pitch) {
                    Some(Self::note(new_pitch as u8, self.duration))
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let note = Event::note(60, 1.0);
        assert_eq!(note.pitch(), Some(60));
        assert_eq!(note.duration, 1.0);

        let rest = Event::rest(0.5);
        assert_eq!(rest.pitch(), None);
        assert_eq!(rest.kind, EventKind::Rest);
    }

    #[test]
    fn test_note_clamping() {
        let note = Event::note(200, 1.0);
        assert_eq!(note.pitch(), Some(127));
    }

    #[test]
    fn test_transpose() {
        let note = Event::note(60, 1.0);
        assert_eq!(note.transposed(12), Some(Event::note(72, 1.0)));
        assert_eq!(note.transposed(-3), Some(Event::note(57, 1.0)));

        let high = Event::note(120, 1.0);
        assert_eq!(high.transposed(12), None); // Would exceed 127

        let rest = Event::rest(2.0);
        assert_eq!(rest.transposed(5), Some(rest));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&Event::note(64, 0.5)).unwrap();
        assert_eq!(json, r#"{"kind":"note","pitch":64,"duration":0.5}"#);

        let rest: Event = serde_json::from_str(r#"{"kind":"rest","duration":1.5}"#).unwrap();
        assert_eq!(rest, Event::rest(1.5));
    }
}
