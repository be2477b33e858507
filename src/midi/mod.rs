//! Score data structures and MIDI file I/O.
//!
//! This module provides the monophonic event model consumed by the encoder,
//! key detection, and the import/export boundary to Standard MIDI Files.

mod event;
mod key;
mod loader;
mod midi_export;
mod midi_import;
mod score;

pub use event::{Event, EventKind};
pub use key::{detect_key, Key, Mode, PitchClass};
pub use loader::load_scores;
pub use midi_export::{write_events, write_events_with_key};
pub use midi_import::{import_from_midi, MidiImportError};
pub use score::Score;

/// Maps a pitch class to its sharp spelling.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Flat spellings accepted when parsing pitch names.
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Ticks per beat (quarter note) used when writing MIDI files.
pub const TICKS_PER_BEAT: u32 = 480;

/// Default tempo in beats per minute.
pub const DEFAULT_TEMPO: u32 = 120;

/// Slowest tempo whose microseconds per beat fit the 24-bit tempo field.
pub const MIN_TEMPO: u32 = 4;

/// Fastest tempo accepted in a configuration.
pub const MAX_TEMPO: u32 = 1000;

/// Parses a pitch-class name ("C", "F#", "Bb", case-insensitive letter).
pub(crate) fn pitch_class_from_name(name: &str) -> Option<u8> {
    let name = name.trim();
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let normalized: String = std::iter::once(letter).chain(chars).collect();

    NOTE_NAMES
        .iter()
        .position(|&n| n == normalized)
        .or_else(|| FLAT_NAMES.iter().position(|&n| n == normalized))
        .map(|i| i as u8)
}
