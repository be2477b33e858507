//! Standard MIDI File (SMF) import functionality.
//!
//! Imports .mid and .midi files as monophonic scores.
//! Supports SMF Format 0 (single track) and Format 1 (multi-track) files.
//!
//! # Limitations
//!
//! - All melodic channels are merged into one voice; when notes overlap,
//!   a later onset cuts the sounding note short and simultaneous onsets
//!   keep the highest pitch
//! - Channel 10 (index 9, percussion) is ignored
//! - Gaps between notes become rests
//! - The first key signature meta event becomes the declared key
//! - Tempo, velocity, and controller data are discarded

use super::{Event, Key, Score};
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// MIDI channel reserved for percussion.
const DRUM_CHANNEL: u8 = 9;

/// Errors that can occur during MIDI import.
#[derive(Debug, thiserror::Error)]
pub enum MidiImportError {
    /// File could not be read
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// MIDI parsing failed
    #[error("MIDI parse error: {0}")]
    ParseError(String),
    /// Unsupported MIDI format or timing
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// A note with absolute start and end ticks in the source resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimedNote {
    start: u64,
    end: u64,
    pitch: u8,
}

/// State for tracking active notes during import.
/// Key is (channel, pitch), value is the start tick.
type ActiveNotes = HashMap<(u8, u8), u64>;

/// Imports a MIDI file as a monophonic score.
///
/// # Arguments
///
/// * `path` - Path to the .mid or .midi file
///
/// # Returns
///
/// A Score named after the file stem
///
/// # Errors
///
/// Returns error if file cannot be read or parsed, or uses SMPTE timing
/// or Format 2
pub fn import_from_midi<P: AsRef<Path>>(path: P) -> Result<Score, MidiImportError> {
    let path = path.as_ref();
    let data = fs::read(path)?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Imported MIDI")
        .to_string();

    parse_score(&data, name)
}

/// Parses raw SMF bytes into a score.
fn parse_score(data: &[u8], name: String) -> Result<Score, MidiImportError> {
    let smf = Smf::parse(data).map_err(|e| MidiImportError::ParseError(e.to_string()))?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int() as u64,
        Timing::Timecode(_, _) => {
            return Err(MidiImportError::UnsupportedFormat(
                "SMPTE timecode timing not supported".to_string(),
            ))
        }
    };
    if ticks_per_beat == 0 {
        return Err(MidiImportError::ParseError(
            "ticks per beat is zero".to_string(),
        ));
    }

    if smf.header.format == Format::Sequential {
        return Err(MidiImportError::UnsupportedFormat(
            "Format 2 (sequential) MIDI files not supported".to_string(),
        ));
    }

    let mut notes = Vec::new();
    let mut key: Option<Key> = None;
    for track in &smf.tracks {
        let track_key = parse_track(track, ticks_per_beat, &mut notes);
        key = key.or(track_key);
    }

    let events = flatten_to_events(notes, ticks_per_beat);
    Ok(Score { name, key, events })
}

/// Collects the notes of one track into `notes`, returning the first key
/// signature found.
fn parse_track(
    track: &[midly::TrackEvent],
    ticks_per_beat: u64,
    notes: &mut Vec<TimedNote>,
) -> Option<Key> {
    let mut active_notes: ActiveNotes = HashMap::new();
    let mut key = None;

    // Current absolute tick position
    let mut current_tick: u64 = 0;

    for event in track {
        current_tick += event.delta.as_int() as u64;

        match event.kind {
            TrackEventKind::Meta(MetaMessage::KeySignature(sharps, minor)) => {
                if key.is_none() {
                    key = Some(Key::from_signature(sharps, minor));
                }
            }
            TrackEventKind::Midi { channel, message } => {
                let ch = channel.as_int();
                if ch == DRUM_CHANNEL {
                    continue;
                }

                match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        active_notes.insert((ch, key.as_int()), current_tick);
                    }
                    // Note on with velocity 0 = note off
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let pitch = key.as_int();
                        if let Some(start) = active_notes.remove(&(ch, pitch)) {
                            notes.push(TimedNote {
                                start,
                                end: current_tick.max(start + 1),
                                pitch,
                            });
                        }
                    }
                    _ => {} // Ignore other MIDI messages
                }
            }
            _ => {} // Ignore SysEx and other events
        }
    }

    // Close any remaining active notes with a default length of one beat
    for ((_, pitch), start) in active_notes {
        notes.push(TimedNote {
            start,
            end: start + ticks_per_beat,
            pitch,
        });
    }

    key
}

/// Reduces possibly overlapping notes to a single line of notes and rests.
fn flatten_to_events(mut notes: Vec<TimedNote>, ticks_per_beat: u64) -> Vec<Event> {
    // Onset order; simultaneous onsets put the highest pitch first
    notes.sort_by(|a, b| a.start.cmp(&b.start).then(b.pitch.cmp(&a.pitch)));

    let mut line: Vec<TimedNote> = Vec::with_capacity(notes.len());
    for note in notes {
        if let Some(last) = line.last_mut() {
            if note.start == last.start {
                continue;
            }
            if note.start < last.end {
                last.end = note.start;
            }
        }
        line.push(note);
    }

    let to_quarters = |ticks: u64| ticks as f64 / ticks_per_beat as f64;
    let mut events = Vec::with_capacity(line.len() * 2);
    let mut cursor = 0u64;
    for note in line {
        if note.start > cursor {
            events.push(Event::rest(to_quarters(note.start - cursor)));
        }
        events.push(Event::note(note.pitch, to_quarters(note.end - note.start)));
        cursor = note.end;
    }
    events
}
