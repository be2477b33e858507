//! Standard MIDI File (SMF) export of decoded event sequences.
//!
//! Writes the output of the run-length decoder to a .mid file playable by
//! any MIDI sequencer.
//!
//! # Format Details
//!
//! Exports as SMF Format 1 with:
//! - Track 0: Tempo, time signature, and optional key signature meta events
//! - Track 1: The melody on channel 0; rests only advance time

use super::{Event, EventKind, Key, Mode, TICKS_PER_BEAT};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Velocity used for every exported note.
const NOTE_VELOCITY: u8 = 100;

/// Largest value of the 24-bit set-tempo field.
const MAX_TEMPO_MICROS: u32 = 0xFF_FFFF;

/// Appends `value` as a variable-length quantity: 7 bits per byte, most
/// significant group first, high bit set on every byte but the last.
fn push_vlq(buffer: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut count = 0;
    let mut rest = value;
    loop {
        groups[count] = (rest & 0x7F) as u8;
        count += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for (i, group) in groups[..count].iter().enumerate().rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        buffer.push(group | continuation);
    }
}

/// Message bytes (status onwards) for a track entry.
#[derive(Debug, Clone, PartialEq)]
enum Message {
    NoteOn(u8),
    NoteOff(u8),
    /// Microseconds per quarter note
    Tempo(u32),
    /// Fixed 4/4
    FourFour,
    KeySignature(i8, bool),
    TrackName(&'static str),
    EndOfTrack,
}

impl Message {
    /// Ordering among messages at the same tick: meta first, then note
    /// offs, then note ons, end of track last.
    fn rank(&self) -> u8 {
        match self {
            Message::TrackName(_) => 0,
            Message::FourFour | Message::Tempo(_) | Message::KeySignature(..) => 1,
            Message::NoteOff(_) => 2,
            Message::NoteOn(_) => 3,
            Message::EndOfTrack => 4,
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match *self {
            Message::NoteOn(pitch) => out.extend_from_slice(&[0x90, pitch, NOTE_VELOCITY]),
            Message::NoteOff(pitch) => out.extend_from_slice(&[0x80, pitch, 0]),
            Message::Tempo(micros) => {
                let [_, a, b, c] = micros.to_be_bytes();
                out.extend_from_slice(&[0xFF, 0x51, 0x03, a, b, c]);
            }
            Message::FourFour => out.extend_from_slice(&[0xFF, 0x58, 0x04, 4, 2, 24, 8]),
            Message::KeySignature(sharps, minor) => {
                out.extend_from_slice(&[0xFF, 0x59, 0x02, sharps as u8, minor as u8])
            }
            Message::TrackName(name) => {
                out.extend_from_slice(&[0xFF, 0x03]);
                push_vlq(out, name.len() as u32);
                out.extend_from_slice(name.as_bytes());
            }
            Message::EndOfTrack => out.extend_from_slice(&[0xFF, 0x2F, 0x00]),
        }
    }
}

/// Messages at absolute ticks, serialized with delta times on `finish`.
#[derive(Debug, Default)]
struct TrackBuilder {
    entries: Vec<(u32, Message)>,
}

impl TrackBuilder {
    fn at(&mut self, tick: u32, message: Message) -> &mut Self {
        self.entries.push((tick, message));
        self
    }

    /// Sorts by tick (stable within a rank) and returns the MTrk chunk.
    fn finish(mut self) -> Vec<u8> {
        self.entries
            .sort_by_key(|(tick, message)| (*tick, message.rank()));

        let mut data = Vec::new();
        let mut previous = 0u32;
        for (tick, message) in &self.entries {
            push_vlq(&mut data, tick - previous);
            message.encode(&mut data);
            previous = *tick;
        }

        let mut chunk = Vec::with_capacity(data.len() + 8);
        chunk.extend_from_slice(b"MTrk");
        chunk.extend_from_slice(&(data.len() as u32).to_be_bytes());
        chunk.extend_from_slice(&data);
        chunk
    }
}

/// Converts a quarter-length duration to ticks.
fn quarters_to_ticks(quarters: f64) -> u32 {
    (quarters * TICKS_PER_BEAT as f64).round().max(0.0) as u32
}

/// Microseconds per quarter note, clamped to the 24-bit tempo field.
fn tempo_micros(tempo: u32) -> u32 {
    (60_000_000 / tempo.max(1)).min(MAX_TEMPO_MICROS)
}

/// Circle-of-fifths position for a major or minor key, in -5..=6.
fn key_to_signature(key: Key) -> Option<(i8, bool)> {
    let (major_tonic, minor) = match key.mode {
        Mode::Major => (key.tonic.value(), false),
        Mode::Minor => ((key.tonic.value() + 3) % 12, true),
        _ => return None,
    };
    (-5i8..=6)
        .find(|s| (*s as i16 * 7).rem_euclid(12) as u8 == major_tonic)
        .map(|sharps| (sharps, minor))
}

/// Writes a sequence of events to a Standard MIDI File.
///
/// # Arguments
///
/// * `events` - Decoded notes and rests in order
/// * `path` - Output file path
/// * `tempo` - Tempo in beats per minute
///
/// # Errors
///
/// Returns error if file creation or writing fails
pub fn write_events<P: AsRef<Path>>(events: &[Event], path: P, tempo: u32) -> std::io::Result<()> {
    write_events_with_key(events, path, tempo, None)
}

/// Like [`write_events`], additionally recording a key signature.
///
/// Keys in modes other than major and minor are not written.
pub fn write_events_with_key<P: AsRef<Path>>(
    events: &[Event],
    path: P,
    tempo: u32,
    key: Option<Key>,
) -> std::io::Result<()> {
    let mut melody = TrackBuilder::default();
    melody.at(0, Message::TrackName("Melody"));
    let mut tick = 0u32;
    for event in events {
        let mut length = quarters_to_ticks(event.duration);
        if let EventKind::Note { pitch } = event.kind {
            // Notes last at least one tick
            length = length.max(1);
            melody
                .at(tick, Message::NoteOn(pitch))
                .at(tick + length, Message::NoteOff(pitch));
        }
        tick += length;
    }
    melody.at(tick, Message::EndOfTrack);

    let mut meta = TrackBuilder::default();
    meta.at(0, Message::FourFour)
        .at(0, Message::Tempo(tempo_micros(tempo)))
        .at(tick, Message::EndOfTrack);
    if let Some((sharps, minor)) = key.and_then(key_to_signature) {
        meta.at(0, Message::KeySignature(sharps, minor));
    }

    let mut writer = BufWriter::new(File::create(path)?);
    // MThd: length 6, format 1, two tracks, ticks per quarter
    writer.write_all(b"MThd")?;
    writer.write_all(&6u32.to_be_bytes())?;
    writer.write_all(&1u16.to_be_bytes())?;
    writer.write_all(&2u16.to_be_bytes())?;
    writer.write_all(&(TICKS_PER_BEAT as u16).to_be_bytes())?;
    writer.write_all(&meta.finish())?;
    writer.write_all(&melody.finish())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::PitchClass;

    fn vlq(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        push_vlq(&mut out, value);
        out
    }

    #[test]
    fn test_vlq_encoding() {
        assert_eq!(vlq(0), vec![0x00]);
        assert_eq!(vlq(0x40), vec![0x40]);
        assert_eq!(vlq(127), vec![0x7F]);
        assert_eq!(vlq(128), vec![0x81, 0x00]);
        assert_eq!(vlq(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(vlq(0x4000), vec![0x81, 0x80, 0x00]);
    }

    #[test]
    fn test_note_off_precedes_note_on_at_same_tick() {
        let mut track = TrackBuilder::default();
        track
            .at(480, Message::NoteOn(62))
            .at(0, Message::NoteOn(60))
            .at(480, Message::NoteOff(60));
        let chunk = track.finish();

        // header(8) | 00 90 3C 64 | 83 60 80 3C 00 | 00 90 3E 64
        assert_eq!(&chunk[8..12], &[0x00, 0x90, 60, NOTE_VELOCITY]);
        assert_eq!(&chunk[12..17], &[0x83, 0x60, 0x80, 60, 0]);
        assert_eq!(&chunk[17..21], &[0x00, 0x90, 62, NOTE_VELOCITY]);
    }

    #[test]
    fn test_tempo_fits_24_bits() {
        assert_eq!(tempo_micros(120), 500_000);
        assert_eq!(tempo_micros(4), 15_000_000);
        assert_eq!(tempo_micros(3), MAX_TEMPO_MICROS);
        assert_eq!(tempo_micros(0), MAX_TEMPO_MICROS);
    }

    #[test]
    fn test_short_note_lasts_one_tick() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.mid");
        let events = vec![Event::note(60, 0.0001), Event::note(62, 1.0)];

        write_events(&events, &path, 1).unwrap();

        let data = std::fs::read(&path).unwrap();
        let smf = midly::Smf::parse(&data).unwrap();

        let tempo = smf.tracks[0].iter().find_map(|event| match event.kind {
            midly::TrackEventKind::Meta(midly::MetaMessage::Tempo(micros)) => {
                Some(micros.as_int())
            }
            _ => None,
        });
        assert_eq!(tempo, Some(MAX_TEMPO_MICROS));

        let mut tick = 0;
        let mut notes = Vec::new();
        for event in &smf.tracks[1] {
            tick += event.delta.as_int();
            if let midly::TrackEventKind::Midi { message, .. } = event.kind {
                match message {
                    midly::MidiMessage::NoteOn { key, .. } => notes.push((tick, key.as_int(), true)),
                    midly::MidiMessage::NoteOff { key, .. } => notes.push((tick, key.as_int(), false)),
                    _ => {}
                }
            }
        }
        assert_eq!(
            notes,
            vec![(0, 60, true), (1, 60, false), (1, 62, true), (481, 62, false)]
        );
    }

    #[test]
    fn test_key_to_signature() {
        let key = |pc, mode| Key::new(PitchClass::new(pc), mode);
        assert_eq!(key_to_signature(key(0, Mode::Major)), Some((0, false)));
        assert_eq!(key_to_signature(key(9, Mode::Minor)), Some((0, true)));
        assert_eq!(key_to_signature(key(2, Mode::Major)), Some((2, false)));
        assert_eq!(key_to_signature(key(10, Mode::Major)), Some((-2, false)));
        assert_eq!(key_to_signature(key(2, Mode::Dorian)), None);
    }

    #[test]
    fn test_rests_advance_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mid");
        let events = vec![Event::rest(2.0), Event::note(60, 1.0)];

        write_events(&events, &path, 90).unwrap();

        let data = std::fs::read(&path).unwrap();
        let smf = midly::Smf::parse(&data).unwrap();
        assert_eq!(smf.tracks.len(), 2);

        let mut tick = 0;
        let mut note_on_tick = None;
        for event in &smf.tracks[1] {
            tick += event.delta.as_int();
            if let midly::TrackEventKind::Midi {
                message: midly::MidiMessage::NoteOn { .. },
                ..
            } = event.kind
            {
                note_on_tick = Some(tick);
            }
        }
        assert_eq!(note_on_tick, Some(2 * TICKS_PER_BEAT));
    }
}
