//! Musical keys and statistical key estimation.
//!
//! Keys are either declared by the score (a key signature) or estimated
//! with the Krumhansl-Schmuckler algorithm: a duration-weighted pitch-class
//! histogram is correlated against the 24 rotated major/minor key profiles
//! and the best Pearson correlation wins.

use super::{pitch_class_from_name, Event, NOTE_NAMES};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Krumhansl-Kessler major key profile.
const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile.
const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// A pitch class in 0..12 (0 = C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PitchClass(u8);

impl PitchClass {
    /// Creates a pitch class, wrapping values above 11.
    pub fn new(value: u8) -> Self {
        Self(value % 12)
    }

    /// Returns the raw value (0-11).
    pub fn value(self) -> u8 {
        self.0
    }

    /// Shifts by a signed number of semitones, wrapping at the octave.
    pub fn transposed(self, semitones: i8) -> Self {
        Self((self.0 as i16 + semitones as i16).rem_euclid(12) as u8)
    }

    /// Signed semitone distance from `self` to `target`, in -6..=5.
    ///
    /// Picks the nearest transposition so melodies move as little as
    /// possible.
    pub fn nearest_interval_to(self, target: PitchClass) -> i8 {
        let up = (target.0 as i8 - self.0 as i8).rem_euclid(12);
        if up > 5 {
            up - 12
        } else {
            up
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(NOTE_NAMES[self.0 as usize])
    }
}

impl FromStr for PitchClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        pitch_class_from_name(s)
            .map(PitchClass)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown pitch class `{}`", s)))
    }
}

/// Mode of a key.
///
/// Only major and minor have canonical tonics; the church modes can be
/// declared by a score but are rejected by normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Locrian => "locrian",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" | "ionian" => Ok(Mode::Major),
            "minor" | "aeolian" => Ok(Mode::Minor),
            "dorian" => Ok(Mode::Dorian),
            "phrygian" => Ok(Mode::Phrygian),
            "lydian" => Ok(Mode::Lydian),
            "mixolydian" => Ok(Mode::Mixolydian),
            "locrian" => Ok(Mode::Locrian),
            other => Err(Error::KeyDetectionFailure(format!("unknown mode `{}`", other))),
        }
    }
}

/// A key: tonic pitch class plus mode.
///
/// Serialized as text, e.g. `"G major"` or `"F# minor"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key {
    pub tonic: PitchClass,
    pub mode: Mode,
}

impl Key {
    pub fn new(tonic: PitchClass, mode: Mode) -> Self {
        Self { tonic, mode }
    }

    /// Builds a key from a MIDI key signature.
    ///
    /// # Arguments
    ///
    /// * `sharps` - Position on the circle of fifths (negative for flats)
    /// * `minor` - Whether the signature denotes the relative minor
    pub fn from_signature(sharps: i8, minor: bool) -> Self {
        let major_tonic = (sharps as i16 * 7).rem_euclid(12) as u8;
        if minor {
            Self::new(PitchClass::new(major_tonic + 9), Mode::Minor)
        } else {
            Self::new(PitchClass::new(major_tonic), Mode::Major)
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tonic, self.mode)
    }
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let tonic = parts
            .next()
            .and_then(pitch_class_from_name)
            .ok_or_else(|| Error::KeyDetectionFailure(format!("invalid key `{}`", s)))?;
        let mode = match parts.next() {
            Some(mode) => mode.parse()?,
            None => Mode::Major,
        };
        Ok(Self::new(PitchClass(tonic), mode))
    }
}

impl TryFrom<String> for Key {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

/// Estimates the key of a sequence of events.
///
/// Builds a duration-weighted pitch-class histogram and correlates it
/// against all 24 major/minor key profiles.
///
/// # Errors
///
/// Returns `KeyDetectionFailure` if there are no pitched events or no
/// profile correlates positively with the histogram.
pub fn detect_key(events: &[Event]) -> Result<Key> {
    let mut histogram = [0.0_f64; 12];
    for event in events {
        if let Some(pitch) = event.pitch() {
            histogram[(pitch % 12) as usize] += event.duration.max(0.0);
        }
    }

    let total: f64 = histogram.iter().sum();
    if total <= 0.0 {
        return Err(Error::KeyDetectionFailure(
            "no pitched events to analyze".to_string(),
        ));
    }

    let mut best: Option<(f64, Key)> = None;
    for root in 0..12u8 {
        // Rotate histogram so root = index 0
        let mut rotated = [0.0; 12];
        for (i, slot) in rotated.iter_mut().enumerate() {
            *slot = histogram[(i + root as usize) % 12];
        }

        for (profile, mode) in [(&MAJOR_PROFILE, Mode::Major), (&MINOR_PROFILE, Mode::Minor)] {
            let corr = pearson(&rotated, profile);
            if best.map_or(true, |(c, _)| corr > c) {
                best = Some((corr, Key::new(PitchClass(root), mode)));
            }
        }
    }

    match best {
        Some((corr, key)) if corr > 0.0 => {
            tracing::debug!(%key, correlation = corr, "estimated key");
            Ok(key)
        }
        _ => Err(Error::KeyDetectionFailure(
            "pitch content is tonally ambiguous".to_string(),
        )),
    }
}

/// Pearson correlation coefficient between two 12-element arrays.
fn pearson(x: &[f64; 12], y: &[f64; 12]) -> f64 {
    let x_mean: f64 = x.iter().sum::<f64>() / 12.0;
    let y_mean: f64 = y.iter().sum::<f64>() / 12.0;

    let mut num = 0.0;
    let mut x_sq = 0.0;
    let mut y_sq = 0.0;

    for i in 0..12 {
        let xd = x[i] - x_mean;
        let yd = y[i] - y_mean;
        num += xd * yd;
        x_sq += xd * xd;
        y_sq += yd * yd;
    }

    let denom = (x_sq * y_sq).sqrt();
    if denom < 1e-10 {
        return 0.0;
    }
    num / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale(pitches: &[u8]) -> Vec<Event> {
        pitches.iter().map(|&p| Event::note(p, 1.0)).collect()
    }

    #[test]
    fn test_c_major_scale_detected() {
        let key = detect_key(&scale(&[60, 62, 64, 65, 67, 69, 71, 72, 67, 60])).unwrap();
        assert_eq!(key, Key::new(PitchClass::new(0), Mode::Major));
    }

    #[test]
    fn test_minor_triad_emphasis_detected() {
        // A minor arpeggio with a leading tone
        let key = detect_key(&scale(&[57, 60, 64, 57, 60, 64, 68, 69, 57])).unwrap();
        assert_eq!(key, Key::new(PitchClass::new(9), Mode::Minor));
    }

    #[test]
    fn test_rests_only_fails() {
        let events = vec![Event::rest(1.0), Event::rest(2.0)];
        assert!(matches!(
            detect_key(&events),
            Err(Error::KeyDetectionFailure(_))
        ));
    }

    #[test]
    fn test_chromatic_content_is_ambiguous() {
        let chromatic: Vec<u8> = (60..72).collect();
        assert!(detect_key(&scale(&chromatic)).is_err());
    }

    #[test]
    fn test_key_parsing_and_display() {
        let key: Key = "F# minor".parse().unwrap();
        assert_eq!(key, Key::new(PitchClass::new(6), Mode::Minor));
        assert_eq!(key.to_string(), "F# minor");

        let key: Key = "Bb".parse().unwrap();
        assert_eq!(key.to_string(), "A# major");

        let key: Key = "d dorian".parse().unwrap();
        assert_eq!(key.mode, Mode::Dorian);

        assert!("Q major".parse::<Key>().is_err());
        assert!("C blues".parse::<Key>().is_err());
    }

    #[test]
    fn test_from_signature() {
        assert_eq!(Key::from_signature(0, false).to_string(), "C major");
        assert_eq!(Key::from_signature(0, true).to_string(), "A minor");
        assert_eq!(Key::from_signature(2, false).to_string(), "D major");
        assert_eq!(Key::from_signature(-3, true).to_string(), "C minor");
        assert_eq!(Key::from_signature(-1, false).to_string(), "F major");
    }

    #[test]
    fn test_nearest_interval() {
        let c = PitchClass::new(0);
        assert_eq!(PitchClass::new(2).nearest_interval_to(c), -2);
        assert_eq!(PitchClass::new(11).nearest_interval_to(c), 1);
        assert_eq!(PitchClass::new(6).nearest_interval_to(c), -6);
        assert_eq!(PitchClass::new(7).nearest_interval_to(c), 5);
        assert_eq!(c.nearest_interval_to(c), 0);
    }
}
