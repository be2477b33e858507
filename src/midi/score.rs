//! Monophonic score container.
//!
//! A score is an ordered sequence of events plus an optional declared key.
//! It is what the score loaders produce and what the key normalizer and
//! encoder consume.

use super::{Event, Key};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A single-voice score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Score name, usually the source file stem.
    pub name: String,

    /// Key declared by the source (key signature), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,

    /// Events in onset order.
    pub events: Vec<Event>,
}

impl Score {
    /// Creates a score without a declared key.
    pub fn new(name: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            name: name.into(),
            key: None,
            events,
        }
    }

    /// Sets the declared key.
    pub fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Serializes the score to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a score from JSON.
    ///
    /// # Errors
    ///
    /// Returns error if parsing fails
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Saves the score to a JSON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the output file
    ///
    /// # Errors
    ///
    /// Returns error if serialization or file writing fails
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, json)
    }

    /// Loads a score from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if file reading or parsing fails
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{Mode, PitchClass};

    #[test]
    fn test_new_score() {
        let score = Score::new("test", vec![Event::note(60, 1.0), Event::rest(0.5)]);
        assert_eq!(score.key, None);
        assert!(!score.is_empty());
        assert!(Score::new("blank", Vec::new()).is_empty());
    }

    #[test]
    fn test_serialization() {
        let score = Score::new("tune", vec![Event::note(67, 2.0), Event::rest(1.0)])
            .with_key(Key::new(PitchClass::new(7), Mode::Major));

        let json = score.to_json().unwrap();
        assert!(json.contains("\"G major\""));
        let loaded = Score::from_json(&json).unwrap();
        assert_eq!(loaded, score);
    }

    #[test]
    fn test_missing_key_defaults_to_none() {
        let score = Score::from_json(r#"{"name":"x","events":[]}"#).unwrap();
        assert_eq!(score.key, None);
        assert!(score.is_empty());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("score.json");
        let score = Score::new("file", vec![Event::note(72, 0.25)]);

        score.save_to_file(&path).unwrap();
        assert_eq!(Score::load_from_file(&path).unwrap(), score);
    }
}
