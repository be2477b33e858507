//! Time-series encoding of monophonic scores.
//!
//! A score becomes a sequence of [`Symbol`]s at a fixed time-step: each
//! event occupies `round(duration / time_step)` slots, the first holding the
//! event's identity (pitch or rest) and the rest holding the sustain marker.
//!
//! - filter.rs: acceptable-duration check applied before anything else
//! - normalize.rs: transposition to the canonical major/minor tonic
//! - encoder.rs: events -> symbols
//! - decoder.rs: symbols -> events (run-length decoding)

mod decoder;
mod encoder;
mod filter;
mod normalize;

pub use decoder::decode;
pub use encoder::encode;
pub use filter::{has_acceptable_durations, DurationSet, DEFAULT_DURATIONS};
pub use normalize::{transposition_interval, CanonicalKeys, KeyNormalizer};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Text token for a rest.
pub const REST_TOKEN: &str = "r";

/// Text token for "hold the previous symbol one more step".
pub const SUSTAIN_TOKEN: &str = "_";

/// Text token marking the end of a piece.
pub const DELIMITER_TOKEN: &str = "/";

/// One slot of the encoded time series.
///
/// Serialized as its text token (`"60"`, `"r"`, `"_"`, `"/"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Symbol {
    /// Onset of a note with this MIDI pitch.
    Pitch(u8),
    /// Onset of a rest.
    Rest,
    /// Continuation of the previous pitch or rest.
    Sustain,
    /// End-of-piece boundary.
    Delimiter,
}

impl Symbol {
    /// True for symbols that start a new event (pitch or rest).
    pub fn is_onset(self) -> bool {
        matches!(self, Symbol::Pitch(_) | Symbol::Rest)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Pitch(pitch) => write!(f, "{}", pitch),
            Symbol::Rest => f.write_str(REST_TOKEN),
            Symbol::Sustain => f.write_str(SUSTAIN_TOKEN),
            Symbol::Delimiter => f.write_str(DELIMITER_TOKEN),
        }
    }
}

impl FromStr for Symbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            REST_TOKEN => Ok(Symbol::Rest),
            SUSTAIN_TOKEN => Ok(Symbol::Sustain),
            DELIMITER_TOKEN => Ok(Symbol::Delimiter),
            _ => match s.parse::<u8>() {
                Ok(pitch) if pitch <= 127 => Ok(Symbol::Pitch(pitch)),
                _ => Err(Error::UnknownSymbol(s.to_string())),
            },
        }
    }
}

impl TryFrom<String> for Symbol {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

/// Parses whitespace-separated tokens, e.g. a seed like `"64 _ 69 _ r"`.
///
/// # Errors
///
/// Returns `UnknownSymbol` for the first token that is not a valid symbol
pub fn parse_symbols(text: &str) -> Result<Vec<Symbol>> {
    text.split_whitespace().map(str::parse).collect()
}

/// Joins symbols into their space-separated text form.
pub fn symbols_to_string(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(Symbol::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols() {
        let symbols = parse_symbols("60 _ r  /\n127").unwrap();
        assert_eq!(
            symbols,
            vec![
                Symbol::Pitch(60),
                Symbol::Sustain,
                Symbol::Rest,
                Symbol::Delimiter,
                Symbol::Pitch(127)
            ]
        );
        assert_eq!(symbols_to_string(&symbols), "60 _ r / 127");
    }

    #[test]
    fn test_invalid_tokens() {
        assert!(matches!(
            parse_symbols("60 x"),
            Err(Error::UnknownSymbol(s)) if s == "x"
        ));
        assert!("128".parse::<Symbol>().is_err());
        assert!("-1".parse::<Symbol>().is_err());
    }

    #[test]
    fn test_onset_classification() {
        assert!(Symbol::Pitch(0).is_onset());
        assert!(Symbol::Rest.is_onset());
        assert!(!Symbol::Sustain.is_onset());
        assert!(!Symbol::Delimiter.is_onset());
    }

    #[test]
    fn test_serde_as_token() {
        let json = serde_json::to_string(&vec![Symbol::Pitch(64), Symbol::Rest]).unwrap();
        assert_eq!(json, r#"["64","r"]"#);
        let back: Vec<Symbol> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Symbol::Pitch(64), Symbol::Rest]);
    }
}
