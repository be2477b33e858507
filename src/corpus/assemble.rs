//! Single-stream corpus assembly and persistence.
//!
//! Every per-score symbol sequence is followed by a run of `sequence_length`
//! delimiters. Any window of that length that straddles two scores therefore
//! contains at least one delimiter. A window made only of delimiters means
//! "a new piece starts here".

use super::Vocabulary;
use crate::encoding::{parse_symbols, symbols_to_string, Symbol};
use crate::error::Result;
use std::fs;
use std::path::Path;

/// Joins per-score sequences into one stream.
///
/// # Arguments
///
/// * `scores` - Encoded scores in corpus order
/// * `sequence_length` - Length of the delimiter run after each score
///
/// # Examples
///
/// ```
/// use melodygen::corpus::assemble;
/// use melodygen::encoding::{parse_symbols, symbols_to_string};
///
/// let a = parse_symbols("60 _").unwrap();
/// let b = parse_symbols("r").unwrap();
/// let stream = assemble(&[a, b], 2);
/// assert_eq!(symbols_to_string(&stream), "60 _ / / r / /");
/// ```
pub fn assemble(scores: &[Vec<Symbol>], sequence_length: usize) -> Vec<Symbol> {
    let total = scores.iter().map(|s| s.len() + sequence_length).sum();

    let mut stream = Vec::with_capacity(total);
    for score in scores {
        stream.extend_from_slice(score);
        stream.extend(std::iter::repeat(Symbol::Delimiter).take(sequence_length));
    }
    stream
}

/// Maps an assembled stream to vocabulary ids.
///
/// # Errors
///
/// Returns `UnknownSymbol` if the stream contains a symbol the vocabulary
/// lacks
pub fn tokenize(stream: &[Symbol], vocabulary: &Vocabulary) -> Result<Vec<u32>> {
    vocabulary.encode_all(stream)
}

/// Writes the stream as one line of space-separated tokens.
pub fn save_corpus<P: AsRef<Path>>(stream: &[Symbol], path: P) -> Result<()> {
    fs::write(path, symbols_to_string(stream))?;
    Ok(())
}

/// Reads a stream written by [`save_corpus`].
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<Symbol>> {
    parse_symbols(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(text: &str) -> Vec<Symbol> {
        parse_symbols(text).unwrap()
    }

    #[test]
    fn test_delimiter_run_follows_every_score() {
        let stream = assemble(&[seq("60 _"), seq("62"), seq("r _ 64")], 3);
        assert_eq!(
            symbols_to_string(&stream),
            "60 _ / / / 62 / / / r _ 64 / / /"
        );
    }

    #[test]
    fn test_single_and_empty_corpus() {
        assert_eq!(assemble(&[seq("60 _ r")], 4), seq("60 _ r / / / /"));
        assert!(assemble(&[], 4).is_empty());
    }

    #[test]
    fn test_windows_never_span_scores_without_delimiter() {
        let scores = vec![seq("60 _ _ 62"), seq("64 _ r"), seq("65 67 _ _ 69")];
        let s = 3;
        let stream = assemble(&scores, s);

        // Score index for every non-delimiter position
        let mut owner = Vec::new();
        let mut current = 0;
        for (i, symbol) in stream.iter().enumerate() {
            if *symbol == Symbol::Delimiter {
                if i > 0 && stream[i - 1] != Symbol::Delimiter {
                    current += 1;
                }
                owner.push(None);
            } else {
                owner.push(Some(current));
            }
        }

        for start in 0..=stream.len() - (s + 1) {
            let window = &owner[start..start + s + 1];
            let owners: std::collections::BTreeSet<_> = window.iter().flatten().collect();
            if owners.len() > 1 {
                assert!(window.iter().any(Option::is_none));
            }
        }
    }

    #[test]
    fn test_tokenize_requires_known_symbols() {
        let stream = seq("60 _ / r");
        let vocabulary = Vocabulary::build(&seq("60 _ /"));
        assert!(tokenize(&stream, &vocabulary).is_err());

        let vocabulary = Vocabulary::build(&stream);
        assert_eq!(tokenize(&stream, &vocabulary).unwrap().len(), 4);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_dataset");
        let stream = assemble(&[seq("60 _"), seq("r")], 2);

        save_corpus(&stream, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "60 _ / / r / /");
        assert_eq!(load_corpus(&path).unwrap(), stream);
    }
}
