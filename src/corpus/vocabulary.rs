//! Bidirectional symbol <-> id mapping.
//!
//! Ids are dense (`0..len`) so that a predictor's output vector can be
//! indexed by id directly. Ids are assigned in symbol order (pitches
//! ascending, then rest, sustain, delimiter), which keeps a build
//! deterministic for a given corpus.
//!
//! Persisted as a JSON object of `token -> id`, e.g. `{"60": 0, "r": 1}`.

use crate::encoding::Symbol;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u32>", into = "BTreeMap<String, u32>")]
pub struct Vocabulary {
    /// Indexed by id.
    symbols: Vec<Symbol>,
    ids: HashMap<Symbol, u32>,
}

impl Vocabulary {
    /// Builds a vocabulary from every distinct symbol in `symbols`.
    pub fn build<'a>(symbols: impl IntoIterator<Item = &'a Symbol>) -> Self {
        let distinct: BTreeSet<Symbol> = symbols.into_iter().copied().collect();
        Self::from_ordered(distinct.into_iter().collect())
    }

    fn from_ordered(symbols: Vec<Symbol>) -> Self {
        let ids = symbols
            .iter()
            .enumerate()
            .map(|(id, &symbol)| (symbol, id as u32))
            .collect();
        Self { symbols, ids }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Id of `symbol`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSymbol` if the symbol was not seen when building
    pub fn lookup(&self, symbol: Symbol) -> Result<u32> {
        self.ids
            .get(&symbol)
            .copied()
            .ok_or_else(|| Error::UnknownSymbol(symbol.to_string()))
    }

    /// Symbol for `id`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownId` if `id >= len()`
    pub fn reverse(&self, id: u32) -> Result<Symbol> {
        self.symbols
            .get(id as usize)
            .copied()
            .ok_or(Error::UnknownId(id))
    }

    /// Maps every symbol to its id.
    pub fn encode_all(&self, symbols: &[Symbol]) -> Result<Vec<u32>> {
        symbols.iter().map(|&s| self.lookup(s)).collect()
    }

    /// Iterates `(id, symbol)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Symbol)> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .map(|(id, &symbol)| (id as u32, symbol))
    }

    /// Serializes the mapping to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a mapping from JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is invalid, a key is not a symbol token, or
    /// the ids are not exactly `0..len` without repeats
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Saves the mapping to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Loads a mapping from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

impl TryFrom<BTreeMap<String, u32>> for Vocabulary {
    type Error = Error;

    fn try_from(mapping: BTreeMap<String, u32>) -> Result<Self> {
        let len = mapping.len();
        let mut slots: Vec<Option<Symbol>> = vec![None; len];

        for (token, id) in mapping {
            let symbol: Symbol = token
                .parse()
                .map_err(|_| Error::InvalidVocabulary(format!("`{}` is not a symbol", token)))?;
            let slot = slots.get_mut(id as usize).ok_or_else(|| {
                Error::InvalidVocabulary(format!("id {} out of range for {} entries", id, len))
            })?;
            if slot.replace(symbol).is_some() {
                return Err(Error::InvalidVocabulary(format!("id {} assigned twice", id)));
            }
        }

        // Every slot is filled: len entries, each in 0..len, none repeated
        let symbols = slots.into_iter().flatten().collect();
        Ok(Self::from_ordered(symbols))
    }
}

impl From<Vocabulary> for BTreeMap<String, u32> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary
            .iter()
            .map(|(id, symbol)| (symbol.to_string(), id))
            .collect()
    }
}
