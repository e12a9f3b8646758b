//! The set of cells the model was trained on.
//!
//! Built once from `h3_categories.json`, a JSON object whose keys are the
//! cell tokens. The values are ignored; a cell's category code is the
//! position of its key in the file, the order the model's categorical
//! vocabulary was exported in. Membership never changes after loading.

use crate::error::ArtifactError;
use crate::spatial::parse_cell;
use h3o::CellIndex;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct KnownCellRegistry {
    codes: HashMap<CellIndex, u32>,
}

/// Object keys in file order.
struct VocabularyKeys(Vec<String>);

impl<'de> Deserialize<'de> for VocabularyKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeysVisitor;

        impl<'de> Visitor<'de> for KeysVisitor {
            type Value = VocabularyKeys;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object keyed by H3 cell tokens")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut keys = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, IgnoredAny)) = map.next_entry::<String, IgnoredAny>()? {
                    keys.push(key);
                }
                Ok(VocabularyKeys(keys))
            }
        }

        deserializer.deserialize_map(KeysVisitor)
    }
}

impl KnownCellRegistry {
    /// Load the vocabulary file.
    pub fn from_json_path(path: &Path) -> Result<Self, ArtifactError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let VocabularyKeys(keys) = serde_json::from_str(&raw).map_err(|source| ArtifactError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_tokens(keys)
    }

    /// Build from cell tokens; codes follow first occurrence.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, ArtifactError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut codes = HashMap::new();
        for token in tokens {
            let token = token.as_ref();
            let cell = parse_cell(token).map_err(|e| ArtifactError::InvalidCell {
                cell: token.to_string(),
                reason: e.to_string(),
            })?;
            let next = codes.len() as u32;
            codes.entry(cell).or_insert(next);
        }
        Ok(Self { codes })
    }

    /// Build from cells alone; codes follow the sorted token order.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = CellIndex>,
    {
        let mut tokens: Vec<CellIndex> = cells.into_iter().collect();
        tokens.sort_by_key(|c| c.to_string());
        tokens.dedup();

        let codes = tokens
            .into_iter()
            .enumerate()
            .map(|(code, cell)| (cell, code as u32))
            .collect();
        Self { codes }
    }

    pub fn contains(&self, cell: CellIndex) -> bool {
        self.codes.contains_key(&cell)
    }

    /// Category code the model uses for `cell`.
    pub fn code_of(&self, cell: CellIndex) -> Option<u32> {
        self.codes.get(&cell).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Largest category code, if any.
    pub fn max_code(&self) -> Option<u32> {
        self.codes.values().copied().max()
    }

    /// Known cells among `candidates`, keeping their order.
    pub fn known_among(&self, candidates: &[CellIndex]) -> Vec<CellIndex> {
        candidates.iter().copied().filter(|c| self.contains(*c)).collect()
    }

    /// `(cell, code)` pairs ordered by code.
    pub fn entries(&self) -> Vec<(CellIndex, u32)> {
        let mut entries: Vec<(CellIndex, u32)> = self.codes.iter().map(|(c, code)| (*c, *code)).collect();
        entries.sort_by_key(|(_, code)| *code);
        entries
    }
}

/// Writes the vocabulary file layout, keys in code order so a reload
/// assigns the same codes.
impl Serialize for KnownCellRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (cell, code) in entries {
            map.serialize_entry(&cell.to_string(), &code)?;
        }
        map.end()
    }
}
