//! Frozen vocabularies mapping symbols to dense ids.
//!
//! Tables are built once from the training split and never grow
//! afterwards; lookups against a frozen table fall back to the reserved
//! unknown id instead of inserting.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::corpus::{PERSEUS_ATTRIBUTES, RawSentence, Sentence, Token, UNSET_TAG};
use crate::error::Result;

/// Reserved id for symbols absent from a frozen vocabulary.
pub const UNKNOWN_ID: u32 = 0;

/// A frozen symbol table. Id 0 is reserved for unknown symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocab<T: Eq + Hash> {
    index: HashMap<T, u32>,
}

impl<T: Eq + Hash> Vocab<T> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
        }
    }

    /// Insert a symbol during the build phase, returning its id.
    /// Re-inserting a known symbol returns the existing id.
    fn intern(&mut self, symbol: T) -> u32 {
        let next = self.index.len() as u32 + 1;
        *self.index.entry(symbol).or_insert(next)
    }

    /// Look up a symbol, falling back to [`UNKNOWN_ID`] when absent.
    pub fn id_for<Q>(&self, symbol: &Q) -> u32
    where
        T: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.get(symbol).copied().unwrap_or(UNKNOWN_ID)
    }

    /// Table size, counting the reserved unknown slot.
    pub fn size(&self) -> usize {
        self.index.len() + 1
    }
}

/// One morphological attribute: its name and its frozen tag table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDimension {
    /// Attribute name ("pos", "case", ...).
    pub name: String,
    /// Tag values seen for this attribute during training.
    pub tags: Vocab<String>,
}

/// The frozen symbol tables derived from a training corpus: the word
/// table, the character table, and one tag table per tag dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabularies {
    /// Word forms seen during training.
    pub words: Vocab<String>,
    /// Characters seen during training.
    pub chars: Vocab<char>,
    /// Tag dimensions in fixed order, frozen after the build.
    pub dimensions: Vec<TagDimension>,
}

impl Vocabularies {
    /// Build all tables from the training split. The number of tag
    /// dimensions is the longest positional tag in the data; shorter
    /// tags count as unset in the trailing dimensions.
    pub fn build(train: &[RawSentence]) -> Self {
        let dimension_count = train
            .iter()
            .flat_map(|s| &s.tokens)
            .map(|t| t.tags.len())
            .max()
            .unwrap_or(0);

        let mut dimensions: Vec<TagDimension> = (0..dimension_count)
            .map(|d| TagDimension {
                name: dimension_name(d, dimension_count),
                tags: Vocab::new(),
            })
            .collect();
        let mut words = Vocab::new();
        let mut chars = Vocab::new();

        for sentence in train {
            for token in &sentence.tokens {
                words.intern(token.form.clone());
                for ch in token.form.chars() {
                    chars.intern(ch);
                }
                for (d, dimension) in dimensions.iter_mut().enumerate() {
                    let value = token.tags.get(d).map_or(UNSET_TAG, String::as_str);
                    dimension.tags.intern(value.to_string());
                }
            }
        }

        Self {
            words,
            chars,
            dimensions,
        }
    }

    /// Number of tag dimensions.
    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Per-dimension tag table sizes, in dimension order.
    pub fn tag_sizes(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.tags.size()).collect()
    }

    /// Index one raw sentence against the frozen tables. Symbols unseen
    /// during training resolve to the unknown id, never to an
    /// out-of-range index.
    pub fn index(&self, raw: &RawSentence) -> Sentence {
        let tokens = raw
            .tokens
            .iter()
            .map(|token| Token {
                word: self.words.id_for(token.form.as_str()),
                chars: token.form.chars().map(|c| self.chars.id_for(&c)).collect(),
                tags: self
                    .dimensions
                    .iter()
                    .enumerate()
                    .map(|(d, dimension)| {
                        let value = token.tags.get(d).map_or(UNSET_TAG, String::as_str);
                        dimension.tags.id_for(value)
                    })
                    .collect(),
            })
            .collect();
        Sentence { tokens }
    }

    /// Persist the tables as JSON so a checkpoint can later be applied
    /// against the exact training-time mapping.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reload tables persisted with [`Vocabularies::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Perseus attribute names when the corpus uses the 9-position tagset,
/// generic names otherwise.
fn dimension_name(index: usize, count: usize) -> String {
    if count == PERSEUS_ATTRIBUTES.len() {
        PERSEUS_ATTRIBUTES[index].to_string()
    } else {
        format!("attr{index}")
    }
}
