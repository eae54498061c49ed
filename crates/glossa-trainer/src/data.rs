//! Corpus loading and train/validation split assembly.

use std::path::Path;

use glossa_core::corpus::{RawSentence, Sentence, read_conllu_file};
use glossa_core::vocab::Vocabularies;
use glossa_core::Result;

/// The indexed training and held-out validation splits.
///
/// The two collections live in separate fields so the evaluation pass
/// structurally cannot iterate the training data.
#[derive(Debug, Clone, Default)]
pub struct SplitCorpus {
    /// Sentences the optimizer sees.
    pub train: Vec<Sentence>,
    /// Held-out sentences used for monitoring only.
    pub validation: Vec<Sentence>,
}

impl SplitCorpus {
    /// Index both splits against vocabularies built from the training
    /// split only.
    pub fn index(
        train: &[RawSentence],
        validation: &[RawSentence],
        vocabs: &Vocabularies,
    ) -> Self {
        Self {
            train: train.iter().map(|s| vocabs.index(s)).collect(),
            validation: validation.iter().map(|s| vocabs.index(s)).collect(),
        }
    }

    /// Load two CoNLL-U files, build vocabularies from the training file
    /// alone, and index both splits against them.
    pub fn from_conllu_files<P: AsRef<Path>, Q: AsRef<Path>>(
        train_path: P,
        validation_path: Q,
    ) -> Result<(Self, Vocabularies)> {
        let train = read_conllu_file(train_path)?;
        let validation = read_conllu_file(validation_path)?;
        let vocabs = Vocabularies::build(&train);
        Ok((Self::index(&train, &validation, &vocabs), vocabs))
    }
}
