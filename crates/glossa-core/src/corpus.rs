//! CoNLL-U corpus reading and the indexed sentence model.
//!
//! Treebank files are consumed in their raw form here; mapping symbols
//! to dense ids happens in [`crate::vocab`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{GlossaError, Result};

/// Number of positional attributes in a Perseus-style XPOS tag.
pub const PERSEUS_TAG_LEN: usize = 9;

/// Attribute names for the nine Perseus tag positions, in order.
pub const PERSEUS_ATTRIBUTES: [&str; PERSEUS_TAG_LEN] = [
    "pos", "person", "number", "tense", "mood", "voice", "gender", "case", "degree",
];

/// The treebank's marker for an unset attribute position.
pub const UNSET_TAG: &str = "-";

/// A token as read from a treebank file: surface form plus one gold
/// value per morphological attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    /// Surface form (FORM column).
    pub form: String,
    /// Per-position values of the XPOS tag, in dimension order.
    pub tags: Vec<String>,
}

/// A sentence as read from a treebank file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawSentence {
    /// Ordered tokens; never empty for sentences produced by the reader.
    pub tokens: Vec<RawToken>,
}

/// One token of an indexed sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Word id in the frozen word vocabulary.
    pub word: u32,
    /// Character ids, in order. Never empty for well-formed input.
    pub chars: Vec<u32>,
    /// One gold tag id per tag dimension.
    pub tags: Vec<u32>,
}

/// An indexed sentence: ordered tokens, variable length, no padding or
/// truncation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sentence {
    /// Ordered tokens of the sentence.
    pub tokens: Vec<Token>,
}

impl Sentence {
    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// `true` if the sentence carries no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Read a CoNLL-U treebank file into raw sentences.
pub fn read_conllu_file<P: AsRef<Path>>(path: P) -> Result<Vec<RawSentence>> {
    let file = File::open(path)?;
    read_conllu(BufReader::new(file))
}

/// Read CoNLL-U from any buffered source.
///
/// Comment lines, multiword-token ranges (`1-2`) and empty nodes (`3.1`)
/// are skipped; a blank line closes the current sentence. Sentences with
/// zero tokens are not emitted.
pub fn read_conllu<R: BufRead>(reader: R) -> Result<Vec<RawSentence>> {
    let mut sentences = Vec::new();
    let mut current = RawSentence::default();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();

        if line.is_empty() {
            if !current.tokens.is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 5 {
            return Err(GlossaError::Corpus {
                line: number + 1,
                message: format!("expected at least 5 columns, found {}", columns.len()),
            });
        }

        let id = columns[0];
        if id.contains('-') || id.contains('.') {
            continue;
        }

        current.tokens.push(RawToken {
            form: columns[1].to_string(),
            tags: split_positional_tag(columns[4]),
        });
    }

    if !current.tokens.is_empty() {
        sentences.push(current);
    }

    Ok(sentences)
}

/// Split a positional XPOS tag into one value per attribute position.
///
/// The placeholder `_` yields no values; the token is then treated as
/// unset in every dimension when indexed.
fn split_positional_tag(xpos: &str) -> Vec<String> {
    if xpos == "_" {
        return Vec::new();
    }
    xpos.chars().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# sent_id = tlg0003.tlg001@1\n\
1\tὁ\tὁ\tDET\tl-s---mn-\t_\t2\tdet\t_\t_\n\
2\tἄνθρωπος\tἄνθρωπος\tNOUN\tn-s---mn-\t_\t0\troot\t_\t_\n\
\n\
1-2\tκἀγώ\t_\t_\t_\t_\t_\t_\t_\t_\n\
1\tκαί\tκαί\tCCONJ\tc--------\t_\t0\tcc\t_\t_\n\
2\tἐγώ\tἐγώ\tPRON\tp-s---mn-\t_\t0\troot\t_\t_\n";

    #[test]
    fn reads_sentences_and_skips_ranges() {
        let sentences = read_conllu(SAMPLE.as_bytes()).unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].tokens.len(), 2);
        // the 1-2 range line is not a token
        assert_eq!(sentences[1].tokens.len(), 2);
    }

    #[test]
    fn splits_tag_into_positions() {
        let sentences = read_conllu(SAMPLE.as_bytes()).unwrap();
        let tags = &sentences[0].tokens[0].tags;
        assert_eq!(tags.len(), PERSEUS_TAG_LEN);
        assert_eq!(tags[0], "l");
        assert_eq!(tags[8], "-");
    }

    #[test]
    fn placeholder_tag_yields_no_values() {
        assert!(split_positional_tag("_").is_empty());
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = read_conllu("1\tbroken\n".as_bytes()).unwrap_err();
        match err {
            GlossaError::Corpus { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_trailing_lines_do_not_emit_empty_sentences() {
        let sentences = read_conllu("\n\n\n".as_bytes()).unwrap();
        assert!(sentences.is_empty());
    }
}
