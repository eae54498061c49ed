use thiserror::Error;

/// Errors that can occur during glossa core operations.
#[derive(Debug, Error)]
pub enum GlossaError {
    /// A sentence carries no tokens; the unit is skipped by the caller.
    #[error("sentence contains no tokens")]
    EmptySentence,

    /// A word carries no characters, violating the character encoder's
    /// input contract.
    #[error("word contains no characters")]
    EmptyWord,

    /// Configured component dimensions are inconsistent. Fatal before
    /// any training step runs.
    #[error("model shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A sentence loss left the finite range.
    #[error("loss is not finite: {value}")]
    NumericDivergence {
        /// The non-finite value that was produced.
        value: f64,
    },

    /// A treebank file could not be parsed.
    #[error("corpus parse error at line {line}: {message}")]
    Corpus {
        /// 1-based line number in the input.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// Vocabulary tables could not be serialized or reloaded.
    #[error("vocabulary serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Tensor operation failure from the ML backend.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Filesystem failure while reading a corpus or writing a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for glossa operations.
pub type Result<T> = std::result::Result<T, GlossaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = GlossaError::EmptySentence;
        assert_eq!(err.to_string(), "sentence contains no tokens");

        let err = GlossaError::Corpus {
            line: 7,
            message: "expected 10 columns".into(),
        };
        assert!(err.to_string().contains("line 7"));

        let err = GlossaError::NumericDivergence { value: f64::NAN };
        assert!(err.to_string().contains("not finite"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GlossaError>();
    }
}
