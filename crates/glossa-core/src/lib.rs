//! # Glossa Core
//!
//! Hierarchical morphological tagging for Ancient Greek treebanks. A
//! character-level LSTM builds a sub-word representation for each
//! token, fused with a word embedding and passed through a
//! sentence-level LSTM; independent classifier heads predict one
//! morphological attribute each.
//!
//! ## Quick Start
//!
//! ```rust
//! use candle_core::{DType, Device};
//! use candle_nn::{VarBuilder, VarMap};
//! use glossa_core::corpus::{RawSentence, RawToken};
//! use glossa_core::model::{Tagger, TaggerConfig};
//! use glossa_core::vocab::Vocabularies;
//!
//! let train = vec![RawSentence {
//!     tokens: vec![RawToken { form: "λόγος".into(), tags: vec!["n".into()] }],
//! }];
//! let vocabs = Vocabularies::build(&train);
//!
//! let varmap = VarMap::new();
//! let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
//! let tagger = Tagger::new(&TaggerConfig::default(), &vocabs, vb).unwrap();
//!
//! let scores = tagger.forward(&vocabs.index(&train[0])).unwrap();
//! assert_eq!(scores.len(), 1);
//! ```
pub mod corpus;
pub mod error;
pub mod model;
pub mod vocab;

// Re-export primary API
pub use corpus::{RawSentence, RawToken, Sentence, Token, read_conllu, read_conllu_file};
pub use error::{GlossaError, Result};
pub use model::{CharEncoder, Classifier, Tagger, TaggerConfig, WordEncoder};
pub use vocab::{TagDimension, UNKNOWN_ID, Vocab, Vocabularies};
