//! The hierarchical tagging model.
//!
//! A character-level LSTM builds a sub-word representation for each
//! token; it is concatenated with the token's word embedding and the
//! fused sequence is passed through a sentence-level LSTM. One
//! independent classifier head per morphological attribute turns each
//! contextual vector into a log-probability distribution over that
//! attribute's tag table.

mod char_encoder;
mod classifier;
mod word_encoder;

pub use char_encoder::CharEncoder;
pub use classifier::Classifier;
pub use word_encoder::WordEncoder;

use candle_core::{D, Device, Tensor};
use candle_nn::{Embedding, Module, VarBuilder, embedding, loss};

use crate::corpus::Sentence;
use crate::error::{GlossaError, Result};
use crate::vocab::Vocabularies;

/// Hyperparameters fixing the component shapes.
#[derive(Debug, Clone)]
pub struct TaggerConfig {
    /// Word embedding dimension.
    pub word_embedding_dim: usize,
    /// Character embedding dimension.
    pub char_embedding_dim: usize,
    /// Hidden dimension of the character-level encoder.
    pub char_hidden_dim: usize,
    /// Hidden dimension of the sentence-level encoder.
    pub word_hidden_dim: usize,
    /// Build the character-level encoder. When off, the word encoder
    /// consumes word embeddings alone.
    pub enable_char_level: bool,
    /// Restrict the classifier to the primary (first) tag dimension.
    pub primary_only: bool,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            word_embedding_dim: 100,
            char_embedding_dim: 20,
            char_hidden_dim: 200,
            word_hidden_dim: 500,
            enable_char_level: true,
            primary_only: false,
        }
    }
}

impl TaggerConfig {
    /// Dimensionality of the fused per-token vector the word encoder
    /// consumes: word embedding plus sub-word representation, or the
    /// word embedding alone when character-level encoding is off.
    pub fn fused_dim(&self) -> usize {
        if self.enable_char_level {
            self.word_embedding_dim + self.char_hidden_dim
        } else {
            self.word_embedding_dim
        }
    }

    fn validate(&self) -> Result<()> {
        let dims = [
            ("word_embedding_dim", self.word_embedding_dim),
            ("word_hidden_dim", self.word_hidden_dim),
        ];
        for (name, value) in dims {
            if value == 0 {
                return Err(GlossaError::ShapeMismatch(format!("{name} must be nonzero")));
            }
        }
        if self.enable_char_level && (self.char_embedding_dim == 0 || self.char_hidden_dim == 0) {
            return Err(GlossaError::ShapeMismatch(
                "character-level encoding requires nonzero char dimensions".into(),
            ));
        }
        Ok(())
    }
}

/// The assembled hierarchical tagger.
///
/// Parameters are registered in the `VarMap` behind the supplied
/// `VarBuilder`; the model itself only reads them. Forward passes are
/// stateless between calls: recurrent state lives inside a single
/// invocation and is re-created from zero at each word and sentence
/// entry.
#[derive(Debug)]
pub struct Tagger {
    word_embeddings: Embedding,
    char_encoder: Option<CharEncoder>,
    word_encoder: WordEncoder,
    classifier: Classifier,
    device: Device,
}

impl Tagger {
    /// Construct the model. Shape misconfiguration fails here, before
    /// any training step can run.
    pub fn new(config: &TaggerConfig, vocabs: &Vocabularies, vb: VarBuilder) -> Result<Self> {
        config.validate()?;
        if vocabs.dimension_count() == 0 {
            return Err(GlossaError::ShapeMismatch(
                "corpus defines no tag dimensions".into(),
            ));
        }

        let device = vb.device().clone();
        let word_embeddings = embedding(
            vocabs.words.size(),
            config.word_embedding_dim,
            vb.pp("word_embeddings"),
        )?;
        let char_encoder = if config.enable_char_level {
            Some(CharEncoder::new(
                vocabs.chars.size(),
                config.char_embedding_dim,
                config.char_hidden_dim,
                vb.pp("char_encoder"),
            )?)
        } else {
            None
        };
        let word_encoder =
            WordEncoder::new(config.fused_dim(), config.word_hidden_dim, vb.pp("word_encoder"))?;

        let tag_sizes = vocabs.tag_sizes();
        let head_sizes = if config.primary_only {
            &tag_sizes[..1]
        } else {
            &tag_sizes[..]
        };
        let classifier = Classifier::new(config.word_hidden_dim, head_sizes, vb.pp("classifier"))?;

        Ok(Self {
            word_embeddings,
            char_encoder,
            word_encoder,
            classifier,
            device,
        })
    }

    /// `true` when the character-level encoder is built and consulted.
    pub fn uses_char_level(&self) -> bool {
        self.char_encoder.is_some()
    }

    /// The sentence-level encoder, exposed for shape introspection.
    pub fn word_encoder(&self) -> &WordEncoder {
        &self.word_encoder
    }

    /// Number of classified tag dimensions.
    pub fn dimension_count(&self) -> usize {
        self.classifier.head_count()
    }

    /// Forward pass over one sentence: one `(len, |tags_d|)`
    /// log-probability matrix per classified dimension.
    pub fn forward(&self, sentence: &Sentence) -> Result<Vec<Tensor>> {
        if sentence.is_empty() {
            return Err(GlossaError::EmptySentence);
        }

        let word_ids: Vec<u32> = sentence.tokens.iter().map(|t| t.word).collect();
        let word_ids = Tensor::new(word_ids.as_slice(), &self.device)?;
        let word_embeddings = self.word_embeddings.forward(&word_ids)?;

        let fused = match &self.char_encoder {
            Some(encoder) => {
                let mut reprs = Vec::with_capacity(sentence.len());
                for token in &sentence.tokens {
                    reprs.push(encoder.encode(&token.chars, &self.device)?);
                }
                let sub_words = Tensor::cat(&reprs, 0)?;
                Tensor::cat(&[&word_embeddings, &sub_words], 1)?
            }
            None => word_embeddings,
        };

        let context = self.word_encoder.encode(&fused)?;
        self.classifier.forward(&context)
    }

    /// Mean per-token negative log-likelihood for one sentence: the gold
    /// tag's negative log-probability, summed over dimensions and
    /// tokens, divided by sentence length.
    pub fn loss(&self, scores: &[Tensor], sentence: &Sentence) -> Result<Tensor> {
        if sentence.tokens.iter().any(|t| t.tags.len() < scores.len()) {
            return Err(GlossaError::ShapeMismatch(
                "token tag vector shorter than classifier head count".into(),
            ));
        }

        let mut total: Option<Tensor> = None;
        for (d, matrix) in scores.iter().enumerate() {
            let gold: Vec<u32> = sentence.tokens.iter().map(|t| t.tags[d]).collect();
            let gold = Tensor::new(gold.as_slice(), &self.device)?;
            // per-dimension mean over tokens; summed over dimensions this
            // equals the sum over tokens and dimensions divided by length
            let dim_loss = loss::nll(matrix, &gold)?;
            total = Some(match total {
                Some(acc) => (acc + dim_loss)?,
                None => dim_loss,
            });
        }
        total.ok_or_else(|| GlossaError::ShapeMismatch("classifier has no heads".into()))
    }

    /// Highest-probability tag id per token, for each classified
    /// dimension.
    pub fn predict(&self, scores: &[Tensor]) -> Result<Vec<Vec<u32>>> {
        let mut predictions = Vec::with_capacity(scores.len());
        for matrix in scores {
            predictions.push(matrix.argmax(D::Minus1)?.to_vec1::<u32>()?);
        }
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{RawSentence, RawToken};
    use candle_core::DType;
    use candle_nn::VarMap;

    fn raw(form: &str, tag: &str) -> RawToken {
        RawToken {
            form: form.to_string(),
            tags: tag.chars().map(|c| c.to_string()).collect(),
        }
    }

    fn small_config() -> TaggerConfig {
        TaggerConfig {
            word_embedding_dim: 8,
            char_embedding_dim: 4,
            char_hidden_dim: 6,
            word_hidden_dim: 10,
            enable_char_level: true,
            primary_only: false,
        }
    }

    fn build(config: &TaggerConfig, train: &[RawSentence]) -> (Tagger, Vocabularies) {
        let vocabs = Vocabularies::build(train);
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let tagger = Tagger::new(config, &vocabs, vb).unwrap();
        (tagger, vocabs)
    }

    #[test]
    fn single_token_single_dimension_distribution_sums_to_one() {
        // one training sentence, one tag value: the dimension's table is
        // {unknown, "n"}, i.e. exactly two possible tags
        let train = vec![RawSentence {
            tokens: vec![raw("ὁ", "n")],
        }];
        let (tagger, vocabs) = build(&small_config(), &train);

        let sentence = vocabs.index(&train[0]);
        let scores = tagger.forward(&sentence).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].dims(), &[1, 2]);

        let mass: f32 = scores[0]
            .exp()
            .unwrap()
            .sum_all()
            .unwrap()
            .to_scalar()
            .unwrap();
        assert!((mass - 1.0).abs() < 1e-6, "probability mass {mass}");
    }

    #[test]
    fn loss_is_nonnegative_and_finite() {
        let train = vec![RawSentence {
            tokens: vec![raw("λόγος", "n-s"), raw("καλός", "a-s")],
        }];
        let (tagger, vocabs) = build(&small_config(), &train);

        let sentence = vocabs.index(&train[0]);
        let scores = tagger.forward(&sentence).unwrap();
        let loss: f32 = tagger
            .loss(&scores, &sentence)
            .unwrap()
            .to_scalar()
            .unwrap();
        assert!(loss.is_finite());
        assert!(loss >= 0.0);
    }

    #[test]
    fn disabling_char_level_removes_subword_input() {
        let train = vec![RawSentence {
            tokens: vec![raw("λόγος", "n-s"), raw("καλός", "a-s")],
        }];
        let config = TaggerConfig {
            enable_char_level: false,
            ..small_config()
        };
        let (tagger, vocabs) = build(&config, &train);

        assert!(!tagger.uses_char_level());
        assert_eq!(tagger.word_encoder().input_dim(), config.word_embedding_dim);

        // chars are ignored entirely, so a token without them still tags
        let mut sentence = vocabs.index(&train[0]);
        sentence.tokens[0].chars.clear();
        let scores = tagger.forward(&sentence).unwrap();
        assert_eq!(scores[0].dims()[0], 2);
    }

    #[test]
    fn primary_only_builds_a_single_head() {
        let train = vec![RawSentence {
            tokens: vec![raw("λόγος", "n-s"), raw("καλός", "a-s")],
        }];
        let config = TaggerConfig {
            primary_only: true,
            ..small_config()
        };
        let (tagger, vocabs) = build(&config, &train);

        assert_eq!(tagger.dimension_count(), 1);
        let sentence = vocabs.index(&train[0]);
        let scores = tagger.forward(&sentence).unwrap();
        assert_eq!(scores.len(), 1);
        tagger.loss(&scores, &sentence).unwrap();
    }

    #[test]
    fn empty_sentence_is_rejected() {
        let train = vec![RawSentence {
            tokens: vec![raw("ὁ", "l")],
        }];
        let (tagger, _) = build(&small_config(), &train);
        let err = tagger.forward(&Sentence::default()).unwrap_err();
        assert!(matches!(err, GlossaError::EmptySentence));
    }

    #[test]
    fn empty_word_is_rejected_when_char_level_is_on() {
        let train = vec![RawSentence {
            tokens: vec![raw("ὁ", "l")],
        }];
        let (tagger, vocabs) = build(&small_config(), &train);
        let mut sentence = vocabs.index(&train[0]);
        sentence.tokens[0].chars.clear();
        let err = tagger.forward(&sentence).unwrap_err();
        assert!(matches!(err, GlossaError::EmptyWord));
    }

    #[test]
    fn zero_dimension_config_fails_at_construction() {
        let train = vec![RawSentence {
            tokens: vec![raw("ὁ", "l")],
        }];
        let vocabs = Vocabularies::build(&train);
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = TaggerConfig {
            word_embedding_dim: 0,
            ..small_config()
        };
        let err = Tagger::new(&config, &vocabs, vb).unwrap_err();
        assert!(matches!(err, GlossaError::ShapeMismatch(_)));
    }

    #[test]
    fn forward_is_isolated_across_sentences() {
        let train = vec![
            RawSentence {
                tokens: vec![raw("λόγος", "n-s"), raw("καλός", "a-s")],
            },
            RawSentence {
                tokens: vec![raw("δέ", "c--")],
            },
        ];
        let (tagger, vocabs) = build(&small_config(), &train);

        let first = vocabs.index(&train[0]);
        let second = vocabs.index(&train[1]);

        let alone = tagger.forward(&second).unwrap();
        tagger.forward(&first).unwrap();
        let after = tagger.forward(&second).unwrap();

        assert_eq!(
            alone[0].to_vec2::<f32>().unwrap(),
            after[0].to_vec2::<f32>().unwrap()
        );
    }
}
