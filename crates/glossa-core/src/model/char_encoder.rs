//! Character-level encoder producing sub-word representations.

use candle_core::{Device, Tensor};
use candle_nn::rnn::{LSTM, LSTMConfig, RNN, lstm};
use candle_nn::{Embedding, Module, VarBuilder, embedding};

use crate::error::{GlossaError, Result};

/// Encodes one word's character sequence into a fixed-size vector.
///
/// The recurrent state starts from zero at every word entry and is
/// threaded explicitly through each step; nothing is carried between
/// words. The representation is the hidden output after the last
/// character, so it is order sensitive and weighted toward the end of
/// the word.
#[derive(Debug)]
pub struct CharEncoder {
    embeddings: Embedding,
    rnn: LSTM,
    hidden_dim: usize,
}

impl CharEncoder {
    /// Build the encoder's embedding table and recurrent cell.
    pub fn new(
        char_vocab_size: usize,
        embedding_dim: usize,
        hidden_dim: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        let embeddings = embedding(char_vocab_size, embedding_dim, vb.pp("embeddings"))?;
        let rnn = lstm(embedding_dim, hidden_dim, LSTMConfig::default(), vb.pp("lstm"))?;
        Ok(Self {
            embeddings,
            rnn,
            hidden_dim,
        })
    }

    /// Dimensionality of the produced representation.
    pub fn output_dim(&self) -> usize {
        self.hidden_dim
    }

    /// Encode a character-id sequence into a `(1, hidden_dim)` tensor.
    ///
    /// An empty sequence violates the input contract and fails loudly
    /// rather than producing an undefined representation.
    pub fn encode(&self, chars: &[u32], device: &Device) -> Result<Tensor> {
        if chars.is_empty() {
            return Err(GlossaError::EmptyWord);
        }

        let ids = Tensor::new(chars, device)?;
        let embedded = self.embeddings.forward(&ids)?;

        let mut state = self.rnn.zero_state(1)?;
        for step in 0..chars.len() {
            let input = embedded.narrow(0, step, 1)?;
            state = self.rnn.step(&input, &state)?;
        }
        Ok(state.h().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    fn encoder(hidden_dim: usize) -> CharEncoder {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        CharEncoder::new(30, 4, hidden_dim, vb).unwrap()
    }

    #[test]
    fn representation_has_configured_dimensionality() {
        let enc = encoder(6);
        let repr = enc.encode(&[1, 2, 3], &Device::Cpu).unwrap();
        assert_eq!(repr.dims(), &[1, 6]);
    }

    #[test]
    fn encoding_is_deterministic_for_fixed_parameters() {
        let enc = encoder(5);
        let a = enc.encode(&[4, 9, 2], &Device::Cpu).unwrap();
        let b = enc.encode(&[4, 9, 2], &Device::Cpu).unwrap();
        assert_eq!(
            a.to_vec2::<f32>().unwrap(),
            b.to_vec2::<f32>().unwrap()
        );
    }

    #[test]
    fn no_state_leaks_between_words() {
        let enc = encoder(5);
        let alone = enc.encode(&[7, 7, 1], &Device::Cpu).unwrap();
        // encode a different word first; the second word must be unaffected
        enc.encode(&[2, 3, 4, 5], &Device::Cpu).unwrap();
        let after = enc.encode(&[7, 7, 1], &Device::Cpu).unwrap();
        assert_eq!(
            alone.to_vec2::<f32>().unwrap(),
            after.to_vec2::<f32>().unwrap()
        );
    }

    #[test]
    fn representation_is_order_sensitive() {
        let enc = encoder(5);
        let forward = enc.encode(&[1, 2, 3], &Device::Cpu).unwrap();
        let reversed = enc.encode(&[3, 2, 1], &Device::Cpu).unwrap();
        assert_ne!(
            forward.to_vec2::<f32>().unwrap(),
            reversed.to_vec2::<f32>().unwrap()
        );
    }

    #[test]
    fn empty_word_fails_loudly() {
        let enc = encoder(5);
        let err = enc.encode(&[], &Device::Cpu).unwrap_err();
        assert!(matches!(err, GlossaError::EmptyWord));
    }
}
