//! Sentence-level encoder over fused token vectors.

use candle_core::Tensor;
use candle_nn::VarBuilder;
use candle_nn::rnn::{LSTM, LSTMConfig, RNN, lstm};

use crate::error::{GlossaError, Result};

/// Encodes a sentence's fused token vectors into one contextual
/// representation per token.
///
/// A fresh zero state is created at every sentence entry; state is never
/// carried from one sentence into the next. Outputs are raw vectors;
/// normalization happens downstream in the classifier heads.
#[derive(Debug)]
pub struct WordEncoder {
    rnn: LSTM,
    input_dim: usize,
    hidden_dim: usize,
}

impl WordEncoder {
    /// Build the sentence-level recurrent cell.
    pub fn new(input_dim: usize, hidden_dim: usize, vb: VarBuilder) -> Result<Self> {
        let rnn = lstm(input_dim, hidden_dim, LSTMConfig::default(), vb.pp("lstm"))?;
        Ok(Self {
            rnn,
            input_dim,
            hidden_dim,
        })
    }

    /// Dimensionality of the fused per-token vectors this encoder expects.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Dimensionality of each contextual representation.
    pub fn output_dim(&self) -> usize {
        self.hidden_dim
    }

    /// Encode a `(len, input_dim)` fused matrix into `(len, hidden_dim)`
    /// contextual vectors, one per token.
    pub fn encode(&self, fused: &Tensor) -> Result<Tensor> {
        let (_, dim) = fused.dims2()?;
        if dim != self.input_dim {
            return Err(GlossaError::ShapeMismatch(format!(
                "word encoder expects fused vectors of dimension {}, got {dim}",
                self.input_dim
            )));
        }

        let init = self.rnn.zero_state(1)?;
        let states = self.rnn.seq_init(&fused.unsqueeze(0)?, &init)?;
        let outputs: Vec<Tensor> = states.iter().map(|s| s.h().clone()).collect();
        Ok(Tensor::cat(&outputs, 0)?)
    }
}
