//! The epoch-level training and evaluation loop.
//!
//! Drives `Init → {TrainEpoch → ValidateEpoch → Checkpoint}* → Done`
//! over per-sentence forward/backward passes. Model parameters are
//! owned here for the duration of a run; only the optimizer step writes
//! them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use oorandom::Rand64;
use tracing::{info, warn};

use glossa_core::corpus::Sentence;
use glossa_core::model::{Tagger, TaggerConfig};
use glossa_core::vocab::Vocabularies;
use glossa_core::{GlossaError, Result};

use crate::checkpoint::CheckpointSink;
use crate::data::SplitCorpus;
use crate::report::Reporter;

/// Loop-level hyperparameters; the component shapes live in
/// [`TaggerConfig`].
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Optimizer learning rate.
    pub learning_rate: f64,
    /// Number of epochs to run.
    pub epochs: usize,
    /// Seed for parameter initialization and epoch shuffling.
    pub seed: u64,
    /// Prefix for checkpoint labels.
    pub checkpoint_stem: String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            epochs: 20,
            seed: 1,
            checkpoint_stem: "glossa".into(),
        }
    }
}

/// Per-epoch summary statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpochStats {
    /// Mean per-sentence training loss.
    pub train_loss: f64,
    /// Training sentences skipped as malformed.
    pub train_skipped: usize,
    /// Mean per-sentence loss on the held-out split.
    pub validation_loss: f64,
    /// Token accuracy on the primary tag dimension.
    pub validation_accuracy: f64,
    /// Validation sentences skipped as malformed.
    pub validation_skipped: usize,
}

/// Result of one evaluation pass over a held-out split.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validation {
    /// Mean per-sentence loss.
    pub loss: f64,
    /// Token accuracy on the primary tag dimension.
    pub accuracy: f64,
    /// Sentences skipped as malformed.
    pub skipped: usize,
}

/// Owns the model and optimizer state for one training run.
pub struct Trainer {
    model: Tagger,
    params: VarMap,
    optimizer: AdamW,
    config: TrainConfig,
    stop: Arc<AtomicBool>,
}

impl Trainer {
    /// Init: build the model on CPU, re-initialize every parameter from
    /// the configured seed, and set up the optimizer.
    ///
    /// Repeated runs with identical inputs and configuration reproduce
    /// identical parameter trajectories.
    pub fn new(
        model_config: &TaggerConfig,
        vocabs: &Vocabularies,
        config: TrainConfig,
    ) -> Result<Self> {
        let device = Device::Cpu;
        let params = VarMap::new();
        let vb = VarBuilder::from_varmap(&params, DType::F32, &device);
        let model = Tagger::new(model_config, vocabs, vb)?;
        seed_parameters(&params, config.seed)?;

        let optimizer = AdamW::new(
            params.all_vars(),
            ParamsAdamW {
                lr: config.learning_rate,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;

        Ok(Self {
            model,
            params,
            optimizer,
            config,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The model being trained.
    pub fn model(&self) -> &Tagger {
        &self.model
    }

    /// The parameter registry backing the model.
    pub fn params(&self) -> &VarMap {
        &self.params
    }

    /// Handle for requesting a clean stop. The flag is checked between
    /// sentences and at epoch boundaries, never mid-sentence, so the
    /// final checkpoint is always consistent.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Run the full train/validate/checkpoint cycle.
    pub fn fit<R: Reporter, S: CheckpointSink>(
        &mut self,
        corpus: &SplitCorpus,
        reporter: &mut R,
        sink: &mut S,
    ) -> Result<Vec<EpochStats>> {
        let mut rng = Rand64::new(u128::from(self.config.seed));
        let mut history = Vec::with_capacity(self.config.epochs);

        for epoch in 0..self.config.epochs {
            let mut stats = self.train_epoch(&corpus.train, &mut rng, epoch)?;

            let validation = self.validate(&corpus.validation)?;
            stats.validation_loss = validation.loss;
            stats.validation_accuracy = validation.accuracy;
            stats.validation_skipped = validation.skipped;

            reporter.report("train_loss", stats.train_loss, epoch);
            reporter.report("train_skipped", stats.train_skipped as f64, epoch);
            reporter.report("validation_loss", stats.validation_loss, epoch);
            reporter.report("validation_accuracy", stats.validation_accuracy, epoch);
            reporter.report("validation_skipped", stats.validation_skipped as f64, epoch);

            sink.persist(&self.checkpoint_label(epoch), &self.params)?;
            history.push(stats);

            if self.stop.load(Ordering::Relaxed) {
                info!(epoch = epoch + 1, "stop requested, ending run after checkpoint");
                break;
            }
        }

        Ok(history)
    }

    /// One pass over the training split in a freshly shuffled order:
    /// forward, loss, backward, optimizer step per sentence, gradients
    /// discarded before the next sentence.
    fn train_epoch(
        &mut self,
        sentences: &[Sentence],
        rng: &mut Rand64,
        epoch: usize,
    ) -> Result<EpochStats> {
        let mut order: Vec<usize> = (0..sentences.len()).collect();
        shuffle(&mut order, rng);

        let mut stats = EpochStats::default();
        let mut total_loss = 0.0f64;
        let mut counted = 0usize;

        for &index in &order {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }

            let sentence = &sentences[index];
            let loss = match self.sentence_loss(sentence) {
                Ok(loss) => loss,
                Err(err @ (GlossaError::EmptySentence | GlossaError::EmptyWord)) => {
                    warn!(epoch = epoch + 1, sentence = index, error = %err, "skipping sentence");
                    stats.train_skipped += 1;
                    continue;
                }
                Err(other) => return Err(other),
            };

            let value = match finite_loss(&loss) {
                Ok(value) => value,
                Err(err) => {
                    warn!(epoch = epoch + 1, sentence = index, error = %err, "aborting run");
                    return Err(err);
                }
            };

            self.optimizer.backward_step(&loss)?;
            total_loss += f64::from(value);
            counted += 1;
        }

        stats.train_loss = if counted > 0 {
            total_loss / counted as f64
        } else {
            0.0
        };
        Ok(stats)
    }

    /// Evaluation pass over a held-out split. Computes the same forward
    /// pass and loss as training plus token accuracy on the primary tag
    /// dimension, but never computes gradients or touches the optimizer:
    /// parameters are bit-identical before and after.
    pub fn validate(&self, sentences: &[Sentence]) -> Result<Validation> {
        let mut result = Validation::default();
        let mut total_loss = 0.0f64;
        let mut counted = 0usize;
        let mut correct = 0usize;
        let mut tokens = 0usize;

        for (index, sentence) in sentences.iter().enumerate() {
            let scores = match self.model.forward(sentence) {
                Ok(scores) => scores,
                Err(GlossaError::EmptySentence | GlossaError::EmptyWord) => {
                    warn!(sentence = index, "skipping validation sentence");
                    result.skipped += 1;
                    continue;
                }
                Err(other) => return Err(other),
            };

            let loss = self.model.loss(&scores, sentence)?;
            total_loss += f64::from(finite_loss(&loss)?);
            counted += 1;

            let predicted = self.model.predict(&scores)?;
            for (token, &tag) in sentence.tokens.iter().zip(predicted[0].iter()) {
                if token.tags[0] == tag {
                    correct += 1;
                }
                tokens += 1;
            }
        }

        result.loss = if counted > 0 {
            total_loss / counted as f64
        } else {
            0.0
        };
        result.accuracy = if tokens > 0 {
            correct as f64 / tokens as f64
        } else {
            0.0
        };
        Ok(result)
    }

    fn sentence_loss(&self, sentence: &Sentence) -> Result<Tensor> {
        let scores = self.model.forward(sentence)?;
        self.model.loss(&scores, sentence)
    }

    /// Label for the epoch's snapshot: monotone epoch ordinal plus wall
    /// clock, so no two checkpoints collide within or across runs.
    fn checkpoint_label(&self, epoch: usize) -> String {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        format!("{}-e{:03}-{seconds}", self.config.checkpoint_stem, epoch + 1)
    }
}

/// Extract the scalar loss, refusing to fold a non-finite value into a
/// running total.
fn finite_loss(loss: &Tensor) -> Result<f32> {
    let value = loss.to_scalar::<f32>()?;
    if !value.is_finite() {
        return Err(GlossaError::NumericDivergence {
            value: f64::from(value),
        });
    }
    Ok(value)
}

/// Fisher–Yates shuffle driven by the run's seeded generator.
fn shuffle(indices: &mut [usize], rng: &mut Rand64) {
    for i in (1..indices.len()).rev() {
        let j = rng.rand_range(0..i as u64 + 1) as usize;
        indices.swap(i, j);
    }
}

/// Re-initialize every registered parameter from a deterministic
/// generator, iterating names in sorted order.
///
/// The CPU backend's own RNG cannot be seeded, so reproducibility comes
/// from overwriting each variable with values drawn here before the
/// first optimizer step.
fn seed_parameters(params: &VarMap, seed: u64) -> Result<()> {
    let data = params.data().lock().unwrap();
    let mut names: Vec<&String> = data.keys().collect();
    names.sort();

    let mut rng = Rand64::new(u128::from(seed));
    for name in names {
        let var = &data[name];
        let count = var.shape().elem_count();
        let values: Vec<f32> = (0..count)
            .map(|_| (rng.rand_float() as f32) * 0.2 - 0.1)
            .collect();
        let fresh = Tensor::from_vec(values, var.shape().dims(), var.device())?;
        var.set(&fresh)?;
    }
    Ok(())
}
