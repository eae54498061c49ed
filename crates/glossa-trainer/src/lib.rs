//! # Glossa Trainer
//!
//! Epoch-level training and evaluation for the glossa morphological
//! tagger: deterministic initialization, per-sentence optimization with
//! a seeded shuffle, held-out validation, and per-epoch checkpointing.

pub mod checkpoint;
pub mod data;
pub mod report;
pub mod trainer;

pub use checkpoint::{CheckpointSink, DirectorySink};
pub use data::SplitCorpus;
pub use report::{MemoryReporter, Reporter, TracingReporter};
pub use trainer::{EpochStats, TrainConfig, Trainer, Validation};
