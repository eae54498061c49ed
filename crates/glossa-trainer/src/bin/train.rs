//! Trains the glossa tagger on a CoNLL-U treebank.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use glossa_core::model::TaggerConfig;
use glossa_trainer::checkpoint::DirectorySink;
use glossa_trainer::data::SplitCorpus;
use glossa_trainer::report::TracingReporter;
use glossa_trainer::trainer::{TrainConfig, Trainer};

/// CLI arguments
#[derive(Parser)]
#[command(name = "train")]
#[command(about = "Train the glossa morphological tagger on a treebank")]
#[command(version)]
struct Cli {
    /// Training treebank (CoNLL-U)
    #[arg(long, default_value = "data/perseus-conllu/grc_perseus-ud-train.conllu")]
    train_file: PathBuf,

    /// Held-out treebank used for validation (CoNLL-U)
    #[arg(long, default_value = "data/perseus-conllu/grc_perseus-ud-dev.conllu")]
    dev_file: PathBuf,

    /// Word embedding dimension
    #[arg(long, default_value_t = 100)]
    word_embedding_dim: usize,

    /// Character embedding dimension
    #[arg(long, default_value_t = 20)]
    char_embedding_dim: usize,

    /// Character encoder hidden dimension
    #[arg(long, default_value_t = 200)]
    char_hidden_dim: usize,

    /// Word encoder hidden dimension
    #[arg(long, default_value_t = 500)]
    word_hidden_dim: usize,

    /// Optimizer learning rate
    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// Number of training epochs
    #[arg(long, default_value_t = 20)]
    epochs: usize,

    /// Seed for parameter initialization and shuffling
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Directory receiving per-epoch checkpoints
    #[arg(long, default_value = "models")]
    checkpoint_dir: PathBuf,

    /// Tag from word embeddings alone, without the character encoder
    #[arg(long)]
    disable_char_level: bool,

    /// Train and evaluate only the primary (part-of-speech) dimension
    #[arg(long)]
    primary_tag_only: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let (corpus, vocabs) = SplitCorpus::from_conllu_files(&cli.train_file, &cli.dev_file)
        .context("loading treebank files")?;
    info!(
        train_sentences = corpus.train.len(),
        validation_sentences = corpus.validation.len(),
        dimensions = vocabs.dimension_count(),
        "corpus indexed"
    );

    let model_config = TaggerConfig {
        word_embedding_dim: cli.word_embedding_dim,
        char_embedding_dim: cli.char_embedding_dim,
        char_hidden_dim: cli.char_hidden_dim,
        word_hidden_dim: cli.word_hidden_dim,
        enable_char_level: !cli.disable_char_level,
        primary_only: cli.primary_tag_only,
    };
    let train_config = TrainConfig {
        learning_rate: cli.learning_rate,
        epochs: cli.epochs,
        seed: cli.seed,
        checkpoint_stem: "glossa".into(),
    };

    let mut sink = DirectorySink::new(&cli.checkpoint_dir)?;
    vocabs
        .save(cli.checkpoint_dir.join("vocabularies.json"))
        .context("persisting vocabulary tables")?;

    let mut trainer = Trainer::new(&model_config, &vocabs, train_config)?;
    let mut reporter = TracingReporter;
    let history = trainer.fit(&corpus, &mut reporter, &mut sink)?;

    if let Some(last) = history.last() {
        info!(
            epochs = history.len(),
            train_loss = last.train_loss,
            validation_accuracy = last.validation_accuracy,
            "run complete"
        );
    }
    Ok(())
}
