//! melodygen - command-line front end for the melody pipeline.
//!
//! Subcommands:
//! - `melodygen preprocess <dataset> <out>` - Encode a score directory into a corpus
//! - `melodygen train <out>` - Fit the n-gram predictor on a preprocessed corpus
//! - `melodygen generate <out> <seed>` - Sample a melody and write MIDI or JSON
//! - `melodygen decode <symbols>` - Turn a symbol string back into a score
//!
//! Logging goes to stderr and honours `RUST_LOG`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use melodygen::corpus::{load_corpus, tokenize, windows};
use melodygen::encoding::{parse_symbols, symbols_to_string};
use melodygen::midi::write_events;
use melodygen::{
    decode, CancelFlag, Event, GenerationOptions, MelodyGenerator, NgramPredictor,
    PipelineConfig, Score, Vocabulary,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// File name of the trained predictor inside the output directory.
const MODEL_FILE: &str = "model.bin";

#[derive(Parser)]
#[command(name = "melodygen")]
#[command(about = "Preprocess melodies into a symbol corpus and sample new ones")]
#[command(version)]
struct Cli {
    /// JSON pipeline configuration (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode every score in a dataset directory
    Preprocess {
        /// Directory of .mid/.midi/.json scores (searched recursively)
        dataset: PathBuf,

        /// Directory for the corpus and mapping files
        output: PathBuf,

        /// Skip writing one encoded file per score
        #[arg(long)]
        no_encoded: bool,
    },

    /// Train the bundled n-gram predictor on a preprocessed corpus
    Train {
        /// Directory written by `preprocess`
        output: PathBuf,

        /// Override the configured context order
        #[arg(long)]
        order: Option<usize>,
    },

    /// Generate a melody from a seed
    Generate {
        /// Directory holding the mapping and trained model
        output: PathBuf,

        /// Seed symbols, e.g. "64 _ 69 _ _ _ 71 _"
        seed: String,

        /// Where to write the melody (.json for a score, anything else for MIDI)
        #[arg(short = 'o', long, default_value = "melody.mid")]
        out: PathBuf,

        /// Maximum number of sampling steps
        #[arg(short, long, default_value = "500")]
        steps: usize,

        /// Sampling temperature
        #[arg(short, long, default_value = "0.3")]
        temperature: f64,

        /// Seed for the random number generator
        #[arg(long)]
        rng_seed: Option<u64>,

        /// Stop sampling after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Decode a symbol string into a score
    Decode {
        /// Symbols, e.g. "60 _ _ _ r _"
        symbols: String,

        /// Where to write the result (.json or MIDI)
        #[arg(short = 'o', long, default_value = "decoded.mid")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Preprocess {
            dataset,
            output,
            no_encoded,
        } => {
            let preprocessed = melodygen::run_preprocess(&dataset, &output, &config, !no_encoded)
                .with_context(|| format!("Failed to preprocess {}", dataset.display()))?;
            let report = preprocessed.report;
            println!(
                "loaded {}, rejected {}, failed {}, encoded {} ({} symbols, vocabulary {})",
                report.loaded,
                report.rejected,
                report.failed,
                report.encoded,
                preprocessed.corpus.len(),
                preprocessed.vocabulary.len()
            );
        }
        Commands::Train { output, order } => {
            train(&output, &config, order.unwrap_or(config.predictor_order))?;
        }
        Commands::Generate {
            output,
            seed,
            out,
            steps,
            temperature,
            rng_seed,
            timeout_secs,
        } => {
            let options = GenerationOptions {
                steps,
                sequence_length: config.sequence_length,
                temperature,
            };
            generate(&output, &seed, &out, &options, rng_seed, timeout_secs, &config)?;
        }
        Commands::Decode { symbols, out } => {
            let symbols = parse_symbols(&symbols).context("Failed to parse symbols")?;
            let events = decode(&symbols, config.time_step)?;
            write_melody(&events, &out, &config)?;
        }
    }

    Ok(())
}

fn train(output: &Path, config: &PipelineConfig, order: usize) -> Result<()> {
    let vocabulary = Vocabulary::load(output.join(&config.mapping_file))
        .context("Failed to load mapping; run `preprocess` first")?;
    let corpus = load_corpus(output.join(&config.corpus_file)).context("Failed to load corpus")?;
    let ids = tokenize(&corpus, &vocabulary)?;

    if ids.len() <= config.sequence_length {
        bail!(
            "corpus has {} symbols, need more than the sequence length {}",
            ids.len(),
            config.sequence_length
        );
    }

    let model = NgramPredictor::train(
        windows(&ids, config.sequence_length),
        vocabulary.len(),
        order,
    );
    let path = output.join(MODEL_FILE);
    model
        .save(&path)
        .with_context(|| format!("Failed to save model to {}", path.display()))?;
    println!("Saved order-{} model to {}", model.order(), path.display());
    Ok(())
}

fn generate(
    output: &Path,
    seed: &str,
    out: &Path,
    options: &GenerationOptions,
    rng_seed: Option<u64>,
    timeout_secs: Option<u64>,
    config: &PipelineConfig,
) -> Result<()> {
    let vocabulary = Vocabulary::load(output.join(&config.mapping_file))
        .context("Failed to load mapping; run `preprocess` first")?;
    let model = NgramPredictor::load(output.join(MODEL_FILE))
        .context("Failed to load model; run `train` first")?;
    if model.vocabulary_size() != vocabulary.len() {
        bail!(
            "model was trained on {} symbols but the mapping has {}",
            model.vocabulary_size(),
            vocabulary.len()
        );
    }

    let seed = parse_symbols(seed).context("Failed to parse seed")?;
    let mut rng = match rng_seed {
        Some(value) => StdRng::seed_from_u64(value),
        None => StdRng::from_entropy(),
    };

    let cancel = CancelFlag::new();
    if let Some(secs) = timeout_secs {
        let flag = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            flag.cancel();
        });
    }

    let mut generator = MelodyGenerator::new(&vocabulary, model)?;
    let generation = generator.generate(&seed, options, &mut rng, &cancel)?;
    println!("{}", symbols_to_string(&generation.melody));
    tracing::info!(termination = ?generation.termination, "Stopped");

    let events = decode(&generation.melody, config.time_step)?;
    write_melody(&events, out, config)
}

/// Writes events as a JSON score when `path` ends in `.json`, MIDI otherwise.
fn write_melody(events: &[Event], path: &Path, config: &PipelineConfig) -> Result<()> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("melody");
        Score::new(name, events.to_vec())
            .save_to_file(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    } else {
        write_events(events, path, config.tempo)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    println!("Wrote {} events to {}", events.len(), path.display());
    Ok(())
}
