//! Command-line parsing for the `fairprice` binary.
//!
//! Argument parsing and command dispatch stay separate from the estimation
//! and analysis code; `app` turns these structs into library calls.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::analysis::{BENCHMARK_AREA_SQM, BENCHMARK_SCORE};
use crate::domain::RegressorKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fairprice", version, about = "Construction fair-price estimator (LKR)")]
pub struct Cli {
    /// Print JSON instead of the text report.
    #[arg(long, global = true)]
    pub json: bool,

    /// Seed for market jitter, data generation and training (overrides FAIRPRICE_SEED).
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate synthetic training samples.
    Generate(GenerateArgs),
    /// Train a model from scratch and save it.
    Train(TrainArgs),
    /// Continue training a saved model on new samples.
    FineTune(FineTuneArgs),
    /// Estimate a fair price for one job.
    Estimate(EstimateArgs),
    /// Show a simulated market-rate snapshot.
    MarketRates(MarketArgs),
    /// Price one job across every known location.
    Regional(RegionalArgs),
    /// Evaluate a contractor/client price dispute.
    Dispute(DisputeArgs),
    /// Category × location price grid for a reference job.
    Benchmark(BenchmarkArgs),
    /// Score a saved model against labelled samples.
    Evaluate(EvaluateArgs),
}

/// Saved model selection. Without a directory the formula estimator is used.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Saved model directory (falls back to FAIRPRICE_MODEL_DIR).
    #[arg(long, value_name = "DIR")]
    pub model_dir: Option<PathBuf>,
}

/// Job description shared by the estimation commands.
#[derive(Debug, Args, Clone)]
pub struct JobArgs {
    /// Trade, e.g. "Masonry" or "Foundation Work".
    #[arg(short = 'c', long)]
    pub category: String,

    /// District, e.g. "Colombo".
    #[arg(short = 'l', long)]
    pub location: String,

    /// Job area in square meters.
    #[arg(short = 'a', long)]
    pub area: f64,

    /// Complexity score (1-10).
    #[arg(long, default_value_t = 5.0)]
    pub complexity: f64,

    /// Material quality score (1-10).
    #[arg(long, default_value_t = 5.0)]
    pub material: f64,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Number of samples.
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub count: usize,

    /// CSV file to write; stdout when omitted.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Training samples CSV.
    #[arg(long, value_name = "CSV", conflicts_with = "generate")]
    pub data: Option<PathBuf>,

    /// Train on this many freshly generated samples instead of a CSV.
    #[arg(long, value_name = "N")]
    pub generate: Option<usize>,

    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(long, value_enum, default_value_t = RegressorKind::Mlp)]
    pub regressor: RegressorKind,

    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Trailing fraction of the samples held out for validation.
    #[arg(long, default_value_t = 0.2)]
    pub validation_split: f64,

    /// Adam learning rate (MLP only).
    #[arg(long, default_value_t = 0.001)]
    pub learning_rate: f64,

    /// Hidden layer widths (MLP only).
    #[arg(long, value_delimiter = ',', default_values_t = vec![64, 32, 16])]
    pub hidden: Vec<usize>,

    /// L2 penalty (ridge only).
    #[arg(long, default_value_t = 1e-3)]
    pub ridge_lambda: f64,
}

#[derive(Debug, Args, Clone)]
pub struct FineTuneArgs {
    /// New samples CSV.
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,
}

#[derive(Debug, Args, Clone)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub job: JobArgs,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args, Clone)]
pub struct MarketArgs {
    #[arg(short = 'c', long)]
    pub category: String,

    #[arg(short = 'l', long)]
    pub location: String,
}

#[derive(Debug, Args, Clone)]
pub struct RegionalArgs {
    #[arg(short = 'c', long)]
    pub category: String,

    #[arg(short = 'a', long)]
    pub area: f64,

    #[arg(long, default_value_t = 5.0)]
    pub complexity: f64,

    #[arg(long, default_value_t = 5.0)]
    pub material: f64,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DisputeArgs {
    #[command(flatten)]
    pub job: JobArgs,

    /// Price quoted by the contractor.
    #[arg(long)]
    pub contractor_price: f64,

    /// Price the client expects, if any.
    #[arg(long)]
    pub client_expectation: Option<f64>,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args, Clone)]
pub struct BenchmarkArgs {
    /// Restrict to these categories (repeatable); all known ones by default.
    #[arg(short = 'c', long = "category")]
    pub categories: Vec<String>,

    #[arg(short = 'a', long, default_value_t = BENCHMARK_AREA_SQM)]
    pub area: f64,

    #[arg(long, default_value_t = BENCHMARK_SCORE)]
    pub complexity: f64,

    #[arg(long, default_value_t = BENCHMARK_SCORE)]
    pub material: f64,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args, Clone)]
pub struct EvaluateArgs {
    /// Labelled samples CSV.
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_dispute_with_global_flags() {
        let cli = Cli::try_parse_from([
            "fairprice",
            "dispute",
            "-c",
            "Masonry",
            "-l",
            "Colombo",
            "-a",
            "120",
            "--contractor-price",
            "9000",
            "--json",
            "--seed",
            "7",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.seed, Some(7));
        let Command::Dispute(args) = cli.command else {
            panic!("expected dispute");
        };
        assert_eq!(args.job.area, 120.0);
        assert_eq!(args.client_expectation, None);
        assert!(args.model.model_dir.is_none());
    }

    #[test]
    fn train_hidden_layers_are_comma_separated() {
        let cli = Cli::try_parse_from(["fairprice", "train", "--generate", "500", "--hidden", "32,8"]).unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.hidden, vec![32, 8]);
        assert_eq!(args.generate, Some(500));
        assert_eq!(args.regressor, RegressorKind::Mlp);
    }

    #[test]
    fn train_rejects_both_sources() {
        let err = Cli::try_parse_from(["fairprice", "train", "--data", "x.csv", "--generate", "10"]);
        assert!(err.is_err());
    }
}
