//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads configuration and installs logging
//! - parses CLI arguments
//! - picks the estimator (saved model or formula)
//! - runs the requested command and prints a text or JSON report

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::BenchmarkJob;
use crate::analyzer::PriceAnalyzer;
use crate::cli::{
    BenchmarkArgs, Cli, Command, DisputeArgs, EstimateArgs, EvaluateArgs, FineTuneArgs, GenerateArgs, MarketArgs,
    ModelArgs, RegionalArgs, TrainArgs,
};
use crate::config::{AppConfig, FineTuneConfig, TrainingConfig};
use crate::domain::{CURRENCY, EstimatorKind, PriceQuery, TrainingSample};
use crate::error::AppError;
use crate::estimator::{FairPriceEstimator, FormulaEstimator, TrainedEstimator};
use crate::io::{read_training_csv, write_samples, write_training_csv};
use crate::report;

/// Entry point for the `fairprice` binary.
pub fn run() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    crate::telemetry::init(&config.telemetry)?;
    let cli = Cli::parse();

    let ctx = Context {
        json: cli.json,
        seed: cli.seed.or(config.seed),
        config,
    };
    debug!(json = ctx.json, seed = ?ctx.seed, "starting");

    match cli.command {
        Command::Generate(args) => handle_generate(&ctx, args),
        Command::Train(args) => handle_train(&ctx, args),
        Command::FineTune(args) => handle_fine_tune(&ctx, args),
        Command::Estimate(args) => handle_estimate(&ctx, args),
        Command::MarketRates(args) => handle_market_rates(&ctx, args),
        Command::Regional(args) => handle_regional(&ctx, args),
        Command::Dispute(args) => handle_dispute(&ctx, args),
        Command::Benchmark(args) => handle_benchmark(&ctx, args),
        Command::Evaluate(args) => handle_evaluate(&ctx, args),
    }
}

struct Context {
    json: bool,
    seed: Option<u64>,
    config: AppConfig,
}

impl Context {
    fn analyzer<E: FairPriceEstimator>(&self, estimator: E) -> PriceAnalyzer<E> {
        let analyzer = match self.seed {
            Some(seed) => PriceAnalyzer::with_seed(estimator, seed),
            None => PriceAnalyzer::new(estimator),
        };
        analyzer.with_thresholds(self.config.dispute)
    }

    fn model_dir(&self, args: &ModelArgs) -> Option<PathBuf> {
        args.model_dir.clone().or_else(|| self.config.model_dir.clone())
    }

    fn require_model_dir(&self, args: &ModelArgs) -> Result<PathBuf, AppError> {
        self.model_dir(args)
            .ok_or_else(|| AppError::new(2, "a model directory is required (--model-dir or FAIRPRICE_MODEL_DIR)"))
    }

    /// Saved model when a directory is configured, otherwise the formula.
    fn estimator(&self, args: &ModelArgs) -> Result<Box<dyn FairPriceEstimator>, AppError> {
        match self.model_dir(args) {
            Some(dir) => Ok(Box::new(TrainedEstimator::load(&dir)?)),
            None => Ok(Box::new(FormulaEstimator::new())),
        }
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> String) -> Result<(), AppError> {
        if self.json {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| AppError::new(3, format!("Failed to serialize output: {e}")))?;
            println!("{json}");
        } else {
            print!("{}", text(value));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct EstimateOutput {
    query: PriceQuery,
    estimator: EstimatorKind,
    fair_price: f64,
    currency: &'static str,
}

#[derive(Debug, Serialize)]
struct SavedOutput<'a, T> {
    model_dir: &'a Path,
    #[serde(flatten)]
    result: &'a T,
}

fn handle_generate(ctx: &Context, args: GenerateArgs) -> Result<(), AppError> {
    let mut analyzer = ctx.analyzer(FormulaEstimator::new());
    let samples = analyzer.generate_training_data(args.count);

    match &args.output {
        Some(path) => {
            write_training_csv(path, &samples)?;
            info!(path = %path.display(), count = samples.len(), "training data written");
            let summary = serde_json::json!({ "path": path, "count": samples.len() });
            ctx.emit(&summary, |_| format!("Wrote {} samples to {}\n", samples.len(), path.display()))
        }
        None if ctx.json => ctx.emit(&samples, |_| String::new()),
        None => write_samples(std::io::stdout().lock(), &samples)
            .map_err(|e| AppError::new(3, format!("Failed to write CSV to stdout: {e}"))),
    }
}

fn handle_train(ctx: &Context, args: TrainArgs) -> Result<(), AppError> {
    let dir = ctx.require_model_dir(&args.model)?;
    let samples = match (&args.data, args.generate) {
        (Some(path), _) => read_training_csv(path)?,
        (None, Some(count)) => ctx.analyzer(FormulaEstimator::new()).generate_training_data(count),
        (None, None) => return Err(AppError::new(2, "pass --data <CSV> or --generate <N>")),
    };

    let config = TrainingConfig {
        regressor: args.regressor,
        epochs: args.epochs,
        batch_size: args.batch_size,
        validation_split: args.validation_split,
        learning_rate: args.learning_rate,
        hidden_layers: args.hidden.clone(),
        ridge_lambda: args.ridge_lambda,
        seed: ctx.seed.unwrap_or(TrainingConfig::default().seed),
    };
    let mut analyzer = ctx.analyzer(TrainedEstimator::new());
    let history = analyzer.train(&samples, &config)?;
    analyzer.estimator().save(&dir)?;

    ctx.emit(
        &SavedOutput {
            model_dir: &dir,
            result: &history,
        },
        |out| {
            format!(
                "{}Model saved to {}\n",
                report::format_training_history(out.result),
                out.model_dir.display()
            )
        },
    )
}

fn handle_fine_tune(ctx: &Context, args: FineTuneArgs) -> Result<(), AppError> {
    let dir = ctx.require_model_dir(&args.model)?;
    let samples = read_training_csv(&args.data)?;
    let config = FineTuneConfig {
        epochs: args.epochs,
        batch_size: args.batch_size,
        seed: ctx.seed.unwrap_or(FineTuneConfig::default().seed),
    };

    let mut analyzer = ctx.analyzer(TrainedEstimator::load(&dir)?);
    let history = analyzer.fine_tune(&samples, &config)?;
    analyzer.estimator().save(&dir)?;

    ctx.emit(
        &SavedOutput {
            model_dir: &dir,
            result: &history,
        },
        |out| {
            format!(
                "{}Model saved to {}\n",
                report::format_training_history(out.result),
                out.model_dir.display()
            )
        },
    )
}

fn handle_estimate(ctx: &Context, args: EstimateArgs) -> Result<(), AppError> {
    let analyzer = ctx.analyzer(ctx.estimator(&args.model)?);
    let job = args.job;
    let fair_price = analyzer.estimate(&job.category, &job.location, job.area, job.complexity, job.material)?;

    let output = EstimateOutput {
        query: PriceQuery::new(job.category, job.location, job.area, job.complexity, job.material),
        estimator: analyzer.estimator().kind(),
        fair_price,
        currency: CURRENCY,
    };
    ctx.emit(&output, |o| report::format_estimate(&o.query, o.fair_price, o.estimator))
}

fn handle_market_rates(ctx: &Context, args: MarketArgs) -> Result<(), AppError> {
    let mut analyzer = ctx.analyzer(FormulaEstimator::new());
    let info = analyzer.get_market_rates(&args.category, &args.location);
    ctx.emit(&info, report::format_market_rates)
}

fn handle_regional(ctx: &Context, args: RegionalArgs) -> Result<(), AppError> {
    let analyzer = ctx.analyzer(ctx.estimator(&args.model)?);
    let regional = analyzer.analyze_regional_pricing(&args.category, args.area, args.complexity, args.material)?;
    ctx.emit(&regional, report::format_regional_report)
}

fn handle_dispute(ctx: &Context, args: DisputeArgs) -> Result<(), AppError> {
    let mut analyzer = ctx.analyzer(ctx.estimator(&args.model)?);
    let job = args.job;
    let result = analyzer.evaluate_dispute(
        &job.category,
        &job.location,
        job.area,
        job.complexity,
        job.material,
        args.contractor_price,
        args.client_expectation,
    )?;
    ctx.emit(&result, report::format_dispute)
}

fn handle_benchmark(ctx: &Context, args: BenchmarkArgs) -> Result<(), AppError> {
    let analyzer = ctx.analyzer(ctx.estimator(&args.model)?);
    let categories = (!args.categories.is_empty()).then_some(args.categories.as_slice());
    let job = BenchmarkJob {
        area_sqm: args.area,
        complexity_score: args.complexity,
        material_quality_score: args.material,
    };
    let grid = analyzer.benchmark_report(categories, job)?;
    ctx.emit(&grid, report::format_benchmark)
}

fn handle_evaluate(ctx: &Context, args: EvaluateArgs) -> Result<(), AppError> {
    let dir = ctx.require_model_dir(&args.model)?;
    let samples: Vec<TrainingSample> = read_training_csv(&args.data)?;
    let analyzer = ctx.analyzer(TrainedEstimator::load(&dir)?);
    let metrics = analyzer.evaluate(&samples)?;
    ctx.emit(&metrics, report::format_evaluation)
}
