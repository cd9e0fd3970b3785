//! CLI command definitions for pulley-forge.
//!
//! The commands mirror the dataset workflow: `generate` questions for every
//! annotated video, `sample` a few per video into a merged list, `split` the
//! merged list into train/val/test and `evaluate` blind baselines on it.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::GenerationConfig;
use crate::dataset::sampler::load_video_files;
use crate::dataset::split::{split_path, write_splits};
use crate::dataset::{
    read_json, sample_dataset, split_dataset, write_json, AnswerPriors, BaselineReport,
    DatasetQuestion, SamplerConfig, Split, SplitRatios,
};
use crate::pipeline::BatchRunner;
use crate::questions::QuestionFamily;

/// Default root of the per-video question files.
const DEFAULT_OUTPUT_DIR: &str = "output";

/// Default location of the merged question list.
const DEFAULT_MERGE_PATH: &str = "output/merge/merge.json";

const DEFAULT_VIDEO_TYPE: &str = "pulley";
const DEFAULT_OUT_ID: &str = "v1";

/// Physical-reasoning QA dataset generator for pulley scenes.
#[derive(Parser)]
#[command(name = "pulley-forge")]
#[command(about = "Generate physical-reasoning QA datasets from pulley simulator annotations")]
#[command(version)]
#[command(
    long_about = "pulley-forge turns pulley simulator annotations into factual, counterfactual and goal-driven questions.\n\nExample usage:\n  pulley-forge generate --input data/pulley_group --seed 42\n  pulley-forge sample\n  pulley-forge split\n  pulley-forge evaluate"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate questions for every annotated video.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Sample factual and counterfactual questions per video into one list.
    Sample(SampleArgs),

    /// Split the merged list into train/val/test by video.
    Split(SplitArgs),

    /// Evaluate majority and random answer baselines on val and test.
    #[command(alias = "eval")]
    Evaluate(EvaluateArgs),
}

/// Arguments for `pulley-forge generate`.
///
/// Unset options fall back to the `PULLEY_*` environment variables and then
/// to the built-in defaults.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Directory holding `<video_id>/outputs.json` annotations.
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Output root; questions go to `<output>/<video_type>/`.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Dataset name.
    #[arg(long)]
    pub video_type: Option<String>,

    /// Fraction of the sorted annotation list to start at.
    #[arg(long)]
    pub start: Option<f64>,

    /// Fraction of the sorted annotation list to stop at (exclusive).
    #[arg(long)]
    pub end: Option<f64>,

    /// Regenerate videos whose output already exists.
    #[arg(long)]
    pub restart: bool,

    /// Generate a single question family (e.g. mass, rope_goaldriven).
    #[arg(short = 'f', long)]
    pub family: Option<QuestionFamily>,

    /// Video ids to skip.
    #[arg(long, value_delimiter = ',')]
    pub skip_video_ids: Vec<String>,

    /// YAML file replacing the built-in question templates.
    #[arg(short = 't', long)]
    pub templates: Option<PathBuf>,

    /// Base random seed for reproducible output.
    #[arg(short = 's', long)]
    pub seed: Option<u64>,

    /// Maximum number of scenes generated concurrently.
    #[arg(short = 'j', long)]
    pub max_concurrent: Option<usize>,

    /// Output the run summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `pulley-forge sample`.
#[derive(Parser, Debug)]
pub struct SampleArgs {
    /// Output root used by `generate`.
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Dataset name.
    #[arg(long, default_value = DEFAULT_VIDEO_TYPE)]
    pub video_type: String,

    /// Path of the merged question list.
    #[arg(long, default_value = DEFAULT_MERGE_PATH)]
    pub merge_path: PathBuf,

    /// Factual questions per video.
    #[arg(long, default_value = "3")]
    pub fact_ques_num: usize,

    /// Counterfactual and goal-driven questions per video.
    #[arg(long, default_value = "2")]
    pub count_ques_num: usize,

    /// Random seed.
    #[arg(short = 's', long)]
    pub seed: Option<u64>,
}

/// Arguments for `pulley-forge split`.
#[derive(Parser, Debug)]
pub struct SplitArgs {
    /// Path of the merged question list.
    #[arg(long, default_value = DEFAULT_MERGE_PATH)]
    pub merge_path: PathBuf,

    /// Dataset name, used as split file prefix.
    #[arg(long, default_value = DEFAULT_VIDEO_TYPE)]
    pub video_type: String,

    /// Version tag appended to the split file names.
    #[arg(long, default_value = DEFAULT_OUT_ID)]
    pub out_id: String,

    #[arg(long, default_value = "0.5")]
    pub train: f64,

    #[arg(long, default_value = "0.2")]
    pub val: f64,

    #[arg(long, default_value = "0.3")]
    pub test: f64,
}

/// Arguments for `pulley-forge evaluate`.
#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Directory holding the split files.
    #[arg(long, default_value = "output/merge")]
    pub base_dir: PathBuf,

    /// Dataset name, used as split file prefix.
    #[arg(long, default_value = DEFAULT_VIDEO_TYPE)]
    pub video_type: String,

    /// Version tag of the split files.
    #[arg(long, default_value = DEFAULT_OUT_ID)]
    pub out_id: String,

    /// Random seed of the random baseline.
    #[arg(short = 's', long)]
    pub seed: Option<u64>,
}

/// Parse CLI arguments without running any command.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
///
/// For more control over logging initialization, use `parse_cli()` and `run_with_cli()`.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => run_generate_command(args).await,
        Commands::Sample(args) => run_sample_command(args),
        Commands::Split(args) => run_split_command(args),
        Commands::Evaluate(args) => run_evaluate_command(args),
    }
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

// ============================================================================
// Generate
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerateSummary {
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    written: usize,
    skipped_existing: usize,
    skipped_ids: usize,
    invalid: usize,
    failed: Vec<FailedScene>,
}

#[derive(Debug, Serialize)]
struct FailedScene {
    video_id: String,
    error: String,
}

/// Applies the command-line overrides on top of the environment config.
fn generation_config(args: &GenerateArgs) -> anyhow::Result<GenerationConfig> {
    let mut config = GenerationConfig::from_env().context("Invalid PULLEY_* environment")?;

    if let Some(input) = &args.input {
        config.input_dir = input.clone();
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(video_type) = &args.video_type {
        config.video_type = video_type.clone();
    }
    if let Some(start) = args.start {
        config.start = start;
    }
    if let Some(end) = args.end {
        config.end = end;
    }
    if args.restart {
        config.restart = true;
    }
    if args.family.is_some() {
        config.family = args.family;
    }
    if !args.skip_video_ids.is_empty() {
        config.skip_video_ids = args.skip_video_ids.clone();
    }
    if args.templates.is_some() {
        config.template_path = args.templates.clone();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(max) = args.max_concurrent {
        config.max_concurrent_scenes = max;
    }

    config.validate()?;
    Ok(config)
}

async fn run_generate_command(args: GenerateArgs) -> anyhow::Result<()> {
    let config = generation_config(&args)?;
    let started_at = Utc::now();

    let runner = BatchRunner::new(config).context("Failed to set up batch generation")?;
    let report = runner.run().await?;

    let summary = GenerateSummary {
        started_at,
        finished_at: Utc::now(),
        written: report.written.len(),
        skipped_existing: report.skipped_existing.len(),
        skipped_ids: report.skipped_ids.len(),
        invalid: report.invalid.len(),
        failed: report
            .failed
            .into_iter()
            .map(|(video_id, error)| FailedScene { video_id, error })
            .collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("\n=== Generation Results ===");
        println!("Written:          {}", summary.written);
        println!("Already present:  {}", summary.skipped_existing);
        println!("Skipped ids:      {}", summary.skipped_ids);
        println!("Invalid scenes:   {}", summary.invalid);
        println!("Failed scenes:    {}", summary.failed.len());
        for failed in &summary.failed {
            println!("  {}: {}", failed.video_id, failed.error);
        }
        let elapsed = summary.finished_at - summary.started_at;
        println!("Duration:         {}s", elapsed.num_seconds());
    }

    Ok(())
}

// ============================================================================
// Sample / Split / Evaluate
// ============================================================================

fn run_sample_command(args: SampleArgs) -> anyhow::Result<()> {
    let dir = args.output.join(&args.video_type);
    let videos = load_video_files(&dir)
        .with_context(|| format!("Failed to load question files from {}", dir.display()))?;
    info!(videos = videos.len(), "Loaded question files");

    let config = SamplerConfig {
        fact_ques_num: args.fact_ques_num,
        count_ques_num: args.count_ques_num,
    };
    let mut rng = seeded_rng(args.seed);
    let merged = sample_dataset(videos, &config, &mut rng);

    write_json(&args.merge_path, &merged)?;
    println!("Sampled {} questions into {}", merged.len(), args.merge_path.display());
    Ok(())
}

fn run_split_command(args: SplitArgs) -> anyhow::Result<()> {
    let merged: Vec<DatasetQuestion> = read_json(&args.merge_path)
        .with_context(|| format!("Failed to read {}", args.merge_path.display()))?;
    let ratios = SplitRatios {
        train: args.train,
        val: args.val,
        test: args.test,
    };

    let splits = split_dataset(merged, &ratios)?;
    let dir = args.merge_path.parent().unwrap_or_else(|| Path::new("."));
    for path in write_splits(dir, &args.video_type, &args.out_id, &splits)? {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn run_evaluate_command(args: EvaluateArgs) -> anyhow::Result<()> {
    let load = |split: Split| -> anyhow::Result<Vec<DatasetQuestion>> {
        let path = split_path(&args.base_dir, &args.video_type, split, &args.out_id);
        read_json(&path).with_context(|| format!("Failed to read {}", path.display()))
    };

    let priors = AnswerPriors::fit(&load(Split::Train)?)?;
    let mut rng = seeded_rng(args.seed);
    for split in [Split::Val, Split::Test] {
        let report = BaselineReport::evaluate(split.as_str(), &load(split)?, &priors, &mut rng)?;
        println!("{report}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        // Verify CLI definition is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_command_defaults() {
        let cli = Cli::try_parse_from(["pulley-forge", "generate"]).expect("should parse");
        assert_eq!(cli.log_level, "info");

        match cli.command {
            Commands::Generate(args) => {
                assert!(args.input.is_none());
                assert!(args.family.is_none());
                assert!(args.skip_video_ids.is_empty());
                assert!(!args.restart);
                assert!(!args.json);
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_generate_command_with_options() {
        let cli = Cli::try_parse_from([
            "pulley-forge",
            "gen",
            "-i",
            "/data/pulley",
            "--family",
            "rope_counterfactual2",
            "--skip-video-ids",
            "1846,12",
            "--seed",
            "42",
            "--start",
            "0.5",
            "-l",
            "debug",
        ])
        .expect("should parse");
        assert_eq!(cli.log_level, "debug");

        let Commands::Generate(args) = cli.command else {
            panic!("Expected Generate command");
        };
        assert_eq!(args.family, Some(QuestionFamily::RopeCounterfactual2));
        assert_eq!(args.skip_video_ids, vec!["1846", "12"]);

        let config = generation_config(&args).expect("config should build");
        assert_eq!(config.input_dir, PathBuf::from("/data/pulley"));
        assert_eq!(config.seed, Some(42));
        assert!((config.start - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.families(), vec![QuestionFamily::RopeCounterfactual2]);
    }

    #[test]
    fn test_unknown_family_rejected() {
        assert!(Cli::try_parse_from(["pulley-forge", "generate", "--family", "velocity"]).is_err());
    }

    #[test]
    fn test_dataset_command_defaults() {
        let cli = Cli::try_parse_from(["pulley-forge", "sample"]).expect("should parse");
        let Commands::Sample(args) = cli.command else {
            panic!("Expected Sample command");
        };
        assert_eq!(args.fact_ques_num, 3);
        assert_eq!(args.count_ques_num, 2);
        assert_eq!(args.merge_path, PathBuf::from(DEFAULT_MERGE_PATH));

        let cli = Cli::try_parse_from(["pulley-forge", "split", "--out-id", "v2"]).expect("should parse");
        let Commands::Split(args) = cli.command else {
            panic!("Expected Split command");
        };
        assert_eq!(args.out_id, "v2");
        assert!((args.train - 0.5).abs() < f64::EPSILON);

        let cli = Cli::try_parse_from(["pulley-forge", "eval"]).expect("should parse");
        assert!(matches!(cli.command, Commands::Evaluate(_)));
    }
}
