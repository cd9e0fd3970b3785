//! Batch question generation over a directory of simulator annotations.
//!
//! # Layout
//!
//! The input directory holds one sub-directory per video, each with the
//! simulator's `outputs.json`:
//!
//! ```text
//! <input_dir>/<video_id>/outputs.json
//! ```
//!
//! For every selected video the runner writes
//! `<output_dir>/<video_type>/<video_id>.json` containing
//! `{"video_id": ..., "question_dict": {...}}`.
//!
//! # Failure isolation
//!
//! Scenes are independent. A scene whose annotation is corrupted or whose
//! generation fails is logged, recorded in the [`BatchReport`] and leaves no
//! output file; the rest of the batch continues.
//!
//! # Example
//!
//! ```rust,ignore
//! use pulley_forge::config::GenerationConfig;
//! use pulley_forge::pipeline::BatchRunner;
//!
//! let config = GenerationConfig::new()
//!     .with_input_dir("data/pulley_group")
//!     .with_seed(Some(42));
//! let report = BatchRunner::new(config)?.run().await?;
//! println!("{} written, {} failed", report.written.len(), report.failed.len());
//! ```

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use walkdir::WalkDir;

use crate::config::GenerationConfig;
use crate::error::PipelineError;
use crate::questions::{generate_scene_questions, QuestionDict, QuestionFamily, TemplateSet};
use crate::scene::{SceneAnnotation, SceneGraph};

/// File name of a per-video annotation.
pub const ANNOTATION_FILE: &str = "outputs.json";

/// Questions of one video as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoQuestions {
    pub video_id: String,
    pub question_dict: QuestionDict,
}

impl VideoQuestions {
    /// Reads a per-video question file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// One annotation selected for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneJob {
    pub video_id: String,
    pub annotation_path: PathBuf,
}

/// What happened to a single scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneOutcome {
    Written { path: PathBuf, questions: usize },
    /// The simulator flagged the scene invalid.
    Invalid,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub written: Vec<String>,
    pub skipped_existing: Vec<String>,
    pub skipped_ids: Vec<String>,
    pub invalid: Vec<String>,
    /// Video id and error message of every failed scene.
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    /// Number of videos the run looked at.
    pub fn total(&self) -> usize {
        self.written.len()
            + self.skipped_existing.len()
            + self.skipped_ids.len()
            + self.invalid.len()
            + self.failed.len()
    }
}

/// Orders video ids numerically when both parse, lexicographically otherwise.
pub(crate) fn compare_video_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Stable 64-bit FNV-1a hash of a video id.
fn hash_video_id(video_id: &str) -> u64 {
    video_id.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Creates the RNG of one scene.
///
/// With a base seed the stream depends only on the seed and the video id, so
/// a scene's output does not depend on batch ordering or concurrency.
pub fn scene_rng(seed: Option<u64>, video_id: &str) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed ^ hash_video_id(video_id)),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

/// Generates and writes the questions of one scene.
///
/// Runs synchronously; the batch runner calls it from blocking workers.
pub fn process_scene(
    job: &SceneJob,
    templates: &TemplateSet,
    families: &[QuestionFamily],
    seed: Option<u64>,
    output_dir: &Path,
) -> Result<SceneOutcome, PipelineError> {
    let annotation = SceneAnnotation::from_path(&job.annotation_path)?;
    let Some(scene) = SceneGraph::from_annotation(annotation)? else {
        return Ok(SceneOutcome::Invalid);
    };

    let mut rng = scene_rng(seed, &job.video_id);
    let question_dict = generate_scene_questions(&scene, templates, families, &mut rng)?;
    let questions = question_dict.values().map(Vec::len).sum();

    let output = VideoQuestions {
        video_id: job.video_id.clone(),
        question_dict,
    };
    let path = output_dir.join(format!("{}.json", job.video_id));
    // Written beside the target and renamed so an interrupted run never
    // leaves a truncated file that a later run would skip as done.
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, serde_json::to_string(&output)?)?;
    fs::rename(&tmp_path, &path)?;

    Ok(SceneOutcome::Written { path, questions })
}

/// Runs question generation over every selected annotation.
pub struct BatchRunner {
    config: GenerationConfig,
    templates: Arc<TemplateSet>,
    concurrency_limiter: Arc<Semaphore>,
}

impl BatchRunner {
    /// Creates a runner, loading the template file if one is configured.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if the configuration is invalid or the
    /// template file cannot be loaded.
    pub fn new(config: GenerationConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let templates = match &config.template_path {
            Some(path) => TemplateSet::load_file(path)?,
            None => TemplateSet::default(),
        };

        let concurrency_limiter = Arc::new(Semaphore::new(config.max_concurrent_scenes));

        Ok(Self {
            config,
            templates: Arc::new(templates),
            concurrency_limiter,
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Lists the annotations of the configured `[start, end)` slice, sorted
    /// by video id.
    pub fn discover(&self) -> Result<Vec<SceneJob>, PipelineError> {
        let mut jobs = Vec::new();
        for entry in WalkDir::new(&self.config.input_dir)
            .min_depth(2)
            .max_depth(2)
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() || entry.file_name() != ANNOTATION_FILE {
                continue;
            }
            let video_id = entry
                .path()
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned());
            if let Some(video_id) = video_id {
                jobs.push(SceneJob {
                    video_id,
                    annotation_path: entry.into_path(),
                });
            }
        }

        jobs.sort_by(|a, b| compare_video_ids(&a.video_id, &b.video_id));

        let len = jobs.len() as f64;
        let start = (len * self.config.start) as usize;
        let end = ((len * self.config.end) as usize).min(jobs.len());
        Ok(jobs.drain(start.min(end)..end).collect())
    }

    /// Processes every selected scene.
    ///
    /// # Errors
    ///
    /// Only discovery and output-directory creation failures are returned;
    /// scene failures end up in [`BatchReport::failed`].
    pub async fn run(&self) -> Result<BatchReport, PipelineError> {
        let output_dir = self.config.video_output_dir();
        fs::create_dir_all(&output_dir)?;

        let jobs = self.discover()?;
        tracing::info!(
            input = %self.config.input_dir.display(),
            output = %output_dir.display(),
            scenes = jobs.len(),
            "Starting batch generation"
        );

        let mut report = BatchReport::default();
        let mut pending = Vec::new();
        for job in jobs {
            if self.config.skip_video_ids.contains(&job.video_id) {
                tracing::debug!(video_id = %job.video_id, "Skipping configured video id");
                report.skipped_ids.push(job.video_id);
                continue;
            }
            if !self.config.restart && output_dir.join(format!("{}.json", job.video_id)).exists() {
                tracing::debug!(video_id = %job.video_id, "Output exists, skipping");
                report.skipped_existing.push(job.video_id);
                continue;
            }
            pending.push(job);
        }

        let families = Arc::new(self.config.families());
        let futures: Vec<_> = pending
            .into_iter()
            .map(|job| {
                let limiter = Arc::clone(&self.concurrency_limiter);
                let templates = Arc::clone(&self.templates);
                let families = Arc::clone(&families);
                let output_dir = output_dir.clone();
                let seed = self.config.seed;
                async move {
                    let video_id = job.video_id.clone();
                    let result = match limiter.acquire_owned().await {
                        Ok(_permit) => tokio::task::spawn_blocking(move || {
                            process_scene(&job, &templates, &families, seed, &output_dir)
                        })
                        .await
                        .unwrap_or_else(|e| Err(PipelineError::Worker(e.to_string()))),
                        Err(e) => Err(PipelineError::Worker(e.to_string())),
                    };
                    (video_id, result)
                }
            })
            .collect();

        for (video_id, result) in futures::future::join_all(futures).await {
            match result {
                Ok(SceneOutcome::Written { questions, .. }) => {
                    tracing::info!(video_id = %video_id, questions, "Wrote scene questions");
                    report.written.push(video_id);
                }
                Ok(SceneOutcome::Invalid) => {
                    tracing::debug!(video_id = %video_id, "Scene flagged invalid");
                    report.invalid.push(video_id);
                }
                Err(e) => {
                    tracing::warn!(video_id = %video_id, error = %e, "Scene failed");
                    report.failed.push((video_id, e.to_string()));
                }
            }
        }

        tracing::info!(
            written = report.written.len(),
            skipped = report.skipped_existing.len() + report.skipped_ids.len(),
            invalid = report.invalid.len(),
            failed = report.failed.len(),
            "Batch generation finished"
        );

        Ok(report)
    }
}
