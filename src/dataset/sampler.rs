//! Per-video question sampling.
//!
//! From each video one random question per non-empty family is drawn into a
//! factual or a counterfactual pool. `fact_ques_num` and `count_ques_num`
//! questions are then taken from those pools; when a video has fewer
//! families than requested the remainder is topped up from all of its
//! questions of that kind.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use walkdir::WalkDir;

use super::{read_json, Category, DatasetQuestion};
use crate::error::DatasetError;
use crate::pipeline::{compare_video_ids, VideoQuestions};

/// Answer text of questions with no valid option.
pub const NO_ANSWER: &str = "No answer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Factual questions kept per video.
    pub fact_ques_num: usize,
    /// Counterfactual and goal-driven questions kept per video.
    pub count_ques_num: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            fact_ques_num: 3,
            count_ques_num: 2,
        }
    }
}

/// Reads every per-video question file in `dir`, ordered by video id.
pub fn load_video_files<P: AsRef<Path>>(dir: P) -> Result<Vec<VideoQuestions>, DatasetError> {
    let dir = dir.as_ref();
    let mut videos = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
        if entry.file_type().is_file() && is_json {
            videos.push(read_json::<VideoQuestions, _>(entry.path())?);
        }
    }

    if videos.is_empty() {
        return Err(DatasetError::NoQuestionFiles(dir.display().to_string()));
    }

    videos.sort_by(|a, b| compare_video_ids(&a.video_id, &b.video_id));
    Ok(videos)
}

/// Draws `count` entries of `pool`, topping up from `all` (minus what was
/// already drawn) when the pool is too small.
fn draw(
    mut pool: Vec<DatasetQuestion>,
    mut all: Vec<DatasetQuestion>,
    count: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<DatasetQuestion> {
    if pool.len() >= count {
        pool.shuffle(rng);
        pool.truncate(count);
        return pool;
    }

    all.retain(|question| !pool.contains(question));
    all.shuffle(rng);
    all.truncate(count - pool.len());
    pool.extend(all);
    pool
}

/// Samples the questions of a single video.
pub fn sample_video(
    video: VideoQuestions,
    config: &SamplerConfig,
    rng: &mut ChaCha8Rng,
) -> Vec<DatasetQuestion> {
    let mut fact_pool = Vec::new();
    let mut fact_all = Vec::new();
    let mut count_pool = Vec::new();
    let mut count_all = Vec::new();

    for (family, items) in video.question_dict {
        if items.is_empty() {
            continue;
        }
        let questions: Vec<DatasetQuestion> = items
            .into_iter()
            .map(|item| DatasetQuestion::from_item(item, family, &video.video_id))
            .collect();
        let pick = questions[rng.random_range(0..questions.len())].clone();

        if Category::of(family) == Category::Factual {
            fact_pool.push(pick);
            fact_all.extend(questions);
        } else {
            count_pool.push(pick);
            count_all.extend(questions);
        }
    }

    let mut sampled = draw(fact_pool, fact_all, config.fact_ques_num, rng);
    sampled.extend(draw(count_pool, count_all, config.count_ques_num, rng));
    sampled
}

/// Samples every video and assigns sequential question ids.
pub fn sample_dataset(
    videos: Vec<VideoQuestions>,
    config: &SamplerConfig,
    rng: &mut ChaCha8Rng,
) -> Vec<DatasetQuestion> {
    let mut merged: Vec<DatasetQuestion> = videos
        .into_iter()
        .flat_map(|video| sample_video(video, config, rng))
        .collect();

    for (idx, question) in merged.iter_mut().enumerate() {
        question.question_id = format!("{:0>5}", idx);
        if question.answer == NO_ANSWER {
            question.positive.clear();
        }
    }

    tracing::info!(questions = merged.len(), "Sampled dataset");
    merged
}
