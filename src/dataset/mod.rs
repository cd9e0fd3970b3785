//! Dataset assembly from per-video question files.
//!
//! After batch generation every video has its full question dictionary on
//! disk. This module turns those into a benchmark:
//!
//! - [`sampler`]: draws a few factual and a few counterfactual questions per
//!   video into one merged list
//! - [`split`]: partitions the merged list by video into train/val/test
//! - [`baseline`]: majority and random answer baselines per question type

pub mod baseline;
pub mod sampler;
pub mod split;

pub use baseline::{Accuracy, AnswerPriors, BaselineReport};
pub use sampler::{sample_dataset, SamplerConfig};
pub use split::{split_dataset, Split, SplitRatios};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::DatasetError;
use crate::questions::{AnswerType, Program, QuestionFamily, QuestionItem};

/// Reasoning category of a question family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Factual,
    Counterfactual,
    GoalDriven,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::Factual, Self::Counterfactual, Self::GoalDriven];

    pub fn of(family: QuestionFamily) -> Self {
        match family {
            QuestionFamily::RopeCounterfactual | QuestionFamily::RopeCounterfactual2 => {
                Self::Counterfactual
            }
            QuestionFamily::RopeGoaldriven => Self::GoalDriven,
            _ => Self::Factual,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Factual => "factual",
            Self::Counterfactual => "counterfactual",
            Self::GoalDriven => "goal_driven",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A question as it appears in the merged and split dataset files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetQuestion {
    pub question: String,
    pub answer: String,
    pub question_family: QuestionFamily,
    pub answer_type: AnswerType,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<Program>,

    pub qtype: QuestionFamily,
    pub video_id: String,
    /// Sequential five-digit id over the merged list.
    #[serde(default)]
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<Split>,
}

impl DatasetQuestion {
    /// Wraps a generated item of `video_id`. The question id is assigned
    /// once the merged list is complete.
    pub fn from_item(item: QuestionItem, qtype: QuestionFamily, video_id: &str) -> Self {
        Self {
            question: item.question,
            answer: item.answer,
            question_family: item.question_family,
            answer_type: item.answer_type,
            positive: item.positive,
            negative: item.negative,
            program: item.program,
            qtype,
            video_id: video_id.to_string(),
            question_id: String::new(),
            split: None,
        }
    }

    pub fn category(&self) -> Category {
        Category::of(self.qtype)
    }
}

/// Reads a JSON file.
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, DatasetError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Writes a JSON file, creating its parent directory.
pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<(), DatasetError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string(value)?)?;
    Ok(())
}
