//! Train/val/test partitioning by video.
//!
//! All questions of a video land in the same split. Videos are ordered by
//! numeric id and cut at the cumulative ratio boundaries.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use super::{write_json, DatasetQuestion};
use crate::error::DatasetError;
use crate::pipeline::compare_video_ids;
use crate::questions::QuestionFamily;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Self::Train, Self::Val, Self::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Val => "val",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fraction of videos assigned to each split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.5,
            val: 0.2,
            test: 0.3,
        }
    }
}

impl SplitRatios {
    /// Ratios must be non-negative and sum to one.
    pub fn validate(&self) -> Result<(), DatasetError> {
        let ratios = [self.train, self.val, self.test];
        if ratios.iter().any(|r| !(0.0..=1.0).contains(r)) {
            return Err(DatasetError::InvalidRatios(format!(
                "each ratio must be between 0 and 1, got {:?}",
                ratios
            )));
        }
        let sum: f64 = ratios.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(DatasetError::InvalidRatios(format!(
                "ratios must sum to 1, got {}",
                sum
            )));
        }
        Ok(())
    }

    pub fn get(&self, split: Split) -> f64 {
        match split {
            Split::Train => self.train,
            Split::Val => self.val,
            Split::Test => self.test,
        }
    }
}

/// Path of one split file: `<dir>/<video_type>_<split>_<out_id>.json`.
pub fn split_path(dir: &Path, video_type: &str, split: Split, out_id: &str) -> PathBuf {
    dir.join(format!("{}_{}_{}.json", video_type, split, out_id))
}

/// Partitions `questions` by video and tags each with its split.
pub fn split_dataset(
    questions: Vec<DatasetQuestion>,
    ratios: &SplitRatios,
) -> Result<BTreeMap<Split, Vec<DatasetQuestion>>, DatasetError> {
    ratios.validate()?;

    let mut video_ids: Vec<String> = questions
        .iter()
        .map(|q| q.video_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    video_ids.sort_by(|a, b| compare_video_ids(a, b));

    let len = video_ids.len() as f64;
    let mut assignment = BTreeMap::new();
    let mut start_ratio = 0.0;
    for split in Split::ALL {
        let end_ratio = start_ratio + ratios.get(split);
        let start = (len * start_ratio) as usize;
        let end = ((len * end_ratio) as usize).min(video_ids.len());
        for video_id in &video_ids[start.min(end)..end] {
            assignment.insert(video_id.clone(), split);
        }
        tracing::debug!(split = %split, start, end, "Split boundaries");
        start_ratio = end_ratio;
    }

    let mut splits: BTreeMap<Split, Vec<DatasetQuestion>> =
        Split::ALL.into_iter().map(|split| (split, Vec::new())).collect();
    for mut question in questions {
        // Rounding can leave the last video unassigned; it belongs to the test split.
        let split = assignment
            .get(&question.video_id)
            .copied()
            .unwrap_or(Split::Test);
        question.split = Some(split);
        splits.entry(split).or_default().push(question);
    }

    Ok(splits)
}

/// Number of questions per family.
pub fn family_counts(questions: &[DatasetQuestion]) -> BTreeMap<QuestionFamily, usize> {
    let mut counts = BTreeMap::new();
    for question in questions {
        *counts.entry(question.qtype).or_insert(0) += 1;
    }
    counts
}

/// Writes each split to its own file and returns the written paths.
pub fn write_splits(
    dir: &Path,
    video_type: &str,
    out_id: &str,
    splits: &BTreeMap<Split, Vec<DatasetQuestion>>,
) -> Result<Vec<PathBuf>, DatasetError> {
    let mut paths = Vec::with_capacity(splits.len());
    for (split, questions) in splits {
        let path = split_path(dir, video_type, *split, out_id);
        write_json(&path, questions)?;
        tracing::info!(
            split = %split,
            questions = questions.len(),
            families = ?family_counts(questions),
            path = %path.display(),
            "Wrote split"
        );
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::read_json;
    use crate::questions::{AnswerType, QuestionItem};
    use tempfile::TempDir;

    fn question(video_id: &str, family: QuestionFamily) -> DatasetQuestion {
        let item = QuestionItem {
            question: format!("question of {video_id}"),
            answer: "yes".to_string(),
            question_family: family,
            answer_type: AnswerType::OpenEnded,
            positive: vec!["yes".to_string()],
            negative: Vec::new(),
            program: None,
        };
        DatasetQuestion::from_item(item, family, video_id)
    }

    fn questions(videos: usize) -> Vec<DatasetQuestion> {
        (0..videos)
            .rev()
            .flat_map(|id| {
                let id = id.to_string();
                vec![question(&id, QuestionFamily::Mass), question(&id, QuestionFamily::Color)]
            })
            .collect()
    }

    #[test]
    fn test_default_ratios() {
        let splits = split_dataset(questions(10), &SplitRatios::default()).expect("split should succeed");
        assert_eq!(splits[&Split::Train].len(), 10);
        assert_eq!(splits[&Split::Val].len(), 4);
        assert_eq!(splits[&Split::Test].len(), 6);

        let train_videos: BTreeSet<&str> = splits[&Split::Train].iter().map(|q| q.video_id.as_str()).collect();
        assert_eq!(train_videos, ["0", "1", "2", "3", "4"].into_iter().collect());
        assert!(splits[&Split::Test].iter().all(|q| q.split == Some(Split::Test)));
    }

    #[test]
    fn test_numeric_video_order() {
        let mut all = questions(12);
        all.retain(|q| q.qtype == QuestionFamily::Mass);
        let splits = split_dataset(all, &SplitRatios::default()).expect("split should succeed");
        // "10" and "11" sort after "9", so they end up in test.
        let test_videos: Vec<&str> = splits[&Split::Test].iter().map(|q| q.video_id.as_str()).collect();
        assert!(test_videos.contains(&"10"));
        assert!(test_videos.contains(&"11"));
        assert!(!splits[&Split::Train].iter().any(|q| q.video_id == "10"));
    }

    #[test]
    fn test_every_question_is_assigned_once() {
        for videos in 1..15 {
            let splits = split_dataset(questions(videos), &SplitRatios::default()).expect("split should succeed");
            let total: usize = splits.values().map(Vec::len).sum();
            assert_eq!(total, videos * 2);
        }
    }

    #[test]
    fn test_invalid_ratios() {
        let ratios = SplitRatios {
            train: 0.6,
            val: 0.3,
            test: 0.3,
        };
        assert!(matches!(
            split_dataset(questions(3), &ratios),
            Err(DatasetError::InvalidRatios(_))
        ));
    }

    #[test]
    fn test_write_splits_file_names() {
        let dir = TempDir::new().expect("temp dir");
        let splits = split_dataset(questions(4), &SplitRatios::default()).expect("split should succeed");
        let paths = write_splits(dir.path(), "pulley", "v1", &splits).expect("write should succeed");
        assert_eq!(paths.len(), 3);
        assert!(dir.path().join("pulley_train_v1.json").exists());
        assert!(dir.path().join("pulley_val_v1.json").exists());

        let test: Vec<DatasetQuestion> =
            read_json(split_path(dir.path(), "pulley", Split::Test, "v1")).expect("read should succeed");
        assert_eq!(test, splits[&Split::Test]);
    }

    #[test]
    fn test_family_counts() {
        let counts = family_counts(&questions(3));
        assert_eq!(counts[&QuestionFamily::Mass], 3);
        assert_eq!(counts[&QuestionFamily::Color], 3);
    }
}
