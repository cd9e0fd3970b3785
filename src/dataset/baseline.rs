//! Answer-prior baselines.
//!
//! Two blind baselines are fit on the train split: always answering the most
//! frequent train answer of the question type, and answering a uniformly
//! random train answer of the question type. Accuracy is reported per
//! question type, per category and per category and answer type.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::fmt;

use super::{Category, DatasetQuestion};
use crate::error::DatasetError;
use crate::questions::{AnswerType, QuestionFamily};

/// Answer statistics of the train split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerPriors {
    /// Most frequent answer per question type. Ties go to the
    /// lexicographically smallest answer.
    pub majority: BTreeMap<QuestionFamily, String>,
    /// Distinct answers per question type, sorted.
    pub answers: BTreeMap<QuestionFamily, Vec<String>>,
}

impl AnswerPriors {
    pub fn fit(train: &[DatasetQuestion]) -> Result<Self, DatasetError> {
        if train.is_empty() {
            return Err(DatasetError::EmptySplit("train".to_string()));
        }

        let mut counts: BTreeMap<QuestionFamily, BTreeMap<&str, usize>> = BTreeMap::new();
        for question in train {
            *counts
                .entry(question.qtype)
                .or_default()
                .entry(question.answer.as_str())
                .or_insert(0) += 1;
        }

        let mut majority = BTreeMap::new();
        let mut answers = BTreeMap::new();
        for (qtype, answer_counts) in counts {
            // BTreeMap iteration is sorted, so the first maximum is the smallest answer.
            let mut best: Option<(&str, usize)> = None;
            for (&answer, &count) in &answer_counts {
                if best.is_none_or(|(_, top)| count > top) {
                    best = Some((answer, count));
                }
            }
            if let Some((answer, _)) = best {
                majority.insert(qtype, answer.to_string());
            }
            answers.insert(
                qtype,
                answer_counts.keys().map(|answer| answer.to_string()).collect(),
            );
        }

        Ok(Self { majority, answers })
    }
}

/// Hit counts of both baselines over a group of questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accuracy {
    pub total: usize,
    pub majority_correct: usize,
    pub random_correct: usize,
}

impl Accuracy {
    fn record(&mut self, majority_hit: bool, random_hit: bool) {
        self.total += 1;
        self.majority_correct += usize::from(majority_hit);
        self.random_correct += usize::from(random_hit);
    }

    pub fn majority(&self) -> f64 {
        ratio(self.majority_correct, self.total)
    }

    pub fn random(&self) -> f64 {
        ratio(self.random_correct, self.total)
    }
}

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Baseline accuracies of one evaluated split.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineReport {
    pub split: String,
    pub per_type: BTreeMap<QuestionFamily, Accuracy>,
    pub per_category: BTreeMap<Category, Accuracy>,
    pub per_category_answer_type: BTreeMap<(Category, AnswerType), Accuracy>,
}

impl BaselineReport {
    /// Scores both baselines on `questions`.
    ///
    /// Question types never seen in train count as misses for both.
    pub fn evaluate(
        split: &str,
        questions: &[DatasetQuestion],
        priors: &AnswerPriors,
        rng: &mut ChaCha8Rng,
    ) -> Result<Self, DatasetError> {
        if questions.is_empty() {
            return Err(DatasetError::EmptySplit(split.to_string()));
        }

        let mut report = Self {
            split: split.to_string(),
            per_type: BTreeMap::new(),
            per_category: BTreeMap::new(),
            per_category_answer_type: BTreeMap::new(),
        };

        for question in questions {
            let majority_hit = priors
                .majority
                .get(&question.qtype)
                .is_some_and(|answer| *answer == question.answer);
            let random_hit = priors
                .answers
                .get(&question.qtype)
                .filter(|answers| !answers.is_empty())
                .is_some_and(|answers| answers[rng.random_range(0..answers.len())] == question.answer);

            let category = question.category();
            report
                .per_type
                .entry(question.qtype)
                .or_default()
                .record(majority_hit, random_hit);
            report
                .per_category
                .entry(category)
                .or_default()
                .record(majority_hit, random_hit);
            report
                .per_category_answer_type
                .entry((category, question.answer_type))
                .or_default()
                .record(majority_hit, random_hit);
        }

        Ok(report)
    }
}

impl fmt::Display for BaselineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Split: {}", self.split)?;
        writeln!(f, "{:<24} {:>6} {:>10} {:>10}", "type", "num", "frequent", "random")?;
        for (qtype, acc) in &self.per_type {
            writeln!(
                f,
                "{:<24} {:>6} {:>10.4} {:>10.4}",
                qtype.as_str(),
                acc.total,
                acc.majority(),
                acc.random()
            )?;
        }
        writeln!(f)?;
        for (category, acc) in &self.per_category {
            writeln!(
                f,
                "{:<24} {:>6} {:>10.4} {:>10.4}",
                category.as_str(),
                acc.total,
                acc.majority(),
                acc.random()
            )?;
        }
        writeln!(f)?;
        for ((category, answer_type), acc) in &self.per_category_answer_type {
            let label = format!("{}/{:?}", category, answer_type);
            writeln!(
                f,
                "{:<24} {:>6} {:>10.4} {:>10.4}",
                label,
                acc.total,
                acc.majority(),
                acc.random()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::QuestionItem;

    fn question(family: QuestionFamily, answer: &str) -> DatasetQuestion {
        let item = QuestionItem {
            question: "q".to_string(),
            answer: answer.to_string(),
            question_family: family,
            answer_type: family.answer_type(),
            positive: vec![answer.to_string()],
            negative: Vec::new(),
            program: None,
        };
        DatasetQuestion::from_item(item, family, "0")
    }

    fn train() -> Vec<DatasetQuestion> {
        vec![
            question(QuestionFamily::Mass, "yes"),
            question(QuestionFamily::Mass, "yes"),
            question(QuestionFamily::Mass, "no"),
            question(QuestionFamily::Shape, "2"),
            question(QuestionFamily::Shape, "1"),
            question(QuestionFamily::RopeCounterfactual, "A"),
        ]
    }

    #[test]
    fn test_fit_majority_and_answers() {
        let priors = AnswerPriors::fit(&train()).expect("fit should succeed");
        assert_eq!(priors.majority[&QuestionFamily::Mass], "yes");
        // Tie between "1" and "2" goes to the smaller answer.
        assert_eq!(priors.majority[&QuestionFamily::Shape], "1");
        assert_eq!(priors.answers[&QuestionFamily::Mass], vec!["no", "yes"]);
    }

    #[test]
    fn test_fit_empty_train_fails() {
        assert!(matches!(AnswerPriors::fit(&[]), Err(DatasetError::EmptySplit(_))));
    }

    #[test]
    fn test_evaluate_majority() {
        let priors = AnswerPriors::fit(&train()).expect("fit should succeed");
        let val = vec![
            question(QuestionFamily::Mass, "yes"),
            question(QuestionFamily::Mass, "no"),
            question(QuestionFamily::RopeCounterfactual, "A"),
            question(QuestionFamily::RopeGoaldriven, "B"),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let report = BaselineReport::evaluate("val", &val, &priors, &mut rng).expect("evaluate should succeed");

        let mass = report.per_type[&QuestionFamily::Mass];
        assert_eq!(mass.total, 2);
        assert_eq!(mass.majority_correct, 1);
        assert!((mass.majority() - 0.5).abs() < 1e-9);

        let counter = report.per_category[&Category::Counterfactual];
        assert_eq!(counter.majority_correct, 1);
        // Single train answer, so the random baseline always hits.
        assert_eq!(counter.random_correct, 1);

        let goal = report.per_type[&QuestionFamily::RopeGoaldriven];
        assert_eq!(goal.majority_correct, 0);
        assert_eq!(goal.random_correct, 0);

        let factual_open = report.per_category_answer_type[&(Category::Factual, AnswerType::OpenEnded)];
        assert_eq!(factual_open.total, 2);
        assert!(report.to_string().contains("Split: val"));
    }

    #[test]
    fn test_random_baseline_rate() {
        let mut train = Vec::new();
        for answer in ["0", "1", "2", "3"] {
            train.push(question(QuestionFamily::Color, answer));
        }
        let priors = AnswerPriors::fit(&train).expect("fit should succeed");
        let test: Vec<_> = (0..4000).map(|_| question(QuestionFamily::Color, "2")).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let report = BaselineReport::evaluate("test", &test, &priors, &mut rng).expect("evaluate should succeed");
        let rate = report.per_type[&QuestionFamily::Color].random();
        assert!((0.22..0.28).contains(&rate), "rate {rate}");
    }

    #[test]
    fn test_evaluate_empty_split_fails() {
        let priors = AnswerPriors::fit(&train()).expect("fit should succeed");
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            BaselineReport::evaluate("val", &[], &priors, &mut rng),
            Err(DatasetError::EmptySplit(split)) if split == "val"
        ));
    }
}
