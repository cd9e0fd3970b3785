//! Multiple-choice question bodies built from true and false candidate statements.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashSet};

use crate::error::GenerationError;
use crate::questions::types::{option_letter, ChoiceProgram, Feature, Program, RawQuestion};

/// Smallest and largest number of options drawn after the first true one.
const EXTRA_OPTIONS_MIN: usize = 2;
const EXTRA_OPTIONS_MAX: usize = 4;

/// A statement that can be offered as an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub feature: Feature,
}

impl Candidate {
    pub fn new(text: impl Into<String>, feature: Feature) -> Self {
        Self {
            text: text.into(),
            feature,
        }
    }
}

/// One option of a built question, with its correctness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub candidate: Candidate,
    pub correct: bool,
}

/// Ordered options of one question. Letters are assigned only when rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSet {
    options: Vec<ChoiceOption>,
}

impl ChoiceSet {
    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Renders `title` followed by `A. ...`, `B. ...` option lines.
    ///
    /// The answer is the space-joined list of letters of the correct
    /// options, in letter order; `premise` becomes the question feature of
    /// the attached program.
    ///
    /// # Errors
    ///
    /// [`GenerationError::DuplicateOption`] if two options share their text.
    pub fn render(&self, title: &str, premise: Feature) -> Result<RawQuestion, GenerationError> {
        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.candidate.text.as_str()) {
                return Err(GenerationError::DuplicateOption {
                    question: title.to_string(),
                    option: option.candidate.text.clone(),
                });
            }
        }

        let mut question = title.to_string();
        let mut answer = Vec::new();
        let mut choices = BTreeMap::new();
        for (i, option) in self.options.iter().enumerate() {
            let letter = option_letter(i);
            question.push('\n');
            question.push_str(&format!("{letter}. {}", option.candidate.text));
            if option.correct {
                answer.push(letter.clone());
            }
            choices.insert(letter, option.candidate.feature.clone());
        }

        Ok(RawQuestion {
            question,
            answer: answer.join(" "),
            program: Some(Program::Choice(ChoiceProgram {
                question: premise,
                choices,
            })),
        })
    }
}

/// True and false candidates for one question premise.
#[derive(Debug, Clone, Default)]
pub struct CandidatePools {
    truths: Vec<Candidate>,
    falses: Vec<Candidate>,
}

impl CandidatePools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_true(&mut self, candidate: Candidate) {
        self.truths.push(candidate);
    }

    pub fn push_false(&mut self, candidate: Candidate) {
        self.falses.push(candidate);
    }

    pub fn true_count(&self) -> usize {
        self.truths.len()
    }

    pub fn false_count(&self) -> usize {
        self.falses.len()
    }

    /// Whether a question with at least one true and one false option can
    /// still be drawn.
    pub fn is_answerable(&self) -> bool {
        !self.truths.is_empty() && !self.falses.is_empty()
    }

    /// Shuffles both pools and truncates the larger one to the size of the
    /// smaller, so repeated draws do not favour either kind.
    pub fn balance(&mut self, rng: &mut ChaCha8Rng) {
        self.truths.shuffle(rng);
        self.falses.shuffle(rng);
        let n = self.truths.len().min(self.falses.len());
        self.truths.truncate(n);
        self.falses.truncate(n);
    }

    /// Draws questions until the pools are exhausted.
    ///
    /// A lone true candidate is padded with two false ones. Otherwise the
    /// pools are balanced first and each question takes one true option
    /// plus two to four more; the partial question left when a pool runs
    /// dry is discarded.
    pub fn drain(mut self, rng: &mut ChaCha8Rng) -> Vec<ChoiceSet> {
        if !self.is_answerable() {
            return Vec::new();
        }
        if self.truths.len() == 1 {
            return self.pad_single_truth(rng).into_iter().collect();
        }

        self.balance(rng);
        let mut sets = Vec::new();
        while let Some(set) = self.next_question(rng, false) {
            sets.push(set);
        }
        sets
    }

    /// Builds a single question, drawing at most as many options as remain.
    pub fn build_one(mut self, rng: &mut ChaCha8Rng) -> Option<ChoiceSet> {
        if !self.is_answerable() {
            return None;
        }
        self.truths.shuffle(rng);
        self.falses.shuffle(rng);
        if self.truths.len() == 1 {
            return self.pad_single_truth(rng);
        }
        self.next_question(rng, true)
    }

    fn pad_single_truth(&mut self, rng: &mut ChaCha8Rng) -> Option<ChoiceSet> {
        if self.falses.len() < 2 {
            return None;
        }
        let truth = self.truths.pop()?;
        self.falses.shuffle(rng);
        let mut options = vec![ChoiceOption {
            candidate: truth,
            correct: true,
        }];
        for _ in 0..2 {
            options.push(ChoiceOption {
                candidate: self.falses.pop()?,
                correct: false,
            });
        }
        options.shuffle(rng);
        Some(ChoiceSet { options })
    }

    /// One true option, then `2..=4` more drawn with probability of a false
    /// option equal to the remaining false share. The last draw is forced to
    /// be false if none was drawn yet. Returns `None` once a needed pool is
    /// empty.
    fn next_question(&mut self, rng: &mut ChaCha8Rng, cap: bool) -> Option<ChoiceSet> {
        let truth = self.truths.pop()?;
        let mut options = vec![ChoiceOption {
            candidate: truth,
            correct: true,
        }];

        let mut extra = rng.random_range(EXTRA_OPTIONS_MIN..=EXTRA_OPTIONS_MAX);
        if cap {
            extra = extra.min(self.truths.len() + self.falses.len());
        }

        let mut has_false = false;
        for i in 0..extra {
            let remaining = self.truths.len() + self.falses.len();
            if remaining == 0 {
                return None;
            }
            let p_false = self.falses.len() as f64 / remaining as f64;
            let force_false = !has_false && i + 1 == extra;
            let take_false = force_false || rng.random::<f64>() < p_false;

            let option = if take_false {
                has_false = true;
                ChoiceOption {
                    candidate: self.falses.pop()?,
                    correct: false,
                }
            } else {
                ChoiceOption {
                    candidate: self.truths.pop()?,
                    correct: true,
                }
            };
            options.push(option);
        }

        if !has_false {
            return None;
        }
        options.shuffle(rng);
        Some(ChoiceSet { options })
    }
}
