//! Post-hoc option reordering for rendered multiple-choice questions.
//!
//! Every choice question goes through [`shuffle_options`]: families with a
//! shuffling policy get a fresh permutation, the others only have their
//! option lines normalized. In both cases the answer key is re-derived from
//! the option texts, so it stays consistent with whatever order is emitted.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use crate::error::GenerationError;
use crate::questions::types::{letter_index, option_letter, Program, RawQuestion};

/// Removes a leading `"X. "` letter prefix from an option line.
fn strip_letter(line: &str) -> String {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let re = PREFIX.get_or_init(|| Regex::new(r"^[A-Z]\. ").expect("Invalid regex for option prefix"));
    re.replace(line, "").into_owned()
}

/// A choice question after shuffling.
#[derive(Debug, Clone, PartialEq)]
pub struct ShuffledQuestion {
    pub question: String,
    /// Space-separated sorted letters of the correct options.
    pub answer: String,
    /// Option texts in emitted order, without letter prefixes.
    pub options: Vec<String>,
    pub program: Option<Program>,
}

impl ShuffledQuestion {
    /// Texts of the correct options.
    pub fn positive(&self) -> Vec<String> {
        self.answer
            .split_whitespace()
            .filter_map(letter_index)
            .filter_map(|i| self.options.get(i).cloned())
            .collect()
    }

    /// Texts of the incorrect options, in emitted order.
    pub fn negative(&self) -> Vec<String> {
        let positive: HashSet<String> = self.positive().into_iter().collect();
        self.options
            .iter()
            .filter(|option| !positive.contains(*option))
            .cloned()
            .collect()
    }
}

/// Reorders the options of `raw` (unless `skip`) and re-derives its answer.
///
/// # Errors
///
/// - [`GenerationError::MalformedAnswer`] if an answer letter does not name
///   an option.
/// - [`GenerationError::DuplicateOption`] if two options share their text.
pub fn shuffle_options(
    raw: RawQuestion,
    skip: bool,
    rng: &mut ChaCha8Rng,
) -> Result<ShuffledQuestion, GenerationError> {
    let mut lines = raw.question.split('\n');
    let title = lines.next().unwrap_or_default().to_string();
    let old_options: Vec<String> = lines.map(strip_letter).collect();

    let mut correct = HashSet::new();
    for letter in raw.answer.split_whitespace() {
        let option = letter_index(letter)
            .and_then(|i| old_options.get(i))
            .ok_or_else(|| GenerationError::MalformedAnswer {
                question: title.clone(),
                letter: letter.to_string(),
                options: old_options.len(),
            })?;
        correct.insert(option.clone());
    }

    // order[new] = old
    let mut order: Vec<usize> = (0..old_options.len()).collect();
    if !skip {
        order.shuffle(rng);
    }

    let options: Vec<String> = order.iter().map(|&old| old_options[old].clone()).collect();
    let mut seen = HashSet::new();
    for option in &options {
        if !seen.insert(option.as_str()) {
            return Err(GenerationError::DuplicateOption {
                question: title,
                option: option.clone(),
            });
        }
    }

    let program = match raw.program {
        Some(Program::Choice(mut program)) if !skip => {
            let mut remapped = BTreeMap::new();
            for (new, &old) in order.iter().enumerate() {
                if let Some(feature) = program.choices.remove(&option_letter(old)) {
                    remapped.insert(option_letter(new), feature);
                }
            }
            program.choices = remapped;
            Some(Program::Choice(program))
        }
        other => other,
    };

    let answer = options
        .iter()
        .enumerate()
        .filter(|(_, option)| correct.contains(*option))
        .map(|(i, _)| option_letter(i))
        .collect::<Vec<_>>()
        .join(" ");

    let mut question = title;
    for (i, option) in options.iter().enumerate() {
        question.push('\n');
        question.push_str(&option_letter(i));
        question.push_str(". ");
        question.push_str(option);
    }

    Ok(ShuffledQuestion {
        question,
        answer,
        options,
        program,
    })
}
