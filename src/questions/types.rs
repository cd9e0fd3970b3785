//! Output types of the question engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Question family tag, used as the key of a scene's question dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFamily {
    Mass,
    Tension,
    Shape,
    Color,
    Existence,
    RopeCounterfactual,
    RopeCounterfactual2,
    RopeGoaldriven,
}

impl QuestionFamily {
    /// Every family, in generation order.
    pub const ALL: [QuestionFamily; 8] = [
        Self::Mass,
        Self::Tension,
        Self::Shape,
        Self::Color,
        Self::Existence,
        Self::RopeCounterfactual,
        Self::RopeCounterfactual2,
        Self::RopeGoaldriven,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mass => "mass",
            Self::Tension => "tension",
            Self::Shape => "shape",
            Self::Color => "color",
            Self::Existence => "existence",
            Self::RopeCounterfactual => "rope_counterfactual",
            Self::RopeCounterfactual2 => "rope_counterfactual2",
            Self::RopeGoaldriven => "rope_goaldriven",
        }
    }

    pub fn answer_type(self) -> AnswerType {
        match self {
            Self::Mass | Self::Tension | Self::Shape | Self::Color | Self::Existence => {
                AnswerType::OpenEnded
            }
            Self::RopeCounterfactual | Self::RopeCounterfactual2 | Self::RopeGoaldriven => {
                AnswerType::MultipleChoice
            }
        }
    }

    pub fn is_choice_based(self) -> bool {
        self.answer_type() != AnswerType::OpenEnded
    }

    /// Families whose options are re-ordered after rendering. The other
    /// choice families only have their option formatting normalized.
    pub fn shuffles_options(self) -> bool {
        matches!(self, Self::RopeCounterfactual2)
    }
}

impl fmt::Display for QuestionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|family| family.as_str() == s)
            .ok_or_else(|| format!("unknown question family '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerType {
    OpenEnded,
    SingleChoice,
    MultipleChoice,
}

/// Physical quantity a feature talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    Mass,
    Rotation,
    Motion,
}

/// Machine-checkable statement: `target`'s `aspect` is/becomes `value`.
///
/// For goal-driven options the aspect is always [`Aspect::Mass`] and the
/// value is the intervention (`increase`/`decrease`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feature {
    pub target: String,
    pub aspect: Aspect,
    pub value: String,
}

impl Feature {
    pub fn new(target: impl Into<String>, aspect: Aspect, value: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            aspect,
            value: value.into(),
        }
    }
}

/// Ground truth of a choice question: the question's premise plus one
/// feature per option letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceProgram {
    pub question: Feature,
    pub choices: BTreeMap<String, Feature>,
}

/// Structured metadata attached to a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Program {
    /// Template arguments of an open-ended question.
    Factual(Vec<String>),
    Choice(ChoiceProgram),
}

/// A generated question before option shuffling and item assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuestion {
    pub question: String,
    pub answer: String,
    pub program: Option<Program>,
}

/// Externally visible question record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub question: String,
    pub answer: String,
    pub question_family: QuestionFamily,
    pub answer_type: AnswerType,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<Program>,
}

/// Converts a zero-based option index to its letter.
pub fn option_letter(index: usize) -> String {
    char::from(b'A' + index as u8).to_string()
}

/// Converts an option letter back to its index.
pub fn letter_index(letter: &str) -> Option<usize> {
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some((c as u8 - b'A') as usize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_round_trips_through_str() {
        for family in QuestionFamily::ALL {
            let parsed: QuestionFamily = family.as_str().parse().expect("known family");
            assert_eq!(parsed, family);
        }
        assert!("pressure".parse::<QuestionFamily>().is_err());
    }

    #[test]
    fn test_family_policies() {
        assert_eq!(QuestionFamily::Mass.answer_type(), AnswerType::OpenEnded);
        assert!(QuestionFamily::RopeGoaldriven.is_choice_based());
        assert!(QuestionFamily::RopeCounterfactual2.shuffles_options());
        assert!(!QuestionFamily::RopeCounterfactual.shuffles_options());
    }

    #[test]
    fn test_feature_serializes_as_triple() {
        let feature = Feature::new("red cube", Aspect::Rotation, "clockwise");
        let value = serde_json::to_value(&feature).expect("serialize");
        assert_eq!(value, serde_json::json!({"target": "red cube", "aspect": "rotation", "value": "clockwise"}));
    }

    #[test]
    fn test_program_untagged_factual() {
        let program = Program::Factual(vec!["red".to_string()]);
        let value = serde_json::to_value(&program).expect("serialize");
        assert_eq!(value, serde_json::json!(["red"]));
    }

    #[test]
    fn test_letters() {
        assert_eq!(option_letter(0), "A");
        assert_eq!(option_letter(4), "E");
        assert_eq!(letter_index("C"), Some(2));
        assert_eq!(letter_index("c"), None);
        assert_eq!(letter_index("AB"), None);
    }
}
