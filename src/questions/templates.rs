//! Natural-language templates for every question family.
//!
//! Templates use positional `{}` placeholders. The built-in set is returned
//! by [`TemplateSet::default`]; a YAML file with the same structure can
//! replace it through [`TemplateSet::load_file`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{GenerationError, TemplateError};

/// Fills the positional `{}` placeholders of `template` in order.
///
/// # Errors
///
/// [`GenerationError::TemplateArity`] if the number of placeholders differs
/// from the number of arguments.
pub fn fill(template: &str, args: &[&str]) -> Result<String, GenerationError> {
    let pieces: Vec<&str> = template.split("{}").collect();
    let expected = pieces.len() - 1;
    if expected != args.len() {
        return Err(GenerationError::TemplateArity {
            template: template.to_string(),
            expected,
            actual: args.len(),
        });
    }

    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    for (i, piece) in pieces.iter().enumerate() {
        out.push_str(piece);
        if let Some(arg) = args.get(i) {
            out.push_str(arg);
        }
    }
    Ok(out)
}

/// Option phrasings of the counterfactual family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualChoices {
    /// `{object} {direction}`
    pub rotate: String,
    /// `{object} {direction}`
    #[serde(rename = "move")]
    pub move_: String,
    /// `{object}`
    pub not_rotate: String,
    /// `{object}`
    pub not_move: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualTemplates {
    /// `{target} {heavier|lighter}`
    pub question: Vec<String>,
    pub choice: CounterfactualChoices,
}

/// One direction question with its fixed option block.
///
/// `labels` are rendered as options A, B and C. For rotation they stand for
/// clockwise, anti-clockwise and stationary; for motion for down, up and
/// stationary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionTemplates {
    /// `{target} {heavier|lighter} {object}`
    pub forward: String,
    /// `{object} {target} {heavier|lighter}`
    pub reversed: String,
    pub labels: [String; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterfactual2Templates {
    pub rotate: DirectionTemplates,
    #[serde(rename = "move")]
    pub move_: DirectionTemplates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDrivenTemplates {
    /// `{object} {goal}`, e.g. goal `rotate clockwise`
    pub question: Vec<String>,
    /// `{Increase|Decrease} {target}`
    pub mass_choice: String,
}

/// Every template used by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSet {
    /// `{color} {shape} {comparator} {factor}{color} {shape}`
    pub mass: Vec<String>,
    pub tension: Vec<String>,
    /// `{shape}`
    pub shape: Vec<String>,
    /// `{color}`
    pub color: Vec<String>,
    /// `{color} {shape}`
    pub existence: Vec<String>,
    pub rope_counterfactual: CounterfactualTemplates,
    pub rope_counterfactual2: Counterfactual2Templates,
    pub rope_goaldriven: GoalDrivenTemplates,
}

impl Default for TemplateSet {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            mass: owned(&["Is the mass of the {} {} {} {}that of the {} {}?"]),
            tension: owned(&["Is the tension of the {} {} {} {}that of the {} {}?"]),
            shape: owned(&["How many {}s are there in the video?"]),
            color: owned(&["How many {} objects are there in the video?"]),
            existence: owned(&["Is there any {} {} in the video?"]),
            rope_counterfactual: CounterfactualTemplates {
                question: owned(&[
                    "If the {} were much {}, what would happen?",
                    "If the {} were much {}, which of the following would happen?",
                    "What would happen if the {} were much {}?",
                    "Which of the following would happen if the {} were much {}?",
                ]),
                choice: CounterfactualChoices {
                    rotate: "The {} would rotate {}".to_string(),
                    move_: "The {} would move {}".to_string(),
                    not_rotate: "The {} would not rotate".to_string(),
                    not_move: "The {} would not move".to_string(),
                },
            },
            rope_counterfactual2: Counterfactual2Templates {
                rotate: DirectionTemplates {
                    forward: "If the {} were much {}, which direction would the {} rotate?"
                        .to_string(),
                    reversed: "Which direction would the {} rotate if the {} were much {}?"
                        .to_string(),
                    labels: [
                        "Clockwise".to_string(),
                        "Anti-clockwise".to_string(),
                        "Stationary".to_string(),
                    ],
                },
                move_: DirectionTemplates {
                    forward: "If the {} were much {}, which direction would the {} move?"
                        .to_string(),
                    reversed: "Which direction would the {} move if the {} were much {}?"
                        .to_string(),
                    labels: ["Down".to_string(), "Up".to_string(), "Stationary".to_string()],
                },
            },
            rope_goaldriven: GoalDrivenTemplates {
                question: owned(&[
                    "If we want the {} to {}, what can we do?",
                    "What can we do to let the {} to {}?",
                ]),
                mass_choice: "{} the mass of the {}".to_string(),
            },
        }
    }
}

impl TemplateSet {
    /// Loads a template set from a YAML file and validates it.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(TemplateError::Io)?;
        let templates: TemplateSet =
            serde_yaml::from_str(&content).map_err(|e| TemplateError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        templates.validate()?;
        Ok(templates)
    }

    /// Every family needs at least one phrasing to pick from.
    pub fn validate(&self) -> Result<(), TemplateError> {
        let lists = [
            ("mass", &self.mass),
            ("tension", &self.tension),
            ("shape", &self.shape),
            ("color", &self.color),
            ("existence", &self.existence),
            ("rope_counterfactual", &self.rope_counterfactual.question),
            ("rope_goaldriven", &self.rope_goaldriven.question),
        ];
        for (family, phrasings) in lists {
            if phrasings.is_empty() {
                return Err(TemplateError::EmptyPhrasings {
                    family: family.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fill_in_order() {
        let out = fill("Is there any {} {} in the video?", &["yellow", "sphere"])
            .expect("fill should succeed");
        assert_eq!(out, "Is there any yellow sphere in the video?");
    }

    #[test]
    fn test_fill_factor_slot_has_no_space() {
        let template = &TemplateSet::default().mass[0];
        let out = fill(
            template,
            &["red", "cube", "less than", "", "blue", "cube"],
        )
        .expect("fill should succeed");
        assert_eq!(out, "Is the mass of the red cube less than that of the blue cube?");

        let out = fill(
            template,
            &["red", "cube", "greater than", "twice ", "blue", "cube"],
        )
        .expect("fill should succeed");
        assert_eq!(
            out,
            "Is the mass of the red cube greater than twice that of the blue cube?"
        );
    }

    #[test]
    fn test_fill_arity_mismatch() {
        let err = fill("How many {}s are there in the video?", &[]).expect_err("missing argument");
        assert!(matches!(
            err,
            GenerationError::TemplateArity {
                expected: 1,
                actual: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_default_set_is_valid() {
        TemplateSet::default()
            .validate()
            .expect("built-in templates should validate");
    }

    #[test]
    fn test_yaml_round_trip_through_file() {
        let yaml = serde_yaml::to_string(&TemplateSet::default()).expect("serialization should succeed");
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(yaml.as_bytes()).expect("write");

        let loaded = TemplateSet::load_file(file.path()).expect("load should succeed");
        assert_eq!(loaded, TemplateSet::default());
    }

    #[test]
    fn test_empty_phrasings_rejected() {
        let mut templates = TemplateSet::default();
        templates.color.clear();
        let yaml = serde_yaml::to_string(&templates).expect("serialization should succeed");
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(yaml.as_bytes()).expect("write");

        let err = TemplateSet::load_file(file.path()).expect_err("empty color list");
        assert!(matches!(err, TemplateError::EmptyPhrasings { family } if family == "color"));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(b"mass: [unterminated").expect("write");
        let err = TemplateSet::load_file(file.path()).expect_err("bad yaml");
        assert!(matches!(err, TemplateError::ParseError { .. }));
    }
}
