//! Counterfactual scenarios: "if object X's mass changed, how would Y respond".

use serde::{Deserialize, Serialize};

use super::annotation::RawCounterfactual;
use crate::error::SceneError;

/// Mode tag of the only scenario kind the question engine understands.
pub const CHANGE_ONE_OBJECT_MASS: &str = "COUNTERFACTUAL_change_one_object_mass";

/// Simulated response of one object: -1, 0 or +1.
///
/// For rotation +1 is clockwise, for motion +1 is upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    Negative,
    Neutral,
    Positive,
}

impl Outcome {
    /// Parses a raw annotation value, rejecting anything outside {-1, 0, 1}.
    pub fn from_value(value: f64) -> Option<Self> {
        if value == -1.0 {
            Some(Self::Negative)
        } else if value == 0.0 {
            Some(Self::Neutral)
        } else if value == 1.0 {
            Some(Self::Positive)
        } else {
            None
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Negative => Self::Positive,
            Self::Neutral => Self::Neutral,
            Self::Positive => Self::Negative,
        }
    }
}

/// Direction of a counterfactual mass change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MassChange {
    Heavier,
    Lighter,
}

impl MassChange {
    /// Classifies a before/after pair after rounding both to two decimals.
    /// An unchanged mass counts as heavier.
    pub fn between(before: f64, after: f64) -> Self {
        let round2 = |m: f64| (m * 100.0).round() / 100.0;
        if round2(before) > round2(after) {
            Self::Lighter
        } else {
            Self::Heavier
        }
    }

    /// "heavier" / "lighter"
    pub fn adjective(self) -> &'static str {
        match self {
            Self::Heavier => "heavier",
            Self::Lighter => "lighter",
        }
    }

    /// "increase" / "decrease"
    pub fn verb(self) -> &'static str {
        match self {
            Self::Heavier => "increase",
            Self::Lighter => "decrease",
        }
    }

    /// "Increase" / "Decrease", for sentence-initial use.
    pub fn imperative(self) -> &'static str {
        match self {
            Self::Heavier => "Increase",
            Self::Lighter => "Decrease",
        }
    }
}

/// Kind of intervention a scenario describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioMode {
    ChangeObjectMass {
        /// Raw simulator name of the object whose mass changes.
        target: String,
        change: MassChange,
    },
    /// Any other simulator mode; carried along but never turned into questions.
    Unsupported(String),
}

/// One parsed counterfactual scenario half. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterfactualRecord {
    pub scenario_id: String,
    pub mode: ScenarioMode,
    /// Rotation response per raw object name, in file order.
    pub rotation: Vec<(String, Outcome)>,
    /// Motion response per raw object name, in file order.
    pub motion: Vec<(String, Outcome)>,
}

impl CounterfactualRecord {
    /// Builds a typed record from its raw annotation form.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MalformedOutcome`] if any rotation or motion value
    /// lies outside {-1, 0, 1}.
    pub fn from_raw(scenario_id: impl Into<String>, raw: RawCounterfactual) -> Result<Self, SceneError> {
        let scenario_id = scenario_id.into();

        let mode = match (raw.mode.as_deref(), raw.target_obj_name, raw.target_obj_mass_before_after) {
            (Some(CHANGE_ONE_OBJECT_MASS), Some(target), Some(masses)) => ScenarioMode::ChangeObjectMass {
                target,
                change: MassChange::between(masses.item1, masses.item2),
            },
            (Some(CHANGE_ONE_OBJECT_MASS), _, _) => {
                tracing::warn!(scenario = %scenario_id, "Mass scenario without target or masses");
                ScenarioMode::Unsupported(CHANGE_ONE_OBJECT_MASS.to_string())
            }
            (mode, _, _) => ScenarioMode::Unsupported(mode.unwrap_or_default().to_string()),
        };

        let rotation = parse_outcomes(&scenario_id, raw.result_rotation)?;
        let motion = parse_outcomes(&scenario_id, raw.result_motion)?;

        Ok(Self {
            scenario_id,
            mode,
            rotation,
            motion,
        })
    }

    /// Target and direction of the mass change, if this is a mass scenario.
    pub fn mass_change(&self) -> Option<(&str, MassChange)> {
        match &self.mode {
            ScenarioMode::ChangeObjectMass { target, change } => Some((target.as_str(), *change)),
            ScenarioMode::Unsupported(_) => None,
        }
    }
}

fn parse_outcomes(
    scenario_id: &str,
    raw: impl IntoIterator<Item = (String, f64)>,
) -> Result<Vec<(String, Outcome)>, SceneError> {
    raw.into_iter()
        .map(|(object, value)| match Outcome::from_value(value) {
            Some(outcome) => Ok((object, outcome)),
            None => Err(SceneError::MalformedOutcome {
                scenario: scenario_id.to_string(),
                object,
                value,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::annotation::MassPair;
    use crate::scene::OrderedMap;

    fn raw_mass_scenario(before: f64, after: f64, rotation: &[(&str, f64)]) -> RawCounterfactual {
        RawCounterfactual {
            mode: Some(CHANGE_ONE_OBJECT_MASS.to_string()),
            target_obj_name: Some("Red Cube(Clone)".to_string()),
            target_obj_mass_before_after: Some(MassPair {
                item1: before,
                item2: after,
            }),
            result_rotation: rotation
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<OrderedMap<_>>(),
            result_motion: OrderedMap::new(),
        }
    }

    #[test]
    fn test_from_raw_mass_scenario() {
        let raw = raw_mass_scenario(2.0, 4.0, &[("Blue Solid Static Pulley", 1.0)]);
        let record = CounterfactualRecord::from_raw("3_0", raw).expect("valid record");

        let (target, change) = record.mass_change().expect("mass scenario");
        assert_eq!(target, "Red Cube(Clone)");
        assert_eq!(change, MassChange::Heavier);
        assert_eq!(record.rotation, vec![("Blue Solid Static Pulley".to_string(), Outcome::Positive)]);
    }

    #[test]
    fn test_from_raw_keeps_file_order() {
        let raw: RawCounterfactual = serde_json::from_str(
            r#"{
                "mode": "COUNTERFACTUAL_change_one_object_mass",
                "TargetObj_Name": "Red Cube(Clone)",
                "TargetObj_Mass_Before_After": {"Item1": 2.0, "Item2": 1.0},
                "ResultRotation": {"Yellow Solid Static Pulley": -1, "Blue Hollow Dynamic Pulley": 1},
                "ResultMotion": {"White Sphere": 0, "Green Cube": 1, "Brown Cube": -1}
            }"#,
        )
        .expect("raw scenario should parse");
        let record = CounterfactualRecord::from_raw("4_1", raw).expect("valid record");

        let rotated: Vec<&str> = record.rotation.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(rotated, vec!["Yellow Solid Static Pulley", "Blue Hollow Dynamic Pulley"]);
        let moved: Vec<(&str, Outcome)> = record.motion.iter().map(|(name, o)| (name.as_str(), *o)).collect();
        assert_eq!(
            moved,
            vec![
                ("White Sphere", Outcome::Neutral),
                ("Green Cube", Outcome::Positive),
                ("Brown Cube", Outcome::Negative),
            ]
        );
    }

    #[test]
    fn test_from_raw_rejects_malformed_outcome() {
        let raw = raw_mass_scenario(2.0, 1.0, &[("Blue Solid Static Pulley", 2.0)]);
        let err = CounterfactualRecord::from_raw("3_1", raw).expect_err("should reject 2");
        assert!(matches!(err, SceneError::MalformedOutcome { value, .. } if value == 2.0));
    }

    #[test]
    fn test_unsupported_mode_is_kept() {
        let raw = RawCounterfactual {
            mode: Some("COUNTERFACTUAL_pull_object_up_or_down".to_string()),
            ..RawCounterfactual::default()
        };
        let record = CounterfactualRecord::from_raw("7_0", raw).expect("valid record");
        assert!(record.mass_change().is_none());
    }

    #[test]
    fn test_mass_change_rounds_before_comparing() {
        assert_eq!(MassChange::between(2.001, 2.004), MassChange::Heavier);
        assert_eq!(MassChange::between(2.5, 2.0), MassChange::Lighter);
        assert_eq!(MassChange::Lighter.verb(), "decrease");
        assert_eq!(MassChange::Heavier.imperative(), "Increase");
    }
}
