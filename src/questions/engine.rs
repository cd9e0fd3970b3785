//! Per-family question generators over one scene.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

use super::choices::{Candidate, CandidatePools};
use super::comparison::{ComparativeFactSampler, Comparison};
use super::naming::{NamingResolver, COLORS};
use super::templates::{fill, TemplateSet};
use super::types::{
    option_letter, Aspect, ChoiceProgram, Feature, Program, QuestionFamily, RawQuestion,
};
use crate::error::GenerationError;
use crate::scene::{normalize_name, MassChange, Outcome, PhysicalObject, SceneGraph};

/// Shapes counted by the shape family. Matching is by substring, so
/// `pulley` counts hollow and solid pulleys alike.
pub const COUNTED_SHAPES: [&str; 7] = [
    "cube",
    "sphere",
    "pulley",
    "solid pulley",
    "hollow pulley",
    "rope",
    "fixed point",
];

const STATIONARY: &str = "stationary";

/// Chance of offering "would not rotate/move" as a wrong option next to a
/// moving object's real direction.
const STILL_DISTRACTOR_PROB: f64 = 0.1;

/// Chance that a motionless object contributes "would not move" as a true
/// option. Rotation always contributes its "would not rotate".
const STILL_MOTION_TRUTH_PROB: f64 = 0.2;

/// Direction word for an outcome: +1 is clockwise or up.
fn direction_word(aspect: Aspect, outcome: Outcome) -> &'static str {
    match (aspect, outcome) {
        (_, Outcome::Neutral) => STATIONARY,
        (Aspect::Motion, Outcome::Positive) => "up",
        (Aspect::Motion, Outcome::Negative) => "down",
        (_, Outcome::Positive) => "clockwise",
        (_, Outcome::Negative) => "anti-clockwise",
    }
}

fn goal_verb(aspect: Aspect) -> &'static str {
    match aspect {
        Aspect::Motion => "move",
        _ => "rotate",
    }
}

/// Values behind the fixed A/B/C options of `rope_counterfactual2`.
fn fixed_choice_values(aspect: Aspect) -> [&'static str; 3] {
    match aspect {
        Aspect::Motion => ["down", "up", STATIONARY],
        _ => ["clockwise", "anti-clockwise", STATIONARY],
    }
}

fn phrasing<'t>(phrasings: &'t [String], rng: &mut ChaCha8Rng) -> &'t str {
    phrasings.choose(rng).map(String::as_str).unwrap_or_default()
}

fn fill_owned(template: &str, args: &[String]) -> Result<String, GenerationError> {
    let refs: Vec<&str> = args.iter().map(String::as_str).collect();
    fill(template, &refs)
}

fn factual(question: String, answer: impl Into<String>, args: Vec<String>) -> RawQuestion {
    RawQuestion {
        question,
        answer: answer.into(),
        program: Some(Program::Factual(args)),
    }
}

fn comparison_args(first: &PhysicalObject, second: &PhysicalObject, c: Comparison) -> Vec<String> {
    vec![
        first.color.to_lowercase(),
        first.shape.to_lowercase(),
        c.comparator.as_str().to_string(),
        c.factor.as_str().to_string(),
        second.color.to_lowercase(),
        second.shape.to_lowercase(),
    ]
}

/// An intervention that was simulated: changing `target`'s mass.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Intervention {
    change: MassChange,
    target: String,
}

/// Interventions grouped by the outcome they produced on one object.
#[derive(Debug, Default)]
struct OutcomeBuckets {
    negative: Vec<Intervention>,
    neutral: Vec<Intervention>,
    positive: Vec<Intervention>,
}

impl OutcomeBuckets {
    fn get(&self, outcome: Outcome) -> &[Intervention] {
        match outcome {
            Outcome::Negative => &self.negative,
            Outcome::Neutral => &self.neutral,
            Outcome::Positive => &self.positive,
        }
    }

    fn push(&mut self, outcome: Outcome, intervention: Intervention) {
        let bucket = match outcome {
            Outcome::Negative => &mut self.negative,
            Outcome::Neutral => &mut self.neutral,
            Outcome::Positive => &mut self.positive,
        };
        if !bucket.contains(&intervention) {
            bucket.push(intervention);
        }
    }
}

/// Generates raw questions for one scene.
pub struct QuestionEngine<'a> {
    scene: &'a SceneGraph,
    templates: &'a TemplateSet,
    resolver: NamingResolver<'a>,
    sampler: ComparativeFactSampler<'a>,
}

impl<'a> QuestionEngine<'a> {
    pub fn new(scene: &'a SceneGraph, templates: &'a TemplateSet) -> Self {
        Self {
            scene,
            templates,
            resolver: NamingResolver::new(scene),
            sampler: ComparativeFactSampler::new(scene),
        }
    }

    /// Generates every question of `family`, in scene order.
    ///
    /// Choice questions come back rendered with lettered options and are
    /// expected to go through the option shuffler afterwards.
    pub fn generate(
        &self,
        family: QuestionFamily,
        rng: &mut ChaCha8Rng,
    ) -> Result<Vec<RawQuestion>, GenerationError> {
        match family {
            QuestionFamily::Mass => self.generate_mass(rng),
            QuestionFamily::Tension => self.generate_tension(rng),
            QuestionFamily::Shape => self.generate_shape(rng),
            QuestionFamily::Color => self.generate_color(rng),
            QuestionFamily::Existence => self.generate_existence(rng),
            QuestionFamily::RopeCounterfactual => self.generate_counterfactual(rng),
            QuestionFamily::RopeCounterfactual2 => self.generate_direction(rng),
            QuestionFamily::RopeGoaldriven => self.generate_goal_driven(rng),
        }
    }

    fn generate_color(&self, rng: &mut ChaCha8Rng) -> Result<Vec<RawQuestion>, GenerationError> {
        let mut out = Vec::with_capacity(COLORS.len());
        for color in COLORS {
            let question = fill(phrasing(&self.templates.color, rng), &[color])?;
            let count = self
                .scene
                .objects()
                .filter(|(_, obj)| obj.color.to_lowercase() == color)
                .count();
            out.push(factual(question, count.to_string(), vec![color.to_string()]));
        }
        Ok(out)
    }

    fn generate_shape(&self, rng: &mut ChaCha8Rng) -> Result<Vec<RawQuestion>, GenerationError> {
        let mut out = Vec::with_capacity(COUNTED_SHAPES.len());
        for shape in COUNTED_SHAPES {
            let question = fill(phrasing(&self.templates.shape, rng), &[shape])?;
            let count = self
                .scene
                .objects()
                .filter(|(_, obj)| obj.shape.to_lowercase().contains(shape))
                .count();
            out.push(factual(question, count.to_string(), vec![shape.to_string()]));
        }
        Ok(out)
    }

    /// One yes/no question per color and exact shape; the bare `pulley` is
    /// left out since its hollow and solid forms are asked about.
    fn generate_existence(&self, rng: &mut ChaCha8Rng) -> Result<Vec<RawQuestion>, GenerationError> {
        let mut out = Vec::new();
        for color in COLORS {
            for shape in COUNTED_SHAPES.into_iter().filter(|shape| *shape != "pulley") {
                let question = fill(phrasing(&self.templates.existence, rng), &[color, shape])?;
                let exists = self.scene.objects().any(|(_, obj)| {
                    obj.color.to_lowercase().contains(color) && obj.shape.to_lowercase().contains(shape)
                });
                let answer = if exists { "yes" } else { "no" };
                out.push(factual(question, answer, vec![color.to_string(), shape.to_string()]));
            }
        }
        Ok(out)
    }

    fn generate_mass(&self, rng: &mut ChaCha8Rng) -> Result<Vec<RawQuestion>, GenerationError> {
        let mut out = Vec::new();
        for (a, first) in self.scene.objects() {
            for (b, second) in self.scene.objects() {
                if a == b {
                    continue;
                }
                let Some(comparison) = self.sampler.sample(a, b, rng) else {
                    continue;
                };
                let args = comparison_args(first, second, comparison);
                let question = fill_owned(phrasing(&self.templates.mass, rng), &args)?;
                out.push(factual(question, comparison.truth.as_str(), args));
            }
        }
        Ok(out)
    }

    /// Mass comparisons restated on the ropes holding each object.
    fn generate_tension(&self, rng: &mut ChaCha8Rng) -> Result<Vec<RawQuestion>, GenerationError> {
        let mut out = Vec::new();
        for (a, first) in self.scene.objects() {
            for (b, second) in self.scene.objects() {
                if a == b {
                    continue;
                }
                let Some(comparison) = self.sampler.sample(a, b, rng) else {
                    continue;
                };

                let (Some(rope_a), Some(rope_b)) =
                    (self.scene.rope_for(&first.name), self.scene.rope_for(&second.name))
                else {
                    tracing::debug!(first = %first.name, second = %second.name, "No rope mapping, skipping tension pair");
                    continue;
                };
                if rope_a == rope_b {
                    continue;
                }
                let (Some(rope_a), Some(rope_b)) = (self.scene.by_name(rope_a), self.scene.by_name(rope_b))
                else {
                    tracing::debug!(rope_a, rope_b, "Mapped rope missing from scene, skipping tension pair");
                    continue;
                };

                let args = comparison_args(rope_a, rope_b, comparison);
                let question = fill_owned(phrasing(&self.templates.tension, rng), &args)?;
                out.push(factual(question, comparison.truth.as_str(), args));
            }
        }
        Ok(out)
    }

    /// Resolved name of an object whose response is recorded in a scenario,
    /// or `None` for shafts and fixed points.
    fn responding_object(&self, raw: &str) -> Result<Option<String>, GenerationError> {
        if raw.contains("Shaft") {
            return Ok(None);
        }
        let name = self.resolver.resolve(&normalize_name(raw))?;
        if name.contains("fixed") {
            return Ok(None);
        }
        Ok(Some(name))
    }

    fn scenario_target(&self, raw: &str) -> Result<String, GenerationError> {
        self.resolver.resolve(&normalize_name(raw))
    }

    fn generate_counterfactual(&self, rng: &mut ChaCha8Rng) -> Result<Vec<RawQuestion>, GenerationError> {
        let templates = &self.templates.rope_counterfactual;
        let mut out = Vec::new();

        for record in self.scene.counterfactuals() {
            let Some((target, change)) = record.mass_change() else {
                continue;
            };
            let target = self.scenario_target(target)?;
            let title = fill(phrasing(&templates.question, rng), &[target.as_str(), change.adjective()])?;
            let premise = Feature::new(&target, Aspect::Mass, change.verb());

            let mut pools = CandidatePools::new();
            for (aspect, outcomes) in [(Aspect::Rotation, &record.rotation), (Aspect::Motion, &record.motion)] {
                for (raw, outcome) in outcomes {
                    let Some(name) = self.responding_object(raw)? else {
                        continue;
                    };
                    self.add_outcome_candidates(aspect, &name, *outcome, &mut pools, rng)?;
                }
            }

            if !pools.is_answerable() {
                tracing::debug!(scenario = %record.scenario_id, "No true/false option pair, skipping scenario");
                continue;
            }
            for set in pools.drain(rng) {
                out.push(set.render(&title, premise.clone())?);
            }
        }
        Ok(out)
    }

    /// Adds the true and false statements describing `outcome` of `name`.
    fn add_outcome_candidates(
        &self,
        aspect: Aspect,
        name: &str,
        outcome: Outcome,
        pools: &mut CandidatePools,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), GenerationError> {
        let choice = &self.templates.rope_counterfactual.choice;
        let (moving_template, still_template) = match aspect {
            Aspect::Motion => (&choice.move_, &choice.not_move),
            _ => (&choice.rotate, &choice.not_rotate),
        };
        let moving = |direction: &str| -> Result<Candidate, GenerationError> {
            Ok(Candidate::new(
                fill(moving_template, &[name, direction])?,
                Feature::new(name, aspect, direction),
            ))
        };
        let still = || -> Result<Candidate, GenerationError> {
            Ok(Candidate::new(
                fill(still_template, &[name])?,
                Feature::new(name, aspect, STATIONARY),
            ))
        };

        match outcome {
            Outcome::Positive | Outcome::Negative => {
                pools.push_true(moving(direction_word(aspect, outcome))?);
                pools.push_false(moving(direction_word(aspect, outcome.opposite()))?);
                if rng.random::<f64>() < STILL_DISTRACTOR_PROB {
                    pools.push_false(still()?);
                }
            }
            Outcome::Neutral => {
                let wrong = if rng.random::<f64>() < 0.5 {
                    Outcome::Positive
                } else {
                    Outcome::Negative
                };
                pools.push_false(moving(direction_word(aspect, wrong))?);
                let still_is_true = match aspect {
                    Aspect::Motion => rng.random::<f64>() < STILL_MOTION_TRUTH_PROB,
                    _ => true,
                };
                if still_is_true {
                    pools.push_true(still()?);
                }
            }
        }
        Ok(())
    }

    /// One three-option direction question per responding object and aspect.
    fn generate_direction(&self, rng: &mut ChaCha8Rng) -> Result<Vec<RawQuestion>, GenerationError> {
        let templates = &self.templates.rope_counterfactual2;
        let mut out = Vec::new();

        for record in self.scene.counterfactuals() {
            let Some((target, change)) = record.mass_change() else {
                continue;
            };
            let target = self.scenario_target(target)?;
            let premise = Feature::new(&target, Aspect::Mass, change.verb());

            for (aspect, outcomes, phrasings) in [
                (Aspect::Rotation, &record.rotation, &templates.rotate),
                (Aspect::Motion, &record.motion, &templates.move_),
            ] {
                let reversed = rng.random_range(0..2) == 1;
                let values = fixed_choice_values(aspect);

                for (raw, outcome) in outcomes {
                    let Some(name) = self.responding_object(raw)? else {
                        continue;
                    };
                    let mut question = if reversed {
                        fill(&phrasings.reversed, &[name.as_str(), target.as_str(), change.adjective()])?
                    } else {
                        fill(&phrasings.forward, &[target.as_str(), change.adjective(), name.as_str()])?
                    };

                    let mut choices = BTreeMap::new();
                    for (i, (label, value)) in phrasings.labels.iter().zip(values).enumerate() {
                        let letter = option_letter(i);
                        question.push_str(&format!("\n{letter}. {label}"));
                        choices.insert(letter, Feature::new(&name, aspect, value));
                    }

                    let observed = direction_word(aspect, *outcome);
                    let answer = values
                        .iter()
                        .position(|value| *value == observed)
                        .map(option_letter)
                        .unwrap_or_default();

                    out.push(RawQuestion {
                        question,
                        answer,
                        program: Some(Program::Choice(ChoiceProgram {
                            question: premise.clone(),
                            choices,
                        })),
                    });
                }
            }
        }
        Ok(out)
    }

    /// Aggregates every mass scenario per responding object and asks which
    /// interventions produce a chosen direction.
    fn generate_goal_driven(&self, rng: &mut ChaCha8Rng) -> Result<Vec<RawQuestion>, GenerationError> {
        let mut rotation: BTreeMap<String, OutcomeBuckets> = BTreeMap::new();
        let mut motion: BTreeMap<String, OutcomeBuckets> = BTreeMap::new();

        for record in self.scene.counterfactuals() {
            let Some((target, change)) = record.mass_change() else {
                continue;
            };
            let target = self.scenario_target(target)?;
            for (buckets, outcomes) in [(&mut rotation, &record.rotation), (&mut motion, &record.motion)] {
                for (raw, outcome) in outcomes {
                    let key = normalize_name(raw);
                    if key.contains("shaft") || key.contains("fixed") {
                        continue;
                    }
                    buckets.entry(key).or_default().push(
                        *outcome,
                        Intervention {
                            change,
                            target: target.clone(),
                        },
                    );
                }
            }
        }

        let templates = &self.templates.rope_goaldriven;
        let mut out = Vec::new();
        for (aspect, buckets) in [(Aspect::Rotation, rotation), (Aspect::Motion, motion)] {
            for (key, bucket) in buckets {
                if bucket.get(Outcome::Positive).is_empty() && bucket.get(Outcome::Negative).is_empty() {
                    continue;
                }
                let mut goal = if rng.random_range(0..2) == 1 {
                    Outcome::Positive
                } else {
                    Outcome::Negative
                };
                if bucket.get(goal).is_empty() {
                    goal = goal.opposite();
                }

                let object = self.resolver.resolve(&key)?;
                let direction = direction_word(aspect, goal);
                let goal_phrase = format!("{} {direction}", goal_verb(aspect));
                let title = fill(phrasing(&templates.question, rng), &[object.as_str(), goal_phrase.as_str()])?;
                let premise = Feature::new(&object, aspect, direction);

                let mut pools = CandidatePools::new();
                for intervention in bucket.get(goal) {
                    pools.push_true(self.intervention_candidate(intervention)?);
                }
                for intervention in bucket
                    .get(goal.opposite())
                    .iter()
                    .chain(bucket.get(Outcome::Neutral))
                {
                    pools.push_false(self.intervention_candidate(intervention)?);
                }

                match pools.build_one(rng) {
                    Some(set) => out.push(set.render(&title, premise)?),
                    None => tracing::debug!(object = %object, aspect = ?aspect, "Not enough interventions for a goal question"),
                }
            }
        }
        Ok(out)
    }

    fn intervention_candidate(&self, intervention: &Intervention) -> Result<Candidate, GenerationError> {
        let text = fill(
            &self.templates.rope_goaldriven.mass_choice,
            &[intervention.change.imperative(), intervention.target.as_str()],
        )?;
        Ok(Candidate::new(
            text,
            Feature::new(&intervention.target, Aspect::Mass, intervention.change.verb()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::shuffle::shuffle_options;
    use crate::questions::types::letter_index;
    use crate::scene::{CounterfactualRecord, Dynamics, ObjectClass, ScenarioMode};
    use std::collections::HashSet;

    fn counting_scene() -> SceneGraph {
        let mut scene = SceneGraph::new();
        scene.add_object(PhysicalObject::block("Red", "Cube", 1.0), "red cube");
        scene.add_object(PhysicalObject::block("Blue", "Cube", 2.0), "blue cube");
        scene.add_object(PhysicalObject::block("Purple", "Cube", 3.0), "purple cube");
        scene.add_object(PhysicalObject::block("Yellow", "Sphere", 1.5), "yellow sphere");
        scene.add_object(PhysicalObject::rope("Black", 9.8), "black rope");
        scene
    }

    fn find<'q>(questions: &'q [RawQuestion], text: &str) -> &'q RawQuestion {
        questions
            .iter()
            .find(|q| q.question == text)
            .unwrap_or_else(|| panic!("question '{text}' not generated"))
    }

    fn record(
        id: &str,
        target: &str,
        change: MassChange,
        rotation: &[(&str, Outcome)],
        motion: &[(&str, Outcome)],
    ) -> CounterfactualRecord {
        let owned = |items: &[(&str, Outcome)]| {
            items
                .iter()
                .map(|(name, outcome)| (name.to_string(), *outcome))
                .collect::<Vec<_>>()
        };
        CounterfactualRecord {
            scenario_id: id.to_string(),
            mode: ScenarioMode::ChangeObjectMass {
                target: target.to_string(),
                change,
            },
            rotation: owned(rotation),
            motion: owned(motion),
        }
    }

    /// Two blocks over a static and a dynamic pulley, with mass scenarios
    /// for both blocks.
    fn counterfactual_scene() -> SceneGraph {
        use Outcome::*;

        let mut scene = SceneGraph::new();
        scene.add_object(PhysicalObject::block("Red", "Cube", 2.0), "red cube");
        scene.add_object(PhysicalObject::block("Blue", "Cube", 4.0), "blue cube");
        scene.add_object(
            PhysicalObject::new("Yellow", "Solid Pulley", ObjectClass::Pulley, Dynamics::Static),
            "yellow solid static pulley",
        );
        scene.add_object(
            PhysicalObject::new("Green", "Hollow Pulley", ObjectClass::Pulley, Dynamics::Dynamic),
            "green hollow dynamic pulley",
        );
        scene.add_object(
            PhysicalObject::new("Gray", "Fixed Point", ObjectClass::FixedPoint, Dynamics::Static),
            "gray fixed point",
        );

        let rotation_heavy = [
            ("Yellow Solid Static Pulley", Positive),
            ("Green Hollow Dynamic Pulley", Negative),
            ("Gray Fixed Point", Neutral),
            ("Shaft", Positive),
        ];
        let rotation_light = [
            ("Yellow Solid Static Pulley", Negative),
            ("Green Hollow Dynamic Pulley", Positive),
            ("Gray Fixed Point", Neutral),
        ];
        let motion_heavy = [
            ("Red Cube(Clone)", Negative),
            ("Blue Cube", Positive),
            ("Green Hollow Dynamic Pulley", Positive),
        ];
        let motion_light = [
            ("Red Cube(Clone)", Positive),
            ("Blue Cube", Negative),
            ("Green Hollow Dynamic Pulley", Neutral),
        ];

        scene.add_counterfactual(record("0_0", "Red Cube(Clone)", MassChange::Heavier, &rotation_heavy, &motion_heavy));
        scene.add_counterfactual(record("0_1", "Red Cube(Clone)", MassChange::Lighter, &rotation_light, &motion_light));
        scene.add_counterfactual(record("1_0", "Blue Cube", MassChange::Heavier, &rotation_light, &motion_light));
        scene.add_counterfactual(record("1_1", "Blue Cube", MassChange::Lighter, &rotation_heavy, &motion_heavy));
        scene
    }

    #[test]
    fn test_existence_answers() {
        let scene = counting_scene();
        let templates = TemplateSet::default();
        let engine = QuestionEngine::new(&scene, &templates);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let questions = engine
            .generate(QuestionFamily::Existence, &mut rng)
            .expect("existence should generate");
        assert_eq!(questions.len(), COLORS.len() * (COUNTED_SHAPES.len() - 1));
        assert_eq!(find(&questions, "Is there any yellow sphere in the video?").answer, "yes");
        assert_eq!(find(&questions, "Is there any green cube in the video?").answer, "no");
    }

    #[test]
    fn test_shape_counts() {
        let scene = counting_scene();
        let templates = TemplateSet::default();
        let engine = QuestionEngine::new(&scene, &templates);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let questions = engine
            .generate(QuestionFamily::Shape, &mut rng)
            .expect("shape should generate");
        assert_eq!(find(&questions, "How many cubes are there in the video?").answer, "3");
        assert_eq!(find(&questions, "How many ropes are there in the video?").answer, "1");
        assert_eq!(find(&questions, "How many pulleys are there in the video?").answer, "0");
        assert_eq!(
            find(&questions, "How many cubes are there in the video?").program,
            Some(Program::Factual(vec!["cube".to_string()]))
        );
    }

    #[test]
    fn test_color_counts() {
        let scene = counting_scene();
        let templates = TemplateSet::default();
        let engine = QuestionEngine::new(&scene, &templates);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let questions = engine
            .generate(QuestionFamily::Color, &mut rng)
            .expect("color should generate");
        assert_eq!(questions.len(), COLORS.len());
        assert_eq!(find(&questions, "How many red objects are there in the video?").answer, "1");
        assert_eq!(find(&questions, "How many white objects are there in the video?").answer, "0");
    }

    #[test]
    fn test_mass_questions_follow_relations() {
        let mut scene = counting_scene();
        let red = scene.id_of("red cube").expect("red");
        let blue = scene.id_of("blue cube").expect("blue");
        scene.add_relation(red, blue);

        let templates = TemplateSet::default();
        let engine = QuestionEngine::new(&scene, &templates);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let questions = engine
            .generate(QuestionFamily::Mass, &mut rng)
            .expect("mass should generate");

        for q in &questions {
            let Some(Program::Factual(args)) = &q.program else {
                panic!("mass questions carry factual programs");
            };
            assert_eq!(args.len(), 6);
            let related_pair = matches!(
                (args[0].as_str(), args[4].as_str()),
                ("red", "blue") | ("blue", "red")
            );
            if related_pair {
                assert_ne!(q.answer, "can not answer");
            } else {
                assert_eq!(q.answer, "can not answer");
            }
        }
    }

    #[test]
    fn test_tension_uses_ropes() {
        let mut scene = SceneGraph::new();
        scene.add_object(PhysicalObject::block("Red", "Cube", 2.0), "red cube");
        scene.add_object(PhysicalObject::block("Blue", "Cube", 4.0), "blue cube");
        scene.add_object(PhysicalObject::rope("Green", 19.6), "green rope");
        scene.add_object(PhysicalObject::rope("Pink", 39.2), "pink rope");
        let red = scene.id_of("red cube").expect("red");
        let blue = scene.id_of("blue cube").expect("blue");
        scene.add_relation(red, blue);
        scene.add_rope_map("red cube", "green rope");
        scene.add_rope_map("blue cube", "pink rope");

        let templates = TemplateSet::default();
        let engine = QuestionEngine::new(&scene, &templates);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let questions = engine
            .generate(QuestionFamily::Tension, &mut rng)
            .expect("tension should generate");

        assert_eq!(questions.len(), 2);
        for q in &questions {
            assert!(q.question.starts_with("Is the tension of the "));
            assert!(q.question.contains("green rope") && q.question.contains("pink rope"));
        }
    }

    #[test]
    fn test_tension_skips_unmapped_objects() {
        let mut scene = counting_scene();
        let red = scene.id_of("red cube").expect("red");
        let blue = scene.id_of("blue cube").expect("blue");
        scene.add_relation(red, blue);

        let templates = TemplateSet::default();
        let engine = QuestionEngine::new(&scene, &templates);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let questions = engine
            .generate(QuestionFamily::Tension, &mut rng)
            .expect("tension should generate");
        assert!(questions.is_empty());
    }

    #[test]
    fn test_counterfactual_questions_are_well_formed() {
        let scene = counterfactual_scene();
        let templates = TemplateSet::default();
        let engine = QuestionEngine::new(&scene, &templates);
        let mut rng = ChaCha8Rng::seed_from_u64(12);

        let questions = engine
            .generate(QuestionFamily::RopeCounterfactual, &mut rng)
            .expect("counterfactual should generate");
        assert!(!questions.is_empty());
        for q in &questions {
            let options: Vec<&str> = q.question.lines().skip(1).collect();
            assert!((3..=5).contains(&options.len()), "{}", q.question);
            assert!(!q.question.contains("fixed point"));
            assert!(!q.answer.is_empty());
            let Some(Program::Choice(program)) = &q.program else {
                panic!("counterfactual questions carry choice programs");
            };
            assert_eq!(program.question.aspect, Aspect::Mass);
            assert_eq!(program.choices.len(), options.len());
        }
    }

    #[test]
    fn test_direction_questions_answer_outcomes() {
        let scene = counterfactual_scene();
        let templates = TemplateSet::default();
        let engine = QuestionEngine::new(&scene, &templates);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let questions = engine
            .generate(QuestionFamily::RopeCounterfactual2, &mut rng)
            .expect("direction questions should generate");
        // Per scenario: two pulleys rotate (fixed point and shaft skipped), three objects move.
        assert_eq!(questions.len(), 4 * 5);

        let first = &questions[0];
        assert!(first.question.contains("red cube"));
        assert!(first.question.contains("heavier"));
        assert!(first.question.ends_with("A. Clockwise\nB. Anti-clockwise\nC. Stationary"));
        // Scenario 0_0: yellow pulley rotates clockwise.
        assert_eq!(first.answer, "A");

        for q in &questions {
            let Some(Program::Choice(program)) = &q.program else {
                panic!("choice program expected");
            };
            let chosen = &program.choices[q.answer.as_str()];
            let label = q
                .question
                .lines()
                .nth(letter_index(&q.answer).expect("letter") + 1)
                .expect("option line");
            assert!(label.to_lowercase().ends_with(&chosen.value));
        }
    }

    #[test]
    fn test_goal_driven_options_reach_goal() {
        let scene = counterfactual_scene();
        let templates = TemplateSet::default();
        let engine = QuestionEngine::new(&scene, &templates);

        for seed in 0..50 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let questions = engine
                .generate(QuestionFamily::RopeGoaldriven, &mut rng)
                .expect("goal-driven should generate");
            assert!(!questions.is_empty());
            for q in &questions {
                assert!(q.question.starts_with("If we want the ") || q.question.starts_with("What can we do"));
                let Some(Program::Choice(program)) = &q.program else {
                    panic!("choice program expected");
                };
                for option in program.choices.values() {
                    assert_eq!(option.aspect, Aspect::Mass);
                    assert!(option.value == "increase" || option.value == "decrease");
                }
            }
        }
    }

    #[test]
    fn test_choice_options_are_unique_across_seeds() {
        let scene = counterfactual_scene();
        let templates = TemplateSet::default();
        let engine = QuestionEngine::new(&scene, &templates);
        let families = [
            QuestionFamily::RopeCounterfactual,
            QuestionFamily::RopeCounterfactual2,
            QuestionFamily::RopeGoaldriven,
        ];

        let mut checked = 0;
        for seed in 0..300 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for family in families {
                let questions = engine.generate(family, &mut rng).expect("generation should succeed");
                for q in questions {
                    let shuffled = shuffle_options(q, !family.shuffles_options(), &mut rng)
                        .expect("shuffle should succeed");
                    let distinct: HashSet<&String> = shuffled.options.iter().collect();
                    assert_eq!(distinct.len(), shuffled.options.len());
                    assert!(!shuffled.positive().is_empty());
                    assert!(!shuffled.negative().is_empty());
                    checked += 1;
                }
            }
        }
        assert!(checked > 1000);
    }

    #[test]
    fn test_unknown_counterfactual_object_is_fatal() {
        let mut scene = counterfactual_scene();
        scene.add_counterfactual(record(
            "9_0",
            "Red Cube",
            MassChange::Heavier,
            &[("Orange Solid Static Pulley", Outcome::Positive)],
            &[],
        ));
        let templates = TemplateSet::default();
        let engine = QuestionEngine::new(&scene, &templates);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = engine
            .generate(QuestionFamily::RopeCounterfactual2, &mut rng)
            .expect_err("orange pulley is not in the scene");
        assert!(matches!(err, GenerationError::NoMatchingObject(_)));
    }
}
