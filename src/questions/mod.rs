//! Question generation over a [`SceneGraph`].
//!
//! [`generate_scene_questions`] runs the requested families through the
//! [`QuestionEngine`], passes every choice question through the option
//! shuffler and assembles the final [`QuestionItem`]s.

pub mod choices;
pub mod comparison;
pub mod engine;
pub mod naming;
pub mod shuffle;
pub mod templates;
pub mod types;

pub use choices::{Candidate, CandidatePools, ChoiceSet};
pub use comparison::{ComparativeFactSampler, Comparator, Comparison, Factor, Truth};
pub use engine::QuestionEngine;
pub use naming::NamingResolver;
pub use shuffle::{shuffle_options, ShuffledQuestion};
pub use templates::TemplateSet;
pub use types::{
    AnswerType, Aspect, ChoiceProgram, Feature, Program, QuestionFamily, QuestionItem, RawQuestion,
};

use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

use crate::error::GenerationError;
use crate::scene::SceneGraph;

/// Questions of one scene, keyed by family.
pub type QuestionDict = BTreeMap<QuestionFamily, Vec<QuestionItem>>;

/// Generates all `families` for `scene`.
///
/// # Errors
///
/// Any [`GenerationError`] aborts the whole scene; no partial dictionary is
/// returned.
pub fn generate_scene_questions(
    scene: &SceneGraph,
    templates: &TemplateSet,
    families: &[QuestionFamily],
    rng: &mut ChaCha8Rng,
) -> Result<QuestionDict, GenerationError> {
    let engine = QuestionEngine::new(scene, templates);
    let mut dict = QuestionDict::new();

    for &family in families {
        let raw = engine.generate(family, rng)?;
        let items = raw
            .into_iter()
            .map(|question| assemble(family, question, rng))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(family = %family, count = items.len(), "Generated questions");
        dict.insert(family, items);
    }

    Ok(dict)
}

/// Turns a raw question into its emitted form.
fn assemble(
    family: QuestionFamily,
    raw: RawQuestion,
    rng: &mut ChaCha8Rng,
) -> Result<QuestionItem, GenerationError> {
    if !family.is_choice_based() {
        return Ok(QuestionItem {
            positive: vec![raw.answer.clone()],
            negative: Vec::new(),
            question: raw.question,
            answer: raw.answer,
            question_family: family,
            answer_type: family.answer_type(),
            program: raw.program,
        });
    }

    let shuffled = shuffle_options(raw, !family.shuffles_options(), rng)?;
    Ok(QuestionItem {
        positive: shuffled.positive(),
        negative: shuffled.negative(),
        question: shuffled.question,
        answer: shuffled.answer,
        question_family: family,
        answer_type: family.answer_type(),
        program: shuffled.program,
    })
}
