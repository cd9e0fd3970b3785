//! Error types for pulley-forge operations.
//!
//! Defines error types for the major subsystems:
//! - Scene construction from simulator annotations
//! - Question generation (naming, choice sets, option shuffling)
//! - Template loading
//! - Dataset sampling, splitting and baseline evaluation
//! - Batch generation over a directory of annotations

use thiserror::Error;

/// Errors raised while turning an annotation into a scene graph.
///
/// All of these indicate corrupted upstream data: the scene is abandoned and
/// the batch continues with the next one.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Unparseable object name '{0}'")]
    UnparseableName(String),

    #[error("Object '{0}' referenced by a relation group is not part of the scene")]
    UnknownObject(String),

    #[error("No tension recorded for rope '{0}'")]
    MissingTension(String),

    #[error("No rope adjacent to '{object}' in group {group:?}")]
    RopeLinkNotFound { object: String, group: Vec<String> },

    #[error("Mass {mass} of '{object}' is not a multiple of 0.05")]
    UnexpectedMassPrecision { object: String, mass: f64 },

    #[error("Outcome value {value} for '{object}' in scenario '{scenario}' is not one of -1, 0, 1")]
    MalformedOutcome {
        scenario: String,
        object: String,
        value: f64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while generating questions for a scene.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Cannot parse color or type from object name '{0}'")]
    UnparseableName(String),

    #[error("No object in the scene matches '{0}'")]
    NoMatchingObject(String),

    #[error("Duplicate option text '{option}' in question '{question}'")]
    DuplicateOption { question: String, option: String },

    #[error("Answer letter '{letter}' is outside the {options} options of question '{question}'")]
    MalformedAnswer {
        question: String,
        letter: String,
        options: usize,
    },

    #[error("Template '{template}' expects {expected} arguments, got {actual}")]
    TemplateArity {
        template: String,
        expected: usize,
        actual: usize,
    },

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
}

/// Errors that can occur during template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse template file '{path}': {message}")]
    ParseError { path: String, message: String },

    #[error("Template family '{family}' has no question phrasings")]
    EmptyPhrasings { family: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while sampling, splitting or evaluating datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("No question files found in '{0}'")]
    NoQuestionFiles(String),

    #[error("Split '{0}' is empty")]
    EmptySplit(String),

    #[error("Invalid split ratios: {0}")]
    InvalidRatios(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the batch generation pipeline.
///
/// Per-scene failures are recorded in the batch report instead of aborting
/// the run; only setup failures surface from [`crate::pipeline::BatchRunner`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
