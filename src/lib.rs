//! pulley-forge: physical-reasoning question generation for pulley scenes.
//!
//! This library turns simulator annotations of pulley systems into factual,
//! counterfactual and goal-driven question/answer datasets.

// Core modules
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod questions;
pub mod scene;

// Re-export commonly used error types
pub use error::{DatasetError, GenerationError, PipelineError, SceneError, TemplateError};
