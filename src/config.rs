//! Configuration for batch question generation.
//!
//! Values come from [`GenerationConfig::default`], are overridden by
//! `PULLEY_*` environment variables in [`GenerationConfig::from_env`], and
//! finally by command-line flags.

use std::path::PathBuf;
use thiserror::Error;

use crate::questions::QuestionFamily;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration of one batch generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Directory holding one `<video_id>/outputs.json` per video.
    pub input_dir: PathBuf,
    /// Root of the question output; files go to `<output_dir>/<video_type>/`.
    pub output_dir: PathBuf,
    /// Dataset name, used as output sub-directory and file prefix.
    pub video_type: String,

    /// Fraction of the sorted annotation list where this run starts.
    pub start: f64,
    /// Fraction of the sorted annotation list where this run stops (exclusive).
    pub end: f64,
    /// Regenerate videos whose output file already exists.
    pub restart: bool,
    /// Video ids never processed.
    pub skip_video_ids: Vec<String>,

    /// Generate only this family instead of all of them.
    pub family: Option<QuestionFamily>,
    /// Optional YAML file replacing the built-in templates.
    pub template_path: Option<PathBuf>,
    /// Base seed; each scene mixes in its video id.
    pub seed: Option<u64>,

    /// Maximum number of scenes generated concurrently.
    pub max_concurrent_scenes: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/pulley_group"),
            output_dir: PathBuf::from("output"),
            video_type: "pulley".to_string(),

            start: 0.0,
            end: 1.0,
            restart: false,
            skip_video_ids: Vec::new(),

            family: None,
            template_path: None,
            seed: None,

            max_concurrent_scenes: 8,
        }
    }
}

impl GenerationConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PULLEY_INPUT_DIR`: Annotation directory (default: data/pulley_group)
    /// - `PULLEY_OUTPUT_DIR`: Output root (default: output)
    /// - `PULLEY_VIDEO_TYPE`: Dataset name (default: pulley)
    /// - `PULLEY_START` / `PULLEY_END`: Slice of the annotation list (default: 0.0 / 1.0)
    /// - `PULLEY_RESTART`: Overwrite existing outputs (default: false)
    /// - `PULLEY_SKIP_VIDEO_IDS`: Comma-separated video ids to skip
    /// - `PULLEY_FAMILY`: Single question family to generate
    /// - `PULLEY_TEMPLATES`: YAML template file
    /// - `PULLEY_SEED`: Base random seed
    /// - `PULLEY_MAX_CONCURRENT`: Concurrent scenes (default: 8)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Paths
        if let Ok(val) = std::env::var("PULLEY_INPUT_DIR") {
            config.input_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("PULLEY_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("PULLEY_VIDEO_TYPE") {
            config.video_type = val;
        }

        // Selection
        if let Ok(val) = std::env::var("PULLEY_START") {
            config.start = parse_env_value(&val, "PULLEY_START")?;
        }

        if let Ok(val) = std::env::var("PULLEY_END") {
            config.end = parse_env_value(&val, "PULLEY_END")?;
        }

        if let Ok(val) = std::env::var("PULLEY_RESTART") {
            config.restart = parse_env_bool(&val, "PULLEY_RESTART")?;
        }

        if let Ok(val) = std::env::var("PULLEY_SKIP_VIDEO_IDS") {
            config.skip_video_ids = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Generation
        if let Ok(val) = std::env::var("PULLEY_FAMILY") {
            config.family = Some(parse_env_value(&val, "PULLEY_FAMILY")?);
        }

        if let Ok(val) = std::env::var("PULLEY_TEMPLATES") {
            config.template_path = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("PULLEY_SEED") {
            config.seed = Some(parse_env_value(&val, "PULLEY_SEED")?);
        }

        if let Ok(val) = std::env::var("PULLEY_MAX_CONCURRENT") {
            config.max_concurrent_scenes = parse_env_value(&val, "PULLEY_MAX_CONCURRENT")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.start) || !(0.0..=1.0).contains(&self.end) {
            return Err(ConfigError::ValidationFailed(
                "start and end must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.start > self.end {
            return Err(ConfigError::ValidationFailed(
                "start cannot exceed end".to_string(),
            ));
        }

        if self.video_type.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "video_type cannot be empty".to_string(),
            ));
        }

        if self.max_concurrent_scenes == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_concurrent_scenes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Families this run generates.
    pub fn families(&self) -> Vec<QuestionFamily> {
        match self.family {
            Some(family) => vec![family],
            None => QuestionFamily::ALL.to_vec(),
        }
    }

    /// Directory the per-video question files are written to.
    pub fn video_output_dir(&self) -> PathBuf {
        self.output_dir.join(&self.video_type)
    }

    /// Builder method to set the annotation directory.
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = dir.into();
        self
    }

    /// Builder method to set the output root.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Builder method to set the dataset name.
    pub fn with_video_type(mut self, video_type: impl Into<String>) -> Self {
        self.video_type = video_type.into();
        self
    }

    /// Builder method to set the processed slice.
    pub fn with_range(mut self, start: f64, end: f64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    pub fn with_skip_video_ids(mut self, ids: Vec<String>) -> Self {
        self.skip_video_ids = ids;
        self
    }

    pub fn with_family(mut self, family: Option<QuestionFamily>) -> Self {
        self.family = family;
        self
    }

    pub fn with_template_path(mut self, path: Option<PathBuf>) -> Self {
        self.template_path = path;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the concurrency limit.
    pub fn with_max_concurrent_scenes(mut self, max: usize) -> Self {
        self.max_concurrent_scenes = max;
        self
    }
}

/// Parse an environment variable value.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GenerationConfig::default();
        assert_eq!(config.video_type, "pulley");
        assert!((config.end - 1.0).abs() < f64::EPSILON);
        assert!(!config.restart);
        assert_eq!(config.families(), QuestionFamily::ALL.to_vec());
        assert_eq!(config.video_output_dir(), PathBuf::from("output/pulley"));
        config.validate().expect("defaults should validate");
    }

    #[test]
    fn test_config_builder() {
        let config = GenerationConfig::new()
            .with_input_dir("/data/in")
            .with_output_dir("/data/out")
            .with_video_type("pulley_group")
            .with_range(0.25, 0.5)
            .with_restart(true)
            .with_family(Some(QuestionFamily::Mass))
            .with_seed(Some(7))
            .with_max_concurrent_scenes(2);

        assert_eq!(config.input_dir, PathBuf::from("/data/in"));
        assert_eq!(config.video_output_dir(), PathBuf::from("/data/out/pulley_group"));
        assert_eq!(config.families(), vec![QuestionFamily::Mass]);
        assert_eq!(config.seed, Some(7));
        config.validate().expect("builder config should validate");
    }

    #[test]
    fn test_validation_rejects_bad_ranges() {
        let config = GenerationConfig::new().with_range(0.6, 0.4);
        assert!(matches!(config.validate(), Err(ConfigError::ValidationFailed(_))));

        let config = GenerationConfig::new().with_range(0.0, 1.5);
        assert!(config.validate().is_err());

        let config = GenerationConfig::new().with_max_concurrent_scenes(0);
        assert!(config.validate().is_err());

        let config = GenerationConfig::new().with_video_type("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_env_helpers() {
        assert_eq!(parse_env_value::<u64>("42", "K").expect("number"), 42);
        assert!(parse_env_value::<u64>("forty", "K").is_err());
        assert_eq!(
            parse_env_value::<QuestionFamily>("rope_goaldriven", "K").expect("family"),
            QuestionFamily::RopeGoaldriven
        );
        assert!(parse_env_bool("on", "K").expect("bool"));
        assert!(!parse_env_bool("No", "K").expect("bool"));
        assert!(matches!(
            parse_env_bool("maybe", "K"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
