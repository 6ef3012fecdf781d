//! Learner configuration management via TOML files.
//!
//! Every key is optional; missing keys fall back to the reference run
//! (radius 0.5, 999 iterations, no convergence exit, quiet).

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{LearnError, LearnResult};
use crate::learner::default_center_offset;

/// Learner configuration loaded from a TOML file.
///
/// # Examples
///
/// ```
/// use valuation_learning_core::LearnerConfig;
///
/// let config = LearnerConfig::load_from_file("config/learner.toml")
///     .unwrap_or_else(|_| LearnerConfig::default());
///
/// println!("Running at most {} iterations", config.max_iterations);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct LearnerConfig {
    /// Initial shape matrix is `initial_radius · I`
    pub initial_radius: f64,
    /// Hard cap on iterations
    pub max_iterations: usize,
    /// Stop once the largest eigenvalue of the shape matrix falls to this value
    pub convergence_threshold: Option<f64>,
    /// Emit per-iteration debug events
    pub verbose: bool,
    /// Offset added to the initial guess; per-item-count default when absent
    pub center_offset: Option<Vec<f64>>,
    /// JSONL journal settings; journaling is off when absent
    pub journal: Option<JournalConfig>,
}

/// Run journal configuration.
#[derive(Debug, Clone, Serialize)]
pub struct JournalConfig {
    pub path: PathBuf,
    pub log_every: usize,
}

impl LearnerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path)?;
        Self::from_str(&contents)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;
        Self::try_from(raw.learner)
    }

    fn try_from(raw: RawLearner) -> Result<Self, ConfigError> {
        if !raw.initial_radius.is_finite() || raw.initial_radius <= 0.0 {
            return Err(ConfigError::Parse(
                "learner.initial_radius must be positive".into(),
            ));
        }
        if raw.max_iterations == 0 {
            return Err(ConfigError::Parse(
                "learner.max_iterations must be ≥ 1".into(),
            ));
        }
        if let Some(threshold) = raw.convergence_threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(ConfigError::Parse(
                    "learner.convergence_threshold must be positive".into(),
                ));
            }
        }
        if let Some(offset) = &raw.center_offset {
            if offset.is_empty() || offset.iter().any(|v| !v.is_finite()) {
                return Err(ConfigError::Parse(
                    "learner.center_offset must be a non-empty array of finite numbers".into(),
                ));
            }
        }

        let journal = raw.journal.map(|journal| JournalConfig {
            path: journal.path,
            log_every: journal.log_every.max(1),
        });

        Ok(Self {
            initial_radius: raw.initial_radius,
            max_iterations: raw.max_iterations,
            convergence_threshold: raw.convergence_threshold,
            verbose: raw.verbose,
            center_offset: raw.center_offset,
            journal,
        })
    }

    /// Offset for a run over `items` items.
    pub fn center_offset_for(&self, items: usize) -> LearnResult<Array1<f64>> {
        match &self.center_offset {
            Some(offset) if offset.len() != items => Err(LearnError::dimension_mismatch(
                items,
                offset.len(),
                "learner.center_offset",
            )),
            Some(offset) => Ok(Array1::from(offset.clone())),
            None => Ok(default_center_offset(items)),
        }
    }
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            initial_radius: default_initial_radius(),
            max_iterations: default_max_iterations(),
            convergence_threshold: None,
            verbose: false,
            center_offset: None,
            journal: None,
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: default_journal_path(),
            log_every: 1,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    learner: RawLearner,
}

#[derive(Debug, Deserialize)]
struct RawLearner {
    #[serde(default = "default_initial_radius")]
    initial_radius: f64,
    #[serde(default = "default_max_iterations")]
    max_iterations: usize,
    #[serde(default)]
    convergence_threshold: Option<f64>,
    #[serde(default)]
    verbose: bool,
    #[serde(default)]
    center_offset: Option<Vec<f64>>,
    #[serde(default)]
    journal: Option<RawJournal>,
}

impl Default for RawLearner {
    fn default() -> Self {
        Self {
            initial_radius: default_initial_radius(),
            max_iterations: default_max_iterations(),
            convergence_threshold: None,
            verbose: false,
            center_offset: None,
            journal: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawJournal {
    #[serde(default = "default_journal_path")]
    path: PathBuf,
    #[serde(default = "default_log_every")]
    log_every: usize,
}

fn default_initial_radius() -> f64 {
    0.5
}

fn default_max_iterations() -> usize {
    999
}

fn default_journal_path() -> PathBuf {
    PathBuf::from("logs/learner.jsonl")
}

fn default_log_every() -> usize {
    1
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learner_config_defaults_when_section_missing() {
        let toml = "[other]\nvalue = 8";
        let config = LearnerConfig::from_str(toml).unwrap();
        assert_eq!(config.initial_radius, 0.5);
        assert_eq!(config.max_iterations, 999);
        assert!(config.convergence_threshold.is_none());
        assert!(!config.verbose);
        assert!(config.journal.is_none());
    }

    #[test]
    fn learner_config_parses_custom_values() {
        let toml = r#"
[learner]
initial_radius = 1
max_iterations = 40
convergence_threshold = 1e-4
verbose = true
center_offset = [0.1, -0.05, 0.15]

[learner.journal]
path = "out/run.jsonl"
log_every = 0
"#;
        let config = LearnerConfig::from_str(toml).unwrap();
        assert_eq!(config.initial_radius, 1.0);
        assert_eq!(config.max_iterations, 40);
        assert_eq!(config.convergence_threshold, Some(1e-4));
        assert!(config.verbose);
        assert_eq!(config.center_offset, Some(vec![0.1, -0.05, 0.15]));

        let journal = config.journal.unwrap();
        assert_eq!(journal.path, PathBuf::from("out/run.jsonl"));
        assert_eq!(journal.log_every, 1);
    }

    #[test]
    fn learner_config_rejects_non_positive_radius() {
        let toml = "[learner]\ninitial_radius = -0.5";
        assert!(LearnerConfig::from_str(toml).is_err());
    }

    #[test]
    fn learner_config_rejects_bad_threshold_and_cap() {
        assert!(LearnerConfig::from_str("[learner]\nconvergence_threshold = 0.0").is_err());
        assert!(LearnerConfig::from_str("[learner]\nmax_iterations = 0").is_err());
    }

    #[test]
    fn center_offset_follows_item_count() {
        let config = LearnerConfig::default();
        assert_eq!(config.center_offset_for(2).unwrap().to_vec(), vec![0.1, 0.15]);

        let custom = LearnerConfig::from_str("[learner]\ncenter_offset = [0.0, 0.2]").unwrap();
        assert_eq!(custom.center_offset_for(2).unwrap().to_vec(), vec![0.0, 0.2]);
        assert!(custom.center_offset_for(3).is_err());
    }
}
