use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BugtrailError;
use crate::types::Algorithm;

/// Top-level configuration loaded from `.bugtrail.toml`.
///
/// Resolution order: CLI flags > config file > defaults.
///
/// # Examples
///
/// ```
/// use bugtrail_core::BugtrailConfig;
///
/// let config = BugtrailConfig::default();
/// assert!(config.history.branch.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BugtrailConfig {
    /// Commit history settings.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Issue-tracker export settings.
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// Dataset construction settings.
    #[serde(default)]
    pub dataset: DatasetConfig,
}

impl BugtrailConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BugtrailError::Io`] if the file cannot be read, or
    /// [`BugtrailError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, BugtrailError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`BugtrailError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use bugtrail_core::{Algorithm, BugtrailConfig};
    ///
    /// let toml = r#"
    /// [dataset]
    /// algorithm = "increment"
    /// "#;
    /// let config = BugtrailConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.dataset.algorithm, Algorithm::Increment);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, BugtrailError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Which part of the history to mine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Branch whose tip the history walk starts from (default: HEAD).
    pub branch: Option<String>,
}

/// Where ticket records come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Project name used to select tickets by key prefix.
    pub project: Option<String>,
    /// Path to the exported ticket file.
    pub export: Option<PathBuf>,
}

/// Dataset construction settings.
///
/// # Examples
///
/// ```
/// use bugtrail_core::{Algorithm, DatasetConfig};
///
/// assert_eq!(DatasetConfig::default().algorithm, Algorithm::Proportion);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Estimation algorithm handed to the downstream stage.
    #[serde(default)]
    pub algorithm: Algorithm,
}
