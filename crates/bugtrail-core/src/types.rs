use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Buggy-ness estimation algorithm requested for the downstream stage.
///
/// The dataset pipeline never inspects this value; it is carried through
/// to the output so the estimator knows which method to apply.
///
/// # Examples
///
/// ```
/// use bugtrail_core::Algorithm;
///
/// let algo: Algorithm = "increment".parse().unwrap();
/// assert_eq!(algo, Algorithm::Increment);
/// assert_eq!(Algorithm::default(), Algorithm::Proportion);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Proportion-based estimation of injected versions.
    #[default]
    Proportion,
    /// Incremental proportion over the releases seen so far.
    Increment,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Proportion => write!(f, "proportion"),
            Algorithm::Increment => write!(f, "increment"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "proportion" => Ok(Algorithm::Proportion),
            "increment" => Ok(Algorithm::Increment),
            other => Err(format!("algorithm not available: {other}")),
        }
    }
}

/// Output format for CLI results.
///
/// # Examples
///
/// ```
/// use bugtrail_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
