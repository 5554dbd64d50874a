use std::path::PathBuf;

/// Errors that can occur while building a defect dataset.
///
/// Library crates use this type directly; the binary converts to
/// `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use bugtrail_core::BugtrailError;
///
/// let err = BugtrailError::InvalidRange { index: 0, len: 3 };
/// assert!(err.to_string().contains("release index 0"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BugtrailError {
    /// A release window was requested for an index outside `1..=len`.
    #[error("invalid range: release index {index} is outside 1..={len}")]
    InvalidRange {
        /// The requested 1-based release index.
        index: usize,
        /// Number of releases on the timeline.
        len: usize,
    },

    /// Reading commits or tags from the repository failed.
    #[error("git error: {0}")]
    Git(String),

    /// The issue-tracker export could not be read or understood.
    #[error("issue tracker error: {0}")]
    Tracker(String),

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}
