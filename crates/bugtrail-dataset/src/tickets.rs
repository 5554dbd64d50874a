//! Raw ticket records from the issue tracker.
//!
//! The tracker itself is an external collaborator; this module defines
//! the record shape the pipeline consumes and reads it from a JSON export.

use std::path::{Path, PathBuf};

use bugtrail_core::{BugtrailError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A ticket as exported by the issue tracker.
///
/// # Examples
///
/// ```
/// use bugtrail_dataset::tickets::RawTicket;
///
/// let json = r#"{
///     "key": "BOOKKEEPER-12",
///     "openingDate": "2012-03-01T10:00:00Z",
///     "affectedVersions": ["4.0.0"]
/// }"#;
/// let ticket: RawTicket = serde_json::from_str(json).unwrap();
/// assert_eq!(ticket.affected_version_names, vec!["4.0.0"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTicket {
    /// Issue key, e.g. `BOOKKEEPER-12`.
    pub key: String,
    /// When the ticket was reported.
    pub opening_date: DateTime<Utc>,
    /// Version names the reporter marked as affected.
    #[serde(default, rename = "affectedVersions")]
    pub affected_version_names: Vec<String>,
}

/// Supplies the raw tickets of a project.
pub trait TicketSource {
    /// Every ticket belonging to `project`.
    ///
    /// # Errors
    ///
    /// Retrieval failures are fatal for the run and returned unchanged.
    fn fetch(&self, project: &str) -> Result<Vec<RawTicket>>;
}

impl TicketSource for Vec<RawTicket> {
    fn fetch(&self, project: &str) -> Result<Vec<RawTicket>> {
        Ok(self
            .iter()
            .filter(|t| belongs_to_project(&t.key, project))
            .cloned()
            .collect())
    }
}

/// Tickets read from an exported JSON array.
///
/// # Examples
///
/// ```no_run
/// use bugtrail_dataset::tickets::{JsonTicketExport, TicketSource};
///
/// let export = JsonTicketExport::new("bookkeeper.json");
/// let tickets = export.fetch("BOOKKEEPER").unwrap();
/// println!("{} tickets", tickets.len());
/// ```
#[derive(Debug, Clone)]
pub struct JsonTicketExport {
    path: PathBuf,
}

impl JsonTicketExport {
    /// Read tickets from the export at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the export file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TicketSource for JsonTicketExport {
    fn fetch(&self, project: &str) -> Result<Vec<RawTicket>> {
        if !self.path.exists() {
            return Err(BugtrailError::FileNotFound(self.path.clone()));
        }

        let content = std::fs::read_to_string(&self.path)?;
        let all: Vec<RawTicket> = serde_json::from_str(&content).map_err(|e| {
            BugtrailError::Tracker(format!("malformed export {}: {e}", self.path.display()))
        })?;

        let total = all.len();
        let tickets = all.fetch(project)?;
        debug!(
            export = %self.path.display(),
            total,
            selected = tickets.len(),
            project,
            "read ticket export"
        );
        Ok(tickets)
    }
}

/// Whether `key` is a ticket of `project` (`<PROJECT>-<n>`).
///
/// An empty project selects every ticket.
pub fn belongs_to_project(key: &str, project: &str) -> bool {
    if project.is_empty() {
        return true;
    }
    key.rsplit_once('-')
        .is_some_and(|(prefix, _)| prefix.eq_ignore_ascii_case(project))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"[
        {"key": "BOOKKEEPER-1", "openingDate": "2012-01-10T00:00:00Z", "affectedVersions": ["4.0.0"]},
        {"key": "BOOKKEEPER-2", "openingDate": "2012-02-10T00:00:00Z"},
        {"key": "ZOOKEEPER-9", "openingDate": "2012-02-11T00:00:00Z", "affectedVersions": []}
    ]"#;

    #[test]
    fn export_is_filtered_by_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.json");
        std::fs::write(&path, EXPORT).unwrap();

        let tickets = JsonTicketExport::new(&path).fetch("bookkeeper").unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].key, "BOOKKEEPER-1");
        assert!(tickets[1].affected_version_names.is_empty());
    }

    #[test]
    fn missing_export_is_file_not_found() {
        let err = JsonTicketExport::new("/nonexistent/tickets.json")
            .fetch("X")
            .unwrap_err();
        assert!(matches!(err, BugtrailError::FileNotFound(_)));
    }

    #[test]
    fn malformed_export_is_tracker_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.json");
        std::fs::write(&path, "{\"not\": \"a list\"}").unwrap();

        let err = JsonTicketExport::new(&path).fetch("X").unwrap_err();
        assert!(matches!(err, BugtrailError::Tracker(_)));
    }

    #[test]
    fn project_prefix_must_match_whole_segment() {
        assert!(belongs_to_project("ABC-1", "abc"));
        assert!(!belongs_to_project("ABCD-1", "ABC"));
        assert!(!belongs_to_project("ABC1", "ABC"));
        assert!(belongs_to_project("ANY-3", ""));
    }
}
