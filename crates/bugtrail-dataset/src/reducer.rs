//! Observation-horizon truncation.
//!
//! Only the first half of the releases is kept, since the most recent
//! releases have incomplete defect data. Commits and tickets are then cut
//! at the date of the last retained release.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace};

use crate::history::{serialize_ids, Commit};
use crate::linker::BugTicket;
use crate::timeline::Release;

/// Whether a dataset has been truncated yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Horizon {
    /// Not reduced; every release is present.
    Unbounded,
    /// Reduced; holds the last retained release's date, if any remained.
    Truncated(Option<DateTime<Utc>>),
}

/// The commits, releases and tickets of one pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Filtered commits, ascending by date.
    #[serde(serialize_with = "serialize_ids")]
    pub commits: Vec<Commit>,
    /// Releases ordered by index.
    pub releases: Vec<Release>,
    /// Linked bug tickets.
    pub tickets: Vec<BugTicket>,
    /// Truncation state.
    pub horizon: Horizon,
}

impl Dataset {
    /// An unreduced dataset.
    pub fn new(commits: Vec<Commit>, releases: Vec<Release>, tickets: Vec<BugTicket>) -> Self {
        Self {
            commits,
            releases,
            tickets,
            horizon: Horizon::Unbounded,
        }
    }

    /// Date of the last retained release once truncated.
    pub fn horizon_date(&self) -> Option<DateTime<Utc>> {
        match self.horizon {
            Horizon::Unbounded => None,
            Horizon::Truncated(date) => date,
        }
    }
}

/// Truncate `dataset` to its observation horizon.
///
/// Steps run in order: keep releases with index `<= len / 2`, drop commits
/// dated after the new last release, then drop tickets fixed after it or
/// whose fixed release is not strictly after their opening date. With no
/// release left, every commit and ticket is dropped. A dataset that was
/// already truncated is returned unchanged.
pub fn reduce_dataset(mut dataset: Dataset) -> Dataset {
    if let Horizon::Truncated(_) = dataset.horizon {
        return dataset;
    }

    let half = dataset.releases.len() / 2;
    dataset.releases.retain(|r| r.index <= half);
    let horizon = dataset.releases.last().map(|r| r.date);

    let before = (dataset.commits.len(), dataset.tickets.len());
    match horizon {
        Some(horizon) => {
            dataset.commits.retain(|c| c.date <= horizon);
            dataset.tickets.retain(|t| {
                let keep = t.fixed_release.date <= horizon && t.opening_date < t.fixed_release.date;
                if !keep {
                    trace!(ticket = %t.key, "dropped: fixed after horizon or before opening");
                }
                keep
            });
        }
        None => {
            dataset.commits.clear();
            dataset.tickets.clear();
        }
    }

    debug!(
        releases = dataset.releases.len(),
        commits_dropped = before.0 - dataset.commits.len(),
        tickets_dropped = before.1 - dataset.tickets.len(),
        horizon = ?horizon,
        "reduced dataset"
    );

    dataset.horizon = Horizon::Truncated(horizon);
    dataset
}
