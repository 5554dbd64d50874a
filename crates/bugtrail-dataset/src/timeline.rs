//! Release timeline construction.
//!
//! Tags become releases ordered by date and numbered from 1. Each release
//! owns the commits of its half-open window `[start, end)`, where `end` is
//! the release's own date and `start` is the previous release's date (the
//! earliest commit's date for release 1).

use bugtrail_core::{BugtrailError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace};

use crate::history::{serialize_ids, Commit, TagRef};

/// A release and the commits of its window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// 1-based position on the timeline.
    pub index: usize,
    /// Tag name.
    pub version_name: String,
    /// Tag date.
    pub date: DateTime<Utc>,
    /// Commits dated inside this release's window.
    #[serde(serialize_with = "serialize_ids")]
    pub commits: Vec<Commit>,
}

impl Release {
    /// Lightweight handle to this release, without its commits.
    pub fn reference(&self) -> ReleaseRef {
        ReleaseRef {
            index: self.index,
            version_name: self.version_name.clone(),
            date: self.date,
        }
    }
}

/// Identifies a release from a linked ticket.
///
/// # Examples
///
/// ```
/// use bugtrail_dataset::timeline::ReleaseRef;
/// use chrono::{TimeZone, Utc};
///
/// let r = ReleaseRef {
///     index: 2,
///     version_name: "release-4.1.0".into(),
///     date: Utc.with_ymd_and_hms(2012, 6, 4, 0, 0, 0).unwrap(),
/// };
/// assert_eq!(r.index, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRef {
    /// 1-based position on the timeline.
    pub index: usize,
    /// Tag name.
    pub version_name: String,
    /// Tag date.
    pub date: DateTime<Utc>,
}

/// Half-open date interval `[start, end)`.
///
/// # Examples
///
/// ```
/// use bugtrail_dataset::timeline::Window;
/// use chrono::{TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap();
/// let window = Window { start, end };
/// assert!(window.contains(start));
/// assert!(!window.contains(end));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Exclusive upper bound.
    pub end: DateTime<Utc>,
}

impl Window {
    /// Whether `date` falls in `[start, end)`.
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        self.start <= date && date < self.end
    }
}

/// Build the release timeline from `tags` and the filtered `commits`.
///
/// Tags are sorted by date (then name); a tag dated exactly like an earlier
/// one is dropped so release dates strictly increase.
///
/// # Errors
///
/// Returns [`BugtrailError::InvalidRange`] only if window computation is
/// asked for an index outside the timeline, which cannot happen here.
pub fn build_timeline(mut tags: Vec<TagRef>, commits: &[Commit]) -> Result<Vec<Release>> {
    tags.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.name.cmp(&b.name)));
    tags.dedup_by(|later, kept| {
        let same = later.date == kept.date;
        if same {
            trace!(dropped = %later.name, kept = %kept.name, "tags share a date");
        }
        same
    });

    let mut releases: Vec<Release> = tags
        .into_iter()
        .enumerate()
        .map(|(i, tag)| Release {
            index: i + 1,
            version_name: tag.name,
            date: tag.date,
            commits: Vec::new(),
        })
        .collect();

    for index in 1..=releases.len() {
        let window_commits = commits_between(&releases, commits, index)?;
        releases[index - 1].commits = window_commits;
    }

    debug!(releases = releases.len(), "built release timeline");
    Ok(releases)
}

/// The window of the release at 1-based `index`.
///
/// # Errors
///
/// Returns [`BugtrailError::InvalidRange`] if `index` is 0 or past the
/// last release.
pub fn release_window(releases: &[Release], commits: &[Commit], index: usize) -> Result<Window> {
    if index < 1 || index > releases.len() {
        return Err(BugtrailError::InvalidRange {
            index,
            len: releases.len(),
        });
    }

    let end = releases[index - 1].date;
    let start = if index > 1 {
        releases[index - 2].date
    } else {
        commits.iter().map(|c| c.date).min().unwrap_or(end)
    };

    Ok(Window { start, end })
}

/// Commits dated inside the window of the release at 1-based `index`.
///
/// # Errors
///
/// Returns [`BugtrailError::InvalidRange`] if `index` is 0 or past the
/// last release.
pub fn commits_between(
    releases: &[Release],
    commits: &[Commit],
    index: usize,
) -> Result<Vec<Commit>> {
    let window = release_window(releases, commits, index)?;
    Ok(commits
        .iter()
        .filter(|c| window.contains(c.date))
        .cloned()
        .collect())
}

/// The release whose window contains `date`.
///
/// Windows are half-open; the first release's window has no lower bound.
/// Dates at or after the last release's date belong to no release.
pub fn release_at(releases: &[Release], date: DateTime<Utc>) -> Option<&Release> {
    releases.iter().find(|r| date < r.date)
}

/// The first release whose version name contains `name`.
pub fn release_by_name<'a>(releases: &'a [Release], name: &str) -> Option<&'a Release> {
    if name.trim().is_empty() {
        return None;
    }
    releases.iter().find(|r| r.version_name.contains(name))
}
