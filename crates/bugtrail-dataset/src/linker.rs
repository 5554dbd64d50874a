//! Bug ticket linkage.
//!
//! Places each raw ticket on the release timeline: the commits mentioning
//! its key give the fixed release, its report date gives the opening
//! release, and its declared affected versions (backfilled up to the fix)
//! give the affected releases. Tickets that cannot be placed are dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace};

use crate::history::{serialize_ids, Commit};
use crate::tickets::RawTicket;
use crate::timeline::{release_at, release_by_name, Release, ReleaseRef};

/// A ticket linked to the release timeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugTicket {
    /// Issue key.
    pub key: String,
    /// When the ticket was reported.
    pub opening_date: DateTime<Utc>,
    /// Affected version names as exported.
    pub affected_version_names: Vec<String>,
    /// Release whose window contains the opening date.
    pub opening_release: ReleaseRef,
    /// Release whose window contains the latest related commit.
    pub fixed_release: ReleaseRef,
    /// Declared affected releases followed by the backfilled ones.
    pub affected_releases: Vec<ReleaseRef>,
    /// Commits whose message mentions the key.
    #[serde(serialize_with = "serialize_ids")]
    pub related_commits: Vec<Commit>,
}

/// Link every raw ticket that can be placed on the timeline.
pub fn link_tickets(raw: Vec<RawTicket>, commits: &[Commit], releases: &[Release]) -> Vec<BugTicket> {
    let total = raw.len();
    let linked: Vec<BugTicket> = raw
        .into_iter()
        .filter_map(|ticket| link_ticket(ticket, commits, releases))
        .collect();

    debug!(total, linked = linked.len(), "linked bug tickets");
    linked
}

/// Link one ticket, or `None` if it has no related commit or its fix or
/// opening date falls outside every release window.
pub fn link_ticket(raw: RawTicket, commits: &[Commit], releases: &[Release]) -> Option<BugTicket> {
    let related = related_commits(&raw.key, commits);
    if related.is_empty() {
        trace!(ticket = %raw.key, "dropped: no commit mentions the key");
        return None;
    }

    let Some(fixed) = fixed_release(&related, releases) else {
        trace!(ticket = %raw.key, "dropped: fix commit is after the last release");
        return None;
    };

    let Some(opening) = release_at(releases, raw.opening_date) else {
        trace!(ticket = %raw.key, "dropped: opened after the last release");
        return None;
    };

    let affected_releases = affected_releases(&raw.affected_version_names, fixed, releases);

    Some(BugTicket {
        opening_release: opening.reference(),
        fixed_release: fixed.reference(),
        affected_releases,
        related_commits: related,
        key: raw.key,
        opening_date: raw.opening_date,
        affected_version_names: raw.affected_version_names,
    })
}

/// Commits whose message contains `key` (case-sensitive).
pub fn related_commits(key: &str, commits: &[Commit]) -> Vec<Commit> {
    commits.iter().filter(|c| c.mentions(key)).cloned().collect()
}

/// The release containing the latest of `related`.
///
/// Among commits sharing the latest date the first one wins.
pub fn fixed_release<'a>(related: &[Commit], releases: &'a [Release]) -> Option<&'a Release> {
    let latest = related
        .iter()
        .reduce(|latest, c| if c.date > latest.date { c } else { latest })?;
    release_at(releases, latest.date)
}

/// Resolve affected version names and backfill up to the fix.
///
/// Names resolve in the order given; names matching no release are
/// skipped. When at least one resolves, every release from the smallest
/// resolved index up to (excluding) `fixed` that is not already present
/// is appended in index order.
pub fn affected_releases(names: &[String], fixed: &Release, releases: &[Release]) -> Vec<ReleaseRef> {
    let mut affected: Vec<ReleaseRef> = Vec::new();
    for name in names {
        match release_by_name(releases, name) {
            Some(release) if !affected.iter().any(|a| a.index == release.index) => {
                affected.push(release.reference());
            }
            Some(_) => {}
            None => trace!(version = %name, "affected version matches no release"),
        }
    }

    let Some(min_index) = affected.iter().map(|a| a.index).min() else {
        return affected;
    };

    for release in releases
        .iter()
        .filter(|r| r.index >= min_index && r.index < fixed.index)
    {
        if !affected.iter().any(|a| a.index == release.index) {
            affected.push(release.reference());
        }
    }

    affected
}
