//! Per-release feature computation hook.
//!
//! Metrics are computed by an external collaborator, one release at a time
//! in index order. The only state carried between releases is a mapping
//! from names to dates, threaded explicitly through a fold.

use std::collections::BTreeMap;

use bugtrail_core::Result;
use chrono::{DateTime, Utc};

use crate::linker::BugTicket;
use crate::timeline::Release;

/// Names mapped to the date they were first seen.
pub type NameDates = BTreeMap<String, DateTime<Utc>>;

/// Computes the features of one release.
pub trait FeatureComputer {
    /// Process `release` and return the updated mapping.
    ///
    /// # Errors
    ///
    /// Any error aborts the fold and is returned from [`compute_features`].
    fn compute(
        &mut self,
        release: &Release,
        previous: Option<&Release>,
        tickets: &[BugTicket],
        names: NameDates,
    ) -> Result<NameDates>;
}

/// Run `computer` over `releases` in index order, threading the mapping.
///
/// # Errors
///
/// Returns the first error raised by `computer`.
pub fn compute_features<F: FeatureComputer + ?Sized>(
    releases: &[Release],
    tickets: &[BugTicket],
    computer: &mut F,
) -> Result<NameDates> {
    releases
        .iter()
        .enumerate()
        .try_fold(NameDates::new(), |names, (i, release)| {
            let previous = i.checked_sub(1).map(|p| &releases[p]);
            computer.compute(release, previous, tickets, names)
        })
}

/// Records the date each version name first appears on the timeline.
#[derive(Debug, Default)]
pub struct ReleaseCatalog;

impl FeatureComputer for ReleaseCatalog {
    fn compute(
        &mut self,
        release: &Release,
        _previous: Option<&Release>,
        _tickets: &[BugTicket],
        mut names: NameDates,
    ) -> Result<NameDates> {
        names
            .entry(release.version_name.clone())
            .or_insert(release.date);
        Ok(names)
    }
}
