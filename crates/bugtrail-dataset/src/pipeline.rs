//! End-to-end dataset construction.
//!
//! history → timeline → linkage → reduction. Every run owns its own
//! collections; the repository and ticket source are only read.

use bugtrail_core::Result;
use tracing::info;

use crate::history::{load_history, RepositorySource};
use crate::linker::link_tickets;
use crate::reducer::{reduce_dataset, Dataset};
use crate::tickets::TicketSource;
use crate::timeline::build_timeline;

/// Build the linked, unreduced dataset for `project`.
///
/// # Errors
///
/// Propagates repository and ticket retrieval failures unchanged.
pub fn assemble_dataset<R, T>(repo: &R, tracker: &T, project: &str) -> Result<Dataset>
where
    R: RepositorySource + ?Sized,
    T: TicketSource + ?Sized,
{
    let commits = load_history(repo)?;
    let releases = build_timeline(repo.tags()?, &commits)?;
    let raw = tracker.fetch(project)?;
    let tickets = link_tickets(raw, &commits, &releases);

    Ok(Dataset::new(commits, releases, tickets))
}

/// Build the dataset for `project` and truncate it to its horizon.
///
/// # Errors
///
/// Propagates repository and ticket retrieval failures unchanged.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use bugtrail_dataset::history::GitRepository;
/// use bugtrail_dataset::pipeline::build_dataset;
/// use bugtrail_dataset::tickets::JsonTicketExport;
///
/// let repo = GitRepository::open(Path::new("bookkeeper")).unwrap();
/// let tracker = JsonTicketExport::new("bookkeeper.json");
/// let dataset = build_dataset(&repo, &tracker, "BOOKKEEPER").unwrap();
/// println!("{} releases", dataset.releases.len());
/// ```
pub fn build_dataset<R, T>(repo: &R, tracker: &T, project: &str) -> Result<Dataset>
where
    R: RepositorySource + ?Sized,
    T: TicketSource + ?Sized,
{
    let dataset = reduce_dataset(assemble_dataset(repo, tracker, project)?);
    info!(
        project,
        commits = dataset.commits.len(),
        releases = dataset.releases.len(),
        tickets = dataset.tickets.len(),
        "built dataset"
    );
    Ok(dataset)
}
