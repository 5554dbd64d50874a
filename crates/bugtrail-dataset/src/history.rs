//! Commit history ingestion via git2.
//!
//! Loads every commit reachable from the branch tip, orders the history
//! by author date and removes revert pairs: a commit declaring
//! `This reverts commit <id>` is dropped together with the commit it names.

use std::collections::HashSet;
use std::path::Path;

use bugtrail_core::{BugtrailError, Result};
use chrono::{DateTime, Utc};
use git2::{Repository, Sort};
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

/// Marker git writes into the message of a revert commit.
pub const REVERT_MARKER: &str = "This reverts commit";

/// Length of a full hex commit id.
pub const COMMIT_ID_LEN: usize = 40;

/// Shortest abbreviated id accepted when resolving a revert reference.
const MIN_ABBREV_LEN: usize = 7;

/// A commit as seen by the dataset pipeline.
///
/// # Examples
///
/// ```
/// use bugtrail_dataset::history::Commit;
/// use chrono::{TimeZone, Utc};
///
/// let commit = Commit {
///     id: "a".repeat(40),
///     date: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
///     message: "BOOKKEEPER-1: fix ledger recovery".into(),
/// };
/// assert!(commit.mentions("BOOKKEEPER-1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Full 40-character hex id.
    pub id: String,
    /// Author date.
    pub date: DateTime<Utc>,
    /// Full commit message.
    pub message: String,
}

impl Commit {
    /// Whether the message contains `text` (case-sensitive substring).
    pub fn mentions(&self, text: &str) -> bool {
        self.message.contains(text)
    }
}

/// A tag reference with its creation date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    /// Tag name, used as the release's version name.
    pub name: String,
    /// Tagger date for annotated tags, committer date of the target otherwise.
    pub date: DateTime<Utc>,
}

/// Read access to a version-control history.
///
/// The pipeline only needs the commit log and the tag list, so tests can
/// substitute an in-memory history for a real repository.
pub trait RepositorySource {
    /// Every commit reachable from the branch tip, oldest first in
    /// topological order.
    ///
    /// # Errors
    ///
    /// Returns [`BugtrailError::Git`] if the history cannot be read.
    fn commits(&self) -> Result<Vec<Commit>>;

    /// Every tag that resolves to a commit.
    ///
    /// # Errors
    ///
    /// Returns [`BugtrailError::Git`] if the tags cannot be read.
    fn tags(&self) -> Result<Vec<TagRef>>;
}

/// A git repository opened on disk.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use bugtrail_dataset::history::{GitRepository, RepositorySource};
///
/// let repo = GitRepository::open(Path::new(".")).unwrap();
/// println!("{} tags", repo.tags().unwrap().len());
/// ```
pub struct GitRepository {
    repo: Repository,
    branch: Option<String>,
}

impl GitRepository {
    /// Open the repository at `path`, walking from HEAD.
    ///
    /// # Errors
    ///
    /// Returns [`BugtrailError::Git`] if `path` is not a git repository.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::open(path).map_err(git_error("failed to open repository"))?;
        Ok(Self { repo, branch: None })
    }

    /// Walk from `branch` instead of HEAD.
    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    fn tag_date(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        let object = self
            .repo
            .revparse_single(&format!("refs/tags/{name}"))
            .map_err(git_error("failed to resolve tag"))?;

        if let Some(tagger) = object.as_tag().and_then(|tag| tag.tagger()) {
            return to_utc(tagger.when().seconds()).map(Some);
        }

        match object.peel_to_commit() {
            Ok(commit) => to_utc(commit.committer().when().seconds()).map(Some),
            Err(_) => Ok(None),
        }
    }
}

impl RepositorySource for GitRepository {
    fn commits(&self) -> Result<Vec<Commit>> {
        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(git_error("failed to create revwalk"))?;
        revwalk
            .set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)
            .map_err(git_error("failed to set revwalk order"))?;

        if let Some(ref branch) = self.branch {
            let reference = self
                .repo
                .resolve_reference_from_short_name(branch)
                .map_err(git_error("failed to resolve branch"))?;
            let oid = reference
                .target()
                .ok_or_else(|| BugtrailError::Git(format!("branch '{branch}' has no target")))?;
            revwalk.push(oid).map_err(git_error("failed to push oid"))?;
        } else {
            revwalk
                .push_head()
                .map_err(git_error("failed to push HEAD"))?;
        }

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result.map_err(git_error("revwalk error"))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(git_error("failed to find commit"))?;

            commits.push(Commit {
                id: oid.to_string(),
                date: to_utc(commit.author().when().seconds())?,
                message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            });
        }

        Ok(commits)
    }

    fn tags(&self) -> Result<Vec<TagRef>> {
        let names = self
            .repo
            .tag_names(None)
            .map_err(git_error("failed to list tags"))?;

        let mut tags = Vec::new();
        for name in names.iter().flatten() {
            match self.tag_date(name)? {
                Some(date) => tags.push(TagRef {
                    name: name.to_string(),
                    date,
                }),
                None => trace!(tag = name, "skipping tag that does not point at a commit"),
            }
        }

        Ok(tags)
    }
}

/// Load the commit history ordered by author date, without revert pairs.
///
/// The sort is stable, so commits sharing an author date keep the order
/// the source produced them in.
///
/// # Errors
///
/// Propagates any [`BugtrailError::Git`] from the source.
pub fn load_history<R: RepositorySource + ?Sized>(source: &R) -> Result<Vec<Commit>> {
    let mut commits = source.commits()?;
    let loaded = commits.len();
    commits.sort_by_key(|c| c.date);

    let reverted = revert_pairs(&commits);
    commits.retain(|c| !reverted.contains(&c.id));

    debug!(
        loaded,
        removed = loaded - commits.len(),
        kept = commits.len(),
        "loaded commit history"
    );
    Ok(commits)
}

/// Ids of every reverting commit and every commit it reverts.
///
/// A reference that cannot be resolved in `commits` only marks the
/// reverting commit.
pub fn revert_pairs(commits: &[Commit]) -> HashSet<String> {
    let mut marked = HashSet::new();

    for commit in commits {
        for line in commit.message.lines() {
            let Some(pos) = line.find(REVERT_MARKER) else {
                continue;
            };
            marked.insert(commit.id.clone());

            let target = reverted_id(&line[pos + REVERT_MARKER.len()..])
                .and_then(|id| find_commit(commits, id));
            match target {
                Some(target) => {
                    marked.insert(target.id.clone());
                }
                None => trace!(commit = %commit.id, line, "revert target not in history"),
            }
        }
    }

    marked
}

/// Extract the commit id following the revert marker.
///
/// Takes the leading hex digits of the next token, truncated to
/// [`COMMIT_ID_LEN`].
fn reverted_id(rest: &str) -> Option<&str> {
    let token = rest.split_whitespace().next()?;
    let hex_len = token
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .count()
        .min(COMMIT_ID_LEN);

    (hex_len >= MIN_ABBREV_LEN).then(|| &token[..hex_len])
}

/// Find the commit whose id is `id` or uniquely starts with it.
pub fn find_commit<'a>(commits: &'a [Commit], id: &str) -> Option<&'a Commit> {
    let mut matches = commits.iter().filter(|c| c.id.starts_with(id));
    let found = matches.next()?;
    match matches.next() {
        Some(_) => None,
        None => Some(found),
    }
}

/// Serialize a commit list as its ids only.
pub(crate) fn serialize_ids<S: Serializer>(
    commits: &[Commit],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(commits.iter().map(|c| &c.id))
}

fn to_utc(seconds: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| BugtrailError::Git(format!("timestamp out of range: {seconds}")))
}

fn git_error(context: &'static str) -> impl Fn(git2::Error) -> BugtrailError {
    move |e| {
        debug!(error = %e, "{context}");
        BugtrailError::Git(format!("{context}: {e}"))
    }
}
