use bugtrail_core::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::history::{Commit, RepositorySource, TagRef};

pub(crate) struct MemoryRepository {
    commits: Vec<Commit>,
    tags: Vec<TagRef>,
}

impl MemoryRepository {
    pub(crate) fn new(commits: Vec<Commit>, tags: Vec<TagRef>) -> Self {
        Self { commits, tags }
    }
}

impl RepositorySource for MemoryRepository {
    fn commits(&self) -> Result<Vec<Commit>> {
        Ok(self.commits.clone())
    }

    fn tags(&self) -> Result<Vec<TagRef>> {
        Ok(self.tags.clone())
    }
}

/// Distinct 40-char id for `n < 256`; the first two digits identify it.
pub(crate) fn hash(n: u8) -> String {
    format!("{n:02x}{}", "e".repeat(38))
}

/// Midnight UTC, `n` days after 2020-01-01.
pub(crate) fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

pub(crate) fn commit(n: u8, date: DateTime<Utc>, message: &str) -> Commit {
    Commit {
        id: hash(n),
        date,
        message: message.to_string(),
    }
}

pub(crate) fn tag(name: &str, date: DateTime<Utc>) -> TagRef {
    TagRef {
        name: name.to_string(),
        date,
    }
}
