use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 1;

/// The who and when of a commit, either its authoring or its committing side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub email: String,
    pub timestamp: DateTime<FixedOffset>,
}

/// Line counts for one file in one commit. Binary changes count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub additions: u64,
    pub deletions: u64,
}

impl FileStat {
    pub fn lines_changed(&self) -> u64 {
        self.additions.saturating_add(self.deletions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub author: Event,
    pub committer: Event,
    /// Keyed by path relative to the repository root, verbatim from numstat.
    pub stats: BTreeMap<String, FileStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorAggregate {
    pub email: String,
    pub name: String,
    pub commit_count: u32,
    pub impact: u64,
    pub score: f64,
}

impl AuthorAggregate {
    pub fn new(email: String, name: String) -> Self {
        Self {
            email,
            name,
            commit_count: 0,
            impact: 0,
            score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedAuthor {
    pub rank: usize,
    #[serde(flatten)]
    pub author: AuthorAggregate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository: String,
    pub path: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub decay_days: u32,
    pub anchor: Option<DateTime<FixedOffset>>,
    pub commit_count: usize,
    pub authors: Vec<RankedAuthor>,
}

pub fn ranked(authors: &[AuthorAggregate]) -> Vec<RankedAuthor> {
    authors
        .iter()
        .enumerate()
        .map(|(i, author)| RankedAuthor {
            rank: i + 1,
            author: author.clone(),
        })
        .collect()
}
