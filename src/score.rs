use crate::error::{GitpertError, Result};
use crate::model::{AuthorAggregate, Commit};
use crate::vendor::VendorClassifier;
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Half-life of a commit's contribution, in whole days. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecayPeriod(u32);

impl DecayPeriod {
    pub fn from_days(days: i64) -> Result<Self> {
        if days <= 0 {
            return Err(GitpertError::Config(format!(
                "decay period must be a positive number of days, got {days}"
            )));
        }
        u32::try_from(days)
            .map(Self)
            .map_err(|_| GitpertError::Config(format!("decay period of {days} days is too large")))
    }

    pub fn days(&self) -> u32 {
        self.0
    }

    pub fn hours(&self) -> f64 {
        24.0 * self.0 as f64
    }
}

impl Default for DecayPeriod {
    fn default() -> Self {
        Self(30)
    }
}

/// The instant a commit's age is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Authoring time of the first (newest) commit in the input.
    #[default]
    LatestCommit,
    /// A fixed instant, usually the wall clock when the tool was started.
    At(DateTime<FixedOffset>),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreOptions {
    pub decay: DecayPeriod,
    pub anchor: Anchor,
}

impl ScoreOptions {
    pub fn new(decay: DecayPeriod) -> Self {
        Self {
            decay,
            anchor: Anchor::LatestCommit,
        }
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Resolve the reference time against a concrete commit list.
    pub fn reference_time(&self, commits: &[Commit]) -> Option<DateTime<FixedOffset>> {
        match self.anchor {
            Anchor::LatestCommit => commits.first().map(|c| c.author.timestamp),
            Anchor::At(at) => Some(at),
        }
    }
}

/// Weight of a change made `hours_ago` hours before the reference time:
/// 1.0 at the reference, halving every decay period.
pub fn decay_weight(hours_ago: f64, decay: DecayPeriod) -> f64 {
    (-hours_ago / decay.hours()).exp2()
}

/// Fold newest-first commits into one aggregate per author email, ranked by
/// descending score. Equal scores keep the order in which emails first
/// appeared, so identical input always ranks identically.
///
/// Vendor files add nothing to impact or score, but their commit is still
/// counted.
pub fn author_aggregates<V>(commits: &[Commit], options: &ScoreOptions, vendor: &V) -> Vec<AuthorAggregate>
where
    V: VendorClassifier + ?Sized,
{
    let Some(reference) = options.reference_time(commits) else {
        return Vec::new();
    };

    let mut authors: Vec<AuthorAggregate> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for commit in commits {
        let email = commit.author.email.as_str();
        let slot = *index.entry(email).or_insert_with(|| {
            authors.push(AuthorAggregate::new(
                email.to_string(),
                commit.author.name.clone(),
            ));
            authors.len() - 1
        });
        let agg = &mut authors[slot];

        let lines: u64 = commit
            .stats
            .iter()
            .filter(|(path, _)| !vendor.is_vendor(path))
            .map(|(_, stat)| stat.lines_changed())
            .fold(0u64, u64::saturating_add);

        let hours_ago =
            (reference - commit.author.timestamp).num_milliseconds() as f64 / MILLIS_PER_HOUR;

        agg.commit_count += 1;
        agg.impact = agg.impact.saturating_add(lines);
        agg.score += lines as f64 * decay_weight(hours_ago, options.decay);
    }

    // sort_by is stable
    authors.sort_by(|a, b| b.score.total_cmp(&a.score));

    tracing::debug!(
        commits = commits.len(),
        authors = authors.len(),
        decay_days = options.decay.days(),
        "scored authors"
    );
    authors
}
