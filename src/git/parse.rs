use crate::error::{ParseError, ParseErrorReason, Result};
use crate::model::{Commit, Event, FileStat};
use chrono::{DateTime, FixedOffset};
use std::collections::{BTreeMap, HashSet};
use std::io::BufRead;

// Line prefixes of `git log --format=fuller` output.
const COMMIT: &str = "commit ";
const AUTHOR: &str = "Author: ";
const AUTHOR_DATE: &str = "AuthorDate: ";
const COMMITTER: &str = "Commit: ";
const COMMIT_DATE: &str = "CommitDate: ";

/// Parse `git log --numstat --format=fuller --date=iso8601-strict` output.
///
/// Commits come back in stream order, which for `git log` is newest first.
/// The first malformed line aborts the whole parse; no partial result is
/// ever returned. An empty stream yields an empty list.
pub fn parse_log<R: BufRead>(reader: R) -> Result<Vec<Commit>> {
    let mut commits = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut current: Option<CommitBuilder> = None;

    for (idx, raw) in reader.split(b'\n').enumerate() {
        let line = decode_line(&raw?);
        let line_number = idx + 1;
        let fail = |reason: ParseErrorReason| ParseError {
            line_number,
            line: line.clone(),
            reason,
        };

        if let Some(sha) = line.strip_prefix(COMMIT) {
            if let Some(done) = current.take() {
                commits.push(done.finish()?);
            }
            if !seen.insert(sha.to_string()) {
                return Err(fail(ParseErrorReason::DuplicateCommit(sha.to_string())).into());
            }
            current = Some(CommitBuilder::new(sha, line_number, &line));
            continue;
        }

        if line.starts_with(' ') || line.trim().is_empty() {
            // message body or separator
            continue;
        }

        let Some(builder) = current.as_mut() else {
            let kind = if line.starts_with(AUTHOR) || line.starts_with(AUTHOR_DATE) {
                "author"
            } else if line.starts_with(COMMITTER) || line.starts_with(COMMIT_DATE) {
                "committer"
            } else {
                "numstat"
            };
            return Err(fail(ParseErrorReason::OutsideCommit(kind)).into());
        };

        if let Some(rest) = line.strip_prefix(AUTHOR) {
            builder.author = Some(parse_identity(rest));
        } else if let Some(rest) = line.strip_prefix(AUTHOR_DATE) {
            builder.author_date = Some(parse_timestamp(rest).map_err(&fail)?);
        } else if let Some(rest) = line.strip_prefix(COMMITTER) {
            builder.committer = Some(parse_identity(rest));
        } else if let Some(rest) = line.strip_prefix(COMMIT_DATE) {
            builder.committer_date = Some(parse_timestamp(rest).map_err(&fail)?);
        } else {
            let (path, stat) = parse_numstat(&line).map_err(&fail)?;
            builder.stats.insert(path, stat);
        }
    }

    if let Some(done) = current.take() {
        commits.push(done.finish()?);
    }

    tracing::debug!(commits = commits.len(), "parsed git log");
    Ok(commits)
}

struct CommitBuilder {
    sha: String,
    line_number: usize,
    line: String,
    author: Option<(String, String)>,
    author_date: Option<DateTime<FixedOffset>>,
    committer: Option<(String, String)>,
    committer_date: Option<DateTime<FixedOffset>>,
    stats: BTreeMap<String, FileStat>,
}

impl CommitBuilder {
    fn new(sha: &str, line_number: usize, line: &str) -> Self {
        Self {
            sha: sha.to_string(),
            line_number,
            line: line.to_string(),
            author: None,
            author_date: None,
            committer: None,
            committer_date: None,
            stats: BTreeMap::new(),
        }
    }

    /// A record cut short by truncated input is rejected rather than
    /// folded into the ranking with missing fields.
    fn finish(self) -> std::result::Result<Commit, ParseError> {
        let missing = |header: &'static str| ParseError {
            line_number: self.line_number,
            line: self.line.clone(),
            reason: ParseErrorReason::IncompleteCommit {
                sha: self.sha.clone(),
                header,
            },
        };

        let (author_name, author_email) = self.author.clone().ok_or_else(|| missing("Author"))?;
        let author_date = self.author_date.ok_or_else(|| missing("AuthorDate"))?;
        let (committer_name, committer_email) =
            self.committer.clone().ok_or_else(|| missing("Commit"))?;
        let committer_date = self.committer_date.ok_or_else(|| missing("CommitDate"))?;

        Ok(Commit {
            sha: self.sha,
            author: Event {
                name: author_name,
                email: author_email,
                timestamp: author_date,
            },
            committer: Event {
                name: committer_name,
                email: committer_email,
                timestamp: committer_date,
            },
            stats: self.stats,
        })
    }
}

/// Author names from commits without an encoding header may not be UTF-8;
/// invalid bytes become U+FFFD instead of failing the run.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Split `"Jane Q. Doe <jane@example.com>"` into name and email. The email
/// is the last whitespace-separated token with its angle brackets removed.
fn parse_identity(s: &str) -> (String, String) {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    let email = tokens
        .pop()
        .unwrap_or("")
        .trim_matches(|c| c == '<' || c == '>')
        .to_string();
    let name = tokens.join(" ").trim().to_string();
    (name, email)
}

fn parse_timestamp(s: &str) -> std::result::Result<DateTime<FixedOffset>, ParseErrorReason> {
    DateTime::parse_from_rfc3339(s.trim())
        .map_err(|e| ParseErrorReason::InvalidTimestamp(format!("{s:?}: {e}")))
}

fn parse_numstat(line: &str) -> std::result::Result<(String, FileStat), ParseErrorReason> {
    let fields: Vec<&str> = line.splitn(3, '\t').collect();
    if fields.len() < 3 {
        return Err(ParseErrorReason::MissingFields(fields.len()));
    }
    let stat = FileStat {
        additions: parse_count(fields[0])?,
        deletions: parse_count(fields[1])?,
    };
    Ok((fields[2].to_string(), stat))
}

/// `-` marks a binary file and counts as zero. Counts are capped at `u32`
/// so per-author totals cannot overflow.
fn parse_count(field: &str) -> std::result::Result<u64, ParseErrorReason> {
    if field == "-" {
        return Ok(0);
    }
    field
        .parse::<u32>()
        .map(u64::from)
        .map_err(|_| ParseErrorReason::InvalidCount(field.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitpertError;
    use pretty_assertions::assert_eq;

    const TWO_COMMITS: &str = "\
commit 5a1f3c2d
Author:     Jane Q. Doe <jane@example.com>
AuthorDate: 2020-03-02T10:00:00-05:00
Commit:     GitHub <noreply@github.com>
CommitDate: 2020-03-02T15:30:00Z

    Add the widget

    Longer body text.

12\t3\tsrc/widget.rs
-\t-\tassets/logo.png

commit 9b8e7d6c
Author:     bob <bob@example.com>
AuthorDate: 2020-03-01T09:00:00+01:00
Commit:     bob <bob@example.com>
CommitDate: 2020-03-01T09:00:00+01:00

    Initial commit

1\t0\tREADME.md
";

    fn parse_str(input: &str) -> Result<Vec<Commit>> {
        parse_log(input.as_bytes())
    }

    fn parse_err(input: &str) -> ParseError {
        match parse_str(input) {
            Err(GitpertError::Parse(e)) => e,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn parses_fuller_numstat_output() {
        let commits = parse_str(TWO_COMMITS).unwrap();
        assert_eq!(commits.len(), 2);

        let first = &commits[0];
        assert_eq!(first.sha, "5a1f3c2d");
        assert_eq!(first.author.name, "Jane Q. Doe");
        assert_eq!(first.author.email, "jane@example.com");
        assert_eq!(first.author.timestamp.to_rfc3339(), "2020-03-02T10:00:00-05:00");
        assert_eq!(first.committer.name, "GitHub");
        assert_eq!(first.committer.email, "noreply@github.com");
        assert_eq!(first.committer.timestamp.to_rfc3339(), "2020-03-02T15:30:00+00:00");
        assert_eq!(
            first.stats.get("src/widget.rs"),
            Some(&FileStat { additions: 12, deletions: 3 })
        );
        assert_eq!(first.stats.get("assets/logo.png"), Some(&FileStat::default()));

        assert_eq!(commits[1].sha, "9b8e7d6c");
        assert_eq!(commits[1].stats.len(), 1);
    }

    #[test]
    fn empty_stream_yields_no_commits() {
        assert!(parse_str("").unwrap().is_empty());
        assert!(parse_str("\n\n").unwrap().is_empty());
    }

    #[test]
    fn commit_without_file_changes_is_kept() {
        let input = "\
commit abc
Author: A <a@x>
AuthorDate: 2021-01-01T00:00:00Z
Commit: A <a@x>
CommitDate: 2021-01-01T00:00:00Z

    empty
";
        let commits = parse_str(input).unwrap();
        assert_eq!(commits.len(), 1);
        assert!(commits[0].stats.is_empty());
    }

    #[test]
    fn numstat_path_is_kept_verbatim() {
        let input = "\
commit abc
Author: A <a@x>
AuthorDate: 2021-01-01T00:00:00Z
Commit: A <a@x>
CommitDate: 2021-01-01T00:00:00Z

4\t1\tsrc/{old => new}/mod.rs
2\t2\tweird\tname.txt
";
        let commits = parse_str(input).unwrap();
        let paths: Vec<&str> = commits[0].stats.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["src/{old => new}/mod.rs", "weird\tname.txt"]);
    }

    #[test]
    fn identity_without_name_keeps_email() {
        assert_eq!(parse_identity("<solo@x>"), (String::new(), "solo@x".to_string()));
        assert_eq!(
            parse_identity("  Mary   Ann  <ma@x>"),
            ("Mary Ann".to_string(), "ma@x".to_string())
        );
    }

    #[test]
    fn two_field_numstat_line_fails_whole_parse() {
        let input = TWO_COMMITS.replace("1\t0\tREADME.md", "1\t0");
        let err = parse_err(&input);
        assert_eq!(err.reason, ParseErrorReason::MissingFields(2));
        assert_eq!(err.line, "1\t0");
    }

    #[test]
    fn malformed_timestamp_is_fatal() {
        let input = TWO_COMMITS.replace("2020-03-01T09:00:00+01:00", "Sun Mar 1 09:00 2020");
        let err = parse_err(&input);
        assert!(matches!(err.reason, ParseErrorReason::InvalidTimestamp(_)));
        assert_eq!(err.line_number, 16);
    }

    #[test]
    fn non_numeric_count_is_rejected() {
        let input = TWO_COMMITS.replace("12\t3\t", "12\tx\t");
        let err = parse_err(&input);
        assert_eq!(err.reason, ParseErrorReason::InvalidCount("x".to_string()));
    }

    #[test]
    fn out_of_range_count_is_rejected() {
        let input = TWO_COMMITS.replace("1\t0\tREADME.md", "18446744073709551615\t1\tbig.txt");
        let err = parse_err(&input);
        assert_eq!(
            err.reason,
            ParseErrorReason::InvalidCount("18446744073709551615".to_string())
        );
        assert_eq!(err.line_number, 22);
    }

    #[test]
    fn largest_accepted_counts_still_add_up() {
        let max = u32::MAX.to_string();
        let input = TWO_COMMITS.replace("1\t0\tREADME.md", &format!("{max}\t{max}\tbig.txt"));
        let commits = parse_str(&input).unwrap();
        assert_eq!(commits[1].stats["big.txt"].lines_changed(), 2 * u32::MAX as u64);
    }

    #[test]
    fn non_utf8_author_is_decoded_lossily() {
        let mut input: Vec<u8> = Vec::new();
        input.extend_from_slice(b"commit abc\r\nAuthor: Jos\xe9 Garc\xeda <j@x>\n");
        input.extend_from_slice(b"AuthorDate: 2021-01-01T00:00:00Z\n");
        input.extend_from_slice(b"Commit: A <a@x>\nCommitDate: 2021-01-01T00:00:00Z\n\n");
        input.extend_from_slice(b"2\t1\tsrc/caf\xe9.rs\n");

        let commits = parse_log(input.as_slice()).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].sha, "abc");
        assert_eq!(commits[0].author.name, "Jos\u{FFFD} Garc\u{FFFD}a");
        assert_eq!(commits[0].author.email, "j@x");
        assert_eq!(commits[0].stats["src/caf\u{FFFD}.rs"].lines_changed(), 3);
    }

    #[test]
    fn numstat_before_first_commit_is_rejected() {
        let err = parse_err("3\t1\tsrc/lib.rs\n");
        assert_eq!(err.reason, ParseErrorReason::OutsideCommit("numstat"));
        assert_eq!(err.line_number, 1);
    }

    #[test]
    fn truncated_record_is_rejected() {
        let input = "\
commit abc
Author: A <a@x>
AuthorDate: 2021-01-01T00:00:00Z
";
        let err = parse_err(input);
        assert_eq!(
            err.reason,
            ParseErrorReason::IncompleteCommit {
                sha: "abc".to_string(),
                header: "Commit",
            }
        );
    }

    #[test]
    fn duplicate_sha_is_rejected() {
        let record = "\
commit abc
Author: A <a@x>
AuthorDate: 2021-01-01T00:00:00Z
Commit: A <a@x>
CommitDate: 2021-01-01T00:00:00Z
";
        let err = parse_err(&format!("{record}{record}"));
        assert_eq!(err.reason, ParseErrorReason::DuplicateCommit("abc".to_string()));
        assert_eq!(err.line_number, 6);
    }
}
