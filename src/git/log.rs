use super::parse::parse_log;
use crate::error::{GitpertError, Result};
use crate::model::Commit;
use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};

/// Flags that put `git log` output into the shape the parser expects.
pub const LOG_FLAGS: &[&str] = &[
    "--numstat",
    "--format=fuller",
    "--no-merges",
    "--no-decorate",
    "--no-color",
    "--date=iso8601-strict",
    "-w",
];

/// Optional narrowing of the history that gets scored.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub path: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}

impl LogQuery {
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["log".to_string()];
        args.extend(LOG_FLAGS.iter().map(|f| f.to_string()));
        if let Some(since) = &self.since {
            args.push(format!("--since={since}"));
        }
        if let Some(until) = &self.until {
            args.push(format!("--until={until}"));
        }
        if let Some(path) = &self.path {
            args.push("--".to_string());
            args.push(path.clone());
        }
        args
    }
}

/// Run `git log` in `repo` and parse its output as it streams in.
pub fn exec(repo: &Path, query: &LogQuery) -> Result<Vec<Commit>> {
    let args = query.args();
    tracing::info!(repo = %repo.display(), ?args, "running git");

    let mut child = Command::new("git")
        .args(&args)
        .current_dir(repo)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| GitpertError::Git(format!("could not run git: {e}")))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| GitpertError::Git("git stdout was not captured".to_string()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| GitpertError::Git("git stderr was not captured".to_string()))?;

    // Drain stderr concurrently so a chatty git cannot block on a full pipe.
    let stderr_reader = std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = stderr.read_to_string(&mut buf);
        buf
    });

    let parsed = parse_log(BufReader::new(stdout));
    if parsed.is_err() {
        let _ = child.kill();
    }
    let status = child.wait()?;
    let errors = stderr_reader.join().unwrap_or_default();

    let commits = parsed?;
    if !status.success() {
        return Err(GitpertError::Git(format!(
            "git log failed ({status}): {}",
            errors.trim()
        )));
    }
    if !errors.trim().is_empty() {
        tracing::warn!(stderr = %errors.trim(), "git log wrote to stderr");
    }

    Ok(commits)
}
