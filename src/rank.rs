use crate::cli::{AnchorArg, Cli};
use crate::git::{run_log, GitRepo, LogQuery};
use crate::model::{ranked, AuthorAggregate, RankingOutput, SCHEMA_VERSION};
use crate::score::{author_aggregates, Anchor, DecayPeriod, ScoreOptions};
use crate::util::{spinner, truncate};
use crate::vendor::VendorPaths;
use anyhow::{anyhow, Context};
use chrono::Utc;
use console::style;

pub fn exec(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        common,
        score,
        output,
        ..
    } = cli;

    let decay = DecayPeriod::from_days(score.decay_days).context("Invalid --decay-rate")?;
    let anchor = match score.anchor {
        AnchorArg::Latest => Anchor::LatestCommit,
        AnchorArg::Now => Anchor::At(Utc::now().fixed_offset()),
    };
    let vendor = VendorPaths::new(!score.no_vendor, &score.exclude)
        .context("Failed to build vendor path filter")?;
    let progress = !output.machine_readable();

    let repo = if common.remote {
        let url = common
            .repo
            .as_deref()
            .ok_or_else(|| anyhow!("--remote requires a repository URL"))?;
        GitRepo::clone_remote(url, progress).context("Failed to clone remote repository")?
    } else {
        GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?
    };
    let repository = if common.remote {
        common.repo.clone().unwrap_or_default()
    } else {
        repo.path().to_string_lossy().to_string()
    };

    let query = LogQuery {
        path: common.file.clone(),
        since: common.since.clone(),
        until: common.until.clone(),
    };
    let pb = spinner(progress, "Reading commit history...");
    let commits = run_log(repo.path(), &query);
    pb.finish_and_clear();
    let commits = commits.context("Failed to read commit history")?;

    let options = ScoreOptions::new(decay).with_anchor(anchor);
    let authors = author_aggregates(&commits, &options, &vendor);

    if output.json {
        let out = RankingOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository,
            path: common.file,
            since: common.since,
            until: common.until,
            decay_days: decay.days(),
            anchor: options.reference_time(&commits),
            commit_count: commits.len(),
            authors: ranked(&authors),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if output.ndjson {
        output_ndjson(&authors)?;
    } else {
        output_table(&authors, output.top);
    }

    Ok(())
}

fn output_ndjson(authors: &[AuthorAggregate]) -> anyhow::Result<()> {
    for entry in ranked(authors) {
        println!("{}", serde_json::to_string(&entry)?);
    }
    Ok(())
}

fn output_table(authors: &[AuthorAggregate], top: usize) {
    if authors.is_empty() {
        println!("No commits to rank");
        return;
    }

    println!(
        "{:>4}   {:<40} {:<30} {:>8} {:>8} {:>7}",
        style("Rank").bold(),
        style("Email").bold(),
        style("Name").bold(),
        style("Score").bold(),
        style("Impact").bold(),
        style("Commits").bold()
    );
    println!("{}", "─".repeat(104));
    for (i, a) in authors.iter().take(top).enumerate() {
        println!(
            "{:>4}   {:<40} {:<30} {:>8} {:>8} {:>7}",
            i + 1,
            truncate(&a.email, 40),
            truncate(&a.name, 30),
            style(a.score.round() as i64).cyan(),
            a.impact,
            a.commit_count
        );
    }
    if authors.len() > top {
        println!("\n... and {} more authors", authors.len() - top);
    }
}
