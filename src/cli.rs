use anyhow::Result;
use clap::{Args, Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gitpert")]
#[command(about = "Rank committers by the recency-weighted impact of their changes")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[clap(flatten)]
    pub score: ScoreArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity (-v info, -vv debug)")]
    pub verbose: u8,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(help = "Repository path, or clone URL with --remote (defaults to the current directory)")]
    pub repo: Option<String>,

    #[arg(help = "Only score commits touching this file")]
    pub file: Option<String>,

    #[arg(short, long, help = "Treat REPO as a remote URL and clone it to a temporary directory")]
    pub remote: bool,

    #[arg(long, help = "Only commits more recent than this date (passed to git log)")]
    pub since: Option<String>,

    #[arg(long, help = "Only commits older than this date (passed to git log)")]
    pub until: Option<String>,
}

#[derive(Args, Clone)]
pub struct ScoreArgs {
    #[arg(
        short = 'd',
        long = "decay-rate",
        default_value_t = 30,
        allow_negative_numbers = true,
        help = "Days it takes for the impact of a commit to halve, based on how recently it was made"
    )]
    pub decay_days: i64,

    #[arg(long, value_enum, default_value_t = AnchorArg::Latest, help = "Reference time commit ages are measured from")]
    pub anchor: AnchorArg,

    #[arg(long = "exclude", value_name = "GLOB", help = "Extra gitignore-style paths to ignore (repeatable)")]
    pub exclude: Vec<String>,

    #[arg(long, help = "Do not ignore well-known vendored paths")]
    pub no_vendor: bool,
}

#[derive(Args, Clone)]
pub struct OutputArgs {
    #[arg(short = 'n', long, default_value_t = 10, help = "Number of authors shown in the table")]
    pub top: usize,

    #[arg(long, conflicts_with = "ndjson", help = "Output as JSON")]
    pub json: bool,

    #[arg(long, help = "Output as NDJSON")]
    pub ndjson: bool,
}

impl OutputArgs {
    pub fn machine_readable(&self) -> bool {
        self.json || self.ndjson
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorArg {
    /// Age is measured from the newest commit in the history
    Latest,
    /// Age is measured from the current wall-clock time
    Now,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        init_tracing(self.verbose);
        crate::rank::exec(self)
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
