use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitpertError>;

#[derive(Error, Debug)]
pub enum GitpertError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Git error: {0}")]
    Git(String),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
    #[error("Clone error: {0}")]
    Clone(#[from] Box<gix::clone::Error>),
    #[error("Clone fetch error: {0}")]
    CloneFetch(#[from] Box<gix::clone::fetch::Error>),
    #[error("Checkout error: {0}")]
    Checkout(#[from] Box<gix::clone::checkout::main_worktree::Error>),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<gix::discover::Error> for GitpertError {
    fn from(err: gix::discover::Error) -> Self {
        GitpertError::GitDiscover(Box::new(err))
    }
}

impl From<gix::clone::Error> for GitpertError {
    fn from(err: gix::clone::Error) -> Self {
        GitpertError::Clone(Box::new(err))
    }
}

impl From<gix::clone::fetch::Error> for GitpertError {
    fn from(err: gix::clone::fetch::Error) -> Self {
        GitpertError::CloneFetch(Box::new(err))
    }
}

impl From<gix::clone::checkout::main_worktree::Error> for GitpertError {
    fn from(err: gix::clone::checkout::main_worktree::Error) -> Self {
        GitpertError::Checkout(Box::new(err))
    }
}

/// A log line the parser could not accept. Line numbers are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line_number}: {reason} ({line:?})")]
pub struct ParseError {
    pub line_number: usize,
    pub line: String,
    pub reason: ParseErrorReason,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorReason {
    #[error("{0} line outside of a commit record")]
    OutsideCommit(&'static str),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("numstat line needs 3 tab-separated fields, found {0}")]
    MissingFields(usize),
    #[error("invalid line count {0:?}")]
    InvalidCount(String),
    #[error("commit {sha} is missing its {header} header")]
    IncompleteCommit { sha: String, header: &'static str },
    #[error("duplicate commit {0}")]
    DuplicateCommit(String),
}
