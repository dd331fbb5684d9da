pub mod cli;
pub mod error;
pub mod git;
pub mod model;
pub mod rank;
pub mod score;
pub mod util;
pub mod vendor;

pub use error::{GitpertError, ParseError, Result};
pub use git::parse_log;
pub use model::{AuthorAggregate, Commit, Event, FileStat};
pub use score::{author_aggregates, Anchor, DecayPeriod, ScoreOptions};
pub use vendor::{VendorClassifier, VendorPaths};
