pub mod log;
pub mod parse;
pub mod repo;

pub use self::log::{exec as run_log, LogQuery};
pub use parse::parse_log;
pub use repo::GitRepo;
