use crate::error::Result;
use crate::util::spinner;
use gix::discover;
use gix::progress::Discard;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

/// A working copy to read history from. Remote clones live in a temporary
/// directory that is removed when the `GitRepo` is dropped.
pub struct GitRepo {
    path: PathBuf,
    _clone_dir: Option<TempDir>,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = match path {
            Some(p) => p.as_ref().to_path_buf(),
            None => std::env::current_dir()?,
        };

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        tracing::debug!(path = %path.display(), "opened repository");

        Ok(Self {
            path,
            _clone_dir: None,
        })
    }

    /// Clone `url` into a fresh temporary directory.
    pub fn clone_remote(url: &str, progress: bool) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("gitpert_remote_repo")
            .tempdir()?;

        let pb = spinner(progress, "Cloning repository...");
        tracing::info!(url, dir = %dir.path().display(), "cloning");
        let interrupt = AtomicBool::new(false);

        let mut prepare = gix::prepare_clone(url, dir.path())?;
        let (mut checkout, _) = prepare.fetch_then_checkout(Discard, &interrupt)?;
        let (repo, _) = checkout.main_worktree(Discard, &interrupt)?;
        pb.finish_and_clear();

        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        Ok(Self {
            path,
            _clone_dir: Some(dir),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
