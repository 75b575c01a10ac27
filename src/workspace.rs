//! Per-request scratch directory
//!
//! A `Workspace` owns one freshly created directory. It is removed either by
//! `release()` or, on any path that skips it (early return, panic, dropped
//! request future), by `Drop`. `release()` consumes the workspace, so removal
//! happens exactly once.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs;
use tracing::debug;

const WORKSPACE_PREFIX: &str = "exec-";

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create an empty, uniquely named directory under `root`
    /// (or the system temp dir when `root` is `None`)
    pub fn acquire(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        debug!("Acquired workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `file_name` inside the workspace, returning the full path
    pub async fn write_file(&self, file_name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(file_name);
        fs::write(&path, contents).await?;
        Ok(path)
    }

    /// Recursively delete the directory and everything written into it
    pub fn release(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!("Released workspace {}", path.display());
        Ok(())
    }
}
