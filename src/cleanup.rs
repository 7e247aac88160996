use std::path::PathBuf;

use tempdir::TempDir;

// -------------------------------------------------------------------------------------------------

/// Owns the temporary artifacts created during a run and removes them again.
///
/// [`Cleanup::run`] only touches what got tracked here and can be called any number of times.
/// It also runs when the cleanup is dropped, so early returns can't leak temp files.
#[derive(Default)]
pub struct Cleanup {
    dirs: Vec<TempDir>,
}

impl Cleanup {
    /// Take ownership of a temporary directory and return its path.
    pub fn track_dir(&mut self, dir: TempDir) -> PathBuf {
        let path = dir.path().to_path_buf();
        tracing::debug!("Created temporary directory '{}'", path.display());
        self.dirs.push(dir);
        path
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Remove all tracked artifacts.
    pub fn run(&mut self) {
        for dir in self.dirs.drain(..) {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => tracing::debug!("Removed temporary directory '{}'", path.display()),
                Err(err) => tracing::warn!(
                    "Failed to remove temporary directory '{}': {err}",
                    path.display()
                ),
            }
        }
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        self.run();
    }
}

// -------------------------------------------------------------------------------------------------
