pub(crate) mod markdown;
pub(crate) mod mdbook;
pub(crate) mod toc;

// -------------------------------------------------------------------------------------------------

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use tempdir::TempDir;

use crate::{collector::BuildBundle, error::Error};

pub use markdown::MarkdownBackend;
pub use mdbook::{book_config, BookInfo, MdBookBackend};

// -------------------------------------------------------------------------------------------------

/// Writes a collected [`BuildBundle`] to disk in some output format.
pub trait Backend {
    /// Name of the backend, as used in the config's plugin list.
    fn name(&self) -> &str;

    /// Write the bundle below the given output root.
    fn write(&self, bundle: &BuildBundle, root: &Path) -> Result<(), Error>;
}

// -------------------------------------------------------------------------------------------------

const STAGING_PREFIX: &str = ".nodebook-staging";
const PREVIOUS_PREFIX: &str = ".nodebook-previous";

/// Builds the complete new content of a target directory in a hidden sibling directory and
/// swaps it with the target on [`Staging::commit`]. Dropping an uncommitted staging area removes
/// everything written so far and leaves the target untouched.
pub struct Staging {
    dir: TempDir,
    target: PathBuf,
    files: HashSet<PathBuf>,
}

impl Staging {
    pub fn new(target: &Path) -> Result<Self, Error> {
        fs::create_dir_all(target)?;
        let target = fs::canonicalize(target)?;
        let parent = target
            .parent()
            .ok_or_else(|| Error::Output(format!("can't replace '{}'", target.display())))?;
        let dir = TempDir::new_in(parent, STAGING_PREFIX)?;
        Ok(Self {
            dir,
            target,
            files: HashSet::new(),
        })
    }

    /// Read a file of a previous run from the target directory.
    pub fn read_existing(&self, relative_path: impl AsRef<Path>) -> Result<Option<String>, Error> {
        let path = self.target.join(relative_path);
        if path.is_file() {
            Ok(Some(fs::read_to_string(path)?))
        } else {
            Ok(None)
        }
    }

    /// Stage a file at the given path, relative to the target directory. Each path can only be
    /// staged once.
    pub fn write(
        &mut self,
        relative_path: impl AsRef<Path>,
        content: impl AsRef<[u8]>,
    ) -> Result<(), Error> {
        let relative_path = relative_path.as_ref();
        if !self.files.insert(relative_path.to_path_buf()) {
            return Err(Error::DuplicateFile(relative_path.to_path_buf()));
        }
        let path = self.dir.path().join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(())
    }

    /// Replace the target directory with the staged files. Without `clean`, files of the target
    /// which were not staged are kept.
    ///
    /// The old target is moved aside before the staged directory is moved into its place, and
    /// is restored if that fails, so the target never holds a mix of old and new files.
    pub fn commit(self, clean: bool) -> Result<(), Error> {
        if !clean {
            keep_unstaged(&self.target, self.dir.path())?;
        }
        let parent = self.dir.path().parent().unwrap_or(Path::new("."));
        let previous = TempDir::new_in(parent, PREVIOUS_PREFIX)?;
        let moved_aside = previous.path().join("target");
        tracing::debug!("Moving '{}' aside", self.target.display());
        fs::rename(&self.target, &moved_aside)?;

        let staged = self.dir.into_path();
        tracing::debug!("Moving staged files to '{}'", self.target.display());
        if let Err(err) = fs::rename(&staged, &self.target) {
            if let Err(restore_err) = fs::rename(&moved_aside, &self.target) {
                tracing::error!(
                    "Failed to restore '{}' from '{}': {restore_err}",
                    self.target.display(),
                    moved_aside.display()
                );
                // leave the moved aside content for manual recovery
                let _ = previous.into_path();
            }
            let _ = fs::remove_dir_all(&staged);
            return Err(err.into());
        }
        if let Err(err) = previous.close() {
            tracing::warn!("Failed to remove the previous output: {err}");
        }
        Ok(())
    }
}

/// Copy all files of `target` which have no staged counterpart into `staging`.
fn keep_unstaged(target: &Path, staging: &Path) -> Result<(), Error> {
    for entry in fs::read_dir(target)? {
        let entry = entry?;
        let source = entry.path();
        let staged = staging.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            if staged.is_file() {
                continue;
            }
            fs::create_dir_all(&staged)?;
            keep_unstaged(&source, &staged)?;
        } else if !staged.exists() {
            fs::copy(&source, &staged)?;
        }
    }
    Ok(())
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn names(dir: &Path) -> Vec<String> {
        let mut names = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    #[test]
    fn clean_commit_replaces_the_target() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("out");
        fs::create_dir_all(target.join("old")).unwrap();
        fs::write(target.join("stale.md"), "old").unwrap();
        fs::write(target.join("a.md"), "old A").unwrap();

        let mut staging = Staging::new(&target).unwrap();
        staging.write("a.md", "A").unwrap();
        staging.write("sub/b.md", "B").unwrap();
        assert_eq!(fs::read_to_string(target.join("a.md")).unwrap(), "old A");
        assert_eq!(staging.read_existing("a.md").unwrap().as_deref(), Some("old A"));

        staging.commit(true).unwrap();
        assert_eq!(names(&target), vec!["a.md", "sub"]);
        assert_eq!(fs::read_to_string(target.join("a.md")).unwrap(), "A");
        assert_eq!(fs::read_to_string(target.join("sub/b.md")).unwrap(), "B");
        // no staging or moved aside directories remain
        assert_eq!(names(root.path()), vec!["out"]);
    }

    #[test]
    fn commit_without_clean_keeps_unstaged_files() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("book");
        fs::create_dir_all(target.join("src")).unwrap();
        fs::write(target.join("src/manual.md"), "manual").unwrap();
        fs::write(target.join("src/SUMMARY.md"), "old summary").unwrap();
        fs::write(target.join("custom.css"), "css").unwrap();

        let mut staging = Staging::new(&target).unwrap();
        staging.write("src/SUMMARY.md", "new summary").unwrap();
        staging.write("src/page.md", "page").unwrap();
        staging.commit(false).unwrap();

        assert_eq!(names(&target), vec!["custom.css", "src"]);
        assert_eq!(names(&target.join("src")), vec!["SUMMARY.md", "manual.md", "page.md"]);
        assert_eq!(
            fs::read_to_string(target.join("src/SUMMARY.md")).unwrap(),
            "new summary"
        );
        assert_eq!(fs::read_to_string(target.join("src/manual.md")).unwrap(), "manual");
        assert_eq!(names(root.path()), vec!["book"]);
    }

    #[test]
    fn files_can_only_be_staged_once() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("out");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("intro.md"), "old").unwrap();

        let mut staging = Staging::new(&target).unwrap();
        staging.write("intro.md", "A").unwrap();
        assert!(matches!(
            staging.write("intro.md", "B"),
            Err(Error::DuplicateFile(path)) if path == Path::new("intro.md")
        ));
        drop(staging);
        assert_eq!(names(&target), vec!["intro.md"]);
        assert_eq!(fs::read_to_string(target.join("intro.md")).unwrap(), "old");
    }

    #[test]
    fn dropped_staging_leaves_nothing() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("out");
        let mut staging = Staging::new(&target).unwrap();
        staging.write("a.md", "A").unwrap();
        assert_eq!(staging.read_existing("a.md").unwrap(), None);
        drop(staging);
        assert_eq!(names(root.path()), vec!["out"]);
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }
}
