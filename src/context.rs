pub(crate) mod git;
pub(crate) mod hosting;
pub(crate) mod manifest;

// -------------------------------------------------------------------------------------------------

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use serde::Serialize;
use tempdir::TempDir;
use url::Url;

use crate::{cleanup::Cleanup, config::BuildSettings, error::Error};

pub use git::{Commit, Contributor, GitSummary};
pub use hosting::{GithubApi, HostingApi, HostingInfo, RepoSlug};
pub use manifest::{ManifestKind, PackageMetadata};

// -------------------------------------------------------------------------------------------------

/// Well known project files which are made available to templates and build routines.
const PROJECT_FILES: [&str; 8] = [
    "README.md",
    "CHANGELOG.md",
    "CONTRIBUTING.md",
    "CODE_OF_CONDUCT.md",
    "LICENSE",
    "LICENSE.md",
    "LICENSE-MIT",
    "LICENSE-APACHE",
];

/// Everything known about the documented project. Assembled once per run, read-only afterwards.
#[derive(Clone, Debug, Serialize)]
pub struct Context {
    /// Root directory of the (local or cloned) repository.
    pub root: PathBuf,
    pub metadata: PackageMetadata,
    /// Contents of well known project files, keyed by file name.
    pub project_files: BTreeMap<String, String>,
    pub git: GitSummary,
    pub hosting: HostingInfo,
}

impl Context {
    /// Gather package, project file, version control and hosting metadata of the repository at
    /// `root`. Hosting API failures are logged and result in a degraded [`HostingInfo`].
    pub fn assemble(
        root: &Path,
        settings: &BuildSettings,
        api: Option<&dyn HostingApi>,
    ) -> Result<Self, Error> {
        tracing::info!("Assembling context for '{}'", root.display());
        let metadata = manifest::discover(root, settings.manifest.as_deref())?;
        let project_files = read_project_files(root)?;
        let git = git::summarize(root, settings.clone_depth as usize);

        let slug = metadata
            .repository_url
            .as_deref()
            .and_then(RepoSlug::from_url)
            .or_else(|| git.remote_url.as_deref().and_then(RepoSlug::from_url));
        let hosting = match (api, slug) {
            (Some(api), Some(slug)) => api.fetch(&slug).unwrap_or_else(|err| {
                tracing::warn!("Continuing without hosting metadata: {err}");
                HostingInfo::unavailable(Some(slug))
            }),
            (None, slug) => HostingInfo::unavailable(slug),
            (Some(_), None) => {
                tracing::debug!("Repository is not hosted on GitHub, skipping hosting metadata");
                HostingInfo::default()
            }
        };

        Ok(Self {
            root: root.to_path_buf(),
            metadata,
            project_files,
            git,
            hosting,
        })
    }

    /// Web URL of the repository, if known.
    pub fn repository_url(&self) -> Option<String> {
        self.metadata
            .repository_url
            .as_deref()
            .and_then(RepoSlug::from_url)
            .or_else(|| self.hosting.slug.clone())
            .map(|slug| slug.web_url())
            .or_else(|| self.metadata.repository_url.clone())
    }

    /// Branch used for links into the repository.
    pub fn branch(&self) -> &str {
        self.hosting
            .default_branch
            .as_deref()
            .or(self.git.branch.as_deref())
            .unwrap_or("main")
    }
}

fn read_project_files(root: &Path) -> Result<BTreeMap<String, String>, Error> {
    let mut files = BTreeMap::new();
    for name in PROJECT_FILES {
        let path = root.join(name);
        if path.is_file() {
            tracing::debug!("Reading project file '{}'", path.display());
            files.insert(name.to_string(), fs::read_to_string(path)?);
        }
    }
    Ok(files)
}

// -------------------------------------------------------------------------------------------------

/// Returns true when the given repository path is a remote git URL which needs to be cloned.
pub fn is_remote(repo_path: &str) -> bool {
    static SCP_LIKE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[\w.-]+@[\w.-]+:[^/\\]").expect("invalid scp url regex")
    });
    match Url::parse(repo_path) {
        Ok(url) => matches!(url.scheme(), "http" | "https" | "ssh" | "git"),
        Err(_) => SCP_LIKE.is_match(repo_path),
    }
}

/// Resolve the repository to a local directory, cloning remote repositories into a temporary
/// directory which is owned by the given cleanup.
pub fn resolve_source(
    repo_path: &str,
    clone_depth: u32,
    cleanup: &mut Cleanup,
) -> Result<PathBuf, Error> {
    if is_remote(repo_path) {
        let target = cleanup.track_dir(TempDir::new("nodebook-repo")?);
        git::clone(repo_path, clone_depth, &target)?;
        Ok(target)
    } else {
        let path = PathBuf::from(repo_path);
        if !path.is_dir() {
            return Err(Error::config(format!(
                "repository path does not exist: `{}`",
                path.display()
            )));
        }
        Ok(path)
    }
}

// -------------------------------------------------------------------------------------------------

/// A small in-memory context for unit tests.
#[cfg(test)]
pub(crate) fn test_context() -> Context {
    Context {
        root: PathBuf::from("."),
        metadata: PackageMetadata {
            name: "demo".to_string(),
            description: "A demo".to_string(),
            ..PackageMetadata::default()
        },
        project_files: BTreeMap::from([("README.md".to_string(), "# Readme".to_string())]),
        git: GitSummary::default(),
        hosting: HostingInfo::default(),
    }
}
