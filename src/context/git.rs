use std::{path::Path, process::Command};

use itertools::Itertools;
use serde::Serialize;

use crate::error::Error;

// -------------------------------------------------------------------------------------------------

/// A single commit of the repository history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    pub email: String,
    /// Author date in strict ISO 8601 format.
    pub date: String,
    pub summary: String,
}

/// Someone who authored commits in the summarized history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub name: String,
    pub email: String,
    pub commits: usize,
}

/// Version control summary of a repository. Empty when the repository is not a git checkout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GitSummary {
    pub branch: Option<String>,
    pub remote_url: Option<String>,
    /// Most recent commits first.
    pub commits: Vec<Commit>,
    /// Sorted by number of commits, most active first.
    pub contributors: Vec<Contributor>,
}

// -------------------------------------------------------------------------------------------------

const FIELD_SEPARATOR: char = '\x1f';
const LOG_FORMAT: &str = "--format=%H%x1f%an%x1f%ae%x1f%aI%x1f%s";

/// Summarize the git history of the repository at `root`, using at most `max_commits` commits.
///
/// Missing git executables or non-git directories result in an empty summary.
pub fn summarize(root: &Path, max_commits: usize) -> GitSummary {
    match try_summarize(root, max_commits) {
        Ok(summary) => summary,
        Err(err) => {
            tracing::warn!("No version control information available: {err}");
            GitSummary::default()
        }
    }
}

fn try_summarize(root: &Path, max_commits: usize) -> Result<GitSummary, Error> {
    let log = run_git(
        root,
        &["log", &format!("--max-count={max_commits}"), LOG_FORMAT],
    )?;
    let commits = parse_log(&log);
    let contributors = contributors(&commits);
    let branch = run_git(root, &["rev-parse", "--abbrev-ref", "HEAD"])
        .ok()
        .map(|branch| branch.trim().to_string())
        .filter(|branch| !branch.is_empty() && branch != "HEAD");
    let remote_url = run_git(root, &["remote", "get-url", "origin"])
        .ok()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());
    tracing::debug!(
        commits = commits.len(),
        contributors = contributors.len(),
        "Summarized git history"
    );
    Ok(GitSummary {
        branch,
        remote_url,
        commits,
        contributors,
    })
}

/// Shallow clone a remote repository into the (existing, empty) `target` directory.
pub fn clone(url: &str, depth: u32, target: &Path) -> Result<(), Error> {
    tracing::info!("Cloning '{url}' with depth {depth}...");
    let output = Command::new("git")
        .arg("clone")
        .arg("--depth")
        .arg(depth.to_string())
        .arg(url)
        .arg(target)
        .output()?;
    if !output.status.success() {
        return Err(Error::Exec(format!(
            "cloning `{url}` failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(())
}

fn run_git(root: &Path, args: &[&str]) -> Result<String, Error> {
    let output = Command::new("git").arg("-C").arg(root).args(args).output()?;
    if !output.status.success() {
        return Err(Error::Exec(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// -------------------------------------------------------------------------------------------------

pub(crate) fn parse_log(log: &str) -> Vec<Commit> {
    log.lines()
        .filter_map(|line| line.splitn(5, FIELD_SEPARATOR).collect_tuple())
        .map(|(hash, author, email, date, summary)| Commit {
            hash: hash.to_string(),
            author: author.to_string(),
            email: email.to_string(),
            date: date.to_string(),
            summary: summary.to_string(),
        })
        .collect()
}

pub(crate) fn contributors(commits: &[Commit]) -> Vec<Contributor> {
    commits
        .iter()
        .into_group_map_by(|commit| commit.email.to_lowercase())
        .into_iter()
        .map(|(email, commits)| Contributor {
            // name as used in the most recent commit
            name: commits[0].author.clone(),
            email,
            commits: commits.len(),
        })
        .sorted_by(|a, b| {
            b.commits
                .cmp(&a.commits)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.email.cmp(&b.email))
        })
        .collect()
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
a1\x1fAnn\x1fann@example.com\x1f2024-05-02T10:00:00+00:00\x1fFix: typo\x1f in docs
b2\x1fBob\x1fbob@example.com\x1f2024-05-01T10:00:00+00:00\x1fAdd parser
c3\x1fAnn Old\x1fANN@example.com\x1f2024-04-30T10:00:00+00:00\x1fInitial commit
garbage line
";

    #[test]
    fn log_parsing() {
        let commits = parse_log(LOG);
        assert_eq!(commits.len(), 3);
        assert_eq!(commits[0].hash, "a1");
        assert_eq!(commits[0].summary, "Fix: typo\x1f in docs");
        assert_eq!(commits[2].date, "2024-04-30T10:00:00+00:00");
    }

    #[test]
    fn contributors_by_activity() {
        let contributors = contributors(&parse_log(LOG));
        assert_eq!(
            contributors,
            vec![
                Contributor {
                    name: "Ann".to_string(),
                    email: "ann@example.com".to_string(),
                    commits: 2,
                },
                Contributor {
                    name: "Bob".to_string(),
                    email: "bob@example.com".to_string(),
                    commits: 1,
                },
            ]
        );
    }

    #[test]
    fn non_repository_gives_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(summarize(dir.path(), 10), GitSummary::default());
    }
}
