use std::{fmt, sync::LazyLock, time::Duration};

use regex::Regex;
use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{config::HostingSettings, error::Error};

// -------------------------------------------------------------------------------------------------

/// Owner and name of a GitHub hosted repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    /// Extract the slug from a GitHub web, https, ssh or scp-like git URL.
    pub fn from_url(url: &str) -> Option<Self> {
        static GITHUB_URL: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"github\.com[:/]([\w.-]+)/([\w.-]+?)(?:\.git)?/?$")
                .expect("invalid github url regex")
        });
        let captures = GITHUB_URL.captures(url.trim())?;
        Some(Self {
            owner: captures[1].to_string(),
            name: captures[2].to_string(),
        })
    }

    pub fn web_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Repository statistics from the hosting platform.
///
/// The default value is the degraded state used when the API is disabled or unreachable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HostingInfo {
    /// True when the values below were actually fetched.
    pub available: bool,
    pub slug: Option<RepoSlug>,
    pub html_url: Option<String>,
    pub stars: u64,
    pub forks: u64,
    /// Open issues, excluding pull requests.
    pub open_issues: u64,
    pub open_pull_requests: u64,
    pub default_branch: Option<String>,
    pub topics: Vec<String>,
}

impl HostingInfo {
    /// Degraded info which only knows the slug.
    pub fn unavailable(slug: Option<RepoSlug>) -> Self {
        Self {
            slug,
            ..Self::default()
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Source of repository statistics.
pub trait HostingApi {
    fn fetch(&self, slug: &RepoSlug) -> Result<HostingInfo, Error>;
}

#[derive(Deserialize)]
struct RepoResponse {
    html_url: String,
    stargazers_count: u64,
    forks_count: u64,
    // includes open pull requests
    open_issues_count: u64,
    default_branch: String,
    #[serde(default)]
    topics: Vec<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    total_count: u64,
}

/// Search query for the open pull requests of a repository. Only the total count of the
/// result is used, so a single item per page is enough.
fn open_pulls_query(slug: &RepoSlug) -> String {
    format!(
        "search/issues?q=repo:{}/{}+is:pr+is:open&per_page=1",
        slug.owner, slug.name
    )
}

/// Blocking GitHub REST API client.
pub struct GithubApi {
    client: Client,
    api_url: String,
}

impl GithubApi {
    /// Environment variable with an optional access token.
    pub const TOKEN_VAR: &'static str = "GITHUB_TOKEN";

    pub fn new(settings: &HostingSettings) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            )),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Ok(token) = std::env::var(Self::TOKEN_VAR) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|_| Error::config(format!("invalid {} value", Self::TOKEN_VAR)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, reqwest::Error> {
        let url = format!("{}/{}", self.api_url, path);
        tracing::debug!("Fetching {url}");
        self.client.get(url).send()?.error_for_status()?.json()
    }
}

impl HostingApi for GithubApi {
    fn fetch(&self, slug: &RepoSlug) -> Result<HostingInfo, Error> {
        let fetch_error = |err: reqwest::Error| Error::MetadataFetch(format!("{slug}: {err}"));
        let repo: RepoResponse = self
            .get(&format!("repos/{}/{}", slug.owner, slug.name))
            .map_err(fetch_error)?;
        let pulls: SearchResponse = self.get(&open_pulls_query(slug)).map_err(fetch_error)?;
        let open_pull_requests = pulls.total_count;
        Ok(HostingInfo {
            available: true,
            slug: Some(slug.clone()),
            html_url: Some(repo.html_url),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            open_issues: repo.open_issues_count.saturating_sub(open_pull_requests),
            open_pull_requests,
            default_branch: Some(repo.default_branch),
            topics: repo.topics,
        })
    }
}

// -------------------------------------------------------------------------------------------------
