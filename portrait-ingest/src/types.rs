//! GitHub REST v3 payloads, reduced to the fields the analysis reads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `GET /users/{login}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhUser {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub public_repos: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhOwner {
    #[serde(default)]
    pub login: String,
}

/// One entry of `GET /users/{login}/repos`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhRepo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub owner: Option<GhOwner>,
    #[serde(default)]
    pub pushed_at: Option<String>,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub has_pages: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhSignature {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhCommitDetail {
    #[serde(default)]
    pub author: Option<GhSignature>,
    #[serde(default)]
    pub committer: Option<GhSignature>,
}

/// One entry of `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhCommit {
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub commit: GhCommitDetail,
}

impl GhCommit {
    /// Author date, else committer date.
    pub fn timestamp(&self) -> Option<&str> {
        fn pick(s: &Option<GhSignature>) -> Option<&str> {
            s.as_ref().and_then(|sig| sig.date.as_deref())
        }
        pick(&self.commit.author).or_else(|| pick(&self.commit.committer))
    }
}

/// `GET /repos/{owner}/{repo}/readme`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhReadme {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

/// One entry of `GET /repos/{owner}/{repo}/contents/`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhContent {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhIssue {
    #[serde(default)]
    pub title: String,
}

/// `GET /search/issues`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhSearchIssues {
    #[serde(default)]
    pub total_count: u32,
    #[serde(default)]
    pub items: Vec<GhIssue>,
}

/// Everything fetched for one repository.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RepoSnapshot {
    pub repo: GhRepo,
    /// `GET /repos/{owner}/{repo}/languages`
    #[serde(default)]
    pub languages: BTreeMap<String, u64>,
    #[serde(default)]
    pub readme: Option<GhReadme>,
    /// Top-level directory listing.
    #[serde(default)]
    pub contents: Vec<GhContent>,
    #[serde(default)]
    pub commits: Vec<GhCommit>,
}

/// Everything fetched for one account, before conversion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub user: GhUser,
    #[serde(default)]
    pub repos: Vec<RepoSnapshot>,
    /// PRs authored by the user on repositories they do not own.
    #[serde(default)]
    pub pull_requests_to_others: u32,
    /// Titles of pull requests the user opened inside the window.
    #[serde(default)]
    pub pull_request_titles: Vec<String>,
}
