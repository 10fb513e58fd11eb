//! GitHub REST client implementing `ProfileSource`.

use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use portrait_core::error::SourceError;
use portrait_core::profile::RawProfile;
use portrait_core::services::ProfileSource;
use portrait_ingest::parsers::github::{to_raw_profile, window_start};
use portrait_ingest::types::{GhCommit, GhContent, GhReadme, GhRepo, GhSearchIssues, GhUser, ProfileSnapshot, RepoSnapshot};

use crate::config::GithubSection;
use crate::runtime;

/// Most recent pull requests whose titles are read.
const PR_TITLE_LIMIT: usize = 50;

pub struct GithubSource {
    client: Client,
    handle: Handle,
    api_base: String,
    max_repos: usize,
    window_days: u32,
}

impl GithubSource {
    pub fn new(cfg: &GithubSection, token: Option<&str>, handle: Handle) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(concat!("portrait-cli/", env!("CARGO_PKG_VERSION"))));
        headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            handle,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            max_repos: cfg.max_repos,
            window_days: cfg.window_days,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let url = format!("{}{}", self.api_base, path);
        debug!(%url, "GET");
        let resp = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(resp.headers());
            let exhausted = resp
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.trim() == "0");
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, exhausted, retry_after, path, &body));
        }
        resp.json::<T>().await.map_err(|e| SourceError::Transport(format!("decode {path}: {e}")))
    }

    /// Like `get_json`, but a missing or empty resource is `None`.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SourceError> {
        match self.get_json(path).await {
            Ok(v) => Ok(Some(v)),
            Err(SourceError::NotFound(_)) => Ok(None),
            Err(SourceError::Transport(msg)) if msg.starts_with("409") => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_snapshot(&self, login: &str) -> Result<ProfileSnapshot, SourceError> {
        let user: GhUser = self.get_json(&format!("/users/{login}")).await.map_err(|e| match e {
            SourceError::NotFound(_) => SourceError::NotFound(login.to_string()),
            other => other,
        })?;

        let per_page = self.max_repos.clamp(1, 100);
        let mut repos: Vec<GhRepo> = self
            .get_json(&format!("/users/{login}/repos?per_page={per_page}&sort=pushed&type=owner"))
            .await?;
        repos.truncate(self.max_repos);

        let since = window_start(Utc::now(), self.window_days);
        // The API rejects dates before the epoch.
        let since_query = since.max(DateTime::UNIX_EPOCH);
        let since_param = since_query.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

        let mut snapshots = Vec::with_capacity(repos.len());
        for repo in repos {
            let owner = repo.owner.as_ref().map(|o| o.login.clone()).unwrap_or_else(|| login.to_string());
            let base = format!("/repos/{owner}/{}", repo.name);
            // Sorted by push date: the rest are older still.
            if repo
                .pushed_at
                .as_deref()
                .and_then(portrait_core::metrics::parse_timestamp)
                .is_some_and(|t| t < since)
            {
                debug!(repo = %repo.name, "remaining repositories predate the window");
                break;
            }

            let name = repo.name.as_str();
            let languages: BTreeMap<String, u64> =
                per_repo(self.get_optional(&format!("{base}/languages")).await, name, "languages")?.unwrap_or_default();
            let readme: Option<GhReadme> = per_repo(self.get_optional(&format!("{base}/readme")).await, name, "readme")?;
            let contents: Vec<GhContent> =
                per_repo(self.get_optional(&format!("{base}/contents/")).await, name, "contents")?.unwrap_or_default();
            let commits: Vec<GhCommit> = per_repo(
                self.get_optional(&format!("{base}/commits?author={login}&since={since_param}&per_page=100"))
                    .await,
                name,
                "commits",
            )?
            .unwrap_or_default();

            snapshots.push(RepoSnapshot { repo, languages, readme, contents, commits });
        }

        let pull_requests_to_others = match self
            .get_json::<GhSearchIssues>(&format!("/search/issues?q=type:pr+author:{login}+-user:{login}&per_page=1"))
            .await
        {
            Ok(found) => found.total_count,
            Err(e) => {
                warn!(login, error = %e, "pull request count unavailable");
                0
            }
        };

        let created = since_query.format("%Y-%m-%d");
        let pull_request_titles = match self
            .get_json::<GhSearchIssues>(&format!(
                "/search/issues?q=type:pr+author:{login}+created:>={created}&sort=created&per_page={PR_TITLE_LIMIT}"
            ))
            .await
        {
            Ok(found) => found.items.into_iter().map(|i| i.title).collect(),
            Err(e) => {
                warn!(login, error = %e, "pull request titles unavailable");
                Vec::new()
            }
        };

        Ok(ProfileSnapshot {
            user,
            repos: snapshots,
            pull_requests_to_others,
            pull_request_titles,
        })
    }
}

impl ProfileSource for GithubSource {
    fn fetch(&self, login: &str) -> Result<RawProfile, SourceError> {
        let login = login.trim();
        if login.is_empty() || !login.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(SourceError::NotFound(login.to_string()));
        }

        let snapshot = runtime::block_on(&self.handle, self.fetch_snapshot(login))?;
        let profile = to_raw_profile(&snapshot, self.window_days, Utc::now())
            .map_err(|e| SourceError::Transport(format!("unusable user record: {e}")))?;
        info!(
            login,
            repos = profile.repositories.len(),
            commits = profile.commit_timestamps.len(),
            "profile fetched"
        );
        Ok(profile)
    }
}

/// Per-repository detail is best effort. Rate limiting still aborts the
/// fetch, since every later request would fail the same way.
fn per_repo<T>(result: Result<Option<T>, SourceError>, repo: &str, what: &str) -> Result<Option<T>, SourceError> {
    match result {
        Ok(v) => Ok(v),
        Err(e @ SourceError::RateLimited { .. }) => Err(e),
        Err(e) => {
            warn!(repo, what, error = %e, "repository detail unavailable; continuing without it");
            Ok(None)
        }
    }
}

fn transport_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Transport(e.to_string())
    }
}

fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    if let Some(secs) = headers.get(RETRY_AFTER).and_then(|v| v.to_str().ok()).and_then(|v| v.trim().parse().ok()) {
        return Some(secs);
    }
    let reset: i64 = headers.get("x-ratelimit-reset")?.to_str().ok()?.trim().parse().ok()?;
    Some((reset - Utc::now().timestamp()).max(0) as u64)
}

fn status_error(status: StatusCode, exhausted: bool, retry_after: Option<u64>, path: &str, body: &str) -> SourceError {
    match status {
        StatusCode::NOT_FOUND => SourceError::NotFound(path.to_string()),
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited { retry_after_secs: retry_after },
        StatusCode::FORBIDDEN if exhausted || retry_after.is_some() => {
            SourceError::RateLimited { retry_after_secs: retry_after }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::Auth(format!("{status} {}", snippet(body))),
        _ => SourceError::Transport(format!("{} {path}: {}", status.as_u16(), snippet(body))),
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}
