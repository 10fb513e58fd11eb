//! GitHub snapshot -> `RawProfile`.
//!
//! Malformed records are skipped with a warning; they never fail the
//! profile. Repositories whose last push predates the analysis window
//! are dropped, as are commits outside it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use portrait_core::error::InputError;
use portrait_core::metrics::parse_timestamp;
use portrait_core::profile::{RawProfile, Repository};

use crate::types::{GhReadme, ProfileSnapshot, RepoSnapshot};

/// A README at least this long counts as documentation on its own.
pub const DOCS_README_CHARS: usize = 1000;

const DOC_DIRS: &[&str] = &["docs", "doc", "documentation", "wiki", "book"];

/// Decode README content as served by the contents API.
pub fn decode_readme(repo: &str, readme: &GhReadme) -> Result<String, InputError> {
    match readme.encoding.as_str() {
        "base64" => {
            let packed: String = readme.content.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = STANDARD.decode(packed).map_err(|e| InputError::InvalidValue {
                record: repo.to_string(),
                field: "readme",
                value: e.to_string(),
            })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        "" | "utf-8" | "utf8" => Ok(readme.content.clone()),
        other => Err(InputError::InvalidValue {
            record: repo.to_string(),
            field: "readme.encoding",
            value: other.to_string(),
        }),
    }
}

/// Start of the analysis window. A window reaching past the earliest
/// representable instant starts there instead.
pub fn window_start(now: DateTime<Utc>, window_days: u32) -> DateTime<Utc> {
    TimeDelta::try_days(i64::from(window_days))
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Convert one repository record. `Ok(None)` means it fell outside the window.
pub fn parse_repo(
    login: &str,
    snap: &RepoSnapshot,
    since: DateTime<Utc>,
) -> Result<Option<Repository>, InputError> {
    let gh = &snap.repo;
    let name = gh.name.trim();
    if name.is_empty() {
        return Err(InputError::MissingField {
            record: format!("{login}/<repo>"),
            field: "name",
        });
    }

    if let Some(raw) = gh.pushed_at.as_deref() {
        let pushed = parse_timestamp(raw).ok_or_else(|| InputError::InvalidValue {
            record: name.to_string(),
            field: "pushed_at",
            value: raw.to_string(),
        })?;
        if pushed < since {
            debug!(repo = name, pushed_at = raw, "repository outside analysis window");
            return Ok(None);
        }
    }

    let readme = match &snap.readme {
        Some(r) => match decode_readme(name, r) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "skipping undecodable README");
                None
            }
        },
        None => None,
    };

    let has_doc_dir = snap
        .contents
        .iter()
        .any(|c| c.kind == "dir" && DOC_DIRS.iter().any(|d| c.name.eq_ignore_ascii_case(d)));
    let long_readme = readme.as_deref().is_some_and(|r| r.chars().count() >= DOCS_README_CHARS);

    let is_owner = gh
        .owner
        .as_ref()
        .is_none_or(|o| o.login.eq_ignore_ascii_case(login));

    Ok(Some(Repository {
        name: name.to_string(),
        description: gh.description.clone().filter(|d| !d.trim().is_empty()),
        primary_language: gh.language.clone(),
        languages: snap.languages.clone(),
        is_owner,
        is_fork: gh.fork,
        readme,
        pushed_at: gh.pushed_at.clone(),
        forks_received: gh.forks_count,
        stars: gh.stargazers_count,
        has_docs: has_doc_dir || long_readme || gh.has_pages,
    }))
}

/// Build the analysis input from a fetched snapshot, as of `now`.
pub fn to_raw_profile(
    snapshot: &ProfileSnapshot,
    window_days: u32,
    now: DateTime<Utc>,
) -> Result<RawProfile, InputError> {
    let login = snapshot.user.login.trim();
    if login.is_empty() {
        return Err(InputError::MissingField {
            record: "user".to_string(),
            field: "login",
        });
    }
    let since = window_start(now, window_days);

    let mut profile = RawProfile::new(login)
        .with_pull_requests_to_others(snapshot.pull_requests_to_others)
        .with_pull_request_titles(snapshot.pull_request_titles.clone());
    profile.window_days = window_days;
    profile.avatar_url = snapshot.user.avatar_url.clone();

    for snap in &snapshot.repos {
        let repo = match parse_repo(login, snap, since) {
            Ok(Some(repo)) => repo,
            Ok(None) => continue,
            Err(e) => {
                warn!(login, error = %e, "skipping malformed repository record");
                continue;
            }
        };

        for commit in &snap.commits {
            let Some(ts) = commit.timestamp() else {
                debug!(repo = %repo.name, sha = %commit.sha, "commit without a date");
                continue;
            };
            // Unparseable dates pass through; the extractor counts and skips them.
            if parse_timestamp(ts).is_some_and(|t| t < since) {
                continue;
            }
            profile.commit_timestamps.push(ts.to_string());
        }
        profile.repositories.push(repo);
    }

    debug!(
        login,
        repos = profile.repositories.len(),
        commits = profile.commit_timestamps.len(),
        "snapshot converted"
    );
    Ok(profile)
}
