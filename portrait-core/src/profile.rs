//! Raw hosting-platform profile as handed to the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default analysis window, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 90;

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

/// Account facts fetched once per session. Owned by the caller and only
/// ever borrowed by the pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProfile {
    pub login: String,
    #[serde(default)]
    pub repositories: Vec<Repository>,
    /// Authored commit timestamps (RFC 3339) across all repositories.
    #[serde(default)]
    pub commit_timestamps: Vec<String>,
    /// Pull requests opened against repositories the account does not own.
    #[serde(default)]
    pub pull_requests_to_others: u32,
    /// Titles of pull requests the account opened inside the window.
    #[serde(default)]
    pub pull_request_titles: Vec<String>,
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Avatar URL, used as an optional reference image.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl RawProfile {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            repositories: Vec::new(),
            commit_timestamps: Vec::new(),
            pull_requests_to_others: 0,
            pull_request_titles: Vec::new(),
            window_days: DEFAULT_WINDOW_DAYS,
            avatar_url: None,
        }
    }

    pub fn with_repository(mut self, repo: Repository) -> Self {
        self.repositories.push(repo);
        self
    }

    pub fn with_commits<I, S>(mut self, timestamps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commit_timestamps
            .extend(timestamps.into_iter().map(Into::into));
        self
    }

    pub fn with_pull_requests_to_others(mut self, count: u32) -> Self {
        self.pull_requests_to_others = count;
        self
    }

    pub fn with_pull_request_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pull_request_titles.extend(titles.into_iter().map(Into::into));
        self
    }
}

/// One repository record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub primary_language: Option<String>,
    /// Language -> byte count, as reported by the platform.
    #[serde(default)]
    pub languages: BTreeMap<String, u64>,
    /// The profile's account owns this repository.
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub is_fork: bool,
    #[serde(default)]
    pub readme: Option<String>,
    /// Last push (RFC 3339).
    #[serde(default)]
    pub pushed_at: Option<String>,
    /// How many times other accounts forked this repository.
    #[serde(default)]
    pub forks_received: u32,
    #[serde(default)]
    pub stars: u32,
    /// Documentation files (docs/, CONTRIBUTING, ARCHITECTURE, ...) present.
    #[serde(default)]
    pub has_docs: bool,
}

impl Repository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            primary_language: None,
            languages: BTreeMap::new(),
            is_owner: true,
            is_fork: false,
            readme: None,
            pushed_at: None,
            forks_received: 0,
            stars: 0,
            has_docs: false,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>, bytes: u64) -> Self {
        let language = language.into();
        if self.primary_language.is_none() {
            self.primary_language = Some(language.clone());
        }
        let total = self.languages.entry(language).or_insert(0);
        *total = total.saturating_add(bytes);
        self
    }

    pub fn with_readme(mut self, readme: impl Into<String>) -> Self {
        self.readme = Some(readme.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn forked(mut self) -> Self {
        self.is_fork = true;
        self
    }

    pub fn not_owned(mut self) -> Self {
        self.is_owner = false;
        self
    }

    pub fn with_forks_received(mut self, forks: u32) -> Self {
        self.forks_received = forks;
        self
    }

    pub fn with_stars(mut self, stars: u32) -> Self {
        self.stars = stars;
        self
    }

    pub fn with_docs(mut self) -> Self {
        self.has_docs = true;
        self
    }

    /// Authored by the account: owned and not a fork.
    pub fn is_authored(&self) -> bool {
        self.is_owner && !self.is_fork
    }

    /// Text used for domain classification: description followed by README.
    pub fn classification_text(&self) -> String {
        match (&self.description, &self.readme) {
            (Some(d), Some(r)) => format!("{d}\n\n{r}"),
            (Some(d), None) => d.clone(),
            (None, Some(r)) => r.clone(),
            (None, None) => String::new(),
        }
    }
}
