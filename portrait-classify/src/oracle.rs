//! Oracle-backed domain classification.
//!
//! Each repository's text goes to an external oracle, at most once per
//! distinct content: answers are cached by SHA-256 of the text actually
//! sent. Calls draw from a shared `RequestBudget`. A failed, refused or
//! unparseable call means that repository contributes nothing.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use portrait_core::domain::{Classification, DomainClassifier, DomainScore, DomainTag, RepoText};

use crate::budget::RequestBudget;
use crate::heuristic::HeuristicClassifier;
use crate::text::{DEFAULT_README_CHAR_LIMIT, prepare};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("oracle quota exceeded")]
    QuotaExceeded,

    #[error("oracle request timed out")]
    Timeout,

    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),

    #[error("oracle rejected credentials: {0}")]
    Unauthorized(String),

    #[error("oracle transport error: {0}")]
    Transport(String),
}

impl OracleError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, OracleError::QuotaExceeded | OracleError::Timeout | OracleError::Transport(_))
    }
}

/// External text classifier. Receives already-prepared text.
pub trait DomainOracle: Send + Sync {
    fn name(&self) -> &'static str;

    fn classify_readme(&self, repo: &RepoText) -> Result<Vec<(DomainTag, f64)>, OracleError>;
}

/// Instruction sent to a language-model oracle for one repository.
pub fn classification_prompt(repo: &RepoText) -> String {
    let domains = DomainTag::ALL.iter().map(|d| d.label()).collect::<Vec<_>>().join(", ");
    format!(
        "Classify this software repository into one or more of these domains: {domains}.\n\
Use \"Other\" only if none fit.\n\
Reply with JSON only, in the form {{\"domains\": [{{\"tag\": \"<domain>\", \"confidence\": <0.0-1.0>}}]}}.\n\n\
Repository: {name}\n\
Language: {language}\n\
README:\n{readme}\n",
        name = repo.name,
        language = repo.language.as_deref().unwrap_or("unknown"),
        readme = repo.readme,
    )
}

/// Oracle answers keyed by content hash. Shared between classifiers.
#[derive(Debug, Default)]
pub struct ClassificationCache {
    entries: Mutex<HashMap<String, Vec<(DomainTag, f64)>>>,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<(DomainTag, f64)>> {
        self.entries.lock().get(key).cloned()
    }

    pub fn insert(&self, key: String, tags: Vec<(DomainTag, f64)>) {
        self.entries.lock().insert(key, tags);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hex SHA-256 of the name, language and text sent to the oracle.
pub fn content_key(repo: &RepoText) -> String {
    let mut hasher = Sha256::new();
    hasher.update(repo.name.as_bytes());
    hasher.update([0u8]);
    hasher.update(repo.language.as_deref().unwrap_or_default().as_bytes());
    hasher.update([0u8]);
    hasher.update(repo.readme.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationStats {
    pub oracle_calls: u64,
    pub cache_hits: u64,
    pub degraded: u64,
    pub fallbacks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OracleOptions {
    pub readme_char_limit: usize,
    /// Longest a single call waits for budget before giving up.
    pub max_wait: Duration,
    /// Pause applied to the shared budget when the oracle reports its quota exceeded.
    pub quota_backoff: Duration,
    /// Score failed repositories with the keyword heuristic instead of dropping them.
    pub heuristic_fallback: bool,
}

impl Default for OracleOptions {
    fn default() -> Self {
        Self {
            readme_char_limit: DEFAULT_README_CHAR_LIMIT,
            max_wait: Duration::from_secs(30),
            quota_backoff: Duration::from_secs(60),
            heuristic_fallback: false,
        }
    }
}

pub struct OracleClassifier {
    oracle: Box<dyn DomainOracle>,
    budget: Arc<RequestBudget>,
    cache: Arc<ClassificationCache>,
    options: OracleOptions,
    heuristic: HeuristicClassifier,
    stats: Mutex<ClassificationStats>,
}

impl OracleClassifier {
    pub fn new(oracle: Box<dyn DomainOracle>, budget: Arc<RequestBudget>, cache: Arc<ClassificationCache>) -> Self {
        Self::with_options(oracle, budget, cache, OracleOptions::default())
    }

    pub fn with_options(
        oracle: Box<dyn DomainOracle>,
        budget: Arc<RequestBudget>,
        cache: Arc<ClassificationCache>,
        options: OracleOptions,
    ) -> Self {
        Self {
            oracle,
            budget,
            cache,
            heuristic: HeuristicClassifier::new(options.readme_char_limit),
            options,
            stats: Mutex::new(ClassificationStats::default()),
        }
    }

    pub fn stats(&self) -> ClassificationStats {
        *self.stats.lock()
    }

    fn ask(&self, prepared: &RepoText) -> Result<Vec<(DomainTag, f64)>, OracleError> {
        let key = content_key(prepared);
        if let Some(tags) = self.cache.get(&key) {
            self.stats.lock().cache_hits += 1;
            debug!(repo = %prepared.name, "classification cache hit");
            return Ok(tags);
        }

        if !self.budget.acquire(self.options.max_wait) {
            return Err(OracleError::QuotaExceeded);
        }
        self.stats.lock().oracle_calls += 1;

        let result = self.oracle.classify_readme(prepared);
        match &result {
            Ok(tags) => self.cache.insert(key, tags.clone()),
            Err(OracleError::QuotaExceeded) => self.budget.back_off(self.options.quota_backoff),
            Err(_) => {}
        }
        result
    }
}

impl DomainClassifier for OracleClassifier {
    fn name(&self) -> &'static str {
        self.oracle.name()
    }

    fn classify(&self, repos: &[RepoText]) -> Classification {
        let mut score = DomainScore::new();
        let mut degraded = Vec::new();

        for repo in repos {
            let prepared = RepoText {
                name: repo.name.clone(),
                readme: prepare(&repo.readme, self.options.readme_char_limit),
                language: repo.language.clone(),
            };
            if prepared.readme.is_empty() {
                debug!(repo = %repo.name, "no text to classify");
                continue;
            }

            match self.ask(&prepared) {
                Ok(tags) => {
                    for (tag, confidence) in tags {
                        score.add(tag, confidence);
                    }
                }
                Err(e) if self.options.heuristic_fallback => {
                    warn!(repo = %repo.name, error = %e, "oracle failed, using keyword heuristic");
                    self.stats.lock().fallbacks += 1;
                    for (tag, confidence) in self.heuristic.score_repo(repo) {
                        score.add(tag, confidence);
                    }
                }
                Err(e) => {
                    warn!(repo = %repo.name, error = %e, retryable = e.is_retryable(), "oracle failed, repository skipped");
                    self.stats.lock().degraded += 1;
                    degraded.push(repo.name.clone());
                }
            }
        }

        let stats = self.stats();
        info!(
            oracle = self.oracle.name(),
            repos = repos.len(),
            calls = stats.oracle_calls,
            cache_hits = stats.cache_hits,
            degraded = stats.degraded,
            "domain classification finished"
        );
        Classification { score, degraded }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: Result<Vec<(DomainTag, f64)>, OracleError>,
        calls: Arc<AtomicUsize>,
    }

    impl DomainOracle for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn classify_readme(&self, _repo: &RepoText) -> Result<Vec<(DomainTag, f64)>, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    fn classifier(reply: Result<Vec<(DomainTag, f64)>, OracleError>, options: OracleOptions) -> (OracleClassifier, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let oracle = Scripted { reply, calls: calls.clone() };
        let c = OracleClassifier::with_options(
            Box::new(oracle),
            Arc::new(RequestBudget::unlimited()),
            Arc::new(ClassificationCache::new()),
            options,
        );
        (c, calls)
    }

    fn repos() -> Vec<RepoText> {
        vec![
            RepoText::new("a", "A react dashboard", Some("TypeScript")),
            RepoText::new("b", "Kubernetes operator", Some("Go")),
        ]
    }

    #[test]
    fn test_timeouts_give_zero_score() {
        let (c, calls) = classifier(Err(OracleError::Timeout), OracleOptions::default());
        let result = c.classify(&repos());
        assert!(result.score.is_zero());
        assert_eq!(result.degraded, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(c.stats().degraded, 2);
    }

    #[test]
    fn test_identical_content_hits_cache() {
        let (c, calls) = classifier(Ok(vec![(DomainTag::WebFrontend, 0.8)]), OracleOptions::default());
        let first = c.classify(&repos());
        let second = c.classify(&repos());
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(c.stats().cache_hits, 2);
        assert!((first.score.weight(DomainTag::WebFrontend) - 1.6).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_is_not_sent() {
        let (c, calls) = classifier(Ok(vec![(DomainTag::AiMl, 1.0)]), OracleOptions::default());
        let result = c.classify(&[RepoText::new("blank", "   ", None)]);
        assert!(result.score.is_zero());
        assert!(!result.is_degraded());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_exhausted_budget_skips_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let oracle = Scripted { reply: Ok(vec![(DomainTag::AiMl, 1.0)]), calls: calls.clone() };
        let budget = Arc::new(RequestBudget::per_minute(0, 1));
        let c = OracleClassifier::with_options(
            Box::new(oracle),
            budget,
            Arc::new(ClassificationCache::new()),
            OracleOptions { max_wait: Duration::from_millis(1), ..OracleOptions::default() },
        );
        let result = c.classify(&repos());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.degraded, vec!["b".to_string()]);
        assert_eq!(result.score.weight(DomainTag::AiMl), 1.0);
    }

    #[test]
    fn test_heuristic_fallback_scores_failed_repos() {
        let options = OracleOptions { heuristic_fallback: true, ..OracleOptions::default() };
        let (c, _) = classifier(Err(OracleError::MalformedResponse("?".into())), options);
        let result = c.classify(&repos());
        assert!(!result.is_degraded());
        assert!(result.score.weight(DomainTag::DevOps) > 0.0);
        assert_eq!(c.stats().fallbacks, 2);
    }

    #[test]
    fn test_prompt_lists_every_domain() {
        let p = classification_prompt(&RepoText::new("kit", "A toolkit", Some("Rust")));
        for tag in DomainTag::ALL {
            assert!(p.contains(tag.label()), "missing {tag}");
        }
        assert!(p.contains("Repository: kit"));
        assert!(p.contains("Language: Rust"));
    }

    #[test]
    fn test_content_key_changes_with_text() {
        let a = RepoText::new("x", "one", None);
        let b = RepoText::new("x", "two", None);
        assert_eq!(content_key(&a), content_key(&a.clone()));
        assert_ne!(content_key(&a), content_key(&b));
        assert_eq!(content_key(&a).len(), 64);
    }
}
