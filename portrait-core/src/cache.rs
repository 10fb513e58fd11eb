//! Cache seam for raw profiles and derived analysis.
//!
//! The pipeline never assumes a cache exists: every load may miss and
//! every store may fail without affecting the result.

use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::DomainScore;
use crate::metrics::ActivityMetrics;
use crate::profile::RawProfile;

/// Derived analysis stored next to the raw profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAnalysis {
    pub metrics: ActivityMetrics,
    pub domains: DomainScore,
}

/// Analyses are keyed by login and classifier name, so switching
/// classification strategy never serves another strategy's result.
pub trait ProfileCache: Send + Sync {
    fn load_profile(&self, login: &str) -> Result<Option<RawProfile>>;
    fn store_profile(&self, profile: &RawProfile) -> Result<()>;
    fn load_analysis(&self, login: &str, classifier: &str) -> Result<Option<CachedAnalysis>>;
    fn store_analysis(&self, login: &str, classifier: &str, analysis: &CachedAnalysis) -> Result<()>;
    /// Drop everything held for `login`, under every classifier.
    fn invalidate(&self, login: &str) -> Result<()>;
}

/// Cache that never holds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ProfileCache for NoCache {
    fn load_profile(&self, _login: &str) -> Result<Option<RawProfile>> {
        Ok(None)
    }
    fn store_profile(&self, _profile: &RawProfile) -> Result<()> {
        Ok(())
    }
    fn load_analysis(&self, _login: &str, _classifier: &str) -> Result<Option<CachedAnalysis>> {
        Ok(None)
    }
    fn store_analysis(&self, _login: &str, _classifier: &str, _analysis: &CachedAnalysis) -> Result<()> {
        Ok(())
    }
    fn invalidate(&self, _login: &str) -> Result<()> {
        Ok(())
    }
}

/// Process-local cache, keyed by lowercased login.
#[derive(Debug, Default)]
pub struct MemoryCache {
    profiles: Mutex<HashMap<String, RawProfile>>,
    analyses: Mutex<HashMap<(String, String), CachedAnalysis>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn key(login: &str) -> String {
    login.to_lowercase()
}

impl ProfileCache for MemoryCache {
    fn load_profile(&self, login: &str) -> Result<Option<RawProfile>> {
        Ok(self.profiles.lock().get(&key(login)).cloned())
    }

    fn store_profile(&self, profile: &RawProfile) -> Result<()> {
        self.profiles.lock().insert(key(&profile.login), profile.clone());
        Ok(())
    }

    fn load_analysis(&self, login: &str, classifier: &str) -> Result<Option<CachedAnalysis>> {
        Ok(self.analyses.lock().get(&(key(login), classifier.to_string())).cloned())
    }

    fn store_analysis(&self, login: &str, classifier: &str, analysis: &CachedAnalysis) -> Result<()> {
        self.analyses
            .lock()
            .insert((key(login), classifier.to_string()), analysis.clone());
        Ok(())
    }

    fn invalidate(&self, login: &str) -> Result<()> {
        let login = key(login);
        self.profiles.lock().remove(&login);
        self.analyses.lock().retain(|(l, _), _| *l != login);
        Ok(())
    }
}
