//! On-disk cache under a directory: `<login>.profile.json` plus one
//! `<login>.<classifier>.analysis.json` per classifier.
//!
//! Entries never expire on their own; `invalidate` (force refresh) is the
//! only way to drop them.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use portrait_core::cache::{CachedAnalysis, ProfileCache};
use portrait_core::profile::RawProfile;

#[derive(Debug, Clone)]
pub struct JsonDirCache {
    dir: PathBuf,
}

impl JsonDirCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, login: &str, kind: &str) -> PathBuf {
        self.dir.join(format!("{}.{kind}.json", file_stem(login)))
    }

    fn analysis_path(&self, login: &str, classifier: &str) -> PathBuf {
        self.path(login, &format!("{}.analysis", file_stem(classifier)))
    }

    fn remove(&self, path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let value = serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!(path = %path.display(), "cache hit");
        Ok(Some(value))
    }

    fn store<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Lowercased login with anything outside `[a-z0-9_-]` replaced.
fn file_stem(login: &str) -> String {
    login
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl ProfileCache for JsonDirCache {
    fn load_profile(&self, login: &str) -> Result<Option<RawProfile>> {
        self.load(&self.path(login, "profile"))
    }

    fn store_profile(&self, profile: &RawProfile) -> Result<()> {
        self.store(&self.path(&profile.login, "profile"), profile)
    }

    fn load_analysis(&self, login: &str, classifier: &str) -> Result<Option<CachedAnalysis>> {
        self.load(&self.analysis_path(login, classifier))
    }

    fn store_analysis(&self, login: &str, classifier: &str, analysis: &CachedAnalysis) -> Result<()> {
        self.store(&self.analysis_path(login, classifier), analysis)
    }

    fn invalidate(&self, login: &str) -> Result<()> {
        self.remove(&self.path(login, "profile"))?;
        if !self.dir.exists() {
            return Ok(());
        }

        let prefix = format!("{}.", file_stem(login));
        let entries = fs::read_dir(&self.dir).with_context(|| format!("Failed to list {}", self.dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to list {}", self.dir.display()))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&prefix) && name.ends_with(".analysis.json") {
                self.remove(&entry.path())?;
            }
        }
        Ok(())
    }
}
