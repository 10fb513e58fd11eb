use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$PORTRAIT_HOME`, else `~/.portrait`.
pub fn portrait_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("PORTRAIT_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".portrait"))
}

pub fn ensure_portrait_home() -> Result<PathBuf> {
    let dir = portrait_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Raw profiles and derived analysis, one JSON file each.
pub fn cache_dir() -> Result<PathBuf> {
    Ok(ensure_portrait_home()?.join("cache"))
}

/// Default destination for prompts and images.
pub fn output_dir() -> Result<PathBuf> {
    Ok(ensure_portrait_home()?.join("output"))
}
