use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use portrait_classify::{ClassifierStrategy, DEFAULT_README_CHAR_LIMIT};
use portrait_core::behavior::BehaviorThresholds;
use portrait_core::domain::DEFAULT_TOP_K;
use portrait_core::profile::DEFAULT_WINDOW_DAYS;

use crate::state::ensure_portrait_home;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GithubSection,
    pub classifier: ClassifierSection,
    pub llm: LlmSection,
    pub prompt: PromptSection,
    pub image: ImageSection,
    pub style: StyleSection,
    pub batch: BatchSection,
    pub behavior: BehaviorThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSection {
    pub api_base: String,
    /// Most recently pushed repositories to analyze.
    pub max_repos: usize,
    pub window_days: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSection {
    pub strategy: ClassifierStrategy,
    pub top_k: usize,
    pub requests_per_minute: u32,
    pub burst: u32,
    /// Longest one oracle call waits for budget.
    pub max_wait_secs: u64,
    /// Score repositories with the keyword heuristic when the oracle fails.
    pub heuristic_fallback: bool,
    pub readme_char_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// "anthropic" or "openai"
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSection {
    pub variations: usize,
    pub randomness: f64,
    /// Fixed seed; a fresh one is drawn per run when absent.
    pub seed: Option<u64>,
    /// Style-template prompts per profile (at most 4).
    pub styles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSection {
    pub enabled: bool,
    pub model: String,
    pub size: String,
    pub timeout_secs: u64,
}

/// Fixed style. Applies only when all four are set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSection {
    pub art_style: Option<String>,
    pub character: Option<String>,
    pub background: Option<String>,
    pub lighting: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    pub parallelism: usize,
}

impl Default for GithubSection {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            max_repos: 30,
            window_days: DEFAULT_WINDOW_DAYS,
            timeout_secs: 30,
        }
    }
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            strategy: ClassifierStrategy::Heuristic,
            top_k: DEFAULT_TOP_K,
            requests_per_minute: 30,
            burst: 5,
            max_wait_secs: 30,
            heuristic_fallback: false,
            readme_char_limit: DEFAULT_README_CHAR_LIMIT,
        }
    }
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-5-sonnet-latest".to_string(),
            temperature: 0.0,
            max_tokens: 300,
            timeout_secs: 30,
        }
    }
}

impl Default for PromptSection {
    fn default() -> Self {
        Self {
            variations: 3,
            randomness: 0.3,
            seed: None,
            styles: 0,
        }
    }
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "gpt-image-1".to_string(),
            size: "1024x1024".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for BatchSection {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_portrait_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let p = config_path()?;
    let cfg = load_config_from(&p)?;
    let source = if p.exists() { p.display().to_string() } else { "defaults".to_string() };
    println!("# {source}\n");
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrips_through_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("config.toml");
        save_config_to(&Config::default(), &p).unwrap();
        assert_eq!(load_config_from(&p).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("config.toml");
        fs::write(
            &p,
            "[classifier]\nstrategy = \"oracle\"\nrequests_per_minute = 10\n\n[behavior]\nhour_dominance = 0.6\n\n[prompt]\nseed = 7\n",
        )
        .unwrap();

        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.classifier.strategy, ClassifierStrategy::Oracle);
        assert_eq!(cfg.classifier.requests_per_minute, 10);
        assert_eq!(cfg.classifier.burst, 5);
        assert_eq!(cfg.behavior.hour_dominance, 0.6);
        assert_eq!(cfg.behavior.collaboration_high, 1.5);
        assert_eq!(cfg.prompt.seed, Some(7));
        assert_eq!(cfg.github, GithubSection::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(load_config_from(&tmp.path().join("nope.toml")).unwrap(), Config::default());
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("config.toml");
        fs::write(&p, "[github\n").unwrap();
        assert!(load_config_from(&p).is_err());
    }
}
