use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::state::ensure_portrait_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub github_token: Option<String>,
    pub anthropic_token: Option<String>,
    pub openai_api_key: Option<String>,
}

impl AuthState {
    /// Environment variables win over stored values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(v) = pick("GITHUB_TOKEN") {
            self.github_token = Some(v);
        }
        if let Some(v) = pick("ANTHROPIC_API_KEY") {
            self.anthropic_token = Some(v);
        }
        if let Some(v) = pick("OPENAI_API_KEY") {
            self.openai_api_key = Some(v);
        }
        self
    }
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_portrait_home()?.join("auth.json"))
}

/// Stored tokens with environment overrides applied.
pub fn resolve_auth() -> Result<AuthState> {
    Ok(load_auth()?.with_env_overrides())
}

pub fn load_auth() -> Result<AuthState> {
    load_auth_from(&auth_path()?)
}

fn load_auth_from(p: &Path) -> Result<AuthState> {
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth(auth: &AuthState) -> Result<()> {
    save_auth_to(auth, &auth_path()?)
}

fn save_auth_to(auth: &AuthState, p: &Path) -> Result<()> {
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    restrict_permissions(p)
}

#[cfg(unix)]
fn restrict_permissions(p: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(p, fs::Permissions::from_mode(0o600)).with_context(|| format!("chmod {}", p.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_p: &Path) -> Result<()> {
    Ok(())
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

const GITHUB_TOKEN_PREFIXES: &[&str] = &["ghp_", "github_pat_", "gho_", "ghu_"];

pub fn github_paste_token() -> Result<()> {
    let mut auth = load_auth()?;
    let token = prompt_secret("Paste GitHub token (starts with ghp_ or github_pat_)")?;
    if !GITHUB_TOKEN_PREFIXES.iter().any(|p| token.starts_with(p)) {
        bail!("token didn't look like a GitHub token (expected prefix ghp_ or github_pat_)");
    }
    auth.github_token = Some(token);
    save_auth(&auth)?;
    println!("Saved GitHub token to ~/.portrait/auth.json");
    Ok(())
}

pub fn anthropic_paste_token() -> Result<()> {
    let mut auth = load_auth()?;
    let token = prompt_secret("Paste Anthropic token (starts with sk-ant-)")?;
    if !token.starts_with("sk-ant-") {
        bail!("token didn't look like an Anthropic token (expected prefix sk-ant-)");
    }
    auth.anthropic_token = Some(token);
    save_auth(&auth)?;
    println!("Saved Anthropic token to ~/.portrait/auth.json");
    Ok(())
}

pub fn openai_paste_api_key() -> Result<()> {
    let mut auth = load_auth()?;
    let key = prompt_secret("Paste OpenAI API key (starts with sk-)")?;
    if !key.starts_with("sk-") {
        bail!("key didn't look like an OpenAI API key (expected prefix sk-)");
    }
    auth.openai_api_key = Some(key);
    save_auth(&auth)?;
    println!("Saved OpenAI API key to ~/.portrait/auth.json");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_stored_values() {
        let stored = AuthState {
            github_token: Some("ghp_stored".into()),
            anthropic_token: Some("sk-ant-stored".into()),
            openai_api_key: None,
        };
        let resolved = stored.with_overrides(|name| match name {
            "GITHUB_TOKEN" => Some("ghp_env".into()),
            "OPENAI_API_KEY" => Some("sk-env".into()),
            "ANTHROPIC_API_KEY" => Some("   ".into()),
            _ => None,
        });
        assert_eq!(resolved.github_token.as_deref(), Some("ghp_env"));
        assert_eq!(resolved.anthropic_token.as_deref(), Some("sk-ant-stored"));
        assert_eq!(resolved.openai_api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    fn test_auth_file_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("auth.json");
        assert_eq!(load_auth_from(&p).unwrap(), AuthState::default());

        let auth = AuthState { github_token: Some("ghp_x".into()), ..AuthState::default() };
        save_auth_to(&auth, &p).unwrap();
        assert_eq!(load_auth_from(&p).unwrap(), auth);
    }
}
