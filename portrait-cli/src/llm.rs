//! Language-model oracle for domain classification (Anthropic or OpenAI).

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

use portrait_classify::{DomainOracle, OracleError, classification_prompt, parse_oracle_response};
use portrait_core::domain::{DomainTag, RepoText};

use crate::auth::AuthState;
use crate::config::LlmSection;
use crate::runtime;

const SYSTEM: &str = "You label software repositories by subject domain. Answer with JSON only.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn parse(s: &str) -> Option<Provider> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Some(Provider::Anthropic),
            "openai" => Some(Provider::OpenAI),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Oracle settings plus the matching credential, or `None` when the
/// provider is unknown or its credential is missing.
pub fn oracle_config(cfg: &LlmSection, auth: &AuthState) -> Option<(LlmConfig, String)> {
    let provider = Provider::parse(&cfg.provider)?;
    let token = match provider {
        Provider::Anthropic => auth.anthropic_token.clone()?,
        Provider::OpenAI => auth.openai_api_key.clone()?,
    };
    Some((
        LlmConfig {
            provider,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            timeout: Duration::from_secs(cfg.timeout_secs),
        },
        token,
    ))
}

pub struct LlmOracle {
    config: LlmConfig,
    token: String,
    client: Client,
    handle: Handle,
}

impl LlmOracle {
    pub fn new(config: LlmConfig, token: String, handle: Handle) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, token, client, handle })
    }

    async fn complete(&self, user: &str) -> Result<String, OracleError> {
        match self.config.provider {
            Provider::Anthropic => self.anthropic_complete(user).await,
            Provider::OpenAI => self.openai_complete(user).await,
        }
    }

    async fn anthropic_complete(&self, user: &str) -> Result<String, OracleError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: u32,
            temperature: f32,
            system: &'a str,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            t: String,
            text: Option<String>,
        }

        let body = Req {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: SYSTEM,
            messages: vec![Msg { role: "user", content: user }],
        };

        let mut headers = HeaderMap::new();
        // API keys go in x-api-key; setup tokens are bearer tokens.
        let credential = if self.token.starts_with("sk-ant-api") {
            ("x-api-key", self.token.clone())
        } else {
            ("authorization", format!("Bearer {}", self.token))
        };
        let mut value = HeaderValue::from_str(&credential.1).map_err(|e| OracleError::Unauthorized(e.to_string()))?;
        value.set_sensitive(true);
        headers.insert(credential.0, value);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &txt));
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(format!("anthropic envelope: {e}")))?;
        let mut s = String::new();
        for b in out.content {
            if b.t == "text" {
                if let Some(t) = b.text {
                    s.push_str(&t);
                }
            }
        }
        Ok(s.trim().to_string())
    }

    async fn openai_complete(&self, user: &str) -> Result<String, OracleError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.config.model,
            messages: vec![
                Msg { role: "system", content: SYSTEM },
                Msg { role: "user", content: user },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &txt));
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(format!("openai envelope: {e}")))?;
        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}

impl DomainOracle for LlmOracle {
    fn name(&self) -> &'static str {
        match self.config.provider {
            Provider::Anthropic => "anthropic",
            Provider::OpenAI => "openai",
        }
    }

    fn classify_readme(&self, repo: &RepoText) -> Result<Vec<(DomainTag, f64)>, OracleError> {
        let prompt = classification_prompt(repo);
        let reply = runtime::block_on(&self.handle, self.complete(&prompt))?;
        debug!(repo = %repo.name, reply = %reply, "oracle reply");
        parse_oracle_response(&reply)
    }
}

fn request_error(e: reqwest::Error) -> OracleError {
    if e.is_timeout() {
        OracleError::Timeout
    } else {
        OracleError::Transport(e.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> OracleError {
    let detail: String = body.chars().take(200).collect();
    match status {
        StatusCode::TOO_MANY_REQUESTS => OracleError::QuotaExceeded,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OracleError::Unauthorized(format!("{status} {detail}")),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => OracleError::Timeout,
        _ => OracleError::Transport(format!("{status} {detail}")),
    }
}
