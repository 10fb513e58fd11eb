//! OpenAI Images client implementing `ImageGenerator`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::info;

use portrait_core::error::ImageError;
use portrait_core::services::ImageGenerator;

use crate::config::ImageSection;
use crate::runtime;

const API_BASE: &str = "https://api.openai.com/v1/images";

pub struct OpenAiImages {
    client: Client,
    handle: Handle,
    api_key: String,
    model: String,
    size: String,
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

impl OpenAiImages {
    pub fn new(cfg: &ImageSection, api_key: String, handle: Handle) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(cfg.timeout_secs)).build()?;
        Ok(Self {
            client,
            handle,
            api_key,
            model: cfg.model.clone(),
            size: cfg.size.clone(),
        })
    }

    /// DALL-E models only return base64 when asked to.
    fn response_format(&self) -> Option<&'static str> {
        self.model.starts_with("dall-e").then_some("b64_json")
    }

    async fn request(&self, prompt: &str, reference: Option<&[u8]>) -> Result<Vec<u8>, ImageError> {
        let builder = match reference {
            None => {
                #[derive(Serialize)]
                struct Req<'a> {
                    model: &'a str,
                    prompt: &'a str,
                    size: &'a str,
                    n: u32,
                    #[serde(skip_serializing_if = "Option::is_none")]
                    response_format: Option<&'a str>,
                }
                let body = Req {
                    model: &self.model,
                    prompt,
                    size: &self.size,
                    n: 1,
                    response_format: self.response_format(),
                };
                self.client.post(format!("{API_BASE}/generations")).json(&body)
            }
            Some(bytes) => {
                let image = Part::bytes(bytes.to_vec())
                    .file_name("reference.png")
                    .mime_str("image/png")
                    .map_err(|e| ImageError::Transport(e.to_string()))?;
                let mut form = Form::new()
                    .text("model", self.model.clone())
                    .text("prompt", prompt.to_string())
                    .text("size", self.size.clone())
                    .part("image", image);
                if let Some(fmt) = self.response_format() {
                    form = form.text("response_format", fmt);
                }
                self.client.post(format!("{API_BASE}/edits")).multipart(form)
            }
        };

        let resp = builder
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(request_error)?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &txt));
        }

        let out: ImagesResponse = resp.json().await.map_err(|e| ImageError::Transport(format!("decode response: {e}")))?;
        let datum = out.data.into_iter().next().ok_or(ImageError::EmptyResponse)?;

        if let Some(b64) = datum.b64_json {
            return STANDARD
                .decode(b64.trim())
                .map_err(|e| ImageError::Transport(format!("decode image: {e}")));
        }
        let url = datum.url.ok_or(ImageError::EmptyResponse)?;
        let resp = self.client.get(&url).send().await.map_err(request_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(download_error(status));
        }
        let bytes = resp.bytes().await.map_err(request_error)?;
        Ok(bytes.to_vec())
    }
}

impl ImageGenerator for OpenAiImages {
    fn generate(&self, prompt: &str, reference: Option<&[u8]>) -> Result<Vec<u8>, ImageError> {
        info!(model = %self.model, with_reference = reference.is_some(), "requesting image");
        runtime::block_on(&self.handle, self.request(prompt, reference))
    }
}

fn request_error(e: reqwest::Error) -> ImageError {
    if e.is_timeout() {
        ImageError::Timeout
    } else {
        ImageError::Transport(e.to_string())
    }
}

fn status_error(status: StatusCode, body: &str) -> ImageError {
    let detail: String = body.chars().take(300).collect();
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ImageError::Rejected(format!("{status} {detail}"))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ImageError::Timeout,
        _ => ImageError::Transport(format!("{status} {detail}")),
    }
}

/// The hosted image URL expired or was refused.
fn download_error(status: StatusCode) -> ImageError {
    ImageError::Unavailable(format!("download returned {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(status_error(StatusCode::BAD_REQUEST, "safety"), ImageError::Rejected(m) if m.contains("safety")));
        assert_eq!(status_error(StatusCode::GATEWAY_TIMEOUT, ""), ImageError::Timeout);
        assert!(matches!(status_error(StatusCode::TOO_MANY_REQUESTS, ""), ImageError::Transport(_)));
    }

    #[test]
    fn test_failed_download_is_unavailable() {
        assert_eq!(
            download_error(StatusCode::FORBIDDEN),
            ImageError::Unavailable("download returned 403 Forbidden".into())
        );
        assert!(matches!(download_error(StatusCode::NOT_FOUND), ImageError::Unavailable(m) if m.contains("404")));
    }

    #[test]
    fn test_response_parsing() {
        let out: ImagesResponse = serde_json::from_str(r#"{"created": 1, "data": [{"b64_json": "iVBORw=="}]}"#).unwrap();
        assert_eq!(out.data[0].b64_json.as_deref(), Some("iVBORw=="));
        let empty: ImagesResponse = serde_json::from_str(r#"{"created": 1}"#).unwrap();
        assert!(empty.data.is_empty());
    }
}
