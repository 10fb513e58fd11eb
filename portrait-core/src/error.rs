//! Error taxonomy.
//!
//! Stage-local problems (bad records, missing table rows, oracle failures)
//! are absorbed where they happen. Only a fetch failure at the profile
//! boundary surfaces as a `PipelineError`.

use thiserror::Error;

/// Malformed or missing profile data. The offending record is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{record}: missing field `{field}`")]
    MissingField { record: String, field: &'static str },

    #[error("{record}: invalid `{field}` value {value:?}")]
    InvalidValue {
        record: String,
        field: &'static str,
        value: String,
    },

    #[error("invalid style selection: {0}")]
    Style(String),
}

/// Failure reported by the hosting-platform data source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("user `{0}` not found")]
    NotFound(String),

    #[error("rate limited{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

fn retry_hint(secs: &Option<u64>) -> String {
    match secs {
        Some(s) => format!(" (retry after {s}s)"),
        None => String::new(),
    }
}

impl SourceError {
    /// Rate limits, timeouts and transport hiccups may succeed on retry;
    /// auth and not-found never will.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::RateLimited { .. } | SourceError::Timeout | SourceError::Transport(_)
        )
    }
}

/// Failure reported by the image-generation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// The service reported an image that could not be retrieved.
    #[error("generated image unavailable: {0}")]
    Unavailable(String),

    #[error("image request rejected: {0}")]
    Rejected(String),

    #[error("image request timed out")]
    Timeout,

    #[error("image service transport error: {0}")]
    Transport(String),

    #[error("image service returned no image data")]
    EmptyResponse,
}

/// Failure fatal to one profile's pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("fetching profile `{login}`: {source}")]
    Fetch {
        login: String,
        #[source]
        source: SourceError,
    },

    /// A stage panicked while processing this profile.
    #[error("processing profile `{login}` aborted: {message}")]
    Aborted { login: String, message: String },
}

impl PipelineError {
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Fetch { source, .. } => source.is_retryable(),
            PipelineError::Aborted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_split() {
        assert!(SourceError::RateLimited { retry_after_secs: Some(30) }.is_retryable());
        assert!(SourceError::Timeout.is_retryable());
        assert!(!SourceError::NotFound("x".into()).is_retryable());
        assert!(!SourceError::Auth("bad token".into()).is_retryable());
    }

    #[test]
    fn test_messages() {
        let e = PipelineError::Fetch {
            login: "octocat".into(),
            source: SourceError::RateLimited { retry_after_secs: Some(60) },
        };
        assert_eq!(e.to_string(), "fetching profile `octocat`: rate limited (retry after 60s)");
        assert!(e.is_retryable());
        assert_eq!(
            SourceError::RateLimited { retry_after_secs: None }.to_string(),
            "rate limited"
        );
    }
}
