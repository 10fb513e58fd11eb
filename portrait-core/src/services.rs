//! Contracts for the external collaborators the pipeline consumes.

use crate::error::{ImageError, SourceError};
use crate::profile::RawProfile;

/// Hosting-platform data source.
pub trait ProfileSource: Send + Sync {
    fn fetch(&self, login: &str) -> Result<RawProfile, SourceError>;
}

/// Generative image service.
pub trait ImageGenerator: Send + Sync {
    /// Render `prompt`, optionally guided by a reference image.
    fn generate(&self, prompt: &str, reference: Option<&[u8]>) -> Result<Vec<u8>, ImageError>;
}

/// A source backed by profiles already in memory. Unknown logins are
/// `NotFound`.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    profiles: Vec<RawProfile>,
}

impl StaticSource {
    pub fn new(profiles: Vec<RawProfile>) -> Self {
        Self { profiles }
    }
}

impl ProfileSource for StaticSource {
    fn fetch(&self, login: &str) -> Result<RawProfile, SourceError> {
        self.profiles
            .iter()
            .find(|p| p.login.eq_ignore_ascii_case(login))
            .cloned()
            .ok_or_else(|| SourceError::NotFound(login.to_string()))
    }
}
