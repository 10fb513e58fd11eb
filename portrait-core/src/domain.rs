//! Domain taxonomy, per-profile domain scores and the classifier seam.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::profile::RawProfile;

/// Default number of focus areas.
pub const DEFAULT_TOP_K: usize = 3;

/// Fixed set of subject-matter domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DomainTag {
    #[serde(rename = "ai_ml")]
    AiMl,
    #[serde(rename = "web_frontend")]
    WebFrontend,
    #[serde(rename = "web_backend")]
    WebBackend,
    #[serde(rename = "game_dev")]
    GameDev,
    #[serde(rename = "systems")]
    Systems,
    #[serde(rename = "security")]
    Security,
    #[serde(rename = "data")]
    Data,
    #[serde(rename = "mobile")]
    Mobile,
    #[serde(rename = "devops")]
    DevOps,
    #[serde(rename = "other")]
    Other,
}

impl DomainTag {
    pub const ALL: [DomainTag; 10] = [
        DomainTag::AiMl,
        DomainTag::WebFrontend,
        DomainTag::WebBackend,
        DomainTag::GameDev,
        DomainTag::Systems,
        DomainTag::Security,
        DomainTag::Data,
        DomainTag::Mobile,
        DomainTag::DevOps,
        DomainTag::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DomainTag::AiMl => "AI/ML",
            DomainTag::WebFrontend => "Web Frontend",
            DomainTag::WebBackend => "Web Backend",
            DomainTag::GameDev => "Game Development",
            DomainTag::Systems => "Systems Programming",
            DomainTag::Security => "Cybersecurity",
            DomainTag::Data => "Data Science",
            DomainTag::Mobile => "Mobile",
            DomainTag::DevOps => "DevOps/Infra",
            DomainTag::Other => "Other",
        }
    }

    /// Lenient parse of a domain name as an oracle might phrase it.
    pub fn from_label(raw: &str) -> Option<DomainTag> {
        let key: String = raw
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '*')
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        let tag = match key.as_str() {
            "aiml" | "ai" | "ml" | "machinelearning" | "aimachinelearning" | "artificialintelligence" => {
                DomainTag::AiMl
            }
            "webfrontend" | "frontend" => DomainTag::WebFrontend,
            "webbackend" | "backend" => DomainTag::WebBackend,
            "gamedevelopment" | "gamedev" | "games" | "gaming" => DomainTag::GameDev,
            "systems" | "systemsprogramming" | "embedded" | "operatingsystems" => DomainTag::Systems,
            "cybersecurity" | "security" | "infosec" => DomainTag::Security,
            "datascience" | "data" | "datascienceanalytics" | "analytics" | "dataengineering" => {
                DomainTag::Data
            }
            "mobile" | "mobiledevelopment" => DomainTag::Mobile,
            "devopsinfra" | "devops" | "infrastructure" | "devopsinfrastructure" => DomainTag::DevOps,
            "other" | "generalist" => DomainTag::Other,
            _ => return None,
        };
        Some(tag)
    }
}

impl fmt::Display for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Domain tag -> summed confidence.
///
/// Weights are computed per repository (each in `[0, 1]`) and summed.
/// They are never renormalized, so a profile can hold several strong
/// domains at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub weights: BTreeMap<DomainTag, f64>,
}

impl DomainScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one repository's contribution. Confidence is clamped to `[0, 1]`;
    /// non-finite values contribute nothing.
    pub fn add(&mut self, tag: DomainTag, confidence: f64) {
        if !confidence.is_finite() {
            return;
        }
        let c = confidence.clamp(0.0, 1.0);
        *self.weights.entry(tag).or_insert(0.0) += c;
    }

    pub fn merge(&mut self, other: &DomainScore) {
        for (tag, w) in &other.weights {
            *self.weights.entry(*tag).or_insert(0.0) += w;
        }
    }

    pub fn weight(&self, tag: DomainTag) -> f64 {
        self.weights.get(&tag).copied().unwrap_or(0.0)
    }

    pub fn is_zero(&self) -> bool {
        self.weights.values().all(|w| *w <= 0.0)
    }

    /// Top `k` domains with a positive weight, heaviest first.
    /// Equal weights keep taxonomy order.
    pub fn top_k(&self, k: usize) -> Vec<(DomainTag, f64)> {
        let mut ranked: Vec<(DomainTag, f64)> = self
            .weights
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .map(|(t, w)| (*t, *w))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }

    pub fn focus_areas(&self, k: usize) -> Vec<DomainTag> {
        self.top_k(k).into_iter().map(|(t, _)| t).collect()
    }
}

/// Input triple for classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoText {
    pub name: String,
    pub readme: String,
    pub language: Option<String>,
}

impl RepoText {
    pub fn new(name: impl Into<String>, readme: impl Into<String>, language: Option<&str>) -> Self {
        Self {
            name: name.into(),
            readme: readme.into(),
            language: language.map(str::to_string),
        }
    }

    /// Authored repositories of a profile, in profile order.
    pub fn from_profile(profile: &RawProfile) -> Vec<RepoText> {
        profile
            .repositories
            .iter()
            .filter(|r| r.is_authored())
            .map(|r| RepoText {
                name: r.name.clone(),
                readme: r.classification_text(),
                language: r.primary_language.clone(),
            })
            .collect()
    }
}

/// Result of one classification run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub score: DomainScore,
    /// Repositories that contributed nothing because the classifier
    /// degraded (oracle failure, quota, malformed answer).
    pub degraded: Vec<String>,
}

impl Classification {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Strategy seam for domain classification. Implementations absorb their
/// own failures; a classifier never aborts the pipeline.
pub trait DomainClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn classify(&self, repos: &[RepoText]) -> Classification;
}
