//! Parsing of oracle replies.
//!
//! Accepted shapes, tried in order:
//! - a JSON object `{"domains": [{"tag": "...", "confidence": 0.8}, ...]}`,
//!   possibly wrapped in a markdown code fence or surrounded by prose;
//! - a bare domain name on the first line (`"AI/ML"`), scored at full confidence.

use serde::Deserialize;

use portrait_core::domain::DomainTag;

use crate::oracle::OracleError;

#[derive(Debug, Deserialize)]
struct OracleReply {
    #[serde(default)]
    domains: Vec<OracleDomain>,
}

#[derive(Debug, Deserialize)]
struct OracleDomain {
    #[serde(alias = "domain", alias = "name")]
    tag: String,
    #[serde(default = "full_confidence")]
    confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

pub fn parse_oracle_response(raw: &str) -> Result<Vec<(DomainTag, f64)>, OracleError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(OracleError::MalformedResponse("empty reply".into()));
    }

    if let Some(json) = json_object(text) {
        let reply: OracleReply = serde_json::from_str(json)
            .map_err(|e| OracleError::MalformedResponse(format!("invalid JSON: {e}")))?;
        let tags: Vec<(DomainTag, f64)> = reply
            .domains
            .iter()
            .filter(|d| d.confidence.is_finite())
            .filter_map(|d| DomainTag::from_label(&d.tag).map(|t| (t, d.confidence.clamp(0.0, 1.0))))
            .collect();
        if tags.is_empty() && !reply.domains.is_empty() {
            return Err(OracleError::MalformedResponse("no recognised domain tags".into()));
        }
        return Ok(tags);
    }

    let first = text.lines().next().unwrap_or_default();
    let label = first.trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.' || c.is_whitespace());
    DomainTag::from_label(label)
        .map(|tag| vec![(tag, 1.0)])
        .ok_or_else(|| OracleError::MalformedResponse(format!("unrecognised domain {label:?}")))
}

fn json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
