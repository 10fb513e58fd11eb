//! Deterministic keyword scorer.
//!
//! Each domain owns a keyword list; a repository scores one step per
//! keyword hit, capped at 1. The declared language adds a small hint.
//! README text that names no domain at all counts toward `Other`.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use portrait_core::domain::{Classification, DomainClassifier, DomainScore, DomainTag, RepoText};

use crate::text::{DEFAULT_README_CHAR_LIMIT, prepare};

/// Score added per keyword hit.
const HIT_WEIGHT: f64 = 0.25;
/// Score added when the declared language hints at a domain.
const LANGUAGE_HINT_WEIGHT: f64 = 0.25;
/// Score for readable text that matched no domain.
const UNMATCHED_WEIGHT: f64 = 0.5;

const KEYWORDS: &[(DomainTag, &[&str])] = &[
    (
        DomainTag::AiMl,
        &[
            "machine learning", "deep learning", "neural network", "llm", "transformer",
            "pytorch", "tensorflow", "model training", "inference", "embedding", "nlp",
            "computer vision", "reinforcement learning", "fine-tuning", "ai agent",
        ],
    ),
    (
        DomainTag::WebFrontend,
        &[
            "react", "vue", "svelte", "angular", "frontend", "front-end", "css", "tailwind",
            "next.js", "component library", "ui kit", "single page", "browser",
        ],
    ),
    (
        DomainTag::WebBackend,
        &[
            "rest api", "graphql", "backend", "back-end", "microservice", "django", "flask",
            "fastapi", "express", "rails", "spring boot", "web server", "endpoint",
        ],
    ),
    (
        DomainTag::GameDev,
        &[
            "game", "unity", "unreal", "godot", "sprite", "shader", "gameplay", "level editor",
            "physics engine", "multiplayer",
        ],
    ),
    (
        DomainTag::Systems,
        &[
            "kernel", "operating system", "compiler", "interpreter", "embedded", "firmware",
            "allocator", "scheduler", "low-level", "bare metal", "runtime", "file system",
        ],
    ),
    (
        DomainTag::Security,
        &[
            "security", "vulnerability", "exploit", "penetration", "ctf", "malware",
            "cryptography", "encryption", "fuzzing", "reverse engineering", "pentest",
        ],
    ),
    (
        DomainTag::Data,
        &[
            "data science", "data analysis", "pandas", "dataset", "visualization", "etl",
            "data pipeline", "jupyter", "statistics", "dashboard", "sql",
        ],
    ),
    (
        DomainTag::Mobile,
        &[
            "android", "ios", "mobile app", "flutter", "react native", "swiftui",
            "jetpack compose", "xcode",
        ],
    ),
    (
        DomainTag::DevOps,
        &[
            "kubernetes", "docker", "terraform", "ci/cd", "ansible", "helm", "deployment",
            "infrastructure", "monitoring", "github actions", "observability",
        ],
    ),
];

/// Declared language -> domain hint. Keys compare case-insensitively.
const LANGUAGE_HINTS: &[(&str, DomainTag)] = &[
    ("Jupyter Notebook", DomainTag::Data),
    ("R", DomainTag::Data),
    ("HTML", DomainTag::WebFrontend),
    ("CSS", DomainTag::WebFrontend),
    ("Vue", DomainTag::WebFrontend),
    ("Svelte", DomainTag::WebFrontend),
    ("PHP", DomainTag::WebBackend),
    ("GDScript", DomainTag::GameDev),
    ("C", DomainTag::Systems),
    ("Rust", DomainTag::Systems),
    ("Assembly", DomainTag::Systems),
    ("Swift", DomainTag::Mobile),
    ("Kotlin", DomainTag::Mobile),
    ("Dart", DomainTag::Mobile),
    ("Objective-C", DomainTag::Mobile),
    ("HCL", DomainTag::DevOps),
    ("Dockerfile", DomainTag::DevOps),
    ("Shell", DomainTag::DevOps),
];

static RULES: Lazy<Vec<(DomainTag, Regex)>> = Lazy::new(|| {
    KEYWORDS
        .iter()
        .map(|(tag, words)| {
            let alternation = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
            let pattern = format!(r"(?i)\b(?:{alternation})\b");
            (*tag, Regex::new(&pattern).unwrap())
        })
        .collect()
});

pub fn language_hint(language: Option<&str>) -> Option<DomainTag> {
    let lang = language?.trim();
    LANGUAGE_HINTS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(lang))
        .map(|(_, tag)| *tag)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicClassifier {
    readme_char_limit: usize,
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_README_CHAR_LIMIT)
    }
}

impl HeuristicClassifier {
    pub fn new(readme_char_limit: usize) -> Self {
        Self { readme_char_limit }
    }

    /// Per-domain confidence for one repository, each in `[0, 1]`.
    pub fn score_repo(&self, repo: &RepoText) -> Vec<(DomainTag, f64)> {
        let text = prepare(&repo.readme, self.readme_char_limit);
        let hint = language_hint(repo.language.as_deref());

        let mut scores: Vec<(DomainTag, f64)> = RULES
            .iter()
            .filter_map(|(tag, re)| {
                let hits = re.find_iter(&text).count();
                (hits > 0).then(|| (*tag, hits as f64 * HIT_WEIGHT))
            })
            .collect();

        if let Some(tag) = hint {
            match scores.iter_mut().find(|(t, _)| *t == tag) {
                Some((_, w)) => *w += LANGUAGE_HINT_WEIGHT,
                None => scores.push((tag, LANGUAGE_HINT_WEIGHT)),
            }
        }

        if scores.is_empty() && !text.is_empty() {
            scores.push((DomainTag::Other, UNMATCHED_WEIGHT));
        }

        for (_, w) in scores.iter_mut() {
            *w = w.min(1.0);
        }
        debug!(repo = %repo.name, ?scores, "heuristic scores");
        scores
    }
}

impl DomainClassifier for HeuristicClassifier {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn classify(&self, repos: &[RepoText]) -> Classification {
        let mut score = DomainScore::new();
        for repo in repos {
            for (tag, confidence) in self.score_repo(repo) {
                score.add(tag, confidence);
            }
        }
        Classification { score, degraded: Vec::new() }
    }
}
