//! Frontend / backend focus of the account's own repositories.
//!
//! Each authored repository is judged from its name, description, README
//! and language mix, then weighted by popularity. Repositories with no
//! signal either way are left out.

use serde::{Deserialize, Serialize};

use crate::profile::{RawProfile, Repository};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackFocus {
    Frontend,
    Backend,
    FullStack,
    FrontendLeaning,
    BackendLeaning,
}

impl StackFocus {
    pub fn label(&self) -> &'static str {
        match self {
            StackFocus::Frontend => "Frontend",
            StackFocus::Backend => "Backend",
            StackFocus::FullStack => "Full-stack",
            StackFocus::FrontendLeaning => "Frontend-leaning",
            StackFocus::BackendLeaning => "Backend-leaning",
        }
    }
}

/// Side of the stack one repository sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepoSide {
    Frontend,
    Backend,
    FullStack,
}

const FRONTEND_TERMS: &[&str] = &[
    "frontend", "front-end", "ui", "user interface", "react", "vue", "angular", "svelte", "css",
    "tailwind", "component", "components", "design system", "website", "web app", "mobile app",
    "ios", "android", "browser", "dashboard",
];

const BACKEND_TERMS: &[&str] = &[
    "backend", "back-end", "api", "server", "database", "microservice", "microservices", "grpc",
    "rest", "postgres", "sql", "queue", "infrastructure", "cli", "daemon", "scheduler", "kernel",
    "compiler",
];

const FULLSTACK_TERMS: &[&str] = &["full-stack", "fullstack", "full stack"];

const FRONTEND_LANGUAGES: &[&str] = &["CSS", "SCSS", "HTML", "Vue", "Svelte", "Dart", "Swift", "Kotlin"];

const BACKEND_LANGUAGES: &[&str] = &["Go", "Rust", "Java", "C", "C++", "Elixir", "Erlang", "Scala"];

/// A side needs at least this share of the smaller score against the
/// larger one before the repository counts as full-stack.
const FULLSTACK_BALANCE: f64 = 0.5;

/// Language share above which a language adds a point to its side.
const LANGUAGE_SIGNAL_SHARE: f64 = 0.2;

fn padded_words(text: &str) -> String {
    let words: Vec<String> = text
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    format!(" {} ", words.join(" "))
}

fn hits(text: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|t| text.contains(&format!(" {t} "))).count()
}

fn language_hits(repo: &Repository, languages: &[&str]) -> usize {
    let total: u64 = repo.languages.values().fold(0u64, |acc, b| acc.saturating_add(*b));
    if total == 0 {
        return usize::from(repo.primary_language.as_deref().is_some_and(|l| languages.contains(&l)));
    }
    repo.languages
        .iter()
        .filter(|(lang, bytes)| languages.contains(&lang.as_str()) && **bytes as f64 / total as f64 > LANGUAGE_SIGNAL_SHARE)
        .count()
}

/// `None` when nothing in the repository points either way.
pub fn classify_repo(repo: &Repository) -> Option<RepoSide> {
    let text = padded_words(&format!("{} {}", repo.name.replace(['_', '.'], " "), repo.classification_text()));
    if hits(&text, FULLSTACK_TERMS) > 0 {
        return Some(RepoSide::FullStack);
    }

    let front = hits(&text, FRONTEND_TERMS) + language_hits(repo, FRONTEND_LANGUAGES);
    let back = hits(&text, BACKEND_TERMS) + language_hits(repo, BACKEND_LANGUAGES);
    match (front, back) {
        (0, 0) => None,
        (f, b) if f.min(b) as f64 >= f.max(b) as f64 * FULLSTACK_BALANCE => Some(RepoSide::FullStack),
        (f, b) if f > b => Some(RepoSide::Frontend),
        _ => Some(RepoSide::Backend),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSummary {
    pub primary: StackFocus,
    pub frontend_score: f64,
    pub backend_score: f64,
    pub fullstack_score: f64,
    pub analyzed: usize,
}

impl FocusSummary {
    fn ratio(&self, score: f64) -> f64 {
        let total = self.frontend_score + self.backend_score + self.fullstack_score;
        if total > 0.0 { score / total } else { 0.0 }
    }

    pub fn frontend_ratio(&self) -> f64 {
        self.ratio(self.frontend_score)
    }

    pub fn backend_ratio(&self) -> f64 {
        self.ratio(self.backend_score)
    }

    pub fn fullstack_ratio(&self) -> f64 {
        self.ratio(self.fullstack_score)
    }
}

fn primary_focus(frontend: f64, backend: f64, fullstack: f64) -> StackFocus {
    let total = frontend + backend + fullstack;
    let (f, b, fs) = (frontend / total, backend / total, fullstack / total);
    if f > 0.5 {
        StackFocus::Frontend
    } else if b > 0.5 {
        StackFocus::Backend
    } else if fs > 0.3 {
        StackFocus::FullStack
    } else if f > b {
        StackFocus::FrontendLeaning
    } else {
        StackFocus::BackendLeaning
    }
}

/// Focus over authored repositories. `None` when no repository gives a signal.
pub fn classify_focus(profile: &RawProfile) -> Option<FocusSummary> {
    let (mut frontend, mut backend, mut fullstack) = (0.0, 0.0, 0.0);
    let mut analyzed = 0;

    for repo in profile.repositories.iter().filter(|r| r.is_authored()) {
        let Some(side) = classify_repo(repo) else {
            continue;
        };
        let weight = 1.0 + f64::from(repo.stars) / 100.0;
        match side {
            RepoSide::Frontend => frontend += weight,
            RepoSide::Backend => backend += weight,
            RepoSide::FullStack => fullstack += weight,
        }
        analyzed += 1;
    }

    if analyzed == 0 {
        return None;
    }
    Some(FocusSummary {
        primary: primary_focus(frontend, backend, fullstack),
        frontend_score: frontend,
        backend_score: backend,
        fullstack_score: fullstack,
        analyzed,
    })
}
