//! Contribution signals beyond raw activity: repositories tied to widely
//! used frameworks, and what kind of pull requests the account opens.

use serde::{Deserialize, Serialize};

use crate::profile::{RawProfile, Repository};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Impact {
    Legendary,
    High,
}

impl Impact {
    pub fn multiplier(&self) -> f64 {
        match self {
            Impact::Legendary => 10.0,
            Impact::High => 5.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Impact::Legendary => "legendary",
            Impact::High => "high",
        }
    }
}

/// A framework whose contributors are recognised on sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framework {
    pub name: &'static str,
    pub category: &'static str,
    pub kind: &'static str,
    pub impact: Impact,
}

const fn fw(name: &'static str, category: &'static str, kind: &'static str, impact: Impact) -> Framework {
    Framework { name, category, kind, impact }
}

pub const HIGH_PROFILE_FRAMEWORKS: &[Framework] = &[
    fw("pytorch", "AI/ML", "deep learning", Impact::Legendary),
    fw("tensorflow", "AI/ML", "deep learning", Impact::Legendary),
    fw("scikit-learn", "AI/ML", "machine learning", Impact::Legendary),
    fw("xgboost", "AI/ML", "machine learning", Impact::High),
    fw("pandas", "Data Science", "data processing", Impact::Legendary),
    fw("numpy", "Data Science", "numerical computing", Impact::Legendary),
    fw("tvm", "AI/ML", "compiler optimization", Impact::High),
    fw("react", "Web Frontend", "ui framework", Impact::Legendary),
    fw("vue", "Web Frontend", "ui framework", Impact::Legendary),
    fw("angular", "Web Frontend", "ui framework", Impact::Legendary),
    fw("django", "Web Backend", "web framework", Impact::Legendary),
    fw("flask", "Web Backend", "web framework", Impact::High),
    fw("nodejs", "Web Backend", "runtime", Impact::Legendary),
    fw("linux", "Operating Systems", "kernel", Impact::Legendary),
    fw("git", "DevOps/Infra", "version control", Impact::Legendary),
    fw("kubernetes", "DevOps/Infra", "orchestration", Impact::Legendary),
    fw("docker", "DevOps/Infra", "containerization", Impact::Legendary),
    fw("rust", "Systems Programming", "language", Impact::High),
    fw("golang", "Systems Programming", "language", Impact::High),
    fw("typescript", "Web Development", "language", Impact::High),
];

/// First framework the repository name refers to. A name matches when it
/// equals the framework, or when one of its `-`, `_` or `.` separated
/// parts does (`react-native`, `linux_kernel`, `my.numpy`).
pub fn match_framework(repo_name: &str) -> Option<&'static Framework> {
    let name = repo_name.trim().to_ascii_lowercase();
    if name.is_empty() {
        return None;
    }
    HIGH_PROFILE_FRAMEWORKS.iter().find(|f| {
        name == f.name || name.split(['-', '_', '.']).any(|part| part == f.name)
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkContribution {
    pub framework: String,
    pub repository: String,
    pub category: String,
    pub impact: Impact,
    pub stars: u32,
    pub forks: u32,
    pub is_owner: bool,
    pub impact_score: f64,
}

impl FrameworkContribution {
    fn new(framework: &Framework, repo: &Repository) -> Self {
        let score = framework.impact.multiplier()
            * (1.0 + f64::from(repo.stars) / 1000.0 + f64::from(repo.forks_received) / 100.0);
        Self {
            framework: framework.name.to_string(),
            repository: repo.name.clone(),
            category: framework.category.to_string(),
            impact: framework.impact,
            stars: repo.stars,
            forks: repo.forks_received,
            is_owner: repo.is_owner,
            impact_score: score,
        }
    }
}

/// One entry per framework, in table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighProfileContributions {
    pub contributions: Vec<FrameworkContribution>,
    pub total_impact_score: f64,
}

impl HighProfileContributions {
    pub fn legendary_count(&self) -> usize {
        self.count(Impact::Legendary)
    }

    pub fn high_count(&self) -> usize {
        self.count(Impact::High)
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    /// Framework names, highest impact score first.
    pub fn top_frameworks(&self, n: usize) -> Vec<&str> {
        let mut ranked: Vec<&FrameworkContribution> = self.contributions.iter().collect();
        ranked.sort_by(|a, b| b.impact_score.total_cmp(&a.impact_score));
        ranked.into_iter().take(n).map(|c| c.framework.as_str()).collect()
    }

    fn count(&self, impact: Impact) -> usize {
        self.contributions.iter().filter(|c| c.impact == impact).count()
    }
}

/// Scan every repository, forks included: a fork of a framework is how
/// outside contributors usually work on it. When several repositories
/// match the same framework the highest-scoring one is kept.
pub fn detect_high_profile(profile: &RawProfile) -> HighProfileContributions {
    let mut found: Vec<(usize, FrameworkContribution)> = Vec::new();
    for repo in &profile.repositories {
        let Some(framework) = match_framework(&repo.name) else {
            continue;
        };
        let position = HIGH_PROFILE_FRAMEWORKS.iter().position(|f| f.name == framework.name).unwrap_or(usize::MAX);
        let contribution = FrameworkContribution::new(framework, repo);
        match found.iter_mut().find(|(p, _)| *p == position) {
            Some((_, existing)) if existing.impact_score >= contribution.impact_score => {}
            Some((_, existing)) => *existing = contribution,
            None => found.push((position, contribution)),
        }
    }
    found.sort_by_key(|(p, _)| *p);

    let contributions: Vec<FrameworkContribution> = found.into_iter().map(|(_, c)| c).collect();
    let total_impact_score = contributions.iter().map(|c| c.impact_score).sum();
    HighProfileContributions { contributions, total_impact_score }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrKind {
    Feature,
    Fix,
    Docs,
    Test,
    Other,
}

/// Checked in order; the first kind with a hit wins.
const PR_KEYWORDS: &[(PrKind, &[&str], &[&str])] = &[
    (PrKind::Feature, &["feat:", "feature:"], &["add", "adds", "added", "implement", "implements", "new"]),
    (PrKind::Fix, &["fix:", "bug:", "hotfix:", "patch:"], &["fix", "fixes", "fixed", "resolve", "resolves"]),
    (PrKind::Docs, &["docs:", "doc:"], &["readme", "documentation", "docs"]),
    (PrKind::Test, &["test:", "tests:", "spec:"], &["testing", "tests"]),
];

/// Kind of a pull request, judged from its title.
pub fn classify_pull_request(title: &str) -> PrKind {
    let lower = title.to_lowercase();
    let words: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();
    for (kind, prefixes, keywords) in PR_KEYWORDS {
        if prefixes.iter().any(|p| lower.contains(p)) || words.iter().any(|w| keywords.contains(w)) {
            return *kind;
        }
    }
    PrKind::Other
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    FeatureCreator,
    BugFixer,
    DocWriter,
}

impl Archetype {
    pub fn label(&self) -> &'static str {
        match self {
            Archetype::FeatureCreator => "Feature Creator",
            Archetype::BugFixer => "Bug Fixer",
            Archetype::DocWriter => "Documentation Writer",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrKindCounts {
    pub feature: u32,
    pub fix: u32,
    pub docs: u32,
    pub test: u32,
    pub other: u32,
}

impl PrKindCounts {
    fn bump(&mut self, kind: PrKind) {
        let slot = match kind {
            PrKind::Feature => &mut self.feature,
            PrKind::Fix => &mut self.fix,
            PrKind::Docs => &mut self.docs,
            PrKind::Test => &mut self.test,
            PrKind::Other => &mut self.other,
        };
        *slot = slot.saturating_add(1);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestProfile {
    pub total: u32,
    pub kinds: PrKindCounts,
    pub archetypes: Vec<Archetype>,
}

pub fn analyze_pull_requests(titles: &[String]) -> PullRequestProfile {
    let mut kinds = PrKindCounts::default();
    for title in titles {
        kinds.bump(classify_pull_request(title));
    }

    let mut archetypes = Vec::new();
    if kinds.feature > 2 {
        archetypes.push(Archetype::FeatureCreator);
    }
    if kinds.fix > kinds.feature {
        archetypes.push(Archetype::BugFixer);
    }
    if kinds.docs > 1 {
        archetypes.push(Archetype::DocWriter);
    }

    PullRequestProfile {
        total: u32::try_from(titles.len()).unwrap_or(u32::MAX),
        kinds,
        archetypes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_matching() {
        assert_eq!(match_framework("pytorch").map(|f| f.name), Some("pytorch"));
        assert_eq!(match_framework("React").map(|f| f.name), Some("react"));
        assert_eq!(match_framework("react-native").map(|f| f.name), Some("react"));
        assert_eq!(match_framework("linux_kernel_notes").map(|f| f.name), Some("linux"));
        assert_eq!(match_framework("scikit-learn").map(|f| f.name), Some("scikit-learn"));
        // Substrings of unrelated words do not count.
        assert_eq!(match_framework("digital-garden"), None);
        assert_eq!(match_framework("trusty"), None);
        assert_eq!(match_framework(""), None);
    }

    #[test]
    fn test_detect_high_profile_scores_and_counts() {
        let profile = RawProfile::new("octo")
            .with_repository(Repository::new("pytorch").forked().not_owned().with_stars(2000).with_forks_received(100))
            .with_repository(Repository::new("flask-extras").with_stars(0))
            .with_repository(Repository::new("dotfiles"));
        let hp = detect_high_profile(&profile);

        assert_eq!(hp.contributions.len(), 2);
        assert_eq!(hp.contributions[0].framework, "pytorch");
        assert!((hp.contributions[0].impact_score - 40.0).abs() < 1e-9);
        assert!(!hp.contributions[0].is_owner);
        assert!((hp.contributions[1].impact_score - 5.0).abs() < 1e-9);
        assert!((hp.total_impact_score - 45.0).abs() < 1e-9);
        assert_eq!(hp.legendary_count(), 1);
        assert_eq!(hp.high_count(), 1);
        assert_eq!(hp.top_frameworks(1), vec!["pytorch"]);
    }

    #[test]
    fn test_same_framework_keeps_best_repository() {
        let profile = RawProfile::new("octo")
            .with_repository(Repository::new("react-demo"))
            .with_repository(Repository::new("react").with_stars(5000));
        let hp = detect_high_profile(&profile);
        assert_eq!(hp.contributions.len(), 1);
        assert_eq!(hp.contributions[0].repository, "react");
    }

    #[test]
    fn test_no_frameworks() {
        let hp = detect_high_profile(&RawProfile::new("octo").with_repository(Repository::new("blog")));
        assert!(hp.is_empty());
        assert_eq!(hp.total_impact_score, 0.0);
    }

    #[test]
    fn test_pull_request_kinds() {
        assert_eq!(classify_pull_request("feat: streaming parser"), PrKind::Feature);
        assert_eq!(classify_pull_request("Add retry to client"), PrKind::Feature);
        assert_eq!(classify_pull_request("Fix panic on empty input"), PrKind::Fix);
        assert_eq!(classify_pull_request("hotfix: bad header"), PrKind::Fix);
        assert_eq!(classify_pull_request("Update README"), PrKind::Docs);
        assert_eq!(classify_pull_request("tests: cover the cache"), PrKind::Test);
        assert_eq!(classify_pull_request("Bump serde to 1.0.200"), PrKind::Other);
        // Whole words only: "address" is not "add".
        assert_eq!(classify_pull_request("Address review comments"), PrKind::Other);
    }

    #[test]
    fn test_archetypes_from_titles() {
        let titles: Vec<String> = [
            "fix: crash on start",
            "Fix typo in handler",
            "docs: usage",
            "Improve README examples",
            "refactor module layout",
        ]
        .iter()
        .map(|t| t.to_string())
        .collect();
        let pr = analyze_pull_requests(&titles);
        assert_eq!(pr.total, 5);
        assert_eq!(pr.kinds, PrKindCounts { feature: 0, fix: 2, docs: 2, test: 0, other: 1 });
        assert_eq!(pr.archetypes, vec![Archetype::BugFixer, Archetype::DocWriter]);

        let features: Vec<String> = (0..3).map(|i| format!("feat: thing {i}")).collect();
        assert_eq!(analyze_pull_requests(&features).archetypes, vec![Archetype::FeatureCreator]);
        assert!(analyze_pull_requests(&[]).archetypes.is_empty());
    }
}
