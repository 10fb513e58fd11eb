use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use portrait_classify::{
    ClassificationCache, DomainOracle, HeuristicClassifier, OracleClassifier, OracleError,
    RequestBudget, parse_oracle_response,
};
use portrait_core::style::DEFAULT_BACKGROUND;
use portrait_core::{
    Background, DomainTag, NoCache, Pipeline, RawProfile, RepoText, Repository, StaticSource,
};

struct TimingOut;

impl DomainOracle for TimingOut {
    fn name(&self) -> &'static str {
        "timing-out"
    }

    fn classify_readme(&self, _repo: &RepoText) -> Result<Vec<(DomainTag, f64)>, OracleError> {
        Err(OracleError::Timeout)
    }
}

/// Answers with a canned JSON reply and counts calls.
struct Canned {
    reply: &'static str,
    calls: Arc<AtomicUsize>,
}

impl DomainOracle for Canned {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn classify_readme(&self, _repo: &RepoText) -> Result<Vec<(DomainTag, f64)>, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        parse_oracle_response(self.reply)
    }
}

fn profile() -> RawProfile {
    RawProfile::new("mlfolk")
        .with_repository(
            Repository::new("vision")
                .with_language("Python", 8000)
                .with_readme("Computer vision models trained with PyTorch"),
        )
        .with_repository(
            Repository::new("notebooks")
                .with_language("Jupyter Notebook", 2000)
                .with_readme("Data analysis notebooks built on pandas"),
        )
        .with_repository(Repository::new("upstream").with_readme("forked tensorflow").forked())
        .with_commits(["2026-03-02T22:10:00Z", "2026-03-03T23:40:00Z", "2026-03-07T01:00:00Z"])
}

#[test]
fn test_all_timeouts_still_compose() {
    let source = StaticSource::new(vec![profile()]);
    let classifier = OracleClassifier::new(
        Box::new(TimingOut),
        Arc::new(RequestBudget::unlimited()),
        Arc::new(ClassificationCache::new()),
    );
    let report = Pipeline::new(&source, &classifier, &NoCache).run("mlfolk").unwrap();

    assert!(report.domains.is_zero());
    assert_eq!(report.attributes.background, DEFAULT_BACKGROUND);
    assert!(report.prompts.main.contains("general software"));
    // Forks are never sent for classification.
    assert_eq!(classifier.stats().degraded, 2);
}

#[test]
fn test_shared_cache_spans_classifiers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = Arc::new(ClassificationCache::new());
    let budget = Arc::new(RequestBudget::per_minute(60, 10));
    let reply = r#"{"domains": [{"tag": "AI/ML", "confidence": 0.9}]}"#;

    let first = OracleClassifier::new(
        Box::new(Canned { reply, calls: calls.clone() }),
        budget.clone(),
        cache.clone(),
    );
    let second = OracleClassifier::new(Box::new(Canned { reply, calls: calls.clone() }), budget, cache.clone());

    let source = StaticSource::new(vec![profile()]);
    let a = Pipeline::new(&source, &first, &NoCache).run("mlfolk").unwrap();
    let b = Pipeline::new(&source, &second, &NoCache).run("mlfolk").unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);
    assert_eq!(second.stats().cache_hits, 2);
    assert_eq!(a.domains, b.domains);
    assert_eq!(a.focus_areas, vec![DomainTag::AiMl]);
    assert_eq!(a.attributes.background, Background::NeuralNetwork);
}

#[test]
fn test_heuristic_strategy_end_to_end() {
    let source = StaticSource::new(vec![profile()]);
    let classifier = HeuristicClassifier::default();
    let report = Pipeline::new(&source, &classifier, &NoCache).run("mlfolk").unwrap();

    assert_eq!(report.focus_areas.first(), Some(&DomainTag::Data));
    assert!(report.domains.weight(DomainTag::AiMl) > 0.0);
    assert!(report.warnings.is_empty());
}
