use portrait_core::style::{ArtStyle, DEFAULT_BACKGROUND};
use portrait_core::{
    ActivityMetrics, Artifact, BehaviorLabels, Classification, ContributionStyle, DayPattern,
    DomainClassifier, DomainScore, DomainTag, HourPattern, ImageError, ImageGenerator, MemoryCache,
    DeveloperCategory, NoCache, Pipeline, PipelineError, PipelineOptions, RawProfile, RepoText,
    Repository, SourceError, StackFocus, StaticSource, VariationRequest,
};
use portrait_core::contributions::Archetype;

/// Classifier whose every oracle call timed out.
struct TimeoutClassifier;

impl DomainClassifier for TimeoutClassifier {
    fn name(&self) -> &'static str {
        "timeout"
    }

    fn classify(&self, repos: &[RepoText]) -> Classification {
        Classification {
            score: DomainScore::new(),
            degraded: repos.iter().map(|r| r.name.clone()).collect(),
        }
    }
}

/// Classifier that tags every repository with one domain.
struct FixedClassifier(DomainTag);

impl DomainClassifier for FixedClassifier {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn classify(&self, repos: &[RepoText]) -> Classification {
        let mut score = DomainScore::new();
        for _ in repos {
            score.add(self.0, 1.0);
        }
        Classification { score, degraded: Vec::new() }
    }
}

/// Classifier that blows up on a repository named `explode`.
struct ExplodingClassifier;

impl DomainClassifier for ExplodingClassifier {
    fn name(&self) -> &'static str {
        "exploding"
    }

    fn classify(&self, repos: &[RepoText]) -> Classification {
        if repos.iter().any(|r| r.name == "explode") {
            panic!("classifier bug");
        }
        FixedClassifier(DomainTag::WebBackend).classify(repos)
    }
}

struct FailingImages;

impl ImageGenerator for FailingImages {
    fn generate(&self, _prompt: &str, _reference: Option<&[u8]>) -> Result<Vec<u8>, ImageError> {
        Err(ImageError::Timeout)
    }
}

struct PngImages;

impl ImageGenerator for PngImages {
    fn generate(&self, _prompt: &str, reference: Option<&[u8]>) -> Result<Vec<u8>, ImageError> {
        let mut bytes = vec![0x89, b'P', b'N', b'G'];
        bytes.extend_from_slice(reference.unwrap_or_default());
        Ok(bytes)
    }
}

/// Mon 2 .. Fri 6 March 2026, afternoons UTC.
fn weekday_afternoon_commits(per_day: usize) -> Vec<String> {
    let mut out = Vec::new();
    for day in 2..=6 {
        for i in 0..per_day {
            out.push(format!("2026-03-{day:02}T{:02}:15:00Z", 13 + (i % 4)));
        }
    }
    out
}

fn solo_day_coder() -> RawProfile {
    RawProfile::new("solodev")
        .with_repository(
            Repository::new("engine")
                .with_language("Rust", 9000)
                .with_language("Shell", 500)
                .with_readme("A tiny kernel scheduler"),
        )
        .with_repository(Repository::new("dotfiles").with_language("Shell", 500))
        .with_commits(weekday_afternoon_commits(4))
}

#[test]
fn test_solo_day_coder_scenario() {
    let profile = solo_day_coder();
    let source = StaticSource::new(vec![profile]);
    let classifier = FixedClassifier(DomainTag::Systems);
    let pipeline = Pipeline::new(&source, &classifier, &NoCache);

    let report = pipeline.run("solodev").unwrap();

    assert_eq!(report.metrics.language_shares()[0].language, "Rust");
    assert!((report.metrics.language_shares()[0].percent - 90.0).abs() < 1e-9);
    assert_eq!(report.labels.contribution, ContributionStyle::SoloCreator);
    assert_eq!(report.labels.temporal.hour, HourPattern::DayCoder);
    assert_eq!(report.labels.temporal.day, DayPattern::WeekdayDeveloper);
    assert_eq!(report.attributes.art_style, ArtStyle::Steampunk);
    assert_eq!(report.focus_areas, vec![DomainTag::Systems]);
    assert_eq!(report.artifact, Artifact::PromptOnly);
    assert!(report.warnings.is_empty());
}

#[test]
fn test_framework_contributor_gets_legendary_styles() {
    let profile = RawProfile::new("torchdev")
        .with_repository(Repository::new("pytorch").forked().not_owned().with_stars(3000))
        .with_repository(Repository::new("ui-kit").with_description("React components for dashboards"))
        .with_commits(weekday_afternoon_commits(2))
        .with_pull_request_titles(["fix: cuda leak", "Fix flaky test", "docs: install notes", "Update README"]);
    let source = StaticSource::new(vec![profile]);
    let classifier = FixedClassifier(DomainTag::AiMl);
    let pipeline = Pipeline::new(&source, &classifier, &NoCache)
        .with_options(PipelineOptions { styles: 4, ..PipelineOptions::default() });

    let report = pipeline.run("torchdev").unwrap();

    assert_eq!(report.category, DeveloperCategory::Legendary);
    assert_eq!(report.high_profile.legendary_count(), 1);
    assert_eq!(report.stack_focus.as_ref().map(|f| f.primary), Some(StackFocus::Frontend));
    assert_eq!(report.pull_requests.total, 4);
    assert_eq!(report.pull_requests.archetypes, vec![Archetype::BugFixer, Archetype::DocWriter]);
    assert!(report.prompts.main.contains("Legendary contributor to pytorch"));
    assert_eq!(report.prompts.styles.len(), 4);
    assert!(report.prompts.styles.iter().all(|s| s.prompt.contains("contributed to pytorch")));
    assert_eq!(report.prompts.all_prompts().count(), 1 + 3 + 4);
}

#[test]
fn test_backend_repositories_make_a_backend_engineer() {
    let source = StaticSource::new(vec![solo_day_coder()]);
    let classifier = FixedClassifier(DomainTag::Systems);
    let pipeline = Pipeline::new(&source, &classifier, &NoCache);

    let report = pipeline.run("solodev").unwrap();

    assert_eq!(report.category, DeveloperCategory::Backend);
    assert!(report.high_profile.is_empty());
    assert!(report.prompts.styles.is_empty());
    assert!(report.prompts.main.contains("- Backend Engineer"));
}

#[test]
fn test_oracle_timeouts_still_yield_prompts() {
    let source = StaticSource::new(vec![solo_day_coder()]);
    let pipeline = Pipeline::new(&source, &TimeoutClassifier, &NoCache);

    let report = pipeline.run("solodev").unwrap();

    assert!(report.domains.is_zero());
    assert!(report.focus_areas.is_empty());
    assert_eq!(report.attributes.background, DEFAULT_BACKGROUND);
    assert!(!report.prompts.main.is_empty());
    assert_eq!(report.prompts.variations.len(), 3);
    assert!(report.warnings.iter().any(|w| w.contains("degraded")));
}

#[test]
fn test_zero_repo_profile_uses_fallbacks() {
    let source = StaticSource::new(vec![RawProfile::new("ghost")]);
    let pipeline = Pipeline::new(&source, &TimeoutClassifier, &NoCache);

    let report = pipeline.run("ghost").unwrap();

    assert_eq!(report.metrics, ActivityMetrics::default());
    assert_eq!(report.labels, BehaviorLabels::FALLBACK);
    assert!(report.prompts.main.contains("multiple programming languages"));
    // No repositories means nothing was sent for classification.
    assert!(report.warnings.is_empty());
}

#[test]
fn test_fetch_failure_is_the_only_error() {
    let source = StaticSource::new(Vec::new());
    let pipeline = Pipeline::new(&source, &TimeoutClassifier, &NoCache);

    let err = pipeline.run("missing").unwrap_err();
    assert_eq!(
        err,
        PipelineError::Fetch {
            login: "missing".into(),
            source: SourceError::NotFound("missing".into()),
        }
    );
    assert!(!err.is_retryable());
}

#[test]
fn test_zero_randomness_variations_match_main() {
    let source = StaticSource::new(vec![solo_day_coder()]);
    let classifier = FixedClassifier(DomainTag::Systems);
    let pipeline = Pipeline::new(&source, &classifier, &NoCache).with_options(PipelineOptions {
        variations: VariationRequest::new(4, 0.0, 99),
        ..PipelineOptions::default()
    });

    let report = pipeline.run("solodev").unwrap();
    assert_eq!(report.prompts.variations.len(), 4);
    assert!(report.prompts.variations.iter().all(|v| v.prompt == report.prompts.main));
}

#[test]
fn test_cache_serves_second_run_until_forced() {
    let source = StaticSource::new(vec![solo_day_coder()]);
    let classifier = FixedClassifier(DomainTag::Systems);
    let cache = MemoryCache::new();

    let first = Pipeline::new(&source, &classifier, &cache).run("solodev").unwrap();
    assert!(!first.analysis_from_cache);
    assert_eq!(cache.len(), 1);

    let second = Pipeline::new(&source, &classifier, &cache).run("SoloDev").unwrap();
    assert!(second.analysis_from_cache);
    assert_eq!(second.prompts, first.prompts);

    let forced = Pipeline::new(&source, &classifier, &cache)
        .with_options(PipelineOptions { force_refresh: true, ..PipelineOptions::default() })
        .run("solodev")
        .unwrap();
    assert!(!forced.analysis_from_cache);
}

#[test]
fn test_image_failure_falls_back_to_prompt() {
    let source = StaticSource::new(vec![solo_day_coder()]);
    let classifier = FixedClassifier(DomainTag::Systems);
    let pipeline = Pipeline::new(&source, &classifier, &NoCache)
        .with_images(&FailingImages)
        .with_options(PipelineOptions { render_image: true, ..PipelineOptions::default() });

    let report = pipeline.run("solodev").unwrap();
    assert!(matches!(report.artifact, Artifact::PromptFallback { .. }));
    assert!(!report.prompts.main.is_empty());
}

#[test]
fn test_image_passes_reference_through() {
    let source = StaticSource::new(vec![solo_day_coder()]);
    let classifier = FixedClassifier(DomainTag::Systems);
    let pipeline = Pipeline::new(&source, &classifier, &NoCache)
        .with_images(&PngImages)
        .with_options(PipelineOptions {
            render_image: true,
            reference_image: Some(vec![1, 2]),
            ..PipelineOptions::default()
        });

    match pipeline.run("solodev").unwrap().artifact {
        Artifact::Image { bytes, size } => {
            assert_eq!(size, 6);
            assert_eq!(&bytes[4..], &[1, 2]);
        }
        other => panic!("expected image, got {other:?}"),
    }
}

#[test]
fn test_missing_image_service_is_a_fallback() {
    let source = StaticSource::new(vec![solo_day_coder()]);
    let pipeline = Pipeline::new(&source, &TimeoutClassifier, &NoCache)
        .with_options(PipelineOptions { render_image: true, ..PipelineOptions::default() });

    let report = pipeline.run("solodev").unwrap();
    assert!(matches!(report.artifact, Artifact::PromptFallback { .. }));
}

#[test]
fn test_batch_isolates_failures_and_keeps_order() {
    let source = StaticSource::new(vec![solo_day_coder(), RawProfile::new("ghost")]);
    let classifier = FixedClassifier(DomainTag::Systems);
    let pipeline = Pipeline::new(&source, &classifier, &NoCache);

    let logins: Vec<String> = ["ghost", "nobody", "solodev"].iter().map(|s| s.to_string()).collect();
    let outcomes = pipeline.run_batch(&logins, 4);

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].login, "ghost");
    assert!(outcomes[0].result.is_ok());
    assert!(matches!(
        outcomes[1].result,
        Err(PipelineError::Fetch { source: SourceError::NotFound(_), .. })
    ));
    assert_eq!(
        outcomes[2].result.as_ref().unwrap().labels.contribution,
        ContributionStyle::SoloCreator
    );
}

#[test]
fn test_degraded_analysis_is_not_cached() {
    let source = StaticSource::new(vec![solo_day_coder()]);
    let cache = MemoryCache::new();

    let degraded = Pipeline::new(&source, &TimeoutClassifier, &cache).run("solodev").unwrap();
    assert!(degraded.domains.is_zero());
    assert!(!degraded.warnings.is_empty());

    let again = Pipeline::new(&source, &TimeoutClassifier, &cache).run("solodev").unwrap();
    assert!(!again.analysis_from_cache);
    assert!(again.warnings.iter().any(|w| w.contains("degraded")));

    let classifier = FixedClassifier(DomainTag::Systems);
    let recovered = Pipeline::new(&source, &classifier, &cache).run("solodev").unwrap();
    assert!(!recovered.analysis_from_cache);
    assert!(!recovered.domains.is_zero());
    assert_eq!(recovered.focus_areas, vec![DomainTag::Systems]);
    assert!(recovered.warnings.is_empty());
}

#[test]
fn test_analysis_cache_is_per_classifier() {
    let source = StaticSource::new(vec![solo_day_coder()]);
    let cache = MemoryCache::new();
    let systems = FixedClassifier(DomainTag::Systems);

    let first = Pipeline::new(&source, &systems, &cache).run("solodev").unwrap();
    assert_eq!(first.focus_areas, vec![DomainTag::Systems]);

    let other = ExplodingClassifier;
    let switched = Pipeline::new(&source, &other, &cache).run("solodev").unwrap();
    assert!(!switched.analysis_from_cache);
    assert_eq!(switched.focus_areas, vec![DomainTag::WebBackend]);

    let back = Pipeline::new(&source, &systems, &cache).run("solodev").unwrap();
    assert!(back.analysis_from_cache);
    assert_eq!(back.focus_areas, vec![DomainTag::Systems]);
}

#[test]
fn test_batch_panic_is_confined_to_one_login() {
    let source = StaticSource::new(vec![
        RawProfile::new("a").with_repository(Repository::new("fine").with_readme("web app")),
        RawProfile::new("b").with_repository(Repository::new("explode").with_readme("boom")),
        RawProfile::new("c").with_repository(Repository::new("fine").with_readme("web app")),
    ]);
    let pipeline = Pipeline::new(&source, &ExplodingClassifier, &NoCache);
    let logins: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();

    for parallelism in [1, 3] {
        let outcomes = pipeline.run_batch(&logins, parallelism);
        assert_eq!(outcomes.len(), 3);
        let names: Vec<&str> = outcomes.iter().map(|o| o.login.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert!(outcomes[0].result.is_ok());
        match &outcomes[1].result {
            Err(err @ PipelineError::Aborted { message, .. }) => {
                assert!(message.contains("classifier bug"));
                assert!(!err.is_retryable());
            }
            other => panic!("expected aborted outcome, got {other:?}"),
        }
        assert!(outcomes[2].result.is_ok());
    }
}
