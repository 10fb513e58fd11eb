//! Per-profile pipeline: fetch -> metrics -> domains -> labels -> style -> prompts.
//!
//! Data only flows forward. Everything after the fetch degrades instead of
//! failing; a run that gets a profile always yields at least a prompt.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

use crate::behavior::{BehaviorLabels, BehaviorThresholds, DeveloperCategory, categorize, classify_with};
use crate::cache::{CachedAnalysis, ProfileCache};
use crate::contributions::{HighProfileContributions, PullRequestProfile, analyze_pull_requests, detect_high_profile};
use crate::domain::{DEFAULT_TOP_K, DomainClassifier, DomainScore, DomainTag, RepoText};
use crate::error::PipelineError;
use crate::focus::{FocusSummary, classify_focus};
use crate::metrics::{ActivityMetrics, extract};
use crate::profile::RawProfile;
use crate::prompt::{ProfileFacts, PromptSet, VariationRequest, compose, compose_styles};
use crate::services::{ImageGenerator, ProfileSource};
use crate::style::{StyleAttributes, StyleInputs, StyleMode, map_style};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub top_k: usize,
    pub thresholds: BehaviorThresholds,
    pub style_mode: StyleMode,
    pub variations: VariationRequest,
    /// How many of the fixed style templates to render.
    pub styles: usize,
    pub preferences: Vec<(String, String)>,
    /// Ignore and overwrite cached entries.
    pub force_refresh: bool,
    /// Ask the image service to render the main prompt.
    pub render_image: bool,
    pub reference_image: Option<Vec<u8>>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            thresholds: BehaviorThresholds::default(),
            style_mode: StyleMode::Automatic,
            variations: VariationRequest::default(),
            styles: 0,
            preferences: Vec::new(),
            force_refresh: false,
            render_image: false,
            reference_image: None,
        }
    }
}

/// What the run delivers besides the prompt text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    /// No image was requested.
    PromptOnly,
    Image {
        #[serde(skip)]
        bytes: Vec<u8>,
        size: usize,
    },
    /// Image generation failed; the prompt set is the deliverable.
    PromptFallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortraitReport {
    pub login: String,
    pub metrics: ActivityMetrics,
    pub domains: DomainScore,
    pub focus_areas: Vec<DomainTag>,
    pub labels: BehaviorLabels,
    pub category: DeveloperCategory,
    pub high_profile: HighProfileContributions,
    pub stack_focus: Option<FocusSummary>,
    pub pull_requests: PullRequestProfile,
    pub attributes: StyleAttributes,
    pub prompts: PromptSet,
    pub artifact: Artifact,
    /// Degradations absorbed during the run.
    pub warnings: Vec<String>,
    pub analysis_from_cache: bool,
}

/// Result for one login of a batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub login: String,
    pub result: Result<PortraitReport, PipelineError>,
}

pub struct Pipeline<'a> {
    source: &'a dyn ProfileSource,
    classifier: &'a dyn DomainClassifier,
    cache: &'a dyn ProfileCache,
    images: Option<&'a dyn ImageGenerator>,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn ProfileSource,
        classifier: &'a dyn DomainClassifier,
        cache: &'a dyn ProfileCache,
    ) -> Self {
        Self {
            source,
            classifier,
            cache,
            images: None,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_images(mut self, images: &'a dyn ImageGenerator) -> Self {
        self.images = Some(images);
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run the whole pipeline for one login.
    pub fn run(&self, login: &str) -> Result<PortraitReport, PipelineError> {
        let profile = self.fetch(login)?;
        Ok(self.run_profile(&profile))
    }

    /// Run every stage after the fetch on an already-held profile.
    pub fn run_profile(&self, profile: &RawProfile) -> PortraitReport {
        let mut warnings = Vec::new();
        let (analysis, from_cache) = self.analysis(profile, &mut warnings);

        let labels = classify_with(&analysis.metrics, &self.options.thresholds);
        let high_profile = detect_high_profile(profile);
        let stack_focus = classify_focus(profile);
        let pull_requests = analyze_pull_requests(&profile.pull_request_titles);
        let category = categorize(&high_profile, stack_focus.as_ref());
        let frameworks = high_profile.top_frameworks(3).into_iter().map(str::to_string).collect();

        let facts = ProfileFacts::new(
            profile.login.clone(),
            &analysis.metrics,
            &analysis.domains,
            self.options.top_k,
            labels,
        )
        .with_category(category, frameworks)
        .with_archetypes(pull_requests.archetypes.clone())
        .with_preferences(self.options.preferences.clone());

        let primary = facts.primary_language().map(|l| l.language.clone());
        let attributes = map_style(
            &StyleInputs {
                primary_language: primary.as_deref(),
                top_domain: facts.top_domain(),
                labels,
            },
            &self.options.style_mode,
        );
        debug!(login = %profile.login, ?labels, ?category, ?attributes, "style mapped");

        let mut prompts = compose(&facts, &attributes, &self.options.variations);
        prompts.styles = compose_styles(&facts, &attributes, self.options.styles);
        let artifact = self.render(&prompts, &mut warnings);

        info!(
            login = %profile.login,
            variations = prompts.variations.len(),
            styles = prompts.styles.len(),
            warnings = warnings.len(),
            "portrait composed"
        );

        PortraitReport {
            login: profile.login.clone(),
            focus_areas: facts.focus_areas.clone(),
            metrics: analysis.metrics,
            domains: analysis.domains,
            labels,
            category,
            high_profile,
            stack_focus,
            pull_requests,
            attributes,
            prompts,
            artifact,
            warnings,
            analysis_from_cache: from_cache,
        }
    }

    /// Run independent pipelines for several logins on up to `parallelism`
    /// threads. One login's failure, panics included, never affects
    /// another's. Exactly one outcome per login, in input order.
    pub fn run_batch(&self, logins: &[String], parallelism: usize) -> Vec<BatchOutcome> {
        let workers = parallelism.clamp(1, logins.len().max(1));
        let counter = AtomicUsize::new(0);
        let next = &counter;

        let finished: Vec<(usize, BatchOutcome)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut done = Vec::new();
                        loop {
                            let i = next.fetch_add(1, Ordering::SeqCst);
                            let Some(login) = logins.get(i) else { break };
                            done.push((i, self.run_isolated(login)));
                        }
                        done
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_default())
                .collect()
        });

        let mut slots: Vec<Option<BatchOutcome>> = vec![None; logins.len()];
        for (i, outcome) in finished {
            slots[i] = Some(outcome);
        }
        slots
            .into_iter()
            .zip(logins)
            .map(|(slot, login)| {
                slot.unwrap_or_else(|| BatchOutcome {
                    login: login.clone(),
                    result: Err(PipelineError::Aborted {
                        login: login.clone(),
                        message: "batch worker stopped".to_string(),
                    }),
                })
            })
            .collect()
    }

    /// `run`, with a panic turned into this login's failure.
    fn run_isolated(&self, login: &str) -> BatchOutcome {
        let result = catch_unwind(AssertUnwindSafe(|| self.run(login))).unwrap_or_else(|payload| {
            Err(PipelineError::Aborted {
                login: login.to_string(),
                message: panic_message(payload.as_ref()),
            })
        });
        if let Err(e) = &result {
            warn!(login, error = %e, retryable = e.is_retryable(), "profile failed");
        }
        BatchOutcome {
            login: login.to_string(),
            result,
        }
    }

    fn fetch(&self, login: &str) -> Result<RawProfile, PipelineError> {
        if self.options.force_refresh {
            if let Err(e) = self.cache.invalidate(login) {
                warn!(login, error = %e, "cache invalidate failed");
            }
        } else {
            match self.cache.load_profile(login) {
                Ok(Some(profile)) => {
                    debug!(login, "profile served from cache");
                    return Ok(profile);
                }
                Ok(None) => {}
                Err(e) => warn!(login, error = %e, "cache read failed"),
            }
        }

        info!(login, "fetching profile");
        let profile = self.source.fetch(login).map_err(|source| PipelineError::Fetch {
            login: login.to_string(),
            source,
        })?;

        if let Err(e) = self.cache.store_profile(&profile) {
            warn!(login, error = %e, "cache write failed");
        }
        Ok(profile)
    }

    fn analysis(&self, profile: &RawProfile, warnings: &mut Vec<String>) -> (CachedAnalysis, bool) {
        let login = profile.login.as_str();
        let classifier = self.classifier.name();
        if !self.options.force_refresh {
            match self.cache.load_analysis(login, classifier) {
                Ok(Some(cached)) => return (cached, true),
                Ok(None) => {}
                Err(e) => warn!(login, error = %e, "cache read failed"),
            }
        }

        let metrics = extract(profile);
        if metrics.skipped_timestamps > 0 {
            warnings.push(format!("skipped {} unparseable commit timestamps", metrics.skipped_timestamps));
        }

        let repos = RepoText::from_profile(profile);
        let classification = self.classifier.classify(&repos);
        let degraded = classification.is_degraded();
        if degraded {
            warn!(
                login,
                classifier,
                repos = classification.degraded.len(),
                "domain classification degraded"
            );
            warnings.push(format!(
                "domain classification degraded for {} of {} repositories",
                classification.degraded.len(),
                repos.len()
            ));
        }

        let analysis = CachedAnalysis {
            metrics,
            domains: classification.score,
        };
        if degraded {
            debug!(login, "degraded analysis not cached");
        } else if let Err(e) = self.cache.store_analysis(login, classifier, &analysis) {
            warn!(login, error = %e, "cache write failed");
        }
        (analysis, false)
    }

    fn render(&self, prompts: &PromptSet, warnings: &mut Vec<String>) -> Artifact {
        if !self.options.render_image {
            return Artifact::PromptOnly;
        }
        let Some(images) = self.images else {
            warnings.push("image generation requested but no image service configured".to_string());
            return Artifact::PromptFallback {
                reason: "image service not configured".to_string(),
            };
        };

        match images.generate(&prompts.main, self.options.reference_image.as_deref()) {
            Ok(bytes) if !bytes.is_empty() => Artifact::Image { size: bytes.len(), bytes },
            Ok(_) => {
                warnings.push("image service returned no data".to_string());
                Artifact::PromptFallback {
                    reason: "empty image response".to_string(),
                }
            }
            Err(e) => {
                warn!(login = %prompts.login, error = %e, "image generation failed; returning prompt");
                warnings.push(format!("image generation failed: {e}"));
                Artifact::PromptFallback { reason: e.to_string() }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
