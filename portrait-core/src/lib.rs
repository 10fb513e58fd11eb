//! portrait-core: profile analysis and prompt composition for developer portraits

pub mod behavior;
pub mod cache;
pub mod contributions;
pub mod domain;
pub mod error;
pub mod focus;
pub mod metrics;
pub mod pipeline;
pub mod profile;
pub mod prompt;
pub mod services;
pub mod style;
pub mod themes;

pub use behavior::{
    ActivityLevel, BehaviorLabels, BehaviorThresholds, ContributionStyle, DayPattern, DeveloperCategory,
    HourPattern, TemporalPattern,
};
pub use cache::{CachedAnalysis, MemoryCache, NoCache, ProfileCache};
pub use contributions::{HighProfileContributions, PullRequestProfile, detect_high_profile};
pub use domain::{Classification, DomainClassifier, DomainScore, DomainTag, RepoText, DEFAULT_TOP_K};
pub use error::{ImageError, InputError, PipelineError, SourceError};
pub use focus::{FocusSummary, StackFocus, classify_focus};
pub use metrics::{ActivityMetrics, LanguageShare, extract};
pub use pipeline::{Artifact, BatchOutcome, Pipeline, PipelineOptions, PortraitReport};
pub use profile::{DEFAULT_WINDOW_DAYS, RawProfile, Repository};
pub use prompt::{ProfileFacts, PromptSet, StylePrompt, VariationPrompt, VariationRequest, compose, compose_styles};
pub use services::{ImageGenerator, ProfileSource, StaticSource};
pub use style::{
    ArtStyle, Background, Character, Lighting, StyleAttributes, StyleInputs, StyleMode, map_style,
};
