//! Command-line flags + config -> `PipelineOptions`.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use portrait_core::error::InputError;
use portrait_core::pipeline::PipelineOptions;
use portrait_core::prompt::VariationRequest;
use portrait_core::style::{ArtStyle, Background, Character, Lighting, StyleAttributes, StyleMode};

use crate::config::{Config, StyleSection};

/// Flags shared by every command that composes prompts.
#[derive(Args, Debug, Clone, Default)]
pub struct PromptArgs {
    /// Number of variation prompts
    #[arg(long)]
    pub variations: Option<usize>,

    /// Per-attribute resampling probability for variations (0.0-1.0)
    #[arg(long)]
    pub randomness: Option<f64>,

    /// Seed for variations; reuse it to reproduce a run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also render this many style-template prompts (0-4)
    #[arg(long)]
    pub styles: Option<usize>,

    /// Art style (manual mode needs all four style flags)
    #[arg(long)]
    pub style: Option<String>,

    /// Animal character
    #[arg(long)]
    pub character: Option<String>,

    /// Background scene
    #[arg(long)]
    pub background: Option<String>,

    /// Lighting
    #[arg(long)]
    pub lighting: Option<String>,

    /// Extra preference appended to every prompt, as key=value (repeatable)
    #[arg(long = "prefer", value_name = "KEY=VALUE")]
    pub prefer: Vec<String>,

    /// Render the main prompt with the image service
    #[arg(long)]
    pub image: bool,

    /// Reference image for image-to-image generation
    #[arg(long, value_name = "PATH")]
    pub reference: Option<PathBuf>,

    /// Print the full report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Directory to write prompts (and image) into
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

/// Manual mode only when all four attributes are named (flags win over config).
pub fn resolve_style_mode(args: &PromptArgs, cfg: &StyleSection) -> Result<StyleMode, InputError> {
    let pick = |flag: &Option<String>, conf: &Option<String>| flag.clone().or_else(|| conf.clone());
    let slots = [
        ("--style", pick(&args.style, &cfg.art_style)),
        ("--character", pick(&args.character, &cfg.character)),
        ("--background", pick(&args.background, &cfg.background)),
        ("--lighting", pick(&args.lighting, &cfg.lighting)),
    ];

    let missing: Vec<&str> = slots.iter().filter(|(_, v)| v.is_none()).map(|(name, _)| *name).collect();
    if missing.len() == slots.len() {
        return Ok(StyleMode::Automatic);
    }
    if !missing.is_empty() {
        return Err(InputError::Style(format!(
            "manual style needs all of --style, --character, --background and --lighting (missing {})",
            missing.join(", ")
        )));
    }

    let value = |i: usize| slots[i].1.as_deref().unwrap_or_default();
    let unknown = |what: &str, raw: &str| InputError::Style(format!("unknown {what} {raw:?}; see `portrait options`"));

    Ok(StyleMode::Manual(StyleAttributes {
        art_style: ArtStyle::parse(value(0)).ok_or_else(|| unknown("art style", value(0)))?,
        character: Character::parse(value(1)).ok_or_else(|| unknown("character", value(1)))?,
        background: Background::parse(value(2)).ok_or_else(|| unknown("background", value(2)))?,
        lighting: Lighting::parse(value(3)).ok_or_else(|| unknown("lighting", value(3)))?,
    }))
}

pub fn parse_preferences(raw: &[String]) -> Result<Vec<(String, String)>, InputError> {
    raw.iter()
        .map(|entry| {
            let (key, value) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                return Err(InputError::InvalidValue {
                    record: "--prefer".to_string(),
                    field: "preference",
                    value: entry.clone(),
                });
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Everything but I/O. `seed` is the already-chosen seed.
pub fn build_options(cfg: &Config, args: &PromptArgs, force_refresh: bool, seed: u64) -> Result<PipelineOptions, InputError> {
    Ok(PipelineOptions {
        top_k: cfg.classifier.top_k,
        thresholds: cfg.behavior.clone(),
        style_mode: resolve_style_mode(args, &cfg.style)?,
        variations: VariationRequest::new(
            args.variations.unwrap_or(cfg.prompt.variations),
            args.randomness.unwrap_or(cfg.prompt.randomness),
            seed,
        ),
        styles: args.styles.unwrap_or(cfg.prompt.styles),
        preferences: parse_preferences(&args.prefer)?,
        force_refresh,
        render_image: args.image || cfg.image.enabled,
        reference_image: None,
    })
}

/// Flag seed, else configured seed, else a fresh one.
pub fn choose_seed(cfg: &Config, args: &PromptArgs) -> u64 {
    args.seed.or(cfg.prompt.seed).unwrap_or_else(rand::random)
}

pub fn read_reference(args: &PromptArgs) -> Result<Option<Vec<u8>>> {
    args.reference
        .as_ref()
        .map(|p| fs::read(p).with_context(|| format!("read reference image {}", p.display())))
        .transpose()
}
