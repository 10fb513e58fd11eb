use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use portrait_classify::{
    ClassificationCache, ClassifierStrategy, DomainOracle, HeuristicClassifier, OracleOptions, RequestBudget,
    build_classifier,
};
use portrait_core::cache::NoCache;
use portrait_core::domain::{DomainClassifier, DomainTag};
use portrait_core::pipeline::{Artifact, BatchOutcome, Pipeline, PipelineOptions, PortraitReport};
use portrait_core::profile::RawProfile;
use portrait_core::services::{ImageGenerator, StaticSource};
use portrait_core::style::{ArtStyle, Background, Character, Lighting};
use portrait_ingest::{JsonDirCache, ProfileSnapshot, to_raw_profile};

mod auth;
mod config;
mod github;
mod image;
mod llm;
mod options;
mod output;
mod runtime;
mod state;

use config::Config;
use options::PromptArgs;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("PORTRAIT_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "portrait", version = VERSION, about = "Turn a GitHub profile into image prompts")]
struct Cli {
    /// Debug logging for the portrait crates
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one GitHub user and compose prompts
    Analyze {
        login: String,

        /// Ignore cached profile and analysis
        #[arg(long)]
        force_refresh: bool,

        #[command(flatten)]
        prompt: PromptArgs,
    },

    /// Analyze several users; one failure does not stop the others
    Batch {
        #[arg(required = true)]
        logins: Vec<String>,

        #[arg(long)]
        force_refresh: bool,

        /// Profiles processed at once (default from config)
        #[arg(long)]
        parallelism: Option<usize>,

        #[command(flatten)]
        prompt: PromptArgs,
    },

    /// Compose prompts from a saved profile file, without network access
    Prompt {
        /// Profile JSON: a saved raw profile or a GitHub snapshot
        #[arg(long, value_name = "FILE")]
        profile: PathBuf,

        #[command(flatten)]
        prompt: PromptArgs,
    },

    /// Manage ~/.portrait/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store API credentials in ~/.portrait/auth.json
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// List every style value and domain tag
    Options,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config (keeps an existing one)
    Init,
    /// Print the effective config
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    PasteGithubToken,
    PasteAnthropicToken,
    PasteOpenaiApiKey,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze {
            login,
            force_refresh,
            prompt,
        } => analyze(&login, force_refresh, &prompt)?,

        Command::Batch {
            logins,
            force_refresh,
            parallelism,
            prompt,
        } => batch(&logins, force_refresh, parallelism, &prompt)?,

        Command::Prompt { profile, prompt } => offline_prompt(&profile, &prompt)?,

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },

        Command::Auth { command } => match command {
            AuthCommand::PasteGithubToken => auth::github_paste_token()?,
            AuthCommand::PasteAnthropicToken => auth::anthropic_paste_token()?,
            AuthCommand::PasteOpenaiApiKey => auth::openai_paste_api_key()?,
        },

        Command::Options => print_options(),
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info,portrait=debug,portrait_core=debug,portrait_classify=debug,portrait_ingest=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Live services shared by every profile of a run.
struct Services {
    source: github::GithubSource,
    classifier: Box<dyn DomainClassifier>,
    cache: JsonDirCache,
    images: Option<image::OpenAiImages>,
}

impl Services {
    fn connect(cfg: &Config, want_images: bool) -> Result<Self> {
        let handle = runtime::current_handle()?;
        let auth = auth::resolve_auth()?;
        if auth.github_token.is_none() {
            warn!("no GitHub token; unauthenticated requests are limited to 60/hour");
        }

        let source = github::GithubSource::new(&cfg.github, auth.github_token.as_deref(), handle.clone())?;

        let mut oracle: Option<Box<dyn DomainOracle>> = None;
        if cfg.classifier.strategy == ClassifierStrategy::Oracle {
            if let Some((llm_cfg, token)) = llm::oracle_config(&cfg.llm, &auth) {
                info!(provider = %cfg.llm.provider, model = %cfg.llm.model, "domain oracle enabled");
                let client = llm::LlmOracle::new(llm_cfg, token, handle.clone())?;
                oracle = Some(Box::new(client));
            }
        }
        let budget = Arc::new(RequestBudget::per_minute(
            cfg.classifier.requests_per_minute,
            cfg.classifier.burst,
        ));
        let classifier = build_classifier(
            cfg.classifier.strategy,
            oracle,
            budget,
            Arc::new(ClassificationCache::new()),
            oracle_options(cfg),
        );

        let images = match (want_images, auth.openai_api_key) {
            (true, Some(key)) => Some(image::OpenAiImages::new(&cfg.image, key, handle)?),
            (true, None) => {
                warn!("image requested but no OpenAI API key; prompts only (run `portrait auth paste-openai-api-key`)");
                None
            }
            (false, _) => None,
        };

        Ok(Self {
            source,
            classifier,
            cache: JsonDirCache::new(state::cache_dir()?),
            images,
        })
    }

    fn pipeline(&self, options: PipelineOptions) -> Pipeline<'_> {
        let pipeline = Pipeline::new(&self.source, self.classifier.as_ref(), &self.cache).with_options(options);
        match &self.images {
            Some(images) => pipeline.with_images(images as &dyn ImageGenerator),
            None => pipeline,
        }
    }
}

fn oracle_options(cfg: &Config) -> OracleOptions {
    OracleOptions {
        readme_char_limit: cfg.classifier.readme_char_limit,
        max_wait: Duration::from_secs(cfg.classifier.max_wait_secs),
        heuristic_fallback: cfg.classifier.heuristic_fallback,
        ..OracleOptions::default()
    }
}

/// Config + flags, validated before any network call.
fn prepare(args: &PromptArgs, force_refresh: bool) -> Result<(Config, PipelineOptions)> {
    let cfg = config::load_config()?;
    let seed = options::choose_seed(&cfg, args);
    let mut opts = options::build_options(&cfg, args, force_refresh, seed)?;
    opts.reference_image = options::read_reference(args)?;
    info!(seed, "variation seed (pass --seed to reproduce)");
    Ok((cfg, opts))
}

fn analyze(login: &str, force_refresh: bool, args: &PromptArgs) -> Result<()> {
    let (cfg, opts) = prepare(args, force_refresh)?;
    let services = Services::connect(&cfg, opts.render_image)?;
    let report = services.pipeline(opts).run(login)?;
    deliver(&report, args)
}

fn batch(logins: &[String], force_refresh: bool, parallelism: Option<usize>, args: &PromptArgs) -> Result<()> {
    let (cfg, opts) = prepare(args, force_refresh)?;
    let services = Services::connect(&cfg, opts.render_image)?;
    let parallelism = parallelism.unwrap_or(cfg.batch.parallelism);

    let outcomes = services.pipeline(opts).run_batch(logins, parallelism);
    let failed = deliver_each(&outcomes, |report| deliver(report, args));

    info!(total = outcomes.len(), failed = failed.len(), "batch finished");
    if !failed.is_empty() {
        bail!("{} of {} profiles failed: {}", failed.len(), outcomes.len(), failed.join(", "));
    }
    Ok(())
}

/// Deliver every successful report, reporting each failure without
/// stopping. Returns the logins that failed either way.
fn deliver_each<'a>(
    outcomes: &'a [BatchOutcome],
    mut deliver: impl FnMut(&PortraitReport) -> Result<()>,
) -> Vec<&'a str> {
    let mut failed = Vec::new();
    for outcome in outcomes {
        let delivered = match &outcome.result {
            Ok(report) => deliver(report),
            Err(e) => Err(anyhow::Error::new(e.clone())),
        };
        if let Err(e) = delivered {
            eprintln!("{}: {e:#}", outcome.login);
            failed.push(outcome.login.as_str());
        }
    }
    failed
}

fn offline_prompt(path: &Path, args: &PromptArgs) -> Result<()> {
    let (cfg, mut opts) = prepare(args, false)?;
    if opts.render_image {
        warn!("`portrait prompt` never calls the image service; ignoring --image");
        opts.render_image = false;
    }

    let profile = read_profile(path, cfg.github.window_days)?;
    let source = StaticSource::default();
    let classifier = HeuristicClassifier::new(cfg.classifier.readme_char_limit);
    let report = Pipeline::new(&source, &classifier, &NoCache)
        .with_options(opts)
        .run_profile(&profile);
    deliver(&report, args)
}

/// A saved `RawProfile`, or a GitHub payload snapshot with a `user` object.
fn read_profile(path: &Path, window_days: u32) -> Result<RawProfile> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;

    if value.get("user").is_some() {
        let snapshot: ProfileSnapshot =
            serde_json::from_value(value).with_context(|| format!("parse snapshot {}", path.display()))?;
        return to_raw_profile(&snapshot, window_days, chrono::Utc::now())
            .with_context(|| format!("convert snapshot {}", path.display()));
    }
    serde_json::from_value(value).with_context(|| format!("parse profile {}", path.display()))
}

fn deliver(report: &PortraitReport, args: &PromptArgs) -> Result<()> {
    output::print_report(report, args.json)?;

    let dir = match (&args.out, &report.artifact) {
        (Some(dir), _) => Some(dir.clone()),
        (None, Artifact::Image { .. }) => Some(state::output_dir()?),
        (None, _) => None,
    };
    if let Some(dir) = dir {
        for path in output::write_outputs(report, &dir)? {
            info!(path = %path.display(), "wrote");
        }
    }
    Ok(())
}

fn print_options() {
    fn section(title: &str, labels: impl Iterator<Item = String>) {
        println!("{title}:");
        for label in labels {
            println!("  {label}");
        }
        println!();
    }

    section("Art styles (--style)", ArtStyle::ALL.iter().map(|v| format!("{v:?}: {v}")));
    section("Characters (--character)", Character::ALL.iter().map(|v| format!("{v:?}: {v}")));
    section("Backgrounds (--background)", Background::ALL.iter().map(|v| format!("{v:?}: {v}")));
    section("Lighting (--lighting)", Lighting::ALL.iter().map(|v| format!("{v:?}: {v}")));
    section("Domains", DomainTag::ALL.iter().map(|d| d.label().to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use portrait_core::error::{PipelineError, SourceError};

    fn outcome(login: &str, ok: bool) -> BatchOutcome {
        let result = if ok {
            let source = StaticSource::default();
            let classifier = HeuristicClassifier::default();
            Ok(Pipeline::new(&source, &classifier, &NoCache).run_profile(&RawProfile::new(login)))
        } else {
            Err(PipelineError::Fetch { login: login.to_string(), source: SourceError::Timeout })
        };
        BatchOutcome { login: login.to_string(), result }
    }

    #[test]
    fn test_delivery_error_does_not_stop_the_batch() {
        let outcomes = vec![outcome("a", true), outcome("b", false), outcome("c", true), outcome("d", true)];
        let mut delivered = Vec::new();
        let failed = deliver_each(&outcomes, |report| {
            if report.login == "a" {
                anyhow::bail!("disk full");
            }
            delivered.push(report.login.clone());
            Ok(())
        });
        assert_eq!(failed, vec!["a", "b"]);
        assert_eq!(delivered, vec!["c".to_string(), "d".to_string()]);
    }
}
