//! Report rendering for the terminal and the output directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use portrait_core::pipeline::{Artifact, PortraitReport};

pub fn print_report(report: &PortraitReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("# {}\n", report.login);
    if report.analysis_from_cache {
        println!("(analysis served from cache; pass --force-refresh to recompute)\n");
    }

    let m = &report.metrics;
    println!(
        "Repositories: {} owned, {} forked | commits: {} | PRs to others: {}",
        m.owned_repos, m.forked_repos, m.total_commits, m.pull_requests_to_others
    );

    let shares = m.language_shares();
    if shares.is_empty() {
        println!("Languages: (none)");
    } else {
        let list: Vec<String> = shares
            .iter()
            .take(5)
            .map(|s| format!("{} {:.1}%", s.language, s.percent))
            .collect();
        println!("Languages: {}", list.join(", "));
    }

    let focus: Vec<&str> = report.focus_areas.iter().map(|d| d.label()).collect();
    println!(
        "Focus areas: {}",
        if focus.is_empty() { "(none)".to_string() } else { focus.join(", ") }
    );

    let l = &report.labels;
    println!(
        "Labels: {} | {} | {} / {}",
        l.contribution.label(),
        l.activity.label(),
        l.temporal.hour.label(),
        l.temporal.day.label()
    );

    println!("Category: {}", report.category.label());
    if !report.high_profile.is_empty() {
        let list: Vec<String> = report
            .high_profile
            .contributions
            .iter()
            .map(|c| format!("{} ({}, {:.1})", c.framework, c.impact.label(), c.impact_score))
            .collect();
        println!("Frameworks: {}", list.join(", "));
    }
    if let Some(f) = &report.stack_focus {
        println!(
            "Stack focus: {} (frontend {:.0}%, backend {:.0}%, full-stack {:.0}%; {} repos)",
            f.primary.label(),
            f.frontend_ratio() * 100.0,
            f.backend_ratio() * 100.0,
            f.fullstack_ratio() * 100.0,
            f.analyzed
        );
    }
    let pr = &report.pull_requests;
    if pr.total > 0 {
        let archetypes: Vec<&str> = pr.archetypes.iter().map(|a| a.label()).collect();
        println!(
            "Pull requests: {} (feature {}, fix {}, docs {}, test {}, other {}){}",
            pr.total,
            pr.kinds.feature,
            pr.kinds.fix,
            pr.kinds.docs,
            pr.kinds.test,
            pr.kinds.other,
            if archetypes.is_empty() { String::new() } else { format!(" | {}", archetypes.join(", ")) }
        );
    }

    let a = &report.attributes;
    println!(
        "Style: {} | {} | {} | {}\n",
        a.art_style, a.character, a.background, a.lighting
    );

    println!("## Prompt\n");
    println!("{}\n", report.prompts.main);

    if !report.prompts.variations.is_empty() {
        println!("## Variations\n");
        for v in &report.prompts.variations {
            println!("{}. (r={:.2}) {}\n", v.index, v.randomness, v.prompt);
        }
    }

    if !report.prompts.styles.is_empty() {
        println!("## Styles\n");
        for s in &report.prompts.styles {
            println!("{}. {}\n{}\n", s.index, s.style_name, s.prompt);
        }
    }

    match &report.artifact {
        Artifact::PromptOnly => {}
        Artifact::Image { size, .. } => println!("Image: {size} bytes"),
        Artifact::PromptFallback { reason } => println!("Image: not generated ({reason}); use the prompt above"),
    }

    if !report.warnings.is_empty() {
        println!("\n## Warnings\n");
        for w in &report.warnings {
            println!("- {w}");
        }
    }
    Ok(())
}

/// Write `<login>-prompts.json`, `<login>-prompt.txt`, one
/// `<login>-style-<n>.txt` per style prompt and, when rendered,
/// `<login>.png` into `dir`. Returns the paths written.
pub fn write_outputs(report: &PortraitReport, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let stem = file_stem(&report.login);
    let mut written = Vec::new();

    let json_path = dir.join(format!("{stem}-prompts.json"));
    let body = serde_json::to_string_pretty(&report.prompts)?;
    fs::write(&json_path, body).with_context(|| format!("write {}", json_path.display()))?;
    written.push(json_path);

    let txt_path = dir.join(format!("{stem}-prompt.txt"));
    fs::write(&txt_path, format!("{}\n", report.prompts.main))
        .with_context(|| format!("write {}", txt_path.display()))?;
    written.push(txt_path);

    for style in &report.prompts.styles {
        let path = dir.join(format!("{stem}-style-{}.txt", style.index));
        fs::write(&path, format!("{}\n", style.prompt)).with_context(|| format!("write {}", path.display()))?;
        written.push(path);
    }

    if let Artifact::Image { bytes, .. } = &report.artifact {
        let png_path = dir.join(format!("{stem}.png"));
        fs::write(&png_path, bytes).with_context(|| format!("write {}", png_path.display()))?;
        written.push(png_path);
    }

    Ok(written)
}

fn file_stem(login: &str) -> String {
    let stem: String = login
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() { "profile".to_string() } else { stem }
}
