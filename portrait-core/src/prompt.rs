//! Prompt Composer: style attributes + profile facts -> prompt strings.
//!
//! The main prompt is a pure template fill. Variations resample attribute
//! slots from an explicitly seeded generator, so the same inputs and seed
//! always give the same `PromptSet`. Style prompts render the same facts
//! through a fixed set of artistic templates, one family per developer
//! category.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::behavior::{ActivityLevel, BehaviorLabels, DayPattern, DeveloperCategory, HourPattern};
use crate::contributions::Archetype;
use crate::domain::{DomainScore, DomainTag};
use crate::metrics::{ActivityMetrics, LanguageShare};
use crate::style::{ArtStyle, Background, Character, Lighting, StyleAttributes};
use crate::themes::{domain_theme, language_theme};

/// Languages below this share (percent) are not mentioned.
const THEME_MIN_PERCENT: f64 = 5.0;

/// Facts about the profile the templates may mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileFacts {
    pub login: String,
    /// Largest first.
    pub languages: Vec<LanguageShare>,
    /// Heaviest first.
    pub focus_areas: Vec<DomainTag>,
    pub labels: BehaviorLabels,
    #[serde(default)]
    pub category: DeveloperCategory,
    /// High-profile frameworks, most impactful first.
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub archetypes: Vec<Archetype>,
    /// Free-form operator preferences, appended verbatim.
    #[serde(default)]
    pub preferences: Vec<(String, String)>,
}

impl ProfileFacts {
    pub fn new(
        login: impl Into<String>,
        metrics: &ActivityMetrics,
        domains: &DomainScore,
        top_k: usize,
        labels: BehaviorLabels,
    ) -> Self {
        Self {
            login: login.into(),
            languages: metrics.language_shares(),
            focus_areas: domains.focus_areas(top_k),
            labels,
            category: DeveloperCategory::default(),
            frameworks: Vec::new(),
            archetypes: Vec::new(),
            preferences: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: DeveloperCategory, frameworks: Vec<String>) -> Self {
        self.category = category;
        self.frameworks = frameworks;
        self
    }

    pub fn with_archetypes(mut self, archetypes: Vec<Archetype>) -> Self {
        self.archetypes = archetypes;
        self
    }

    pub fn with_preferences(mut self, preferences: Vec<(String, String)>) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn primary_language(&self) -> Option<&LanguageShare> {
        self.languages.first()
    }

    pub fn top_domain(&self) -> Option<DomainTag> {
        self.focus_areas.first().copied()
    }
}

/// How many variations, how far they may drift, and from which seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariationRequest {
    pub count: usize,
    /// Per-slot resampling probability, clamped to `[0, 1]`.
    pub randomness: f64,
    pub seed: u64,
}

impl VariationRequest {
    pub fn new(count: usize, randomness: f64, seed: u64) -> Self {
        Self { count, randomness, seed }
    }

    pub fn randomness(&self) -> f64 {
        clamp_randomness(self.randomness)
    }
}

impl Default for VariationRequest {
    fn default() -> Self {
        Self { count: 3, randomness: 0.3, seed: 0 }
    }
}

fn clamp_randomness(r: f64) -> f64 {
    if r.is_finite() { r.clamp(0.0, 1.0) } else { 0.0 }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationPrompt {
    /// 1-based position.
    pub index: usize,
    pub randomness: f64,
    pub attributes: StyleAttributes,
    pub prompt: String,
}

/// The same portrait in one of the fixed artistic templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylePrompt {
    /// 1-based position.
    pub index: usize,
    pub style_name: String,
    pub category: DeveloperCategory,
    pub prompt: String,
}

/// One main prompt plus ordered variations and style prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSet {
    pub login: String,
    pub attributes: StyleAttributes,
    pub main: String,
    pub variations: Vec<VariationPrompt>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<StylePrompt>,
}

impl PromptSet {
    /// Every prompt: main, then variations, then style prompts.
    pub fn all_prompts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.main.as_str())
            .chain(self.variations.iter().map(|v| v.prompt.as_str()))
            .chain(self.styles.iter().map(|s| s.prompt.as_str()))
    }
}

/// Compose a prompt set from a seed.
pub fn compose(facts: &ProfileFacts, attrs: &StyleAttributes, request: &VariationRequest) -> PromptSet {
    let mut rng = StdRng::seed_from_u64(request.seed);
    compose_with_rng(facts, attrs, request.count, request.randomness, &mut rng)
}

/// Compose a prompt set drawing from a caller-owned generator.
pub fn compose_with_rng<R: Rng>(
    facts: &ProfileFacts,
    attrs: &StyleAttributes,
    count: usize,
    randomness: f64,
    rng: &mut R,
) -> PromptSet {
    let r = clamp_randomness(randomness);
    let main = render(facts, attrs);
    let variations = (1..=count)
        .map(|index| {
            let attributes = perturb(attrs, r, &mut *rng);
            let prompt = if attributes == *attrs { main.clone() } else { render(facts, &attributes) };
            VariationPrompt { index, randomness: r, attributes, prompt }
        })
        .collect();

    PromptSet {
        login: facts.login.clone(),
        attributes: *attrs,
        main,
        variations,
        styles: Vec::new(),
    }
}

/// Independently resample each slot with probability `r`, never keeping
/// the current value once a slot is chosen.
pub fn perturb<R: Rng>(attrs: &StyleAttributes, r: f64, rng: &mut R) -> StyleAttributes {
    let mut out = *attrs;
    if rng.random::<f64>() < r {
        out.art_style = resample(ArtStyle::ALL, attrs.art_style, rng);
    }
    if rng.random::<f64>() < r {
        out.character = resample(Character::ALL, attrs.character, rng);
    }
    if rng.random::<f64>() < r {
        out.background = resample(Background::ALL, attrs.background, rng);
    }
    if rng.random::<f64>() < r {
        out.lighting = resample(Lighting::ALL, attrs.lighting, rng);
    }
    out
}

fn resample<T: Copy + PartialEq, R: Rng>(all: &[T], current: T, rng: &mut R) -> T {
    let others: Vec<T> = all.iter().copied().filter(|v| *v != current).collect();
    if others.is_empty() {
        return current;
    }
    others[rng.random_range(0..others.len())]
}

/// Deterministic template fill.
pub fn render(facts: &ProfileFacts, attrs: &StyleAttributes) -> String {
    let style = attrs.art_style.label();
    let character = attrs.character.label();
    let traits = facts.labels.activity.traits().join(", ");
    let atmosphere = attrs.lighting.atmosphere();
    let language = language_phrase(facts.primary_language());
    let domain = domain_phrase(facts.top_domain());

    let mut p = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(p, "Create a {style} illustration of a {traits} {character} representing a software developer.");
    p.push('\n');
    p.push_str(
        "IMPORTANT: This must be a fully animal character - NO human face or human features should appear. \
Keep the character 100% as the specified animal while expressing personality through animal features and body language.\n\n",
    );

    p.push_str("Character Details:\n");
    let _ = writeln!(p, "- The {character} should embody the essence of a {domain} developer who primarily codes in {language}");
    let _ = writeln!(p, "- Character traits: {traits}");
    let _ = writeln!(p, "- The character should appear {atmosphere} and dedicated to their craft");
    let _ = writeln!(
        p,
        "- Working style: {}, {}, {}",
        facts.labels.contribution.label(),
        facts.labels.temporal.hour.label(),
        facts.labels.temporal.day.label()
    );
    p.push('\n');

    p.push_str("Setting & Environment:\n");
    let _ = writeln!(p, "- Background: {}", attrs.background.label());
    let _ = writeln!(p, "- Lighting: {}", attrs.lighting.label());
    let _ = writeln!(p, "- Color scheme: {}", attrs.lighting.color_scheme());
    let _ = writeln!(p, "- Atmosphere: {atmosphere}");
    p.push('\n');

    p.push_str(&thematic_section(facts, character));
    p.push_str(&developer_section(facts));

    p.push_str("Technical Context:\n");
    let _ = writeln!(p, "- Subtle references to {language} programming (code snippets, logos or related symbols in the background)");
    let _ = writeln!(p, "- The environment should reflect {domain} development work");
    let _ = writeln!(p, "- {}", activity_phrase(&facts.labels));
    p.push('\n');

    p.push_str("Artistic Style:\n");
    let _ = writeln!(p, "- Style: {style}");
    p.push_str("- High quality, detailed illustration\n");
    p.push_str("- The character should be the main focus\n");
    p.push_str("- STRICT REQUIREMENT: No human faces, mouths, or facial features - keep 100% animal characteristics\n");

    if !facts.preferences.is_empty() {
        p.push_str("\nUser Preferences:\n");
        for (key, value) in &facts.preferences {
            let _ = writeln!(p, "- {key}: {value}");
        }
    }

    p
}

/// An artistic treatment applied on top of a category template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleTemplate {
    pub name: &'static str,
    pub modifier: &'static str,
    pub approach: &'static str,
    pub lighting: &'static str,
    pub composition: &'static str,
}

pub const STYLE_TEMPLATES: [StyleTemplate; 4] = [
    StyleTemplate {
        name: "Professional Portrait",
        modifier: "professional headshot style",
        approach: "Corporate photography",
        lighting: "professional studio lighting",
        composition: "clean, minimal background",
    },
    StyleTemplate {
        name: "Artistic Creative",
        modifier: "artistic digital illustration",
        approach: "Contemporary digital art",
        lighting: "dramatic artistic lighting",
        composition: "dynamic composition with creative elements",
    },
    StyleTemplate {
        name: "Technical Schematic",
        modifier: "technical blueprint style",
        approach: "Engineering diagram aesthetic",
        lighting: "technical drafting illumination",
        composition: "precise, grid-based layout",
    },
    StyleTemplate {
        name: "Minimalist Abstract",
        modifier: "minimalist vector art",
        approach: "Simple geometric design",
        lighting: "clean, even lighting",
        composition: "balanced negative space",
    },
];

const ANIMAL_ONLY: &str = "CRITICAL: Maintain 100% animal anatomy - no human facial features whatsoever.";

/// The first `count` style templates, each rendered through the template
/// family of the profile's developer category. Deterministic.
pub fn compose_styles(facts: &ProfileFacts, attrs: &StyleAttributes, count: usize) -> Vec<StylePrompt> {
    STYLE_TEMPLATES
        .iter()
        .take(count)
        .enumerate()
        .map(|(i, template)| StylePrompt {
            index: i + 1,
            style_name: template.name.to_string(),
            category: facts.category,
            prompt: render_style(facts, attrs, template),
        })
        .collect()
}

pub fn render_style(facts: &ProfileFacts, attrs: &StyleAttributes, t: &StyleTemplate) -> String {
    let character = attrs.character.label();
    let traits = facts.labels.activity.traits().join(", ");
    let language = facts
        .primary_language()
        .map(|l| l.language.clone())
        .unwrap_or_else(|| "multiple programming languages".to_string());

    let mut p = String::new();
    match facts.category {
        DeveloperCategory::Legendary => {
            let frameworks: Vec<&str> = facts.frameworks.iter().take(3).map(String::as_str).collect();
            let frameworks = if frameworks.is_empty() { "widely used open source".to_string() } else { frameworks.join(", ") };
            let _ = writeln!(p, "Create an epic {} depicting a legendary {character}, a master builder of open source.\n", t.modifier);
            let _ = writeln!(p, "LEGENDARY STATUS: This {character} has contributed to {frameworks}\n");
            p.push_str("Character Details:\n");
            let _ = writeln!(p, "- A {traits} {character} carrying an air of wisdom and technical mastery");
            p.push_str("- Surrounded by flowing streams of code and light that trace the reach of their work\n");
            p.push_str("- A calm, confident posture earned by solving hard problems for years\n\n");
            p.push_str("Visual Style:\n");
            let _ = writeln!(p, "- {} with heroic proportions", t.approach);
            let _ = writeln!(p, "- {} giving a sense of grandeur", t.lighting);
            p.push_str("- A noble palette of gold and deep blue\n");
            p.push_str("- A background hinting at the vast infrastructure they helped build\n\n");
            p.push_str("Composition:\n");
            let _ = writeln!(p, "- {} that underlines their standing", t.composition);
            p.push_str("- Quiet references to their major contributions, never literal logos\n\n");
        }
        DeveloperCategory::Frontend => {
            let _ = writeln!(p, "Create a vibrant {} of a creative {character} who builds user interfaces.\n", t.modifier);
            let _ = writeln!(p, "FRONTEND FOCUS: This {character} crafts interfaces people enjoy using\n");
            p.push_str("Character Details:\n");
            let _ = writeln!(p, "- A {traits} {character} with a sharp eye for design and detail");
            p.push_str("- Surrounded by colourful UI panels, design tools and interface sketches\n\n");
            p.push_str("Visual Style:\n");
            let _ = writeln!(p, "- {} with bright, modern aesthetics", t.approach);
            let _ = writeln!(p, "- {} that keeps everything crisp", t.lighting);
            p.push_str("- Vivid gradients and modern interface colours\n\n");
            p.push_str("Technology Elements:\n");
            let _ = writeln!(p, "- Subtle references to {language} and frontend frameworks");
            p.push_str("- Responsive layouts across several screen sizes\n\n");
            p.push_str("Composition:\n");
            let _ = writeln!(p, "- {} with a clear visual hierarchy\n", t.composition);
        }
        DeveloperCategory::Backend => {
            let _ = writeln!(p, "Create a powerful {} of a focused {character} mastering backend systems.\n", t.modifier);
            let _ = writeln!(p, "BACKEND MASTERY: This {character} builds the infrastructure applications stand on\n");
            p.push_str("Character Details:\n");
            let _ = writeln!(p, "- A {traits} {character} with intense focus and systematic thinking");
            p.push_str("- Surrounded by flowing data streams, server racks and system diagrams\n\n");
            p.push_str("Visual Style:\n");
            let _ = writeln!(p, "- {} with dark, technical aesthetics", t.approach);
            let _ = writeln!(p, "- {} casting dramatic shadows", t.lighting);
            p.push_str("- Mostly monochrome, with terminal green and electric blue accents\n\n");
            p.push_str("Technology Elements:\n");
            let _ = writeln!(p, "- Subtle references to {language} and backend technologies");
            p.push_str("- Database symbols, API endpoints and terminal windows\n\n");
            p.push_str("Composition:\n");
            let _ = writeln!(p, "- {} stressing structure and stability\n", t.composition);
        }
        DeveloperCategory::FullStack | DeveloperCategory::Specialist => {
            let domain = domain_phrase(facts.top_domain());
            let _ = writeln!(p, "Create a skilled {} of a versatile {character} excelling in {domain} development.\n", t.modifier);
            let _ = writeln!(p, "TECHNICAL EXPERTISE: This {character} works in {domain} using {language}\n");
            p.push_str("Character Details:\n");
            let _ = writeln!(p, "- A {traits} {character} with adaptable skills and broad knowledge");
            p.push_str("- Surrounded by the tools and environments of their craft\n\n");
            p.push_str("Visual Style:\n");
            let _ = writeln!(p, "- {} balancing technical and creative elements", t.approach);
            let _ = writeln!(p, "- {} giving a clear view of the workspace", t.lighting);
            let _ = writeln!(p, "- {}\n", attrs.lighting.color_scheme());
            p.push_str("Technology Elements:\n");
            let _ = writeln!(p, "- Clear references to {language} and related technologies");
            let _ = writeln!(p, "- Symbols of {domain} work\n");
            p.push_str("Composition:\n");
            let _ = writeln!(p, "- {} showing competence and focus\n", t.composition);
        }
    }
    p.push_str(ANIMAL_ONLY);
    p.push('\n');
    p
}

fn developer_section(facts: &ProfileFacts) -> String {
    let mut s = String::new();
    match facts.category {
        DeveloperCategory::Legendary if !facts.frameworks.is_empty() => {
            let _ = writeln!(
                s,
                "- Legendary contributor to {}: an aura of quiet mastery, surrounded by streams of code",
                facts.frameworks.join(", ")
            );
        }
        DeveloperCategory::Specialist => {}
        category => {
            let _ = writeln!(s, "- {}", category.label());
        }
    }
    if !facts.archetypes.is_empty() {
        let known: Vec<&str> = facts.archetypes.iter().map(|a| a.label()).collect();
        let _ = writeln!(s, "- Known for: {}", known.join(", "));
    }
    if s.is_empty() {
        return s;
    }
    format!("Developer Profile:\n{s}\n")
}

fn thematic_section(facts: &ProfileFacts, character: &str) -> String {
    let languages: Vec<String> = facts
        .languages
        .iter()
        .filter(|l| l.percent >= THEME_MIN_PERCENT)
        .filter_map(|l| {
            language_theme(&l.language).map(|theme| {
                format!("  - {} ({:.1}%, {}): {}", l.language, l.percent, language_weight(l.percent), theme)
            })
        })
        .collect();

    let domains: Vec<String> = facts
        .focus_areas
        .iter()
        .enumerate()
        .filter_map(|(i, d)| {
            domain_theme(*d).map(|theme| format!("  - {} ({} focus): {}", d.label(), domain_weight(i), theme))
        })
        .collect();

    if languages.is_empty() && domains.is_empty() {
        return String::new();
    }

    let mut s = String::from("Thematic Interaction:\n");
    let _ = writeln!(s, "- The {character} should interact naturally with elements representing the developer's skill set.");
    if !languages.is_empty() {
        s.push_str("- Programming Language Elements:\n");
        for line in languages {
            s.push_str(&line);
            s.push('\n');
        }
    }
    if !domains.is_empty() {
        s.push_str("- Domain Expertise Elements:\n");
        for line in domains {
            s.push_str(&line);
            s.push('\n');
        }
    }
    s.push('\n');
    s
}

fn language_weight(percent: f64) -> &'static str {
    if percent > 40.0 {
        "primary"
    } else if percent > 15.0 {
        "significant"
    } else {
        "notable"
    }
}

fn domain_weight(position: usize) -> &'static str {
    match position {
        0 => "primary",
        1 => "secondary",
        _ => "additional",
    }
}

fn language_phrase(primary: Option<&LanguageShare>) -> String {
    match primary {
        None => "multiple programming languages".to_string(),
        Some(l) if l.percent > 50.0 => format!("{} (primary language)", l.language),
        Some(l) => format!("{} and other languages", l.language),
    }
}

fn domain_phrase(domain: Option<DomainTag>) -> String {
    match domain {
        None | Some(DomainTag::Other) => "general software".to_string(),
        Some(d) => d.label().to_lowercase(),
    }
}

fn activity_phrase(labels: &BehaviorLabels) -> String {
    let when = match labels.temporal.hour {
        HourPattern::MorningPerson => "working during fresh morning hours",
        HourPattern::DayCoder => "working during bright daylight hours",
        HourPattern::NightOwl => "working late into the night with glowing screens",
        HourPattern::Flexible => "working whenever inspiration strikes",
    };
    let mood = match labels.activity {
        ActivityLevel::Intensive => "very energetic",
        ActivityLevel::Regular => "steadily focused",
        ActivityLevel::Casual => "relaxed and contemplative",
    };
    let days = match labels.temporal.day {
        DayPattern::WeekdayDeveloper => " through the working week",
        DayPattern::WeekendWarrior => ", especially on weekends",
        DayPattern::AlwaysOn => "",
    };
    format!("Show the character as {mood}, {when}{days}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::ContributionStyle;

    fn facts() -> ProfileFacts {
        ProfileFacts {
            login: "octocat".to_string(),
            languages: vec![
                LanguageShare { language: "Rust".to_string(), bytes: 80, percent: 80.0 },
                LanguageShare { language: "Python".to_string(), bytes: 17, percent: 17.0 },
                LanguageShare { language: "Shell".to_string(), bytes: 3, percent: 3.0 },
            ],
            focus_areas: vec![DomainTag::Systems, DomainTag::AiMl],
            labels: BehaviorLabels {
                contribution: ContributionStyle::SoloCreator,
                ..BehaviorLabels::FALLBACK
            },
            category: DeveloperCategory::Specialist,
            frameworks: Vec::new(),
            archetypes: Vec::new(),
            preferences: Vec::new(),
        }
    }

    #[test]
    fn test_main_prompt_mentions_attributes_and_facts() {
        let p = render(&facts(), &StyleAttributes::DEFAULT);
        assert!(p.contains("Minimalist line art"));
        assert!(p.contains("Curious Raccoon"));
        assert!(p.contains("Rust (primary language)"));
        assert!(p.contains("systems programming developer"));
        assert!(p.contains("Rust (80.0%, primary)"));
        assert!(p.contains("Python (17.0%, significant)"));
        assert!(!p.contains("Shell"));
        assert!(p.contains("Systems Programming (primary focus)"));
        assert!(!p.contains("User Preferences"));
        assert!(!p.contains("Developer Profile"));
    }

    #[test]
    fn test_developer_profile_section() {
        let f = facts()
            .with_category(DeveloperCategory::Legendary, vec!["pytorch".into(), "numpy".into()])
            .with_archetypes(vec![Archetype::BugFixer]);
        let p = render(&f, &StyleAttributes::DEFAULT);
        assert!(p.contains("Developer Profile:\n- Legendary contributor to pytorch, numpy"));
        assert!(p.contains("- Known for: Bug Fixer\n"));

        let p = render(&facts().with_category(DeveloperCategory::Backend, Vec::new()), &StyleAttributes::DEFAULT);
        assert!(p.contains("Developer Profile:\n- Backend Engineer\n"));
    }

    #[test]
    fn test_style_prompts_follow_category() {
        let attrs = StyleAttributes::DEFAULT;
        let legendary = facts().with_category(DeveloperCategory::Legendary, vec!["linux".into()]);
        let styles = compose_styles(&legendary, &attrs, 4);
        assert_eq!(styles.len(), 4);
        assert_eq!(
            styles.iter().map(|s| s.style_name.as_str()).collect::<Vec<_>>(),
            vec!["Professional Portrait", "Artistic Creative", "Technical Schematic", "Minimalist Abstract"]
        );
        assert!(styles[0].prompt.starts_with("Create an epic professional headshot style"));
        assert!(styles[0].prompt.contains("contributed to linux"));
        assert!(styles[2].prompt.contains("Engineering diagram aesthetic"));
        assert!(styles.iter().all(|s| s.category == DeveloperCategory::Legendary));
        assert!(styles.iter().all(|s| s.prompt.ends_with("no human facial features whatsoever.\n")));

        let frontend = compose_styles(&facts().with_category(DeveloperCategory::Frontend, Vec::new()), &attrs, 1);
        assert!(frontend[0].prompt.contains("FRONTEND FOCUS"));
        assert!(frontend[0].prompt.contains("references to Rust and frontend frameworks"));

        let backend = compose_styles(&facts().with_category(DeveloperCategory::Backend, Vec::new()), &attrs, 2);
        assert!(backend[1].prompt.contains("BACKEND MASTERY"));

        let general = compose_styles(&facts(), &attrs, 9);
        assert_eq!(general.len(), STYLE_TEMPLATES.len());
        assert!(general[0].prompt.contains("excelling in systems programming development"));
        assert!(compose_styles(&facts(), &attrs, 0).is_empty());
    }

    #[test]
    fn test_empty_facts_still_render() {
        let f = ProfileFacts {
            login: "ghost".to_string(),
            languages: Vec::new(),
            focus_areas: Vec::new(),
            labels: BehaviorLabels::FALLBACK,
            category: DeveloperCategory::default(),
            frameworks: Vec::new(),
            archetypes: Vec::new(),
            preferences: Vec::new(),
        };
        let p = render(&f, &StyleAttributes::DEFAULT);
        assert!(p.contains("multiple programming languages"));
        assert!(p.contains("general software developer"));
        assert!(!p.contains("Thematic Interaction"));
    }

    #[test]
    fn test_preferences_are_appended() {
        let f = facts().with_preferences(vec![("mood".to_string(), "whimsical".to_string())]);
        assert!(render(&f, &StyleAttributes::DEFAULT).ends_with("- mood: whimsical\n"));
    }

    #[test]
    fn test_zero_randomness_repeats_main_prompt() {
        for count in [0usize, 1, 5] {
            let set = compose(&facts(), &StyleAttributes::DEFAULT, &VariationRequest::new(count, 0.0, 42));
            assert_eq!(set.variations.len(), count);
            for v in &set.variations {
                assert_eq!(v.prompt, set.main);
                assert_eq!(v.attributes, set.attributes);
            }
        }
    }

    #[test]
    fn test_full_randomness_changes_every_slot() {
        let attrs = StyleAttributes::DEFAULT;
        let set = compose(&facts(), &attrs, &VariationRequest::new(8, 1.0, 7));
        for v in &set.variations {
            assert_ne!(v.attributes.art_style, attrs.art_style);
            assert_ne!(v.attributes.character, attrs.character);
            assert_ne!(v.attributes.background, attrs.background);
            assert_ne!(v.attributes.lighting, attrs.lighting);
            assert_ne!(v.prompt, set.main);
        }
    }

    #[test]
    fn test_same_seed_same_prompt_set() {
        let req = VariationRequest::new(6, 1.0, 1234);
        let a = compose(&facts(), &StyleAttributes::DEFAULT, &req);
        let b = compose(&facts(), &StyleAttributes::DEFAULT, &req);
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_randomness_is_clamped() {
        let set = compose(&facts(), &StyleAttributes::DEFAULT, &VariationRequest::new(2, f64::NAN, 1));
        assert!(set.variations.iter().all(|v| v.randomness == 0.0 && v.prompt == set.main));
        let set = compose(&facts(), &StyleAttributes::DEFAULT, &VariationRequest::new(1, 7.5, 1));
        assert_eq!(set.variations[0].randomness, 1.0);
    }

    #[test]
    fn test_all_prompts_lists_main_first() {
        let set = compose(&facts(), &StyleAttributes::DEFAULT, &VariationRequest::new(2, 0.0, 0));
        assert_eq!(set.all_prompts().count(), 3);
        assert_eq!(set.all_prompts().next(), Some(set.main.as_str()));
        assert!(set.styles.is_empty());
    }
}
