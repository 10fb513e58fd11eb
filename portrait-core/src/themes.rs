//! Thematic elements: a mascot or object per language and per domain.

use crate::domain::DomainTag;

pub const LANGUAGE_THEMES: &[(&str, &str)] = &[
    ("Python", "a wise, friendly green python coiled around a glowing staff"),
    ("JavaScript", "a dynamic chameleon shifting colors and patterns"),
    ("TypeScript", "a chameleon wearing lightweight, glowing armor"),
    ("Java", "a sturdy, steaming ceramic coffee mug on an oak table"),
    ("C", "a hand-wound mechanical clock with its back panel open"),
    ("C++", "a gleaming race car engine with interlocking gears"),
    ("C#", "a set of magical interlocking building blocks"),
    ("Go", "a busy gopher in a hard hat directing cargo"),
    ("Rust", "a friendly crab polishing a gear until it shines"),
    ("Ruby", "a perfectly cut ruby refracting light into patterns"),
    ("Swift", "a swift bird in flight trailing a ribbon of light"),
    ("Kotlin", "a lighthouse on a small island guiding ships"),
];

pub const DOMAIN_THEMES: &[(DomainTag, &str)] = &[
    (DomainTag::AiMl, "a glowing holographic brain the character is interacting with"),
    (DomainTag::WebFrontend, "an artist's easel whose painting comes to life"),
    (DomainTag::WebBackend, "pulses of light racing along the neural pathways of a sleeping giant"),
    (DomainTag::GameDev, "a tabletop of miniature worlds with tiny animated heroes"),
    (DomainTag::Systems, "an exposed engine block humming with precise machinery"),
    (DomainTag::Security, "a vault door covered in shifting cryptographic glyphs"),
    (DomainTag::Data, "charts and maps examined under a detective's magnifying glass"),
    (DomainTag::Mobile, "a timeline of phones from rotary dial to modern smartphone"),
    (DomainTag::DevOps, "a gardener tending the root system of a continent-sized tree"),
];

pub fn language_theme(language: &str) -> Option<&'static str> {
    LANGUAGE_THEMES
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(language.trim()))
        .map(|(_, theme)| *theme)
}

pub fn domain_theme(domain: DomainTag) -> Option<&'static str> {
    DOMAIN_THEMES
        .iter()
        .find(|(key, _)| *key == domain)
        .map(|(_, theme)| *theme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_lookup() {
        assert!(language_theme("rust").unwrap().contains("crab"));
        assert!(language_theme("COBOL").is_none());
        assert!(domain_theme(DomainTag::Other).is_none());
        assert!(domain_theme(DomainTag::AiMl).is_some());
    }
}
