//! Style Mapper: labels, primary language and top domain -> visual attributes.
//!
//! Every table is a constant with an explicit default row. Unknown keys
//! resolve to the default row, never to an error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::behavior::{ActivityLevel, BehaviorLabels, ContributionStyle, HourPattern};
use crate::domain::DomainTag;

/// Declares a closed set of style values with a label and an `ALL` list.
macro_rules! style_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Case-insensitive match on either the variant name or the label.
            pub fn parse(raw: &str) -> Option<$name> {
                let key = normalize(raw);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| normalize(v.label()) == key || normalize(&format!("{:?}", v)) == key)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

style_enum!(
    /// Drawing style of the illustration.
    ArtStyle {
        RetroWave => "1980s retro wave",
        Cyberpunk => "Futuristic cyberpunk",
        InkWash => "Chinese ink wash painting",
        Steampunk => "Steampunk mechanical",
        LineArt => "Minimalist line art",
        PopArt => "Vibrant pop art",
        DarkFantasy => "Dark fantasy concept art",
        Blueprint => "Blueprint schematic",
        Watercolor => "Watercolor illustration",
        PixelArt => "Digital pixel art",
    }
);

style_enum!(
    /// Animal archetype standing in for the developer.
    Character {
        MajesticBear => "Majestic Bear",
        WiseOwl => "Wise Owl",
        IndustriousBeaver => "Industrious Beaver",
        CunningFox => "Cunning Fox",
        AgileOctopus => "Agile Octopus",
        LoyalWolf => "Loyal Wolf",
        MeticulousHummingbird => "Meticulous Hummingbird",
        PlayfulOtter => "Playful Otter",
        ElegantCat => "Elegant Cat",
        CuriousRaccoon => "Curious Raccoon",
        NobleEagle => "Noble Eagle",
    }
);

style_enum!(
    /// Scene behind the character.
    Background {
        ServerRoom => "A server room with glowing racks",
        DigitalForest => "A digital forest with flowing data streams",
        ScrollLibrary => "A library of ancient code scrolls",
        CitySkyline => "A futuristic city skyline",
        GearWorkshop => "A workshop filled with gears and circuits",
        NeuralNetwork => "An abstract representation of a neural network",
        HomeOffice => "A cozy home office with multiple monitors",
        MinimalWorkspace => "A minimalist workspace with clean lines",
        NeonAlley => "A cyberpunk alleyway with neon signs",
        GeometricGarden => "A peaceful garden with geometric patterns",
        FantasyRealm => "A dark fantasy realm",
    }
);

style_enum!(
    /// Lighting and atmosphere.
    Lighting {
        SoftMorning => "soft morning light",
        CrispDawn => "crisp dawn light with long shadows",
        BrightSunlight => "bright natural sunlight",
        StudioDaylight => "even studio daylight",
        GoldenHour => "golden hour with warm shadows",
        Moonlit => "moonlit with dark shadows",
        NeonGlow => "electric neon glow in the dark",
        Ambient => "natural ambient lighting",
    }
);

impl Lighting {
    pub fn color_scheme(&self) -> &'static str {
        match self {
            Lighting::SoftMorning => "soft pastels and fresh colors",
            Lighting::CrispDawn => "cool blues warming into peach",
            Lighting::BrightSunlight => "warm yellows and bright colors",
            Lighting::StudioDaylight => "clean whites with saturated accents",
            Lighting::GoldenHour => "orange and warm tones",
            Lighting::Moonlit => "dark blues and purples with neon highlights",
            Lighting::NeonGlow => "deep blacks with magenta and cyan neon",
            Lighting::Ambient => "balanced colors",
        }
    }

    pub fn atmosphere(&self) -> &'static str {
        match self {
            Lighting::SoftMorning => "fresh and optimistic",
            Lighting::CrispDawn => "determined and driven",
            Lighting::BrightSunlight => "energetic and vibrant",
            Lighting::StudioDaylight => "calm and productive",
            Lighting::GoldenHour => "warm and unhurried",
            Lighting::Moonlit => "mysterious and focused",
            Lighting::NeonGlow => "intense and electric",
            Lighting::Ambient => "focused",
        }
    }
}

/// One attribute per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleAttributes {
    pub art_style: ArtStyle,
    pub character: Character,
    pub background: Background,
    pub lighting: Lighting,
}

impl StyleAttributes {
    /// The default row of every table.
    pub const DEFAULT: StyleAttributes = StyleAttributes {
        art_style: DEFAULT_ART_STYLE,
        character: DEFAULT_CHARACTER,
        background: DEFAULT_BACKGROUND,
        lighting: DEFAULT_LIGHTING,
    };
}

impl Default for StyleAttributes {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub const DEFAULT_ART_STYLE: ArtStyle = ArtStyle::LineArt;
pub const DEFAULT_CHARACTER: Character = Character::CuriousRaccoon;
pub const DEFAULT_BACKGROUND: Background = Background::MinimalWorkspace;
pub const DEFAULT_LIGHTING: Lighting = Lighting::Ambient;

/// Primary language -> art style. Keys compare case-insensitively.
pub const LANGUAGE_STYLES: &[(&str, ArtStyle)] = &[
    ("Python", ArtStyle::Cyberpunk),
    ("JavaScript", ArtStyle::PopArt),
    ("TypeScript", ArtStyle::PopArt),
    ("Java", ArtStyle::Steampunk),
    ("C", ArtStyle::RetroWave),
    ("C++", ArtStyle::DarkFantasy),
    ("C#", ArtStyle::Blueprint),
    ("Rust", ArtStyle::Steampunk),
    ("Go", ArtStyle::LineArt),
    ("Ruby", ArtStyle::Watercolor),
    ("Swift", ArtStyle::LineArt),
    ("Kotlin", ArtStyle::PopArt),
    ("PHP", ArtStyle::RetroWave),
    ("R", ArtStyle::InkWash),
    ("MATLAB", ArtStyle::Blueprint),
    ("Jupyter Notebook", ArtStyle::Cyberpunk),
    ("Haskell", ArtStyle::InkWash),
    ("Lua", ArtStyle::PixelArt),
    ("GDScript", ArtStyle::PixelArt),
];

/// Top domain -> background.
pub const DOMAIN_BACKGROUNDS: &[(DomainTag, Background)] = &[
    (DomainTag::AiMl, Background::NeuralNetwork),
    (DomainTag::WebFrontend, Background::HomeOffice),
    (DomainTag::WebBackend, Background::ServerRoom),
    (DomainTag::GameDev, Background::FantasyRealm),
    (DomainTag::Systems, Background::GearWorkshop),
    (DomainTag::Security, Background::NeonAlley),
    (DomainTag::Data, Background::ScrollLibrary),
    (DomainTag::Mobile, Background::CitySkyline),
    (DomainTag::DevOps, Background::DigitalForest),
];

/// Contribution style -> character.
pub const CONTRIBUTION_CHARACTERS: &[(ContributionStyle, Character)] = &[
    (ContributionStyle::SoloCreator, Character::WiseOwl),
    (ContributionStyle::Collaborator, Character::PlayfulOtter),
    (ContributionStyle::Architect, Character::IndustriousBeaver),
    (ContributionStyle::RefinedDeveloper, Character::ElegantCat),
];

/// (hour pattern, activity level) -> lighting.
pub const TEMPORAL_LIGHTING: &[((HourPattern, ActivityLevel), Lighting)] = &[
    ((HourPattern::MorningPerson, ActivityLevel::Casual), Lighting::SoftMorning),
    ((HourPattern::MorningPerson, ActivityLevel::Regular), Lighting::SoftMorning),
    ((HourPattern::MorningPerson, ActivityLevel::Intensive), Lighting::CrispDawn),
    ((HourPattern::DayCoder, ActivityLevel::Casual), Lighting::StudioDaylight),
    ((HourPattern::DayCoder, ActivityLevel::Regular), Lighting::BrightSunlight),
    ((HourPattern::DayCoder, ActivityLevel::Intensive), Lighting::BrightSunlight),
    ((HourPattern::NightOwl, ActivityLevel::Casual), Lighting::GoldenHour),
    ((HourPattern::NightOwl, ActivityLevel::Regular), Lighting::Moonlit),
    ((HourPattern::NightOwl, ActivityLevel::Intensive), Lighting::NeonGlow),
];

pub fn art_style_for(language: Option<&str>) -> ArtStyle {
    language
        .and_then(|lang| {
            LANGUAGE_STYLES
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(lang.trim()))
                .map(|(_, style)| *style)
        })
        .unwrap_or(DEFAULT_ART_STYLE)
}

pub fn background_for(domain: Option<DomainTag>) -> Background {
    domain
        .and_then(|d| DOMAIN_BACKGROUNDS.iter().find(|(key, _)| *key == d).map(|(_, b)| *b))
        .unwrap_or(DEFAULT_BACKGROUND)
}

pub fn character_for(style: ContributionStyle) -> Character {
    CONTRIBUTION_CHARACTERS
        .iter()
        .find(|(key, _)| *key == style)
        .map(|(_, c)| *c)
        .unwrap_or(DEFAULT_CHARACTER)
}

pub fn lighting_for(hour: HourPattern, activity: ActivityLevel) -> Lighting {
    TEMPORAL_LIGHTING
        .iter()
        .find(|(key, _)| *key == (hour, activity))
        .map(|(_, l)| *l)
        .unwrap_or(DEFAULT_LIGHTING)
}

/// How attributes are chosen: by table lookup, or by an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StyleMode {
    #[default]
    Automatic,
    Manual(StyleAttributes),
}

/// Everything the mapper reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleInputs<'a> {
    pub primary_language: Option<&'a str>,
    pub top_domain: Option<DomainTag>,
    pub labels: BehaviorLabels,
}

pub fn map_style(inputs: &StyleInputs<'_>, mode: &StyleMode) -> StyleAttributes {
    match mode {
        StyleMode::Manual(attrs) => *attrs,
        StyleMode::Automatic => StyleAttributes {
            art_style: art_style_for(inputs.primary_language),
            character: character_for(inputs.labels.contribution),
            background: background_for(inputs.top_domain),
            lighting: lighting_for(inputs.labels.temporal.hour, inputs.labels.activity),
        },
    }
}
