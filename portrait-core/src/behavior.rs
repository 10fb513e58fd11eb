//! Behavior Classifier: ActivityMetrics -> BehaviorLabels.
//!
//! Each axis is an ordered list of threshold rules. The first rule that
//! matches wins; the last rule of every axis is the fallback. A profile
//! with zero commits gets the fallback label on every axis.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::contributions::HighProfileContributions;
use crate::focus::{FocusSummary, StackFocus};
use crate::metrics::ActivityMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContributionStyle {
    SoloCreator,
    Collaborator,
    Architect,
    RefinedDeveloper,
}

impl ContributionStyle {
    pub const ALL: [ContributionStyle; 4] = [
        ContributionStyle::SoloCreator,
        ContributionStyle::Collaborator,
        ContributionStyle::Architect,
        ContributionStyle::RefinedDeveloper,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ContributionStyle::SoloCreator => "Solo Creator",
            ContributionStyle::Collaborator => "Collaborator",
            ContributionStyle::Architect => "Architect",
            ContributionStyle::RefinedDeveloper => "Refined Developer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityLevel {
    Casual,
    Regular,
    Intensive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 3] =
        [ActivityLevel::Casual, ActivityLevel::Regular, ActivityLevel::Intensive];

    pub fn label(&self) -> &'static str {
        match self {
            ActivityLevel::Casual => "Casual",
            ActivityLevel::Regular => "Regular",
            ActivityLevel::Intensive => "Intensive",
        }
    }

    /// Adjectives lent to the character.
    pub fn traits(&self) -> [&'static str; 3] {
        match self {
            ActivityLevel::Intensive => ["energetic", "dynamic", "powerful"],
            ActivityLevel::Regular => ["steady", "reliable", "focused"],
            ActivityLevel::Casual => ["relaxed", "contemplative", "peaceful"],
        }
    }
}

/// Hour-of-day axis of the temporal pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HourPattern {
    MorningPerson,
    DayCoder,
    NightOwl,
    Flexible,
}

impl HourPattern {
    pub const ALL: [HourPattern; 4] = [
        HourPattern::MorningPerson,
        HourPattern::DayCoder,
        HourPattern::NightOwl,
        HourPattern::Flexible,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HourPattern::MorningPerson => "Morning Person",
            HourPattern::DayCoder => "Day Coder",
            HourPattern::NightOwl => "Night Owl",
            HourPattern::Flexible => "Flexible",
        }
    }
}

/// Day-of-week axis of the temporal pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayPattern {
    WeekdayDeveloper,
    WeekendWarrior,
    AlwaysOn,
}

impl DayPattern {
    pub const ALL: [DayPattern; 3] =
        [DayPattern::WeekdayDeveloper, DayPattern::WeekendWarrior, DayPattern::AlwaysOn];

    pub fn label(&self) -> &'static str {
        match self {
            DayPattern::WeekdayDeveloper => "Weekday Developer",
            DayPattern::WeekendWarrior => "Weekend Warrior",
            DayPattern::AlwaysOn => "Always On",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemporalPattern {
    pub hour: HourPattern,
    pub day: DayPattern,
}

impl fmt::Display for TemporalPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.hour.label(), self.day.label())
    }
}

/// Exactly one label per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BehaviorLabels {
    pub contribution: ContributionStyle,
    pub activity: ActivityLevel,
    pub temporal: TemporalPattern,
}

impl BehaviorLabels {
    /// Fallback label on every axis.
    pub const FALLBACK: BehaviorLabels = BehaviorLabels {
        contribution: ContributionStyle::RefinedDeveloper,
        activity: ActivityLevel::Casual,
        temporal: TemporalPattern {
            hour: HourPattern::Flexible,
            day: DayPattern::AlwaysOn,
        },
    };
}

impl Default for BehaviorLabels {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Broad developer category used to pick a prompt template family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeveloperCategory {
    Legendary,
    Frontend,
    Backend,
    FullStack,
    Specialist,
}

impl DeveloperCategory {
    pub fn label(&self) -> &'static str {
        match self {
            DeveloperCategory::Legendary => "Legendary Contributor",
            DeveloperCategory::Frontend => "Frontend Specialist",
            DeveloperCategory::Backend => "Backend Engineer",
            DeveloperCategory::FullStack => "Full-stack Developer",
            DeveloperCategory::Specialist => "Specialist",
        }
    }
}

impl Default for DeveloperCategory {
    fn default() -> Self {
        DeveloperCategory::Specialist
    }
}

/// Any legendary framework wins, then the stack focus, then Specialist.
pub fn categorize(high_profile: &HighProfileContributions, focus: Option<&FocusSummary>) -> DeveloperCategory {
    if high_profile.legendary_count() > 0 {
        return DeveloperCategory::Legendary;
    }
    match focus.map(|f| f.primary) {
        Some(StackFocus::Frontend | StackFocus::FrontendLeaning) => DeveloperCategory::Frontend,
        Some(StackFocus::Backend | StackFocus::BackendLeaning) => DeveloperCategory::Backend,
        Some(StackFocus::FullStack) => DeveloperCategory::FullStack,
        None => DeveloperCategory::Specialist,
    }
}

/// Hour ranges, UTC, half-open.
const MORNING_HOURS: std::ops::Range<usize> = 5..12;
const DAY_HOURS: std::ops::Range<usize> = 12..18;

/// Cut points for every axis. Defaults are the reference values; change
/// them only after re-deriving them from real data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorThresholds {
    /// Owned-repo fraction at or above which SoloCreator is possible.
    pub solo_owned_fraction: f64,
    /// Collaboration signal strictly below which the profile is "solo".
    pub collaboration_low: f64,
    /// Collaboration signal at or above which the profile is a Collaborator.
    pub collaboration_high: f64,
    /// Documentation ratio at or above which the profile is an Architect.
    pub architect_docs_ratio: f64,
    /// Commits/week at or above which activity is Regular.
    pub regular_commits_per_week: f64,
    /// Commits/week at or above which activity is Intensive.
    pub intensive_commits_per_week: f64,
    /// Minimum share of commits a single hour range must hold.
    pub hour_dominance: f64,
    /// Weekend share strictly above which the profile is a WeekendWarrior.
    pub weekend_warrior_share: f64,
    /// Weekend share strictly below which the profile is a WeekdayDeveloper.
    pub weekday_developer_share: f64,
}

impl Default for BehaviorThresholds {
    fn default() -> Self {
        Self {
            solo_owned_fraction: 0.7,
            collaboration_low: 0.5,
            collaboration_high: 1.5,
            architect_docs_ratio: 0.5,
            regular_commits_per_week: 3.5,
            intensive_commits_per_week: 14.0,
            hour_dominance: 0.5,
            weekend_warrior_share: 1.0 / 3.0,
            weekday_developer_share: 0.15,
        }
    }
}

/// Classify with the reference thresholds.
pub fn classify(metrics: &ActivityMetrics) -> BehaviorLabels {
    classify_with(metrics, &BehaviorThresholds::default())
}

pub fn classify_with(metrics: &ActivityMetrics, t: &BehaviorThresholds) -> BehaviorLabels {
    if metrics.total_commits == 0 {
        return BehaviorLabels::FALLBACK;
    }
    BehaviorLabels {
        contribution: contribution_style(metrics, t),
        activity: activity_level(metrics, t),
        temporal: TemporalPattern {
            hour: hour_pattern(metrics, t),
            day: day_pattern(metrics, t),
        },
    }
}

fn contribution_style(m: &ActivityMetrics, t: &BehaviorThresholds) -> ContributionStyle {
    let collab = m.collaboration_signal();

    if m.owned_fraction() >= t.solo_owned_fraction && collab < t.collaboration_low {
        return ContributionStyle::SoloCreator;
    }
    if collab >= t.collaboration_high {
        return ContributionStyle::Collaborator;
    }
    if m.documentation_ratio() >= t.architect_docs_ratio {
        return ContributionStyle::Architect;
    }
    ContributionStyle::RefinedDeveloper
}

fn activity_level(m: &ActivityMetrics, t: &BehaviorThresholds) -> ActivityLevel {
    let per_week = m.mean_commits_per_week;
    if per_week >= t.intensive_commits_per_week {
        ActivityLevel::Intensive
    } else if per_week >= t.regular_commits_per_week {
        ActivityLevel::Regular
    } else {
        ActivityLevel::Casual
    }
}

fn hour_pattern(m: &ActivityMetrics, t: &BehaviorThresholds) -> HourPattern {
    let total = m.total_commits as f64;
    let sum = |hours: &[u32]| hours.iter().fold(0u32, |acc, c| acc.saturating_add(*c));
    let morning = sum(&m.hourly_commits[MORNING_HOURS]);
    let day = sum(&m.hourly_commits[DAY_HOURS]);
    let night = m.total_commits.saturating_sub(morning.saturating_add(day));

    let ranges = [
        (HourPattern::MorningPerson, morning),
        (HourPattern::DayCoder, day),
        (HourPattern::NightOwl, night),
    ];
    let best = ranges.iter().map(|(_, c)| *c).max().unwrap_or(0);

    // Rule order breaks ties: morning, then day, then night.
    for (pattern, count) in ranges {
        if count == best && count as f64 / total >= t.hour_dominance {
            return pattern;
        }
    }
    HourPattern::Flexible
}

fn day_pattern(m: &ActivityMetrics, t: &BehaviorThresholds) -> DayPattern {
    let weekend_share = m.weekend_commits() as f64 / m.total_commits as f64;
    if weekend_share > t.weekend_warrior_share {
        DayPattern::WeekendWarrior
    } else if weekend_share < t.weekday_developer_share {
        DayPattern::WeekdayDeveloper
    } else {
        DayPattern::AlwaysOn
    }
}
