//! Activity Metrics Extractor: raw repository/commit records -> numeric aggregates.
//!
//! Never fails. Unparseable timestamps are skipped and an empty profile
//! yields all-zero metrics.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::profile::RawProfile;

/// Derived numeric summary of a profile. Plain value type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    /// Language -> bytes, summed over authored (owned, non-fork) repositories.
    pub language_bytes: BTreeMap<String, u64>,
    /// Commit counts per UTC hour of day.
    pub hourly_commits: [u32; 24],
    /// Commit counts per weekday, Monday = 0.
    pub weekday_commits: [u32; 7],
    pub total_commits: u32,
    pub skipped_timestamps: u32,
    pub owned_repos: u32,
    pub forked_repos: u32,
    pub total_repos: u32,
    pub forks_received: u32,
    pub pull_requests_to_others: u32,
    pub documented_repos: u32,
    pub mean_commits_per_week: f64,
}

/// A language and its share of authored bytes, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub language: String,
    pub bytes: u64,
    pub percent: f64,
}

impl ActivityMetrics {
    pub fn total_bytes(&self) -> u64 {
        self.language_bytes.values().fold(0u64, |acc, b| acc.saturating_add(*b))
    }

    /// Every authored language with its percentage, largest first.
    /// Empty when no bytes were counted ("no primary language").
    pub fn language_shares(&self) -> Vec<LanguageShare> {
        let total = self.total_bytes();
        if total == 0 {
            return Vec::new();
        }
        let mut shares: Vec<LanguageShare> = self
            .language_bytes
            .iter()
            .filter(|(_, b)| **b > 0)
            .map(|(language, bytes)| LanguageShare {
                language: language.clone(),
                bytes: *bytes,
                percent: *bytes as f64 / total as f64 * 100.0,
            })
            .collect();
        // Stable sort keeps the BTreeMap's alphabetical order on byte ties.
        shares.sort_by(|a, b| b.bytes.cmp(&a.bytes));
        shares
    }

    /// Largest authored language, or `None` when total bytes is zero.
    pub fn primary_language(&self) -> Option<LanguageShare> {
        self.language_shares().into_iter().next()
    }

    /// Fraction of repositories the account authored.
    pub fn owned_fraction(&self) -> f64 {
        ratio(self.owned_repos, self.total_repos)
    }

    /// Forks received plus PRs to other projects, per repository.
    pub fn collaboration_signal(&self) -> f64 {
        let signal = self.forks_received.saturating_add(self.pull_requests_to_others);
        if self.total_repos == 0 {
            return signal as f64;
        }
        signal as f64 / self.total_repos as f64
    }

    /// Fraction of authored repositories carrying documentation files.
    pub fn documentation_ratio(&self) -> f64 {
        ratio(self.documented_repos, self.owned_repos)
    }

    pub fn weekend_commits(&self) -> u32 {
        self.weekday_commits[5].saturating_add(self.weekday_commits[6])
    }

    pub fn is_empty(&self) -> bool {
        self.total_commits == 0 && self.total_repos == 0
    }
}

/// Counters saturate instead of wrapping on very large inputs.
fn bump(counter: &mut u32, by: u32) {
    *counter = counter.saturating_add(by);
}

fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Extract activity metrics from a raw profile.
pub fn extract(profile: &RawProfile) -> ActivityMetrics {
    let mut m = ActivityMetrics {
        pull_requests_to_others: profile.pull_requests_to_others,
        ..ActivityMetrics::default()
    };

    for repo in &profile.repositories {
        bump(&mut m.total_repos, 1);
        bump(&mut m.forks_received, repo.forks_received);
        if repo.is_fork {
            bump(&mut m.forked_repos, 1);
        }
        if !repo.is_authored() {
            continue;
        }
        bump(&mut m.owned_repos, 1);
        if repo.has_docs {
            bump(&mut m.documented_repos, 1);
        }
        for (language, bytes) in &repo.languages {
            let total = m.language_bytes.entry(language.clone()).or_insert(0);
            *total = total.saturating_add(*bytes);
        }
    }

    for raw in &profile.commit_timestamps {
        let Some(ts) = parse_timestamp(raw) else {
            debug!(login = %profile.login, timestamp = %raw, "skipping unparseable commit timestamp");
            bump(&mut m.skipped_timestamps, 1);
            continue;
        };
        bump(&mut m.hourly_commits[ts.hour() as usize], 1);
        bump(&mut m.weekday_commits[ts.weekday().num_days_from_monday() as usize], 1);
        bump(&mut m.total_commits, 1);
    }

    if profile.window_days > 0 {
        let weeks = profile.window_days as f64 / 7.0;
        m.mean_commits_per_week = m.total_commits as f64 / weeks;
    }

    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Repository;

    #[test]
    fn test_empty_profile_is_all_zero() {
        let m = extract(&RawProfile::new("nobody"));
        assert_eq!(m, ActivityMetrics::default());
        assert!(m.is_empty());
        assert!(m.primary_language().is_none());
        assert!(m.language_shares().is_empty());
        assert_eq!(m.owned_fraction(), 0.0);
        assert_eq!(m.documentation_ratio(), 0.0);
    }

    #[test]
    fn test_forks_excluded_from_language_bytes() {
        let p = RawProfile::new("dev")
            .with_repository(Repository::new("mine").with_language("Rust", 3000))
            .with_repository(Repository::new("theirs").with_language("Go", 9000).forked())
            .with_repository(
                Repository::new("org").with_language("Java", 5000).not_owned(),
            );
        let m = extract(&p);
        assert_eq!(m.total_bytes(), 3000);
        assert_eq!(m.language_bytes.get("Go"), None);
        assert_eq!(m.owned_repos, 1);
        assert_eq!(m.forked_repos, 1);
        assert_eq!(m.total_repos, 3);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let p = RawProfile::new("dev").with_repository(
            Repository::new("a")
                .with_language("Python", 1)
                .with_language("C", 1)
                .with_language("Shell", 1),
        );
        let shares = extract(&p).language_shares();
        let sum: f64 = shares.iter().map(|s| s.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9, "sum was {sum}");
    }

    #[test]
    fn test_zero_bytes_means_no_primary_language() {
        let p = RawProfile::new("dev").with_repository(Repository::new("a").with_language("Rust", 0));
        let m = extract(&p);
        assert!(m.primary_language().is_none());
    }

    #[test]
    fn test_histograms_and_skipped_timestamps() {
        // 2024-03-04 is a Monday.
        let p = RawProfile::new("dev").with_commits([
            "2024-03-04T09:15:00Z",
            "2024-03-04T23:59:59+00:00",
            "2024-03-09T10:00:00+02:00",
            "yesterday",
            "",
        ]);
        let m = extract(&p);
        assert_eq!(m.total_commits, 3);
        assert_eq!(m.skipped_timestamps, 2);
        assert_eq!(m.hourly_commits[9], 1);
        assert_eq!(m.hourly_commits[23], 1);
        assert_eq!(m.hourly_commits[8], 1);
        assert_eq!(m.weekday_commits[0], 2);
        assert_eq!(m.weekday_commits[5], 1);
        assert_eq!(m.weekend_commits(), 1);
    }

    #[test]
    fn test_large_counts_saturate() {
        let mut p = RawProfile::new("dev")
            .with_repository(Repository::new("a").with_forks_received(u32::MAX).with_language("C", u64::MAX))
            .with_repository(Repository::new("b").with_forks_received(7).with_language("C", 1))
            .with_pull_requests_to_others(u32::MAX);
        p.window_days = 7;
        let m = extract(&p);
        assert_eq!(m.forks_received, u32::MAX);
        assert_eq!(m.language_bytes["C"], u64::MAX);
        assert_eq!(m.total_bytes(), u64::MAX);
        assert_eq!(m.collaboration_signal(), u32::MAX as f64 / 2.0);

        let lone = ActivityMetrics {
            forks_received: 1,
            pull_requests_to_others: u32::MAX,
            ..ActivityMetrics::default()
        };
        assert_eq!(lone.collaboration_signal(), u32::MAX as f64);
    }

    #[test]
    fn test_mean_commits_per_week_uses_window() {
        let mut p = RawProfile::new("dev").with_commits(vec!["2024-03-04T09:00:00Z"; 14]);
        p.window_days = 14;
        assert!((extract(&p).mean_commits_per_week - 7.0).abs() < 1e-9);
        p.window_days = 0;
        assert_eq!(extract(&p).mean_commits_per_week, 0.0);
    }
}
