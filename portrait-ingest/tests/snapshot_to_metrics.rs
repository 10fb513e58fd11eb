use chrono::{TimeZone, Utc};
use portrait_core::behavior::{ContributionStyle, DayPattern, HourPattern, classify};
use portrait_core::metrics::extract;
use portrait_ingest::{ProfileSnapshot, to_raw_profile};

const SNAPSHOT: &str = r#"{
  "user": { "login": "nightfox", "avatar_url": "https://avatars.example/u/1" },
  "pull_requests_to_others": 0,
  "repos": [
    {
      "repo": { "name": "shader-lab", "language": "C++", "owner": { "login": "nightfox" },
                "pushed_at": "2026-03-28T02:00:00Z", "forks_count": 0 },
      "languages": { "C++": 9000, "GLSL": 1000 },
      "readme": { "content": "QSBzaGFkZXIgcGxheWdyb3VuZA==", "encoding": "base64" },
      "commits": [
        { "sha": "1", "commit": { "author": { "date": "2026-03-28T02:00:00Z" } } },
        { "sha": "2", "commit": { "author": { "date": "2026-03-29T23:30:00Z" } } },
        { "sha": "3", "commit": { "author": { "date": "2026-03-21T01:15:00Z" } } },
        { "sha": "4", "commit": { "committer": { "date": "2026-03-22T03:45:00Z" } } }
      ]
    },
    {
      "repo": { "name": "old-thing", "language": "Java", "pushed_at": "2024-01-01T00:00:00Z" },
      "languages": { "Java": 50000 }
    }
  ]
}"#;

#[test]
fn test_snapshot_feeds_metrics_and_labels() {
    let snapshot: ProfileSnapshot = serde_json::from_str(SNAPSHOT).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
    let profile = to_raw_profile(&snapshot, 90, now).unwrap();

    assert_eq!(profile.repositories.len(), 1);
    assert_eq!(profile.repositories[0].readme.as_deref(), Some("A shader playground"));
    assert_eq!(profile.avatar_url.as_deref(), Some("https://avatars.example/u/1"));

    let metrics = extract(&profile);
    assert_eq!(metrics.total_commits, 4);
    assert_eq!(metrics.primary_language().map(|l| l.language), Some("C++".to_string()));

    let labels = classify(&metrics);
    assert_eq!(labels.contribution, ContributionStyle::SoloCreator);
    assert_eq!(labels.temporal.hour, HourPattern::NightOwl);
    // Every commit landed on a weekend.
    assert_eq!(labels.temporal.day, DayPattern::WeekendWarrior);
}
