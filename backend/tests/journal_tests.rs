//! Journal tests
//!
//! Tests for journal entries including:
//! - list filters (dates, tags, related tasks, search)
//! - statistics and recent activity
//! - applying transcript analysis to a transcription

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use shared::{
    AudioTranscription, DetectedTask, JournalAudio, JournalCategory, JournalEntry,
    JournalEntryType, JournalPhoto, JournalQueryFilters, JournalStats, Mentions,
    TaskMentionAction, TranscriptAnalysis, RECENT_ACTIVITY_DAYS,
};
use uuid::Uuid;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

fn entry(entry_type: JournalEntryType, category: JournalCategory, when: DateTime<Utc>) -> JournalEntry {
    JournalEntry {
        id: Uuid::new_v4(),
        user_id: "user-1".to_string(),
        entry_type,
        category,
        title: None,
        notes: None,
        photos: Vec::new(),
        audio: Vec::new(),
        entry_date: when,
        related_tasks: Vec::new(),
        completed_tasks: Vec::new(),
        location: None,
        weather: None,
        tags: Vec::new(),
        is_private: true,
        created_at: when,
        updated_at: when,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_date_bounds_are_inclusive() {
        let e = entry(JournalEntryType::Note, JournalCategory::Care, at(10, 8));
        let exact = JournalQueryFilters {
            start_date: Some(at(10, 8)),
            end_date: Some(at(10, 8)),
            ..Default::default()
        };
        assert!(exact.matches(&e));

        let before = JournalQueryFilters {
            end_date: Some(at(10, 7)),
            ..Default::default()
        };
        assert!(!before.matches(&e));
    }

    #[test]
    fn test_any_tag_matches() {
        let mut e = entry(JournalEntryType::Note, JournalCategory::Training, at(3, 9));
        e.tags = vec!["arena".to_string(), "lunging".to_string()];

        let filters = JournalQueryFilters {
            tags: vec!["trail".to_string(), "lunging".to_string()],
            ..Default::default()
        };
        assert!(filters.matches(&e));
    }

    #[test]
    fn test_related_task_filter() {
        let task_id = Uuid::new_v4();
        let mut e = entry(JournalEntryType::Note, JournalCategory::Feeding, at(3, 9));
        e.related_tasks.push(task_id);

        let hit = JournalQueryFilters {
            related_task_id: Some(task_id),
            ..Default::default()
        };
        let miss = JournalQueryFilters {
            related_task_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(hit.matches(&e));
        assert!(!miss.matches(&e));
    }

    #[test]
    fn test_search_covers_notes_and_ignores_blank() {
        let mut e = entry(JournalEntryType::Audio, JournalCategory::Medical, at(4, 9));
        e.notes = Some("Vet checked the left fore".to_string());

        let notes = JournalQueryFilters {
            search_text: Some("left FORE".to_string()),
            ..Default::default()
        };
        assert!(notes.matches(&e));

        let blank = JournalQueryFilters {
            search_text: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.matches(&e));

        let title_only = JournalQueryFilters {
            search_text: Some("farrier".to_string()),
            ..Default::default()
        };
        assert!(!title_only.matches(&e));
    }

    #[test]
    fn test_media_presence_filters() {
        let mut e = entry(JournalEntryType::Combined, JournalCategory::Care, at(6, 9));
        e.audio
            .push(JournalAudio::new("https://cdn/memo.m4a", 30.0, at(6, 9)));

        let with_audio = JournalQueryFilters {
            has_audio: Some(true),
            has_photos: Some(false),
            ..Default::default()
        };
        assert!(with_audio.matches(&e));

        e.photos
            .push(JournalPhoto::new("https://cdn/stall.jpg", None, at(6, 9)));
        assert!(!with_audio.matches(&e));
    }

    #[test]
    fn test_stats_of_empty_journal() {
        let stats = JournalStats::from_entries(&[]);
        assert_eq!(stats.total_entries, 0);
        assert!(stats.recent_activity.is_empty());
        assert!(stats.entries_by_type.values().all(|n| *n == 0));
        assert_eq!(stats.entries_by_type.len(), JournalEntryType::ALL.len());
    }

    #[test]
    fn test_same_day_entries_share_activity() {
        let entries = vec![
            entry(JournalEntryType::Note, JournalCategory::Care, at(8, 6)),
            entry(JournalEntryType::Note, JournalCategory::Care, at(8, 18)),
            entry(JournalEntryType::Photo, JournalCategory::Feeding, at(7, 6)),
        ];
        let stats = JournalStats::from_entries(&entries);
        assert_eq!(stats.recent_activity.len(), 2);
        assert_eq!(stats.recent_activity[0].count, 2);
        assert_eq!(stats.recent_activity[1].count, 1);
    }

    #[test]
    fn test_transcript_analysis_is_applied() {
        let transcription = AudioTranscription {
            text: "Fed Clover and picked out her stall".to_string(),
            language: Some("en".to_string()),
            confidence: None,
            transcribed_at: at(9, 7),
            detected_tasks: Vec::new(),
            keywords: Vec::new(),
            mentions: Mentions::default(),
        };
        let analysis = TranscriptAnalysis {
            detected_tasks: vec![DetectedTask {
                task_id: None,
                task_title: "Muck stalls".to_string(),
                action: TaskMentionAction::Completed,
                confidence: 0.8,
            }],
            keywords: vec!["stall".to_string()],
            mentions: Mentions {
                horses: vec!["Clover".to_string()],
                ..Default::default()
            },
        };

        let applied = transcription.with_analysis(analysis);
        assert_eq!(applied.text, "Fed Clover and picked out her stall");
        assert_eq!(applied.detected_tasks.len(), 1);
        assert_eq!(applied.mentions.horses, vec!["Clover".to_string()]);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn entries_strategy() -> impl Strategy<Value = Vec<(usize, usize, i64, usize)>> {
        prop::collection::vec((0usize..4, 0usize..7, 0i64..30, 0usize..3), 0..40)
    }

    fn build(specs: &[(usize, usize, i64, usize)]) -> Vec<JournalEntry> {
        let categories = [
            JournalCategory::Feeding,
            JournalCategory::Care,
            JournalCategory::Medical,
            JournalCategory::Training,
            JournalCategory::Maintenance,
            JournalCategory::Observation,
            JournalCategory::Other,
        ];
        specs
            .iter()
            .map(|(t, c, offset, photos)| {
                let when = at(1, 12) + Duration::days(*offset);
                let mut e = entry(JournalEntryType::ALL[*t], categories[*c], when);
                for i in 0..*photos {
                    e.photos
                        .push(JournalPhoto::new(format!("https://cdn/{i}.jpg"), None, when));
                }
                e
            })
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Per-type and per-category counts add up to the total
        #[test]
        fn prop_stats_totals_agree(specs in entries_strategy()) {
            let entries = build(&specs);
            let stats = JournalStats::from_entries(&entries);

            prop_assert_eq!(stats.total_entries as usize, entries.len());
            prop_assert_eq!(stats.entries_by_type.values().sum::<u32>(), stats.total_entries);
            prop_assert_eq!(stats.entries_by_category.values().sum::<u32>(), stats.total_entries);
            let photos: usize = specs.iter().map(|s| s.3).sum();
            prop_assert_eq!(stats.total_photos as usize, photos);
        }

        /// Recent activity lists at most a week of distinct days, newest first
        #[test]
        fn prop_recent_activity_ordered(specs in entries_strategy()) {
            let stats = JournalStats::from_entries(&build(&specs));

            prop_assert!(stats.recent_activity.len() <= RECENT_ACTIVITY_DAYS);
            for pair in stats.recent_activity.windows(2) {
                prop_assert!(pair[0].date > pair[1].date);
            }
            prop_assert!(stats.recent_activity.iter().all(|d| d.count > 0));
        }

        /// Default filters match every entry
        #[test]
        fn prop_default_filters_match_all(specs in entries_strategy()) {
            let filters = JournalQueryFilters::default();
            prop_assert!(build(&specs).iter().all(|e| filters.matches(e)));
        }
    }
}
