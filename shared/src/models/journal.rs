//! Barn journal models
//!
//! Journal entries collect notes, photos and voice memos about barn work.
//! Media is referenced by URL; analysis results from the vision and
//! transcription models are stored alongside each item.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::GpsCoordinates;

/// Number of distinct days reported in recent activity
pub const RECENT_ACTIVITY_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JournalEntryType {
    Photo,
    Audio,
    Combined,
    Note,
}

impl JournalEntryType {
    pub const ALL: [JournalEntryType; 4] = [
        JournalEntryType::Photo,
        JournalEntryType::Audio,
        JournalEntryType::Combined,
        JournalEntryType::Note,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JournalEntryType::Photo => "photo",
            JournalEntryType::Audio => "audio",
            JournalEntryType::Combined => "combined",
            JournalEntryType::Note => "note",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(JournalEntryType::Photo),
            "audio" => Some(JournalEntryType::Audio),
            "combined" => Some(JournalEntryType::Combined),
            "note" => Some(JournalEntryType::Note),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JournalCategory {
    Feeding,
    Care,
    Medical,
    Training,
    Maintenance,
    Observation,
    Other,
}

impl JournalCategory {
    pub const ALL: [JournalCategory; 7] = [
        JournalCategory::Feeding,
        JournalCategory::Care,
        JournalCategory::Medical,
        JournalCategory::Training,
        JournalCategory::Maintenance,
        JournalCategory::Observation,
        JournalCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JournalCategory::Feeding => "feeding",
            JournalCategory::Care => "care",
            JournalCategory::Medical => "medical",
            JournalCategory::Training => "training",
            JournalCategory::Maintenance => "maintenance",
            JournalCategory::Observation => "observation",
            JournalCategory::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "feeding" => Some(JournalCategory::Feeding),
            "care" => Some(JournalCategory::Care),
            "medical" => Some(JournalCategory::Medical),
            "training" => Some(JournalCategory::Training),
            "maintenance" => Some(JournalCategory::Maintenance),
            "observation" => Some(JournalCategory::Observation),
            "other" => Some(JournalCategory::Other),
            _ => None,
        }
    }
}

/// Progress of a photo analysis or audio transcription
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Pending,
    #[serde(alias = "transcribing")]
    Analyzing,
    Completed,
    Failed,
}

/// Which vision prompt(s) to run against a photo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PhotoAnalysisType {
    Food,
    Horse,
    #[default]
    General,
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct FoodItem {
    pub name: String,
    pub quantity: Option<String>,
    pub calories: Option<f64>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct HorseCondition {
    pub visible: bool,
    pub coat_condition: Option<String>,
    pub notes: Option<String>,
}

/// Result of a vision model pass over a photo.
///
/// Every field is optional so that partial model replies still parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PhotoAnalysis {
    pub description: Option<String>,
    pub confidence: Option<f64>,

    pub food_detected: Option<bool>,
    pub food_items: Vec<FoodItem>,
    pub total_calories: Option<f64>,

    pub horse_detected: Option<bool>,
    /// `blanketed`, `not_blanketed` or `uncertain`, as reported by the model
    pub blanket_status: Option<String>,
    pub blanket_type: Option<String>,
    pub horse_condition: Option<HorseCondition>,

    pub animals_detected: Vec<String>,
    pub barn_activity: Option<String>,

    pub analyzed_at: Option<DateTime<Utc>>,
}

impl PhotoAnalysis {
    /// Overlay `other` on top of `self`; fields present in `other` win
    pub fn merge(self, other: PhotoAnalysis) -> PhotoAnalysis {
        fn pick_vec<T>(base: Vec<T>, over: Vec<T>) -> Vec<T> {
            if over.is_empty() {
                base
            } else {
                over
            }
        }

        PhotoAnalysis {
            description: other.description.or(self.description),
            confidence: other.confidence.or(self.confidence),
            food_detected: other.food_detected.or(self.food_detected),
            food_items: pick_vec(self.food_items, other.food_items),
            total_calories: other.total_calories.or(self.total_calories),
            horse_detected: other.horse_detected.or(self.horse_detected),
            blanket_status: other.blanket_status.or(self.blanket_status),
            blanket_type: other.blanket_type.or(self.blanket_type),
            horse_condition: other.horse_condition.or(self.horse_condition),
            animals_detected: pick_vec(self.animals_detected, other.animals_detected),
            barn_activity: other.barn_activity.or(self.barn_activity),
            analyzed_at: other.analyzed_at.or(self.analyzed_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalPhoto {
    pub id: Uuid,
    pub url: String,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub analysis: Option<PhotoAnalysis>,
    #[serde(default)]
    pub analysis_status: AnalysisStatus,
    #[serde(default)]
    pub analysis_error: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl JournalPhoto {
    pub fn new(url: impl Into<String>, thumbnail_url: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            thumbnail_url,
            analysis: None,
            analysis_status: AnalysisStatus::Pending,
            analysis_error: None,
            uploaded_at: now,
        }
    }
}

/// What a voice memo said about a task
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskMentionAction {
    Completed,
    Added,
    Mentioned,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedTask {
    #[serde(default)]
    pub task_id: Option<Uuid>,
    pub task_title: String,
    pub action: TaskMentionAction,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Mentions {
    pub horses: Vec<String>,
    pub people: Vec<String>,
    pub locations: Vec<String>,
}

/// Content extracted from a transcript by the language model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TranscriptAnalysis {
    pub detected_tasks: Vec<DetectedTask>,
    pub keywords: Vec<String>,
    pub mentions: Mentions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioTranscription {
    pub text: String,
    pub language: Option<String>,
    pub confidence: Option<f64>,
    pub transcribed_at: DateTime<Utc>,
    #[serde(default)]
    pub detected_tasks: Vec<DetectedTask>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub mentions: Mentions,
}

impl AudioTranscription {
    pub fn with_analysis(self, analysis: TranscriptAnalysis) -> Self {
        Self {
            detected_tasks: analysis.detected_tasks,
            keywords: analysis.keywords,
            mentions: analysis.mentions,
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalAudio {
    pub id: Uuid,
    pub url: String,
    /// Recording length in seconds
    pub duration: f64,
    #[serde(default)]
    pub transcription: Option<AudioTranscription>,
    #[serde(default)]
    pub transcription_status: AnalysisStatus,
    #[serde(default)]
    pub transcription_error: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl JournalAudio {
    pub fn new(url: impl Into<String>, duration: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            duration,
            transcription: None,
            transcription_status: AnalysisStatus::Pending,
            transcription_error: None,
            uploaded_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletedTaskRef {
    pub task_id: Uuid,
    pub task_title: String,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalLocation {
    #[serde(flatten)]
    pub coordinates: GpsCoordinates,
    pub name: Option<String>,
}

/// Weather as noted on a journal entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalWeather {
    pub temperature_f: f64,
    pub condition: String,
    pub wind_speed_mph: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: String,
    pub entry_type: JournalEntryType,
    pub category: JournalCategory,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub photos: Vec<JournalPhoto>,
    pub audio: Vec<JournalAudio>,
    pub entry_date: DateTime<Utc>,
    pub related_tasks: Vec<Uuid>,
    pub completed_tasks: Vec<CompletedTaskRef>,
    pub location: Option<JournalLocation>,
    pub weather: Option<JournalWeather>,
    pub tags: Vec<String>,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn photo_mut(&mut self, photo_id: Uuid) -> Option<&mut JournalPhoto> {
        self.photos.iter_mut().find(|p| p.id == photo_id)
    }

    pub fn audio_mut(&mut self, audio_id: Uuid) -> Option<&mut JournalAudio> {
        self.audio.iter_mut().find(|a| a.id == audio_id)
    }
}

/// Filters for listing journal entries; absent fields match everything
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JournalQueryFilters {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub types: Vec<JournalEntryType>,
    pub categories: Vec<JournalCategory>,
    pub tags: Vec<String>,
    pub related_task_id: Option<Uuid>,
    pub has_photos: Option<bool>,
    pub has_audio: Option<bool>,
    pub search_text: Option<String>,
}

impl JournalQueryFilters {
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        if self.start_date.is_some_and(|start| entry.entry_date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| entry.entry_date > end) {
            return false;
        }
        if !self.types.is_empty() && !self.types.contains(&entry.entry_type) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&entry.category) {
            return false;
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| entry.tags.contains(t)) {
            return false;
        }
        if let Some(task_id) = self.related_task_id {
            if !entry.related_tasks.contains(&task_id) {
                return false;
            }
        }
        if let Some(want) = self.has_photos {
            if want == entry.photos.is_empty() {
                return false;
            }
        }
        if let Some(want) = self.has_audio {
            if want == entry.audio.is_empty() {
                return false;
            }
        }
        match self.search_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let needle = text.to_lowercase();
                let hit = |field: &Option<String>| {
                    field
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                };
                hit(&entry.title) || hit(&entry.notes)
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalStats {
    pub total_entries: u32,
    pub entries_by_type: BTreeMap<JournalEntryType, u32>,
    pub entries_by_category: BTreeMap<JournalCategory, u32>,
    pub total_photos: u32,
    pub total_audio_recordings: u32,
    /// Most recent first
    pub recent_activity: Vec<DailyActivity>,
}

impl JournalStats {
    pub fn from_entries(entries: &[JournalEntry]) -> Self {
        let mut entries_by_type: BTreeMap<_, u32> =
            JournalEntryType::ALL.iter().map(|t| (*t, 0)).collect();
        let mut entries_by_category: BTreeMap<_, u32> =
            JournalCategory::ALL.iter().map(|c| (*c, 0)).collect();
        let mut per_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        let mut total_photos = 0u32;
        let mut total_audio_recordings = 0u32;

        for entry in entries {
            *entries_by_type.entry(entry.entry_type).or_default() += 1;
            *entries_by_category.entry(entry.category).or_default() += 1;
            *per_day.entry(entry.entry_date.date_naive()).or_default() += 1;
            total_photos += entry.photos.len() as u32;
            total_audio_recordings += entry.audio.len() as u32;
        }

        let recent_activity = per_day
            .into_iter()
            .rev()
            .take(RECENT_ACTIVITY_DAYS)
            .map(|(date, count)| DailyActivity { date, count })
            .collect();

        Self {
            total_entries: entries.len() as u32,
            entries_by_type,
            entries_by_category,
            total_photos,
            total_audio_recordings,
            recent_activity,
        }
    }
}
