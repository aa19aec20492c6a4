//! Barn journal service
//!
//! Entries are stored one row each with their media, task references and
//! tags as JSONB. Date and task filters run in SQL; the remaining filters
//! are applied with [`JournalQueryFilters::matches`].
//!
//! Photo analysis and transcription update a single media item inside the
//! entry. The status is saved before the model is called and the outcome
//! after, each in its own short transaction, so no lock is held while the
//! external service runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    AnalysisStatus, CompletedTaskRef, JournalAudio, JournalCategory, JournalEntry,
    JournalEntryType, JournalLocation, JournalPhoto, JournalQueryFilters, JournalStats,
    JournalWeather, PhotoAnalysisType,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::external::transcription::analyze_transcript;
use crate::external::{GeminiClient, PhotoAnalyzer, WhisperClient};

#[derive(Clone)]
pub struct JournalService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct JournalRow {
    id: Uuid,
    user_id: String,
    entry_type: String,
    category: String,
    title: Option<String>,
    notes: Option<String>,
    photos: serde_json::Value,
    audio: serde_json::Value,
    entry_date: DateTime<Utc>,
    related_tasks: Vec<Uuid>,
    completed_tasks: serde_json::Value,
    location: Option<serde_json::Value>,
    weather: Option<serde_json::Value>,
    tags: serde_json::Value,
    is_private: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JournalRow> for JournalEntry {
    type Error = AppError;

    fn try_from(row: JournalRow) -> Result<Self, Self::Error> {
        fn json<T: serde::de::DeserializeOwned>(
            field: &str,
            value: serde_json::Value,
        ) -> AppResult<T> {
            serde_json::from_value(value)
                .map_err(|e| AppError::Internal(format!("Corrupt journal {}: {}", field, e)))
        }

        let entry_type = JournalEntryType::from_str(&row.entry_type)
            .ok_or_else(|| AppError::Internal(format!("Unknown entry type {}", row.entry_type)))?;
        let category = JournalCategory::from_str(&row.category)
            .ok_or_else(|| AppError::Internal(format!("Unknown category {}", row.category)))?;

        Ok(JournalEntry {
            id: row.id,
            user_id: row.user_id,
            entry_type,
            category,
            title: row.title,
            notes: row.notes,
            photos: json("photos", row.photos)?,
            audio: json("audio", row.audio)?,
            entry_date: row.entry_date,
            related_tasks: row.related_tasks,
            completed_tasks: json("completed tasks", row.completed_tasks)?,
            location: row.location.map(|v| json("location", v)).transpose()?,
            weather: row.weather.map(|v| json("weather", v)).transpose()?,
            tags: json("tags", row.tags)?,
            is_private: row.is_private,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const JOURNAL_COLUMNS: &str = "id, user_id, entry_type, category, title, notes, photos, audio, \
     entry_date, related_tasks, completed_tasks, location, weather, tags, is_private, \
     created_at, updated_at";

/// Entry details shared by create and update
#[derive(Debug, Deserialize, Validate)]
pub struct JournalEntryInput {
    pub entry_type: JournalEntryType,
    pub category: JournalCategory,
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 10000))]
    pub notes: Option<String>,
    /// Defaults to now
    pub entry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub related_tasks: Vec<Uuid>,
    #[serde(default)]
    pub completed_tasks: Vec<CompletedTaskRef>,
    pub location: Option<JournalLocation>,
    pub weather: Option<JournalWeather>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_private")]
    pub is_private: bool,
}

fn default_private() -> bool {
    true
}

impl JournalEntryInput {
    fn check(&self) -> AppResult<()> {
        self.validate()?;
        if let Some(location) = &self.location {
            shared::validate_coordinates(&location.coordinates)
                .map_err(|m| AppError::invalid("location", m))?;
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(AppError::invalid("tags", "Tags cannot be empty"));
        }
        Ok(())
    }

    fn normalized_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.tags.iter().map(|t| t.trim().to_string()).collect();
        tags.sort();
        tags.dedup();
        tags
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PhotoInput {
    #[validate(length(min = 1))]
    pub url: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AudioInput {
    #[validate(length(min = 1))]
    pub url: String,
    /// Seconds
    #[serde(default)]
    pub duration: f64,
}

/// New entry, optionally with media already uploaded
#[derive(Debug, Deserialize, Validate)]
pub struct NewJournalEntry {
    #[serde(flatten)]
    #[validate]
    pub details: JournalEntryInput,
    #[serde(default)]
    pub photos: Vec<PhotoInput>,
    #[serde(default)]
    pub audio: Vec<AudioInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzePhotoInput {
    #[serde(default)]
    pub analysis_type: PhotoAnalysisType,
}

#[derive(Debug, Deserialize)]
pub struct TranscribeAudioInput {
    pub language: Option<String>,
    /// Run the task and mention extraction pass
    #[serde(default = "default_analyze")]
    pub analyze: bool,
}

fn default_analyze() -> bool {
    true
}

/// Outcome of a media operation together with the item's final state
#[derive(Debug, Serialize)]
pub struct MediaResult<T> {
    pub entry_id: Uuid,
    pub item: T,
}

impl PhotoInput {
    fn into_photo(self, now: DateTime<Utc>) -> AppResult<JournalPhoto> {
        self.validate()?;
        shared::validate_media_url(&self.url).map_err(|m| AppError::invalid("url", m))?;
        if let Some(thumb) = &self.thumbnail_url {
            shared::validate_media_url(thumb).map_err(|m| AppError::invalid("thumbnail_url", m))?;
        }
        Ok(JournalPhoto::new(self.url, self.thumbnail_url, now))
    }
}

impl AudioInput {
    fn into_audio(self, now: DateTime<Utc>) -> AppResult<JournalAudio> {
        self.validate()?;
        shared::validate_media_url(&self.url).map_err(|m| AppError::invalid("url", m))?;
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(AppError::invalid("duration", "Duration must be a non-negative number"));
        }
        Ok(JournalAudio::new(self.url, self.duration, now))
    }
}

impl JournalService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_entry(
        &self,
        user_id: &str,
        input: NewJournalEntry,
    ) -> AppResult<JournalEntry> {
        input.details.check()?;
        let now = Utc::now();
        let photos = input
            .photos
            .into_iter()
            .map(|p| p.into_photo(now))
            .collect::<AppResult<Vec<_>>>()?;
        let audio = input
            .audio
            .into_iter()
            .map(|a| a.into_audio(now))
            .collect::<AppResult<Vec<_>>>()?;
        let details = input.details;

        let row = sqlx::query_as::<_, JournalRow>(&format!(
            r#"
            INSERT INTO journal_entries (
                user_id, entry_type, category, title, notes, photos, audio, entry_date,
                related_tasks, completed_tasks, location, weather, tags, is_private
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {JOURNAL_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(details.entry_type.as_str())
        .bind(details.category.as_str())
        .bind(&details.title)
        .bind(&details.notes)
        .bind(to_json(&photos)?)
        .bind(to_json(&audio)?)
        .bind(details.entry_date.unwrap_or(now))
        .bind(&details.related_tasks)
        .bind(to_json(&details.completed_tasks)?)
        .bind(details.location.as_ref().map(to_json).transpose()?)
        .bind(details.weather.as_ref().map(to_json).transpose()?)
        .bind(to_json(&details.normalized_tags())?)
        .bind(details.is_private)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(entry_id = %row.id, entry_type = %row.entry_type, "Journal entry created");
        row.try_into()
    }

    pub async fn get_entry(&self, user_id: &str, entry_id: Uuid) -> AppResult<JournalEntry> {
        sqlx::query_as::<_, JournalRow>(&format!(
            "SELECT {JOURNAL_COLUMNS} FROM journal_entries WHERE id = $1 AND user_id = $2"
        ))
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Journal entry".to_string()))?
        .try_into()
    }

    /// Entries matching `filters`, newest first
    pub async fn list_entries(
        &self,
        user_id: &str,
        filters: &JournalQueryFilters,
    ) -> AppResult<Vec<JournalEntry>> {
        let rows = sqlx::query_as::<_, JournalRow>(&format!(
            r#"
            SELECT {JOURNAL_COLUMNS} FROM journal_entries
            WHERE user_id = $1
              AND ($2::timestamptz IS NULL OR entry_date >= $2)
              AND ($3::timestamptz IS NULL OR entry_date <= $3)
              AND ($4::uuid IS NULL OR $4 = ANY(related_tasks))
            ORDER BY entry_date DESC
            "#
        ))
        .bind(user_id)
        .bind(filters.start_date)
        .bind(filters.end_date)
        .bind(filters.related_task_id)
        .fetch_all(&self.db)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let entry = JournalEntry::try_from(row)?;
            if filters.matches(&entry) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    pub async fn get_stats(&self, user_id: &str) -> AppResult<JournalStats> {
        let entries = self
            .list_entries(user_id, &JournalQueryFilters::default())
            .await?;
        Ok(JournalStats::from_entries(&entries))
    }

    /// Replace the entry's details; attached media is kept
    pub async fn update_entry(
        &self,
        user_id: &str,
        entry_id: Uuid,
        input: JournalEntryInput,
    ) -> AppResult<JournalEntry> {
        input.check()?;

        sqlx::query_as::<_, JournalRow>(&format!(
            r#"
            UPDATE journal_entries
            SET entry_type = $3, category = $4, title = $5, notes = $6,
                entry_date = COALESCE($7, entry_date), related_tasks = $8,
                completed_tasks = $9, location = $10, weather = $11, tags = $12,
                is_private = $13, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {JOURNAL_COLUMNS}
            "#
        ))
        .bind(entry_id)
        .bind(user_id)
        .bind(input.entry_type.as_str())
        .bind(input.category.as_str())
        .bind(&input.title)
        .bind(&input.notes)
        .bind(input.entry_date)
        .bind(&input.related_tasks)
        .bind(to_json(&input.completed_tasks)?)
        .bind(input.location.as_ref().map(to_json).transpose()?)
        .bind(input.weather.as_ref().map(to_json).transpose()?)
        .bind(to_json(&input.normalized_tags())?)
        .bind(input.is_private)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Journal entry".to_string()))?
        .try_into()
    }

    pub async fn delete_entry(&self, user_id: &str, entry_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM journal_entries WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Journal entry".to_string()));
        }
        tracing::info!(entry_id = %entry_id, "Journal entry deleted");
        Ok(())
    }

    pub async fn add_photo(
        &self,
        user_id: &str,
        entry_id: Uuid,
        input: PhotoInput,
    ) -> AppResult<JournalEntry> {
        let photo = input.into_photo(Utc::now())?;
        let mut tx = self.db.begin().await?;
        let mut entry = lock_entry(&mut tx, user_id, entry_id).await?;
        entry.photos.push(photo);
        let entry = save_media(&mut tx, &entry).await?;
        tx.commit().await?;
        Ok(entry)
    }

    pub async fn add_audio(
        &self,
        user_id: &str,
        entry_id: Uuid,
        input: AudioInput,
    ) -> AppResult<JournalEntry> {
        let audio = input.into_audio(Utc::now())?;
        let mut tx = self.db.begin().await?;
        let mut entry = lock_entry(&mut tx, user_id, entry_id).await?;
        entry.audio.push(audio);
        let entry = save_media(&mut tx, &entry).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Run the vision model over a photo and store the result.
    ///
    /// A failed analysis is recorded on the photo before the error is returned.
    pub async fn analyze_photo(
        &self,
        analyzer: &PhotoAnalyzer,
        user_id: &str,
        entry_id: Uuid,
        photo_id: Uuid,
        analysis_type: PhotoAnalysisType,
    ) -> AppResult<MediaResult<JournalPhoto>> {
        let photo = self
            .update_photo(user_id, entry_id, photo_id, |photo| {
                photo.analysis_status = AnalysisStatus::Analyzing;
                photo.analysis_error = None;
            })
            .await?;

        tracing::info!(photo_id = %photo_id, ?analysis_type, "Analyzing journal photo");
        let outcome = analyzer.analyze(&photo.url, analysis_type, Utc::now()).await;

        let (photo, result) = match outcome {
            Ok(analysis) => {
                let photo = self
                    .update_photo(user_id, entry_id, photo_id, move |photo| {
                        photo.analysis = Some(analysis);
                        photo.analysis_status = AnalysisStatus::Completed;
                    })
                    .await?;
                (photo, Ok(()))
            }
            Err(e) => {
                let message = e.to_string();
                let photo = self
                    .update_photo(user_id, entry_id, photo_id, |photo| {
                        photo.analysis_status = AnalysisStatus::Failed;
                        photo.analysis_error = Some(message);
                    })
                    .await?;
                (photo, Err(e))
            }
        };

        result.map(|()| MediaResult {
            entry_id,
            item: photo,
        })
    }

    /// Transcribe a voice memo and, when a language model is available,
    /// extract the tasks and names it mentions
    pub async fn transcribe_audio(
        &self,
        whisper: &WhisperClient,
        gemini: Option<&GeminiClient>,
        user_id: &str,
        entry_id: Uuid,
        audio_id: Uuid,
        input: TranscribeAudioInput,
    ) -> AppResult<MediaResult<JournalAudio>> {
        let audio = self
            .update_audio(user_id, entry_id, audio_id, |audio| {
                audio.transcription_status = AnalysisStatus::Analyzing;
                audio.transcription_error = None;
            })
            .await?;

        tracing::info!(audio_id = %audio_id, "Transcribing journal audio");
        let outcome = whisper
            .transcribe_url(&audio.url, input.language.as_deref(), Utc::now())
            .await;

        match outcome {
            Ok(mut transcription) => {
                if let (true, Some(gemini)) = (input.analyze, gemini) {
                    let analysis = analyze_transcript(gemini, &transcription.text).await;
                    transcription = transcription.with_analysis(analysis);
                }
                let audio = self
                    .update_audio(user_id, entry_id, audio_id, move |audio| {
                        audio.transcription = Some(transcription);
                        audio.transcription_status = AnalysisStatus::Completed;
                    })
                    .await?;
                Ok(MediaResult {
                    entry_id,
                    item: audio,
                })
            }
            Err(e) => {
                let message = e.to_string();
                self.update_audio(user_id, entry_id, audio_id, |audio| {
                    audio.transcription_status = AnalysisStatus::Failed;
                    audio.transcription_error = Some(message);
                })
                .await?;
                Err(e)
            }
        }
    }

    async fn update_photo(
        &self,
        user_id: &str,
        entry_id: Uuid,
        photo_id: Uuid,
        apply: impl FnOnce(&mut JournalPhoto),
    ) -> AppResult<JournalPhoto> {
        let mut tx = self.db.begin().await?;
        let mut entry = lock_entry(&mut tx, user_id, entry_id).await?;
        let photo = entry
            .photo_mut(photo_id)
            .ok_or_else(|| AppError::NotFound("Photo".to_string()))?;
        apply(photo);
        let photo = photo.clone();
        save_media(&mut tx, &entry).await?;
        tx.commit().await?;
        Ok(photo)
    }

    async fn update_audio(
        &self,
        user_id: &str,
        entry_id: Uuid,
        audio_id: Uuid,
        apply: impl FnOnce(&mut JournalAudio),
    ) -> AppResult<JournalAudio> {
        let mut tx = self.db.begin().await?;
        let mut entry = lock_entry(&mut tx, user_id, entry_id).await?;
        let audio = entry
            .audio_mut(audio_id)
            .ok_or_else(|| AppError::NotFound("Audio recording".to_string()))?;
        apply(audio);
        let audio = audio.clone();
        save_media(&mut tx, &entry).await?;
        tx.commit().await?;
        Ok(audio)
    }
}

async fn lock_entry(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    entry_id: Uuid,
) -> AppResult<JournalEntry> {
    sqlx::query_as::<_, JournalRow>(&format!(
        "SELECT {JOURNAL_COLUMNS} FROM journal_entries WHERE id = $1 AND user_id = $2 FOR UPDATE"
    ))
    .bind(entry_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Journal entry".to_string()))?
    .try_into()
}

async fn save_media(
    tx: &mut Transaction<'_, Postgres>,
    entry: &JournalEntry,
) -> AppResult<JournalEntry> {
    sqlx::query_as::<_, JournalRow>(&format!(
        r#"
        UPDATE journal_entries
        SET photos = $2, audio = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {JOURNAL_COLUMNS}
        "#
    ))
    .bind(entry.id)
    .bind(to_json(&entry.photos)?)
    .bind(to_json(&entry.audio)?)
    .fetch_one(&mut **tx)
    .await?
    .try_into()
}

fn to_json<T: Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}
