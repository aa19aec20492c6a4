//! HTTP handlers for the barn journal

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{
    JournalAudio, JournalCategory, JournalEntry, JournalEntryType, JournalPhoto,
    JournalQueryFilters, JournalStats,
};
use uuid::Uuid;

use super::optional_body;
use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::journal::{
    AnalyzePhotoInput, AudioInput, JournalEntryInput, JournalService, MediaResult,
    NewJournalEntry, PhotoInput, TranscribeAudioInput,
};
use crate::AppState;

/// Query string for listing entries. List values are comma separated,
/// e.g. `?types=photo,combined&tags=farrier`.
#[derive(Debug, Default, Deserialize)]
pub struct JournalListQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub types: Option<String>,
    pub categories: Option<String>,
    pub tags: Option<String>,
    pub related_task_id: Option<Uuid>,
    pub has_photos: Option<bool>,
    pub has_audio: Option<bool>,
    pub search: Option<String>,
}

fn split_list(value: &Option<String>) -> impl Iterator<Item = &str> {
    value
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl TryFrom<JournalListQuery> for JournalQueryFilters {
    type Error = AppError;

    fn try_from(query: JournalListQuery) -> Result<Self, Self::Error> {
        let types = split_list(&query.types)
            .map(|s| {
                JournalEntryType::from_str(s)
                    .ok_or_else(|| AppError::invalid("types", format!("Unknown entry type '{}'", s)))
            })
            .collect::<AppResult<Vec<_>>>()?;
        let categories = split_list(&query.categories)
            .map(|s| {
                JournalCategory::from_str(s).ok_or_else(|| {
                    AppError::invalid("categories", format!("Unknown category '{}'", s))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        let tags = split_list(&query.tags).map(str::to_string).collect();

        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            if start > end {
                return Err(AppError::invalid(
                    "start_date",
                    "Start date must not be after end date",
                ));
            }
        }

        Ok(JournalQueryFilters {
            start_date: query.start_date,
            end_date: query.end_date,
            types,
            categories,
            tags,
            related_task_id: query.related_task_id,
            has_photos: query.has_photos,
            has_audio: query.has_audio,
            search_text: query.search,
        })
    }
}

pub async fn create_entry(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<NewJournalEntry>,
) -> AppResult<(StatusCode, Json<JournalEntry>)> {
    let service = JournalService::new(state.db);
    let entry = service.create_entry(&current_user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// List entries, newest first
pub async fn list_entries(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<JournalListQuery>,
) -> AppResult<Json<Vec<JournalEntry>>> {
    let filters = JournalQueryFilters::try_from(query)?;
    let service = JournalService::new(state.db);
    let entries = service
        .list_entries(&current_user.0.user_id, &filters)
        .await?;
    Ok(Json(entries))
}

pub async fn get_journal_stats(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<JournalStats>> {
    let service = JournalService::new(state.db);
    let stats = service.get_stats(&current_user.0.user_id).await?;
    Ok(Json(stats))
}

pub async fn get_entry(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<JournalEntry>> {
    let service = JournalService::new(state.db);
    let entry = service.get_entry(&current_user.0.user_id, entry_id).await?;
    Ok(Json(entry))
}

pub async fn update_entry(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(entry_id): Path<Uuid>,
    Json(input): Json<JournalEntryInput>,
) -> AppResult<Json<JournalEntry>> {
    let service = JournalService::new(state.db);
    let entry = service
        .update_entry(&current_user.0.user_id, entry_id, input)
        .await?;
    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(entry_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = JournalService::new(state.db);
    service.delete_entry(&current_user.0.user_id, entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Attach an already uploaded photo
pub async fn add_photo(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(entry_id): Path<Uuid>,
    Json(input): Json<PhotoInput>,
) -> AppResult<(StatusCode, Json<JournalEntry>)> {
    let service = JournalService::new(state.db);
    let entry = service
        .add_photo(&current_user.0.user_id, entry_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Attach an already uploaded voice memo
pub async fn add_audio(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(entry_id): Path<Uuid>,
    Json(input): Json<AudioInput>,
) -> AppResult<(StatusCode, Json<JournalEntry>)> {
    let service = JournalService::new(state.db);
    let entry = service
        .add_audio(&current_user.0.user_id, entry_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn analyze_photo(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((entry_id, photo_id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> AppResult<Json<MediaResult<JournalPhoto>>> {
    let analyzer = state
        .photo_analyzer
        .as_ref()
        .ok_or_else(|| AppError::Configuration("Photo analysis is not configured".to_string()))?;
    let input = optional_body::<AnalyzePhotoInput>(&body, "analysis_type")?.unwrap_or_default();

    let service = JournalService::new(state.db.clone());
    let result = service
        .analyze_photo(
            analyzer,
            &current_user.0.user_id,
            entry_id,
            photo_id,
            input.analysis_type,
        )
        .await?;
    Ok(Json(result))
}

pub async fn transcribe_audio(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((entry_id, audio_id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> AppResult<Json<MediaResult<JournalAudio>>> {
    let whisper = state
        .whisper
        .as_ref()
        .ok_or_else(|| AppError::Configuration("Transcription is not configured".to_string()))?;
    let input = optional_body(&body, "language")?.unwrap_or(TranscribeAudioInput {
        language: None,
        analyze: true,
    });

    let service = JournalService::new(state.db.clone());
    let result = service
        .transcribe_audio(
            whisper,
            state.gemini.as_ref(),
            &current_user.0.user_id,
            entry_id,
            audio_id,
            input,
        )
        .await?;
    Ok(Json(result))
}
