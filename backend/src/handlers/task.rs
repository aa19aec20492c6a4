//! HTTP handlers for barn task endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{CompletionRecord, DateRange, Task, WeatherSnapshot};
use uuid::Uuid;

use super::optional_body;
use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::task::{TaskInput, TaskService};
use crate::AppState;

pub async fn create_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<TaskInput>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let service = TaskService::new(state.db);
    let task = service.create_task(&current_user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// List tasks, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Task>>> {
    let service = TaskService::new(state.db);
    let tasks = service.list_tasks(&current_user.0.user_id).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
) -> AppResult<Json<Task>> {
    let service = TaskService::new(state.db);
    let task = service.get_task(&current_user.0.user_id, task_id).await?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
    Json(input): Json<TaskInput>,
) -> AppResult<Json<Task>> {
    let service = TaskService::new(state.db);
    let task = service
        .update_task(&current_user.0.user_id, task_id, input)
        .await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = TaskService::new(state.db);
    service.delete_task(&current_user.0.user_id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Optional body for completion toggles; the date defaults to today (UTC)
#[derive(Debug, Default, Deserialize)]
pub struct CompletionInput {
    pub date: Option<NaiveDate>,
}

/// Day a completion toggle applies to; an empty body means `today`
fn completion_date(body: &[u8], today: NaiveDate) -> AppResult<NaiveDate> {
    let input = optional_body::<CompletionInput>(body, "date")?;
    Ok(input.and_then(|i| i.date).unwrap_or(today))
}

/// Mark a task done for a day and update its streak
pub async fn complete_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
    body: Bytes,
) -> AppResult<Json<Task>> {
    let now = Utc::now();
    let date = completion_date(&body, now.date_naive())?;

    let service = TaskService::new(state.db);
    let task = service
        .complete_task(&current_user.0.user_id, task_id, date, now)
        .await?;
    Ok(Json(task))
}

/// Undo a day's completion
pub async fn uncomplete_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
    body: Bytes,
) -> AppResult<Json<Task>> {
    let date = completion_date(&body, Utc::now().date_naive())?;

    let service = TaskService::new(state.db);
    let task = service
        .uncomplete_task(&current_user.0.user_id, task_id, date)
        .await?;
    Ok(Json(task))
}

pub async fn get_task_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
) -> AppResult<Json<Vec<CompletionRecord>>> {
    let service = TaskService::new(state.db);
    let history = service.get_history(&current_user.0.user_id, task_id).await?;
    Ok(Json(history))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub format: Option<String>, // "json" or "csv"
}

/// Export completions in a date range as JSON or CSV
pub async fn export_completions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = TaskService::new(state.db);
    let data = service
        .export_completions(&current_user.0.user_id, DateRange::new(query.start, query.end))
        .await?;

    match query.format.as_deref() {
        Some("csv") => {
            let csv = TaskService::export_to_csv(&data)?;
            let disposition = format!(
                "attachment; filename=\"task_completions_{}_{}.csv\"",
                query.start, query.end
            );
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                csv,
            )
                .into_response())
        }
        None | Some("json") => Ok(Json(data).into_response()),
        Some(other) => Err(AppError::invalid(
            "format",
            format!("Unsupported export format '{}'", other),
        )),
    }
}

#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    pub task_id: Uuid,
    pub scheduled_time: Option<NaiveTime>,
    pub reminder_time: Option<NaiveTime>,
    pub delayed_for_rain: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSnapshot>,
}

/// When today's reminder for a task should fire, given barn weather
pub async fn get_task_reminder(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
) -> AppResult<Json<ReminderResponse>> {
    let service = TaskService::new(state.db.clone());
    let task = service.get_task(&current_user.0.user_id, task_id).await?;

    let Some(schedule) = task.scheduled_time else {
        return Ok(Json(ReminderResponse {
            task_id,
            scheduled_time: None,
            reminder_time: None,
            delayed_for_rain: false,
            weather: None,
        }));
    };

    // Weather only matters for tasks that avoid rain; an outage falls back
    // to the scheduled time.
    let weather = if schedule.weather_dependent && schedule.avoid_rain {
        match state
            .weather
            .get_current_weather(state.config.barn.coordinates())
            .await
        {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(task_id = %task_id, "Reminder without weather: {}", e);
                None
            }
        }
    } else {
        None
    };

    let scheduled_time = schedule.time();
    let reminder_time = schedule.reminder_time(weather.as_ref());

    Ok(Json(ReminderResponse {
        task_id,
        scheduled_time,
        reminder_time,
        delayed_for_rain: reminder_time != scheduled_time,
        weather,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 1).unwrap()
    }

    #[test]
    fn test_empty_body_completes_today() {
        assert_eq!(completion_date(b"", today()).unwrap(), today());
        assert_eq!(completion_date(b" \n", today()).unwrap(), today());
        assert_eq!(completion_date(b"{}", today()).unwrap(), today());
    }

    #[test]
    fn test_explicit_date_is_used() {
        let date = completion_date(br#"{"date": "2024-10-30"}"#, today()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 10, 30).unwrap());
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        match completion_date(br#"{"date": "01/11/2024"}"#, today()) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "date"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(completion_date(b"not json", today()).is_err());
    }
}
