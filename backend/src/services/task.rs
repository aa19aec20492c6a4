//! Barn task service: CRUD, completion toggling and history export

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    CompletionRecord, DateRange, ScheduledTime, Task, TaskCategory, TaskFrequency, TaskPriority,
    TaskStreakState,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Task service for managing barn chores
#[derive(Clone)]
pub struct TaskService {
    db: PgPool,
}

/// Database row for a task
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    user_id: String,
    title: String,
    description: Option<String>,
    category: String,
    frequency: String,
    priority: String,
    scheduled_time: Option<serde_json::Value>,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    completion_history: serde_json::Value,
    current_streak: i32,
    best_streak: i32,
    last_completed_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| AppError::Internal(format!("Corrupt task {}: {}", what, row.id));

        let category = TaskCategory::from_str(&row.category).ok_or_else(|| corrupt("category"))?;
        let frequency =
            TaskFrequency::from_str(&row.frequency).ok_or_else(|| corrupt("frequency"))?;
        let priority = TaskPriority::from_str(&row.priority).ok_or_else(|| corrupt("priority"))?;
        let scheduled_time = row
            .scheduled_time
            .map(serde_json::from_value::<ScheduledTime>)
            .transpose()
            .map_err(|_| corrupt("scheduled time"))?;
        let completion_history: Vec<CompletionRecord> =
            serde_json::from_value(row.completion_history).map_err(|_| corrupt("history"))?;

        Ok(Task {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            category,
            frequency,
            priority,
            scheduled_time,
            streak: TaskStreakState {
                completed: row.completed,
                completed_at: row.completed_at,
                completion_history,
                current_streak: row.current_streak.max(0) as u32,
                best_streak: row.best_streak.max(0) as u32,
                last_completed_date: row.last_completed_date,
            },
            created_at: row.created_at,
        })
    }
}

const TASK_COLUMNS: &str = "id, user_id, title, description, category, frequency, priority, \
     scheduled_time, completed, completed_at, completion_history, current_streak, best_streak, \
     last_completed_date, created_at";

/// Input for creating or replacing a task
#[derive(Debug, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 200, message = "Task title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub category: TaskCategory,
    pub frequency: TaskFrequency,
    #[serde(default)]
    pub priority: TaskPriority,
    pub scheduled_time: Option<ScheduledTime>,
}

impl TaskInput {
    fn check(&self) -> AppResult<()> {
        self.validate()?;
        shared::validate_task_title(&self.title).map_err(|m| AppError::invalid("title", m))?;
        if let Some(t) = &self.scheduled_time {
            shared::validate_scheduled_time(t.hour, t.minute)
                .map_err(|m| AppError::invalid("scheduled_time", m))?;
        }
        Ok(())
    }
}

/// One completion, flattened for export
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CompletionExportRow {
    pub task_id: Uuid,
    pub title: String,
    pub category: String,
    pub date: NaiveDate,
    pub completed_at: DateTime<Utc>,
}

impl TaskService {
    /// Create a new TaskService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a task with an empty streak
    pub async fn create_task(&self, user_id: &str, input: TaskInput) -> AppResult<Task> {
        input.check()?;
        let scheduled = to_json(&input.scheduled_time)?;

        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (user_id, title, description, category, frequency, priority, scheduled_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.category.as_str())
        .bind(input.frequency.as_str())
        .bind(input.priority.as_str())
        .bind(scheduled)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(task_id = %row.id, "Task created");
        row.try_into()
    }

    /// Get a task by ID
    pub async fn get_task(&self, user_id: &str, task_id: Uuid) -> AppResult<Task> {
        sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2"
        ))
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Task".to_string()))?
        .try_into()
    }

    /// List the user's tasks, newest first
    pub async fn list_tasks(&self, user_id: &str) -> AppResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    /// Replace a task's details; the streak state is left alone
    pub async fn update_task(
        &self,
        user_id: &str,
        task_id: Uuid,
        input: TaskInput,
    ) -> AppResult<Task> {
        input.check()?;
        let scheduled = to_json(&input.scheduled_time)?;

        sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks
            SET title = $3, description = $4, category = $5, frequency = $6, priority = $7,
                scheduled_time = $8, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task_id)
        .bind(user_id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.category.as_str())
        .bind(input.frequency.as_str())
        .bind(input.priority.as_str())
        .bind(scheduled)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Task".to_string()))?
        .try_into()
    }

    pub async fn delete_task(&self, user_id: &str, task_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Task".to_string()));
        }
        Ok(())
    }

    /// Record a completion on `date`, updating the streak
    pub async fn complete_task(
        &self,
        user_id: &str,
        task_id: Uuid,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> AppResult<Task> {
        let mut tx = self.db.begin().await?;
        let task = lock_task(&mut tx, user_id, task_id).await?;

        if !task.streak.is_history_well_formed() {
            tracing::warn!(
                task_id = %task_id,
                "Completion history is out of order; streak follows last_completed_date"
            );
        }

        let streak = task.streak.record_completion(date, at);
        let task = save_streak(&mut tx, task_id, &streak).await?;
        tx.commit().await?;

        tracing::info!(
            task_id = %task_id,
            current_streak = streak.current_streak,
            best_streak = streak.best_streak,
            "Task completed"
        );
        Ok(task)
    }

    /// Undo the latest completion recorded on `date`
    pub async fn uncomplete_task(
        &self,
        user_id: &str,
        task_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Task> {
        let mut tx = self.db.begin().await?;
        let task = lock_task(&mut tx, user_id, task_id).await?;

        let streak = task.streak.revert_completion(date);
        let task = save_streak(&mut tx, task_id, &streak).await?;
        tx.commit().await?;

        tracing::info!(
            task_id = %task_id,
            current_streak = streak.current_streak,
            "Task completion reverted"
        );
        Ok(task)
    }

    /// Completion history of one task
    pub async fn get_history(
        &self,
        user_id: &str,
        task_id: Uuid,
    ) -> AppResult<Vec<CompletionRecord>> {
        let task = self.get_task(user_id, task_id).await?;
        Ok(task.streak.completion_history)
    }

    /// Every completion in the date range across the user's tasks, oldest first
    pub async fn export_completions(
        &self,
        user_id: &str,
        range: DateRange,
    ) -> AppResult<Vec<CompletionExportRow>> {
        shared::validate_date_range(&range).map_err(|m| AppError::invalid("start", m))?;

        let rows = sqlx::query_as::<_, CompletionExportRow>(
            r#"
            SELECT t.id AS task_id, t.title, t.category,
                   (rec->>'date')::date AS date,
                   (rec->>'timestamp')::timestamptz AS completed_at
            FROM tasks t
            CROSS JOIN LATERAL jsonb_array_elements(t.completion_history) AS rec
            WHERE t.user_id = $1
              AND (rec->>'date')::date BETWEEN $2 AND $3
            ORDER BY completed_at, t.title
            "#,
        )
        .bind(user_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Export data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

/// Load a task row and hold its lock until the transaction ends
async fn lock_task(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &str,
    task_id: Uuid,
) -> AppResult<Task> {
    sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2 FOR UPDATE"
    ))
    .bind(task_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Task".to_string()))?
    .try_into()
}

async fn save_streak(
    tx: &mut Transaction<'_, Postgres>,
    task_id: Uuid,
    streak: &TaskStreakState,
) -> AppResult<Task> {
    let history = serde_json::to_value(&streak.completion_history)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    sqlx::query_as::<_, TaskRow>(&format!(
        r#"
        UPDATE tasks
        SET completed = $2, completed_at = $3, completion_history = $4,
            current_streak = $5, best_streak = $6, last_completed_date = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING {TASK_COLUMNS}
        "#
    ))
    .bind(task_id)
    .bind(streak.completed)
    .bind(streak.completed_at)
    .bind(history)
    .bind(streak.current_streak as i32)
    .bind(streak.best_streak as i32)
    .bind(streak.last_completed_date)
    .fetch_one(&mut **tx)
    .await?
    .try_into()
}

fn to_json<T: Serialize>(value: &Option<T>) -> AppResult<Option<serde_json::Value>> {
    value
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| AppError::Internal(e.to_string()))
}
