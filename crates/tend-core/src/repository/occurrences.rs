use crate::error::CoreError;
use crate::models::{CalendarDay, DueWindows, Occurrence, RecurrenceRule, ScheduledTask};
use crate::repository::{short_id_pattern, OccurrenceRepository, RuleRepository, SqliteRepository};
use crate::windows::{self, DayBounds};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

/// Occurrences joined with their rule and item. Callers append the WHERE clause.
const SCHEDULED_TASK_SELECT: &str = r#"SELECT
        o.id, o.rule_id, r.item_id, r.kind, r.description, r.interval, r.unit,
        i.kind AS item_kind, i.nickname AS item_nickname, i.species AS item_species,
        o.due_date, o.is_completed, o.completed_at
    FROM occurrences o
    INNER JOIN recurrence_rules r ON r.id = o.rule_id
    INNER JOIN owned_items i ON i.id = r.item_id"#;

const OWNED_OCCURRENCE_SELECT: &str = r#"SELECT o.* FROM occurrences o
    INNER JOIN recurrence_rules r ON r.id = o.rule_id
    INNER JOIN owned_items i ON i.id = r.item_id"#;

#[async_trait]
impl OccurrenceRepository for SqliteRepository {
    async fn find_occurrence(&self, id: Uuid, user_id: &str) -> Result<Option<Occurrence>, CoreError> {
        let occurrence = sqlx::query_as(&format!(
            "{} WHERE o.id = $1 AND i.user_id = $2",
            OWNED_OCCURRENCE_SELECT
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(occurrence)
    }

    async fn find_occurrences_for_rule(&self, rule_id: Uuid, user_id: &str) -> Result<Vec<Occurrence>, CoreError> {
        if self.find_rule(rule_id, user_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("Task {} not found", rule_id)));
        }

        let mut occurrences: Vec<Occurrence> =
            sqlx::query_as("SELECT * FROM occurrences WHERE rule_id = $1")
                .bind(rule_id)
                .fetch_all(self.pool())
                .await?;
        occurrences.sort_by_key(|o| o.due_date);
        Ok(occurrences)
    }

    async fn find_occurrences_by_short_id_prefix(&self, short_id: &str, user_id: &str) -> Result<Vec<Occurrence>, CoreError> {
        let pattern = short_id_pattern(short_id)?;
        let occurrences = sqlx::query_as(&format!(
            "{} WHERE i.user_id = $1 AND lower(hex(o.id)) LIKE $2 ORDER BY o.id",
            OWNED_OCCURRENCE_SELECT
        ))
        .bind(user_id)
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        Ok(occurrences)
    }

    async fn complete_occurrence(&self, id: Uuid, user_id: &str, now: DateTime<Utc>) -> Result<Occurrence, CoreError> {
        let mut tx = self.pool().begin().await?;

        // Claim the occurrence first. The guard on is_completed makes a second
        // completer see zero rows instead of closing it twice.
        let closed: Option<Occurrence> = sqlx::query_as(
            r#"UPDATE occurrences SET is_completed = 1, completed_at = $1
            WHERE id = $2 AND is_completed = 0
              AND rule_id IN (
                SELECT r.id FROM recurrence_rules r
                INNER JOIN owned_items i ON i.id = r.item_id
                WHERE i.user_id = $3
              )
            RETURNING *"#,
        )
        .bind(now)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let closed = match closed {
            Some(occurrence) => occurrence,
            None => {
                let existing = Self::find_owned_occurrence_in_transaction(&mut tx, id, user_id).await?;
                return Err(match existing {
                    Some(_) => CoreError::InvalidState(format!("Task {} is already completed", id)),
                    None => CoreError::NotFound(format!("Task {} not found", id)),
                });
            }
        };

        let rule = Self::record_completion_in_transaction(&mut tx, closed.rule_id, now).await?;

        let successor = Occurrence {
            id: Uuid::now_v7(),
            rule_id: rule.id,
            due_date: rule.cadence().next_due_at(rule.last_completed_at, now),
            is_completed: false,
            completed_at: None,
        };
        Self::insert_occurrence_in_transaction(&mut tx, &successor).await?;

        tx.commit().await?;

        tracing::info!(
            occurrence_id = %closed.id,
            rule_id = %rule.id,
            next_due = %successor.due_date,
            "occurrence completed"
        );
        Ok(successor)
    }

    async fn list_due(&self, user_id: &str, now: DateTime<Utc>) -> Result<DueWindows, CoreError> {
        let open = self.open_tasks(user_id).await?;
        let due = windows::classify(
            open,
            now,
            &self.config.timezone,
            self.config.upcoming_horizon_days,
        );
        tracing::debug!(
            user_id,
            overdue = due.overdue.len(),
            due_today = due.due_today.len(),
            upcoming = due.upcoming.len(),
            "due windows classified"
        );
        Ok(due)
    }

    async fn list_calendar(&self, user_id: &str, now: DateTime<Utc>, days: i64) -> Result<Vec<CalendarDay>, CoreError> {
        windows::validate_days(days)?;

        let open = self.open_tasks(user_id).await?;
        let tz = &self.config.timezone;
        let due = windows::classify(open, now, tz, Some(days));
        Ok(windows::calendar(due.upcoming, now, tz, days))
    }

    async fn list_completed(&self, user_id: &str, on_date: Option<NaiveDate>) -> Result<Vec<ScheduledTask>, CoreError> {
        let completed: Vec<ScheduledTask> = sqlx::query_as(&format!(
            "{} WHERE i.user_id = $1 AND o.is_completed = 1",
            SCHEDULED_TASK_SELECT
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        // Stored timestamps are text, so day filtering happens on parsed values
        let day = on_date.map(|date| DayBounds::for_date(date, &self.config.timezone));
        let mut completed: Vec<ScheduledTask> = completed
            .into_iter()
            .filter(|task| match (&day, task.completed_at) {
                (Some(day), Some(at)) => day.contains(at),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect();

        completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        tracing::debug!(user_id, on_date = ?on_date, count = completed.len(), "completed tasks listed");
        Ok(completed)
    }
}

impl SqliteRepository {
    async fn open_tasks(&self, user_id: &str) -> Result<Vec<ScheduledTask>, CoreError> {
        let open = sqlx::query_as(&format!(
            "{} WHERE i.user_id = $1 AND o.is_completed = 0",
            SCHEDULED_TASK_SELECT
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(open)
    }

    pub(crate) async fn insert_occurrence_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        occurrence: &Occurrence,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO occurrences (id, rule_id, due_date, is_completed, completed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(occurrence.id)
        .bind(occurrence.rule_id)
        .bind(occurrence.due_date)
        .bind(occurrence.is_completed)
        .bind(occurrence.completed_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn find_owned_occurrence_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<Occurrence>, CoreError> {
        let occurrence = sqlx::query_as(&format!(
            "{} WHERE o.id = $1 AND i.user_id = $2",
            OWNED_OCCURRENCE_SELECT
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(occurrence)
    }

    async fn record_completion_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        rule_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<RecurrenceRule, CoreError> {
        let rule = sqlx::query_as(
            r#"UPDATE recurrence_rules SET last_completed_at = $1, updated_at = $1
            WHERE id = $2
            RETURNING *"#,
        )
        .bind(completed_at)
        .bind(rule_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(rule)
    }
}
