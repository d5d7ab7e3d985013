use crate::error::CoreError;
use crate::models::{
    FrequencyChangePolicy, NewRuleData, Occurrence, RecurrenceRule, RuleUpdate, Unit,
};
use crate::recurrence::{validate_interval, Cadence};
use crate::repository::{short_id_pattern, ItemRepository, RuleRepository, SqliteRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, Transaction};
use uuid::Uuid;

const OWNED_RULE_SELECT: &str = r#"SELECT r.* FROM recurrence_rules r
    INNER JOIN owned_items i ON i.id = r.item_id"#;

/// Matches rule `$1` only when its item belongs to user `$2`.
const OWNED_RULE_ID: &str = r#"SELECT r.id FROM recurrence_rules r
    INNER JOIN owned_items i ON i.id = r.item_id
    WHERE r.id = $1 AND i.user_id = $2"#;

#[async_trait]
impl RuleRepository for SqliteRepository {
    async fn create_rule(&self, user_id: &str, data: NewRuleData) -> Result<RecurrenceRule, CoreError> {
        // Validate before touching the store so a bad interval persists nothing
        let cadence = Cadence::new(data.interval, data.unit)?;

        let now = Utc::now();
        let rule = RecurrenceRule {
            id: Uuid::now_v7(),
            item_id: data.item_id,
            kind: data.kind,
            description: data.description.filter(|d| !d.trim().is_empty()),
            interval: cadence.interval(),
            unit: cadence.unit(),
            last_completed_at: data.last_completed_at,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool().begin().await?;

        // The insert is the first statement so the transaction takes the write
        // lock up front. It only matches when the item belongs to the user.
        let inserted = sqlx::query(
            r#"INSERT INTO recurrence_rules (id, item_id, kind, description, interval, unit, last_completed_at, created_at, updated_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
            WHERE EXISTS (SELECT 1 FROM owned_items WHERE id = $2 AND user_id = $10)
            "#,
        )
        .bind(rule.id)
        .bind(rule.item_id)
        .bind(rule.kind)
        .bind(&rule.description)
        .bind(rule.interval)
        .bind(rule.unit)
        .bind(rule.last_completed_at)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Item {} not found", data.item_id)));
        }

        // The first occurrence is due right away unless a prior completion was supplied
        let first = Occurrence {
            id: Uuid::now_v7(),
            rule_id: rule.id,
            due_date: cadence.next_due_at(rule.last_completed_at, now),
            is_completed: false,
            completed_at: None,
        };
        Self::insert_occurrence_in_transaction(&mut tx, &first).await?;

        tx.commit().await?;

        tracing::info!(
            rule_id = %rule.id,
            item_id = %rule.item_id,
            kind = %rule.kind,
            cadence = %cadence,
            first_due = %first.due_date,
            "recurrence rule created"
        );
        Ok(rule)
    }

    async fn find_rule(&self, id: Uuid, user_id: &str) -> Result<Option<RecurrenceRule>, CoreError> {
        let rule = sqlx::query_as(&format!("{} WHERE r.id = $1 AND i.user_id = $2", OWNED_RULE_SELECT))
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(rule)
    }

    async fn find_rules(&self, user_id: &str) -> Result<Vec<RecurrenceRule>, CoreError> {
        let rules = sqlx::query_as(&format!(
            "{} WHERE i.user_id = $1 ORDER BY r.item_id, r.id",
            OWNED_RULE_SELECT
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rules)
    }

    async fn find_rules_for_item(&self, item_id: Uuid, user_id: &str) -> Result<Vec<RecurrenceRule>, CoreError> {
        if self.find_item(item_id, user_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("Item {} not found", item_id)));
        }

        let rules = sqlx::query_as("SELECT * FROM recurrence_rules WHERE item_id = $1 ORDER BY id")
            .bind(item_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rules)
    }

    async fn find_rules_by_short_id_prefix(&self, short_id: &str, user_id: &str) -> Result<Vec<RecurrenceRule>, CoreError> {
        let pattern = short_id_pattern(short_id)?;
        let rules = sqlx::query_as(&format!(
            "{} WHERE i.user_id = $1 AND lower(hex(r.id)) LIKE $2 ORDER BY r.id",
            OWNED_RULE_SELECT
        ))
        .bind(user_id)
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        Ok(rules)
    }

    async fn update_frequency(&self, id: Uuid, user_id: &str, interval: i64, unit: Unit) -> Result<RecurrenceRule, CoreError> {
        let data = RuleUpdate {
            interval: Some(interval),
            unit: Some(unit),
            ..Default::default()
        };
        self.update_rule(id, user_id, data).await
    }

    async fn update_rule(&self, id: Uuid, user_id: &str, data: RuleUpdate) -> Result<RecurrenceRule, CoreError> {
        if let Some(interval) = data.interval {
            validate_interval(interval)?;
        }

        if data.is_empty() {
            return self
                .find_rule(id, user_id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Task {} not found", id)));
        }

        let mut tx = self.pool().begin().await?;

        let now = Utc::now();
        let updated = Self::update_rule_fields(&mut tx, id, user_id, &data, now)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Task {} not found", id)))?;

        let rederived = match self.config.frequency_change {
            FrequencyChangePolicy::RederiveUpcoming if data.touches_schedule() => {
                Self::rederive_upcoming_in_transaction(&mut tx, &updated, now).await?
            }
            _ => 0,
        };

        tx.commit().await?;

        tracing::info!(
            rule_id = %id,
            cadence = %updated.cadence(),
            rederived,
            "recurrence rule updated"
        );
        Ok(updated)
    }

    async fn delete_rule(&self, id: Uuid, user_id: &str) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        let occurrences = sqlx::query(&format!(
            "DELETE FROM occurrences WHERE rule_id IN ({})",
            OWNED_RULE_ID
        ))
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let rules = sqlx::query(&format!("DELETE FROM recurrence_rules WHERE id IN ({})", OWNED_RULE_ID))
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if rules.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Task {} not found", id)));
        }

        tx.commit().await?;

        tracing::info!(
            rule_id = %id,
            occurrences = occurrences.rows_affected(),
            "recurrence rule deleted"
        );
        Ok(())
    }
}

impl SqliteRepository {
    /// Apply the enumerated fields of a `RuleUpdate` and return the updated row,
    /// or `None` when the rule does not exist or belongs to someone else
    async fn update_rule_fields<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        id: Uuid,
        user_id: &str,
        data: &RuleUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<RecurrenceRule>, CoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE recurrence_rules SET updated_at = ");
        qb.push_bind(now);

        if let Some(interval) = data.interval {
            qb.push(", interval = ");
            qb.push_bind(interval);
        }

        if let Some(unit) = data.unit {
            qb.push(", unit = ");
            qb.push_bind(unit);
        }

        if let Some(description) = &data.description {
            qb.push(", description = ");
            qb.push_bind(description.clone().filter(|d| !d.trim().is_empty()));
        }

        if let Some(last_completed_at) = data.last_completed_at {
            qb.push(", last_completed_at = ");
            qb.push_bind(last_completed_at);
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" AND item_id IN (SELECT id FROM owned_items WHERE user_id = ");
        qb.push_bind(user_id);
        qb.push(") RETURNING *");

        let rule = qb.build_query_as().fetch_optional(&mut **tx).await?;
        Ok(rule)
    }

    /// Re-derive the due date of open occurrences that are not yet due.
    ///
    /// Rules that have never been completed keep their due dates. Returns the
    /// number of occurrences moved.
    async fn rederive_upcoming_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        rule: &RecurrenceRule,
        now: DateTime<Utc>,
    ) -> Result<u64, CoreError> {
        if rule.last_completed_at.is_none() {
            return Ok(0);
        }
        let due_date = rule.next_due_date();

        let open: Vec<Occurrence> =
            sqlx::query_as("SELECT * FROM occurrences WHERE rule_id = $1 AND is_completed = 0")
                .bind(rule.id)
                .fetch_all(&mut **tx)
                .await?;

        let mut moved = 0;
        for occurrence in open.iter().filter(|o| o.due_date > now) {
            sqlx::query("UPDATE occurrences SET due_date = $1 WHERE id = $2")
                .bind(due_date)
                .bind(occurrence.id)
                .execute(&mut **tx)
                .await?;
            moved += 1;
        }
        Ok(moved)
    }
}
