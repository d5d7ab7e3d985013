use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    CalendarDay, DueWindows, ItemDetail, ItemUpdate, NewItemData, NewRuleData, NewSiteData,
    Occurrence, OwnedItem, RecurrenceRule, RuleUpdate, ScheduledTask, SchedulerConfig, Site,
    SiteUpdate, Unit,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

// Re-export domain modules
pub mod items;
pub mod occurrences;
pub mod rules;
pub mod sites;

// Traits are defined in this module and implemented in respective domain modules.
// Every operation takes the requesting user's id explicitly; records owned by
// another user are reported as `CoreError::NotFound`.

/// Domain-specific trait for owned item operations
#[async_trait]
pub trait ItemRepository {
    async fn add_item(&self, user_id: &str, data: NewItemData) -> Result<OwnedItem, CoreError>;
    async fn find_item(&self, id: Uuid, user_id: &str) -> Result<Option<OwnedItem>, CoreError>;
    async fn find_items(&self, user_id: &str) -> Result<Vec<OwnedItem>, CoreError>;
    async fn find_items_by_short_id_prefix(&self, short_id: &str, user_id: &str) -> Result<Vec<OwnedItem>, CoreError>;
    async fn item_detail(&self, id: Uuid, user_id: &str) -> Result<ItemDetail, CoreError>;
    async fn update_item(&self, id: Uuid, user_id: &str, data: ItemUpdate) -> Result<OwnedItem, CoreError>;
    async fn delete_item(&self, id: Uuid, user_id: &str) -> Result<(), CoreError>;
}

/// Domain-specific trait for site operations
#[async_trait]
pub trait SiteRepository {
    async fn add_site(&self, user_id: &str, data: NewSiteData) -> Result<Site, CoreError>;
    async fn find_site(&self, id: Uuid, user_id: &str) -> Result<Option<Site>, CoreError>;
    async fn find_sites(&self, user_id: &str) -> Result<Vec<Site>, CoreError>;
    async fn find_sites_by_short_id_prefix(&self, short_id: &str, user_id: &str) -> Result<Vec<Site>, CoreError>;
    async fn update_site(&self, id: Uuid, user_id: &str, data: SiteUpdate) -> Result<Site, CoreError>;
    /// Deletes the site; plants placed there stay, without a site.
    async fn delete_site(&self, id: Uuid, user_id: &str) -> Result<(), CoreError>;
}

/// Domain-specific trait for recurrence rule operations
#[async_trait]
pub trait RuleRepository {
    async fn create_rule(&self, user_id: &str, data: NewRuleData) -> Result<RecurrenceRule, CoreError>;
    async fn find_rule(&self, id: Uuid, user_id: &str) -> Result<Option<RecurrenceRule>, CoreError>;
    async fn find_rules(&self, user_id: &str) -> Result<Vec<RecurrenceRule>, CoreError>;
    async fn find_rules_for_item(&self, item_id: Uuid, user_id: &str) -> Result<Vec<RecurrenceRule>, CoreError>;
    async fn find_rules_by_short_id_prefix(&self, short_id: &str, user_id: &str) -> Result<Vec<RecurrenceRule>, CoreError>;
    async fn update_frequency(&self, id: Uuid, user_id: &str, interval: i64, unit: Unit) -> Result<RecurrenceRule, CoreError>;
    async fn update_rule(&self, id: Uuid, user_id: &str, data: RuleUpdate) -> Result<RecurrenceRule, CoreError>;
    async fn delete_rule(&self, id: Uuid, user_id: &str) -> Result<(), CoreError>;
}

/// Domain-specific trait for occurrence operations
#[async_trait]
pub trait OccurrenceRepository {
    async fn find_occurrence(&self, id: Uuid, user_id: &str) -> Result<Option<Occurrence>, CoreError>;
    async fn find_occurrences_for_rule(&self, rule_id: Uuid, user_id: &str) -> Result<Vec<Occurrence>, CoreError>;
    async fn find_occurrences_by_short_id_prefix(&self, short_id: &str, user_id: &str) -> Result<Vec<Occurrence>, CoreError>;
    /// Closes an open occurrence and returns its freshly created successor.
    async fn complete_occurrence(&self, id: Uuid, user_id: &str, now: DateTime<Utc>) -> Result<Occurrence, CoreError>;
    async fn list_due(&self, user_id: &str, now: DateTime<Utc>) -> Result<DueWindows, CoreError>;
    async fn list_calendar(&self, user_id: &str, now: DateTime<Utc>, days: i64) -> Result<Vec<CalendarDay>, CoreError>;
    async fn list_completed(&self, user_id: &str, on_date: Option<NaiveDate>) -> Result<Vec<ScheduledTask>, CoreError>;
}

/// Main repository trait that composes all domain traits
pub trait Repository:
    ItemRepository + SiteRepository + RuleRepository + OccurrenceRepository + Send + Sync
{
    /// Scheduler settings the repository was built with
    fn config(&self) -> &SchedulerConfig;
}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
    config: SchedulerConfig,
}

impl SqliteRepository {
    pub fn new(pool: DbPool, config: SchedulerConfig) -> Self {
        Self { pool, config }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl Repository for SqliteRepository {
    fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

/// Turns a user-supplied short id into a `LIKE` pattern over `lower(hex(id))`.
pub(crate) fn short_id_pattern(short_id: &str) -> Result<String, CoreError> {
    let digits: String = short_id
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if digits.len() < 2 {
        return Err(CoreError::Validation(
            "Short ID must be at least 2 characters long.".to_string(),
        ));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::Validation(format!(
            "'{}' is not a valid ID prefix",
            short_id
        )));
    }

    let mut pattern = String::with_capacity(digits.len() + 1);
    pattern.push_str(&digits);
    pattern.push('%');
    Ok(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_pattern() {
        assert_eq!(short_id_pattern("01AB").unwrap(), "01ab%");
        assert_eq!(short_id_pattern("0190-ab").unwrap(), "0190ab%");
        assert!(matches!(short_id_pattern("a"), Err(CoreError::Validation(_))));
        assert!(matches!(short_id_pattern("zz"), Err(CoreError::Validation(_))));
    }
}
