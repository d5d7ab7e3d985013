use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::recurrence::Cadence;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Plant,
    Pet,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid item kind: {0} (expected plant or pet)")]
pub struct ParseItemKindError(String);

impl FromStr for ItemKind {
    type Err = ParseItemKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plant" => Ok(ItemKind::Plant),
            "pet" => Ok(ItemKind::Pet),
            _ => Err(ParseItemKindError(s.to_string())),
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Plant => write!(f, "plant"),
            ItemKind::Pet => write!(f, "pet"),
        }
    }
}

/// The kind of care a rule schedules. Opaque to the scheduler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CareKind {
    Misting,
    Watering,
    Pruning,
    Fertilizing,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task kind: {0} (expected misting, watering, pruning or fertilizing)")]
pub struct ParseCareKindError(String);

impl FromStr for CareKind {
    type Err = ParseCareKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "misting" => Ok(CareKind::Misting),
            "watering" => Ok(CareKind::Watering),
            "pruning" => Ok(CareKind::Pruning),
            "fertilizing" => Ok(CareKind::Fertilizing),
            _ => Err(ParseCareKindError(s.to_string())),
        }
    }
}

impl std::fmt::Display for CareKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CareKind::Misting => write!(f, "misting"),
            CareKind::Watering => write!(f, "watering"),
            CareKind::Pruning => write!(f, "pruning"),
            CareKind::Fertilizing => write!(f, "fertilizing"),
        }
    }
}

/// Unit of a rule's cadence. A month is always 28 days.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Day,
    Week,
    Month,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid unit: {0} (expected day, week or month)")]
pub struct ParseUnitError(String);

impl FromStr for Unit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "days" => Ok(Unit::Day),
            "week" | "weeks" => Ok(Unit::Week),
            "month" | "months" => Ok(Unit::Month),
            _ => Err(ParseUnitError(s.to_string())),
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unit::Day => write!(f, "day"),
            Unit::Week => write!(f, "week"),
            Unit::Month => write!(f, "month"),
        }
    }
}

/// How much light a site gets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LightLevel {
    Low,
    Medium,
    High,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid light level: {0} (expected low, medium or high)")]
pub struct ParseLightLevelError(String);

impl FromStr for LightLevel {
    type Err = ParseLightLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(LightLevel::Low),
            "medium" => Ok(LightLevel::Medium),
            "high" => Ok(LightLevel::High),
            _ => Err(ParseLightLevelError(s.to_string())),
        }
    }
}

impl std::fmt::Display for LightLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LightLevel::Low => write!(f, "low"),
            LightLevel::Medium => write!(f, "medium"),
            LightLevel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SiteLocation {
    Indoor,
    Outdoor,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid location: {0} (expected indoor or outdoor)")]
pub struct ParseSiteLocationError(String);

impl FromStr for SiteLocation {
    type Err = ParseSiteLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "indoor" => Ok(SiteLocation::Indoor),
            "outdoor" => Ok(SiteLocation::Outdoor),
            _ => Err(ParseSiteLocationError(s.to_string())),
        }
    }
}

impl std::fmt::Display for SiteLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiteLocation::Indoor => write!(f, "indoor"),
            SiteLocation::Outdoor => write!(f, "outdoor"),
        }
    }
}

/// A place where a user keeps plants.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Site {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub light: LightLevel,
    pub location: SiteLocation,
    pub created_at: DateTime<Utc>,
}

/// A plant or pet owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OwnedItem {
    pub id: Uuid,
    pub user_id: String,
    pub kind: ItemKind,
    pub nickname: Option<String>,
    /// Free-text species or breed label
    pub species: Option<String>,
    pub added_at: DateTime<Utc>,
    /// Plants only
    pub site_id: Option<Uuid>,
    /// Pets only; never after the day it was recorded
    pub birth_date: Option<NaiveDate>,
}

impl OwnedItem {
    /// Nickname, falling back to the species label and then the kind.
    pub fn label(&self) -> String {
        item_label(self.nickname.as_deref(), self.species.as_deref(), self.kind)
    }

    /// Age in whole years on `today`, if a birth date is known.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let born = self.birth_date?;
        let mut age = today.year() - born.year();
        if (today.month(), today.day()) < (born.month(), born.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }
}

fn item_label(nickname: Option<&str>, species: Option<&str>, kind: ItemKind) -> String {
    nickname
        .or(species)
        .map(str::to_string)
        .unwrap_or_else(|| format!("unnamed {}", kind))
}

/// A recurring care task attached to an owned item.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecurrenceRule {
    pub id: Uuid,
    pub item_id: Uuid,
    pub kind: CareKind,
    pub description: Option<String>,
    /// Always >= 1 once persisted
    pub interval: i64,
    pub unit: Unit,
    /// Null until the first occurrence under this rule is completed
    pub last_completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurrenceRule {
    pub fn cadence(&self) -> Cadence {
        Cadence::from_stored(self.interval, self.unit)
    }

    /// Due date of the occurrence that follows this rule's last completion.
    pub fn next_due_date(&self) -> DateTime<Utc> {
        self.cadence().next_due(self.last_completed_at)
    }
}

/// One concrete due-date instance of a rule.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Occurrence {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Occurrence {
    pub fn is_open(&self) -> bool {
        !self.is_completed
    }
}

/// An occurrence joined with its rule and owned item, as listed to users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub item_id: Uuid,
    pub kind: CareKind,
    pub description: Option<String>,
    pub interval: i64,
    pub unit: Unit,
    pub item_kind: ItemKind,
    pub item_nickname: Option<String>,
    pub item_species: Option<String>,
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScheduledTask {
    pub fn cadence(&self) -> Cadence {
        Cadence::from_stored(self.interval, self.unit)
    }

    pub fn item_label(&self) -> String {
        item_label(
            self.item_nickname.as_deref(),
            self.item_species.as_deref(),
            self.item_kind,
        )
    }
}

/// Open occurrences split by due window. Each bucket is sorted by due date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DueWindows<T = ScheduledTask> {
    pub overdue: Vec<T>,
    pub due_today: Vec<T>,
    pub upcoming: Vec<T>,
}

impl<T> Default for DueWindows<T> {
    fn default() -> Self {
        Self {
            overdue: Vec::new(),
            due_today: Vec::new(),
            upcoming: Vec::new(),
        }
    }
}

impl<T> DueWindows<T> {
    pub fn len(&self) -> usize {
        self.overdue.len() + self.due_today.len() + self.upcoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One local calendar date and the open occurrences due on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarDay<T = ScheduledTask> {
    pub date: NaiveDate,
    pub tasks: Vec<T>,
}

/// An owned item with everything scheduled for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDetail {
    pub item: OwnedItem,
    pub site: Option<Site>,
    pub rules: Vec<RecurrenceRule>,
    pub occurrences: Vec<Occurrence>,
}

#[derive(Debug, Clone)]
pub struct NewItemData {
    pub kind: ItemKind,
    pub nickname: Option<String>,
    pub species: Option<String>,
    pub site_id: Option<Uuid>,
    pub birth_date: Option<NaiveDate>,
}

/// The fields of an item that may change after it is added.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub nickname: Option<Option<String>>,
    pub species: Option<Option<String>>,
    /// `Some(None)` takes a plant off its site
    pub site_id: Option<Option<Uuid>>,
    pub birth_date: Option<Option<NaiveDate>>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.nickname.is_none()
            && self.species.is_none()
            && self.site_id.is_none()
            && self.birth_date.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewSiteData {
    pub name: String,
    pub light: LightLevel,
    pub location: SiteLocation,
}

#[derive(Debug, Clone, Default)]
pub struct SiteUpdate {
    pub name: Option<String>,
    pub light: Option<LightLevel>,
    pub location: Option<SiteLocation>,
}

impl SiteUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.light.is_none() && self.location.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewRuleData {
    pub item_id: Uuid,
    pub kind: CareKind,
    pub interval: i64,
    pub unit: Unit,
    pub description: Option<String>,
    /// When set, the first occurrence is due one cadence after it instead of now
    pub last_completed_at: Option<DateTime<Utc>>,
}

/// The fields of a rule that may change after creation. Nothing else is mutable.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub interval: Option<i64>,
    pub unit: Option<Unit>,
    pub description: Option<Option<String>>,
    pub last_completed_at: Option<Option<DateTime<Utc>>>,
}

impl RuleUpdate {
    pub fn is_empty(&self) -> bool {
        self.interval.is_none()
            && self.unit.is_none()
            && self.description.is_none()
            && self.last_completed_at.is_none()
    }

    pub(crate) fn touches_schedule(&self) -> bool {
        self.interval.is_some() || self.unit.is_some() || self.last_completed_at.is_some()
    }
}

/// What happens to already-created open occurrences when a rule's cadence changes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyChangePolicy {
    /// In-flight due dates stay as they were; only successors use the new cadence.
    #[default]
    Frozen,
    /// Open occurrences that are not yet due are re-derived from the new cadence.
    RederiveUpcoming,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid frequency change policy: {0} (expected frozen or rederive_upcoming)")]
pub struct ParseFrequencyChangePolicyError(String);

impl FromStr for FrequencyChangePolicy {
    type Err = ParseFrequencyChangePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "frozen" => Ok(FrequencyChangePolicy::Frozen),
            "rederive_upcoming" | "rederive" => Ok(FrequencyChangePolicy::RederiveUpcoming),
            _ => Err(ParseFrequencyChangePolicyError(s.to_string())),
        }
    }
}

/// Scheduler settings - core version
/// This is separate from the CLI config to allow for type differences
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Zone whose local midnight delimits "today"
    pub timezone: Tz,
    /// Upcoming occurrences further out than this many days are left out of `list_due`
    pub upcoming_horizon_days: Option<i64>,
    pub frequency_change: FrequencyChangePolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            upcoming_horizon_days: None,
            frequency_change: FrequencyChangePolicy::Frozen,
        }
    }
}
