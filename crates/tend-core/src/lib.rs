//! # Tend Core Library
//!
//! Scheduling engine behind Tend, a care-reminder backend for household plants
//! and pets. Users register owned items, attach recurring care tasks to them,
//! and the engine tracks when each task instance is due, overdue or completed.
//!
//! ## Concepts
//!
//! - **Recurrence rule**: a care task (misting, watering, pruning, fertilizing)
//!   attached to an owned item, repeating every `interval` days, weeks or
//!   28-day months
//! - **Occurrence**: one due-date instance of a rule. A rule has at most one
//!   open occurrence; completing it creates the next one in the same
//!   transaction
//! - **Site**: a place where a user keeps plants, with its light and whether
//!   it is indoor or outdoor. Pets record a birth date instead
//! - **Due windows**: open occurrences classified as overdue, due today or
//!   upcoming relative to a reference "now" in a configured timezone
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`recurrence`]: Cadence validation and the due-date calculator
//! - [`windows`]: Due-window classification and calendar grouping
//! - [`repository`]: Data access layer with Repository pattern
//! - [`timezone`]: Timezone parsing and local-day utilities
//! - [`error`]: Error taxonomy shared by every operation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use tend_core::{
//!     db,
//!     models::{CareKind, ItemKind, NewItemData, NewRuleData, SchedulerConfig, Unit},
//!     repository::{ItemRepository, OccurrenceRepository, RuleRepository, SqliteRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("tend.db").await?;
//!     let repo = SqliteRepository::new(pool, SchedulerConfig::default());
//!
//!     let fern = repo
//!         .add_item("alice", NewItemData {
//!             kind: ItemKind::Plant,
//!             nickname: Some("Fern".to_string()),
//!             species: None,
//!             site_id: None,
//!             birth_date: None,
//!         })
//!         .await?;
//!
//!     repo.create_rule("alice", NewRuleData {
//!         item_id: fern.id,
//!         kind: CareKind::Watering,
//!         interval: 3,
//!         unit: Unit::Day,
//!         description: None,
//!         last_completed_at: None,
//!     })
//!     .await?;
//!
//!     let due = repo.list_due("alice", Utc::now()).await?;
//!     println!("{} task(s) due today", due.due_today.len());
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod timezone;
pub mod windows;
