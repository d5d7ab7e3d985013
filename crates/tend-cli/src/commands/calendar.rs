use anyhow::Result;
use chrono::Utc;
use tend_core::repository::Repository;

use crate::cli::CalendarCommand;
use crate::commands::print_json;
use crate::views::table::display_calendar;

pub async fn show_calendar(
    repo: &impl Repository,
    user: &str,
    command: CalendarCommand,
    default_days: i64,
) -> Result<()> {
    let days = command.days.unwrap_or(default_days);
    let calendar = repo.list_calendar(user, Utc::now(), days).await?;

    if command.json {
        return print_json(&calendar);
    }
    display_calendar(&calendar, &repo.config().timezone);
    Ok(())
}
