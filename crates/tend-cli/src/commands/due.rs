use anyhow::Result;
use chrono::Utc;
use tend_core::repository::Repository;

use crate::cli::DueCommand;
use crate::commands::print_json;
use crate::views::table::display_due;

pub async fn list_due(repo: &impl Repository, user: &str, command: DueCommand) -> Result<()> {
    let now = Utc::now();
    let windows = repo.list_due(user, now).await?;

    if command.json {
        return print_json(&windows);
    }
    display_due(&windows, &repo.config().timezone, now);
    Ok(())
}
