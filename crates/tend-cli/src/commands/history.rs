use anyhow::Result;
use tend_core::repository::Repository;

use crate::cli::HistoryCommand;
use crate::commands::print_json;
use crate::parser::parse_date;
use crate::views::table::display_history;

pub async fn show_history(repo: &impl Repository, user: &str, command: HistoryCommand) -> Result<()> {
    let on_date = command.date.as_deref().map(parse_date).transpose()?;
    let completed = repo.list_completed(user, on_date).await?;

    if command.json {
        return print_json(&completed);
    }
    display_history(&completed, &repo.config().timezone);
    Ok(())
}
