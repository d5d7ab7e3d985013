use anyhow::Result;
use chrono::Utc;
use chrono_humanize::Humanize;
use tend_core::repository::Repository;
use tend_core::timezone::format_with_timezone;

use crate::cli::DoCommand;
use crate::util::{resolve_occurrence_id, short_id};

pub async fn do_task(repo: &impl Repository, user: &str, command: DoCommand) -> Result<()> {
    let occurrence_id = resolve_occurrence_id(repo, user, &command.id).await?;
    let next = repo.complete_occurrence(occurrence_id, user, Utc::now()).await?;

    let rule = repo.find_rule(next.rule_id, user).await?;
    let what = rule.map_or_else(|| "task".to_string(), |r| r.kind.to_string());

    println!("Completed {}.", what);
    println!(
        "Next {} due {} ({}) [{}]",
        what,
        format_with_timezone(next.due_date, &repo.config().timezone, "%Y-%m-%d %H:%M"),
        next.due_date.humanize(),
        short_id(&next.id)
    );
    Ok(())
}
