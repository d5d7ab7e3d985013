use anyhow::Result;
use chrono::{DateTime, Utc};
use dialoguer::Confirm;
use serde::Serialize;
use std::collections::HashMap;
use tend_core::models::{NewRuleData, RecurrenceRule, RuleUpdate};
use tend_core::repository::Repository;
use uuid::Uuid;

use crate::cli::{
    AddTaskCommand, EditTaskCommand, FreqCommand, ListTasksCommand, RemoveCommand, TaskCommand,
    TaskSubcommand,
};
use crate::commands::print_json;
use crate::parser::{parse_cadence, parse_last_done};
use crate::util::{resolve_item_id, resolve_rule_id, short_id};
use crate::views::table::{display_rules, ViewRule};

#[derive(Serialize)]
struct RuleListing<'a> {
    #[serde(flatten)]
    rule: &'a RecurrenceRule,
    item: &'a str,
    next_due: Option<DateTime<Utc>>,
}

pub async fn task_command(repo: &impl Repository, user: &str, command: TaskCommand) -> Result<()> {
    match command.command {
        TaskSubcommand::Add(add_command) => add_task(repo, user, add_command).await,
        TaskSubcommand::List(list_command) => list_tasks(repo, user, list_command).await,
        TaskSubcommand::Freq(freq_command) => change_frequency(repo, user, freq_command).await,
        TaskSubcommand::Edit(edit_command) => edit_task(repo, user, edit_command).await,
        TaskSubcommand::Remove(remove_command) => remove_task(repo, user, remove_command).await,
    }
}

async fn add_task(repo: &impl Repository, user: &str, command: AddTaskCommand) -> Result<()> {
    let item_id = resolve_item_id(repo, user, &command.item).await?;
    let (interval, unit) = parse_cadence(&command.every)?;
    let last_completed_at = command.last_done.as_deref().map(parse_last_done).transpose()?;

    let rule = repo
        .create_rule(
            user,
            NewRuleData {
                item_id,
                kind: command.kind,
                interval,
                unit,
                description: command.description,
                last_completed_at,
            },
        )
        .await?;

    println!(
        "Added {} every {} ({})",
        rule.kind,
        rule.cadence(),
        short_id(&rule.id)
    );
    Ok(())
}

async fn list_tasks(repo: &impl Repository, user: &str, command: ListTasksCommand) -> Result<()> {
    let rules = match &command.item {
        Some(item) => {
            let item_id = resolve_item_id(repo, user, item).await?;
            repo.find_rules_for_item(item_id, user).await?
        }
        None => repo.find_rules(user).await?,
    };

    let labels: HashMap<Uuid, String> = repo
        .find_items(user)
        .await?
        .into_iter()
        .map(|item| (item.id, item.label()))
        .collect();

    let mut views = Vec::with_capacity(rules.len());
    for rule in rules {
        let next_due = repo
            .find_occurrences_for_rule(rule.id, user)
            .await?
            .into_iter()
            .find(|o| o.is_open())
            .map(|o| o.due_date);
        views.push(ViewRule {
            item_label: labels.get(&rule.item_id).cloned().unwrap_or_default(),
            rule,
            next_due,
        });
    }

    if command.json {
        let listings: Vec<RuleListing> = views
            .iter()
            .map(|view| RuleListing {
                rule: &view.rule,
                item: &view.item_label,
                next_due: view.next_due,
            })
            .collect();
        return print_json(&listings);
    }

    display_rules(&views, &repo.config().timezone, Utc::now());
    Ok(())
}

async fn change_frequency(repo: &impl Repository, user: &str, command: FreqCommand) -> Result<()> {
    let rule_id = resolve_rule_id(repo, user, &command.id).await?;
    let (interval, unit) = parse_cadence(&command.every)?;

    let rule = repo.update_frequency(rule_id, user, interval, unit).await?;
    println!("{} now repeats every {}", rule.kind, rule.cadence());
    Ok(())
}

async fn edit_task(repo: &impl Repository, user: &str, command: EditTaskCommand) -> Result<()> {
    let rule_id = resolve_rule_id(repo, user, &command.id).await?;

    let (interval, unit) = match command.every.as_deref().map(parse_cadence).transpose()? {
        Some((interval, unit)) => (Some(interval), Some(unit)),
        None => (None, None),
    };

    let description = if command.description_clear {
        Some(None)
    } else {
        command.description.map(Some)
    };

    let last_completed_at = if command.last_done_clear {
        Some(None)
    } else if let Some(last_done) = command.last_done {
        Some(Some(parse_last_done(&last_done)?))
    } else {
        None
    };

    let update = RuleUpdate {
        interval,
        unit,
        description,
        last_completed_at,
    };
    if update.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }

    let rule = repo.update_rule(rule_id, user, update).await?;
    println!("Updated {} every {} ({})", rule.kind, rule.cadence(), short_id(&rule.id));
    Ok(())
}

async fn remove_task(repo: &impl Repository, user: &str, command: RemoveCommand) -> Result<()> {
    let rule_id = resolve_rule_id(repo, user, &command.id).await?;

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt("Remove this care task and its whole history?")
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Removal cancelled.");
            return Ok(());
        }
    }

    repo.delete_rule(rule_id, user).await?;
    println!("Care task removed.");
    Ok(())
}
