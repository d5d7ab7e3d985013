use anyhow::Result;
use chrono::Utc;
use dialoguer::Confirm;
use serde::Serialize;
use std::collections::HashMap;
use tend_core::models::{ItemUpdate, NewItemData, OwnedItem};
use tend_core::repository::Repository;
use tend_core::timezone::local_date;
use uuid::Uuid;

use crate::cli::{
    AddItemCommand, EditItemCommand, ItemCommand, ItemSubcommand, JsonFlag, RemoveCommand,
    ShowItemCommand,
};
use crate::commands::print_json;
use crate::parser::parse_date;
use crate::util::{resolve_item_id, resolve_site_id, short_id};
use crate::views::table::{display_item_detail, display_items, ViewItem};

#[derive(Serialize)]
struct ItemListing<'a> {
    #[serde(flatten)]
    item: &'a OwnedItem,
    site: Option<&'a str>,
    age: Option<u32>,
}

pub async fn item_command(repo: &impl Repository, user: &str, command: ItemCommand) -> Result<()> {
    match command.command {
        ItemSubcommand::Add(add_command) => add_item(repo, user, add_command).await,
        ItemSubcommand::List(flags) => list_items(repo, user, flags).await,
        ItemSubcommand::Show(show_command) => show_item(repo, user, show_command).await,
        ItemSubcommand::Edit(edit_command) => edit_item(repo, user, edit_command).await,
        ItemSubcommand::Remove(remove_command) => remove_item(repo, user, remove_command).await,
    }
}

async fn add_item(repo: &impl Repository, user: &str, command: AddItemCommand) -> Result<()> {
    let site_id = match &command.site {
        Some(site) => Some(resolve_site_id(repo, user, site).await?),
        None => None,
    };
    let birth_date = command.born.as_deref().map(parse_date).transpose()?;

    let item = repo
        .add_item(
            user,
            NewItemData {
                kind: command.kind,
                nickname: command.nickname,
                species: command.species,
                site_id,
                birth_date,
            },
        )
        .await?;
    println!("Added {} '{}' ({})", item.kind, item.label(), short_id(&item.id));
    Ok(())
}

async fn list_items(repo: &impl Repository, user: &str, flags: JsonFlag) -> Result<()> {
    let items = repo.find_items(user).await?;
    let sites: HashMap<Uuid, String> = repo
        .find_sites(user)
        .await?
        .into_iter()
        .map(|site| (site.id, site.name))
        .collect();
    let today = local_date(Utc::now(), &repo.config().timezone);

    let views: Vec<ViewItem> = items
        .into_iter()
        .map(|item| ViewItem {
            site: item.site_id.and_then(|id| sites.get(&id).cloned()),
            age: item.age_on(today),
            item,
        })
        .collect();

    if flags.json {
        let listings: Vec<ItemListing> = views
            .iter()
            .map(|view| ItemListing {
                item: &view.item,
                site: view.site.as_deref(),
                age: view.age,
            })
            .collect();
        return print_json(&listings);
    }
    display_items(&views, &repo.config().timezone);
    Ok(())
}

async fn show_item(repo: &impl Repository, user: &str, command: ShowItemCommand) -> Result<()> {
    let item_id = resolve_item_id(repo, user, &command.id).await?;
    let detail = repo.item_detail(item_id, user).await?;
    if command.json {
        return print_json(&detail);
    }
    display_item_detail(&detail, &repo.config().timezone, Utc::now());
    Ok(())
}

async fn edit_item(repo: &impl Repository, user: &str, command: EditItemCommand) -> Result<()> {
    let item_id = resolve_item_id(repo, user, &command.id).await?;

    let nickname = if command.nickname_clear {
        Some(None)
    } else {
        command.nickname.map(Some)
    };

    let species = if command.species_clear {
        Some(None)
    } else {
        command.species.map(Some)
    };

    let site_id = if command.site_clear {
        Some(None)
    } else if let Some(site) = &command.site {
        Some(Some(resolve_site_id(repo, user, site).await?))
    } else {
        None
    };

    let birth_date = if command.born_clear {
        Some(None)
    } else if let Some(born) = &command.born {
        Some(Some(parse_date(born)?))
    } else {
        None
    };

    let update = ItemUpdate {
        nickname,
        species,
        site_id,
        birth_date,
    };
    if update.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }

    let item = repo.update_item(item_id, user, update).await?;
    println!("Updated {} '{}' ({})", item.kind, item.label(), short_id(&item.id));
    Ok(())
}

async fn remove_item(repo: &impl Repository, user: &str, command: RemoveCommand) -> Result<()> {
    let item_id = resolve_item_id(repo, user, &command.id).await?;
    let detail = repo.item_detail(item_id, user).await?;

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt(format!(
                "Remove '{}' and its {} care task(s)?",
                detail.item.label(),
                detail.rules.len()
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Removal cancelled.");
            return Ok(());
        }
    }

    repo.delete_item(item_id, user).await?;
    println!("Removed '{}'.", detail.item.label());
    Ok(())
}
