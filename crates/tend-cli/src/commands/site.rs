use anyhow::Result;
use dialoguer::Confirm;
use serde::Serialize;
use tend_core::models::{NewSiteData, Site, SiteUpdate};
use tend_core::repository::Repository;

use crate::cli::{AddSiteCommand, EditSiteCommand, JsonFlag, RemoveCommand, SiteCommand, SiteSubcommand};
use crate::commands::print_json;
use crate::util::{resolve_site_id, short_id};
use crate::views::table::display_sites;

#[derive(Serialize)]
struct SiteListing<'a> {
    #[serde(flatten)]
    site: &'a Site,
    plants: usize,
}

pub async fn site_command(repo: &impl Repository, user: &str, command: SiteCommand) -> Result<()> {
    match command.command {
        SiteSubcommand::Add(add_command) => add_site(repo, user, add_command).await,
        SiteSubcommand::List(flags) => list_sites(repo, user, flags).await,
        SiteSubcommand::Edit(edit_command) => edit_site(repo, user, edit_command).await,
        SiteSubcommand::Remove(remove_command) => remove_site(repo, user, remove_command).await,
    }
}

async fn add_site(repo: &impl Repository, user: &str, command: AddSiteCommand) -> Result<()> {
    let site = repo
        .add_site(
            user,
            NewSiteData {
                name: command.name,
                light: command.light,
                location: command.location,
            },
        )
        .await?;
    println!("Added site '{}' ({})", site.name, short_id(&site.id));
    Ok(())
}

async fn list_sites(repo: &impl Repository, user: &str, flags: JsonFlag) -> Result<()> {
    let sites = repo.find_sites(user).await?;
    let items = repo.find_items(user).await?;

    let counted: Vec<(Site, usize)> = sites
        .into_iter()
        .map(|site| {
            let plants = items.iter().filter(|item| item.site_id == Some(site.id)).count();
            (site, plants)
        })
        .collect();

    if flags.json {
        let listings: Vec<SiteListing> = counted
            .iter()
            .map(|(site, plants)| SiteListing { site, plants: *plants })
            .collect();
        return print_json(&listings);
    }
    display_sites(&counted);
    Ok(())
}

async fn edit_site(repo: &impl Repository, user: &str, command: EditSiteCommand) -> Result<()> {
    let site_id = resolve_site_id(repo, user, &command.id).await?;

    let update = SiteUpdate {
        name: command.name,
        light: command.light,
        location: command.location,
    };
    if update.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }

    let site = repo.update_site(site_id, user, update).await?;
    println!("Updated site '{}' ({}, {} light)", site.name, site.location, site.light);
    Ok(())
}

async fn remove_site(repo: &impl Repository, user: &str, command: RemoveCommand) -> Result<()> {
    let site_id = resolve_site_id(repo, user, &command.id).await?;

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt("Remove this site? Its plants are kept.")
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Removal cancelled.");
            return Ok(());
        }
    }

    repo.delete_site(site_id, user).await?;
    println!("Site removed.");
    Ok(())
}
