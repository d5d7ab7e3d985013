use anyhow::{anyhow, Result};
use tend_core::error::CoreError;
use tend_core::repository::Repository;
use uuid::Uuid;

pub async fn resolve_item_id(repo: &impl Repository, user: &str, short_id: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(short_id) {
        return Ok(id);
    }
    let items = repo.find_items_by_short_id_prefix(short_id, user).await?;
    single_match("item", short_id, items, |item| (item.id, item.label()))
}

pub async fn resolve_site_id(repo: &impl Repository, user: &str, short_id: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(short_id) {
        return Ok(id);
    }
    let sites = repo.find_sites_by_short_id_prefix(short_id, user).await?;
    single_match("site", short_id, sites, |site| (site.id, site.name.clone()))
}

pub async fn resolve_rule_id(repo: &impl Repository, user: &str, short_id: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(short_id) {
        return Ok(id);
    }
    let rules = repo.find_rules_by_short_id_prefix(short_id, user).await?;
    single_match("task", short_id, rules, |rule| {
        let label = match &rule.description {
            Some(description) => format!("{} every {}: {}", rule.kind, rule.cadence(), description),
            None => format!("{} every {}", rule.kind, rule.cadence()),
        };
        (rule.id, label)
    })
}

pub async fn resolve_occurrence_id(repo: &impl Repository, user: &str, short_id: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(short_id) {
        return Ok(id);
    }
    let occurrences = repo.find_occurrences_by_short_id_prefix(short_id, user).await?;
    single_match("due task", short_id, occurrences, |occurrence| {
        let state = if occurrence.is_completed { "done" } else { "open" };
        (
            occurrence.id,
            format!("{}, due {}", state, occurrence.due_date.format("%Y-%m-%d %H:%M")),
        )
    })
}

fn single_match<T>(
    what: &str,
    short_id: &str,
    matches: Vec<T>,
    describe: impl Fn(&T) -> (Uuid, String),
) -> Result<Uuid> {
    match matches.as_slice() {
        [only] => Ok(describe(only).0),
        [] => Err(anyhow!(CoreError::NotFound(format!(
            "No {} found with ID prefix '{}'",
            what, short_id
        )))),
        _ => {
            let candidates: Vec<(String, String)> = matches
                .iter()
                .map(|m| {
                    let (id, label) = describe(m);
                    (id.to_string(), label)
                })
                .collect();
            Err(anyhow!(CoreError::AmbiguousId(candidates)))
        }
    }
}

/// Leading hex digits of an id, enough to type back as a prefix.
///
/// v7 ids start with a millisecond timestamp, so the prefix runs past it into
/// the random bits.
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..16].to_string()
}
