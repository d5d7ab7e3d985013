/// CLI integration tests for tend
///
/// These tests drive the `tend` binary as a black box against a temporary
/// database, covering each command path and its error reporting.
use predicates::prelude::*;

mod helpers;
use helpers::{assertions, CliTestHarness};

#[test]
fn test_cli_help_and_version() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("care reminders"))
        .stdout(predicate::str::contains("calendar"));

    harness
        .run_success(&["--version"])
        .stdout(predicate::str::contains("tend"));

    harness
        .run_failure(&["water-everything"])
        .stderr(assertions::has_error());
}

#[test]
fn test_item_lifecycle() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["item", "list"])
        .stdout(assertions::empty_result());

    harness
        .run_success(&["item", "add", "plant", "Fern", "--species", "Boston fern"])
        .stdout(predicate::str::contains("Added plant 'Fern'"));
    harness
        .run_success(&["item", "add", "pet", "Rex"])
        .stdout(predicate::str::contains("Added pet 'Rex'"));
    harness
        .run_failure(&["item", "add", "rock", "Pebble"])
        .stderr(predicate::str::contains("Invalid item kind"));

    let items = harness.json(&["item", "list"]);
    assert_eq!(items.as_array().unwrap().len(), 2);

    harness
        .run_success(&["item", "list"])
        .stdout(predicate::str::contains("Fern"))
        .stdout(predicate::str::contains("Boston fern"));

    let fern = items
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["nickname"] == "Fern")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let detail = harness.json(&["item", "show", &fern[..13]]);
    assert_eq!(detail["item"]["kind"], "plant");
    assert_eq!(detail["rules"].as_array().unwrap().len(), 0);

    harness
        .run_success(&["item", "remove", &fern, "--force"])
        .stdout(predicate::str::contains("Removed 'Fern'"));
    assert_eq!(harness.json(&["item", "list"]).as_array().unwrap().len(), 1);
}

#[test]
fn test_task_add_validation() {
    let harness = CliTestHarness::new();
    let fern = harness.add_item("plant", "Fern");

    harness
        .run_failure(&["task", "add", &fern, "watering", "--every", "3 fortnights"])
        .stderr(predicate::str::contains("Invalid cadence"));

    harness
        .run_failure(&["task", "add", &fern, "watering", "--every", "0 days"])
        .stderr(predicate::str::contains("Invalid input"));

    harness
        .run_failure(&["task", "add", &fern, "dusting", "--every", "week"])
        .stderr(assertions::has_error());

    harness
        .run_failure(&["task", "add", "zz", "watering", "--every", "week"])
        .stderr(predicate::str::contains("No item found"));

    assert!(harness.json(&["task", "list"]).as_array().unwrap().is_empty());
}

#[test]
fn test_complete_task_flow() {
    let harness = CliTestHarness::new();
    let fern = harness.add_item("plant", "Fern");
    let rule = harness.add_task(&fern, "watering", "3 days", &["--description", "Rain water"]);

    // A brand new task is due right away
    let due = harness.json(&["due"]);
    assert_eq!(due["due_today"].as_array().unwrap().len(), 1);
    assert_eq!(due["due_today"][0]["item_nickname"], "Fern");
    assert_eq!(due["due_today"][0]["description"], "Rain water");

    let occurrence = harness.open_occurrence(&rule);
    harness
        .run_success(&["do", &occurrence[..8]])
        .stdout(predicate::str::contains("Completed watering"))
        .stdout(predicate::str::contains("Next watering due"));

    // The successor is three days out
    let due = harness.json(&["due"]);
    assert!(due["due_today"].as_array().unwrap().is_empty());
    assert_eq!(due["upcoming"].as_array().unwrap().len(), 1);
    assert_ne!(harness.open_occurrence(&rule), occurrence);

    harness
        .run_failure(&["do", &occurrence])
        .stderr(predicate::str::contains("already completed"));

    let history = harness.json(&["history"]);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], occurrence.as_str());
    assert!(history[0]["completed_at"].is_string());

    harness
        .run_success(&["history"])
        .stdout(predicate::str::contains("watering (Rain water)"));
}

#[test]
fn test_due_table_output() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["due"])
        .stdout(predicate::str::contains("Nothing to do"));

    let fern = harness.add_item("plant", "Fern");
    harness.add_task(&fern, "misting", "1 day", &[]);
    harness.add_task(&fern, "fertilizing", "1 month", &["--last-done", "yesterday"]);

    harness
        .run_success(&["due"])
        .stdout(predicate::str::contains("Due today"))
        .stdout(predicate::str::contains("Upcoming"))
        .stdout(predicate::str::contains("Overdue").not())
        .stdout(predicate::str::contains("misting"))
        .stdout(predicate::str::contains("fertilizing"));
}

#[test]
fn test_calendar() {
    let harness = CliTestHarness::new();
    let fern = harness.add_item("plant", "Fern");
    harness.add_task(&fern, "watering", "2 days", &["--last-done", "today"]);

    let calendar = harness.json(&["calendar", "--days", "7"]);
    let days = calendar.as_array().unwrap();
    assert_eq!(days.len(), 7);
    let busy = days
        .iter()
        .filter(|day| !day["tasks"].as_array().unwrap().is_empty())
        .count();
    assert_eq!(busy, 1);

    // Configured default is 30 days
    assert_eq!(harness.json(&["calendar"]).as_array().unwrap().len(), 30);

    harness
        .run_failure(&["calendar", "--days", "-3"])
        .stderr(assertions::has_error());
    harness
        .run_failure(&["calendar", "--days", "9999999999"])
        .stderr(predicate::str::contains("must not exceed"));
}

#[test]
fn test_history_date_filter() {
    let harness = CliTestHarness::new();
    let fern = harness.add_item("plant", "Fern");
    let rule = harness.add_task(&fern, "pruning", "2 weeks", &[]);
    let occurrence = harness.open_occurrence(&rule);
    harness.run_success(&["do", &occurrence]);

    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    // Completion and this check may straddle midnight UTC; accept either day
    let on_today = harness.json(&["history", "--date", &today]);
    let all = harness.json(&["history"]);
    assert!(on_today.as_array().unwrap().len() <= 1);
    assert_eq!(all.as_array().unwrap().len(), 1);

    assert!(harness
        .json(&["history", "--date", "2001-01-01"])
        .as_array()
        .unwrap()
        .is_empty());

    harness
        .run_failure(&["history", "--date", "01/01/2001"])
        .stderr(predicate::str::contains("Failed to parse date"));
}

#[test]
fn test_task_freq_edit_and_remove() {
    let harness = CliTestHarness::new();
    let fern = harness.add_item("plant", "Fern");
    let rule = harness.add_task(&fern, "watering", "3 days", &[]);

    harness
        .run_success(&["task", "freq", &rule, "2w"])
        .stdout(predicate::str::contains("now repeats every 2 week(s)"));

    harness
        .run_failure(&["task", "freq", &rule, "-1 day"])
        .stderr(assertions::has_error());

    harness.run_success(&[
        "task",
        "edit",
        &rule,
        "--description",
        "Bottom watering",
        "--last-done",
        "yesterday",
    ]);

    let rules = harness.json(&["task", "list", "--item", &fern]);
    let listed = &rules.as_array().unwrap()[0];
    assert_eq!(listed["interval"], 2);
    assert_eq!(listed["unit"], "week");
    assert_eq!(listed["description"], "Bottom watering");
    assert!(listed["last_completed_at"].is_string());
    assert_eq!(listed["item"], "Fern");

    harness
        .run_success(&["task", "edit", &rule])
        .stdout(predicate::str::contains("Nothing to change"));

    harness
        .run_success(&["task", "edit", &rule, "--description-clear"]);
    let rules = harness.json(&["task", "list"]);
    assert!(rules[0]["description"].is_null());

    harness
        .run_success(&["task", "remove", &rule, "--force"])
        .stdout(predicate::str::contains("removed"));
    assert!(harness.json(&["task", "list"]).as_array().unwrap().is_empty());
    assert!(harness.json(&["due"])["due_today"].as_array().unwrap().is_empty());
}

#[test]
fn test_item_remove_cascades() {
    let harness = CliTestHarness::new();
    let fern = harness.add_item("plant", "Fern");
    harness.add_task(&fern, "watering", "3 days", &[]);
    harness.add_task(&fern, "misting", "1 day", &[]);

    harness.run_success(&["item", "remove", &fern, "--force"]);

    assert!(harness.json(&["task", "list"]).as_array().unwrap().is_empty());
    harness
        .run_success(&["due"])
        .stdout(predicate::str::contains("Nothing to do"));
}

#[test]
fn test_users_are_isolated() {
    let harness = CliTestHarness::new();
    let fern = harness.add_item("plant", "Fern");
    let rule = harness.add_task(&fern, "watering", "3 days", &[]);
    let occurrence = harness.open_occurrence(&rule);

    assert!(harness
        .json(&["item", "list", "--user", "bob"])
        .as_array()
        .unwrap()
        .is_empty());

    harness
        .run_failure(&["do", &occurrence, "--user", "bob"])
        .stderr(predicate::str::contains("not found"));

    harness
        .run_failure(&["item", "show", &fern, "--user", "bob"])
        .stderr(predicate::str::contains("not found"));

    // Still open for its owner
    assert_eq!(harness.open_occurrence(&rule), occurrence);
}

#[test]
fn test_short_id_errors() {
    let harness = CliTestHarness::new();
    harness.add_item("plant", "Fern");

    harness
        .run_failure(&["item", "show", "0"])
        .stderr(predicate::str::contains("at least 2 characters"));

    harness
        .run_failure(&["item", "show", "not-hex"])
        .stderr(predicate::str::contains("not a valid ID prefix"));
}

#[test]
fn test_invalid_timezone_config() {
    let harness = CliTestHarness::new();

    harness
        .command()
        .env("TEND_TIMEZONE", "Mars/Olympus_Mons")
        .args(["due"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timezone"));
}

#[test]
fn test_item_edit() {
    let harness = CliTestHarness::new();
    let fern = harness.add_item("plant", "Fern");

    harness
        .run_success(&["item", "edit", &fern, "--nickname", "Fernando", "--species", "Boston fern"])
        .stdout(predicate::str::contains("Updated plant 'Fernando'"));

    harness
        .run_success(&["item", "edit", &fern])
        .stdout(predicate::str::contains("Nothing to change"));

    harness.run_success(&["item", "edit", &fern, "--nickname-clear"]);
    let items = harness.json(&["item", "list"]);
    assert!(items[0]["nickname"].is_null());
    assert_eq!(items[0]["species"], "Boston fern");

    harness
        .run_failure(&["item", "edit", &fern, "--nickname", "Mine", "--user", "bob"])
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_sites_hold_plants() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["site", "list"])
        .stdout(assertions::empty_result());
    harness
        .run_success(&["site", "add", "Kitchen window", "--light", "high", "--location", "indoor"])
        .stdout(predicate::str::contains("Added site 'Kitchen window'"));
    harness
        .run_failure(&["site", "add", "Cellar", "--light", "none", "--location", "indoor"])
        .stderr(assertions::has_error());

    let sites = harness.json(&["site", "list"]);
    let site = sites[0]["id"].as_str().unwrap().to_string();
    assert_eq!(sites[0]["plants"], 0);

    let fern = harness.add_item("plant", "Fern");
    harness.run_success(&["item", "edit", &fern, "--site", &site[..16]]);
    harness.run_success(&["item", "add", "plant", "Ivy", "--site", &site]);

    let sites = harness.json(&["site", "list"]);
    assert_eq!(sites[0]["plants"], 2);
    harness
        .run_success(&["item", "list"])
        .stdout(predicate::str::contains("Kitchen window"));

    harness
        .run_success(&["site", "edit", &site, "--name", "Balcony", "--location", "outdoor"])
        .stdout(predicate::str::contains("Updated site 'Balcony' (outdoor, high light)"));

    harness.run_success(&["item", "edit", &fern, "--site-clear"]);
    assert_eq!(harness.json(&["site", "list"])[0]["plants"], 1);

    // Removing the site keeps its plants
    harness
        .run_success(&["site", "remove", &site, "--force"])
        .stdout(predicate::str::contains("Site removed"));
    let items = harness.json(&["item", "list"]);
    assert_eq!(items.as_array().unwrap().len(), 2);
    assert!(items.as_array().unwrap().iter().all(|item| item["site"].is_null()));
}

#[test]
fn test_pet_birth_date_and_age() {
    let harness = CliTestHarness::new();

    harness.run_success(&["item", "add", "pet", "Rex", "--born", "2015-03-01"]);
    let items = harness.json(&["item", "list"]);
    assert_eq!(items[0]["birth_date"], "2015-03-01");
    assert!(items[0]["age"].as_u64().unwrap() >= 11);

    harness
        .run_failure(&["item", "add", "pet", "Nova", "--born", "2999-01-01"])
        .stderr(predicate::str::contains("cannot be in the future"));

    harness
        .run_failure(&["item", "add", "plant", "Fern", "--born", "2020-01-01"])
        .stderr(predicate::str::contains("only pets"));

    let rex = items[0]["id"].as_str().unwrap().to_string();
    harness.run_success(&["item", "edit", &rex, "--born-clear"]);
    assert!(harness.json(&["item", "list"])[0]["age"].is_null());
}

#[test]
fn test_due_labels_unnamed_items_by_species() {
    let harness = CliTestHarness::new();
    harness.run_success(&["item", "add", "plant", "--species", "Monstera"]);
    let monstera = harness.json(&["item", "list"])[0]["id"].as_str().unwrap().to_string();
    harness.add_task(&monstera, "watering", "1 week", &[]);

    harness
        .run_success(&["due"])
        .stdout(predicate::str::contains("Monstera"))
        .stdout(predicate::str::contains("unnamed").not());
}
