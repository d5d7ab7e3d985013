use assert_cmd::Command;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

pub const DEFAULT_USER: &str = "tester";

/// Test harness for running CLI commands with temporary databases
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("tend").expect("Failed to find tend binary");

        // Run from the temp dir so no stray tend.toml is picked up
        cmd.current_dir(self.temp_dir.path())
            .env("TEND_DATABASE_PATH", &self.db_path)
            .env("TEND_USER", DEFAULT_USER)
            .env("TEND_TIMEZONE", "UTC")
            .env_remove("TEND_UPCOMING_HORIZON_DAYS")
            .env_remove("TEND_FREQUENCY_CHANGE")
            .env_remove("TEND_LOG");

        cmd
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Run a read command with `--json` and parse its output
    pub fn json(&self, args: &[&str]) -> Value {
        let mut args = args.to_vec();
        args.push("--json");
        let output = self.run_success(&args).get_output().stdout.clone();
        serde_json::from_slice(&output).expect("command did not print valid JSON")
    }

    /// Add an item and return its full id
    pub fn add_item(&self, kind: &str, nickname: &str) -> String {
        self.run_success(&["item", "add", kind, nickname]);
        let items = self.json(&["item", "list"]);
        items
            .as_array()
            .unwrap()
            .iter()
            .find(|item| item["nickname"] == nickname)
            .and_then(|item| item["id"].as_str())
            .expect("added item not listed")
            .to_string()
    }

    /// Add a task to an item and return the new rule's full id
    pub fn add_task(&self, item_id: &str, kind: &str, every: &str, extra: &[&str]) -> String {
        let before = self.rule_ids();
        let mut args = vec!["task", "add", item_id, kind, "--every", every];
        args.extend_from_slice(extra);
        self.run_success(&args);
        self.rule_ids()
            .into_iter()
            .find(|id| !before.contains(id))
            .expect("added task not listed")
    }

    fn rule_ids(&self) -> Vec<String> {
        self.json(&["task", "list"])
            .as_array()
            .unwrap()
            .iter()
            .map(|rule| rule["id"].as_str().unwrap().to_string())
            .collect()
    }

    /// Id of the open occurrence of a rule, found through `tend due`
    pub fn open_occurrence(&self, rule_id: &str) -> String {
        let due = self.json(&["due"]);
        ["overdue", "due_today", "upcoming"]
            .iter()
            .flat_map(|bucket| due[*bucket].as_array().unwrap().iter())
            .find(|task| task["rule_id"] == rule_id)
            .and_then(|task| task["id"].as_str())
            .expect("no open occurrence for rule")
            .to_string()
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }

    /// Predicate to check for an empty listing
    pub fn empty_result() -> impl Predicate<str> {
        predicate::str::contains("No ")
            .or(predicate::str::contains("Nothing to do"))
    }
}
