use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test harness for running CLI commands against a temporary database
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
    envs: Vec<(String, String)>,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("stride.db");

        Self {
            temp_dir,
            db_path,
            envs: Vec::new(),
        }
    }

    /// Harness whose sessions act for `user_id` inside `team_id`
    pub fn with_team(team_id: &str, user_id: &str) -> Self {
        let mut harness = Self::new();
        harness.set_env("STRIDE_TEAM_ID", team_id);
        harness.set_env("STRIDE_USER_ID", user_id);
        harness
    }

    pub fn set_env(&mut self, key: &str, value: &str) {
        self.envs.push((key.to_string(), value.to_string()));
    }

    pub fn set_database_path(&mut self, path: &Path) {
        self.db_path = path.to_path_buf();
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("stride").expect("Failed to find stride binary");
        cmd.current_dir(self.temp_dir.path())
            .env("STRIDE_CONFIG", self.temp_dir.path().join("absent.toml"))
            .env("STRIDE_DATABASE_PATH", &self.db_path)
            .env("STRIDE_TIMEZONE", "UTC")
            .env_remove("STRIDE_LOG");
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Adds a task and returns the short id printed for it
    pub fn add_task(&self, args: &[&str]) -> String {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        let output = self.run_success(&full).get_output().stdout.clone();
        extract_task_id(&String::from_utf8_lossy(&output)).expect("no task id in add output")
    }
}

/// Removes ANSI colour sequences
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

pub fn extract_task_id(stdout: &str) -> Option<String> {
    strip_ansi(stdout)
        .lines()
        .find_map(|line| line.split("Task ID: ").nth(1))
        .map(|id| id.trim().to_string())
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output indicates successful task creation
    pub fn task_created_successfully() -> impl Predicate<str> {
        predicate::str::contains("Created task")
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
