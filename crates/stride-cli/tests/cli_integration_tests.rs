//! Black-box CLI tests for stride
//!
//! Every test runs the real binary against its own temporary SQLite database.

use predicates::prelude::*;

mod helpers;
use helpers::{assertions, strip_ansi, CliTestHarness};

/// Test basic CLI help and version commands
#[test]
fn test_cli_help_and_version() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("Stride"))
        .stdout(predicate::str::contains("streak"));

    harness
        .run_success(&["--version"])
        .stdout(predicate::str::contains("stride"));

    harness
        .run_failure(&["invalid-command"])
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_add_and_list() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["add", "Buy milk", "--priority", "low"])
        .stdout(assertions::task_created_successfully());
    harness
        .run_success(&[
            "add",
            "Write report",
            "--due",
            "tomorrow",
            "--priority",
            "high",
            "--description",
            "Quarterly numbers",
            "--tag",
            "work",
        ])
        .stdout(assertions::task_created_successfully());

    harness
        .run_success(&["list"])
        .stdout(predicate::str::contains("Buy milk"))
        .stdout(predicate::str::contains("Write report"));

    harness
        .run_success(&["list", "--tag", "work"])
        .stdout(predicate::str::contains("Write report"))
        .stdout(predicate::str::contains("Buy milk").not());
}

#[test]
fn test_add_rejects_bad_input() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(&["add", "   "])
        .stderr(predicate::str::contains("Invalid input"));
    harness
        .run_failure(&["add", "Task", "--priority", "urgent"])
        .stderr(assertions::has_error());
    harness
        .run_failure(&["add", "Task", "--due", "invalid-date"])
        .stderr(assertions::has_error());

    harness
        .run_success(&["list"])
        .stdout(predicate::str::contains("No tasks found"));
}

#[test]
fn test_done_counts_toward_streak() {
    let harness = CliTestHarness::new();
    let id = harness.add_task(&["Stretch"]);

    harness.run_success(&["start", &id]).stdout(predicate::str::contains("Started"));
    harness
        .run_success(&["done", &id])
        .stdout(predicate::str::contains("Completed task"));
    harness
        .run_success(&["done", &id])
        .stdout(predicate::str::contains("already completed"));

    let output = harness.run_success(&["streak"]).get_output().stdout.clone();
    let text = strip_ansi(&String::from_utf8_lossy(&output));
    assert!(text.contains("Current streak: 1 days"), "{}", text);
    assert!(text.contains("Completion rate (last 14 days): 100%"), "{}", text);
}

#[test]
fn test_edit_and_delete() {
    let harness = CliTestHarness::new();
    let id = harness.add_task(&["Draft", "--tag", "old"]);

    harness
        .run_success(&["edit", &id, "--title", "Final", "--add-tag", "new", "--remove-tag", "old"])
        .stdout(predicate::str::contains("Updated task: 'Final'"));
    harness
        .run_success(&["list", "--tag", "new"])
        .stdout(predicate::str::contains("Final"));

    harness.run_success(&["edit", &id]).stdout(predicate::str::contains("Nothing to change"));

    harness
        .run_success(&["delete", &id, "--force"])
        .stdout(predicate::str::contains("Deleted task"));
    harness
        .run_failure(&["done", &id])
        .stderr(predicate::str::contains("No task found"));
}

#[test]
fn test_seed_streak_and_insights() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["seed", "--days", "21", "--seed", "7"])
        .stdout(predicate::str::contains("Seeded 21 days"));
    harness
        .run_success(&["streak"])
        .stdout(predicate::str::contains("Longest streak"));
    harness
        .run_success(&["insights"])
        .stdout(predicate::str::contains("Most productive day"));
}

#[test]
fn test_notify_dry_run() {
    let mut harness = CliTestHarness::new();
    harness.set_env("STRIDE_NOTIFICATIONS__ENABLED", "false");

    harness
        .run_success(&["notify", "--dry-run"])
        .stdout(predicate::str::contains("notifications are disabled"));
}

#[test]
fn test_team_workflow() {
    let mut harness = CliTestHarness::with_team("team-1", "ana");
    harness.set_env("STRIDE_TEAM_ROSTER__ANA", "Ana");
    harness.set_env("STRIDE_TEAM_ROSTER__BO", "Bo");

    harness
        .run_success(&["team", "add", "Design review", "--assignee", "bo"])
        .stdout(predicate::str::contains("Assigned to: Bo"));
    let output = harness
        .run_success(&["team", "add", "Ship release"])
        .get_output()
        .stdout
        .clone();
    let id = helpers::extract_task_id(&String::from_utf8_lossy(&output)).expect("task id");

    harness
        .run_success(&["team", "done", &id])
        .stdout(predicate::str::contains("Completed team task"));
    harness
        .run_success(&["team", "list"])
        .stdout(predicate::str::contains("Design review"))
        .stdout(predicate::str::contains("Bo"));
    harness
        .run_success(&["team", "stats"])
        .stdout(predicate::str::contains("50.0%"))
        .stdout(predicate::str::contains("Ana"));

    // Personal tasks are a separate collection.
    harness
        .run_success(&["list"])
        .stdout(predicate::str::contains("No tasks found"));
}

#[test]
fn test_team_requires_team_id() {
    let harness = CliTestHarness::new();
    harness
        .run_failure(&["team", "stats"])
        .stderr(predicate::str::contains("no team_id configured"));
}

#[test]
fn test_unusable_database_falls_back_to_offline() {
    let mut harness = CliTestHarness::new();
    let blocker = harness.temp_path().join("not-a-dir");
    std::fs::write(&blocker, "x").expect("write blocker file");
    harness.set_database_path(&blocker.join("stride.db"));

    harness
        .run_success(&["add", "Offline task"])
        .stdout(assertions::task_created_successfully())
        .stdout(predicate::str::contains("local-task-1"))
        .stderr(predicate::str::contains("Working offline"));
}
