use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tasklist-{nanos}-{file_name}"))
}

fn run(store_path: &PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tasklist"))
        .args(args)
        .env("TASKLIST_STORE_PATH", store_path)
        .env("TASKLIST_REMINDER_PATH", temp_path("list-reminders.json"))
        .env("TASKLIST_CONFIG_PATH", temp_path("no-config.json"))
        .env("TASKLIST_DISABLE_NOTIFICATIONS", "1")
        .output()
        .expect("failed to run tasklist")
}

fn seed_store(store_path: &PathBuf) {
    let tasks = serde_json::json!({
        "schema_version": 1,
        "tasks": [
            {"id": "task-5", "text": "alpha", "priority": "low", "completed": true, "reminder_seconds": 60},
            {"id": "task-4", "text": "bravo", "priority": "high", "completed": false, "reminder_seconds": 600},
            {"id": "task-3", "text": "charlie", "priority": "medium", "completed": true, "reminder_seconds": 10},
            {"id": "task-2", "text": "delta", "priority": "high", "completed": true, "reminder_seconds": 60},
            {"id": "task-1", "text": "echo", "priority": "low", "completed": false, "reminder_seconds": 10}
        ]
    });
    let entries = serde_json::json!({ "tasks": tasks.to_string() });
    std::fs::write(store_path, entries.to_string()).unwrap();
}

fn listed_texts(output: &Output) -> Vec<String> {
    let tasks: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("json output");
    tasks
        .as_array()
        .expect("task array")
        .iter()
        .map(|task| task["text"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn list_keeps_stored_order_by_default() {
    let store_path = temp_path("cli-list-newest.json");
    seed_store(&store_path);
    let output = run(&store_path, &["--json", "list"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert_eq!(
        listed_texts(&output),
        vec!["alpha", "bravo", "charlie", "delta", "echo"]
    );
}

#[test]
fn list_sorts_by_priority_keeping_ties_stable() {
    let store_path = temp_path("cli-list-priority.json");
    seed_store(&store_path);
    let output = run(&store_path, &["--json", "list", "--sort", "priority"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert_eq!(
        listed_texts(&output),
        vec!["bravo", "delta", "charlie", "alpha", "echo"]
    );
}

#[test]
fn list_sorts_open_tasks_before_completed() {
    let store_path = temp_path("cli-list-completed.json");
    seed_store(&store_path);
    let output = run(&store_path, &["--json", "list", "--sort", "completed"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert_eq!(
        listed_texts(&output),
        vec!["bravo", "echo", "alpha", "charlie", "delta"]
    );
}

#[test]
fn list_filters_by_priority() {
    let store_path = temp_path("cli-list-filter.json");
    seed_store(&store_path);
    let output = run(
        &store_path,
        &["--json", "list", "--filter", "high", "--sort", "reminder"],
    );
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert_eq!(listed_texts(&output), vec!["delta", "bravo"]);
}

#[test]
fn list_plain_prints_table_and_footer() {
    let store_path = temp_path("cli-list-plain.json");
    seed_store(&store_path);
    let output = run(&store_path, &["list", "--filter", "low"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Priority"));
    assert!(stdout.contains("alpha"));
    assert!(stdout.contains("echo"));
    assert!(!stdout.contains("bravo"));
    assert!(stdout.contains("2 of 5 tasks"));
}

#[test]
fn list_with_no_store_prints_empty_message() {
    let store_path = temp_path("cli-list-empty.json");
    let output = run(&store_path, &["list"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No tasks."));
}

#[test]
fn list_with_corrupt_store_starts_empty() {
    let store_path = temp_path("cli-list-corrupt.json");
    std::fs::write(&store_path, "{\"tasks\": \"{ not json\"}").unwrap();
    let output = run(&store_path, &["--json", "list"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert!(listed_texts(&output).is_empty());
}
