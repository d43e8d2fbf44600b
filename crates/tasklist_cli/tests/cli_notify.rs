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

fn run(store_path: &PathBuf, reminder_path: &PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tasklist"))
        .args(args)
        .env("TASKLIST_STORE_PATH", store_path)
        .env("TASKLIST_REMINDER_PATH", reminder_path)
        .env("TASKLIST_CONFIG_PATH", temp_path("no-config.json"))
        .env("TASKLIST_DISABLE_NOTIFICATIONS", "1")
        .output()
        .expect("failed to run tasklist")
}

#[test]
fn notify_delivers_due_reminders_once() {
    let store_path = temp_path("cli-notify.json");
    let reminder_path = temp_path("cli-notify-reminders.json");

    let add_due = run(&store_path, &reminder_path, &["add", "stretch", "--reminder", "0"]);
    let add_later = run(&store_path, &reminder_path, &["add", "later", "--reminder", "3600"]);
    let first = run(&store_path, &reminder_path, &["notify"]);
    let second = run(&store_path, &reminder_path, &["--json", "notify"]);

    std::fs::remove_file(&store_path).ok();
    std::fs::remove_file(&reminder_path).ok();

    assert!(add_due.status.success());
    assert!(add_later.status.success());
    assert!(first.status.success());
    let stdout = String::from_utf8_lossy(&first.stdout);
    assert!(stdout.contains("Notified: stretch"));
    assert!(!stdout.contains("later"));

    assert!(second.status.success());
    let delivered: serde_json::Value =
        serde_json::from_slice(&second.stdout).expect("json output");
    assert_eq!(delivered, serde_json::json!([]));
}

#[test]
fn notify_with_empty_spool_is_quiet() {
    let store_path = temp_path("cli-notify-empty.json");
    let reminder_path = temp_path("cli-notify-empty-reminders.json");
    let output = run(&store_path, &reminder_path, &["notify"]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}
