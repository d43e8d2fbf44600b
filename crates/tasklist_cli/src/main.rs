use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tasklist_cli::cli::{Cli, Command};
use tasklist_cli::logging::init_logging;
use tasklist_core::TaskListController;
use tasklist_core::config::{self, Config, Theme};
use tasklist_core::error::AppError;
use tasklist_core::model::{Priority, Task};
use tasklist_core::notify::{Permission, SpoolScheduler, notifier_from_env, reminder_path};
use tasklist_core::storage::FileStore;
use time::OffsetDateTime;

type Controller = TaskListController<FileStore, SpoolScheduler>;

/// One controller for the lifetime of the process, so an interactive session
/// can undo a delete.
struct Session {
    controller: Controller,
    config: Config,
}

impl Session {
    fn open() -> Result<Self, AppError> {
        let loaded = config::load_config_with_fallback();
        if let Some(err) = loaded.error {
            eprintln!("WARN: config ignored: {}", err);
        }

        let store = FileStore::from_env()?;
        let scheduler = SpoolScheduler::new(reminder_path()?);
        let mut controller = TaskListController::open(store, scheduler);
        if controller.request_permission() == Permission::Denied {
            eprintln!("WARN: notifications are unavailable; reminders will not be shown");
        }
        controller.set_sort_key(loaded.config.sort);
        controller.set_filter(loaded.config.filter);
        log::debug!("session opened with {} tasks", controller.tasks().len());

        Ok(Self {
            controller,
            config: loaded.config,
        })
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Task")]
    text: String,
    #[tabled(rename = "Priority")]
    priority: Priority,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Reminder")]
    reminder: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            text: task.text.clone(),
            priority: task.priority,
            done: if task.completed { "yes" } else { "no" },
            reminder: reminder_label(task),
        }
    }
}

fn reminder_label(task: &Task) -> String {
    let delay = format_delay(task.reminder_seconds);
    if task.reminder_handle.is_some() {
        format!("{delay} (scheduled)")
    } else {
        delay
    }
}

fn format_delay(seconds: u64) -> String {
    match seconds {
        s if s >= 3600 && s % 3600 == 0 => format!("{}h", s / 3600),
        s if s >= 60 && s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{s}s"),
    }
}

fn print_tasks_plain(tasks: &[Task], footer: &str, theme: Theme) {
    if tasks.is_empty() {
        println!("{}", theme.muted("No tasks."));
        return;
    }

    let rows: Vec<TaskRow> = tasks.iter().map(TaskRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::psql());
    println!("{table}");
    println!("{}", theme.muted(footer));
}

fn print_tasks_json(tasks: &[Task]) -> Result<(), AppError> {
    let payload =
        serde_json::to_string(tasks).map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{payload}");
    Ok(())
}

fn print_task_json(task: &Task) -> Result<(), AppError> {
    let payload =
        serde_json::to_string(task).map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{payload}");
    Ok(())
}

fn print_task_details(task: &Task) {
    println!("ID:       {}", task.id);
    println!("Task:     {}", task.text);
    println!("Priority: {}", task.priority);
    println!("Done:     {}", if task.completed { "yes" } else { "no" });
    println!("Reminder: {}", reminder_label(task));
}

/// Keeps only clap's one-line summary, without its `error: ` prefix.
fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let summary = rendered.lines().next().map(str::trim).unwrap_or_default();
    let summary = summary.strip_prefix("error: ").unwrap_or(summary);
    if summary.is_empty() {
        AppError::invalid_input("invalid command")
    } else {
        AppError::invalid_input(summary)
    }
}

/// Splits a REPL line into arguments. Double quotes group words; inside
/// them `\"` and `\\` are escapes and any other backslash is literal.
fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|ch| ch.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            return Ok(args);
        }

        let mut arg = String::new();
        while let Some(ch) = chars.next_if(|ch| !ch.is_whitespace()) {
            if ch != '"' {
                arg.push(ch);
                continue;
            }
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next_if(|next| matches!(next, '"' | '\\')) {
                        Some(escaped) => arg.push(escaped),
                        None => arg.push('\\'),
                    },
                    Some(other) => arg.push(other),
                    None => return Err(AppError::invalid_input("unterminated quote in command")),
                }
            }
        }
        args.push(arg);
    }
}

fn print_help() {
    println!("{}", Cli::command().render_help());
}

/// Runs one parsed command. `interactive` is set inside the REPL, where the
/// session outlives the command.
fn run_command(session: &mut Session, cli: Cli, interactive: bool) -> Result<(), AppError> {
    let overrides = cli.overrides()?;
    let config = session.config.with_overrides(&overrides);
    let controller = &mut session.controller;

    match cli.command {
        Command::Add {
            text,
            priority,
            reminder,
        } => {
            let text = text.unwrap_or_default();
            let task = controller.create(
                &text,
                priority.unwrap_or(config.default_priority),
                reminder.unwrap_or(config.default_reminder_seconds),
            )?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Added task: {} ({})", task.text, task.id);
            }
        }
        Command::Edit {
            id,
            text,
            priority,
            reminder,
        } => {
            let current = controller.begin_edit(&id)?.clone();
            let result = controller.update(
                &id,
                &text,
                priority.unwrap_or(current.priority),
                reminder.unwrap_or(current.reminder_seconds),
            );
            if result.is_err() {
                controller.cancel_edit();
            }
            let task = result?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Updated task: {} ({})", task.text, task.id);
            }
        }
        Command::Toggle { id } => {
            let task = controller.toggle_complete(&id)?;
            if cli.json {
                print_task_json(&task)?;
            } else if task.completed {
                println!("Completed task: {} ({})", task.text, task.id);
            } else {
                println!("Reopened task: {} ({})", task.text, task.id);
            }
        }
        Command::Delete { id } => {
            let task = controller.delete(&id)?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Deleted task: {} ({})", task.text, task.id);
                if interactive && let Some(remaining) = controller.undo_remaining() {
                    println!(
                        "{}",
                        config.theme.accent(&format!(
                            "Type `undo` within {}s to restore it.",
                            remaining.as_secs_f32().ceil()
                        ))
                    );
                }
            }
        }
        Command::Undo => match controller.undo_delete() {
            Some(task) => {
                if cli.json {
                    print_task_json(&task)?;
                } else {
                    println!("Restored task: {} ({})", task.text, task.id);
                }
            }
            None => {
                if cli.json {
                    println!("null");
                } else {
                    println!("Nothing to undo.");
                }
            }
        },
        Command::Show { id } => {
            let task = controller
                .get(&id)
                .cloned()
                .ok_or_else(|| AppError::not_found(&id))?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                print_task_details(&task);
            }
        }
        Command::List { sort, filter } => {
            if let Some(sort) = sort.or(overrides.sort) {
                controller.set_sort_key(sort);
            }
            if let Some(filter) = filter.or(overrides.filter) {
                controller.set_filter(filter);
            }
            let tasks = controller.visible_tasks();
            if cli.json {
                print_tasks_json(&tasks)?;
            } else {
                let footer = format!(
                    "{} of {} tasks (sort: {}, filter: {})",
                    tasks.len(),
                    controller.tasks().len(),
                    controller.sort_key(),
                    controller.filter()
                );
                print_tasks_plain(&tasks, &footer, config.theme);
            }
        }
        Command::Notify => {
            let notifier = notifier_from_env()?;
            let outcome = controller
                .scheduler()
                .dispatch_due(OffsetDateTime::now_utc(), notifier.as_ref())?;
            if cli.json {
                let payload = serde_json::to_string(&outcome.delivered)
                    .map_err(|err| AppError::invalid_data(err.to_string()))?;
                println!("{payload}");
            } else {
                for reminder in &outcome.delivered {
                    println!("Notified: {}", reminder.body);
                }
            }
            for failure in &outcome.failures {
                eprintln!("ERROR: {} ({})", failure.error, failure.handle);
            }
        }
    }

    Ok(())
}

/// Turns one REPL line into a parsed command. `Ok(None)` means there is
/// nothing to run.
fn parse_line(line: &str) -> Result<Option<Cli>, AppError> {
    let args = split_command_line(line)?;
    if args.is_empty() {
        return Ok(None);
    }

    let argv = std::iter::once("tasklist".to_string()).chain(args);
    Cli::try_parse_from(argv)
        .map(Some)
        .map_err(normalize_parse_error)
}

fn run_interactive(session: &mut Session) -> Result<(), AppError> {
    for line in io::stdin().lock().lines() {
        let line = line.map_err(|err| AppError::io(err.to_string()))?;
        let line = line.trim();

        match line {
            "" => continue,
            "help" | "?" => {
                print_help();
                continue;
            }
            _ if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") => break,
            _ => {}
        }

        let outcome = parse_line(line).and_then(|cli| match cli {
            Some(cli) => run_command(session, cli, true),
            None => Ok(()),
        });
        if let Err(err) = outcome {
            eprintln!("ERROR: {err}");
        }
    }

    Ok(())
}

fn exit_with(err: AppError) -> ! {
    eprintln!("ERROR: {err}");
    std::process::exit(1);
}

fn main() {
    let _logger = match init_logging() {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("WARN: logging disabled: {}", err);
            None
        }
    };

    let mut args = std::env::args_os();
    args.next();
    let interactive = args.next().is_none();

    let cli = if interactive {
        None
    } else {
        match Cli::try_parse() {
            Ok(cli) => Some(cli),
            Err(err) if !err.use_stderr() => err.exit(),
            Err(err) => exit_with(normalize_parse_error(err)),
        }
    };

    let mut session = match Session::open() {
        Ok(session) => session,
        Err(err) => exit_with(err),
    };

    let result = match cli {
        Some(cli) => run_command(&mut session, cli, false),
        None => run_interactive(&mut session),
    };

    if let Err(err) = result {
        exit_with(err);
    }
}
