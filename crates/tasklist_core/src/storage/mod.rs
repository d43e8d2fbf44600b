use crate::error::AppError;
use crate::model::Task;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

pub mod json_store;

pub use json_store::FileStore;

/// Key under which the full task list is stored.
pub const TASKS_KEY: &str = "tasks";
pub const SCHEMA_VERSION: u32 = 1;

const APP_DIR_NAME: &str = "tasklist";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}

/// In-process store; nothing survives the value being dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredTasks {
    schema_version: u32,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct StoredTasksRef<'a> {
    schema_version: u32,
    tasks: &'a [Task],
}

pub fn encode_tasks(tasks: &[Task]) -> Result<String, AppError> {
    let stored = StoredTasksRef {
        schema_version: SCHEMA_VERSION,
        tasks,
    };
    serde_json::to_string(&stored).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn decode_tasks(content: &str) -> Result<Vec<Task>, AppError> {
    let stored: StoredTasks =
        serde_json::from_str(content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if stored.schema_version != SCHEMA_VERSION {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    let mut seen = HashSet::new();
    for task in &stored.tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(AppError::invalid_data(format!(
                "duplicate task id {}",
                task.id
            )));
        }
    }

    Ok(stored.tasks)
}

/// Reads the task list; an absent key is an empty list.
pub fn load_tasks<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<Task>, AppError> {
    match store.get(TASKS_KEY)? {
        Some(content) => decode_tasks(&content),
        None => Ok(Vec::new()),
    }
}

pub fn save_tasks<S: KeyValueStore + ?Sized>(store: &S, tasks: &[Task]) -> Result<(), AppError> {
    let content = encode_tasks(tasks)?;
    store.set(TASKS_KEY, &content)
}

/// Per-user data file location, overridable through `env_var`.
pub(crate) fn data_path(env_var: &str, file_name: &str) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(env_var)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME).join(file_name))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join(APP_DIR_NAME)
            .join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        KeyValueStore, MemoryStore, SCHEMA_VERSION, TASKS_KEY, decode_tasks, load_tasks,
        save_tasks,
    };
    use crate::model::{Priority, ReminderHandle, Task};

    fn sample_task() -> Task {
        Task {
            id: "task-1".to_string(),
            text: "demo".to_string(),
            priority: Priority::Medium,
            completed: false,
            reminder_seconds: 60,
            reminder_handle: Some(ReminderHandle::new("rem-1")),
        }
    }

    #[test]
    fn absent_key_loads_empty_list() {
        let store = MemoryStore::new();
        assert!(load_tasks(&store).unwrap().is_empty());
    }

    #[test]
    fn save_overwrites_previous_list() {
        let store = MemoryStore::new();
        save_tasks(&store, &[sample_task()]).unwrap();
        save_tasks(&store, &[]).unwrap();

        assert!(load_tasks(&store).unwrap().is_empty());
    }

    #[test]
    fn saved_list_is_readable_back() {
        let store = MemoryStore::new();
        let task = sample_task();
        save_tasks(&store, std::slice::from_ref(&task)).unwrap();

        let raw = store.get(TASKS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"reminder_handle\":\"rem-1\""));
        assert_eq!(load_tasks(&store).unwrap(), vec![task]);
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let content = format!(
            "{{\"schema_version\": {}, \"tasks\": []}}",
            SCHEMA_VERSION + 1
        );
        let err = decode_tasks(&content).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let content = "{\"schema_version\": 1, \"tasks\": [\
            {\"id\": \"task-1\", \"text\": \"a\", \"priority\": \"low\"},\
            {\"id\": \"task-1\", \"text\": \"b\", \"priority\": \"high\"}]}";
        let err = decode_tasks(content).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn rejects_malformed_json() {
        let err = decode_tasks("{ not json").unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }
}
