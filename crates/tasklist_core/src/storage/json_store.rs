use crate::error::AppError;
use crate::storage::{KeyValueStore, data_path};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const STORE_FILE_NAME: &str = "store.json";
const STORE_ENV_VAR: &str = "TASKLIST_STORE_PATH";

pub fn store_path() -> Result<PathBuf, AppError> {
    data_path(STORE_ENV_VAR, STORE_FILE_NAME)
}

/// Key-value store kept as one JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::new(store_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, AppError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|err| AppError::io(err.to_string()))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|err| {
            AppError::invalid_data(format!("invalid JSON in {}: {}", self.path.display(), err))
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
        }

        let content = serde_json::to_string_pretty(entries)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        write_atomic(&self.path, content.as_bytes())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }
}

/// Writes through a sibling temp file so a crash never leaves a torn file.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<(), AppError> {
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp_path, permissions)
            .map_err(|err| AppError::io(err.to_string()))?;
    }

    std::fs::rename(&temp_path, path).map_err(|err| AppError::io(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::FileStore;
    use crate::model::{Priority, Task};
    use crate::storage::{KeyValueStore, TASKS_KEY, load_tasks, save_tasks};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("tasklist-{nanos}-{file_name}"))
    }

    #[test]
    fn missing_file_reads_as_absent() {
        let store = FileStore::new(temp_path("missing-store.json"));
        assert_eq!(store.get(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn set_then_get_returns_value() {
        let path = temp_path("kv-store.json");
        let store = FileStore::new(&path);
        store.set("alpha", "one").unwrap();
        store.set("beta", "two").unwrap();
        store.set("alpha", "three").unwrap();

        let reopened = FileStore::new(&path);
        let alpha = reopened.get("alpha").unwrap();
        let beta = reopened.get("beta").unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(alpha.as_deref(), Some("three"));
        assert_eq!(beta.as_deref(), Some("two"));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = temp_path("nested-dir");
        let path = dir.join("inner").join("store.json");
        let store = FileStore::new(&path);
        store.set("key", "value").unwrap();

        let exists = path.exists();
        fs::remove_dir_all(&dir).ok();

        assert!(exists);
    }

    #[test]
    fn task_list_survives_reopen() {
        let path = temp_path("tasks-store.json");
        let task = Task {
            id: "task-1".to_string(),
            text: "demo".to_string(),
            priority: Priority::Low,
            completed: true,
            reminder_seconds: 5,
            reminder_handle: None,
        };

        save_tasks(&FileStore::new(&path), std::slice::from_ref(&task)).unwrap();
        let loaded = load_tasks(&FileStore::new(&path)).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, vec![task]);
    }

    #[test]
    fn rejects_corrupt_file() {
        let path = temp_path("corrupt-store.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let err = FileStore::new(&path).get(TASKS_KEY).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[cfg(unix)]
    #[test]
    fn store_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_path("private-store.json");
        FileStore::new(&path).set("key", "value").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        fs::remove_file(&path).ok();

        assert_eq!(mode & 0o777, 0o600);
    }
}
