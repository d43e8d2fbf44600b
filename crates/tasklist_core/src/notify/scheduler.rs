use crate::error::AppError;
use crate::model::ReminderHandle;
use crate::notify::{Notifier, notifications_disabled, platform_notifier};
use crate::storage::data_path;
use crate::storage::json_store::write_atomic;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

const REMINDER_FILE_NAME: &str = "reminders.json";
const REMINDER_ENV_VAR: &str = "TASKLIST_REMINDER_PATH";

pub fn reminder_path() -> Result<PathBuf, AppError> {
    data_path(REMINDER_ENV_VAR, REMINDER_FILE_NAME)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Schedules one-shot reminders and cancels them by handle.
pub trait ReminderScheduler {
    fn request_permission(&self) -> Result<Permission, AppError>;

    fn schedule(
        &self,
        title: &str,
        body: &str,
        delay_seconds: u64,
    ) -> Result<ReminderHandle, AppError>;

    fn cancel(&self, handle: &ReminderHandle) -> Result<(), AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub handle: ReminderHandle,
    pub title: String,
    pub body: String,
    pub due_at: String,
}

impl Reminder {
    fn is_due(&self, now: OffsetDateTime) -> Result<bool, AppError> {
        let due_at = OffsetDateTime::parse(&self.due_at, &Rfc3339)
            .map_err(|_| AppError::invalid_data("due_at must be RFC3339"))?;
        Ok(due_at <= now)
    }
}

#[derive(Debug)]
pub struct DispatchOutcome {
    pub delivered: Vec<Reminder>,
    pub failures: Vec<NotificationFailure>,
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub handle: ReminderHandle,
    pub error: AppError,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Spool {
    #[serde(default)]
    reminders: Vec<Reminder>,
}

/// Hands out `rem-<unix nanos>` handles that never repeat within a process.
#[derive(Debug, Default)]
struct HandleSequence {
    last: Cell<i128>,
}

impl HandleSequence {
    fn next(&self) -> ReminderHandle {
        let now = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let value = now.max(self.last.get() + 1);
        self.last.set(value);
        ReminderHandle::new(format!("rem-{value}"))
    }
}

/// Pending reminders kept in a spool file until `dispatch_due` delivers them.
pub struct SpoolScheduler {
    path: PathBuf,
    handles: HandleSequence,
}

impl SpoolScheduler {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            handles: HandleSequence::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pending(&self) -> Result<Vec<Reminder>, AppError> {
        Ok(self.read_spool()?.reminders)
    }

    /// Delivers every reminder due at `now`. Failed deliveries stay queued;
    /// entries whose due time cannot be read are dropped.
    pub fn dispatch_due(
        &self,
        now: OffsetDateTime,
        notifier: &dyn Notifier,
    ) -> Result<DispatchOutcome, AppError> {
        let mut delivered = Vec::new();
        let mut failures = Vec::new();
        let mut dropped = Vec::new();

        for reminder in self.read_spool()?.reminders {
            match reminder.is_due(now) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    log::warn!("dropping reminder {}: {}", reminder.handle, err);
                    dropped.push(reminder.handle);
                    continue;
                }
            }

            match notifier.notify(&reminder) {
                Ok(()) => {
                    log::debug!("delivered reminder {}", reminder.handle);
                    delivered.push(reminder);
                }
                Err(err) => {
                    log::warn!("reminder {} not delivered: {}", reminder.handle, err);
                    failures.push(NotificationFailure {
                        handle: reminder.handle,
                        error: err,
                    });
                }
            }
        }

        let settled: Vec<&ReminderHandle> = delivered
            .iter()
            .map(|reminder| &reminder.handle)
            .chain(&dropped)
            .collect();
        self.remove(&settled)?;

        Ok(DispatchOutcome {
            delivered,
            failures,
        })
    }

    /// Removes `handles` from the spool as it is on disk now, so entries
    /// written by another process since the last read survive.
    fn remove(&self, handles: &[&ReminderHandle]) -> Result<(), AppError> {
        if handles.is_empty() {
            return Ok(());
        }

        let mut spool = self.read_spool()?;
        let before = spool.reminders.len();
        spool
            .reminders
            .retain(|reminder| !handles.contains(&&reminder.handle));
        if spool.reminders.len() != before {
            self.write_spool(&spool)?;
        }
        Ok(())
    }

    fn read_spool(&self) -> Result<Spool, AppError> {
        if !self.path.exists() {
            return Ok(Spool::default());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|err| AppError::io(err.to_string()))?;
        serde_json::from_str(&content).map_err(|err| {
            AppError::invalid_data(format!("invalid JSON in {}: {}", self.path.display(), err))
        })
    }

    fn write_spool(&self, spool: &Spool) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
        }
        let content = serde_json::to_string_pretty(spool)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        write_atomic(&self.path, content.as_bytes())
    }
}

impl ReminderScheduler for SpoolScheduler {
    fn request_permission(&self) -> Result<Permission, AppError> {
        if notifications_disabled() {
            return Ok(Permission::Denied);
        }
        Ok(match platform_notifier() {
            Ok(_) => Permission::Granted,
            Err(_) => Permission::Denied,
        })
    }

    fn schedule(
        &self,
        title: &str,
        body: &str,
        delay_seconds: u64,
    ) -> Result<ReminderHandle, AppError> {
        let delay = i64::try_from(delay_seconds)
            .map_err(|_| AppError::invalid_input("reminder delay is too large"))?;
        let due_at = OffsetDateTime::now_utc()
            .checked_add(Duration::seconds(delay))
            .ok_or_else(|| AppError::invalid_input("reminder delay is too large"))?
            .format(&Rfc3339)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;

        let handle = self.handles.next();
        let mut spool = self.read_spool()?;
        spool.reminders.push(Reminder {
            handle: handle.clone(),
            title: title.to_string(),
            body: body.to_string(),
            due_at,
        });
        self.write_spool(&spool)?;

        Ok(handle)
    }

    fn cancel(&self, handle: &ReminderHandle) -> Result<(), AppError> {
        // Unknown handles were already delivered.
        self.remove(&[handle])
    }
}
