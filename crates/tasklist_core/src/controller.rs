use crate::error::AppError;
use crate::model::{Priority, PriorityFilter, ReminderHandle, SortKey, Task};
use crate::notify::{Permission, ReminderScheduler};
use crate::storage::{self, KeyValueStore};
use crate::view::derived_view;
use std::time::{Duration, Instant};
use time::OffsetDateTime;

/// How long a deleted task can be brought back with `undo_delete`.
pub const UNDO_WINDOW: Duration = Duration::from_secs(5);
pub const REMINDER_TITLE: &str = "Task reminder";

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct PendingDeletion {
    task: Task,
    deadline: Instant,
}

/// Owns the task list and mirrors every change to the store and the scheduler.
///
/// Storage and scheduler failures are logged and never undo the in-memory
/// change; only input validation and unknown ids are reported to the caller.
pub struct TaskListController<K, R, C = SystemClock> {
    store: K,
    scheduler: R,
    clock: C,
    tasks: Vec<Task>,
    editing: Option<String>,
    pending: Option<PendingDeletion>,
    sort_key: SortKey,
    filter: PriorityFilter,
    last_id: i128,
}

impl<K: KeyValueStore, R: ReminderScheduler> TaskListController<K, R, SystemClock> {
    /// Builds a controller on the system clock and loads the stored list.
    pub fn open(store: K, scheduler: R) -> Self {
        let mut controller = Self::new(store, scheduler, SystemClock);
        controller.load();
        controller
    }
}

impl<K: KeyValueStore, R: ReminderScheduler, C: Clock> TaskListController<K, R, C> {
    pub fn new(store: K, scheduler: R, clock: C) -> Self {
        Self {
            store,
            scheduler,
            clock,
            tasks: Vec::new(),
            editing: None,
            pending: None,
            sort_key: SortKey::default(),
            filter: PriorityFilter::default(),
            last_id: 0,
        }
    }

    /// Replaces the in-memory list with the stored one. Unreadable data is
    /// logged and treated as an empty list.
    pub fn load(&mut self) {
        self.tasks = match storage::load_tasks(&self.store) {
            Ok(tasks) => tasks,
            Err(err) => {
                log::error!("failed to load tasks: {err}");
                Vec::new()
            }
        };
        log::debug!("loaded {} tasks", self.tasks.len());
    }

    pub fn request_permission(&self) -> Permission {
        match self.scheduler.request_permission() {
            Ok(Permission::Granted) => Permission::Granted,
            Ok(Permission::Denied) => {
                log::warn!("notification permission denied; reminders will not be shown");
                Permission::Denied
            }
            Err(err) => {
                log::warn!("notification permission request failed: {err}");
                Permission::Denied
            }
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn scheduler(&self) -> &R {
        &self.scheduler
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) {
        self.sort_key = sort_key;
    }

    pub fn filter(&self) -> PriorityFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: PriorityFilter) {
        self.filter = filter;
    }

    /// The list as it should be displayed with the current sort key and filter.
    pub fn visible_tasks(&self) -> Vec<Task> {
        derived_view(&self.tasks, self.sort_key, self.filter)
    }

    pub fn create(
        &mut self,
        text: &str,
        priority: Priority,
        reminder_seconds: u64,
    ) -> Result<Task, AppError> {
        self.expire_pending();
        let text = validate_text(text)?;

        let mut task = Task {
            id: self.next_id(),
            text,
            priority,
            completed: false,
            reminder_seconds,
            reminder_handle: None,
        };

        match self
            .scheduler
            .schedule(REMINDER_TITLE, &task.text, reminder_seconds)
        {
            Ok(handle) => task.reminder_handle = Some(handle),
            Err(err) => log::warn!("failed to schedule reminder for {}: {err}", task.id),
        }

        log::debug!("created task {}", task.id);
        self.tasks.insert(0, task.clone());
        self.persist();
        Ok(task)
    }

    pub fn begin_edit(&mut self, id: &str) -> Result<&Task, AppError> {
        self.expire_pending();
        let index = self.index_of(id)?;
        self.editing = Some(id.to_string());
        Ok(&self.tasks[index])
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn editing(&self) -> Option<&Task> {
        self.editing.as_deref().and_then(|id| self.get(id))
    }

    /// Replaces text, priority and reminder delay. The scheduled reminder is
    /// left as it was, even when the delay changes.
    pub fn update(
        &mut self,
        id: &str,
        text: &str,
        priority: Priority,
        reminder_seconds: u64,
    ) -> Result<Task, AppError> {
        self.expire_pending();
        let text = validate_text(text)?;
        let index = self.index_of(id)?;

        let task = &mut self.tasks[index];
        task.text = text;
        task.priority = priority;
        task.reminder_seconds = reminder_seconds;
        let updated = task.clone();

        log::debug!("updated task {id}");
        self.persist();
        self.editing = None;
        Ok(updated)
    }

    /// Flips completion. Completing cancels the reminder; reopening does not
    /// schedule a new one.
    pub fn toggle_complete(&mut self, id: &str) -> Result<Task, AppError> {
        self.expire_pending();
        let index = self.index_of(id)?;

        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        if task.completed
            && let Some(handle) = task.reminder_handle.take()
        {
            cancel_reminder(&self.scheduler, &task.id, &handle);
        }
        let toggled = task.clone();

        log::debug!("task {id} completed={}", toggled.completed);
        self.persist();
        Ok(toggled)
    }

    /// Removes the task and holds it for `UNDO_WINDOW`. A task already being
    /// held is dropped for good.
    pub fn delete(&mut self, id: &str) -> Result<Task, AppError> {
        self.expire_pending();
        let index = self.index_of(id)?;

        let mut removed = self.tasks.remove(index);
        if let Some(handle) = removed.reminder_handle.take() {
            cancel_reminder(&self.scheduler, &removed.id, &handle);
        }
        if self.editing.as_deref() == Some(id) {
            self.editing = None;
        }

        log::debug!("deleted task {id}");
        self.persist();

        if let Some(previous) = self.pending.take() {
            log::debug!("discarding held task {}", previous.task.id);
        }
        self.pending = Some(PendingDeletion {
            task: removed.clone(),
            deadline: self.clock.now() + UNDO_WINDOW,
        });

        Ok(removed)
    }

    /// Puts the held task back at the front of the list. Returns `None` when
    /// nothing is held or the window has closed.
    pub fn undo_delete(&mut self) -> Option<Task> {
        self.expire_pending();
        let pending = self.pending.take()?;

        log::debug!("restored task {}", pending.task.id);
        self.tasks.insert(0, pending.task.clone());
        self.persist();
        Some(pending.task)
    }

    /// The task that `undo_delete` would restore right now.
    pub fn pending_deletion(&self) -> Option<&Task> {
        self.pending
            .as_ref()
            .filter(|pending| self.clock.now() < pending.deadline)
            .map(|pending| &pending.task)
    }

    /// Time left in the undo window, if a task is held.
    pub fn undo_remaining(&self) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|pending| pending.deadline.saturating_duration_since(self.clock.now()))
            .filter(|remaining| !remaining.is_zero())
    }

    pub fn expire_pending(&mut self) {
        let now = self.clock.now();
        if let Some(pending) = self.pending.as_ref()
            && now >= pending.deadline
        {
            log::debug!("undo window closed for task {}", pending.task.id);
            self.pending = None;
        }
    }

    fn persist(&self) {
        if let Err(err) = storage::save_tasks(&self.store, &self.tasks) {
            log::error!("failed to persist {} tasks: {err}", self.tasks.len());
        }
    }

    fn index_of(&self, id: &str) -> Result<usize, AppError> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(id))
    }

    fn next_id(&mut self) -> String {
        let mut value = OffsetDateTime::now_utc()
            .unix_timestamp_nanos()
            .max(self.last_id + 1);
        loop {
            let id = format!("task-{value}");
            if self.get(&id).is_none() {
                self.last_id = value;
                return id;
            }
            value += 1;
        }
    }
}

fn validate_text(text: &str) -> Result<String, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::EmptyText);
    }
    Ok(trimmed.to_string())
}

fn cancel_reminder<R: ReminderScheduler>(
    scheduler: &R,
    task_id: &str,
    handle: &ReminderHandle,
) {
    if let Err(err) = scheduler.cancel(handle) {
        log::warn!("failed to cancel reminder {handle} for {task_id}: {err}");
    }
}
