mod task;

pub use task::{
    DEFAULT_REMINDER_SECONDS, Priority, PriorityFilter, ReminderHandle, SortKey, Task,
};
