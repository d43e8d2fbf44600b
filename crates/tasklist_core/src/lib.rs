pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod notify;
pub mod storage;
pub mod view;

pub use controller::{Clock, SystemClock, TaskListController, UNDO_WINDOW};

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::model::{Priority, Task};

    #[test]
    fn task_has_required_fields() {
        let task = Task {
            id: "task-1".to_string(),
            text: "demo".to_string(),
            priority: Priority::High,
            completed: false,
            reminder_seconds: 300,
            reminder_handle: None,
        };

        assert_eq!(task.id, "task-1");
        assert_eq!(task.text, "demo");
        assert_eq!(task.priority, Priority::High);
        assert!(!task.completed);
        assert_eq!(task.reminder_seconds, 300);
        assert_eq!(task.reminder_handle, None);
    }

    #[test]
    fn app_error_exposes_code() {
        assert_eq!(AppError::EmptyText.code(), "empty_text");
        assert_eq!(AppError::not_found("task-1").code(), "not_found");
        assert_eq!(
            AppError::not_found("task-1").to_string(),
            "not_found - task task-1 not found"
        );
        assert_eq!(AppError::invalid_input("bad").code(), "invalid_input");
        assert_eq!(AppError::notification("off").code(), "notification_error");
    }
}
