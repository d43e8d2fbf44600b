use crate::error::AppError;
use crate::notify::{APP_NAME, Notifier, Reminder};
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, reminder: &Reminder) -> Result<(), AppError> {
        Notification::new()
            .appname(APP_NAME)
            .summary(&reminder.title)
            .body(&reminder.body)
            .show()
            .map_err(|err| AppError::notification(err.to_string()))?;
        Ok(())
    }
}
