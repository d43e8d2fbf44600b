use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    EmptyText,
    NotFound(String),
    InvalidInput(String),
    InvalidData(String),
    Io(String),
    Notification(String),
}

impl AppError {
    pub fn not_found<M: Into<String>>(id: M) -> Self {
        Self::NotFound(id.into())
    }

    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn notification<M: Into<String>>(message: M) -> Self {
        Self::Notification(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyText => "empty_text",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
            Self::Notification(_) => "notification_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::EmptyText => "task text is required".to_string(),
            Self::NotFound(id) => format!("task {id} not found"),
            Self::InvalidInput(message) => message.clone(),
            Self::InvalidData(message) => message.clone(),
            Self::Io(message) => message.clone(),
            Self::Notification(message) => message.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}
