use thiserror::Error;

/// Shape problems found in a homework API response.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("API returned {0} instead of an object")]
    NotAMapping(&'static str),

    #[error("Response has no \"{0}\" key")]
    MissingKey(&'static str),

    #[error("Response key \"{0}\" is not a list")]
    NotAList(&'static str),

    #[error("Homework list is empty")]
    EmptyList,

    #[error("Homework record has no \"{0}\" key")]
    MissingField(&'static str),

    #[error("Homework record field \"{0}\" is not a string")]
    InvalidField(&'static str),

    #[error("Response body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Homework API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Error {status} while requesting homework statuses")]
    HttpStatus { status: u16 },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Unknown homework status: {0}")]
    UnknownStatus(String),

    #[error("Telegram sendMessage failed: {0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl NotifierError {
    /// Errors the polling loop reports to the chat and then retries after sleeping.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NotifierError::Transport(_)
                | NotifierError::HttpStatus { .. }
                | NotifierError::Schema(_)
                | NotifierError::UnknownStatus(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NotifierError::Transport(_) => "transport",
            NotifierError::HttpStatus { .. } => "http_status",
            NotifierError::Schema(_) => "schema",
            NotifierError::UnknownStatus(_) => "unknown_status",
            NotifierError::Notification(_) => "notification",
            NotifierError::Config(_) => "config",
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            NotifierError::HttpStatus { status } => Some(*status),
            NotifierError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NotifierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message_contains_code() {
        let err = NotifierError::HttpStatus { status: 503 };
        assert!(err.to_string().contains("503"));
        assert_eq!(err.status_code(), Some(503));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_config_and_notification_are_not_recoverable() {
        assert!(!NotifierError::Config("missing".into()).is_recoverable());
        assert!(!NotifierError::Notification("boom".into()).is_recoverable());
        assert!(NotifierError::UnknownStatus("canceled".into()).is_recoverable());
    }

    #[test]
    fn test_schema_error_is_transparent() {
        let err: NotifierError = SchemaError::MissingKey("homeworks").into();
        assert_eq!(err.to_string(), "Response has no \"homeworks\" key");
    }
}
