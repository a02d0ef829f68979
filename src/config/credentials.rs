use std::fmt;

use crate::error::{NotifierError, Result};

pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Secrets needed to talk to both APIs. Built once at startup and never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub practicum_token: String,
    pub telegram_token: String,
    pub chat_id: String,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`. Empty or whitespace-only values count
    /// as missing, and every missing name is reported in one error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let practicum_token = read(PRACTICUM_TOKEN_VAR);
        let telegram_token = read(TELEGRAM_TOKEN_VAR);
        let chat_id = read(TELEGRAM_CHAT_ID_VAR);

        match (practicum_token, telegram_token, chat_id) {
            (Some(practicum_token), Some(telegram_token), Some(chat_id)) => Ok(Self {
                practicum_token,
                telegram_token,
                chat_id,
            }),
            (p, t, c) => {
                let missing: Vec<&str> = [
                    (PRACTICUM_TOKEN_VAR, p.is_none()),
                    (TELEGRAM_TOKEN_VAR, t.is_none()),
                    (TELEGRAM_CHAT_ID_VAR, c.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();

                Err(NotifierError::Config(format!(
                    "Missing required environment variables: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}
