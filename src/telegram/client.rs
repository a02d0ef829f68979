use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::config::DEFAULT_TELEGRAM_API_BASE;
use crate::error::{NotifierError, Result};

// Telegram message length limit is 4096 chars
const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Deserialize)]
struct SendMessageResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    bot_token: String,
    api_base: String,
}

impl TelegramClient {
    pub fn new(bot_token: String) -> Self {
        Self::with_api_base(bot_token, DEFAULT_TELEGRAM_API_BASE.to_string())
    }

    pub fn with_api_base(bot_token: String, api_base: String) -> Self {
        Self {
            client: Client::new(),
            bot_token,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);

        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            let payload = json!({
                "chat_id": chat_id,
                "text": chunk,
            });

            let resp = self
                .client
                .post(&url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| NotifierError::Notification(e.without_url().to_string()))?;

            let status = resp.status();
            let body = resp
                .text()
                .await
                .map_err(|e| NotifierError::Notification(e.without_url().to_string()))?;

            if !status.is_success() {
                error!("Telegram sendMessage error: {}", body);
                return Err(NotifierError::Notification(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    body
                )));
            }

            match serde_json::from_str::<SendMessageResponse>(&body) {
                Ok(parsed) if !parsed.ok => {
                    return Err(NotifierError::Notification(
                        parsed.description.unwrap_or(body),
                    ));
                }
                Ok(_) => {}
                Err(e) => debug!("Unparseable sendMessage reply ({}): {}", e, body),
            }
        }
        Ok(())
    }
}

fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let text_chars: Vec<char> = text.chars().collect();
    if text_chars.is_empty() {
        return vec![String::new()];
    }

    text_chars
        .chunks(max_len)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
