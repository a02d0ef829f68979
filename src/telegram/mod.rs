pub mod client;

pub use client::TelegramClient;

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::Result;

/// Destination for chat notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Sends every message to one fixed chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: TelegramClient,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient, chat_id: String) -> Self {
        Self { client, chat_id }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        info!("Sending message \"{}\" to chat {}", text, self.chat_id);
        self.client.send_message(&self.chat_id, text).await?;
        info!("Message \"{}\" sent to chat {}", text, self.chat_id);
        Ok(())
    }
}

/// Deliver `text`, logging and swallowing any failure. Never retried.
pub async fn notify(notifier: &dyn Notifier, text: &str) {
    if let Err(e) = notifier.send(text).await {
        error!("Failed to send Telegram message: {}", e);
    }
}
