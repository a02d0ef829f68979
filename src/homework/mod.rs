pub mod client;
pub mod status;

pub use client::PracticumClient;
pub use status::{check_response, current_date, parse_status, HomeworkRecord, HomeworkStatus};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Anything that can answer "what changed since `from_date`".
#[async_trait]
pub trait HomeworkSource: Send + Sync {
    async fn fetch(&self, from_date: i64) -> Result<Value>;
}
