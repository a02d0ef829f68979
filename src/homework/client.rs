use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use super::HomeworkSource;
use crate::error::{NotifierError, Result, SchemaError};

#[derive(Clone)]
pub struct PracticumClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl PracticumClient {
    pub fn new(endpoint: String, token: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            token,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// GET the statuses changed since `from_date`. A zero cursor falls back to now.
    pub async fn get_statuses(&self, from_date: i64) -> Result<Value> {
        let timestamp = if from_date == 0 {
            chrono::Utc::now().timestamp()
        } else {
            from_date
        };

        info!("Requesting homework statuses since {}", timestamp);

        let resp = self
            .client
            .get(&self.endpoint)
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&[("from_date", timestamp)])
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(NotifierError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        debug!("Homework API answered with {} bytes", body.len());

        let value: Value = serde_json::from_str(&body).map_err(SchemaError::InvalidJson)?;
        Ok(value)
    }
}

#[async_trait]
impl HomeworkSource for PracticumClient {
    async fn fetch(&self, from_date: i64) -> Result<Value> {
        self.get_statuses(from_date).await
    }
}
