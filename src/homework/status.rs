//! Validation of homework API answers and the status-to-text mapping.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{NotifierError, Result, SchemaError};

pub const HOMEWORKS_KEY: &str = "homeworks";
pub const CURRENT_DATE_KEY: &str = "current_date";
pub const NAME_KEY: &str = "homework_name";
pub const STATUS_KEY: &str = "status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    pub fn verdict(self) -> &'static str {
        match self {
            HomeworkStatus::Approved => {
                "Work has been reviewed: reviewer liked everything. Hooray!"
            }
            HomeworkStatus::Reviewing => "Work has been taken for review by the reviewer.",
            HomeworkStatus::Rejected => "Work has been reviewed: reviewer has comments.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HomeworkStatus::Approved => "approved",
            HomeworkStatus::Reviewing => "reviewing",
            HomeworkStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for HomeworkStatus {
    type Err = NotifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approved" => Ok(HomeworkStatus::Approved),
            "reviewing" => Ok(HomeworkStatus::Reviewing),
            "rejected" => Ok(HomeworkStatus::Rejected),
            other => Err(NotifierError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submission's entry, valid only for the cycle that decoded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeworkRecord {
    pub name: String,
    pub status: HomeworkStatus,
}

impl HomeworkRecord {
    pub fn from_value(homework: &Value) -> Result<Self> {
        let name = string_field(homework, NAME_KEY)?;
        let status = string_field(homework, STATUS_KEY)?;

        Ok(Self {
            name: name.to_string(),
            status: status.parse()?,
        })
    }

    pub fn message(&self) -> String {
        format!(
            "Changed review status of work \"{}\". {}",
            self.name,
            self.status.verdict()
        )
    }
}

fn string_field<'a>(homework: &'a Value, key: &'static str) -> Result<&'a str> {
    let value = homework
        .get(key)
        .ok_or(SchemaError::MissingField(key))?;
    value
        .as_str()
        .ok_or_else(|| SchemaError::InvalidField(key).into())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Check the answer's shape and return the newest homework entry.
pub fn check_response(response: &Value) -> Result<&Value> {
    let map = response
        .as_object()
        .ok_or(SchemaError::NotAMapping(type_name(response)))?;

    let homeworks = map
        .get(HOMEWORKS_KEY)
        .ok_or(SchemaError::MissingKey(HOMEWORKS_KEY))?
        .as_array()
        .ok_or(SchemaError::NotAList(HOMEWORKS_KEY))?;

    homeworks
        .first()
        .ok_or_else(|| SchemaError::EmptyList.into())
}

/// Turn one homework entry into the chat text for its status.
pub fn parse_status(homework: &Value) -> Result<String> {
    if homework.get(NAME_KEY).is_none() {
        return Err(SchemaError::MissingField(NAME_KEY).into());
    }
    if homework.get(STATUS_KEY).is_none() {
        return Err(SchemaError::MissingField(STATUS_KEY).into());
    }

    HomeworkRecord::from_value(homework).map(|record| record.message())
}

/// Server-provided cursor for the next poll, if present and integral.
pub fn current_date(response: &Value) -> Option<i64> {
    response.get(CURRENT_DATE_KEY).and_then(Value::as_i64)
}
