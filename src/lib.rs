pub mod config;
pub mod error;
pub mod homework;
pub mod logging;
pub mod poller;
pub mod telegram;

pub use error::{NotifierError, Result, SchemaError};
