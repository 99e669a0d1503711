//! Core types shared by the readers and the writer.
//!
//! - **Errors**: error taxonomy with thiserror derives
//! - **Config**: body limits and observability settings

mod config;
mod errors;

pub use config::{
    Config, ObservabilityConfig, ReadConfig, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_MAX_BODY_BYTES,
};
pub use errors::{Error, Result};
