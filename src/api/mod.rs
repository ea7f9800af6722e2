//! REST API module.
//!
//! Success bodies are the bare models; failures use the [`crate::errors::ErrorResponse`] envelope.

mod health;
mod minutes;

pub use health::*;
pub use minutes::*;

use chrono::{SecondsFormat, Utc};

/// Current UTC time as an ISO-8601 string with microsecond precision.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
