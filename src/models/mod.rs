//! Data models for the meeting minutes API.
//!
//! Field names are snake_case on the wire.

mod health;
mod minutes;
mod request;

pub use health::*;
pub use minutes::*;
pub use request::*;
