//! Request body for minutes generation.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Fewest characters of notes worth sending to the model.
pub const MIN_NOTES_LENGTH: usize = 50;

/// Raw meeting notes sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingNotesRequest {
    /// Raw meeting notes or transcript to process
    pub raw_notes: String,
    /// Language of the notes as an ISO code (en, fr, zh, ...)
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl MeetingNotesRequest {
    /// Length of the notes in characters, not bytes.
    pub fn notes_length(&self) -> usize {
        self.raw_notes.chars().count()
    }

    /// Check the notes length against the accepted bounds.
    pub fn validate(&self, max_length: usize) -> Result<(), AppError> {
        let length = self.notes_length();
        if length < MIN_NOTES_LENGTH {
            return Err(AppError::Validation(format!(
                "raw_notes must be at least {} characters (got {})",
                MIN_NOTES_LENGTH, length
            )));
        }
        if length > max_length {
            return Err(AppError::Validation(format!(
                "raw_notes must be at most {} characters (got {})",
                max_length, length
            )));
        }
        Ok(())
    }
}
