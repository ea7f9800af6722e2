//! Minutes generation endpoint.

use std::time::Instant;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::instrument;
use uuid::Uuid;

use super::utc_timestamp;
use crate::errors::AppError;
use crate::models::{MeetingNotesRequest, MinutesWithMetadata};
use crate::AppState;

/// POST /generate-minutes - Convert raw meeting notes into structured minutes.
#[instrument(name = "generate_minutes", skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn generate_minutes(
    State(state): State<AppState>,
    payload: Result<Json<MeetingNotesRequest>, JsonRejection>,
) -> Result<Json<MinutesWithMetadata>, AppError> {
    let Json(request) = payload?;
    request.validate(state.config.max_input_length)?;

    let input_character_count = request.notes_length();
    tracing::info!(
        "Received meeting notes: {} chars, language: {}",
        input_character_count,
        request.language
    );

    let started = Instant::now();

    let minutes = state
        .minutes
        .generate_minutes(&request.raw_notes)
        .await
        .map_err(|e| {
            let err = AppError::from(e);
            match &err {
                AppError::InvalidAiResponse(msg) => tracing::error!("Processing error: {}", msg),
                other => tracing::error!("Unexpected error: {}", other),
            }
            err
        })?;

    let processing_time_ms = round_ms(started.elapsed().as_secs_f64() * 1000.0);
    tracing::info!("Minutes generated in {}ms", processing_time_ms);

    Ok(Json(MinutesWithMetadata {
        minutes,
        processing_time_ms,
        model_used: state.minutes.model_name().to_string(),
        input_character_count,
        generated_at: utc_timestamp(),
    }))
}

/// Round to two decimal places.
fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_ms() {
        assert_eq!(round_ms(12.3456), 12.35);
        assert_eq!(round_ms(0.0), 0.0);
    }
}
