//! Health check model.

use serde::{Deserialize, Serialize};

/// Response from the health check endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(version: &str, timestamp: String) -> Self {
        Self {
            status: "healthy".to_string(),
            version: version.to_string(),
            timestamp,
        }
    }
}
