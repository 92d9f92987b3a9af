// API request/response models (DTOs)

use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
}

/// Error body returned when a build fails end to end
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Query parameters for the materia endpoint
#[derive(Debug, Deserialize)]
pub struct MateriaQuery {
    /// Server name, e.g. "Aether". Required; extraction fails with a 400
    /// when absent.
    pub world: String,
}
