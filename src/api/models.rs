use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CloneRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
}
