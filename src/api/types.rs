//! API request/response types

use serde::{Deserialize, Serialize};

use crate::recognition::Prediction;

// ============================================================================
// Prediction Types
// ============================================================================

/// One frame of pre-normalized landmarks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub landmarks: Vec<f32>,
}

/// `label` is null when nothing was emitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub label: Option<String>,
    pub confidence: f32,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            label: prediction.label,
            confidence: prediction.confidence,
        }
    }
}

/// Session reset acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub status: &'static str,
}

// ============================================================================
// Status Types
// ============================================================================

/// Server status response
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    /// Word vocabulary size
    pub labels: usize,
    /// Letter vocabulary size, absent when letters are disabled
    pub letter_labels: Option<usize>,
    pub buffered_frames: Option<usize>,
}

// ============================================================================
// Error Types
// ============================================================================

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    pub code: u16,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            error: "Not Found".to_string(),
            message: message.into(),
            code: 404,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: "Internal Server Error".to_string(),
            message: message.into(),
            code: 500,
        }
    }
}
