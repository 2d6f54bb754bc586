//! API route definitions

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};

use super::state::AppStateHandle;
use super::types::*;
use crate::ml::ClassifierError;
use crate::recognition::Prediction;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Create the API router with all endpoints
pub fn create_router(state: AppStateHandle) -> Router {
    Router::new()
        // Prediction endpoints
        .route("/predict", post(predict_letter))
        .route("/predict-word", post(predict_word))
        .route("/predict-word/reset", post(reset_word_session))
        // Status
        .route("/api/status", get(status_handler))
        .with_state(state)
}

fn internal_error(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiError::internal(message)))
}

fn classifier_failure(e: ClassifierError) -> (StatusCode, Json<ApiError>) {
    tracing::error!("Classification failed: {}", e);
    internal_error(e.to_string())
}

// ============================================================================
// Prediction Handlers
// ============================================================================

async fn predict_letter(State(state): State<AppStateHandle>, Json(req): Json<PredictRequest>) -> ApiResult<PredictResponse> {
    let Some(letters) = state.letters.clone() else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found("No letter model is configured")),
        ));
    };

    let prediction = tokio::task::spawn_blocking(move || letters.predict(&req.landmarks))
        .await
        .map_err(|e| internal_error(format!("Letter task failed: {}", e)))?
        .map_err(classifier_failure)?;

    Ok(Json(prediction.into()))
}

async fn predict_word(State(state): State<AppStateHandle>, Json(req): Json<PredictRequest>) -> ApiResult<PredictResponse> {
    // Frames arriving while the previous one is still classified are dropped
    let Ok(mut session) = state.word_session.clone().try_lock_owned() else {
        tracing::debug!("Word session busy, frame dropped");
        return Ok(Json(Prediction::none(0.0).into()));
    };

    let prediction = tokio::task::spawn_blocking(move || session.process_features(&req.landmarks))
        .await
        .map_err(|e| internal_error(format!("Recognition task failed: {}", e)))?
        .map_err(classifier_failure)?;

    if let Some(ref label) = prediction.label {
        tracing::info!(label = %label, confidence = prediction.confidence, "Word recognized");
    }

    Ok(Json(prediction.into()))
}

async fn reset_word_session(State(state): State<AppStateHandle>) -> Json<ResetResponse> {
    state.word_session.lock().await.reset();
    tracing::info!("Word session reset");
    Json(ResetResponse { status: "ok" })
}

// ============================================================================
// Status Handlers
// ============================================================================

async fn status_handler(State(state): State<AppStateHandle>) -> Json<StatusResponse> {
    let buffered_frames = state
        .word_session
        .try_lock()
        .ok()
        .map(|session| session.buffered_frames());

    Json(StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        labels: state.word_labels,
        letter_labels: state.letters.as_ref().map(|l| l.labels()),
        buffered_frames,
    })
}
