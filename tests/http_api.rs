//! HTTP routes against scripted classifiers

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{frame, model, BrokenClassifier, ScriptedClassifier};
use sign_recognizer::api::{create_router, AppState};
use sign_recognizer::ml::{GestureModel, LabelMap};
use sign_recognizer::recognition::{LetterRecognizer, RecognitionSession, RecognizerConfig};

fn word_session(classifier: Arc<dyn sign_recognizer::ml::GestureClassifier>) -> RecognitionSession {
    RecognitionSession::new(
        model(classifier),
        RecognizerConfig {
            sequence_length: 2,
            confidence_threshold: 0.8,
            ..RecognizerConfig::default()
        },
    )
}

fn letters() -> LetterRecognizer {
    let model = GestureModel::new(
        Arc::new(ScriptedClassifier::constant(vec![0.1, 0.9])),
        Arc::new(LabelMap::from_labels(["A", "B"])),
    );
    LetterRecognizer::new(model, 63, 0.5)
}

fn app(letters: Option<LetterRecognizer>) -> Router {
    let session = word_session(Arc::new(ScriptedClassifier::constant(vec![0.05, 0.05, 0.9])));
    create_router(AppState::new(session, letters).into_handle())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn predict_word(app: &Router, landmarks: Vec<f32>) -> Value {
    let (status, body) = send(app, "POST", "/predict-word", Some(json!({ "landmarks": landmarks }))).await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn test_predict_word_sequence() {
    let app = app(None);

    let first = predict_word(&app, frame(0.4)).await;
    assert_eq!(first, json!({ "label": null, "confidence": 0.0 }));

    // window full, one vote
    let second = predict_word(&app, frame(0.4)).await;
    assert!(second["label"].is_null());
    assert!((second["confidence"].as_f64().unwrap() - 0.9).abs() < 1e-6);

    let third = predict_word(&app, frame(0.4)).await;
    assert_eq!(third["label"], "YES");
}

#[tokio::test]
async fn test_malformed_landmarks_return_nothing() {
    let app = app(None);
    let body = predict_word(&app, vec![0.5; 7]).await;
    assert_eq!(body, json!({ "label": null, "confidence": 0.0 }));

    let body = predict_word(&app, Vec::new()).await;
    assert_eq!(body, json!({ "label": null, "confidence": 0.0 }));
}

#[tokio::test]
async fn test_invalid_body_is_rejected() {
    let app = app(None);
    let (status, _) = send(&app, "POST", "/predict-word", Some(json!({ "landmarks": "nope" }))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_reset_allows_repeat() {
    let app = app(None);
    for _ in 0..3 {
        predict_word(&app, frame(0.4)).await;
    }
    // repeat of the emitted word is suppressed
    predict_word(&app, frame(0.4)).await;
    let suppressed = predict_word(&app, frame(0.4)).await;
    assert!(suppressed["label"].is_null());

    let (status, body) = send(&app, "POST", "/predict-word/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let results = [
        predict_word(&app, frame(0.4)).await,
        predict_word(&app, frame(0.4)).await,
        predict_word(&app, frame(0.4)).await,
    ];
    assert_eq!(results[2]["label"], "YES");
}

#[tokio::test]
async fn test_letters_disabled() {
    let app = app(None);
    let (status, body) = send(&app, "POST", "/predict", Some(json!({ "landmarks": vec![0.4f32; 63] }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_letter_prediction() {
    let app = app(Some(letters()));
    let (status, body) = send(&app, "POST", "/predict", Some(json!({ "landmarks": vec![0.3f32; 63] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["label"], "B");

    // letters are stateless: the same frame predicts the same letter again
    let (_, body) = send(&app, "POST", "/predict", Some(json!({ "landmarks": vec![0.3f32; 63] }))).await;
    assert_eq!(body["label"], "B");
}

#[tokio::test]
async fn test_classifier_failure_is_500() {
    let session = word_session(Arc::new(BrokenClassifier));
    let app = create_router(AppState::new(session, None).into_handle());

    predict_word(&app, frame(0.4)).await;
    let (status, body) = send(&app, "POST", "/predict-word", Some(json!({ "landmarks": frame(0.4) }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], 500);
}

#[tokio::test]
async fn test_busy_session_drops_frame() {
    let session = word_session(Arc::new(ScriptedClassifier::constant(vec![0.05, 0.05, 0.9])));
    let state = AppState::new(session, None).into_handle();
    let app = create_router(state.clone());

    predict_word(&app, frame(0.4)).await;

    let guard = state.word_session.lock().await;
    let body = predict_word(&app, frame(0.4)).await;
    assert_eq!(body, json!({ "label": null, "confidence": 0.0 }));
    assert_eq!(guard.buffered_frames(), 1);
    drop(guard);

    // the dropped frame never reached the window
    let body = predict_word(&app, frame(0.4)).await;
    assert!(body["label"].is_null());
    assert!((body["confidence"].as_f64().unwrap() - 0.9).abs() < 1e-6);
}

#[tokio::test]
async fn test_status() {
    let app = app(Some(letters()));
    predict_word(&app, frame(0.4)).await;

    let (status, body) = send(&app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["labels"], 3);
    assert_eq!(body["letter_labels"], 2);
    assert_eq!(body["buffered_frames"], 1);
}
