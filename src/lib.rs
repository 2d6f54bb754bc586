//! Sign Recognizer
//!
//! Turns a stream of per-frame hand landmarks into smoothed, confidence-gated
//! sign word predictions, and classifies single-frame letters.
//!
//! # Modules
//!
//! - [`recognition`]: normalizer, sequence buffer, gate, smoother and session
//! - [`ml`]: classifier trait, ONNX Runtime backend and label maps
//! - [`pipeline`]: background worker for live frame streams
//! - [`capture`]: recorded streams, gated sample recording and the dataset store
//! - [`api`]: HTTP endpoints
//! - [`settings`]: XML settings
//! - [`telemetry`]: logging

pub mod api;
pub mod capture;
pub mod cli;
pub mod ml;
pub mod pipeline;
pub mod recognition;
pub mod settings;
pub mod telemetry;

pub use ml::{ClassifierError, Distribution, GestureClassifier, GestureModel};
pub use recognition::{Prediction, RecognitionSession, RecognizerConfig};
pub use settings::RecognizerSettings;
