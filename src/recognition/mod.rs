//! Temporal gesture recognition
//!
//! Per-frame hand landmarks flow through:
//! normalizer → sliding sequence buffer → classifier → confidence gate →
//! majority smoother → emit-on-change session state.

mod buffer;
mod gate;
pub mod landmarks;
mod letters;
mod session;

pub use buffer::{SequenceBuffer, SequenceWindow};
pub use gate::{ConfidenceGate, MajoritySmoother, PredictionHistory};
pub use landmarks::{
    normalize_hands, FeatureVector, HandLandmark, HandObservation, Handedness, FEATURE_COUNT,
    HAND_FEATURES, LANDMARKS_PER_HAND,
};
pub use letters::LetterRecognizer;
pub use session::{Prediction, RecognitionSession, RecognizerConfig, SessionState};
