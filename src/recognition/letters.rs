//! Static letter recognition
//!
//! Letters are single-frame signs: one landmark vector in, one label out. No
//! window, no vote history, no session; the model sees a one-frame sequence.

use super::buffer::SequenceWindow;
use super::landmarks::FeatureVector;
use super::session::Prediction;
use super::gate::ConfidenceGate;
use crate::ml::{ClassifierError, GestureModel};

/// Stateless single-frame classifier
pub struct LetterRecognizer {
    model: GestureModel,
    feature_count: usize,
    gate: ConfidenceGate,
}

impl LetterRecognizer {
    pub fn new(model: GestureModel, feature_count: usize, confidence_threshold: f32) -> Self {
        Self {
            model,
            feature_count,
            gate: ConfidenceGate::new(confidence_threshold),
        }
    }

    /// Classify one frame. Malformed input yields `(None, 0.0)`.
    pub fn predict(&self, landmarks: &[f32]) -> Result<Prediction, ClassifierError> {
        let Some(features) = FeatureVector::from_flat(landmarks, self.feature_count) else {
            return Ok(Prediction::none(0.0));
        };

        let window = SequenceWindow::from_frames([&features]);
        let distribution = self.model.classifier.classify(&window)?;
        let (index, confidence) = distribution.top().ok_or(ClassifierError::EmptyOutput)?;

        if !self.gate.passes(confidence) {
            return Ok(Prediction::none(confidence));
        }

        let label = self
            .model
            .labels
            .get(index)
            .ok_or(ClassifierError::UnknownIndex(index))?;

        Ok(Prediction::emitted(label, confidence))
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn labels(&self) -> usize {
        self.model.labels.len()
    }
}
