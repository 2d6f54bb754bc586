//! Per-client recognition session
//!
//! Owns everything that changes from frame to frame for one stream of frames:
//! the sequence buffer, the vote history and the last emitted word. Sessions are
//! never shared; a deployment serving several streams creates one per stream.

use serde::Serialize;

use super::buffer::SequenceBuffer;
use super::gate::{ConfidenceGate, MajoritySmoother};
use super::landmarks::{normalize_hands, FeatureVector, HandObservation};
use crate::ml::{ClassifierError, GestureModel};

/// Tuning for a word session
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizerConfig {
    /// Frames per classification window
    pub sequence_length: usize,
    /// Scalars per frame
    pub feature_count: usize,
    /// Minimum top probability for a window to count
    pub confidence_threshold: f32,
    /// Qualifying windows considered by the majority vote
    pub smoothing_window: usize,
    /// Frames with fewer populated components are skipped
    pub min_nonzero_features: usize,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            sequence_length: 20,
            feature_count: super::landmarks::FEATURE_COUNT,
            confidence_threshold: 0.85,
            smoothing_window: 3,
            min_nonzero_features: 20,
        }
    }
}

/// Result of feeding one frame: an emitted label or nothing, plus the top
/// confidence of the window that was classified (0.0 when nothing was classified)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Option<String>,
    pub confidence: f32,
}

impl Prediction {
    pub fn none(confidence: f32) -> Self {
        Self {
            label: None,
            confidence,
        }
    }

    pub fn emitted(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: Some(label.into()),
            confidence,
        }
    }

    pub fn is_emission(&self) -> bool {
        self.label.is_some()
    }
}

/// Last emitted label, used for emit-on-change
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    last_label: Option<String>,
}

impl SessionState {
    pub fn last_label(&self) -> Option<&str> {
        self.last_label.as_deref()
    }

    pub fn set_last_label(&mut self, label: impl Into<String>) {
        self.last_label = Some(label.into());
    }

    pub fn clear(&mut self) {
        self.last_label = None;
    }
}

/// Sliding-window word recognizer for one stream of frames
pub struct RecognitionSession {
    model: GestureModel,
    config: RecognizerConfig,
    buffer: SequenceBuffer,
    gate: ConfidenceGate,
    smoother: MajoritySmoother,
    state: SessionState,
}

impl RecognitionSession {
    pub fn new(model: GestureModel, config: RecognizerConfig) -> Self {
        Self {
            buffer: SequenceBuffer::new(config.sequence_length),
            gate: ConfidenceGate::new(config.confidence_threshold),
            smoother: MajoritySmoother::new(config.smoothing_window),
            state: SessionState::default(),
            model,
            config,
        }
    }

    /// Feed a pre-normalized flat landmark vector (one frame).
    ///
    /// Malformed or near-empty input is not an error; it is skipped and reported
    /// as `(None, 0.0)`.
    pub fn process_features(&mut self, landmarks: &[f32]) -> Result<Prediction, ClassifierError> {
        match FeatureVector::from_flat(landmarks, self.config.feature_count) {
            Some(features) => self.process(features),
            None => {
                tracing::trace!(len = landmarks.len(), "Skipping malformed landmark vector");
                Ok(Prediction::none(0.0))
            }
        }
    }

    /// Feed the raw hand detections of one frame
    pub fn process_hands(&mut self, hands: &[HandObservation]) -> Result<Prediction, ClassifierError> {
        match normalize_hands(hands) {
            Some(features) if features.len() == self.config.feature_count => self.process(features),
            Some(features) => {
                tracing::warn!(
                    len = features.len(),
                    expected = self.config.feature_count,
                    "Hand features do not match the configured feature count"
                );
                Ok(Prediction::none(0.0))
            }
            None => Ok(Prediction::none(0.0)),
        }
    }

    /// Feed one normalized frame
    pub fn process(&mut self, features: FeatureVector) -> Result<Prediction, ClassifierError> {
        if features.is_near_empty(self.config.min_nonzero_features) {
            return Ok(Prediction::none(0.0));
        }

        if !self.buffer.push(features) {
            return Ok(Prediction::none(0.0));
        }
        let Some(window) = self.buffer.window() else {
            return Ok(Prediction::none(0.0));
        };

        let distribution = self.model.classifier.classify(&window)?;
        let (index, confidence) = distribution.top().ok_or(ClassifierError::EmptyOutput)?;

        if !self.gate.passes(confidence) {
            return Ok(Prediction::none(confidence));
        }

        if !self.smoother.observe(index) {
            return Ok(Prediction::none(confidence));
        }

        let label = self
            .model
            .labels
            .get(index)
            .ok_or(ClassifierError::UnknownIndex(index))?;

        if self.state.last_label() == Some(label) {
            return Ok(Prediction::none(confidence));
        }

        self.state.set_last_label(label);
        self.buffer.clear();

        tracing::debug!(label, confidence, "Word emitted");

        Ok(Prediction::emitted(label, confidence))
    }

    /// Start over: empty window, no votes, no remembered word
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.smoother.reset();
        self.state.clear();
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn buffered_frames(&self) -> usize {
        self.buffer.len()
    }

    pub fn last_label(&self) -> Option<&str> {
        self.state.last_label()
    }

    pub fn model(&self) -> &GestureModel {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::ml::{Distribution, GestureClassifier, LabelMap};
    use crate::recognition::landmarks::tests::hand;
    use crate::recognition::landmarks::Handedness;
    use crate::recognition::SequenceWindow;

    /// Plays back a fixed list of distributions, repeating the last one
    struct Scripted {
        outputs: Mutex<Vec<Vec<f32>>>,
        calls: Mutex<usize>,
    }

    impl Scripted {
        fn new(outputs: Vec<Vec<f32>>) -> Self {
            Self {
                outputs: Mutex::new(outputs),
                calls: Mutex::new(0),
            }
        }
    }

    impl GestureClassifier for Scripted {
        fn classify(&self, _window: &SequenceWindow) -> Result<Distribution, ClassifierError> {
            let mut calls = self.calls.lock();
            let outputs = self.outputs.lock();
            let i = (*calls).min(outputs.len() - 1);
            *calls += 1;
            Ok(Distribution::new(outputs[i].clone()))
        }
    }

    fn session(outputs: Vec<Vec<f32>>, sequence_length: usize) -> RecognitionSession {
        let labels = LabelMap::from_labels(["HELLO", "NO", "YES"]);
        let model = GestureModel::new(Arc::new(Scripted::new(outputs)), Arc::new(labels));
        RecognitionSession::new(
            model,
            RecognizerConfig {
                sequence_length,
                confidence_threshold: 0.8,
                ..RecognizerConfig::default()
            },
        )
    }

    fn frame() -> Vec<f32> {
        vec![0.5; 126]
    }

    #[test]
    fn test_nothing_until_window_full() {
        let mut s = session(vec![vec![0.0, 0.0, 1.0]], 3);
        assert_eq!(s.process_features(&frame()).unwrap(), Prediction::none(0.0));
        assert_eq!(s.process_features(&frame()).unwrap(), Prediction::none(0.0));
        assert_eq!(s.buffered_frames(), 2);
    }

    #[test]
    fn test_low_confidence_never_emits() {
        let mut s = session(vec![vec![0.25, 0.0, 0.75]], 1);
        for _ in 0..10 {
            let p = s.process_features(&frame()).unwrap();
            assert!(!p.is_emission());
            assert_eq!(p.confidence, 0.75);
        }
    }

    #[test]
    fn test_malformed_and_sparse_frames_are_skipped() {
        let mut s = session(vec![vec![0.0, 0.0, 1.0]], 1);
        assert_eq!(s.process_features(&[0.5; 10]).unwrap(), Prediction::none(0.0));

        let mut sparse = vec![0.0; 126];
        sparse[0] = 0.3;
        assert_eq!(s.process_features(&sparse).unwrap(), Prediction::none(0.0));
        assert_eq!(s.buffered_frames(), 0);
    }

    #[test]
    fn test_emit_once_then_suppress() {
        let mut s = session(vec![vec![0.05, 0.05, 0.9]], 1);

        assert_eq!(s.process_features(&frame()).unwrap(), Prediction::none(0.9));
        assert_eq!(s.process_features(&frame()).unwrap(), Prediction::emitted("YES", 0.9));
        assert_eq!(s.process_features(&frame()).unwrap(), Prediction::none(0.9));
        assert_eq!(s.last_label(), Some("YES"));
    }

    #[test]
    fn test_new_word_after_change() {
        let mut s = session(
            vec![
                vec![0.9, 0.05, 0.05],
                vec![0.9, 0.05, 0.05],
                vec![0.05, 0.9, 0.05],
                vec![0.05, 0.9, 0.05],
            ],
            1,
        );
        s.process_features(&frame()).unwrap();
        assert_eq!(s.process_features(&frame()).unwrap().label.as_deref(), Some("HELLO"));
        // history [0, 0, 1]: no majority for 1 yet
        assert!(!s.process_features(&frame()).unwrap().is_emission());
        assert_eq!(s.process_features(&frame()).unwrap().label.as_deref(), Some("NO"));
    }

    #[test]
    fn test_emission_clears_window() {
        let mut s = session(vec![vec![0.0, 0.0, 1.0]], 2);
        for _ in 0..3 {
            s.process_features(&frame()).unwrap();
        }
        assert_eq!(s.last_label(), Some("YES"));
        assert_eq!(s.buffered_frames(), 0);
    }

    #[test]
    fn test_reset_allows_same_word_again() {
        let mut s = session(vec![vec![0.0, 0.0, 1.0]], 1);
        s.process_features(&frame()).unwrap();
        assert!(s.process_features(&frame()).unwrap().is_emission());

        s.reset();
        assert_eq!(s.last_label(), None);
        s.process_features(&frame()).unwrap();
        assert_eq!(s.process_features(&frame()).unwrap().label.as_deref(), Some("YES"));
    }

    #[test]
    fn test_process_hands() {
        let mut s = session(vec![vec![0.0, 0.0, 1.0]], 1);
        assert_eq!(s.process_hands(&[]).unwrap(), Prediction::none(0.0));

        let hands = [hand(Handedness::Right, 0.4), hand(Handedness::Left, 0.2)];
        assert_eq!(s.process_hands(&hands).unwrap(), Prediction::none(1.0));
        assert!(s.process_hands(&hands).unwrap().is_emission());
    }

    #[test]
    fn test_unknown_index_is_structural_error() {
        let mut s = session(vec![vec![0.0, 0.0, 0.0, 1.0]], 1);
        s.process_features(&frame()).unwrap();
        let err = s.process_features(&frame()).unwrap_err();
        assert!(matches!(err, ClassifierError::UnknownIndex(3)));
    }
}
