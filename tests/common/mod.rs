//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sign_recognizer::ml::{ClassifierError, Distribution, GestureClassifier, GestureModel, LabelMap};
use sign_recognizer::recognition::SequenceWindow;

/// Classifier that plays back queued distributions, repeating the last one
pub struct ScriptedClassifier {
    outputs: Mutex<Vec<Vec<f32>>>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(outputs: Vec<Vec<f32>>) -> Self {
        Self {
            outputs: Mutex::new(outputs),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn constant(output: Vec<f32>) -> Self {
        Self::new(vec![output])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GestureClassifier for ScriptedClassifier {
    fn classify(&self, _window: &SequenceWindow) -> Result<Distribution, ClassifierError> {
        let outputs = self.outputs.lock();
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let output = outputs
            .get(call.min(outputs.len().saturating_sub(1)))
            .cloned()
            .ok_or(ClassifierError::EmptyOutput)?;
        Ok(Distribution::new(output))
    }
}

/// Classifier whose outputs never match the label map
pub struct BrokenClassifier;

impl GestureClassifier for BrokenClassifier {
    fn classify(&self, _window: &SequenceWindow) -> Result<Distribution, ClassifierError> {
        Err(ClassifierError::Runtime("session poisoned".to_string()))
    }
}

pub fn labels() -> Arc<LabelMap> {
    Arc::new(LabelMap::from_labels(["HELLO", "THANKS", "YES"]))
}

pub fn model(classifier: Arc<dyn GestureClassifier>) -> GestureModel {
    GestureModel::new(classifier, labels())
}

/// Dense pre-normalized frame of the standard two-hand width
pub fn frame(value: f32) -> Vec<f32> {
    vec![value; 126]
}
