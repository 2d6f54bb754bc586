//! Gesture classification
//!
//! The sequence classifier is an opaque scoring function: it takes a full
//! [`SequenceWindow`] and returns one probability per known label. Models are
//! exported to ONNX by the training pipeline and run through ONNX Runtime.

mod labels;
mod onnx;

use std::path::PathBuf;
use std::sync::Arc;

pub use labels::{LabelMap, LabelMapError};
pub use onnx::OnnxClassifier;

use crate::recognition::SequenceWindow;

/// Classification errors
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Failed to load model {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("Inference failed: {0}")]
    Runtime(String),

    #[error("Window shape mismatch: expected {expected_frames}x{expected_features}, got {frames}x{features}")]
    Shape {
        expected_frames: usize,
        expected_features: usize,
        frames: usize,
        features: usize,
    },

    #[error("Model produces {outputs} scores but the label map has {labels} labels")]
    OutputMismatch { outputs: usize, labels: usize },

    #[error("Model returned an empty distribution")]
    EmptyOutput,

    #[error("No label for class index {0}")]
    UnknownIndex(usize),

    #[error(transparent)]
    Labels(#[from] LabelMapError),
}

/// Probability per label, indexed like the [`LabelMap`]
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution(Vec<f32>);

impl Distribution {
    pub fn new(probabilities: Vec<f32>) -> Self {
        Self(probabilities)
    }

    /// Highest-probability index and its probability. First index wins ties.
    pub fn top(&self) -> Option<(usize, f32)> {
        self.0
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((i, p)),
            })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Scores a full window against a fixed label vocabulary.
///
/// Implementations are shared between sessions and must synchronize internally.
pub trait GestureClassifier: Send + Sync {
    fn classify(&self, window: &SequenceWindow) -> Result<Distribution, ClassifierError>;
}

/// A loaded classifier together with the labels its outputs decode to
#[derive(Clone)]
pub struct GestureModel {
    pub classifier: Arc<dyn GestureClassifier>,
    pub labels: Arc<LabelMap>,
}

impl GestureModel {
    pub fn new(classifier: Arc<dyn GestureClassifier>, labels: Arc<LabelMap>) -> Self {
        Self { classifier, labels }
    }

    /// Load an ONNX model and its label map, failing on any mismatch between them
    pub fn load_onnx(
        model_path: &std::path::Path,
        label_map_path: &std::path::Path,
        sequence_length: usize,
        feature_count: usize,
    ) -> Result<Self, ClassifierError> {
        let labels = LabelMap::load_from_file(label_map_path)?;
        let classifier = OnnxClassifier::load(model_path, sequence_length, feature_count, &labels)?;

        tracing::info!(
            model = %model_path.display(),
            labels = labels.len(),
            sequence_length,
            feature_count,
            "Loaded gesture model"
        );

        Ok(Self::new(Arc::new(classifier), Arc::new(labels)))
    }
}

impl std::fmt::Debug for GestureModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureModel")
            .field("labels", &self.labels.len())
            .finish_non_exhaustive()
    }
}
