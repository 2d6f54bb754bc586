//! ONNX Runtime sequence classifier

use std::path::{Path, PathBuf};

use ndarray::{ArrayD, IxDyn};
use ort::value::ValueType;
use parking_lot::Mutex;

use super::{ClassifierError, Distribution, GestureClassifier, LabelMap};
use crate::recognition::SequenceWindow;

/// Sequence classifier backed by an ONNX Runtime session.
///
/// Input is `(1, sequence_length, feature_count)` float32. Single-frame models
/// may instead declare a rank-2 `(1, feature_count)` input. The first output is
/// read as the class probability vector.
pub struct OnnxClassifier {
    session: Mutex<ort::session::Session>,
    sequence_length: usize,
    feature_count: usize,
    input_shape: Vec<usize>,
    path: PathBuf,
}

/// Batch-of-one input shape for a model whose first input has `rank` dimensions
fn input_shape(rank: usize, sequence_length: usize, feature_count: usize) -> Option<Vec<usize>> {
    match rank {
        3 => Some(vec![1, sequence_length, feature_count]),
        2 if sequence_length == 1 => Some(vec![1, feature_count]),
        _ => None,
    }
}

impl OnnxClassifier {
    /// Load the model and probe it once with a zero window.
    ///
    /// The probe catches models whose output size does not match the label map
    /// before any prediction is served.
    pub fn load(
        path: &Path,
        sequence_length: usize,
        feature_count: usize,
        labels: &LabelMap,
    ) -> Result<Self, ClassifierError> {
        if !path.exists() {
            return Err(ClassifierError::ModelNotFound(path.to_path_buf()));
        }

        let session = ort::session::Session::builder()
            .map_err(|e| load_error(path, e))?
            .with_intra_threads(2)
            .map_err(|e| load_error(path, e))?
            .commit_from_file(path)
            .map_err(|e| load_error(path, e))?;

        // Undeclared input types are treated as sequence models
        let rank = match session.inputs.first().map(|input| &input.input_type) {
            Some(ValueType::Tensor { shape, .. }) => shape.len(),
            _ => 3,
        };
        let input_shape = input_shape(rank, sequence_length, feature_count).ok_or_else(|| {
            load_error(
                path,
                format!(
                    "model input has rank {}, expected 3 (or 2 for single-frame models, got {} frames)",
                    rank, sequence_length
                ),
            )
        })?;

        let classifier = Self {
            session: Mutex::new(session),
            sequence_length,
            feature_count,
            input_shape,
            path: path.to_path_buf(),
        };

        let probe = classifier.classify(&SequenceWindow::zeros(sequence_length, feature_count))?;
        if probe.len() != labels.len() {
            return Err(ClassifierError::OutputMismatch {
                outputs: probe.len(),
                labels: labels.len(),
            });
        }

        tracing::debug!(path = %classifier.path.display(), outputs = probe.len(), "ONNX model probed");

        Ok(classifier)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_error(path: &Path, e: impl std::fmt::Display) -> ClassifierError {
    ClassifierError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

impl GestureClassifier for OnnxClassifier {
    fn classify(&self, window: &SequenceWindow) -> Result<Distribution, ClassifierError> {
        if window.len() != self.sequence_length || window.feature_count() != self.feature_count {
            return Err(ClassifierError::Shape {
                expected_frames: self.sequence_length,
                expected_features: self.feature_count,
                frames: window.len(),
                features: window.feature_count(),
            });
        }

        let input = ArrayD::from_shape_vec(IxDyn(&self.input_shape), window.as_flat().to_vec())
            .map_err(|e| ClassifierError::Runtime(format!("Failed to create input array: {}", e)))?;

        let input_tensor = ort::value::Tensor::from_array(input)
            .map_err(|e| ClassifierError::Runtime(format!("Failed to create tensor: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ClassifierError::Runtime(e.to_string()))?;

        let output = outputs.iter().next().ok_or(ClassifierError::EmptyOutput)?;

        let (_shape, data) = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Runtime(format!("Failed to extract output: {}", e)))?;

        if data.is_empty() {
            return Err(ClassifierError::EmptyOutput);
        }

        Ok(Distribution::new(data.to_vec()))
    }
}
