//! Sliding sequence buffer
//!
//! Keeps the most recent `capacity` feature vectors in chronological order.
//! Once full it stays ready every frame; the oldest frame is evicted on push.

use std::collections::VecDeque;

use super::landmarks::FeatureVector;

/// Rolling window of per-frame feature vectors
#[derive(Debug, Clone)]
pub struct SequenceBuffer {
    frames: VecDeque<FeatureVector>,
    capacity: usize,
}

impl SequenceBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a frame, evicting the oldest one past capacity.
    ///
    /// Returns whether the buffer now holds a full window.
    pub fn push(&mut self, features: FeatureVector) -> bool {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(features);
        self.is_ready()
    }

    pub fn is_ready(&self) -> bool {
        self.frames.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames oldest first
    pub fn iter(&self) -> impl Iterator<Item = &FeatureVector> {
        self.frames.iter()
    }

    /// Copy out the current window, or `None` until the buffer is full
    pub fn window(&self) -> Option<SequenceWindow> {
        if !self.is_ready() {
            return None;
        }
        Some(SequenceWindow::from_frames(self.frames.iter()))
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

/// A full run of frames ready for the classifier, stored row-major
/// as `[frame0.f0, frame0.f1, ..., frameN.fM]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceWindow {
    data: Vec<f32>,
    length: usize,
    feature_count: usize,
}

impl SequenceWindow {
    /// Flatten frames in order. All frames must share one length.
    pub fn from_frames<'a>(frames: impl IntoIterator<Item = &'a FeatureVector>) -> Self {
        let mut data = Vec::new();
        let mut length = 0;
        let mut feature_count = 0;
        for frame in frames {
            feature_count = frame.len();
            data.extend_from_slice(frame.as_slice());
            length += 1;
        }
        Self {
            data,
            length,
            feature_count,
        }
    }

    /// Zero window used to probe a model's output size
    pub fn zeros(length: usize, feature_count: usize) -> Self {
        Self {
            data: vec![0.0; length * feature_count],
            length,
            feature_count,
        }
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn as_flat(&self) -> &[f32] {
        &self.data
    }
}
