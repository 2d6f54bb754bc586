//! Confidence gate and temporal smoothing
//!
//! Two independent checks stand between a classifier output and an emitted word:
//! the top probability must clear a floor, and the same index must win a strict
//! majority of the last few qualifying windows.

use std::collections::VecDeque;

/// Rejects classifier outputs below a confidence floor
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceGate {
    threshold: f32,
}

impl ConfidenceGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Inclusive: a confidence equal to the threshold passes
    pub fn passes(&self, confidence: f32) -> bool {
        confidence >= self.threshold
    }
}

/// Most recent qualifying classifier indices, oldest evicted first
#[derive(Debug, Clone)]
pub struct PredictionHistory {
    indices: VecDeque<usize>,
    capacity: usize,
}

impl PredictionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            indices: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, index: usize) {
        if self.indices.len() == self.capacity {
            self.indices.pop_front();
        }
        self.indices.push_back(index);
    }

    pub fn count(&self, index: usize) -> usize {
        self.indices.iter().filter(|i| **i == index).count()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }
}

/// Majority vote over a [`PredictionHistory`]
#[derive(Debug, Clone)]
pub struct MajoritySmoother {
    history: PredictionHistory,
}

impl MajoritySmoother {
    pub fn new(window: usize) -> Self {
        Self {
            history: PredictionHistory::new(window),
        }
    }

    /// Record a qualifying index and report whether it now holds the majority
    pub fn observe(&mut self, index: usize) -> bool {
        self.history.push(index);
        self.has_majority(index)
    }

    /// More than half of the window capacity (not of the entries seen so far)
    pub fn has_majority(&self, index: usize) -> bool {
        self.history.count(index) > self.history.capacity() / 2
    }

    pub fn history(&self) -> &PredictionHistory {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
