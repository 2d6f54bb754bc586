//! Landmark normalization
//!
//! Turns the hands detected in one frame into the fixed-length feature layout
//! the sequence models were trained on: left hand in the first slot, right hand
//! in the second, missing hands zero-filled.

use serde::{Deserialize, Serialize};

/// Keypoints tracked per hand
pub const LANDMARKS_PER_HAND: usize = 21;

/// Coordinates per keypoint (x, y, z)
pub const COORDS_PER_LANDMARK: usize = 3;

/// Scalars contributed by one hand
pub const HAND_FEATURES: usize = LANDMARKS_PER_HAND * COORDS_PER_LANDMARK;

/// Scalars in a two-hand feature vector
pub const FEATURE_COUNT: usize = 2 * HAND_FEATURES;

/// Hand landmark (normalized image coordinates, z relative to the wrist)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HandLandmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl HandLandmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Side label reported by the hand tracker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Slot this hand occupies in the feature vector
    fn slot(self) -> usize {
        match self {
            Handedness::Left => 0,
            Handedness::Right => 1,
        }
    }
}

/// One detected hand in a single frame
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    /// 21 landmarks in tracker order (wrist first)
    pub landmarks: [HandLandmark; LANDMARKS_PER_HAND],
    pub side: Handedness,
}

impl HandObservation {
    pub fn new(landmarks: [HandLandmark; LANDMARKS_PER_HAND], side: Handedness) -> Self {
        Self { landmarks, side }
    }

    fn extend_into(&self, out: &mut Vec<f32>) {
        for lm in &self.landmarks {
            out.extend_from_slice(&[lm.x, lm.y, lm.z]);
        }
    }
}

/// Fixed-length encoding of every tracked hand in one frame
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Encode the hands of one frame.
    ///
    /// Returns `None` when no hand was detected. With more than two detections only
    /// the first two are used; they are placed Left then Right whatever order the
    /// tracker reported them in.
    pub fn from_hands(hands: &[HandObservation]) -> Option<Self> {
        let mut values = Vec::with_capacity(FEATURE_COUNT);

        match hands {
            [] => return None,
            [only] => {
                only.extend_into(&mut values);
                values.resize(FEATURE_COUNT, 0.0);
            }
            [first, second, ..] => {
                let mut pair = [first, second];
                // Stable: two hands with the same label keep detection order
                pair.sort_by_key(|hand| hand.side.slot());
                for hand in pair {
                    hand.extend_into(&mut values);
                }
            }
        }

        Some(Self(values))
    }

    /// Accept an already-encoded vector (as posted by the web client).
    ///
    /// Wrong length or non-finite values are treated as "no observation".
    pub fn from_flat(values: &[f32], feature_count: usize) -> Option<Self> {
        if values.len() != feature_count || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(Self(values.to_vec()))
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

    /// Number of components that are not exactly zero
    pub fn nonzero_count(&self) -> usize {
        self.0.iter().filter(|v| **v != 0.0).count()
    }

    /// A detection with fewer than `min_nonzero` populated components carries no gesture
    pub fn is_near_empty(&self, min_nonzero: usize) -> bool {
        self.nonzero_count() < min_nonzero
    }
}

/// Normalize one frame of detections; see [`FeatureVector::from_hands`].
pub fn normalize_hands(hands: &[HandObservation]) -> Option<FeatureVector> {
    FeatureVector::from_hands(hands)
}
