//! Recorded landmark streams
//!
//! One JSON object per line, as written by the hand-tracking front end:
//!
//! ```text
//! {"t": 0.033, "hands": [{"side": "Left", "landmarks": [[0.51, 0.62, -0.01], ...]}]}
//! ```
//!
//! `t` is seconds since the start of the stream. Blank lines are ignored.

use std::io::BufRead;
use std::time::Duration;

use serde::Deserialize;

use crate::recognition::{HandLandmark, HandObservation, Handedness, LANDMARKS_PER_HAND};

/// Stream parsing errors
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Failed to read frame stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Line {line}: hand has {found} landmarks, expected 21")]
    LandmarkCount { line: usize, found: usize },

    #[error("Line {line}: invalid timestamp {value}")]
    Timestamp { line: usize, value: f64 },
}

#[derive(Debug, Deserialize)]
struct RawHand {
    side: Handedness,
    landmarks: Vec<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    t: f64,
    #[serde(default)]
    hands: Vec<RawHand>,
}

/// One frame of a recorded stream
#[derive(Debug, Clone)]
pub struct TimedFrame {
    /// Offset from the start of the stream
    pub timestamp: Duration,
    pub hands: Vec<HandObservation>,
}

fn parse_line(line_no: usize, line: &str) -> Result<TimedFrame, FrameError> {
    let raw: RawFrame = serde_json::from_str(line).map_err(|source| FrameError::Parse {
        line: line_no,
        source,
    })?;

    if !raw.t.is_finite() || raw.t < 0.0 {
        return Err(FrameError::Timestamp {
            line: line_no,
            value: raw.t,
        });
    }

    let mut hands = Vec::with_capacity(raw.hands.len());
    for hand in raw.hands {
        let points: [[f32; 3]; LANDMARKS_PER_HAND] =
            hand.landmarks
                .as_slice()
                .try_into()
                .map_err(|_| FrameError::LandmarkCount {
                    line: line_no,
                    found: hand.landmarks.len(),
                })?;
        let landmarks = points.map(|[x, y, z]| HandLandmark::new(x, y, z));
        hands.push(HandObservation::new(landmarks, hand.side));
    }

    Ok(TimedFrame {
        timestamp: Duration::from_secs_f64(raw.t),
        hands,
    })
}

/// Iterate the frames of a JSON-lines stream
pub fn read_frames<R: BufRead>(reader: R) -> impl Iterator<Item = Result<TimedFrame, FrameError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(parse_line(i + 1, &line)),
            Err(e) => Some(Err(FrameError::Io(e))),
        })
}
