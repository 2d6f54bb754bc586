//! Gesture sample recorder
//!
//! Gated accumulation for collecting training data: frames accumulate while the
//! signer's hands are up, and the sequence is judged once the hands have been
//! down for the absence period. Long-enough sequences become samples; short
//! ones are discarded.

use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::recognition::{normalize_hands, FeatureVector, HandObservation};

/// Recorder tuning
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    /// Frames kept per sample (the most recent ones)
    pub sequence_length: usize,
    /// Hands-down time that ends a gesture
    pub absence: Duration,
    /// Fewest hands the gesture uses
    pub min_hands: usize,
    /// Most hands the gesture uses
    pub max_hands: usize,
    /// Frames over which the detected hand count is stabilized
    pub stabilizer_window: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sequence_length: 15,
            absence: Duration::from_secs(2),
            min_hands: 1,
            max_hands: 2,
            stabilizer_window: 15,
        }
    }
}

/// Smooths the per-frame hand count by taking the most frequent value over a
/// short history. Ties go to the smaller count, so a hand has to persist before
/// it is counted.
#[derive(Debug, Clone)]
pub struct HandCountStabilizer {
    history: VecDeque<usize>,
    window: usize,
}

impl HandCountStabilizer {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            history: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Record this frame's count and return the stabilized count
    pub fn push(&mut self, count: usize) -> usize {
        if self.history.len() == self.window {
            self.history.pop_front();
        }
        self.history.push_back(count);
        self.stable_count()
    }

    pub fn stable_count(&self) -> usize {
        let mut tally: HashMap<usize, usize> = HashMap::new();
        for count in &self.history {
            *tally.entry(*count).or_default() += 1;
        }
        tally
            .into_iter()
            .max_by_key(|(count, seen)| (*seen, Reverse(*count)))
            .map(|(count, _)| count)
            .unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

/// What the recorder decided on a frame
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    /// Hands came up; a new sequence started
    Started { hands: usize },
    /// Hands went down after a long-enough gesture
    Captured(Vec<FeatureVector>),
    /// Hands went down before enough frames were seen
    TooShort { frames: usize, required: usize },
}

/// Gated-accumulation state machine
#[derive(Debug)]
pub struct GestureRecorder {
    config: RecorderConfig,
    stabilizer: HandCountStabilizer,
    sequence: VecDeque<FeatureVector>,
    recording: bool,
    last_hand_at: Option<Duration>,
}

impl GestureRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            stabilizer: HandCountStabilizer::new(config.stabilizer_window),
            sequence: VecDeque::with_capacity(config.sequence_length),
            recording: false,
            last_hand_at: None,
            config,
        }
    }

    /// Feed one frame taken at `timestamp` (monotonic stream time)
    pub fn observe(&mut self, timestamp: Duration, hands: &[HandObservation]) -> Option<RecorderEvent> {
        let stable_hands = self.stabilizer.push(hands.len());
        let hands_match = (self.config.min_hands..=self.config.max_hands).contains(&stable_hands);

        if let Some(features) = normalize_hands(hands).filter(|_| hands_match) {
            self.last_hand_at = Some(timestamp);

            let started = !self.recording;
            if started {
                self.recording = true;
                self.sequence.clear();
                tracing::info!(hands = stable_hands, "Recording started");
            }

            if self.sequence.len() == self.config.sequence_length {
                self.sequence.pop_front();
            }
            self.sequence.push_back(features);

            return started.then_some(RecorderEvent::Started { hands: stable_hands });
        }

        let last = self.last_hand_at.filter(|_| self.recording)?;
        if timestamp.saturating_sub(last) < self.config.absence {
            return None;
        }

        Some(self.finish())
    }

    /// Judge the current sequence and reset for the next gesture
    fn finish(&mut self) -> RecorderEvent {
        let frames = self.sequence.len();
        let event = if frames >= self.config.sequence_length {
            RecorderEvent::Captured(self.sequence.drain(..).collect())
        } else {
            tracing::warn!(
                frames,
                required = self.config.sequence_length,
                "Gesture too short, sample discarded"
            );
            RecorderEvent::TooShort {
                frames,
                required: self.config.sequence_length,
            }
        };

        self.recording = false;
        self.sequence.clear();
        self.last_hand_at = None;
        self.stabilizer.clear();
        event
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn buffered_frames(&self) -> usize {
        self.sequence.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::landmarks::tests::hand;
    use crate::recognition::Handedness;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn config() -> RecorderConfig {
        RecorderConfig {
            sequence_length: 3,
            absence: Duration::from_secs(2),
            min_hands: 1,
            max_hands: 2,
            stabilizer_window: 1,
        }
    }

    #[test]
    fn test_stabilizer_mode() {
        let mut s = HandCountStabilizer::new(5);
        s.push(2);
        s.push(2);
        s.push(1);
        assert_eq!(s.push(0), 2);
        // [2, 2, 1, 0, 1]: tie between 2 and 1
        assert_eq!(s.push(1), 1);
        // window keeps [2, 1, 0, 1, 1]
        assert_eq!(s.push(1), 1);
    }

    #[test]
    fn test_stabilizer_tie_prefers_fewer_hands() {
        let mut s = HandCountStabilizer::new(4);
        s.push(1);
        assert_eq!(s.push(2), 1);

        let mut s = HandCountStabilizer::new(15);
        s.push(0);
        assert_eq!(s.push(1), 0);
        assert_eq!(s.push(1), 1);
    }

    #[test]
    fn test_two_hand_gesture_waits_for_stable_count() {
        let mut r = GestureRecorder::new(RecorderConfig {
            min_hands: 2,
            stabilizer_window: 4,
            ..config()
        });
        let one = [hand(Handedness::Right, 0.3)];
        let two = [hand(Handedness::Right, 0.3), hand(Handedness::Left, 0.5)];

        assert_eq!(r.observe(ms(0), &one), None);
        // [1, 2] ties toward one hand
        assert_eq!(r.observe(ms(33), &two), None);
        assert!(!r.is_recording());
        assert_eq!(r.observe(ms(66), &two), Some(RecorderEvent::Started { hands: 2 }));
    }

    #[test]
    fn test_capture_after_absence() {
        let mut r = GestureRecorder::new(config());
        let left = [hand(Handedness::Left, 0.3)];

        assert_eq!(r.observe(ms(0), &left), Some(RecorderEvent::Started { hands: 1 }));
        for t in 1..5 {
            assert_eq!(r.observe(ms(t * 33), &left), None);
        }
        assert_eq!(r.buffered_frames(), 3);

        // hands down, not long enough yet
        assert_eq!(r.observe(ms(1000), &[]), None);
        assert!(r.is_recording());

        match r.observe(ms(2200), &[]) {
            Some(RecorderEvent::Captured(frames)) => assert_eq!(frames.len(), 3),
            other => panic!("expected capture, got {:?}", other),
        }
        assert!(!r.is_recording());
        assert_eq!(r.buffered_frames(), 0);
    }

    #[test]
    fn test_short_gesture_discarded() {
        let mut r = GestureRecorder::new(config());
        let left = [hand(Handedness::Left, 0.3)];

        r.observe(ms(0), &left);
        r.observe(ms(33), &left);

        assert_eq!(
            r.observe(ms(3000), &[]),
            Some(RecorderEvent::TooShort { frames: 2, required: 3 })
        );
        // idle afterwards
        assert_eq!(r.observe(ms(6000), &[]), None);
    }

    #[test]
    fn test_hand_count_outside_range_does_not_record() {
        let mut r = GestureRecorder::new(RecorderConfig {
            min_hands: 2,
            ..config()
        });
        let one = [hand(Handedness::Right, 0.3)];
        assert_eq!(r.observe(ms(0), &one), None);
        assert!(!r.is_recording());

        let two = [hand(Handedness::Right, 0.3), hand(Handedness::Left, 0.5)];
        assert_eq!(r.observe(ms(33), &two), Some(RecorderEvent::Started { hands: 2 }));
    }

    #[test]
    fn test_idle_without_hands() {
        let mut r = GestureRecorder::new(config());
        for t in 0..10 {
            assert_eq!(r.observe(ms(t * 500), &[]), None);
        }
    }
}
