//! Training data capture
//!
//! Replays recorded landmark streams through a gated-accumulation recorder and
//! stores each completed gesture as a fixed-shape sample for training.

pub mod dataset;
pub mod frames;
pub mod recorder;

pub use dataset::{DatasetError, DatasetSummary, GestureSample, SampleStore};
pub use frames::{read_frames, FrameError, TimedFrame};
pub use recorder::{GestureRecorder, HandCountStabilizer, RecorderConfig, RecorderEvent};
