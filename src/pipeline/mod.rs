//! Background recognition worker
//!
//! Runs a [`RecognitionSession`] on its own thread for live frame streams. Frames
//! are handed over through a small bounded channel; when the classifier falls
//! behind, new frames are dropped instead of queued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::recognition::{HandObservation, Prediction, RecognitionSession};

/// Frames allowed to wait for the worker before new ones are dropped
const FRAME_QUEUE_DEPTH: usize = 2;

/// One frame of hand detections
#[derive(Debug, Clone)]
pub struct StreamFrame {
    pub frame_number: u64,
    pub hands: Vec<HandObservation>,
}

/// Session output for one processed frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub frame_number: u64,
    pub prediction: Prediction,
}

/// Worker thread owning one recognition session
pub struct RecognitionWorker {
    /// Channel to send frames to the worker thread
    frame_sender: Option<Sender<StreamFrame>>,
    /// Outcomes in processing order
    outcome_receiver: Receiver<FrameOutcome>,
    /// Frames rejected because the queue was full
    dropped: Arc<AtomicU64>,
    /// Worker thread handle
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl RecognitionWorker {
    /// Move `session` onto a new worker thread
    pub fn spawn(session: RecognitionSession) -> std::io::Result<Self> {
        let (frame_sender, frame_receiver) = crossbeam_channel::bounded::<StreamFrame>(FRAME_QUEUE_DEPTH);
        let (outcome_sender, outcome_receiver) = crossbeam_channel::unbounded::<FrameOutcome>();

        let thread_handle = std::thread::Builder::new()
            .name("recognition".to_string())
            .spawn(move || {
                Self::worker_thread(session, frame_receiver, outcome_sender);
            })?;

        Ok(Self {
            frame_sender: Some(frame_sender),
            outcome_receiver,
            dropped: Arc::new(AtomicU64::new(0)),
            thread_handle: Some(thread_handle),
        })
    }

    fn worker_thread(
        mut session: RecognitionSession,
        frame_receiver: Receiver<StreamFrame>,
        outcome_sender: Sender<FrameOutcome>,
    ) {
        tracing::debug!("Recognition worker started");

        while let Ok(frame) = frame_receiver.recv() {
            match session.process_hands(&frame.hands) {
                Ok(prediction) => {
                    let outcome = FrameOutcome {
                        frame_number: frame.frame_number,
                        prediction,
                    };
                    if outcome_sender.send(outcome).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(frame = frame.frame_number, "Recognition error: {}", e);
                }
            }
        }

        tracing::debug!("Recognition worker stopped");
    }

    /// Hand a frame to the worker without blocking.
    ///
    /// Returns `false` if the frame was dropped.
    pub fn submit(&self, frame: StreamFrame) -> bool {
        let Some(ref sender) = self.frame_sender else {
            return false;
        };

        match sender.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(frame = frame.frame_number, "Worker busy, frame dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Hand a frame to the worker, waiting for queue space (offline replay)
    pub fn submit_blocking(&self, frame: StreamFrame) -> bool {
        match self.frame_sender {
            Some(ref sender) => sender.send(frame).is_ok(),
            None => false,
        }
    }

    pub fn outcomes(&self) -> &Receiver<FrameOutcome> {
        &self.outcome_receiver
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting frames and wait for queued ones to finish
    pub fn stop(&mut self) {
        // Drop sender to signal thread to stop
        self.frame_sender = None;

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RecognitionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
