//! State shared by the request handlers

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use crate::recognition::{LetterRecognizer, RecognitionSession};

/// Handle passed to every route
pub type AppStateHandle = Arc<AppState>;

/// The server binds one word session to its single client stream.
pub struct AppState {
    pub word_session: Arc<Mutex<RecognitionSession>>,
    pub letters: Option<Arc<LetterRecognizer>>,
    pub word_labels: usize,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(word_session: RecognitionSession, letters: Option<LetterRecognizer>) -> Self {
        Self {
            word_labels: word_session.model().labels.len(),
            word_session: Arc::new(Mutex::new(word_session)),
            letters: letters.map(Arc::new),
            started_at: Instant::now(),
        }
    }

    pub fn into_handle(self) -> AppStateHandle {
        Arc::new(self)
    }
}
