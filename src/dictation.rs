use std::sync::{Arc, Mutex};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DictationError {
    #[error("Dictation is already recording for {0}")]
    Busy(String),
}

/// Contract for the external speech recognizer.
///
/// Transcripts are delivered back to the store through
/// [`crate::store::AnnotationStore::dictation_recorded`].
pub trait DictationPort: Send {
    fn start_recording(&self, target: &str) -> Result<(), DictationError>;
    fn stop_recording(&self);
}

/// Recognizer that runs out of process. Requests are only recorded and logged;
/// the remote side posts transcripts through the API.
#[derive(Debug, Clone, Default)]
pub struct DetachedDictation {
    target: Arc<Mutex<Option<String>>>,
}

impl DetachedDictation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the annotation currently being dictated into.
    pub fn target(&self) -> Option<String> {
        self.target
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl DictationPort for DetachedDictation {
    fn start_recording(&self, target: &str) -> Result<(), DictationError> {
        let mut current = self
            .target
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(active) = current.as_ref() {
            return Err(DictationError::Busy(active.clone()));
        }
        tracing::info!("Dictation requested for {}", target);
        *current = Some(target.to_string());
        Ok(())
    }

    fn stop_recording(&self) {
        let mut current = self
            .target
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(target) = current.take() {
            tracing::info!("Dictation stopped for {}", target);
        }
    }
}
