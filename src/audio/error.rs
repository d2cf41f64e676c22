//! Capture-layer errors.
//!
//! These never cross into the renderer; the microphone source stores them
//! as state and the UI layer reads them back as strings.

use thiserror::Error;

/// Why the microphone could not be opened or kept running
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Access refused by the user or system policy
    #[error("Microphone access denied. Please allow microphone access in your system settings.")]
    PermissionDenied,

    /// Any other failure to open or run the input device
    #[error("Could not access microphone: {0}")]
    DeviceUnavailable(String),
}

impl CaptureError {
    /// Classify a backend error message
    pub fn from_backend_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if ["permission", "denied", "not allowed", "unauthorized"]
            .iter()
            .any(|needle| lowered.contains(needle))
        {
            CaptureError::PermissionDenied
        } else {
            CaptureError::DeviceUnavailable(message)
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, CaptureError::PermissionDenied)
    }
}

/// Demo oscillator failed to build its synthesis graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("Glicol engine init failed: {0}")]
    Engine(String),
}
