//! Inference Provider Interfaces
//!
//! The object, face-landmark and hand models live outside this workspace.
//! The analysis pipelines only see their typed per-frame output through the
//! traits below, invoked with a timeout so a failing model degrades to an
//! empty result instead of stalling a tick.

mod provider;
mod scripted;

pub use provider::{detect_or_empty, FaceDetector, HandDetector, ObjectDetector};
pub use scripted::{ScriptedDetector, ScriptedFaceDetector, ScriptedHandDetector, ScriptedObjectDetector};

use thiserror::Error;

/// Errors raised by an inference provider
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
    #[error("Inference timeout after {0}ms")]
    Timeout(u64),
}
