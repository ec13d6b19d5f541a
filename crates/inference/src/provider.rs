//! Provider traits and guarded invocation

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use detection_types::{FaceSet, HandDetection, RawObjectDetection};
use tracing::warn;

use crate::InferenceError;

/// Object detector (COCO-style class labels)
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Detect objects in the current frame
    async fn detect_objects(&self) -> Result<Vec<RawObjectDetection>, InferenceError>;
}

/// Face-landmark detector
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Detect faces in the current frame
    async fn detect_faces(&self) -> Result<FaceSet, InferenceError>;
}

/// Hand detector
#[async_trait]
pub trait HandDetector: Send + Sync {
    /// Detect hands in the current frame
    async fn detect_hands(&self) -> Result<Vec<HandDetection>, InferenceError>;
}

/// Await a provider call under a timeout.
///
/// Errors and timeouts are logged and replaced by an empty result, so the
/// tick proceeds as "nothing detected" for that source.
pub async fn detect_or_empty<T, F>(source: &'static str, limit: Duration, call: F) -> T
where
    T: Default,
    F: Future<Output = Result<T, InferenceError>>,
{
    let error = match tokio::time::timeout(limit, call).await {
        Ok(Ok(result)) => return result,
        Ok(Err(e)) => e,
        Err(_) => InferenceError::Timeout(limit.as_millis() as u64),
    };
    warn!("{} detector failed, treating as empty: {}", source, error);
    T::default()
}
