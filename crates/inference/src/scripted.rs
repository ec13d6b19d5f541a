//! Scripted providers that replay canned results
//!
//! Used for replaying recorded sessions and in tests. Each call pops the next
//! scripted step; an exhausted script answers with an empty result.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use detection_types::{FaceSet, HandDetection, RawObjectDetection};
use tracing::debug;

use crate::provider::{FaceDetector, HandDetector, ObjectDetector};
use crate::InferenceError;

enum Step<T> {
    Result(Result<T, InferenceError>),
    Delayed(Duration, T),
}

/// Replays a queue of results for one detector type
pub struct ScriptedDetector<T> {
    name: &'static str,
    steps: Mutex<VecDeque<Step<T>>>,
}

/// Scripted object detector
pub type ScriptedObjectDetector = ScriptedDetector<Vec<RawObjectDetection>>;
/// Scripted face detector
pub type ScriptedFaceDetector = ScriptedDetector<FaceSet>;
/// Scripted hand detector
pub type ScriptedHandDetector = ScriptedDetector<Vec<HandDetection>>;

impl<T: Default + Send> ScriptedDetector<T> {
    /// Create an empty script
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a script from successive results
    pub fn from_results(name: &'static str, results: impl IntoIterator<Item = T>) -> Self {
        let script = Self::new(name);
        for r in results {
            script.push(r);
        }
        script
    }

    /// Queue a successful result
    pub fn push(&self, result: T) {
        self.queue(Step::Result(Ok(result)));
    }

    /// Queue a failure
    pub fn push_error(&self, error: InferenceError) {
        self.queue(Step::Result(Err(error)));
    }

    /// Queue a result that only arrives after `delay`
    pub fn push_delayed(&self, delay: Duration, result: T) {
        self.queue(Step::Delayed(delay, result));
    }

    /// Steps not yet consumed
    pub fn remaining(&self) -> usize {
        self.steps.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn queue(&self, step: Step<T>) {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(step);
    }

    async fn next(&self) -> Result<T, InferenceError> {
        let step = self
            .steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match step {
            Some(Step::Result(r)) => r,
            Some(Step::Delayed(delay, r)) => {
                debug!("{}: delaying scripted result by {:?}", self.name, delay);
                tokio::time::sleep(delay).await;
                Ok(r)
            }
            None => Ok(T::default()),
        }
    }
}

#[async_trait]
impl ObjectDetector for ScriptedDetector<Vec<RawObjectDetection>> {
    async fn detect_objects(&self) -> Result<Vec<RawObjectDetection>, InferenceError> {
        self.next().await
    }
}

#[async_trait]
impl FaceDetector for ScriptedDetector<FaceSet> {
    async fn detect_faces(&self) -> Result<FaceSet, InferenceError> {
        self.next().await
    }
}

#[async_trait]
impl HandDetector for ScriptedDetector<Vec<HandDetection>> {
    async fn detect_hands(&self) -> Result<Vec<HandDetection>, InferenceError> {
        self.next().await
    }
}
