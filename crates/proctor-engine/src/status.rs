//! Read-only tracking snapshot

use detection_types::TimestampMs;
use object_analysis::TrackedObject;
use serde::{Deserialize, Serialize};

/// Tracking status of one registered object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingStatus {
    pub consecutive_detections: u32,
    pub missed_frames: u32,
    pub last_seen_ms: Option<TimestampMs>,
    /// "not detected", "recently seen (N missed)", "detected (N/T)" or "confirmed"
    pub human_status: String,
}

impl From<&TrackedObject> for TrackingStatus {
    fn from(tracked: &TrackedObject) -> Self {
        Self {
            consecutive_detections: tracked.state.consecutive_detections,
            missed_frames: tracked.state.missed_frames,
            last_seen_ms: tracked.state.last_detection_ms,
            human_status: tracked.human_status(),
        }
    }
}
