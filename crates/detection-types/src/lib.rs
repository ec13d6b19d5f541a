//! Detection Types for Session Monitoring
//!
//! Typed output of the external inference providers, consumed once per tick:
//! - Object detections (class label, score, bounding box)
//! - Face sets (bounding box and optional 468-point face mesh)
//! - Hand detections (bounding box, handedness, confidence)

pub mod detection;
pub mod face;
pub mod geometry;

pub use detection::{HandDetection, Handedness, ObjectDetection, RawObjectDetection};
pub use face::{Face, FaceSet, landmarks};
pub use geometry::{BBox, Point};

/// Milliseconds on the session clock.
///
/// Every time-dependent operation receives the tick time explicitly; the
/// session runner supplies wall-clock milliseconds since the UNIX epoch.
pub type TimestampMs = u64;

/// Current wall-clock time in milliseconds
pub fn now_ms() -> TimestampMs {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
