//! Focus configuration

use serde::{Deserialize, Serialize};

use crate::FocusError;

/// Focus configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// No face visible for this long raises a violation (milliseconds)
    pub no_face_ms: u64,

    /// Head turned away for this long raises a violation (milliseconds)
    pub looking_away_ms: u64,

    /// Yaw beyond which the head counts as turned away (degrees)
    pub head_angle_degrees: f32,

    /// Nose offset, as a fraction of face width, beyond which gaze is away
    pub gaze_offset_threshold: f32,

    /// Once away, the offset must drop this far below the threshold to clear
    pub gaze_dead_zone: f32,

    /// Sustained off-center gaze before a violation (milliseconds)
    pub gaze_sustain_ms: u64,

    /// Minimum time between gaze-offset violations (milliseconds)
    pub gaze_cooldown_ms: u64,

    /// Enable the head-pose estimator
    pub head_pose_enabled: bool,

    /// Enable the gaze-offset estimator
    pub gaze_offset_enabled: bool,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            no_face_ms: 10_000,
            looking_away_ms: 5_000,
            head_angle_degrees: 25.0,
            gaze_offset_threshold: 0.15,
            gaze_dead_zone: 0.05,
            gaze_sustain_ms: 7_000,
            gaze_cooldown_ms: 15_000,
            head_pose_enabled: true,
            gaze_offset_enabled: true,
        }
    }
}

impl FocusConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            no_face_ms: 5_000,
            looking_away_ms: 3_000,
            head_angle_degrees: 20.0,
            gaze_sustain_ms: 5_000,
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            no_face_ms: 15_000,
            looking_away_ms: 8_000,
            head_angle_degrees: 35.0,
            gaze_sustain_ms: 10_000,
            ..Default::default()
        }
    }

    /// Reject inconsistent thresholds
    pub fn validate(&self) -> Result<(), FocusError> {
        if self.no_face_ms == 0 || self.looking_away_ms == 0 || self.gaze_sustain_ms == 0 {
            return Err(FocusError::Config(
                "focus durations must be positive".into(),
            ));
        }
        if !(self.head_angle_degrees > 0.0 && self.head_angle_degrees < 90.0) {
            return Err(FocusError::Config(format!(
                "head angle {} must lie in (0, 90) degrees",
                self.head_angle_degrees
            )));
        }
        if !(self.gaze_offset_threshold > 0.0) {
            return Err(FocusError::Config(format!(
                "gaze offset threshold {} must be positive",
                self.gaze_offset_threshold
            )));
        }
        if !(self.gaze_dead_zone >= 0.0 && self.gaze_dead_zone < self.gaze_offset_threshold) {
            return Err(FocusError::Config(format!(
                "gaze dead zone {} must lie in [0, {})",
                self.gaze_dead_zone, self.gaze_offset_threshold
            )));
        }
        Ok(())
    }
}
