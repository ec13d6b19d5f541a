//! Focus analysis results

use alerting::Violation;
use serde::{Deserialize, Serialize};

use crate::gaze::{GazeReading, HeadPose};
use crate::state::FocusPhase;

/// Complete focus analysis result for one tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FocusAnalysis {
    pub face_count: usize,

    pub phase: FocusPhase,

    /// Head pose of the single face (if evaluated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_pose: Option<HeadPose>,

    /// Gaze-offset reading of the single face (if evaluated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaze: Option<GazeReading>,

    /// Violations in emission order
    pub violations: Vec<Violation>,
}

impl FocusAnalysis {
    /// Check if the tick produced any violation
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}
