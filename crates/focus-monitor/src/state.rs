//! Focus state tracking

use detection_types::TimestampMs;
use serde::{Deserialize, Serialize};

/// Focus phase, derived from the face count and the estimators each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusPhase {
    MultipleFaces,
    #[default]
    NoFace,
    SingleFaceOnScreen,
    SingleFaceLookingAway,
}

/// Warning currently shown to the candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MultipleFaces,
    NoFace,
    LookingAway,
}

/// Focus state (tracked over time)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FocusState {
    pub phase: FocusPhase,

    /// Faces seen on the last tick
    pub face_count: usize,

    /// Any enabled estimator reads away
    pub is_looking_away: bool,

    /// Head-pose away timer start
    pub looking_away_start: Option<TimestampMs>,

    pub is_no_face: bool,

    /// No-face timer start
    pub no_face_start: Option<TimestampMs>,

    pub warning_active: bool,
    pub warning_kind: Option<WarningKind>,

    /// Consecutive gaze-offset away frames
    pub gaze_away_frames: u32,

    /// Start of the current gaze-offset away run
    pub gaze_away_since: Option<TimestampMs>,
}

impl FocusState {
    pub(crate) fn raise_warning(&mut self, kind: WarningKind) {
        self.warning_active = true;
        self.warning_kind = Some(kind);
    }

    pub(crate) fn clear_warning(&mut self) {
        self.warning_active = false;
        self.warning_kind = None;
    }

    pub(crate) fn clear_looking_away(&mut self) {
        self.is_looking_away = false;
        self.looking_away_start = None;
        self.gaze_away_frames = 0;
        self.gaze_away_since = None;
    }

    /// Milliseconds since `start`, zero if the clock went backwards
    pub(crate) fn elapsed(start: TimestampMs, now: TimestampMs) -> u64 {
        now.saturating_sub(start)
    }

    /// Reset state (on session change)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
