//! Violation records

use chrono::{DateTime, TimeZone, Utc};
use detection_types::TimestampMs;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Violation severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Decision pathway of the object arbiter, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pathway {
    /// Class label is in the phone lexicon
    DirectClassification,
    /// Suspiciousness high enough to suspect a mislabeled phone
    MisclassifiedObject,
    /// Person box carrying suspicious geometry and hand context
    PersonWithObject,
    /// Any class with very high suspiciousness
    VeryHighSuspicion,
    /// Moderate suspiciousness sustained over consecutive frames
    SustainedSuspicion,
}

impl Pathway {
    /// All pathways in evaluation order
    pub const ALL: [Pathway; 5] = [
        Pathway::DirectClassification,
        Pathway::MisclassifiedObject,
        Pathway::PersonWithObject,
        Pathway::VeryHighSuspicion,
        Pathway::SustainedSuspicion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pathway::DirectClassification => "direct_classification",
            Pathway::MisclassifiedObject => "misclassified_object",
            Pathway::PersonWithObject => "person_with_object",
            Pathway::VeryHighSuspicion => "very_high_suspicion",
            Pathway::SustainedSuspicion => "sustained_suspicion",
        }
    }
}

/// Which gaze estimator raised a looking-away violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GazeEstimator {
    /// Yaw angle from eye corners and nose tip
    HeadPose,
    /// Nose offset from the eye midpoint, normalized by face width
    GazeOffset,
}

impl GazeEstimator {
    pub fn as_str(&self) -> &'static str {
        match self {
            GazeEstimator::HeadPose => "head_pose",
            GazeEstimator::GazeOffset => "gaze_offset",
        }
    }
}

/// What a violation is about
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViolationKind {
    /// Hysteresis tracker confirmed a tracked object type
    ProhibitedObject { object_type: String },
    /// Pathway arbiter fired
    SuspiciousObject { pathway: Pathway },
    /// Phone-like object held continuously
    ObjectHeld,
    /// Person-only frames, object model likely missed a held item
    HiddenObject,
    /// Repeated low-confidence object of an unrecognized class
    UnknownObject,
    MultipleFaces,
    NoFace,
    LookingAway { estimator: GazeEstimator },
}

impl ViolationKind {
    /// Short label, used as metrics label
    pub fn label(&self) -> &'static str {
        match self {
            ViolationKind::ProhibitedObject { .. } => "prohibited_object",
            ViolationKind::SuspiciousObject { .. } => "suspicious_object",
            ViolationKind::ObjectHeld => "object_held",
            ViolationKind::HiddenObject => "hidden_object",
            ViolationKind::UnknownObject => "unknown_object",
            ViolationKind::MultipleFaces => "multiple_faces",
            ViolationKind::NoFace => "no_face",
            ViolationKind::LookingAway { .. } => "looking_away",
        }
    }

    /// Cooldown category: the label qualified by object type, pathway or estimator
    pub fn category(&self) -> String {
        match self {
            ViolationKind::ProhibitedObject { object_type } => {
                format!("{}:{}", self.label(), object_type)
            }
            ViolationKind::SuspiciousObject { pathway } => {
                format!("{}:{}", self.label(), pathway.as_str())
            }
            ViolationKind::LookingAway { estimator } => {
                format!("{}:{}", self.label(), estimator.as_str())
            }
            other => other.label().to_string(),
        }
    }

    /// Raised by a fallback heuristic rather than backed by a model detection
    pub fn is_heuristic(&self) -> bool {
        matches!(
            self,
            ViolationKind::HiddenObject | ViolationKind::UnknownObject | ViolationKind::ObjectHeld
        )
    }
}

/// Emitted violation, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: ViolationKind,
    pub message: String,
    pub severity: Severity,
    pub timestamp_ms: TimestampMs,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl Violation {
    /// Emission time as a UTC date-time
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_ms as i64).single()
    }
}
