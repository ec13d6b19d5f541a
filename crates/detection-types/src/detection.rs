//! Object and hand detection records

use serde::{Deserialize, Serialize};

use crate::geometry::BBox;

/// Validated object detection for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDetection {
    /// Class label as produced by the object model (unconstrained text)
    pub class: String,
    /// Detection score in [0, 1]
    pub score: f32,
    pub bbox: BBox,
}

impl ObjectDetection {
    pub fn new(class: impl Into<String>, score: f32, bbox: BBox) -> Self {
        Self {
            class: class.into(),
            score,
            bbox,
        }
    }
}

/// Object detection as handed over by a provider, before validation.
///
/// Any field may be missing; such records are dropped by the validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawObjectDetection {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub bbox: Option<BBox>,
}

impl From<ObjectDetection> for RawObjectDetection {
    fn from(d: ObjectDetection) -> Self {
        Self {
            class: Some(d.class),
            score: Some(d.score),
            bbox: Some(d.bbox),
        }
    }
}

/// Which hand a detection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

/// Hand detection for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandDetection {
    pub bbox: BBox,
    pub label: Handedness,
    /// Detector confidence in [0, 1]
    pub confidence: f32,
}

impl HandDetection {
    pub fn new(bbox: BBox, label: Handedness, confidence: f32) -> Self {
        Self {
            bbox,
            label,
            confidence,
        }
    }
}
