//! Record validator for provider output

use crate::error::ValidationError;
use detection_types::{BBox, Face, HandDetection, ObjectDetection, RawObjectDetection};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Detection score / confidence valid range
    pub score_range: (f64, f64),
    /// Smallest accepted bounding box side (pixels)
    pub min_box_side: f32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            score_range: (0.0, 1.0),
            min_box_side: 1.0,
        }
    }
}

/// Outcome of validating one frame's worth of records
#[derive(Debug, Clone)]
pub struct ValidationResult<T> {
    /// Records that passed
    pub accepted: Vec<T>,
    /// One error per rejected (or repaired) record
    pub errors: Vec<ValidationError>,
    /// Number of records inspected
    pub records_checked: usize,
}

impl<T> ValidationResult<T> {
    /// Whether every record passed untouched
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validator for detection records
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() || value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate a bounding box
    pub fn validate_bbox(&self, bbox: &BBox) -> Result<(), ValidationError> {
        if !bbox.is_well_formed() {
            return Err(ValidationError::InvalidFormat(format!(
                "bbox {:?} is not a finite positive-area box",
                bbox
            )));
        }
        if bbox.w < self.config.min_box_side || bbox.h < self.config.min_box_side {
            return Err(ValidationError::InvalidFormat(format!(
                "bbox {}x{} below minimum side {}",
                bbox.w, bbox.h, self.config.min_box_side
            )));
        }
        Ok(())
    }

    /// Convert a raw provider record into a validated detection
    pub fn validate_object(
        &self,
        raw: RawObjectDetection,
    ) -> Result<ObjectDetection, ValidationError> {
        let class = raw.class.ok_or(ValidationError::MissingField("class"))?;
        let score = raw.score.ok_or(ValidationError::MissingField("score"))?;
        let bbox = raw.bbox.ok_or(ValidationError::MissingField("bbox"))?;

        if class.trim().is_empty() {
            return Err(ValidationError::InvalidFormat("empty class label".into()));
        }
        self.validate_range("score", score as f64, self.config.score_range)?;
        self.validate_bbox(&bbox)?;

        Ok(ObjectDetection::new(class.trim(), score, bbox))
    }

    /// Validate a frame of object records, dropping malformed ones
    pub fn validate_objects(
        &self,
        raw: Vec<RawObjectDetection>,
    ) -> ValidationResult<ObjectDetection> {
        let records_checked = raw.len();
        let mut accepted = Vec::with_capacity(records_checked);
        let mut errors = Vec::new();

        for record in raw {
            match self.validate_object(record) {
                Ok(d) => accepted.push(d),
                Err(e) => {
                    debug!("Skipping malformed object record: {}", e);
                    errors.push(e);
                }
            }
        }

        ValidationResult {
            accepted,
            errors,
            records_checked,
        }
    }

    /// Validate a single hand detection
    pub fn validate_hand(&self, hand: &HandDetection) -> Result<(), ValidationError> {
        self.validate_range("hand_confidence", hand.confidence as f64, self.config.score_range)?;
        self.validate_bbox(&hand.bbox)
    }

    /// Validate a frame of hand detections, dropping malformed ones
    pub fn validate_hands(&self, hands: Vec<HandDetection>) -> ValidationResult<HandDetection> {
        let records_checked = hands.len();
        let mut accepted = Vec::with_capacity(records_checked);
        let mut errors = Vec::new();

        for hand in hands {
            match self.validate_hand(&hand) {
                Ok(()) => accepted.push(hand),
                Err(e) => {
                    debug!("Skipping malformed hand record: {}", e);
                    errors.push(e);
                }
            }
        }

        ValidationResult {
            accepted,
            errors,
            records_checked,
        }
    }

    /// Validate a face set.
    ///
    /// Faces are never dropped since the face count itself is the signal.
    /// Non-finite landmark meshes and malformed boxes are stripped instead,
    /// which leaves the face present but without usable geometry.
    pub fn validate_faces(&self, faces: Vec<Face>) -> ValidationResult<Face> {
        let records_checked = faces.len();
        let mut accepted = Vec::with_capacity(records_checked);
        let mut errors = Vec::new();

        for mut face in faces {
            if face
                .landmarks
                .iter()
                .any(|p| !p.x.is_finite() || !p.y.is_finite())
            {
                debug!("Stripping non-finite landmark mesh");
                errors.push(ValidationError::InvalidFormat(
                    "non-finite face landmark".into(),
                ));
                face.landmarks.clear();
            }
            if let Some(bbox) = face.bounding_box {
                if let Err(e) = self.validate_bbox(&bbox) {
                    debug!("Stripping malformed face box: {}", e);
                    errors.push(e);
                    face.bounding_box = None;
                }
            }
            accepted.push(face);
        }

        ValidationResult {
            accepted,
            errors,
            records_checked,
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
