//! Gaze estimators over face-mesh landmarks
//!
//! Two independent estimators read the same landmarks with different
//! geometry and thresholds:
//! - head pose: yaw angle from the eye corners and nose tip
//! - gaze offset: nose offset from the eye midpoint over face width, with a
//!   dead zone so the reading does not flicker around the threshold

use detection_types::{landmarks, Face, Point};
use serde::{Deserialize, Serialize};

/// Head pose (Euler angles)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    /// Yaw (left-right rotation) in degrees
    pub yaw: f32,
    /// Roll (side tilt) in degrees
    pub roll: f32,
}

struct EyeLine {
    left: Point,
    right: Point,
    nose: Point,
}

impl EyeLine {
    fn from_face(face: &Face) -> Option<Self> {
        if !face.has_mesh() {
            return None;
        }
        Some(Self {
            left: face.landmark(landmarks::LEFT_EYE_OUTER)?,
            right: face.landmark(landmarks::RIGHT_EYE_OUTER)?,
            nose: face.landmark(landmarks::NOSE_TIP)?,
        })
    }

    fn midpoint(&self) -> Point {
        self.left.midpoint(&self.right)
    }

    /// Horizontal nose offset from the eye midpoint
    fn nose_offset(&self) -> f32 {
        self.nose.x - self.midpoint().x
    }
}

/// Head pose estimator using eye corners and nose tip
#[derive(Debug, Clone)]
pub struct HeadPoseEstimator {
    threshold_degrees: f32,
}

impl HeadPoseEstimator {
    pub fn new(threshold_degrees: f32) -> Self {
        Self { threshold_degrees }
    }

    /// Estimate head pose; `None` without a usable mesh
    pub fn estimate(&self, face: &Face) -> Option<HeadPose> {
        let eyes = EyeLine::from_face(face)?;
        let span = eyes.left.distance(&eyes.right);
        if !(span > f32::EPSILON) {
            return None;
        }

        let ratio = (2.0 * eyes.nose_offset() / span).clamp(-1.0, 1.0);
        let yaw = ratio.asin().to_degrees();
        let roll = (eyes.right.y - eyes.left.y)
            .atan2(eyes.right.x - eyes.left.x)
            .to_degrees();

        Some(HeadPose { yaw, roll })
    }

    /// Whether a pose counts as turned away
    pub fn is_away(&self, pose: &HeadPose) -> bool {
        pose.yaw.abs() > self.threshold_degrees
    }
}

/// One gaze-offset reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeReading {
    /// Signed nose offset as a fraction of face width
    pub offset: f32,
    pub away: bool,
}

/// Normalized nose/eye offset estimator with a dead zone
#[derive(Debug, Clone)]
pub struct GazeOffsetEstimator {
    threshold: f32,
    dead_zone: f32,
    away: bool,
}

impl GazeOffsetEstimator {
    pub fn new(threshold: f32, dead_zone: f32) -> Self {
        Self {
            threshold,
            dead_zone,
            away: false,
        }
    }

    /// Normalized offset; `None` without a usable mesh
    pub fn offset(face: &Face) -> Option<f32> {
        let eyes = EyeLine::from_face(face)?;
        let cheeks = face
            .landmark(landmarks::LEFT_CHEEK)
            .zip(face.landmark(landmarks::RIGHT_CHEEK))
            .map(|(l, r)| (r.x - l.x).abs())
            .filter(|w| *w > f32::EPSILON);
        let width = cheeks.or_else(|| face.bbox().map(|b| b.w).filter(|w| *w > f32::EPSILON))?;
        Some(eyes.nose_offset() / width)
    }

    /// Read one frame, updating the away latch
    pub fn update(&mut self, face: &Face) -> Option<GazeReading> {
        let offset = Self::offset(face)?;
        let magnitude = offset.abs();
        self.away = if self.away {
            magnitude >= self.threshold - self.dead_zone
        } else {
            magnitude > self.threshold
        };
        Some(GazeReading {
            offset,
            away: self.away,
        })
    }

    /// Drop the away latch
    pub fn reset(&mut self) {
        self.away = false;
    }
}
