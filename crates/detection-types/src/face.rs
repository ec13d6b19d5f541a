//! Face records from the face-landmark provider

use serde::{Deserialize, Serialize};

use crate::geometry::{BBox, Point};

/// Face-mesh landmark indices used by the gaze estimators
pub mod landmarks {
    /// Full face-mesh size
    pub const MESH_SIZE: usize = 468;
    pub const NOSE_TIP: usize = 1;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const LEFT_CHEEK: usize = 234;
    pub const RIGHT_CHEEK: usize = 454;
}

/// Single detected face
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Face {
    #[serde(default, rename = "boundingBox", alias = "bounding_box")]
    pub bounding_box: Option<BBox>,
    /// Empty for box-only detectors, otherwise the 468-point mesh
    #[serde(default)]
    pub landmarks: Vec<Point>,
}

/// All faces seen in one frame, in provider order
pub type FaceSet = Vec<Face>;

impl Face {
    /// Box-only face
    pub fn with_box(bbox: BBox) -> Self {
        Self {
            bounding_box: Some(bbox),
            landmarks: Vec::new(),
        }
    }

    /// Face with a landmark mesh
    pub fn with_landmarks(landmarks: Vec<Point>) -> Self {
        Self {
            bounding_box: None,
            landmarks,
        }
    }

    /// Whether the landmark mesh is complete enough for gaze estimation
    pub fn has_mesh(&self) -> bool {
        self.landmarks.len() >= landmarks::MESH_SIZE
    }

    /// Landmark by mesh index
    pub fn landmark(&self, index: usize) -> Option<Point> {
        self.landmarks.get(index).copied()
    }

    /// Bounding box, derived from the landmark extent when the provider sent none
    pub fn bbox(&self) -> Option<BBox> {
        if let Some(b) = self.bounding_box {
            return Some(b);
        }
        if self.landmarks.is_empty() {
            return None;
        }
        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for p in &self.landmarks {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(BBox::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_landmarks() {
        let face = Face::with_landmarks(vec![Point::new(10.0, 20.0), Point::new(50.0, 80.0)]);
        assert_eq!(face.bbox(), Some(BBox::new(10.0, 20.0, 40.0, 60.0)));
        assert!(!face.has_mesh());
    }

    #[test]
    fn test_box_only_face() {
        let face = Face::with_box(BBox::new(0.0, 0.0, 100.0, 120.0));
        assert_eq!(face.landmark(landmarks::NOSE_TIP), None);
        assert_eq!(face.bbox().map(|b| b.w), Some(100.0));
    }

    #[test]
    fn test_face_json_camel_case_box() {
        let face: Face =
            serde_json::from_str(r#"{"boundingBox":{"x":1,"y":2,"w":3,"h":4}}"#).unwrap();
        assert_eq!(face.bounding_box, Some(BBox::new(1.0, 2.0, 3.0, 4.0)));
        assert!(face.landmarks.is_empty());
    }
}
