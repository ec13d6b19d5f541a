//! Per-tick object analysis results

use alerting::Violation;
use detection_types::ObjectDetection;
use serde::{Deserialize, Serialize};

use crate::lexicon::ObjectCategory;

/// Detection with its category and suspiciousness, valid for one tick
#[derive(Debug, Clone, Copy)]
pub struct ScoredDetection<'a> {
    pub detection: &'a ObjectDetection,
    pub category: ObjectCategory,
    /// Suspiciousness score
    pub score: u32,
    /// Claimed by a registered tracked type
    pub tracked: bool,
}

/// Owned summary of one scored detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredObject {
    pub class: String,
    pub category: ObjectCategory,
    pub detection_score: f32,
    pub suspiciousness: u32,
}

impl From<&ScoredDetection<'_>> for ScoredObject {
    fn from(s: &ScoredDetection<'_>) -> Self {
        Self {
            class: s.detection.class.clone(),
            category: s.category,
            detection_score: s.detection.score,
            suspiciousness: s.score,
        }
    }
}

/// Result of one object tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectAnalysis {
    /// Every accepted detection with its score
    pub scored: Vec<ScoredObject>,
    /// Violations in emission order
    pub violations: Vec<Violation>,
}

impl ObjectAnalysis {
    /// Check if the tick produced any violation
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Highest suspiciousness seen this tick
    pub fn max_suspiciousness(&self) -> u32 {
        self.scored.iter().map(|s| s.suspiciousness).max().unwrap_or(0)
    }
}
