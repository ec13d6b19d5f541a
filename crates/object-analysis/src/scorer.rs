//! Suspiciousness scoring
//!
//! Additive evidence that a detection is a prohibited handheld item:
//! classification, box shape, box size, hand proximity, and a boost for
//! detectors that under-score true positives.

use detection_types::{HandDetection, ObjectDetection};
use serde::{Deserialize, Serialize};

use crate::lexicon::{classify, ObjectCategory};

/// Weights and thresholds of the scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Label in the phone lexicon
    pub phone_class: u32,
    /// Label in the lookalike lexicon
    pub lookalike_class: u32,

    /// Aspect ratio (w/h) of a phone held upright
    pub portrait_range: (f32, f32),
    /// Aspect ratio of a phone held sideways
    pub landscape_range: (f32, f32),
    pub loose_portrait_range: (f32, f32),
    pub loose_landscape_range: (f32, f32),
    pub shape_match: u32,
    pub shape_loose_match: u32,

    /// Longest box side (pixels) of a handheld object
    pub handheld_size_range: (f32, f32),
    pub wide_size_range: (f32, f32),
    pub size_match: u32,
    pub size_loose_match: u32,

    /// Bonus for an object overlapping a hand, plus `confidence * weight`
    pub hand_proximity_base: u32,
    pub hand_confidence_weight: f32,

    /// Detections scored below this get `(ceiling - score) * weight` extra
    pub low_confidence_ceiling: f32,
    pub low_confidence_weight: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            phone_class: 100,
            lookalike_class: 25,
            portrait_range: (0.4, 0.6),
            landscape_range: (1.6, 2.5),
            loose_portrait_range: (0.3, 0.75),
            loose_landscape_range: (1.3, 3.0),
            shape_match: 50,
            shape_loose_match: 25,
            handheld_size_range: (60.0, 250.0),
            wide_size_range: (30.0, 400.0),
            size_match: 25,
            size_loose_match: 10,
            hand_proximity_base: 50,
            hand_confidence_weight: 20.0,
            low_confidence_ceiling: 0.6,
            low_confidence_weight: 50.0,
        }
    }
}

/// Per-frame context the scorer needs beyond the detection itself
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameContext<'a> {
    pub hands: &'a [HandDetection],
}

/// Individual score terms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub classification: u32,
    pub shape: u32,
    pub size: u32,
    pub context: u32,
    pub low_confidence_boost: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.classification + self.shape + self.size + self.context + self.low_confidence_boost
    }
}

fn within(value: f32, range: (f32, f32)) -> bool {
    value >= range.0 && value <= range.1
}

/// Score every term for one detection
pub fn score_breakdown(
    detection: &ObjectDetection,
    context: &FrameContext<'_>,
    weights: &ScoringWeights,
) -> ScoreBreakdown {
    let classification = match classify(&detection.class) {
        ObjectCategory::Phone => weights.phone_class,
        ObjectCategory::Lookalike => weights.lookalike_class,
        _ => 0,
    };

    let shape = match detection.bbox.aspect_ratio() {
        Some(r) if within(r, weights.portrait_range) || within(r, weights.landscape_range) => {
            weights.shape_match
        }
        Some(r)
            if within(r, weights.loose_portrait_range)
                || within(r, weights.loose_landscape_range) =>
        {
            weights.shape_loose_match
        }
        _ => 0,
    };

    let longest = detection.bbox.longest_side();
    let size = if within(longest, weights.handheld_size_range) {
        weights.size_match
    } else if within(longest, weights.wide_size_range) {
        weights.size_loose_match
    } else {
        0
    };

    let context_score = hand_proximity(detection, context, weights);

    let mut breakdown = ScoreBreakdown {
        classification,
        shape,
        size,
        context: context_score,
        low_confidence_boost: 0,
    };

    if detection.score < weights.low_confidence_ceiling && breakdown.total() > 0 {
        breakdown.low_confidence_boost = ((weights.low_confidence_ceiling - detection.score)
            * weights.low_confidence_weight)
            .round() as u32;
    }

    breakdown
}

/// Total suspiciousness of one detection
pub fn suspiciousness(
    detection: &ObjectDetection,
    context: &FrameContext<'_>,
    weights: &ScoringWeights,
) -> u32 {
    score_breakdown(detection, context, weights).total()
}

/// Bonus from the nearest hand within reach of the object; nothing without hands
fn hand_proximity(
    detection: &ObjectDetection,
    context: &FrameContext<'_>,
    weights: &ScoringWeights,
) -> u32 {
    let object_half = detection.bbox.longest_side() / 2.0;
    context
        .hands
        .iter()
        .filter_map(|hand| {
            let distance = hand.bbox.center_distance(&detection.bbox);
            let reach = hand.bbox.longest_side() / 2.0 + object_half;
            (distance < reach).then_some((hand, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(0, |(hand, _)| {
            weights.hand_proximity_base
                + (hand.confidence * weights.hand_confidence_weight).round() as u32
        })
}
