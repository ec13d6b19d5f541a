//! Heuristics for frames where the object model likely failed
//!
//! - Person-only frames: a confident person and nothing else, sustained,
//!   suggests a held item the model did not label.
//! - Unknown objects: repeated low-confidence labels outside every lexicon.

use alerting::{Severity, Violation, ViolationEmitter, ViolationKind};
use detection_types::TimestampMs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::ScoredDetection;
use crate::lexicon::ObjectCategory;

/// Heuristic thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Minimum person score for a frame to count as person-only
    pub person_min_score: f32,
    /// Person-only frames needed for a hidden-object violation
    pub person_only_frames: u32,
    /// Minimum time between hidden-object violations (ms)
    pub hidden_object_cooldown_ms: u64,
    /// Unknown objects must score below this
    pub unknown_max_score: f32,
    /// Consecutive unknown-object frames needed for a violation
    pub unknown_frames: u32,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            person_min_score: 0.7,
            person_only_frames: 8,
            hidden_object_cooldown_ms: 10_000,
            unknown_max_score: 0.6,
            unknown_frames: 5,
        }
    }
}

/// Misclassified-object heuristic
#[derive(Debug, Clone)]
pub struct MisclassificationHeuristic {
    config: HeuristicConfig,
    person_only_frames: u32,
    unknown_frames: u32,
}

impl MisclassificationHeuristic {
    pub fn new(config: HeuristicConfig) -> Self {
        Self {
            config,
            person_only_frames: 0,
            unknown_frames: 0,
        }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// Current person-only frame count
    pub fn person_only_frames(&self) -> u32 {
        self.person_only_frames
    }

    /// Current unknown-object frame count
    pub fn unknown_frames(&self) -> u32 {
        self.unknown_frames
    }

    /// Run both heuristics over one tick's detections
    pub fn update(
        &mut self,
        scored: &[ScoredDetection<'_>],
        emitter: &mut ViolationEmitter,
        now: TimestampMs,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        if let Some(v) = self.update_person_only(scored, emitter, now) {
            violations.push(v);
        }
        if let Some(v) = self.update_unknown(scored, emitter, now) {
            violations.push(v);
        }
        violations
    }

    fn update_person_only(
        &mut self,
        scored: &[ScoredDetection<'_>],
        emitter: &mut ViolationEmitter,
        now: TimestampMs,
    ) -> Option<Violation> {
        let person_only =
            !scored.is_empty() && scored.iter().all(|s| s.category == ObjectCategory::Person);

        if !person_only {
            self.person_only_frames = 0;
            return None;
        }

        let best_person = scored
            .iter()
            .map(|s| s.detection.score)
            .fold(0.0f32, f32::max);
        if best_person >= self.config.person_min_score {
            self.person_only_frames += 1;
        } else {
            self.person_only_frames = self.person_only_frames.saturating_sub(1);
        }

        if self.person_only_frames < self.config.person_only_frames {
            return None;
        }

        let category = ViolationKind::HiddenObject.category();
        if emitter.is_cooling_down(&category, now) {
            debug!(
                "Hidden-object heuristic at {} frames, holding during cooldown",
                self.person_only_frames
            );
            return None;
        }

        let frames = self.person_only_frames;
        self.person_only_frames = 0;
        emitter.emit(
            ViolationKind::HiddenObject,
            format!(
                "Person visible for {} frames with no object identified; possible hidden object",
                frames
            ),
            Severity::Medium,
            None,
            now,
        )
    }

    fn update_unknown(
        &mut self,
        scored: &[ScoredDetection<'_>],
        emitter: &mut ViolationEmitter,
        now: TimestampMs,
    ) -> Option<Violation> {
        let unknown = scored.iter().find(|s| {
            !s.category.is_known() && !s.tracked && s.detection.score < self.config.unknown_max_score
        });

        let Some(unknown) = unknown else {
            self.unknown_frames = 0;
            return None;
        };

        self.unknown_frames += 1;
        if self.unknown_frames < self.config.unknown_frames {
            return None;
        }

        self.unknown_frames = 0;
        emitter.emit(
            ViolationKind::UnknownObject,
            format!(
                "Unrecognized object '{}' seen repeatedly at low confidence ({:.2})",
                unknown.detection.class, unknown.detection.score
            ),
            Severity::Medium,
            None,
            now,
        )
    }

    pub fn reset(&mut self) {
        self.person_only_frames = 0;
        self.unknown_frames = 0;
    }
}
