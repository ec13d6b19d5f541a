//! Object Analysis
//!
//! Turns per-frame object and hand detections into debounced violations:
//! - Suspiciousness scoring (classification, geometry, hand context)
//! - Per-type hysteresis tracking with grace periods
//! - Multi-pathway arbitration plus a held-object timer
//! - Heuristics for frames the object model likely got wrong

pub mod analysis;
pub mod arbiter;
pub mod config;
pub mod heuristic;
pub mod lexicon;
pub mod scorer;
pub mod tracker;

pub use analysis::{ObjectAnalysis, ScoredDetection, ScoredObject};
pub use arbiter::{HeldObjectTimer, PathwayArbiter, PathwayConfig, PathwayRule};
pub use config::ObjectAnalysisConfig;
pub use heuristic::{HeuristicConfig, MisclassificationHeuristic};
pub use lexicon::{classify, ObjectCategory};
pub use scorer::{score_breakdown, suspiciousness, FrameContext, ScoreBreakdown, ScoringWeights};
pub use tracker::{
    ConfidenceTier, ConfidenceTiers, HysteresisTracker, ObjectTrackState, ObjectTypeOverrides,
    ObjectTypeSpec, TrackedObject,
};

use std::collections::BTreeMap;

use alerting::{Pathway, ViolationEmitter, ViolationKind};
use detection_types::{HandDetection, ObjectDetection, TimestampMs};
use thiserror::Error;
use tracing::debug;

/// Object analysis error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectAnalysisError {
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Object type already registered: {0}")]
    DuplicateType(String),
}

/// Object pipeline: scorer, tracker, arbiter, held timer and heuristics
pub struct ObjectPipeline {
    config: ObjectAnalysisConfig,
    tracker: HysteresisTracker,
    arbiter: PathwayArbiter,
    held_timer: HeldObjectTimer,
    heuristic: MisclassificationHeuristic,
}

impl ObjectPipeline {
    /// Create a new object pipeline with configuration
    pub fn new(config: ObjectAnalysisConfig) -> Result<Self, ObjectAnalysisError> {
        Ok(Self {
            tracker: HysteresisTracker::new(config.types.clone(), config.retention_fraction)?,
            arbiter: PathwayArbiter::new(config.pathways.clone()),
            held_timer: HeldObjectTimer::new(config.held_object_ms),
            heuristic: MisclassificationHeuristic::new(config.heuristic.clone()),
            config,
        })
    }

    /// Install the cooldowns this pipeline relies on
    pub fn configure_emitter(&self, emitter: &mut ViolationEmitter) {
        emitter.set_cooldown(
            ViolationKind::HiddenObject.category(),
            self.config.heuristic.hidden_object_cooldown_ms,
        );
    }

    /// Analyze one tick of object and hand detections
    pub fn process(
        &mut self,
        detections: &[ObjectDetection],
        hands: &[HandDetection],
        emitter: &mut ViolationEmitter,
        now: TimestampMs,
    ) -> ObjectAnalysis {
        let context = FrameContext { hands };
        let scored: Vec<ScoredDetection<'_>> = detections
            .iter()
            .map(|d| ScoredDetection {
                detection: d,
                category: classify(&d.class),
                score: suspiciousness(d, &context, &self.config.scoring),
                tracked: self.tracker.tracks_label(&d.class),
            })
            .collect();

        let mut violations = self.tracker.update(detections, emitter, now);

        if let Some(v) = self.arbiter.evaluate(&scored, emitter, now) {
            violations.push(v);
        }

        let phone_present = scored.iter().any(|s| s.category == ObjectCategory::Phone);
        let object_fired = !violations.is_empty();
        if let Some(v) = self
            .held_timer
            .update(phone_present, object_fired, emitter, now)
        {
            violations.push(v);
        }

        violations.extend(self.heuristic.update(&scored, emitter, now));

        debug!(
            "Object tick: {} detections, {} hands, {} violations",
            detections.len(),
            hands.len(),
            violations.len()
        );

        ObjectAnalysis {
            scored: scored.iter().map(ScoredObject::from).collect(),
            violations,
        }
    }

    /// Register a tracked type at runtime
    pub fn register_object_type(
        &mut self,
        name: &str,
        overrides: ObjectTypeOverrides,
    ) -> Result<(), ObjectAnalysisError> {
        self.tracker.register(overrides.into_spec(name))
    }

    pub fn tracker(&self) -> &HysteresisTracker {
        &self.tracker
    }

    /// Current pathway counters
    pub fn pathway_counts(&self) -> BTreeMap<Pathway, u32> {
        self.arbiter.counts().clone()
    }

    pub fn heuristic(&self) -> &MisclassificationHeuristic {
        &self.heuristic
    }

    pub fn held_since(&self) -> Option<TimestampMs> {
        self.held_timer.started_ms()
    }

    /// Reset all per-session state (on session change)
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.arbiter.reset();
        self.held_timer.reset();
        self.heuristic.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detection_types::{BBox, Handedness};

    #[test]
    fn test_phone_stream_fires_tracker_and_direct_pathway() {
        let mut pipeline = ObjectPipeline::new(ObjectAnalysisConfig::default()).unwrap();
        let mut emitter = ViolationEmitter::default();
        let phone = ObjectDetection::new("cell phone", 0.65, BBox::new(100.0, 100.0, 60.0, 120.0));

        let mut all = Vec::new();
        for tick in 0..3u64 {
            let analysis = pipeline.process(&[phone.clone()], &[], &mut emitter, tick * 1000);
            all.push(analysis);
        }
        assert!(!all[0].has_violations());
        assert!(!all[1].has_violations());

        let kinds: Vec<_> = all[2].violations.iter().map(|v| v.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::ProhibitedObject { object_type: "mobile".into() },
                ViolationKind::SuspiciousObject { pathway: Pathway::DirectClassification },
            ]
        );
        assert!(pipeline.pathway_counts().values().all(|c| *c == 0));
        assert_eq!(all[2].max_suspiciousness(), 175);
    }

    #[test]
    fn test_held_object_after_three_seconds() {
        let config = ObjectAnalysisConfig {
            // Keep the tracker and direct pathway quiet
            types: vec![],
            pathways: PathwayConfig {
                direct: PathwayRule::new(100, alerting::Severity::High),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut pipeline = ObjectPipeline::new(config).unwrap();
        let mut emitter = ViolationEmitter::default();
        let phone = ObjectDetection::new("phone", 0.9, BBox::new(0.0, 0.0, 60.0, 120.0));

        for t in [0u64, 1000, 2000] {
            assert!(!pipeline.process(&[phone.clone()], &[], &mut emitter, t).has_violations());
        }
        let out = pipeline.process(&[phone.clone()], &[], &mut emitter, 3000);
        assert_eq!(out.violations.len(), 1);
        assert_eq!(out.violations[0].kind, ViolationKind::ObjectHeld);
    }

    #[test]
    fn test_person_with_hand_held_object() {
        let mut pipeline = ObjectPipeline::new(ObjectAnalysisConfig::default()).unwrap();
        let mut emitter = ViolationEmitter::default();
        pipeline.configure_emitter(&mut emitter);
        // Portrait person box near a hand: 50 shape + 10 size + 68 context
        let person = ObjectDetection::new("person", 0.9, BBox::new(100.0, 50.0, 150.0, 300.0));
        let hands = [HandDetection::new(
            BBox::new(150.0, 150.0, 80.0, 80.0),
            Handedness::Right,
            0.9,
        )];

        let mut fired = Vec::new();
        for tick in 0..4u64 {
            fired.extend(pipeline.process(&[person.clone()], &hands, &mut emitter, tick).violations);
        }
        assert_eq!(fired.len(), 1);
        assert_eq!(
            fired[0].kind,
            ViolationKind::SuspiciousObject { pathway: Pathway::PersonWithObject }
        );
        assert_eq!(fired[0].severity, alerting::Severity::Medium);
    }

    #[test]
    fn test_headphones_are_not_phones() {
        let mut pipeline = ObjectPipeline::new(ObjectAnalysisConfig::default()).unwrap();
        let mut emitter = ViolationEmitter::default();
        pipeline
            .register_object_type("headphones", ObjectTypeOverrides::default())
            .unwrap();
        let headphones = ObjectDetection::new("headphones", 0.9, BBox::new(0.0, 0.0, 100.0, 100.0));

        let mut fired = Vec::new();
        for tick in 0..3u64 {
            fired.extend(pipeline.process(&[headphones.clone()], &[], &mut emitter, tick * 1000).violations);
        }
        let categories: Vec<_> = fired.iter().map(|v| v.kind.category()).collect();
        assert_eq!(categories, vec!["prohibited_object:headphones"]);
        assert_eq!(pipeline.tracker().get("mobile").unwrap().state.consecutive_detections, 0);
        assert_eq!(pipeline.held_since(), None);
    }

    #[test]
    fn test_runtime_registration() {
        let mut pipeline = ObjectPipeline::new(ObjectAnalysisConfig::default()).unwrap();
        pipeline
            .register_object_type("headphones", ObjectTypeOverrides::default())
            .unwrap();
        assert!(pipeline.tracker().get("headphones").is_some());
        assert!(pipeline
            .register_object_type("", ObjectTypeOverrides::default())
            .is_err());
    }
}
