//! Per-type hysteresis tracking
//!
//! Each registered object type keeps a consecutive-detection count that only
//! grows on medium/high confidence sightings and survives a grace period of
//! missed frames. Reaching the type's threshold raises a violation and keeps
//! a fraction of the count so the same object does not re-fire immediately.

use alerting::{Severity, Violation, ViolationEmitter, ViolationKind};
use detection_types::{ObjectDetection, TimestampMs};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::lexicon::{matches_any, PHONE_TERMS};
use crate::ObjectAnalysisError;

/// Score thresholds for the confidence tiers of one object type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceTiers {
    pub high: f32,
    pub medium: f32,
    pub low: f32,
}

impl Default for ConfidenceTiers {
    fn default() -> Self {
        Self {
            high: 0.8,
            medium: 0.5,
            low: 0.2,
        }
    }
}

/// Tier a detection score falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    /// Extends the grace period without building confidence
    Low,
    /// Treated as absent
    Ignored,
}

impl ConfidenceTiers {
    pub fn classify(&self, score: f32) -> ConfidenceTier {
        if score >= self.high {
            ConfidenceTier::High
        } else if score >= self.medium {
            ConfidenceTier::Medium
        } else if score >= self.low {
            ConfidenceTier::Low
        } else {
            ConfidenceTier::Ignored
        }
    }

    fn validate(&self) -> Result<(), ObjectAnalysisError> {
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if !(in_unit(self.high) && in_unit(self.medium) && in_unit(self.low)) {
            return Err(ObjectAnalysisError::InvalidConfig(format!(
                "confidence tiers must lie in [0, 1]: {:?}",
                self
            )));
        }
        if !(self.low <= self.medium && self.medium <= self.high) {
            return Err(ObjectAnalysisError::InvalidConfig(format!(
                "confidence tiers must satisfy low <= medium <= high: {:?}",
                self
            )));
        }
        Ok(())
    }
}

fn default_grace_period() -> u32 {
    2
}

fn default_violation_threshold() -> u32 {
    3
}

/// Hysteresis parameters of one tracked object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectTypeSpec {
    pub name: String,
    /// Labels that count as this type; the type name itself when empty
    #[serde(default)]
    pub class_names: Vec<String>,
    /// Missed frames tolerated before the count resets
    #[serde(default = "default_grace_period")]
    pub grace_period: u32,
    /// Consecutive detections needed for a violation
    #[serde(default = "default_violation_threshold")]
    pub violation_threshold: u32,
    #[serde(default)]
    pub tiers: ConfidenceTiers,
}

impl ObjectTypeSpec {
    /// Type with default grace period and threshold
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_names: Vec::new(),
            grace_period: default_grace_period(),
            violation_threshold: default_violation_threshold(),
            tiers: ConfidenceTiers::default(),
        }
    }

    pub fn mobile() -> Self {
        Self {
            class_names: PHONE_TERMS.iter().map(|s| s.to_string()).collect(),
            grace_period: 3,
            violation_threshold: 3,
            ..Self::new("mobile")
        }
    }

    pub fn book() -> Self {
        Self {
            class_names: vec!["book".into(), "notebook".into()],
            grace_period: 4,
            violation_threshold: 4,
            ..Self::new("book")
        }
    }

    pub fn laptop() -> Self {
        Self {
            class_names: vec!["laptop".into()],
            ..Self::new("laptop")
        }
    }

    /// Built-in tracked types
    pub fn builtin() -> Vec<Self> {
        vec![Self::mobile(), Self::book(), Self::laptop()]
    }

    /// Whether a model label counts as this type
    pub fn matches(&self, label: &str) -> bool {
        if self.class_names.is_empty() {
            matches_any(label, &[self.name.as_str()])
        } else {
            matches_any(label, &self.class_names)
        }
    }

    fn validate(&self) -> Result<(), ObjectAnalysisError> {
        if self.name.trim().is_empty() {
            return Err(ObjectAnalysisError::InvalidConfig(
                "object type name must not be empty".into(),
            ));
        }
        if self.violation_threshold == 0 {
            return Err(ObjectAnalysisError::InvalidConfig(format!(
                "violation threshold of '{}' must be at least 1",
                self.name
            )));
        }
        self.tiers.validate()
    }
}

/// Optional overrides when registering a type at runtime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectTypeOverrides {
    pub class_names: Option<Vec<String>>,
    pub grace_period: Option<u32>,
    pub violation_threshold: Option<u32>,
    pub tiers: Option<ConfidenceTiers>,
}

impl ObjectTypeOverrides {
    /// Apply overrides on top of the defaults for `name`
    pub fn into_spec(self, name: &str) -> ObjectTypeSpec {
        let base = ObjectTypeSpec::new(name);
        ObjectTypeSpec {
            class_names: self.class_names.unwrap_or(base.class_names),
            grace_period: self.grace_period.unwrap_or(base.grace_period),
            violation_threshold: self.violation_threshold.unwrap_or(base.violation_threshold),
            tiers: self.tiers.unwrap_or(base.tiers),
            name: base.name,
        }
    }
}

/// Hysteresis state of one tracked type
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectTrackState {
    pub consecutive_detections: u32,
    pub missed_frames: u32,
    pub last_detection_ms: Option<TimestampMs>,
    /// Score of the last medium/high tier sighting, 0 after a reset
    pub confidence: f32,
}

/// A registered type and its state
#[derive(Debug, Clone)]
pub struct TrackedObject {
    pub spec: ObjectTypeSpec,
    pub state: ObjectTrackState,
}

impl TrackedObject {
    fn new(spec: ObjectTypeSpec) -> Self {
        Self {
            spec,
            state: ObjectTrackState::default(),
        }
    }

    /// Operator-facing summary of the state
    pub fn human_status(&self) -> String {
        let s = &self.state;
        if s.consecutive_detections >= self.spec.violation_threshold {
            "confirmed".to_string()
        } else if s.consecutive_detections > 0 && s.missed_frames == 0 {
            format!(
                "detected ({}/{})",
                s.consecutive_detections, self.spec.violation_threshold
            )
        } else if s.consecutive_detections > 0 {
            format!("recently seen ({} missed)", s.missed_frames)
        } else {
            "not detected".to_string()
        }
    }
}

/// Hysteresis tracker for all registered object types
#[derive(Debug, Clone)]
pub struct HysteresisTracker {
    types: Vec<TrackedObject>,
    /// Share of the threshold kept after a violation
    retention_fraction: f32,
}

impl HysteresisTracker {
    /// Create a tracker for the given types
    pub fn new(
        specs: Vec<ObjectTypeSpec>,
        retention_fraction: f32,
    ) -> Result<Self, ObjectAnalysisError> {
        if !(0.0..1.0).contains(&retention_fraction) {
            return Err(ObjectAnalysisError::InvalidConfig(format!(
                "retention fraction {} must lie in [0, 1)",
                retention_fraction
            )));
        }
        let mut tracker = Self {
            types: Vec::with_capacity(specs.len()),
            retention_fraction,
        };
        for spec in specs {
            tracker.register(spec)?;
        }
        Ok(tracker)
    }

    /// Add a tracked type; rejected types leave the tracker unchanged
    pub fn register(&mut self, spec: ObjectTypeSpec) -> Result<(), ObjectAnalysisError> {
        spec.validate()?;
        if self.get(&spec.name).is_some() {
            return Err(ObjectAnalysisError::DuplicateType(spec.name));
        }
        info!(
            "Tracking object type '{}' (grace {}, threshold {})",
            spec.name, spec.grace_period, spec.violation_threshold
        );
        self.types.push(TrackedObject::new(spec));
        Ok(())
    }

    /// Tracked type by name
    pub fn get(&self, name: &str) -> Option<&TrackedObject> {
        self.types.iter().find(|t| t.spec.name == name)
    }

    /// State of a tracked type by name
    pub fn state(&self, name: &str) -> Option<&ObjectTrackState> {
        self.get(name).map(|t| &t.state)
    }

    /// All tracked types in registration order
    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject> {
        self.types.iter()
    }

    /// Whether any tracked type claims the label
    pub fn tracks_label(&self, label: &str) -> bool {
        self.types.iter().any(|t| t.spec.matches(label))
    }

    /// Advance every tracked type by one tick
    pub fn update(
        &mut self,
        detections: &[ObjectDetection],
        emitter: &mut ViolationEmitter,
        now: TimestampMs,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        let retention = self.retention_fraction;

        for tracked in &mut self.types {
            let best = detections
                .iter()
                .filter(|d| tracked.spec.matches(&d.class))
                .max_by(|a, b| a.score.total_cmp(&b.score));

            let tier = best
                .map(|d| tracked.spec.tiers.classify(d.score))
                .unwrap_or(ConfidenceTier::Ignored);
            let state = &mut tracked.state;

            match (tier, best) {
                (ConfidenceTier::High | ConfidenceTier::Medium, Some(d)) => {
                    state.consecutive_detections += 1;
                    state.missed_frames = 0;
                    state.confidence = d.score;
                    state.last_detection_ms = Some(now);
                }
                (ConfidenceTier::Low, Some(_)) => {
                    state.missed_frames = 0;
                }
                _ => {
                    state.missed_frames += 1;
                    if state.missed_frames > tracked.spec.grace_period {
                        if state.consecutive_detections > 0 {
                            debug!(
                                "'{}' lost after {} missed frames",
                                tracked.spec.name, state.missed_frames
                            );
                        }
                        state.consecutive_detections = 0;
                        state.confidence = 0.0;
                    }
                }
            }

            let threshold = tracked.spec.violation_threshold;
            let tiers = tracked.spec.tiers;
            if state.consecutive_detections >= threshold && state.confidence >= tiers.medium {
                let severity = if state.confidence >= tiers.high
                    || state.consecutive_detections >= threshold + 2
                {
                    Severity::High
                } else {
                    Severity::Medium
                };
                let message = format!(
                    "{} detected in {} consecutive frames (confidence {:.2})",
                    tracked.spec.name, state.consecutive_detections, state.confidence
                );
                if let Some(v) = emitter.emit(
                    ViolationKind::ProhibitedObject {
                        object_type: tracked.spec.name.clone(),
                    },
                    message,
                    severity,
                    Some(state.confidence),
                    now,
                ) {
                    violations.push(v);
                }
                state.consecutive_detections = (threshold as f32 * retention).floor() as u32;
            }
        }

        violations
    }

    /// Zero every state, keeping registrations
    pub fn reset(&mut self) {
        for tracked in &mut self.types {
            tracked.state = ObjectTrackState::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detection_types::BBox;

    fn phone(score: f32) -> ObjectDetection {
        ObjectDetection::new("cell phone", score, BBox::new(0.0, 0.0, 60.0, 120.0))
    }

    fn book(score: f32) -> ObjectDetection {
        ObjectDetection::new("book", score, BBox::new(0.0, 0.0, 150.0, 200.0))
    }

    fn tracker() -> HysteresisTracker {
        HysteresisTracker::new(ObjectTypeSpec::builtin(), 0.5).unwrap()
    }

    #[test]
    fn test_medium_detections_fire_once() {
        let mut t = tracker();
        let mut emitter = ViolationEmitter::default();
        let mut fired = 0;
        for tick in 0..4u64 {
            fired += t.update(&[phone(0.6)], &mut emitter, tick * 1000).len();
        }
        assert_eq!(fired, 1);
        // threshold 3 keeps floor(3 * 0.5) = 1, plus the fourth detection
        assert_eq!(t.state("mobile").unwrap().consecutive_detections, 2);
    }

    #[test]
    fn test_severity_high_for_high_confidence() {
        let mut t = tracker();
        let mut emitter = ViolationEmitter::default();
        let mut out = Vec::new();
        for tick in 0..3u64 {
            out.extend(t.update(&[phone(0.9)], &mut emitter, tick));
        }
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].severity, Severity::High);
        assert_eq!(
            out[0].kind,
            ViolationKind::ProhibitedObject { object_type: "mobile".into() }
        );
    }

    #[test]
    fn test_low_tier_resets_misses_only() {
        let mut t = tracker();
        let mut emitter = ViolationEmitter::default();
        t.update(&[phone(0.6)], &mut emitter, 0);
        t.update(&[], &mut emitter, 1);
        assert_eq!(t.state("mobile").unwrap().missed_frames, 1);

        t.update(&[phone(0.3)], &mut emitter, 2);
        let s = t.state("mobile").unwrap();
        assert_eq!(s.missed_frames, 0);
        assert_eq!(s.consecutive_detections, 1);
    }

    #[test]
    fn test_below_low_tier_counts_as_miss() {
        let mut t = tracker();
        let mut emitter = ViolationEmitter::default();
        t.update(&[phone(0.1)], &mut emitter, 0);
        assert_eq!(t.state("mobile").unwrap().missed_frames, 1);
        assert_eq!(t.state("mobile").unwrap().consecutive_detections, 0);
    }

    #[test]
    fn test_grace_period_default_type() {
        let mut t = HysteresisTracker::new(vec![ObjectTypeSpec::new("laptop")], 0.5).unwrap();
        let mut emitter = ViolationEmitter::default();
        let laptop = ObjectDetection::new("laptop", 0.6, BBox::new(0.0, 0.0, 300.0, 200.0));

        t.update(&[laptop.clone()], &mut emitter, 0);
        t.update(&[], &mut emitter, 1);
        t.update(&[laptop.clone()], &mut emitter, 2);
        assert_eq!(t.state("laptop").unwrap().consecutive_detections, 2);

        for tick in 3..6 {
            t.update(&[], &mut emitter, tick);
        }
        let s = t.state("laptop").unwrap();
        assert_eq!(s.consecutive_detections, 0);
        assert_eq!(s.confidence, 0.0);
        assert_eq!(s.missed_frames, 3);
    }

    #[test]
    fn test_book_with_gaps_fires_on_fourth_detection() {
        let mut t = tracker();
        let mut emitter = ViolationEmitter::default();
        let stream = [Some(0.55), None, Some(0.6), None, Some(0.58), None];
        for (tick, score) in stream.iter().enumerate() {
            let frame: Vec<_> = score.map(book).into_iter().collect();
            assert!(t.update(&frame, &mut emitter, tick as u64).is_empty());
        }
        assert_eq!(t.state("book").unwrap().consecutive_detections, 3);

        let fired = t.update(&[book(0.57)], &mut emitter, 6);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].severity, Severity::Medium);
        assert_eq!(t.state("book").unwrap().consecutive_detections, 2);
    }

    #[test]
    fn test_register_rejects_invalid() {
        let mut t = tracker();
        assert!(matches!(
            t.register(ObjectTypeSpec::new("mobile")),
            Err(ObjectAnalysisError::DuplicateType(_))
        ));
        let bad = ObjectTypeSpec {
            violation_threshold: 0,
            ..ObjectTypeSpec::new("headphones")
        };
        assert!(t.register(bad).is_err());
        let bad_tiers = ObjectTypeOverrides {
            tiers: Some(ConfidenceTiers { high: 0.4, medium: 0.5, low: 0.2 }),
            ..Default::default()
        };
        assert!(t.register(bad_tiers.into_spec("earbuds")).is_err());
        assert_eq!(t.iter().count(), 3);
    }

    #[test]
    fn test_register_with_overrides() {
        let mut t = tracker();
        let spec = ObjectTypeOverrides {
            grace_period: Some(5),
            ..Default::default()
        }
        .into_spec("headphones");
        t.register(spec).unwrap();
        let tracked = t.get("headphones").unwrap();
        assert_eq!(tracked.spec.grace_period, 5);
        assert_eq!(tracked.spec.violation_threshold, 3);
        assert!(t.tracks_label("Headphones"));
    }

    #[test]
    fn test_invalid_retention_fraction() {
        assert!(HysteresisTracker::new(ObjectTypeSpec::builtin(), 1.0).is_err());
    }

    #[test]
    fn test_human_status() {
        let mut t = tracker();
        let mut emitter = ViolationEmitter::default();
        assert_eq!(t.get("mobile").unwrap().human_status(), "not detected");
        t.update(&[phone(0.6)], &mut emitter, 0);
        assert_eq!(t.get("mobile").unwrap().human_status(), "detected (1/3)");
        t.update(&[], &mut emitter, 1);
        assert_eq!(t.get("mobile").unwrap().human_status(), "recently seen (1 missed)");
    }
}
