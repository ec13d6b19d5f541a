//! Violation pathway arbitration and the held-object timer

use std::collections::BTreeMap;

use alerting::{Pathway, Severity, Violation, ViolationEmitter, ViolationKind};
use detection_types::TimestampMs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::ScoredDetection;
use crate::lexicon::ObjectCategory;

/// Count needed for a pathway to fire and the severity it fires with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathwayRule {
    pub fire_at: u32,
    pub severity: Severity,
}

impl PathwayRule {
    pub const fn new(fire_at: u32, severity: Severity) -> Self {
        Self { fire_at, severity }
    }
}

/// Pathway thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathwayConfig {
    pub direct: PathwayRule,
    pub misclassified_min_score: u32,
    pub misclassified: PathwayRule,
    pub person_min_score: u32,
    pub person: PathwayRule,
    pub very_high_min_score: u32,
    pub very_high: PathwayRule,
    pub sustained_min_score: u32,
    pub sustained: PathwayRule,
}

impl Default for PathwayConfig {
    fn default() -> Self {
        Self {
            direct: PathwayRule::new(3, Severity::High),
            misclassified_min_score: 100,
            misclassified: PathwayRule::new(2, Severity::High),
            person_min_score: 75,
            person: PathwayRule::new(4, Severity::Medium),
            very_high_min_score: 150,
            very_high: PathwayRule::new(1, Severity::High),
            sustained_min_score: 50,
            sustained: PathwayRule::new(5, Severity::Medium),
        }
    }
}

impl PathwayConfig {
    pub fn rule(&self, pathway: Pathway) -> PathwayRule {
        match pathway {
            Pathway::DirectClassification => self.direct,
            Pathway::MisclassifiedObject => self.misclassified,
            Pathway::PersonWithObject => self.person,
            Pathway::VeryHighSuspicion => self.very_high,
            Pathway::SustainedSuspicion => self.sustained,
        }
    }
}

enum Advance {
    Counting,
    Fired(Option<Violation>),
}

/// Multi-pathway violation arbiter
#[derive(Debug, Clone)]
pub struct PathwayArbiter {
    config: PathwayConfig,
    counts: BTreeMap<Pathway, u32>,
}

impl PathwayArbiter {
    pub fn new(config: PathwayConfig) -> Self {
        Self {
            config,
            counts: Pathway::ALL.iter().map(|p| (*p, 0)).collect(),
        }
    }

    /// First pathway a detection satisfies, in priority order
    pub fn match_pathway(&self, scored: &ScoredDetection<'_>) -> Option<Pathway> {
        let c = &self.config;
        if scored.category == ObjectCategory::Phone {
            Some(Pathway::DirectClassification)
        } else if scored.category == ObjectCategory::Lookalike
            && scored.score >= c.misclassified_min_score
        {
            Some(Pathway::MisclassifiedObject)
        } else if scored.category == ObjectCategory::Person && scored.score >= c.person_min_score {
            Some(Pathway::PersonWithObject)
        } else if scored.score >= c.very_high_min_score {
            Some(Pathway::VeryHighSuspicion)
        } else if scored.score >= c.sustained_min_score {
            Some(Pathway::SustainedSuspicion)
        } else {
            None
        }
    }

    /// Evaluate one tick; at most one pathway fires
    pub fn evaluate(
        &mut self,
        scored: &[ScoredDetection<'_>],
        emitter: &mut ViolationEmitter,
        now: TimestampMs,
    ) -> Option<Violation> {
        let mut sustained_candidate: Option<&ScoredDetection<'_>> = None;
        let mut any_moderate = false;

        for s in scored {
            if s.score >= self.config.sustained_min_score {
                any_moderate = true;
            }
            match self.match_pathway(s) {
                Some(Pathway::SustainedSuspicion) => {
                    sustained_candidate.get_or_insert(s);
                }
                Some(pathway) => {
                    if let Advance::Fired(v) = self.advance(pathway, s, emitter, now) {
                        return v;
                    }
                }
                None => {}
            }
        }

        // The sustained counter moves at most once per tick
        match sustained_candidate {
            Some(s) => match self.advance(Pathway::SustainedSuspicion, s, emitter, now) {
                Advance::Fired(v) => v,
                Advance::Counting => None,
            },
            None => {
                if !any_moderate {
                    self.counts.insert(Pathway::SustainedSuspicion, 0);
                }
                None
            }
        }
    }

    fn advance(
        &mut self,
        pathway: Pathway,
        s: &ScoredDetection<'_>,
        emitter: &mut ViolationEmitter,
        now: TimestampMs,
    ) -> Advance {
        let rule = self.config.rule(pathway);
        let count = self.counts.entry(pathway).or_insert(0);
        *count += 1;
        debug!(
            "Pathway {} count {}/{} ('{}' score {})",
            pathway.as_str(),
            count,
            rule.fire_at,
            s.detection.class,
            s.score
        );
        if *count < rule.fire_at {
            return Advance::Counting;
        }

        self.reset();
        // A cooldown may suppress the record; the pathway still counts as fired
        Advance::Fired(emitter.emit(
            ViolationKind::SuspiciousObject { pathway },
            format!(
                "Suspicious object via {}: '{}' (suspiciousness {}, score {:.2})",
                pathway.as_str(),
                s.detection.class,
                s.score,
                s.detection.score
            ),
            rule.severity,
            None,
            now,
        ))
    }

    /// Current count of every pathway
    pub fn counts(&self) -> &BTreeMap<Pathway, u32> {
        &self.counts
    }

    /// Zero all pathway counters
    pub fn reset(&mut self) {
        for count in self.counts.values_mut() {
            *count = 0;
        }
    }
}

/// Timer for a phone-like object held continuously
#[derive(Debug, Clone)]
pub struct HeldObjectTimer {
    duration_ms: u64,
    started_ms: Option<TimestampMs>,
}

impl HeldObjectTimer {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            started_ms: None,
        }
    }

    /// When the current hold started
    pub fn started_ms(&self) -> Option<TimestampMs> {
        self.started_ms
    }

    /// Advance the timer.
    ///
    /// `object_violation_fired` restarts the timer at `now` so the hold is not
    /// reported on top of a tracker or pathway violation.
    pub fn update(
        &mut self,
        phone_present: bool,
        object_violation_fired: bool,
        emitter: &mut ViolationEmitter,
        now: TimestampMs,
    ) -> Option<Violation> {
        if !phone_present {
            self.started_ms = None;
            return None;
        }
        if object_violation_fired {
            self.started_ms = Some(now);
            return None;
        }

        let started = *self.started_ms.get_or_insert(now);
        let held_ms = now.saturating_sub(started);
        if held_ms < self.duration_ms {
            return None;
        }

        self.started_ms = Some(now);
        emitter.emit(
            ViolationKind::ObjectHeld,
            format!("Phone-like object held for {:.1}s", held_ms as f64 / 1000.0),
            Severity::Medium,
            None,
            now,
        )
    }

    pub fn reset(&mut self) {
        self.started_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::classify;
    use detection_types::{BBox, ObjectDetection};

    fn scored(d: &ObjectDetection, score: u32) -> ScoredDetection<'_> {
        ScoredDetection {
            detection: d,
            category: classify(&d.class),
            score,
            tracked: false,
        }
    }

    fn det(class: &str) -> ObjectDetection {
        ObjectDetection::new(class, 0.65, BBox::new(0.0, 0.0, 60.0, 120.0))
    }

    #[test]
    fn test_priority_order() {
        let arbiter = PathwayArbiter::new(PathwayConfig::default());
        let phone = det("cell phone");
        let remote = det("remote");
        let person = det("person");
        let umbrella = det("umbrella");

        assert_eq!(arbiter.match_pathway(&scored(&phone, 0)), Some(Pathway::DirectClassification));
        assert_eq!(arbiter.match_pathway(&scored(&remote, 120)), Some(Pathway::MisclassifiedObject));
        assert_eq!(arbiter.match_pathway(&scored(&person, 160)), Some(Pathway::PersonWithObject));
        assert_eq!(arbiter.match_pathway(&scored(&umbrella, 150)), Some(Pathway::VeryHighSuspicion));
        assert_eq!(arbiter.match_pathway(&scored(&remote, 60)), Some(Pathway::SustainedSuspicion));
        assert_eq!(arbiter.match_pathway(&scored(&umbrella, 49)), None);
    }

    #[test]
    fn test_direct_fires_at_three_and_resets_all() {
        let mut arbiter = PathwayArbiter::new(PathwayConfig::default());
        let mut emitter = ViolationEmitter::default();
        let phone = det("cell phone");
        let remote = det("remote");

        // Bump another pathway first so the reset is observable
        assert!(arbiter.evaluate(&[scored(&remote, 110)], &mut emitter, 0).is_none());
        assert!(arbiter.evaluate(&[scored(&phone, 175)], &mut emitter, 1).is_none());
        assert!(arbiter.evaluate(&[scored(&phone, 175)], &mut emitter, 2).is_none());
        let v = arbiter.evaluate(&[scored(&phone, 175)], &mut emitter, 3).unwrap();

        assert_eq!(v.severity, Severity::High);
        assert_eq!(v.kind, ViolationKind::SuspiciousObject { pathway: Pathway::DirectClassification });
        assert!(arbiter.counts().values().all(|c| *c == 0));
    }

    #[test]
    fn test_misclassified_fires_at_two_and_resets_all() {
        let mut arbiter = PathwayArbiter::new(PathwayConfig::default());
        let mut emitter = ViolationEmitter::default();
        let remote = det("remote");
        let cup = det("cup");

        assert!(arbiter.evaluate(&[scored(&cup, 60)], &mut emitter, 0).is_none());
        assert!(arbiter.evaluate(&[scored(&remote, 125)], &mut emitter, 1).is_none());
        assert_eq!(arbiter.counts()[&Pathway::MisclassifiedObject], 1);
        assert_eq!(arbiter.counts()[&Pathway::SustainedSuspicion], 1);

        let v = arbiter.evaluate(&[scored(&remote, 125)], &mut emitter, 2).unwrap();
        assert_eq!(v.severity, Severity::High);
        assert_eq!(v.kind, ViolationKind::SuspiciousObject { pathway: Pathway::MisclassifiedObject });
        assert!(arbiter.counts().values().all(|c| *c == 0));
    }

    #[test]
    fn test_very_high_fires_immediately() {
        let mut arbiter = PathwayArbiter::new(PathwayConfig::default());
        let mut emitter = ViolationEmitter::default();
        let umbrella = det("umbrella");
        let v = arbiter.evaluate(&[scored(&umbrella, 155)], &mut emitter, 0).unwrap();
        assert_eq!(v.kind, ViolationKind::SuspiciousObject { pathway: Pathway::VeryHighSuspicion });
    }

    #[test]
    fn test_one_firing_per_tick() {
        let mut arbiter = PathwayArbiter::new(PathwayConfig::default());
        let mut emitter = ViolationEmitter::default();
        let a = det("umbrella");
        let b = det("kite");
        let v = arbiter.evaluate(&[scored(&a, 155), scored(&b, 160)], &mut emitter, 0);
        assert!(v.is_some());
        assert_eq!(emitter.total_emitted(), 1);
        assert!(arbiter.counts().values().all(|c| *c == 0));
    }

    #[test]
    fn test_sustained_counter_resets_on_quiet_tick() {
        let mut arbiter = PathwayArbiter::new(PathwayConfig::default());
        let mut emitter = ViolationEmitter::default();
        let cup = det("cup");

        for tick in 0..4 {
            assert!(arbiter.evaluate(&[scored(&cup, 60)], &mut emitter, tick).is_none());
        }
        assert_eq!(arbiter.counts()[&Pathway::SustainedSuspicion], 4);

        arbiter.evaluate(&[scored(&cup, 30)], &mut emitter, 4);
        assert_eq!(arbiter.counts()[&Pathway::SustainedSuspicion], 0);

        for tick in 5..9 {
            assert!(arbiter.evaluate(&[scored(&cup, 60)], &mut emitter, tick).is_none());
        }
        let v = arbiter.evaluate(&[scored(&cup, 60)], &mut emitter, 9).unwrap();
        assert_eq!(v.severity, Severity::Medium);
    }

    #[test]
    fn test_sustained_counts_once_per_tick() {
        let mut arbiter = PathwayArbiter::new(PathwayConfig::default());
        let mut emitter = ViolationEmitter::default();
        let cup = det("cup");
        let bottle = det("bottle");
        arbiter.evaluate(&[scored(&cup, 60), scored(&bottle, 70)], &mut emitter, 0);
        assert_eq!(arbiter.counts()[&Pathway::SustainedSuspicion], 1);
    }

    #[test]
    fn test_held_timer() {
        let mut timer = HeldObjectTimer::new(3000);
        let mut emitter = ViolationEmitter::default();

        assert!(timer.update(true, false, &mut emitter, 0).is_none());
        assert!(timer.update(true, false, &mut emitter, 2000).is_none());
        let v = timer.update(true, false, &mut emitter, 3000).unwrap();
        assert_eq!(v.kind, ViolationKind::ObjectHeld);
        assert_eq!(timer.started_ms(), Some(3000));

        // Other object violations restart the hold
        assert!(timer.update(true, true, &mut emitter, 5000).is_none());
        assert!(timer.update(true, false, &mut emitter, 7000).is_none());

        // No phone clears it
        timer.update(false, false, &mut emitter, 8000);
        assert_eq!(timer.started_ms(), None);
    }
}
