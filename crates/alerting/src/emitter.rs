//! Violation Emitter Implementation

use detection_types::TimestampMs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::violation::{Severity, Violation, ViolationKind};

/// Emitter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Confidence stamped on model-backed violations without an explicit value
    pub model_confidence: f32,
    /// Confidence stamped on heuristic violations without an explicit value
    pub heuristic_confidence: f32,
    /// Cooldown per category (ms), see [`ViolationKind::category`]
    pub cooldowns_ms: BTreeMap<String, u64>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            model_confidence: 0.85,
            heuristic_confidence: 0.6,
            cooldowns_ms: BTreeMap::new(),
        }
    }
}

/// Emission bookkeeping for one category
#[derive(Debug, Clone, Copy)]
pub struct CategoryState {
    /// Last time this category was emitted
    pub last_emitted_ms: TimestampMs,
    /// Number of times emitted
    pub emit_count: usize,
}

/// Central violation sink
///
/// Applies per-category cooldowns, stamps records, counts them, and forwards
/// them to the registered channel.
pub struct ViolationEmitter {
    /// Configuration
    config: EmitterConfig,
    /// Last emission per category
    states: HashMap<String, CategoryState>,
    /// Violations emitted this session
    total: usize,
    /// Registered output channel
    sink: Option<mpsc::UnboundedSender<Violation>>,
}

impl ViolationEmitter {
    /// Create a new emitter
    pub fn new(config: EmitterConfig) -> Self {
        info!("Creating violation emitter with config: {:?}", config);
        Self {
            config,
            states: HashMap::new(),
            total: 0,
            sink: None,
        }
    }

    /// Register the output channel, replacing any previous one
    pub fn set_sink(&mut self, sink: mpsc::UnboundedSender<Violation>) {
        self.sink = Some(sink);
    }

    /// Set the cooldown for a category
    pub fn set_cooldown(&mut self, category: impl Into<String>, cooldown_ms: u64) {
        self.config.cooldowns_ms.insert(category.into(), cooldown_ms);
    }

    /// Cooldown configured for a category (0 when none)
    pub fn cooldown_ms(&self, category: &str) -> u64 {
        self.config.cooldowns_ms.get(category).copied().unwrap_or(0)
    }

    /// Whether a category was emitted less than its cooldown ago
    pub fn is_cooling_down(&self, category: &str, now: TimestampMs) -> bool {
        let cooldown = self.cooldown_ms(category);
        if cooldown == 0 {
            return false;
        }
        self.states
            .get(category)
            .map(|s| now.saturating_sub(s.last_emitted_ms) < cooldown)
            .unwrap_or(false)
    }

    /// Emit a violation unless its category is cooling down
    pub fn emit(
        &mut self,
        kind: ViolationKind,
        message: impl Into<String>,
        severity: Severity,
        confidence: Option<f32>,
        now: TimestampMs,
    ) -> Option<Violation> {
        let category = kind.category();
        if self.is_cooling_down(&category, now) {
            debug!("Violation {} suppressed: in cooldown period", category);
            return None;
        }

        let confidence = confidence
            .unwrap_or(if kind.is_heuristic() {
                self.config.heuristic_confidence
            } else {
                self.config.model_confidence
            })
            .clamp(0.0, 1.0);

        let violation = Violation {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            severity,
            timestamp_ms: now,
            confidence,
        };

        self.record(&category, now);
        metrics::counter!("proctor_violations_total", "kind" => violation.kind.label())
            .increment(1);
        info!(
            "Violation emitted: {} severity={} confidence={:.2}: {}",
            category,
            severity.as_str(),
            confidence,
            violation.message
        );

        let sink_closed = self
            .sink
            .as_ref()
            .is_some_and(|sink| sink.send(violation.clone()).is_err());
        if sink_closed {
            warn!("Violation sink closed, dropping registration");
            self.sink = None;
        }

        Some(violation)
    }

    fn record(&mut self, category: &str, now: TimestampMs) {
        self.total += 1;
        let state = self
            .states
            .entry(category.to_string())
            .or_insert(CategoryState {
                last_emitted_ms: now,
                emit_count: 0,
            });
        state.last_emitted_ms = now;
        state.emit_count += 1;
    }

    /// Bookkeeping for a category, if it was ever emitted
    pub fn category_state(&self, category: &str) -> Option<CategoryState> {
        self.states.get(category).copied()
    }

    /// Violations emitted since creation or the last clear
    pub fn total_emitted(&self) -> usize {
        self.total
    }

    /// Clear all emission state, keeping configuration and sink
    pub fn clear(&mut self) {
        self.states.clear();
        self.total = 0;
    }
}

impl Default for ViolationEmitter {
    fn default() -> Self {
        Self::new(EmitterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_confidence_by_source() {
        let mut emitter = ViolationEmitter::default();
        let model = emitter
            .emit(ViolationKind::MultipleFaces, "two faces", Severity::High, None, 0)
            .unwrap();
        let heuristic = emitter
            .emit(ViolationKind::HiddenObject, "hidden", Severity::Medium, None, 0)
            .unwrap();
        assert!(model.confidence > heuristic.confidence);

        let explicit = emitter
            .emit(ViolationKind::NoFace, "absent", Severity::High, Some(1.7), 0)
            .unwrap();
        assert_eq!(explicit.confidence, 1.0);
    }

    #[test]
    fn test_cooldown() {
        let mut emitter = ViolationEmitter::default();
        emitter.set_cooldown("hidden_object", 10_000);

        assert!(emitter
            .emit(ViolationKind::HiddenObject, "a", Severity::Medium, None, 1_000)
            .is_some());
        assert!(emitter.is_cooling_down("hidden_object", 10_999));
        assert!(emitter
            .emit(ViolationKind::HiddenObject, "b", Severity::Medium, None, 10_999)
            .is_none());
        assert!(emitter
            .emit(ViolationKind::HiddenObject, "c", Severity::Medium, None, 11_000)
            .is_some());
        assert_eq!(emitter.total_emitted(), 2);
        assert_eq!(emitter.category_state("hidden_object").unwrap().emit_count, 2);
    }

    #[test]
    fn test_no_cooldown_by_default() {
        let mut emitter = ViolationEmitter::default();
        for _ in 0..3 {
            assert!(emitter
                .emit(ViolationKind::MultipleFaces, "m", Severity::High, None, 5)
                .is_some());
        }
        assert_eq!(emitter.total_emitted(), 3);
    }

    #[tokio::test]
    async fn test_sink_receives_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut emitter = ViolationEmitter::default();
        emitter.set_sink(tx);

        emitter.emit(ViolationKind::NoFace, "first", Severity::High, None, 1);
        emitter.emit(ViolationKind::MultipleFaces, "second", Severity::High, None, 2);

        assert_eq!(rx.recv().await.unwrap().message, "first");
        assert_eq!(rx.recv().await.unwrap().message, "second");
    }

    #[test]
    fn test_closed_sink_does_not_block_emission() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut emitter = ViolationEmitter::default();
        emitter.set_sink(tx);
        assert!(emitter
            .emit(ViolationKind::NoFace, "x", Severity::High, None, 1)
            .is_some());
        assert_eq!(emitter.total_emitted(), 1);
    }
}
