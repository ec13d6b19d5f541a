//! Proctor Engine
//!
//! Owns all mutable state of one monitored session:
//! - Record validation ahead of both pipelines
//! - Object pipeline (scorer, tracker, arbiter, held timer, heuristics)
//! - Focus monitor (face presence and gaze)
//! - The violation emitter shared by both
//!
//! The engine is driven by explicit ticks; [`SessionRunner`] drives it from
//! periodic provider calls.

pub mod config;
pub mod scheduler;
pub mod status;

pub use config::{EngineConfig, RunnerConfig};
pub use scheduler::{Providers, SessionRunner, SharedEngine};
pub use status::TrackingStatus;

use std::collections::BTreeMap;

use alerting::{Pathway, Violation, ViolationEmitter};
use data_validator::Validator;
use detection_types::{FaceSet, HandDetection, RawObjectDetection, TimestampMs};
use focus_monitor::{FocusError, FocusMonitor, FocusState};
use object_analysis::{ObjectAnalysisError, ObjectPipeline, ObjectTypeOverrides};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Engine error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Object analysis error: {0}")]
    Objects(#[from] ObjectAnalysisError),

    #[error("Focus monitor error: {0}")]
    Focus(#[from] FocusError),
}

/// Session engine
pub struct ProctorEngine {
    config: EngineConfig,
    validator: Validator,
    objects: ObjectPipeline,
    focus: FocusMonitor,
    emitter: ViolationEmitter,
    running: bool,
}

impl ProctorEngine {
    /// Create a new engine; configuration errors are reported here
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let objects = ObjectPipeline::new(config.objects.clone())?;
        let focus = FocusMonitor::new(config.focus.clone())?;
        let mut emitter = ViolationEmitter::new(config.emitter.clone());
        objects.configure_emitter(&mut emitter);
        focus.configure_emitter(&mut emitter);

        info!(
            "Proctor engine created with {} tracked object types",
            objects.tracker().iter().count()
        );

        Ok(Self {
            validator: Validator::new(config.validation.clone()),
            objects,
            focus,
            emitter,
            running: true,
            config,
        })
    }

    /// Object tick: validate records, then run the object pipeline
    pub fn process_objects(
        &mut self,
        raw_objects: Vec<RawObjectDetection>,
        hands: Vec<HandDetection>,
        now: TimestampMs,
    ) -> Vec<Violation> {
        if !self.running {
            debug!("Engine stopped, discarding object tick");
            return Vec::new();
        }

        let objects = self.validator.validate_objects(raw_objects);
        let hands = self.validator.validate_hands(hands);
        if !objects.is_clean() || !hands.is_clean() {
            debug!(
                "Object tick skipped {} malformed records",
                objects.errors.len() + hands.errors.len()
            );
        }

        self.objects
            .process(&objects.accepted, &hands.accepted, &mut self.emitter, now)
            .violations
    }

    /// Focus tick: validate the face set, then run the focus monitor
    pub fn process_faces(&mut self, faces: FaceSet, now: TimestampMs) -> Vec<Violation> {
        if !self.running {
            debug!("Engine stopped, discarding focus tick");
            return Vec::new();
        }

        let faces = self.validator.validate_faces(faces);
        self.focus
            .process(&faces.accepted, &mut self.emitter, now)
            .violations
    }

    /// Snapshot of every tracked type, keyed by type name
    pub fn tracking_status(&self) -> BTreeMap<String, TrackingStatus> {
        self.objects
            .tracker()
            .iter()
            .map(|t| (t.spec.name.clone(), TrackingStatus::from(t)))
            .collect()
    }

    /// Add a tracked object type at runtime
    pub fn register_object_type(
        &mut self,
        name: &str,
        overrides: ObjectTypeOverrides,
    ) -> Result<(), EngineError> {
        self.objects.register_object_type(name, overrides)?;
        info!("Registered object type '{}'", name);
        Ok(())
    }

    /// Register the violation output channel
    pub fn set_violation_sink(&mut self, sink: mpsc::UnboundedSender<Violation>) {
        self.emitter.set_sink(sink);
    }

    pub fn focus_state(&self) -> &FocusState {
        self.focus.state()
    }

    pub fn pathway_counts(&self) -> BTreeMap<Pathway, u32> {
        self.objects.pathway_counts()
    }

    /// Violations emitted this session
    pub fn total_violations(&self) -> usize {
        self.emitter.total_emitted()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stop accepting ticks; late results are discarded
    pub fn stop(&mut self) {
        if self.running {
            info!(
                "Stopping proctor engine after {} violations",
                self.emitter.total_emitted()
            );
        }
        self.running = false;
    }

    /// Check if engine accepts ticks
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start a new session with the same configuration
    pub fn reset(&mut self) {
        info!("Resetting proctor engine");
        self.objects.reset();
        self.focus.reset();
        self.emitter.clear();
        self.running = true;
    }
}
