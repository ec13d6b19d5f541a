//! Focus Monitor
//!
//! Face presence and gaze tracking over periodic face-mesh snapshots:
//! - Multiple-face and no-face detection
//! - Head-pose (yaw) estimation
//! - Normalized gaze-offset estimation with a dead zone
//! - Looking-away timers with restart after each violation

pub mod analysis;
pub mod config;
pub mod gaze;
pub mod state;

pub use analysis::FocusAnalysis;
pub use config::FocusConfig;
pub use gaze::{GazeOffsetEstimator, GazeReading, HeadPose, HeadPoseEstimator};
pub use state::{FocusPhase, FocusState, WarningKind};

use alerting::{GazeEstimator, Severity, ViolationEmitter, ViolationKind};
use detection_types::{Face, TimestampMs};
use thiserror::Error;
use tracing::{debug, info};

/// Focus monitor error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FocusError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Focus monitoring module
pub struct FocusMonitor {
    config: FocusConfig,
    head_pose: HeadPoseEstimator,
    gaze_offset: GazeOffsetEstimator,
    state: FocusState,
}

impl FocusMonitor {
    /// Create a new focus monitor with configuration
    pub fn new(config: FocusConfig) -> Result<Self, FocusError> {
        config.validate()?;
        Ok(Self {
            head_pose: HeadPoseEstimator::new(config.head_angle_degrees),
            gaze_offset: GazeOffsetEstimator::new(
                config.gaze_offset_threshold,
                config.gaze_dead_zone,
            ),
            state: FocusState::default(),
            config,
        })
    }

    /// Install the cooldowns this monitor relies on
    pub fn configure_emitter(&self, emitter: &mut ViolationEmitter) {
        let kind = ViolationKind::LookingAway {
            estimator: GazeEstimator::GazeOffset,
        };
        emitter.set_cooldown(kind.category(), self.config.gaze_cooldown_ms);
    }

    /// Analyze one face snapshot
    pub fn process(
        &mut self,
        faces: &[Face],
        emitter: &mut ViolationEmitter,
        now: TimestampMs,
    ) -> FocusAnalysis {
        self.state.face_count = faces.len();

        let analysis = match faces {
            [] => self.no_face(emitter, now),
            [face] => self.single_face(face, emitter, now),
            _ => self.multiple_faces(faces.len(), emitter, now),
        };

        debug!(
            "Focus tick: {} faces, phase {:?}, {} violations",
            faces.len(),
            self.state.phase,
            analysis.violations.len()
        );
        analysis
    }

    fn multiple_faces(
        &mut self,
        count: usize,
        emitter: &mut ViolationEmitter,
        now: TimestampMs,
    ) -> FocusAnalysis {
        self.state.phase = FocusPhase::MultipleFaces;
        self.state.is_no_face = false;
        self.state.no_face_start = None;
        self.state.clear_looking_away();
        self.gaze_offset.reset();
        self.state.raise_warning(WarningKind::MultipleFaces);

        let violations = emitter
            .emit(
                ViolationKind::MultipleFaces,
                format!("{} faces visible in frame", count),
                Severity::High,
                None,
                now,
            )
            .into_iter()
            .collect();

        FocusAnalysis {
            face_count: count,
            phase: self.state.phase,
            violations,
            ..Default::default()
        }
    }

    fn no_face(&mut self, emitter: &mut ViolationEmitter, now: TimestampMs) -> FocusAnalysis {
        self.state.phase = FocusPhase::NoFace;
        self.state.is_no_face = true;
        self.state.clear_looking_away();
        self.gaze_offset.reset();

        let start = *self.state.no_face_start.get_or_insert(now);
        let elapsed = FocusState::elapsed(start, now);
        let mut violations = Vec::new();

        if elapsed >= self.config.no_face_ms {
            info!("No face for {}ms", elapsed);
            violations.extend(emitter.emit(
                ViolationKind::NoFace,
                format!("No face visible for {:.1}s", elapsed as f64 / 1000.0),
                Severity::High,
                None,
                now,
            ));
            self.state.no_face_start = Some(now);
            self.state.raise_warning(WarningKind::NoFace);
        }

        FocusAnalysis {
            face_count: 0,
            phase: self.state.phase,
            violations,
            ..Default::default()
        }
    }

    fn single_face(
        &mut self,
        face: &Face,
        emitter: &mut ViolationEmitter,
        now: TimestampMs,
    ) -> FocusAnalysis {
        self.state.is_no_face = false;
        self.state.no_face_start = None;
        if matches!(
            self.state.warning_kind,
            Some(WarningKind::NoFace | WarningKind::MultipleFaces)
        ) {
            self.state.clear_warning();
        }

        let mut violations = Vec::new();

        // Head pose
        let head_pose = if self.config.head_pose_enabled {
            self.head_pose.estimate(face)
        } else {
            None
        };
        let head_away = head_pose.is_some_and(|p| self.head_pose.is_away(&p));
        if head_away {
            let start = *self.state.looking_away_start.get_or_insert(now);
            let elapsed = FocusState::elapsed(start, now);
            if elapsed >= self.config.looking_away_ms {
                let yaw = head_pose.map(|p| p.yaw).unwrap_or_default();
                violations.extend(emitter.emit(
                    ViolationKind::LookingAway {
                        estimator: GazeEstimator::HeadPose,
                    },
                    format!(
                        "Head turned {:.0} degrees away for {:.1}s",
                        yaw.abs(),
                        elapsed as f64 / 1000.0
                    ),
                    Severity::Medium,
                    None,
                    now,
                ));
                self.state.looking_away_start = Some(now);
            }
        } else {
            self.state.looking_away_start = None;
        }

        // Gaze offset
        let gaze = if self.config.gaze_offset_enabled {
            self.gaze_offset.update(face)
        } else {
            None
        };
        let gaze_away = gaze.is_some_and(|g| g.away);
        if gaze_away {
            self.state.gaze_away_frames += 1;
            let since = *self.state.gaze_away_since.get_or_insert(now);
            let elapsed = FocusState::elapsed(since, now);
            if elapsed >= self.config.gaze_sustain_ms {
                let offset = gaze.map(|g| g.offset).unwrap_or_default();
                if self.head_pose_reported_within(emitter, self.config.gaze_cooldown_ms, now) {
                    debug!("Gaze offset violation folded into recent head-pose violation");
                } else {
                    violations.extend(emitter.emit(
                        ViolationKind::LookingAway {
                            estimator: GazeEstimator::GazeOffset,
                        },
                        format!(
                            "Gaze off-center (offset {:.2}) for {} frames",
                            offset, self.state.gaze_away_frames
                        ),
                        Severity::Medium,
                        None,
                        now,
                    ));
                }
                self.state.gaze_away_frames = 0;
                self.state.gaze_away_since = Some(now);
            }
        } else {
            self.state.gaze_away_frames = 0;
            self.state.gaze_away_since = None;
        }

        self.state.is_looking_away = head_away || gaze_away;
        if self.state.is_looking_away {
            self.state.phase = FocusPhase::SingleFaceLookingAway;
            if !violations.is_empty() {
                self.state.raise_warning(WarningKind::LookingAway);
            }
        } else {
            self.state.phase = FocusPhase::SingleFaceOnScreen;
            self.state.clear_warning();
        }

        FocusAnalysis {
            face_count: 1,
            phase: self.state.phase,
            head_pose,
            gaze,
            violations,
        }
    }

    /// Whether a head-pose looking-away violation went out less than `window_ms` ago
    fn head_pose_reported_within(
        &self,
        emitter: &ViolationEmitter,
        window_ms: u64,
        now: TimestampMs,
    ) -> bool {
        let category = ViolationKind::LookingAway {
            estimator: GazeEstimator::HeadPose,
        }
        .category();
        emitter
            .category_state(&category)
            .is_some_and(|s| now.saturating_sub(s.last_emitted_ms) < window_ms)
    }

    /// Get current focus state
    pub fn state(&self) -> &FocusState {
        &self.state
    }

    pub fn config(&self) -> &FocusConfig {
        &self.config
    }

    /// Reset focus state (on session change)
    pub fn reset(&mut self) {
        self.state.reset();
        self.gaze_offset.reset();
    }
}
