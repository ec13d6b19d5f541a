//! Session runner: periodic provider ticks driving the engine

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use detection_types::{now_ms, TimestampMs};
use inference::{detect_or_empty, FaceDetector, HandDetector, ObjectDetector};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::RunnerConfig;
use crate::ProctorEngine;

/// Engine shared between the runner tasks and the caller
pub type SharedEngine = Arc<Mutex<ProctorEngine>>;

/// Detection providers for one session
#[derive(Clone)]
pub struct Providers {
    pub objects: Arc<dyn ObjectDetector>,
    pub hands: Arc<dyn HandDetector>,
    pub faces: Arc<dyn FaceDetector>,
}

/// Session clock: wall-clock origin advanced by the runtime's monotonic time
#[derive(Debug, Clone, Copy)]
struct SessionClock {
    wall_origin: TimestampMs,
    origin: Instant,
}

impl SessionClock {
    fn start() -> Self {
        Self {
            wall_origin: now_ms(),
            origin: Instant::now(),
        }
    }

    fn now(&self) -> TimestampMs {
        self.wall_origin + self.origin.elapsed().as_millis() as u64
    }
}

fn lock(engine: &SharedEngine) -> MutexGuard<'_, ProctorEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs the object and focus ticks of one session
pub struct SessionRunner {
    engine: SharedEngine,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionRunner {
    /// Spawn both tick loops on the current tokio runtime
    pub fn start(engine: SharedEngine, providers: Providers) -> Self {
        let config = lock(&engine).config().runner.clone();
        let clock = SessionClock::start();
        info!(
            "Starting session runner: object tick {}ms, focus tick {}ms",
            config.object_tick_ms, config.focus_tick_ms
        );

        let tasks = vec![
            tokio::spawn(object_loop(
                engine.clone(),
                providers.objects,
                providers.hands,
                config.clone(),
                clock,
            )),
            tokio::spawn(focus_loop(engine.clone(), providers.faces, config, clock)),
        ];

        Self { engine, tasks }
    }

    /// Stop the session.
    ///
    /// Once this returns no further violation is emitted: the engine is
    /// marked stopped under its lock and both loops are aborted.
    pub fn stop(&mut self) {
        info!("Stopping session runner");
        lock(&self.engine).stop();
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    /// Check if runner is running
    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty() && lock(&self.engine).is_running()
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }
}

impl Drop for SessionRunner {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

async fn object_loop(
    engine: SharedEngine,
    objects: Arc<dyn ObjectDetector>,
    hands: Arc<dyn HandDetector>,
    config: RunnerConfig,
    clock: SessionClock,
) {
    let mut ticker = interval(Duration::from_millis(config.object_tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let limit = Duration::from_millis(config.inference_timeout_ms);

    loop {
        ticker.tick().await;
        let (raw, hand_set) = tokio::join!(
            detect_or_empty("object", limit, objects.detect_objects()),
            detect_or_empty("hand", limit, hands.detect_hands()),
        );

        let mut guard = lock(&engine);
        if !guard.is_running() {
            debug!("Object loop exiting: engine stopped");
            break;
        }
        guard.process_objects(raw, hand_set, clock.now());
    }
}

async fn focus_loop(
    engine: SharedEngine,
    faces: Arc<dyn FaceDetector>,
    config: RunnerConfig,
    clock: SessionClock,
) {
    let mut ticker = interval(Duration::from_millis(config.focus_tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let limit = Duration::from_millis(config.inference_timeout_ms);

    loop {
        ticker.tick().await;
        let face_set = detect_or_empty("face", limit, faces.detect_faces()).await;

        let mut guard = lock(&engine);
        if !guard.is_running() {
            debug!("Focus loop exiting: engine stopped");
            break;
        }
        guard.process_faces(face_set, clock.now());
    }
}
