//! Session runner tests on paused tokio time

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alerting::{Violation, ViolationKind};
use detection_types::{BBox, Face, ObjectDetection, RawObjectDetection};
use inference::{
    InferenceError, ScriptedFaceDetector, ScriptedHandDetector, ScriptedObjectDetector,
};
use proctor_engine::{EngineConfig, ProctorEngine, Providers, SessionRunner, SharedEngine};
use tokio::sync::mpsc;

fn phone_frame() -> Vec<RawObjectDetection> {
    vec![ObjectDetection::new("cell phone", 0.9, BBox::new(200.0, 150.0, 60.0, 120.0)).into()]
}

fn one_face() -> Vec<Face> {
    vec![Face::with_box(BBox::new(100.0, 100.0, 120.0, 160.0))]
}

struct Session {
    engine: SharedEngine,
    objects: Arc<ScriptedObjectDetector>,
    faces: Arc<ScriptedFaceDetector>,
    violations: mpsc::UnboundedReceiver<Violation>,
}

fn session(config: EngineConfig) -> Session {
    let mut engine = ProctorEngine::new(config).unwrap();
    let (tx, violations) = mpsc::unbounded_channel();
    engine.set_violation_sink(tx);
    Session {
        engine: Arc::new(Mutex::new(engine)),
        objects: Arc::new(ScriptedObjectDetector::new("objects")),
        faces: Arc::new(ScriptedFaceDetector::new("faces")),
        violations,
    }
}

impl Session {
    fn start(&self) -> SessionRunner {
        SessionRunner::start(
            self.engine.clone(),
            Providers {
                objects: self.objects.clone(),
                hands: Arc::new(ScriptedHandDetector::new("hands")),
                faces: self.faces.clone(),
            },
        )
    }

    fn drain(&mut self) -> Vec<Violation> {
        let mut out = Vec::new();
        while let Ok(v) = self.violations.try_recv() {
            out.push(v);
        }
        out
    }
}

fn mobile_count(violations: &[Violation]) -> usize {
    violations
        .iter()
        .filter(|v| v.kind.category() == "prohibited_object:mobile")
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_runner_drives_object_ticks() {
    let mut s = session(EngineConfig::default());
    for _ in 0..3 {
        s.objects.push(phone_frame());
    }
    for _ in 0..3 {
        s.faces.push(one_face());
    }

    let mut runner = s.start();
    assert!(runner.is_running());

    // Object ticks at 0, 1000 and 2000 ms
    tokio::time::sleep(Duration::from_millis(2500)).await;
    let violations = s.drain();
    assert_eq!(mobile_count(&violations), 1);
    assert!(violations
        .iter()
        .all(|v| v.kind != ViolationKind::NoFace));

    runner.stop();
    assert!(!runner.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_late_results_discarded_after_stop() {
    let mut config = EngineConfig::default();
    config.runner.inference_timeout_ms = 60_000;
    let mut s = session(config);
    s.objects.push(phone_frame());
    s.objects.push(phone_frame());
    s.objects.push_delayed(Duration::from_secs(5), phone_frame());
    for _ in 0..10 {
        s.faces.push(one_face());
    }

    let mut runner = s.start();
    tokio::time::sleep(Duration::from_millis(3000)).await;
    runner.stop();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(s.drain().is_empty());

    let engine = s.engine.lock().unwrap();
    assert!(!engine.is_running());
    assert_eq!(engine.tracking_status()["mobile"].consecutive_detections, 2);
    assert_eq!(engine.total_violations(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failing_provider_degrades_to_empty() {
    let mut s = session(EngineConfig::default());
    s.objects
        .push_error(InferenceError::InferenceFailed("model crashed".into()));
    s.objects.push_delayed(Duration::from_secs(10), phone_frame());
    for _ in 0..3 {
        s.objects.push(phone_frame());
    }
    s.faces
        .push_error(InferenceError::Unavailable("camera busy".into()));

    let mut runner = s.start();
    tokio::time::sleep(Duration::from_millis(6500)).await;
    runner.stop();

    let violations = s.drain();
    // The error and the timed-out call count as empty frames; the three
    // phone frames that follow still confirm the object
    assert_eq!(mobile_count(&violations), 1);
    let engine = s.engine.lock().unwrap();
    assert_eq!(engine.focus_state().face_count, 0);
}
