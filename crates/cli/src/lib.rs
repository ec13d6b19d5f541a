//! Session Replay
//!
//! Loads engine configuration, installs logging, and replays a recorded
//! detection script through the session engine.
//!
//! Script format: JSON lines, one tick per line:
//! `{"t": 1000, "objects": [...], "hands": [...], "faces": [...]}`.
//! A line carrying `objects` or `hands` drives an object tick, a line
//! carrying `faces` drives a focus tick. Blank lines and `#` comments are
//! skipped.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use alerting::Violation;
use anyhow::Context;
use clap::Parser;
use detection_types::{FaceSet, HandDetection, RawObjectDetection, TimestampMs};
use proctor_engine::{EngineConfig, ProctorEngine};
use serde::Deserialize;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

/// Command line arguments
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "proctor-replay", version, about)]
pub struct Args {
    /// Optional TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long = "json")]
    pub json_logs: bool,

    /// Script path, `-` for stdin
    pub script: PathBuf,
}

/// Initialize logging
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.context("Failed to set tracing subscriber")
}

/// Load engine configuration.
///
/// Sources, later ones overriding earlier ones: built-in defaults, the
/// given file (or `proctor.toml` in the working directory if present),
/// and `PROCTOR__SECTION__KEY` environment variables.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("proctor").required(false),
    };

    let config = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("PROCTOR")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read configuration")?;

    config
        .try_deserialize()
        .context("Invalid configuration")
}

/// One recorded tick
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScriptLine {
    pub t: TimestampMs,
    #[serde(default)]
    pub objects: Option<Vec<RawObjectDetection>>,
    #[serde(default)]
    pub hands: Option<Vec<HandDetection>>,
    #[serde(default)]
    pub faces: Option<FaceSet>,
}

/// Parse a JSON-lines script
pub fn parse_script(reader: impl BufRead) -> anyhow::Result<Vec<ScriptLine>> {
    let mut lines = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read script line {}", index + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parsed: ScriptLine = serde_json::from_str(trimmed)
            .with_context(|| format!("Malformed script line {}", index + 1))?;
        lines.push(parsed);
    }
    Ok(lines)
}

/// Feed every script line to the engine, returning violations in order
pub fn replay(engine: &mut ProctorEngine, script: &[ScriptLine]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for line in script {
        if line.objects.is_some() || line.hands.is_some() {
            violations.extend(engine.process_objects(
                line.objects.clone().unwrap_or_default(),
                line.hands.clone().unwrap_or_default(),
                line.t,
            ));
        }
        if let Some(faces) = &line.faces {
            violations.extend(engine.process_faces(faces.clone(), line.t));
        }
        debug!("Replayed tick t={}", line.t);
    }
    violations
}

/// Render a violation as one JSON line with an RFC 3339 `time` field
pub fn render_violation(violation: &Violation) -> anyhow::Result<String> {
    let mut value = serde_json::to_value(violation)?;
    if let (Some(fields), Some(time)) = (value.as_object_mut(), violation.timestamp()) {
        fields.insert(
            "time".into(),
            serde_json::Value::String(time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
        );
    }
    Ok(serde_json::to_string(&value)?)
}
