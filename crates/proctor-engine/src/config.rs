//! Engine configuration

use alerting::EmitterConfig;
use data_validator::ValidationConfig;
use focus_monitor::FocusConfig;
use object_analysis::ObjectAnalysisConfig;
use serde::{Deserialize, Serialize};

/// Session runner timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Object/hand tick period (ms)
    pub object_tick_ms: u64,
    /// Face tick period (ms)
    pub focus_tick_ms: u64,
    /// Per-provider call limit (ms)
    pub inference_timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            object_tick_ms: 1000,
            focus_tick_ms: 2000,
            inference_timeout_ms: 800,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub validation: ValidationConfig,
    pub objects: ObjectAnalysisConfig,
    pub focus: FocusConfig,
    pub emitter: EmitterConfig,
    pub runner: RunnerConfig,
}
