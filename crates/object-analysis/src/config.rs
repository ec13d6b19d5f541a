//! Object analysis configuration

use serde::{Deserialize, Serialize};

use crate::arbiter::PathwayConfig;
use crate::heuristic::HeuristicConfig;
use crate::scorer::ScoringWeights;
use crate::tracker::ObjectTypeSpec;

/// Object analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectAnalysisConfig {
    /// Tracked object types, registered at startup
    pub types: Vec<ObjectTypeSpec>,

    /// Share of the violation threshold kept after a tracker violation
    pub retention_fraction: f32,

    /// Suspiciousness weights
    pub scoring: ScoringWeights,

    /// Pathway thresholds
    pub pathways: PathwayConfig,

    /// Misclassified-object heuristic
    pub heuristic: HeuristicConfig,

    /// Continuous hold of a phone-like object before a violation (ms)
    pub held_object_ms: u64,
}

impl Default for ObjectAnalysisConfig {
    fn default() -> Self {
        Self {
            types: ObjectTypeSpec::builtin(),
            retention_fraction: 0.5,
            scoring: ScoringWeights::default(),
            pathways: PathwayConfig::default(),
            heuristic: HeuristicConfig::default(),
            held_object_ms: 3000,
        }
    }
}
