pub mod config;
pub mod detectors;
pub mod engine;
pub mod refine;

pub use config::{ConfidencePolicy, DetectorWeights, EngineConfig, FallbackPolicy, Thresholds};
pub use engine::{predict, Engine, PredictionResult, ScoreBoard, Source};
