pub mod backtest;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use wolf_core::models::validate_history;
use wolf_core::{Color, Dimension, Outcome, PredictError, Size};

use crate::config::{EngineConfig, FallbackPolicy};
use crate::detectors::{all_detectors, Detector, Hit};

#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub detector: String,
    pub candidate: usize,
    pub points: f64,
    pub note: String,
}

/// Accumulateur éphémère d'une dimension, jeté après chaque prédiction.
#[derive(Debug, Clone)]
pub struct ScoreBoard {
    pub dimension: Dimension,
    pub scores: Vec<f64>,
    pub contributions: Vec<Contribution>,
}

impl ScoreBoard {
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            scores: vec![0.0; dimension.size()],
            contributions: Vec::new(),
        }
    }

    pub fn add(&mut self, detector: &str, hit: Hit) {
        if hit.points == 0.0 || hit.candidate >= self.scores.len() {
            return;
        }
        self.scores[hit.candidate] += hit.points;
        self.contributions.push(Contribution {
            detector: detector.to_string(),
            candidate: hit.candidate,
            points: hit.points,
            note: hit.note,
        });
    }

    pub fn total(&self) -> f64 {
        self.scores.iter().sum()
    }

    /// Argmax ; à égalité le premier candidat déclaré l'emporte.
    pub fn winner(&self) -> usize {
        let mut best = 0;
        for (i, &s) in self.scores.iter().enumerate() {
            if s > self.scores[best] {
                best = i;
            }
        }
        best
    }

    /// Part du gagnant en pourcentage ; part uniforme si aucun détecteur n'a tiré.
    pub fn share_percent(&self) -> u8 {
        let total = self.total();
        if total <= 0.0 {
            return (100.0 / self.scores.len() as f64).round() as u8;
        }
        (100.0 * self.scores[self.winner()] / total).round().clamp(0.0, 100.0) as u8
    }

    pub fn rationale(&self) -> Vec<String> {
        let winner = self.winner();
        self.contributions
            .iter()
            .filter(|c| c.candidate == winner)
            .map(|c| format!("{} : {} +{:.1} ({})", self.dimension, c.detector, c.points, c.note))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    #[default]
    Local,
    Refined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub color: Color,
    pub size: Size,
    pub confidence: u8,
    pub color_confidence: u8,
    pub size_confidence: u8,
    pub degraded: bool,
    pub rationale: Vec<String>,
    pub color_scores: Vec<(Color, f64)>,
    pub size_scores: Vec<(Size, f64)>,
    #[serde(default)]
    pub source: Source,
}

pub struct Engine {
    config: EngineConfig,
    detectors: Vec<Box<dyn Detector>>,
}

impl Engine {
    /// Rejette une configuration invalide : aucun moteur ne tourne sans `validate`.
    pub fn new(config: EngineConfig) -> Result<Self, PredictError> {
        config.validate()?;
        let detectors = all_detectors(&config);
        Ok(Self { config, detectors })
    }

    pub fn with_detectors(config: EngineConfig, detectors: Vec<Box<dyn Detector>>) -> Result<Self, PredictError> {
        config.validate()?;
        Ok(Self { config, detectors })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Suffixe de l'historique effectivement inspecté.
    pub fn window<'a>(&self, history: &'a [Outcome]) -> &'a [Outcome] {
        let start = history.len().saturating_sub(self.config.window.max(1));
        &history[start..]
    }

    /// Déterministe pour une historique et une configuration données : le seul
    /// aléa (repli `Random`) vient d'un générateur graine `config.seed`.
    pub fn predict(&self, history: &[Outcome]) -> Result<PredictionResult, PredictError> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.predict_with_rng(history, &mut rng)
    }

    pub fn predict_with_rng<R: Rng + ?Sized>(
        &self,
        history: &[Outcome],
        rng: &mut R,
    ) -> Result<PredictionResult, PredictError> {
        validate_history(history, &self.config.palette)?;

        if history.len() < self.config.min_required {
            return Ok(self.degraded(history.len(), rng));
        }

        let window = self.window(history);
        let color = self.score(window, Dimension::Color);
        let size = self.score(window, Dimension::Size);
        Ok(self.resolve(&color, &size))
    }

    pub fn score(&self, window: &[Outcome], dim: Dimension) -> ScoreBoard {
        let seq = dim.project(window);
        let mut board = ScoreBoard::new(dim);
        for detector in &self.detectors {
            for hit in detector.detect(&seq, dim) {
                debug!(
                    detector = detector.name(),
                    dimension = %dim,
                    candidate = %dim.label(hit.candidate),
                    points = hit.points,
                    "détecteur déclenché"
                );
                board.add(detector.name(), hit);
            }
        }
        board
    }

    fn resolve(&self, color: &ScoreBoard, size: &ScoreBoard) -> PredictionResult {
        let policy = self.config.confidence;
        let color_confidence = policy.apply(color.share_percent());
        let size_confidence = policy.apply(size.share_percent());
        let confidence = ((color_confidence as u16 + size_confidence as u16) / 2) as u8;

        let mut rationale = color.rationale();
        rationale.extend(size.rationale());

        PredictionResult {
            color: Color::ALL[color.winner()],
            size: Size::ALL[size.winner()],
            confidence,
            color_confidence,
            size_confidence,
            degraded: false,
            rationale,
            color_scores: Color::ALL.iter().copied().zip(color.scores.iter().copied()).collect(),
            size_scores: Size::ALL.iter().copied().zip(size.scores.iter().copied()).collect(),
            source: Source::Local,
        }
    }

    fn degraded<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> PredictionResult {
        let color_idx = self.fallback_pick(Dimension::Color, len, rng);
        let size_idx = self.fallback_pick(Dimension::Size, len, rng);
        let floor = self.config.low_data_confidence;

        debug!(len, min = self.config.min_required, "historique insuffisante, repli");

        PredictionResult {
            color: Color::ALL[color_idx],
            size: Size::ALL[size_idx],
            confidence: floor,
            color_confidence: floor,
            size_confidence: floor,
            degraded: true,
            rationale: vec![format!(
                "données insuffisantes : {}/{} tirages",
                len, self.config.min_required
            )],
            color_scores: Color::ALL.iter().map(|&c| (c, 0.0)).collect(),
            size_scores: Size::ALL.iter().map(|&s| (s, 0.0)).collect(),
            source: Source::Local,
        }
    }

    /// La couleur rare n'est jamais un choix de repli.
    fn fallback_pick<R: Rng + ?Sized>(&self, dim: Dimension, len: usize, rng: &mut R) -> usize {
        let candidates = dim.balanced();
        let pos = match self.config.fallback {
            FallbackPolicy::RoundRobin => len % candidates.len(),
            FallbackPolicy::Random => rng.random_range(0..candidates.len()),
        };
        candidates[pos]
    }
}

pub fn predict(history: &[Outcome], config: &EngineConfig) -> Result<PredictionResult, PredictError> {
    Engine::new(config.clone())?.predict(history)
}
