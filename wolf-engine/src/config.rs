use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use wolf_core::{Palette, PredictError};

/// Poids des détecteurs. Aucune contrainte de somme : la normalisation se fait
/// à la résolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorWeights {
    pub streak: f64,
    pub gap: f64,
    pub freq: f64,
    pub alt: f64,
    pub rare: f64,
}

impl Default for DetectorWeights {
    fn default() -> Self {
        Self {
            streak: 30.0,
            gap: 25.0,
            freq: 20.0,
            alt: 15.0,
            rare: 10.0,
        }
    }
}

impl DetectorWeights {
    fn all(&self) -> [(&'static str, f64); 5] {
        [
            ("streak", self.streak),
            ("gap", self.gap),
            ("freq", self.freq),
            ("alt", self.alt),
            ("rare", self.rare),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Longueur minimale de série avant de parier sur la rupture.
    pub streak_min: usize,
    /// Bonus relatif par tirage de série au-delà du minimum.
    pub streak_step: f64,
    pub streak_cap: f64,
    pub gap_min: usize,
    pub gap_step: f64,
    pub gap_cap: f64,
    /// Déséquilibre strict : max > ratio × count.
    pub freq_ratio: f64,
    /// Fraction de l'effectif attendu de la couleur rare sous laquelle on la booste.
    pub rare_floor: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            streak_min: 3,
            streak_step: 0.25,
            streak_cap: 2.0,
            gap_min: 5,
            gap_step: 0.2,
            gap_cap: 2.0,
            freq_ratio: 1.5,
            rare_floor: 0.5,
        }
    }
}

/// Politique d'affichage de la confiance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConfidencePolicy {
    /// Part du score gagnant dans le total, sans retouche.
    #[default]
    Ratio,
    /// Bande d'affichage explicite (le produit d'origine affiche 97-99).
    Band { min: u8, max: u8 },
}

impl ConfidencePolicy {
    pub fn display_band() -> Self {
        ConfidencePolicy::Band { min: 97, max: 99 }
    }

    pub fn apply(&self, pct: u8) -> u8 {
        match *self {
            ConfidencePolicy::Ratio => pct.min(100),
            // Bande inversée : `max` l'emporte.
            ConfidencePolicy::Band { min, max } => pct.max(min).min(max).min(100),
        }
    }
}

/// Choix du candidat quand l'historique est trop courte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Indice `len(historique) mod k` parmi les candidats non rares.
    #[default]
    RoundRobin,
    /// Tirage uniforme via le générateur injecté (graine `seed` par défaut).
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: usize,
    pub min_required: usize,
    pub low_data_confidence: u8,
    pub weights: DetectorWeights,
    pub thresholds: Thresholds,
    pub palette: Palette,
    pub confidence: ConfidencePolicy,
    pub fallback: FallbackPolicy,
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: 10,
            min_required: 3,
            low_data_confidence: 60,
            weights: DetectorWeights::default(),
            thresholds: Thresholds::default(),
            palette: Palette::standard(),
            confidence: ConfidencePolicy::Ratio,
            fallback: FallbackPolicy::RoundRobin,
            seed: 42,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), PredictError> {
        if self.window == 0 {
            return Err(invalid("La fenêtre doit contenir au moins 1 tirage".to_string()));
        }
        if self.low_data_confidence > 100 {
            return Err(invalid(format!("Confiance plancher {} hors de 0-100", self.low_data_confidence)));
        }
        if let ConfidencePolicy::Band { min, max } = self.confidence {
            if min > max || max > 100 {
                return Err(invalid(format!("Bande de confiance invalide : {}-{}", min, max)));
            }
        }
        for (name, w) in self.weights.all() {
            if !w.is_finite() || w < 0.0 {
                return Err(invalid(format!("Poids '{}' invalide : {}", name, w)));
            }
        }
        let t = &self.thresholds;
        if t.streak_min == 0 || t.gap_min == 0 {
            return Err(invalid("Les seuils de série et de retard doivent être >= 1".to_string()));
        }
        if t.streak_cap < 1.0 || t.gap_cap < 1.0 {
            return Err(invalid("Les plafonds de série et de retard doivent être >= 1.0".to_string()));
        }
        if t.streak_step < 0.0 || t.gap_step < 0.0 {
            return Err(invalid("Les pas de série et de retard doivent être positifs".to_string()));
        }
        if t.freq_ratio < 1.0 {
            return Err(invalid(format!("Le ratio de fréquence doit être >= 1.0 (reçu {})", t.freq_ratio)));
        }
        if !(0.0..=1.0).contains(&t.rare_floor) {
            return Err(invalid(format!("Le plancher de rareté doit être dans [0, 1] (reçu {})", t.rare_floor)));
        }
        Ok(())
    }
}

fn invalid(message: String) -> PredictError {
    PredictError::InvalidConfig(message)
}

pub fn save_config(config: &EngineConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let config: EngineConfig = serde_json::from_str(&json)
        .with_context(|| format!("Configuration illisible {:?}", path))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let w = DetectorWeights::default();
        assert_eq!(w.streak, 30.0);
        assert_eq!(w.gap, 25.0);
        assert_eq!(w.freq, 20.0);
        assert_eq!(w.alt, 15.0);
        assert_eq!(w.rare, 10.0);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_band_policy_clamps() {
        let band = ConfidencePolicy::display_band();
        assert_eq!(band.apply(40), 97);
        assert_eq!(band.apply(100), 99);
        assert_eq!(band.apply(98), 98);
        assert_eq!(ConfidencePolicy::Ratio.apply(40), 40);
    }

    #[test]
    fn test_inverted_band_does_not_panic() {
        let inverted = ConfidencePolicy::Band { min: 99, max: 97 };
        assert_eq!(inverted.apply(40), 97);
        assert_eq!(inverted.apply(100), 97);
        assert_eq!(ConfidencePolicy::Band { min: 0, max: 250 }.apply(180), 100);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut config = EngineConfig::default();
        config.window = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.weights.gap = -1.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.confidence = ConfidencePolicy::Band { min: 99, max: 97 };
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.thresholds.freq_ratio = 0.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.low_data_confidence = 250;
        assert!(matches!(config.validate(), Err(PredictError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"window": 20, "weights": {"streak": 50.0}}"#).unwrap();
        assert_eq!(config.window, 20);
        assert_eq!(config.weights.streak, 50.0);
        assert_eq!(config.weights.gap, 25.0);
        assert_eq!(config.min_required, 3);
        assert_eq!(config.palette, Palette::standard());
    }

    #[test]
    fn test_policy_json_shape() {
        let json = serde_json::to_string(&ConfidencePolicy::display_band()).unwrap();
        assert_eq!(json, r#"{"mode":"band","min":97,"max":99}"#);
        let ratio: ConfidencePolicy = serde_json::from_str(r#"{"mode":"ratio"}"#).unwrap();
        assert_eq!(ratio, ConfidencePolicy::Ratio);
    }

    #[test]
    fn test_config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wolf.json");
        let mut config = EngineConfig::default();
        config.palette = Palette::legacy();
        config.fallback = FallbackPolicy::Random;
        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wolf.json");
        std::fs::write(&path, r#"{"window": 0}"#).unwrap();
        assert!(load_config(&path).is_err());
        assert!(load_config(&dir.path().join("absent.json")).is_err());
    }
}
