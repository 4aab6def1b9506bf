pub mod alternation;
pub mod frequency;
pub mod gap;
pub mod rarity;
pub mod streak;

use wolf_core::Dimension;

use crate::config::EngineConfig;

/// Contribution d'un détecteur à un candidat.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub candidate: usize,
    pub points: f64,
    pub note: String,
}

pub trait Detector: Send + Sync {
    fn name(&self) -> &str;
    /// seq[0] = le plus ancien, seq[len-1] = le plus récent ; chaque élément est
    /// l'indice du candidat dans `dim`. Retourne les points à ajouter.
    fn detect(&self, seq: &[usize], dim: Dimension) -> Vec<Hit>;
}

/// Les détecteurs dans leur ordre d'évaluation.
pub fn all_detectors(config: &EngineConfig) -> Vec<Box<dyn Detector>> {
    let w = &config.weights;
    let t = &config.thresholds;
    vec![
        Box::new(streak::StreakBreakDetector::new(w.streak, t.streak_min, t.streak_step, t.streak_cap)),
        Box::new(gap::GapDetector::new(w.gap, t.gap_min, t.gap_step, t.gap_cap)),
        Box::new(frequency::FrequencyDetector::new(w.freq, t.freq_ratio)),
        Box::new(alternation::AlternationDetector::new(w.alt)),
        Box::new(rarity::RarityDetector::new(w.rare, config.palette.rare_share(), t.rare_floor)),
    ]
}

/// `weight × min(1 + step × excess, cap)` : croissant en `excess`, plafonné.
pub(crate) fn scaled(weight: f64, excess: usize, step: f64, cap: f64) -> f64 {
    weight * (1.0 + step * excess as f64).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_detectors_order() {
        let names: Vec<String> = all_detectors(&EngineConfig::default())
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, vec!["StreakBreak", "Gap", "Frequency", "Alternation", "Rarity"]);
    }

    #[test]
    fn test_scaled_is_capped() {
        assert_eq!(scaled(30.0, 0, 0.25, 2.0), 30.0);
        assert_eq!(scaled(30.0, 2, 0.25, 2.0), 45.0);
        assert_eq!(scaled(30.0, 100, 0.25, 2.0), 60.0);
    }
}
