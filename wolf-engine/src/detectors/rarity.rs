use wolf_core::Dimension;

use super::{Detector, Hit};

/// Couleur rare sous-représentée dans la fenêtre. Couleur uniquement.
pub struct RarityDetector {
    weight: f64,
    rare_share: f64,
    floor: f64,
}

impl RarityDetector {
    pub fn new(weight: f64, rare_share: f64, floor: f64) -> Self {
        Self { weight, rare_share, floor }
    }
}

impl Detector for RarityDetector {
    fn name(&self) -> &str {
        "Rarity"
    }

    fn detect(&self, seq: &[usize], dim: Dimension) -> Vec<Hit> {
        if dim != Dimension::Color || seq.is_empty() || self.weight <= 0.0 {
            return Vec::new();
        }
        let Some(rare) = (0..dim.size()).find(|&c| dim.is_rare(c)) else {
            return Vec::new();
        };

        let count = seq.iter().filter(|&&c| c == rare).count();
        let expected = seq.len() as f64 * self.rare_share;
        if (count as f64) < expected * self.floor {
            vec![Hit {
                candidate: rare,
                points: self.weight,
                note: format!("{} {}/{} pour {:.1} attendus", dim.label(rare), count, seq.len(), expected),
            }]
        } else {
            Vec::new()
        }
    }
}
