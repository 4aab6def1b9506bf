use wolf_core::Dimension;

use super::{scaled, Detector, Hit};

/// Candidats en retard : absents depuis au moins `min_gap` tirages.
pub struct GapDetector {
    weight: f64,
    min_gap: usize,
    step: f64,
    cap: f64,
}

impl GapDetector {
    pub fn new(weight: f64, min_gap: usize, step: f64, cap: f64) -> Self {
        Self { weight, min_gap, step, cap }
    }
}

/// Nombre de tirages depuis la dernière apparition de chaque candidat
/// (0 = le plus récent, absent = longueur de la fenêtre).
pub fn gaps(seq: &[usize], size: usize) -> Vec<usize> {
    let mut gaps = vec![seq.len(); size];
    for (t, &c) in seq.iter().rev().enumerate() {
        if c < size && gaps[c] == seq.len() {
            gaps[c] = t;
        }
    }
    gaps
}

impl Detector for GapDetector {
    fn name(&self) -> &str {
        "Gap"
    }

    fn detect(&self, seq: &[usize], dim: Dimension) -> Vec<Hit> {
        if seq.is_empty() || self.weight <= 0.0 {
            return Vec::new();
        }

        let gaps = gaps(seq, dim.size());
        dim.balanced()
            .into_iter()
            .filter(|&c| gaps[c] >= self.min_gap)
            .map(|c| Hit {
                candidate: c,
                points: scaled(self.weight, gaps[c] - self.min_gap, self.step, self.cap),
                note: if gaps[c] == seq.len() {
                    format!("{} absent de la fenêtre ({} tirages)", dim.label(c), seq.len())
                } else {
                    format!("{} absent depuis {} tirages", dim.label(c), gaps[c])
                },
            })
            .collect()
    }
}
