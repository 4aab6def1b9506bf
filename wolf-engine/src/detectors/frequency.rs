use wolf_core::Dimension;

use super::{Detector, Hit};

/// Déséquilibre de fréquence entre candidats équilibrés : le sous-représenté
/// est crédité quand `max > ratio × count`.
pub struct FrequencyDetector {
    weight: f64,
    ratio: f64,
}

impl FrequencyDetector {
    pub fn new(weight: f64, ratio: f64) -> Self {
        Self { weight, ratio }
    }
}

pub fn counts(seq: &[usize], size: usize) -> Vec<usize> {
    let mut counts = vec![0usize; size];
    for &c in seq {
        if c < size {
            counts[c] += 1;
        }
    }
    counts
}

impl Detector for FrequencyDetector {
    fn name(&self) -> &str {
        "Frequency"
    }

    fn detect(&self, seq: &[usize], dim: Dimension) -> Vec<Hit> {
        if self.weight <= 0.0 {
            return Vec::new();
        }
        let counts = counts(seq, dim.size());
        let balanced = dim.balanced();
        let Some((leader, max)) = balanced
            .iter()
            .map(|&c| (c, counts[c]))
            .fold(None, |best: Option<(usize, usize)>, (c, n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((c, n)),
            })
        else {
            return Vec::new();
        };

        balanced
            .into_iter()
            .filter(|&c| max as f64 > self.ratio * counts[c] as f64)
            .map(|c| Hit {
                candidate: c,
                points: self.weight,
                note: format!(
                    "{} {}/{} contre {} {}/{}",
                    dim.label(c),
                    counts[c],
                    seq.len(),
                    dim.label(leader),
                    max,
                    seq.len()
                ),
            })
            .collect()
    }
}
