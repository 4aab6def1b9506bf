use wolf_core::Dimension;

use super::{scaled, Detector, Hit};

/// Pari sur la rupture d'une série : après `min_run` tirages identiques, les
/// autres candidats équilibrés sont crédités.
pub struct StreakBreakDetector {
    weight: f64,
    min_run: usize,
    step: f64,
    cap: f64,
}

impl StreakBreakDetector {
    pub fn new(weight: f64, min_run: usize, step: f64, cap: f64) -> Self {
        Self { weight, min_run, step, cap }
    }

    /// Points accordés à chaque candidat opposé pour une série de longueur `run`.
    pub fn award(&self, run: usize) -> f64 {
        if run < self.min_run {
            return 0.0;
        }
        scaled(self.weight, run - self.min_run, self.step, self.cap)
    }
}

pub fn trailing_run(seq: &[usize]) -> usize {
    match seq.last() {
        Some(&last) => seq.iter().rev().take_while(|&&c| c == last).count(),
        None => 0,
    }
}

impl Detector for StreakBreakDetector {
    fn name(&self) -> &str {
        "StreakBreak"
    }

    fn detect(&self, seq: &[usize], dim: Dimension) -> Vec<Hit> {
        let Some(&last) = seq.last() else {
            return Vec::new();
        };
        let run = trailing_run(seq);
        let points = self.award(run);
        if points <= 0.0 {
            return Vec::new();
        }

        let note = format!("série de {} × {}", run, dim.label(last));
        dim.balanced()
            .into_iter()
            .filter(|&c| c != last)
            .map(|candidate| Hit { candidate, points, note: note.clone() })
            .collect()
    }
}
