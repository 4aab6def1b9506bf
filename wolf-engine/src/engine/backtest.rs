use serde::{Deserialize, Serialize};

use wolf_core::{Color, Outcome, PredictError, Size};

use super::Engine;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub rounds: usize,
    pub color_hits: usize,
    pub size_hits: usize,
    pub baseline_color_hits: usize,
    pub baseline_size_hits: usize,
}

impl BacktestReport {
    pub fn rate(hits: usize, rounds: usize) -> f64 {
        if rounds == 0 {
            0.0
        } else {
            hits as f64 / rounds as f64
        }
    }

    pub fn color_rate(&self) -> f64 {
        Self::rate(self.color_hits, self.rounds)
    }

    pub fn size_rate(&self) -> f64 {
        Self::rate(self.size_hits, self.rounds)
    }

    pub fn baseline_color_rate(&self) -> f64 {
        Self::rate(self.baseline_color_hits, self.rounds)
    }

    pub fn baseline_size_rate(&self) -> f64 {
        Self::rate(self.baseline_size_hits, self.rounds)
    }
}

/// Nombre de tirages évalués par [`walk_forward`].
pub fn steps(engine: &Engine, history: &[Outcome]) -> usize {
    history.len().saturating_sub(engine.config().min_required.max(1))
}

/// Walk-forward : pour chaque tirage t, on prédit à partir de history[..t]
/// uniquement, puis on compare au tirage t. Pas de fuite du futur.
///
/// La référence prédit la couleur et la taille majoritaires de la même fenêtre.
pub fn walk_forward(
    engine: &Engine,
    history: &[Outcome],
    mut on_step: impl FnMut(),
) -> Result<BacktestReport, PredictError> {
    let start = engine.config().min_required.max(1);
    let mut report = BacktestReport::default();

    for t in start..history.len() {
        let past = &history[..t];
        let actual = &history[t];
        let prediction = engine.predict(past)?;

        let window = engine.window(past);
        let (baseline_color, baseline_size) = majority(window);

        report.rounds += 1;
        if prediction.color == actual.color {
            report.color_hits += 1;
        }
        if prediction.size == actual.size {
            report.size_hits += 1;
        }
        if baseline_color == actual.color {
            report.baseline_color_hits += 1;
        }
        if baseline_size == actual.size {
            report.baseline_size_hits += 1;
        }
        on_step();
    }

    Ok(report)
}

/// Couleur et taille les plus fréquentes ; égalité → ordre de déclaration.
pub fn majority(window: &[Outcome]) -> (Color, Size) {
    let mut colors = [0usize; 3];
    let mut sizes = [0usize; 2];
    for o in window {
        colors[o.color.index()] += 1;
        sizes[o.size.index()] += 1;
    }
    let pick = |counts: &[usize]| {
        let mut best = 0;
        for (i, &n) in counts.iter().enumerate() {
            if n > counts[best] {
                best = i;
            }
        }
        best
    };
    (Color::ALL[pick(&colors)], Size::ALL[pick(&sizes)])
}
