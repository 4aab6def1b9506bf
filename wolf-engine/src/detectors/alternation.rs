use wolf_core::Dimension;

use super::{Detector, Hit};

/// Motif de période 2 sur les quatre derniers tirages (`X Y X Y`). Le motif est
/// supposé se poursuivre : le prochain attendu est `X`, l'élément d'indice
/// `len - 2`.
pub struct AlternationDetector {
    weight: f64,
}

impl AlternationDetector {
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }
}

/// Candidat qui prolonge l'alternance, si les quatre derniers tirages en forment une.
pub fn continuation(seq: &[usize]) -> Option<usize> {
    if seq.len() < 4 {
        return None;
    }
    let recent = &seq[seq.len() - 4..];
    if recent[3] != recent[2] && recent[3] == recent[1] && recent[2] == recent[0] {
        Some(recent[2])
    } else {
        None
    }
}

impl Detector for AlternationDetector {
    fn name(&self) -> &str {
        "Alternation"
    }

    fn detect(&self, seq: &[usize], dim: Dimension) -> Vec<Hit> {
        if self.weight <= 0.0 {
            return Vec::new();
        }
        match continuation(seq) {
            Some(next) => {
                let other = seq[seq.len() - 1];
                vec![Hit {
                    candidate: next,
                    points: self.weight,
                    note: format!(
                        "alternance {a} {b} {a} {b} → {a}",
                        a = dim.label(next),
                        b = dim.label(other)
                    ),
                }]
            }
            None => Vec::new(),
        }
    }
}
