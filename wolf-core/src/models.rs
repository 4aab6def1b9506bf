use serde::{Deserialize, Serialize};

use crate::error::{PredictError, Violation};

pub const MAX_VALUE: u8 = 9;
/// Seuil inclusif : valeur >= 5 → Big.
pub const SIZE_THRESHOLD: u8 = 5;

/// L'ordre de déclaration sert de priorité en cas d'égalité.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    Red,
    Green,
    Violet,
}

impl Color {
    pub const ALL: [Color; 3] = [Color::Red, Color::Green, Color::Violet];

    pub fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Green => 1,
            Color::Violet => 2,
        }
    }

    pub fn is_rare(self) -> bool {
        self == Color::Violet
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "RED" => Some(Color::Red),
            "GREEN" => Some(Color::Green),
            "VIOLET" | "PURPLE" => Some(Color::Violet),
            _ => None,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Red => write!(f, "RED"),
            Color::Green => write!(f, "GREEN"),
            Color::Violet => write!(f, "VIOLET"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Size {
    Big,
    Small,
}

impl Size {
    pub const ALL: [Size; 2] = [Size::Big, Size::Small];

    pub fn index(self) -> usize {
        match self {
            Size::Big => 0,
            Size::Small => 1,
        }
    }

    pub fn from_value(value: u8) -> Self {
        if value >= SIZE_THRESHOLD {
            Size::Big
        } else {
            Size::Small
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "BIG" | "HIGH" => Some(Size::Big),
            "SMALL" | "LOW" => Some(Size::Small),
            _ => None,
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Size::Big => write!(f, "BIG"),
            Size::Small => write!(f, "SMALL"),
        }
    }
}

/// Table valeur → couleur. Injectée par configuration : les révisions du jeu
/// ne s'accordent pas sur la répartition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub colors: [Color; 10],
}

impl Palette {
    /// Violet {0,5}, Red {2,4,6,8}, Green {1,3,7,9}.
    pub fn standard() -> Self {
        use Color::*;
        Self {
            colors: [Violet, Green, Red, Green, Red, Violet, Red, Green, Red, Green],
        }
    }

    /// Violet {0}, Red {1,2,5,6,8,9}, Green {3,4,7}.
    pub fn legacy() -> Self {
        use Color::*;
        Self {
            colors: [Violet, Red, Red, Green, Green, Red, Red, Green, Red, Red],
        }
    }

    pub fn color_of(&self, value: u8) -> Option<Color> {
        self.colors.get(value as usize).copied()
    }

    /// Part des chiffres associés à la couleur rare.
    pub fn rare_share(&self) -> f64 {
        let rare = self.colors.iter().filter(|c| c.is_rare()).count();
        rare as f64 / self.colors.len() as f64
    }

    pub fn digits_of(&self, color: Color) -> Vec<u8> {
        (0..=MAX_VALUE).filter(|&v| self.colors[v as usize] == color).collect()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}

/// Un tirage classé. `color` et `size` sont des fonctions pures de `value` :
/// construire via [`Outcome::classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub sequence_id: u64,
    pub value: u8,
    pub color: Color,
    pub size: Size,
}

impl Outcome {
    pub fn classify(sequence_id: u64, value: u8, palette: &Palette) -> Result<Self, PredictError> {
        let (color, size) = classify(value, palette).map_err(|e| match e {
            PredictError::InvalidValue { value, violation, .. } => PredictError::InvalidValue {
                sequence_id: Some(sequence_id),
                value,
                violation,
            },
            other => other,
        })?;
        Ok(Self { sequence_id, value, color, size })
    }

    /// Vérifie qu'un tirage désérialisé respecte la palette.
    pub fn check(&self, palette: &Palette) -> Result<(), PredictError> {
        let reject = |violation| PredictError::InvalidValue {
            sequence_id: Some(self.sequence_id),
            value: self.value,
            violation,
        };
        let color = palette.color_of(self.value).ok_or_else(|| reject(Violation::OutOfRange))?;
        if color != self.color {
            return Err(reject(Violation::ColorMismatch));
        }
        if Size::from_value(self.value) != self.size {
            return Err(reject(Violation::SizeMismatch));
        }
        Ok(())
    }
}

/// Les deux projections catégorielles d'un tirage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Color,
    Size,
}

impl Dimension {
    pub const ALL: [Dimension; 2] = [Dimension::Color, Dimension::Size];

    /// Nombre de candidats.
    pub fn size(&self) -> usize {
        match self {
            Dimension::Color => Color::ALL.len(),
            Dimension::Size => Size::ALL.len(),
        }
    }

    pub fn index_of(&self, outcome: &Outcome) -> usize {
        match self {
            Dimension::Color => outcome.color.index(),
            Dimension::Size => outcome.size.index(),
        }
    }

    pub fn label(&self, idx: usize) -> String {
        match self {
            Dimension::Color => Color::ALL[idx].to_string(),
            Dimension::Size => Size::ALL[idx].to_string(),
        }
    }

    pub fn is_rare(&self, idx: usize) -> bool {
        match self {
            Dimension::Color => Color::ALL[idx].is_rare(),
            Dimension::Size => false,
        }
    }

    /// Candidats hors couleur rare, dans l'ordre de déclaration.
    pub fn balanced(&self) -> Vec<usize> {
        (0..self.size()).filter(|&i| !self.is_rare(i)).collect()
    }

    pub fn project(&self, outcomes: &[Outcome]) -> Vec<usize> {
        outcomes.iter().map(|o| self.index_of(o)).collect()
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Color => write!(f, "couleur"),
            Dimension::Size => write!(f, "taille"),
        }
    }
}

pub fn classify(value: u8, palette: &Palette) -> Result<(Color, Size), PredictError> {
    let color = palette.color_of(value).ok_or(PredictError::InvalidValue {
        sequence_id: None,
        value,
        violation: Violation::OutOfRange,
    })?;
    Ok((color, Size::from_value(value)))
}

pub fn validate_history(history: &[Outcome], palette: &Palette) -> Result<(), PredictError> {
    for outcome in history {
        outcome.check(palette)?;
    }
    Ok(())
}

/// Construit une historique (du plus ancien au plus récent) à partir de valeurs
/// brutes, identifiants 1..=n.
pub fn outcomes_from_values(values: &[u8], palette: &Palette) -> Result<Vec<Outcome>, PredictError> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Outcome::classify(i as u64 + 1, v, palette))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_size_boundary() {
        let palette = Palette::standard();
        assert_eq!(classify(4, &palette).unwrap().1, Size::Small);
        assert_eq!(classify(5, &palette).unwrap().1, Size::Big);
        assert_eq!(classify(0, &palette).unwrap().1, Size::Small);
        assert_eq!(classify(9, &palette).unwrap().1, Size::Big);
    }

    #[test]
    fn test_classify_out_of_range() {
        let err = classify(10, &Palette::standard()).unwrap_err();
        assert_eq!(err.violation(), Some(Violation::OutOfRange));
    }

    #[test]
    fn test_palettes_are_total_and_disjoint() {
        for palette in [Palette::standard(), Palette::legacy()] {
            let mut seen = 0;
            for color in Color::ALL {
                seen += palette.digits_of(color).len();
            }
            assert_eq!(seen, 10);
            for v in 0..=MAX_VALUE {
                assert!(classify(v, &palette).is_ok());
            }
        }
    }

    #[test]
    fn test_standard_palette_partition() {
        let palette = Palette::standard();
        assert_eq!(palette.digits_of(Color::Violet), vec![0, 5]);
        assert_eq!(palette.digits_of(Color::Red), vec![2, 4, 6, 8]);
        assert_eq!(palette.digits_of(Color::Green), vec![1, 3, 7, 9]);
        assert!((palette.rare_share() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_legacy_palette_partition() {
        let palette = Palette::legacy();
        assert_eq!(palette.digits_of(Color::Violet), vec![0]);
        assert_eq!(palette.digits_of(Color::Red), vec![1, 2, 5, 6, 8, 9]);
        assert_eq!(palette.digits_of(Color::Green), vec![3, 4, 7]);
    }

    #[test]
    fn test_outcome_check_detects_mismatch() {
        let palette = Palette::standard();
        let mut outcome = Outcome::classify(7, 2, &palette).unwrap();
        assert!(outcome.check(&palette).is_ok());

        outcome.color = Color::Green;
        let err = outcome.check(&palette).unwrap_err();
        assert_eq!(err.violation(), Some(Violation::ColorMismatch));

        let mut outcome = Outcome::classify(8, 2, &palette).unwrap();
        outcome.size = Size::Big;
        assert_eq!(outcome.check(&palette).unwrap_err().violation(), Some(Violation::SizeMismatch));
    }

    #[test]
    fn test_outcome_classify_keeps_round_id() {
        let err = Outcome::classify(99, 11, &Palette::standard()).unwrap_err();
        assert_eq!(
            err,
            PredictError::InvalidValue { sequence_id: Some(99), value: 11, violation: Violation::OutOfRange }
        );
    }

    #[test]
    fn test_outcomes_from_values_order() {
        let history = outcomes_from_values(&[2, 4, 6], &Palette::standard()).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].sequence_id, 1);
        assert_eq!(history[2].value, 6);
        assert_eq!(history[2].size, Size::Big);
    }

    #[test]
    fn test_labels_roundtrip() {
        for c in Color::ALL {
            assert_eq!(Color::from_label(&c.to_string()), Some(c));
        }
        for s in Size::ALL {
            assert_eq!(Size::from_label(&s.to_string().to_lowercase()), Some(s));
        }
        assert_eq!(Color::from_label("blue"), None);
        assert_eq!(Size::from_label("medium"), None);
    }

    #[test]
    fn test_dimension_balanced() {
        assert_eq!(Dimension::Color.balanced(), vec![0, 1]);
        assert_eq!(Dimension::Size.balanced(), vec![0, 1]);
        assert!(Dimension::Color.is_rare(Color::Violet.index()));
    }

    #[test]
    fn test_outcome_serde_uppercase() {
        let outcome = Outcome::classify(1, 0, &Palette::standard()).unwrap();
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"VIOLET\""));
        assert!(json.contains("\"SMALL\""));
    }
}
