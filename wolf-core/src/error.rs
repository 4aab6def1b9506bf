use thiserror::Error;

use crate::models::MAX_VALUE;

/// Raison du rejet d'un tirage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    OutOfRange,
    ColorMismatch,
    SizeMismatch,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::OutOfRange => write!(f, "hors limites (0-{})", MAX_VALUE),
            Violation::ColorMismatch => write!(f, "couleur incohérente avec la palette"),
            Violation::SizeMismatch => write!(f, "taille incohérente avec la valeur"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    /// Tirage invalide : toute l'historique est rejetée, pas de scoring partiel.
    #[error("valeur {value} rejetée{} : {violation}", round_suffix(.sequence_id))]
    InvalidValue {
        sequence_id: Option<u64>,
        value: u8,
        violation: Violation,
    },
    /// Configuration du moteur incohérente, détectée avant tout scoring.
    #[error("configuration invalide : {0}")]
    InvalidConfig(String),
}

impl PredictError {
    pub fn violation(&self) -> Option<Violation> {
        match self {
            PredictError::InvalidValue { violation, .. } => Some(*violation),
            PredictError::InvalidConfig(_) => None,
        }
    }
}

fn round_suffix(sequence_id: &Option<u64>) -> String {
    match sequence_id {
        Some(id) => format!(" (tirage {})", id),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_with_round() {
        let err = PredictError::InvalidValue {
            sequence_id: Some(42),
            value: 12,
            violation: Violation::OutOfRange,
        };
        assert_eq!(err.to_string(), "valeur 12 rejetée (tirage 42) : hors limites (0-9)");
    }

    #[test]
    fn test_error_message_without_round() {
        let err = PredictError::InvalidValue {
            sequence_id: None,
            value: 3,
            violation: Violation::ColorMismatch,
        };
        assert_eq!(err.to_string(), "valeur 3 rejetée : couleur incohérente avec la palette");
        assert_eq!(err.violation(), Some(Violation::ColorMismatch));
    }

    #[test]
    fn test_invalid_config_message() {
        let err = PredictError::InvalidConfig("fenêtre vide".to_string());
        assert_eq!(err.to_string(), "configuration invalide : fenêtre vide");
        assert_eq!(err.violation(), None);
    }
}
