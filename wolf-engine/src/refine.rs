use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use wolf_core::{Color, Outcome, Size};

use crate::engine::{PredictionResult, Source};

#[derive(Debug, Error)]
pub enum RefineError {
    #[error("service de raffinement indisponible : {0}")]
    Unavailable(String),
    #[error("délai dépassé après {0:?}")]
    Timeout(Duration),
    #[error("réponse illisible : {0}")]
    MalformedResponse(String),
}

/// Corps envoyé au service : la fenêtre brute et le résultat local.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementRequest {
    pub history: Vec<Outcome>,
    pub local: PredictionResult,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefinementResponse {
    pub color: Option<String>,
    pub size: Option<String>,
    pub explanation: Option<String>,
}

impl RefinementResponse {
    /// Accepte un JSON brut ou un JSON noyé dans du texte libre.
    pub fn parse(body: &str) -> Result<Self, RefineError> {
        let json = match (body.find('{'), body.rfind('}')) {
            (Some(start), Some(end)) if start < end => &body[start..=end],
            _ => return Err(RefineError::MalformedResponse("aucun objet JSON".to_string())),
        };
        serde_json::from_str(json).map_err(|e| RefineError::MalformedResponse(e.to_string()))
    }
}

/// Collaborateur externe optionnel : confirme, ajuste ou remplace la prédiction.
pub trait Refiner {
    fn refine(&self, request: &RefinementRequest) -> Result<RefinementResponse, RefineError>;
}

/// Applique une réponse validée. Un seul champ hors domaine rejette toute la réponse.
pub fn apply_override(
    local: &PredictionResult,
    response: &RefinementResponse,
) -> Result<PredictionResult, RefineError> {
    let color = match response.color.as_deref() {
        Some(label) => Some(
            Color::from_label(label)
                .ok_or_else(|| RefineError::MalformedResponse(format!("couleur inconnue '{}'", label)))?,
        ),
        None => None,
    };
    let size = match response.size.as_deref() {
        Some(label) => Some(
            Size::from_label(label)
                .ok_or_else(|| RefineError::MalformedResponse(format!("taille inconnue '{}'", label)))?,
        ),
        None => None,
    };
    let explanation = response
        .explanation
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    if color.is_none() && size.is_none() && explanation.is_none() {
        return Err(RefineError::MalformedResponse("réponse vide".to_string()));
    }

    let mut refined = local.clone();
    if let Some(c) = color {
        refined.color = c;
    }
    if let Some(s) = size {
        refined.size = s;
    }
    if let Some(e) = explanation {
        refined.rationale.push(format!("raffinement : {}", e));
    }
    refined.source = Source::Refined;
    Ok(refined)
}

/// Ne propage jamais d'erreur : toute défaillance du collaborateur rend le
/// résultat local inchangé.
pub fn refine_or_local(refiner: &dyn Refiner, window: &[Outcome], local: PredictionResult) -> PredictionResult {
    let request = RefinementRequest {
        history: window.to_vec(),
        local: local.clone(),
    };
    match refiner.refine(&request).and_then(|r| apply_override(&local, &r)) {
        Ok(refined) => {
            info!(color = %refined.color, size = %refined.size, "prédiction raffinée");
            refined
        }
        Err(e) => {
            warn!(error = %e, "raffinement ignoré, résultat local conservé");
            local
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::predict;
    use wolf_core::models::outcomes_from_values;
    use wolf_core::Palette;

    struct Scripted(fn() -> Result<RefinementResponse, RefineError>);

    impl Refiner for Scripted {
        fn refine(&self, _request: &RefinementRequest) -> Result<RefinementResponse, RefineError> {
            (self.0)()
        }
    }

    fn local() -> (Vec<Outcome>, PredictionResult) {
        let history = outcomes_from_values(&[2, 4, 6, 8, 5], &Palette::standard()).unwrap();
        let result = predict(&history, &EngineConfig::default()).unwrap();
        (history, result)
    }

    #[test]
    fn test_parse_plain_json() {
        let r = RefinementResponse::parse(r#"{"color":"red","size":"BIG"}"#).unwrap();
        assert_eq!(r.color.as_deref(), Some("red"));
        assert_eq!(r.size.as_deref(), Some("BIG"));
        assert!(r.explanation.is_none());
    }

    #[test]
    fn test_parse_json_in_prose() {
        let body = "Analyse :\n```json\n{\"color\": \"GREEN\", \"explanation\": \"série rouge\"}\n```";
        let r = RefinementResponse::parse(body).unwrap();
        assert_eq!(r.color.as_deref(), Some("GREEN"));
    }

    #[test]
    fn test_parse_rejects_prose_only() {
        assert!(matches!(
            RefinementResponse::parse("RED next, trust me"),
            Err(RefineError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_valid_override_applied() {
        let (history, local) = local();
        let refiner = Scripted(|| {
            Ok(RefinementResponse {
                color: Some("violet".into()),
                size: None,
                explanation: Some("violet en retard".into()),
            })
        });
        let refined = refine_or_local(&refiner, &history, local.clone());
        assert_eq!(refined.color, Color::Violet);
        assert_eq!(refined.size, local.size);
        assert_eq!(refined.source, Source::Refined);
        assert_eq!(refined.rationale.last().unwrap(), "raffinement : violet en retard");
    }

    #[test]
    fn test_out_of_domain_falls_back() {
        let (history, local) = local();
        let refiner = Scripted(|| {
            Ok(RefinementResponse { color: Some("BLUE".into()), size: Some("BIG".into()), explanation: None })
        });
        assert_eq!(refine_or_local(&refiner, &history, local.clone()), local);
    }

    #[test]
    fn test_timeout_falls_back() {
        let (history, local) = local();
        let refiner = Scripted(|| Err(RefineError::Timeout(Duration::from_millis(10))));
        assert_eq!(refine_or_local(&refiner, &history, local.clone()), local);
    }

    #[test]
    fn test_unavailable_and_malformed_fall_back() {
        let (history, local) = local();
        let down = Scripted(|| Err(RefineError::Unavailable("connexion refusée".into())));
        assert_eq!(refine_or_local(&down, &history, local.clone()), local);
        let empty = Scripted(|| Ok(RefinementResponse::default()));
        assert_eq!(refine_or_local(&empty, &history, local.clone()), local);
    }
}
