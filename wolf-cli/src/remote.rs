use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::debug;

use wolf_engine::refine::{RefineError, RefinementRequest, RefinementResponse, Refiner};

pub const TOKEN_ENV: &str = "WOLF_REFINE_TOKEN";
pub const DEFAULT_TIMEOUT_MS: u64 = 8_000;

/// Service de raffinement HTTP : POST JSON, réponse JSON éventuellement noyée
/// dans du texte.
pub struct HttpRefiner {
    client: Client,
    url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpRefiner {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Impossible de créer le client HTTP")?;
        let token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.trim().is_empty());
        Ok(Self {
            client,
            url: url.into(),
            token,
            timeout,
        })
    }

    fn map_transport(&self, e: reqwest::Error) -> RefineError {
        if e.is_timeout() {
            RefineError::Timeout(self.timeout)
        } else {
            RefineError::Unavailable(e.to_string())
        }
    }
}

impl Refiner for HttpRefiner {
    fn refine(&self, request: &RefinementRequest) -> Result<RefinementResponse, RefineError> {
        let mut builder = self.client.post(&self.url).json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().map_err(|e| self.map_transport(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RefineError::Unavailable(format!("HTTP {}", status)));
        }

        let body = response.text().map_err(|e| self.map_transport(e))?;
        debug!(bytes = body.len(), "réponse du service de raffinement");
        RefinementResponse::parse(&body)
    }
}
