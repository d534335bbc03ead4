use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::LookupError,
    model::{LookupQuery, LookupResult},
};

use super::{
    WeatherProvider,
    wire::{WaCurrentResponse, truncate_body},
};

/// Public relay the form was built against.
pub const DEFAULT_RELAY_ENDPOINT: &str = "https://pronostico-api.facyndev.repl.co/api/weather";

/// POSTs `{ "query": ... }` to a relay that answers `{ "data": { current, location } }`
/// or `{ "message": ... }` on failure.
#[derive(Debug, Clone)]
pub struct RelayProvider {
    endpoint: String,
    http: Client,
}

impl RelayProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), http: Client::new() }
    }
}

impl Default for RelayProvider {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_ENDPOINT)
    }
}

#[derive(Debug, Deserialize)]
struct RelayEnvelope {
    data: WaCurrentResponse,
}

#[derive(Debug, Deserialize)]
struct RelayErrorBody {
    message: Option<String>,
}

#[async_trait]
impl WeatherProvider for RelayProvider {
    async fn lookup(&self, query: &LookupQuery) -> Result<LookupResult, LookupError> {
        let res = self.http.post(&self.endpoint).json(query).send().await?;

        let status = res.status();
        let body = res.text().await?;
        debug!(%status, bytes = body.len(), "relay responded");

        if !status.is_success() {
            let message = serde_json::from_str::<RelayErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            return Err(LookupError::rejected(status, message));
        }

        let parsed: RelayEnvelope = serde_json::from_str(&body).map_err(|e| {
            LookupError::Malformed(format!("{e}; body: {}", truncate_body(&body)))
        })?;

        Ok(parsed.data.into())
    }
}
