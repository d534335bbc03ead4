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

pub const WEATHERAPI_CURRENT_URL: &str = "http://api.weatherapi.com/v1/current.json";

/// Talks to WeatherAPI.com directly, skipping the relay.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, WEATHERAPI_CURRENT_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self { api_key, base_url: base_url.into(), http: Client::new() }
    }
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    error: Option<WaErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct WaErrorDetail {
    message: Option<String>,
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn lookup(&self, query: &LookupQuery) -> Result<LookupResult, LookupError> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[("key", self.api_key.as_str()), ("q", query.query.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        debug!(%status, bytes = body.len(), "weatherapi responded");

        if !status.is_success() {
            let message = serde_json::from_str::<WaErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message);
            return Err(LookupError::rejected(status, message));
        }

        let parsed: WaCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            LookupError::Malformed(format!("{e}; body: {}", truncate_body(&body)))
        })?;

        Ok(parsed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    #[tokio::test]
    async fn sends_key_and_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .and(query_param("key", "KEY"))
            .and(query_param("q", "Rosario"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "location": { "name": "Rosario", "region": "Santa Fe" },
                "current": {
                    "temp_c": 18.0, "temp_f": 64.4, "humidity": 77,
                    "wind_kph": 13.0, "wind_mph": 8.1, "is_day": 0,
                    "condition": { "text": "Clear", "icon": "//cdn/night/113.png" }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = WeatherApiProvider::with_base_url(
            "KEY".into(),
            format!("{}/v1/current.json", server.uri()),
        );
        let result = provider.lookup(&LookupQuery::new("Rosario")).await.unwrap();

        assert_eq!(result.place(), "Rosario, Santa Fe");
        assert!(!result.is_day);
    }

    #[tokio::test]
    async fn transport_error_does_not_leak_api_key() {
        let provider = WeatherApiProvider::with_base_url(
            "SECRET-KEY-123".into(),
            "http://127.0.0.1:9/v1/current.json",
        );
        let err = provider.lookup(&LookupQuery::new("Madrid")).await.unwrap_err();

        assert!(matches!(err, LookupError::Transport(_)));
        assert!(!err.user_message().contains("SECRET-KEY-123"));
        assert!(!err.to_string().contains("SECRET-KEY-123"));
    }

    #[tokio::test]
    async fn nested_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "code": 1006, "message": "No matching location found." }
            })))
            .mount(&server)
            .await;

        let provider = WeatherApiProvider::with_base_url("KEY".into(), server.uri());
        let err = provider.lookup(&LookupQuery::new("zzzz")).await.unwrap_err();

        assert_eq!(err.user_message(), "No matching location found.");
    }
}
