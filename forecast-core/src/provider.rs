use crate::{
    Config, LookupError, LookupQuery, LookupResult,
    provider::{relay::RelayProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod relay;
pub mod weatherapi;
mod wire;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Relay,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Relay => "relay",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Relay, ProviderId::WeatherApi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "relay" => Ok(ProviderId::Relay),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: relay, weatherapi."
            )),
        }
    }
}

/// One network round-trip from a location query to current conditions.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn lookup(&self, query: &LookupQuery) -> Result<LookupResult, LookupError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let endpoint = config.provider_endpoint(id);

    let provider: Arc<dyn WeatherProvider> = match id {
        ProviderId::Relay => match endpoint {
            Some(url) => Arc::new(RelayProvider::new(url)),
            None => Arc::new(RelayProvider::default()),
        },
        ProviderId::WeatherApi => {
            let api_key = config.provider_api_key(id).ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for provider '{id}'.\n\
                     Hint: run `forecast configure {id}` and enter your API key."
                )
            })?;
            match endpoint {
                Some(url) => Arc::new(WeatherApiProvider::with_base_url(api_key.to_owned(), url)),
                None => Arc::new(WeatherApiProvider::new(api_key.to_owned())),
            }
        }
    };

    tracing::debug!(provider = %id, "provider constructed");
    Ok(provider)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_parse_is_case_insensitive() {
        assert_eq!(ProviderId::try_from("WeatherAPI").unwrap(), ProviderId::WeatherApi);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn relay_needs_no_configuration() {
        let cfg = Config::default();
        assert!(provider_from_config(ProviderId::Relay, &cfg).is_ok());
    }

    #[test]
    fn weatherapi_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::WeatherApi, &cfg).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No API key configured for provider"));
        assert!(msg.contains("Hint: run `forecast configure weatherapi`"));
    }

    #[test]
    fn default_provider_from_config_falls_back_to_relay() {
        let cfg = Config::default();
        assert!(default_provider_from_config(&cfg).is_ok());
    }

    #[test]
    fn default_provider_from_config_works_when_set_and_configured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "KEY".to_string());
        cfg.set_default_provider(ProviderId::WeatherApi);

        let provider = default_provider_from_config(&cfg);
        assert!(provider.is_ok());
    }
}
