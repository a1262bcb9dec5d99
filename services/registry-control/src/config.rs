//! Configuration for building a production client.

use http::Uri;
use rpc_client::{ApiKey, RpcClient, TokenAuth};
use serde::Deserialize;

use crate::client::RegistryClient;
use crate::error::RegistryError;
use crate::models::RegistryId;
use crate::transport::{HttpControlPlane, API_VERSION};

/// Page size used when the configuration does not name one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Connection settings for one registry control plane.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfiguration {
    /// Control-plane endpoint.
    #[serde(with = "rpc_client::uri::serde")]
    pub endpoint: Uri,

    /// API token for the control plane.
    pub token: ApiKey,

    /// Registry instance to address.
    pub registry_id: RegistryId,

    /// Page size for listing walks. Defaults to [`DEFAULT_PAGE_SIZE`].
    pub page_size: Option<u64>,
}

impl RegistryConfiguration {
    /// Read the configuration from the environment.
    ///
    /// `REGISTRY_ENDPOINT`, `REGISTRY_API_TOKEN` and `REGISTRY_INSTANCE_ID`
    /// are required; `REGISTRY_PAGE_SIZE` is optional.
    pub fn from_env() -> Result<Self, RegistryError> {
        let endpoint = var("REGISTRY_ENDPOINT")?
            .parse::<Uri>()
            .map_err(|err| RegistryError::Configuration(format!("REGISTRY_ENDPOINT: {err}")))?;

        let token = ApiKey::from_env("REGISTRY_API_TOKEN")
            .map_err(|_| RegistryError::Configuration("REGISTRY_API_TOKEN is not set".into()))?;

        let registry_id = RegistryId::new(var("REGISTRY_INSTANCE_ID")?);

        let page_size = match std::env::var("REGISTRY_PAGE_SIZE") {
            Ok(raw) => Some(raw.parse().map_err(|err| {
                RegistryError::Configuration(format!("REGISTRY_PAGE_SIZE: {err}"))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            endpoint,
            token,
            registry_id,
            page_size,
        })
    }

    /// Build a client over the production HTTP transport.
    pub fn client(&self) -> Result<RegistryClient<HttpControlPlane>, RegistryError> {
        let rpc = RpcClient::new(
            self.endpoint.clone(),
            API_VERSION,
            TokenAuth::new(self.token.clone()),
        );

        RegistryClient::new(
            HttpControlPlane::new(rpc),
            self.registry_id.clone(),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

fn var(name: &str) -> Result<String, RegistryError> {
    std::env::var(name).map_err(|_| RegistryError::Configuration(format!("{name} is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_string_endpoint() {
        let config: RegistryConfiguration = serde_json::from_value(serde_json::json!({
            "endpoint": "https://registry.example.test/",
            "token": "a-key",
            "registry_id": "reg-1",
            "page_size": 50,
        }))
        .unwrap();

        assert_eq!(config.endpoint.host(), Some("registry.example.test"));
        assert_eq!(config.page_size, Some(50));
        assert!(!format!("{config:?}").contains("a-key"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let config: RegistryConfiguration = serde_json::from_value(serde_json::json!({
            "endpoint": "https://registry.example.test/",
            "token": "a-key",
            "registry_id": "reg-1",
            "page_size": 0,
        }))
        .unwrap();

        assert!(matches!(
            config.client(),
            Err(RegistryError::Configuration(_))
        ));
    }
}
