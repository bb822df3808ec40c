use realtime_transport::Config;
use url::Url;

use crate::error::Result;

/// WebSocket endpoint of the hosted OpenAI API.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// REST base of the hosted OpenAI API.
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// API version sent to Azure deployments.
pub const AZURE_API_VERSION: &str = "2024-10-01-preview";

/// Model used when a connection does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o-realtime-preview-2024-12-17";

/// Which flavour of the API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiType {
    /// api.openai.com or a compatible server
    OpenAi,
    /// An Azure OpenAI deployment
    Azure,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key or ephemeral client secret
    pub auth_token: String,
    /// API flavour, which decides URL and header layout
    pub api_type: ApiType,
    /// WebSocket endpoint
    pub base_url: String,
    /// REST base URL for session endpoints
    pub api_base_url: String,
    /// Azure only
    pub api_version: String,
    /// Model, or Azure deployment, used when [`ConnectOptions::model`] is unset
    pub default_model: String,
}

impl ClientConfig {
    /// Configuration for the hosted OpenAI API.
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            api_type: ApiType::OpenAi,
            base_url: OPENAI_REALTIME_URL.to_string(),
            api_base_url: OPENAI_API_URL.to_string(),
            api_version: String::new(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Configuration for an Azure deployment.
    ///
    /// `base_url` is the realtime WebSocket endpoint of the resource, for
    /// example `wss://my-resource.openai.azure.com/openai/realtime`.
    pub fn azure(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            auth_token: api_key.into(),
            api_type: ApiType::Azure,
            api_base_url: base_url.replacen("wss://", "https://", 1),
            base_url,
            api_version: AZURE_API_VERSION.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    /// WebSocket URL for `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn realtime_url(&self, model: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        match self.api_type {
            ApiType::OpenAi => {
                url.query_pairs_mut().append_pair("model", model);
            }
            ApiType::Azure => {
                url.query_pairs_mut()
                    .append_pair("api-version", &self.api_version)
                    .append_pair("deployment", model);
            }
        }
        Ok(url)
    }

    /// Headers authenticating a request against the configured API.
    pub fn auth_headers(&self) -> Vec<(String, String)> {
        match self.api_type {
            ApiType::OpenAi => vec![
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", self.auth_token),
                ),
                ("OpenAI-Beta".to_string(), "realtime=v1".to_string()),
            ],
            ApiType::Azure => vec![("api-key".to_string(), self.auth_token.clone())],
        }
    }
}

/// Per-connection options.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Overrides [`ClientConfig::default_model`]
    pub model: Option<String>,
    /// Extra headers for the upgrade request
    pub headers: Vec<(String, String)>,
    /// Transport timeouts
    pub transport: Config,
}

impl ConnectOptions {
    /// Connect to `model` instead of the configured default.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_url_and_headers() {
        let config = ClientConfig::new("sk-test");

        let url = config.realtime_url("gpt-4o-realtime-preview").unwrap();
        assert_eq!(
            url.as_str(),
            "wss://api.openai.com/v1/realtime?model=gpt-4o-realtime-preview"
        );

        let headers = config.auth_headers();
        assert!(headers.contains(&("Authorization".to_string(), "Bearer sk-test".to_string())));
        assert!(headers.contains(&("OpenAI-Beta".to_string(), "realtime=v1".to_string())));
    }

    #[test]
    fn test_azure_url_and_headers() {
        let config = ClientConfig::azure("azure-key", "wss://res.openai.azure.com/openai/realtime");

        let url = config.realtime_url("my-deployment").unwrap();
        assert_eq!(
            url.as_str(),
            "wss://res.openai.azure.com/openai/realtime?api-version=2024-10-01-preview&deployment=my-deployment"
        );
        assert_eq!(config.api_base_url, "https://res.openai.azure.com/openai/realtime");
        assert_eq!(
            config.auth_headers(),
            vec![("api-key".to_string(), "azure-key".to_string())]
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..ClientConfig::new("k")
        };
        assert!(config.realtime_url("m").is_err());
    }
}
