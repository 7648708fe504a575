//! Client configuration.

use serde::Deserialize;
use zpa_core::{ZpaError, ZpaResult};

/// Base URL of the production cloud.
pub const PRODUCTION_BASE_URL: &str = "https://config.private.zscaler.com";

/// ZPA client configuration.
///
/// `cloud` accepts a well-known cloud name; `base_url` overrides it for
/// non-standard deployments and test servers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZpaConfig {
    /// API client id.
    pub client_id: String,

    /// API client secret.
    pub client_secret: String,

    /// Tenant customer id, embedded in every request path.
    pub customer_id: String,

    /// Well-known cloud name (optional).
    #[serde(default)]
    pub cloud: Option<String>,

    /// Explicit base URL (optional, wins over `cloud`).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ZpaConfig {
    /// Create a configuration from explicit credentials.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        customer_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            customer_id: customer_id.into(),
            cloud: None,
            base_url: None,
        }
    }

    /// Override the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Select a well-known cloud by name.
    #[must_use]
    pub fn with_cloud(mut self, cloud: impl Into<String>) -> Self {
        self.cloud = Some(cloud.into());
        self
    }

    /// Load credentials from `ZPA_CLIENT_ID`, `ZPA_CLIENT_SECRET`,
    /// `ZPA_CUSTOMER_ID` and the optional `ZPA_CLOUD`.
    pub fn from_env() -> ZpaResult<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| ZpaError::Config(format!("Missing environment variable {name}")))
        };
        Ok(Self {
            client_id: var("ZPA_CLIENT_ID")?,
            client_secret: var("ZPA_CLIENT_SECRET")?,
            customer_id: var("ZPA_CUSTOMER_ID")?,
            cloud: std::env::var("ZPA_CLOUD").ok(),
            base_url: None,
        })
    }

    /// Resolve the effective base URL.
    pub(crate) fn resolve_base_url(&self) -> ZpaResult<String> {
        if let Some(url) = &self.base_url {
            let parsed = url::Url::parse(url)
                .map_err(|err| ZpaError::Config(format!("Invalid base URL '{url}': {err}")))?;
            return Ok(parsed.as_str().trim_end_matches('/').to_string());
        }
        match self.cloud.as_deref() {
            None | Some("PRODUCTION" | "production") => Ok(PRODUCTION_BASE_URL.to_string()),
            Some("BETA" | "beta") => Ok("https://config.zpabeta.net".to_string()),
            Some("GOV" | "gov") => Ok("https://config.zpagov.net".to_string()),
            Some("GOVUS" | "govus") => Ok("https://config.zpagov.us".to_string()),
            Some("PREVIEW" | "preview") => Ok("https://config.zpapreview.net".to_string()),
            Some(other) => Err(ZpaError::Config(format!("Unknown ZPA cloud: {other}"))),
        }
    }

    /// Validate that the mandatory credentials are present.
    pub(crate) fn validate(&self) -> ZpaResult<()> {
        for (name, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("customer_id", &self.customer_id),
        ] {
            if value.trim().is_empty() {
                return Err(ZpaError::Config(format!("Missing required '{name}'")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_base_url_wins_over_cloud() {
        let config = ZpaConfig::new("id", "secret", "123")
            .with_cloud("BETA")
            .with_base_url("http://localhost:8080/");
        assert_eq!(config.resolve_base_url().unwrap(), "http://localhost:8080");
    }

    #[test]
    fn default_cloud_is_production() {
        let config = ZpaConfig::new("id", "secret", "123");
        assert_eq!(config.resolve_base_url().unwrap(), PRODUCTION_BASE_URL);
    }

    #[test]
    fn malformed_base_url_is_a_config_error() {
        let config = ZpaConfig::new("id", "secret", "123").with_base_url("not a url");
        assert!(matches!(
            config.resolve_base_url(),
            Err(zpa_core::ZpaError::Config(_))
        ));
    }

    #[test]
    fn unknown_cloud_is_a_config_error() {
        let config = ZpaConfig::new("id", "secret", "123").with_cloud("nonsense");
        assert!(matches!(
            config.resolve_base_url(),
            Err(zpa_core::ZpaError::Config(_))
        ));
    }

    #[test]
    fn blank_credentials_fail_validation() {
        let config = ZpaConfig::new("id", " ", "123");
        assert!(config.validate().is_err());
    }
}
