//! Provider configuration.
//!
//! Settings come from an optional TOML file and are then overridden by the
//! usual `ARM_*` environment variables:
//!
//! ```toml
//! subscription_id = "00000000-0000-0000-0000-000000000000"
//! use_cli = true
//! poll_interval_secs = 10
//!
//! [retry]
//! budget_secs = 300
//!
//! [timeouts]
//! read_secs = 120
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::credentials::{AzureCliCredential, StaticTokenCredential, TokenCredential};
use crate::error::{Error, Result};
use crate::retry::RetryConfig;
use crate::timeouts::Timeouts;

/// Public cloud Resource Manager endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Default interval between long-running operation polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// How the provider authenticates.
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// A pre-issued bearer token
    AccessToken(SecretString),
    /// Tokens from `az account get-access-token`
    AzureCli,
}

/// Resolved provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Resource Manager endpoint without a trailing slash
    pub endpoint: String,
    /// Subscription resources live in by default
    pub subscription_id: String,
    /// Tenant to authenticate against
    pub tenant_id: Option<String>,
    /// Authentication method
    pub auth: AuthMethod,
    /// Transient error retry behaviour
    pub retry: RetryConfig,
    /// Interval between long-running operation polls when the service
    /// sends no `Retry-After`
    pub poll_interval: Duration,
    /// Per-operation deadlines
    pub timeouts: Timeouts,
}

/// Configuration as written in the file, before environment overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    endpoint: Option<String>,
    subscription_id: Option<String>,
    tenant_id: Option<String>,
    access_token: Option<String>,
    use_cli: Option<bool>,
    poll_interval_secs: Option<u64>,
    #[serde(default)]
    retry: RetryConfig,
    #[serde(default)]
    timeouts: Timeouts,
}

impl RawConfig {
    fn apply_env(&mut self) -> Result<()> {
        if let Some(value) = env_var("ARM_RESOURCE_MANAGER_ENDPOINT") {
            self.endpoint = Some(value);
        }
        if let Some(value) = env_var("ARM_SUBSCRIPTION_ID") {
            self.subscription_id = Some(value);
        }
        if let Some(value) = env_var("ARM_TENANT_ID") {
            self.tenant_id = Some(value);
        }
        if let Some(value) = env_var("ARM_ACCESS_TOKEN") {
            self.access_token = Some(value);
        }
        if let Some(value) = env_var("ARM_USE_CLI") {
            self.use_cli = Some(parse_bool("ARM_USE_CLI", &value)?);
        }
        Ok(())
    }

    fn resolve(self) -> Result<ProviderConfig> {
        let subscription_id = self
            .subscription_id
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::configuration("subscription_id is required"))?;

        let auth = match (self.access_token, self.use_cli.unwrap_or(false)) {
            (Some(token), _) if !token.is_empty() => AuthMethod::AccessToken(SecretString::from(token)),
            (_, true) => AuthMethod::AzureCli,
            _ => {
                return Err(Error::configuration(
                    "no credentials configured: set access_token or use_cli",
                ));
            }
        };

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();
        if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
            return Err(Error::configuration(format!(
                "endpoint must be an http(s) URL, got {endpoint:?}"
            )));
        }

        Ok(ProviderConfig {
            endpoint,
            subscription_id,
            tenant_id: self.tenant_id.filter(|s| !s.is_empty()),
            auth,
            retry: self.retry,
            poll_interval: Duration::from_secs(
                self.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            timeouts: self.timeouts,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(Error::configuration(format!(
            "{name} must be a boolean, got {value:?}"
        ))),
    }
}

impl ProviderConfig {
    /// Loads configuration from `path` (if given) and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// result lacks a subscription or credentials.
    #[instrument(name = "provider_config_load")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut raw = match path {
            Some(path) => {
                debug!(path = %path.display(), "Reading provider configuration");
                toml::from_str(&std::fs::read_to_string(path)?)?
            }
            None => RawConfig::default(),
        };
        raw.apply_env()?;
        raw.resolve()
    }

    /// Parses configuration from a TOML string without consulting the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or incomplete.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(input)?;
        raw.resolve()
    }

    /// Builds the credential for the configured auth method.
    #[must_use]
    pub fn credential(&self) -> Arc<dyn TokenCredential> {
        match &self.auth {
            AuthMethod::AccessToken(token) => Arc::new(StaticTokenCredential::new(token.clone())),
            AuthMethod::AzureCli => Arc::new(AzureCliCredential::new(self.tenant_id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml() {
        let config = ProviderConfig::from_toml_str(
            r#"
            subscription_id = "sub"
            use_cli = true
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(matches!(config.auth, AuthMethod::AzureCli));
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.poll_interval, Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS));
    }

    #[test]
    fn test_missing_subscription() {
        let err = ProviderConfig::from_toml_str("use_cli = true").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_missing_credentials() {
        let err = ProviderConfig::from_toml_str(r#"subscription_id = "sub""#).unwrap_err();
        assert!(err.to_string().contains("no credentials configured"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(ProviderConfig::from_toml_str("subscription = \"typo\"").is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ProviderConfig::from_toml_str(
            r#"
            endpoint = "https://management.usgovcloudapi.net/"
            subscription_id = "sub"
            access_token = "t"
            "#,
        )
        .unwrap();
        assert_eq!(config.endpoint, "https://management.usgovcloudapi.net");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }
}
