//! Access tokens for the Resource Manager API.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// Supplies bearer tokens.
#[async_trait]
pub trait TokenCredential: Send + Sync + fmt::Debug {
    /// Returns a token valid for `resource`, e.g. `https://management.azure.com/`.
    async fn token(&self, resource: &str) -> Result<SecretString>;
}

/// A fixed token, typically from `ARM_ACCESS_TOKEN`.
pub struct StaticTokenCredential {
    token: SecretString,
}

impl StaticTokenCredential {
    /// Wraps an already issued token.
    #[must_use]
    pub const fn new(token: SecretString) -> Self {
        Self { token }
    }
}

impl fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenCredential")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self, _resource: &str) -> Result<SecretString> {
        Ok(self.token.clone())
    }
}

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN_SECS: i64 = 300;

struct CachedToken {
    token: SecretString,
    expires_on: DateTime<Utc>,
}

/// Obtains tokens from the Azure CLI (`az account get-access-token`).
///
/// Tokens are cached until five minutes before they expire.
pub struct AzureCliCredential {
    tenant_id: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    #[serde(default, rename = "expires_on")]
    expires_on_unix: Option<i64>,
    #[serde(default)]
    expires_on: Option<String>,
}

impl AzureCliCredential {
    /// Creates a credential, optionally pinned to a tenant.
    #[must_use]
    pub fn new(tenant_id: Option<String>) -> Self {
        Self {
            tenant_id,
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self, resource: &str) -> Result<CachedToken> {
        let mut args = vec![
            "account".to_string(),
            "get-access-token".to_string(),
            "--output".to_string(),
            "json".to_string(),
            "--resource".to_string(),
            resource.to_string(),
        ];
        if let Some(tenant) = &self.tenant_id {
            args.push("--tenant".to_string());
            args.push(tenant.clone());
        }

        let output = Command::new("az")
            .args(&args)
            .output()
            .await
            .map_err(|e| Error::Authentication {
                message: format!("failed to run the Azure CLI: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Authentication {
                message: format!("az account get-access-token failed: {}", stderr.trim()),
            });
        }

        parse_cli_token(&output.stdout)
    }
}

fn parse_cli_token(stdout: &[u8]) -> Result<CachedToken> {
    let token: CliToken = serde_json::from_slice(stdout).map_err(|e| Error::Authentication {
        message: format!("unexpected Azure CLI output: {e}"),
    })?;

    let expires_on = token
        .expires_on_unix
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .or_else(|| {
            token.expires_on.as_deref().and_then(|s| {
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                    .ok()
                    .and_then(|naive| naive.and_local_timezone(chrono::Local).single())
                    .map(|local| local.with_timezone(&Utc))
            })
        })
        .ok_or_else(|| Error::Authentication {
            message: "Azure CLI token has no usable expiry".to_string(),
        })?;

    Ok(CachedToken {
        token: SecretString::from(token.access_token),
        expires_on,
    })
}

impl fmt::Debug for AzureCliCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCliCredential")
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    #[instrument(name = "azure_cli_token", skip(self))]
    async fn token(&self, resource: &str) -> Result<SecretString> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref()
            && token.expires_on - ChronoDuration::seconds(EXPIRY_MARGIN_SECS) > Utc::now()
        {
            return Ok(token.token.clone());
        }

        debug!("Requesting access token from the Azure CLI");
        let fresh = self.fetch(resource).await?;
        if fresh.token.expose_secret().is_empty() {
            return Err(Error::Authentication {
                message: "Azure CLI returned an empty token".to_string(),
            });
        }
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let credential = StaticTokenCredential::new(SecretString::from("abc".to_string()));
        let token = credential.token("https://management.azure.com/").await.unwrap();
        assert_eq!(token.expose_secret(), "abc");
        assert!(!format!("{credential:?}").contains("abc"));
    }

    #[test]
    fn test_parse_cli_token_unix_expiry() {
        let out = br#"{"accessToken":"tok","expiresOn":"2030-01-01 10:00:00.000000","expires_on":1893492000,"tokenType":"Bearer"}"#;
        let token = parse_cli_token(out).unwrap();
        assert_eq!(token.token.expose_secret(), "tok");
        assert_eq!(token.expires_on.timestamp(), 1_893_492_000);
    }

    #[test]
    fn test_parse_cli_token_local_expiry() {
        let out = br#"{"accessToken":"tok","expiresOn":"2030-01-01 10:00:00.000000"}"#;
        let token = parse_cli_token(out).unwrap();
        assert!(token.expires_on > Utc::now());
    }

    #[test]
    fn test_parse_cli_token_rejects_garbage() {
        assert!(matches!(
            parse_cli_token(b"not json"),
            Err(Error::Authentication { .. })
        ));
    }
}
