//! Minimal Resource Manager HTTP client.
//!
//! Covers what the resources in this workspace need: `GET`, `PUT` and
//! `DELETE` with an `api-version`, bearer authentication, decoding of the
//! ARM error envelope, and polling of long-running operations.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::ProviderConfig;
use crate::credentials::TokenCredential;
use crate::error::{ApiError, Error, Result};

const ASYNC_OPERATION: &str = "Azure-AsyncOperation";
const LOCATION: &str = "Location";

/// An authenticated Resource Manager client.
#[derive(Debug, Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    endpoint: String,
    credential: Arc<dyn TokenCredential>,
    poll_interval: Duration,
}

#[derive(Deserialize)]
struct OperationStatus {
    status: String,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Deserialize)]
struct OperationError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl ArmClient {
    /// Creates a client against `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("azurerm-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            credential,
            poll_interval,
        })
    }

    /// Creates a client from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Self::new(config.endpoint.clone(), config.credential(), config.poll_interval)
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        api_version: Option<&str>,
    ) -> Result<reqwest::RequestBuilder> {
        let resource = format!("{}/", self.endpoint);
        let token = self.credential.token(&resource).await?;

        let mut builder = self
            .http
            .request(method, url)
            .bearer_auth(token.expose_secret());
        if let Some(api_version) = api_version {
            builder = builder.query(&[("api-version", api_version)]);
        }
        Ok(builder)
    }

    /// Fetches the resource at `path`; `None` on 404.
    ///
    /// # Errors
    ///
    /// Returns an error for any other non-success status or an
    /// undecodable body.
    #[instrument(name = "arm_get", skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<Option<T>> {
        let url = format!("{}{path}", self.endpoint);
        let response = self
            .request(Method::GET, &url, Some(api_version))
            .await?
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Resource not found");
            return Ok(None);
        }

        let response = check(&format!("retrieving {path}"), response).await?;
        Ok(Some(response.json().await?))
    }

    /// Creates or replaces the resource at `path` and waits for the
    /// operation to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is rejected or the long-running
    /// operation fails.
    #[instrument(name = "arm_put", skip(self, body))]
    pub async fn put<B>(&self, path: &str, api_version: &str, body: &B) -> Result<()>
    where
        B: Serialize + Sync + ?Sized,
    {
        let operation = format!("creating/updating {path}");
        let url = format!("{}{path}", self.endpoint);
        let response = self
            .request(Method::PUT, &url, Some(api_version))
            .await?
            .json(body)
            .send()
            .await?;

        let response = check(&operation, response).await?;
        self.wait_for_completion(&operation, response.status(), response.headers().clone())
            .await
    }

    /// Deletes the resource at `path` and waits for the operation to
    /// finish. A resource that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is rejected or the long-running
    /// operation fails.
    #[instrument(name = "arm_delete", skip(self))]
    pub async fn delete(&self, path: &str, api_version: &str) -> Result<()> {
        let operation = format!("deleting {path}");
        let url = format!("{}{path}", self.endpoint);
        let response = self
            .request(Method::DELETE, &url, Some(api_version))
            .await?
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Resource already deleted");
            return Ok(());
        }

        let response = check(&operation, response).await?;
        self.wait_for_completion(&operation, response.status(), response.headers().clone())
            .await
    }

    async fn wait_for_completion(
        &self,
        operation: &str,
        status: StatusCode,
        headers: HeaderMap,
    ) -> Result<()> {
        if let Some(url) = header(&headers, ASYNC_OPERATION) {
            let delay = retry_after(&headers).unwrap_or(self.poll_interval);
            return self.poll_async_operation(operation, &url, delay).await;
        }

        if status == StatusCode::ACCEPTED
            && let Some(url) = header(&headers, LOCATION)
        {
            let delay = retry_after(&headers).unwrap_or(self.poll_interval);
            return self.poll_location(operation, &url, delay).await;
        }

        Ok(())
    }

    async fn poll_async_operation(&self, operation: &str, url: &str, mut delay: Duration) -> Result<()> {
        loop {
            tokio::time::sleep(delay).await;

            let response = self.request(Method::GET, url, None).await?.send().await?;
            let response = check(operation, response).await?;
            delay = retry_after(response.headers()).unwrap_or(self.poll_interval);

            let status: OperationStatus = response.json().await?;
            debug!(operation, status = %status.status, "Polled long-running operation");

            match status.status.to_ascii_lowercase().as_str() {
                "succeeded" => return Ok(()),
                "failed" | "canceled" | "cancelled" => {
                    let message = status
                        .error
                        .map(|e| format!("{}: {}", e.code, e.message))
                        .unwrap_or_default();
                    return Err(Error::OperationFailed {
                        operation: operation.to_string(),
                        status: status.status,
                        message,
                    });
                }
                _ => {}
            }
        }
    }

    async fn poll_location(&self, operation: &str, url: &str, mut delay: Duration) -> Result<()> {
        loop {
            tokio::time::sleep(delay).await;

            let response = self.request(Method::GET, url, None).await?.send().await?;
            let status = response.status();
            debug!(operation, status = status.as_u16(), "Polled operation location");

            if status == StatusCode::ACCEPTED {
                delay = retry_after(response.headers()).unwrap_or(self.poll_interval);
                continue;
            }

            check(operation, response).await?;
            return Ok(());
        }
    }
}

async fn check(operation: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::api(operation, ApiError::from_response(status.as_u16(), body)))
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_retry_after_http_date_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_empty_header_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static(""));
        assert_eq!(header(&headers, LOCATION), None);
    }
}
