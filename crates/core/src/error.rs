//! Error types shared by every azurerm resource.

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use azurerm_resourceids::ParseError;

use crate::retry::{self, Disposition};

/// Result type alias using the azurerm error type.
pub type Result<T> = std::result::Result<T, Error>;

/// An error returned by the Resource Manager API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected status {status} with error: {code}: {message}")]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// ARM error code, e.g. `ReferencedResourceNotProvisioned`
    pub code: String,
    /// Human readable message
    pub message: String,
    /// Raw response body
    pub body: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl ApiError {
    /// Builds an [`ApiError`] from a status code and raw body.
    ///
    /// The ARM error envelope `{"error": {"code": ..., "message": ...}}` is
    /// decoded when present; otherwise the body becomes the message.
    #[must_use]
    pub fn from_response(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => (envelope.error.code, envelope.error.message),
            Err(_) => (String::new(), body.clone()),
        };

        Self {
            status,
            code,
            message,
            body,
        }
    }

    /// Classifies this error as retryable or fatal.
    #[must_use]
    pub fn disposition(&self) -> Disposition {
        retry::classify(self.status, &self.body)
    }
}

/// Errors that can occur while managing azurerm resources.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The resource does not exist.
    #[error("{id} was not found")]
    #[diagnostic(code(azurerm_core::not_found))]
    NotFound {
        /// Human readable ID of the missing resource
        id: String,
    },

    /// The parent resource is not in a state that allows this operation.
    #[error("{id}: {message}")]
    #[diagnostic(code(azurerm_core::precondition_failed))]
    PreconditionFailed {
        /// Human readable ID of the parent resource
        id: String,
        /// What needs to change
        message: String,
    },

    /// The resource already exists and must be imported.
    #[error(
        "A resource with the ID {id:?} already exists - to be managed via Terraform this resource needs to be imported into the State. Please see the resource documentation for {resource_type:?} for more information."
    )]
    #[diagnostic(
        code(azurerm_core::already_exists),
        help("import the existing resource with `terraform import {resource_type}.<name> {id}`")
    )]
    AlreadyExists {
        /// Terraform type name
        resource_type: String,
        /// ARM ID of the existing resource
        id: String,
    },

    /// The API rejected the request.
    #[error("{operation}: {source}")]
    #[diagnostic(code(azurerm_core::api_error))]
    Api {
        /// What was being attempted
        operation: String,
        /// The decoded API error
        #[source]
        source: ApiError,
    },

    /// A long-running operation finished in a failed state.
    #[error("{operation}: long-running operation finished with status {status:?}: {message}")]
    #[diagnostic(code(azurerm_core::operation_failed))]
    OperationFailed {
        /// What was being attempted
        operation: String,
        /// Terminal status reported by the service
        status: String,
        /// Error message reported by the service
        message: String,
    },

    /// Transient errors persisted for the whole retry budget.
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    #[diagnostic(
        code(azurerm_core::retry_exhausted),
        help("the dependency may still be provisioning; try again later")
    )]
    RetryExhausted {
        /// What was being attempted
        operation: String,
        /// Number of attempts made
        attempts: u32,
        /// Message of the final error
        last_error: String,
    },

    /// The operation exceeded its deadline.
    #[error("{operation} timed out after {seconds} seconds")]
    #[diagnostic(code(azurerm_core::timeout))]
    Timeout {
        /// What was being attempted
        operation: String,
        /// Deadline in seconds
        seconds: u64,
    },

    /// A resource ID could not be parsed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidId(#[from] ParseError),

    /// A configuration value failed validation.
    #[error("invalid value for {field:?}: {message}")]
    #[diagnostic(code(azurerm_core::validation))]
    Validation {
        /// Field name
        field: String,
        /// What is wrong with the value
        message: String,
    },

    /// Provider configuration is incomplete or malformed.
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(azurerm_core::configuration),
        help("set ARM_SUBSCRIPTION_ID and either ARM_ACCESS_TOKEN or ARM_USE_CLI=true")
    )]
    Configuration(String),

    /// Obtaining an access token failed.
    #[error("authentication failed: {message}")]
    #[diagnostic(code(azurerm_core::authentication))]
    Authentication {
        /// Error message
        message: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    #[diagnostic(code(azurerm_core::http))]
    Http(#[from] reqwest::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(azurerm_core::serialization))]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    #[diagnostic(code(azurerm_core::io))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a not-found error.
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Creates a precondition error.
    pub fn precondition(id: impl ToString, message: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            id: id.to_string(),
            message: message.into(),
        }
    }

    /// Creates a "requires import" error.
    pub fn already_exists(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Wraps an API error with the operation that produced it.
    pub fn api(operation: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            operation: operation.into(),
            source,
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns true if this error means the resource is gone.
    ///
    /// Read operations translate this into removing the resource from state.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Api { source, .. } => source.status == 404,
            _ => false,
        }
    }

    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { source, .. } => source.disposition() == Disposition::Retryable,
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_decodes_envelope() {
        let err = ApiError::from_response(
            400,
            r#"{"error":{"code":"ReferencedResourceNotProvisioned","message":"Cannot proceed"}}"#,
        );
        assert_eq!(err.code, "ReferencedResourceNotProvisioned");
        assert_eq!(err.message, "Cannot proceed");
    }

    #[test]
    fn test_api_error_falls_back_to_body() {
        let err = ApiError::from_response(502, "Bad Gateway");
        assert!(err.code.is_empty());
        assert_eq!(err.message, "Bad Gateway");
    }

    #[test]
    fn test_not_found_from_api_status() {
        let err = Error::api("retrieving", ApiError::from_response(404, "{}"));
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_already_exists_message() {
        let err = Error::already_exists("azurerm_databricks_access_connector", "/subscriptions/x");
        assert!(err.to_string().starts_with(
            "A resource with the ID \"/subscriptions/x\" already exists - to be managed via Terraform"
        ));
    }
}
