//! Name validators for Databricks resources.

use std::sync::LazyLock;

use azurerm_core::{Error, Result};
use regex::Regex;

static WORKSPACE_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{3,64}$").ok());

static ACCESS_CONNECTOR_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]{0,62}[a-zA-Z0-9_]$|^[a-zA-Z0-9]$").ok());

static PEERING_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]{0,78}[a-zA-Z0-9_]$|^[a-zA-Z0-9]$").ok());

fn check(pattern: &LazyLock<Option<Regex>>, field: &str, value: &str, rule: &str) -> Result<()> {
    if pattern.as_ref().is_some_and(|re| re.is_match(value)) {
        Ok(())
    } else {
        Err(Error::validation(field, format!("{value:?} is invalid: {rule}")))
    }
}

/// Workspace names are 3-64 alphanumerics, underscores or hyphens.
///
/// # Errors
///
/// Returns [`Error::Validation`] if `value` breaks the rule.
pub fn workspace_name(field: &str, value: &str) -> Result<()> {
    check(
        &WORKSPACE_NAME,
        field,
        value,
        "must be 3 to 64 characters long and contain only alphanumerics, underscores and hyphens",
    )
}

/// Access connector names are 1-64 characters, start with an alphanumeric
/// and end with an alphanumeric or underscore.
///
/// # Errors
///
/// Returns [`Error::Validation`] if `value` breaks the rule.
pub fn access_connector_name(field: &str, value: &str) -> Result<()> {
    check(
        &ACCESS_CONNECTOR_NAME,
        field,
        value,
        "must be 1 to 64 characters long, start with an alphanumeric, end with an alphanumeric or underscore and contain only alphanumerics, underscores, periods and hyphens",
    )
}

/// Peering names are 1-80 characters with the same shape as access
/// connector names.
///
/// # Errors
///
/// Returns [`Error::Validation`] if `value` breaks the rule.
pub fn peering_name(field: &str, value: &str) -> Result<()> {
    check(
        &PEERING_NAME,
        field,
        value,
        "must be 1 to 80 characters long, start with an alphanumeric, end with an alphanumeric or underscore and contain only alphanumerics, underscores, periods and hyphens",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_name() {
        assert!(workspace_name("name", "databricks-test_1").is_ok());
        assert!(workspace_name("name", "ab").is_err());
        assert!(workspace_name("name", &"a".repeat(65)).is_err());
        assert!(workspace_name("name", "has.dot").is_err());
    }

    #[test]
    fn test_access_connector_name() {
        assert!(access_connector_name("name", "a").is_ok());
        assert!(access_connector_name("name", "connector.v1_").is_ok());
        assert!(access_connector_name("name", "-leading").is_err());
        assert!(access_connector_name("name", "trailing.").is_err());
        assert!(access_connector_name("name", &"a".repeat(65)).is_err());
    }

    #[test]
    fn test_peering_name() {
        assert!(peering_name("name", "peer-to-hub").is_ok());
        assert!(peering_name("name", &"p".repeat(80)).is_ok());
        assert!(peering_name("name", &"p".repeat(81)).is_err());
        assert!(peering_name("name", "").is_err());
    }

    #[test]
    fn test_error_names_field() {
        let err = peering_name("name", "bad/name").unwrap_err();
        assert!(err.to_string().contains("\"name\""));
    }
}
