//! Argument validators shared across resources.

use std::net::IpAddr;

use azurerm_resourceids::{NestedItemId, NestedItemType};

use crate::error::{Error, Result};

/// Checks that `value` is an IPv4 or IPv6 CIDR block such as `10.0.0.0/16`.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming `field` otherwise.
pub fn cidr(field: &str, value: &str) -> Result<()> {
    let invalid = || Error::validation(field, format!("{value:?} is not a valid CIDR block"));

    let (address, prefix) = value.split_once('/').ok_or_else(invalid)?;
    let address: IpAddr = address.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;

    let max = if address.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(invalid());
    }
    Ok(())
}

/// Checks that `value` is a Key Vault key ID, with or without a version.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming `field` if `value` is not a URL
/// of the form `https://{vault}/keys/{name}[/{version}]`.
pub fn key_vault_key_id(field: &str, value: &str) -> Result<NestedItemId> {
    let id = NestedItemId::parse_versionless(value)
        .map_err(|e| Error::validation(field, e.to_string()))?;

    if id.nested_item_type != NestedItemType::Keys {
        return Err(Error::validation(
            field,
            format!("expected a key ID but got a {} ID", id.nested_item_type),
        ));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cidr() {
        assert!(cidr("f", "10.0.0.0/16").is_ok());
        assert!(cidr("f", "fd00::/8").is_ok());
        assert!(cidr("f", "10.0.0.0").is_err());
        assert!(cidr("f", "10.0.0.0/33").is_err());
        assert!(cidr("f", "banana/8").is_err());
    }

    #[test]
    fn test_key_vault_key_id() {
        let id = key_vault_key_id("key_vault_key_id", "https://v1.vault.azure.net/keys/k1/abc").unwrap();
        assert_eq!(id.name, "k1");
        assert!(key_vault_key_id("key_vault_key_id", "https://v1.vault.azure.net/keys/k1").is_ok());
    }

    #[test]
    fn test_secret_id_rejected_as_key() {
        let err = key_vault_key_id("key_vault_key_id", "https://v1.vault.azure.net/secrets/s1/abc")
            .unwrap_err();
        assert!(err.to_string().contains("expected a key ID"));
    }
}
