//! Key Vault IDs, both control plane (ARM) and data plane (nested items).

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::parser::ParseError;

resource_group_scoped_id! {
    /// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.KeyVault/vaults/{vaultName}`
    KeyVaultId {
        kind: "Key Vault",
        provider: "Microsoft.KeyVault",
        resource_type: "vaults",
        field: vault_name,
        segment: "vaultName",
        label: "Vault Name",
        example: "vaultValue",
    }
}

/// The collection a nested item lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NestedItemType {
    /// `keys`
    Keys,
    /// `secrets`
    Secrets,
    /// `certificates`
    Certificates,
}

impl NestedItemType {
    /// Returns the path element for this collection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keys => "keys",
            Self::Secrets => "secrets",
            Self::Certificates => "certificates",
        }
    }

    fn from_path(value: &str) -> Option<Self> {
        match value {
            "keys" => Some(Self::Keys),
            "secrets" => Some(Self::Secrets),
            "certificates" => Some(Self::Certificates),
            _ => None,
        }
    }
}

impl fmt::Display for NestedItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Key Vault data-plane item, e.g.
/// `https://example.vault.azure.net/keys/example/fdf067c93bbb4b22bff4d8b7a9a56217`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NestedItemId {
    /// Vault base URL including the trailing slash, e.g. `https://example.vault.azure.net/`.
    pub key_vault_base_url: String,
    /// The collection the item belongs to.
    pub nested_item_type: NestedItemType,
    /// The item name.
    pub name: String,
    /// The item version; empty for versionless IDs.
    pub version: String,
}

impl NestedItemId {
    /// Builds a nested item ID from its parts.
    ///
    /// # Errors
    ///
    /// Returns an error if `key_vault_base_url` is not an absolute URL.
    pub fn new(
        key_vault_base_url: &str,
        nested_item_type: NestedItemType,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, ParseError> {
        let base = Url::parse(key_vault_base_url).map_err(|e| ParseError::InvalidNestedItem {
            input: key_vault_base_url.to_string(),
            reason: format!("invalid vault base URL: {e}"),
        })?;

        Ok(Self {
            key_vault_base_url: base_url(key_vault_base_url, &base)?,
            nested_item_type,
            name: name.into(),
            version: version.into(),
        })
    }

    /// Parses a versioned nested item ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a URL of the form
    /// `https://{vault}/{type}/{name}/{version}`.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse_nested_item(input, true)
    }

    /// Parses a nested item ID whose version may be omitted.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a URL of the form
    /// `https://{vault}/{type}/{name}[/{version}]`.
    pub fn parse_versionless(input: &str) -> Result<Self, ParseError> {
        parse_nested_item(input, false)
    }

    /// Returns true if no version is pinned.
    #[must_use]
    pub fn is_versionless(&self) -> bool {
        self.version.is_empty()
    }

    /// Formats the data-plane ID.
    #[must_use]
    pub fn id(&self) -> String {
        let mut id = format!(
            "{}/{}/{}",
            self.key_vault_base_url.trim_end_matches('/'),
            self.nested_item_type,
            self.name
        );
        if !self.version.is_empty() {
            id.push('/');
            id.push_str(&self.version);
        }
        id
    }
}

impl fmt::Display for NestedItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

fn base_url(input: &str, url: &Url) -> Result<String, ParseError> {
    let host = url.host_str().ok_or_else(|| ParseError::InvalidNestedItem {
        input: input.to_string(),
        reason: "missing host".to_string(),
    })?;
    match url.port() {
        Some(port) => Ok(format!("{}://{host}:{port}/", url.scheme())),
        None => Ok(format!("{}://{host}/", url.scheme())),
    }
}

fn parse_nested_item(input: &str, require_version: bool) -> Result<NestedItemId, ParseError> {
    let invalid = |reason: &str| ParseError::InvalidNestedItem {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(input).map_err(|e| invalid(&format!("not a URL: {e}")))?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(invalid("expected an http(s) URL"));
    }

    let components: Vec<&str> = url
        .path()
        .trim_start_matches('/')
        .split('/')
        .filter(|c| !c.is_empty())
        .collect();

    let (kind, name, version) = match components.as_slice() {
        [kind, name, version] => (*kind, *name, *version),
        [kind, name] if !require_version => (*kind, *name, ""),
        [_, _] => return Err(invalid("expected a version segment")),
        _ => {
            return Err(invalid(
                "expected a path of the form /{type}/{name}/{version}",
            ));
        }
    };

    let nested_item_type =
        NestedItemType::from_path(kind).ok_or_else(|| invalid("unknown nested item type"))?;

    Ok(NestedItemId {
        key_vault_base_url: base_url(input, &url)?,
        nested_item_type,
        name: name.to_string(),
        version: version.to_string(),
    })
}
