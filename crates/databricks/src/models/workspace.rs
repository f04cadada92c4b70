//! Databricks workspace document (`Microsoft.Databricks/workspaces`).
//!
//! Only the members the resources in this crate read or write are typed.
//! Everything else is kept verbatim in `additional` maps so that a
//! fetch-merge-write cycle sends back exactly what it received.

use std::collections::BTreeMap;
use std::fmt;

use azurerm_core::Merge;
use azurerm_resourceids::{NestedItemId, NestedItemType};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A Databricks workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// ARM ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Workspace name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// ARM type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Azure region
    #[serde(default)]
    pub location: String,
    /// Resource tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    /// Workspace properties
    #[serde(default)]
    pub properties: WorkspaceProperties,
    /// Members not modelled here
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// `properties` of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceProperties {
    /// Custom parameters, including root DBFS encryption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<WorkspaceCustomParameters>,
    /// Managed services and managed disk encryption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<WorkspacePropertiesEncryption>,
    /// Members not modelled here
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// `properties.parameters` of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceCustomParameters {
    /// Whether the workspace was prepared for customer-managed keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepare_encryption: Option<CustomBooleanParameter>,
    /// Root DBFS encryption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionParameter>,
    /// Members not modelled here
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// A boolean custom parameter, e.g. `{"type": "Bool", "value": true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomBooleanParameter {
    /// Parameter type as reported by the service
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<String>,
    /// The value
    pub value: bool,
}

/// The root DBFS encryption custom parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncryptionParameter {
    /// Parameter type as reported by the service
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<String>,
    /// The value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Encryption>,
}

/// Where an encryption key comes from.
///
/// The service is inconsistent about casing, so values are compared
/// case-insensitively when decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Microsoft-managed keys; the "not configured" sentinel
    Default,
    /// A key in Azure Key Vault
    MicrosoftKeyvault,
    /// A value this crate does not know
    Other(String),
}

impl KeySource {
    /// The wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => "Default",
            Self::MicrosoftKeyvault => "Microsoft.Keyvault",
            Self::Other(value) => value,
        }
    }

    /// Decodes a wire value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("Default") {
            Self::Default
        } else if value.eq_ignore_ascii_case("Microsoft.Keyvault") {
            Self::MicrosoftKeyvault
        } else {
            Self::Other(value.to_string())
        }
    }
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for KeySource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for KeySource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::parse(&value))
    }
}

/// Root DBFS encryption settings.
///
/// The wire names are irregular (`KeySource`, `KeyName`, `keyversion`,
/// `keyvaulturi`) and must be kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Encryption {
    /// Key source
    #[serde(rename = "KeySource", default, skip_serializing_if = "Option::is_none")]
    pub key_source: Option<KeySource>,
    /// Key name
    #[serde(rename = "KeyName", default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// Key version
    #[serde(rename = "keyversion", default, skip_serializing_if = "Option::is_none")]
    pub key_version: Option<String>,
    /// Vault base URI
    #[serde(rename = "keyvaulturi", default, skip_serializing_if = "Option::is_none")]
    pub key_vault_uri: Option<String>,
    /// Members not modelled here
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// Whether a customer-managed key is in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmkStatus {
    /// Microsoft-managed keys, or no encryption settings at all
    Unconfigured,
    /// A customer-managed key is set; parts may be missing
    Configured {
        /// Key name
        key_name: Option<String>,
        /// Key version
        key_version: Option<String>,
        /// Vault base URI
        key_vault_uri: Option<String>,
    },
}

impl CmkStatus {
    /// Rebuilds the Key Vault key ID.
    ///
    /// Returns `None` when unconfigured, or when the vault URI or key name
    /// is missing.
    #[must_use]
    pub fn key_id(&self) -> Option<NestedItemId> {
        match self {
            Self::Unconfigured => None,
            Self::Configured {
                key_name,
                key_version,
                key_vault_uri,
            } => {
                let uri = key_vault_uri.as_deref().filter(|u| !u.is_empty())?;
                let name = key_name.as_deref().filter(|n| !n.is_empty())?;
                NestedItemId::new(
                    uri,
                    NestedItemType::Keys,
                    name,
                    key_version.clone().unwrap_or_default(),
                )
                .ok()
            }
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

impl Encryption {
    /// Root DBFS encryption using `key`.
    #[must_use]
    pub fn key_vault(key: &NestedItemId) -> Self {
        Self {
            key_source: Some(KeySource::MicrosoftKeyvault),
            key_name: Some(key.name.clone()),
            key_version: Some(key.version.clone()),
            key_vault_uri: Some(key.key_vault_base_url.clone()),
            additional: Map::new(),
        }
    }

    /// Root DBFS encryption reset to Microsoft-managed keys.
    #[must_use]
    pub fn microsoft_managed() -> Self {
        Self {
            key_source: Some(KeySource::Default),
            ..Self::default()
        }
    }

    /// Projects these settings onto a [`CmkStatus`].
    #[must_use]
    pub fn status(&self) -> CmkStatus {
        match &self.key_source {
            None | Some(KeySource::Default) => CmkStatus::Unconfigured,
            Some(_) => CmkStatus::Configured {
                key_name: non_empty(self.key_name.as_ref()),
                key_version: non_empty(self.key_version.as_ref()),
                key_vault_uri: non_empty(self.key_vault_uri.as_ref()),
            },
        }
    }
}

/// `properties.encryption` of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspacePropertiesEncryption {
    /// Per-entity settings
    #[serde(default)]
    pub entities: EncryptionEntities,
    /// Members not modelled here
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// `properties.encryption.entities` of a workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionEntities {
    /// Notebooks and other control plane data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_services: Option<EntityEncryption>,
    /// Cluster managed disks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_disk: Option<EntityEncryption>,
    /// Members not modelled here
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// Encryption of one workspace entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityEncryption {
    /// Key source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_source: Option<KeySource>,
    /// Key location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_vault_properties: Option<KeyVaultProperties>,
    /// Managed disk only: follow the latest key version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_to_latest_key_version_enabled: Option<bool>,
    /// Members not modelled here
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl EntityEncryption {
    /// Entity encryption using `key`.
    #[must_use]
    pub fn key_vault(key: &NestedItemId) -> Self {
        Self {
            key_source: Some(KeySource::MicrosoftKeyvault),
            key_vault_properties: Some(KeyVaultProperties {
                key_vault_uri: key.key_vault_base_url.clone(),
                key_name: key.name.clone(),
                key_version: key.version.clone(),
                additional: Map::new(),
            }),
            ..Self::default()
        }
    }

    /// The Key Vault key ID, if one is fully specified.
    #[must_use]
    pub fn key_id(&self) -> Option<NestedItemId> {
        let props = self.key_vault_properties.as_ref()?;
        if props.key_vault_uri.is_empty() || props.key_name.is_empty() {
            return None;
        }
        NestedItemId::new(
            &props.key_vault_uri,
            NestedItemType::Keys,
            props.key_name.clone(),
            props.key_version.clone(),
        )
        .ok()
    }
}

/// Key location for entity encryption.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultProperties {
    /// Vault base URI
    #[serde(default)]
    pub key_vault_uri: String,
    /// Key name
    #[serde(default)]
    pub key_name: String,
    /// Key version
    #[serde(default)]
    pub key_version: String,
    /// Members not modelled here
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl Workspace {
    /// The pricing tier name, e.g. `premium`.
    #[must_use]
    pub fn sku_name(&self) -> Option<&str> {
        self.additional
            .get("sku")
            .and_then(|sku| sku.get("name"))
            .and_then(Value::as_str)
    }

    /// Whether `customer_managed_key_enabled` was set when the workspace
    /// was created.
    #[must_use]
    pub fn prepare_encryption(&self) -> bool {
        self.properties
            .parameters
            .as_ref()
            .and_then(|p| p.prepare_encryption.as_ref())
            .is_some_and(|p| p.value)
    }

    /// Root DBFS encryption settings, if present.
    #[must_use]
    pub fn root_dbfs_encryption(&self) -> Option<&Encryption> {
        self.properties
            .parameters
            .as_ref()
            .and_then(|p| p.encryption.as_ref())
            .and_then(|e| e.value.as_ref())
    }

    /// Root DBFS customer-managed key status.
    #[must_use]
    pub fn root_dbfs_status(&self) -> CmkStatus {
        self.root_dbfs_encryption()
            .map_or(CmkStatus::Unconfigured, Encryption::status)
    }

    /// Managed services encryption settings, if present.
    #[must_use]
    pub fn managed_services_encryption(&self) -> Option<&EntityEncryption> {
        self.properties
            .encryption
            .as_ref()
            .and_then(|e| e.entities.managed_services.as_ref())
    }

    /// Managed disk encryption settings, if present.
    #[must_use]
    pub fn managed_disk_encryption(&self) -> Option<&EntityEncryption> {
        self.properties
            .encryption
            .as_ref()
            .and_then(|e| e.entities.managed_disk.as_ref())
    }
}

/// The workspace sub-fields child resources may change.
///
/// `None` members are left untouched by [`Merge::merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspacePatch {
    /// `properties.parameters.encryption.value`
    pub root_dbfs_encryption: Option<Encryption>,
    /// `properties.encryption.entities.managedServices`
    pub managed_services_encryption: Option<EntityEncryption>,
    /// `properties.encryption.entities.managedDisk`
    pub managed_disk_encryption: Option<EntityEncryption>,
}

impl WorkspacePatch {
    /// A patch changing only root DBFS encryption.
    #[must_use]
    pub fn root_dbfs(encryption: Encryption) -> Self {
        Self {
            root_dbfs_encryption: Some(encryption),
            ..Self::default()
        }
    }

    /// A patch changing managed services and/or managed disk encryption.
    #[must_use]
    pub const fn entities(
        managed_services: Option<EntityEncryption>,
        managed_disk: Option<EntityEncryption>,
    ) -> Self {
        Self {
            root_dbfs_encryption: None,
            managed_services_encryption: managed_services,
            managed_disk_encryption: managed_disk,
        }
    }
}

fn merge_entity(target: &mut Option<EntityEncryption>, patch: &EntityEncryption) {
    let entity = target.get_or_insert_with(EntityEncryption::default);
    entity.key_source.clone_from(&patch.key_source);
    entity.key_vault_properties.clone_from(&patch.key_vault_properties);
    if patch.rotation_to_latest_key_version_enabled.is_some() {
        entity.rotation_to_latest_key_version_enabled = patch.rotation_to_latest_key_version_enabled;
    }
}

impl Merge for Workspace {
    type Patch = WorkspacePatch;

    fn merge(&mut self, patch: &WorkspacePatch) {
        if let Some(encryption) = &patch.root_dbfs_encryption {
            let parameter = self
                .properties
                .parameters
                .get_or_insert_with(WorkspaceCustomParameters::default)
                .encryption
                .get_or_insert_with(EncryptionParameter::default);
            let value = parameter.value.get_or_insert_with(Encryption::default);
            value.key_source.clone_from(&encryption.key_source);
            value.key_name.clone_from(&encryption.key_name);
            value.key_version.clone_from(&encryption.key_version);
            value.key_vault_uri.clone_from(&encryption.key_vault_uri);
        }

        if patch.managed_services_encryption.is_none() && patch.managed_disk_encryption.is_none() {
            return;
        }

        let entities = &mut self
            .properties
            .encryption
            .get_or_insert_with(WorkspacePropertiesEncryption::default)
            .entities;
        if let Some(services) = &patch.managed_services_encryption {
            merge_entity(&mut entities.managed_services, services);
        }
        if let Some(disk) = &patch.managed_disk_encryption {
            merge_entity(&mut entities.managed_disk, disk);
        }
    }
}
