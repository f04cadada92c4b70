//! `azurerm_databricks_access_connector`

use std::collections::BTreeMap;

use async_trait::async_trait;
use azurerm_core::{Error, Operation, Resource, Result, Timeouts};
use azurerm_resourceids::{AccessConnectorId, ResourceId};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::client::AccessConnectorsClient;
use crate::models::{AccessConnector, Identity, UserAssignedIdentity};
use crate::validate;

/// Terraform type name.
pub const RESOURCE_TYPE: &str = "azurerm_databricks_access_connector";

/// Managed identity arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IdentityConfig {
    /// A system-assigned identity
    SystemAssigned,
    /// One or more user-assigned identities
    UserAssigned {
        /// ARM IDs of the identities
        identity_ids: Vec<String>,
    },
}

impl IdentityConfig {
    fn expand(&self) -> Identity {
        match self {
            Self::SystemAssigned => Identity {
                identity_type: "SystemAssigned".to_string(),
                ..Identity::default()
            },
            Self::UserAssigned { identity_ids } => Identity {
                identity_type: "UserAssigned".to_string(),
                user_assigned_identities: identity_ids
                    .iter()
                    .map(|id| (id.clone(), UserAssignedIdentity::default()))
                    .collect(),
                ..Identity::default()
            },
        }
    }
}

/// Arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConnectorConfig {
    /// Connector name
    pub name: String,
    /// Resource group
    pub resource_group_name: String,
    /// Azure region
    pub location: String,
    /// Managed identity
    #[serde(default)]
    pub identity: Option<IdentityConfig>,
    /// Resource tags
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Arguments plus computed attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConnectorState {
    /// Resource ID
    pub id: String,
    /// Connector name
    pub name: String,
    /// Resource group
    pub resource_group_name: String,
    /// Normalised Azure region
    pub location: String,
    /// Managed identity
    pub identity: Option<IdentityConfig>,
    /// Principal of the system-assigned identity
    pub principal_id: Option<String>,
    /// Tenant of the system-assigned identity
    pub tenant_id: Option<String>,
    /// Resource tags
    pub tags: BTreeMap<String, String>,
}

/// Lowercases a region and drops spaces, e.g. `West Europe` to `westeurope`.
fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

fn flatten_identity(identity: Option<&Identity>) -> Option<IdentityConfig> {
    let identity = identity?;
    if identity.identity_type.eq_ignore_ascii_case("SystemAssigned") {
        Some(IdentityConfig::SystemAssigned)
    } else if identity.identity_type.eq_ignore_ascii_case("UserAssigned") {
        Some(IdentityConfig::UserAssigned {
            identity_ids: identity.user_assigned_identities.keys().cloned().collect(),
        })
    } else {
        None
    }
}

/// Maps an access connector onto state.
#[must_use]
pub fn project(id: &AccessConnectorId, connector: &AccessConnector) -> AccessConnectorState {
    let identity = connector.identity.as_ref();
    AccessConnectorState {
        id: id.id(),
        name: id.access_connector_name.clone(),
        resource_group_name: id.resource_group_name.clone(),
        location: normalize_location(&connector.location),
        identity: flatten_identity(identity),
        principal_id: identity.and_then(|i| i.principal_id.clone()),
        tenant_id: identity.and_then(|i| i.tenant_id.clone()),
        tags: connector.tags.clone(),
    }
}

/// Manages access connectors.
#[derive(Debug, Clone)]
pub struct AccessConnectorResource {
    connectors: AccessConnectorsClient,
    subscription_id: String,
    timeouts: Timeouts,
}

impl AccessConnectorResource {
    /// Creates the resource handler for connectors in `subscription_id`.
    pub fn new(
        connectors: AccessConnectorsClient,
        subscription_id: impl Into<String>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            connectors,
            subscription_id: subscription_id.into(),
            timeouts,
        }
    }

    async fn read_back(&self, id: &AccessConnectorId) -> Result<AccessConnectorState> {
        let connector = self
            .connectors
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found(id))?;
        Ok(project(id, &connector))
    }
}

#[async_trait]
impl Resource for AccessConnectorResource {
    const TYPE_NAME: &'static str = RESOURCE_TYPE;

    type Id = AccessConnectorId;
    type Config = AccessConnectorConfig;
    type State = AccessConnectorState;

    #[instrument(name = "access_connector_create", skip(self, config), fields(name = %config.name))]
    async fn create(&self, config: &AccessConnectorConfig) -> Result<AccessConnectorState> {
        self.timeouts
            .run(Operation::Create, async {
                validate::access_connector_name("name", &config.name)?;
                let id = AccessConnectorId::new(
                    self.subscription_id.clone(),
                    config.resource_group_name.clone(),
                    config.name.clone(),
                );

                if self.connectors.get(&id).await?.is_some() {
                    return Err(Error::already_exists(RESOURCE_TYPE, id.id()));
                }

                let connector = AccessConnector {
                    location: normalize_location(&config.location),
                    tags: config.tags.clone(),
                    identity: config.identity.as_ref().map(IdentityConfig::expand),
                    ..AccessConnector::default()
                };
                self.connectors.create_or_update(&id, &connector).await?;
                info!(id = %id, "Access connector created");

                self.read_back(&id).await
            })
            .await
    }

    #[instrument(name = "access_connector_read", skip(self), fields(id = %id))]
    async fn read(&self, id: &AccessConnectorId) -> Result<Option<AccessConnectorState>> {
        self.timeouts
            .run(Operation::Read, async {
                match self.connectors.get(id).await? {
                    Some(connector) => Ok(Some(project(id, &connector))),
                    None => {
                        info!("Access connector was not found, removing from state");
                        Ok(None)
                    }
                }
            })
            .await
    }

    #[instrument(name = "access_connector_update", skip(self, config), fields(id = %id))]
    async fn update(
        &self,
        id: &AccessConnectorId,
        config: &AccessConnectorConfig,
    ) -> Result<AccessConnectorState> {
        self.timeouts
            .run(Operation::Update, async {
                let mut connector = self
                    .connectors
                    .get(id)
                    .await?
                    .ok_or_else(|| Error::not_found(id))?;

                connector.tags.clone_from(&config.tags);
                connector.identity = config.identity.as_ref().map(IdentityConfig::expand);

                self.connectors.create_or_update(id, &connector).await?;
                self.read_back(id).await
            })
            .await
    }

    #[instrument(name = "access_connector_delete", skip(self), fields(id = %id))]
    async fn delete(&self, id: &AccessConnectorId) -> Result<()> {
        self.timeouts
            .run(Operation::Delete, self.connectors.delete(id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location("West Europe"), "westeurope");
        assert_eq!(normalize_location("eastus2"), "eastus2");
    }

    #[test]
    fn test_identity_round_trip() {
        let user = IdentityConfig::UserAssigned {
            identity_ids: vec!["/subscriptions/sub/resourceGroups/rg/providers/Microsoft.ManagedIdentity/userAssignedIdentities/id1".to_string()],
        };
        assert_eq!(flatten_identity(Some(&user.expand())), Some(user));
        assert_eq!(
            flatten_identity(Some(&IdentityConfig::SystemAssigned.expand())),
            Some(IdentityConfig::SystemAssigned)
        );
        assert_eq!(flatten_identity(None), None);
    }

    #[test]
    fn test_identity_config_wire_shape() {
        let parsed: IdentityConfig =
            serde_json::from_value(serde_json::json!({"type": "SystemAssigned"})).unwrap();
        assert_eq!(parsed, IdentityConfig::SystemAssigned);
    }
}
