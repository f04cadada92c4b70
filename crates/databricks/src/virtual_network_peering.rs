//! `azurerm_databricks_virtual_network_peering`
//!
//! Peers the workspace's managed virtual network with a remote network.
//! Creating a peering right after the remote network often fails with
//! `ReferencedResourceNotProvisioned`, so writes run under the transient
//! retry budget.

use async_trait::async_trait;
use azurerm_core::{
    Error, LockKey, LockRegistry, NamedLockGuard, Operation, Resource, Result, RetryConfig,
    Timeouts, retry_transient, validation,
};
use azurerm_resourceids::{ResourceId, VirtualNetworkId, VirtualNetworkPeeringId, WorkspaceId};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::WORKSPACE_RESOURCE_TYPE;
use crate::client::VirtualNetworkPeeringsClient;
use crate::models::{AddressSpace, SubResource, VirtualNetworkPeering, VirtualNetworkPeeringProperties};
use crate::validate;

/// Terraform type name.
pub const RESOURCE_TYPE: &str = "azurerm_databricks_virtual_network_peering";

const fn default_true() -> bool {
    true
}

/// Arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualNetworkPeeringConfig {
    /// Peering name
    pub name: String,
    /// ARM ID of the workspace
    pub workspace_id: String,
    /// ARM ID of the remote virtual network
    pub remote_virtual_network_id: String,
    /// Address space of the remote network
    pub remote_address_space_prefixes: Vec<String>,
    /// Defaults to `true`
    #[serde(default = "default_true")]
    pub allow_virtual_network_access: bool,
    /// Defaults to `false`
    #[serde(default)]
    pub allow_forwarded_traffic: bool,
    /// Defaults to `false`
    #[serde(default)]
    pub allow_gateway_transit: bool,
    /// Defaults to `false`
    #[serde(default)]
    pub use_remote_gateways: bool,
}

impl VirtualNetworkPeeringConfig {
    /// Arguments with the default access flags.
    pub fn new(
        name: impl Into<String>,
        workspace_id: impl Into<String>,
        remote_virtual_network_id: impl Into<String>,
        remote_address_space_prefixes: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            workspace_id: workspace_id.into(),
            remote_virtual_network_id: remote_virtual_network_id.into(),
            remote_address_space_prefixes,
            allow_virtual_network_access: true,
            allow_forwarded_traffic: false,
            allow_gateway_transit: false,
            use_remote_gateways: false,
        }
    }
}

/// Arguments plus computed attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualNetworkPeeringState {
    /// Resource ID
    pub id: String,
    /// Peering name
    pub name: String,
    /// ARM ID of the workspace
    pub workspace_id: String,
    /// ARM ID of the remote virtual network
    pub remote_virtual_network_id: String,
    /// Address space of the remote network
    pub remote_address_space_prefixes: Vec<String>,
    /// Whether VMs in the two networks can reach each other
    pub allow_virtual_network_access: bool,
    /// Whether forwarded traffic is allowed
    pub allow_forwarded_traffic: bool,
    /// Whether gateway transit is allowed
    pub allow_gateway_transit: bool,
    /// Whether the remote gateway is used
    pub use_remote_gateways: bool,
    /// ARM ID of the workspace's managed network
    pub virtual_network_id: String,
    /// Address space of the workspace's managed network
    pub address_space_prefixes: Vec<String>,
}

struct Validated {
    id: VirtualNetworkPeeringId,
    remote: VirtualNetworkId,
}

fn validate_config(config: &VirtualNetworkPeeringConfig) -> Result<Validated> {
    validate::peering_name("name", &config.name)?;
    let workspace_id = WorkspaceId::parse(&config.workspace_id)?;
    let remote = VirtualNetworkId::parse_insensitively(&config.remote_virtual_network_id)?;

    if config.remote_address_space_prefixes.is_empty() {
        return Err(Error::validation(
            "remote_address_space_prefixes",
            "at least one prefix is required",
        ));
    }
    for prefix in &config.remote_address_space_prefixes {
        validation::cidr("remote_address_space_prefixes", prefix)?;
    }

    Ok(Validated {
        id: VirtualNetworkPeeringId::for_workspace(&workspace_id, &config.name),
        remote,
    })
}

fn apply_config(properties: &mut VirtualNetworkPeeringProperties, config: &VirtualNetworkPeeringConfig) {
    properties.allow_virtual_network_access = Some(config.allow_virtual_network_access);
    properties.allow_forwarded_traffic = Some(config.allow_forwarded_traffic);
    properties.allow_gateway_transit = Some(config.allow_gateway_transit);
    properties.use_remote_gateways = Some(config.use_remote_gateways);
    properties.remote_address_space = Some(AddressSpace {
        address_prefixes: config.remote_address_space_prefixes.clone(),
    });
}

/// The remote network is immutable on an existing peering.
fn ensure_same_remote(peering: &VirtualNetworkPeering, remote: &VirtualNetworkId) -> Result<()> {
    match peering.properties.remote_virtual_network.id.as_deref() {
        Some(current) if !current.eq_ignore_ascii_case(&remote.id()) => Err(Error::validation(
            "remote_virtual_network_id",
            format!("cannot change from {current}; recreate the peering"),
        )),
        _ => Ok(()),
    }
}

/// Maps a peering onto state.
#[must_use]
pub fn project(id: &VirtualNetworkPeeringId, peering: &VirtualNetworkPeering) -> VirtualNetworkPeeringState {
    let props = &peering.properties;
    VirtualNetworkPeeringState {
        id: id.id(),
        name: id.virtual_network_peering_name.clone(),
        workspace_id: id.workspace_id().id(),
        remote_virtual_network_id: props.remote_virtual_network.id.clone().unwrap_or_default(),
        remote_address_space_prefixes: AddressSpace::prefixes(props.remote_address_space.as_ref()),
        allow_virtual_network_access: props.allow_virtual_network_access.unwrap_or(false),
        allow_forwarded_traffic: props.allow_forwarded_traffic.unwrap_or(false),
        allow_gateway_transit: props.allow_gateway_transit.unwrap_or(false),
        use_remote_gateways: props.use_remote_gateways.unwrap_or(false),
        virtual_network_id: props
            .databricks_virtual_network
            .as_ref()
            .and_then(|v| v.id.clone())
            .unwrap_or_default(),
        address_space_prefixes: AddressSpace::prefixes(props.databricks_address_space.as_ref()),
    }
}

/// Manages workspace virtual network peerings.
#[derive(Debug, Clone)]
pub struct VirtualNetworkPeeringResource {
    peerings: VirtualNetworkPeeringsClient,
    locks: LockRegistry,
    retry: RetryConfig,
    timeouts: Timeouts,
}

impl VirtualNetworkPeeringResource {
    /// Creates the resource handler.
    #[must_use]
    pub const fn new(
        peerings: VirtualNetworkPeeringsClient,
        locks: LockRegistry,
        retry: RetryConfig,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            peerings,
            locks,
            retry,
            timeouts,
        }
    }

    async fn lock(&self, id: &VirtualNetworkPeeringId, remote: Option<&VirtualNetworkId>) -> Vec<NamedLockGuard> {
        let mut keys = vec![LockKey::by_name(&id.workspace_name, WORKSPACE_RESOURCE_TYPE)];
        if let Some(remote) = remote {
            keys.push(LockKey::by_id(remote));
        }
        self.locks.acquire_all(keys).await
    }

    async fn put(&self, id: &VirtualNetworkPeeringId, peering: &VirtualNetworkPeering, verb: &str) -> Result<()> {
        retry_transient(&self.retry, &format!("{verb} {id}"), || {
            self.peerings.create_or_update(id, peering)
        })
        .await
    }

    async fn read_back(&self, id: &VirtualNetworkPeeringId) -> Result<VirtualNetworkPeeringState> {
        let peering = self.peerings.get(id).await?.ok_or_else(|| Error::not_found(id))?;
        Ok(project(id, &peering))
    }
}

#[async_trait]
impl Resource for VirtualNetworkPeeringResource {
    const TYPE_NAME: &'static str = RESOURCE_TYPE;

    type Id = VirtualNetworkPeeringId;
    type Config = VirtualNetworkPeeringConfig;
    type State = VirtualNetworkPeeringState;

    #[instrument(name = "peering_create", skip(self, config), fields(name = %config.name))]
    async fn create(&self, config: &VirtualNetworkPeeringConfig) -> Result<VirtualNetworkPeeringState> {
        self.timeouts
            .run(Operation::Create, async {
                let Validated { id, remote } = validate_config(config)?;
                let _guards = self.lock(&id, Some(&remote)).await;

                if self.peerings.get(&id).await?.is_some() {
                    return Err(Error::already_exists(RESOURCE_TYPE, id.id()));
                }

                let mut peering = VirtualNetworkPeering {
                    properties: VirtualNetworkPeeringProperties {
                        remote_virtual_network: SubResource::new(remote.id()),
                        ..VirtualNetworkPeeringProperties::default()
                    },
                    ..VirtualNetworkPeering::default()
                };
                apply_config(&mut peering.properties, config);

                self.put(&id, &peering, "creating").await?;
                info!(id = %id, "Peering created");
                self.read_back(&id).await
            })
            .await
    }

    #[instrument(name = "peering_read", skip(self), fields(id = %id))]
    async fn read(&self, id: &VirtualNetworkPeeringId) -> Result<Option<VirtualNetworkPeeringState>> {
        self.timeouts
            .run(Operation::Read, async {
                match self.peerings.get(id).await? {
                    Some(peering) => Ok(Some(project(id, &peering))),
                    None => {
                        info!("Peering was not found, removing from state");
                        Ok(None)
                    }
                }
            })
            .await
    }

    #[instrument(name = "peering_update", skip(self, config), fields(id = %id))]
    async fn update(
        &self,
        id: &VirtualNetworkPeeringId,
        config: &VirtualNetworkPeeringConfig,
    ) -> Result<VirtualNetworkPeeringState> {
        self.timeouts
            .run(Operation::Update, async {
                let Validated { remote, .. } = validate_config(config)?;
                let _guards = self.lock(id, Some(&remote)).await;

                let mut peering = self.peerings.get(id).await?.ok_or_else(|| Error::not_found(id))?;
                ensure_same_remote(&peering, &remote)?;
                apply_config(&mut peering.properties, config);

                self.put(id, &peering, "updating").await?;
                self.read_back(id).await
            })
            .await
    }

    #[instrument(name = "peering_delete", skip(self), fields(id = %id))]
    async fn delete(&self, id: &VirtualNetworkPeeringId) -> Result<()> {
        self.timeouts
            .run(Operation::Delete, async {
                let _guards = self.lock(id, None).await;
                self.peerings.delete(id).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKSPACE: &str =
        "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Databricks/workspaces/ws1";
    const REMOTE: &str =
        "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/hub";

    #[test]
    fn test_config_defaults() {
        let config: VirtualNetworkPeeringConfig = serde_json::from_value(serde_json::json!({
            "name": "peer",
            "workspace_id": WORKSPACE,
            "remote_virtual_network_id": REMOTE,
            "remote_address_space_prefixes": ["10.0.0.0/16"]
        }))
        .unwrap();

        assert_eq!(
            config,
            VirtualNetworkPeeringConfig::new("peer", WORKSPACE, REMOTE, vec!["10.0.0.0/16".to_string()])
        );
        assert!(config.allow_virtual_network_access);
        assert!(!config.use_remote_gateways);
    }

    #[test]
    fn test_validation_rejects_bad_prefix() {
        let config = VirtualNetworkPeeringConfig::new("peer", WORKSPACE, REMOTE, vec!["10.0.0.0".to_string()]);
        assert!(matches!(validate_config(&config), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_validation_requires_prefixes() {
        let config = VirtualNetworkPeeringConfig::new("peer", WORKSPACE, REMOTE, vec![]);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_remote_network_casing_is_normalised() {
        let config = VirtualNetworkPeeringConfig::new(
            "peer",
            WORKSPACE,
            REMOTE.replace("virtualNetworks", "virtualnetworks"),
            vec!["10.0.0.0/16".to_string()],
        );
        let validated = validate_config(&config).unwrap();
        assert_eq!(validated.remote.id(), REMOTE);
        assert_eq!(validated.id.virtual_network_peering_name, "peer");
    }

    #[test]
    fn test_remote_network_is_immutable() {
        let peering = VirtualNetworkPeering {
            properties: VirtualNetworkPeeringProperties {
                remote_virtual_network: SubResource::new(REMOTE),
                ..VirtualNetworkPeeringProperties::default()
            },
            ..VirtualNetworkPeering::default()
        };

        let same = VirtualNetworkId::parse_insensitively(&REMOTE.to_lowercase()).unwrap();
        assert!(ensure_same_remote(&peering, &same).is_ok());

        let other = VirtualNetworkId::new("sub", "rg", "spoke");
        let err = ensure_same_remote(&peering, &other).unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "remote_virtual_network_id"));

        assert!(ensure_same_remote(&VirtualNetworkPeering::default(), &other).is_ok());
    }

    #[test]
    fn test_project_computed_fields() {
        let peering: VirtualNetworkPeering = serde_json::from_value(serde_json::json!({
            "name": "peer",
            "properties": {
                "allowVirtualNetworkAccess": true,
                "remoteVirtualNetwork": {"id": REMOTE},
                "remoteAddressSpace": {"addressPrefixes": ["10.0.0.0/16"]},
                "databricksVirtualNetwork": {"id": "/subscriptions/sub/resourceGroups/managed/providers/Microsoft.Network/virtualNetworks/workers-vnet"},
                "databricksAddressSpace": {"addressPrefixes": ["10.139.0.0/16"]},
                "peeringState": "Initiated"
            }
        }))
        .unwrap();

        let id = VirtualNetworkPeeringId::new("sub", "rg", "ws1", "peer");
        let state = project(&id, &peering);
        assert_eq!(state.workspace_id, WORKSPACE);
        assert_eq!(state.address_space_prefixes, ["10.139.0.0/16"]);
        assert!(state.virtual_network_id.ends_with("/workers-vnet"));
        assert!(!state.allow_forwarded_traffic);
    }
}
