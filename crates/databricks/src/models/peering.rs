//! Workspace virtual network peering (`.../workspaces/{ws}/virtualNetworkPeerings`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A peering between the workspace's managed network and a remote network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualNetworkPeering {
    /// ARM ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Peering name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Peering properties
    #[serde(default)]
    pub properties: VirtualNetworkPeeringProperties,
    /// Members not modelled here
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// `properties` of a peering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkPeeringProperties {
    /// Whether VMs in the two networks can reach each other
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_virtual_network_access: Option<bool>,
    /// Whether forwarded traffic from the remote network is allowed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_forwarded_traffic: Option<bool>,
    /// Whether the remote network may use this network's gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_gateway_transit: Option<bool>,
    /// Whether this network uses the remote network's gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_remote_gateways: Option<bool>,
    /// The workspace's own network; computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub databricks_virtual_network: Option<SubResource>,
    /// The workspace network's address space; computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub databricks_address_space: Option<AddressSpace>,
    /// The remote network
    #[serde(default)]
    pub remote_virtual_network: SubResource,
    /// The remote network's address space
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_address_space: Option<AddressSpace>,
    /// `Initiated`, `Connected` or `Disconnected`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peering_state: Option<String>,
    /// Members not modelled here
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// A reference to another resource by ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResource {
    /// ARM ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SubResource {
    /// A reference to `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

/// A list of CIDR blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    /// CIDR blocks
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

impl AddressSpace {
    /// Prefixes of an optional address space; empty when absent.
    #[must_use]
    pub fn prefixes(space: Option<&Self>) -> Vec<String> {
        space.map(|s| s.address_prefixes.clone()).unwrap_or_default()
    }
}
