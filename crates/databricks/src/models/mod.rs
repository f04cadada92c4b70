//! Wire models for the Databricks Resource Manager API.

mod access_connector;
mod peering;
mod workspace;

pub use access_connector::{AccessConnector, Identity, UserAssignedIdentity};
pub use peering::{AddressSpace, SubResource, VirtualNetworkPeering, VirtualNetworkPeeringProperties};
pub use workspace::{
    CmkStatus, CustomBooleanParameter, Encryption, EncryptionEntities, EncryptionParameter,
    EntityEncryption, KeySource, KeyVaultProperties, Workspace, WorkspaceCustomParameters,
    WorkspacePatch, WorkspaceProperties, WorkspacePropertiesEncryption,
};
