//! # azurerm-databricks
//!
//! Databricks resources built on `azurerm-core`:
//!
//! - [`CustomerManagedKeyResource`]: root DBFS encryption with a Key Vault
//!   key, stored inside the workspace and written through a locked
//!   fetch-merge-write.
//! - [`WorkspaceEncryptionResource`]: managed services and managed disk
//!   keys, written through the same workspace lock.
//! - [`VirtualNetworkPeeringResource`]: peering of the workspace network
//!   with a remote network, retried while the remote side provisions.
//! - [`AccessConnectorResource`]: plain CRUD for access connectors.
//!
//! ## Example
//!
//! ```ignore
//! use azurerm_core::{ArmClient, ProviderConfig, Resource, global_locks};
//! use azurerm_databricks::{CustomerManagedKeyConfig, CustomerManagedKeyResource, WorkspacesClient};
//!
//! let config = ProviderConfig::load(None)?;
//! let arm = ArmClient::from_config(&config)?;
//! let cmk = CustomerManagedKeyResource::new(
//!     WorkspacesClient::new(arm),
//!     global_locks(),
//!     config.timeouts.clone(),
//! );
//! let state = cmk
//!     .create(&CustomerManagedKeyConfig {
//!         workspace_id: "/subscriptions/.../workspaces/ws1".into(),
//!         key_vault_key_id: "https://vault1.vault.azure.net/keys/key1/v1".into(),
//!     })
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod access_connector;
pub mod client;
pub mod customer_managed_key;
pub mod models;
pub mod validate;
pub mod virtual_network_peering;
pub mod workspace_encryption;

pub use access_connector::{
    AccessConnectorConfig, AccessConnectorResource, AccessConnectorState, IdentityConfig,
};
pub use client::{AccessConnectorsClient, VirtualNetworkPeeringsClient, WorkspacesClient};
pub use customer_managed_key::{
    CustomerManagedKeyConfig, CustomerManagedKeyResource, CustomerManagedKeyState,
};
pub use virtual_network_peering::{
    VirtualNetworkPeeringConfig, VirtualNetworkPeeringResource, VirtualNetworkPeeringState,
};
pub use workspace_encryption::{
    WorkspaceEncryptionConfig, WorkspaceEncryptionResource, WorkspaceEncryptionState,
};

/// Lock namespace shared by everything that rewrites a workspace.
pub const WORKSPACE_RESOURCE_TYPE: &str = "azurerm_databricks_workspace";
