//! Subcommand implementations.
//!
//! Each command returns the JSON document to print; `main` owns stdout.

pub mod cmk;
pub mod id;
pub mod peering;

use std::path::Path;

use azurerm_core::{ArmClient, ProviderConfig, Result, global_locks};
use azurerm_databricks::{
    CustomerManagedKeyResource, VirtualNetworkPeeringResource, VirtualNetworkPeeringsClient,
    WorkspaceEncryptionResource, WorkspacesClient,
};

/// Provider configuration plus the client built from it.
#[derive(Debug, Clone)]
pub struct Context {
    config: ProviderConfig,
    arm: ArmClient,
}

impl Context {
    /// Loads configuration from `path` and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = ProviderConfig::load(path)?;
        let arm = ArmClient::from_config(&config)?;
        Ok(Self { config, arm })
    }

    pub fn workspaces(&self) -> WorkspacesClient {
        WorkspacesClient::new(self.arm.clone())
    }

    pub fn customer_managed_keys(&self) -> CustomerManagedKeyResource {
        CustomerManagedKeyResource::new(
            self.workspaces(),
            global_locks(),
            self.config.timeouts.clone(),
        )
    }

    pub fn workspace_encryption(&self) -> WorkspaceEncryptionResource {
        WorkspaceEncryptionResource::new(
            self.workspaces(),
            global_locks(),
            self.config.timeouts.clone(),
        )
    }

    pub fn peerings(&self) -> VirtualNetworkPeeringResource {
        VirtualNetworkPeeringResource::new(
            VirtualNetworkPeeringsClient::new(self.arm.clone()),
            global_locks(),
            self.config.retry.clone(),
            self.config.timeouts.clone(),
        )
    }
}
