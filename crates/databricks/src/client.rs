//! Typed clients for the Databricks ARM endpoints.

use async_trait::async_trait;
use azurerm_core::{ArmClient, ParentStore, Result};
use azurerm_resourceids::{AccessConnectorId, ResourceId, VirtualNetworkPeeringId, WorkspaceId};

use crate::models::{AccessConnector, VirtualNetworkPeering, Workspace};

/// API version for workspaces and their peerings.
pub const WORKSPACES_API_VERSION: &str = "2023-02-01";

/// API version for access connectors.
pub const ACCESS_CONNECTORS_API_VERSION: &str = "2023-05-01";

/// Workspaces client.
#[derive(Debug, Clone)]
pub struct WorkspacesClient {
    arm: ArmClient,
}

impl WorkspacesClient {
    /// Wraps an [`ArmClient`].
    #[must_use]
    pub const fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    /// Fetches a workspace; `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get(&self, id: &WorkspaceId) -> Result<Option<Workspace>> {
        self.arm.get(&id.id(), WORKSPACES_API_VERSION).await
    }

    /// Replaces a workspace and waits for the update to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the long-running operation fails.
    pub async fn create_or_update(&self, id: &WorkspaceId, workspace: &Workspace) -> Result<()> {
        self.arm.put(&id.id(), WORKSPACES_API_VERSION, workspace).await
    }
}

#[async_trait]
impl ParentStore for WorkspacesClient {
    type Id = WorkspaceId;
    type Model = Workspace;

    async fn fetch(&self, id: &WorkspaceId) -> Result<Option<Workspace>> {
        self.get(id).await
    }

    async fn write(&self, id: &WorkspaceId, model: &Workspace) -> Result<()> {
        self.create_or_update(id, model).await
    }
}

/// Workspace virtual network peerings client.
#[derive(Debug, Clone)]
pub struct VirtualNetworkPeeringsClient {
    arm: ArmClient,
}

impl VirtualNetworkPeeringsClient {
    /// Wraps an [`ArmClient`].
    #[must_use]
    pub const fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    /// Fetches a peering; `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get(&self, id: &VirtualNetworkPeeringId) -> Result<Option<VirtualNetworkPeering>> {
        self.arm.get(&id.id(), WORKSPACES_API_VERSION).await
    }

    /// Creates or replaces a peering.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the long-running operation fails.
    pub async fn create_or_update(
        &self,
        id: &VirtualNetworkPeeringId,
        peering: &VirtualNetworkPeering,
    ) -> Result<()> {
        self.arm.put(&id.id(), WORKSPACES_API_VERSION, peering).await
    }

    /// Deletes a peering.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the long-running operation fails.
    pub async fn delete(&self, id: &VirtualNetworkPeeringId) -> Result<()> {
        self.arm.delete(&id.id(), WORKSPACES_API_VERSION).await
    }
}

/// Access connectors client.
#[derive(Debug, Clone)]
pub struct AccessConnectorsClient {
    arm: ArmClient,
}

impl AccessConnectorsClient {
    /// Wraps an [`ArmClient`].
    #[must_use]
    pub const fn new(arm: ArmClient) -> Self {
        Self { arm }
    }

    /// Fetches an access connector; `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get(&self, id: &AccessConnectorId) -> Result<Option<AccessConnector>> {
        self.arm.get(&id.id(), ACCESS_CONNECTORS_API_VERSION).await
    }

    /// Creates or replaces an access connector.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the long-running operation fails.
    pub async fn create_or_update(&self, id: &AccessConnectorId, connector: &AccessConnector) -> Result<()> {
        self.arm
            .put(&id.id(), ACCESS_CONNECTORS_API_VERSION, connector)
            .await
    }

    /// Deletes an access connector.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the long-running operation fails.
    pub async fn delete(&self, id: &AccessConnectorId) -> Result<()> {
        self.arm.delete(&id.id(), ACCESS_CONNECTORS_API_VERSION).await
    }
}
