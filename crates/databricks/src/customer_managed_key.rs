//! `azurerm_databricks_workspace_customer_managed_key`
//!
//! Root DBFS encryption has no ARM object of its own: it lives in the
//! workspace's custom parameters. Create, update and delete are therefore
//! fetch-merge-write cycles against the workspace, and read projects the
//! workspace back onto this resource.

use async_trait::async_trait;
use azurerm_core::{
    ChildProjection, Error, FetchMergeWrite, LockKey, LockRegistry, Operation, Resource, Result,
    Timeouts, WriteIntent, validation,
};
use azurerm_resourceids::{CustomerManagedKeyId, ResourceId, WorkspaceId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::WORKSPACE_RESOURCE_TYPE;
use crate::client::WorkspacesClient;
use crate::models::{CmkStatus, Encryption, Workspace, WorkspacePatch};
use crate::validate;

/// Terraform type name.
pub const RESOURCE_TYPE: &str = "azurerm_databricks_workspace_customer_managed_key";

/// Arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerManagedKeyConfig {
    /// ARM ID of the workspace
    pub workspace_id: String,
    /// Key Vault key ID, with or without a version
    pub key_vault_key_id: String,
}

/// Arguments plus computed attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerManagedKeyState {
    /// Resource ID
    pub id: String,
    /// ARM ID of the workspace
    pub workspace_id: String,
    /// Key Vault key ID; empty when no customer-managed key is in effect
    pub key_vault_key_id: String,
}

struct Projection<'a> {
    id: &'a CustomerManagedKeyId,
}

impl ChildProjection<Workspace> for Projection<'_> {
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn import_id(&self) -> String {
        self.id.id()
    }

    fn lock_key(&self) -> LockKey {
        LockKey::by_name(self.id.workspace_id().workspace_name, WORKSPACE_RESOURCE_TYPE)
    }

    fn check_precondition(&self, parent: &Workspace) -> std::result::Result<(), String> {
        if parent.prepare_encryption() {
            Ok(())
        } else {
            Err("`customer_managed_key_enabled` must be set to `true`".to_string())
        }
    }

    fn is_configured(&self, parent: &Workspace) -> bool {
        parent.root_dbfs_status() != CmkStatus::Unconfigured
    }
}

/// Manages the root DBFS customer-managed key of a workspace.
#[derive(Debug, Clone)]
pub struct CustomerManagedKeyResource {
    workspaces: WorkspacesClient,
    locks: LockRegistry,
    timeouts: Timeouts,
}

impl CustomerManagedKeyResource {
    /// Creates the resource handler.
    #[must_use]
    pub const fn new(workspaces: WorkspacesClient, locks: LockRegistry, timeouts: Timeouts) -> Self {
        Self {
            workspaces,
            locks,
            timeouts,
        }
    }

    async fn write(
        &self,
        id: &CustomerManagedKeyId,
        intent: WriteIntent,
        encryption: Encryption,
    ) -> Result<Workspace> {
        let workspace_id = id.workspace_id();
        FetchMergeWrite::new(&self.workspaces, self.locks.clone())
            .apply(
                &workspace_id,
                &Projection { id },
                intent,
                &WorkspacePatch::root_dbfs(encryption),
            )
            .await
    }

    async fn read_back(&self, id: &CustomerManagedKeyId) -> Result<CustomerManagedKeyState> {
        self.read_inner(id).await?.ok_or_else(|| Error::not_found(id))
    }

    async fn read_inner(&self, id: &CustomerManagedKeyId) -> Result<Option<CustomerManagedKeyState>> {
        let workspace_id = id.workspace_id();
        let Some(workspace) = self.workspaces.get(&workspace_id).await? else {
            info!(workspace = %workspace_id, "Workspace was not found, removing from state");
            return Ok(None);
        };

        Ok(Some(project(id, &workspace)))
    }
}

/// Maps a workspace onto the customer-managed key state.
///
/// The key ID is empty when the key source is the `Default` sentinel, or
/// when the vault URI or key name is missing.
#[must_use]
pub fn project(id: &CustomerManagedKeyId, workspace: &Workspace) -> CustomerManagedKeyState {
    let status = workspace.root_dbfs_status();
    if status == CmkStatus::Unconfigured {
        debug!("Root DBFS uses Microsoft-managed keys");
    }

    CustomerManagedKeyState {
        id: id.id(),
        workspace_id: id.workspace_id().id(),
        key_vault_key_id: status.key_id().map(|key| key.id()).unwrap_or_default(),
    }
}

fn parse_config(config: &CustomerManagedKeyConfig) -> Result<(CustomerManagedKeyId, Encryption)> {
    let workspace_id = WorkspaceId::parse(&config.workspace_id)?;
    validate::workspace_name("workspace_id", &workspace_id.workspace_name)?;
    let key = validation::key_vault_key_id("key_vault_key_id", &config.key_vault_key_id)?;

    Ok((
        CustomerManagedKeyId::for_workspace(&workspace_id),
        Encryption::key_vault(&key),
    ))
}

#[async_trait]
impl Resource for CustomerManagedKeyResource {
    const TYPE_NAME: &'static str = RESOURCE_TYPE;

    type Id = CustomerManagedKeyId;
    type Config = CustomerManagedKeyConfig;
    type State = CustomerManagedKeyState;

    #[instrument(name = "cmk_create", skip(self, config), fields(workspace = %config.workspace_id))]
    async fn create(&self, config: &CustomerManagedKeyConfig) -> Result<CustomerManagedKeyState> {
        self.timeouts
            .run(Operation::Create, async {
                let (id, encryption) = parse_config(config)?;
                self.write(&id, WriteIntent::Create, encryption).await?;
                info!(id = %id, "Customer-managed key configured");
                self.read_back(&id).await
            })
            .await
    }

    #[instrument(name = "cmk_read", skip(self), fields(id = %id))]
    async fn read(&self, id: &CustomerManagedKeyId) -> Result<Option<CustomerManagedKeyState>> {
        self.timeouts
            .run(Operation::Read, self.read_inner(id))
            .await
    }

    #[instrument(name = "cmk_update", skip(self, config), fields(id = %id))]
    async fn update(
        &self,
        id: &CustomerManagedKeyId,
        config: &CustomerManagedKeyConfig,
    ) -> Result<CustomerManagedKeyState> {
        self.timeouts
            .run(Operation::Update, async {
                let (_, encryption) = parse_config(config)?;
                self.write(id, WriteIntent::Update, encryption).await?;
                self.read_back(id).await
            })
            .await
    }

    /// Customer-managed keys cannot be turned off on a live workspace, so
    /// delete resets root DBFS encryption to Microsoft-managed keys.
    #[instrument(name = "cmk_delete", skip(self), fields(id = %id))]
    async fn delete(&self, id: &CustomerManagedKeyId) -> Result<()> {
        self.timeouts
            .run(Operation::Delete, async {
                match self
                    .write(id, WriteIntent::Remove, Encryption::microsoft_managed())
                    .await
                {
                    Ok(_) => Ok(()),
                    Err(err) if err.is_not_found() => {
                        debug!("Workspace already gone");
                        Ok(())
                    }
                    Err(err) => Err(err),
                }
            })
            .await
    }
}
