//! Managed services and managed disk customer-managed keys.
//!
//! These are workspace arguments rather than a resource of their own, but
//! they live in the same workspace document as root DBFS encryption. They
//! are written through the same locked fetch-merge-write, under the same
//! workspace lock, so neither writer can undo the other.

use azurerm_core::{
    ChildProjection, Error, FetchMergeWrite, LockKey, LockRegistry, Operation, Result, Timeouts,
    WriteIntent, validation,
};
use azurerm_resourceids::{ResourceId, WorkspaceId};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::WORKSPACE_RESOURCE_TYPE;
use crate::client::WorkspacesClient;
use crate::models::{EntityEncryption, Workspace, WorkspacePatch};
use crate::validate;

/// Arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceEncryptionConfig {
    /// ARM ID of the workspace
    pub workspace_id: String,
    /// Key Vault key for notebooks and other control plane data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_services_key_vault_key_id: Option<String>,
    /// Key Vault key for cluster managed disks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_disk_key_vault_key_id: Option<String>,
    /// Managed disks follow the latest key version; requires a managed disk key
    #[serde(default)]
    pub managed_disk_rotation_to_latest_version_enabled: bool,
}

/// Keys in effect on a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceEncryptionState {
    /// ARM ID of the workspace
    pub workspace_id: String,
    /// Empty when managed services use Microsoft-managed keys
    pub managed_services_key_vault_key_id: String,
    /// Empty when managed disks use Microsoft-managed keys
    pub managed_disk_key_vault_key_id: String,
    /// Whether managed disks follow the latest key version
    pub managed_disk_rotation_to_latest_version_enabled: bool,
}

struct Projection<'a> {
    id: &'a WorkspaceId,
}

impl ChildProjection<Workspace> for Projection<'_> {
    fn resource_type(&self) -> &'static str {
        WORKSPACE_RESOURCE_TYPE
    }

    fn import_id(&self) -> String {
        self.id.id()
    }

    fn lock_key(&self) -> LockKey {
        LockKey::by_name(&self.id.workspace_name, WORKSPACE_RESOURCE_TYPE)
    }

    fn check_precondition(&self, parent: &Workspace) -> std::result::Result<(), String> {
        match parent.sku_name() {
            Some(sku) if sku.eq_ignore_ascii_case("premium") => Ok(()),
            other => Err(format!(
                "managed services and managed disk keys are only available with a `premium` workspace `sku`, got {:?}",
                other.unwrap_or_default()
            )),
        }
    }

    fn is_configured(&self, parent: &Workspace) -> bool {
        parent.managed_services_encryption().is_some() || parent.managed_disk_encryption().is_some()
    }
}

/// Maps a workspace onto the managed services and managed disk keys.
#[must_use]
pub fn project(id: &WorkspaceId, workspace: &Workspace) -> WorkspaceEncryptionState {
    let key_id = |entity: Option<&EntityEncryption>| {
        entity
            .and_then(EntityEncryption::key_id)
            .map(|key| key.id())
            .unwrap_or_default()
    };

    WorkspaceEncryptionState {
        workspace_id: id.id(),
        managed_services_key_vault_key_id: key_id(workspace.managed_services_encryption()),
        managed_disk_key_vault_key_id: key_id(workspace.managed_disk_encryption()),
        managed_disk_rotation_to_latest_version_enabled: workspace
            .managed_disk_encryption()
            .and_then(|disk| disk.rotation_to_latest_key_version_enabled)
            .unwrap_or(false),
    }
}

fn parse_config(config: &WorkspaceEncryptionConfig) -> Result<(WorkspaceId, WorkspacePatch)> {
    let id = WorkspaceId::parse(&config.workspace_id)?;
    validate::workspace_name("workspace_id", &id.workspace_name)?;

    if config.managed_disk_rotation_to_latest_version_enabled && config.managed_disk_key_vault_key_id.is_none() {
        return Err(Error::validation(
            "managed_disk_rotation_to_latest_version_enabled",
            "requires `managed_disk_key_vault_key_id`",
        ));
    }

    let services = config
        .managed_services_key_vault_key_id
        .as_deref()
        .map(|raw| validation::key_vault_key_id("managed_services_key_vault_key_id", raw))
        .transpose()?
        .map(|key| EntityEncryption::key_vault(&key));

    let disk = config
        .managed_disk_key_vault_key_id
        .as_deref()
        .map(|raw| validation::key_vault_key_id("managed_disk_key_vault_key_id", raw))
        .transpose()?
        .map(|key| EntityEncryption {
            // Omitted unless enabled.
            rotation_to_latest_key_version_enabled: config
                .managed_disk_rotation_to_latest_version_enabled
                .then_some(true),
            ..EntityEncryption::key_vault(&key)
        });

    if services.is_none() && disk.is_none() {
        return Err(Error::validation(
            "managed_services_key_vault_key_id",
            "at least one of `managed_services_key_vault_key_id` or `managed_disk_key_vault_key_id` is required",
        ));
    }

    Ok((id, WorkspacePatch::entities(services, disk)))
}

/// Writes managed services and managed disk keys onto a workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceEncryptionResource {
    workspaces: WorkspacesClient,
    locks: LockRegistry,
    timeouts: Timeouts,
}

impl WorkspaceEncryptionResource {
    /// Creates the handler.
    #[must_use]
    pub const fn new(workspaces: WorkspacesClient, locks: LockRegistry, timeouts: Timeouts) -> Self {
        Self {
            workspaces,
            locks,
            timeouts,
        }
    }

    /// Sets the configured keys, leaving unset entities and root DBFS
    /// encryption as they are.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for malformed IDs, rotation without a
    ///   managed disk key, or no key at all
    /// - [`Error::NotFound`] if the workspace does not exist
    /// - [`Error::PreconditionFailed`] unless the workspace SKU is `premium`
    #[instrument(name = "workspace_encryption_apply", skip(self, config), fields(workspace = %config.workspace_id))]
    pub async fn apply(&self, config: &WorkspaceEncryptionConfig) -> Result<WorkspaceEncryptionState> {
        self.timeouts
            .run(Operation::Update, async {
                let (id, patch) = parse_config(config)?;
                let workspace = FetchMergeWrite::new(&self.workspaces, self.locks.clone())
                    .apply(&id, &Projection { id: &id }, WriteIntent::Update, &patch)
                    .await?;
                info!(id = %id, "Workspace encryption keys written");
                Ok(project(&id, &workspace))
            })
            .await
    }

    /// Reads the keys in effect; `None` when the workspace is gone.
    ///
    /// # Errors
    ///
    /// Returns any error from the workspace fetch.
    #[instrument(name = "workspace_encryption_read", skip(self), fields(id = %id))]
    pub async fn read(&self, id: &WorkspaceId) -> Result<Option<WorkspaceEncryptionState>> {
        self.timeouts
            .run(Operation::Read, async {
                Ok(self
                    .workspaces
                    .get(id)
                    .await?
                    .map(|workspace| project(id, &workspace)))
            })
            .await
    }
}
