//! `azurerm cmk show|set|remove`

use azurerm_core::{Error, Resource, Result};
use azurerm_databricks::customer_managed_key;
use azurerm_databricks::models::EntityEncryption;
use azurerm_databricks::{
    CustomerManagedKeyConfig, CustomerManagedKeyResource, CustomerManagedKeyState,
    WorkspaceEncryptionConfig, WorkspaceEncryptionResource, WorkspacesClient,
};
use azurerm_resourceids::{CustomerManagedKeyId, ResourceId, WorkspaceId};
use serde_json::{Value, json};
use tracing::info;

fn entity_key_id(entity: Option<&EntityEncryption>) -> Value {
    entity
        .and_then(EntityEncryption::key_id)
        .map_or(Value::Null, |key| Value::String(key.id()))
}

/// Root DBFS key plus the managed services and managed disk keys.
pub async fn show(workspaces: &WorkspacesClient, workspace_id: &str) -> Result<Value> {
    let workspace_id = WorkspaceId::parse_insensitively(workspace_id)?;
    let workspace = workspaces
        .get(&workspace_id)
        .await?
        .ok_or_else(|| Error::not_found(&workspace_id))?;

    let id = CustomerManagedKeyId::for_workspace(&workspace_id);
    let state = customer_managed_key::project(&id, &workspace);

    Ok(json!({
        "id": state.id,
        "workspace_id": state.workspace_id,
        "customer_managed_key_enabled": workspace.prepare_encryption(),
        "key_vault_key_id": state.key_vault_key_id,
        "managed_services_key_id": entity_key_id(workspace.managed_services_encryption()),
        "managed_disk_key_id": entity_key_id(workspace.managed_disk_encryption()),
    }))
}

/// Keys requested by `cmk set`; at least one is present.
#[derive(Debug, Clone, Default)]
pub struct SetKeys {
    pub key_vault_key_id: Option<String>,
    pub managed_services_key_id: Option<String>,
    pub managed_disk_key_id: Option<String>,
    pub rotate_to_latest: bool,
}

/// Writes the requested keys and reports the resulting key IDs.
///
/// The root DBFS key and the managed services/disk keys are separate
/// workspace writes; both take the workspace lock.
pub async fn set(
    keys: &CustomerManagedKeyResource,
    encryption: &WorkspaceEncryptionResource,
    workspace_id: &str,
    request: &SetKeys,
) -> Result<Value> {
    let workspace = WorkspaceId::parse_insensitively(workspace_id)?;
    let mut output = json!({ "workspace_id": workspace.id() });

    if let Some(key) = &request.key_vault_key_id {
        let state = set_root_dbfs(keys, &workspace, key).await?;
        output["id"] = Value::String(state.id);
        output["key_vault_key_id"] = Value::String(state.key_vault_key_id);
    }

    if request.managed_services_key_id.is_some() || request.managed_disk_key_id.is_some() {
        let state = encryption
            .apply(&WorkspaceEncryptionConfig {
                workspace_id: workspace.id(),
                managed_services_key_vault_key_id: request.managed_services_key_id.clone(),
                managed_disk_key_vault_key_id: request.managed_disk_key_id.clone(),
                managed_disk_rotation_to_latest_version_enabled: request.rotate_to_latest,
            })
            .await?;
        output["managed_services_key_id"] = Value::String(state.managed_services_key_vault_key_id);
        output["managed_disk_key_id"] = Value::String(state.managed_disk_key_vault_key_id);
        output["managed_disk_rotation_to_latest_version_enabled"] =
            Value::Bool(state.managed_disk_rotation_to_latest_version_enabled);
    }

    Ok(output)
}

/// Creates the binding, or updates it when a key is already in effect.
async fn set_root_dbfs(
    keys: &CustomerManagedKeyResource,
    workspace: &WorkspaceId,
    key_vault_key_id: &str,
) -> Result<CustomerManagedKeyState> {
    let id = CustomerManagedKeyId::for_workspace(workspace);
    let config = CustomerManagedKeyConfig {
        workspace_id: workspace.id(),
        key_vault_key_id: key_vault_key_id.to_string(),
    };

    match keys.read(&id).await? {
        Some(state) if !state.key_vault_key_id.is_empty() => {
            info!(id = %id, "Customer-managed key already set, updating");
            keys.update(&id, &config).await
        }
        _ => keys.create(&config).await,
    }
}

/// Returns root DBFS encryption to Microsoft-managed keys.
pub async fn remove(keys: &CustomerManagedKeyResource, workspace_id: &str) -> Result<Value> {
    let workspace = WorkspaceId::parse_insensitively(workspace_id)?;
    let id = CustomerManagedKeyId::for_workspace(&workspace);
    keys.delete(&id).await?;
    Ok(json!({ "id": id.id(), "removed": true }))
}
