//! Managed services and managed disk keys against a mock workspace endpoint

use std::sync::Arc;
use std::time::Duration;

use azurerm_core::{ArmClient, Error, LockKey, LockRegistry, StaticTokenCredential, Timeouts};
use azurerm_databricks::{
    WORKSPACE_RESOURCE_TYPE, WorkspaceEncryptionConfig, WorkspaceEncryptionResource,
    WorkspacesClient,
};
use azurerm_resourceids::{ResourceId, WorkspaceId};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICES_KEY: &str = "https://svc2.vault.azure.net/keys/svc/2";
const DISK_KEY: &str = "https://disk.vault.azure.net/keys/disk/7";

fn workspace_id() -> WorkspaceId {
    WorkspaceId::new("sub", "rg", "ws1")
}

fn resource(server: &MockServer, locks: LockRegistry) -> WorkspaceEncryptionResource {
    let credential = Arc::new(StaticTokenCredential::new(SecretString::from("t".to_string())));
    let arm = ArmClient::new(server.uri(), credential, Duration::from_millis(5)).unwrap();
    WorkspaceEncryptionResource::new(WorkspacesClient::new(arm), locks, Timeouts::default())
}

fn root_dbfs() -> Value {
    json!({
        "type": "Object",
        "value": {
            "KeySource": "Microsoft.Keyvault",
            "KeyName": "key1",
            "keyversion": "0123456789abcdef",
            "keyvaulturi": "https://vault1.vault.azure.net/"
        }
    })
}

fn workspace(sku: &str) -> Value {
    json!({
        "id": workspace_id().id(),
        "name": "ws1",
        "location": "westeurope",
        "sku": {"name": sku},
        "properties": {
            "managedResourceGroupId": "/subscriptions/sub/resourceGroups/databricks-rg-ws1",
            "parameters": {
                "prepareEncryption": {"type": "Bool", "value": true},
                "enableNoPublicIp": {"type": "Bool", "value": true},
                "encryption": root_dbfs()
            },
            "encryption": {
                "entities": {
                    "managedServices": {
                        "keySource": "Microsoft.Keyvault",
                        "keyVaultProperties": {
                            "keyVaultUri": "https://svc.vault.azure.net/",
                            "keyName": "svc",
                            "keyVersion": "1"
                        }
                    }
                }
            }
        }
    })
}

fn disk_config(rotate: bool) -> WorkspaceEncryptionConfig {
    WorkspaceEncryptionConfig {
        workspace_id: workspace_id().id(),
        managed_disk_key_vault_key_id: Some(DISK_KEY.to_string()),
        managed_disk_rotation_to_latest_version_enabled: rotate,
        ..WorkspaceEncryptionConfig::default()
    }
}

async fn mount_workspace(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(workspace_id().id()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_disk_key_keeps_root_dbfs_and_services() {
    let server = MockServer::start().await;
    mount_workspace(&server, workspace("premium")).await;

    Mock::given(method("PUT"))
        .and(path(workspace_id().id()))
        .and(body_partial_json(json!({
            "sku": {"name": "premium"},
            "properties": {
                "managedResourceGroupId": "/subscriptions/sub/resourceGroups/databricks-rg-ws1",
                "parameters": {
                    "enableNoPublicIp": {"type": "Bool", "value": true},
                    "encryption": root_dbfs()
                },
                "encryption": {
                    "entities": {
                        "managedServices": {
                            "keyVaultProperties": {"keyVaultUri": "https://svc.vault.azure.net/", "keyName": "svc"}
                        },
                        "managedDisk": {
                            "keySource": "Microsoft.Keyvault",
                            "keyVaultProperties": {
                                "keyVaultUri": "https://disk.vault.azure.net/",
                                "keyName": "disk",
                                "keyVersion": "7"
                            },
                            "rotationToLatestKeyVersionEnabled": true
                        }
                    }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let state = resource(&server, LockRegistry::new())
        .apply(&disk_config(true))
        .await
        .unwrap();

    assert_eq!(state.workspace_id, workspace_id().id());
    assert_eq!(state.managed_disk_key_vault_key_id, DISK_KEY);
    assert!(state.managed_disk_rotation_to_latest_version_enabled);
    assert_eq!(
        state.managed_services_key_vault_key_id,
        "https://svc.vault.azure.net/keys/svc/1"
    );
}

#[tokio::test]
async fn test_services_key_replaces_only_services() {
    let server = MockServer::start().await;
    mount_workspace(&server, workspace("Premium")).await;

    Mock::given(method("PUT"))
        .and(path(workspace_id().id()))
        .and(body_partial_json(json!({
            "properties": {
                "parameters": {"encryption": root_dbfs()},
                "encryption": {
                    "entities": {
                        "managedServices": {
                            "keyVaultProperties": {"keyVaultUri": "https://svc2.vault.azure.net/", "keyName": "svc", "keyVersion": "2"}
                        }
                    }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = WorkspaceEncryptionConfig {
        workspace_id: workspace_id().id(),
        managed_services_key_vault_key_id: Some(SERVICES_KEY.to_string()),
        ..WorkspaceEncryptionConfig::default()
    };
    let state = resource(&server, LockRegistry::new()).apply(&config).await.unwrap();

    assert_eq!(state.managed_services_key_vault_key_id, SERVICES_KEY);
    assert_eq!(state.managed_disk_key_vault_key_id, "");
    assert!(!state.managed_disk_rotation_to_latest_version_enabled);
}

#[tokio::test]
async fn test_standard_sku_is_rejected() {
    let server = MockServer::start().await;
    mount_workspace(&server, workspace("standard")).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = resource(&server, LockRegistry::new())
        .apply(&disk_config(false))
        .await
        .unwrap_err();
    match err {
        Error::PreconditionFailed { message, .. } => assert!(message.contains("premium")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_waits_for_workspace_lock() {
    let server = MockServer::start().await;
    mount_workspace(&server, workspace("premium")).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let locks = LockRegistry::new();
    let _held = locks.acquire(LockKey::by_name("ws1", WORKSPACE_RESOURCE_TYPE)).await;

    let resource = resource(&server, locks.clone());
    let config = disk_config(false);
    let attempt = tokio::time::timeout(Duration::from_millis(100), resource.apply(&config)).await;
    assert!(attempt.is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_read_missing_workspace() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(workspace_id().id()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let state = resource(&server, LockRegistry::new())
        .read(&workspace_id())
        .await
        .unwrap();
    assert!(state.is_none());
}
