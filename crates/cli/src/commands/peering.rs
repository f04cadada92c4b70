//! `azurerm peering show|delete`

use azurerm_core::{Error, Resource, Result};
use azurerm_databricks::VirtualNetworkPeeringResource;
use azurerm_resourceids::{ResourceId, VirtualNetworkPeeringId};
use serde_json::{Value, json};

pub async fn show(peerings: &VirtualNetworkPeeringResource, id: &str) -> Result<Value> {
    let id = VirtualNetworkPeeringId::parse_insensitively(id)?;
    let state = peerings
        .read(&id)
        .await?
        .ok_or_else(|| Error::not_found(&id))?;
    Ok(serde_json::to_value(state)?)
}

pub async fn delete(peerings: &VirtualNetworkPeeringResource, id: &str) -> Result<Value> {
    let id = VirtualNetworkPeeringId::parse_insensitively(id)?;
    peerings.delete(&id).await?;
    Ok(json!({ "id": id.id(), "deleted": true }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use azurerm_core::{ArmClient, LockRegistry, RetryConfig, StaticTokenCredential, Timeouts};
    use azurerm_databricks::VirtualNetworkPeeringsClient;
    use secrecy::SecretString;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const PEERING: &str = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Databricks/workspaces/ws1/virtualNetworkPeerings/peer1";

    fn peerings(server: &MockServer) -> VirtualNetworkPeeringResource {
        let credential = Arc::new(StaticTokenCredential::new(SecretString::from("t".to_string())));
        let arm = ArmClient::new(server.uri(), credential, Duration::from_millis(5)).unwrap();
        VirtualNetworkPeeringResource::new(
            VirtualNetworkPeeringsClient::new(arm),
            LockRegistry::new(),
            RetryConfig::default(),
            Timeouts::default(),
        )
    }

    #[tokio::test]
    async fn test_show_accepts_lowercase_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PEERING))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "peer1",
                "properties": {
                    "allowVirtualNetworkAccess": true,
                    "remoteVirtualNetwork": {"id": "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/hub"},
                    "remoteAddressSpace": {"addressPrefixes": ["10.0.0.0/16"]}
                }
            })))
            .mount(&server)
            .await;

        let lowered = PEERING
            .replace("resourceGroups", "resourcegroups")
            .replace("virtualNetworkPeerings", "virtualnetworkpeerings");
        let out = show(&peerings(&server), &lowered).await.unwrap();
        assert_eq!(out["id"], PEERING);
        assert_eq!(out["remote_address_space_prefixes"], json!(["10.0.0.0/16"]));
    }

    #[tokio::test]
    async fn test_show_missing_peering() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = show(&peerings(&server), PEERING).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(PEERING))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let out = delete(&peerings(&server), PEERING).await.unwrap();
        assert_eq!(out["deleted"], true);
    }
}
