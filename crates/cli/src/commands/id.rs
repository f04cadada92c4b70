//! `azurerm id parse`

use azurerm_resourceids::{
    AccessConnectorId, CustomerManagedKeyId, KeyVaultId, NestedItemId, ParseError, Parser,
    ResourceGroupId, ResourceId, SubscriptionId, VirtualNetworkId, VirtualNetworkPeeringId,
    WorkspaceId,
};
use serde_json::{Map, Value, json};

use crate::cli::IdKind;

/// Parses `input` as `kind` and describes its segments.
///
/// The output carries the kind, the canonical ID and each user supplied
/// segment keyed by its segment name.
pub fn parse(input: &str, kind: IdKind, insensitive: bool) -> Result<Value, ParseError> {
    match kind {
        IdKind::Subscription => describe::<SubscriptionId>(input, insensitive),
        IdKind::ResourceGroup => describe::<ResourceGroupId>(input, insensitive),
        IdKind::Workspace => describe::<WorkspaceId>(input, insensitive),
        IdKind::AccessConnector => describe::<AccessConnectorId>(input, insensitive),
        IdKind::CustomerManagedKey => describe::<CustomerManagedKeyId>(input, insensitive),
        IdKind::VirtualNetworkPeering => describe::<VirtualNetworkPeeringId>(input, insensitive),
        IdKind::VirtualNetwork => describe::<VirtualNetworkId>(input, insensitive),
        IdKind::KeyVault => describe::<KeyVaultId>(input, insensitive),
        IdKind::KeyVaultKey => describe_key(input),
    }
}

fn describe<T: ResourceId>(input: &str, insensitive: bool) -> Result<Value, ParseError> {
    let result = Parser::new(T::KIND, T::segments()).parse(input, insensitive)?;
    let id = T::from_parse_result(&result)?;

    let segments: Map<String, Value> = result
        .segments()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();

    Ok(json!({
        "kind": T::KIND,
        "id": id.id(),
        "segments": segments,
    }))
}

fn describe_key(input: &str) -> Result<Value, ParseError> {
    let key = NestedItemId::parse_versionless(input)?;
    Ok(json!({
        "kind": "Key Vault Nested Item",
        "id": key.id(),
        "segments": {
            "keyVaultBaseUrl": key.key_vault_base_url,
            "nestedItemType": key.nested_item_type.to_string(),
            "name": key.name,
            "version": key.version,
        },
    }))
}
