//! `Microsoft.Databricks` resource IDs.

use std::fmt;

use crate::parser::{ParseError, ParseResult};
use crate::segments::{Segment, resource_group_segments};
use crate::ResourceId;

resource_group_scoped_id! {
    /// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Databricks/workspaces/{workspaceName}`
    WorkspaceId {
        kind: "Workspace",
        provider: "Microsoft.Databricks",
        resource_type: "workspaces",
        field: workspace_name,
        segment: "workspaceName",
        label: "Workspace Name",
        example: "workspaceValue",
    }
}

resource_group_scoped_id! {
    /// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Databricks/accessConnectors/{accessConnectorName}`
    AccessConnectorId {
        kind: "Access Connector",
        provider: "Microsoft.Databricks",
        resource_type: "accessConnectors",
        field: access_connector_name,
        segment: "accessConnectorName",
        label: "Access Connector Name",
        example: "accessConnectorValue",
    }
}

resource_group_scoped_id! {
    /// ID of the customer-managed key binding of a workspace.
    ///
    /// There is no such resource in the API; the binding lives inside the
    /// workspace, so the name segment is always the workspace name.
    CustomerManagedKeyId {
        kind: "Customer Managed Key",
        provider: "Microsoft.Databricks",
        resource_type: "customerManagedKey",
        field: customer_managed_key_name,
        segment: "customerManagedKeyName",
        label: "Customer Managed Key Name",
        example: "workspaceValue",
    }
}

impl CustomerManagedKeyId {
    /// Builds the binding ID for a workspace.
    #[must_use]
    pub fn for_workspace(workspace: &WorkspaceId) -> Self {
        Self::new(
            workspace.subscription_id.clone(),
            workspace.resource_group_name.clone(),
            workspace.workspace_name.clone(),
        )
    }

    /// Returns the ID of the workspace this binding belongs to.
    #[must_use]
    pub fn workspace_id(&self) -> WorkspaceId {
        WorkspaceId::new(
            self.subscription_id.clone(),
            self.resource_group_name.clone(),
            self.customer_managed_key_name.clone(),
        )
    }
}

/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Databricks/workspaces/{workspaceName}/virtualNetworkPeerings/{peeringName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualNetworkPeeringId {
    /// Subscription that owns the workspace.
    pub subscription_id: String,
    /// Resource group containing the workspace.
    pub resource_group_name: String,
    /// The parent workspace name.
    pub workspace_name: String,
    /// The peering name.
    pub virtual_network_peering_name: String,
}

impl VirtualNetworkPeeringId {
    /// Creates a new [`VirtualNetworkPeeringId`].
    #[must_use]
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        workspace_name: impl Into<String>,
        virtual_network_peering_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            workspace_name: workspace_name.into(),
            virtual_network_peering_name: virtual_network_peering_name.into(),
        }
    }

    /// Builds a peering ID beneath an existing workspace.
    #[must_use]
    pub fn for_workspace(workspace: &WorkspaceId, name: impl Into<String>) -> Self {
        Self::new(
            workspace.subscription_id.clone(),
            workspace.resource_group_name.clone(),
            workspace.workspace_name.clone(),
            name,
        )
    }

    /// Returns the parent workspace ID.
    #[must_use]
    pub fn workspace_id(&self) -> WorkspaceId {
        WorkspaceId::new(
            self.subscription_id.clone(),
            self.resource_group_name.clone(),
            self.workspace_name.clone(),
        )
    }
}

impl ResourceId for VirtualNetworkPeeringId {
    const KIND: &'static str = "Virtual Network Peering";

    fn segments() -> Vec<Segment> {
        let mut segments = resource_group_segments();
        segments.extend([
            Segment::static_segment("staticProviders", "providers"),
            Segment::resource_provider("staticMicrosoftDatabricks", "Microsoft.Databricks"),
            Segment::static_segment("staticWorkspaces", "workspaces"),
            Segment::user_specified("workspaceName", "workspaceValue"),
            Segment::static_segment("staticVirtualNetworkPeerings", "virtualNetworkPeerings"),
            Segment::user_specified("virtualNetworkPeeringName", "virtualNetworkPeeringValue"),
        ]);
        segments
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self {
            subscription_id: result.require("subscriptionId")?,
            resource_group_name: result.require("resourceGroupName")?,
            workspace_name: result.require("workspaceName")?,
            virtual_network_peering_name: result.require("virtualNetworkPeeringName")?,
        })
    }

    fn id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Databricks/workspaces/{}/virtualNetworkPeerings/{}",
            self.subscription_id,
            self.resource_group_name,
            self.workspace_name,
            self.virtual_network_peering_name
        )
    }
}

impl fmt::Display for VirtualNetworkPeeringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Virtual Network Peering (Subscription: {:?}, Resource Group Name: {:?}, Workspace Name: {:?}, Virtual Network Peering Name: {:?})",
            self.subscription_id,
            self.resource_group_name,
            self.workspace_name,
            self.virtual_network_peering_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKSPACE: &str = "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/example-resources/providers/Microsoft.Databricks/workspaces/databricks-test";

    #[test]
    fn test_workspace_display() {
        let id = WorkspaceId::parse(WORKSPACE).unwrap();
        assert_eq!(
            id.to_string(),
            "Workspace (Subscription: \"12345678-1234-9876-4563-123456789012\", Resource Group Name: \"example-resources\", Workspace Name: \"databricks-test\")"
        );
    }

    #[test]
    fn test_customer_managed_key_id_mirrors_workspace() {
        let workspace = WorkspaceId::parse(WORKSPACE).unwrap();
        let cmk = CustomerManagedKeyId::for_workspace(&workspace);
        assert_eq!(
            cmk.id(),
            "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/example-resources/providers/Microsoft.Databricks/customerManagedKey/databricks-test"
        );
        assert_eq!(cmk.workspace_id(), workspace);
    }

    #[test]
    fn test_peering_parent() {
        let id = VirtualNetworkPeeringId::parse(&format!("{WORKSPACE}/virtualNetworkPeerings/peer1")).unwrap();
        assert_eq!(id.virtual_network_peering_name, "peer1");
        assert_eq!(id.workspace_id().id(), WORKSPACE);
    }

    #[test]
    fn test_workspace_id_rejects_access_connector() {
        let err = WorkspaceId::parse(
            "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Databricks/accessConnectors/ac",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidSegment {
                expected: "workspaces",
                ..
            }
        ));
    }
}
