//! `Microsoft.Network` resource IDs.

resource_group_scoped_id! {
    /// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Network/virtualNetworks/{virtualNetworkName}`
    VirtualNetworkId {
        kind: "Virtual Network",
        provider: "Microsoft.Network",
        resource_type: "virtualNetworks",
        field: virtual_network_name,
        segment: "virtualNetworkName",
        label: "Virtual Network Name",
        example: "virtualNetworkValue",
    }
}
