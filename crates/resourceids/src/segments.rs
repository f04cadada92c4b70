//! Building blocks describing the shape of a resource ID.

/// One `/`-separated element of an ARM resource ID.
///
/// Every segment carries a `name`, which is the key the parsed value is
/// stored under in a [`ParseResult`](crate::ParseResult). Fixed segments
/// (static and resource provider) never produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// A literal path element such as `resourceGroups` or `workspaces`.
    Static {
        /// Segment name
        name: &'static str,
        /// Expected literal value
        value: &'static str,
    },
    /// A resource provider namespace such as `Microsoft.Databricks`.
    ResourceProvider {
        /// Segment name
        name: &'static str,
        /// Expected namespace
        value: &'static str,
    },
    /// A value chosen by the user, e.g. a workspace name.
    UserSpecified {
        /// Segment name
        name: &'static str,
        /// Example value used when rendering an example ID
        example: &'static str,
    },
    /// A subscription ID.
    SubscriptionId {
        /// Segment name
        name: &'static str,
    },
    /// A resource group name.
    ResourceGroup {
        /// Segment name
        name: &'static str,
    },
}

impl Segment {
    /// Creates a static segment.
    #[must_use]
    pub const fn static_segment(name: &'static str, value: &'static str) -> Self {
        Self::Static { name, value }
    }

    /// Creates a resource provider segment.
    #[must_use]
    pub const fn resource_provider(name: &'static str, value: &'static str) -> Self {
        Self::ResourceProvider { name, value }
    }

    /// Creates a user specified segment.
    #[must_use]
    pub const fn user_specified(name: &'static str, example: &'static str) -> Self {
        Self::UserSpecified { name, example }
    }

    /// Creates a subscription ID segment.
    #[must_use]
    pub const fn subscription_id(name: &'static str) -> Self {
        Self::SubscriptionId { name }
    }

    /// Creates a resource group segment.
    #[must_use]
    pub const fn resource_group(name: &'static str) -> Self {
        Self::ResourceGroup { name }
    }

    /// Returns the segment name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Static { name, .. }
            | Self::ResourceProvider { name, .. }
            | Self::UserSpecified { name, .. }
            | Self::SubscriptionId { name }
            | Self::ResourceGroup { name } => name,
        }
    }

    /// Returns the literal value for fixed segments.
    #[must_use]
    pub const fn fixed_value(&self) -> Option<&'static str> {
        match self {
            Self::Static { value, .. } | Self::ResourceProvider { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns a value suitable for an example ID.
    #[must_use]
    pub const fn example_value(&self) -> &'static str {
        match self {
            Self::Static { value, .. } | Self::ResourceProvider { value, .. } => value,
            Self::UserSpecified { example, .. } => example,
            Self::SubscriptionId { .. } => "12345678-1234-9876-4563-123456789012",
            Self::ResourceGroup { .. } => "example-resource-group",
        }
    }
}

/// Segments shared by every resource scoped to a subscription.
#[must_use]
pub fn subscription_segments() -> Vec<Segment> {
    vec![
        Segment::static_segment("staticSubscriptions", "subscriptions"),
        Segment::subscription_id("subscriptionId"),
    ]
}

/// Segments shared by every resource scoped to a resource group.
#[must_use]
pub fn resource_group_segments() -> Vec<Segment> {
    let mut segments = subscription_segments();
    segments.extend([
        Segment::static_segment("staticResourceGroups", "resourceGroups"),
        Segment::resource_group("resourceGroupName"),
    ]);
    segments
}
