//! Subscription and resource group IDs.

use std::fmt;

use crate::parser::{ParseError, ParseResult};
use crate::segments::{Segment, resource_group_segments, subscription_segments};
use crate::ResourceId;

/// `/subscriptions/{subscriptionId}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId {
    /// The subscription ID.
    pub subscription_id: String,
}

impl SubscriptionId {
    /// Creates a new [`SubscriptionId`].
    #[must_use]
    pub fn new(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
        }
    }
}

impl ResourceId for SubscriptionId {
    const KIND: &'static str = "Subscription";

    fn segments() -> Vec<Segment> {
        subscription_segments()
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self {
            subscription_id: result.require("subscriptionId")?,
        })
    }

    fn id(&self) -> String {
        format!("/subscriptions/{}", self.subscription_id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscription (Subscription: {:?})", self.subscription_id)
    }
}

/// `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceGroupId {
    /// Subscription that owns the resource group.
    pub subscription_id: String,
    /// The resource group name.
    pub resource_group_name: String,
}

impl ResourceGroupId {
    /// Creates a new [`ResourceGroupId`].
    #[must_use]
    pub fn new(subscription_id: impl Into<String>, resource_group_name: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
        }
    }

    /// Returns the ID of the owning subscription.
    #[must_use]
    pub fn subscription(&self) -> SubscriptionId {
        SubscriptionId::new(self.subscription_id.clone())
    }
}

impl ResourceId for ResourceGroupId {
    const KIND: &'static str = "Resource Group";

    fn segments() -> Vec<Segment> {
        resource_group_segments()
    }

    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError> {
        Ok(Self {
            subscription_id: result.require("subscriptionId")?,
            resource_group_name: result.require("resourceGroupName")?,
        })
    }

    fn id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group_name
        )
    }
}

impl fmt::Display for ResourceGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Resource Group (Subscription: {:?}, Resource Group Name: {:?})",
            self.subscription_id, self.resource_group_name
        )
    }
}
