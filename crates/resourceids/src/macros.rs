/// Declares an ID of the shape
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}`.
macro_rules! resource_group_scoped_id {
    (
        $(#[$meta:meta])*
        $name:ident {
            kind: $kind:literal,
            provider: $provider:literal,
            resource_type: $resource_type:literal,
            field: $field:ident,
            segment: $segment:literal,
            label: $label:literal,
            example: $example:literal $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            /// Subscription that owns the resource.
            pub subscription_id: String,
            /// Resource group containing the resource.
            pub resource_group_name: String,
            #[doc = concat!("The ", $label, ".")]
            pub $field: String,
        }

        impl $name {
            #[doc = concat!("Creates a new [`", stringify!($name), "`].")]
            #[must_use]
            pub fn new(
                subscription_id: impl Into<String>,
                resource_group_name: impl Into<String>,
                $field: impl Into<String>,
            ) -> Self {
                Self {
                    subscription_id: subscription_id.into(),
                    resource_group_name: resource_group_name.into(),
                    $field: $field.into(),
                }
            }

            /// Returns the ID of the resource group containing this resource.
            #[must_use]
            pub fn resource_group_id(&self) -> $crate::common::ResourceGroupId {
                $crate::common::ResourceGroupId::new(
                    self.subscription_id.clone(),
                    self.resource_group_name.clone(),
                )
            }
        }

        impl $crate::ResourceId for $name {
            const KIND: &'static str = $kind;

            fn segments() -> Vec<$crate::Segment> {
                let mut segments = $crate::segments::resource_group_segments();
                segments.extend([
                    $crate::Segment::static_segment("staticProviders", "providers"),
                    $crate::Segment::resource_provider("staticProviderNamespace", $provider),
                    $crate::Segment::static_segment("staticResourceType", $resource_type),
                    $crate::Segment::user_specified($segment, $example),
                ]);
                segments
            }

            fn from_parse_result(
                result: &$crate::ParseResult,
            ) -> Result<Self, $crate::ParseError> {
                Ok(Self {
                    subscription_id: result.require("subscriptionId")?,
                    resource_group_name: result.require("resourceGroupName")?,
                    $field: result.require($segment)?,
                })
            }

            fn id(&self) -> String {
                format!(
                    "/subscriptions/{}/resourceGroups/{}/providers/{}/{}/{}",
                    self.subscription_id,
                    self.resource_group_name,
                    $provider,
                    $resource_type,
                    self.$field
                )
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    "{} (Subscription: {:?}, Resource Group Name: {:?}, {}: {:?})",
                    $kind, self.subscription_id, self.resource_group_name, $label, self.$field
                )
            }
        }
    };
}
