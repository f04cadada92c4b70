//! # azurerm-resourceids
//!
//! Parsing and formatting of Azure Resource Manager resource IDs.
//!
//! ARM IDs have the fixed shape
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}[/{childType}/{childName}]`.
//! Each typed ID in this crate describes its shape as a list of
//! [`Segment`]s; the [`Parser`] matches raw strings against that list.
//!
//! Two parsing modes exist:
//! - [`parse`] requires literal segments to match exactly.
//! - [`parse_insensitively`] accepts any casing of literal segments, which
//!   is what the API itself does and what imported IDs often look like.
//!
//! ```
//! use azurerm_resourceids::{ResourceId, WorkspaceId};
//!
//! let id = WorkspaceId::parse_insensitively(
//!     "/subscriptions/00000000-0000-0000-0000-000000000000/resourcegroups/rg1/providers/microsoft.databricks/WORKSPACES/ws1",
//! )?;
//! assert_eq!(id.workspace_name, "ws1");
//! assert_eq!(
//!     id.id(),
//!     "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg1/providers/Microsoft.Databricks/workspaces/ws1"
//! );
//! # Ok::<(), azurerm_resourceids::ParseError>(())
//! ```

#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod common;
pub mod databricks;
pub mod keyvault;
pub mod network;
pub mod parser;
pub mod segments;

pub use common::{ResourceGroupId, SubscriptionId};
pub use databricks::{AccessConnectorId, CustomerManagedKeyId, VirtualNetworkPeeringId, WorkspaceId};
pub use keyvault::{KeyVaultId, NestedItemId, NestedItemType};
pub use network::VirtualNetworkId;
pub use parser::{ParseError, ParseResult, Parser};
pub use segments::Segment;

/// A strongly typed ARM resource ID.
pub trait ResourceId: Sized + std::fmt::Display {
    /// Human readable kind, e.g. `"Workspace"`.
    const KIND: &'static str;

    /// The segments making up this ID.
    fn segments() -> Vec<Segment>;

    /// Builds the typed ID from parsed segment values.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingSegment`] if a required value is absent.
    fn from_parse_result(result: &ParseResult) -> Result<Self, ParseError>;

    /// Formats the canonical ARM ID.
    fn id(&self) -> String;

    /// Parses an ID whose literal segments match exactly.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the input does not match this ID's shape.
    fn parse(input: &str) -> Result<Self, ParseError> {
        parse(input)
    }

    /// Parses an ID accepting any casing of literal segments.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the input does not match this ID's shape.
    fn parse_insensitively(input: &str) -> Result<Self, ParseError> {
        parse_insensitively(input)
    }
}

/// Parses `input` as `T`, matching literal segments exactly.
///
/// # Errors
///
/// Returns a [`ParseError`] if the input does not match `T`'s shape.
pub fn parse<T: ResourceId>(input: &str) -> Result<T, ParseError> {
    let result = Parser::new(T::KIND, T::segments()).parse(input, false)?;
    T::from_parse_result(&result)
}

/// Parses `input` as `T`, accepting any casing of literal segments.
///
/// # Errors
///
/// Returns a [`ParseError`] if the input does not match `T`'s shape.
pub fn parse_insensitively<T: ResourceId>(input: &str) -> Result<T, ParseError> {
    let result = Parser::new(T::KIND, T::segments()).parse(input, true)?;
    T::from_parse_result(&result)
}
