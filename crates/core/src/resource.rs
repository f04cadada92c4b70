//! The CRUD contract every managed resource implements.

use async_trait::async_trait;
use azurerm_resourceids::ResourceId;

use crate::error::Result;

/// A Terraform-style resource with typed inputs and outputs.
///
/// `read` returning `Ok(None)` means the resource is gone and should be
/// removed from state.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Terraform type name, e.g. `azurerm_databricks_access_connector`.
    const TYPE_NAME: &'static str;

    /// The resource's typed ID.
    type Id: ResourceId + Send + Sync;
    /// User supplied arguments.
    type Config: Send + Sync;
    /// Arguments plus computed attributes.
    type State: Send + Sync;

    /// Creates the resource.
    async fn create(&self, config: &Self::Config) -> Result<Self::State>;

    /// Reads the resource; `None` when it no longer exists.
    async fn read(&self, id: &Self::Id) -> Result<Option<Self::State>>;

    /// Applies changed arguments to an existing resource.
    async fn update(&self, id: &Self::Id, config: &Self::Config) -> Result<Self::State>;

    /// Deletes the resource.
    async fn delete(&self, id: &Self::Id) -> Result<()>;
}
