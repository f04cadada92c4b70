//! Locked fetch-merge-write against a shared parent resource.
//!
//! Some Terraform resources do not map to an ARM object of their own. A
//! Databricks customer-managed key, for instance, is a sub-field of the
//! workspace document, and the only way to change it is to `PUT` the whole
//! workspace back. [`FetchMergeWrite`] does that safely:
//!
//! 1. acquire the child's [`LockKey`]
//! 2. fetch the parent
//! 3. check the child's precondition on the parent
//! 4. reject a create when the child is already configured
//! 5. merge exactly one [`Merge::Patch`] into the parent
//! 6. write the full parent back, waiting for the operation to finish
//!
//! Sibling fields survive because the merge only touches what the patch
//! enumerates, and the parent models keep unknown members verbatim.

use std::fmt;

use async_trait::async_trait;
use azurerm_resourceids::ResourceId;
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::locks::{LockKey, LockRegistry};

/// Reads and writes a parent resource.
#[async_trait]
pub trait ParentStore: Send + Sync {
    /// The parent's typed ID.
    type Id: ResourceId + Send + Sync;
    /// The parent's full model.
    type Model: Merge + Send + Sync;

    /// Fetches the parent; `None` when it does not exist.
    async fn fetch(&self, id: &Self::Id) -> Result<Option<Self::Model>>;

    /// Writes the full parent and waits for the write to complete.
    async fn write(&self, id: &Self::Id, model: &Self::Model) -> Result<()>;
}

/// Applies an enumerated sub-field patch to a parent model.
pub trait Merge {
    /// The sub-fields a child may touch. `None` members are left alone.
    type Patch: Send + Sync;

    /// Merges `patch` into `self`, leaving every other field untouched.
    fn merge(&mut self, patch: &Self::Patch);
}

/// Describes how a child resource sees its parent.
pub trait ChildProjection<M>: Send + Sync {
    /// Terraform type name of the child, e.g.
    /// `azurerm_databricks_workspace_customer_managed_key`.
    fn resource_type(&self) -> &'static str;

    /// The ID a user would import the child under.
    fn import_id(&self) -> String;

    /// Lock serialising mutations of the parent.
    fn lock_key(&self) -> LockKey;

    /// Checks that the parent allows this child to be written.
    ///
    /// # Errors
    ///
    /// Returns a message describing what must change on the parent.
    fn check_precondition(&self, parent: &M) -> std::result::Result<(), String>;

    /// Whether the parent already carries a configured child.
    fn is_configured(&self, parent: &M) -> bool;
}

/// What a write intends to do to the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteIntent {
    /// The child must not already be configured
    Create,
    /// The child is expected to exist
    Update,
    /// The child is being reset to its unconfigured default
    Remove,
}

impl fmt::Display for WriteIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("creating"),
            Self::Update => f.write_str("updating"),
            Self::Remove => f.write_str("removing"),
        }
    }
}

/// Runs locked fetch-merge-write cycles against one [`ParentStore`].
pub struct FetchMergeWrite<'a, S> {
    store: &'a S,
    locks: LockRegistry,
}

impl<'a, S: ParentStore> FetchMergeWrite<'a, S> {
    /// Creates an updater using `locks` for serialisation.
    pub const fn new(store: &'a S, locks: LockRegistry) -> Self {
        Self { store, locks }
    }

    /// Applies `patch` to the parent identified by `parent_id`.
    ///
    /// The precondition is not checked for [`WriteIntent::Remove`], so a
    /// child can always be reset to its default.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the parent does not exist
    /// - [`Error::PreconditionFailed`] if the parent rejects the child
    /// - [`Error::AlreadyExists`] when creating an already configured child
    /// - any error from the store's write
    #[instrument(
        name = "fetch_merge_write",
        skip(self, parent_id, child, patch),
        fields(resource_type = child.resource_type(), parent = %parent_id, %intent)
    )]
    pub async fn apply<C>(
        &self,
        parent_id: &S::Id,
        child: &C,
        intent: WriteIntent,
        patch: &<S::Model as Merge>::Patch,
    ) -> Result<S::Model>
    where
        C: ChildProjection<S::Model>,
    {
        let _guard = self.locks.acquire(child.lock_key()).await;

        let mut parent = self
            .store
            .fetch(parent_id)
            .await?
            .ok_or_else(|| Error::not_found(parent_id))?;

        if intent != WriteIntent::Remove {
            child
                .check_precondition(&parent)
                .map_err(|message| Error::precondition(parent_id, message))?;
        }

        if intent == WriteIntent::Create && child.is_configured(&parent) {
            return Err(Error::already_exists(child.resource_type(), child.import_id()));
        }

        parent.merge(patch);
        debug!("Merged patch into parent");

        self.store.write(parent_id, &parent).await?;
        info!("Parent written");

        Ok(parent)
    }
}
