//! Process-wide named locks.
//!
//! Several Terraform resources can mutate the same parent object: a
//! workspace's customer-managed key and the workspace itself both rewrite
//! the full workspace document. Every mutation acquires the parent's
//! [`LockKey`] first so that at most one read-modify-write against a given
//! parent is in flight inside this process.
//!
//! Locks are not reentrant. Acquiring a key already held by the current
//! task waits forever.
//!
//! ```ignore
//! use azurerm_core::locks::{LockKey, global_locks};
//!
//! let _guard = global_locks()
//!     .acquire(LockKey::by_name("ws1", "azurerm_databricks_workspace"))
//!     .await;
//! // fetch, merge, write
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use azurerm_resourceids::ResourceId;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

/// Global lock registry singleton.
static GLOBAL_LOCKS: OnceLock<LockRegistry> = OnceLock::new();

/// Returns the process-wide lock registry.
#[must_use]
pub fn global_locks() -> LockRegistry {
    GLOBAL_LOCKS.get_or_init(LockRegistry::new).clone()
}

/// Identifies one lockable object.
///
/// The resource type is part of the key, so two resource types that happen
/// to share a name never contend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockKey {
    resource_type: String,
    name: String,
}

impl LockKey {
    /// Key for an object identified by its short name.
    pub fn by_name(name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Key for an object identified by its full ARM ID.
    ///
    /// The ID is lowercased since ARM treats IDs case-insensitively.
    pub fn by_id<T: ResourceId>(id: &T) -> Self {
        Self {
            resource_type: T::KIND.to_string(),
            name: id.id().to_lowercase(),
        }
    }

    /// The resource type half of the key.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// The name half of the key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

type Slot = Arc<AsyncMutex<()>>;

/// Table of named async mutexes.
///
/// Entries are created on first use and removed once no holder or waiter
/// references them.
#[derive(Clone, Default)]
pub struct LockRegistry {
    slots: Arc<Mutex<HashMap<LockKey, Slot>>>,
}

impl LockRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &LockKey) -> Slot {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Waits until `key` is free and takes it.
    ///
    /// Dropping the returned future before it resolves leaves no entry
    /// behind.
    pub async fn acquire(&self, key: LockKey) -> NamedLockGuard {
        // Declared first so a cancelled wait drops the slot clone before pruning.
        let waiting = Waiting {
            registry: self,
            key: &key,
        };
        debug!(lock = %key, "Waiting for lock");
        let guard = self.slot(&key).lock_owned().await;
        drop(waiting);
        debug!(lock = %key, "Acquired lock");
        NamedLockGuard {
            key,
            guard: Some(guard),
            registry: self.clone(),
        }
    }

    /// Takes `key` if nobody holds it.
    #[must_use]
    pub fn try_acquire(&self, key: LockKey) -> Option<NamedLockGuard> {
        let slot = self.slot(&key);
        match slot.try_lock_owned() {
            Ok(guard) => {
                debug!(lock = %key, "Acquired lock");
                Some(NamedLockGuard {
                    key,
                    guard: Some(guard),
                    registry: self.clone(),
                })
            }
            Err(_) => {
                debug!(lock = %key, "Lock is held elsewhere");
                None
            }
        }
    }

    /// Acquires several keys in a deterministic order.
    ///
    /// Keys are sorted and de-duplicated first, so two operations asking for
    /// the same set in different orders cannot deadlock each other.
    pub async fn acquire_all(&self, keys: impl IntoIterator<Item = LockKey>) -> Vec<NamedLockGuard> {
        let mut keys: Vec<LockKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.acquire(key).await);
        }
        guards
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns true if no key is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    fn release(&self, key: &LockKey) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(key)
            && Arc::strong_count(slot) == 1
        {
            slots.remove(key);
        }
    }
}

/// Prunes the registry entry when a pending `acquire` is dropped.
struct Waiting<'a> {
    registry: &'a LockRegistry,
    key: &'a LockKey,
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.registry.release(self.key);
    }
}

impl fmt::Debug for LockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockRegistry")
            .field("keys", &self.len())
            .finish()
    }
}

/// Holds a named lock until dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct NamedLockGuard {
    key: LockKey,
    guard: Option<OwnedMutexGuard<()>>,
    registry: LockRegistry,
}

impl NamedLockGuard {
    /// The key this guard holds.
    #[must_use]
    pub const fn key(&self) -> &LockKey {
        &self.key
    }
}

impl fmt::Debug for NamedLockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedLockGuard").field("key", &self.key).finish()
    }
}

impl Drop for NamedLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.registry.release(&self.key);
        debug!(lock = %self.key, "Released lock");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azurerm_resourceids::WorkspaceId;
    use std::time::Duration;

    fn workspace_key(name: &str) -> LockKey {
        LockKey::by_name(name, "azurerm_databricks_workspace")
    }

    #[test]
    fn test_key_display() {
        assert_eq!(workspace_key("ws1").to_string(), "azurerm_databricks_workspace.ws1");
    }

    #[test]
    fn test_key_by_id_lowercases() {
        let id = WorkspaceId::new("sub", "RG", "WS1");
        let key = LockKey::by_id(&id);
        assert_eq!(key.resource_type(), "Workspace");
        assert_eq!(
            key.name(),
            "/subscriptions/sub/resourcegroups/rg/providers/microsoft.databricks/workspaces/ws1"
        );
    }

    #[test]
    fn test_types_do_not_collide() {
        let registry = LockRegistry::new();
        let _a = registry.try_acquire(LockKey::by_name("shared", "type_a")).unwrap();
        assert!(registry.try_acquire(LockKey::by_name("shared", "type_b")).is_some());
    }

    #[test]
    fn test_try_acquire_held_key() {
        let registry = LockRegistry::new();
        let guard = registry.try_acquire(workspace_key("ws1")).unwrap();
        assert!(registry.try_acquire(workspace_key("ws1")).is_none());
        drop(guard);
        assert!(registry.try_acquire(workspace_key("ws1")).is_some());
    }

    #[tokio::test]
    async fn test_entries_removed_after_release() {
        let registry = LockRegistry::new();
        {
            let _guard = registry.acquire(workspace_key("ws1")).await;
            assert_eq!(registry.len(), 1);
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_second_acquire_waits_for_release() {
        let registry = LockRegistry::new();
        let guard = registry.acquire(workspace_key("ws1")).await;

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move {
                let _guard = registry.acquire(workspace_key("ws1")).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());
        assert_eq!(registry.len(), 1);

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_aborted_waiter_leaves_no_entry() {
        let registry = LockRegistry::new();
        let holder = registry.acquire(workspace_key("ws1")).await;

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move {
                let _guard = registry.acquire(workspace_key("ws1")).await;
                std::future::pending::<()>().await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(holder);
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_timed_out_acquire_leaves_no_entry() {
        let registry = LockRegistry::new();
        let holder = registry.acquire(workspace_key("ws1")).await;

        let waited =
            tokio::time::timeout(Duration::from_millis(20), registry.acquire(workspace_key("ws1")))
                .await;
        assert!(waited.is_err());
        assert_eq!(registry.len(), 1);

        drop(holder);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_acquire_all_dedups_and_sorts() {
        let registry = LockRegistry::new();
        let guards = registry
            .acquire_all([workspace_key("b"), workspace_key("a"), workspace_key("b")])
            .await;

        let names: Vec<&str> = guards.iter().map(|g| g.key().name()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_global_registry_is_shared() {
        let key = LockKey::by_name("global-test", "test_type");
        let guard = global_locks().acquire(key.clone()).await;
        assert!(global_locks().try_acquire(key).is_none());
        drop(guard);
    }
}
