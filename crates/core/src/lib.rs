//! # azurerm-core
//!
//! Building blocks for resources that mutate a shared parent object through
//! the Azure Resource Manager API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Resource (create / read / update / delete)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  FetchMergeWrite                                            │
//! │  lock → fetch parent → precondition → merge patch → write   │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │  LockRegistry                │  retry_transient             │
//! │  (named async mutexes)       │  (classify + backoff budget) │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │  ArmClient (reqwest, bearer auth, LRO polling)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mutations against one parent are serialised within this process only.
//! A second process writing the same parent can still overwrite a
//! concurrent change.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod locks;
pub mod resource;
pub mod retry;
pub mod timeouts;
pub mod updater;
pub mod validation;

pub use client::ArmClient;
pub use config::{AuthMethod, ProviderConfig};
pub use credentials::{AzureCliCredential, StaticTokenCredential, TokenCredential};
pub use error::{ApiError, Error, Result};
pub use locks::{LockKey, LockRegistry, NamedLockGuard, global_locks};
pub use resource::Resource;
pub use retry::{Disposition, RetryConfig, classify, retry_transient};
pub use timeouts::{Operation, Timeouts};
pub use updater::{ChildProjection, FetchMergeWrite, Merge, ParentStore, WriteIntent};
