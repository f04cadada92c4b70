//! Per-operation deadlines.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The four resource operations, each with its own deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Create
    Create,
    /// Read
    Read,
    /// Update
    Update,
    /// Delete
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Read => f.write_str("read"),
            Self::Update => f.write_str("update"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// Deadlines in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Create deadline
    pub create_secs: u64,
    /// Read deadline
    pub read_secs: u64,
    /// Update deadline
    pub update_secs: u64,
    /// Delete deadline
    pub delete_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create_secs: 30 * 60,
            read_secs: 5 * 60,
            update_secs: 30 * 60,
            delete_secs: 30 * 60,
        }
    }
}

impl Timeouts {
    /// Deadline for `operation`.
    #[must_use]
    pub const fn for_operation(&self, operation: Operation) -> Duration {
        let secs = match operation {
            Operation::Create => self.create_secs,
            Operation::Read => self.read_secs,
            Operation::Update => self.update_secs,
            Operation::Delete => self.delete_secs,
        };
        Duration::from_secs(secs)
    }

    /// Runs `future` under the deadline for `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the deadline passes first, otherwise
    /// whatever `future` returns.
    pub async fn run<T, F>(&self, operation: Operation, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let deadline = self.for_operation(operation);
        tokio::time::timeout(deadline, future)
            .await
            .unwrap_or_else(|_| {
                Err(Error::Timeout {
                    operation: operation.to_string(),
                    seconds: deadline.as_secs(),
                })
            })
    }
}
