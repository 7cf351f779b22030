//! Durable client-side key-value storage.

mod in_memory;
mod sqlite;

pub use in_memory::InMemorySessionStore;
pub use sqlite::SqliteSessionStore;

use std::sync::Arc;

use thiserror::Error;

/// Session store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage read failed: {0}")]
    Read(String),

    #[error("storage write failed: {0}")]
    Write(String),
}

/// Durable key-value store for in-progress enrollment state.
///
/// A single well-known key holds the enrollment record; separate keys hold
/// the transient payment payload and access code. Reads and writes are
/// synchronous and local to the client, and there is exactly one writer (the
/// current tab) - cross-tab consistency is out of scope.
///
/// The store is injected into the flow controller so tests can substitute an
/// in-memory implementation.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}
