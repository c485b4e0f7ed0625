//! Key/value persistence contract.
//!
//! Session and conversation stores serialize full snapshots to strings and
//! hand them to a `KeyValueStore`. Reads never fail: a missing or unreadable
//! value is simply absent.

mod file;
mod memory;

use pplx_common::StorageError;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageScope {
    /// Shared by every workspace of the current user.
    Application,
    Workspace,
}

impl StorageScope {
    pub(crate) fn file_stem(self) -> &'static str {
        match self {
            StorageScope::Application => "application",
            StorageScope::Workspace => "workspace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// Survives process restarts.
    Persistent,
    /// Kept for the lifetime of the store only.
    Ephemeral,
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str, scope: StorageScope) -> Option<String>;

    fn set(
        &self,
        key: &str,
        value: &str,
        scope: StorageScope,
        durability: Durability,
    ) -> Result<(), StorageError>;

    fn remove(&self, key: &str, scope: StorageScope) -> Result<(), StorageError>;
}
