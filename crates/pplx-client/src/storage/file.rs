//! JSON-file-backed store: one object file per scope.
//!
//! Writes are atomic (write to `.tmp`, then rename) so a crash mid-write
//! leaves the previous snapshot intact.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use pplx_common::StorageError;
use tracing::{debug, warn};

use super::{Durability, KeyValueStore, StorageScope};

#[derive(Default)]
struct ScopeEntries {
    persistent: BTreeMap<String, String>,
    ephemeral: HashMap<String, String>,
}

pub struct FileStore {
    dir: PathBuf,
    scopes: RwLock<HashMap<StorageScope, ScopeEntries>>,
}

impl FileStore {
    /// Open (or lazily create) a store rooted at `dir`.
    ///
    /// Unreadable or corrupt scope files are logged and treated as empty.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let mut scopes = HashMap::new();
        for scope in [StorageScope::Application, StorageScope::Workspace] {
            let persistent = read_scope_file(&scope_path(&dir, scope));
            scopes.insert(
                scope,
                ScopeEntries {
                    persistent,
                    ephemeral: HashMap::new(),
                },
            );
        }
        Self {
            dir,
            scopes: RwLock::new(scopes),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn flush(
        &self,
        scope: StorageScope,
        entries: &BTreeMap<String, String>,
    ) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = scope_path(&self.dir, scope);
        let json = serde_json::to_string_pretty(entries)?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        if let Err(e) = std::fs::rename(&tmp_path, &path) {
            warn!("atomic rename failed ({e}), falling back to direct write");
            std::fs::write(&path, &json)?;
        }
        debug!(path = %path.display(), keys = entries.len(), "storage flushed");
        Ok(())
    }
}

fn scope_path(dir: &Path, scope: StorageScope) -> PathBuf {
    dir.join(format!("{}.json", scope.file_stem()))
}

fn read_scope_file(path: &Path) -> BTreeMap<String, String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), "failed to read storage file: {e}");
            return BTreeMap::new();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), "corrupt storage file, ignoring: {e}");
        BTreeMap::new()
    })
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str, scope: StorageScope) -> Option<String> {
        let scopes = self.scopes.read();
        let entries = scopes.get(&scope)?;
        entries
            .ephemeral
            .get(key)
            .or_else(|| entries.persistent.get(key))
            .cloned()
    }

    fn set(
        &self,
        key: &str,
        value: &str,
        scope: StorageScope,
        durability: Durability,
    ) -> Result<(), StorageError> {
        let mut scopes = self.scopes.write();
        let entries = scopes.entry(scope).or_default();
        match durability {
            Durability::Persistent => {
                entries.ephemeral.remove(key);
                entries.persistent.insert(key.to_string(), value.to_string());
                self.flush(scope, &entries.persistent)
            }
            Durability::Ephemeral => {
                entries.ephemeral.insert(key.to_string(), value.to_string());
                if entries.persistent.remove(key).is_some() {
                    self.flush(scope, &entries.persistent)?;
                }
                Ok(())
            }
        }
    }

    fn remove(&self, key: &str, scope: StorageScope) -> Result<(), StorageError> {
        let mut scopes = self.scopes.write();
        let entries = scopes.entry(scope).or_default();
        entries.ephemeral.remove(key);
        if entries.persistent.remove(key).is_some() {
            self.flush(scope, &entries.persistent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistent_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path());
        store
            .set("session", "{\"a\":1}", StorageScope::Application, Durability::Persistent)
            .unwrap();

        let reopened = FileStore::open(dir.path());
        assert_eq!(
            reopened.get("session", StorageScope::Application).as_deref(),
            Some("{\"a\":1}")
        );
        assert!(dir.path().join("application.json").exists());
    }

    #[test]
    fn ephemeral_values_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path());
        store
            .set("draft", "x", StorageScope::Workspace, Durability::Ephemeral)
            .unwrap();
        assert_eq!(store.get("draft", StorageScope::Workspace).as_deref(), Some("x"));

        let reopened = FileStore::open(dir.path());
        assert!(reopened.get("draft", StorageScope::Workspace).is_none());
    }

    #[test]
    fn remove_deletes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path());
        store
            .set("k", "v", StorageScope::Application, Durability::Persistent)
            .unwrap();
        store.remove("k", StorageScope::Application).unwrap();

        let reopened = FileStore::open(dir.path());
        assert!(reopened.get("k", StorageScope::Application).is_none());
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("application.json"), "not json").unwrap();

        let store = FileStore::open(dir.path());
        assert!(store.get("anything", StorageScope::Application).is_none());

        store
            .set("k", "v", StorageScope::Application, Durability::Persistent)
            .unwrap();
        assert_eq!(store.get("k", StorageScope::Application).as_deref(), Some("v"));
    }

    #[test]
    fn missing_directory_is_created_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested);
        store
            .set("k", "v", StorageScope::Workspace, Durability::Persistent)
            .unwrap();
        assert!(nested.join("workspace.json").exists());
        assert_eq!(store.dir(), nested.as_path());
    }
}
