//! The store collaborator contract and its implementations.
//!
//! The engine only knows `load` and `save` over the whole roster document.
//! What sits behind that (a file, a server, browser storage) is the
//! embedder's concern.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use practicum::roster::Roster;

/// Error types for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence contract for the full practicum state.
///
/// On a `save` failure the caller must not assume the mutation was durably
/// applied; the in-memory state is allowed to run ahead until the next
/// successful save.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<Roster, StoreError>;
    async fn save(&self, roster: &Roster) -> Result<(), StoreError>;
}

/// Stores the roster as one pretty-printed JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load(&self) -> Result<Roster, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no state file, starting empty");
            return Ok(Roster::default());
        }
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn save(&self, roster: &Roster) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(roster)?;
        tokio::fs::write(&self.path, raw).await?;
        debug!(path = %self.path.display(), students = roster.students.len(), "state saved");
        Ok(())
    }
}

/// In-memory store, mainly for tests and ephemeral sessions.
///
/// Saves can be made to fail on demand to exercise the persistence-error
/// paths.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<Roster>,
    fail_saves: AtomicBool,
    saves_before_failure: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(roster: Roster) -> Self {
        Self {
            state: RwLock::new(roster),
            ..Default::default()
        }
    }

    /// Make subsequent saves fail.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Let the next `n` saves succeed, then fail the rest.
    pub fn fail_after(&self, n: u32) {
        self.saves_before_failure.store(n, Ordering::SeqCst);
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    /// The last successfully saved state.
    pub async fn saved_state(&self) -> Roster {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<Roster, StoreError> {
        Ok(self.state.read().await.clone())
    }

    async fn save(&self, roster: &Roster) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            let remaining = self.saves_before_failure.load(Ordering::SeqCst);
            if remaining == 0 {
                return Err(StoreError::Unavailable("save disabled".to_string()));
            }
            self.saves_before_failure.store(remaining - 1, Ordering::SeqCst);
        }
        *self.state.write().await = roster.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use practicum::types::PracticumSettings;

    #[tokio::test]
    async fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));

        let mut roster = Roster::default();
        roster.register("Nakasaki", PracticumSettings::default());
        store.save(&roster).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.students.len(), 1);
        assert_eq!(loaded.students[0].name, "Nakasaki");
    }

    #[tokio::test]
    async fn file_store_loads_empty_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert!(store.load().await.unwrap().students.is_empty());
    }

    #[tokio::test]
    async fn memory_store_can_fail_saves() {
        let store = MemoryStore::new();
        store.set_fail_saves(true);

        let mut roster = Roster::default();
        roster.register("Nakasaki", PracticumSettings::default());

        assert!(store.save(&roster).await.is_err());
        assert!(store.saved_state().await.students.is_empty());
    }

    #[tokio::test]
    async fn memory_store_fail_after_spares_the_first_saves() {
        let store = MemoryStore::new();
        store.fail_after(1);

        let roster = Roster::default();
        assert!(store.save(&roster).await.is_ok());
        assert!(store.save(&roster).await.is_err());
    }
}
