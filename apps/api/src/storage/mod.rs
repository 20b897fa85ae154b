//! Snapshot persistence.
//!
//! The whole engine state serializes as one JSON document. `JsonFileStore`
//! writes it atomically (temp file in the same directory, then rename) so a
//! crash mid-save never leaves a half-written snapshot behind. `MemoryStore`
//! backs tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::models::chat::ChatMessage;
use crate::models::session::InterviewSession;

/// Everything the engine needs to survive a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub sessions: Vec<InterviewSession>,
    #[serde(default)]
    pub chat_log: HashMap<Uuid, Vec<ChatMessage>>,
    pub active_session_id: Option<Uuid>,
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self) -> Result<StoreSnapshot>;
    async fn save(&self, snapshot: &StoreSnapshot) -> Result<()>;
}

// ──────────────────────────────────────────────
// JSON file store
// ──────────────────────────────────────────────

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    /// A missing file is a fresh install and loads as the empty snapshot.
    /// A file that exists but does not parse is an error: silently starting
    /// over would discard every recorded interview.
    async fn load(&self) -> Result<StoreSnapshot> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No snapshot at {}, starting empty", self.path.display());
                return Ok(StoreSnapshot::default());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Failed to read snapshot file: {}", self.path.display())
                });
            }
        };

        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse snapshot file: {}", self.path.display()))
    }

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;
        let path = self.path.clone();
        let dir = self.parent_dir();

        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, json.as_bytes()))
            .await
            .context("Snapshot writer task panicked")?
    }
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(bytes).context("Failed to write snapshot")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to persist snapshot to {}", path.display()))?;

    Ok(())
}

// ──────────────────────────────────────────────
// In-memory store
// ──────────────────────────────────────────────

/// Store that keeps the snapshot in memory. Used by engine tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            inner: Mutex::new(snapshot),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load(&self) -> Result<StoreSnapshot> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        Ok(guard.clone())
    }

    async fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        *guard = snapshot.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::CandidateInfo;

    fn sample_snapshot() -> StoreSnapshot {
        let candidate = CandidateInfo::new(
            Some("Jane Doe".to_string()),
            Some("jane@example.com".to_string()),
            Some("+1 415 555 0199".to_string()),
        );
        let session = InterviewSession::new(candidate);
        let messages = vec![
            ChatMessage::system("Resume uploaded successfully. Let me verify your information."),
            ChatMessage::user("hello"),
        ];

        StoreSnapshot {
            active_session_id: Some(session.id),
            chat_log: HashMap::from([(session.id, messages)]),
            sessions: vec![session],
        }
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("sessions.json"));

        let snapshot = sample_snapshot();
        store.save(&snapshot).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));

        let loaded = store.load().await.unwrap();
        assert!(loaded.sessions.is_empty());
        assert!(loaded.active_session_id.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(path);
        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("sessions.json");

        let store = JsonFileStore::new(path.clone());
        store.save(&StoreSnapshot::default()).await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let snapshot = sample_snapshot();

        store.save(&snapshot).await.unwrap();
        assert_eq!(store.load().await.unwrap(), snapshot);
    }
}
