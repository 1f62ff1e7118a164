//! Persistent storage for the paired device identity.

use crate::error::StoreError;
use crate::types::DeviceIdentity;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// JSON file holding the single device record.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the device identity.
    ///
    /// Returns `None` if the file doesn't exist yet.
    pub async fn load(&self) -> Result<Option<DeviceIdentity>, StoreError> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No device record at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let device: DeviceIdentity = serde_json::from_slice(&data)?;
        debug!(jid = %device.jid, "Loaded device record from {:?}", self.path);
        Ok(Some(device))
    }

    /// Save the device identity, replacing any previous record.
    pub async fn save(&self, device: &DeviceIdentity) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(device)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write atomically using temp file + rename
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!(jid = %device.jid, "Saved device record to {:?}", self.path);
        Ok(())
    }
}

/// Process-local store, used in tests and for throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    device: RwLock<Option<DeviceIdentity>>,
}

impl MemoryStore {
    pub async fn load(&self) -> Result<Option<DeviceIdentity>, StoreError> {
        Ok(self.device.read().await.clone())
    }

    pub async fn save(&self, device: &DeviceIdentity) -> Result<(), StoreError> {
        *self.device.write().await = Some(device.clone());
        Ok(())
    }
}

/// Device store backend.
pub enum Store {
    /// JSON file on disk
    File(FileStore),
    /// In-memory only (no persistence)
    Memory(MemoryStore),
}

impl Store {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Store::File(FileStore::new(path))
    }

    pub fn memory() -> Self {
        Store::Memory(MemoryStore::default())
    }

    /// In-memory store that already holds a paired device.
    pub fn memory_with(device: DeviceIdentity) -> Self {
        Store::Memory(MemoryStore {
            device: RwLock::new(Some(device)),
        })
    }

    /// Load the device identity, if one has been paired.
    pub async fn load(&self) -> Result<Option<DeviceIdentity>, StoreError> {
        match self {
            Store::File(s) => s.load().await,
            Store::Memory(s) => s.load().await,
        }
    }

    /// Save the device identity.
    pub async fn save(&self, device: &DeviceIdentity) -> Result<(), StoreError> {
        match self {
            Store::File(s) => s.save(device).await,
            Store::Memory(s) => s.save(device).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn device() -> DeviceIdentity {
        DeviceIdentity {
            jid: "15551234567.0:1@s.whatsapp.net".into(),
            session: "opaque-session".into(),
            paired_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_unpaired() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::file(dir.path().join("store.json"));

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_persists_device() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        Store::file(&path).save(&device()).await.unwrap();

        // A fresh handle sees the saved record
        let loaded = Store::file(&path).load().await.unwrap().unwrap();
        assert_eq!(loaded.jid, "15551234567.0:1@s.whatsapp.net");
        assert_eq!(loaded.session, "opaque-session");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, b"not json").unwrap();

        let result = Store::file(&path).load().await;
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_file_store_unreadable_path() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be
        let result = Store::file(dir.path()).load().await;
        assert!(matches!(result, Err(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = Store::memory();
        assert!(store.load().await.unwrap().is_none());

        store.save(&device()).await.unwrap();
        assert!(store.load().await.unwrap().is_some());

        let store = Store::memory_with(device());
        assert!(store.load().await.unwrap().is_some());
    }
}
