//! JsonFileStateStore - 1 ファイルの JSON レコード
//!
//! 書き込みは隣の `*.tmp` に書いてから rename するので、途中で失敗しても
//! 既存のレコードは壊れません。

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{AttemptState, StoreError};
use crate::ports::StateStore;

/// JsonFileStateStore は `path` の JSON ファイルにレコードを保存する
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn load(&self) -> Result<Option<AttemptState>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let state = serde_json::from_slice(&bytes)?;
        Ok(Some(state))
    }

    async fn save(&self, state: &AttemptState) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(state)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), attempts = state.attempts, "state saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::domain::ResourceId;

    fn sample_state() -> AttemptState {
        let mut state = AttemptState::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        state.attempts = 7;
        state
    }

    #[tokio::test]
    async fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("state.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_returns_same_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStateStore::new(dir.path().join("nested").join("state.json"));

        let mut state = sample_state();
        state.mark_succeeded(state.started_at, &ResourceId::new("ocid1.instance.abc"));
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, state);
        assert!(!store.tmp_path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serde_error_and_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = JsonFileStateStore::new(&path);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::Serde(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"{ not json");
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonFileStateStore::new(&path);
        store.save(&sample_state()).await.unwrap();

        // A directory squatting on the tmp path makes the write fail.
        std::fs::create_dir(store.tmp_path()).unwrap();
        let mut next = sample_state();
        next.attempts = 8;
        assert!(store.save(&next).await.is_err());

        assert_eq!(store.load().await.unwrap().unwrap().attempts, 7);
    }
}
