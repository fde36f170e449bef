// History Store
// Durable record of past analyses, keyed by analysis id and scoped by owner

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{AnalysisRecord, NewAnalysisRecord, OwnerId};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const MAX_HISTORY_LIMIT: usize = 100;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to create history dir: {0}")]
    CreateDir(std::io::Error),
    #[error("failed to read history: {0}")]
    Read(std::io::Error),
    #[error("failed to write history: {0}")]
    Write(std::io::Error),
    #[error("history file is corrupt: {0}")]
    Corrupt(serde_json::Error),
    #[error("failed to serialize history: {0}")]
    Serialize(serde_json::Error),
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist a finished analysis. The store assigns id and timestamp.
    async fn insert(&self, record: NewAnalysisRecord) -> Result<AnalysisRecord, StoreError>;

    /// Most recent records of one owner, newest first.
    async fn list_recent(&self, owner: &OwnerId, limit: usize) -> Result<Vec<AnalysisRecord>, StoreError>;

    /// Delete one record of `owner`. Returns false when no such record exists.
    async fn delete(&self, owner: &OwnerId, id: Uuid) -> Result<bool, StoreError>;
}

fn newest_first(records: &[AnalysisRecord], owner: &OwnerId, limit: usize) -> Vec<AnalysisRecord> {
    let mut owned: Vec<AnalysisRecord> = records
        .iter()
        .filter(|r| &r.owner_id == owner)
        .cloned()
        .collect();
    // Reversed first so records sharing a timestamp still come out newest first.
    owned.reverse();
    owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    owned.truncate(limit);
    owned
}

fn remove_owned(records: &mut Vec<AnalysisRecord>, owner: &OwnerId, id: Uuid) -> bool {
    let before = records.len();
    records.retain(|r| !(r.id == id && &r.owner_id == owner));
    records.len() != before
}

/// Process-local store; contents are lost on restart.
#[derive(Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<AnalysisRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn insert(&self, record: NewAnalysisRecord) -> Result<AnalysisRecord, StoreError> {
        let stored = AnalysisRecord::create(record, chrono::Utc::now());
        self.records.lock().await.push(stored.clone());
        Ok(stored)
    }

    async fn list_recent(&self, owner: &OwnerId, limit: usize) -> Result<Vec<AnalysisRecord>, StoreError> {
        let records = self.records.lock().await;
        Ok(newest_first(&records, owner, limit))
    }

    async fn delete(&self, owner: &OwnerId, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.lock().await;
        Ok(remove_owned(&mut records, owner, id))
    }
}

/// Whole-file JSON store. Every write rewrites the file through a temp file + rename.
pub struct JsonFileHistoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path, lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<AnalysisRecord>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => serde_json::from_str(&content).map_err(StoreError::Corrupt),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::Read(e)),
        }
    }

    async fn write_all(&self, records: &[AnalysisRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(StoreError::CreateDir)?;
            }
        }

        let content = serde_json::to_string_pretty(records).map_err(StoreError::Serialize)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await.map_err(StoreError::Write)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(StoreError::Write)
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn insert(&self, record: NewAnalysisRecord) -> Result<AnalysisRecord, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        let stored = AnalysisRecord::create(record, chrono::Utc::now());
        records.push(stored.clone());
        self.write_all(&records).await?;
        Ok(stored)
    }

    async fn list_recent(&self, owner: &OwnerId, limit: usize) -> Result<Vec<AnalysisRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let records = self.read_all().await?;
        Ok(newest_first(&records, owner, limit))
    }

    async fn delete(&self, owner: &OwnerId, id: Uuid) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        let removed = remove_owned(&mut records, owner, id);
        if removed {
            self.write_all(&records).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HighlightSegment, SegmentKind};

    fn sample(owner: &str, text: &str) -> NewAnalysisRecord {
        NewAnalysisRecord {
            owner_id: OwnerId(owner.to_string()),
            text_content: text.to_string(),
            ai_score: 40,
            human_score: 60,
            plagiarism_score: 5,
            highlighted_text: vec![HighlightSegment::new(text, SegmentKind::Normal)],
        }
    }

    async fn exercise(store: &dyn HistoryStore) {
        let alice = OwnerId("alice".to_string());
        let bob = OwnerId("bob".to_string());

        let first = store.insert(sample("alice", "one")).await.unwrap();
        store.insert(sample("alice", "two")).await.unwrap();
        store.insert(sample("bob", "three")).await.unwrap();

        let listed = store.list_recent(&alice, DEFAULT_HISTORY_LIMIT).await.unwrap();
        let texts: Vec<_> = listed.iter().map(|r| r.text_content.as_str()).collect();
        assert_eq!(texts, vec!["two", "one"]);

        let limited = store.list_recent(&alice, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].text_content, "two");

        // Another owner cannot delete the record.
        assert!(!store.delete(&bob, first.id).await.unwrap());
        assert!(store.delete(&alice, first.id).await.unwrap());
        assert!(!store.delete(&alice, first.id).await.unwrap());

        let listed = store.list_recent(&alice, DEFAULT_HISTORY_LIMIT).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(store.list_recent(&bob, DEFAULT_HISTORY_LIMIT).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryHistoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_json_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("nested").join("history.json"));
        exercise(&store).await;

        // Survives reopening.
        let reopened = JsonFileHistoryStore::new(store.path().to_path_buf());
        let alice = OwnerId("alice".to_string());
        assert_eq!(reopened.list_recent(&alice, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_json_file_store_rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let row = serde_json::json!([{
            "id": "6f1c8a36-1c59-4b79-9a53-2d1f4f3f6a10",
            "owner_id": "alice",
            "text_content": "abc",
            "ai_score": 1,
            "human_score": 99,
            "plagiarism_score": 0,
            "highlighted_text": [],
            "created_at": "2026-01-01T00:00:00Z",
            "surprise": true
        }]);
        std::fs::write(&path, row.to_string()).unwrap();
        let store = JsonFileHistoryStore::new(path);
        let err = store
            .list_recent(&OwnerId("alice".to_string()), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
