//! Scan record storage

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use sentinel_core::domain::ScanRecord;

use crate::domain::ScanError;

/// Append-only scan record storage
#[async_trait]
pub trait ScanRepository: Send + Sync {
    async fn append(&self, record: ScanRecord) -> Result<(), ScanError>;

    /// All records for a repository, newest first
    async fn list(&self, repo_id: &str) -> Result<Vec<ScanRecord>, ScanError>;

    async fn get(&self, scan_id: Uuid) -> Result<Option<ScanRecord>, ScanError>;

    /// Drop all records for a repository
    async fn reset(&self, repo_id: &str) -> Result<(), ScanError>;
}

/// Process-local scan storage
#[derive(Default)]
pub struct InMemoryScanRepository {
    records: RwLock<HashMap<String, Vec<ScanRecord>>>,
}

impl InMemoryScanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScanRepository for InMemoryScanRepository {
    async fn append(&self, record: ScanRecord) -> Result<(), ScanError> {
        let mut records = self.records.write().await;
        records
            .entry(record.repo_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn list(&self, repo_id: &str) -> Result<Vec<ScanRecord>, ScanError> {
        let records = self.records.read().await;
        let mut matching = records.get(repo_id).cloned().unwrap_or_default();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn get(&self, scan_id: Uuid) -> Result<Option<ScanRecord>, ScanError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .flatten()
            .find(|r| r.scan_id == scan_id)
            .cloned())
    }

    async fn reset(&self, repo_id: &str) -> Result<(), ScanError> {
        let mut records = self.records.write().await;
        records.remove(repo_id);
        Ok(())
    }
}
