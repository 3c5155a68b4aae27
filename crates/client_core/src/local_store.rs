use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{
    domain::{InspectionId, Session},
    inspection::{HistoryScope, InspectionDraft, SavedInspection, SavedRef},
};
use storage::Storage;

use crate::{InspectionStore, SessionStore};

/// SQLite-backed session and inspection persistence for offline use.
#[derive(Clone)]
pub struct LocalStore {
    storage: Storage,
}

impl LocalStore {
    pub async fn open(database_url: &str) -> Result<Self> {
        let storage = Storage::new(database_url)
            .await
            .with_context(|| format!("failed to open local store at '{database_url}'"))?;
        Ok(Self { storage })
    }

    pub fn from_storage(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub async fn load(&self, id: &InspectionId) -> Result<Option<SavedInspection>> {
        self.storage.load_inspection(id).await
    }
}

#[async_trait]
impl SessionStore for LocalStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.storage.read_value(key).await
    }

    async fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        self.storage.write_value(key, value).await
    }

    async fn clear(&self, key: &str) -> Result<()> {
        self.storage.delete_value(key).await
    }
}

#[async_trait]
impl InspectionStore for LocalStore {
    async fn insert(&self, draft: &InspectionDraft, saved_by: &Session) -> Result<SavedRef> {
        self.storage
            .insert_inspection(draft, &saved_by.id, saved_by.organization_owner())
            .await
    }

    async fn update(&self, id: &InspectionId, draft: &InspectionDraft) -> Result<()> {
        self.storage.update_inspection(id, draft).await
    }

    async fn list(&self, scope: &HistoryScope) -> Result<Vec<SavedInspection>> {
        self.storage.list_inspections(scope).await
    }
}

#[cfg(test)]
#[path = "tests/local_store_tests.rs"]
mod tests;
