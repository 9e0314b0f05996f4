//! In-memory storage implementation.

use super::{
    BoxFuture, ContentStore, StorageError, StorageResult, StoredContent, WhiteboardMeta, sort_newest_first,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory storage for testing and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, StoredContent>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Full record for a whiteboard, including its thumbnail.
    pub fn record(&self, id: &str) -> StorageResult<Option<StoredContent>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, HashMap<String, StoredContent>>> {
        self.records
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, HashMap<String, StoredContent>>> {
        self.records
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))
    }
}

impl ContentStore for MemoryStorage {
    fn create(&self, id: &str, name: Option<&str>) -> BoxFuture<'_, StorageResult<WhiteboardMeta>> {
        let record = StoredContent::create(id, name);
        Box::pin(async move {
            let mut records = self.write()?;
            if records.contains_key(&record.meta.id) {
                return Err(StorageError::AlreadyExists(record.meta.id));
            }
            let meta = record.meta.clone();
            records.insert(meta.id.clone(), record);
            Ok(meta)
        })
    }

    fn load_content(&self, id: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.record(&id)?.and_then(|record| record.content)) })
    }

    fn save_content(
        &self,
        id: &str,
        content: &str,
        thumbnail: Option<&str>,
    ) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let content = content.to_string();
        let thumbnail = thumbnail.map(str::to_string);
        Box::pin(async move {
            let mut records = self.write()?;
            let record = StoredContent::saved(records.remove(&id), &id, &content, thumbnail.as_deref());
            records.insert(id, record);
            Ok(())
        })
    }

    fn rename(&self, id: &str, name: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let name = name.to_string();
        Box::pin(async move {
            let mut records = self.write()?;
            let record = records.get_mut(&id).ok_or_else(|| StorageError::NotFound(id.clone()))?;
            record.rename(&name)
        })
    }

    fn delete_content(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.write()?.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<WhiteboardMeta>>> {
        Box::pin(async move {
            let mut metas: Vec<WhiteboardMeta> = self.read()?.values().map(|r| r.meta.clone()).collect();
            sort_newest_first(&mut metas);
            Ok(metas)
        })
    }
}
