//! Primary store with a local fallback copy.

use super::{BoxFuture, ContentStore, StorageResult, WhiteboardMeta, sort_newest_first};
use std::collections::HashMap;

/// Writes every save to a local store as well as the primary, and reads from
/// the local copy when the primary fails or has nothing.
#[derive(Debug)]
pub struct FallbackStorage<P, L> {
    primary: P,
    local: L,
}

impl<P: ContentStore, L: ContentStore> FallbackStorage<P, L> {
    pub fn new(primary: P, local: L) -> Self {
        Self { primary, local }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn local(&self) -> &L {
        &self.local
    }
}

impl<P: ContentStore, L: ContentStore> ContentStore for FallbackStorage<P, L> {
    fn create(&self, id: &str, name: Option<&str>) -> BoxFuture<'_, StorageResult<WhiteboardMeta>> {
        let id = id.to_string();
        let name = name.map(str::to_string);
        Box::pin(async move {
            let local = self.local.create(&id, name.as_deref()).await;
            if let Err(e) = &local {
                log::warn!("Local create of {} failed: {}", id, e);
            }

            match self.primary.create(&id, name.as_deref()).await {
                Ok(meta) => Ok(meta),
                Err(e) => match local {
                    Ok(meta) => {
                        log::warn!("Primary create of {} failed, kept local copy: {}", id, e);
                        Ok(meta)
                    }
                    Err(_) => Err(e),
                },
            }
        })
    }

    fn load_content(&self, id: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let id = id.to_string();
        Box::pin(async move {
            match self.primary.load_content(&id).await {
                Ok(Some(content)) => return Ok(Some(content)),
                Ok(None) => {}
                Err(e) => log::warn!("Primary load of {} failed, using local copy: {}", id, e),
            }
            self.local.load_content(&id).await
        })
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
            let local = self
                .local
                .save_content(&id, &content, thumbnail.as_deref())
                .await;
            if let Err(e) = &local {
                log::warn!("Local save of {} failed: {}", id, e);
            }

            match self.primary.save_content(&id, &content, thumbnail.as_deref()).await {
                Ok(()) => Ok(()),
                Err(e) if local.is_ok() => {
                    log::warn!("Primary save of {} failed, kept local copy: {}", id, e);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        })
    }

    fn rename(&self, id: &str, name: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let name = name.to_string();
        Box::pin(async move {
            let local = self.local.rename(&id, &name).await;
            match self.primary.rename(&id, &name).await {
                Ok(()) => Ok(()),
                Err(e) if local.is_ok() => {
                    log::warn!("Primary rename of {} failed, kept local copy: {}", id, e);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        })
    }

    fn delete_content(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            if let Err(e) = self.local.delete_content(&id).await {
                log::warn!("Local delete of {} failed: {}", id, e);
            }
            self.primary.delete_content(&id).await
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<WhiteboardMeta>>> {
        Box::pin(async move {
            let primary = match self.primary.list().await {
                Ok(metas) => metas,
                Err(e) => {
                    log::warn!("Primary list failed, using local copy: {}", e);
                    Vec::new()
                }
            };

            // One entry per ID; the more recently updated copy wins.
            let mut merged: HashMap<String, WhiteboardMeta> = HashMap::new();
            for meta in primary.into_iter().chain(self.local.list().await?) {
                match merged.get(&meta.id) {
                    Some(existing) if existing.updated_at >= meta.updated_at => {}
                    _ => {
                        merged.insert(meta.id.clone(), meta);
                    }
                }
            }
            let mut metas: Vec<WhiteboardMeta> = merged.into_values().collect();
            sort_newest_first(&mut metas);
            Ok(metas)
        })
    }
}
