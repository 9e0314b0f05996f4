//! Auto-save for whiteboard sessions.
//!
//! Opens sessions from a content store and writes them back periodically.

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::session::WhiteboardSession;
use crate::storage::{ContentStore, StorageError, StorageResult, WhiteboardMeta, new_whiteboard_id};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Loads and persists whiteboard sessions through a content store.
pub struct AutoSaveManager<S: ContentStore + ?Sized> {
    /// Storage backend.
    storage: Arc<S>,
    /// Auto-save interval.
    interval: Duration,
    /// Last save timestamp.
    last_save: Option<Instant>,
}

impl<S: ContentStore + ?Sized> AutoSaveManager<S> {
    /// Create a new auto-save manager with the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
        }
    }

    /// Set the auto-save interval.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Get the auto-save interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Open a whiteboard.
    ///
    /// Absent content gives a blank session. A failed load is logged and also
    /// gives a blank session.
    pub async fn open(&mut self, id: &str, config: EngineConfig) -> EngineResult<WhiteboardSession> {
        let content = match self.storage.load_content(id).await {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Failed to load whiteboard {}: {}", id, e);
                None
            }
        };
        if content.is_none() {
            log::info!("No saved content for {}, starting blank", id);
        }
        let session = WhiteboardSession::open(id, config, content.as_deref())?;
        self.last_save = Some(Instant::now());
        Ok(session)
    }

    /// Create an empty whiteboard and open a blank session for it.
    pub async fn create(
        &mut self,
        name: Option<&str>,
        config: EngineConfig,
    ) -> StorageResult<(WhiteboardMeta, WhiteboardSession)> {
        let meta = self.storage.create(&new_whiteboard_id(), name).await?;
        log::info!("Created whiteboard {} ({:?})", meta.id, meta.name);
        let session = WhiteboardSession::new(meta.id.clone(), config)
            .map_err(|e| StorageError::Other(e.to_string()))?;
        self.last_save = Some(Instant::now());
        Ok((meta, session))
    }

    /// Rename a whiteboard.
    pub async fn rename(&self, id: &str, name: &str) -> StorageResult<()> {
        self.storage.rename(id, name).await
    }

    /// Check if the session should be saved now.
    pub fn should_save(&self, session: &WhiteboardSession) -> bool {
        if !session.is_dirty() {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if requested (Ctrl+S) or if dirty and the interval elapsed.
    ///
    /// Failures are logged and reported as `false`; the session stays dirty
    /// so the next call retries.
    pub async fn maybe_save(&mut self, session: &mut WhiteboardSession) -> bool {
        let requested = session.take_save_request();
        if !requested && !self.should_save(session) {
            return false;
        }
        match self.save_now(session).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save whiteboard {}: {}", session.id(), e);
                false
            }
        }
    }

    /// Save the session immediately.
    pub async fn save_now(&mut self, session: &mut WhiteboardSession) -> StorageResult<()> {
        let content = session
            .current_serialized_surface()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let thumbnail = match session.thumbnail() {
            Ok(thumbnail) => Some(thumbnail),
            Err(e) => {
                log::warn!("Skipping thumbnail for {}: {}", session.id(), e);
                None
            }
        };

        self.storage
            .save_content(session.id(), &content, thumbnail.as_deref())
            .await?;

        self.last_save = Some(Instant::now());
        session.mark_saved();
        log::debug!("Saved whiteboard {}", session.id());
        Ok(())
    }

    /// Delete a whiteboard's content.
    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.storage.delete_content(id).await
    }

    /// Metadata for all saved whiteboards, newest first.
    pub async fn list(&self) -> StorageResult<Vec<WhiteboardMeta>> {
        self.storage.list().await
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{KeyEvent, PointerEvent};
    use crate::storage::{MemoryStorage, block_on};
    use kurbo::Point;

    fn config() -> EngineConfig {
        EngineConfig {
            surface_width: 64,
            surface_height: 32,
            thumbnail_width: 16,
            ..Default::default()
        }
    }

    fn scribble(session: &mut WhiteboardSession) {
        session
            .handle_pointer(PointerEvent::Down { position: Point::new(5.0, 5.0) })
            .unwrap();
        session
            .handle_pointer(PointerEvent::Move { position: Point::new(40.0, 20.0) })
            .unwrap();
        session.handle_pointer(PointerEvent::Leave).unwrap();
    }

    #[test]
    fn test_open_absent_is_blank() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        let session = block_on(manager.open("board", config())).unwrap();
        assert!(session.surface().is_blank());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_save_and_reopen() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage.clone());

        let mut session = block_on(manager.open("board", config())).unwrap();
        scribble(&mut session);
        block_on(manager.save_now(&mut session)).unwrap();
        assert!(!session.is_dirty());

        let record = storage.record("board").unwrap().unwrap();
        assert!(record.content.unwrap().starts_with("data:image/png;base64,"));
        assert!(record.meta.thumbnail.is_some());

        let reopened = block_on(manager.open("board", config())).unwrap();
        assert_eq!(reopened.surface().pixel(22, 12).unwrap().alpha(), 255);
        assert!(!reopened.can_undo());
    }

    #[test]
    fn test_maybe_save_respects_interval() {
        let mut manager = AutoSaveManager::new(Arc::new(MemoryStorage::new()));
        let mut session = block_on(manager.open("board", config())).unwrap();

        // Clean sessions are never saved.
        assert!(!block_on(manager.maybe_save(&mut session)));

        scribble(&mut session);
        // Opened just now, interval not elapsed.
        assert!(!block_on(manager.maybe_save(&mut session)));

        manager.set_interval(Duration::ZERO);
        assert!(block_on(manager.maybe_save(&mut session)));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_save_request_forces_save() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage.clone());
        let mut session = block_on(manager.open("board", config())).unwrap();

        session.handle_key(KeyEvent::ctrl('s')).unwrap();
        assert!(block_on(manager.maybe_save(&mut session)));
        assert!(storage.record("board").unwrap().is_some());
    }

    #[test]
    fn test_malformed_saved_content_opens_blank() {
        let storage = Arc::new(MemoryStorage::new());
        block_on(storage.save_content("board", "garbage", None)).unwrap();
        let mut manager = AutoSaveManager::new(storage);
        let session = block_on(manager.open("board", config())).unwrap();
        assert!(session.surface().is_blank());
    }

    #[test]
    fn test_create_rename_and_list() {
        let storage = Arc::new(MemoryStorage::new());
        let mut manager = AutoSaveManager::new(storage.clone());

        let (meta, mut session) = block_on(manager.create(Some("Kickoff"), config())).unwrap();
        assert_eq!(session.id(), meta.id);
        assert!(session.surface().is_blank());

        scribble(&mut session);
        block_on(manager.save_now(&mut session)).unwrap();
        block_on(manager.rename(&meta.id, "Kickoff notes")).unwrap();

        let listed = block_on(manager.list()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Kickoff notes");
        assert_eq!(listed[0].created_at, meta.created_at);
        assert!(listed[0].thumbnail.is_some());
    }
}
