//! Storage abstraction for whiteboards.
//!
//! Each whiteboard is a record keyed by ID: a name, creation and update
//! times, an optional thumbnail, and the serialized surface (a PNG data URL).

mod autosave;
mod fallback;
mod file;
mod memory;

pub use autosave::{AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS};
pub use fallback::FallbackStorage;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Whiteboard not found: {0}")]
    NotFound(String),
    #[error("Whiteboard already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid whiteboard name: {0:?}")]
    InvalidName(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Name given to a whiteboard created without one.
pub fn default_whiteboard_name(created_at: u64) -> String {
    format!("Whiteboard {}", created_at)
}

/// Listing entry for a whiteboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhiteboardMeta {
    pub id: String,
    pub name: String,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: u64,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub updated_at: u64,
    /// Reduced preview as a PNG data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Newest first, ties broken by ID.
pub fn sort_newest_first(metas: &mut [WhiteboardMeta]) {
    metas.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
}

/// One saved whiteboard: its metadata plus the serialized surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContent {
    #[serde(flatten)]
    pub meta: WhiteboardMeta,
    /// Serialized surface as a PNG data URL; `None` until the first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl StoredContent {
    /// A new, empty whiteboard.
    ///
    /// A blank or missing name gets [`default_whiteboard_name`].
    pub fn create(id: impl Into<String>, name: Option<&str>) -> Self {
        let now = unix_now();
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_whiteboard_name(now),
        };
        Self {
            meta: WhiteboardMeta {
                id: id.into(),
                name,
                created_at: now,
                updated_at: now,
                thumbnail: None,
            },
            content: None,
        }
    }

    /// The record after saving new content, keeping name and creation time.
    ///
    /// Saving to an unknown ID creates the record.
    pub fn saved(previous: Option<Self>, id: &str, content: &str, thumbnail: Option<&str>) -> Self {
        let mut record = previous.unwrap_or_else(|| Self::create(id, None));
        record.meta.updated_at = unix_now().max(record.meta.created_at);
        record.meta.thumbnail = thumbnail.map(str::to_string);
        record.content = Some(content.to_string());
        record
    }

    /// Give the record a new name. Blank names are rejected.
    pub fn rename(&mut self, name: &str) -> StorageResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        self.meta.name = name.to_string();
        self.meta.updated_at = unix_now().max(self.meta.created_at);
        Ok(())
    }
}

/// Generate an ID for a new whiteboard.
pub fn new_whiteboard_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Trait for whiteboard content backends.
///
/// `load_content` returns `Ok(None)` when nothing has been saved for the ID;
/// a session opened from that starts blank.
pub trait ContentStore: Send + Sync {
    /// Create an empty whiteboard. Fails if the ID is taken.
    ///
    /// IDs come from [`new_whiteboard_id`].
    fn create(&self, id: &str, name: Option<&str>) -> BoxFuture<'_, StorageResult<WhiteboardMeta>>;

    /// Load the serialized surface for a whiteboard.
    fn load_content(&self, id: &str) -> BoxFuture<'_, StorageResult<Option<String>>>;

    /// Save the serialized surface and thumbnail for a whiteboard.
    ///
    /// Creates the whiteboard if the ID is unknown.
    fn save_content(
        &self,
        id: &str,
        content: &str,
        thumbnail: Option<&str>,
    ) -> BoxFuture<'_, StorageResult<()>>;

    /// Rename a whiteboard.
    fn rename(&self, id: &str, name: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Delete a whiteboard and its content.
    fn delete_content(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Metadata for every stored whiteboard, newest first.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<WhiteboardMeta>>>;
}

/// Minimal executor for driving storage futures in tests.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
