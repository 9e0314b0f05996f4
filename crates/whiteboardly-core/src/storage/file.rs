//! File-based storage implementation.

use super::{
    BoxFuture, ContentStore, StorageError, StorageResult, StoredContent, WhiteboardMeta, sort_newest_first,
};
use std::fs;
use std::path::{Path, PathBuf};

/// File-based storage.
///
/// Stores one JSON record per whiteboard in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Base directory for whiteboard records.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(|e| StorageError::Io(format!("Failed to create storage directory: {}", e)))?;
        }
        Ok(Self { base_path })
    }

    /// Directory used when none is configured.
    ///
    /// On Unix: `~/.local/share/whiteboardly/whiteboards/`
    /// On Windows: `%LOCALAPPDATA%\whiteboardly\whiteboards\`
    pub fn default_dir() -> StorageResult<PathBuf> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Ok(base.join("whiteboardly").join("whiteboards"))
    }

    /// Create file storage in the default location.
    pub fn default_location() -> StorageResult<Self> {
        Self::new(Self::default_dir()?)
    }

    /// Get the file path for a whiteboard ID.
    fn record_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Full record for a whiteboard, including its thumbnail.
    pub fn record(&self, id: &str) -> StorageResult<Option<StoredContent>> {
        read_record(&self.record_path(id))
    }
}

fn read_record(path: &Path) -> StorageResult<Option<StoredContent>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e)))
}

fn write_record(path: &Path, record: &StoredContent) -> StorageResult<()> {
    let json = serde_json::to_string(record).map_err(|e| StorageError::Serialization(e.to_string()))?;
    fs::write(path, json).map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

impl ContentStore for FileStorage {
    fn create(&self, id: &str, name: Option<&str>) -> BoxFuture<'_, StorageResult<WhiteboardMeta>> {
        let record = StoredContent::create(id, name);
        let path = self.record_path(id);
        Box::pin(async move {
            if path.exists() {
                return Err(StorageError::AlreadyExists(record.meta.id));
            }
            write_record(&path, &record)?;
            Ok(record.meta)
        })
    }

    fn load_content(&self, id: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let path = self.record_path(id);
        Box::pin(async move { Ok(read_record(&path)?.and_then(|record| record.content)) })
    }

    fn save_content(
        &self,
        id: &str,
        content: &str,
        thumbnail: Option<&str>,
    ) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(id);
        let id = id.to_string();
        let content = content.to_string();
        let thumbnail = thumbnail.map(str::to_string);

        Box::pin(async move {
            // An unreadable previous record is replaced rather than blocking the save.
            let previous = match read_record(&path) {
                Ok(previous) => previous,
                Err(e) => {
                    log::warn!("Replacing unreadable record for {}: {}", id, e);
                    None
                }
            };
            let record = StoredContent::saved(previous, &id, &content, thumbnail.as_deref());
            write_record(&path, &record)
        })
    }

    fn rename(&self, id: &str, name: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(id);
        let id = id.to_string();
        let name = name.to_string();

        Box::pin(async move {
            let mut record = read_record(&path)?.ok_or(StorageError::NotFound(id))?;
            record.rename(&name)?;
            write_record(&path, &record)
        })
    }

    fn delete_content(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(id);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| StorageError::Io(format!("Failed to delete {}: {}", path.display(), e)))?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<WhiteboardMeta>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut metas = Vec::new();
            for path in entries.flatten().map(|entry| entry.path()) {
                if !path.extension().is_some_and(|e| e == "json") {
                    continue;
                }
                match read_record(&path) {
                    Ok(Some(record)) => metas.push(record.meta),
                    Ok(None) => {}
                    Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
                }
            }
            sort_newest_first(&mut metas);
            Ok(metas)
        })
    }
}
