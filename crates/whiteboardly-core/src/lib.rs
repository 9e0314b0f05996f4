//! Whiteboardly Core Library
//!
//! Raster whiteboard engine: a pan/zoom transform, a drawing surface with
//! pen, eraser, shape and text tools, and bounded snapshot undo/redo.

pub mod camera;
pub mod config;
pub mod drawing;
pub mod error;
pub mod fonts;
pub mod history;
pub mod input;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod style;
pub mod surface;
pub mod tools;

pub use camera::{Camera, ZoomDirection};
pub use config::{ConfigError, EngineConfig};
pub use drawing::{DrawingEngine, ShapeGeometry};
pub use error::{EngineError, EngineResult};
pub use history::{DecodedRestore, History, PendingRestore, DEFAULT_MAX_HISTORY};
pub use input::{Key, KeyEvent, Modifiers, PointerEvent, ShortcutAction, ShortcutRegistry};
pub use session::WhiteboardSession;
pub use snapshot::{Snapshot, PNG_DATA_URL_PREFIX};
pub use storage::{
    AutoSaveManager, ContentStore, FallbackStorage, FileStorage, MemoryStorage, StorageError, StorageResult,
    StoredContent, WhiteboardMeta, new_whiteboard_id,
};
pub use style::{SerializableColor, StrokeStyle};
pub use surface::{Composite, Surface};
pub use tools::{Interaction, TextEditBox, ToolKind, ToolManager};
