//! Application configuration and the replay run.

use crate::cli::CliArgs;
use crate::script::Script;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use whiteboardly_core::{
    AutoSaveManager, ConfigError, ContentStore, EngineConfig, EngineError, FallbackStorage, FileStorage,
    StorageError, WhiteboardMeta, WhiteboardSession,
};

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Failed to read script {path}: {message}")]
    Script { path: PathBuf, message: String },
    #[error("Failed to write {path}: {message}")]
    Export { path: PathBuf, message: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Board to open; `None` creates a new one.
    pub whiteboard_id: Option<String>,
    /// Name for a new board, or new name for the opened one.
    pub name: Option<String>,
    pub storage_dir: PathBuf,
    pub fallback_dir: Option<PathBuf>,
    pub script: Option<PathBuf>,
    pub export: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Build a configuration for a whiteboard stored under `storage_dir`.
    pub fn new(whiteboard_id: impl Into<String>, storage_dir: PathBuf) -> Self {
        Self {
            whiteboard_id: Some(whiteboard_id.into()),
            name: None,
            storage_dir,
            fallback_dir: None,
            script: None,
            export: None,
            engine: EngineConfig::default(),
        }
    }

    /// Resolve command-line arguments, filling in defaults.
    pub fn from_args(args: CliArgs) -> Result<Self, AppError> {
        let storage_dir = match args.storage_dir {
            Some(dir) => dir,
            None => FileStorage::default_dir()?,
        };
        let engine = match &args.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        engine.validate()?;

        Ok(Self {
            whiteboard_id: args.board,
            name: args.name,
            storage_dir,
            fallback_dir: args.fallback_dir,
            script: args.script,
            export: args.export,
            engine,
        })
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub whiteboard_id: String,
    pub name: Option<String>,
    pub steps: usize,
    pub failed_steps: usize,
    pub history_len: usize,
    pub saved: bool,
}

/// The headless application.
pub struct App {
    config: AppConfig,
}

impl App {
    /// Create a new application with custom configuration.
    pub fn with_config(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn open_storage(&self) -> Result<Arc<dyn ContentStore>, AppError> {
        let primary = FileStorage::new(self.config.storage_dir.clone())?;
        let store: Arc<dyn ContentStore> = match &self.config.fallback_dir {
            Some(dir) => {
                let local = FileStorage::new(dir.clone())?;
                Arc::new(FallbackStorage::new(primary, local))
            }
            None => Arc::new(primary),
        };
        Ok(store)
    }

    /// Open the whiteboard, replay the script, save and export.
    pub async fn run(&self) -> Result<RunSummary, AppError> {
        let script = match &self.config.script {
            Some(path) => load_script(path)?,
            None => Script::default(),
        };

        let mut manager = AutoSaveManager::new(self.open_storage()?);
        let mut session = self.open_session(&mut manager).await?;

        let mut failed_steps = 0;
        let mut saved = false;
        for (index, step) in script.steps.iter().enumerate() {
            if let Err(e) = step.apply(&mut session) {
                log::warn!("Step {} ({:?}) failed: {}", index, step, e);
                failed_steps += 1;
            }
            saved |= manager.maybe_save(&mut session).await;
        }

        if let Err(e) = session.finalize_interaction() {
            log::warn!("Could not finish the last interaction: {}", e);
        }
        if session.is_dirty() {
            manager.save_now(&mut session).await?;
            saved = true;
        }

        if let Some(path) = &self.config.export {
            let png = session.export_png()?;
            std::fs::write(path, png).map_err(|e| AppError::Export {
                path: path.clone(),
                message: e.to_string(),
            })?;
            log::info!("Exported {} to {}", session.id(), path.display());
        }

        let name = manager
            .list()
            .await?
            .into_iter()
            .find(|meta| meta.id == session.id())
            .map(|meta| meta.name);

        Ok(RunSummary {
            whiteboard_id: session.id().to_string(),
            name,
            steps: script.len(),
            failed_steps,
            history_len: session.history().len(),
            saved,
        })
    }
}

impl App {
    /// Saved whiteboards, newest first.
    pub async fn list(&self) -> Result<Vec<WhiteboardMeta>, AppError> {
        Ok(self.open_storage()?.list().await?)
    }

    async fn open_session(
        &self,
        manager: &mut AutoSaveManager<dyn ContentStore>,
    ) -> Result<WhiteboardSession, AppError> {
        let engine = self.config.engine.clone();
        let Some(id) = &self.config.whiteboard_id else {
            let (_, session) = manager.create(self.config.name.as_deref(), engine).await?;
            return Ok(session);
        };

        let session = manager.open(id, engine).await?;
        if let Some(name) = &self.config.name {
            match manager.rename(id, name).await {
                Ok(()) => log::info!("Renamed {} to {:?}", id, name),
                Err(StorageError::NotFound(_)) => {
                    manager.storage().create(id, Some(name)).await?;
                    log::info!("Created {} as {:?}", id, name);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(session)
    }
}

fn load_script(path: &Path) -> Result<Script, AppError> {
    let script_error = |message: String| AppError::Script {
        path: path.to_path_buf(),
        message,
    };
    let json = std::fs::read_to_string(path).map_err(|e| script_error(e.to_string()))?;
    Script::from_json(&json).map_err(|e| script_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use whiteboardly_core::{Snapshot, StoredContent};

    const STROKE: &str = r#"[
        { "op": "pointer", "event": { "type": "down", "position": { "x": 5.0, "y": 8.0 } } },
        { "op": "pointer", "event": { "type": "move", "position": { "x": 40.0, "y": 8.0 } } },
        { "op": "pointer", "event": { "type": "leave" } }
    ]"#;

    fn small_engine() -> EngineConfig {
        EngineConfig {
            surface_width: 48,
            surface_height: 24,
            thumbnail_width: 12,
            ..Default::default()
        }
    }

    fn read_record(dir: &Path, id: &str) -> StoredContent {
        let json = std::fs::read_to_string(dir.join(format!("{}.json", id))).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_run_without_script_saves_nothing() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::new("empty", dir.path().to_path_buf());
        config.engine = small_engine();

        let summary = pollster::block_on(App::with_config(config).run()).unwrap();
        assert_eq!(summary.steps, 0);
        assert_eq!(summary.history_len, 1);
        assert!(!summary.saved);
        assert!(!dir.path().join("empty.json").exists());
    }

    #[test]
    fn test_run_script_saves_and_exports() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("steps.json");
        std::fs::write(&script, STROKE).unwrap();
        let export = dir.path().join("out.png");

        let mut config = AppConfig::new("board", dir.path().join("boards"));
        config.engine = small_engine();
        config.script = Some(script);
        config.export = Some(export.clone());

        let summary = pollster::block_on(App::with_config(config.clone()).run()).unwrap();
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.failed_steps, 0);
        assert_eq!(summary.history_len, 2);
        assert!(summary.saved);

        let record = read_record(&dir.path().join("boards"), "board");
        let snapshot = Snapshot::from_data_url(record.content.as_deref().unwrap()).unwrap();
        assert_eq!(snapshot.width(), 48);
        assert!(record.meta.thumbnail.is_some());

        let png = std::fs::read(&export).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        // A second run starts from the saved content with fresh history.
        config.script = None;
        config.export = None;
        let summary = pollster::block_on(App::with_config(config).run()).unwrap();
        assert_eq!(summary.history_len, 1);
        assert!(!summary.saved);
    }

    #[test]
    fn test_fallback_dir_receives_copy() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("steps.json");
        std::fs::write(&script, STROKE).unwrap();

        let mut config = AppConfig::new("board", dir.path().join("primary"));
        config.engine = small_engine();
        config.fallback_dir = Some(dir.path().join("local"));
        config.script = Some(script);

        pollster::block_on(App::with_config(config).run()).unwrap();
        let primary = read_record(&dir.path().join("primary"), "board");
        let local = read_record(&dir.path().join("local"), "board");
        assert_eq!(primary.content, local.content);
    }

    #[test]
    fn test_failed_steps_are_counted() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("steps.json");
        std::fs::write(&script, r#"[{ "op": "resize", "width": 0, "height": 10 }]"#).unwrap();

        let mut config = AppConfig::new("board", dir.path().to_path_buf());
        config.engine = small_engine();
        config.script = Some(script);

        let summary = pollster::block_on(App::with_config(config).run()).unwrap();
        assert_eq!(summary.failed_steps, 1);
    }

    #[test]
    fn test_missing_script_is_an_error() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::new("board", dir.path().to_path_buf());
        config.script = Some(dir.path().join("missing.json"));
        let result = pollster::block_on(App::with_config(config).run());
        assert!(matches!(result, Err(AppError::Script { .. })));
    }

    #[test]
    fn test_from_args_defaults() {
        let dir = tempdir().unwrap();
        let args = CliArgs {
            storage_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let config = AppConfig::from_args(args).unwrap();
        assert!(config.whiteboard_id.is_none());
        assert!(config.name.is_none());
        assert_eq!(config.engine.max_history, 20);
    }

    #[test]
    fn test_from_args_rejects_bad_engine_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "min_scale": 4.0, "max_scale": 2.0 }"#).unwrap();
        let args = CliArgs {
            storage_dir: Some(dir.path().to_path_buf()),
            config: Some(path),
            ..Default::default()
        };
        assert!(matches!(AppConfig::from_args(args), Err(AppError::Config(_))));
    }

    #[test]
    fn test_new_board_is_created_with_name() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("steps.json");
        std::fs::write(&script, STROKE).unwrap();

        let mut config = AppConfig::new("unused", dir.path().join("boards"));
        config.whiteboard_id = None;
        config.name = Some("Design review".to_string());
        config.engine = small_engine();
        config.script = Some(script);

        let app = App::with_config(config);
        let summary = pollster::block_on(app.run()).unwrap();
        assert_eq!(summary.whiteboard_id.len(), 36);
        assert_eq!(summary.name.as_deref(), Some("Design review"));

        let listed = pollster::block_on(app.list()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, summary.whiteboard_id);
        assert!(listed[0].thumbnail.is_some());
    }

    #[test]
    fn test_name_renames_existing_board() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("steps.json");
        std::fs::write(&script, STROKE).unwrap();

        let mut config = AppConfig::new("board", dir.path().join("boards"));
        config.engine = small_engine();
        config.script = Some(script);
        pollster::block_on(App::with_config(config.clone()).run()).unwrap();

        config.script = None;
        config.name = Some("Renamed".to_string());
        let summary = pollster::block_on(App::with_config(config).run()).unwrap();
        assert_eq!(summary.name.as_deref(), Some("Renamed"));
        let record = read_record(&dir.path().join("boards"), "board");
        assert_eq!(record.meta.name, "Renamed");
        assert!(record.content.is_some());
    }

    #[test]
    fn test_name_creates_unsaved_board() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::new("fresh", dir.path().to_path_buf());
        config.engine = small_engine();
        config.name = Some("Later".to_string());

        let summary = pollster::block_on(App::with_config(config).run()).unwrap();
        assert_eq!(summary.name.as_deref(), Some("Later"));
        assert!(!summary.saved);
        assert!(read_record(dir.path(), "fresh").content.is_none());
    }
}
