//! # Scene Watching
//!
//! [`start`] watches a scene file and sends a unit message on every change so
//! `--watch` can render again. The parent directory is watched and events are
//! filtered by file name, so a save that replaces the file is still seen.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use anyhow::{anyhow, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tracing::{debug, error, info};

/// Forwards change events for one file onto a channel.
struct SceneChangeHandler {
    file_name: Option<std::ffi::OsString>,
    changes: Sender<()>,
}

impl SceneChangeHandler {
    fn handle(&self, result: notify::Result<Event>) {
        match result {
            Ok(event) if is_relevant(&event) => {
                if event.paths.iter().any(|p| p.file_name() == self.file_name.as_deref()) {
                    debug!("Scene change: {:?}", event.kind);
                    // The receiver is gone once the render loop ends.
                    let _ = self.changes.send(());
                }
            }
            Ok(_) => {}
            Err(e) => error!("File watcher error: {e:?}"),
        }
    }
}

fn is_relevant(event: &Event) -> bool {
    event.kind.is_modify() || event.kind.is_create()
}

fn watch_dir(scene: &Path) -> PathBuf {
    match scene.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Starts watching `scene`. The returned watcher must be kept alive for
/// notifications to keep arriving.
pub fn start(scene: &Path, changes: Sender<()>) -> Result<RecommendedWatcher> {
    if !scene.is_file() {
        return Err(anyhow!("Scene file '{}' not found", scene.display()));
    }
    let handler =
        SceneChangeHandler { file_name: scene.file_name().map(ToOwned::to_owned), changes };
    let mut watcher = notify::recommended_watcher(move |result| handler.handle(result))
        .map_err(|e| anyhow!("Failed to create file watcher: {e}"))?;

    let dir = watch_dir(scene);
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| anyhow!("Failed to watch {}: {e}", dir.display()))?;
    info!("Watching {} for changes", scene.display());
    Ok(watcher)
}
