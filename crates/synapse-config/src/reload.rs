//! Live config reload.
//!
//! Watches the settings file with `notify` and calls
//! [`Settings::reload`] after a 500ms quiet period, so editors that save
//! with write + rename trigger a single reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use synapse_common::ConfigError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::settings::Settings;

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Background task that keeps [`Settings`] in sync with its file.
pub struct ReloadManager;

impl ReloadManager {
    /// Start watching the settings file. The returned task runs until
    /// it is aborted or the watcher stops delivering events.
    pub fn spawn(settings: Arc<Settings>) -> Result<JoinHandle<()>, ConfigError> {
        let path = settings
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| ConfigError::WatchError("settings have no backing file".into()))?;

        let (watcher, change_rx) = watch_file(&path)?;
        info!("watching config file {}", path.display());

        Ok(tokio::spawn(async move {
            // Dropping the watcher stops event delivery.
            let _watcher = watcher;
            run_reload_loop(settings, change_rx).await;
        }))
    }
}

/// Create a watcher on the file's parent directory that signals when
/// the file itself is created or modified.
fn watch_file(path: &Path) -> Result<(RecommendedWatcher, mpsc::Receiver<()>), ConfigError> {
    let dir: PathBuf = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();

    let (tx, rx) = mpsc::channel::<()>(16);

    let mut watcher = RecommendedWatcher::new(
        move |result: Result<Event, notify::Error>| match result {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                let ours = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n == file_name).unwrap_or(false));
                if ours {
                    debug!("config file change detected");
                    let _ = tx.try_send(());
                }
            }
            Err(e) => error!("file watcher error: {e}"),
        },
        notify::Config::default(),
    )
    .map_err(|e| ConfigError::WatchError(format!("failed to create watcher: {e}")))?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| ConfigError::WatchError(format!("failed to watch {}: {e}", dir.display())))?;

    Ok((watcher, rx))
}

async fn run_reload_loop(settings: Arc<Settings>, mut change_rx: mpsc::Receiver<()>) {
    while change_rx.recv().await.is_some() {
        // Coalesce bursts: restart the quiet period on every new signal.
        loop {
            tokio::select! {
                _ = tokio::time::sleep(DEBOUNCE) => break,
                msg = change_rx.recv() => {
                    if msg.is_none() {
                        return;
                    }
                }
            }
        }

        match settings.reload() {
            Ok(()) => debug!("config reload applied"),
            Err(e) => warn!("config reload failed, keeping previous settings: {e}"),
        }
    }
    info!("config watcher channel closed");
}
