//! Hot reload of the mapping table.
//!
//! Only `mappings` take effect without a restart. The watcher reloads and
//! validates the file, then publishes the new [`MappingTable`] when it differs
//! from the one in service. Bursts of filesystem events, as editors produce
//! when saving, collapse into a single reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::loader::load_config;
use crate::config::schema::MappingTable;

/// Quiet period after the first event before the file is read.
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Watches the configuration file. Dropping it stops the reloads.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl ConfigWatcher {
    /// Start watching `path`. `current` is the table already in service.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        path: &Path,
        current: MappingTable,
    ) -> Result<(Self, mpsc::UnboundedReceiver<MappingTable>), notify::Error> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let _ = events_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            notify::Config::default(),
        )?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;

        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(reload_loop(path.to_path_buf(), current, events_rx, updates_tx));

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok((
            Self {
                _watcher: watcher,
                task,
            },
            updates_rx,
        ))
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn reload_loop(
    path: PathBuf,
    mut current: MappingTable,
    mut events: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<MappingTable>,
) {
    while events.recv().await.is_some() {
        tokio::time::sleep(DEBOUNCE).await;
        while events.try_recv().is_ok() {}

        match load_config(Some(&path)) {
            Ok(config) if config.mappings == current => {
                tracing::debug!(path = %path.display(), "Config changed, mapping table unchanged");
            }
            Ok(config) => {
                tracing::info!(
                    path = %path.display(),
                    routes = config.mappings.len(),
                    "Config file changed, publishing mapping table"
                );
                current = config.mappings.clone();
                if updates.send(config.mappings).is_err() {
                    break;
                }
            }
            Err(e) => tracing::error!(
                path = %path.display(),
                error = %e,
                "Failed to reload config, keeping current mapping table"
            ),
        }
    }
}
