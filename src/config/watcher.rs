//! Configuration file watcher for hot reload.
//!
//! # Design Decisions
//! - Only configs that load and validate are forwarded
//! - A rejected file keeps the running configuration in place
//! - The returned `RecommendedWatcher` must be kept alive by the caller

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RouterConfig;

/// Start watching `path`; validated configs arrive on the returned receiver.
pub fn watch_config(
    path: &Path,
) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<RouterConfig>), notify::Error> {
    let (tx, rx) = mpsc::unbounded_channel();
    let watched: PathBuf = path.to_path_buf();
    let reload_path = watched.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                reload(&reload_path, &tx);
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Config watch error"),
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    )?;

    watcher.watch(&watched, RecursiveMode::NonRecursive)?;
    tracing::info!(path = %watched.display(), "Config watcher started");
    Ok((watcher, rx))
}

fn reload(path: &Path, tx: &mpsc::UnboundedSender<RouterConfig>) {
    tracing::info!(path = %path.display(), "Config file change detected, reloading");
    match load_config(path) {
        Ok(config) => {
            if tx.send(config).is_err() {
                tracing::debug!("Config receiver dropped, ignoring reload");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_forwards_only_valid_configs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.toml");
        let (tx, mut rx) = mpsc::unbounded_channel();

        std::fs::write(&path, "[segments]\ndefault_group = \"web\"\n").unwrap();
        reload(&path, &tx);
        assert_eq!(rx.try_recv().unwrap().segments.default_group, "web");

        std::fs::write(&path, "[[contexts]]\nid = 0\nschema = \"x\"\n").unwrap();
        reload(&path, &tx);
        assert!(rx.try_recv().is_err());
    }
}
