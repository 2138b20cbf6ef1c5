// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::error::VfsError;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Watches a directory tree and reports the URIs of files that were created
/// or modified.
///
/// Events are forwarded from the platform watcher thread through a channel
/// and drained by [`poll`](Self::poll) on the caller's thread, usually once
/// per frame before the resource manager's reload check.
pub struct HotReloadWatcher {
    root: PathBuf,
    receiver: Receiver<PathBuf>,
    // Keeps the platform watcher alive.
    _watcher: RecommendedWatcher,
}

impl HotReloadWatcher {
    /// Starts watching `root` recursively.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, VfsError> {
        let root = root
            .as_ref()
            .canonicalize()
            .map_err(|source| VfsError::Io {
                path: root.as_ref().to_path_buf(),
                source,
            })?;

        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        for path in event.paths {
                            if sender.send(path).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(err) => log::warn!("HotReloadWatcher: Watch error: {}", err),
            }
        })
        .map_err(|source| VfsError::Watch {
            path: root.clone(),
            source,
        })?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|source| VfsError::Watch {
                path: root.clone(),
                source,
            })?;
        log::info!("HotReloadWatcher: Watching '{}'", root.display());

        Ok(Self {
            root,
            receiver,
            _watcher: watcher,
        })
    }

    /// The canonical root being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drains pending events without blocking. Each changed URI is reported
    /// once, in the order it was first seen.
    pub fn poll(&self) -> Vec<String> {
        let mut uris = Vec::new();
        for path in self.receiver.try_iter() {
            self.push_uri(&mut uris, &path);
        }
        uris
    }

    /// Blocks up to `timeout` for the first event, then drains the rest.
    pub fn wait(&self, timeout: Duration) -> Vec<String> {
        let mut uris = Vec::new();
        match self.receiver.recv_timeout(timeout) {
            Ok(path) => self.push_uri(&mut uris, &path),
            Err(RecvTimeoutError::Timeout) => return uris,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("HotReloadWatcher: Event channel disconnected");
                return uris;
            }
        }
        for path in self.receiver.try_iter() {
            self.push_uri(&mut uris, &path);
        }
        uris
    }

    fn push_uri(&self, uris: &mut Vec<String>, path: &Path) {
        if let Some(uri) = uri_for(&self.root, path) {
            if !uris.contains(&uri) {
                log::debug!("HotReloadWatcher: '{}' changed", uri);
                uris.push(uri);
            }
        }
    }
}

impl std::fmt::Debug for HotReloadWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotReloadWatcher")
            .field("root", &self.root)
            .field("pending", &self.receiver.len())
            .finish()
    }
}

/// Converts a host path under `root` into a forward-slash URI.
///
/// Returns `None` for paths outside the root and for the root itself.
pub fn uri_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_for_uses_forward_slashes() {
        let root = Path::new("/assets");
        assert_eq!(
            uri_for(root, &root.join("textures").join("brick.png")).as_deref(),
            Some("textures/brick.png")
        );
        assert_eq!(uri_for(root, root), None);
        assert_eq!(uri_for(root, Path::new("/other/brick.png")), None);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = HotReloadWatcher::new(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, VfsError::Io { .. }));
    }
}
