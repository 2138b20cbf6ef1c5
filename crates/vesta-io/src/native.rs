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
use crate::watcher::uri_for;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;
use vesta_core::vfs::{FileStream, FileSystem, OpenMode};

/// A [`FileSystem`] over a directory of the host file system.
///
/// URIs are resolved relative to the root. Absolute URIs and URIs that climb
/// out of the root with `..` are rejected.
#[derive(Debug, Clone)]
pub struct NativeFileSystem {
    root: PathBuf,
}

impl NativeFileSystem {
    /// Creates a file system rooted at `root`. The directory does not have to
    /// exist yet; it is created on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a URI to a host path under the root.
    pub fn resolve(&self, uri: &str) -> Result<PathBuf, VfsError> {
        let mut path = self.root.clone();
        for component in Path::new(uri).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(VfsError::OutsideRoot(uri.to_string()));
                }
            }
        }
        Ok(path)
    }

    /// Maps a host path back to a URI, if it lies under the root.
    pub fn uri_of(&self, path: &Path) -> Option<String> {
        uri_for(&self.root, path)
    }

    fn create_parent(path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

impl FileSystem for NativeFileSystem {
    fn open(&self, uri: &str, mode: OpenMode) -> io::Result<Box<dyn FileStream>> {
        let path = self.resolve(uri)?;
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Read => {
                options.read(true);
            }
            OpenMode::Write => {
                Self::create_parent(&path)?;
                options.write(true).create(true).truncate(true);
            }
            OpenMode::Append => {
                Self::create_parent(&path)?;
                options.append(true).create(true);
            }
            OpenMode::ReadWrite => {
                options.read(true).write(true);
            }
        }

        let file = options.open(&path).map_err(|source| {
            log::debug!("NativeFileSystem: Failed to open '{}' ({:?}): {}", uri, mode, source);
            source
        })?;
        Ok(Box::new(file))
    }

    fn mtime(&self, uri: &str) -> io::Result<u64> {
        let path = self.resolve(uri)?;
        let modified = fs::metadata(&path)?.modified()?;
        let since_epoch = modified.duration_since(UNIX_EPOCH).map_err(io::Error::other)?;
        Ok(since_epoch.as_nanos() as u64)
    }

    fn exists(&self, uri: &str) -> bool {
        self.resolve(uri).is_ok_and(|path| path.is_file())
    }

    fn close(&self, mut stream: Box<dyn FileStream>) -> io::Result<()> {
        stream.flush()?;
        // Dropping the box closes the handle.
        drop(stream);
        Ok(())
    }
}
