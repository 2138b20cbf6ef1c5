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

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the file systems and the watcher.
#[derive(Debug, Error)]
pub enum VfsError {
    /// The URI is absolute or climbs out of the root with `..`.
    #[error("URI '{0}' escapes the file-system root")]
    OutsideRoot(String),
    /// No file exists at the URI.
    #[error("No file at '{0}'")]
    NotFound(String),
    /// A path could not be accessed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The platform watcher could not be set up.
    #[error("Failed to watch '{path}': {source}")]
    Watch {
        /// The directory being watched.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: notify::Error,
    },
}

impl From<VfsError> for io::Error {
    fn from(err: VfsError) -> Self {
        let kind = match &err {
            VfsError::OutsideRoot(_) => io::ErrorKind::PermissionDenied,
            VfsError::NotFound(_) => io::ErrorKind::NotFound,
            VfsError::Io { source, .. } => source.kind(),
            VfsError::Watch { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
