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

//! The file-system contract consumed by resource loading and the shader cache.
//!
//! Paths are URIs: forward-slash separated, relative to whatever root the
//! implementation chooses. Implementations live in `vesta-io`.

use std::fmt::Debug;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// How a stream is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Read an existing file from its start.
    Read,
    /// Create or truncate, then write.
    Write,
    /// Create if missing, then write at the end.
    Append,
    /// Read and write an existing file without truncating it.
    ReadWrite,
}

/// An open file.
///
/// Seeking uses [`SeekFrom`], whose `Start`, `Current` and `End` variants are
/// the usual SET/CUR/END origins.
pub trait FileStream: Read + Write + Seek + Send {
    /// The current position in the stream.
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    /// The total size of the stream in bytes. The position is preserved.
    fn size(&mut self) -> io::Result<u64> {
        let position = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        if position != end {
            self.seek(SeekFrom::Start(position))?;
        }
        Ok(end)
    }
}

impl<T: Read + Write + Seek + Send> FileStream for T {}

/// A source of files addressed by URI.
pub trait FileSystem: Send + Sync + Debug + 'static {
    /// Opens the file at `uri`.
    fn open(&self, uri: &str, mode: OpenMode) -> io::Result<Box<dyn FileStream>>;

    /// The last modification time of `uri`, in an implementation-defined
    /// monotonic unit (nanoseconds since the epoch for native files).
    fn mtime(&self, uri: &str) -> io::Result<u64>;

    /// Returns `true` if `uri` names an existing file.
    fn exists(&self, uri: &str) -> bool {
        self.mtime(uri).is_ok()
    }

    /// Flushes and closes a stream.
    fn close(&self, mut stream: Box<dyn FileStream>) -> io::Result<()> {
        stream.flush()
    }

    /// Reads the whole file at `uri`.
    fn read_all(&self, uri: &str) -> io::Result<Vec<u8>> {
        let mut stream = self.open(uri, OpenMode::Read)?;
        let mut bytes = Vec::with_capacity(stream.size()? as usize);
        stream.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Replaces the contents of `uri` with `bytes`.
    fn write_all(&self, uri: &str, bytes: &[u8]) -> io::Result<()> {
        let mut stream = self.open(uri, OpenMode::Write)?;
        stream.write_all(bytes)?;
        self.close(stream)
    }
}
