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

use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use vesta_core::vfs::{FileStream, FileSystem, OpenMode};

type Buffer = Arc<Mutex<Vec<u8>>>;

#[derive(Debug, Clone)]
struct MemoryFile {
    data: Buffer,
    mtime: u64,
}

/// An in-memory [`FileSystem`].
///
/// Used by tests and by tools that bundle their assets. Modification times
/// come from a counter that advances on every insert and every write-mode
/// open, so a rewrite is always observed as a change.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<HashMap<String, MemoryFile>>,
    clock: AtomicU64,
}

impl MemoryFileSystem {
    /// Creates an empty file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces the file at `uri`.
    pub fn insert(&self, uri: &str, bytes: impl Into<Vec<u8>>) {
        let file = MemoryFile {
            data: Arc::new(Mutex::new(bytes.into())),
            mtime: self.tick(),
        };
        self.files().insert(uri.to_string(), file);
    }

    /// Removes the file at `uri`. Returns `false` if there was none.
    pub fn remove(&self, uri: &str) -> bool {
        self.files().remove(uri).is_some()
    }

    /// A copy of the current contents of `uri`.
    pub fn contents(&self, uri: &str) -> Option<Vec<u8>> {
        let files = self.files();
        files.get(uri).map(|file| lock(&file.data).clone())
    }

    /// All URIs, sorted.
    pub fn uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.files().keys().cloned().collect();
        uris.sort();
        uris
    }

    /// The number of files.
    pub fn len(&self) -> usize {
        self.files().len()
    }

    /// Returns `true` if there are no files.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn files(&self) -> MutexGuard<'_, HashMap<String, MemoryFile>> {
        lock(&self.files)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn not_found(uri: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("No file at '{uri}'"))
}

impl FileSystem for MemoryFileSystem {
    fn open(&self, uri: &str, mode: OpenMode) -> io::Result<Box<dyn FileStream>> {
        let stream = match mode {
            OpenMode::Read => {
                let files = self.files();
                let file = files.get(uri).ok_or_else(|| not_found(uri))?;
                // Readers see a snapshot.
                let snapshot = lock(&file.data).clone();
                MemoryStream::new(Arc::new(Mutex::new(snapshot)), false, false)
            }
            OpenMode::Write => {
                let data: Buffer = Arc::default();
                let mtime = self.tick();
                self.files().insert(
                    uri.to_string(),
                    MemoryFile {
                        data: data.clone(),
                        mtime,
                    },
                );
                MemoryStream::new(data, true, false)
            }
            OpenMode::Append => {
                let mtime = self.tick();
                let mut files = self.files();
                let file = files.entry(uri.to_string()).or_insert_with(|| MemoryFile {
                    data: Arc::default(),
                    mtime,
                });
                file.mtime = mtime;
                MemoryStream::new(file.data.clone(), true, true)
            }
            OpenMode::ReadWrite => {
                let mtime = self.tick();
                let mut files = self.files();
                let file = files.get_mut(uri).ok_or_else(|| not_found(uri))?;
                file.mtime = mtime;
                MemoryStream::new(file.data.clone(), true, false)
            }
        };
        Ok(Box::new(stream))
    }

    fn mtime(&self, uri: &str) -> io::Result<u64> {
        self.files()
            .get(uri)
            .map(|file| file.mtime)
            .ok_or_else(|| not_found(uri))
    }

    fn exists(&self, uri: &str) -> bool {
        self.files().contains_key(uri)
    }
}

/// A stream over a shared buffer. Writes are visible to the file system
/// immediately.
struct MemoryStream {
    data: Buffer,
    position: u64,
    writable: bool,
    append: bool,
}

impl MemoryStream {
    fn new(data: Buffer, writable: bool, append: bool) -> Self {
        Self {
            data,
            position: 0,
            writable,
            append,
        }
    }
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = lock(&self.data);
        let start = (self.position as usize).min(data.len());
        let count = buf.len().min(data.len() - start);
        buf[..count].copy_from_slice(&data[start..start + count]);
        self.position += count as u64;
        Ok(count)
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "Stream was opened for reading",
            ));
        }
        let mut data = lock(&self.data);
        if self.append {
            self.position = data.len() as u64;
        }
        let start = self.position as usize;
        let end = start + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        self.position = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemoryStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = lock(&self.data).len() as i64;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::Current(delta) => self.position as i64 + delta,
            SeekFrom::End(delta) => len + delta,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Seek before the start of the stream",
            ));
        }
        self.position = target as u64;
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_read() {
        let fs = MemoryFileSystem::new();
        fs.insert("a.txt", "alpha");
        assert!(fs.exists("a.txt"));
        assert_eq!(fs.read_all("a.txt").unwrap(), b"alpha");
        assert_eq!(fs.uris(), vec!["a.txt".to_string()]);
        assert!(fs.remove("a.txt"));
        assert!(!fs.remove("a.txt"));
        assert!(fs.is_empty());
    }

    #[test]
    fn mtime_advances_on_every_write() {
        let fs = MemoryFileSystem::new();
        fs.insert("a.txt", "one");
        let first = fs.mtime("a.txt").unwrap();
        fs.write_all("a.txt", b"two").unwrap();
        let second = fs.mtime("a.txt").unwrap();
        assert!(second > first);
        assert_eq!(fs.contents("a.txt").unwrap(), b"two");
    }

    #[test]
    fn append_creates_and_extends() {
        let fs = MemoryFileSystem::new();
        let mut stream = fs.open("log", OpenMode::Append).unwrap();
        stream.write_all(b"ab").unwrap();
        stream.seek(SeekFrom::Start(0)).unwrap();
        stream.write_all(b"cd").unwrap();
        fs.close(stream).unwrap();
        assert_eq!(fs.contents("log").unwrap(), b"abcd");
    }

    #[test]
    fn read_streams_are_snapshots_and_read_only() {
        let fs = MemoryFileSystem::new();
        fs.insert("a", "12345");
        let mut stream = fs.open("a", OpenMode::Read).unwrap();
        fs.insert("a", "changed");
        assert_eq!(stream.size().unwrap(), 5);
        let err = stream.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        let mut text = String::new();
        stream.read_to_string(&mut text).unwrap();
        assert_eq!(text, "12345");
    }

    #[test]
    fn read_write_patches_in_place() {
        let fs = MemoryFileSystem::new();
        fs.insert("a", "hello");
        let mut stream = fs.open("a", OpenMode::ReadWrite).unwrap();
        stream.seek(SeekFrom::End(-1)).unwrap();
        stream.write_all(b"!").unwrap();
        assert_eq!(stream.tell().unwrap(), 5);
        assert!(stream.seek(SeekFrom::Current(-10)).is_err());
        assert_eq!(fs.contents("a").unwrap(), b"hell!");
        assert!(fs.open("missing", OpenMode::ReadWrite).is_err());
    }
}
