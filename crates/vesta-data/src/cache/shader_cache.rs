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

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use vesta_core::renderer::api::{shader_source_hash, ShaderIl, ShaderStage};
use vesta_core::renderer::{ResourceError, ShaderError};
use vesta_core::vfs::{FileSystem, OpenMode};

const MAGIC: &[u8; 4] = b"VSHC";
const VERSION: u32 = 1;
const HEADER_LEN: usize = MAGIC.len() + std::mem::size_of::<u32>();

/// One persisted compilation result.
#[derive(Serialize, Deserialize)]
struct ShaderRecord {
    hash: u64,
    stage: ShaderStage,
    il: Vec<u8>,
}

#[derive(Debug)]
struct Entry {
    il: ShaderIl,
    flushed: bool,
}

/// A persistent map from shader source hash to compiled IL.
///
/// The on-disk file is a 4-byte magic and a little-endian `u32` version,
/// followed by bincode-encoded records. It is append-only: [`ShaderCache::flush`]
/// writes only the entries added since the last load or flush. When the same
/// hash appears twice, the later record wins.
///
/// A file whose tail does not decode is remembered as damaged. The next
/// flush to it rewrites the whole file instead of appending past the garbage.
#[derive(Debug, Default)]
pub struct ShaderCache {
    entries: HashMap<u64, Entry>,
    damaged: Option<String>,
}

impl ShaderCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The key under which the IL of `source` compiled for `stage` is stored.
    pub fn get_hash(&self, stage: ShaderStage, source: &[u8]) -> u64 {
        shader_source_hash(stage, source)
    }

    /// The cached IL for `hash`. Cloning shares the code bytes.
    pub fn get(&self, hash: u64) -> Option<ShaderIl> {
        self.entries.get(&hash).map(|entry| entry.il.clone())
    }

    /// Returns `true` if `hash` is cached.
    pub fn contains(&self, hash: u64) -> bool {
        self.entries.contains_key(&hash)
    }

    /// Stores freshly compiled IL and returns it. The entry is written by the
    /// next [`ShaderCache::flush`].
    pub fn insert(&mut self, hash: u64, stage: ShaderStage, code: impl Into<Arc<[u8]>>) -> ShaderIl {
        let il = ShaderIl::new(stage, code);
        self.entries.insert(
            hash,
            Entry {
                il: il.clone(),
                flushed: false,
            },
        );
        il
    }

    /// Every cached entry, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &ShaderIl)> + '_ {
        self.entries.iter().map(|(hash, entry)| (*hash, &entry.il))
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries not yet written to disk.
    pub fn pending_flush(&self) -> usize {
        self.entries.values().filter(|entry| !entry.flushed).count()
    }

    /// Returns `true` if the last load of `uri` stopped at a tail that did not
    /// decode and the file has not been rewritten since.
    pub fn has_damaged_tail(&self, uri: &str) -> bool {
        self.damaged.as_deref() == Some(uri)
    }

    /// Forgets every entry. The file on disk is untouched.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Reads the cache file at `uri` and merges its records. Returns the
    /// number of records read.
    ///
    /// A missing file is not an error. A file with a wrong header is
    /// [`ShaderError::CorruptCache`]. A truncated tail (an interrupted flush)
    /// is logged, the records before it are kept and the file is marked for
    /// rewriting (see [`ShaderCache::has_damaged_tail`]). Among duplicate
    /// records the last one wins. Entries compiled in this process are never
    /// overwritten by the file.
    pub fn load(&mut self, fs: &dyn FileSystem, uri: &str) -> Result<usize, ResourceError> {
        if !fs.exists(uri) {
            log::info!("ShaderCache: No cache at '{}', starting empty", uri);
            return Ok(0);
        }
        let bytes = fs.read_all(uri).map_err(|e| ResourceError::io(uri, e))?;
        let mut body = check_header(&bytes).map_err(|details| ShaderError::CorruptCache {
            uri: uri.to_string(),
            details,
        })?;

        let config = bincode::config::standard();
        let mut records: HashMap<u64, ShaderRecord> = HashMap::new();
        let mut loaded = 0;
        while !body.is_empty() {
            match bincode::serde::decode_from_slice::<ShaderRecord, _>(body, config) {
                Ok((record, read)) => {
                    body = &body[read..];
                    records.insert(record.hash, record);
                    loaded += 1;
                }
                Err(err) => {
                    log::warn!(
                        "ShaderCache: Ignoring {} trailing byte(s) of '{}', it will be rewritten: {}",
                        body.len(),
                        uri,
                        err
                    );
                    self.damaged = Some(uri.to_string());
                    break;
                }
            }
        }

        for (hash, record) in records {
            self.entries.entry(hash).or_insert(Entry {
                il: ShaderIl::new(record.stage, record.il),
                flushed: true,
            });
        }

        log::info!("ShaderCache: Loaded {} shader(s) from '{}'", loaded, uri);
        Ok(loaded)
    }

    /// Appends every pending entry to the cache file at `uri`, creating it if
    /// needed. Returns the number of records written.
    ///
    /// A file with a damaged tail is compacted instead, since records
    /// appended after the tail could never be read back.
    pub fn flush(&mut self, fs: &dyn FileSystem, uri: &str) -> Result<usize, ResourceError> {
        if self.has_damaged_tail(uri) {
            return self.compact(fs, uri);
        }

        let mut pending: Vec<u64> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.flushed)
            .map(|(hash, _)| *hash)
            .collect();
        if pending.is_empty() {
            return Ok(0);
        }
        pending.sort_unstable();

        let fresh_file = !fs.exists(uri);
        let mut out = Vec::new();
        if fresh_file {
            out.extend_from_slice(&header());
        }
        for hash in &pending {
            if let Some(entry) = self.entries.get(hash) {
                out.extend(encode_record(*hash, &entry.il, uri)?);
            }
        }

        let mode = if fresh_file {
            OpenMode::Write
        } else {
            OpenMode::Append
        };
        let mut stream = fs.open(uri, mode).map_err(|e| ResourceError::io(uri, e))?;
        stream.write_all(&out).map_err(|e| ResourceError::io(uri, e))?;
        fs.close(stream).map_err(|e| ResourceError::io(uri, e))?;

        for hash in &pending {
            if let Some(entry) = self.entries.get_mut(hash) {
                entry.flushed = true;
            }
        }
        log::info!("ShaderCache: Flushed {} shader(s) to '{}'", pending.len(), uri);
        Ok(pending.len())
    }

    /// Rewrites the cache file at `uri` with every entry, dropping the
    /// duplicates an append-only file accumulates. Returns the number of
    /// records written.
    pub fn compact(&mut self, fs: &dyn FileSystem, uri: &str) -> Result<usize, ResourceError> {
        let mut hashes: Vec<u64> = self.entries.keys().copied().collect();
        hashes.sort_unstable();

        let mut out = header().to_vec();
        for hash in &hashes {
            if let Some(entry) = self.entries.get(hash) {
                out.extend(encode_record(*hash, &entry.il, uri)?);
            }
        }
        fs.write_all(uri, &out).map_err(|e| ResourceError::io(uri, e))?;

        for entry in self.entries.values_mut() {
            entry.flushed = true;
        }
        if self.has_damaged_tail(uri) {
            self.damaged = None;
        }
        log::info!("ShaderCache: Compacted '{}' to {} shader(s)", uri, hashes.len());
        Ok(hashes.len())
    }
}

fn header() -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[..MAGIC.len()].copy_from_slice(MAGIC);
    header[MAGIC.len()..].copy_from_slice(&VERSION.to_le_bytes());
    header
}

fn check_header(bytes: &[u8]) -> Result<&[u8], String> {
    if bytes.len() < HEADER_LEN {
        return Err(format!("file is {} byte(s), shorter than the header", bytes.len()));
    }
    let (head, body) = bytes.split_at(HEADER_LEN);
    if &head[..MAGIC.len()] != MAGIC {
        return Err("bad magic".to_string());
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&head[MAGIC.len()..]);
    let version = u32::from_le_bytes(version);
    if version != VERSION {
        return Err(format!("unsupported version {version}, expected {VERSION}"));
    }
    Ok(body)
}

fn encode_record(hash: u64, il: &ShaderIl, uri: &str) -> Result<Vec<u8>, ResourceError> {
    let record = ShaderRecord {
        hash,
        stage: il.stage,
        il: il.code.to_vec(),
    };
    bincode::serde::encode_to_vec(&record, bincode::config::standard()).map_err(|e| {
        ResourceError::from(ShaderError::CorruptCache {
            uri: uri.to_string(),
            details: e.to_string(),
        })
    })
}
