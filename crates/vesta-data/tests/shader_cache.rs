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

use std::sync::Arc;
use vesta_core::renderer::api::ShaderStage;
use vesta_core::renderer::{ResourceError, ShaderError};
use vesta_core::vfs::FileSystem;
use vesta_data::ShaderCache;
use vesta_io::{MemoryFileSystem, NativeFileSystem};

const CACHE: &str = "cache/shaders.bin";

fn insert(cache: &mut ShaderCache, stage: ShaderStage, source: &str) -> u64 {
    let hash = cache.get_hash(stage, source.as_bytes());
    cache.insert(hash, stage, format!("il:{source}").into_bytes());
    hash
}

fn round_trip(fs: &dyn FileSystem) {
    let mut cache = ShaderCache::new();
    let vs = insert(&mut cache, ShaderStage::Vertex, "vs");
    let fs_hash = insert(&mut cache, ShaderStage::Fragment, "fs");
    assert_eq!(cache.flush(fs, CACHE).unwrap(), 2);
    assert_eq!(cache.pending_flush(), 0);

    let mut loaded = ShaderCache::new();
    assert_eq!(loaded.load(fs, CACHE).unwrap(), 2);
    for hash in [vs, fs_hash] {
        assert_eq!(loaded.get(hash), cache.get(hash));
    }
    assert_eq!(loaded.get(vs).unwrap().stage, ShaderStage::Vertex);
    assert_eq!(loaded.pending_flush(), 0);
}

#[test]
fn round_trip_in_memory() {
    round_trip(&MemoryFileSystem::new());
}

#[test]
fn round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    round_trip(&NativeFileSystem::new(dir.path()));
    assert!(dir.path().join(CACHE).is_file());
}

#[test]
fn unflushed_entries_are_absent_after_reload() {
    let fs = MemoryFileSystem::new();
    let mut cache = ShaderCache::new();
    let flushed = insert(&mut cache, ShaderStage::Vertex, "flushed");
    cache.flush(&fs, CACHE).unwrap();
    let late = insert(&mut cache, ShaderStage::Vertex, "late");

    let mut loaded = ShaderCache::new();
    loaded.load(&fs, CACHE).unwrap();
    assert!(loaded.contains(flushed));
    assert!(!loaded.contains(late));
}

#[test]
fn repeated_flushes_append_only_new_entries() {
    let fs = MemoryFileSystem::new();
    let mut cache = ShaderCache::new();
    insert(&mut cache, ShaderStage::Vertex, "one");
    assert_eq!(cache.flush(&fs, CACHE).unwrap(), 1);
    let after_first = fs.read_all(CACHE).unwrap().len();

    assert_eq!(cache.flush(&fs, CACHE).unwrap(), 0);
    assert_eq!(fs.read_all(CACHE).unwrap().len(), after_first);

    insert(&mut cache, ShaderStage::Compute, "two");
    assert_eq!(cache.flush(&fs, CACHE).unwrap(), 1);
    assert!(fs.read_all(CACHE).unwrap().len() > after_first);

    let mut loaded = ShaderCache::new();
    assert_eq!(loaded.load(&fs, CACHE).unwrap(), 2);
}

#[test]
fn missing_file_loads_nothing() {
    let mut cache = ShaderCache::new();
    assert_eq!(cache.load(&MemoryFileSystem::new(), CACHE).unwrap(), 0);
    assert!(cache.is_empty());
}

#[test]
fn wrong_header_is_corrupt() {
    let fs = MemoryFileSystem::new();
    fs.insert(CACHE, b"NOPE\x01\0\0\0".to_vec());
    let err = ShaderCache::new().load(&fs, CACHE).unwrap_err();
    assert!(matches!(
        err,
        ResourceError::Shader(ShaderError::CorruptCache { .. })
    ));
}

#[test]
fn truncated_tail_keeps_complete_records() {
    let fs = MemoryFileSystem::new();
    let mut cache = ShaderCache::new();
    let first = insert(&mut cache, ShaderStage::Vertex, "first");
    cache.flush(&fs, CACHE).unwrap();
    insert(&mut cache, ShaderStage::Vertex, "second with a longer body");
    cache.flush(&fs, CACHE).unwrap();

    let mut bytes = fs.read_all(CACHE).unwrap();
    bytes.truncate(bytes.len() - 4);
    fs.insert(CACHE, bytes);

    let mut loaded = ShaderCache::new();
    assert_eq!(loaded.load(&fs, CACHE).unwrap(), 1);
    assert!(loaded.contains(first));
}

#[test]
fn later_record_wins_after_reload() {
    let fs = MemoryFileSystem::new();
    let mut cache = ShaderCache::new();
    cache.insert(42, ShaderStage::Vertex, b"old".to_vec());
    cache.flush(&fs, CACHE).unwrap();
    cache.insert(42, ShaderStage::Vertex, b"new".to_vec());
    assert_eq!(cache.flush(&fs, CACHE).unwrap(), 1);

    let mut loaded = ShaderCache::new();
    assert_eq!(loaded.load(&fs, CACHE).unwrap(), 2);
    assert_eq!(loaded.len(), 1);
    assert_eq!(&loaded.get(42).unwrap().code[..], b"new");
}

#[test]
fn entries_compiled_in_process_survive_a_load() {
    let fs = MemoryFileSystem::new();
    let mut on_disk = ShaderCache::new();
    on_disk.insert(7, ShaderStage::Fragment, b"disk".to_vec());
    on_disk.flush(&fs, CACHE).unwrap();

    let mut cache = ShaderCache::new();
    cache.insert(7, ShaderStage::Fragment, b"fresh".to_vec());
    cache.load(&fs, CACHE).unwrap();
    assert_eq!(&cache.get(7).unwrap().code[..], b"fresh");
    assert_eq!(cache.pending_flush(), 1);
}

#[test]
fn damaged_tail_is_rewritten_by_the_next_flush() {
    let fs = MemoryFileSystem::new();
    let mut cache = ShaderCache::new();
    let first = insert(&mut cache, ShaderStage::Vertex, "first");
    cache.flush(&fs, CACHE).unwrap();
    let mut bytes = fs.read_all(CACHE).unwrap();
    bytes.extend_from_slice(&[0xff, 0xff]);
    fs.insert(CACHE, bytes);

    let mut reopened = ShaderCache::new();
    assert_eq!(reopened.load(&fs, CACHE).unwrap(), 1);
    assert!(reopened.has_damaged_tail(CACHE));
    let second = insert(&mut reopened, ShaderStage::Fragment, "second");
    assert_eq!(reopened.flush(&fs, CACHE).unwrap(), 2);
    assert!(!reopened.has_damaged_tail(CACHE));

    let mut loaded = ShaderCache::new();
    assert_eq!(loaded.load(&fs, CACHE).unwrap(), 2);
    assert!(loaded.contains(first));
    assert!(loaded.contains(second));
    assert!(!loaded.has_damaged_tail(CACHE));
}

#[test]
fn compact_rewrites_a_single_copy_of_each_entry() {
    let fs = Arc::new(MemoryFileSystem::new());
    let mut cache = ShaderCache::new();
    insert(&mut cache, ShaderStage::Vertex, "a");
    cache.flush(fs.as_ref(), CACHE).unwrap();

    // A second process compiles the same shader and appends it again.
    let mut other = ShaderCache::new();
    insert(&mut other, ShaderStage::Vertex, "a");
    other.flush(fs.as_ref(), CACHE).unwrap();
    let duplicated = fs.read_all(CACHE).unwrap().len();

    let mut loaded = ShaderCache::new();
    assert_eq!(loaded.load(fs.as_ref(), CACHE).unwrap(), 2);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.compact(fs.as_ref(), CACHE).unwrap(), 1);
    assert!(fs.read_all(CACHE).unwrap().len() < duplicated);
}

#[test]
fn clear_forgets_without_touching_disk() {
    let fs = MemoryFileSystem::new();
    let mut cache = ShaderCache::new();
    insert(&mut cache, ShaderStage::Vertex, "kept on disk");
    cache.flush(&fs, CACHE).unwrap();
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.load(&fs, CACHE).unwrap(), 1);
}
