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
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use vesta_core::renderer::{GraphicsDevice, ResourceError};
use vesta_core::utils::hash::{structural_hash_state, StructuralHashState};

/// A family of driver objects that can be cached by descriptor.
///
/// Implemented by marker types; the cache itself is generic.
pub trait CachedObject: 'static {
    /// Name used in logs.
    const NAME: &'static str;

    /// The full descriptor. Hashed to find a bucket and compared in full on
    /// every hit.
    type Key: Hash + Eq + Clone + fmt::Debug + Send + Sync;

    /// The opaque id returned by the device.
    type Id: Copy + Eq + fmt::Debug + Send + Sync;

    /// Builds the driver object.
    fn create(device: &dyn GraphicsDevice, key: &Self::Key) -> Result<Self::Id, ResourceError>;

    /// Destroys the driver object.
    fn destroy(device: &dyn GraphicsDevice, id: Self::Id) -> Result<(), ResourceError>;
}

/// Counters kept by every [`ObjectCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Fetches answered from the cache.
    pub hits: u64,
    /// Fetches that had to call the device.
    pub misses: u64,
    /// Objects successfully created and stored.
    pub inserts: u64,
    /// Misses whose hash matched an entry with a different key.
    pub collisions: u64,
    /// Misses whose device call failed. Nothing is stored for those.
    pub failures: u64,
}

/// One cached object along with the key it was built from.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, Id> {
    /// The structural hash of `key`.
    pub key_hash: u64,
    /// The driver object.
    pub object: Id,
    /// A snapshot of the descriptor, for full-equality checks.
    pub key: K,
}

/// Fetch-or-create cache of driver objects keyed by a structural hash of
/// their descriptor.
///
/// Entries sharing a hash live side by side in one bucket and are told apart
/// by full key comparison, so two different descriptors never share an object.
/// Objects returned by [`ObjectCache::fetch`] stay valid until the next
/// [`ObjectCache::clear`], which the caller must only run once the GPU is done
/// with them. Failed creations are not cached, so the next fetch retries.
pub struct ObjectCache<C: CachedObject, S = StructuralHashState> {
    device: Arc<dyn GraphicsDevice>,
    buckets: HashMap<u64, Vec<CacheEntry<C::Key, C::Id>>>,
    hash_state: S,
    len: usize,
    stats: CacheStats,
}

impl<C: CachedObject> ObjectCache<C> {
    /// Creates an empty cache hashing with the fixed structural hasher.
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self::with_hasher(device, structural_hash_state())
    }
}

impl<C: CachedObject, S> ObjectCache<C, S> {
    /// Creates an empty cache with a custom hasher.
    pub fn with_hasher(device: Arc<dyn GraphicsDevice>, hash_state: S) -> Self {
        Self {
            device,
            buckets: HashMap::new(),
            hash_state,
            len: 0,
            stats: CacheStats::default(),
        }
    }

    /// Number of cached objects.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Hit/miss counters since creation.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// The device objects are created on.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// Iterates over every cached entry, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry<C::Key, C::Id>> + '_ {
        self.buckets.values().flatten()
    }

    /// Destroys every cached object and empties the cache. Returns the number
    /// of objects destroyed.
    pub fn clear(&mut self) -> usize {
        let mut destroyed = 0;
        for (_, bucket) in self.buckets.drain() {
            for entry in bucket {
                match C::destroy(self.device.as_ref(), entry.object) {
                    Ok(()) => destroyed += 1,
                    Err(err) => log::error!(
                        "{}Cache: Failed to destroy {:?}: {}",
                        C::NAME,
                        entry.object,
                        err
                    ),
                }
            }
        }
        if self.len > 0 {
            log::info!("{}Cache: Cleared {} object(s)", C::NAME, self.len);
        }
        self.len = 0;
        destroyed
    }
}

impl<C: CachedObject, S: BuildHasher> ObjectCache<C, S> {
    /// Returns the object for `key`, creating it on a miss.
    pub fn fetch(&mut self, key: &C::Key) -> Result<C::Id, ResourceError> {
        self.fetch_with(key, |cached| cached == key, || key.clone())
    }

    /// Returns the cached object for `key` without creating it.
    pub fn get(&self, key: &C::Key) -> Option<C::Id> {
        let key_hash = self.hash_state.hash_one(key);
        self.buckets
            .get(&key_hash)?
            .iter()
            .find(|entry| &entry.key == key)
            .map(|entry| entry.object)
    }

    /// Returns `true` if an object is cached for `key`.
    pub fn contains(&self, key: &C::Key) -> bool {
        self.get(key).is_some()
    }

    /// Fetch-or-create where the caller supplies a borrowed lookup key.
    ///
    /// `lookup` must hash exactly like the key `build` produces, and `matches`
    /// must agree with `==` on that key. `build` only runs on a miss.
    pub(crate) fn fetch_with<Q: Hash + ?Sized>(
        &mut self,
        lookup: &Q,
        matches: impl Fn(&C::Key) -> bool,
        build: impl FnOnce() -> C::Key,
    ) -> Result<C::Id, ResourceError> {
        let key_hash = self.hash_state.hash_one(lookup);

        if let Some(bucket) = self.buckets.get(&key_hash) {
            if let Some(entry) = bucket.iter().find(|entry| matches(&entry.key)) {
                self.stats.hits += 1;
                return Ok(entry.object);
            }
            self.stats.collisions += 1;
            log::debug!(
                "{}Cache: Hash collision on {:#018x} ({} entries)",
                C::NAME,
                key_hash,
                bucket.len()
            );
        }

        self.stats.misses += 1;
        let key = build();
        match C::create(self.device.as_ref(), &key) {
            Ok(object) => {
                log::debug!("{}Cache: Created {:?}", C::NAME, object);
                self.stats.inserts += 1;
                self.len += 1;
                self.buckets.entry(key_hash).or_default().push(CacheEntry {
                    key_hash,
                    object,
                    key,
                });
                Ok(object)
            }
            Err(err) => {
                self.stats.failures += 1;
                log::warn!("{}Cache: Creation failed, nothing cached: {}", C::NAME, err);
                Err(err)
            }
        }
    }
}

impl<C: CachedObject, S> fmt::Debug for ObjectCache<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectCache")
            .field("kind", &C::NAME)
            .field("len", &self.len)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<C: CachedObject, S> Drop for ObjectCache<C, S> {
    fn drop(&mut self) {
        if self.len > 0 {
            log::debug!("{}Cache: Dropped with {} live object(s)", C::NAME, self.len);
            self.clear();
        }
    }
}
