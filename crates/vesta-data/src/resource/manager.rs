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

use super::handle_table::{HandleTable, Release};
use super::traits::Resource;
use crate::cache::ShaderCache;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use vesta_core::renderer::{GraphicsDevice, ResourceError, ShaderCompiler};
use vesta_core::resource::{Handle, ResourceMetadata};
use vesta_core::vfs::FileSystem;

const DEFAULT_INITIAL_SLOTS: usize = 64;

/// Per-type storage: the slot table, the URI index used for load dedup and
/// the reverse index from dependency URIs to the resources that read them.
struct TypeStorage<T> {
    table: HandleTable<T>,
    by_uri: HashMap<String, Handle<T>>,
    by_dependency: HashMap<String, Vec<Handle<T>>>,
}

impl<T> TypeStorage<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            table: HandleTable::with_capacity(capacity),
            by_uri: HashMap::new(),
            by_dependency: HashMap::new(),
        }
    }

    fn forget_dependencies(&mut self, handle: Handle<T>) {
        self.by_dependency.retain(|_, dependents| {
            dependents.retain(|dependent| *dependent != handle);
            !dependents.is_empty()
        });
    }
}

type ReloadUriFn = fn(&mut ResourceManager, &str) -> usize;
type DestroyAllFn = fn(&mut ResourceManager) -> usize;
type LiveCountFn = fn(&ResourceManager) -> usize;

/// Type-erased entry points of one registered resource type.
#[derive(Clone, Copy)]
struct Registration {
    type_name: &'static str,
    reload_uri: ReloadUriFn,
    destroy_all: DestroyAllFn,
    live_count: LiveCountFn,
}

/// The single authority that creates, looks up, reloads and destroys every
/// resource type.
///
/// One [`HandleTable`] is kept per resource type, created on first use. The
/// order in which types are first stored is remembered; [`ResourceManager::shutdown`]
/// walks it backwards so that resources holding handles to other resources
/// (materials to textures, for instance) go first.
///
/// The manager is single-threaded by contract: wrap it in a lock if it has to
/// be shared. File access is synchronous.
pub struct ResourceManager {
    tables: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    registrations: Vec<Registration>,
    device: Arc<dyn GraphicsDevice>,
    file_system: Arc<dyn FileSystem>,
    shader_compiler: Option<Arc<dyn ShaderCompiler>>,
    shader_cache: ShaderCache,
    initial_slots: usize,
    // Set while tables are drained; payloads may then release handles that
    // were already freed.
    shutting_down: bool,
}

impl fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for registration in &self.registrations {
            map.entry(&registration.type_name, &(registration.live_count)(self));
        }
        map.finish()
    }
}

impl ResourceManager {
    /// Creates a manager over a device and a file system.
    pub fn new(device: Arc<dyn GraphicsDevice>, file_system: Arc<dyn FileSystem>) -> Self {
        Self {
            tables: HashMap::new(),
            registrations: Vec::new(),
            device,
            file_system,
            shader_compiler: None,
            shader_cache: ShaderCache::new(),
            initial_slots: DEFAULT_INITIAL_SLOTS,
            shutting_down: false,
        }
    }

    /// Sets the compiler used to turn shader source into IL.
    pub fn with_shader_compiler(mut self, compiler: Arc<dyn ShaderCompiler>) -> Self {
        self.shader_compiler = Some(compiler);
        self
    }

    /// Sets the number of slots reserved when a type's table is created.
    pub fn with_initial_slots(mut self, initial_slots: usize) -> Self {
        self.initial_slots = initial_slots;
        self
    }

    /// The device every resource creates its driver objects on.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// The file system resources are loaded from.
    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    /// The shader compiler, if one was configured.
    pub fn shader_compiler(&self) -> Option<&Arc<dyn ShaderCompiler>> {
        self.shader_compiler.as_ref()
    }

    /// The compiled-shader cache shared by all shader resources.
    pub fn shader_cache(&self) -> &ShaderCache {
        &self.shader_cache
    }

    /// Mutable access to the compiled-shader cache.
    pub fn shader_cache_mut(&mut self) -> &mut ShaderCache {
        &mut self.shader_cache
    }

    // --- Registration ---

    /// Registers `T` explicitly. Types are also registered on first store, so
    /// this only matters to pin the shutdown order. Idempotent.
    pub fn register<T: Resource>(&mut self) {
        let type_id = TypeId::of::<T>();
        if self.tables.contains_key(&type_id) {
            return;
        }
        self.tables.insert(
            type_id,
            Box::new(TypeStorage::<T>::with_capacity(self.initial_slots)),
        );
        self.registrations.push(Registration {
            type_name: T::TYPE_NAME,
            reload_uri: reload_uri_of::<T>,
            destroy_all: destroy_all_of::<T>,
            live_count: live_count_of::<T>,
        });
        log::debug!("ResourceManager: Registered resource type '{}'", T::TYPE_NAME);
    }

    /// Returns `true` once `T` has a table.
    pub fn is_registered<T: Resource>(&self) -> bool {
        self.tables.contains_key(&TypeId::of::<T>())
    }

    /// Names of the registered types, in registration order.
    pub fn registered_types(&self) -> Vec<&'static str> {
        self.registrations.iter().map(|r| r.type_name).collect()
    }

    fn storage<T: Resource>(&self) -> Option<&TypeStorage<T>> {
        self.tables
            .get(&TypeId::of::<T>())
            .and_then(|storage| storage.downcast_ref::<TypeStorage<T>>())
    }

    fn storage_mut<T: Resource>(&mut self) -> Option<&mut TypeStorage<T>> {
        self.tables
            .get_mut(&TypeId::of::<T>())
            .and_then(|storage| storage.downcast_mut::<TypeStorage<T>>())
    }

    fn registered_storage<T: Resource>(&mut self) -> Result<&mut TypeStorage<T>, ResourceError> {
        self.register::<T>();
        self.storage_mut::<T>().ok_or_else(|| {
            ResourceError::BackendError(format!("Mismatched storage for '{}'", T::TYPE_NAME))
        })
    }

    // --- Creation ---

    /// Creates a resource from in-memory arguments. Always allocates a new
    /// slot; procedural resources are never deduplicated.
    pub fn create<T: Resource>(&mut self, info: T::CreateInfo) -> Result<Handle<T>, ResourceError> {
        let resource = T::create(self, info)?;
        let handle = self
            .registered_storage::<T>()?
            .table
            .allocate(resource, ResourceMetadata::procedural());
        log::debug!("ResourceManager: Created {} {:?}", T::TYPE_NAME, handle);
        Ok(handle)
    }

    /// Creates a resource from an encoded blob already in memory. Like
    /// [`ResourceManager::create`], the result is not tied to any URI.
    pub fn load_from_memory<T: Resource>(
        &mut self,
        bytes: &[u8],
        label: &str,
    ) -> Result<Handle<T>, ResourceError> {
        let resource = T::load_from_memory(self, bytes, label)?;
        let metadata = ResourceMetadata {
            content_hash: resource.source_hash(bytes),
            ..ResourceMetadata::procedural()
        };
        let handle = self.registered_storage::<T>()?.table.allocate(resource, metadata);
        log::debug!(
            "ResourceManager: Created {} {:?} from '{}' in memory",
            T::TYPE_NAME,
            handle,
            label
        );
        Ok(handle)
    }

    /// Loads the resource at `uri`.
    ///
    /// If a live resource of the same type was already loaded from `uri`, its
    /// reference count is incremented and the same handle is returned without
    /// touching the file system. Dedup is by path, not by content.
    pub fn load<T: Resource>(&mut self, uri: &str) -> Result<Handle<T>, ResourceError> {
        if let Some(storage) = self.storage_mut::<T>() {
            if let Some(&handle) = storage.by_uri.get(uri) {
                if let Some(count) = storage.table.retain(handle) {
                    log::debug!(
                        "ResourceManager: Reusing {} '{}' {:?} (refs: {})",
                        T::TYPE_NAME,
                        uri,
                        handle,
                        count
                    );
                    return Ok(handle);
                }
                storage.by_uri.remove(uri);
            }
        }

        let bytes = self
            .file_system
            .read_all(uri)
            .map_err(|e| ResourceError::io(uri, e))?;
        let resource = T::load_from_memory(self, &bytes, uri)?;
        let metadata = ResourceMetadata::from_source(uri, resource.source_hash(&bytes));

        let storage = self.registered_storage::<T>()?;
        let handle = storage.table.allocate(resource, metadata);
        storage.by_uri.insert(uri.to_string(), handle);
        self.index_dependencies(handle);
        log::debug!("ResourceManager: Loaded {} '{}' as {:?}", T::TYPE_NAME, uri, handle);
        Ok(handle)
    }

    // Rebuilds the reverse-dependency entries of `handle` from its payload.
    fn index_dependencies<T: Resource>(&mut self, handle: Handle<T>) {
        let Some(storage) = self.storage_mut::<T>() else {
            return;
        };
        storage.forget_dependencies(handle);
        let dependencies = storage
            .table
            .get(handle)
            .map(|resource| resource.dependencies())
            .unwrap_or_default();
        for uri in dependencies {
            let dependents = storage.by_dependency.entry(uri).or_default();
            if !dependents.contains(&handle) {
                dependents.push(handle);
            }
        }
    }

    // --- Lookup ---

    /// The resource behind `handle`, or `None` if the handle is stale.
    ///
    /// This is the validity check the rest of the engine relies on. A `None`
    /// for a handle the caller believes alive is a logic error on their side.
    pub fn get<T: Resource>(&self, handle: Handle<T>) -> Option<&T> {
        self.storage::<T>()?.table.get(handle)
    }

    /// Mutable access to the resource behind `handle`.
    pub fn get_mut<T: Resource>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.storage_mut::<T>()?.table.get_mut(handle)
    }

    /// Returns `true` if `handle` refers to a live resource.
    pub fn is_valid<T: Resource>(&self, handle: Handle<T>) -> bool {
        self.storage::<T>()
            .is_some_and(|storage| storage.table.is_valid(handle))
    }

    /// Bookkeeping of a live resource.
    pub fn metadata<T: Resource>(&self, handle: Handle<T>) -> Option<&ResourceMetadata> {
        self.storage::<T>()?.table.metadata(handle)
    }

    /// Reference count of a live resource.
    pub fn ref_count<T: Resource>(&self, handle: Handle<T>) -> Option<u32> {
        self.storage::<T>()?.table.ref_count(handle)
    }

    /// The live handle loaded from `uri`, if any. Does not add a reference.
    pub fn find<T: Resource>(&self, uri: &str) -> Option<Handle<T>> {
        let storage = self.storage::<T>()?;
        storage
            .by_uri
            .get(uri)
            .copied()
            .filter(|handle| storage.table.is_valid(*handle))
    }

    /// Handles of every live resource of type `T`.
    pub fn handles<T: Resource>(&self) -> Vec<Handle<T>> {
        self.storage::<T>()
            .map(|storage| storage.table.handles())
            .unwrap_or_default()
    }

    /// Number of live resources of type `T`.
    pub fn live_count_of<T: Resource>(&self) -> usize {
        live_count_of::<T>(self)
    }

    /// Number of live resources across all types.
    pub fn live_count(&self) -> usize {
        self.registrations
            .iter()
            .map(|registration| (registration.live_count)(self))
            .sum()
    }

    /// Approximate CPU memory held by all live resources of type `T`.
    pub fn memory_usage_of<T: Resource>(&self) -> usize {
        self.storage::<T>()
            .map(|storage| storage.table.iter().map(|(_, r)| r.memory_usage()).sum())
            .unwrap_or(0)
    }

    // --- Reference counting ---

    /// Adds a reference to a live resource and returns the new count.
    pub fn acquire<T: Resource>(&mut self, handle: Handle<T>) -> Result<u32, ResourceError> {
        self.storage_mut::<T>()
            .and_then(|storage| storage.table.retain(handle))
            .ok_or(ResourceError::InvalidHandle)
    }

    /// Drops a reference. When the count reaches zero the resource is
    /// destroyed and its URI mapping removed.
    ///
    /// Releasing a stale handle is a no-op that returns `false`. Releasing a
    /// handle whose slot has not been reused since its last release is a
    /// double release and panics in debug builds.
    pub fn release<T: Resource>(&mut self, handle: Handle<T>) -> bool {
        let shutting_down = self.shutting_down;
        let Some(storage) = self.storage_mut::<T>() else {
            log::warn!(
                "ResourceManager: Ignoring release of {:?}, no {} was ever stored",
                handle,
                T::TYPE_NAME
            );
            return false;
        };

        match storage.table.release(handle) {
            Release::Stale => {
                debug_assert!(
                    shutting_down || !storage.table.just_freed(handle),
                    "{} handle {:?} released twice",
                    T::TYPE_NAME,
                    handle
                );
                log::warn!(
                    "ResourceManager: Ignoring release of stale {} handle {:?}",
                    T::TYPE_NAME,
                    handle
                );
                false
            }
            Release::Retained(count) => {
                log::trace!("ResourceManager: Released {:?} (refs: {})", handle, count);
                true
            }
            Release::Freed(payload, metadata) => {
                if let Some(uri) = metadata.source_uri.as_deref() {
                    if storage.by_uri.get(uri) == Some(&handle) {
                        storage.by_uri.remove(uri);
                    }
                }
                storage.forget_dependencies(handle);
                if let Some(resource) = payload {
                    resource.destroy(self);
                }
                log::debug!("ResourceManager: Destroyed {} {:?}", T::TYPE_NAME, handle);
                true
            }
        }
    }

    // Runs `f` on a checked-out payload. If the slot was freed while `f` ran,
    // the payload is destroyed instead of being put back.
    fn with_checked_out<T: Resource, R>(
        &mut self,
        handle: Handle<T>,
        f: impl FnOnce(&mut T, &mut Self) -> R,
    ) -> Option<R> {
        let mut payload = self.storage_mut::<T>()?.table.take_payload(handle)?;
        let result = f(&mut payload, self);

        let orphan = match self.storage_mut::<T>() {
            Some(storage) => storage.table.restore_payload(handle, payload).err(),
            None => Some(payload),
        };
        if let Some(orphan) = orphan {
            log::warn!(
                "ResourceManager: {} {:?} was freed while in use, destroying it",
                T::TYPE_NAME,
                handle
            );
            orphan.destroy(self);
        }
        Some(result)
    }

    // --- Reload ---

    /// Re-hashes the source of `handle` and reloads it if the hash changed.
    ///
    /// Returns whether a reload happened. The handle's `{index, generation}`
    /// never changes; only the payload does. Procedural resources return
    /// `Ok(false)`. A failed reload leaves the previous state live and is
    /// reported as [`ResourceError::ReloadFailed`].
    pub fn reload_if_changed<T: Resource>(&mut self, handle: Handle<T>) -> Result<bool, ResourceError> {
        let metadata = self.metadata(handle).ok_or(ResourceError::InvalidHandle)?;
        let Some(uri) = metadata.source_uri.clone() else {
            return Ok(false);
        };
        let stored_hash = metadata.content_hash;

        if !T::HOT_RELOAD {
            return Err(ResourceError::Unsupported {
                type_name: T::TYPE_NAME,
                operation: "reload",
            });
        }

        let check_and_reload =
            |resource: &mut T, manager: &mut Self| -> Result<Option<u64>, ResourceError> {
                let hash = resource.fetch_hash(manager, &uri)?;
                if hash == stored_hash {
                    return Ok(None);
                }
                resource.reload(manager, &uri)?;
                Ok(Some(hash))
            };
        let outcome = self
            .with_checked_out(handle, check_and_reload)
            .ok_or(ResourceError::InvalidHandle)?;

        match outcome {
            Ok(None) => {
                self.touch_metadata(handle, stored_hash);
                Ok(false)
            }
            Ok(Some(hash)) => {
                self.touch_metadata(handle, hash);
                self.index_dependencies(handle);
                log::info!("ResourceManager: Reloaded {} '{}'", T::TYPE_NAME, uri);
                Ok(true)
            }
            Err(cause) => {
                log::warn!(
                    "ResourceManager: Reload of {} '{}' failed, keeping previous state: {}",
                    T::TYPE_NAME,
                    uri,
                    cause
                );
                Err(ResourceError::ReloadFailed {
                    uri,
                    cause: Box::new(cause),
                })
            }
        }
    }

    fn touch_metadata<T: Resource>(&mut self, handle: Handle<T>, hash: u64) {
        if let Some(metadata) = self
            .storage_mut::<T>()
            .and_then(|storage| storage.table.metadata_mut(handle))
        {
            metadata.touch(hash);
        }
    }

    /// Reloads every live resource, of any registered type, whose source is
    /// `uri` or that lists `uri` among its [`Resource::dependencies`], and
    /// whose content changed. Returns how many were reloaded. Failures are
    /// logged and skipped.
    pub fn reload_uri(&mut self, uri: &str) -> usize {
        let registrations = self.registrations.clone();
        registrations
            .iter()
            .map(|registration| (registration.reload_uri)(self, uri))
            .sum()
    }

    // --- GPU upload ---

    /// Uploads the pending CPU-side data of one resource.
    pub fn flush_to_gpu<T: Resource>(&mut self, handle: Handle<T>) -> Result<(), ResourceError> {
        self.with_checked_out(handle, |resource, manager| resource.flush_to_gpu(manager))
            .ok_or(ResourceError::InvalidHandle)?
    }

    /// Uploads the pending data of every live `T`. Every resource is
    /// attempted; the first error is returned.
    pub fn flush_all<T: Resource>(&mut self) -> Result<usize, ResourceError> {
        let mut first_error = None;
        let mut flushed = 0;
        for handle in self.handles::<T>() {
            match self.flush_to_gpu(handle) {
                Ok(()) => flushed += 1,
                Err(err) => {
                    log::warn!(
                        "ResourceManager: Upload of {} {:?} failed: {}",
                        T::TYPE_NAME,
                        handle,
                        err
                    );
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(flushed),
        }
    }

    // --- Shutdown ---

    /// Destroys every remaining resource, most recently registered type
    /// first. Returns how many resources were destroyed.
    pub fn shutdown(&mut self) -> usize {
        let registrations = self.registrations.clone();
        self.shutting_down = true;
        let destroyed: usize = registrations
            .iter()
            .rev()
            .map(|registration| (registration.destroy_all)(self))
            .sum();
        self.shutting_down = false;
        log::info!("ResourceManager: Shut down, destroyed {} resource(s)", destroyed);
        destroyed
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        if self.live_count() > 0 {
            self.shutdown();
        }
    }
}

fn reload_uri_of<T: Resource>(manager: &mut ResourceManager, uri: &str) -> usize {
    if !T::HOT_RELOAD {
        return 0;
    }
    let Some(storage) = manager.storage::<T>() else {
        return 0;
    };
    let mut targets: Vec<Handle<T>> = storage.by_uri.get(uri).copied().into_iter().collect();
    if let Some(dependents) = storage.by_dependency.get(uri) {
        for dependent in dependents {
            if !targets.contains(dependent) {
                targets.push(*dependent);
            }
        }
    }

    let mut reloaded = 0;
    for handle in targets {
        match manager.reload_if_changed(handle) {
            Ok(true) => reloaded += 1,
            Ok(false) => {}
            Err(err) => log::warn!(
                "ResourceManager: Hot reload of {} '{}' failed: {}",
                T::TYPE_NAME,
                uri,
                err
            ),
        }
    }
    reloaded
}

fn destroy_all_of<T: Resource>(manager: &mut ResourceManager) -> usize {
    let Some(storage) = manager.storage_mut::<T>() else {
        return 0;
    };
    storage.by_uri.clear();
    storage.by_dependency.clear();
    let drained = storage.table.drain();
    if !drained.is_empty() {
        log::warn!(
            "ResourceManager: {} {} resource(s) still referenced at shutdown",
            drained.len(),
            T::TYPE_NAME
        );
    }

    let count = drained.len();
    for (_, payload, _) in drained {
        if let Some(resource) = payload {
            resource.destroy(manager);
        }
    }
    count
}

fn live_count_of<T: Resource>(manager: &ResourceManager) -> usize {
    manager
        .storage::<T>()
        .map(|storage| storage.table.len())
        .unwrap_or(0)
}
