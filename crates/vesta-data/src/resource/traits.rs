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

use super::ResourceManager;
use vesta_core::renderer::ResourceError;
use vesta_core::utils::hash::content_hash;

/// The static behaviour table of a resource type.
///
/// The manager is generic over `T: Resource` and calls these functions by
/// explicit type parameter; there is no common base object and no virtual
/// dispatch on the hot path. Resources with very different shapes (CPU
/// arrays, GPU ids, handles to other resources) keep their creation and
/// destruction logic local to their own type.
///
/// Every function that needs the manager receives it mutably. While such a
/// function runs on a live resource, that resource's payload is checked out
/// of its slot, so the manager can be used freely (including to load or
/// release other resources).
pub trait Resource: Sized + Send + Sync + 'static {
    /// A short, human-readable name used in logs and errors.
    const TYPE_NAME: &'static str;

    /// Whether [`Resource::reload`] is meaningful for this type.
    const HOT_RELOAD: bool = false;

    /// Arguments of [`Resource::create`].
    type CreateInfo;

    /// Builds a resource from in-memory arguments.
    fn create(manager: &mut ResourceManager, info: Self::CreateInfo) -> Result<Self, ResourceError>;

    /// Parses an encoded blob (image file, mesh file, shader source...).
    /// `uri` names the source in diagnostics and selects the format when the
    /// type supports several.
    fn load_from_memory(
        manager: &mut ResourceManager,
        bytes: &[u8],
        uri: &str,
    ) -> Result<Self, ResourceError> {
        let _ = (manager, bytes, uri);
        Err(ResourceError::Unsupported {
            type_name: Self::TYPE_NAME,
            operation: "load_from_memory",
        })
    }

    /// Releases everything the resource owns. Called exactly once, when the
    /// last reference is released or at shutdown.
    fn destroy(self, manager: &mut ResourceManager);

    /// Hashes the source bytes of this resource.
    fn source_hash(&self, bytes: &[u8]) -> u64 {
        content_hash(bytes)
    }

    /// Files other than the resource's own source whose contents feed its
    /// content hash. A change to any of them is routed to this resource by
    /// [`ResourceManager::reload_uri`]. Dependencies loaded through the
    /// manager as resources of their own are not listed here.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Re-reads `uri` and hashes it with [`Resource::source_hash`].
    fn fetch_hash(&self, manager: &ResourceManager, uri: &str) -> Result<u64, ResourceError> {
        let bytes = manager
            .file_system()
            .read_all(uri)
            .map_err(|e| ResourceError::io(uri, e))?;
        Ok(self.source_hash(&bytes))
    }

    /// Rebuilds the resource from `uri` in place.
    ///
    /// Must be all-or-nothing: on error `self` is left exactly as it was. The
    /// default builds a fresh value first, then swaps it in and destroys the
    /// previous one.
    fn reload(&mut self, manager: &mut ResourceManager, uri: &str) -> Result<(), ResourceError> {
        let bytes = manager
            .file_system()
            .read_all(uri)
            .map_err(|e| ResourceError::io(uri, e))?;
        let fresh = Self::load_from_memory(manager, &bytes, uri)?;
        let previous = std::mem::replace(self, fresh);
        previous.destroy(manager);
        Ok(())
    }

    /// Uploads pending CPU-side data to the device. Idempotent; a no-op when
    /// nothing is pending.
    fn flush_to_gpu(&mut self, manager: &mut ResourceManager) -> Result<(), ResourceError> {
        let _ = manager;
        Ok(())
    }

    /// Approximate CPU memory held by the resource, in bytes.
    fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}
