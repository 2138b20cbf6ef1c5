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

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use vesta_core::renderer::{
    GraphicsDevice, PipelineLayoutShape, RenderPipelineId, ResourceError, ShaderCompiler,
    ShaderError, TextureFormat,
};
use vesta_core::vfs::FileSystem;
use vesta_core::{Handle, ResourceSettings};
use vesta_data::resources::{register_builtin, EnvironmentMap, Material, Texture};
use vesta_data::{ObjectCaches, ResourceManager};
use vesta_infra::{WgpuDevice, WgslShaderCompiler};
use vesta_io::{HotReloadWatcher, NativeFileSystem};

/// What [`RenderResources::shutdown`] tore down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Shader-cache records written.
    pub shaders_flushed: usize,
    /// Driver objects destroyed by the object caches.
    pub objects_destroyed: usize,
    /// Resources still alive at shutdown.
    pub resources_destroyed: usize,
}

/// Configures and builds a [`RenderResources`].
#[derive(Debug)]
pub struct RenderResourcesBuilder {
    settings: ResourceSettings,
    device: Arc<dyn GraphicsDevice>,
    file_system: Arc<dyn FileSystem>,
    compiler: Option<Arc<dyn ShaderCompiler>>,
}

impl RenderResourcesBuilder {
    /// Replaces the default settings.
    pub fn settings(mut self, settings: ResourceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Installs the compiler used for shaders missing from the shader cache.
    pub fn shader_compiler(mut self, compiler: Arc<dyn ShaderCompiler>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    /// Registers the built-in resource types, loads the shader cache and
    /// starts the file watcher, as configured.
    pub fn build(self) -> Result<RenderResources> {
        let settings = self.settings;

        let mut manager = ResourceManager::new(self.device.clone(), self.file_system.clone())
            .with_initial_slots(settings.initial_slots_per_type);
        if let Some(compiler) = self.compiler {
            manager = manager.with_shader_compiler(compiler);
        }
        register_builtin(&mut manager);

        let mut rewrite_shader_cache = false;
        if let (true, Some(uri)) = (
            settings.load_shader_cache_on_startup,
            settings.shader_cache_path.as_deref(),
        ) {
            match manager.shader_cache_mut().load(self.file_system.as_ref(), uri) {
                Ok(_) if manager.shader_cache().has_damaged_tail(uri) => {
                    log::warn!("RenderResources: Shader cache '{}' has a damaged tail; it will be rewritten at shutdown", uri);
                    rewrite_shader_cache = true;
                }
                Ok(_) => {}
                Err(ResourceError::Shader(err @ ShaderError::CorruptCache { .. })) => {
                    log::warn!("RenderResources: {}; it will be rewritten at shutdown", err);
                    rewrite_shader_cache = true;
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("Failed to load shader cache '{uri}'"))
                }
            }
        }

        let watcher = if settings.hot_reload {
            let root = settings
                .watch_root
                .as_deref()
                .ok_or_else(|| anyhow!("Hot reload is enabled but no watch_root is configured"))?;
            Some(
                HotReloadWatcher::new(root)
                    .with_context(|| format!("Failed to watch '{}'", root.display()))?,
            )
        } else {
            None
        };

        log::info!(
            "RenderResources: Ready ({} cached shader(s), hot reload {})",
            manager.shader_cache().len(),
            if watcher.is_some() { "on" } else { "off" }
        );

        Ok(RenderResources {
            settings,
            caches: ObjectCaches::new(self.device),
            manager,
            watcher,
            rewrite_shader_cache,
            shut_down: false,
        })
    }
}

/// The resource layer of one renderer: a resource manager, the four object
/// caches and the shader cache, all sharing one device.
///
/// Shutdown order is fixed: the shader cache is flushed, the object caches
/// destroy their driver objects, the manager destroys every live resource,
/// and only then can the device go away. [`Drop`] runs the same sequence if
/// [`shutdown`](Self::shutdown) was not called.
#[derive(Debug)]
pub struct RenderResources {
    settings: ResourceSettings,
    caches: ObjectCaches,
    manager: ResourceManager,
    watcher: Option<HotReloadWatcher>,
    rewrite_shader_cache: bool,
    shut_down: bool,
}

impl RenderResources {
    /// Starts building over the given device and file system.
    pub fn builder(
        device: Arc<dyn GraphicsDevice>,
        file_system: Arc<dyn FileSystem>,
    ) -> RenderResourcesBuilder {
        RenderResourcesBuilder {
            settings: ResourceSettings::default(),
            device,
            file_system,
            compiler: None,
        }
    }

    /// Builds over a headless wgpu device, the WGSL compiler and a native
    /// file system rooted at `asset_root`.
    pub fn native(settings: ResourceSettings, asset_root: impl AsRef<Path>) -> Result<Self> {
        let device = WgpuDevice::new_headless().context("Failed to create the wgpu device")?;
        Self::builder(
            Arc::new(device),
            Arc::new(NativeFileSystem::new(asset_root.as_ref())),
        )
        .settings(settings)
        .shader_compiler(Arc::new(WgslShaderCompiler::new()))
        .build()
    }

    /// The settings this instance was built with.
    pub fn settings(&self) -> &ResourceSettings {
        &self.settings
    }

    /// The resource manager.
    pub fn manager(&self) -> &ResourceManager {
        &self.manager
    }

    /// The resource manager, mutably.
    pub fn manager_mut(&mut self) -> &mut ResourceManager {
        &mut self.manager
    }

    /// The driver-object caches.
    pub fn caches(&self) -> &ObjectCaches {
        &self.caches
    }

    /// The driver-object caches, mutably.
    pub fn caches_mut(&mut self) -> &mut ObjectCaches {
        &mut self.caches
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Fetches the pipeline of `material` for the given targets, building
    /// its layout chain from `layout` on a miss.
    pub fn fetch_material_pipeline(
        &mut self,
        material: Handle<Material>,
        layout: &PipelineLayoutShape,
        color_format: TextureFormat,
        depth_format: Option<TextureFormat>,
    ) -> Result<RenderPipelineId, ResourceError> {
        let state = self
            .manager
            .get(material)
            .ok_or(ResourceError::InvalidHandle)?
            .pipeline_state(&self.manager, color_format, depth_format)?;
        self.caches.fetch_pipeline(layout, &state)
    }

    /// Reloads the resources behind each URI. Returns how many reloaded.
    pub fn reload_changed<'a>(&mut self, uris: impl IntoIterator<Item = &'a str>) -> usize {
        uris.into_iter()
            .map(|uri| self.manager.reload_uri(uri))
            .sum()
    }

    /// Drains the file watcher and reloads what changed. Returns how many
    /// resources were reloaded; always 0 when hot reload is off.
    pub fn poll_hot_reload(&mut self) -> usize {
        let Some(watcher) = &self.watcher else {
            return 0;
        };
        let changed = watcher.poll();
        if changed.is_empty() {
            return 0;
        }
        let reloaded = self.reload_changed(changed.iter().map(String::as_str));
        log::info!(
            "RenderResources: {} change(s) on disk, {} resource(s) reloaded",
            changed.len(),
            reloaded
        );
        reloaded
    }

    /// Uploads pending texel data of textures and environment maps.
    pub fn flush_pending(&mut self) -> Result<usize, ResourceError> {
        let textures = self.manager.flush_all::<Texture>()?;
        let environment_maps = self.manager.flush_all::<EnvironmentMap>()?;
        Ok(textures + environment_maps)
    }

    /// Writes newly compiled shaders to the persisted cache, if one is
    /// configured. Returns the number of records written.
    pub fn save_shader_cache(&mut self) -> Result<usize> {
        let Some(uri) = self.settings.shader_cache_path.clone() else {
            return Ok(0);
        };
        let file_system = self.manager.file_system().clone();
        let cache = self.manager.shader_cache_mut();
        let result = if self.rewrite_shader_cache {
            cache.compact(file_system.as_ref(), &uri)
        } else {
            cache.flush(file_system.as_ref(), &uri)
        };
        let written = result.with_context(|| format!("Failed to write shader cache '{uri}'"))?;
        self.rewrite_shader_cache = false;
        Ok(written)
    }

    /// Tears the resource layer down. Calling it again does nothing.
    ///
    /// A failure to write the shader cache is reported after the remaining
    /// steps have run, so driver objects are released either way.
    pub fn shutdown(&mut self) -> Result<ShutdownReport> {
        if self.shut_down {
            return Ok(ShutdownReport::default());
        }
        self.shut_down = true;
        self.watcher = None;

        let flushed = if self.settings.flush_shader_cache_on_shutdown {
            self.save_shader_cache()
        } else {
            Ok(0)
        };

        let objects_destroyed = self.caches.clear();
        let resources_destroyed = self.manager.shutdown();
        log::info!(
            "RenderResources: Shut down ({} object(s), {} resource(s) destroyed)",
            objects_destroyed,
            resources_destroyed
        );

        Ok(ShutdownReport {
            shaders_flushed: flushed?,
            objects_destroyed,
            resources_destroyed,
        })
    }
}

impl Drop for RenderResources {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            log::error!("RenderResources: Shutdown failed: {:#}", err);
        }
    }
}
