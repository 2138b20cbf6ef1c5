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
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use wgpu::util::DeviceExt;

use vesta_core::renderer::api::*;
use vesta_core::renderer::{GraphicsDevice, PipelineError, ResourceError, ShaderError};

use super::conversions::IntoWgpu;

/// Backend objects of one kind, keyed by the raw value of their id.
#[derive(Debug)]
struct ObjectTable<T> {
    kind: &'static str,
    entries: Mutex<HashMap<usize, T>>,
    next_id: AtomicUsize,
}

impl<T> ObjectTable<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<usize, T>>, ResourceError> {
        self.entries.lock().map_err(|e| {
            ResourceError::BackendError(format!("Mutex poisoned ({}): {}", self.kind, e))
        })
    }

    fn insert(&self, object: T) -> Result<usize, ResourceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock()?.insert(id, object);
        Ok(id)
    }

    fn remove(&self, id: usize) -> Result<Option<T>, ResourceError> {
        Ok(self.lock()?.remove(&id))
    }

    fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}

#[derive(Debug)]
struct BufferEntry {
    buffer: wgpu::Buffer,
    size: u64,
}

#[derive(Debug)]
struct TextureEntry {
    texture: wgpu::Texture,
    size: u64,
}

/// A [`GraphicsDevice`] backed by a wgpu device and queue.
///
/// Every constructor runs inside a validation error scope, so backend
/// rejections come back as `Err` instead of reaching the uncaptured-error
/// handler.
#[derive(Debug)]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,

    shader_modules: ObjectTable<wgpu::ShaderModule>,
    set_layouts: ObjectTable<wgpu::BindGroupLayout>,
    pipeline_layouts: ObjectTable<wgpu::PipelineLayout>,
    pipelines: ObjectTable<wgpu::RenderPipeline>,
    buffers: ObjectTable<BufferEntry>,
    textures: ObjectTable<TextureEntry>,
    texture_views: ObjectTable<wgpu::TextureView>,

    allocated_bytes: AtomicU64,
}

impl WgpuDevice {
    /// Wraps an existing device and queue.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        device.on_uncaptured_error(Box::new(|e: wgpu::Error| {
            log::error!("WgpuDevice: Uncaptured error: {e:?}");
        }));

        Self {
            device,
            queue,
            shader_modules: ObjectTable::new("shader_modules"),
            set_layouts: ObjectTable::new("set_layouts"),
            pipeline_layouts: ObjectTable::new("pipeline_layouts"),
            pipelines: ObjectTable::new("pipelines"),
            buffers: ObjectTable::new("buffers"),
            textures: ObjectTable::new("textures"),
            texture_views: ObjectTable::new("texture_views"),
            allocated_bytes: AtomicU64::new(0),
        }
    }

    /// Requests an adapter and a device without any surface.
    ///
    /// ## Errors
    /// Fails when no adapter is available, which is common on CI machines.
    pub fn new_headless() -> anyhow::Result<Self> {
        pollster::block_on(Self::request_headless())
    }

    async fn request_headless() -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .map_err(|e| anyhow!("No compatible graphics adapter: {}", e))?;

        let info = adapter.get_info();
        log::info!(
            "WgpuDevice: Using adapter \"{}\" (Backend: {:?})",
            info.name,
            info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Vesta Headless Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;

        Ok(Self::new(device, queue))
    }

    /// The underlying wgpu device.
    pub fn wgpu_device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The underlying wgpu queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Bytes currently held by buffers and textures created through this device.
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    /// The number of live objects of every kind.
    pub fn live_objects(&self) -> usize {
        self.shader_modules.len()
            + self.set_layouts.len()
            + self.pipeline_layouts.len()
            + self.pipelines.len()
            + self.buffers.len()
            + self.textures.len()
            + self.texture_views.len()
    }

    /// Runs `create` inside a validation error scope.
    fn validated<R>(&self, create: impl FnOnce(&wgpu::Device) -> R) -> Result<R, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let object = create(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(error.to_string()),
            None => Ok(object),
        }
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        let label = descriptor.label.unwrap_or("<unnamed>");
        let compilation_error = |details: String| ShaderError::CompilationError {
            label: label.to_string(),
            stage: descriptor.il.stage,
            details,
        };

        let source = std::str::from_utf8(&descriptor.il.code)
            .map_err(|e| compilation_error(format!("IL is not UTF-8 WGSL: {e}")))?;

        let module = self
            .validated(|device| {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: descriptor.label,
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                })
            })
            .map_err(compilation_error)?;

        let id = ShaderModuleId(self.shader_modules.insert(module)?);
        log::debug!("WgpuDevice: Created shader module '{}' with ID: {:?}", label, id);
        Ok(id)
    }

    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError> {
        match self.shader_modules.remove(id.0)? {
            Some(_) => {
                log::debug!("WgpuDevice: Destroyed shader module with ID: {:?}", id);
                Ok(())
            }
            None => Err(ShaderError::NotFound { id }.into()),
        }
    }

    fn create_bind_set_layout(
        &self,
        descriptor: &BindSetLayoutDescriptor,
    ) -> Result<BindSetLayoutId, ResourceError> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> =
            descriptor.entries.iter().map(IntoWgpu::into_wgpu).collect();

        let layout = self
            .validated(|device| {
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: None,
                    entries: &entries,
                })
            })
            .map_err(PipelineError::LayoutCreationFailed)?;

        let id = BindSetLayoutId(self.set_layouts.insert(layout)?);
        log::debug!(
            "WgpuDevice: Created bind-set layout {:?} with {} entries",
            id,
            entries.len()
        );
        Ok(id)
    }

    fn destroy_bind_set_layout(&self, id: BindSetLayoutId) -> Result<(), ResourceError> {
        self.set_layouts
            .remove(id.0)?
            .map(drop)
            .ok_or(ResourceError::InvalidHandle)
    }

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        let layout = {
            let set_layouts = self.set_layouts.lock()?;
            let sets = descriptor
                .set_layouts
                .iter()
                .map(|id| {
                    set_layouts.get(&id.0).ok_or_else(|| {
                        PipelineError::LayoutCreationFailed(format!(
                            "Unknown bind-set layout {id:?}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let push_constant_ranges: Vec<wgpu::PushConstantRange> = descriptor
                .push_constants
                .iter()
                .map(|range| wgpu::PushConstantRange {
                    stages: range.stages.into_wgpu(),
                    range: 0..range.size,
                })
                .collect();

            self.validated(|device| {
                device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: None,
                    bind_group_layouts: &sets,
                    push_constant_ranges: &push_constant_ranges,
                })
            })
            .map_err(PipelineError::LayoutCreationFailed)?
        };

        let id = PipelineLayoutId(self.pipeline_layouts.insert(layout)?);
        log::debug!("WgpuDevice: Created pipeline layout {:?}", id);
        Ok(id)
    }

    fn destroy_pipeline_layout(&self, id: PipelineLayoutId) -> Result<(), ResourceError> {
        match self.pipeline_layouts.remove(id.0)? {
            Some(_) => Ok(()),
            None => Err(PipelineError::InvalidPipelineLayout { id }.into()),
        }
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        let state = &descriptor.state;

        let pipeline = {
            let modules = self.shader_modules.lock()?;
            let layouts = self.pipeline_layouts.lock()?;

            let module = |stage: &ShaderStageRef| {
                modules.get(&stage.module.0).ok_or(
                    PipelineError::InvalidShaderModuleForPipeline { id: stage.module },
                )
            };
            let vertex_module = module(&state.vertex)?;
            let fragment_module = state.fragment.as_ref().map(module).transpose()?;
            let layout = layouts.get(&descriptor.layout.0).ok_or(
                PipelineError::InvalidPipelineLayout {
                    id: descriptor.layout,
                },
            )?;

            // wgpu layouts borrow their attribute slices.
            let attributes: Vec<Vec<wgpu::VertexAttribute>> = state
                .vertex_buffers
                .iter()
                .map(|buffer| buffer.attributes.iter().map(IntoWgpu::into_wgpu).collect())
                .collect();
            let vertex_buffers: Vec<wgpu::VertexBufferLayout> = state
                .vertex_buffers
                .iter()
                .zip(&attributes)
                .map(|(buffer, attributes)| wgpu::VertexBufferLayout {
                    array_stride: buffer.array_stride,
                    step_mode: buffer.step_mode.into_wgpu(),
                    attributes,
                })
                .collect();
            let targets: Vec<Option<wgpu::ColorTargetState>> = state
                .color_targets
                .iter()
                .map(|target| Some(target.into_wgpu()))
                .collect();

            self.validated(|device| {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: None,
                    layout: Some(layout),
                    vertex: wgpu::VertexState {
                        module: vertex_module,
                        entry_point: Some(state.vertex.entry_point.as_str()),
                        buffers: &vertex_buffers,
                        compilation_options: Default::default(),
                    },
                    fragment: fragment_module.map(|module| wgpu::FragmentState {
                        module,
                        entry_point: state.fragment.as_ref().map(|s| s.entry_point.as_str()),
                        targets: &targets,
                        compilation_options: Default::default(),
                    }),
                    primitive: state.primitive.into_wgpu(),
                    depth_stencil: state.depth_stencil.map(IntoWgpu::into_wgpu),
                    multisample: state.multisample.into_wgpu(),
                    multiview: None,
                    cache: None,
                })
            })
            .map_err(|details| PipelineError::CompilationFailed {
                label: None,
                details,
            })?
        };

        let id = RenderPipelineId(self.pipelines.insert(pipeline)?);
        log::info!("WgpuDevice: Created render pipeline with ID: {:?}", id);
        Ok(id)
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        match self.pipelines.remove(id.0)? {
            Some(_) => {
                log::debug!("WgpuDevice: Destroyed render pipeline with ID: {:?}", id);
                Ok(())
            }
            None => Err(PipelineError::InvalidRenderPipeline { id }.into()),
        }
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        let usage = descriptor.usage.into_wgpu();
        let buffer = self
            .validated(|device| {
                if data.is_empty() {
                    device.create_buffer(&wgpu::BufferDescriptor {
                        label: descriptor.label.as_deref(),
                        size: descriptor.size,
                        usage,
                        mapped_at_creation: descriptor.mapped_at_creation,
                    })
                } else {
                    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: descriptor.label.as_deref(),
                        contents: data,
                        usage,
                    })
                }
            })
            .map_err(ResourceError::BackendError)?;

        let size = buffer.size();
        let id = BufferId(self.buffers.insert(BufferEntry { buffer, size })?);
        self.allocated_bytes.fetch_add(size, Ordering::Relaxed);
        log::debug!(
            "WgpuDevice: Created buffer '{}' with ID: {:?} and size: {}",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            size
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let entry = self.buffers.remove(id.0)?.ok_or(ResourceError::NotFound)?;
        entry.buffer.destroy();
        self.allocated_bytes.fetch_sub(entry.size, Ordering::Relaxed);
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let buffers = self.buffers.lock()?;
        let entry = buffers.get(&id.0).ok_or(ResourceError::NotFound)?;
        if offset + data.len() as u64 > entry.size {
            return Err(ResourceError::OutOfBounds);
        }
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0
            || data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT != 0
        {
            return Err(ResourceError::BackendError(format!(
                "Buffer writes must be {}-byte aligned",
                wgpu::COPY_BUFFER_ALIGNMENT
            )));
        }
        self.queue.write_buffer(&entry.buffer, offset, data);
        Ok(())
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let texture = self
            .validated(|device| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: descriptor.label.as_deref(),
                    size: descriptor.size.into_wgpu(),
                    mip_level_count: descriptor.mip_level_count,
                    sample_count: descriptor.sample_count.into_wgpu(),
                    dimension: descriptor.dimension.into_wgpu(),
                    format: descriptor.format.into_wgpu(),
                    usage: descriptor.usage.into_wgpu(),
                    view_formats: &[],
                })
            })
            .map_err(ResourceError::BackendError)?;

        let size = descriptor.base_level_size() as u64;
        let id = TextureId(self.textures.insert(TextureEntry { texture, size })?);
        self.allocated_bytes.fetch_add(size, Ordering::Relaxed);
        log::debug!(
            "WgpuDevice: Created texture '{}' with ID: {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            id
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let entry = self.textures.remove(id.0)?.ok_or(ResourceError::NotFound)?;
        entry.texture.destroy();
        self.allocated_bytes.fetch_sub(entry.size, Ordering::Relaxed);
        Ok(())
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        data: &[u8],
        bytes_per_row: Option<u32>,
        offset: Origin3D,
        size: Extent3D,
    ) -> Result<(), ResourceError> {
        let textures = self.textures.lock()?;
        let entry = textures.get(&texture_id.0).ok_or(ResourceError::NotFound)?;

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &entry.texture,
                mip_level: 0,
                origin: offset.into_wgpu(),
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row,
                // Layered writes (cube faces) need the image stride.
                rows_per_image: (size.depth_or_array_layers > 1).then_some(size.height),
            },
            size.into_wgpu(),
        );
        log::trace!(
            "WgpuDevice: Wrote {} bytes to texture ID: {:?}",
            data.len(),
            texture_id
        );
        Ok(())
    }

    fn create_texture_view(
        &self,
        descriptor: &ImageViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        let view = {
            let textures = self.textures.lock()?;
            let entry = textures
                .get(&descriptor.texture.0)
                .ok_or(ResourceError::NotFound)?;
            self.validated(|_| {
                entry.texture.create_view(&wgpu::TextureViewDescriptor {
                    label: None,
                    format: descriptor.format.map(IntoWgpu::into_wgpu),
                    dimension: descriptor.dimension.map(IntoWgpu::into_wgpu),
                    usage: None,
                    aspect: descriptor.aspect.into_wgpu(),
                    base_mip_level: descriptor.base_mip_level,
                    mip_level_count: descriptor.mip_level_count,
                    base_array_layer: descriptor.base_array_layer,
                    array_layer_count: descriptor.array_layer_count,
                })
            })
            .map_err(ResourceError::BackendError)?
        };

        let id = TextureViewId(self.texture_views.insert(view)?);
        log::debug!(
            "WgpuDevice: Created view {:?} of texture {:?} (revision {})",
            id,
            descriptor.texture,
            descriptor.texture_revision
        );
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        self.texture_views
            .remove(id.0)?
            .map(drop)
            .ok_or(ResourceError::NotFound)
    }
}
