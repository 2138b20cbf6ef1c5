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

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use vesta_core::renderer::api::*;
use vesta_core::renderer::{GraphicsDevice, ResourceError, ShaderCompiler, ShaderError};
use vesta_data::ResourceManager;
use vesta_io::MemoryFileSystem;

pub const SHADER_MODULE: &str = "shader_module";
pub const BIND_SET_LAYOUT: &str = "bind_set_layout";
pub const PIPELINE_LAYOUT: &str = "pipeline_layout";
pub const RENDER_PIPELINE: &str = "render_pipeline";
pub const BUFFER: &str = "buffer";
pub const TEXTURE: &str = "texture";
pub const TEXTURE_VIEW: &str = "texture_view";

#[derive(Debug, Default)]
struct DeviceState {
    created: HashMap<&'static str, usize>,
    destroyed: HashMap<&'static str, usize>,
    live: HashSet<(&'static str, usize)>,
    failing: HashSet<&'static str>,
    destroy_log: Vec<&'static str>,
    texture_writes: Vec<(usize, usize)>,
}

/// A `GraphicsDevice` that hands out sequential ids, counts every call and
/// can be told to fail a kind of object.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    next_id: AtomicUsize,
    state: Mutex<DeviceState>,
}

impl RecordingDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().expect("device state poisoned")
    }

    pub fn created(&self, kind: &str) -> usize {
        self.state().created.get(kind).copied().unwrap_or(0)
    }

    pub fn destroyed(&self, kind: &str) -> usize {
        self.state().destroyed.get(kind).copied().unwrap_or(0)
    }

    pub fn live(&self, kind: &str) -> usize {
        self.state().live.iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn total_live(&self) -> usize {
        self.state().live.len()
    }

    pub fn set_failing(&self, kind: &'static str, failing: bool) {
        let mut state = self.state();
        if failing {
            state.failing.insert(kind);
        } else {
            state.failing.remove(kind);
        }
    }

    pub fn destroy_log(&self) -> Vec<&'static str> {
        self.state().destroy_log.clone()
    }

    pub fn texture_writes(&self) -> Vec<(usize, usize)> {
        self.state().texture_writes.clone()
    }

    fn create(&self, kind: &'static str) -> Result<usize, ResourceError> {
        let mut state = self.state();
        if state.failing.contains(kind) {
            return Err(ResourceError::BackendError(format!("{kind} creation refused")));
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        *state.created.entry(kind).or_default() += 1;
        state.live.insert((kind, id));
        Ok(id)
    }

    fn destroy(&self, kind: &'static str, id: usize) -> Result<(), ResourceError> {
        let mut state = self.state();
        if !state.live.remove(&(kind, id)) {
            return Err(ResourceError::BackendError(format!("{kind} {id} is not live")));
        }
        *state.destroyed.entry(kind).or_default() += 1;
        state.destroy_log.push(kind);
        Ok(())
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_shader_module(
        &self,
        _descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        self.create(SHADER_MODULE).map(ShaderModuleId)
    }

    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError> {
        self.destroy(SHADER_MODULE, id.0)
    }

    fn create_bind_set_layout(
        &self,
        _descriptor: &BindSetLayoutDescriptor,
    ) -> Result<BindSetLayoutId, ResourceError> {
        self.create(BIND_SET_LAYOUT).map(BindSetLayoutId)
    }

    fn destroy_bind_set_layout(&self, id: BindSetLayoutId) -> Result<(), ResourceError> {
        self.destroy(BIND_SET_LAYOUT, id.0)
    }

    fn create_pipeline_layout(
        &self,
        _descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        self.create(PIPELINE_LAYOUT).map(PipelineLayoutId)
    }

    fn destroy_pipeline_layout(&self, id: PipelineLayoutId) -> Result<(), ResourceError> {
        self.destroy(PIPELINE_LAYOUT, id.0)
    }

    fn create_render_pipeline(
        &self,
        _descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        self.create(RENDER_PIPELINE).map(RenderPipelineId)
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        self.destroy(RENDER_PIPELINE, id.0)
    }

    fn create_buffer_with_data(
        &self,
        _descriptor: &BufferDescriptor,
        _data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        self.create(BUFFER).map(BufferId)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        self.destroy(BUFFER, id.0)
    }

    fn write_buffer(&self, _id: BufferId, _offset: u64, _data: &[u8]) -> Result<(), ResourceError> {
        Ok(())
    }

    fn create_texture(&self, _descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        self.create(TEXTURE).map(TextureId)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        self.destroy(TEXTURE, id.0)
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        data: &[u8],
        _bytes_per_row: Option<u32>,
        _offset: Origin3D,
        _size: Extent3D,
    ) -> Result<(), ResourceError> {
        let mut state = self.state();
        if !state.live.contains(&(TEXTURE, texture_id.0)) {
            return Err(ResourceError::InvalidHandle);
        }
        state.texture_writes.push((texture_id.0, data.len()));
        Ok(())
    }

    fn create_texture_view(
        &self,
        _descriptor: &ImageViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        self.create(TEXTURE_VIEW).map(TextureViewId)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        self.destroy(TEXTURE_VIEW, id.0)
    }
}

/// A compiler that passes source through unchanged, rejects any source
/// containing `error`, and counts compilations.
#[derive(Debug, Default)]
pub struct PassThroughCompiler {
    compiled: AtomicUsize,
}

impl PassThroughCompiler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn compiled(&self) -> usize {
        self.compiled.load(Ordering::Relaxed)
    }
}

impl ShaderCompiler for PassThroughCompiler {
    fn create_shader_il(
        &self,
        stage: ShaderStage,
        source: &[u8],
        uri: &str,
    ) -> Result<ShaderIl, ShaderError> {
        if source.windows(5).any(|w| w == b"error") {
            return Err(ShaderError::CompilationError {
                label: uri.to_string(),
                stage,
                details: "source contains an error".to_string(),
            });
        }
        self.compiled.fetch_add(1, Ordering::Relaxed);
        Ok(ShaderIl::new(stage, source.to_vec()))
    }
}

pub struct Fixture {
    pub device: Arc<RecordingDevice>,
    pub fs: Arc<MemoryFileSystem>,
    pub compiler: Arc<PassThroughCompiler>,
    pub manager: ResourceManager,
}

impl Fixture {
    pub fn new() -> Self {
        let device = RecordingDevice::new();
        let fs = Arc::new(MemoryFileSystem::new());
        let compiler = PassThroughCompiler::new();
        let manager = ResourceManager::new(device.clone(), fs.clone())
            .with_shader_compiler(compiler.clone());
        Self {
            device,
            fs,
            compiler,
            manager,
        }
    }
}

/// Encodes a solid-colour PNG.
pub fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("png encoding");
    bytes.into_inner()
}

pub fn opaque_state(vs: ShaderModuleId, fs: ShaderModuleId, cull_mode: CullMode) -> PipelineState {
    PipelineState {
        vertex: ShaderStageRef::new(vs, "vs_main", 0),
        fragment: Some(ShaderStageRef::new(fs, "fs_main", 0)),
        vertex_buffers: vec![VertexBufferLayoutDescriptor::packed(
            0,
            &[VertexFormat::Float32x3, VertexFormat::Float32x2],
        )],
        primitive: PrimitiveStateDescriptor {
            cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(DepthStencilStateDescriptor::depth_less(
            TextureFormat::Depth32Float,
        )),
        color_targets: vec![ColorTargetStateDescriptor::opaque(
            TextureFormat::Bgra8UnormSrgb,
        )],
        multisample: Default::default(),
    }
}

pub fn camera_and_material_sets() -> PipelineLayoutShape {
    PipelineLayoutShape {
        set_layouts: vec![
            BindSetLayoutDescriptor::new(vec![BindSetLayoutEntry::uniform_buffer(
                0,
                ShaderStageFlags::VERTEX_FRAGMENT,
            )]),
            BindSetLayoutDescriptor::new(vec![
                BindSetLayoutEntry::texture(
                    0,
                    ShaderStageFlags::FRAGMENT,
                    TextureViewDimension::D2,
                ),
                BindSetLayoutEntry::sampler(1, ShaderStageFlags::FRAGMENT),
            ]),
        ],
        push_constants: None,
    }
}
