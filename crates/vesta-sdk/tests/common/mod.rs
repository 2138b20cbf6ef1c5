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

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use vesta_core::renderer::api::*;
use vesta_core::renderer::{GraphicsDevice, ResourceError, ShaderCompiler, ShaderError};

/// A `GraphicsDevice` that only tracks which ids are live.
#[derive(Debug, Default)]
pub struct LiveDevice {
    next_id: AtomicUsize,
    live: Mutex<HashSet<(&'static str, usize)>>,
}

impl LiveDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn live(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub fn live_of(&self, kind: &str) -> usize {
        self.live.lock().unwrap().iter().filter(|(k, _)| *k == kind).count()
    }

    fn create(&self, kind: &'static str) -> Result<usize, ResourceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.live.lock().unwrap().insert((kind, id));
        Ok(id)
    }

    fn destroy(&self, kind: &'static str, id: usize) -> Result<(), ResourceError> {
        if self.live.lock().unwrap().remove(&(kind, id)) {
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }
}

impl GraphicsDevice for LiveDevice {
    fn create_shader_module(&self, _: &ShaderModuleDescriptor) -> Result<ShaderModuleId, ResourceError> {
        self.create("shader_module").map(ShaderModuleId)
    }
    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError> {
        self.destroy("shader_module", id.0)
    }
    fn create_bind_set_layout(&self, _: &BindSetLayoutDescriptor) -> Result<BindSetLayoutId, ResourceError> {
        self.create("bind_set_layout").map(BindSetLayoutId)
    }
    fn destroy_bind_set_layout(&self, id: BindSetLayoutId) -> Result<(), ResourceError> {
        self.destroy("bind_set_layout", id.0)
    }
    fn create_pipeline_layout(&self, _: &PipelineLayoutDescriptor) -> Result<PipelineLayoutId, ResourceError> {
        self.create("pipeline_layout").map(PipelineLayoutId)
    }
    fn destroy_pipeline_layout(&self, id: PipelineLayoutId) -> Result<(), ResourceError> {
        self.destroy("pipeline_layout", id.0)
    }
    fn create_render_pipeline(&self, _: &RenderPipelineDescriptor) -> Result<RenderPipelineId, ResourceError> {
        self.create("render_pipeline").map(RenderPipelineId)
    }
    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        self.destroy("render_pipeline", id.0)
    }
    fn create_buffer_with_data(&self, _: &BufferDescriptor, _: &[u8]) -> Result<BufferId, ResourceError> {
        self.create("buffer").map(BufferId)
    }
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        self.destroy("buffer", id.0)
    }
    fn write_buffer(&self, _: BufferId, _: u64, _: &[u8]) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_texture(&self, _: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        self.create("texture").map(TextureId)
    }
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        self.destroy("texture", id.0)
    }
    fn write_texture(
        &self,
        _: TextureId,
        _: &[u8],
        _: Option<u32>,
        _: Origin3D,
        _: Extent3D,
    ) -> Result<(), ResourceError> {
        Ok(())
    }
    fn create_texture_view(&self, _: &ImageViewDescriptor) -> Result<TextureViewId, ResourceError> {
        self.create("texture_view").map(TextureViewId)
    }
    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        self.destroy("texture_view", id.0)
    }
}

/// Passes source through unchanged and counts compilations.
#[derive(Debug, Default)]
pub struct CountingCompiler {
    compiled: AtomicUsize,
}

impl CountingCompiler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn compiled(&self) -> usize {
        self.compiled.load(Ordering::Relaxed)
    }
}

impl ShaderCompiler for CountingCompiler {
    fn create_shader_il(
        &self,
        stage: ShaderStage,
        source: &[u8],
        _uri: &str,
    ) -> Result<ShaderIl, ShaderError> {
        self.compiled.fetch_add(1, Ordering::Relaxed);
        Ok(ShaderIl::new(stage, source.to_vec()))
    }
}

pub fn single_set_layout() -> PipelineLayoutShape {
    PipelineLayoutShape {
        set_layouts: vec![BindSetLayoutDescriptor::new(vec![
            BindSetLayoutEntry::uniform_buffer(0, ShaderStageFlags::VERTEX_FRAGMENT),
        ])],
        push_constants: None,
    }
}
