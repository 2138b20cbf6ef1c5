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

use super::layout::PipelineLayoutId;
use super::state::*;
use crate::renderer::api::shader::ShaderModuleId;

/// A reference to one programmable stage of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderStageRef {
    /// The compiled module.
    pub module: ShaderModuleId,
    /// The entry point function name.
    pub entry_point: String,
    /// Revision of the shader resource the module came from. A hot-reloaded
    /// shader gets a new revision, so the old pipeline is never served again.
    pub revision: u32,
}

impl ShaderStageRef {
    /// Creates a stage reference.
    pub fn new(module: ShaderModuleId, entry_point: impl Into<String>, revision: u32) -> Self {
        Self {
            module,
            entry_point: entry_point.into(),
            revision,
        }
    }
}

/// Everything in a render pipeline except its layout.
///
/// Render-pass compatibility is captured by the color target formats, the
/// depth format and the sample count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineState {
    /// The vertex stage.
    pub vertex: ShaderStageRef,
    /// The fragment stage, if any.
    pub fragment: Option<ShaderStageRef>,
    /// The layout of the vertex buffers.
    pub vertex_buffers: Vec<VertexBufferLayoutDescriptor>,
    /// The state for primitive assembly and rasterization.
    pub primitive: PrimitiveStateDescriptor,
    /// Depth and stencil testing. If `None`, these tests are disabled.
    pub depth_stencil: Option<DepthStencilStateDescriptor>,
    /// The states of all color targets this pipeline renders to.
    pub color_targets: Vec<ColorTargetStateDescriptor>,
    /// The multisampling state.
    pub multisample: MultisampleStateDescriptor,
}

/// A fully resolved render pipeline: the cache key of the pipeline cache and
/// the argument of the device constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderPipelineDescriptor {
    /// The pipeline layout.
    pub layout: PipelineLayoutId,
    /// Shader stages and fixed-function state.
    pub state: PipelineState,
}

/// An opaque handle to a compiled render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderPipelineId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::common::TextureFormat;
    use crate::renderer::api::CullMode;

    fn state() -> PipelineState {
        PipelineState {
            vertex: ShaderStageRef::new(ShaderModuleId(1), "vs_main", 1),
            fragment: Some(ShaderStageRef::new(ShaderModuleId(2), "fs_main", 1)),
            vertex_buffers: Vec::new(),
            primitive: PrimitiveStateDescriptor::default(),
            depth_stencil: None,
            color_targets: vec![ColorTargetStateDescriptor::opaque(TextureFormat::Rgba8UnormSrgb)],
            multisample: MultisampleStateDescriptor::default(),
        }
    }

    #[test]
    fn shader_revision_changes_identity() {
        let mut reloaded = state();
        reloaded.vertex.revision = 2;
        assert_ne!(state(), reloaded);
    }

    #[test]
    fn cull_mode_changes_identity() {
        let mut culled = state();
        culled.primitive.cull_mode = CullMode::Back;
        assert_ne!(state(), culled);
        assert_eq!(state(), state());
    }
}
