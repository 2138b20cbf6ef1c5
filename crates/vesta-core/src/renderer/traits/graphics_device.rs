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

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// Constructors and destructors for every driver-level object the resource
/// layer manages.
///
/// Every constructor is fallible and returns an opaque id. Ids stay valid
/// until the matching `destroy_*` call. Implementations must be usable from
/// behind an `Arc`, so all methods take `&self`.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a shader module from compiled IL.
    /// ## Errors
    /// * `ResourceError` - If the backend rejects the IL.
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError>;

    /// Destroys the shader module associated with the given ID.
    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError>;

    /// Creates a bind-set layout.
    /// ## Arguments
    /// * `descriptor` - The ordered bindings of the set.
    /// ## Returns
    /// The ID of the created layout.
    fn create_bind_set_layout(
        &self,
        descriptor: &BindSetLayoutDescriptor,
    ) -> Result<BindSetLayoutId, ResourceError>;

    /// Destroys a bind-set layout.
    fn destroy_bind_set_layout(&self, id: BindSetLayoutId) -> Result<(), ResourceError>;

    /// Creates a pipeline layout from resolved bind-set layout ids.
    /// ## Errors
    /// * `ResourceError` - If a set layout id is unknown or the backend fails.
    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError>;

    /// Destroys a pipeline layout.
    fn destroy_pipeline_layout(&self, id: PipelineLayoutId) -> Result<(), ResourceError>;

    /// Creates a render pipeline.
    /// ## Arguments
    /// * `descriptor` - The layout, shader stages and fixed-function state.
    /// ## Returns
    /// The ID of the created render pipeline.
    /// ## Errors
    /// * `ResourceError` - If a referenced module or layout is unknown, or the
    ///   backend fails to compile the pipeline.
    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError>;

    /// Destroys a render pipeline.
    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError>;

    /// Creates a new GPU buffer and initializes it with the provided data.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Destroys a GPU buffer.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Writes data to a GPU buffer at `offset`.
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Creates a new GPU texture. Its contents are undefined until written.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Destroys a GPU texture.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Writes texel data to a region of a GPU texture.
    /// ## Arguments
    /// * `texture_id` - The texture to write to.
    /// * `data` - Tightly packed texel rows.
    /// * `bytes_per_row` - Stride between rows, `None` for single-row writes.
    /// * `offset` - The texel origin of the region (z selects the array layer).
    /// * `size` - The size of the region.
    fn write_texture(
        &self,
        texture_id: TextureId,
        data: &[u8],
        bytes_per_row: Option<u32>,
        offset: Origin3D,
        size: Extent3D,
    ) -> Result<(), ResourceError>;

    /// Creates a view over a sub-resource range of a texture.
    fn create_texture_view(
        &self,
        descriptor: &ImageViewDescriptor,
    ) -> Result<TextureViewId, ResourceError>;

    /// Destroys a texture view.
    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError>;
}
