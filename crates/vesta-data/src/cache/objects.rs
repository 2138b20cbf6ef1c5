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

//! The four driver-object families that are cached by descriptor.

use super::object_cache::{CachedObject, ObjectCache};
use std::hash::BuildHasher;
use vesta_core::renderer::api::{
    BindSetLayoutDescriptor, BindSetLayoutId, ImageViewDescriptor, PipelineLayoutDescriptor,
    PipelineLayoutId, PipelineLayoutShape, PipelineState, RenderPipelineDescriptor,
    RenderPipelineId, TextureViewId,
};
use vesta_core::renderer::{GraphicsDevice, ResourceError};
use vesta_core::utils::hash::StructuralHashState;

/// Marker for bind-set (descriptor-set) layouts.
#[derive(Debug)]
pub enum BindSetLayouts {}

impl CachedObject for BindSetLayouts {
    const NAME: &'static str = "DescriptorSetLayout";
    type Key = BindSetLayoutDescriptor;
    type Id = BindSetLayoutId;

    fn create(device: &dyn GraphicsDevice, key: &Self::Key) -> Result<Self::Id, ResourceError> {
        device.create_bind_set_layout(key)
    }

    fn destroy(device: &dyn GraphicsDevice, id: Self::Id) -> Result<(), ResourceError> {
        device.destroy_bind_set_layout(id)
    }
}

/// Marker for pipeline layouts.
#[derive(Debug)]
pub enum PipelineLayouts {}

impl CachedObject for PipelineLayouts {
    const NAME: &'static str = "PipelineLayout";
    type Key = PipelineLayoutDescriptor;
    type Id = PipelineLayoutId;

    fn create(device: &dyn GraphicsDevice, key: &Self::Key) -> Result<Self::Id, ResourceError> {
        device.create_pipeline_layout(key)
    }

    fn destroy(device: &dyn GraphicsDevice, id: Self::Id) -> Result<(), ResourceError> {
        device.destroy_pipeline_layout(id)
    }
}

/// Marker for render pipelines.
#[derive(Debug)]
pub enum RenderPipelines {}

impl CachedObject for RenderPipelines {
    const NAME: &'static str = "Pipeline";
    type Key = RenderPipelineDescriptor;
    type Id = RenderPipelineId;

    fn create(device: &dyn GraphicsDevice, key: &Self::Key) -> Result<Self::Id, ResourceError> {
        device.create_render_pipeline(key)
    }

    fn destroy(device: &dyn GraphicsDevice, id: Self::Id) -> Result<(), ResourceError> {
        device.destroy_render_pipeline(id)
    }
}

/// Marker for texture views.
#[derive(Debug)]
pub enum ImageViews {}

impl CachedObject for ImageViews {
    const NAME: &'static str = "ImageView";
    type Key = ImageViewDescriptor;
    type Id = TextureViewId;

    fn create(device: &dyn GraphicsDevice, key: &Self::Key) -> Result<Self::Id, ResourceError> {
        device.create_texture_view(key)
    }

    fn destroy(device: &dyn GraphicsDevice, id: Self::Id) -> Result<(), ResourceError> {
        device.destroy_texture_view(id)
    }
}

/// Caches bind-set layouts by their ordered entries.
pub type DescriptorSetLayoutCache<S = StructuralHashState> = ObjectCache<BindSetLayouts, S>;
/// Caches pipeline layouts by set-layout ids and push constants.
pub type PipelineLayoutCache<S = StructuralHashState> = ObjectCache<PipelineLayouts, S>;
/// Caches render pipelines by layout, shader revisions and fixed-function state.
pub type PipelineCache<S = StructuralHashState> = ObjectCache<RenderPipelines, S>;
/// Caches texture views by texture, texture revision and sub-resource range.
pub type ImageViewCache<S = StructuralHashState> = ObjectCache<ImageViews, S>;

impl<S: BuildHasher> ObjectCache<PipelineLayouts, S> {
    /// Resolves every set layout of `shape` through `set_layouts`, then
    /// fetches the pipeline layout built from the resulting ids.
    pub fn fetch_shape<S2: BuildHasher>(
        &mut self,
        shape: &PipelineLayoutShape,
        set_layouts: &mut ObjectCache<BindSetLayouts, S2>,
    ) -> Result<PipelineLayoutId, ResourceError> {
        let ids = shape
            .set_layouts
            .iter()
            .map(|set| set_layouts.fetch(set))
            .collect::<Result<Vec<_>, _>>()?;
        self.fetch(&shape.with_resolved_sets(ids))
    }
}

impl<S: BuildHasher> ObjectCache<RenderPipelines, S> {
    /// Fetches the pipeline for `state` on an already resolved layout.
    ///
    /// The state is only cloned on a miss.
    pub fn fetch_state(
        &mut self,
        layout: PipelineLayoutId,
        state: &PipelineState,
    ) -> Result<RenderPipelineId, ResourceError> {
        // Hashes exactly like `RenderPipelineDescriptor { layout, state }`.
        self.fetch_with(
            &(layout, state),
            |key| key.layout == layout && key.state == *state,
            || RenderPipelineDescriptor {
                layout,
                state: state.clone(),
            },
        )
    }

    /// Resolves the whole chain: set layouts, then the pipeline layout, then
    /// the pipeline.
    pub fn fetch_with_layout<S2: BuildHasher, S3: BuildHasher>(
        &mut self,
        layout: &PipelineLayoutShape,
        state: &PipelineState,
        layouts: &mut ObjectCache<PipelineLayouts, S2>,
        set_layouts: &mut ObjectCache<BindSetLayouts, S3>,
    ) -> Result<RenderPipelineId, ResourceError> {
        let layout = layouts.fetch_shape(layout, set_layouts)?;
        self.fetch_state(layout, state)
    }
}
