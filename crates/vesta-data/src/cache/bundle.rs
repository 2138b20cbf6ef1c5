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

use super::objects::{
    DescriptorSetLayoutCache, ImageViewCache, PipelineCache, PipelineLayoutCache,
};
use std::sync::Arc;
use vesta_core::renderer::api::{
    ImageViewDescriptor, PipelineLayoutId, PipelineLayoutShape, PipelineState, RenderPipelineId,
    TextureViewId,
};
use vesta_core::renderer::{GraphicsDevice, ResourceError};

/// The four object caches of one device, kept together so they can be
/// chained and cleared in dependency order.
#[derive(Debug)]
pub struct ObjectCaches {
    /// Bind-set layouts.
    pub set_layouts: DescriptorSetLayoutCache,
    /// Pipeline layouts.
    pub pipeline_layouts: PipelineLayoutCache,
    /// Render pipelines.
    pub pipelines: PipelineCache,
    /// Texture views.
    pub image_views: ImageViewCache,
}

impl ObjectCaches {
    /// Creates four empty caches over `device`.
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            set_layouts: DescriptorSetLayoutCache::new(device.clone()),
            pipeline_layouts: PipelineLayoutCache::new(device.clone()),
            pipelines: PipelineCache::new(device.clone()),
            image_views: ImageViewCache::new(device),
        }
    }

    /// Fetches a pipeline layout, resolving its set layouts first.
    pub fn fetch_pipeline_layout(
        &mut self,
        shape: &PipelineLayoutShape,
    ) -> Result<PipelineLayoutId, ResourceError> {
        self.pipeline_layouts
            .fetch_shape(shape, &mut self.set_layouts)
    }

    /// Fetches a render pipeline, resolving its layout chain first.
    pub fn fetch_pipeline(
        &mut self,
        layout: &PipelineLayoutShape,
        state: &PipelineState,
    ) -> Result<RenderPipelineId, ResourceError> {
        self.pipelines.fetch_with_layout(
            layout,
            state,
            &mut self.pipeline_layouts,
            &mut self.set_layouts,
        )
    }

    /// Fetches a texture view.
    pub fn fetch_image_view(
        &mut self,
        descriptor: &ImageViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        self.image_views.fetch(descriptor)
    }

    /// Total number of cached objects.
    pub fn len(&self) -> usize {
        self.set_layouts.len()
            + self.pipeline_layouts.len()
            + self.pipelines.len()
            + self.image_views.len()
    }

    /// Returns `true` if all four caches are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroys every cached object. Pipelines go before the layouts they
    /// were built on.
    pub fn clear(&mut self) -> usize {
        self.pipelines.clear()
            + self.pipeline_layouts.clear()
            + self.set_layouts.clear()
            + self.image_views.clear()
    }
}

impl Drop for ObjectCaches {
    fn drop(&mut self) {
        // Fields would otherwise drop set layouts before pipelines.
        if !self.is_empty() {
            self.clear();
        }
    }
}
