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

//! Textures and image views.

use super::common::{Extent3D, SampleCount, TextureFormat};
use crate::vesta_bitflags;
use std::borrow::Cow;

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// A one-dimensional texture.
    D1,
    /// A two-dimensional texture (also used for cube maps and arrays).
    D2,
    /// A three-dimensional (volumetric) texture.
    D3,
}

/// The dimensionality through which a texture is viewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureViewDimension {
    /// A view of a 1D texture.
    D1,
    /// A view of a 2D texture.
    D2,
    /// A view of a 2D texture array.
    D2Array,
    /// A view of a cubemap texture (6 layers of a 2D texture).
    Cube,
    /// A view of a cubemap texture array.
    CubeArray,
    /// A view of a 3D texture.
    D3,
}

/// Which aspect of a texture a view accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageAspect {
    /// Access all aspects (color, depth, and stencil).
    #[default]
    All,
    /// Access only the stencil component of a depth/stencil texture.
    StencilOnly,
    /// Access only the depth component of a depth/stencil texture.
    DepthOnly,
}

vesta_bitflags! {
    /// A set of flags describing the allowed usages of a [`TextureId`].
    pub struct TextureUsage: u32 {
        /// The texture can be used as the source of a copy operation.
        const COPY_SRC = 1 << 0;
        /// The texture can be used as the destination of a copy operation.
        const COPY_DST = 1 << 1;
        /// The texture can be bound in a shader for sampling.
        const TEXTURE_BINDING = 1 << 2;
        /// The texture can be used as a storage texture.
        const STORAGE_BINDING = 1 << 3;
        /// The texture can be used as a render attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

/// A descriptor for creating a texture.
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The dimensions (width, height, depth/layers) of the texture.
    pub size: Extent3D,
    /// The number of mipmap levels for the texture.
    pub mip_level_count: u32,
    /// The number of samples per pixel.
    pub sample_count: SampleCount,
    /// The dimensionality of the texture.
    pub dimension: TextureDimension,
    /// The format of the texels in the texture.
    pub format: TextureFormat,
    /// How the texture will be used.
    pub usage: TextureUsage,
}

impl TextureDescriptor<'_> {
    /// Number of bytes in one row of the base mip level.
    pub fn bytes_per_row(&self) -> u32 {
        self.size.width * self.format.bytes_per_pixel()
    }

    /// Number of bytes of the base mip level across all layers.
    pub fn base_level_size(&self) -> usize {
        self.bytes_per_row() as usize
            * self.size.height as usize
            * self.size.depth_or_array_layers as usize
    }
}

/// An opaque handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// An opaque handle to a GPU texture view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewId(pub usize);

/// The cache key of an image view: a texture identity plus a sub-resource range.
///
/// `texture_revision` is the revision of the owning texture resource. A reload
/// bumps it, so views of the old contents are never served for the new ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageViewDescriptor {
    /// The texture being viewed.
    pub texture: TextureId,
    /// Revision of the texture resource the view was requested for.
    pub texture_revision: u32,
    /// Format override; `None` inherits the texture's format.
    pub format: Option<TextureFormat>,
    /// Dimension override; `None` inherits the texture's dimension.
    pub dimension: Option<TextureViewDimension>,
    /// The aspects of the texture to be accessed.
    pub aspect: ImageAspect,
    /// The first mipmap level accessed by the view.
    pub base_mip_level: u32,
    /// Number of mip levels, or `None` for all remaining levels.
    pub mip_level_count: Option<u32>,
    /// The first array layer accessed by the view.
    pub base_array_layer: u32,
    /// Number of array layers, or `None` for all remaining layers.
    pub array_layer_count: Option<u32>,
}

impl ImageViewDescriptor {
    /// A view of the whole texture with inherited format and dimension.
    pub fn whole(texture: TextureId, texture_revision: u32) -> Self {
        Self {
            texture,
            texture_revision,
            format: None,
            dimension: None,
            aspect: ImageAspect::All,
            base_mip_level: 0,
            mip_level_count: None,
            base_array_layer: 0,
            array_layer_count: None,
        }
    }

    /// Restricts the view to `count` mip levels starting at `base`.
    pub fn with_mips(mut self, base: u32, count: u32) -> Self {
        self.base_mip_level = base;
        self.mip_level_count = Some(count);
        self
    }

    /// Restricts the view to `count` array layers starting at `base`.
    pub fn with_layers(mut self, base: u32, count: u32) -> Self {
        self.base_array_layer = base;
        self.array_layer_count = Some(count);
        self
    }

    /// Overrides the view dimension.
    pub fn with_dimension(mut self, dimension: TextureViewDimension) -> Self {
        self.dimension = Some(dimension);
        self
    }
}
