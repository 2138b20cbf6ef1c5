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

//! Bind-set (descriptor-set) layouts.
//!
//! A [`BindSetLayoutDescriptor`] is an owned, hashable value: it is both the
//! argument of the device constructor and the full key kept by the layout
//! cache for equality checks.

use super::common::TextureFormat;
use super::shader::ShaderStageFlags;
use super::texture::TextureViewDimension;
use std::num::{NonZeroU32, NonZeroU64};

/// An opaque handle to a bind-set layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindSetLayoutId(pub usize);

/// The kind of buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferBindingType {
    /// A uniform buffer.
    Uniform,
    /// A storage buffer.
    Storage {
        /// Whether the buffer is read-only in the shader.
        read_only: bool,
    },
}

/// The sample type a shader expects from a sampled texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSampleType {
    /// A floating-point texture sample.
    Float {
        /// Whether the texture can be filtered.
        filterable: bool,
    },
    /// A depth texture sample.
    Depth,
    /// An unsigned integer texture sample.
    Uint,
    /// A signed integer texture sample.
    Sint,
}

/// The kind of sampler binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerBindingType {
    /// A filtering sampler.
    Filtering,
    /// A non-filtering sampler.
    NonFiltering,
    /// A comparison sampler.
    Comparison,
}

/// Access mode of a storage texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageTextureAccess {
    /// Write-only access.
    WriteOnly,
    /// Read-only access.
    ReadOnly,
    /// Read and write access.
    ReadWrite,
}

/// The type of resource bound at a binding slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    /// A buffer binding (uniform or storage).
    Buffer {
        /// The type of buffer binding.
        ty: BufferBindingType,
        /// Whether this buffer has dynamic offsets.
        has_dynamic_offset: bool,
        /// Minimum size required for the buffer binding.
        min_binding_size: Option<NonZeroU64>,
    },
    /// A sampled texture binding.
    Texture {
        /// The type of sampler that can sample this texture.
        sample_type: TextureSampleType,
        /// The dimension of the texture view.
        view_dimension: TextureViewDimension,
        /// Whether the texture is multisampled.
        multisampled: bool,
    },
    /// A storage texture binding.
    StorageTexture {
        /// Shader access mode.
        access: StorageTextureAccess,
        /// Texel format of the bound view.
        format: TextureFormat,
        /// The dimension of the texture view.
        view_dimension: TextureViewDimension,
    },
    /// A sampler binding.
    Sampler(SamplerBindingType),
}

/// One binding of a bind-set layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindSetLayoutEntry {
    /// The binding index (e.g., `@binding(0)` in WGSL).
    pub binding: u32,
    /// Which shader stages can access this binding.
    pub visibility: ShaderStageFlags,
    /// The type of resource being bound.
    pub ty: BindingType,
    /// Array length for binding arrays, `None` for a single resource.
    pub count: Option<NonZeroU32>,
}

impl BindSetLayoutEntry {
    /// A uniform buffer binding.
    pub fn uniform_buffer(binding: u32, visibility: ShaderStageFlags) -> Self {
        Self {
            binding,
            visibility,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    /// A filterable float texture binding.
    pub fn texture(
        binding: u32,
        visibility: ShaderStageFlags,
        view_dimension: TextureViewDimension,
    ) -> Self {
        Self {
            binding,
            visibility,
            ty: BindingType::Texture {
                sample_type: TextureSampleType::Float { filterable: true },
                view_dimension,
                multisampled: false,
            },
            count: None,
        }
    }

    /// A filtering sampler binding.
    pub fn sampler(binding: u32, visibility: ShaderStageFlags) -> Self {
        Self {
            binding,
            visibility,
            ty: BindingType::Sampler(SamplerBindingType::Filtering),
            count: None,
        }
    }
}

/// The ordered list of bindings of one bind set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BindSetLayoutDescriptor {
    /// The entries in this layout, in declaration order.
    pub entries: Vec<BindSetLayoutEntry>,
}

impl BindSetLayoutDescriptor {
    /// Builds a layout from its entries.
    pub fn new(entries: impl Into<Vec<BindSetLayoutEntry>>) -> Self {
        Self {
            entries: entries.into(),
        }
    }
}
