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

//! Shader modules and their compiled intermediate representation.

use super::common::ShaderStage;
use crate::utils::hash::content_hash_parts;
use crate::vesta_bitflags;
use std::sync::Arc;

vesta_bitflags! {
    /// The set of shader stages a binding or push-constant range is visible to.
    pub struct ShaderStageFlags: u32 {
        /// Vertex shader stage.
        const VERTEX = 1 << 0;
        /// Fragment shader stage.
        const FRAGMENT = 1 << 1;
        /// Compute shader stage.
        const COMPUTE = 1 << 2;
        /// All graphics stages (vertex + fragment).
        const VERTEX_FRAGMENT = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

impl ShaderStageFlags {
    /// Creates flags from a single shader stage.
    pub const fn from_stage(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => Self::VERTEX,
            ShaderStage::Fragment => Self::FRAGMENT,
            ShaderStage::Compute => Self::COMPUTE,
        }
    }
}

/// Compiled shader intermediate representation, ready to hand to a device.
///
/// The bytes are reference counted: cloning an IL out of the shader cache is
/// cheap and never copies the code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderIl {
    /// The stage this IL was compiled for.
    pub stage: ShaderStage,
    /// The backend-specific code (WGSL text for the wgpu backend).
    pub code: Arc<[u8]>,
}

impl ShaderIl {
    /// Wraps compiled code.
    pub fn new(stage: ShaderStage, code: impl Into<Arc<[u8]>>) -> Self {
        Self {
            stage,
            code: code.into(),
        }
    }

    /// Size of the code in bytes.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Returns `true` if the IL carries no code.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

/// A descriptor for creating a shader module on the device.
#[derive(Debug, Clone)]
pub struct ShaderModuleDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// The compiled code.
    pub il: &'a ShaderIl,
}

/// An opaque handle to a compiled shader module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderModuleId(pub usize);

/// The stable hash of a shader's stage and raw source bytes.
///
/// This is the key of the shader cache. It does not depend on the URI or on
/// the compiler, so identical source never compiles twice, even across runs.
pub fn shader_source_hash(stage: ShaderStage, source: &[u8]) -> u64 {
    content_hash_parts([[stage.tag()].as_slice(), source])
}
