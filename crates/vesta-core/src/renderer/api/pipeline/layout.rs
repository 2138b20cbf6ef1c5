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

use crate::renderer::api::bind_set::{BindSetLayoutDescriptor, BindSetLayoutId};
use crate::renderer::api::shader::ShaderStageFlags;

/// An opaque handle to a pipeline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineLayoutId(pub usize);

/// The push-constant block of a pipeline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PushConstantRange {
    /// Stages that can read the push constants.
    pub stages: ShaderStageFlags,
    /// Size of the block in bytes.
    pub size: u32,
}

/// A pipeline layout in terms of already-created bind-set layouts.
///
/// This is what the device consumes and what the pipeline-layout cache keys
/// on: the ordered list of set-layout ids plus the push-constant block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PipelineLayoutDescriptor {
    /// The bind-set layouts, indexed by set number.
    pub set_layouts: Vec<BindSetLayoutId>,
    /// The push-constant block, if any.
    pub push_constants: Option<PushConstantRange>,
}

/// A pipeline layout described by value, before its set layouts exist.
///
/// Resolving a shape goes through the bind-set layout cache first, then the
/// pipeline-layout cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PipelineLayoutShape {
    /// The bind-set layouts, indexed by set number.
    pub set_layouts: Vec<BindSetLayoutDescriptor>,
    /// The push-constant block, if any.
    pub push_constants: Option<PushConstantRange>,
}

impl PipelineLayoutShape {
    /// Pairs the shape's push constants with resolved set-layout ids.
    pub fn with_resolved_sets(&self, set_layouts: Vec<BindSetLayoutId>) -> PipelineLayoutDescriptor {
        PipelineLayoutDescriptor {
            set_layouts,
            push_constants: self.push_constants,
        }
    }
}
