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

use crate::resource::{Resource, ResourceManager};
use vesta_core::renderer::api::{
    shader_source_hash, ShaderModuleDescriptor, ShaderModuleId, ShaderStage, ShaderStageRef,
};
use vesta_core::renderer::{ResourceError, ShaderError};

/// Arguments of [`Shader::create`].
#[derive(Debug, Clone)]
pub struct ShaderCreateInfo {
    /// An optional debug label.
    pub label: Option<String>,
    /// The stage the source is compiled for.
    pub stage: ShaderStage,
    /// The source text.
    pub source: Vec<u8>,
}

/// A shader module built from source, going through the shader cache.
#[derive(Debug)]
pub struct Shader {
    module: ShaderModuleId,
    stage: ShaderStage,
    il_hash: u64,
    revision: u32,
}

/// Infers the stage of a shader file from its name: `*.vert.wgsl`,
/// `*.frag.wgsl` or `*.comp.wgsl`.
pub fn stage_from_uri(uri: &str) -> Option<ShaderStage> {
    let stem = uri.strip_suffix(".wgsl")?;
    match stem.rsplit('.').next()? {
        "vert" | "vs" => Some(ShaderStage::Vertex),
        "frag" | "fs" => Some(ShaderStage::Fragment),
        "comp" | "cs" => Some(ShaderStage::Compute),
        _ => None,
    }
}

impl Shader {
    /// The device module.
    pub fn module(&self) -> ShaderModuleId {
        self.module
    }

    /// The compiled stage.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// The shader-cache key the module was built from.
    pub fn il_hash(&self) -> u64 {
        self.il_hash
    }

    /// Bumped on every successful reload.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// A pipeline stage reference to `entry_point` at the current revision.
    pub fn stage_ref(&self, entry_point: &str) -> ShaderStageRef {
        ShaderStageRef::new(self.module, entry_point, self.revision)
    }

    fn build(
        manager: &mut ResourceManager,
        stage: ShaderStage,
        source: &[u8],
        label: &str,
    ) -> Result<Self, ResourceError> {
        let hash = match manager.shader_compiler() {
            Some(compiler) => compiler.source_hash(stage, source),
            None => shader_source_hash(stage, source),
        };

        let il = match manager.shader_cache().get(hash) {
            Some(il) => {
                log::debug!("Shader: Cache hit for '{}' ({:#018x})", label, hash);
                il
            }
            None => {
                let compiler = manager
                    .shader_compiler()
                    .cloned()
                    .ok_or(ShaderError::CompilerUnavailable)?;
                let compiled = compiler.create_shader_il(stage, source, label)?;
                log::debug!(
                    "Shader: Compiled '{}' ({} byte(s) of IL)",
                    label,
                    compiled.len()
                );
                manager
                    .shader_cache_mut()
                    .insert(hash, compiled.stage, compiled.code)
            }
        };

        let module = manager.device().create_shader_module(&ShaderModuleDescriptor {
            label: Some(label),
            il: &il,
        })?;
        Ok(Shader {
            module,
            stage,
            il_hash: hash,
            revision: 0,
        })
    }
}

impl Resource for Shader {
    const TYPE_NAME: &'static str = "Shader";
    const HOT_RELOAD: bool = true;
    type CreateInfo = ShaderCreateInfo;

    fn create(manager: &mut ResourceManager, info: Self::CreateInfo) -> Result<Self, ResourceError> {
        let label = info.label.as_deref().unwrap_or("shader");
        Self::build(manager, info.stage, &info.source, label)
    }

    fn load_from_memory(
        manager: &mut ResourceManager,
        bytes: &[u8],
        uri: &str,
    ) -> Result<Self, ResourceError> {
        let stage = stage_from_uri(uri).ok_or_else(|| {
            ResourceError::parse(uri, "cannot infer the stage, expected *.vert|frag|comp.wgsl")
        })?;
        Self::build(manager, stage, bytes, uri)
    }

    fn destroy(self, manager: &mut ResourceManager) {
        if let Err(err) = manager.device().destroy_shader_module(self.module) {
            log::error!("Shader: Failed to destroy {:?}: {}", self.module, err);
        }
    }

    fn source_hash(&self, bytes: &[u8]) -> u64 {
        shader_source_hash(self.stage, bytes)
    }

    fn reload(&mut self, manager: &mut ResourceManager, uri: &str) -> Result<(), ResourceError> {
        let bytes = manager
            .file_system()
            .read_all(uri)
            .map_err(|e| ResourceError::io(uri, e))?;
        let mut fresh = Self::build(manager, self.stage, &bytes, uri)?;
        fresh.revision = self.revision.wrapping_add(1);
        std::mem::replace(self, fresh).destroy(manager);
        Ok(())
    }
}
