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

use super::mesh::Vertex;
use super::shader::Shader;
use super::texture::Texture;
use crate::resource::{Resource, ResourceManager};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vesta_core::renderer::api::{
    BlendStateDescriptor, ColorTargetStateDescriptor, CullMode, DepthStencilStateDescriptor,
    ImageViewDescriptor, PipelineState, PrimitiveStateDescriptor, TextureFormat,
};
use vesta_core::renderer::ResourceError;
use vesta_core::resource::Handle;

fn default_vertex_entry() -> String {
    "vs_main".to_string()
}

fn default_fragment_entry() -> String {
    "fs_main".to_string()
}

/// The on-disk form of a material: a RON document naming its dependencies.
///
/// ```ron
/// (
///     vertex_shader: "shaders/lit.vert.wgsl",
///     fragment_shader: Some("shaders/lit.frag.wgsl"),
///     textures: { "albedo": "textures/brick.png" },
///     parameters: { "roughness": 0.6 },
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDocument {
    /// URI of the vertex shader.
    pub vertex_shader: String,
    /// URI of the fragment shader.
    #[serde(default)]
    pub fragment_shader: Option<String>,
    /// Vertex entry point.
    #[serde(default = "default_vertex_entry")]
    pub vertex_entry: String,
    /// Fragment entry point.
    #[serde(default = "default_fragment_entry")]
    pub fragment_entry: String,
    /// Texture URIs by binding slot name.
    #[serde(default)]
    pub textures: BTreeMap<String, String>,
    /// Scalar parameters by name.
    #[serde(default)]
    pub parameters: BTreeMap<String, f32>,
    /// Disables back-face culling.
    #[serde(default)]
    pub double_sided: bool,
    /// Enables alpha blending on the color target.
    #[serde(default)]
    pub alpha_blend: bool,
}

/// Arguments of [`Material::create`]. The material takes its own reference
/// on every handle.
#[derive(Debug, Clone)]
pub struct MaterialCreateInfo {
    /// The vertex shader.
    pub vertex_shader: Handle<Shader>,
    /// The fragment shader.
    pub fragment_shader: Option<Handle<Shader>>,
    /// Textures by binding slot name.
    pub textures: Vec<(String, Handle<Texture>)>,
    /// Scalar parameters by name.
    pub parameters: BTreeMap<String, f32>,
    /// Disables back-face culling.
    pub double_sided: bool,
    /// Enables alpha blending on the color target.
    pub alpha_blend: bool,
}

/// Shaders, textures and parameters bundled for drawing.
///
/// A material owns one reference on each of its dependencies and releases
/// them when destroyed. It holds no driver object of its own.
#[derive(Debug)]
pub struct Material {
    vertex_shader: Handle<Shader>,
    fragment_shader: Option<Handle<Shader>>,
    vertex_entry: String,
    fragment_entry: String,
    textures: Vec<(String, Handle<Texture>)>,
    parameters: BTreeMap<String, f32>,
    double_sided: bool,
    alpha_blend: bool,
}

impl Material {
    /// The vertex shader.
    pub fn vertex_shader(&self) -> Handle<Shader> {
        self.vertex_shader
    }

    /// The fragment shader.
    pub fn fragment_shader(&self) -> Option<Handle<Shader>> {
        self.fragment_shader
    }

    /// The texture bound to `slot`.
    pub fn texture(&self, slot: &str) -> Option<Handle<Texture>> {
        self.textures
            .iter()
            .find(|(name, _)| name == slot)
            .map(|(_, handle)| *handle)
    }

    /// All textures by slot.
    pub fn textures(&self) -> &[(String, Handle<Texture>)] {
        &self.textures
    }

    /// The scalar parameter `name`.
    pub fn parameter(&self, name: &str) -> Option<f32> {
        self.parameters.get(name).copied()
    }

    /// Builds the pipeline state of this material for the given targets.
    ///
    /// Shader revisions are part of the result, so a reloaded shader yields a
    /// different pipeline-cache key.
    pub fn pipeline_state(
        &self,
        manager: &ResourceManager,
        color_format: TextureFormat,
        depth_format: Option<TextureFormat>,
    ) -> Result<PipelineState, ResourceError> {
        let vertex = manager
            .get(self.vertex_shader)
            .ok_or(ResourceError::InvalidHandle)?
            .stage_ref(&self.vertex_entry);
        let fragment = match self.fragment_shader {
            Some(handle) => Some(
                manager
                    .get(handle)
                    .ok_or(ResourceError::InvalidHandle)?
                    .stage_ref(&self.fragment_entry),
            ),
            None => None,
        };

        let mut color_target = ColorTargetStateDescriptor::opaque(color_format);
        if self.alpha_blend {
            color_target.blend = Some(BlendStateDescriptor::ALPHA_BLENDING);
        }

        Ok(PipelineState {
            vertex,
            fragment,
            vertex_buffers: vec![Vertex::layout()],
            primitive: PrimitiveStateDescriptor {
                cull_mode: if self.double_sided {
                    CullMode::None
                } else {
                    CullMode::Back
                },
                ..Default::default()
            },
            depth_stencil: depth_format.map(DepthStencilStateDescriptor::depth_less),
            color_targets: vec![color_target],
            multisample: Default::default(),
        })
    }

    /// Image-view keys of every live texture, by slot.
    pub fn texture_views(&self, manager: &ResourceManager) -> Vec<(&str, ImageViewDescriptor)> {
        self.textures
            .iter()
            .filter_map(|(slot, handle)| {
                manager
                    .get(*handle)
                    .map(|texture| (slot.as_str(), texture.view_descriptor()))
            })
            .collect()
    }
}

impl Resource for Material {
    const TYPE_NAME: &'static str = "Material";
    const HOT_RELOAD: bool = true;
    type CreateInfo = MaterialCreateInfo;

    fn create(manager: &mut ResourceManager, info: Self::CreateInfo) -> Result<Self, ResourceError> {
        let mut material = Material {
            vertex_shader: info.vertex_shader,
            fragment_shader: None,
            vertex_entry: default_vertex_entry(),
            fragment_entry: default_fragment_entry(),
            textures: Vec::with_capacity(info.textures.len()),
            parameters: info.parameters,
            double_sided: info.double_sided,
            alpha_blend: info.alpha_blend,
        };
        manager.acquire(info.vertex_shader)?;

        let acquired = (|| -> Result<(), ResourceError> {
            if let Some(fragment) = info.fragment_shader {
                manager.acquire(fragment)?;
                material.fragment_shader = Some(fragment);
            }
            for (slot, texture) in info.textures {
                manager.acquire(texture)?;
                material.textures.push((slot, texture));
            }
            Ok(())
        })();

        match acquired {
            Ok(()) => Ok(material),
            Err(err) => {
                material.destroy(manager);
                Err(err)
            }
        }
    }

    fn load_from_memory(
        manager: &mut ResourceManager,
        bytes: &[u8],
        uri: &str,
    ) -> Result<Self, ResourceError> {
        let text = std::str::from_utf8(bytes).map_err(|e| ResourceError::parse(uri, e))?;
        let document: MaterialDocument =
            ron::from_str(text).map_err(|e| ResourceError::parse(uri, e))?;

        let mut material = Material {
            vertex_shader: manager.load(&document.vertex_shader)?,
            fragment_shader: None,
            vertex_entry: document.vertex_entry,
            fragment_entry: document.fragment_entry,
            textures: Vec::with_capacity(document.textures.len()),
            parameters: document.parameters,
            double_sided: document.double_sided,
            alpha_blend: document.alpha_blend,
        };

        let loaded = (|| -> Result<(), ResourceError> {
            if let Some(fragment) = &document.fragment_shader {
                material.fragment_shader = Some(manager.load(fragment)?);
            }
            for (slot, texture) in &document.textures {
                let handle = manager.load(texture)?;
                material.textures.push((slot.clone(), handle));
            }
            Ok(())
        })();

        match loaded {
            Ok(()) => Ok(material),
            Err(err) => {
                material.destroy(manager);
                Err(err)
            }
        }
    }

    fn destroy(self, manager: &mut ResourceManager) {
        manager.release(self.vertex_shader);
        if let Some(fragment) = self.fragment_shader {
            manager.release(fragment);
        }
        for (_, texture) in self.textures {
            manager.release(texture);
        }
    }
}
