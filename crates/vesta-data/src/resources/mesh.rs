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
use ahash::AHashMap;
use bytemuck::{Pod, Zeroable};
use std::borrow::Cow;
use vesta_core::renderer::api::{
    BufferDescriptor, BufferId, BufferUsage, IndexFormat, VertexBufferLayoutDescriptor,
    VertexFormat,
};
use vesta_core::renderer::ResourceError;

/// The interleaved vertex layout of every [`Mesh`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal, zero when the source has none.
    pub normal: [f32; 3],
    /// Texture coordinates, zero when the source has none.
    pub uv: [f32; 2],
}

impl Vertex {
    /// The vertex buffer layout matching this struct, at locations 0..3.
    pub fn layout() -> VertexBufferLayoutDescriptor {
        VertexBufferLayoutDescriptor::packed(
            0,
            &[
                VertexFormat::Float32x3,
                VertexFormat::Float32x3,
                VertexFormat::Float32x2,
            ],
        )
    }
}

/// Arguments of [`Mesh::create`].
#[derive(Debug, Clone, Default)]
pub struct MeshCreateInfo {
    /// An optional debug label.
    pub label: Option<String>,
    /// The vertices.
    pub vertices: Vec<Vertex>,
    /// Triangle-list indices. Empty for non-indexed drawing.
    pub indices: Vec<u32>,
}

/// An axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner.
    pub min: [f32; 3],
    /// Maximum corner.
    pub max: [f32; 3],
}

impl Bounds {
    fn of(vertices: &[Vertex]) -> Self {
        let mut bounds = Bounds {
            min: [f32::MAX; 3],
            max: [f32::MIN; 3],
        };
        for vertex in vertices {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(vertex.position[axis]);
                bounds.max[axis] = bounds.max[axis].max(vertex.position[axis]);
            }
        }
        bounds
    }
}

/// Vertex and index buffers on the device.
///
/// Unlike textures, mesh data is uploaded at creation; nothing stays on the
/// CPU.
#[derive(Debug)]
pub struct Mesh {
    vertex_buffer: BufferId,
    index_buffer: Option<BufferId>,
    vertex_count: u32,
    index_count: u32,
    bounds: Bounds,
}

impl Mesh {
    /// The vertex buffer.
    pub fn vertex_buffer(&self) -> BufferId {
        self.vertex_buffer
    }

    /// The index buffer, if the mesh is indexed.
    pub fn index_buffer(&self) -> Option<(BufferId, IndexFormat)> {
        self.index_buffer.map(|id| (id, IndexFormat::Uint32))
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of indices, zero for non-indexed meshes.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// The bounding box of all positions.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// Parses a Wavefront OBJ file. Every model in the file is merged into one
/// vertex/index list.
fn parse_obj(bytes: &[u8], uri: &str) -> Result<MeshCreateInfo, ResourceError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ResourceError::parse(uri, e))?;
    let (models, _materials) = tobj::load_obj_buf(
        &mut std::io::Cursor::new(text),
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |_| Ok((Vec::new(), AHashMap::new())),
    )
    .map_err(|e| ResourceError::parse(uri, e))?;

    let mut info = MeshCreateInfo {
        label: Some(uri.to_string()),
        ..Default::default()
    };
    for model in &models {
        let mesh = &model.mesh;
        let base = info.vertices.len() as u32;
        let count = mesh.positions.len() / 3;
        for i in 0..count {
            let mut vertex = Vertex {
                position: [
                    mesh.positions[3 * i],
                    mesh.positions[3 * i + 1],
                    mesh.positions[3 * i + 2],
                ],
                ..Default::default()
            };
            if mesh.normals.len() >= 3 * (i + 1) {
                vertex.normal = [
                    mesh.normals[3 * i],
                    mesh.normals[3 * i + 1],
                    mesh.normals[3 * i + 2],
                ];
            }
            if mesh.texcoords.len() >= 2 * (i + 1) {
                vertex.uv = [mesh.texcoords[2 * i], mesh.texcoords[2 * i + 1]];
            }
            info.vertices.push(vertex);
        }
        info.indices.extend(mesh.indices.iter().map(|index| base + index));
    }

    if info.vertices.is_empty() {
        return Err(ResourceError::parse(uri, "no vertices found"));
    }
    Ok(info)
}

impl Resource for Mesh {
    const TYPE_NAME: &'static str = "Mesh";
    const HOT_RELOAD: bool = true;
    type CreateInfo = MeshCreateInfo;

    fn create(manager: &mut ResourceManager, info: Self::CreateInfo) -> Result<Self, ResourceError> {
        let label = info.label.as_deref().unwrap_or("mesh");
        if info.vertices.is_empty() {
            return Err(ResourceError::parse(label, "no vertices"));
        }
        if let Some(bad) = info.indices.iter().find(|&&i| i as usize >= info.vertices.len()) {
            log::warn!(
                "Mesh: '{}' index {} is past its {} vertices",
                label,
                bad,
                info.vertices.len()
            );
            return Err(ResourceError::OutOfBounds);
        }

        let device = manager.device();
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&info.vertices);
        let vertex_buffer = device.create_buffer_with_data(
            &BufferDescriptor {
                label: Some(Cow::Owned(format!("{label} vertices"))),
                size: vertex_bytes.len() as u64,
                usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
                mapped_at_creation: false,
            },
            vertex_bytes,
        )?;

        let index_buffer = if info.indices.is_empty() {
            None
        } else {
            let index_bytes: &[u8] = bytemuck::cast_slice(&info.indices);
            let created = device.create_buffer_with_data(
                &BufferDescriptor {
                    label: Some(Cow::Owned(format!("{label} indices"))),
                    size: index_bytes.len() as u64,
                    usage: BufferUsage::INDEX | BufferUsage::COPY_DST,
                    mapped_at_creation: false,
                },
                index_bytes,
            );
            match created {
                Ok(id) => Some(id),
                Err(err) => {
                    // Keep creation all-or-nothing.
                    if let Err(cleanup) = device.destroy_buffer(vertex_buffer) {
                        log::error!("Mesh: Failed to destroy {:?}: {}", vertex_buffer, cleanup);
                    }
                    return Err(err);
                }
            }
        };

        Ok(Mesh {
            vertex_buffer,
            index_buffer,
            vertex_count: info.vertices.len() as u32,
            index_count: info.indices.len() as u32,
            bounds: Bounds::of(&info.vertices),
        })
    }

    fn load_from_memory(
        manager: &mut ResourceManager,
        bytes: &[u8],
        uri: &str,
    ) -> Result<Self, ResourceError> {
        let info = parse_obj(bytes, uri)?;
        Self::create(manager, info)
    }

    fn destroy(self, manager: &mut ResourceManager) {
        let device = manager.device();
        for id in std::iter::once(self.vertex_buffer).chain(self.index_buffer) {
            if let Err(err) = device.destroy_buffer(id) {
                log::error!("Mesh: Failed to destroy {:?}: {}", id, err);
            }
        }
    }
}
