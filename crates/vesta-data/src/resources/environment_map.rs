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

use super::texture::{create_gpu_texture, decode_rgba8, TextureCreateInfo};
use crate::resource::{Resource, ResourceManager};
use serde::{Deserialize, Serialize};
use vesta_core::renderer::api::{
    Extent3D, ImageViewDescriptor, Origin3D, TextureDimension, TextureFormat, TextureId,
    TextureUsage, TextureViewDimension,
};
use vesta_core::renderer::ResourceError;
use vesta_core::utils::hash::{content_hash, content_hash_parts};

const FACE_COUNT: usize = 6;

/// The on-disk form of an environment map: a RON document listing six face
/// images in `+X, -X, +Y, -Y, +Z, -Z` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentMapDocument {
    /// Face image URIs. Exactly six are required.
    pub faces: Vec<String>,
}

/// Arguments of [`EnvironmentMap::create`].
#[derive(Debug, Clone)]
pub struct EnvironmentMapCreateInfo {
    /// An optional debug label.
    pub label: Option<String>,
    /// Width and height of every face.
    pub face_size: u32,
    /// Tightly packed sRGB RGBA8 texels of each face.
    pub faces: Vec<Vec<u8>>,
}

/// A cube texture assembled from six face images.
///
/// Its content hash covers the document and every face, so editing a single
/// face is enough for [`ResourceManager::reload_if_changed`] to rebuild it.
/// The face URIs are its [`Resource::dependencies`], which lets
/// [`ResourceManager::reload_uri`] route a face edit back to the map.
#[derive(Debug)]
pub struct EnvironmentMap {
    texture: TextureId,
    face_size: u32,
    revision: u32,
    face_hashes: Vec<u64>,
    face_uris: Vec<String>,
    pending: Option<Vec<u8>>,
}

impl EnvironmentMap {
    /// The driver texture, six layers deep.
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// Width and height of every face.
    pub fn face_size(&self) -> u32 {
        self.face_size
    }

    /// Bumped on every successful reload.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Returns `true` while faces are waiting for [`Resource::flush_to_gpu`].
    pub fn has_pending_upload(&self) -> bool {
        self.pending.is_some()
    }

    /// The cube image-view key at the current revision.
    pub fn view_descriptor(&self) -> ImageViewDescriptor {
        ImageViewDescriptor::whole(self.texture, self.revision)
            .with_dimension(TextureViewDimension::Cube)
    }

    fn combined_hash(document: &[u8], face_hashes: &[u64]) -> u64 {
        let face_bytes: Vec<[u8; 8]> = face_hashes.iter().map(|h| h.to_le_bytes()).collect();
        content_hash_parts(
            std::iter::once(document).chain(face_bytes.iter().map(|bytes| bytes.as_slice())),
        )
    }

    fn parse_document(bytes: &[u8], uri: &str) -> Result<EnvironmentMapDocument, ResourceError> {
        let text = std::str::from_utf8(bytes).map_err(|e| ResourceError::parse(uri, e))?;
        let document: EnvironmentMapDocument =
            ron::from_str(text).map_err(|e| ResourceError::parse(uri, e))?;
        if document.faces.len() != FACE_COUNT {
            return Err(ResourceError::parse(
                uri,
                format!("expected {FACE_COUNT} faces, got {}", document.faces.len()),
            ));
        }
        Ok(document)
    }

    fn extent(&self) -> Extent3D {
        Extent3D {
            width: self.face_size,
            height: self.face_size,
            depth_or_array_layers: FACE_COUNT as u32,
        }
    }
}

impl Resource for EnvironmentMap {
    const TYPE_NAME: &'static str = "EnvironmentMap";
    const HOT_RELOAD: bool = true;
    type CreateInfo = EnvironmentMapCreateInfo;

    fn create(manager: &mut ResourceManager, info: Self::CreateInfo) -> Result<Self, ResourceError> {
        let label = info.label.as_deref().unwrap_or("environment map");
        if info.faces.len() != FACE_COUNT {
            return Err(ResourceError::parse(
                label,
                format!("expected {FACE_COUNT} faces, got {}", info.faces.len()),
            ));
        }

        let face_hashes = info.faces.iter().map(|face| content_hash(face)).collect();
        let texture_info = TextureCreateInfo {
            label: info.label.clone(),
            size: Extent3D {
                width: info.face_size,
                height: info.face_size,
                depth_or_array_layers: FACE_COUNT as u32,
            },
            format: TextureFormat::Rgba8UnormSrgb,
            dimension: TextureDimension::D2,
            mip_level_count: 1,
            usage: TextureUsage::COPY_DST | TextureUsage::TEXTURE_BINDING,
            pixels: Some(info.faces.concat()),
        };
        let texture = create_gpu_texture(manager.device().as_ref(), &texture_info)?;

        Ok(EnvironmentMap {
            texture,
            face_size: info.face_size,
            revision: 0,
            face_hashes,
            face_uris: Vec::new(),
            pending: texture_info.pixels,
        })
    }

    fn load_from_memory(
        manager: &mut ResourceManager,
        bytes: &[u8],
        uri: &str,
    ) -> Result<Self, ResourceError> {
        let document = Self::parse_document(bytes, uri)?;

        let mut faces = Vec::with_capacity(FACE_COUNT);
        let mut face_hashes = Vec::with_capacity(FACE_COUNT);
        let mut face_size = None;
        for face_uri in &document.faces {
            let encoded = manager
                .file_system()
                .read_all(face_uri)
                .map_err(|e| ResourceError::io(face_uri.as_str(), e))?;
            let (size, pixels) = decode_rgba8(&encoded, face_uri)?;
            if size.width != size.height {
                return Err(ResourceError::parse(
                    face_uri.as_str(),
                    format!("face is {}x{}, faces must be square", size.width, size.height),
                ));
            }
            match face_size {
                None => face_size = Some(size.width),
                Some(expected) if expected != size.width => {
                    return Err(ResourceError::parse(
                        face_uri.as_str(),
                        format!("face is {0}x{0}, expected {1}x{1}", size.width, expected),
                    ));
                }
                Some(_) => {}
            }
            face_hashes.push(content_hash(&encoded));
            faces.push(pixels);
        }

        let mut map = Self::create(
            manager,
            EnvironmentMapCreateInfo {
                label: Some(uri.to_string()),
                face_size: face_size.unwrap_or(0),
                faces,
            },
        )?;
        // Hash the encoded files, as `fetch_hash` does.
        map.face_hashes = face_hashes;
        map.face_uris = document.faces;
        Ok(map)
    }

    fn destroy(self, manager: &mut ResourceManager) {
        if let Err(err) = manager.device().destroy_texture(self.texture) {
            log::error!("EnvironmentMap: Failed to destroy {:?}: {}", self.texture, err);
        }
    }

    fn dependencies(&self) -> Vec<String> {
        self.face_uris.clone()
    }

    fn source_hash(&self, bytes: &[u8]) -> u64 {
        Self::combined_hash(bytes, &self.face_hashes)
    }

    fn fetch_hash(&self, manager: &ResourceManager, uri: &str) -> Result<u64, ResourceError> {
        let bytes = manager
            .file_system()
            .read_all(uri)
            .map_err(|e| ResourceError::io(uri, e))?;
        let document = Self::parse_document(&bytes, uri)?;
        let face_hashes = encoded_face_hashes(manager, &document)?;
        Ok(Self::combined_hash(&bytes, &face_hashes))
    }

    fn reload(&mut self, manager: &mut ResourceManager, uri: &str) -> Result<(), ResourceError> {
        let bytes = manager
            .file_system()
            .read_all(uri)
            .map_err(|e| ResourceError::io(uri, e))?;
        let mut fresh = Self::load_from_memory(manager, &bytes, uri)?;
        fresh.revision = self.revision.wrapping_add(1);
        std::mem::replace(self, fresh).destroy(manager);
        Ok(())
    }

    fn flush_to_gpu(&mut self, manager: &mut ResourceManager) -> Result<(), ResourceError> {
        let Some(pixels) = &self.pending else {
            return Ok(());
        };
        manager.device().write_texture(
            self.texture,
            pixels,
            Some(self.face_size * TextureFormat::Rgba8UnormSrgb.bytes_per_pixel()),
            Origin3D::default(),
            self.extent(),
        )?;
        self.pending = None;
        log::debug!("EnvironmentMap: Uploaded {:?}", self.texture);
        Ok(())
    }

    fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.pending.as_ref().map_or(0, Vec::len)
    }
}

fn encoded_face_hashes(
    manager: &ResourceManager,
    document: &EnvironmentMapDocument,
) -> Result<Vec<u64>, ResourceError> {
    document
        .faces
        .iter()
        .map(|face_uri| {
            manager
                .file_system()
                .read_all(face_uri)
                .map(|bytes| content_hash(&bytes))
                .map_err(|e| ResourceError::io(face_uri.as_str(), e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_six_faces() {
        let text = r#"(faces: ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"])"#;
        let document = EnvironmentMap::parse_document(text.as_bytes(), "sky.ron")
            .expect("valid document");
        assert_eq!(document.faces[3], "ny.png");

        let five = r#"(faces: ["px.png", "nx.png", "py.png", "ny.png", "pz.png"])"#;
        assert!(matches!(
            EnvironmentMap::parse_document(five.as_bytes(), "sky.ron"),
            Err(ResourceError::Parse { details, .. }) if details == "expected 6 faces, got 5"
        ));
    }

    #[test]
    fn combined_hash_tracks_faces() {
        let doc = b"(faces: [])";
        let a = EnvironmentMap::combined_hash(doc, &[1, 2, 3, 4, 5, 6]);
        let b = EnvironmentMap::combined_hash(doc, &[1, 2, 3, 4, 5, 7]);
        assert_ne!(a, b);
        assert_eq!(a, EnvironmentMap::combined_hash(doc, &[1, 2, 3, 4, 5, 6]));
    }
}
