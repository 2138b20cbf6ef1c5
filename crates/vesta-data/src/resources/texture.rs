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
use std::borrow::Cow;
use vesta_core::renderer::api::{
    Extent3D, ImageViewDescriptor, Origin3D, SampleCount, TextureDescriptor, TextureDimension,
    TextureFormat, TextureId, TextureUsage,
};
use vesta_core::renderer::{GraphicsDevice, ResourceError};

/// Arguments of [`Texture::create`].
#[derive(Debug, Clone)]
pub struct TextureCreateInfo {
    /// An optional debug label.
    pub label: Option<String>,
    /// Size of the base level.
    pub size: Extent3D,
    /// Texel format.
    pub format: TextureFormat,
    /// Dimensionality.
    pub dimension: TextureDimension,
    /// Number of mip levels.
    pub mip_level_count: u32,
    /// Allowed usages.
    pub usage: TextureUsage,
    /// Tightly packed texels of the base level, uploaded on the next flush.
    pub pixels: Option<Vec<u8>>,
}

impl TextureCreateInfo {
    /// A sampled sRGB RGBA8 texture with initial contents.
    pub fn rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            label: None,
            size: Extent3D::d2(width, height),
            format: TextureFormat::Rgba8UnormSrgb,
            dimension: TextureDimension::D2,
            mip_level_count: 1,
            usage: TextureUsage::COPY_DST | TextureUsage::TEXTURE_BINDING,
            pixels: Some(pixels),
        }
    }

    /// A render target without initial contents.
    pub fn render_target(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: None,
            size: Extent3D::d2(width, height),
            format,
            dimension: TextureDimension::D2,
            mip_level_count: 1,
            usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
            pixels: None,
        }
    }

    fn descriptor(&self) -> TextureDescriptor<'_> {
        TextureDescriptor {
            label: self.label.as_deref().map(Cow::Borrowed),
            size: self.size,
            mip_level_count: self.mip_level_count,
            sample_count: SampleCount::X1,
            dimension: self.dimension,
            format: self.format,
            usage: self.usage,
        }
    }
}

/// A GPU texture with optional pending CPU-side contents.
///
/// The driver texture is created immediately; texel data is kept on the CPU
/// until [`Resource::flush_to_gpu`] writes it.
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    size: Extent3D,
    format: TextureFormat,
    dimension: TextureDimension,
    mip_level_count: u32,
    revision: u32,
    pending: Option<Vec<u8>>,
}

impl Texture {
    /// The driver texture.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Size of the base level.
    pub fn size(&self) -> Extent3D {
        self.size
    }

    /// Texel format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Dimensionality.
    pub fn dimension(&self) -> TextureDimension {
        self.dimension
    }

    /// Number of mip levels.
    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }

    /// Bumped on every successful reload.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Returns `true` while texels are waiting for [`Resource::flush_to_gpu`].
    pub fn has_pending_upload(&self) -> bool {
        self.pending.is_some()
    }

    /// The image-view key for the whole texture at its current revision.
    pub fn view_descriptor(&self) -> ImageViewDescriptor {
        ImageViewDescriptor::whole(self.id, self.revision)
    }

    fn bytes_per_row(&self) -> u32 {
        self.size.width * self.format.bytes_per_pixel()
    }
}

/// Decodes any format the `image` crate understands into tightly packed RGBA8.
pub(crate) fn decode_rgba8(bytes: &[u8], uri: &str) -> Result<(Extent3D, Vec<u8>), ResourceError> {
    let image = image::load_from_memory(bytes).map_err(|e| ResourceError::parse(uri, e))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((Extent3D::d2(width, height), rgba.into_raw()))
}

/// Creates the driver texture described by `info` after checking the pixel
/// payload matches its base level.
pub(crate) fn create_gpu_texture(
    device: &dyn GraphicsDevice,
    info: &TextureCreateInfo,
) -> Result<TextureId, ResourceError> {
    let descriptor = info.descriptor();
    if let Some(pixels) = &info.pixels {
        let expected = descriptor.base_level_size();
        if pixels.len() != expected {
            log::warn!(
                "Texture: '{}' has {} byte(s) of texels, expected {}",
                info.label.as_deref().unwrap_or("unnamed"),
                pixels.len(),
                expected
            );
            return Err(ResourceError::OutOfBounds);
        }
    }
    device.create_texture(&descriptor)
}

impl Resource for Texture {
    const TYPE_NAME: &'static str = "Texture";
    const HOT_RELOAD: bool = true;
    type CreateInfo = TextureCreateInfo;

    fn create(manager: &mut ResourceManager, info: Self::CreateInfo) -> Result<Self, ResourceError> {
        let id = create_gpu_texture(manager.device().as_ref(), &info)?;
        Ok(Texture {
            id,
            size: info.size,
            format: info.format,
            dimension: info.dimension,
            mip_level_count: info.mip_level_count,
            revision: 0,
            pending: info.pixels,
        })
    }

    fn load_from_memory(
        manager: &mut ResourceManager,
        bytes: &[u8],
        uri: &str,
    ) -> Result<Self, ResourceError> {
        let (size, pixels) = decode_rgba8(bytes, uri)?;
        let mut info = TextureCreateInfo::rgba8(size.width, size.height, pixels);
        info.label = Some(uri.to_string());
        Self::create(manager, info)
    }

    fn destroy(self, manager: &mut ResourceManager) {
        if let Err(err) = manager.device().destroy_texture(self.id) {
            log::error!("Texture: Failed to destroy {:?}: {}", self.id, err);
        }
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
            self.id,
            pixels,
            Some(self.bytes_per_row()),
            Origin3D::default(),
            self.size,
        )?;
        self.pending = None;
        log::debug!("Texture: Uploaded {:?}", self.id);
        Ok(())
    }

    fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.pending.as_ref().map_or(0, Vec::len)
    }
}
