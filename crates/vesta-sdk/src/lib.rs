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

//! The public-facing entry point of Vesta.
//!
//! [`RenderResources`] wires a device, a file system and an optional shader
//! compiler into a [`ResourceManager`] and the driver-object caches, loads
//! the persisted shader cache at start-up and tears everything down in a
//! fixed order at shutdown.

#![warn(missing_docs)]

mod render_resources;

pub use render_resources::{RenderResources, RenderResourcesBuilder, ShutdownReport};

/// Re-exports for applications.
pub mod prelude {
    pub use crate::{RenderResources, RenderResourcesBuilder};
    pub use vesta_core::renderer::{
        GraphicsDevice, ImageViewDescriptor, PipelineLayoutShape, PipelineState, ResourceError,
        ShaderCompiler, ShaderStage, TextureFormat,
    };
    pub use vesta_core::vfs::FileSystem;
    pub use vesta_core::{Handle, ResourceSettings};
    pub use vesta_data::resources::{
        EnvironmentMap, Material, Mesh, Shader, Texture, TextureCreateInfo,
    };
    pub use vesta_data::{ObjectCaches, Resource, ResourceManager};
}
