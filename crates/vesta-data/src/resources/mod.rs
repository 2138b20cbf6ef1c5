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

//! The built-in resource types.

mod environment_map;
mod material;
mod mesh;
mod shader;
mod texture;

pub use self::environment_map::{EnvironmentMap, EnvironmentMapCreateInfo, EnvironmentMapDocument};
pub use self::material::{Material, MaterialCreateInfo, MaterialDocument};
pub use self::mesh::{Bounds, Mesh, MeshCreateInfo, Vertex};
pub use self::shader::{stage_from_uri, Shader, ShaderCreateInfo};
pub use self::texture::{Texture, TextureCreateInfo};

use crate::resource::ResourceManager;

/// Registers every built-in type, dependencies first, so that shutdown
/// destroys materials before the shaders and textures they reference.
pub fn register_builtin(manager: &mut ResourceManager) {
    manager.register::<Texture>();
    manager.register::<Shader>();
    manager.register::<Mesh>();
    manager.register::<EnvironmentMap>();
    manager.register::<Material>();
}
