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

use crate::renderer::api::{shader_source_hash, ShaderIl, ShaderStage};
use crate::renderer::error::ShaderError;
use std::fmt::Debug;

/// Turns shader source text into IL a [`GraphicsDevice`](super::GraphicsDevice) accepts.
pub trait ShaderCompiler: Send + Sync + Debug + 'static {
    /// Compiles `source` for `stage`. `uri` is only used in diagnostics.
    fn create_shader_il(
        &self,
        stage: ShaderStage,
        source: &[u8],
        uri: &str,
    ) -> Result<ShaderIl, ShaderError>;

    /// The shader-cache key of `source`, computed without compiling.
    fn source_hash(&self, stage: ShaderStage, source: &[u8]) -> u64 {
        shader_source_hash(stage, source)
    }
}
