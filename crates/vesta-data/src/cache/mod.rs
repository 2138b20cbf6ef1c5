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

//! Content-addressed caches of driver objects, and the compiled-shader cache.

mod bundle;
mod object_cache;
mod objects;
mod shader_cache;

pub use self::bundle::ObjectCaches;
pub use self::object_cache::{CacheEntry, CacheStats, CachedObject, ObjectCache};
pub use self::objects::{
    BindSetLayouts, DescriptorSetLayoutCache, ImageViewCache, ImageViews, PipelineCache,
    PipelineLayoutCache, PipelineLayouts, RenderPipelines,
};
pub use self::shader_cache::ShaderCache;
