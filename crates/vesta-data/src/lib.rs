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

//! Resource storage and driver-object caching.
//!
//! - [`resource`]: generational handle tables and the [`ResourceManager`].
//! - [`cache`]: descriptor-keyed caches of layouts, pipelines and views, and
//!   the persistent [`ShaderCache`].
//! - [`resources`]: the built-in resource types.

#![warn(missing_docs)]

pub mod cache;
pub mod resource;
pub mod resources;

pub use cache::{ObjectCaches, ShaderCache};
pub use resource::{HandleTable, Resource, ResourceManager};
