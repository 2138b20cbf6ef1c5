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

//! # Vesta Core
//!
//! Foundational crate containing the handle types, renderer descriptors and
//! interface contracts (device, shader compiler, file system) shared by the
//! resource manager and the driver-object caches.

#![warn(missing_docs)]

pub mod config;
pub mod renderer;
pub mod resource;
pub mod utils;
pub mod vfs;

pub use config::ResourceSettings;
pub use resource::{Handle, ResourceMetadata};
