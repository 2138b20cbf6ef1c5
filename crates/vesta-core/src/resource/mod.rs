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

//! Provides the primitive types shared by every part of the resource system.
//!
//! This module defines the "common language" for resource references: the
//! generation-checked [`Handle`] passed around by rendering and material code,
//! and the [`ResourceMetadata`] the manager records next to every live slot.
//! It has no knowledge of how resources are created or stored; that lives in
//! `vesta-data`.

mod handle;
mod metadata;

pub use handle::*;
pub use metadata::*;
