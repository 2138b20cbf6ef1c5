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

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A typed, generation-checked reference to a resource slot.
///
/// A handle is a plain `{index, generation}` pair. It does not own the data it
/// refers to; the resource manager is the sole owner of the referenced storage.
/// Copying a handle is free and does not touch any reference count.
///
/// A handle is *valid* while its `index` is in range of the owning table and its
/// `generation` matches the slot's current generation. Once the slot is
/// destroyed its generation moves on, so every handle captured before the
/// destruction fails lookups forever, even after the index is reused.
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// A handle that never resolves. Useful as a default for handle-typed fields.
    pub const INVALID: Self = Self {
        index: u32::MAX,
        generation: 0,
        _marker: PhantomData,
    };

    /// Builds a handle from its raw parts.
    ///
    /// This is intended for the owning table; a handle forged by hand will
    /// simply fail lookups unless it happens to match a live slot.
    pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// The slot index this handle points at.
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// The generation the slot had when this handle was issued.
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Returns `true` for the [`Handle::INVALID`] sentinel.
    ///
    /// A `false` result does not mean the handle is live; only the owning table
    /// can answer that.
    pub const fn is_invalid(&self) -> bool {
        self.generation == 0
    }

    /// Erases the resource type, keeping the raw `{index, generation}` pair.
    pub const fn erase(self) -> RawHandle {
        RawHandle {
            index: self.index,
            generation: self.generation,
        }
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_name = std::any::type_name::<T>();
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        write!(f, "Handle<{short}>({}v{})", self.index, self.generation)
    }
}

/// An untyped `{index, generation}` pair, used where the resource type is
/// tracked separately (e.g. the URI index of the manager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle {
    /// The slot index.
    pub index: u32,
    /// The slot generation at issue time.
    pub generation: u32,
}

impl RawHandle {
    /// Re-attaches a resource type to the raw pair.
    pub const fn typed<T>(self) -> Handle<T> {
        Handle::from_raw_parts(self.index, self.generation)
    }
}
