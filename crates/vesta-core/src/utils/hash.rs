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

//! Hashing helpers.
//!
//! Two families are provided:
//! - **Structural hashes** ([`structural_hash`], [`StructuralHashState`]) are
//!   fast and deterministic for a given build. They key in-memory caches and
//!   are never persisted.
//! - **Content hashes** ([`content_hash`], [`content_hash_parts`]) are BLAKE3
//!   digests truncated to 64 bits. They are stable across runs and builds, so
//!   they can be written to disk (shader cache) or compared against a value
//!   computed by a previous process.

use std::hash::{BuildHasher, Hash};

const SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// The hasher builder used for structural cache keys.
pub type StructuralHashState = ahash::RandomState;

/// Returns a [`StructuralHashState`] with fixed seeds.
pub fn structural_hash_state() -> StructuralHashState {
    ahash::RandomState::with_seeds(SEEDS[0], SEEDS[1], SEEDS[2], SEEDS[3])
}

/// Computes the 64-bit structural hash of a descriptor.
pub fn structural_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    BuildHasher::hash_one(&structural_hash_state(), value)
}

/// Computes a stable 64-bit content hash of a byte slice.
pub fn content_hash(bytes: &[u8]) -> u64 {
    truncate(blake3::hash(bytes))
}

/// Computes a stable 64-bit content hash over several byte slices, as if they
/// were concatenated with their lengths as separators.
pub fn content_hash_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> u64 {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    truncate(hasher.finalize())
}

fn truncate(hash: blake3::Hash) -> u64 {
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(head)
}
