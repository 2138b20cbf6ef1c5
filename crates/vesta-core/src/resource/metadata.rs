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

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Bookkeeping the manager keeps next to every live resource slot.
///
/// Procedural resources (created from in-memory arguments) have no
/// `source_uri` and are never considered for reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// The URI the resource was loaded from, if any.
    pub source_uri: Option<String>,

    /// The content hash observed at load time or at the last reload check.
    pub content_hash: u64,

    /// Seconds since the Unix epoch (truncated to 32 bits) of the last time
    /// `content_hash` was recomputed.
    pub last_checked_timestamp: u32,
}

impl ResourceMetadata {
    /// Metadata for a resource created from in-memory arguments.
    pub fn procedural() -> Self {
        Self::default()
    }

    /// Metadata for a resource loaded from `uri` whose source hashed to `content_hash`.
    pub fn from_source(uri: impl Into<String>, content_hash: u64) -> Self {
        Self {
            source_uri: Some(uri.into()),
            content_hash,
            last_checked_timestamp: now_timestamp(),
        }
    }

    /// Records a freshly computed content hash.
    pub fn touch(&mut self, content_hash: u64) {
        self.content_hash = content_hash;
        self.last_checked_timestamp = now_timestamp();
    }
}

/// The current wall-clock time, as stored in [`ResourceMetadata::last_checked_timestamp`].
pub fn now_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
