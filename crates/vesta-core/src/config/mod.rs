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

//! Configuration of the resource layer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings read once by the composition root at start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    /// URI of the persisted shader cache. `None` disables persistence.
    pub shader_cache_path: Option<String>,
    /// Load the persisted shader cache when the resources are created.
    pub load_shader_cache_on_startup: bool,
    /// Flush newly compiled shaders to the persisted cache on shutdown.
    pub flush_shader_cache_on_shutdown: bool,
    /// Watch source files and reload changed resources when polled.
    pub hot_reload: bool,
    /// Directory watched for changes. Defaults to the file-system root.
    pub watch_root: Option<PathBuf>,
    /// Number of slots reserved up front in each per-type handle table.
    pub initial_slots_per_type: usize,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            shader_cache_path: Some("cache/shaders.bin".to_string()),
            load_shader_cache_on_startup: true,
            flush_shader_cache_on_shutdown: true,
            hot_reload: false,
            watch_root: None,
            initial_slots_per_type: 64,
        }
    }
}

impl ResourceSettings {
    /// Load settings from a JSON string. Missing fields take their default.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load settings from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Save settings to a JSON file.
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
