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

//! Offline tools for the persisted shader cache.

use crate::helpers::*;
use anyhow::{Context, Result};
use std::path::Path;
use vesta_core::renderer::{ShaderCompiler, ShaderStage};
use vesta_data::resources::stage_from_uri;
use vesta_data::ShaderCache;
use vesta_infra::WgslShaderCompiler;
use vesta_io::{uri_for, NativeFileSystem};
use walkdir::WalkDir;

/// One line of `shader-cache inspect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRow {
    pub hash: u64,
    pub stage: ShaderStage,
    pub size: usize,
    pub preview: String,
}

/// Reads the cache file at `path` and returns its entries sorted by hash.
pub fn read_rows(path: &Path) -> Result<Vec<CacheRow>> {
    let (fs, uri) = split(path)?;
    if !path.is_file() {
        anyhow::bail!("No shader cache at '{}'", path.display());
    }

    let mut cache = ShaderCache::new();
    cache
        .load(&fs, &uri)
        .with_context(|| format!("Failed to read shader cache '{}'", path.display()))?;

    let mut rows: Vec<CacheRow> = cache
        .iter()
        .map(|(hash, il)| CacheRow {
            hash,
            stage: il.stage,
            size: il.len(),
            preview: preview(&il.code),
        })
        .collect();
    rows.sort_by_key(|row| row.hash);
    Ok(rows)
}

pub fn inspect(path: &Path) -> Result<()> {
    print_task_start("Inspecting Shader Cache", MAGNIFIER, CYAN);
    let rows = read_rows(path)?;

    println!("{BOLD}{:<18}  {:<8}  {:>8}  first line{RESET}", "hash", "stage", "bytes");
    for row in &rows {
        println!(
            "{:#018x}  {:<8}  {:>8}  {}",
            row.hash,
            format!("{:?}", row.stage),
            row.size,
            row.preview
        );
    }
    let total: usize = rows.iter().map(|row| row.size).sum();
    print_success(&format!("{} shader(s), {} byte(s) of IL", rows.len(), total));
    Ok(())
}

/// Compiles every `*.vert|frag|comp.wgsl` file under `asset_root` into the
/// cache at `cache_uri` (relative to the root). Returns how many new shaders
/// were written.
pub fn warm_into(asset_root: &Path, cache_uri: &str) -> Result<usize> {
    let root = asset_root
        .canonicalize()
        .with_context(|| format!("Asset root '{}' does not exist", asset_root.display()))?;
    let fs = NativeFileSystem::new(&root);
    let compiler = WgslShaderCompiler::new();

    let mut cache = ShaderCache::new();
    cache
        .load(&fs, cache_uri)
        .with_context(|| format!("Failed to read shader cache '{cache_uri}'"))?;

    for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(uri) = uri_for(&root, entry.path()) else {
            continue;
        };
        let Some(stage) = stage_from_uri(&uri) else {
            continue;
        };

        let source = std::fs::read(entry.path())
            .with_context(|| format!("Failed to read '{}'", entry.path().display()))?;
        let hash = compiler.source_hash(stage, &source);
        if cache.contains(hash) {
            log::debug!("xtask: '{}' is already cached", uri);
            continue;
        }
        let il = compiler
            .create_shader_il(stage, &source, &uri)
            .with_context(|| format!("Failed to compile '{uri}'"))?;
        cache.insert(hash, il.stage, il.code);
        println!("{BOLD}{GREEN}  + {RESET}{uri}");
    }

    // A damaged file is rewritten whole, so count what was compiled here.
    let fresh = cache.pending_flush();
    cache
        .flush(&fs, cache_uri)
        .with_context(|| format!("Failed to write shader cache '{cache_uri}'"))?;
    Ok(fresh)
}

pub fn warm(asset_root: &Path, cache_uri: &str) -> Result<()> {
    print_task_start("Warming Shader Cache", PACKAGE, MAGENTA);
    let written = warm_into(asset_root, cache_uri)?;
    print_success(&format!("Wrote {written} new shader(s) to '{cache_uri}'"));
    Ok(())
}

fn split(path: &Path) -> Result<(NativeFileSystem, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("'{}' is not a file path", path.display()))?;
    Ok((NativeFileSystem::new(parent), name.to_string()))
}

fn preview(code: &[u8]) -> String {
    let text = String::from_utf8_lossy(code);
    let line = text.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or("");
    if line.chars().count() > 48 {
        let cut: String = line.chars().take(45).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
