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

mod common;

use common::{CountingCompiler, LiveDevice};
use std::sync::Arc;
use std::time::{Duration, Instant};
use vesta_core::ResourceSettings;
use vesta_data::resources::Shader;
use vesta_io::NativeFileSystem;
use vesta_sdk::RenderResources;

#[test]
fn edited_shader_is_reloaded_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let shader_path = dir.path().join("shaders/lit.frag.wgsl");
    std::fs::create_dir_all(shader_path.parent().unwrap()).unwrap();
    std::fs::write(&shader_path, "@fragment fn fs_main() {}").unwrap();

    let settings = ResourceSettings {
        shader_cache_path: None,
        hot_reload: true,
        watch_root: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let compiler = CountingCompiler::new();
    let mut resources = RenderResources::builder(
        LiveDevice::new(),
        Arc::new(NativeFileSystem::new(dir.path())),
    )
    .settings(settings)
    .shader_compiler(compiler.clone())
    .build()
    .unwrap();

    let shader = resources
        .manager_mut()
        .load::<Shader>("shaders/lit.frag.wgsl")
        .unwrap();
    assert_eq!(resources.poll_hot_reload(), 0);

    std::fs::write(&shader_path, "@fragment fn fs_main() { discard; }").unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut reloaded = 0;
    while reloaded == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
        reloaded = resources.poll_hot_reload();
    }
    assert_eq!(reloaded, 1, "no reload within the deadline");
    assert_eq!(resources.manager().get(shader).unwrap().revision(), 1);
    assert_eq!(compiler.compiled(), 2);

    resources.shutdown().unwrap();
}
