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

use std::time::{Duration, Instant};
use vesta_core::vfs::FileSystem;
use vesta_io::{HotReloadWatcher, NativeFileSystem};

#[test]
fn watcher_reports_writes_as_uris() {
    let dir = tempfile::tempdir().unwrap();
    let fs = NativeFileSystem::new(dir.path());
    fs.write_all("shaders/lit.frag.wgsl", b"// v1").unwrap();

    let watcher = HotReloadWatcher::new(dir.path()).unwrap();
    fs.write_all("shaders/lit.frag.wgsl", b"// v2").unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seen = Vec::new();
    while Instant::now() < deadline && !seen.iter().any(|uri| uri == "shaders/lit.frag.wgsl") {
        seen.extend(watcher.wait(Duration::from_millis(200)));
    }
    assert!(
        seen.iter().any(|uri| uri == "shaders/lit.frag.wgsl"),
        "no event for the shader, saw {seen:?}"
    );
    assert!(watcher.poll().iter().all(|uri| !uri.starts_with('/')));
}
