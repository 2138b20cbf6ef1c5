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

use common::{png, Fixture, TEXTURE};
use vesta_core::renderer::ResourceError;
use vesta_core::Handle;
use vesta_data::resources::{Texture, TextureCreateInfo};

const BRICK: &str = "textures/brick.png";

fn solid(width: u32, height: u32) -> TextureCreateInfo {
    TextureCreateInfo::rgba8(width, height, vec![255; (width * height * 4) as usize])
}

#[test]
fn loading_the_same_uri_twice_shares_the_slot() {
    let mut fx = Fixture::new();
    fx.fs.insert(BRICK, png(2, 2, [200, 80, 40, 255]));

    let first = fx.manager.load::<Texture>(BRICK).expect("first load");
    let second = fx.manager.load::<Texture>(BRICK).expect("second load");

    assert_eq!(first, second);
    assert_eq!(fx.manager.ref_count(first), Some(2));
    assert_eq!(fx.device.created(TEXTURE), 1);
    let a = fx.manager.get(first).expect("live");
    let b = fx.manager.get(second).expect("live");
    assert!(std::ptr::eq(a, b));
    assert_eq!(fx.manager.find::<Texture>(BRICK), Some(first));
}

#[test]
fn last_release_destroys_and_forgets_the_uri() {
    let mut fx = Fixture::new();
    fx.fs.insert(BRICK, png(2, 2, [0, 0, 0, 255]));
    let handle = fx.manager.load::<Texture>(BRICK).unwrap();
    fx.manager.load::<Texture>(BRICK).unwrap();

    assert!(fx.manager.release(handle));
    assert!(fx.manager.is_valid(handle));
    assert_eq!(fx.device.destroyed(TEXTURE), 0);

    assert!(fx.manager.release(handle));
    assert!(!fx.manager.is_valid(handle));
    assert!(fx.manager.get(handle).is_none());
    assert_eq!(fx.device.destroyed(TEXTURE), 1);
    assert_eq!(fx.manager.find::<Texture>(BRICK), None);

    // Loading again reads the file and builds a fresh texture.
    let again = fx.manager.load::<Texture>(BRICK).unwrap();
    assert_ne!(again, handle);
    assert_eq!(fx.device.created(TEXTURE), 2);
}

#[test]
fn reused_index_does_not_alias_the_old_handle() {
    let mut fx = Fixture::new();
    let old = fx.manager.create::<Texture>(solid(1, 1)).unwrap();
    assert!(fx.manager.release(old));

    let new = fx.manager.create::<Texture>(solid(4, 4)).unwrap();
    assert_eq!(new.index(), old.index());
    assert_ne!(new.generation(), old.generation());
    assert!(fx.manager.get(old).is_none());
    assert_eq!(fx.manager.get(new).map(|t| t.size().width), Some(4));
    assert!(matches!(
        fx.manager.acquire(old),
        Err(ResourceError::InvalidHandle)
    ));

    // A stale release is ignored.
    assert!(!fx.manager.release(old));
    assert!(fx.manager.is_valid(new));
    assert_eq!(fx.device.destroyed(TEXTURE), 1);
}

#[test]
#[cfg_attr(debug_assertions, should_panic(expected = "released twice"))]
fn double_release_is_caught_in_debug_builds() {
    let mut fx = Fixture::new();
    let handle = fx.manager.create::<Texture>(solid(1, 1)).unwrap();
    assert!(fx.manager.release(handle));

    assert!(!fx.manager.release(handle));
    assert_eq!(fx.device.destroyed(TEXTURE), 1);
}

#[test]
fn create_never_deduplicates() {
    let mut fx = Fixture::new();
    let a = fx.manager.create::<Texture>(solid(1, 1)).unwrap();
    let b = fx.manager.create::<Texture>(solid(1, 1)).unwrap();
    assert_ne!(a, b);
    assert_eq!(fx.manager.live_count_of::<Texture>(), 2);
    assert!(fx.manager.metadata(a).unwrap().source_uri.is_none());
}

#[test]
fn reload_keeps_the_handle_and_swaps_the_payload() {
    let mut fx = Fixture::new();
    fx.fs.insert(BRICK, png(2, 2, [10, 10, 10, 255]));
    let handle = fx.manager.load::<Texture>(BRICK).unwrap();
    let old_id = fx.manager.get(handle).unwrap().id();

    assert!(!fx.manager.reload_if_changed(handle).unwrap());

    fx.fs.insert(BRICK, png(4, 4, [10, 10, 10, 255]));
    assert!(fx.manager.reload_if_changed(handle).unwrap());

    let texture = fx.manager.get(handle).expect("same handle still valid");
    assert_eq!(texture.size().width, 4);
    assert_eq!(texture.revision(), 1);
    assert_ne!(texture.id(), old_id);
    assert_eq!(fx.device.live(TEXTURE), 1);
    assert_eq!(fx.manager.find::<Texture>(BRICK), Some(handle));

    // The stored hash was updated, so nothing changes on the next check.
    assert!(!fx.manager.reload_if_changed(handle).unwrap());
}

#[test]
fn failed_reload_leaves_the_previous_state_live() {
    let mut fx = Fixture::new();
    fx.fs.insert(BRICK, png(2, 2, [1, 2, 3, 255]));
    let handle = fx.manager.load::<Texture>(BRICK).unwrap();
    let id = fx.manager.get(handle).unwrap().id();

    fx.fs.insert(BRICK, b"not a png".to_vec());
    let err = fx.manager.reload_if_changed(handle).unwrap_err();
    assert!(matches!(err, ResourceError::ReloadFailed { .. }));

    let texture = fx.manager.get(handle).expect("still live");
    assert_eq!(texture.id(), id);
    assert_eq!(texture.revision(), 0);
    assert_eq!(fx.device.live(TEXTURE), 1);
}

#[test]
fn procedural_resources_never_reload() {
    let mut fx = Fixture::new();
    let handle = fx.manager.create::<Texture>(solid(1, 1)).unwrap();
    assert!(!fx.manager.reload_if_changed(handle).unwrap());
}

#[test]
fn load_failures_produce_no_slot() {
    let mut fx = Fixture::new();
    assert!(matches!(
        fx.manager.load::<Texture>("textures/missing.png"),
        Err(ResourceError::Io { .. })
    ));

    fx.fs.insert("textures/broken.png", b"garbage".to_vec());
    assert!(matches!(
        fx.manager.load::<Texture>("textures/broken.png"),
        Err(ResourceError::Parse { .. })
    ));
    assert_eq!(fx.manager.live_count_of::<Texture>(), 0);
    assert_eq!(fx.manager.find::<Texture>("textures/broken.png"), None);
}

#[test]
fn device_failure_is_reported_and_retried() {
    let mut fx = Fixture::new();
    fx.device.set_failing(TEXTURE, true);
    assert!(matches!(
        fx.manager.create::<Texture>(solid(1, 1)),
        Err(ResourceError::BackendError(_))
    ));
    fx.device.set_failing(TEXTURE, false);
    assert!(fx.manager.create::<Texture>(solid(1, 1)).is_ok());
}

#[test]
fn flush_uploads_once() {
    let mut fx = Fixture::new();
    let handle = fx.manager.create::<Texture>(solid(2, 2)).unwrap();
    assert!(fx.manager.get(handle).unwrap().has_pending_upload());

    fx.manager.flush_to_gpu(handle).unwrap();
    fx.manager.flush_to_gpu(handle).unwrap();

    assert_eq!(fx.device.texture_writes().len(), 1);
    assert_eq!(fx.device.texture_writes()[0].1, 16);
    assert!(!fx.manager.get(handle).unwrap().has_pending_upload());
    assert!(matches!(
        fx.manager.flush_to_gpu(Handle::<Texture>::INVALID),
        Err(ResourceError::InvalidHandle)
    ));
}

#[test]
fn flush_all_covers_every_live_resource() {
    let mut fx = Fixture::new();
    fx.manager.create::<Texture>(solid(1, 1)).unwrap();
    fx.manager.create::<Texture>(solid(2, 2)).unwrap();
    fx.manager
        .create::<Texture>(TextureCreateInfo::render_target(
            8,
            8,
            vesta_core::renderer::api::TextureFormat::Rgba16Float,
        ))
        .unwrap();
    assert_eq!(fx.manager.flush_all::<Texture>().unwrap(), 3);
    assert_eq!(fx.device.texture_writes().len(), 2);
}

#[test]
fn mismatched_pixel_payload_is_rejected() {
    let mut fx = Fixture::new();
    let info = TextureCreateInfo::rgba8(4, 4, vec![0; 3]);
    assert!(matches!(
        fx.manager.create::<Texture>(info),
        Err(ResourceError::OutOfBounds)
    ));
    assert_eq!(fx.device.created(TEXTURE), 0);
}

#[test]
fn shutdown_destroys_everything_still_referenced() {
    let mut fx = Fixture::new();
    fx.fs.insert(BRICK, png(2, 2, [0, 0, 0, 255]));
    fx.manager.load::<Texture>(BRICK).unwrap();
    fx.manager.load::<Texture>(BRICK).unwrap();
    fx.manager.create::<Texture>(solid(1, 1)).unwrap();

    assert_eq!(fx.manager.live_count(), 2);
    assert_eq!(fx.manager.shutdown(), 2);
    assert_eq!(fx.manager.live_count(), 0);
    assert_eq!(fx.device.live(TEXTURE), 0);
}

#[test]
fn memory_usage_counts_pending_texels() {
    let mut fx = Fixture::new();
    let handle = fx.manager.create::<Texture>(solid(4, 4)).unwrap();
    let before = fx.manager.memory_usage_of::<Texture>();
    assert!(before >= 64);
    fx.manager.flush_to_gpu(handle).unwrap();
    assert_eq!(fx.manager.memory_usage_of::<Texture>(), before - 64);
}
