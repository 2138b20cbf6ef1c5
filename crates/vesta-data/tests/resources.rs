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

use common::{png, Fixture, BUFFER, SHADER_MODULE, TEXTURE};
use vesta_core::renderer::api::{ShaderStage, TextureFormat, TextureViewDimension};
use vesta_core::renderer::{ResourceError, ShaderError};
use vesta_data::cache::ObjectCaches;
use vesta_data::resources::{
    register_builtin, EnvironmentMap, Material, Mesh, Shader, ShaderCreateInfo, Texture,
};
use vesta_data::{Resource, ResourceManager};

const VS: &str = "shaders/lit.vert.wgsl";
const FS: &str = "shaders/lit.frag.wgsl";
const VS_SOURCE: &str = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(); }";
const FS_SOURCE: &str = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";

const TRIANGLE_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1
";

fn material_doc(textures: &[(&str, &str)]) -> String {
    let textures = textures
        .iter()
        .map(|(slot, uri)| format!("\"{slot}\": \"{uri}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "(vertex_shader: \"{VS}\", fragment_shader: Some(\"{FS}\"), \
         textures: {{ {textures} }}, parameters: {{ \"roughness\": 0.5 }})"
    )
}

fn with_shaders(fx: &Fixture) {
    fx.fs.insert(VS, VS_SOURCE);
    fx.fs.insert(FS, FS_SOURCE);
}

const FACES: [&str; 6] = [
    "sky/px.png",
    "sky/nx.png",
    "sky/py.png",
    "sky/ny.png",
    "sky/pz.png",
    "sky/nz.png",
];

fn with_sky(fx: &Fixture, size: u32) {
    for face in FACES {
        fx.fs.insert(face, png(size, size, [90, 140, 220, 255]));
    }
    let faces = FACES.map(|f| format!("\"{f}\"")).join(", ");
    fx.fs.insert("sky.ron", format!("(faces: [{faces}])"));
}

// --- Shaders ---

#[test]
fn identical_source_compiles_once() {
    let mut fx = Fixture::new();
    fx.fs.insert("a.vert.wgsl", VS_SOURCE);
    fx.fs.insert("b.vert.wgsl", VS_SOURCE);

    let a = fx.manager.load::<Shader>("a.vert.wgsl").unwrap();
    let b = fx.manager.load::<Shader>("b.vert.wgsl").unwrap();

    assert_ne!(a, b);
    assert_eq!(fx.compiler.compiled(), 1);
    assert_eq!(fx.device.created(SHADER_MODULE), 2);
    assert_eq!(fx.manager.shader_cache().len(), 1);
    assert_eq!(fx.manager.shader_cache().pending_flush(), 1);
}

#[test]
fn compile_errors_surface_as_shader_errors() {
    let mut fx = Fixture::new();
    fx.fs.insert("bad.frag.wgsl", "this is an error");
    let err = fx.manager.load::<Shader>("bad.frag.wgsl").unwrap_err();
    assert!(matches!(
        err,
        ResourceError::Shader(ShaderError::CompilationError {
            stage: ShaderStage::Fragment,
            ..
        })
    ));
    assert!(fx.manager.shader_cache().is_empty());
}

#[test]
fn unknown_stage_is_a_parse_error() {
    let mut fx = Fixture::new();
    fx.fs.insert("plain.wgsl", VS_SOURCE);
    assert!(matches!(
        fx.manager.load::<Shader>("plain.wgsl"),
        Err(ResourceError::Parse { .. })
    ));
}

#[test]
fn cached_il_needs_no_compiler() {
    let device = common::RecordingDevice::new();
    let fs = std::sync::Arc::new(vesta_io::MemoryFileSystem::new());
    let mut manager = ResourceManager::new(device.clone(), fs.clone());
    fs.insert(VS, VS_SOURCE);
    fs.insert(FS, FS_SOURCE);

    let hash = manager
        .shader_cache()
        .get_hash(ShaderStage::Vertex, VS_SOURCE.as_bytes());
    manager
        .shader_cache_mut()
        .insert(hash, ShaderStage::Vertex, VS_SOURCE.as_bytes().to_vec());

    assert!(manager.load::<Shader>(VS).is_ok());
    assert!(matches!(
        manager.load::<Shader>(FS),
        Err(ResourceError::Shader(ShaderError::CompilerUnavailable))
    ));
}

#[test]
fn shader_reload_bumps_the_revision() {
    let mut fx = Fixture::new();
    with_shaders(&fx);
    let handle = fx.manager.load::<Shader>(VS).unwrap();
    let before = fx.manager.get(handle).unwrap().stage_ref("vs_main");

    fx.fs.insert(VS, format!("{VS_SOURCE}\n// tweaked"));
    assert_eq!(fx.manager.reload_uri(VS), 1);

    let shader = fx.manager.get(handle).unwrap();
    assert_eq!(shader.revision(), 1);
    assert_ne!(shader.stage_ref("vs_main"), before);
    assert_eq!(fx.device.live(SHADER_MODULE), 1);

    // A broken edit keeps the working module.
    let module = shader.module();
    fx.fs.insert(VS, "error");
    assert_eq!(fx.manager.reload_uri(VS), 0);
    assert_eq!(fx.manager.get(handle).unwrap().module(), module);
}

#[test]
fn procedural_shader() {
    let mut fx = Fixture::new();
    let handle = fx
        .manager
        .create::<Shader>(ShaderCreateInfo {
            label: Some("fullscreen".to_string()),
            stage: ShaderStage::Vertex,
            source: VS_SOURCE.as_bytes().to_vec(),
        })
        .unwrap();
    assert_eq!(fx.manager.get(handle).unwrap().stage(), ShaderStage::Vertex);
}

// --- Meshes ---

#[test]
fn obj_mesh_owns_two_buffers() {
    let mut fx = Fixture::new();
    fx.fs.insert("meshes/tri.obj", TRIANGLE_OBJ);
    let handle = fx.manager.load::<Mesh>("meshes/tri.obj").unwrap();

    let mesh = fx.manager.get(handle).unwrap();
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.index_count(), 3);
    assert!(mesh.index_buffer().is_some());
    assert_eq!(mesh.bounds().max, [1.0, 1.0, 0.0]);
    assert_eq!(fx.device.live(BUFFER), 2);

    assert!(fx.manager.release(handle));
    assert_eq!(fx.device.live(BUFFER), 0);
}

#[test]
fn failed_buffer_creation_leaks_nothing() {
    let mut fx = Fixture::new();
    fx.fs.insert("meshes/tri.obj", TRIANGLE_OBJ);
    fx.device.set_failing(BUFFER, true);
    assert!(fx.manager.load::<Mesh>("meshes/tri.obj").is_err());
    assert_eq!(fx.device.live(BUFFER), 0);
}

// --- Materials ---

#[test]
fn material_loads_and_shares_its_dependencies() {
    let mut fx = Fixture::new();
    with_shaders(&fx);
    fx.fs.insert("textures/albedo.png", png(2, 2, [255, 0, 0, 255]));
    let doc = material_doc(&[("albedo", "textures/albedo.png")]);
    fx.fs.insert("materials/a.ron", doc.clone());
    fx.fs.insert("materials/b.ron", doc);

    let a = fx.manager.load::<Material>("materials/a.ron").unwrap();
    let b = fx.manager.load::<Material>("materials/b.ron").unwrap();

    let albedo = fx.manager.get(a).unwrap().texture("albedo").unwrap();
    assert_eq!(fx.manager.get(b).unwrap().texture("albedo"), Some(albedo));
    assert_eq!(fx.manager.ref_count(albedo), Some(2));
    assert_eq!(fx.manager.get(a).unwrap().parameter("roughness"), Some(0.5));
    assert_eq!(fx.device.created(TEXTURE), 1);
    assert_eq!(fx.compiler.compiled(), 2);

    assert!(fx.manager.release(a));
    assert_eq!(fx.manager.ref_count(albedo), Some(1));
    assert!(fx.manager.release(b));
    assert!(!fx.manager.is_valid(albedo));
    assert_eq!(fx.device.total_live(), 0);
}

#[test]
fn material_with_a_missing_texture_releases_what_it_loaded() {
    let mut fx = Fixture::new();
    with_shaders(&fx);
    fx.fs.insert(
        "materials/broken.ron",
        material_doc(&[("albedo", "textures/nowhere.png")]),
    );

    assert!(matches!(
        fx.manager.load::<Material>("materials/broken.ron"),
        Err(ResourceError::Io { .. })
    ));
    assert_eq!(fx.manager.live_count(), 0);
    assert_eq!(fx.device.total_live(), 0);
}

#[test]
fn shutdown_releases_materials_before_their_dependencies() {
    let mut fx = Fixture::new();
    register_builtin(&mut fx.manager);
    with_shaders(&fx);
    fx.fs.insert("textures/albedo.png", png(2, 2, [255, 0, 0, 255]));
    fx.fs.insert(
        "materials/a.ron",
        material_doc(&[("albedo", "textures/albedo.png")]),
    );
    fx.manager.load::<Material>("materials/a.ron").unwrap();

    assert_eq!(
        fx.manager.registered_types(),
        vec!["Texture", "Shader", "Mesh", "EnvironmentMap", "Material"]
    );
    fx.manager.shutdown();
    assert_eq!(fx.manager.live_count(), 0);
    assert_eq!(fx.device.total_live(), 0);
}

#[test]
fn shader_reload_yields_a_new_pipeline_for_the_material() {
    let mut fx = Fixture::new();
    with_shaders(&fx);
    fx.fs.insert("materials/a.ron", material_doc(&[]));
    let material = fx.manager.load::<Material>("materials/a.ron").unwrap();
    let mut caches = ObjectCaches::new(fx.device.clone());
    let layout = common::camera_and_material_sets();

    let state = fx
        .manager
        .get(material)
        .unwrap()
        .pipeline_state(&fx.manager, TextureFormat::Bgra8UnormSrgb, None)
        .unwrap();
    let before = caches.fetch_pipeline(&layout, &state).unwrap();

    fx.fs.insert(FS, format!("{FS_SOURCE}\n// brighter"));
    assert_eq!(fx.manager.reload_uri(FS), 1);

    let state = fx
        .manager
        .get(material)
        .unwrap()
        .pipeline_state(&fx.manager, TextureFormat::Bgra8UnormSrgb, None)
        .unwrap();
    let after = caches.fetch_pipeline(&layout, &state).unwrap();

    assert_ne!(before, after);
    assert_eq!(caches.pipelines.len(), 2);
    assert_eq!(caches.pipeline_layouts.len(), 1);
    caches.clear();
}

// --- Environment maps ---

#[test]
fn environment_map_is_a_six_layer_cube() {
    let mut fx = Fixture::new();
    with_sky(&fx, 4);
    let handle = fx.manager.load::<EnvironmentMap>("sky.ron").unwrap();

    let map = fx.manager.get(handle).unwrap();
    assert_eq!(map.face_size(), 4);
    assert_eq!(map.view_descriptor().dimension, Some(TextureViewDimension::Cube));
    assert!(map.has_pending_upload());

    fx.manager.flush_to_gpu(handle).unwrap();
    assert_eq!(fx.device.texture_writes().len(), 1);
    assert_eq!(fx.device.texture_writes()[0].1, 4 * 4 * 4 * 6);
}

#[test]
fn editing_one_face_reloads_the_map() {
    let mut fx = Fixture::new();
    with_sky(&fx, 2);
    let handle = fx.manager.load::<EnvironmentMap>("sky.ron").unwrap();
    assert!(!fx.manager.reload_if_changed(handle).unwrap());

    fx.fs.insert("sky/pz.png", png(2, 2, [0, 0, 0, 255]));
    assert!(fx.manager.reload_if_changed(handle).unwrap());
    assert_eq!(fx.manager.get(handle).unwrap().revision(), 1);
    assert_eq!(fx.device.live(TEXTURE), 1);
}

#[test]
fn face_edit_is_routed_to_the_map_by_uri() {
    let mut fx = Fixture::new();
    with_sky(&fx, 2);
    let handle = fx.manager.load::<EnvironmentMap>("sky.ron").unwrap();
    assert_eq!(fx.manager.get(handle).unwrap().dependencies(), FACES.map(String::from).to_vec());
    assert_eq!(fx.manager.reload_uri("sky/pz.png"), 0);

    fx.fs.insert("sky/pz.png", png(2, 2, [0, 0, 0, 255]));
    assert_eq!(fx.manager.reload_uri("sky/pz.png"), 1);
    assert_eq!(fx.manager.get(handle).unwrap().revision(), 1);
    assert_eq!(fx.device.live(TEXTURE), 1);

    // The index survives the reload and is dropped with the map.
    fx.fs.insert("sky/nz.png", png(2, 2, [7, 7, 7, 255]));
    assert_eq!(fx.manager.reload_uri("sky/nz.png"), 1);
    assert!(fx.manager.release(handle));
    fx.fs.insert("sky/nz.png", png(2, 2, [8, 8, 8, 255]));
    assert_eq!(fx.manager.reload_uri("sky/nz.png"), 0);
}

#[test]
fn mismatched_faces_are_rejected() {
    let mut fx = Fixture::new();
    with_sky(&fx, 2);
    fx.fs.insert("sky/ny.png", png(4, 4, [0, 0, 0, 255]));
    assert!(matches!(
        fx.manager.load::<EnvironmentMap>("sky.ron"),
        Err(ResourceError::Parse { .. })
    ));
    assert_eq!(fx.device.created(TEXTURE), 0);
}

#[test]
fn texture_reload_changes_the_view_key() {
    let mut fx = Fixture::new();
    fx.fs.insert("t.png", png(2, 2, [1, 1, 1, 255]));
    let handle = fx.manager.load::<Texture>("t.png").unwrap();
    let before = fx.manager.get(handle).unwrap().view_descriptor();

    fx.fs.insert("t.png", png(2, 2, [9, 9, 9, 255]));
    assert!(fx.manager.reload_if_changed(handle).unwrap());

    let after = fx.manager.get(handle).unwrap().view_descriptor();
    assert_ne!(before, after);
    assert_eq!(after.texture_revision, 1);
}
