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

//! These tests need a real adapter and are skipped when none is available.

use vesta_core::renderer::*;
use vesta_infra::{WgpuDevice, WgslShaderCompiler};

const SHADER: &str = "\
@group(0) @binding(0) var<uniform> tint: vec4<f32>;

@vertex
fn vs_main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
    let x = f32(i32(i) - 1);
    let y = f32(i32(i & 1u) * 2 - 1);
    return vec4<f32>(x, y, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return tint;
}
";

fn device() -> Option<WgpuDevice> {
    match WgpuDevice::new_headless() {
        Ok(device) => Some(device),
        Err(err) => {
            println!("Skipping wgpu test: {err}");
            None
        }
    }
}

fn module(device: &WgpuDevice, stage: ShaderStage) -> ShaderModuleId {
    let il = WgslShaderCompiler::new()
        .create_shader_il(stage, SHADER.as_bytes(), "tint.wgsl")
        .unwrap();
    device
        .create_shader_module(&ShaderModuleDescriptor {
            label: Some("tint.wgsl"),
            il: &il,
        })
        .unwrap()
}

#[test]
fn pipeline_chain_creates_and_destroys() {
    let Some(device) = device() else { return };

    let vs = module(&device, ShaderStage::Vertex);
    let fs = module(&device, ShaderStage::Fragment);
    let set = device
        .create_bind_set_layout(&BindSetLayoutDescriptor::new(vec![
            BindSetLayoutEntry::uniform_buffer(0, ShaderStageFlags::FRAGMENT),
        ]))
        .unwrap();
    let layout = device
        .create_pipeline_layout(&PipelineLayoutDescriptor {
            set_layouts: vec![set],
            push_constants: None,
        })
        .unwrap();
    let pipeline = device
        .create_render_pipeline(&RenderPipelineDescriptor {
            layout,
            state: PipelineState {
                vertex: ShaderStageRef::new(vs, "vs_main", 1),
                fragment: Some(ShaderStageRef::new(fs, "fs_main", 1)),
                vertex_buffers: Vec::new(),
                primitive: PrimitiveStateDescriptor::default(),
                depth_stencil: None,
                color_targets: vec![ColorTargetStateDescriptor::opaque(
                    TextureFormat::Rgba8UnormSrgb,
                )],
                multisample: MultisampleStateDescriptor::default(),
            },
        })
        .unwrap();
    assert_eq!(device.live_objects(), 5);

    device.destroy_render_pipeline(pipeline).unwrap();
    device.destroy_pipeline_layout(layout).unwrap();
    device.destroy_bind_set_layout(set).unwrap();
    device.destroy_shader_module(vs).unwrap();
    device.destroy_shader_module(fs).unwrap();
    assert_eq!(device.live_objects(), 0);
    assert!(device.destroy_render_pipeline(pipeline).is_err());
}

#[test]
fn invalid_wgsl_is_an_error_not_a_panic() {
    let Some(device) = device() else { return };
    let il = ShaderIl::new(ShaderStage::Vertex, b"@vertex fn vs_main( {".to_vec());
    let err = device
        .create_shader_module(&ShaderModuleDescriptor {
            label: Some("broken"),
            il: &il,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ResourceError::Shader(ShaderError::CompilationError { .. })
    ));
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn unknown_ids_are_rejected() {
    let Some(device) = device() else { return };
    let err = device
        .create_pipeline_layout(&PipelineLayoutDescriptor {
            set_layouts: vec![BindSetLayoutId(99)],
            push_constants: None,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        ResourceError::Pipeline(PipelineError::LayoutCreationFailed(_))
    ));
    assert!(device.destroy_texture(TextureId(7)).is_err());
}

#[test]
fn cube_texture_upload_and_views() {
    let Some(device) = device() else { return };
    let descriptor = TextureDescriptor {
        label: Some("sky".into()),
        size: Extent3D {
            width: 4,
            height: 4,
            depth_or_array_layers: 6,
        },
        mip_level_count: 1,
        sample_count: SampleCount::X1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Rgba8UnormSrgb,
        usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
    };
    let texture = device.create_texture(&descriptor).unwrap();
    assert_eq!(device.allocated_bytes(), descriptor.base_level_size() as u64);

    let texels = vec![255u8; descriptor.base_level_size()];
    device
        .write_texture(
            texture,
            &texels,
            Some(descriptor.bytes_per_row()),
            Origin3D::default(),
            descriptor.size,
        )
        .unwrap();

    let cube = device
        .create_texture_view(
            &ImageViewDescriptor::whole(texture, 1).with_dimension(TextureViewDimension::Cube),
        )
        .unwrap();
    let face = device
        .create_texture_view(
            &ImageViewDescriptor::whole(texture, 1)
                .with_dimension(TextureViewDimension::D2)
                .with_layers(2, 1),
        )
        .unwrap();
    assert_ne!(cube, face);

    device.destroy_texture_view(cube).unwrap();
    device.destroy_texture_view(face).unwrap();
    device.destroy_texture(texture).unwrap();
    assert_eq!(device.allocated_bytes(), 0);
}

#[test]
fn buffer_writes_are_bounds_checked() {
    let Some(device) = device() else { return };
    let buffer = device
        .create_buffer_with_data(
            &BufferDescriptor {
                label: Some("uniforms".into()),
                size: 16,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                mapped_at_creation: false,
            },
            &[0u8; 16],
        )
        .unwrap();
    device.write_buffer(buffer, 0, &[1u8; 16]).unwrap();
    assert!(matches!(
        device.write_buffer(buffer, 8, &[1u8; 16]),
        Err(ResourceError::OutOfBounds)
    ));
    device.destroy_buffer(buffer).unwrap();
}
