//! Device Tests
//!
//! Tests for:
//! - Device creation on both backends and settings validation
//! - Adapter selection
//! - Presentation, back buffer rotation and device removal
//! - Resource creation from files
//! - Buffer updates and CPU reads
//! - Rollback when a staging heap runs out

use std::path::PathBuf;

use myth_rhi::command::NativeCommand;
use myth_rhi::descriptors::DescriptorHeapType;
use myth_rhi::{
    AdapterPreference, BackendKind, BindFlags, BufferDesc, CpuAccessFlags, Device, Format,
    HeapCapacities, ResourceId, ResourceState, RhiError, RhiSettings, ShaderStage, TextureDesc,
};

fn settings(backend: BackendKind) -> RhiSettings {
    let _ = env_logger::builder().is_test(true).try_init();
    RhiSettings {
        backend,
        width: 64,
        height: 64,
        ..Default::default()
    }
}

fn device(backend: BackendKind) -> Device {
    Device::new(settings(backend)).expect("headless device")
}

/// A unique path under the system temp directory.
fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("myth_rhi_{}_{name}", std::process::id()))
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn creates_on_both_backends() {
    for backend in [BackendKind::Immediate, BackendKind::Explicit] {
        let device = device(backend);
        assert_eq!(device.backend_kind(), backend);
        assert_eq!(device.swap_chain().back_buffers().len(), 2);
        // Back buffers plus the main depth buffer.
        assert_eq!(device.texture_count(), 3);
        assert_eq!(device.texture(device.main_render_target()).format(), Format::Rgba8Unorm);
        assert_eq!(
            device.texture(device.main_depth_target()).format(),
            Format::D24UnormS8Uint
        );
    }
}

#[test]
fn adapter_follows_preference() {
    let fast = Device::new(settings(BackendKind::Explicit)).unwrap();
    assert!(!fast.adapter().integrated);

    let low = Device::new(RhiSettings {
        adapter: AdapterPreference::LowPower,
        ..settings(BackendKind::Explicit)
    })
    .unwrap();
    assert!(low.adapter().integrated);
}

#[test]
fn invalid_settings_are_rejected() {
    let zero_size = RhiSettings {
        width: 0,
        ..settings(BackendKind::Explicit)
    };
    let color_depth = RhiSettings {
        depth_buffer_format: Format::Rgba8Unorm,
        ..settings(BackendKind::Explicit)
    };
    let no_lists = RhiSettings {
        command_list_count: 0,
        ..settings(BackendKind::Explicit)
    };

    for bad in [zero_size, color_depth, no_lists] {
        assert!(matches!(Device::new(bad), Err(RhiError::InvalidArgument(_))));
    }
}

#[test]
fn main_targets_are_bound_to_the_settings() {
    let device = Device::new(RhiSettings {
        back_buffer_count: 3,
        back_buffer_format: Format::Rgba16Float,
        depth_buffer_format: Format::D32Float,
        ..settings(BackendKind::Explicit)
    })
    .unwrap();

    assert_eq!(device.swap_chain().back_buffers().len(), 3);
    let back_buffer = device.texture(device.main_render_target());
    assert_eq!(back_buffer.format(), Format::Rgba16Float);
    assert_eq!(back_buffer.desc().width, 64);
    assert_eq!(
        device.texture(device.main_depth_target()).format(),
        Format::D32Float
    );
}

// ============================================================================
// Presentation
// ============================================================================

#[test]
fn present_rotates_back_buffers() {
    let mut device = device(BackendKind::Explicit);
    let first = device.main_render_target();

    device.present().unwrap();
    let second = device.main_render_target();
    device.present().unwrap();

    assert_ne!(first, second);
    assert_eq!(device.main_render_target(), first);
    assert_eq!(device.swap_chain().presented_frames(), 2);
}

#[test]
fn frame_hands_the_back_buffer_back_through_a_barrier() {
    let mut device = device(BackendKind::Explicit);
    let back_buffer = device.main_render_target();

    device.begin_command_list(0);
    device.set_main_render_targets();
    device.transition(&[back_buffer.into()], ResourceState::Present);
    device.end_command_list(0);
    device.execute_command_lists(0);

    let to_present = device
        .command_list(0)
        .commands()
        .iter()
        .filter_map(|c| match c {
            NativeCommand::ResourceBarrier(batch) => Some(batch.iter()),
            _ => None,
        })
        .flatten()
        .filter(|b| b.resource == ResourceId::from(back_buffer) && b.after == ResourceState::Present)
        .count();
    assert_eq!(to_present, 1);
    assert_eq!(device.submitted_lists()[0].barrier_count, 2);

    device.present().unwrap();
    assert_eq!(device.resource_state(back_buffer), ResourceState::Present);
}

#[test]
#[should_panic(expected = "must be transitioned to Present before present")]
fn presenting_a_bound_render_target_panics() {
    let mut device = device(BackendKind::Explicit);

    device.begin_command_list(0);
    device.set_main_render_targets();
    device.end_command_list(0);
    device.execute_command_lists(0);

    let _ = device.present();
}

#[test]
fn removed_device_fails_to_present() {
    let mut device = device(BackendKind::Explicit);
    device.inject_device_removed("driver reset");

    assert!(device.is_device_removed());
    match device.present() {
        Err(RhiError::DeviceLost { reason }) => assert_eq!(reason, "driver reset"),
        other => panic!("expected DeviceLost, got {other:?}"),
    }
    assert_eq!(device.swap_chain().presented_frames(), 0);
}

// ============================================================================
// Resource Lifetime
// ============================================================================

#[test]
#[should_panic(expected = "owned by the device")]
fn main_depth_cannot_be_released() {
    let mut device = device(BackendKind::Explicit);
    let depth = device.main_depth_target();
    device.release_texture(depth);
}

#[test]
fn releasing_a_texture_frees_its_views() {
    let mut device = device(BackendKind::Explicit);
    let rtv_before = device.descriptors().staging(DescriptorHeapType::Rtv).len();
    let srv_before = device.descriptors().staging(DescriptorHeapType::CbvSrvUav).len();

    let target = device
        .create_texture(
            &TextureDesc::new_2d(16, 16, Format::Rgba8Unorm)
                .with_bind_flags(BindFlags::RENDER_TARGET | BindFlags::SHADER_RESOURCE),
        )
        .unwrap();
    assert_eq!(device.descriptors().staging(DescriptorHeapType::Rtv).len(), rtv_before + 1);

    device.release_texture(target);

    assert_eq!(device.descriptors().staging(DescriptorHeapType::Rtv).len(), rtv_before);
    assert_eq!(
        device.descriptors().staging(DescriptorHeapType::CbvSrvUav).len(),
        srv_before
    );
    assert_eq!(device.texture_count(), 3);
}

#[test]
fn exhausted_staging_heap_rolls_back_the_texture() {
    let mut device = Device::new(RhiSettings {
        heap_capacities: HeapCapacities {
            cpu_rtv: 4,
            ..Default::default()
        },
        ..settings(BackendKind::Explicit)
    })
    .unwrap();
    let srv_before = device.descriptors().staging(DescriptorHeapType::CbvSrvUav).len();

    // Two back buffers already hold two RTVs; a cube needs six more.
    let result = device.create_texture(
        &TextureDesc::new_cube(16, Format::Rgba8Unorm)
            .with_bind_flags(BindFlags::RENDER_TARGET | BindFlags::SHADER_RESOURCE),
    );

    assert!(matches!(
        result,
        Err(RhiError::CapacityExceeded {
            heap: DescriptorHeapType::Rtv,
            ..
        })
    ));
    assert_eq!(device.texture_count(), 3);
    assert_eq!(device.descriptors().staging(DescriptorHeapType::Rtv).len(), 2);
    assert_eq!(
        device.descriptors().staging(DescriptorHeapType::CbvSrvUav).len(),
        srv_before
    );
}

#[test]
fn invalid_texture_desc_is_a_creation_error() {
    let mut device = device(BackendKind::Immediate);
    let result = device.create_texture(
        &TextureDesc::new_2d(16, 16, Format::Rgba8Unorm).with_bind_flags(BindFlags::DEPTH_STENCIL),
    );
    assert!(matches!(result, Err(RhiError::ResourceCreation { .. })));
    assert_eq!(device.texture_count(), 3);
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn texture_loads_from_png() {
    let path = temp_path("checker.png");
    let mut image = image::RgbaImage::new(4, 2);
    image.put_pixel(1, 0, image::Rgba([255, 0, 0, 255]));
    image.save(&path).unwrap();

    let mut device = device(BackendKind::Explicit);
    let texture = device.create_texture_from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let texture = device.texture(texture);
    assert_eq!(texture.format(), Format::Rgba8Unorm);
    assert_eq!((texture.desc().width, texture.desc().height), (4, 2));
    assert_eq!(&texture.contents()[4..8], &[255, 0, 0, 255]);
    assert!(texture.views().srv.is_some());
}

#[test]
fn missing_texture_file_names_the_path() {
    let mut device = device(BackendKind::Explicit);
    let missing = temp_path("does_not_exist.png");

    let err = device.create_texture_from_file(&missing).unwrap_err();

    let RhiError::FileRead { path, source } = &err else {
        panic!("expected a file read error, got {err:?}");
    };
    assert_eq!(path, &missing);
    assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
    assert!(err.to_string().contains("does_not_exist.png"));
}

#[test]
fn missing_shader_file_names_the_path() {
    let mut device = device(BackendKind::Explicit);
    let missing = temp_path("missing_shader.cso");

    let err = device
        .create_shader_from_file(&missing, ShaderStage::Vertex, "main")
        .unwrap_err();

    assert!(matches!(&err, RhiError::FileRead { path, .. } if path == &missing));
    assert!(err.to_string().contains("missing_shader.cso"));
}

#[test]
fn undecodable_texture_file_is_a_creation_error() {
    let path = temp_path("garbage.png");
    std::fs::write(&path, b"definitely not an image").unwrap();

    let mut device = device(BackendKind::Explicit);
    let result = device.create_texture_from_file(&path);
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(RhiError::ResourceCreation { .. })));
    assert_eq!(device.texture_count(), 3);
}

#[test]
fn shader_loads_from_file() {
    let path = temp_path("shader.cso");
    std::fs::write(&path, [0x44, 0x58, 0x42, 0x43]).unwrap();

    let mut device = device(BackendKind::Explicit);
    let shader = device
        .create_shader_from_file(&path, ShaderStage::Compute, "cs_main")
        .unwrap();
    std::fs::remove_file(&path).ok();

    let shader = device.shader(shader);
    assert_eq!(shader.stage(), ShaderStage::Compute);
    assert_eq!(shader.entry_point(), "cs_main");
    assert_eq!(shader.bytecode(), &[0x44, 0x58, 0x42, 0x43]);
}

#[test]
fn empty_shader_file_is_rejected() {
    let path = temp_path("empty.cso");
    std::fs::write(&path, b"").unwrap();

    let mut device = device(BackendKind::Explicit);
    let result = device.create_shader_from_file(&path, ShaderStage::Pixel, "main");
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(RhiError::ResourceCreation { .. })));
}

// ============================================================================
// Buffer Access
// ============================================================================

#[test]
fn readback_buffer_round_trips_pod_data() {
    let mut device = device(BackendKind::Explicit);
    let buffer = device
        .create_buffer(
            &BufferDesc::new(4, 4)
                .with_cpu_access(CpuAccessFlags::READ | CpuAccessFlags::WRITE)
                .with_label("Readback"),
            None,
        )
        .unwrap();

    device.update_buffer_with(buffer, &[1.0f32, 2.0, 3.0, 4.0]);

    let bytes = device.begin_buffer_read(buffer).to_vec();
    device.end_buffer_read(buffer);
    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(bytemuck::pod_read_unaligned::<f32>)
        .collect();
    assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn pod_initial_data_lands_in_the_buffer() {
    let mut device = device(BackendKind::Immediate);
    let indices: [u16; 6] = [0, 1, 2, 2, 1, 3];
    let buffer = device
        .create_buffer_with(
            &BufferDesc::new(6, 2).with_bind_flags(BindFlags::INDEX_BUFFER),
            &indices,
        )
        .unwrap();

    assert_eq!(device.buffer(buffer).contents(), bytemuck::cast_slice::<u16, u8>(&indices));
}

#[test]
#[should_panic(expected = "a buffer read is already in flight")]
fn second_buffer_read_panics() {
    let mut device = device(BackendKind::Explicit);
    let desc = BufferDesc::new(4, 4).with_cpu_access(CpuAccessFlags::READ);
    let a = device.create_buffer(&desc, None).unwrap();
    let b = device.create_buffer(&desc, None).unwrap();

    let _ = device.begin_buffer_read(a);
    let _ = device.begin_buffer_read(b);
}

#[test]
#[should_panic(expected = "was not created with CPU read access")]
fn reading_a_gpu_only_buffer_panics() {
    let mut device = device(BackendKind::Explicit);
    let buffer = device.create_buffer(&BufferDesc::new(4, 4), None).unwrap();
    let _ = device.begin_buffer_read(buffer);
}

#[test]
#[should_panic(expected = "neither dynamic nor CPU-writable")]
fn updating_a_static_buffer_panics() {
    let mut device = device(BackendKind::Explicit);
    let buffer = device.create_buffer(&BufferDesc::new(4, 4), None).unwrap();
    device.update_buffer(buffer, &[0; 4]);
}

#[test]
fn constant_buffer_size_must_be_a_multiple_of_16() {
    let mut device = device(BackendKind::Explicit);

    let result = device.create_buffer(&BufferDesc::constant(20), None);

    assert!(matches!(result, Err(RhiError::ResourceCreation { .. })));
    assert_eq!(device.buffer_count(), 0);
}

#[test]
fn released_buffer_returns_its_views() {
    let mut device = device(BackendKind::Explicit);
    let before = device.descriptors().staging(DescriptorHeapType::CbvSrvUav).len();
    let buffer = device
        .create_buffer(
            &BufferDesc::new(16, 16)
                .with_bind_flags(BindFlags::SHADER_RESOURCE | BindFlags::UNORDERED_ACCESS),
            None,
        )
        .unwrap();
    assert_eq!(device.descriptors().staging(DescriptorHeapType::CbvSrvUav).len(), before + 2);

    device.release_buffer(buffer);

    assert_eq!(device.descriptors().staging(DescriptorHeapType::CbvSrvUav).len(), before);
    assert_eq!(device.buffer_count(), 0);
}
