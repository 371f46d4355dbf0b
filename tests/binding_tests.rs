//! Resource Binding Tests
//!
//! Tests for:
//! - Descriptor tables: staging order, null substitution per declared dimension
//! - Stage-appropriate transitions on bind
//! - Shader-visible heap exhaustion and reset
//! - Constant buffers, vertex and index buffers
//! - Static samplers and sampler descriptor tables
//! - Immediate backend: direct slot binding

use myth_rhi::command::NativeCommand;
use myth_rhi::descriptors::{DescriptorBlock, DescriptorHeapType, ViewDesc, ViewKind};
use myth_rhi::types::ViewDimension;
use myth_rhi::{
    BackendKind, BindFlags, BindingSlot, BufferDesc, BufferId, DescriptorRange, Device, Format,
    HeapCapacities, ResourceId, ResourceState, RhiError, RhiSettings, RootSignatureDesc,
    RootSignatureId, SamplerPreset, ShaderStage, ShaderVisibility, TextureDesc, TextureId,
};

fn device_with(backend: BackendKind, heap_capacities: HeapCapacities) -> Device {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut device = Device::new(RhiSettings {
        backend,
        width: 64,
        height: 64,
        heap_capacities,
        ..Default::default()
    })
    .expect("headless device");
    device.begin_command_list(0);
    device
}

fn device(backend: BackendKind) -> Device {
    device_with(backend, HeapCapacities::default())
}

fn sampled_texture(device: &mut Device) -> TextureId {
    let desc = TextureDesc::new_2d(8, 8, Format::Rgba8Unorm)
        .with_bind_flags(BindFlags::RENDER_TARGET | BindFlags::SHADER_RESOURCE);
    device.create_texture(&desc).unwrap()
}

fn storage_texture(device: &mut Device) -> TextureId {
    let desc = TextureDesc::new_2d(8, 8, Format::Rgba16Float)
        .with_bind_flags(BindFlags::UNORDERED_ACCESS | BindFlags::SHADER_RESOURCE);
    device.create_texture(&desc).unwrap()
}

/// One table of three SRVs: a 2D texture, a cube map and a volume.
fn lighting_root_signature(device: &mut Device) -> RootSignatureId {
    let mut desc = RootSignatureDesc::new(2, 1);
    desc.init_descriptor_table(
        0,
        &[
            DescriptorRange::srv(0, 1),
            DescriptorRange::srv(1, 1).with_dimension(ViewDimension::TextureCube),
            DescriptorRange::srv(2, 1).with_dimension(ViewDimension::Texture3D),
        ],
        ShaderVisibility::Pixel,
    )
    .init_descriptor_table(1, &[DescriptorRange::cbv(0, 1)], ShaderVisibility::All)
    .init_static_sampler(0, 0, SamplerPreset::TrilinearWrap, ShaderVisibility::Pixel);
    device.create_root_signature(&desc).unwrap()
}

fn last_table(device: &Device) -> DescriptorBlock {
    device
        .command_list(0)
        .commands()
        .iter()
        .rev()
        .find_map(|c| match c {
            NativeCommand::SetDescriptorTable { block, .. } => Some(*block),
            _ => None,
        })
        .expect("a descriptor table was set")
}

fn table_view(device: &Device, block: &DescriptorBlock, slot: u32) -> ViewDesc {
    *device
        .descriptors()
        .gpu_heap(DescriptorHeapType::CbvSrvUav)
        .read(block, slot)
        .expect("slot was written")
}

fn constant_buffer(device: &mut Device) -> BufferId {
    device.create_buffer(&BufferDesc::constant(256), None).unwrap()
}

// ============================================================================
// Descriptor Tables (explicit)
// ============================================================================

#[test]
fn absent_entries_get_null_views_of_declared_dimension() {
    let mut device = device(BackendKind::Explicit);
    let rs = lighting_root_signature(&mut device);
    let albedo = sampled_texture(&mut device);

    device
        .set_shader_resources(
            ShaderStage::Pixel,
            &[Some(albedo.into()), None, None],
            BindingSlot::table(rs, 0),
        )
        .unwrap();

    let block = last_table(&device);
    assert_eq!(block.count, 3);

    let first = table_view(&device, &block, 0);
    assert_eq!(first.resource, Some(ResourceId::from(albedo)));

    let cube = table_view(&device, &block, 1);
    assert!(cube.is_null());
    assert_eq!(cube.dimension, ViewDimension::TextureCube);

    let volume = table_view(&device, &block, 2);
    assert!(volume.is_null());
    assert_eq!(volume.dimension, ViewDimension::Texture3D);
}

#[test]
fn binding_transitions_to_stage_read_state() {
    let mut device = device(BackendKind::Explicit);
    let rs = lighting_root_signature(&mut device);
    let a = sampled_texture(&mut device);
    let b = sampled_texture(&mut device);

    device
        .set_shader_resources(ShaderStage::Pixel, &[Some(a.into())], BindingSlot::table(rs, 0))
        .unwrap();
    device
        .set_shader_resources(
            ShaderStage::Vertex,
            &[Some(b.into())],
            BindingSlot::table(rs, 0),
        )
        .unwrap();

    assert_eq!(device.resource_state(a), ResourceState::PixelShaderResource);
    assert_eq!(device.resource_state(b), ResourceState::NonPixelShaderResource);
}

#[test]
fn barrier_precedes_the_table_it_protects() {
    let mut device = device(BackendKind::Explicit);
    let rs = lighting_root_signature(&mut device);
    let a = sampled_texture(&mut device);

    device
        .set_shader_resources(ShaderStage::Pixel, &[Some(a.into())], BindingSlot::table(rs, 0))
        .unwrap();

    let commands = device.command_list(0).commands();
    assert!(matches!(commands[0], NativeCommand::ResourceBarrier(_)));
    assert!(matches!(
        commands[1],
        NativeCommand::SetDescriptorTable { root_param_index: 0, compute: false, .. }
    ));
}

#[test]
fn unordered_access_binding() {
    let mut device = device(BackendKind::Explicit);
    let mut desc = RootSignatureDesc::new(1, 0);
    desc.init_descriptor_table(
        0,
        &[DescriptorRange::uav(0, 2).with_dimension(ViewDimension::Texture2DArray)],
        ShaderVisibility::All,
    );
    let rs = device.create_root_signature(&desc).unwrap();
    let target = storage_texture(&mut device);
    device.transition(&[target.into()], ResourceState::PixelShaderResource);

    device
        .set_unordered_access_resources(
            ShaderStage::Compute,
            &[Some(target.into()), None],
            BindingSlot::table(rs, 0).compute(),
        )
        .unwrap();

    assert_eq!(device.resource_state(target), ResourceState::UnorderedAccess);
    let block = last_table(&device);
    let null = table_view(&device, &block, 1);
    assert_eq!(null.kind, ViewKind::UnorderedAccess);
    // No dedicated null UAV for 2D arrays.
    assert_eq!(null.dimension, ViewDimension::Texture2D);
}

#[test]
#[should_panic(expected = "needs BindingSlot::root_signature")]
fn explicit_binding_without_root_signature_panics() {
    let mut device = device(BackendKind::Explicit);
    let a = sampled_texture(&mut device);
    let _ = device.set_shader_resources(ShaderStage::Pixel, &[Some(a.into())], BindingSlot::at(0));
}

#[test]
#[should_panic(expected = "was not created with unordered-access binding")]
fn uav_binding_of_sampled_only_texture_panics() {
    let mut device = device(BackendKind::Explicit);
    let rs = lighting_root_signature(&mut device);
    let a = sampled_texture(&mut device);
    let _ = device.set_unordered_access_resources(
        ShaderStage::Compute,
        &[Some(a.into())],
        BindingSlot::table(rs, 0),
    );
}

// ============================================================================
// Heap Capacity
// ============================================================================

#[test]
fn exhausted_heap_reports_capacity_and_changes_nothing() {
    let mut device = device_with(
        BackendKind::Explicit,
        HeapCapacities {
            gpu_cbv_srv_uav: 2,
            ..Default::default()
        },
    );
    let rs = lighting_root_signature(&mut device);
    let a = sampled_texture(&mut device);

    let result = device.set_shader_resources(
        ShaderStage::Pixel,
        &[Some(a.into()), None, None],
        BindingSlot::table(rs, 0),
    );

    match result {
        Err(RhiError::CapacityExceeded {
            heap,
            requested,
            available,
        }) => {
            assert_eq!(heap, DescriptorHeapType::CbvSrvUav);
            assert_eq!(requested, 3);
            assert_eq!(available, 2);
        }
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }
    assert_eq!(device.descriptors().gpu_heap(DescriptorHeapType::CbvSrvUav).used(), 0);
    assert_eq!(device.resource_state(a), ResourceState::RenderTarget);
    assert!(device.command_list(0).commands().is_empty());
}

#[test]
fn heap_reset_makes_room_again() {
    let mut device = device_with(
        BackendKind::Explicit,
        HeapCapacities {
            gpu_cbv_srv_uav: 3,
            ..Default::default()
        },
    );
    let rs = lighting_root_signature(&mut device);
    let a = sampled_texture(&mut device);
    let slot = BindingSlot::table(rs, 0);

    device
        .set_shader_resources(ShaderStage::Pixel, &[Some(a.into()), None, None], slot)
        .unwrap();
    assert!(
        device
            .set_shader_resources(ShaderStage::Pixel, &[Some(a.into())], slot)
            .is_err()
    );

    device.set_descriptor_heap(DescriptorHeapType::CbvSrvUav, true);
    device
        .set_shader_resources(ShaderStage::Pixel, &[Some(a.into())], slot)
        .unwrap();

    let heap = device.descriptors().gpu_heap(DescriptorHeapType::CbvSrvUav);
    assert_eq!(heap.used(), 1);
    assert_eq!(heap.generation(), 1);
    assert!(
        device
            .command_list(0)
            .commands()
            .iter()
            .any(|c| matches!(c, NativeCommand::SetDescriptorHeaps(_)))
    );
}

#[test]
#[should_panic(expected = "invalidated by a heap reset")]
fn reading_a_table_after_reset_panics() {
    let mut device = device(BackendKind::Explicit);
    let rs = lighting_root_signature(&mut device);
    let a = sampled_texture(&mut device);
    device
        .set_shader_resources(ShaderStage::Pixel, &[Some(a.into())], BindingSlot::table(rs, 0))
        .unwrap();
    let block = last_table(&device);

    device.set_descriptor_heap(DescriptorHeapType::CbvSrvUav, true);
    let _ = table_view(&device, &block, 0);
}

// ============================================================================
// Constant Buffers & Samplers
// ============================================================================

#[test]
fn constant_buffers_bind_without_barriers() {
    let mut device = device(BackendKind::Explicit);
    let rs = lighting_root_signature(&mut device);
    let cb = constant_buffer(&mut device);

    device
        .set_constant_buffers(ShaderStage::Vertex, &[cb], BindingSlot::table(rs, 1))
        .unwrap();

    assert_eq!(device.command_list(0).barrier_count(), 0);
    let block = last_table(&device);
    let view = table_view(&device, &block, 0);
    assert_eq!(view.kind, ViewKind::ConstantBuffer);
    assert_eq!(view.resource, Some(ResourceId::from(cb)));
    assert_eq!(device.resource_state(cb), ResourceState::GenericRead);
}

#[test]
#[should_panic(expected = "was not created as a constant buffer")]
fn non_constant_buffer_panics() {
    let mut device = device(BackendKind::Explicit);
    let rs = lighting_root_signature(&mut device);
    let vb = device
        .create_buffer(&BufferDesc::new(3, 16).with_bind_flags(BindFlags::VERTEX_BUFFER), None)
        .unwrap();
    let _ = device.set_constant_buffers(ShaderStage::Vertex, &[vb], BindingSlot::table(rs, 1));
}

#[test]
fn samplers_match_static_samplers() {
    let mut device = device(BackendKind::Explicit);
    let rs = lighting_root_signature(&mut device);
    device.set_root_signature(rs, false);

    device
        .set_samplers(ShaderStage::Pixel, &[SamplerPreset::TrilinearWrap], BindingSlot::default())
        .unwrap();

    // Static samplers live in the root signature; nothing is recorded.
    assert!(
        !device
            .command_list(0)
            .commands()
            .iter()
            .any(|c| matches!(c, NativeCommand::BindSamplers { .. }))
    );
}

#[test]
#[should_panic(expected = "static samplers")]
fn sampler_count_mismatch_panics() {
    let mut device = device(BackendKind::Explicit);
    let rs = lighting_root_signature(&mut device);
    let _ = device.set_samplers(
        ShaderStage::Pixel,
        &[SamplerPreset::TrilinearWrap, SamplerPreset::PointClamp],
        BindingSlot::table(rs, 0),
    );
}

/// An SRV table plus a table of two samplers.
fn sampler_table_root_signature(device: &mut Device) -> RootSignatureId {
    let mut desc = RootSignatureDesc::new(2, 0);
    desc.init_descriptor_table(0, &[DescriptorRange::srv(0, 1)], ShaderVisibility::Pixel)
        .init_descriptor_table(1, &[DescriptorRange::sampler(0, 2)], ShaderVisibility::Pixel);
    device.create_root_signature(&desc).unwrap()
}

#[test]
fn sampler_tables_stage_into_the_sampler_heap() {
    let mut device = device(BackendKind::Explicit);
    let rs = sampler_table_root_signature(&mut device);

    device
        .set_samplers(
            ShaderStage::Pixel,
            &[SamplerPreset::AnisotropicWrap, SamplerPreset::ShadowComparison],
            BindingSlot::table(rs, 1),
        )
        .unwrap();

    let block = last_table(&device);
    assert_eq!(block.heap, DescriptorHeapType::Sampler);
    assert!(matches!(
        device.command_list(0).commands().last(),
        Some(NativeCommand::SetDescriptorTable { root_param_index: 1, .. })
    ));

    let heap = device.descriptors().gpu_heap(DescriptorHeapType::Sampler);
    assert_eq!(heap.used(), 2);
    assert_eq!(
        heap.read(&block, 0).and_then(|v| v.sampler),
        Some(SamplerPreset::AnisotropicWrap)
    );
    assert_eq!(
        heap.read(&block, 1).and_then(|v| v.sampler),
        Some(SamplerPreset::ShadowComparison)
    );
    assert_eq!(device.descriptors().gpu_heap(DescriptorHeapType::CbvSrvUav).used(), 0);
}

#[test]
fn sampler_presets_share_one_staging_descriptor() {
    let mut device = device(BackendKind::Explicit);
    let rs = sampler_table_root_signature(&mut device);
    let samplers = [SamplerPreset::PointClamp, SamplerPreset::BilinearClamp];

    for _ in 0..3 {
        device
            .set_samplers(ShaderStage::Pixel, &samplers, BindingSlot::table(rs, 1))
            .unwrap();
    }

    assert_eq!(device.descriptors().staging(DescriptorHeapType::Sampler).len(), 2);
    assert_eq!(device.descriptors().gpu_heap(DescriptorHeapType::Sampler).used(), 6);
}

#[test]
fn exhausted_sampler_heap_is_an_error() {
    let mut device = device_with(
        BackendKind::Explicit,
        HeapCapacities {
            gpu_sampler: 3,
            ..Default::default()
        },
    );
    let rs = sampler_table_root_signature(&mut device);
    let samplers = [SamplerPreset::PointClamp, SamplerPreset::TrilinearClamp];
    device
        .set_samplers(ShaderStage::Pixel, &samplers, BindingSlot::table(rs, 1))
        .unwrap();

    let result = device.set_samplers(ShaderStage::Pixel, &samplers, BindingSlot::table(rs, 1));

    assert!(matches!(
        result,
        Err(RhiError::CapacityExceeded {
            heap: DescriptorHeapType::Sampler,
            requested: 2,
            available: 1,
        })
    ));

    device.set_descriptor_heap(DescriptorHeapType::Sampler, true);
    device
        .set_samplers(ShaderStage::Pixel, &samplers, BindingSlot::table(rs, 1))
        .unwrap();
}

#[test]
#[should_panic(expected = "sampler table 1 declares 2")]
fn sampler_table_count_mismatch_panics() {
    let mut device = device(BackendKind::Explicit);
    let rs = sampler_table_root_signature(&mut device);
    let _ = device.set_samplers(ShaderStage::Pixel, &[SamplerPreset::PointClamp], BindingSlot::table(rs, 1));
}

// ============================================================================
// Input Assembler
// ============================================================================

#[test]
fn vertex_and_instance_buffers() {
    let mut device = device(BackendKind::Explicit);
    let vertices = device
        .create_buffer(&BufferDesc::new(4, 32).with_bind_flags(BindFlags::VERTEX_BUFFER), None)
        .unwrap();
    let instances = device
        .create_buffer(&BufferDesc::new(16, 64).with_bind_flags(BindFlags::VERTEX_BUFFER), None)
        .unwrap();

    device.set_vertex_buffers(&[vertices, instances]);

    let Some(NativeCommand::SetVertexBuffers { buffers, strides }) = device.command_list(0).commands().last()
    else {
        panic!("expected a vertex buffer binding");
    };
    assert_eq!(buffers.as_slice(), &[vertices, instances]);
    assert_eq!(strides.as_slice(), &[32, 64]);
}

#[test]
#[should_panic(expected = "set_vertex_buffers takes")]
fn three_vertex_buffers_panic() {
    let mut device = device(BackendKind::Explicit);
    let vb = device
        .create_buffer(&BufferDesc::new(4, 32).with_bind_flags(BindFlags::VERTEX_BUFFER), None)
        .unwrap();
    device.set_vertex_buffers(&[vb, vb, vb]);
}

#[test]
fn index_format_follows_stride() {
    let mut device = device(BackendKind::Explicit);
    let indices = device
        .create_buffer(&BufferDesc::new(6, 2).with_bind_flags(BindFlags::INDEX_BUFFER), None)
        .unwrap();

    device.set_index_buffer(indices, 0);

    assert!(matches!(
        device.command_list(0).commands().last(),
        Some(NativeCommand::SetIndexBuffer { format: Format::R16Uint, .. })
    ));
}

// ============================================================================
// Immediate Backend
// ============================================================================

#[test]
fn immediate_binds_views_to_slots() {
    let mut device = device(BackendKind::Immediate);
    let a = sampled_texture(&mut device);

    device
        .set_shader_resources(ShaderStage::Pixel, &[None, Some(a.into())], BindingSlot::at(4))
        .unwrap();

    assert_eq!(device.resource_state(a), ResourceState::PixelShaderResource);
    let Some(NativeCommand::BindViews {
        stage,
        kind,
        start_slot,
        views,
    }) = device.command_list(0).commands().last()
    else {
        panic!("expected a direct view binding");
    };
    assert_eq!(*stage, ShaderStage::Pixel);
    assert_eq!(*kind, ViewKind::ShaderResource);
    assert_eq!(*start_slot, 4);
    assert!(views[0].is_null());
    assert_eq!(views[0].dimension, ViewDimension::Texture2D);
    assert_eq!(views[1].resource, Some(ResourceId::from(a)));
}

#[test]
fn immediate_null_views_use_root_signature_dimensions_when_given() {
    let mut device = device(BackendKind::Immediate);
    let rs = lighting_root_signature(&mut device);

    device
        .set_shader_resources(
            ShaderStage::Pixel,
            &[None, None],
            BindingSlot::table(rs, 0).with_start_slot(0),
        )
        .unwrap();

    let Some(NativeCommand::BindViews { views, .. }) = device.command_list(0).commands().last() else {
        panic!("expected a direct view binding");
    };
    assert_eq!(views[1].dimension, ViewDimension::TextureCube);
    // Immediate binding uses no shader-visible heap space.
    assert_eq!(device.descriptors().gpu_heap(DescriptorHeapType::CbvSrvUav).used(), 0);
}

#[test]
fn immediate_samplers_bind_directly() {
    let mut device = device(BackendKind::Immediate);

    device
        .set_samplers(
            ShaderStage::Pixel,
            &[SamplerPreset::AnisotropicWrap, SamplerPreset::ShadowComparison],
            BindingSlot::at(0),
        )
        .unwrap();

    assert!(matches!(
        device.command_list(0).commands().last(),
        Some(NativeCommand::BindSamplers { samplers, .. }) if samplers.len() == 2
    ));
}

#[test]
fn immediate_constant_buffers_bind_directly() {
    let mut device = device(BackendKind::Immediate);
    let cb = constant_buffer(&mut device);

    device
        .set_constant_buffers(ShaderStage::Pixel, &[cb], BindingSlot::at(1))
        .unwrap();

    assert!(matches!(
        device.command_list(0).commands().last(),
        Some(NativeCommand::BindViews { kind: ViewKind::ConstantBuffer, start_slot: 1, .. })
    ));
}
