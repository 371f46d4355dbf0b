//! Pipeline State Tests
//!
//! Tests for:
//! - Named PSO lifecycle through the device (initialize, configure, finalize, bind)
//! - Self-heal of unknown names
//! - Compilation caching and deduplication
//! - Build-mode gating of graphics-only setters
//! - Immediate backend: fixed-function state set on the context

use myth_rhi::command::NativeCommand;
use myth_rhi::pipeline::{PipelineDesc, PipelineMode};
use myth_rhi::{
    BackendKind, BindFlags, BlendPreset, ComparisonFunc, DepthStencilPreset, Device, Format,
    PrimitiveTopology, RasterizerPreset, RhiSettings, RootSignatureDesc, ShaderDesc, ShaderId,
    ShaderStage, TextureDesc, TextureId,
};

fn device(backend: BackendKind) -> Device {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut device = Device::new(RhiSettings {
        backend,
        width: 64,
        height: 64,
        ..Default::default()
    })
    .expect("headless device");
    device.begin_command_list(0);
    device
}

fn shader(device: &mut Device, stage: ShaderStage) -> ShaderId {
    device
        .create_shader(ShaderDesc::new(stage, "main", vec![0xDE, 0xAD, 0xBE, 0xEF]))
        .unwrap()
}

fn gbuffer_targets(device: &mut Device) -> ([TextureId; 3], TextureId) {
    let target = |device: &mut Device, format| {
        device
            .create_texture(
                &TextureDesc::new_2d(64, 64, format)
                    .with_bind_flags(BindFlags::RENDER_TARGET | BindFlags::SHADER_RESOURCE),
            )
            .unwrap()
    };
    let albedo = target(device, Format::Rgba8Unorm);
    let normal = target(device, Format::Rgba16Float);
    let extra = target(device, Format::Rgb10A2Unorm);
    let depth = device
        .create_texture(
            &TextureDesc::new_2d(64, 64, Format::D32Float).with_bind_flags(BindFlags::DEPTH_STENCIL),
        )
        .unwrap();
    ([albedo, normal, extra], depth)
}

fn pso_binds(device: &Device) -> usize {
    device
        .command_list(0)
        .commands()
        .iter()
        .filter(|c| matches!(c, NativeCommand::SetPipelineState(_)))
        .count()
}

// ============================================================================
// Self-Heal
// ============================================================================

#[test]
fn set_pso_on_unknown_name_builds_a_default() {
    let mut device = device(BackendKind::Explicit);
    assert!(!device.is_pso_ready("X", false));

    device.set_pso("X", false);

    assert!(device.is_pso_ready("X", false));
    assert_eq!(device.compiled_pso_count(), 1);
    assert_eq!(device.pipeline_mode(), PipelineMode::Graphics);
    assert_eq!(pso_binds(&device), 1);
}

#[test]
fn graphics_and_compute_names_are_separate() {
    let mut device = device(BackendKind::Explicit);
    device.set_pso("Blur", true);

    assert!(device.is_pso_ready("Blur", true));
    assert!(!device.is_pso_ready("Blur", false));
}

#[test]
fn initialized_but_unfinalized_pso_is_not_ready() {
    let mut device = device(BackendKind::Explicit);
    device.initialize_pso("Pending", false);
    assert!(!device.is_pso_ready("Pending", false));
}

// ============================================================================
// GBuffer Scenario
// ============================================================================

#[test]
fn gbuffer_pso_compiles_once() {
    let mut device = device(BackendKind::Explicit);
    let (targets, depth) = gbuffer_targets(&mut device);
    let vs = shader(&mut device, ShaderStage::Vertex);
    let ps = shader(&mut device, ShaderStage::Pixel);

    device.initialize_pso("GBuffer", false);
    device.set_shader(vs);
    device.set_shader(ps);
    device.set_render_target_formats(&targets, Some(depth));
    device.set_depth_stencil_state(DepthStencilPreset::DepthOnlyWrite(ComparisonFunc::LessEqual));
    let id = device.finalize_pso("GBuffer", false);
    device.unset_pso();

    let first = device.set_pso("GBuffer", false);
    let second = device.set_pso("GBuffer", false);

    assert_eq!(first, id);
    assert_eq!(second, id);
    assert_eq!(device.compiled_pso_count(), 1);
    assert_eq!(pso_binds(&device), 2);

    let PipelineDesc::Graphics(desc) = device.pipelines().compiled_desc(id) else {
        panic!("expected a graphics pipeline");
    };
    assert_eq!(
        desc.render_target_formats.as_slice(),
        &[Format::Rgba8Unorm, Format::Rgba16Float, Format::Rgb10A2Unorm]
    );
    assert_eq!(desc.depth_format, Format::D32Float);
    assert_eq!(desc.vertex, Some(vs));
    assert_eq!(desc.pixel, Some(ps));
}

#[test]
fn identical_state_shares_one_compiled_pipeline() {
    let mut device = device(BackendKind::Explicit);

    for name in ["Opaque", "OpaqueCopy"] {
        device.initialize_pso(name, false);
        device.set_main_render_target_formats();
        device.finalize_pso(name, false);
    }
    device.initialize_pso("Transparent", false);
    device.set_main_render_target_formats();
    device.set_blend_state(BlendPreset::AlphaBlend);
    device.finalize_pso("Transparent", false);

    assert_eq!(device.compiled_pso_count(), 2);
}

#[test]
fn root_signature_and_topology_reach_the_pso() {
    let mut device = device(BackendKind::Explicit);
    let rs = device.create_root_signature(&RootSignatureDesc::new(0, 0)).unwrap();

    device.initialize_pso("Lines", false);
    device.set_root_signature_to_pso("Lines", rs, false);
    device.set_topology_type_to_pso("Lines", PrimitiveTopology::LineStrip);
    let id = device.finalize_pso("Lines", false);

    let desc = device.pipelines().compiled_desc(id);
    assert_eq!(desc.root_signature(), Some(rs));
    let PipelineDesc::Graphics(desc) = desc else {
        panic!("expected a graphics pipeline");
    };
    assert_eq!(desc.topology, PrimitiveTopology::LineStrip.class());
}

// ============================================================================
// Mode Gating
// ============================================================================

#[test]
#[should_panic(expected = "graphics-only setter")]
fn blend_state_in_compute_mode_panics() {
    let mut device = device(BackendKind::Explicit);
    device.initialize_pso("Blur", true);
    device.set_blend_state(BlendPreset::Additive);
}

#[test]
#[should_panic(expected = "graphics-only setter")]
fn render_target_formats_in_compute_mode_panic() {
    let mut device = device(BackendKind::Explicit);
    device.initialize_pso("Blur", true);
    device.set_main_render_target_formats();
}

#[test]
fn graphics_setters_without_a_pso_are_ignored() {
    let mut device = device(BackendKind::Explicit);

    device.set_blend_state(BlendPreset::AlphaBlend);
    device.set_rasterizer_state(RasterizerPreset::Wireframe);
    device.set_empty_input_layout();

    assert_eq!(device.pipeline_mode(), PipelineMode::Unset);
    assert!(device.command_list(0).commands().is_empty());
}

#[test]
#[should_panic(expected = "requires a PSO")]
fn explicit_set_shader_without_a_pso_panics() {
    let mut device = device(BackendKind::Explicit);
    let vs = shader(&mut device, ShaderStage::Vertex);
    device.set_shader(vs);
}

#[test]
#[should_panic(expected = "cannot be attached to a compute PSO")]
fn pixel_shader_on_compute_pso_panics() {
    let mut device = device(BackendKind::Explicit);
    let ps = shader(&mut device, ShaderStage::Pixel);
    device.initialize_pso("Blur", true);
    device.set_shader(ps);
}

#[test]
#[should_panic(expected = "is finalized")]
fn changing_a_finalized_pso_panics() {
    let mut device = device(BackendKind::Explicit);
    device.initialize_pso("Opaque", false);
    device.finalize_pso("Opaque", false);
    device.set_rasterizer_state(RasterizerPreset::NoCulling);
}

#[test]
#[should_panic(expected = "is not the PSO being built")]
fn topology_for_another_pso_panics() {
    let mut device = device(BackendKind::Explicit);
    device.initialize_pso("A", false);
    device.set_topology_type_to_pso("B", PrimitiveTopology::PointList);
}

#[test]
#[should_panic(expected = "is not in the state table")]
fn depth_write_never_is_not_a_preset() {
    let mut device = device(BackendKind::Explicit);
    device.initialize_pso("Opaque", false);
    device.set_depth_stencil_state(DepthStencilPreset::DepthOnlyWrite(ComparisonFunc::Never));
}

// ============================================================================
// Immediate Backend
// ============================================================================

#[test]
fn immediate_sets_fixed_function_state_on_the_context() {
    let mut device = device(BackendKind::Immediate);
    let vs = shader(&mut device, ShaderStage::Vertex);

    device.set_shader(vs);
    device.set_blend_state(BlendPreset::Additive);
    device.set_depth_stencil_state(DepthStencilPreset::Disabled);
    device.set_rasterizer_state(RasterizerPreset::Shadow);

    let commands = device.command_list(0).commands();
    assert_eq!(
        commands,
        &[
            NativeCommand::SetShader {
                stage: ShaderStage::Vertex,
                shader: vs,
            },
            NativeCommand::SetBlendState(BlendPreset::Additive),
            NativeCommand::SetDepthStencilState(DepthStencilPreset::Disabled),
            NativeCommand::SetRasterizerState(RasterizerPreset::Shadow),
        ]
    );
}

#[test]
fn immediate_pso_binding_records_nothing() {
    let mut device = device(BackendKind::Immediate);
    device.set_pso("X", false);

    assert!(device.is_pso_ready("X", false));
    assert_eq!(pso_binds(&device), 0);
}
