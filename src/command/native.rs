//! Native command stream.
//!
//! The commands a backend records and later executes against resource
//! memory. This is the layer a platform graphics API would translate into its
//! own command list calls.

use smallvec::SmallVec;

use crate::descriptors::{DescriptorBlock, DescriptorHandle, DescriptorHeapType, ViewDesc, ViewKind};
use crate::pipeline::{BlendPreset, DepthStencilPreset, PipelineId, RasterizerPreset, SamplerPreset};
use crate::resources::{BarrierBatch, BufferId, InputLayout, ResourceId, ResourceStore, RootSignatureId, ShaderId, TextureId};
use crate::types::{Format, PrimitiveTopology, Rect, ShaderStage, Viewport};

#[derive(Debug, Clone, PartialEq)]
pub enum NativeCommand {
    // === Synchronization ===
    ResourceBarrier(BarrierBatch),

    // === Rasterizer ===
    SetViewport(Viewport),
    SetScissorRect(Rect),

    // === Input assembler ===
    SetVertexBuffers {
        buffers: SmallVec<[BufferId; 2]>,
        strides: SmallVec<[u32; 2]>,
    },
    SetIndexBuffer {
        buffer: BufferId,
        format: Format,
        offset: u32,
    },
    SetInputLayout(InputLayout),
    SetPrimitiveTopology(PrimitiveTopology),

    // === Binding (explicit) ===
    SetRootSignature {
        root_signature: RootSignatureId,
        compute: bool,
    },
    SetDescriptorHeaps(SmallVec<[DescriptorHeapType; 2]>),
    SetDescriptorTable {
        root_param_index: u32,
        block: DescriptorBlock,
        compute: bool,
    },

    // === Binding (immediate) ===
    BindViews {
        stage: ShaderStage,
        kind: ViewKind,
        start_slot: u32,
        views: SmallVec<[ViewDesc; 8]>,
    },
    BindSamplers {
        stage: ShaderStage,
        start_slot: u32,
        samplers: SmallVec<[SamplerPreset; 4]>,
    },
    SetShader {
        stage: ShaderStage,
        shader: ShaderId,
    },

    // === Pipeline state ===
    SetPipelineState(PipelineId),
    SetBlendState(BlendPreset),
    SetDepthStencilState(DepthStencilPreset),
    SetRasterizerState(RasterizerPreset),

    // === Output merger ===
    SetRenderTargets {
        render_targets: SmallVec<[DescriptorHandle; 8]>,
        depth: Option<DescriptorHandle>,
    },
    ClearRenderTarget {
        target: DescriptorHandle,
        color: [f32; 4],
    },
    ClearDepthStencil {
        target: DescriptorHandle,
        depth: f32,
        stencil: u8,
    },
    ClearUnorderedAccess {
        target: DescriptorHandle,
        values: [f32; 4],
    },

    // === Work ===
    Draw {
        vertex_count: u32,
        start_vertex: u32,
    },
    DrawIndexed {
        index_count: u32,
        start_index: u32,
        base_vertex: i32,
    },
    DrawInstanced {
        vertex_count_per_instance: u32,
        instance_count: u32,
        start_vertex: u32,
        start_instance: u32,
    },
    DrawIndexedInstanced {
        index_count_per_instance: u32,
        instance_count: u32,
        start_index: u32,
        base_vertex: i32,
        start_instance: u32,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },

    // === Copies ===
    CopyResource {
        dst: ResourceId,
        src: ResourceId,
    },
    CopyTextureRegion {
        dst: TextureId,
        dst_subresource: u32,
        dst_offset: [u32; 3],
        src: TextureId,
        src_subresource: u32,
    },
}

impl NativeCommand {
    /// Number of individual barriers carried by this command.
    #[must_use]
    pub fn barrier_count(&self) -> usize {
        match self {
            Self::ResourceBarrier(batch) => batch.len(),
            _ => 0,
        }
    }

    #[must_use]
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::Draw { .. }
                | Self::DrawIndexed { .. }
                | Self::DrawInstanced { .. }
                | Self::DrawIndexedInstanced { .. }
        )
    }
}

/// Applies the memory side effects of one command.
///
/// Only copies touch memory in the headless layer; everything else is
/// pipeline configuration.
pub fn execute(command: &NativeCommand, store: &mut ResourceStore) {
    match command {
        NativeCommand::CopyResource { dst, src } => store.copy_bytes(*dst, *src),
        NativeCommand::CopyTextureRegion {
            dst,
            dst_subresource,
            dst_offset,
            src,
            src_subresource,
        } => store.copy_texture_region(*dst, *dst_subresource, *dst_offset, *src, *src_subresource),
        NativeCommand::ResourceBarrier(batch) => {
            log::trace!("Executing barrier batch of {}", batch.len());
        }
        _ => {}
    }
}
