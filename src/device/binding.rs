//! State transitions and resource binding.
//!
//! Binding a list of resources to a stage works the same way on both backends
//! up to the last step:
//!
//! 1. Resolve each entry to its view descriptor, substituting the null
//!    descriptor of the declared dimension for absent entries.
//! 2. Transition every present resource to the state the stage reads it in.
//! 3. Explicit: copy the views into a fresh block of the shader-visible heap
//!    and set it as the descriptor table of the root parameter.
//!    Immediate: bind the views straight to consecutive slots.

use smallvec::SmallVec;

use crate::command::NativeCommand;
use crate::descriptors::{DescriptorBlock, DescriptorHandle, DescriptorHeapType, ViewKind};
use crate::device::Device;
use crate::errors::{Result, RhiError};
use crate::pipeline::SamplerPreset;
use crate::resources::{BufferId, InputLayout, ResourceId, RootParameter, RootSignatureId};
use crate::types::{BindFlags, Format, PrimitiveTopology, ResourceState, ShaderStage, ViewDimension};

pub const MAX_BOUND_SHADER_RESOURCES: usize = 64;
pub const MAX_BOUND_UNORDERED_ACCESS: usize = 8;
pub const MAX_BOUND_CONSTANT_BUFFERS: usize = 14;
pub const MAX_BOUND_VERTEX_BUFFERS: usize = 2;
pub const MAX_BOUND_SAMPLERS: usize = 16;

/// Where a resource list lands.
///
/// The explicit backend binds through `root_signature` / `root_param_index`;
/// the immediate backend binds to consecutive slots from `start_slot`. Both
/// can be given, so one call site serves either backend.
///
/// ```rust,ignore
/// device.set_shader_resources(
///     ShaderStage::Pixel,
///     &[Some(albedo.into()), None],
///     BindingSlot::table(gbuffer_rs, 0),
/// )?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BindingSlot {
    pub root_signature: Option<RootSignatureId>,
    pub root_param_index: u32,
    pub start_slot: u32,
    /// Bind to the compute root signature instead of the graphics one.
    pub compute: bool,
}

impl BindingSlot {
    /// Slot-based binding starting at `start_slot`.
    #[must_use]
    pub fn at(start_slot: u32) -> Self {
        Self {
            start_slot,
            ..Self::default()
        }
    }

    /// Descriptor-table binding to root parameter `root_param_index`.
    #[must_use]
    pub fn table(root_signature: RootSignatureId, root_param_index: u32) -> Self {
        Self {
            root_signature: Some(root_signature),
            root_param_index,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_start_slot(mut self, start_slot: u32) -> Self {
        self.start_slot = start_slot;
        self
    }

    #[must_use]
    pub fn compute(mut self) -> Self {
        self.compute = true;
        self
    }
}

impl Device {
    // ========================================================================
    // Transitions
    // ========================================================================

    /// Moves every listed resource to `state`, recording one barrier per
    /// resource that is not already there. A resource already in `state`
    /// records nothing.
    pub fn transition(&mut self, resources: &[ResourceId], state: ResourceState) {
        self.transition_batch(resources.iter().map(|&r| (Some(r), state)));
    }

    /// Moves each resource to its own target state. `None` entries are
    /// skipped.
    ///
    /// Returns [`RhiError::InvalidArgument`] without recording anything when
    /// the two lists differ in length.
    pub fn transition_each(
        &mut self,
        resources: &[Option<ResourceId>],
        states: &[ResourceState],
    ) -> Result<()> {
        if resources.len() != states.len() {
            return Err(RhiError::InvalidArgument(format!(
                "transition_each got {} resources but {} states",
                resources.len(),
                states.len()
            )));
        }
        self.transition_batch(resources.iter().copied().zip(states.iter().copied()));
        Ok(())
    }

    // ========================================================================
    // Shader-visible resources
    // ========================================================================

    /// Binds shader resource views. Absent entries read as zero.
    pub fn set_shader_resources(
        &mut self,
        stage: ShaderStage,
        resources: &[Option<ResourceId>],
        slot: BindingSlot,
    ) -> Result<()> {
        assert!(
            !resources.is_empty() && resources.len() <= MAX_BOUND_SHADER_RESOURCES,
            "set_shader_resources takes 1..={MAX_BOUND_SHADER_RESOURCES} entries, got {}",
            resources.len()
        );
        self.bind_views(stage, ViewKind::ShaderResource, resources, slot)
    }

    /// Binds unordered access views. Absent entries discard writes.
    pub fn set_unordered_access_resources(
        &mut self,
        stage: ShaderStage,
        resources: &[Option<ResourceId>],
        slot: BindingSlot,
    ) -> Result<()> {
        assert!(
            !resources.is_empty() && resources.len() <= MAX_BOUND_UNORDERED_ACCESS,
            "set_unordered_access_resources takes 1..={MAX_BOUND_UNORDERED_ACCESS} entries, got {}",
            resources.len()
        );
        self.bind_views(stage, ViewKind::UnorderedAccess, resources, slot)
    }

    /// Binds constant buffers. Constant buffers stay in the state they were
    /// created in, so no barrier is recorded.
    pub fn set_constant_buffers(
        &mut self,
        stage: ShaderStage,
        buffers: &[BufferId],
        slot: BindingSlot,
    ) -> Result<()> {
        assert!(
            !buffers.is_empty() && buffers.len() <= MAX_BOUND_CONSTANT_BUFFERS,
            "set_constant_buffers takes 1..={MAX_BOUND_CONSTANT_BUFFERS} buffers, got {}",
            buffers.len()
        );
        let sources: SmallVec<[DescriptorHandle; 8]> = buffers
            .iter()
            .map(|&id| {
                let buffer = self.store.buffer(id);
                buffer.views.cbv.unwrap_or_else(|| {
                    panic!("buffer {:?} was not created as a constant buffer", buffer.desc.label)
                })
            })
            .collect();
        self.bind_table(stage, ViewKind::ConstantBuffer, &sources, slot)
    }

    /// Binds sampler presets.
    ///
    /// On the explicit backend a `slot` naming a sampler descriptor table gets
    /// the presets staged into the shader-visible sampler heap. Otherwise the
    /// root signature bakes them in as static samplers and only the count is
    /// checked.
    pub fn set_samplers(
        &mut self,
        stage: ShaderStage,
        samplers: &[SamplerPreset],
        slot: BindingSlot,
    ) -> Result<()> {
        assert!(
            !samplers.is_empty() && samplers.len() <= MAX_BOUND_SAMPLERS,
            "set_samplers takes 1..={MAX_BOUND_SAMPLERS} samplers, got {}",
            samplers.len()
        );
        for &preset in samplers {
            let _ = self.tables.sampler(preset);
        }

        if self.backend.is_immediate() {
            self.record(NativeCommand::BindSamplers {
                stage,
                start_slot: slot.start_slot,
                samplers: SmallVec::from_slice(samplers),
            });
            return Ok(());
        }

        if let Some(root_signature) = slot.root_signature
            && self.store.root_signature(root_signature).is_sampler_table(slot.root_param_index)
        {
            let expected = self
                .store
                .root_signature(root_signature)
                .parameter(slot.root_param_index)
                .descriptor_count() as usize;
            assert!(
                samplers.len() == expected,
                "{} samplers given but sampler table {} declares {expected}",
                samplers.len(),
                slot.root_param_index
            );
            let sources = samplers
                .iter()
                .map(|&preset| self.descriptors.sampler_view(preset))
                .collect::<Result<SmallVec<[DescriptorHandle; 8]>>>()?;
            let block = self.descriptors.stage_table(DescriptorHeapType::Sampler, &sources)?;
            self.record(NativeCommand::SetDescriptorTable {
                root_param_index: slot.root_param_index,
                block,
                compute: slot.compute,
            });
            return Ok(());
        }

        let root_signature = slot
            .root_signature
            .or(self.bound_root_signatures[usize::from(slot.compute)])
            .unwrap_or_else(|| panic!("set_samplers needs a root signature to check static samplers against"));
        let expected = self.store.root_signature(root_signature).static_sampler_count();
        assert!(
            samplers.len() == expected,
            "{} samplers given but the root signature declares {expected} static samplers",
            samplers.len()
        );
        Ok(())
    }

    /// Resolves views, transitions present resources and binds.
    fn bind_views(
        &mut self,
        stage: ShaderStage,
        kind: ViewKind,
        resources: &[Option<ResourceId>],
        slot: BindingSlot,
    ) -> Result<()> {
        let target_state = match kind {
            ViewKind::UnorderedAccess => ResourceState::UnorderedAccess,
            _ => stage.shader_read_state(),
        };
        let parameter = slot
            .root_signature
            .map(|rs| self.store.root_signature(rs).parameter(slot.root_param_index).clone());

        let sources: SmallVec<[DescriptorHandle; 8]> = resources
            .iter()
            .enumerate()
            .map(|(i, resource)| match resource {
                Some(resource) => self.view_of(*resource, kind),
                None => self.null_view(kind, parameter.as_ref(), i as u32),
            })
            .collect();

        if self.backend.is_immediate() {
            self.transition_batch(resources.iter().map(|&r| (r, target_state)));
            self.bind_table(stage, kind, &sources, slot)
        } else {
            // The table is staged before any state changes so a full heap
            // leaves resources untouched.
            let block = self.stage_table(&sources, slot)?;
            self.transition_batch(resources.iter().map(|&r| (r, target_state)));
            self.record(NativeCommand::SetDescriptorTable {
                root_param_index: slot.root_param_index,
                block,
                compute: slot.compute,
            });
            Ok(())
        }
    }

    /// Binds already-resolved views without touching resource state.
    fn bind_table(
        &mut self,
        stage: ShaderStage,
        kind: ViewKind,
        sources: &[DescriptorHandle],
        slot: BindingSlot,
    ) -> Result<()> {
        if self.backend.is_immediate() {
            let views = sources.iter().map(|&h| *self.descriptors.view(h)).collect();
            self.record(NativeCommand::BindViews {
                stage,
                kind,
                start_slot: slot.start_slot,
                views,
            });
        } else {
            let block = self.stage_table(sources, slot)?;
            self.record(NativeCommand::SetDescriptorTable {
                root_param_index: slot.root_param_index,
                block,
                compute: slot.compute,
            });
        }
        Ok(())
    }

    fn stage_table(&mut self, sources: &[DescriptorHandle], slot: BindingSlot) -> Result<DescriptorBlock> {
        assert!(
            slot.root_signature.is_some(),
            "descriptor-table binding needs BindingSlot::root_signature"
        );
        self.descriptors.stage_table(DescriptorHeapType::CbvSrvUav, sources)
    }

    fn view_of(&self, resource: ResourceId, kind: ViewKind) -> DescriptorHandle {
        match (resource, kind) {
            (ResourceId::Texture(id), ViewKind::UnorderedAccess) => self.store.texture(id).uav(),
            (ResourceId::Texture(id), _) => self.store.texture(id).srv(),
            (ResourceId::Buffer(id), kind) => {
                let buffer = self.store.buffer(id);
                let view = match kind {
                    ViewKind::UnorderedAccess => buffer.views.uav,
                    _ => buffer.views.srv,
                };
                view.unwrap_or_else(|| {
                    panic!("buffer {:?} has no {kind:?} view", buffer.desc.label)
                })
            }
        }
    }

    fn null_view(&self, kind: ViewKind, parameter: Option<&RootParameter>, slot: u32) -> DescriptorHandle {
        let dimension = parameter.map_or(ViewDimension::Texture2D, |p| p.dimension_at(slot));
        match kind {
            ViewKind::UnorderedAccess => self.descriptors.null().uav(dimension),
            _ => self.descriptors.null().srv(dimension),
        }
    }

    // ========================================================================
    // Input assembler
    // ========================================================================

    /// Binds one vertex buffer, or a vertex and an instance buffer.
    pub fn set_vertex_buffers(&mut self, buffers: &[BufferId]) {
        assert!(
            !buffers.is_empty() && buffers.len() <= MAX_BOUND_VERTEX_BUFFERS,
            "set_vertex_buffers takes 1..={MAX_BOUND_VERTEX_BUFFERS} buffers, got {}",
            buffers.len()
        );
        let mut strides = SmallVec::new();
        for &id in buffers {
            let buffer = self.store.buffer(id);
            assert!(
                buffer.desc.bind_flags.contains(BindFlags::VERTEX_BUFFER),
                "buffer {:?} is not a vertex buffer",
                buffer.desc.label
            );
            strides.push(buffer.stride());
        }
        self.record(NativeCommand::SetVertexBuffers {
            buffers: SmallVec::from_slice(buffers),
            strides,
        });
    }

    /// Binds an index buffer. The index format comes from the buffer's format,
    /// or from its stride when the format is `Unknown`.
    pub fn set_index_buffer(&mut self, id: BufferId, offset: u32) {
        let buffer = self.store.buffer(id);
        assert!(
            buffer.desc.bind_flags.contains(BindFlags::INDEX_BUFFER),
            "buffer {:?} is not an index buffer",
            buffer.desc.label
        );
        let format = match (buffer.desc.format, buffer.stride()) {
            (Format::Unknown, 2) => Format::R16Uint,
            (Format::Unknown, 4) => Format::R32Uint,
            (Format::R16Uint | Format::R32Uint, _) => buffer.desc.format,
            (format, stride) => panic!("index buffers must be R16Uint or R32Uint, got {format:?} (stride {stride})"),
        };
        self.record(NativeCommand::SetIndexBuffer {
            buffer: id,
            format,
            offset,
        });
    }

    /// Sets the vertex layout of the PSO being built, and of the
    /// input assembler on the immediate backend.
    pub fn set_input_layout(&mut self, layout: &InputLayout) {
        self.pipelines.set_input_layout(layout);
        if self.backend.is_immediate() {
            self.record(NativeCommand::SetInputLayout(layout.clone()));
        }
    }

    /// Sets a layout with no vertex attributes, for draws driven purely by
    /// vertex id.
    pub fn set_empty_input_layout(&mut self) {
        self.set_input_layout(&InputLayout::empty());
    }

    pub fn set_topology_type(&mut self, topology: PrimitiveTopology) {
        self.topology = topology;
        self.record(NativeCommand::SetPrimitiveTopology(topology));
    }

    /// Bakes the topology class into the named graphics PSO. Ignored when no
    /// PSO is being built.
    pub fn set_topology_type_to_pso(&mut self, name: &str, topology: PrimitiveTopology) {
        if let Some(current) = self.pipelines.current_name() {
            assert!(
                current == name,
                "PSO '{name}' is not the PSO being built (current: '{current}')"
            );
        }
        self.pipelines.set_topology(topology.class());
    }

    // ========================================================================
    // Root signatures and heaps
    // ========================================================================

    pub fn set_root_signature(&mut self, root_signature: RootSignatureId, compute: bool) {
        // Validates the handle.
        let _ = self.store.root_signature(root_signature);
        self.bound_root_signatures[usize::from(compute)] = Some(root_signature);
        if !self.backend.is_immediate() {
            self.record(NativeCommand::SetRootSignature {
                root_signature,
                compute,
            });
        }
    }

    /// Makes the shader-visible heaps current, optionally resetting `heap`
    /// first. Resetting invalidates every descriptor table staged from it.
    pub fn set_descriptor_heap(&mut self, heap: DescriptorHeapType, reset: bool) {
        assert!(
            heap.can_be_shader_visible(),
            "{heap:?} heaps cannot be shader-visible"
        );
        if reset {
            self.descriptors.gpu_heap_mut(heap).reset();
        }
        if !self.backend.is_immediate() {
            self.record(NativeCommand::SetDescriptorHeaps(SmallVec::from_slice(&[
                DescriptorHeapType::CbvSrvUav,
                DescriptorHeapType::Sampler,
            ])));
        }
    }
}
