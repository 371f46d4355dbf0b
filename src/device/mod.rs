//! The RHI Device
//!
//! [`Device`] is the single entry point the engine talks to. It owns every GPU
//! object, the descriptor heaps, the pipeline cache and the swap chain, and it
//! routes recorded work to whichever backend was chosen at startup.
//!
//! # Frame Flow
//!
//! ```text
//! begin_command_list(0)
//!   set_root_signature ─► set_pso ─► set_shader_resources / set_constant_buffers
//!   set_main_render_targets ─► clear_* ─► draw_* / dispatch
//! end_command_list(0) ─► execute_command_lists(0) ─► present()
//! ```
//!
//! # Backends
//!
//! | Concern            | Immediate                    | Explicit                          |
//! |--------------------|------------------------------|-----------------------------------|
//! | Recorders          | one, always open             | pool of `command_list_count`      |
//! | Execution          | on record                    | on `execute_command_lists`        |
//! | Barriers           | tracked, logged, elided      | tracked, recorded, executed       |
//! | Resource binding   | direct slots                 | descriptor tables in GPU heaps    |
//! | Fixed-function set | native state commands        | baked into the named PSO          |
//!
//! The operations themselves are split by concern across the submodules of
//! this module; they all extend the same `impl Device`.

mod binding;
mod commands;
mod pipeline;
mod resources;

pub use binding::{
    BindingSlot, MAX_BOUND_CONSTANT_BUFFERS, MAX_BOUND_SAMPLERS, MAX_BOUND_SHADER_RESOURCES,
    MAX_BOUND_UNORDERED_ACCESS, MAX_BOUND_VERTEX_BUFFERS,
};

use std::sync::Arc;

use smallvec::SmallVec;

use crate::backend::{
    AdapterInfo, Backend, SubmittedList, SwapChain, enumerate_adapters, select_adapter,
};
use crate::command::{CommandRecorder, NativeCommand};
use crate::descriptors::DescriptorManager;
use crate::errors::{Result, RhiError};
use crate::pipeline::{PipelineCache, StateTables};
use crate::resources::{
    Buffer, BufferId, ResourceId, ResourceStore, RootSignature, RootSignatureId, Shader,
    ShaderId, Texture, TextureDesc, TextureId, plan_transitions,
};
use crate::settings::{BackendKind, RhiSettings};
use crate::types::{BindFlags, PrimitiveTopology, Rect, ResourceState, Viewport};

pub struct Device {
    settings: RhiSettings,
    adapter: AdapterInfo,

    // ---- Owned objects ----
    store: ResourceStore,
    descriptors: DescriptorManager,
    tables: Arc<StateTables>,
    pipelines: PipelineCache,

    // ---- Execution ----
    backend: Backend,
    swap_chain: SwapChain,
    main_depth: TextureId,

    // ---- Bound state ----
    viewport: Viewport,
    scissor: Rect,
    topology: PrimitiveTopology,
    /// Last root signature set, indexed by `compute as usize`.
    bound_root_signatures: [Option<RootSignatureId>; 2],

    buffer_read: Option<BufferId>,
    removed: Option<String>,
}

impl Device {
    /// Selects an adapter, builds the descriptor heaps and preset tables, and
    /// creates the swap chain and main depth buffer.
    pub fn new(settings: RhiSettings) -> Result<Self> {
        settings.validate()?;

        let adapter = select_adapter(&enumerate_adapters(), settings.adapter)?;
        let mut store = ResourceStore::new();
        let mut descriptors = DescriptorManager::new(&settings.heap_capacities)?;
        let (swap_chain, main_depth) = create_main_targets(&settings, &mut store, &mut descriptors)?;

        log::info!(
            "RHI device created: adapter '{}', {:?} backend, swap chain {}x{} ({} buffers, {:?})",
            adapter.name,
            settings.backend,
            settings.width,
            settings.height,
            settings.back_buffer_count,
            settings.back_buffer_format,
        );

        let tables = Arc::new(StateTables::new());
        Ok(Self {
            adapter,
            store,
            descriptors,
            pipelines: PipelineCache::new(Arc::clone(&tables)),
            tables,
            backend: Backend::new(settings.backend, settings.command_list_count),
            swap_chain,
            main_depth,
            viewport: Viewport::with_size(settings.width, settings.height),
            scissor: Rect {
                left: 0,
                top: 0,
                right: settings.width as i32,
                bottom: settings.height as i32,
            },
            topology: PrimitiveTopology::TriangleList,
            bound_root_signatures: [None; 2],
            buffer_read: None,
            removed: None,
            settings,
        })
    }

    // ========================================================================
    // Recording helpers
    // ========================================================================

    fn record(&mut self, command: NativeCommand) {
        self.backend.record(command, &mut self.store);
    }

    /// Moves every requested resource into its target state and records the
    /// resulting barriers as one batch.
    ///
    /// Tracked state only changes when the barriers can be recorded.
    fn transition_batch<I>(&mut self, requests: I)
    where
        I: IntoIterator<Item = (Option<ResourceId>, ResourceState)>,
    {
        self.backend.assert_recording();
        let barriers = plan_transitions(&mut self.store, requests);
        if barriers.is_empty() {
            return;
        }
        log::trace!("Recording {} barrier(s)", barriers.len());
        self.record(NativeCommand::ResourceBarrier(barriers));
    }

    // ========================================================================
    // Command lists
    // ========================================================================

    /// Opens command list `index` for recording.
    ///
    /// Indices past the pool size panic. The immediate backend has a single
    /// list at index 0.
    pub fn begin_command_list(&mut self, index: usize) {
        self.backend.begin(index);
    }

    pub fn end_command_list(&mut self, index: usize) {
        self.backend.end(index);
    }

    /// Submits command list `index`. Lists execute in the order they are
    /// submitted.
    pub fn execute_command_lists(&mut self, index: usize) {
        self.backend.execute(index, &mut self.store);
    }

    #[must_use]
    pub fn command_list(&self, index: usize) -> &CommandRecorder {
        self.backend.recorder(index)
    }

    /// Lists executed by the explicit backend's queue, oldest first.
    #[must_use]
    pub fn submitted_lists(&self) -> Vec<SubmittedList> {
        self.backend.submitted()
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    /// Hands the current back buffer to the presentation engine and flips to
    /// the next one.
    ///
    /// The back buffer must already be in [`ResourceState::Present`]; record
    /// that transition before closing the frame's last command list.
    ///
    /// Once the device has been removed every call returns
    /// [`RhiError::DeviceLost`]; the caller must tear the device down.
    pub fn present(&mut self) -> Result<()> {
        if let Some(reason) = &self.removed {
            log::error!("Present failed, device removed: {reason}");
            return Err(RhiError::DeviceLost {
                reason: reason.clone(),
            });
        }

        let state = self.store.texture(self.swap_chain.current()).state();
        assert!(
            state == ResourceState::Present,
            "back buffer must be transitioned to Present before present (it is in {state:?})"
        );

        self.swap_chain.advance();
        log::trace!(
            "Presented frame {} (vsync: {})",
            self.swap_chain.presented_frames(),
            self.swap_chain.vsync()
        );
        Ok(())
    }

    /// Marks the device as removed. The next [`present`](Self::present)
    /// reports the loss.
    pub fn inject_device_removed(&mut self, reason: &str) {
        log::error!("Device removed: {reason}");
        self.removed = Some(reason.to_string());
    }

    #[inline]
    #[must_use]
    pub fn is_device_removed(&self) -> bool {
        self.removed.is_some()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RhiSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn adapter(&self) -> &AdapterInfo {
        &self.adapter
    }

    #[inline]
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    #[inline]
    #[must_use]
    pub fn tables(&self) -> &Arc<StateTables> {
        &self.tables
    }

    #[inline]
    #[must_use]
    pub fn descriptors(&self) -> &DescriptorManager {
        &self.descriptors
    }

    #[inline]
    #[must_use]
    pub fn pipelines(&self) -> &PipelineCache {
        &self.pipelines
    }

    #[inline]
    #[must_use]
    pub fn swap_chain(&self) -> &SwapChain {
        &self.swap_chain
    }

    /// The back buffer rendered to this frame.
    #[inline]
    #[must_use]
    pub fn main_render_target(&self) -> TextureId {
        self.swap_chain.current()
    }

    #[inline]
    #[must_use]
    pub fn main_depth_target(&self) -> TextureId {
        self.main_depth
    }

    #[must_use]
    pub fn texture(&self, id: TextureId) -> &Texture {
        self.store.texture(id)
    }

    #[must_use]
    pub fn buffer(&self, id: BufferId) -> &Buffer {
        self.store.buffer(id)
    }

    #[must_use]
    pub fn shader(&self, id: ShaderId) -> &Shader {
        self.store.shader(id)
    }

    #[must_use]
    pub fn root_signature(&self, id: RootSignatureId) -> &RootSignature {
        self.store.root_signature(id)
    }

    /// Number of live textures, including the swap chain and main depth.
    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.store.texture_count()
    }

    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.store.buffer_count()
    }

    #[inline]
    #[must_use]
    pub fn current_topology(&self) -> PrimitiveTopology {
        self.topology
    }
}

/// Creates the swap chain images and the main depth buffer with their views.
fn create_main_targets(
    settings: &RhiSettings,
    store: &mut ResourceStore,
    descriptors: &mut DescriptorManager,
) -> Result<(SwapChain, TextureId)> {
    let (width, height) = (settings.width, settings.height);

    let mut back_buffers = SmallVec::new();
    for index in 0..settings.back_buffer_count {
        let desc = TextureDesc::new_2d(width, height, settings.back_buffer_format)
            .with_bind_flags(BindFlags::RENDER_TARGET)
            .with_label(&format!("Back Buffer {index}"));
        desc.validate()?;
        let id = store.insert_texture(Texture::new_back_buffer(desc));
        resources::attach_texture_views(store, descriptors, id)?;
        back_buffers.push(id);
    }

    let depth = TextureDesc::new_2d(width, height, settings.depth_buffer_format)
        .with_bind_flags(BindFlags::DEPTH_STENCIL)
        .with_label("Main Depth");
    depth.validate()?;
    let main_depth = store.insert_texture(Texture::new(depth));
    resources::attach_texture_views(store, descriptors, main_depth)?;

    Ok((SwapChain::new(back_buffers, settings.vsync), main_depth))
}
