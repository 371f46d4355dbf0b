//! Named Pipeline Cache
//!
//! Owns every pipeline state object, addressed by a user-supplied name, and
//! the compiled pipelines they resolve to.
//!
//! # Two-Level Lookup
//!
//! - **Name → entry**: one [`PipelineState`] per `(name, is_compute)`, built
//!   incrementally between [`initialize`](PipelineCache::initialize) and
//!   [`finalize`](PipelineCache::finalize).
//! - **Fingerprint → compiled**: finalizing hashes the accumulated
//!   description. Two names with identical state share one compiled pipeline,
//!   so [`compiled_count`](PipelineCache::compiled_count) only grows for
//!   genuinely new state.
//!
//! # Build Mode
//!
//! The cache tracks which kind of PSO is being built ([`PipelineMode`]).
//! Graphics-only setters are ignored while nothing is being built and are a
//! fatal error while a compute PSO is current.
//!
//! # Self-Heal
//!
//! [`bind`](PipelineCache::bind) on a name that was never initialized logs a
//! warning, builds and finalizes a default entry under that name and binds it.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::pipeline::pipeline_id::PipelineId;
use crate::pipeline::presets::{BlendPreset, DepthStencilPreset, RasterizerPreset, StateTables};
use crate::pipeline::pso::{GraphicsPipelineDesc, MAX_RENDER_TARGETS, PipelineDesc, PipelineState};
use crate::resources::{InputLayout, RootSignatureId, ShaderId};
use crate::types::{Format, ShaderStage, TopologyClass};

/// Which kind of PSO is currently being built or bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineMode {
    #[default]
    Unset,
    Graphics,
    Compute,
}

impl PipelineMode {
    #[inline]
    fn of(is_compute: bool) -> Self {
        if is_compute { Self::Compute } else { Self::Graphics }
    }
}

pub struct PipelineCache {
    tables: Arc<StateTables>,

    // ---- Named entries ----
    graphics: FxHashMap<String, PipelineState>,
    compute: FxHashMap<String, PipelineState>,

    // ---- Compiled storage (indexed by PipelineId) ----
    compiled: Vec<PipelineDesc>,
    compiled_lookup: FxHashMap<u64, PipelineId>,

    // ---- Build state ----
    mode: PipelineMode,
    current: Option<String>,
}

impl PipelineCache {
    #[must_use]
    pub fn new(tables: Arc<StateTables>) -> Self {
        Self {
            tables,
            graphics: FxHashMap::default(),
            compute: FxHashMap::default(),
            compiled: Vec::with_capacity(64),
            compiled_lookup: FxHashMap::default(),
            mode: PipelineMode::Unset,
            current: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    #[inline]
    #[must_use]
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Number of pipelines actually compiled so far.
    #[inline]
    #[must_use]
    pub fn compiled_count(&self) -> usize {
        self.compiled.len()
    }

    #[must_use]
    pub fn get(&self, name: &str, is_compute: bool) -> Option<&PipelineState> {
        self.entries(is_compute).get(name)
    }

    /// Description a compiled pipeline was built from.
    #[must_use]
    pub fn compiled_desc(&self, id: PipelineId) -> &PipelineDesc {
        &self.compiled[id.index()]
    }

    /// True when `name` exists and has been finalized.
    #[must_use]
    pub fn is_ready(&self, name: &str, is_compute: bool) -> bool {
        self.get(name, is_compute)
            .is_some_and(PipelineState::is_finalized)
    }

    fn entries(&self, is_compute: bool) -> &FxHashMap<String, PipelineState> {
        if is_compute { &self.compute } else { &self.graphics }
    }

    fn entries_mut(&mut self, is_compute: bool) -> &mut FxHashMap<String, PipelineState> {
        if is_compute {
            &mut self.compute
        } else {
            &mut self.graphics
        }
    }

    // ── Build Lifecycle ──────────────────────────────────────────────────────

    /// Creates `name` if it does not exist and makes it the PSO being built.
    pub fn initialize(&mut self, name: &str, is_compute: bool) {
        self.entries_mut(is_compute)
            .entry(name.to_string())
            .or_insert_with(|| PipelineState::new(name, is_compute));
        self.mode = PipelineMode::of(is_compute);
        self.current = Some(name.to_string());
        log::trace!("Initialized PSO '{name}' (compute: {is_compute})");
    }

    pub fn unset(&mut self) {
        self.mode = PipelineMode::Unset;
        self.current = None;
    }

    /// Compiles and freezes `name`. Finalizing twice returns the same id.
    pub fn finalize(&mut self, name: &str, is_compute: bool) -> PipelineId {
        let state = self
            .entries(is_compute)
            .get(name)
            .unwrap_or_else(|| panic!("cannot finalize PSO '{name}': it was never initialized"));
        if let Some(id) = state.compiled() {
            return id;
        }
        let desc = state.desc().clone();

        let fingerprint = desc.fingerprint();
        let id = if let Some(&id) = self.compiled_lookup.get(&fingerprint) {
            log::debug!("PSO '{name}' shares compiled pipeline {}", id.index());
            id
        } else {
            let id = PipelineId(self.compiled.len() as u32);
            self.compiled.push(desc);
            self.compiled_lookup.insert(fingerprint, id);
            log::debug!(
                "Compiled PSO '{name}' as pipeline {} (fingerprint {fingerprint:016x})",
                id.index()
            );
            id
        };

        if let Some(state) = self.entries_mut(is_compute).get_mut(name) {
            state.mark_compiled(id);
        }
        id
    }

    /// Binds the compiled pipeline of `name`, building a default one first if
    /// the name is unknown.
    pub fn bind(&mut self, name: &str, is_compute: bool) -> PipelineId {
        if let Some(state) = self.entries(is_compute).get(name) {
            let id = state
                .compiled()
                .unwrap_or_else(|| panic!("PSO '{name}' is bound before being finalized"));
            self.mode = PipelineMode::of(is_compute);
            self.current = Some(name.to_string());
            return id;
        }

        log::warn!("PSO '{name}' (compute: {is_compute}) was requested before it was built; creating a default one");
        self.initialize(name, is_compute);
        self.finalize(name, is_compute);
        self.bind(name, is_compute)
    }

    // ── Setters ──────────────────────────────────────────────────────────────

    /// Current graphics entry, or `None` when nothing is being built.
    fn graphics_target(&mut self, setter: &str) -> Option<&mut GraphicsPipelineDesc> {
        match self.mode {
            PipelineMode::Unset => {
                log::debug!("{setter} ignored: no PSO is being built");
                None
            }
            PipelineMode::Compute => panic!(
                "{setter} is a graphics-only setter but compute PSO '{}' is current",
                self.current.as_deref().unwrap_or_default()
            ),
            PipelineMode::Graphics => {
                let name = self.current.as_deref().unwrap_or_default();
                let state = self
                    .graphics
                    .get_mut(name)
                    .unwrap_or_else(|| panic!("current graphics PSO '{name}' is missing"));
                Some(state.graphics_mut())
            }
        }
    }

    /// Attaches a shader blob to the current PSO by stage.
    pub fn set_shader(&mut self, stage: ShaderStage, shader: ShaderId) {
        match self.mode {
            PipelineMode::Unset => {
                log::debug!("set_shader ignored: no PSO is being built");
            }
            PipelineMode::Compute => {
                assert!(
                    stage == ShaderStage::Compute,
                    "{stage:?} shader cannot be attached to a compute PSO"
                );
                let name = self.current.as_deref().unwrap_or_default();
                let state = self
                    .compute
                    .get_mut(name)
                    .unwrap_or_else(|| panic!("current compute PSO '{name}' is missing"));
                if let PipelineDesc::Compute(desc) = state.desc_mut() {
                    desc.shader = Some(shader);
                }
            }
            PipelineMode::Graphics => {
                assert!(
                    stage != ShaderStage::Compute,
                    "compute shader cannot be attached to a graphics PSO"
                );
                if let Some(desc) = self.graphics_target("set_shader") {
                    desc.set_shader(stage, shader);
                }
            }
        }
    }

    pub fn set_root_signature(&mut self, name: &str, root_signature: RootSignatureId, is_compute: bool) {
        assert!(
            self.mode == PipelineMode::of(is_compute) && self.current.as_deref() == Some(name),
            "PSO '{name}' (compute: {is_compute}) is not the PSO being built"
        );
        let state = self
            .entries_mut(is_compute)
            .get_mut(name)
            .unwrap_or_else(|| panic!("PSO '{name}' is missing"));
        match state.desc_mut() {
            PipelineDesc::Graphics(desc) => desc.root_signature = Some(root_signature),
            PipelineDesc::Compute(desc) => desc.root_signature = Some(root_signature),
        }
    }

    pub fn set_render_target_formats(&mut self, formats: &[Format], depth: Option<Format>) {
        assert!(
            formats.len() <= MAX_RENDER_TARGETS,
            "at most {MAX_RENDER_TARGETS} render target formats, got {}",
            formats.len()
        );
        if let Some(desc) = self.graphics_target("set_render_target_formats") {
            desc.render_target_formats = SmallVec::from_slice(formats);
            desc.depth_format = depth.unwrap_or(Format::Unknown);
        }
    }

    pub fn set_sample_count(&mut self, sample_count: u32) {
        if let Some(desc) = self.graphics_target("set_sample_count") {
            desc.sample_count = sample_count;
        }
    }

    pub fn set_blend(&mut self, preset: BlendPreset) {
        let tables = Arc::clone(&self.tables);
        if let Some(desc) = self.graphics_target("set_blend_state") {
            let _ = tables.blend(preset);
            desc.blend = preset;
        }
    }

    pub fn set_depth_stencil(&mut self, preset: DepthStencilPreset) {
        let tables = Arc::clone(&self.tables);
        if let Some(desc) = self.graphics_target("set_depth_stencil_state") {
            let _ = tables.depth_stencil(preset);
            desc.depth_stencil = preset;
        }
    }

    pub fn set_rasterizer(&mut self, preset: RasterizerPreset) {
        let tables = Arc::clone(&self.tables);
        if let Some(desc) = self.graphics_target("set_rasterizer_state") {
            let _ = tables.rasterizer(preset);
            desc.rasterizer = preset;
        }
    }

    pub fn set_input_layout(&mut self, layout: &InputLayout) {
        if let Some(desc) = self.graphics_target("set_input_layout") {
            desc.input_layout = layout.clone();
        }
    }

    pub fn set_topology(&mut self, topology: TopologyClass) {
        if let Some(desc) = self.graphics_target("set_topology_type_to_pso") {
            desc.topology = topology;
        }
    }
}
