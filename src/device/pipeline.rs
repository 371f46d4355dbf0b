//! Named PSO building and binding.
//!
//! These forward to the [`PipelineCache`](crate::pipeline::PipelineCache).
//! On the immediate backend, which has no pipeline objects, fixed-function
//! presets and shaders are additionally set on the context directly.

use smallvec::SmallVec;

use crate::command::NativeCommand;
use crate::device::Device;
use crate::pipeline::{
    BlendPreset, DepthStencilPreset, MAX_RENDER_TARGETS, PipelineId, PipelineMode,
    RasterizerPreset,
};
use crate::resources::{RootSignatureId, ShaderId, TextureId};
use crate::types::Format;

impl Device {
    /// Starts building (or resumes) the PSO `name` and makes it current.
    pub fn initialize_pso(&mut self, name: &str, is_compute: bool) {
        self.pipelines.initialize(name, is_compute);
    }

    pub fn set_root_signature_to_pso(&mut self, name: &str, root_signature: RootSignatureId, is_compute: bool) {
        let _ = self.store.root_signature(root_signature);
        self.pipelines
            .set_root_signature(name, root_signature, is_compute);
    }

    /// Attaches a shader to the current PSO by its stage.
    ///
    /// # Panics
    ///
    /// On the explicit backend a PSO must be current.
    pub fn set_shader(&mut self, shader: ShaderId) {
        let stage = self.store.shader(shader).stage();
        if self.backend.is_immediate() {
            self.pipelines.set_shader(stage, shader);
            self.record(NativeCommand::SetShader { stage, shader });
            return;
        }
        assert!(
            self.pipelines.mode() != PipelineMode::Unset,
            "set_shader requires a PSO to be initialized or bound first"
        );
        self.pipelines.set_shader(stage, shader);
    }

    /// Sets the PSO's render target formats from the textures it will draw
    /// into. The sample count follows the first target.
    pub fn set_render_target_formats(&mut self, render_targets: &[TextureId], depth: Option<TextureId>) {
        assert!(
            render_targets.len() <= MAX_RENDER_TARGETS,
            "at most {MAX_RENDER_TARGETS} render targets, got {}",
            render_targets.len()
        );
        let formats: SmallVec<[Format; MAX_RENDER_TARGETS]> = render_targets
            .iter()
            .map(|&id| self.store.texture(id).format())
            .collect();
        let depth_format = depth.map(|id| self.store.texture(id).format());
        let sample_count = render_targets
            .first()
            .or(depth.as_ref())
            .map_or(1, |&id| self.store.texture(id).desc().sample_count);

        self.pipelines
            .set_render_target_formats(&formats, depth_format);
        self.pipelines.set_sample_count(sample_count);
    }

    /// Sets the PSO's formats to the swap chain and main depth formats.
    pub fn set_main_render_target_formats(&mut self) {
        let formats = [self.settings.back_buffer_format];
        self.pipelines
            .set_render_target_formats(&formats, Some(self.settings.depth_buffer_format));
        self.pipelines.set_sample_count(1);
    }

    pub fn set_depth_stencil_state(&mut self, preset: DepthStencilPreset) {
        let _ = self.tables.depth_stencil(preset);
        self.pipelines.set_depth_stencil(preset);
        if self.backend.is_immediate() {
            self.record(NativeCommand::SetDepthStencilState(preset));
        }
    }

    pub fn set_blend_state(&mut self, preset: BlendPreset) {
        let _ = self.tables.blend(preset);
        self.pipelines.set_blend(preset);
        if self.backend.is_immediate() {
            self.record(NativeCommand::SetBlendState(preset));
        }
    }

    pub fn set_rasterizer_state(&mut self, preset: RasterizerPreset) {
        let _ = self.tables.rasterizer(preset);
        self.pipelines.set_rasterizer(preset);
        if self.backend.is_immediate() {
            self.record(NativeCommand::SetRasterizerState(preset));
        }
    }

    /// Compiles and freezes the PSO `name`.
    pub fn finalize_pso(&mut self, name: &str, is_compute: bool) -> PipelineId {
        self.pipelines.finalize(name, is_compute)
    }

    /// Binds the compiled PSO `name`.
    ///
    /// A name that was never built is created with default state, finalized
    /// and bound, with a warning.
    pub fn set_pso(&mut self, name: &str, is_compute: bool) -> PipelineId {
        let id = self.pipelines.bind(name, is_compute);
        if !self.backend.is_immediate() {
            self.record(NativeCommand::SetPipelineState(id));
        }
        id
    }

    pub fn unset_pso(&mut self) {
        self.pipelines.unset();
    }

    /// True when `name` exists and has been finalized.
    #[must_use]
    pub fn is_pso_ready(&self, name: &str, is_compute: bool) -> bool {
        self.pipelines.is_ready(name, is_compute)
    }

    /// Number of distinct pipelines compiled so far.
    #[must_use]
    pub fn compiled_pso_count(&self) -> usize {
        self.pipelines.compiled_count()
    }

    #[inline]
    #[must_use]
    pub fn pipeline_mode(&self) -> PipelineMode {
        self.pipelines.mode()
    }
}
