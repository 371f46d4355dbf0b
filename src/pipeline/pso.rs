//! Pipeline state descriptions.
//!
//! A named [`PipelineState`] accumulates shader stages, a root signature and
//! fixed-function state until it is finalized. Finalizing fingerprints the
//! accumulated description; from then on the entry is frozen.

use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

use crate::pipeline::pipeline_id::PipelineId;
use crate::pipeline::presets::{BlendPreset, DepthStencilPreset, RasterizerPreset};
use crate::resources::{InputLayout, RootSignatureId, ShaderId};
use crate::types::{Format, ShaderStage, TopologyClass};

/// Maximum simultaneously bound render targets.
pub const MAX_RENDER_TARGETS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphicsPipelineDesc {
    pub root_signature: Option<RootSignatureId>,
    pub vertex: Option<ShaderId>,
    pub hull: Option<ShaderId>,
    pub domain: Option<ShaderId>,
    pub geometry: Option<ShaderId>,
    pub pixel: Option<ShaderId>,
    pub render_target_formats: SmallVec<[Format; MAX_RENDER_TARGETS]>,
    /// `Format::Unknown` when the pipeline has no depth target.
    pub depth_format: Format,
    pub blend: BlendPreset,
    pub depth_stencil: DepthStencilPreset,
    pub rasterizer: RasterizerPreset,
    pub input_layout: InputLayout,
    pub topology: TopologyClass,
    pub sample_count: u32,
}

impl Default for GraphicsPipelineDesc {
    fn default() -> Self {
        Self {
            root_signature: None,
            vertex: None,
            hull: None,
            domain: None,
            geometry: None,
            pixel: None,
            render_target_formats: SmallVec::new(),
            depth_format: Format::Unknown,
            blend: BlendPreset::default(),
            depth_stencil: DepthStencilPreset::default(),
            rasterizer: RasterizerPreset::default(),
            input_layout: InputLayout::empty(),
            topology: TopologyClass::default(),
            sample_count: 1,
        }
    }
}

impl GraphicsPipelineDesc {
    pub(crate) fn set_shader(&mut self, stage: ShaderStage, shader: ShaderId) {
        let slot = match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Hull => &mut self.hull,
            ShaderStage::Domain => &mut self.domain,
            ShaderStage::Geometry => &mut self.geometry,
            ShaderStage::Pixel => &mut self.pixel,
            ShaderStage::Compute => {
                panic!("compute shaders cannot be attached to a graphics PSO")
            }
        };
        *slot = Some(shader);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ComputePipelineDesc {
    pub root_signature: Option<RootSignatureId>,
    pub shader: Option<ShaderId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PipelineDesc {
    Graphics(GraphicsPipelineDesc),
    Compute(ComputePipelineDesc),
}

impl PipelineDesc {
    #[must_use]
    pub fn is_compute(&self) -> bool {
        matches!(self, Self::Compute(_))
    }

    #[must_use]
    pub fn root_signature(&self) -> Option<RootSignatureId> {
        match self {
            Self::Graphics(desc) => desc.root_signature,
            Self::Compute(desc) => desc.root_signature,
        }
    }

    /// FxHash of the whole description.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = rustc_hash::FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// A named pipeline entry, mutable until finalized.
#[derive(Debug, Clone)]
pub struct PipelineState {
    name: String,
    desc: PipelineDesc,
    compiled: Option<PipelineId>,
}

impl PipelineState {
    pub(crate) fn new(name: &str, is_compute: bool) -> Self {
        let desc = if is_compute {
            PipelineDesc::Compute(ComputePipelineDesc::default())
        } else {
            PipelineDesc::Graphics(GraphicsPipelineDesc::default())
        };
        Self {
            name: name.to_string(),
            desc,
            compiled: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &PipelineDesc {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.compiled.is_some()
    }

    #[inline]
    #[must_use]
    pub fn compiled(&self) -> Option<PipelineId> {
        self.compiled
    }

    pub(crate) fn desc_mut(&mut self) -> &mut PipelineDesc {
        assert!(
            !self.is_finalized(),
            "PSO '{}' is finalized and can no longer be modified",
            self.name
        );
        &mut self.desc
    }

    pub(crate) fn graphics_mut(&mut self) -> &mut GraphicsPipelineDesc {
        match self.desc_mut() {
            PipelineDesc::Graphics(desc) => desc,
            PipelineDesc::Compute(_) => unreachable!("graphics setter reached a compute PSO"),
        }
    }

    pub(crate) fn mark_compiled(&mut self, id: PipelineId) {
        self.compiled = Some(id);
    }
}
