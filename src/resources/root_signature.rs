//! Root signatures (binding layouts).
//!
//! A root signature is a list of root parameters plus a list of static
//! samplers. Each parameter is a descriptor table made of typed ranges; the
//! range's [`ViewDimension`] decides which null descriptor fills a slot the
//! caller leaves empty.
//!
//! ```rust,ignore
//! let mut desc = RootSignatureDesc::new(2, 1);
//! desc.init_descriptor_table(0, &[DescriptorRange::srv(0, 3)], ShaderVisibility::Pixel);
//! desc.init_descriptor_table(1, &[DescriptorRange::cbv(0, 1)], ShaderVisibility::All);
//! desc.init_static_sampler(0, 0, SamplerPreset::TrilinearWrap, ShaderVisibility::Pixel);
//! let rs = device.create_root_signature(&desc)?;
//! ```
//!
//! Samplers can also come from a descriptor table of sampler ranges, filled
//! per draw from the shader-visible sampler heap:
//!
//! ```rust,ignore
//! desc.init_descriptor_table(2, &[DescriptorRange::sampler(0, 2)], ShaderVisibility::Pixel);
//! ```

use smallvec::SmallVec;

use crate::errors::{Result, RhiError};
use crate::pipeline::presets::SamplerPreset;
use crate::types::{ShaderStage, ViewDimension};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeKind {
    Srv,
    Uav,
    Cbv,
    Sampler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorRange {
    pub kind: RangeKind,
    pub base_register: u32,
    pub count: u32,
    pub dimension: ViewDimension,
}

impl DescriptorRange {
    #[must_use]
    pub fn srv(base_register: u32, count: u32) -> Self {
        Self {
            kind: RangeKind::Srv,
            base_register,
            count,
            dimension: ViewDimension::Texture2D,
        }
    }

    #[must_use]
    pub fn uav(base_register: u32, count: u32) -> Self {
        Self {
            kind: RangeKind::Uav,
            ..Self::srv(base_register, count)
        }
    }

    #[must_use]
    pub fn cbv(base_register: u32, count: u32) -> Self {
        Self {
            kind: RangeKind::Cbv,
            dimension: ViewDimension::Buffer,
            ..Self::srv(base_register, count)
        }
    }

    #[must_use]
    pub fn sampler(base_register: u32, count: u32) -> Self {
        Self {
            kind: RangeKind::Sampler,
            ..Self::srv(base_register, count)
        }
    }

    /// Declares the view dimensionality the shader expects in this range.
    #[must_use]
    pub fn with_dimension(mut self, dimension: ViewDimension) -> Self {
        self.dimension = dimension;
        self
    }
}

/// Which stages can see a root parameter or static sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShaderVisibility {
    #[default]
    All,
    Vertex,
    Hull,
    Domain,
    Geometry,
    Pixel,
}

impl ShaderVisibility {
    #[must_use]
    pub fn includes(self, stage: ShaderStage) -> bool {
        match self {
            Self::All => true,
            Self::Vertex => stage == ShaderStage::Vertex,
            Self::Hull => stage == ShaderStage::Hull,
            Self::Domain => stage == ShaderStage::Domain,
            Self::Geometry => stage == ShaderStage::Geometry,
            Self::Pixel => stage == ShaderStage::Pixel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootParameter {
    pub ranges: SmallVec<[DescriptorRange; 2]>,
    pub visibility: ShaderVisibility,
}

impl RootParameter {
    /// Total descriptors across all ranges.
    #[must_use]
    pub fn descriptor_count(&self) -> u32 {
        self.ranges.iter().map(|r| r.count).sum()
    }

    /// Declared dimension of the table slot `slot`, counting through ranges in
    /// order. Slots past the declared ranges report `Texture2D`.
    #[must_use]
    pub fn dimension_at(&self, slot: u32) -> ViewDimension {
        let mut first = 0;
        for range in &self.ranges {
            if slot < first + range.count {
                return range.dimension;
            }
            first += range.count;
        }
        ViewDimension::Texture2D
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticSampler {
    pub register: u32,
    pub preset: SamplerPreset,
    pub visibility: ShaderVisibility,
}

/// Builder for a [`RootSignature`]. Every parameter and static sampler slot
/// declared in [`new`](Self::new) must be initialized before creation.
#[derive(Debug, Clone, Default)]
pub struct RootSignatureDesc {
    parameters: Vec<Option<RootParameter>>,
    static_samplers: Vec<Option<StaticSampler>>,
}

impl RootSignatureDesc {
    #[must_use]
    pub fn new(parameter_count: usize, static_sampler_count: usize) -> Self {
        Self {
            parameters: vec![None; parameter_count],
            static_samplers: vec![None; static_sampler_count],
        }
    }

    pub fn init_descriptor_table(
        &mut self,
        index: usize,
        ranges: &[DescriptorRange],
        visibility: ShaderVisibility,
    ) -> &mut Self {
        assert!(
            index < self.parameters.len(),
            "root parameter {index} out of range ({} declared)",
            self.parameters.len()
        );
        self.parameters[index] = Some(RootParameter {
            ranges: ranges.iter().copied().collect(),
            visibility,
        });
        self
    }

    pub fn init_static_sampler(
        &mut self,
        index: usize,
        register: u32,
        preset: SamplerPreset,
        visibility: ShaderVisibility,
    ) -> &mut Self {
        assert!(
            index < self.static_samplers.len(),
            "static sampler {index} out of range ({} declared)",
            self.static_samplers.len()
        );
        self.static_samplers[index] = Some(StaticSampler {
            register,
            preset,
            visibility,
        });
        self
    }

    pub(crate) fn build(&self) -> Result<RootSignature> {
        let mut parameters = Vec::with_capacity(self.parameters.len());
        for (i, parameter) in self.parameters.iter().enumerate() {
            let parameter = parameter.as_ref().ok_or_else(|| {
                RhiError::creation("root signature", format!("root parameter {i} was never initialized"))
            })?;
            if parameter.ranges.is_empty() || parameter.descriptor_count() == 0 {
                return Err(RhiError::creation(
                    "root signature",
                    format!("descriptor table {i} has no descriptors"),
                ));
            }
            let mixes_samplers = parameter.ranges.iter().any(|r| r.kind == RangeKind::Sampler)
                && parameter.ranges.iter().any(|r| r.kind != RangeKind::Sampler);
            if mixes_samplers {
                return Err(RhiError::creation(
                    "root signature",
                    format!("descriptor table {i} mixes sampler and view ranges"),
                ));
            }
            parameters.push(parameter.clone());
        }

        let mut static_samplers = Vec::with_capacity(self.static_samplers.len());
        for (i, sampler) in self.static_samplers.iter().copied().enumerate() {
            let sampler = sampler.ok_or_else(|| {
                RhiError::creation("root signature", format!("static sampler {i} was never initialized"))
            })?;
            static_samplers.push(sampler);
        }

        Ok(RootSignature {
            parameters,
            static_samplers,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSignature {
    parameters: Vec<RootParameter>,
    static_samplers: Vec<StaticSampler>,
}

impl RootSignature {
    #[inline]
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    #[must_use]
    pub fn parameter(&self, index: u32) -> &RootParameter {
        self.parameters.get(index as usize).unwrap_or_else(|| {
            panic!(
                "root parameter {index} out of range ({} parameters)",
                self.parameters.len()
            )
        })
    }

    /// Whether root parameter `index` exists and is a table of samplers.
    #[must_use]
    pub fn is_sampler_table(&self, index: u32) -> bool {
        self.parameters
            .get(index as usize)
            .is_some_and(|p| p.ranges.iter().all(|r| r.kind == RangeKind::Sampler))
    }

    #[inline]
    #[must_use]
    pub fn static_sampler_count(&self) -> usize {
        self.static_samplers.len()
    }

    #[must_use]
    pub fn static_samplers(&self) -> &[StaticSampler] {
        &self.static_samplers
    }
}
