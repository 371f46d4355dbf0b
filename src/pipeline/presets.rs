//! Static State Tables
//!
//! Sampler, blend, rasterizer and depth-stencil presets. The tables are built
//! once when the device is created, shared behind an `Arc` and never written
//! again. Looking up a key that is not in a table is a programming error and
//! panics.
//!
//! The depth-stencil table is not the full cross product of
//! mode × comparison function: a read-only `Never` test exists but a writing
//! `Never` test does not.

use rustc_hash::FxHashMap;

// ---------------------------------------------------------------------------
// Descriptor vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl ComparisonFunc {
    pub const ALL: [ComparisonFunc; 8] = [
        Self::Never,
        Self::Less,
        Self::Equal,
        Self::LessEqual,
        Self::Greater,
        Self::NotEqual,
        Self::GreaterEqual,
        Self::Always,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    MinMagMipPoint,
    MinMagLinearMipPoint,
    MinMagMipLinear,
    Anisotropic,
    ComparisonMinMagLinearMipPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Wrap,
    Mirror,
    Clamp,
    Border,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDesc {
    pub filter: Filter,
    pub address: AddressMode,
    pub max_anisotropy: u32,
    pub border_color: [f32; 4],
    pub comparison: Option<ComparisonFunc>,
    pub min_lod: f32,
    pub max_lod: f32,
}

impl SamplerDesc {
    fn new(filter: Filter, address: AddressMode) -> Self {
        Self {
            filter,
            address,
            max_anisotropy: if filter == Filter::Anisotropic { 16 } else { 1 },
            border_color: [0.0; 4],
            comparison: None,
            min_lod: -1000.0,
            max_lod: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    InvSrcAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendDesc {
    pub alpha_to_coverage: bool,
    pub blend_enable: bool,
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub write_mask: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    Solid,
    Wireframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerDesc {
    pub fill: FillMode,
    pub cull: CullMode,
    pub front_counter_clockwise: bool,
    pub depth_clip: bool,
    pub scissor: bool,
    pub depth_bias: i32,
    pub slope_scaled_depth_bias: f32,
}

impl RasterizerDesc {
    fn solid(cull: CullMode) -> Self {
        Self {
            fill: FillMode::Solid,
            cull,
            front_counter_clockwise: false,
            depth_clip: true,
            scissor: false,
            depth_bias: 0,
            slope_scaled_depth_bias: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilDesc {
    pub depth_enable: bool,
    pub depth_write: bool,
    pub depth_func: ComparisonFunc,
    pub stencil_enable: bool,
}

// ---------------------------------------------------------------------------
// Preset keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerPreset {
    TrilinearWrap,
    TrilinearMirror,
    TrilinearClamp,
    TrilinearBorder,
    BilinearWrap,
    BilinearMirror,
    BilinearClamp,
    BilinearBorder,
    AnisotropicWrap,
    AnisotropicMirror,
    AnisotropicClamp,
    AnisotropicBorder,
    PointClamp,
    ShadowComparison,
}

impl SamplerPreset {
    pub const ALL: [SamplerPreset; 14] = [
        Self::TrilinearWrap,
        Self::TrilinearMirror,
        Self::TrilinearClamp,
        Self::TrilinearBorder,
        Self::BilinearWrap,
        Self::BilinearMirror,
        Self::BilinearClamp,
        Self::BilinearBorder,
        Self::AnisotropicWrap,
        Self::AnisotropicMirror,
        Self::AnisotropicClamp,
        Self::AnisotropicBorder,
        Self::PointClamp,
        Self::ShadowComparison,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendPreset {
    #[default]
    NoBlend,
    AlphaToCoverage,
    AlphaBlend,
    Additive,
}

impl BlendPreset {
    pub const ALL: [BlendPreset; 4] = [
        Self::NoBlend,
        Self::AlphaToCoverage,
        Self::AlphaBlend,
        Self::Additive,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RasterizerPreset {
    #[default]
    BackCulling,
    FrontCulling,
    NoCulling,
    Wireframe,
    NoCullingNoDepthClipScissor,
    Shadow,
}

impl RasterizerPreset {
    pub const ALL: [RasterizerPreset; 6] = [
        Self::BackCulling,
        Self::FrontCulling,
        Self::NoCulling,
        Self::Wireframe,
        Self::NoCullingNoDepthClipScissor,
        Self::Shadow,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthStencilPreset {
    /// Depth test without depth writes.
    DepthOnlyRead(ComparisonFunc),
    /// Depth test with depth writes.
    DepthOnlyWrite(ComparisonFunc),
    Disabled,
}

impl Default for DepthStencilPreset {
    fn default() -> Self {
        Self::DepthOnlyWrite(ComparisonFunc::Less)
    }
}

// ---------------------------------------------------------------------------
// StateTables
// ---------------------------------------------------------------------------

/// Immutable preset lookup tables.
pub struct StateTables {
    samplers: FxHashMap<SamplerPreset, SamplerDesc>,
    blend: FxHashMap<BlendPreset, BlendDesc>,
    rasterizer: FxHashMap<RasterizerPreset, RasterizerDesc>,
    depth_stencil: FxHashMap<DepthStencilPreset, DepthStencilDesc>,
}

impl Default for StateTables {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTables {
    #[must_use]
    pub fn new() -> Self {
        let tables = Self {
            samplers: Self::build_samplers(),
            blend: Self::build_blend(),
            rasterizer: Self::build_rasterizer(),
            depth_stencil: Self::build_depth_stencil(),
        };
        log::debug!(
            "Built state tables: {} samplers, {} blend, {} rasterizer, {} depth-stencil",
            tables.samplers.len(),
            tables.blend.len(),
            tables.rasterizer.len(),
            tables.depth_stencil.len()
        );
        tables
    }

    fn build_samplers() -> FxHashMap<SamplerPreset, SamplerDesc> {
        use AddressMode::{Border, Clamp, Mirror, Wrap};
        use SamplerPreset as P;

        let families = [
            (
                Filter::MinMagMipLinear,
                [P::TrilinearWrap, P::TrilinearMirror, P::TrilinearClamp, P::TrilinearBorder],
            ),
            (
                Filter::MinMagLinearMipPoint,
                [P::BilinearWrap, P::BilinearMirror, P::BilinearClamp, P::BilinearBorder],
            ),
            (
                Filter::Anisotropic,
                [
                    P::AnisotropicWrap,
                    P::AnisotropicMirror,
                    P::AnisotropicClamp,
                    P::AnisotropicBorder,
                ],
            ),
        ];

        let mut samplers = FxHashMap::default();
        for (filter, presets) in families {
            for (preset, address) in presets.into_iter().zip([Wrap, Mirror, Clamp, Border]) {
                samplers.insert(preset, SamplerDesc::new(filter, address));
            }
        }

        samplers.insert(P::PointClamp, SamplerDesc::new(Filter::MinMagMipPoint, Clamp));
        samplers.insert(
            P::ShadowComparison,
            SamplerDesc {
                border_color: [1.0; 4],
                comparison: Some(ComparisonFunc::LessEqual),
                ..SamplerDesc::new(Filter::ComparisonMinMagLinearMipPoint, Border)
            },
        );
        samplers
    }

    fn build_blend() -> FxHashMap<BlendPreset, BlendDesc> {
        let opaque = BlendDesc {
            alpha_to_coverage: false,
            blend_enable: false,
            src_color: BlendFactor::One,
            dst_color: BlendFactor::Zero,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
            write_mask: 0x0f,
        };

        let mut blend = FxHashMap::default();
        blend.insert(BlendPreset::NoBlend, opaque);
        blend.insert(
            BlendPreset::AlphaToCoverage,
            BlendDesc {
                alpha_to_coverage: true,
                blend_enable: true,
                dst_color: BlendFactor::InvSrcAlpha,
                ..opaque
            },
        );
        blend.insert(
            BlendPreset::AlphaBlend,
            BlendDesc {
                blend_enable: true,
                src_color: BlendFactor::SrcAlpha,
                dst_color: BlendFactor::InvSrcAlpha,
                dst_alpha: BlendFactor::InvSrcAlpha,
                ..opaque
            },
        );
        blend.insert(
            BlendPreset::Additive,
            BlendDesc {
                blend_enable: true,
                dst_color: BlendFactor::One,
                dst_alpha: BlendFactor::One,
                ..opaque
            },
        );
        blend
    }

    fn build_rasterizer() -> FxHashMap<RasterizerPreset, RasterizerDesc> {
        let mut rasterizer = FxHashMap::default();
        rasterizer.insert(RasterizerPreset::BackCulling, RasterizerDesc::solid(CullMode::Back));
        rasterizer.insert(
            RasterizerPreset::FrontCulling,
            RasterizerDesc {
                front_counter_clockwise: true,
                ..RasterizerDesc::solid(CullMode::Back)
            },
        );
        rasterizer.insert(RasterizerPreset::NoCulling, RasterizerDesc::solid(CullMode::None));
        rasterizer.insert(
            RasterizerPreset::Wireframe,
            RasterizerDesc {
                fill: FillMode::Wireframe,
                ..RasterizerDesc::solid(CullMode::None)
            },
        );
        rasterizer.insert(
            RasterizerPreset::NoCullingNoDepthClipScissor,
            RasterizerDesc {
                depth_clip: false,
                scissor: true,
                ..RasterizerDesc::solid(CullMode::None)
            },
        );
        rasterizer.insert(
            RasterizerPreset::Shadow,
            RasterizerDesc {
                depth_clip: false,
                slope_scaled_depth_bias: 3.0,
                ..RasterizerDesc::solid(CullMode::Back)
            },
        );
        rasterizer
    }

    fn build_depth_stencil() -> FxHashMap<DepthStencilPreset, DepthStencilDesc> {
        let mut depth_stencil = FxHashMap::default();
        for func in ComparisonFunc::ALL {
            depth_stencil.insert(
                DepthStencilPreset::DepthOnlyRead(func),
                DepthStencilDesc {
                    depth_enable: true,
                    depth_write: false,
                    depth_func: func,
                    stencil_enable: false,
                },
            );
            if func == ComparisonFunc::Never {
                continue;
            }
            depth_stencil.insert(
                DepthStencilPreset::DepthOnlyWrite(func),
                DepthStencilDesc {
                    depth_enable: true,
                    depth_write: true,
                    depth_func: func,
                    stencil_enable: false,
                },
            );
        }
        depth_stencil.insert(
            DepthStencilPreset::Disabled,
            DepthStencilDesc {
                depth_enable: false,
                depth_write: false,
                depth_func: ComparisonFunc::Always,
                stencil_enable: false,
            },
        );
        depth_stencil
    }

    // === Lookups ===

    #[must_use]
    pub fn sampler(&self, preset: SamplerPreset) -> &SamplerDesc {
        self.samplers
            .get(&preset)
            .unwrap_or_else(|| panic!("sampler preset {preset:?} is not in the state table"))
    }

    #[must_use]
    pub fn blend(&self, preset: BlendPreset) -> &BlendDesc {
        self.blend
            .get(&preset)
            .unwrap_or_else(|| panic!("blend preset {preset:?} is not in the state table"))
    }

    #[must_use]
    pub fn rasterizer(&self, preset: RasterizerPreset) -> &RasterizerDesc {
        self.rasterizer
            .get(&preset)
            .unwrap_or_else(|| panic!("rasterizer preset {preset:?} is not in the state table"))
    }

    #[must_use]
    pub fn depth_stencil(&self, preset: DepthStencilPreset) -> &DepthStencilDesc {
        self.depth_stencil
            .get(&preset)
            .unwrap_or_else(|| panic!("depth-stencil preset {preset:?} is not in the state table"))
    }

    /// Whether `preset` has a table entry.
    #[must_use]
    pub fn has_depth_stencil(&self, preset: DepthStencilPreset) -> bool {
        self.depth_stencil.contains_key(&preset)
    }
}
