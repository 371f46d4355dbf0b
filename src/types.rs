//! Backend-agnostic RHI vocabulary
//!
//! Formats, resource states, bind/access flags, shader stages and the small
//! value types (viewports, scissor rects) shared by every other module.

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

/// Pixel / element format of a texture, typed buffer or vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Unknown,
    Rgba32Typeless,
    Rgba32Float,
    Rgba32Uint,
    Rgb32Typeless,
    Rgb32Float,
    Rgb32Uint,
    Rgba16Typeless,
    Rgba16Float,
    Rgba16Unorm,
    Rgba16Uint,
    Rg32Typeless,
    Rg32Float,
    Rg32Uint,
    Rgb10A2Typeless,
    Rgb10A2Unorm,
    Rgb10A2Uint,
    Rg11B10Float,
    Rgba8Typeless,
    Rgba8Unorm,
    Rgba8Uint,
    Rg16Typeless,
    Rg16Float,
    Rg16Unorm,
    Rg16Uint,
    R32Typeless,
    D32Float,
    R32Float,
    R32Uint,
    D24UnormS8Uint,
    Rg8Typeless,
    Rg8Unorm,
    Rg8Uint,
    R16Typeless,
    R16Float,
    R16Unorm,
    R16Uint,
    R8Typeless,
    R8Unorm,
    R8Uint,
}

impl Format {
    /// Size of one element (texel or typed buffer element) in bytes.
    ///
    /// Returns 0 for [`Format::Unknown`].
    #[must_use]
    pub fn bytes_per_element(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::Rgba32Typeless | Self::Rgba32Float | Self::Rgba32Uint => 16,
            Self::Rgb32Typeless | Self::Rgb32Float | Self::Rgb32Uint => 12,
            Self::Rgba16Typeless
            | Self::Rgba16Float
            | Self::Rgba16Unorm
            | Self::Rgba16Uint
            | Self::Rg32Typeless
            | Self::Rg32Float
            | Self::Rg32Uint => 8,
            Self::Rgb10A2Typeless
            | Self::Rgb10A2Unorm
            | Self::Rgb10A2Uint
            | Self::Rg11B10Float
            | Self::Rgba8Typeless
            | Self::Rgba8Unorm
            | Self::Rgba8Uint
            | Self::Rg16Typeless
            | Self::Rg16Float
            | Self::Rg16Unorm
            | Self::Rg16Uint
            | Self::R32Typeless
            | Self::D32Float
            | Self::R32Float
            | Self::R32Uint
            | Self::D24UnormS8Uint => 4,
            Self::Rg8Typeless
            | Self::Rg8Unorm
            | Self::Rg8Uint
            | Self::R16Typeless
            | Self::R16Float
            | Self::R16Unorm
            | Self::R16Uint => 2,
            Self::R8Typeless | Self::R8Unorm | Self::R8Uint => 1,
        }
    }

    /// Whether this is a depth(-stencil) format.
    #[inline]
    #[must_use]
    pub fn is_depth(self) -> bool {
        matches!(self, Self::D32Float | Self::D24UnormS8Uint)
    }
}

// ---------------------------------------------------------------------------
// Resource state
// ---------------------------------------------------------------------------

/// The access state a GPU resource was last transitioned to on the command
/// stream.
///
/// There is no implicit "safe" state. Every resource records the state it was
/// created in and is moved between states only by barrier insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    Common,
    VertexOrConstantBuffer,
    IndexBuffer,
    RenderTarget,
    UnorderedAccess,
    DepthWrite,
    DepthRead,
    NonPixelShaderResource,
    PixelShaderResource,
    IndirectArgument,
    CopyDest,
    CopySource,
    GenericRead,
    Present,
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

bitflags! {
    /// How a resource may be bound to the pipeline.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BindFlags: u32 {
        const SHADER_RESOURCE  = 1 << 0;
        const RENDER_TARGET    = 1 << 1;
        const DEPTH_STENCIL    = 1 << 2;
        const UNORDERED_ACCESS = 1 << 3;
        const VERTEX_BUFFER    = 1 << 4;
        const INDEX_BUFFER     = 1 << 5;
        const CONSTANT_BUFFER  = 1 << 6;
    }
}

bitflags! {
    /// CPU visibility of a resource's memory.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CpuAccessFlags: u32 {
        const READ  = 1 << 0;
        const WRITE = 1 << 1;
    }
}

bitflags! {
    /// Less common creation options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MiscFlags: u32 {
        const BUFFER_STRUCTURED  = 1 << 0;
        const DRAW_INDIRECT_ARGS = 1 << 1;
        const TEXTURE_CUBE       = 1 << 2;
    }
}

// ---------------------------------------------------------------------------
// Shader stages
// ---------------------------------------------------------------------------

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Hull,
    Domain,
    Geometry,
    Pixel,
    Compute,
}

impl ShaderStage {
    /// The state a resource must be in to be read by this stage.
    ///
    /// Pixel-stage reads use a different state tag than every other stage.
    #[inline]
    #[must_use]
    pub fn shader_read_state(self) -> ResourceState {
        match self {
            Self::Pixel => ResourceState::PixelShaderResource,
            _ => ResourceState::NonPixelShaderResource,
        }
    }
}

// ---------------------------------------------------------------------------
// Primitive topology
// ---------------------------------------------------------------------------

/// Input-assembler primitive topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    ControlPointPatchList,
}

impl PrimitiveTopology {
    /// The topology class baked into a graphics pipeline.
    #[must_use]
    pub fn class(self) -> TopologyClass {
        match self {
            Self::PointList => TopologyClass::Point,
            Self::LineList | Self::LineStrip => TopologyClass::Line,
            Self::TriangleList | Self::TriangleStrip => TopologyClass::Triangle,
            Self::ControlPointPatchList => TopologyClass::Patch,
        }
    }
}

/// Coarse topology class stored in a graphics pipeline object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TopologyClass {
    Point,
    Line,
    #[default]
    Triangle,
    Patch,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Dimensionality of a resource view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewDimension {
    Buffer,
    Texture1D,
    #[default]
    Texture2D,
    Texture2DArray,
    Texture3D,
    TextureCube,
}

impl ViewDimension {
    pub const ALL: [ViewDimension; 6] = [
        Self::Buffer,
        Self::Texture1D,
        Self::Texture2D,
        Self::Texture2DArray,
        Self::Texture3D,
        Self::TextureCube,
    ];
}

// ---------------------------------------------------------------------------
// Rasterizer rectangles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport with the default `[0, 1]` depth range.
    #[must_use]
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            top_left_x: 0.0,
            top_left_y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}
