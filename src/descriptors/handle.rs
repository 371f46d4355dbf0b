//! Descriptor handles and view descriptions.

use crate::pipeline::SamplerPreset;
use crate::resources::ResourceId;
use crate::types::{Format, ViewDimension};

/// The four descriptor heap kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorHeapType {
    CbvSrvUav,
    Sampler,
    Rtv,
    Dsv,
}

impl DescriptorHeapType {
    pub const ALL: [DescriptorHeapType; 4] = [Self::CbvSrvUav, Self::Sampler, Self::Rtv, Self::Dsv];

    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            Self::CbvSrvUav => 0,
            Self::Sampler => 1,
            Self::Rtv => 2,
            Self::Dsv => 3,
        }
    }

    /// Only CBV/SRV/UAV and sampler heaps can be made shader-visible.
    #[inline]
    #[must_use]
    pub fn can_be_shader_visible(self) -> bool {
        matches!(self, Self::CbvSrvUav | Self::Sampler)
    }
}

/// What a view descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    ShaderResource,
    UnorderedAccess,
    ConstantBuffer,
    RenderTarget,
    DepthStencil,
    Sampler,
}

impl ViewKind {
    /// The heap a view of this kind lives in.
    #[must_use]
    pub fn heap_type(self) -> DescriptorHeapType {
        match self {
            Self::ShaderResource | Self::UnorderedAccess | Self::ConstantBuffer => {
                DescriptorHeapType::CbvSrvUav
            }
            Self::RenderTarget => DescriptorHeapType::Rtv,
            Self::DepthStencil => DescriptorHeapType::Dsv,
            Self::Sampler => DescriptorHeapType::Sampler,
        }
    }
}

/// Contents of one descriptor slot.
///
/// A view with neither a resource nor a sampler is a null descriptor: reads
/// through it return zero, writes are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewDesc {
    pub kind: ViewKind,
    pub dimension: ViewDimension,
    pub format: Format,
    pub resource: Option<ResourceId>,
    /// Sampler state of a [`ViewKind::Sampler`] descriptor.
    pub sampler: Option<SamplerPreset>,
    /// Array slice (render target views) or first element (buffer views).
    pub slice: u32,
}

impl ViewDesc {
    #[must_use]
    pub fn new(kind: ViewKind, dimension: ViewDimension, format: Format, resource: ResourceId) -> Self {
        Self {
            kind,
            dimension,
            format,
            resource: Some(resource),
            sampler: None,
            slice: 0,
        }
    }

    #[must_use]
    pub fn null(kind: ViewKind, dimension: ViewDimension) -> Self {
        Self {
            kind,
            dimension,
            format: Format::Rgba8Unorm,
            resource: None,
            sampler: None,
            slice: 0,
        }
    }

    #[must_use]
    pub fn sampler(preset: SamplerPreset) -> Self {
        Self {
            sampler: Some(preset),
            format: Format::Unknown,
            ..Self::null(ViewKind::Sampler, ViewDimension::Texture2D)
        }
    }

    #[must_use]
    pub fn with_slice(mut self, slice: u32) -> Self {
        self.slice = slice;
        self
    }

    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.resource.is_none() && self.sampler.is_none()
    }
}

/// Address of one descriptor slot.
///
/// Each handle refers to exactly one slot of one heap. Shader-visible handles
/// point into the GPU heaps and are only valid until the next heap reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorHandle {
    pub heap: DescriptorHeapType,
    pub index: u32,
    pub shader_visible: bool,
}

/// A contiguous run of slots in a shader-visible heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorBlock {
    pub heap: DescriptorHeapType,
    pub start: u32,
    pub count: u32,
    pub(crate) generation: u32,
}

impl DescriptorBlock {
    /// Handle of the `slot`-th descriptor in this block.
    #[must_use]
    pub fn handle(&self, slot: u32) -> DescriptorHandle {
        assert!(
            slot < self.count,
            "slot {slot} out of range for a block of {} descriptors",
            self.count
        );
        DescriptorHandle {
            heap: self.heap,
            index: self.start + slot,
            shader_visible: true,
        }
    }
}
