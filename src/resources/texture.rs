//! GPU textures.
//!
//! Texture memory holds every subresource, slice by slice, with the mip
//! chain of each slice packed tightly after its base level. Subresource `i`
//! is mip `i % mip_levels` of slice `i / mip_levels`.

use std::ops::Range;

use smallvec::SmallVec;

use crate::descriptors::DescriptorHandle;
use crate::errors::{Result, RhiError};
use crate::types::{BindFlags, Format, MiscFlags, ResourceState, ViewDimension};

/// Creation parameters of a [`Texture`].
///
/// ```rust,ignore
/// let gbuffer_albedo = TextureDesc::new_2d(1920, 1080, Format::Rgba8Unorm)
///     .with_bind_flags(BindFlags::RENDER_TARGET | BindFlags::SHADER_RESOURCE)
///     .with_label("GBuffer Albedo");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Depth of a volume texture. `1` for everything else.
    pub depth: u32,
    pub array_size: u32,
    pub mip_levels: u32,
    pub sample_count: u32,
    pub format: Format,
    pub bind_flags: BindFlags,
    pub misc_flags: MiscFlags,
    /// Tightly packed texels of the first mip of every slice.
    pub initial_data: Option<Vec<u8>>,
}

impl TextureDesc {
    #[must_use]
    pub fn new_2d(width: u32, height: u32, format: Format) -> Self {
        Self {
            label: None,
            width,
            height,
            depth: 1,
            array_size: 1,
            mip_levels: 1,
            sample_count: 1,
            format,
            bind_flags: BindFlags::SHADER_RESOURCE,
            misc_flags: MiscFlags::empty(),
            initial_data: None,
        }
    }

    #[must_use]
    pub fn new_3d(width: u32, height: u32, depth: u32, format: Format) -> Self {
        Self {
            depth,
            ..Self::new_2d(width, height, format)
        }
    }

    /// A six-face cube map.
    #[must_use]
    pub fn new_cube(size: u32, format: Format) -> Self {
        Self {
            array_size: 6,
            misc_flags: MiscFlags::TEXTURE_CUBE,
            ..Self::new_2d(size, size, format)
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    #[must_use]
    pub fn with_bind_flags(mut self, flags: BindFlags) -> Self {
        self.bind_flags = flags;
        self
    }

    #[must_use]
    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    #[must_use]
    pub fn with_mip_levels(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels;
        self
    }

    #[must_use]
    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.initial_data = Some(data);
        self
    }

    #[inline]
    #[must_use]
    pub fn is_cube(&self) -> bool {
        self.misc_flags.contains(MiscFlags::TEXTURE_CUBE)
    }

    /// Dimensionality of the shader-resource view.
    #[must_use]
    pub fn view_dimension(&self) -> ViewDimension {
        if self.is_cube() {
            ViewDimension::TextureCube
        } else if self.depth > 1 {
            ViewDimension::Texture3D
        } else if self.array_size > 1 {
            ViewDimension::Texture2DArray
        } else if self.height == 1 {
            ViewDimension::Texture1D
        } else {
            ViewDimension::Texture2D
        }
    }

    /// Size in bytes of the first mip of every slice.
    #[must_use]
    pub fn base_level_size(&self) -> usize {
        self.width as usize
            * self.height as usize
            * self.depth as usize
            * self.array_size as usize
            * self.format.bytes_per_element() as usize
    }

    /// Mip levels times array slices.
    #[inline]
    #[must_use]
    pub fn subresource_count(&self) -> u32 {
        self.mip_levels * self.array_size
    }

    #[inline]
    #[must_use]
    pub fn subresource_mip(&self, subresource: u32) -> u32 {
        subresource % self.mip_levels
    }

    /// Width, height and depth of mip level `mip`.
    #[must_use]
    pub fn mip_extent(&self, mip: u32) -> [u32; 3] {
        [self.width, self.height, self.depth].map(|size| size.checked_shr(mip).unwrap_or(0).max(1))
    }

    fn mip_size(&self, mip: u32) -> usize {
        let [width, height, depth] = self.mip_extent(mip);
        width as usize * height as usize * depth as usize * self.format.bytes_per_element() as usize
    }

    fn slice_size(&self) -> usize {
        (0..self.mip_levels).map(|mip| self.mip_size(mip)).sum()
    }

    /// Byte range of `subresource` within the texture's memory.
    #[must_use]
    pub fn subresource_range(&self, subresource: u32) -> Range<usize> {
        let slice = (subresource / self.mip_levels) as usize;
        let mip = self.subresource_mip(subresource);
        let start = slice * self.slice_size() + (0..mip).map(|m| self.mip_size(m)).sum::<usize>();
        start..start + self.mip_size(mip)
    }

    /// Size in bytes of every subresource together.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.array_size as usize * self.slice_size()
    }

    fn name(&self) -> String {
        self.label.clone().unwrap_or_else(|| "texture".to_string())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let fail = |reason: String| Err(RhiError::creation(self.name(), reason));

        if self.width == 0 || self.height == 0 || self.depth == 0 || self.array_size == 0 {
            return fail(format!(
                "extent must be non-zero ({}x{}x{}, {} slices)",
                self.width, self.height, self.depth, self.array_size
            ));
        }
        if self.format == Format::Unknown {
            return fail("format is Unknown".to_string());
        }
        let full_chain = 32 - self.width.max(self.height).max(self.depth).leading_zeros();
        if self.mip_levels == 0 || self.mip_levels > full_chain {
            return fail(format!(
                "mip level count must be in 1..={full_chain}, got {}",
                self.mip_levels
            ));
        }
        if !matches!(self.sample_count, 1 | 2 | 4 | 8) {
            return fail(format!("unsupported sample count {}", self.sample_count));
        }
        if self.depth > 1 && self.array_size > 1 {
            return fail("volume textures cannot be arrays".to_string());
        }
        if self.is_cube() && self.array_size % 6 != 0 {
            return fail(format!(
                "cube maps need a multiple of 6 slices, got {}",
                self.array_size
            ));
        }
        if self.bind_flags.contains(BindFlags::DEPTH_STENCIL) && !self.format.is_depth() {
            return fail(format!(
                "depth-stencil binding requires a depth format, got {:?}",
                self.format
            ));
        }
        if self.bind_flags.contains(BindFlags::RENDER_TARGET) && self.format.is_depth() {
            return fail(format!(
                "{:?} cannot be bound as a render target",
                self.format
            ));
        }
        if self
            .bind_flags
            .intersects(BindFlags::VERTEX_BUFFER | BindFlags::INDEX_BUFFER | BindFlags::CONSTANT_BUFFER)
        {
            return fail("textures cannot be bound as buffers".to_string());
        }
        if let Some(data) = &self.initial_data
            && data.len() != self.base_level_size()
        {
            return fail(format!(
                "initial data is {} bytes, expected {}",
                data.len(),
                self.base_level_size()
            ));
        }
        Ok(())
    }

    /// State a freshly created texture is in.
    #[must_use]
    pub fn initial_state(&self) -> ResourceState {
        if self.bind_flags.contains(BindFlags::RENDER_TARGET) {
            ResourceState::RenderTarget
        } else if self.bind_flags.contains(BindFlags::DEPTH_STENCIL) {
            ResourceState::DepthWrite
        } else if self.bind_flags.contains(BindFlags::UNORDERED_ACCESS) {
            ResourceState::UnorderedAccess
        } else {
            ResourceState::Common
        }
    }
}

/// View descriptors owned by a texture.
#[derive(Debug, Clone, Default)]
pub struct TextureViews {
    pub srv: Option<DescriptorHandle>,
    pub uav: Option<DescriptorHandle>,
    /// One render target view per array slice.
    pub rtvs: SmallVec<[DescriptorHandle; 1]>,
    pub dsv: Option<DescriptorHandle>,
}

impl TextureViews {
    pub(crate) fn all(&self) -> impl Iterator<Item = DescriptorHandle> + '_ {
        self.srv
            .iter()
            .chain(self.uav.iter())
            .chain(self.rtvs.iter())
            .chain(self.dsv.iter())
            .copied()
    }
}

pub struct Texture {
    pub(crate) desc: TextureDesc,
    pub(crate) state: ResourceState,
    pub(crate) views: TextureViews,
    pub(crate) data: Vec<u8>,
}

impl Texture {
    /// Creates the texture's memory. Initial data fills the base level of
    /// each slice; lower mips start zeroed.
    pub(crate) fn new(mut desc: TextureDesc) -> Self {
        let mut data = vec![0u8; desc.total_size()];
        if let Some(base_levels) = desc.initial_data.take() {
            let level_size = desc.mip_size(0);
            for (slice, texels) in base_levels.chunks_exact(level_size).enumerate() {
                let range = desc.subresource_range(slice as u32 * desc.mip_levels);
                data[range].copy_from_slice(texels);
            }
        }
        Self {
            state: desc.initial_state(),
            desc,
            views: TextureViews::default(),
            data,
        }
    }

    /// Swap-chain images start out owned by the presentation engine.
    pub(crate) fn new_back_buffer(desc: TextureDesc) -> Self {
        let mut texture = Self::new(desc);
        texture.state = ResourceState::Present;
        texture
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.desc.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.desc.height
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> Format {
        self.desc.format
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> ResourceState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn views(&self) -> &TextureViews {
        &self.views
    }

    /// Every subresource, in subresource order.
    #[inline]
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn subresource_contents(&self, subresource: u32) -> &[u8] {
        assert!(
            subresource < self.desc.subresource_count(),
            "subresource {subresource} out of range for texture {:?}",
            self.desc.label
        );
        &self.data[self.desc.subresource_range(subresource)]
    }

    /// Render target view of one array slice.
    #[must_use]
    pub fn rtv(&self, array_index: u32) -> DescriptorHandle {
        *self.views.rtvs.get(array_index as usize).unwrap_or_else(|| {
            panic!(
                "texture {:?} has no render target view for slice {array_index}",
                self.desc.label
            )
        })
    }

    #[must_use]
    pub fn dsv(&self) -> DescriptorHandle {
        self.views
            .dsv
            .unwrap_or_else(|| panic!("texture {:?} is not a depth target", self.desc.label))
    }

    #[must_use]
    pub fn srv(&self) -> DescriptorHandle {
        self.views.srv.unwrap_or_else(|| {
            panic!(
                "texture {:?} was not created with shader-resource binding",
                self.desc.label
            )
        })
    }

    #[must_use]
    pub fn uav(&self) -> DescriptorHandle {
        self.views.uav.unwrap_or_else(|| {
            panic!(
                "texture {:?} was not created with unordered-access binding",
                self.desc.label
            )
        })
    }
}
