//! GPU buffers.

use crate::descriptors::DescriptorHandle;
use crate::errors::{Result, RhiError};
use crate::types::{BindFlags, CpuAccessFlags, Format, MiscFlags, ResourceState};

/// Creation parameters of a [`Buffer`].
///
/// ```rust,ignore
/// let desc = BufferDesc::new(vertex_count, 32)
///     .with_bind_flags(BindFlags::VERTEX_BUFFER)
///     .with_label("Terrain Vertices");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    pub label: Option<String>,
    pub element_count: u32,
    /// Size of one element in bytes.
    pub stride: u32,
    /// Element format of typed views. `Unknown` for raw / structured buffers.
    pub format: Format,
    /// CPU-rewritten every frame (lives in upload memory).
    pub dynamic: bool,
    pub bind_flags: BindFlags,
    pub cpu_access: CpuAccessFlags,
    pub misc_flags: MiscFlags,
}

impl BufferDesc {
    #[must_use]
    pub fn new(element_count: u32, stride: u32) -> Self {
        Self {
            label: None,
            element_count,
            stride,
            format: Format::Unknown,
            dynamic: false,
            bind_flags: BindFlags::empty(),
            cpu_access: CpuAccessFlags::empty(),
            misc_flags: MiscFlags::empty(),
        }
    }

    /// A dynamic constant buffer holding one `size`-byte block.
    #[must_use]
    pub fn constant(size: u32) -> Self {
        Self::new(1, size)
            .with_bind_flags(BindFlags::CONSTANT_BUFFER)
            .dynamic()
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
    pub fn with_cpu_access(mut self, access: CpuAccessFlags) -> Self {
        self.cpu_access = access;
        self
    }

    #[must_use]
    pub fn with_misc_flags(mut self, flags: MiscFlags) -> Self {
        self.misc_flags = flags;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(self.element_count) * u64::from(self.stride)
    }

    fn name(&self) -> String {
        self.label.clone().unwrap_or_else(|| "buffer".to_string())
    }

    pub(crate) fn validate(&self, data: Option<&[u8]>) -> Result<()> {
        if self.element_count == 0 || self.stride == 0 {
            return Err(RhiError::creation(
                self.name(),
                format!(
                    "element count and stride must be non-zero ({} x {})",
                    self.element_count, self.stride
                ),
            ));
        }
        if self.bind_flags.contains(BindFlags::CONSTANT_BUFFER) && self.size() % 16 != 0 {
            return Err(RhiError::creation(
                self.name(),
                format!("constant buffer size {} is not a multiple of 16", self.size()),
            ));
        }
        if self
            .bind_flags
            .intersects(BindFlags::RENDER_TARGET | BindFlags::DEPTH_STENCIL)
        {
            return Err(RhiError::creation(
                self.name(),
                "buffers cannot be bound as render or depth targets",
            ));
        }
        if let Some(data) = data
            && data.len() as u64 > self.size()
        {
            return Err(RhiError::creation(
                self.name(),
                format!(
                    "initial data ({} bytes) larger than the buffer ({} bytes)",
                    data.len(),
                    self.size()
                ),
            ));
        }
        Ok(())
    }

    /// State a freshly created buffer is in.
    #[must_use]
    pub fn initial_state(&self) -> ResourceState {
        if self.dynamic || !self.cpu_access.is_empty() {
            ResourceState::GenericRead
        } else if self
            .bind_flags
            .intersects(BindFlags::VERTEX_BUFFER | BindFlags::CONSTANT_BUFFER)
        {
            ResourceState::VertexOrConstantBuffer
        } else if self.bind_flags.contains(BindFlags::INDEX_BUFFER) {
            ResourceState::IndexBuffer
        } else if self.bind_flags.contains(BindFlags::UNORDERED_ACCESS) {
            ResourceState::UnorderedAccess
        } else {
            ResourceState::Common
        }
    }
}

/// View descriptors owned by a buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferViews {
    pub srv: Option<DescriptorHandle>,
    pub uav: Option<DescriptorHandle>,
    pub cbv: Option<DescriptorHandle>,
}

impl BufferViews {
    pub(crate) fn all(&self) -> impl Iterator<Item = DescriptorHandle> + '_ {
        self.srv.iter().chain(self.uav.iter()).chain(self.cbv.iter()).copied()
    }
}

pub struct Buffer {
    pub(crate) desc: BufferDesc,
    pub(crate) state: ResourceState,
    pub(crate) views: BufferViews,
    pub(crate) data: Vec<u8>,
}

impl Buffer {
    pub(crate) fn new(desc: BufferDesc, data: Option<&[u8]>) -> Self {
        let mut memory = vec![0u8; desc.size() as usize];
        if let Some(data) = data {
            memory[..data.len()].copy_from_slice(data);
        }
        Self {
            state: desc.initial_state(),
            desc,
            views: BufferViews::default(),
            data: memory,
        }
    }

    #[inline]
    #[must_use]
    pub fn desc(&self) -> &BufferDesc {
        &self.desc
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> u64 {
        self.desc.size()
    }

    #[inline]
    #[must_use]
    pub fn stride(&self) -> u32 {
        self.desc.stride
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> ResourceState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn views(&self) -> &BufferViews {
        &self.views
    }

    #[inline]
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.data
    }
}
