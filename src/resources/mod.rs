//! GPU Resources
//!
//! Every GPU-side object is owned by a [`ResourceStore`] arena and addressed by
//! a typed `slotmap` key. Textures and buffers are both "resources" for the
//! purpose of state tracking and copying; [`ResourceId`] tags which one a
//! handle refers to, so no call site ever has to downcast.
//!
//! Using a handle after its resource was released is a caller bug and panics.

pub mod buffer;
pub mod input_layout;
pub mod root_signature;
pub mod shader;
pub mod state;
pub mod texture;

use slotmap::{SlotMap, new_key_type};

pub use buffer::{Buffer, BufferDesc, BufferViews};
pub use input_layout::{InputElement, InputLayout};
pub use root_signature::{
    DescriptorRange, RangeKind, RootParameter, RootSignature, RootSignatureDesc,
    ShaderVisibility, StaticSampler,
};
pub use shader::{Shader, ShaderDesc};
pub use state::{Barrier, BarrierBatch, plan_transitions};
pub use texture::{Texture, TextureDesc, TextureViews};

use crate::types::ResourceState;

new_key_type! {
    /// Handle to a [`Texture`].
    pub struct TextureId;
    /// Handle to a [`Buffer`].
    pub struct BufferId;
    /// Handle to a compiled [`Shader`].
    pub struct ShaderId;
    /// Handle to a [`RootSignature`].
    pub struct RootSignatureId;
}

/// A texture or a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Texture(TextureId),
    Buffer(BufferId),
}

impl From<TextureId> for ResourceId {
    #[inline]
    fn from(id: TextureId) -> Self {
        Self::Texture(id)
    }
}

impl From<BufferId> for ResourceId {
    #[inline]
    fn from(id: BufferId) -> Self {
        Self::Buffer(id)
    }
}

impl ResourceId {
    #[inline]
    #[must_use]
    pub fn is_buffer(self) -> bool {
        matches!(self, Self::Buffer(_))
    }
}

// ---------------------------------------------------------------------------
// ResourceStore
// ---------------------------------------------------------------------------

/// Arena owning every GPU object created through the device.
#[derive(Default)]
pub struct ResourceStore {
    textures: SlotMap<TextureId, Texture>,
    buffers: SlotMap<BufferId, Buffer>,
    shaders: SlotMap<ShaderId, Shader>,
    root_signatures: SlotMap<RootSignatureId, RootSignature>,
}

impl ResourceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Textures ===

    pub fn insert_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.insert(texture)
    }

    #[must_use]
    pub fn texture(&self, id: TextureId) -> &Texture {
        self.textures
            .get(id)
            .unwrap_or_else(|| panic!("stale texture handle {id:?}"))
    }

    pub fn texture_mut(&mut self, id: TextureId) -> &mut Texture {
        self.textures
            .get_mut(id)
            .unwrap_or_else(|| panic!("stale texture handle {id:?}"))
    }

    pub fn remove_texture(&mut self, id: TextureId) -> Texture {
        self.textures
            .remove(id)
            .unwrap_or_else(|| panic!("stale texture handle {id:?}"))
    }

    // === Buffers ===

    pub fn insert_buffer(&mut self, buffer: Buffer) -> BufferId {
        self.buffers.insert(buffer)
    }

    #[must_use]
    pub fn buffer(&self, id: BufferId) -> &Buffer {
        self.buffers
            .get(id)
            .unwrap_or_else(|| panic!("stale buffer handle {id:?}"))
    }

    pub fn buffer_mut(&mut self, id: BufferId) -> &mut Buffer {
        self.buffers
            .get_mut(id)
            .unwrap_or_else(|| panic!("stale buffer handle {id:?}"))
    }

    pub fn remove_buffer(&mut self, id: BufferId) -> Buffer {
        self.buffers
            .remove(id)
            .unwrap_or_else(|| panic!("stale buffer handle {id:?}"))
    }

    // === Shaders ===

    pub fn insert_shader(&mut self, shader: Shader) -> ShaderId {
        self.shaders.insert(shader)
    }

    #[must_use]
    pub fn shader(&self, id: ShaderId) -> &Shader {
        self.shaders
            .get(id)
            .unwrap_or_else(|| panic!("stale shader handle {id:?}"))
    }

    pub fn remove_shader(&mut self, id: ShaderId) -> Shader {
        self.shaders
            .remove(id)
            .unwrap_or_else(|| panic!("stale shader handle {id:?}"))
    }

    // === Root signatures ===

    pub fn insert_root_signature(&mut self, root_signature: RootSignature) -> RootSignatureId {
        self.root_signatures.insert(root_signature)
    }

    #[must_use]
    pub fn root_signature(&self, id: RootSignatureId) -> &RootSignature {
        self.root_signatures
            .get(id)
            .unwrap_or_else(|| panic!("stale root signature handle {id:?}"))
    }

    pub fn remove_root_signature(&mut self, id: RootSignatureId) -> RootSignature {
        self.root_signatures
            .remove(id)
            .unwrap_or_else(|| panic!("stale root signature handle {id:?}"))
    }

    // === Generic resource access ===

    #[must_use]
    pub fn state(&self, id: ResourceId) -> ResourceState {
        match id {
            ResourceId::Texture(t) => self.texture(t).state,
            ResourceId::Buffer(b) => self.buffer(b).state,
        }
    }

    pub(crate) fn set_state(&mut self, id: ResourceId, state: ResourceState) {
        match id {
            ResourceId::Texture(t) => self.texture_mut(t).state = state,
            ResourceId::Buffer(b) => self.buffer_mut(b).state = state,
        }
    }

    /// Backing memory of a texture or buffer.
    #[must_use]
    pub fn bytes(&self, id: ResourceId) -> &[u8] {
        match id {
            ResourceId::Texture(t) => &self.texture(t).data,
            ResourceId::Buffer(b) => &self.buffer(b).data,
        }
    }

    /// Copies the whole backing memory of `src` into `dst`.
    ///
    /// Sizes must already have been validated.
    pub(crate) fn copy_bytes(&mut self, dst: ResourceId, src: ResourceId) {
        if dst == src {
            return;
        }
        let source = self.bytes(src).to_vec();
        let target = match dst {
            ResourceId::Texture(t) => &mut self.texture_mut(t).data,
            ResourceId::Buffer(b) => &mut self.buffer_mut(b).data,
        };
        let len = target.len().min(source.len());
        target[..len].copy_from_slice(&source[..len]);
    }

    /// Copies subresource `src_subresource` of `src` into subresource
    /// `dst_subresource` of `dst`, with its origin at `dst_offset` texels.
    ///
    /// The region must already have been validated.
    pub(crate) fn copy_texture_region(
        &mut self,
        dst: TextureId,
        dst_subresource: u32,
        dst_offset: [u32; 3],
        src: TextureId,
        src_subresource: u32,
    ) {
        let source = &self.texture(src).desc;
        let texel = source.format.bytes_per_element() as usize;
        let [width, height, depth] = source.mip_extent(source.subresource_mip(src_subresource));
        let texels = self.bytes(src.into())[source.subresource_range(src_subresource)].to_vec();

        let target = self.texture_mut(dst);
        let [dst_width, dst_height, _] = target.desc.mip_extent(target.desc.subresource_mip(dst_subresource));
        let base = target.desc.subresource_range(dst_subresource).start;
        let [x, y, z] = dst_offset.map(|o| o as usize);
        let row = width as usize * texel;

        for layer in 0..depth as usize {
            for line in 0..height as usize {
                let from = (layer * height as usize + line) * row;
                let to = base
                    + (((z + layer) * dst_height as usize + y + line) * dst_width as usize + x) * texel;
                target.data[to..to + row].copy_from_slice(&texels[from..from + row]);
            }
        }
    }

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }
}
