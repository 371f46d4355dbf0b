//! Resource creation, update, read-back and release.

use std::path::Path;

use bytemuck::Pod;

use crate::descriptors::{DescriptorManager, ViewDesc, ViewKind};
use crate::device::Device;
use crate::errors::{Result, RhiError};
use crate::resources::{
    Buffer, BufferDesc, BufferId, BufferViews, InputElement, InputLayout, ResourceId,
    ResourceStore, RootSignatureDesc, RootSignatureId, Shader, ShaderDesc, ShaderId, Texture,
    TextureDesc, TextureId, TextureViews,
};
use crate::types::{BindFlags, CpuAccessFlags, Format, ResourceState, ShaderStage, ViewDimension};

/// Creates the view descriptors a texture's bind flags call for.
///
/// On failure every view created so far is released and the texture is
/// removed from the store.
pub(super) fn attach_texture_views(
    store: &mut ResourceStore,
    descriptors: &mut DescriptorManager,
    id: TextureId,
) -> Result<()> {
    let desc = store.texture(id).desc().clone();
    let mut views = TextureViews::default();
    match build_texture_views(descriptors, id.into(), &desc, &mut views) {
        Ok(()) => {
            store.texture_mut(id).views = views;
            Ok(())
        }
        Err(err) => {
            views.all().for_each(|handle| descriptors.release_view(handle));
            store.remove_texture(id);
            Err(err)
        }
    }
}

fn build_texture_views(
    descriptors: &mut DescriptorManager,
    resource: ResourceId,
    desc: &TextureDesc,
    views: &mut TextureViews,
) -> Result<()> {
    let dimension = desc.view_dimension();
    if desc.bind_flags.contains(BindFlags::SHADER_RESOURCE) {
        views.srv = Some(descriptors.create_view(ViewDesc::new(
            ViewKind::ShaderResource,
            dimension,
            desc.format,
            resource,
        ))?);
    }
    if desc.bind_flags.contains(BindFlags::UNORDERED_ACCESS) {
        views.uav = Some(descriptors.create_view(ViewDesc::new(
            ViewKind::UnorderedAccess,
            dimension,
            desc.format,
            resource,
        ))?);
    }
    if desc.bind_flags.contains(BindFlags::RENDER_TARGET) {
        // One view per slice so cube faces and array layers can be targeted
        // individually.
        for slice in 0..desc.array_size {
            let view = ViewDesc::new(ViewKind::RenderTarget, ViewDimension::Texture2D, desc.format, resource)
                .with_slice(slice);
            views.rtvs.push(descriptors.create_view(view)?);
        }
    }
    if desc.bind_flags.contains(BindFlags::DEPTH_STENCIL) {
        views.dsv = Some(descriptors.create_view(ViewDesc::new(
            ViewKind::DepthStencil,
            ViewDimension::Texture2D,
            desc.format,
            resource,
        ))?);
    }
    Ok(())
}

fn build_buffer_views(
    descriptors: &mut DescriptorManager,
    resource: ResourceId,
    desc: &BufferDesc,
    views: &mut BufferViews,
) -> Result<()> {
    let view = |kind| ViewDesc::new(kind, ViewDimension::Buffer, desc.format, resource);
    if desc.bind_flags.contains(BindFlags::SHADER_RESOURCE) {
        views.srv = Some(descriptors.create_view(view(ViewKind::ShaderResource))?);
    }
    if desc.bind_flags.contains(BindFlags::UNORDERED_ACCESS) {
        views.uav = Some(descriptors.create_view(view(ViewKind::UnorderedAccess))?);
    }
    if desc.bind_flags.contains(BindFlags::CONSTANT_BUFFER) {
        views.cbv = Some(descriptors.create_view(view(ViewKind::ConstantBuffer))?);
    }
    Ok(())
}

impl Device {
    // ========================================================================
    // Textures
    // ========================================================================

    pub fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId> {
        desc.validate()?;
        let id = self.store.insert_texture(Texture::new(desc.clone()));
        attach_texture_views(&mut self.store, &mut self.descriptors, id)?;

        let texture = self.store.texture(id);
        log::debug!(
            "Created texture {:?} {}x{} {:?} in {:?}",
            desc.label,
            desc.width,
            desc.height,
            desc.format,
            texture.state()
        );
        Ok(id)
    }

    /// Loads an image file as a shader-readable RGBA8 texture.
    pub fn create_texture_from_file(&mut self, path: impl AsRef<Path>) -> Result<TextureId> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| RhiError::file_read(path, e))?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| RhiError::creation(path.display().to_string(), e.to_string()))?
            .to_rgba8();

        let (width, height) = image.dimensions();
        let desc = TextureDesc::new_2d(width, height, Format::Rgba8Unorm)
            .with_label(&path.display().to_string())
            .with_data(image.into_raw());
        self.create_texture(&desc)
    }

    /// Releases a texture and its views.
    ///
    /// # Panics
    ///
    /// The swap chain images and the main depth buffer belong to the device
    /// and cannot be released.
    pub fn release_texture(&mut self, id: TextureId) {
        assert!(
            !self.swap_chain.contains(id) && id != self.main_depth,
            "main render and depth targets are owned by the device and cannot be released"
        );
        let texture = self.store.remove_texture(id);
        for handle in texture.views.all() {
            self.descriptors.release_view(handle);
        }
    }

    // ========================================================================
    // Buffers
    // ========================================================================

    pub fn create_buffer(&mut self, desc: &BufferDesc, data: Option<&[u8]>) -> Result<BufferId> {
        desc.validate(data)?;
        let id = self.store.insert_buffer(Buffer::new(desc.clone(), data));

        let mut views = BufferViews::default();
        if let Err(err) = build_buffer_views(&mut self.descriptors, id.into(), desc, &mut views) {
            views.all().for_each(|handle| self.descriptors.release_view(handle));
            self.store.remove_buffer(id);
            return Err(err);
        }
        self.store.buffer_mut(id).views = views;

        log::debug!(
            "Created buffer {:?} ({} bytes) in {:?}",
            desc.label,
            desc.size(),
            self.store.buffer(id).state()
        );
        Ok(id)
    }

    /// Creates a buffer initialized from a slice of plain-old-data values.
    pub fn create_buffer_with<T: Pod>(&mut self, desc: &BufferDesc, data: &[T]) -> Result<BufferId> {
        self.create_buffer(desc, Some(bytemuck::cast_slice(data)))
    }

    /// Overwrites the start of a CPU-writable buffer.
    ///
    /// # Panics
    ///
    /// The buffer must be dynamic or CPU-writable, and `data` must fit.
    pub fn update_buffer(&mut self, id: BufferId, data: &[u8]) {
        let buffer = self.store.buffer_mut(id);
        assert!(
            buffer.desc.dynamic || buffer.desc.cpu_access.contains(CpuAccessFlags::WRITE),
            "buffer {:?} is neither dynamic nor CPU-writable",
            buffer.desc.label
        );
        assert!(
            data.len() as u64 <= buffer.size(),
            "update of {} bytes does not fit buffer {:?} of {} bytes",
            data.len(),
            buffer.desc.label,
            buffer.size()
        );
        buffer.data[..data.len()].copy_from_slice(data);
    }

    pub fn update_buffer_with<T: Pod>(&mut self, id: BufferId, data: &[T]) {
        self.update_buffer(id, bytemuck::cast_slice(data));
    }

    /// Maps a CPU-readable buffer for reading.
    ///
    /// # Panics
    ///
    /// Only one buffer read may be in flight per device, and the buffer needs
    /// CPU read access.
    pub fn begin_buffer_read(&mut self, id: BufferId) -> &[u8] {
        assert!(
            self.buffer_read.is_none(),
            "a buffer read is already in flight; call end_buffer_read first"
        );
        let buffer = self.store.buffer(id);
        assert!(
            buffer.desc.cpu_access.contains(CpuAccessFlags::READ),
            "buffer {:?} was not created with CPU read access",
            buffer.desc.label
        );
        self.buffer_read = Some(id);
        buffer.contents()
    }

    pub fn end_buffer_read(&mut self, id: BufferId) {
        assert!(
            self.buffer_read == Some(id),
            "buffer {id:?} is not being read"
        );
        self.buffer_read = None;
    }

    pub fn release_buffer(&mut self, id: BufferId) {
        assert!(
            self.buffer_read != Some(id),
            "buffer {id:?} is released while it is being read"
        );
        let buffer = self.store.remove_buffer(id);
        for handle in buffer.views.all() {
            self.descriptors.release_view(handle);
        }
    }

    // ========================================================================
    // Shaders, root signatures, input layouts
    // ========================================================================

    pub fn create_shader(&mut self, desc: ShaderDesc) -> Result<ShaderId> {
        desc.validate()?;
        Ok(self.store.insert_shader(Shader::new(desc)))
    }

    /// Loads precompiled bytecode from disk.
    pub fn create_shader_from_file(
        &mut self,
        path: impl AsRef<Path>,
        stage: ShaderStage,
        entry_point: &str,
    ) -> Result<ShaderId> {
        let path = path.as_ref();
        let bytecode = std::fs::read(path).map_err(|e| RhiError::file_read(path, e))?;
        if bytecode.is_empty() {
            return Err(RhiError::creation(path.display().to_string(), "shader file is empty"));
        }
        self.create_shader(ShaderDesc::new(stage, entry_point, bytecode))
    }

    pub fn release_shader(&mut self, id: ShaderId) {
        self.store.remove_shader(id);
    }

    pub fn create_root_signature(&mut self, desc: &RootSignatureDesc) -> Result<RootSignatureId> {
        let root_signature = desc.build()?;
        Ok(self.store.insert_root_signature(root_signature))
    }

    pub fn release_root_signature(&mut self, id: RootSignatureId) {
        self.store.remove_root_signature(id);
        for bound in &mut self.bound_root_signatures {
            if *bound == Some(id) {
                *bound = None;
            }
        }
    }

    pub fn create_input_layout(&self, elements: &[InputElement]) -> Result<InputLayout> {
        InputLayout::new(elements)
    }

    // ========================================================================
    // State
    // ========================================================================

    /// The state a texture or buffer was last transitioned to.
    #[must_use]
    pub fn resource_state(&self, resource: impl Into<ResourceId>) -> ResourceState {
        self.store.state(resource.into())
    }
}
