//! Draws, dispatches, copies, render targets, clears and viewports.

use smallvec::SmallVec;

use crate::command::NativeCommand;
use crate::device::Device;
use crate::pipeline::MAX_RENDER_TARGETS;
use crate::resources::{BufferId, ResourceId, TextureId};
use crate::types::{Rect, ResourceState, Viewport};

impl Device {
    // ========================================================================
    // Work
    // ========================================================================

    pub fn draw(&mut self, vertex_count: u32) {
        assert!(vertex_count > 0, "draw needs a non-zero vertex count");
        self.record(NativeCommand::Draw {
            vertex_count,
            start_vertex: 0,
        });
    }

    pub fn draw_indexed(&mut self, index_count: u32) {
        assert!(index_count > 0, "draw_indexed needs a non-zero index count");
        self.record(NativeCommand::DrawIndexed {
            index_count,
            start_index: 0,
            base_vertex: 0,
        });
    }

    pub fn draw_instanced(
        &mut self,
        vertex_count_per_instance: u32,
        instance_count: u32,
        start_vertex: u32,
        start_instance: u32,
    ) {
        assert!(
            vertex_count_per_instance > 0 && instance_count > 0,
            "draw_instanced needs non-zero counts ({vertex_count_per_instance} vertices, {instance_count} instances)"
        );
        self.record(NativeCommand::DrawInstanced {
            vertex_count_per_instance,
            instance_count,
            start_vertex,
            start_instance,
        });
    }

    pub fn draw_indexed_instanced(
        &mut self,
        index_count_per_instance: u32,
        instance_count: u32,
        start_index: u32,
        base_vertex: i32,
        start_instance: u32,
    ) {
        assert!(
            index_count_per_instance > 0 && instance_count > 0,
            "draw_indexed_instanced needs non-zero counts ({index_count_per_instance} indices, {instance_count} instances)"
        );
        self.record(NativeCommand::DrawIndexedInstanced {
            index_count_per_instance,
            instance_count,
            start_index,
            base_vertex,
            start_instance,
        });
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.record(NativeCommand::Dispatch { x, y, z });
    }

    // ========================================================================
    // Copies
    // ========================================================================

    /// Copies the whole of `src` into `dst`. Both buffers must be the same
    /// size.
    pub fn copy_buffer(&mut self, dst: BufferId, src: BufferId) {
        let (dst_size, src_size) = (self.store.buffer(dst).size(), self.store.buffer(src).size());
        assert!(
            dst_size == src_size,
            "copy_buffer needs equal sizes (dst {dst_size} bytes, src {src_size} bytes)"
        );
        self.copy_resource(dst.into(), src.into());
    }

    /// Copies the whole of `src` into `dst`. Both must be the same kind of
    /// resource with the same byte size.
    pub fn copy_resource(&mut self, dst: ResourceId, src: ResourceId) {
        assert!(dst != src, "copy_resource source and destination are the same resource");
        assert!(
            dst.is_buffer() == src.is_buffer(),
            "copy_resource cannot copy between a texture and a buffer"
        );
        let (dst_len, src_len) = (self.store.bytes(dst).len(), self.store.bytes(src).len());
        assert!(
            dst_len == src_len,
            "copy_resource needs matching sizes (dst {dst_len} bytes, src {src_len} bytes)"
        );
        self.transition_batch([
            (Some(dst), ResourceState::CopyDest),
            (Some(src), ResourceState::CopySource),
        ]);
        self.record(NativeCommand::CopyResource { dst, src });
    }

    /// Copies the whole of subresource `src_subresource` of `src` into
    /// subresource `dst_subresource` of `dst`, with its origin at
    /// `dst_offset` texels. Subresource `i` is mip `i % mip_levels` of slice
    /// `i / mip_levels`.
    ///
    /// # Panics
    ///
    /// Both subresources must exist, the formats must match, and the source
    /// extent placed at `dst_offset` must fit inside the destination mip.
    pub fn copy_texture_subresource_region(
        &mut self,
        dst: TextureId,
        dst_subresource: u32,
        dst_offset: [u32; 3],
        src: TextureId,
        src_subresource: u32,
    ) {
        assert!(dst != src, "copy_texture_subresource_region source and destination are the same texture");
        let (dst_desc, src_desc) = (self.store.texture(dst).desc(), self.store.texture(src).desc());
        for (desc, subresource) in [(dst_desc, dst_subresource), (src_desc, src_subresource)] {
            assert!(
                subresource < desc.subresource_count(),
                "subresource {subresource} is out of range for texture {:?} ({} subresources)",
                desc.label,
                desc.subresource_count()
            );
        }
        assert!(
            dst_desc.format == src_desc.format,
            "copy_texture_subresource_region needs matching formats ({:?} vs {:?})",
            dst_desc.format,
            src_desc.format
        );
        let extent = src_desc.mip_extent(src_desc.subresource_mip(src_subresource));
        let dst_extent = dst_desc.mip_extent(dst_desc.subresource_mip(dst_subresource));
        assert!(
            (0..3).all(|axis| u64::from(dst_offset[axis]) + u64::from(extent[axis]) <= u64::from(dst_extent[axis])),
            "a {extent:?} region at {dst_offset:?} does not fit subresource {dst_subresource} ({dst_extent:?})"
        );

        self.transition_batch([
            (Some(dst.into()), ResourceState::CopyDest),
            (Some(src.into()), ResourceState::CopySource),
        ]);
        self.record(NativeCommand::CopyTextureRegion {
            dst,
            dst_subresource,
            dst_offset,
            src,
            src_subresource,
        });
    }

    // ========================================================================
    // Render targets
    // ========================================================================

    /// Binds color targets and an optional depth target.
    ///
    /// `rtv_array_index` selects the slice of a single array or cube target.
    ///
    /// # Panics
    ///
    /// Binding a UAV together with render targets is not supported.
    pub fn set_render_targets(
        &mut self,
        render_targets: &[TextureId],
        depth: Option<TextureId>,
        uav: Option<TextureId>,
        rtv_array_index: u32,
    ) {
        assert!(
            uav.is_none(),
            "binding a UAV together with render targets is not supported"
        );
        assert!(
            !render_targets.is_empty() && render_targets.len() <= MAX_RENDER_TARGETS,
            "set_render_targets takes 1..={MAX_RENDER_TARGETS} targets, got {}",
            render_targets.len()
        );
        assert!(
            rtv_array_index == 0 || render_targets.len() == 1,
            "an array slice can only be selected with a single render target"
        );

        let rtvs: SmallVec<[_; MAX_RENDER_TARGETS]> = render_targets
            .iter()
            .map(|&id| self.store.texture(id).rtv(rtv_array_index))
            .collect();
        let dsv = depth.map(|id| self.store.texture(id).dsv());

        self.transition_batch(
            render_targets
                .iter()
                .map(|&id| (Some(id.into()), ResourceState::RenderTarget))
                .chain(depth.map(|id| (Some(id.into()), ResourceState::DepthWrite))),
        );
        self.record(NativeCommand::SetRenderTargets {
            render_targets: rtvs,
            depth: dsv,
        });
    }

    /// Binds only a depth target, for depth-only passes such as shadow maps.
    pub fn set_depth_target(&mut self, depth: TextureId) {
        let dsv = self.store.texture(depth).dsv();
        self.transition(&[depth.into()], ResourceState::DepthWrite);
        self.record(NativeCommand::SetRenderTargets {
            render_targets: SmallVec::new(),
            depth: Some(dsv),
        });
    }

    /// Binds the current back buffer and the main depth buffer.
    pub fn set_main_render_targets(&mut self) {
        let back_buffer = self.swap_chain.current();
        self.set_render_targets(&[back_buffer], Some(self.main_depth), None, 0);
    }

    pub fn unbind_render_targets(&mut self) {
        self.record(NativeCommand::SetRenderTargets {
            render_targets: SmallVec::new(),
            depth: None,
        });
    }

    // ========================================================================
    // Clears
    // ========================================================================

    pub fn clear_main_render_target(&mut self, color: [f32; 4]) {
        let back_buffer = self.swap_chain.current();
        self.clear_render_target(back_buffer, color, 0);
    }

    pub fn clear_main_depth_stencil_target(&mut self, depth: f32, stencil: u8) {
        self.clear_depth_stencil_target(self.main_depth, depth, stencil);
    }

    pub fn clear_render_target(&mut self, target: TextureId, color: [f32; 4], rtv_array_index: u32) {
        let rtv = self.store.texture(target).rtv(rtv_array_index);
        self.transition(&[target.into()], ResourceState::RenderTarget);
        self.record(NativeCommand::ClearRenderTarget { target: rtv, color });
    }

    pub fn clear_depth_stencil_target(&mut self, target: TextureId, depth: f32, stencil: u8) {
        let dsv = self.store.texture(target).dsv();
        self.transition(&[target.into()], ResourceState::DepthWrite);
        self.record(NativeCommand::ClearDepthStencil {
            target: dsv,
            depth,
            stencil,
        });
    }

    /// Clears a texture or buffer through its unordered access view.
    pub fn clear_uav(&mut self, target: impl Into<ResourceId>, values: [f32; 4]) {
        let target = target.into();
        let uav = match target {
            ResourceId::Texture(id) => self.store.texture(id).uav(),
            ResourceId::Buffer(id) => {
                let buffer = self.store.buffer(id);
                buffer.views.uav.unwrap_or_else(|| {
                    panic!("buffer {:?} has no unordered access view", buffer.desc.label)
                })
            }
        };
        self.transition(&[target], ResourceState::UnorderedAccess);
        self.record(NativeCommand::ClearUnorderedAccess { target: uav, values });
    }

    // ========================================================================
    // Viewport & scissor
    // ========================================================================

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.record(NativeCommand::SetViewport(viewport));
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.scissor = rect;
        self.record(NativeCommand::SetScissorRect(rect));
    }

    #[inline]
    #[must_use]
    pub fn current_viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    #[must_use]
    pub fn current_rect(&self) -> Rect {
        self.scissor
    }
}
