//! Swap chain bookkeeping.

use smallvec::SmallVec;

use crate::resources::TextureId;

pub struct SwapChain {
    back_buffers: SmallVec<[TextureId; 3]>,
    current: usize,
    presented: u64,
    vsync: bool,
}

impl SwapChain {
    pub(crate) fn new(back_buffers: SmallVec<[TextureId; 3]>, vsync: bool) -> Self {
        assert!(!back_buffers.is_empty(), "swap chain needs at least one back buffer");
        Self {
            back_buffers,
            current: 0,
            presented: 0,
            vsync,
        }
    }

    /// The back buffer rendered to this frame.
    #[inline]
    #[must_use]
    pub fn current(&self) -> TextureId {
        self.back_buffers[self.current]
    }

    #[inline]
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn back_buffers(&self) -> &[TextureId] {
        &self.back_buffers
    }

    #[inline]
    #[must_use]
    pub fn presented_frames(&self) -> u64 {
        self.presented
    }

    #[inline]
    #[must_use]
    pub fn vsync(&self) -> bool {
        self.vsync
    }

    pub(crate) fn contains(&self, texture: TextureId) -> bool {
        self.back_buffers.contains(&texture)
    }

    /// Flips to the next back buffer.
    pub(crate) fn advance(&mut self) {
        self.presented += 1;
        self.current = (self.current + 1) % self.back_buffers.len();
    }
}
