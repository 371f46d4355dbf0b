//! Strongly-typed pipeline handles.
//!
//! Thin `Copy` wrapper around a `u32` index into the [`PipelineCache`]'s
//! compiled pipeline storage.
//!
//! [`PipelineCache`]: super::cache::PipelineCache

/// Handle to a compiled pipeline state object.
///
/// Returned by [`PipelineCache::finalize`] and [`PipelineCache::bind`].
///
/// [`PipelineCache::finalize`]: super::cache::PipelineCache::finalize
/// [`PipelineCache::bind`]: super::cache::PipelineCache::bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineId(pub(crate) u32);

impl PipelineId {
    /// Raw index into the compiled pipeline storage.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
