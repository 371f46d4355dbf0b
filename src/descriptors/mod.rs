//! Descriptor / binding-table allocation.
//!
//! Resource views live in CPU staging heaps from creation until release.
//! At bind time they are copied into contiguous blocks of a shader-visible
//! heap, which is reset at the start of every frame.

pub mod handle;
pub mod heap;
pub mod manager;

pub use handle::{DescriptorBlock, DescriptorHandle, DescriptorHeapType, ViewDesc, ViewKind};
pub use heap::{CpuDescriptorHeap, GpuDescriptorHeap};
pub use manager::{DescriptorManager, NullDescriptors};
