//! Descriptor Heaps
//!
//! Two allocation strategies over a fixed array of descriptor slots:
//!
//! - [`CpuDescriptorHeap`]: staging heap for resource views. Slots are handed
//!   out one at a time and returned to a free list when the owning resource is
//!   released.
//! - [`GpuDescriptorHeap`]: shader-visible heap. Contiguous blocks are carved
//!   off linearly while binding and the whole heap is reset once per frame.

use crate::descriptors::handle::{DescriptorBlock, DescriptorHandle, DescriptorHeapType, ViewDesc};
use crate::errors::{Result, RhiError};

// ---------------------------------------------------------------------------
// CPU staging heap
// ---------------------------------------------------------------------------

pub struct CpuDescriptorHeap {
    ty: DescriptorHeapType,
    slots: Vec<Option<ViewDesc>>,
    capacity: u32,
    free_list: Vec<u32>,
}

impl CpuDescriptorHeap {
    #[must_use]
    pub fn new(ty: DescriptorHeapType, capacity: u32) -> Self {
        Self {
            ty,
            slots: Vec::with_capacity(capacity.min(1024) as usize),
            capacity,
            free_list: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn heap_type(&self) -> DescriptorHeapType {
        self.ty
    }

    /// Number of live descriptors.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.slots.len() as u32 - self.free_list.len() as u32
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes `view` into a fresh slot.
    pub fn allocate(&mut self, view: ViewDesc) -> Result<DescriptorHandle> {
        debug_assert_eq!(view.kind.heap_type(), self.ty);

        let index = if let Some(index) = self.free_list.pop() {
            self.slots[index as usize] = Some(view);
            index
        } else {
            let next = self.slots.len() as u32;
            if next >= self.capacity {
                return Err(RhiError::CapacityExceeded {
                    heap: self.ty,
                    requested: 1,
                    available: 0,
                });
            }
            self.slots.push(Some(view));
            next
        };

        Ok(DescriptorHandle {
            heap: self.ty,
            index,
            shader_visible: false,
        })
    }

    /// Returns the slot to the free list.
    pub fn free(&mut self, handle: DescriptorHandle) {
        assert!(
            handle.heap == self.ty && !handle.shader_visible,
            "descriptor {handle:?} does not belong to the {:?} staging heap",
            self.ty
        );
        let slot = &mut self.slots[handle.index as usize];
        assert!(slot.is_some(), "descriptor {handle:?} freed twice");
        *slot = None;
        self.free_list.push(handle.index);
    }

    /// The view stored in `handle`'s slot.
    #[must_use]
    pub fn get(&self, handle: DescriptorHandle) -> &ViewDesc {
        assert!(handle.heap == self.ty && !handle.shader_visible);
        self.slots
            .get(handle.index as usize)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("descriptor {handle:?} is not allocated"))
    }
}

// ---------------------------------------------------------------------------
// GPU shader-visible heap
// ---------------------------------------------------------------------------

pub struct GpuDescriptorHeap {
    ty: DescriptorHeapType,
    slots: Vec<Option<ViewDesc>>,
    cursor: u32,
    generation: u32,
}

impl GpuDescriptorHeap {
    #[must_use]
    pub fn new(ty: DescriptorHeapType, capacity: u32) -> Self {
        assert!(
            ty.can_be_shader_visible(),
            "{ty:?} heaps cannot be shader-visible"
        );
        Self {
            ty,
            slots: vec![None; capacity as usize],
            cursor: 0,
            generation: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn heap_type(&self) -> DescriptorHeapType {
        self.ty
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Slots handed out since the last reset.
    #[inline]
    #[must_use]
    pub fn used(&self) -> u32 {
        self.cursor
    }

    #[inline]
    #[must_use]
    pub fn available(&self) -> u32 {
        self.capacity() - self.cursor
    }

    #[inline]
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Carves `count` contiguous slots off the heap.
    ///
    /// Never wraps and never hands out a partial block: when fewer than
    /// `count` slots remain the heap is left untouched.
    pub fn allocate_block(&mut self, count: u32) -> Result<DescriptorBlock> {
        if count == 0 {
            return Err(RhiError::InvalidArgument(
                "descriptor block size must be non-zero".to_string(),
            ));
        }
        let available = self.available();
        if count > available {
            return Err(RhiError::CapacityExceeded {
                heap: self.ty,
                requested: count,
                available,
            });
        }

        let start = self.cursor;
        self.cursor += count;
        Ok(DescriptorBlock {
            heap: self.ty,
            start,
            count,
            generation: self.generation,
        })
    }

    /// Invalidates every block handed out so far.
    pub fn reset(&mut self) {
        log::debug!(
            "Resetting shader-visible {:?} heap ({} of {} slots used)",
            self.ty,
            self.cursor,
            self.capacity()
        );
        self.cursor = 0;
        self.generation = self.generation.wrapping_add(1);
        self.slots.fill(None);
    }

    /// Copies `view` into slot `slot` of `block`.
    pub fn copy_descriptor(&mut self, block: &DescriptorBlock, slot: u32, view: ViewDesc) {
        self.check_block(block);
        let handle = block.handle(slot);
        self.slots[handle.index as usize] = Some(view);
    }

    /// Reads back slot `slot` of `block`, if it was written.
    #[must_use]
    pub fn read(&self, block: &DescriptorBlock, slot: u32) -> Option<&ViewDesc> {
        self.check_block(block);
        let handle = block.handle(slot);
        self.slots[handle.index as usize].as_ref()
    }

    fn check_block(&self, block: &DescriptorBlock) {
        assert_eq!(block.heap, self.ty, "block belongs to another heap");
        assert_eq!(
            block.generation, self.generation,
            "descriptor block {block:?} was invalidated by a heap reset"
        );
    }
}
