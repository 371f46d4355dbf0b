//! Descriptor Heap Manager
//!
//! Owns one staging heap per [`DescriptorHeapType`] and the two shader-visible
//! heaps, plus the null descriptors used to fill unbound table slots and one
//! staging descriptor per sampler preset in use.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::descriptors::handle::{
    DescriptorBlock, DescriptorHandle, DescriptorHeapType, ViewDesc, ViewKind,
};
use crate::descriptors::heap::{CpuDescriptorHeap, GpuDescriptorHeap};
use crate::errors::Result;
use crate::pipeline::SamplerPreset;
use crate::settings::HeapCapacities;
use crate::types::ViewDimension;

/// Dimensions that get a dedicated null UAV. Every other dimension falls back
/// to the 2D one.
const NULL_UAV_DIMENSIONS: [ViewDimension; 3] = [
    ViewDimension::Buffer,
    ViewDimension::Texture2D,
    ViewDimension::Texture3D,
];

/// Zero views, one per dimensionality, created once at device init.
pub struct NullDescriptors {
    srv: FxHashMap<ViewDimension, DescriptorHandle>,
    uav: FxHashMap<ViewDimension, DescriptorHandle>,
}

impl NullDescriptors {
    fn create(heap: &mut CpuDescriptorHeap) -> Result<Self> {
        let mut srv = FxHashMap::default();
        for dimension in ViewDimension::ALL {
            let handle = heap.allocate(ViewDesc::null(ViewKind::ShaderResource, dimension))?;
            srv.insert(dimension, handle);
        }

        let mut uav = FxHashMap::default();
        for dimension in NULL_UAV_DIMENSIONS {
            let handle = heap.allocate(ViewDesc::null(ViewKind::UnorderedAccess, dimension))?;
            uav.insert(dimension, handle);
        }

        Ok(Self { srv, uav })
    }

    /// Null shader-resource view of the given dimension.
    #[must_use]
    pub fn srv(&self, dimension: ViewDimension) -> DescriptorHandle {
        self.srv[&dimension]
    }

    /// Null unordered-access view closest to the given dimension.
    #[must_use]
    pub fn uav(&self, dimension: ViewDimension) -> DescriptorHandle {
        self.uav
            .get(&dimension)
            .copied()
            .unwrap_or_else(|| self.uav[&ViewDimension::Texture2D])
    }
}

pub struct DescriptorManager {
    cpu: [CpuDescriptorHeap; 4],
    gpu_cbv_srv_uav: GpuDescriptorHeap,
    gpu_sampler: GpuDescriptorHeap,
    null: NullDescriptors,
    samplers: FxHashMap<SamplerPreset, DescriptorHandle>,
}

impl DescriptorManager {
    pub fn new(capacities: &HeapCapacities) -> Result<Self> {
        let mut cpu = DescriptorHeapType::ALL.map(|ty| CpuDescriptorHeap::new(ty, capacities.cpu(ty)));
        let null = NullDescriptors::create(&mut cpu[DescriptorHeapType::CbvSrvUav.slot()])?;

        Ok(Self {
            cpu,
            gpu_cbv_srv_uav: GpuDescriptorHeap::new(
                DescriptorHeapType::CbvSrvUav,
                capacities.gpu_cbv_srv_uav,
            ),
            gpu_sampler: GpuDescriptorHeap::new(DescriptorHeapType::Sampler, capacities.gpu_sampler),
            null,
            samplers: FxHashMap::default(),
        })
    }

    #[inline]
    #[must_use]
    pub fn null(&self) -> &NullDescriptors {
        &self.null
    }

    // === Staging heaps ===

    /// Allocates a staging slot in the heap matching the view kind.
    pub fn create_view(&mut self, view: ViewDesc) -> Result<DescriptorHandle> {
        self.cpu[view.kind.heap_type().slot()].allocate(view)
    }

    pub fn release_view(&mut self, handle: DescriptorHandle) {
        self.cpu[handle.heap.slot()].free(handle);
    }

    #[must_use]
    pub fn view(&self, handle: DescriptorHandle) -> &ViewDesc {
        self.cpu[handle.heap.slot()].get(handle)
    }

    /// Staging descriptor of a sampler preset, created on first use and kept
    /// for the life of the device.
    pub fn sampler_view(&mut self, preset: SamplerPreset) -> Result<DescriptorHandle> {
        if let Some(&handle) = self.samplers.get(&preset) {
            return Ok(handle);
        }
        let handle = self.cpu[DescriptorHeapType::Sampler.slot()].allocate(ViewDesc::sampler(preset))?;
        self.samplers.insert(preset, handle);
        Ok(handle)
    }

    #[must_use]
    pub fn staging(&self, ty: DescriptorHeapType) -> &CpuDescriptorHeap {
        &self.cpu[ty.slot()]
    }

    // === Shader-visible heaps ===

    #[must_use]
    pub fn gpu_heap(&self, ty: DescriptorHeapType) -> &GpuDescriptorHeap {
        match ty {
            DescriptorHeapType::CbvSrvUav => &self.gpu_cbv_srv_uav,
            DescriptorHeapType::Sampler => &self.gpu_sampler,
            _ => panic!("{ty:?} has no shader-visible heap"),
        }
    }

    pub fn gpu_heap_mut(&mut self, ty: DescriptorHeapType) -> &mut GpuDescriptorHeap {
        match ty {
            DescriptorHeapType::CbvSrvUav => &mut self.gpu_cbv_srv_uav,
            DescriptorHeapType::Sampler => &mut self.gpu_sampler,
            _ => panic!("{ty:?} has no shader-visible heap"),
        }
    }

    /// Allocates a block sized to `sources` in the shader-visible `heap` and
    /// copies each staging view into it in order.
    pub fn stage_table(
        &mut self,
        heap: DescriptorHeapType,
        sources: &[DescriptorHandle],
    ) -> Result<DescriptorBlock> {
        let views: SmallVec<[ViewDesc; 8]> = sources
            .iter()
            .map(|source| {
                assert!(
                    source.heap == heap,
                    "cannot stage a {:?} descriptor into a {heap:?} table",
                    source.heap
                );
                *self.cpu[source.heap.slot()].get(*source)
            })
            .collect();

        let target = self.gpu_heap_mut(heap);
        let block = target.allocate_block(views.len() as u32)?;
        for (slot, view) in views.into_iter().enumerate() {
            target.copy_descriptor(&block, slot as u32, view);
        }
        Ok(block)
    }
}
