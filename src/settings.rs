//! RHI Settings & Backend Selection
//!
//! Everything the [`Device`](crate::device::Device) needs to know at
//! initialization time. The struct is consumed once by [`Device::new`]; nothing
//! in here is re-read afterwards.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myth_rhi::{BackendKind, Device, RhiSettings};
//!
//! // Default: explicit command-list backend, 1280×720, vsync on
//! let device = Device::new(RhiSettings::default())?;
//!
//! // Immediate-context backend at a custom resolution
//! let device = Device::new(RhiSettings {
//!     backend: BackendKind::Immediate,
//!     width: 1920,
//!     height: 1080,
//!     ..Default::default()
//! })?;
//! ```
//!
//! [`Device::new`]: crate::device::Device::new

use crate::descriptors::DescriptorHeapType;
use crate::errors::{Result, RhiError};
use crate::types::Format;

// ---------------------------------------------------------------------------
// BackendKind
// ---------------------------------------------------------------------------

/// Execution model of the backend behind the [`Device`](crate::device::Device).
///
/// | Capability                 | `Immediate`          | `Explicit`              |
/// |----------------------------|----------------------|-------------------------|
/// | Command recorders          | 1 (always open)      | `command_list_count`    |
/// | Barriers                   | tracked, elided      | tracked, recorded       |
/// | Resource binding           | direct slots         | descriptor tables       |
/// | Fixed-function state       | bound on set         | baked into the PSO      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    /// Immediate-context model: commands take effect as they are issued.
    Immediate,
    /// Explicit model: commands are recorded into lists and submitted to a queue.
    #[default]
    Explicit,
}

/// GPU adapter selection preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdapterPreference {
    /// Prefer a discrete / dedicated GPU.
    #[default]
    HighPerformance,
    /// Prefer an integrated GPU.
    LowPower,
}

// ---------------------------------------------------------------------------
// HeapCapacities
// ---------------------------------------------------------------------------

/// Descriptor counts per heap.
///
/// `cpu_*` capacities size the staging heaps that hold resource views from
/// creation to release. `gpu_*` capacities size the shader-visible heaps that
/// are linearly allocated and reset once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapCapacities {
    pub cpu_cbv_srv_uav: u32,
    pub cpu_sampler: u32,
    pub cpu_rtv: u32,
    pub cpu_dsv: u32,
    pub gpu_cbv_srv_uav: u32,
    pub gpu_sampler: u32,
}

impl Default for HeapCapacities {
    fn default() -> Self {
        Self {
            cpu_cbv_srv_uav: 4096,
            cpu_sampler: 256,
            cpu_rtv: 512,
            cpu_dsv: 128,
            gpu_cbv_srv_uav: 16384,
            gpu_sampler: 512,
        }
    }
}

impl HeapCapacities {
    /// Capacity of the CPU staging heap of the given type.
    #[must_use]
    pub fn cpu(&self, heap: DescriptorHeapType) -> u32 {
        match heap {
            DescriptorHeapType::CbvSrvUav => self.cpu_cbv_srv_uav,
            DescriptorHeapType::Sampler => self.cpu_sampler,
            DescriptorHeapType::Rtv => self.cpu_rtv,
            DescriptorHeapType::Dsv => self.cpu_dsv,
        }
    }
}

// ---------------------------------------------------------------------------
// RhiSettings
// ---------------------------------------------------------------------------

/// Global configuration for device initialization.
///
/// # Fields
///
/// | Field                 | Description                           | Default          |
/// |-----------------------|---------------------------------------|------------------|
/// | `backend`             | Execution model                       | `Explicit`       |
/// | `width` / `height`    | Swap chain size                       | 1280 × 720       |
/// | `vsync`               | Present with vertical sync            | `true`           |
/// | `back_buffer_format`  | Main render target format             | `Rgba8Unorm`     |
/// | `depth_buffer_format` | Main depth target format              | `D24UnormS8Uint` |
/// | `back_buffer_count`   | Swap chain buffer count               | 2                |
/// | `command_list_count`  | Recorder pool size (explicit backend) | 3                |
/// | `heap_capacities`     | Descriptor heap sizes                 | see type         |
/// | `adapter`             | Adapter selection strategy            | `HighPerformance`|
#[derive(Debug, Clone)]
pub struct RhiSettings {
    // === Backend ===
    pub backend: BackendKind,
    pub adapter: AdapterPreference,

    // === Swap Chain ===
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub back_buffer_format: Format,
    pub depth_buffer_format: Format,
    pub back_buffer_count: u32,

    // === Command Recording ===
    /// Number of recorders in the pool. Ignored by the immediate backend,
    /// which always has exactly one.
    pub command_list_count: usize,

    pub heap_capacities: HeapCapacities,
}

impl Default for RhiSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            adapter: AdapterPreference::default(),
            width: 1280,
            height: 720,
            vsync: true,
            back_buffer_format: Format::Rgba8Unorm,
            depth_buffer_format: Format::D24UnormS8Uint,
            back_buffer_count: 2,
            command_list_count: 3,
            heap_capacities: HeapCapacities::default(),
        }
    }
}

impl RhiSettings {
    /// Rejects configurations no backend can be created from.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RhiError::InvalidArgument(format!(
                "swap chain size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.back_buffer_count == 0 {
            return Err(RhiError::InvalidArgument(
                "back_buffer_count must be at least 1".to_string(),
            ));
        }
        if self.command_list_count == 0 {
            return Err(RhiError::InvalidArgument(
                "command_list_count must be at least 1".to_string(),
            ));
        }
        if !self.depth_buffer_format.is_depth() {
            return Err(RhiError::InvalidArgument(format!(
                "depth_buffer_format {:?} is not a depth format",
                self.depth_buffer_format
            )));
        }
        if self.back_buffer_format == Format::Unknown || self.back_buffer_format.is_depth() {
            return Err(RhiError::InvalidArgument(format!(
                "back_buffer_format {:?} is not a color format",
                self.back_buffer_format
            )));
        }
        let caps = &self.heap_capacities;
        if caps.gpu_cbv_srv_uav == 0 || caps.gpu_sampler == 0 {
            return Err(RhiError::InvalidArgument(
                "shader-visible heap capacities must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
