#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! # Myth RHI
//!
//! A render hardware interface over two execution models: an immediate
//! context where work runs as it is recorded, and explicit command lists with
//! descriptor heaps and resource barriers. Callers drive both through one
//! [`Device`] and pick the model once, in [`RhiSettings::backend`].
//!
//! ```rust,ignore
//! use myth_rhi::{Device, RhiSettings, BackendKind};
//!
//! let mut device = Device::new(RhiSettings {
//!     backend: BackendKind::Explicit,
//!     ..Default::default()
//! })?;
//!
//! device.begin_command_list(0);
//! device.set_main_render_targets();
//! device.clear_main_render_target([0.0, 0.0, 0.0, 1.0]);
//! device.end_command_list(0);
//! device.execute_command_lists(0);
//! device.present()?;
//! ```

pub mod backend;
pub mod command;
pub mod descriptors;
pub mod device;
pub mod errors;
pub mod pipeline;
pub mod resources;
pub mod settings;
pub mod types;

pub use device::{BindingSlot, Device};
pub use errors::{Result, RhiError};
pub use pipeline::{BlendPreset, ComparisonFunc, DepthStencilPreset, RasterizerPreset, SamplerPreset};
pub use resources::{
    BufferDesc, BufferId, DescriptorRange, InputElement, ResourceId, RootSignatureDesc,
    RootSignatureId, ShaderDesc, ShaderId, ShaderVisibility, TextureDesc, TextureId,
};
pub use settings::{AdapterPreference, BackendKind, HeapCapacities, RhiSettings};
pub use types::{
    BindFlags, CpuAccessFlags, Format, MiscFlags, PrimitiveTopology, Rect, ResourceState,
    ShaderStage, Viewport,
};
