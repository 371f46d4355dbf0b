//! Pipeline state: static preset tables, named PSO descriptions and the cache
//! that compiles them.

pub mod cache;
pub mod pipeline_id;
pub mod presets;
pub mod pso;

pub use cache::{PipelineCache, PipelineMode};
pub use pipeline_id::PipelineId;
pub use presets::{
    BlendPreset, ComparisonFunc, DepthStencilPreset, RasterizerPreset, SamplerPreset, StateTables,
};
pub use pso::{ComputePipelineDesc, GraphicsPipelineDesc, MAX_RENDER_TARGETS, PipelineDesc, PipelineState};
