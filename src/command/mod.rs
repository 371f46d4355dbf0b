//! Command recording.

pub mod native;
pub mod pool;
pub mod recorder;

pub use native::NativeCommand;
pub use pool::RecorderPool;
pub use recorder::{CommandRecorder, RecorderStatus};
