//! Backend variants.
//!
//! [`Backend`] is the one seam where the immediate and explicit execution
//! models differ. The [`Device`](crate::device::Device) decides how to bind
//! and record; the backend decides when recorded work touches memory.

pub mod adapter;
pub mod immediate;
pub mod queue;
pub mod swap_chain;

pub use adapter::{AdapterInfo, enumerate_adapters, select_adapter};
pub use immediate::ImmediateContext;
pub use queue::{Queue, SubmissionId, SubmittedList};
pub use swap_chain::SwapChain;

use crate::command::{CommandRecorder, NativeCommand, RecorderPool};
use crate::resources::ResourceStore;
use crate::settings::BackendKind;

pub enum Backend {
    Immediate(ImmediateContext),
    Explicit { pool: RecorderPool, queue: Queue },
}

impl Backend {
    #[must_use]
    pub fn new(kind: BackendKind, command_list_count: usize) -> Self {
        match kind {
            BackendKind::Immediate => Self::Immediate(ImmediateContext::new()),
            BackendKind::Explicit => Self::Explicit {
                pool: RecorderPool::new(command_list_count),
                queue: Queue::new(),
            },
        }
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Immediate(_) => BackendKind::Immediate,
            Self::Explicit { .. } => BackendKind::Explicit,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_immediate(&self) -> bool {
        matches!(self, Self::Immediate(_))
    }

    pub fn record(&mut self, command: NativeCommand, store: &mut ResourceStore) {
        match self {
            Self::Immediate(context) => context.record(command, store),
            Self::Explicit { pool, .. } => pool.record(command),
        }
    }

    /// Panics unless commands can be recorded right now. The immediate
    /// context is always open.
    pub fn assert_recording(&self) {
        if let Self::Explicit { pool, .. } = self {
            let _ = pool.recording_index();
        }
    }

    pub fn begin(&mut self, index: usize) {
        match self {
            Self::Immediate(context) => context.begin(index),
            Self::Explicit { pool, .. } => pool.begin(index),
        }
    }

    pub fn end(&mut self, index: usize) {
        match self {
            Self::Immediate(context) => context.end(index),
            Self::Explicit { pool, .. } => pool.end(index),
        }
    }

    pub fn execute(&mut self, index: usize, store: &mut ResourceStore) {
        match self {
            Self::Immediate(context) => context.execute(index),
            Self::Explicit { pool, queue } => {
                let commands = pool.submit(index);
                queue.submit(index, commands, store);
            }
        }
    }

    #[must_use]
    pub fn recorder(&self, index: usize) -> &CommandRecorder {
        match self {
            Self::Immediate(context) => {
                assert!(
                    index == 0,
                    "command list index {index} out of range (immediate context has 1)"
                );
                context.log()
            }
            Self::Explicit { pool, .. } => pool.get(index),
        }
    }

    /// Submission history. Always empty for the immediate backend.
    #[must_use]
    pub fn submitted(&self) -> Vec<SubmittedList> {
        match self {
            Self::Immediate(_) => Vec::new(),
            Self::Explicit { queue, .. } => queue.history().cloned().collect(),
        }
    }
}
