//! Immediate-context backend.
//!
//! There is exactly one context and it is always open. Every command takes
//! effect the moment it is recorded; the context keeps a log of what it was
//! given so callers can inspect the frame. Barriers are accepted for the log
//! but have no native effect, since the context orders hazards itself.

use crate::command::native::{self, NativeCommand};
use crate::command::recorder::CommandRecorder;
use crate::resources::ResourceStore;

pub struct ImmediateContext {
    log: CommandRecorder,
    frames: u64,
}

impl Default for ImmediateContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ImmediateContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: CommandRecorder::always_open(),
            frames: 0,
        }
    }

    fn check_index(index: usize) {
        assert!(
            index == 0,
            "command list index {index} out of range (immediate context has 1)"
        );
    }

    /// Starts a new frame log.
    pub fn begin(&mut self, index: usize) {
        Self::check_index(index);
        self.log.clear();
    }

    pub fn end(&mut self, index: usize) {
        Self::check_index(index);
    }

    /// Work already ran as it was recorded; this only marks the frame.
    pub fn execute(&mut self, index: usize) {
        Self::check_index(index);
        self.frames += 1;
    }

    pub fn record(&mut self, command: NativeCommand, store: &mut ResourceStore) {
        if let NativeCommand::ResourceBarrier(batch) = &command {
            log::trace!("Immediate context elides {} barrier(s)", batch.len());
        } else {
            native::execute(&command, store);
        }
        self.log.record(command);
    }

    #[must_use]
    pub fn log(&self) -> &CommandRecorder {
        &self.log
    }

    #[must_use]
    pub fn executed_frames(&self) -> u64 {
        self.frames
    }
}
