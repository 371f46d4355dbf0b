//! Submission queue of the explicit backend.
//!
//! Executes submitted command lists in the order they are handed over and
//! signals a monotonically increasing fence after each one. The headless
//! device completes work synchronously, so every submission is complete by the
//! time `submit` returns.

use std::collections::VecDeque;

use crate::command::native::{self, NativeCommand};
use crate::resources::ResourceStore;

/// Fence value signalled after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SubmissionId(pub u64);

/// Record of one executed command list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedList {
    pub recorder_index: usize,
    pub command_count: usize,
    pub barrier_count: usize,
    pub fence: SubmissionId,
}

/// How many submissions the queue remembers.
const HISTORY_LEN: usize = 64;

#[derive(Default)]
pub struct Queue {
    last_signalled: u64,
    history: VecDeque<SubmittedList>,
}

impl Queue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes `commands` against resource memory and signals the fence.
    pub fn submit(
        &mut self,
        recorder_index: usize,
        commands: &[NativeCommand],
        store: &mut ResourceStore,
    ) -> SubmissionId {
        for command in commands {
            native::execute(command, store);
        }

        self.last_signalled += 1;
        let fence = SubmissionId(self.last_signalled);
        let record = SubmittedList {
            recorder_index,
            command_count: commands.len(),
            barrier_count: commands.iter().map(NativeCommand::barrier_count).sum(),
            fence,
        };
        log::trace!("Submitted command list {recorder_index}: {record:?}");

        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(record);
        fence
    }

    #[inline]
    #[must_use]
    pub fn completed(&self) -> SubmissionId {
        SubmissionId(self.last_signalled)
    }

    #[inline]
    #[must_use]
    pub fn is_complete(&self, fence: SubmissionId) -> bool {
        fence.0 <= self.last_signalled
    }

    /// Recent submissions, oldest first.
    #[must_use]
    pub fn history(&self) -> impl ExactSizeIterator<Item = &SubmittedList> {
        self.history.iter()
    }
}
