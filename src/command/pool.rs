//! Bounded recorder pool.

use crate::command::native::NativeCommand;
use crate::command::recorder::CommandRecorder;

/// A fixed ring of recorders. Commands go to whichever recorder was begun
/// most recently and has not been ended.
pub struct RecorderPool {
    recorders: Vec<CommandRecorder>,
    active: Option<usize>,
}

impl RecorderPool {
    #[must_use]
    pub fn new(count: usize) -> Self {
        assert!(count > 0, "recorder pool needs at least one recorder");
        Self {
            recorders: (0..count).map(|_| CommandRecorder::new()).collect(),
            active: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.recorders.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recorders.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.recorders.len(),
            "command list index {index} out of range (pool of {})",
            self.recorders.len()
        );
    }

    #[must_use]
    pub fn get(&self, index: usize) -> &CommandRecorder {
        self.check_index(index);
        &self.recorders[index]
    }

    pub fn begin(&mut self, index: usize) {
        self.check_index(index);
        self.recorders[index].begin();
        self.active = Some(index);
    }

    pub fn end(&mut self, index: usize) {
        self.check_index(index);
        self.recorders[index].end();
        if self.active == Some(index) {
            self.active = None;
        }
    }

    /// Index of the recorder commands currently go to.
    #[must_use]
    pub fn recording_index(&self) -> usize {
        self.active
            .unwrap_or_else(|| panic!("no command list is recording; call begin_command_list first"))
    }

    /// Records into the active recorder.
    pub fn record(&mut self, command: NativeCommand) {
        let index = self.recording_index();
        self.recorders[index].record(command);
    }

    /// Closes recorder `index` for submission and returns its commands.
    pub fn submit(&mut self, index: usize) -> &[NativeCommand] {
        self.check_index(index);
        self.recorders[index].submit()
    }
}
