//! Command recorder.

use crate::command::native::NativeCommand;

/// Lifecycle of a recorder: `Closed → Recording → Executable → Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderStatus {
    #[default]
    Closed,
    Recording,
    /// Ended and waiting to be submitted.
    Executable,
}

/// An ordered, single-writer list of native commands.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    status: RecorderStatus,
    commands: Vec<NativeCommand>,
}

impl CommandRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder that is open from the start and never closes.
    pub(crate) fn always_open() -> Self {
        Self {
            status: RecorderStatus::Recording,
            commands: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> RecorderStatus {
        self.status
    }

    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[NativeCommand] {
        &self.commands
    }

    /// Total individual barriers recorded.
    #[must_use]
    pub fn barrier_count(&self) -> usize {
        self.commands.iter().map(NativeCommand::barrier_count).sum()
    }

    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    /// Resets the allocator and opens the recorder.
    ///
    /// An ended list must be executed first: its barriers already moved the
    /// tracked resource states.
    pub fn begin(&mut self) {
        assert!(
            self.status != RecorderStatus::Recording,
            "command list is already recording; end it before beginning again"
        );
        assert!(
            self.status != RecorderStatus::Executable,
            "command list was ended but never executed; execute it before beginning again"
        );
        self.commands.clear();
        self.status = RecorderStatus::Recording;
    }

    pub fn end(&mut self) {
        assert!(
            self.status == RecorderStatus::Recording,
            "command list is not recording (status {:?})",
            self.status
        );
        self.status = RecorderStatus::Executable;
    }

    pub fn record(&mut self, command: NativeCommand) {
        assert!(
            self.status == RecorderStatus::Recording,
            "cannot record {command:?}: command list is not recording (status {:?})",
            self.status
        );
        self.commands.push(command);
    }

    /// Hands the recorded commands to the queue. The recorder keeps its log so
    /// it can still be inspected until the next `begin`.
    pub(crate) fn submit(&mut self) -> &[NativeCommand] {
        assert!(
            self.status == RecorderStatus::Executable,
            "command list must be ended before it is executed (status {:?})",
            self.status
        );
        self.status = RecorderStatus::Closed;
        &self.commands
    }

    pub(crate) fn clear(&mut self) {
        self.commands.clear();
    }
}
