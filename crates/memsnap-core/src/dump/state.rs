//! Lifecycle of a snapshot dump.

use std::fmt;

/// Where a snapshot dump currently is
///
/// ## State Transitions
///
/// - `Idle` → `Capturing`: the capture primitive is called
/// - `Capturing` → `Captured` | `Failed`: capture returned
/// - `Captured` → `Dumping`: the dump primitive is called on the snapshot
/// - `Dumping` → `Dumped` | `DumpFailed`: the dump primitive returned
/// - `Captured` | `Dumping` | `Dumped` | `DumpFailed` → `Releasing`: cleanup
///   started (an early exit from `Captured` or `Dumping` still releases)
/// - `Releasing` → `Released`: snapshot freed and clone handle closed
///
/// Once `Captured` has been reached, the only terminal state is `Released`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotState
{
    /// Nothing captured yet
    Idle,
    /// Capture primitive in progress
    Capturing,
    /// Capture failed; nothing to release
    Failed,
    /// Snapshot owned, not yet dumped
    Captured,
    /// Dump primitive in progress
    Dumping,
    /// Dump primitive succeeded
    Dumped,
    /// Dump primitive failed
    DumpFailed,
    /// Cleanup in progress
    Releasing,
    /// Snapshot freed and clone closed
    Released,
}

impl SnapshotState
{
    /// Whether moving from `self` to `next` is a legal transition
    #[must_use]
    pub const fn can_advance_to(self, next: SnapshotState) -> bool
    {
        use SnapshotState::{Captured, Capturing, DumpFailed, Dumped, Dumping, Failed, Idle, Released, Releasing};

        matches!(
            (self, next),
            (Idle, Capturing)
                | (Capturing, Captured | Failed)
                | (Captured, Dumping | Releasing)
                | (Dumping, Dumped | DumpFailed | Releasing)
                | (Dumped | DumpFailed, Releasing)
                | (Releasing, Released)
        )
    }

    /// Whether a snapshot is held in this state and must still be released
    #[must_use]
    pub const fn holds_snapshot(self) -> bool
    {
        matches!(
            self,
            SnapshotState::Captured
                | SnapshotState::Dumping
                | SnapshotState::Dumped
                | SnapshotState::DumpFailed
                | SnapshotState::Releasing
        )
    }

    /// Whether no further transition is possible
    #[must_use]
    pub const fn is_terminal(self) -> bool
    {
        matches!(self, SnapshotState::Failed | SnapshotState::Released)
    }
}

impl fmt::Display for SnapshotState
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            SnapshotState::Idle => "idle",
            SnapshotState::Capturing => "capturing",
            SnapshotState::Failed => "failed",
            SnapshotState::Captured => "captured",
            SnapshotState::Dumping => "dumping",
            SnapshotState::Dumped => "dumped",
            SnapshotState::DumpFailed => "dump-failed",
            SnapshotState::Releasing => "releasing",
            SnapshotState::Released => "released",
        };
        f.write_str(name)
    }
}
