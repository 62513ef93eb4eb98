//! # RAII Guards for Dump Operations
//!
//! These guards make the two cleanup rules of a dump hold on every exit path,
//! including `?` early returns and panics:
//!
//! - **PartialOutput**: the dump file is deleted unless the dump is committed,
//!   so the artifact on disk is all-or-nothing
//! - **SnapshotLease**: a captured snapshot is always freed, and the clone
//!   process behind it always closed, exactly once
//!
//! ## Example
//!
//! ```rust,no_run
//! use memsnap_core::dump::guards::PartialOutput;
//! use memsnap_core::ProcessId;
//!
//! let output = PartialOutput::create("lsass_612.dmp")?;
//! // ... hand output.file() to the dump primitive ...
//! // Dropping `output` here instead would delete the file.
//! let path = output.commit(ProcessId(612))?;
//! # Ok::<(), memsnap_core::error::SnapError>(())
//! ```

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::state::SnapshotState;
use super::DumpPlatform;
use crate::error::{SnapError, SnapResult};
use crate::types::ProcessId;

/// RAII guard for a dump file that is deleted unless committed
pub struct PartialOutput
{
    path: PathBuf,
    file: Option<File>,
}

impl PartialOutput
{
    /// Create (or truncate) the output file
    ///
    /// ## Errors
    ///
    /// - `OutputFile`: the file could not be created
    pub fn create(path: impl Into<PathBuf>) -> SnapResult<Self>
    {
        let path = path.into();
        let file = File::create(&path).map_err(|source| SnapError::OutputFile {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "created dump file");
        Ok(Self { path, file: Some(file) })
    }

    /// The open file, for the dump primitive to write into
    #[must_use]
    pub fn file(&self) -> &File
    {
        // Only `commit` and `drop` take the file, and both consume the guard
        self.file.as_ref().unwrap_or_else(|| unreachable!("dump file taken before commit"))
    }

    /// Path of the output file
    #[must_use]
    pub fn path(&self) -> &Path
    {
        &self.path
    }

    /// Keep the file: flush it, close it, and check it is not empty
    ///
    /// An empty file is not a dump; it is deleted and reported as a failure.
    ///
    /// ## Errors
    ///
    /// - `Io`: flushing or reading the file metadata failed
    /// - `DumpFailed`: the primitive reported success for `pid` but wrote nothing
    pub fn commit(mut self, pid: ProcessId) -> SnapResult<PathBuf>
    {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
            let len = file.metadata()?.len();
            drop(file);
            if len == 0 {
                let details = format!("dump primitive reported success but {} is empty", self.path.display());
                self.discard();
                return Err(SnapError::DumpFailed { pid, details });
            }
        }
        Ok(std::mem::take(&mut self.path))
    }

    fn discard(&mut self)
    {
        // Close before deleting; Windows refuses to delete an open file
        drop(self.file.take());
        if self.path.as_os_str().is_empty() {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed partial dump file"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path.display(), "failed to remove partial dump file: {err}"),
        }
        self.path = PathBuf::new();
    }
}

impl Drop for PartialOutput
{
    fn drop(&mut self)
    {
        self.discard();
    }
}

/// RAII guard owning a captured snapshot
///
/// Releasing means, in this order:
///
/// 1. query the snapshot for its clone process (the pid is logged),
/// 2. free the snapshot,
/// 3. close the clone process handle.
///
/// The lease releases exactly once: either through [`SnapshotLease::release`]
/// or, if an early return skipped that, when it is dropped.
pub struct SnapshotLease<'p, P: DumpPlatform + ?Sized>
{
    platform: &'p P,
    snapshot: Option<P::Snapshot>,
    state: SnapshotState,
}

impl<'p, P: DumpPlatform + ?Sized> SnapshotLease<'p, P>
{
    /// Take ownership of a freshly captured snapshot
    pub fn new(platform: &'p P, snapshot: P::Snapshot) -> Self
    {
        Self {
            platform,
            snapshot: Some(snapshot),
            state: SnapshotState::Captured,
        }
    }

    /// The captured snapshot
    #[must_use]
    pub fn snapshot(&self) -> &P::Snapshot
    {
        // Only `release_inner` takes the snapshot, after which no borrow is handed out
        self.snapshot.as_ref().unwrap_or_else(|| unreachable!("snapshot used after release"))
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SnapshotState
    {
        self.state
    }

    /// Record a lifecycle transition
    pub fn advance(&mut self, next: SnapshotState)
    {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal snapshot transition {} -> {}",
            self.state,
            next
        );
        debug!("snapshot {} -> {}", self.state, next);
        self.state = next;
    }

    /// Release the snapshot now and return the final state
    pub fn release(mut self) -> SnapshotState
    {
        self.release_inner();
        self.state
    }

    fn release_inner(&mut self)
    {
        let Some(snapshot) = self.snapshot.take() else {
            return;
        };
        self.advance(SnapshotState::Releasing);

        let clone = match self.platform.query_clone(&snapshot) {
            Ok(clone) => {
                match self.platform.clone_process_id(&clone) {
                    Some(pid) => debug!(clone_pid = %pid, "snapshot clone process"),
                    None => debug!("snapshot clone process id unavailable"),
                }
                Some(clone)
            }
            Err(err) => {
                warn!("failed to query snapshot clone process: {err}");
                None
            }
        };

        if let Err(err) = self.platform.free_snapshot(snapshot) {
            warn!("failed to free snapshot: {err}");
        }
        if let Some(clone) = clone {
            self.platform.close_clone(clone);
        }

        self.advance(SnapshotState::Released);
    }
}

impl<P: DumpPlatform + ?Sized> Drop for SnapshotLease<'_, P>
{
    fn drop(&mut self)
    {
        self.release_inner();
    }
}
