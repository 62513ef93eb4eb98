//! # Memory Snapshot Engine
//!
//! Full-memory minidumps of a target process.
//!
//! Two strategies share one output contract:
//!
//! - [`DumpStrategy::Direct`]: the dump primitive reads the live process.
//! - [`DumpStrategy::Snapshot`]: a point-in-time copy-on-write clone of the
//!   process is captured first and the dump reads the clone, so a busy target
//!   is only paused for the capture.
//!
//! ## Output contract
//!
//! - Directory: [`OutputSpec::directory`], else the current directory.
//! - File name: [`OutputSpec::file_name`], else `<processName>_<pid>.dmp`.
//! - All-or-nothing: if the dump fails the file is deleted before returning.
//!
//! ## Snapshot lifecycle
//!
//! Capture → dump → release, tracked by [`SnapshotState`]. The release step
//! runs whether the dump succeeded or not; see [`guards::SnapshotLease`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use memsnap_core::dump::{DumpEngine, DumpStrategy, MemoryDumper, OutputSpec};
//! use memsnap_core::platform::{native_dump_platform, native_system};
//! use memsnap_core::types::ProcessTarget;
//!
//! let engine = DumpEngine::new(native_system()?, native_dump_platform()?, DumpStrategy::Snapshot);
//! let outcome = engine.dump(&ProcessTarget::Name("notepad".into()), &OutputSpec::default());
//! println!("{} -> {}", outcome.success, outcome.file_path.display());
//! # Ok::<(), memsnap_core::error::SnapError>(())
//! ```

pub mod guards;
pub mod state;

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

pub use self::guards::{PartialOutput, SnapshotLease};
pub use self::state::SnapshotState;
use crate::enumerator::{resolve_target, ProcessSystem};
use crate::error::{SnapError, SnapResult};
use crate::types::{ProcessEntry, ProcessId, ProcessTarget};

/// OS primitives the dump engine drives
///
/// The engine owns the control flow (output file, snapshot lease, cleanup);
/// implementations only wrap single OS calls. Handles are owned values: a
/// `Process` closes itself on drop, while `Snapshot` and `CloneProcess` are
/// given back through [`free_snapshot`](Self::free_snapshot) and
/// [`close_clone`](Self::close_clone).
pub trait DumpPlatform
{
    /// Open handle to a target process
    type Process;
    /// Captured snapshot
    type Snapshot;
    /// Process backing a snapshot's virtual address clone
    type CloneProcess;

    /// Fail fast when the snapshot primitives are missing on this system
    ///
    /// ## Errors
    ///
    /// - `SnapshotUnavailable`: the capture primitive cannot be used here
    fn ensure_snapshot_support(&self) -> SnapResult<()>;

    /// Open `pid` with the access `strategy` needs
    ///
    /// ## Errors
    ///
    /// - `ProcessNotFound`, `PermissionDenied`, or a platform error
    fn open_process(&self, pid: ProcessId, strategy: DumpStrategy) -> SnapResult<Self::Process>;

    /// Write a full-memory dump of a live process into `file`
    ///
    /// ## Errors
    ///
    /// - `DumpFailed` or a platform error
    fn write_process_dump(&self, process: &Self::Process, pid: ProcessId, file: &File) -> SnapResult<()>;

    /// Capture a snapshot of `process`
    ///
    /// ## Errors
    ///
    /// - `SnapshotFailed` or a platform error
    fn capture_snapshot(&self, process: &Self::Process, pid: ProcessId) -> SnapResult<Self::Snapshot>;

    /// Write a full-memory dump of a captured snapshot into `file`
    ///
    /// ## Errors
    ///
    /// - `DumpFailed` or a platform error
    fn write_snapshot_dump(&self, snapshot: &Self::Snapshot, pid: ProcessId, file: &File) -> SnapResult<()>;

    /// Query the process backing the snapshot's address-space clone
    ///
    /// ## Errors
    ///
    /// - `SnapshotFailed` or a platform error
    fn query_clone(&self, snapshot: &Self::Snapshot) -> SnapResult<Self::CloneProcess>;

    /// PID of the clone process, for diagnostics
    fn clone_process_id(&self, clone: &Self::CloneProcess) -> Option<ProcessId>;

    /// Free a snapshot
    ///
    /// ## Errors
    ///
    /// A platform error; the snapshot is considered gone either way.
    fn free_snapshot(&self, snapshot: Self::Snapshot) -> SnapResult<()>;

    /// Close the clone process handle
    fn close_clone(&self, clone: Self::CloneProcess);
}

/// Which dump strategy to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum DumpStrategy
{
    /// Dump the live process
    #[default]
    Direct,
    /// Capture a point-in-time clone and dump the clone
    Snapshot,
}

impl FromStr for DumpStrategy
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "direct" | "live" => Ok(DumpStrategy::Direct),
            "snapshot" | "pss" | "clone" => Ok(DumpStrategy::Snapshot),
            _ => Err(format!("Unknown dump strategy: {s}. Use 'direct' or 'snapshot'")),
        }
    }
}

impl fmt::Display for DumpStrategy
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            DumpStrategy::Direct => write!(f, "direct"),
            DumpStrategy::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// Where a dump should be written
///
/// Empty values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSpec
{
    /// Output directory (default: current directory)
    pub directory: Option<PathBuf>,
    /// Output file name (default: `<processName>_<pid>.dmp`)
    pub file_name: Option<String>,
}

impl OutputSpec
{
    /// Use `directory` as the output directory
    #[must_use]
    pub fn in_dir(mut self, directory: impl Into<PathBuf>) -> Self
    {
        self.directory = Some(directory.into());
        self
    }

    /// Use `file_name` as the output file name
    #[must_use]
    pub fn named(mut self, file_name: impl Into<String>) -> Self
    {
        self.file_name = Some(file_name.into());
        self
    }

    /// Default file name for `entry`: `<processName>_<pid>.dmp`
    #[must_use]
    pub fn default_file_name(entry: &ProcessEntry) -> String
    {
        format!("{}_{}.dmp", entry.process_name(), entry.pid)
    }

    /// Full output path for `entry`
    ///
    /// ## Errors
    ///
    /// - `Io`: no directory given and the current directory is unreadable
    pub fn resolve(&self, entry: &ProcessEntry) -> SnapResult<PathBuf>
    {
        let directory = match self.directory.as_ref().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let file_name = match self.file_name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => Self::default_file_name(entry),
        };
        Ok(directory.join(file_name))
    }
}

/// Result of a dump attempt
///
/// `success` is only true when a non-empty dump file exists at `file_path`.
/// On failure no file is left at `file_path`, and `failure` carries the
/// diagnostic that was logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpOutcome
{
    /// Whether a complete dump was written
    pub success: bool,
    /// Resolved output path (empty if the target never resolved)
    pub file_path: PathBuf,
    /// Why the dump failed
    pub failure: Option<String>,
}

impl DumpOutcome
{
    fn succeeded(file_path: PathBuf) -> Self
    {
        Self {
            success: true,
            file_path,
            failure: None,
        }
    }

    fn failed(file_path: PathBuf, err: &SnapError) -> Self
    {
        Self {
            success: false,
            file_path,
            failure: Some(err.to_string()),
        }
    }
}

/// The dump capability both strategies provide
pub trait MemoryDumper
{
    /// Dump `target` according to `output`
    fn dump(&self, target: &ProcessTarget, output: &OutputSpec) -> DumpOutcome;
}

/// Dump engine driving a [`DumpPlatform`]
///
/// `S` resolves targets (id or name) against the process table; `P` performs
/// the OS calls. The strategy is a tagged choice fixed at construction and can
/// be switched with [`DumpEngine::with_strategy`].
pub struct DumpEngine<S, P>
{
    system: S,
    platform: P,
    strategy: DumpStrategy,
}

impl<S, P> DumpEngine<S, P>
where
    S: ProcessSystem,
    P: DumpPlatform,
{
    /// Create an engine
    pub fn new(system: S, platform: P, strategy: DumpStrategy) -> Self
    {
        Self {
            system,
            platform,
            strategy,
        }
    }

    /// Same engine, different strategy
    #[must_use]
    pub fn with_strategy(mut self, strategy: DumpStrategy) -> Self
    {
        self.strategy = strategy;
        self
    }

    /// Selected strategy
    pub fn strategy(&self) -> DumpStrategy
    {
        self.strategy
    }

    /// The process system used to resolve targets
    pub fn system(&self) -> &S
    {
        &self.system
    }

    /// The platform primitives
    pub fn platform(&self) -> &P
    {
        &self.platform
    }

    /// Dump the live process
    pub fn dump_process(&self, target: &ProcessTarget, output: &OutputSpec) -> DumpOutcome
    {
        self.run(DumpStrategy::Direct, target, output)
    }

    /// Dump a point-in-time snapshot of the process
    pub fn dump_process_via_snapshot(&self, target: &ProcessTarget, output: &OutputSpec) -> DumpOutcome
    {
        self.run(DumpStrategy::Snapshot, target, output)
    }

    fn run(&self, strategy: DumpStrategy, target: &ProcessTarget, output: &OutputSpec) -> DumpOutcome
    {
        let span = info_span!("dump", %strategy, %target);
        let _enter = span.enter();

        let entry = match resolve_target(&self.system, target) {
            Ok(entry) => entry,
            Err(err) => {
                error!("cannot resolve dump target: {err}");
                return DumpOutcome::failed(PathBuf::new(), &err);
            }
        };
        let path = match output.resolve(&entry) {
            Ok(path) => path,
            Err(err) => {
                error!("cannot resolve dump path: {err}");
                return DumpOutcome::failed(PathBuf::new(), &err);
            }
        };

        let result = match strategy {
            DumpStrategy::Direct => self.direct(&entry, &path),
            DumpStrategy::Snapshot => self.via_snapshot(&entry, &path),
        };

        match result {
            Ok(path) => {
                info!(path = %path.display(), "dump written");
                DumpOutcome::succeeded(path)
            }
            Err(err) => {
                error!(path = %path.display(), "dump failed: {err}");
                DumpOutcome::failed(path, &err)
            }
        }
    }

    fn direct(&self, entry: &ProcessEntry, path: &Path) -> SnapResult<PathBuf>
    {
        let process = self.platform.open_process(entry.pid, DumpStrategy::Direct)?;
        let output = PartialOutput::create(path)?;
        self.platform.write_process_dump(&process, entry.pid, output.file())?;
        drop(process);
        output.commit(entry.pid)
    }

    fn via_snapshot(&self, entry: &ProcessEntry, path: &Path) -> SnapResult<PathBuf>
    {
        self.platform.ensure_snapshot_support()?;
        let process = self.platform.open_process(entry.pid, DumpStrategy::Snapshot)?;

        debug!("snapshot {} -> {}", SnapshotState::Idle, SnapshotState::Capturing);
        let snapshot = match self.platform.capture_snapshot(&process, entry.pid) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                debug!("snapshot {} -> {}", SnapshotState::Capturing, SnapshotState::Failed);
                return Err(err);
            }
        };
        let mut lease = SnapshotLease::new(&self.platform, snapshot);
        // The clone no longer needs the original handle
        drop(process);

        let output = PartialOutput::create(path)?;

        lease.advance(SnapshotState::Dumping);
        let written = self.platform.write_snapshot_dump(lease.snapshot(), entry.pid, output.file());
        lease.advance(if written.is_ok() {
            SnapshotState::Dumped
        } else {
            SnapshotState::DumpFailed
        });

        let state = lease.release();
        if state != SnapshotState::Released {
            warn!(%state, "snapshot lease ended outside the released state");
        }

        written?;
        output.commit(entry.pid)
    }
}

impl<S, P> MemoryDumper for DumpEngine<S, P>
where
    S: ProcessSystem,
    P: DumpPlatform,
{
    fn dump(&self, target: &ProcessTarget, output: &OutputSpec) -> DumpOutcome
    {
        self.run(self.strategy, target, output)
    }
}
