//! # Error Types
//!
//! General error handling for process inspection and dumping.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Most of the public surface never returns these directly: enumeration
//! degrades per-row failures to defaults and dumps fold failures into a
//! [`DumpOutcome`](crate::dump::DumpOutcome). The errors travel between the
//! platform layer and the components, where they are logged and translated.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ProcessId;

/// Main error type for memsnap operations
///
/// ## Error Categories
///
/// 1. **Target errors**: ProcessNotFound, ProcessNameNotFound
/// 2. **Permission errors**: PermissionDenied
/// 3. **Output errors**: OutputFile
/// 4. **Snapshot errors**: SnapshotUnavailable, SnapshotFailed
/// 5. **Dump errors**: DumpFailed
/// 6. **Platform errors**: Win32 (Windows-specific), UnsupportedPlatform
/// 7. **I/O errors**: Io
#[derive(Error, Debug)]
pub enum SnapError
{
    /// No process with the given PID exists (or it exited before we got to it)
    #[error("Process not found: PID {0}")]
    ProcessNotFound(u32),

    /// No process matched the requested image name
    ///
    /// The name is stored as the caller typed it, before `.exe` stripping.
    #[error("Process not found: no process named '{0}'")]
    ProcessNameNotFound(String),

    /// Insufficient rights to open the process, its token, or its memory
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid argument passed to a memsnap function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The dump file could not be created
    #[error("Cannot create output file {}: {source}", path.display())]
    OutputFile
    {
        /// Resolved output path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Process Snapshotting is not available on this system
    ///
    /// `PssCaptureSnapshot` and friends ship with Windows 8.1 / Server 2012 R2.
    /// On older systems the entry points are missing from kernel32 and the
    /// snapshot strategy fails before touching the target.
    #[error("Process snapshots unavailable: {0}")]
    SnapshotUnavailable(String),

    /// Capturing or querying a snapshot failed
    #[error("Snapshot of PID {pid} failed: {details}")]
    SnapshotFailed
    {
        /// Target process
        pid: ProcessId,
        /// Additional error details
        details: String,
    },

    /// The minidump primitive rejected the request
    #[error("Dump of PID {pid} failed: {details}")]
    DumpFailed
    {
        /// Target process
        pid: ProcessId,
        /// Additional error details
        details: String,
    },

    /// The operation needs a platform this build does not support
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Windows-specific Win32 / NTSTATUS error
    ///
    /// Keeps the raw code so it can be looked up.
    #[cfg(windows)]
    #[error("Win32 error: {0}")]
    Win32(#[from] crate::platform::windows::error::Win32Error),

    /// I/O error (for file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, SnapError>`
///
/// ```rust
/// use memsnap_core::error::SnapResult;
/// fn foo() -> SnapResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type SnapResult<T> = std::result::Result<T, SnapError>;

/// Failure of a single low-level process information query
///
/// Returned by [`ProcessInfoSource`](crate::resolver::ProcessInfoSource) so the
/// callers can decide which sentinel to substitute.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError
{
    /// The process could not be opened with the access the query needs
    #[error("cannot open process {pid}: {details}")]
    OpenFailed
    {
        /// Target process
        pid: ProcessId,
        /// Platform error description
        details: String,
    },

    /// The process was opened but the query itself failed
    #[error("query on process {pid} failed with status 0x{status:08x}")]
    QueryFailed
    {
        /// Target process
        pid: ProcessId,
        /// Raw NTSTATUS / Win32 code
        status: u32,
    },

    /// The query is not implemented for this platform
    #[error("process queries are not supported on this platform")]
    Unsupported,
}
