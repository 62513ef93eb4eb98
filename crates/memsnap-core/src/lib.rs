//! # memsnap-core
//!
//! Process enumeration and full-memory dumps for memsnap.
//!
//! This crate provides:
//! - Machine and per-process architecture classification ([`probe`])
//! - Parent process and owner account resolution ([`resolver`])
//! - Best-effort process listing and target resolution ([`enumerator`])
//! - Direct and snapshot-based minidump capture ([`dump`])
//!
//! ## Platform Support
//!
//! - **Windows**: Uses Win32 (`Toolhelp32`, tokens, `dbghelp`), the native
//!   `NtQueryInformationProcess` query, and Process Snapshotting (`Pss*`)
//! - **Other platforms**: The portable layer builds; [`platform::native_system`]
//!   and [`platform::native_dump_platform`] report `UnsupportedPlatform`
//!
//! ## Why unsafe code is needed
//!
//! The Windows layer calls kernel32, advapi32, ntdll and dbghelp directly.
//! Every call site is wrapped in a safe function and every handle it returns is
//! owned by an RAII type, so nothing above `platform` touches raw handles.

#![allow(unsafe_code)] // Required for Win32 / ntdll / dbghelp FFI

pub mod dump;
pub mod enumerator;
pub mod error;
pub mod platform;
pub mod prelude;
pub mod probe;
pub mod resolver;
pub mod types;

pub use dump::{DumpEngine, DumpOutcome, DumpStrategy, MemoryDumper, OutputSpec};
pub use enumerator::{list_processes, resolve_target, ProcessSystem};
// Re-export commonly used types
pub use error::{SnapError, SnapResult};
pub use types::{MachineArchitecture, ProcessEntry, ProcessId, ProcessRecord, ProcessTarget, Table, TabularRecord};
