//! # Windows Platform
//!
//! Native implementations of the process system and the dump primitives.
//!
//! - [`system`]: Toolhelp process table, `NtQueryInformationProcess`, token
//!   owner lookup, WOW64 detection
//! - [`dump`]: `MiniDumpWriteDump` against a live process or a snapshot
//! - [`ffi`]: entry points resolved at runtime
//! - [`handle`]: owned process handles and `OpenProcess` error mapping
//! - [`error`]: Win32 / NTSTATUS error codes

pub mod dump;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod system;

pub use dump::WindowsDumpPlatform;
pub use error::Win32Error;
pub use system::WindowsSystem;
