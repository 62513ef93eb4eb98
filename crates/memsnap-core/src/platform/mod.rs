//! # Platform-Specific Implementations
//!
//! The components above this module are written against traits
//! ([`ProcessSystem`], [`DumpPlatform`]); this module provides the native
//! implementations of those traits.
//!
//! - **Windows**: Win32, ntdll, dbghelp and Process Snapshotting
//!   - See: [Process Snapshotting](https://learn.microsoft.com/en-us/previous-versions/windows/desktop/proc_snap/process-snapshotting-portal)
//!   - See: [MiniDumpWriteDump](https://learn.microsoft.com/en-us/windows/win32/api/minidumpapiset/nf-minidumpapiset-minidumpwritedump)
//! - **Everything else**: [`unsupported`] provides uninhabited types so the
//!   crate still builds; the constructors below return `UnsupportedPlatform`
//!
//! [`ProcessSystem`]: crate::enumerator::ProcessSystem
//! [`DumpPlatform`]: crate::dump::DumpPlatform

pub mod pss;

#[cfg(windows)]
pub mod windows;

#[cfg(not(windows))]
pub mod unsupported;

use crate::error::SnapResult;

/// Process system of the running platform
#[cfg(windows)]
pub type NativeSystem = windows::WindowsSystem;
/// Process system of the running platform
#[cfg(not(windows))]
pub type NativeSystem = unsupported::Unsupported;

/// Dump primitives of the running platform
#[cfg(windows)]
pub type NativeDumpPlatform = windows::WindowsDumpPlatform;
/// Dump primitives of the running platform
#[cfg(not(windows))]
pub type NativeDumpPlatform = unsupported::Unsupported;

/// Create the process system for the running platform
///
/// ## Errors
///
/// - `UnsupportedPlatform` on anything but Windows
///
/// ## Platform Support
///
/// - ✅ Windows: Returns `WindowsSystem`
/// - ❌ Others: `UnsupportedPlatform`
pub fn native_system() -> SnapResult<NativeSystem>
{
    #[cfg(windows)]
    {
        Ok(windows::WindowsSystem::new())
    }

    #[cfg(not(windows))]
    {
        Err(unsupported::unsupported())
    }
}

/// Create the dump primitives for the running platform
///
/// On Windows this resolves the dbghelp and Process Snapshotting entry points
/// once; missing ones are reported when a dump needs them.
///
/// ## Errors
///
/// - `UnsupportedPlatform` on anything but Windows
pub fn native_dump_platform() -> SnapResult<NativeDumpPlatform>
{
    #[cfg(windows)]
    {
        Ok(windows::WindowsDumpPlatform::new())
    }

    #[cfg(not(windows))]
    {
        Err(unsupported::unsupported())
    }
}
