//! Owned process handles.

use std::os::windows::io::{AsRawHandle, FromRawHandle, OwnedHandle};

use windows_sys::Win32::Foundation::{HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::System::Threading::{OpenProcess, PROCESS_ACCESS_RIGHTS};

use super::error::Win32Error;
use crate::error::SnapError;
use crate::types::ProcessId;

/// Open `pid` with `access`
///
/// ## Errors
///
/// The last Win32 error; `InvalidParameter` means no such process.
pub fn open_process(pid: ProcessId, access: PROCESS_ACCESS_RIGHTS) -> Result<OwnedHandle, Win32Error>
{
    // SAFETY: OpenProcess has no pointer arguments
    let raw = unsafe { OpenProcess(access, 0, pid.raw()) };
    if raw.is_null() {
        return Err(Win32Error::last());
    }
    // SAFETY: the handle is valid and nothing else owns it
    Ok(unsafe { OwnedHandle::from_raw_handle(raw.cast()) })
}

/// Take ownership of a handle returned by an API that signals failure with
/// `INVALID_HANDLE_VALUE`
///
/// ## Errors
///
/// The last Win32 error when `raw` is invalid or null.
pub fn own(raw: HANDLE) -> Result<OwnedHandle, Win32Error>
{
    if raw.is_null() || raw == INVALID_HANDLE_VALUE {
        return Err(Win32Error::last());
    }
    // SAFETY: the handle is valid and the caller hands it over
    Ok(unsafe { OwnedHandle::from_raw_handle(raw.cast()) })
}

/// Raw handle for passing to Win32
pub fn raw(handle: &OwnedHandle) -> HANDLE
{
    handle.as_raw_handle().cast()
}

/// Translate an `OpenProcess` failure for `pid` into the caller-facing error
pub fn open_error(pid: ProcessId, err: Win32Error) -> SnapError
{
    match err {
        Win32Error::InvalidParameter => SnapError::ProcessNotFound(pid.raw()),
        Win32Error::AccessDenied => SnapError::PermissionDenied(format!(
            "cannot open process {pid}; dumping protected or other users' processes needs an elevated caller"
        )),
        other => SnapError::Win32(other),
    }
}
