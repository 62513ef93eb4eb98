//! # Win32 Errors
//!
//! Error type for Win32 and native (`NTSTATUS`) calls.
//!
//! Win32 calls report failure through `GetLastError()`; ntdll calls return an
//! `NTSTATUS`. Both are folded into [`Win32Error`] so a raw code survives up to
//! the log line.

use thiserror::Error;
use windows_sys::Win32::Foundation::{
    GetLastError, ERROR_ACCESS_DENIED, ERROR_INSUFFICIENT_BUFFER, ERROR_INVALID_PARAMETER, ERROR_PROC_NOT_FOUND,
};

/// Win32 / native API error
///
/// Common values:
///
/// - `ERROR_ACCESS_DENIED` (5): the caller lacks the requested access
/// - `ERROR_INVALID_PARAMETER` (87): usually a PID that does not exist
/// - `ERROR_INSUFFICIENT_BUFFER` (122): retry with a larger buffer
/// - `ERROR_PROC_NOT_FOUND` (127): an entry point is missing from a DLL
///
/// ## References
///
/// - [System Error Codes](https://learn.microsoft.com/en-us/windows/win32/debug/system-error-codes)
/// - [NTSTATUS Values](https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-erref/596a1078-e883-4972-9bbc-49e60bebca55)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Win32Error
{
    /// `ERROR_ACCESS_DENIED` (5)
    #[error("ERROR_ACCESS_DENIED: Access is denied")]
    AccessDenied,

    /// `ERROR_INVALID_PARAMETER` (87)
    ///
    /// `OpenProcess` returns this for a PID that is not (or no longer) running.
    #[error("ERROR_INVALID_PARAMETER: The parameter is incorrect")]
    InvalidParameter,

    /// `ERROR_INSUFFICIENT_BUFFER` (122)
    #[error("ERROR_INSUFFICIENT_BUFFER: The data area passed is too small")]
    InsufficientBuffer,

    /// `ERROR_PROC_NOT_FOUND` (127)
    #[error("ERROR_PROC_NOT_FOUND: The specified procedure could not be found")]
    ProcNotFound,

    /// Failed `NTSTATUS` from an ntdll call
    #[error("NTSTATUS 0x{0:08x}")]
    NtStatus(u32),

    /// Any other Win32 error code
    ///
    /// The value is preserved so you can look it up.
    #[error("Win32 error {0}")]
    Other(u32),
}

impl Win32Error
{
    /// The calling thread's last error
    pub fn last() -> Self
    {
        // SAFETY: GetLastError has no preconditions
        Self::from(unsafe { GetLastError() })
    }

    /// Wrap a failed `NTSTATUS`
    #[must_use]
    pub fn nt_status(status: i32) -> Self
    {
        Self::NtStatus(status as u32)
    }

    /// Raw error code
    #[must_use]
    pub fn code(self) -> u32
    {
        match self {
            Win32Error::AccessDenied => ERROR_ACCESS_DENIED,
            Win32Error::InvalidParameter => ERROR_INVALID_PARAMETER,
            Win32Error::InsufficientBuffer => ERROR_INSUFFICIENT_BUFFER,
            Win32Error::ProcNotFound => ERROR_PROC_NOT_FOUND,
            Win32Error::NtStatus(code) | Win32Error::Other(code) => code,
        }
    }
}

impl From<u32> for Win32Error
{
    fn from(code: u32) -> Self
    {
        match code {
            ERROR_ACCESS_DENIED => Win32Error::AccessDenied,
            ERROR_INVALID_PARAMETER => Win32Error::InvalidParameter,
            ERROR_INSUFFICIENT_BUFFER => Win32Error::InsufficientBuffer,
            ERROR_PROC_NOT_FOUND => Win32Error::ProcNotFound,
            _ => Win32Error::Other(code),
        }
    }
}
