//! # Native API Declarations
//!
//! Structures and function types for the entry points `windows-sys` does not
//! cover, plus the helpers that resolve them at runtime:
//!
//! - `ntdll!NtQueryInformationProcess` (basic process information)
//! - `dbghelp!MiniDumpWriteDump` and its callback structures
//! - `kernel32!PssCaptureSnapshot`, `PssQuerySnapshot`, `PssFreeSnapshot`
//!
//! Everything here is resolved with `GetProcAddress` rather than linked: the
//! Process Snapshotting functions are missing on systems older than
//! Windows 8.1, and dbghelp is loaded on demand from System32. A missing entry
//! point turns into `None` instead of a loader failure at startup.
//!
//! These functions are wrapped in safe abstractions in [`system`](super::system)
//! and [`dump`](super::dump).
//!
//! ## References
//!
//! - [NtQueryInformationProcess](https://learn.microsoft.com/en-us/windows/win32/api/winternl/nf-winternl-ntqueryinformationprocess)
//! - [MiniDumpWriteDump](https://learn.microsoft.com/en-us/windows/win32/api/minidumpapiset/nf-minidumpapiset-minidumpwritedump)
//! - [Process Snapshotting](https://learn.microsoft.com/en-us/previous-versions/windows/desktop/proc_snap/process-snapshotting-portal)

use std::ffi::{c_void, CStr};
use std::ptr;

use windows_sys::Win32::Foundation::{BOOL, HANDLE, HMODULE};
use windows_sys::Win32::System::LibraryLoader::{
    GetModuleHandleW, GetProcAddress, LoadLibraryExW, LOAD_LIBRARY_SEARCH_SYSTEM32,
};

/// `ProcessBasicInformation` class for `NtQueryInformationProcess`
pub const PROCESS_BASIC_INFORMATION_CLASS: u32 = 0;

/// `MiniDumpWithFullMemory`
pub const MINIDUMP_WITH_FULL_MEMORY: u32 = 0x0000_0002;

/// `IsProcessSnapshotCallback` from `MINIDUMP_CALLBACK_TYPE`
pub const IS_PROCESS_SNAPSHOT_CALLBACK: u32 = 16;

/// `S_FALSE`
///
/// Answering `IsProcessSnapshotCallback` with it tells dbghelp the handle it
/// was given is an `HPSS`, not a process handle.
pub const S_FALSE: i32 = 1;

/// `PROCESS_BASIC_INFORMATION`
///
/// Only `inherited_from_unique_process_id` is read. The layout follows
/// `winternl.h`, where most fields are marked reserved.
#[repr(C)]
#[derive(Debug)]
pub struct ProcessBasicInformation
{
    /// Exit status (`STATUS_PENDING` while running)
    pub exit_status: i32,
    /// Address of the PEB in the target
    pub peb_base_address: *mut c_void,
    /// Processor affinity
    pub affinity_mask: usize,
    /// Base scheduling priority
    pub base_priority: i32,
    /// PID of the process itself
    pub unique_process_id: usize,
    /// PID of the creating process
    pub inherited_from_unique_process_id: usize,
}

impl Default for ProcessBasicInformation
{
    fn default() -> Self
    {
        Self {
            exit_status: 0,
            peb_base_address: ptr::null_mut(),
            affinity_mask: 0,
            base_priority: 0,
            unique_process_id: 0,
            inherited_from_unique_process_id: 0,
        }
    }
}

/// Header of `MINIDUMP_CALLBACK_INPUT`
///
/// The real structure continues with a union that depends on `callback_type`;
/// we never read it, and dbghelp owns the memory, so only the header is
/// declared. `dbghelp.h` packs the minidump structures to 4 bytes.
#[repr(C, packed(4))]
pub struct MinidumpCallbackInput
{
    /// Target PID
    pub process_id: u32,
    /// Handle passed to `MiniDumpWriteDump`
    pub process_handle: HANDLE,
    /// `MINIDUMP_CALLBACK_TYPE`
    pub callback_type: u32,
}

/// Leading `Status` member of `MINIDUMP_CALLBACK_OUTPUT`
#[repr(C)]
pub struct MinidumpCallbackOutput
{
    /// `HRESULT` answer for status-style callbacks
    pub status: i32,
}

/// `MINIDUMP_CALLBACK_ROUTINE`
pub type MinidumpCallbackRoutine = unsafe extern "system" fn(
    param: *mut c_void,
    input: *const MinidumpCallbackInput,
    output: *mut MinidumpCallbackOutput,
) -> BOOL;

/// `MINIDUMP_CALLBACK_INFORMATION`
#[repr(C, packed(4))]
pub struct MinidumpCallbackInformation
{
    /// Routine called during the dump
    pub callback_routine: Option<MinidumpCallbackRoutine>,
    /// Passed back as `param`
    pub callback_param: *mut c_void,
}

/// `NtQueryInformationProcess`
pub type NtQueryInformationProcessFn = unsafe extern "system" fn(
    process: HANDLE,
    information_class: u32,
    information: *mut c_void,
    information_length: u32,
    return_length: *mut u32,
) -> i32;

/// `MiniDumpWriteDump`
pub type MiniDumpWriteDumpFn = unsafe extern "system" fn(
    process: HANDLE,
    process_id: u32,
    file: HANDLE,
    dump_type: u32,
    exception_param: *const c_void,
    user_stream_param: *const c_void,
    callback_param: *const MinidumpCallbackInformation,
) -> BOOL;

/// `HPSS`
pub type Hpss = *mut c_void;

/// `PssCaptureSnapshot`
pub type PssCaptureSnapshotFn =
    unsafe extern "system" fn(process: HANDLE, capture_flags: u32, thread_context_flags: u32, snapshot: *mut Hpss) -> u32;

/// `PssQuerySnapshot`
pub type PssQuerySnapshotFn =
    unsafe extern "system" fn(snapshot: Hpss, information_class: u32, buffer: *mut c_void, buffer_length: u32) -> u32;

/// `PssFreeSnapshot`
pub type PssFreeSnapshotFn = unsafe extern "system" fn(process: HANDLE, snapshot: Hpss) -> u32;

/// `PSS_VA_CLONE_INFORMATION`
#[repr(C)]
pub struct PssVaCloneInformation
{
    /// Handle to the clone process; owned by the caller
    pub va_clone_handle: HANDLE,
}

/// NUL-terminated UTF-16 copy of `s`
pub fn wide(s: &str) -> Vec<u16>
{
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Handle of an already loaded module, or `None`
pub fn loaded_module(name: &str) -> Option<HMODULE>
{
    let name = wide(name);
    // SAFETY: `name` is NUL-terminated and outlives the call
    let module = unsafe { GetModuleHandleW(name.as_ptr()) };
    (!module.is_null()).then_some(module)
}

/// Load `name` from the System32 directory only, or `None`
///
/// The application directory, the current directory and `PATH` are never
/// searched. The module stays loaded for the life of the process.
pub fn load_system_module(name: &str) -> Option<HMODULE>
{
    let name = wide(name);
    // SAFETY: `name` is NUL-terminated and outlives the call; no file handle is passed
    let module = unsafe { LoadLibraryExW(name.as_ptr(), ptr::null_mut(), LOAD_LIBRARY_SEARCH_SYSTEM32) };
    (!module.is_null()).then_some(module)
}

/// Raw address of `symbol` in `module`
pub fn symbol(module: HMODULE, symbol: &CStr) -> Option<unsafe extern "system" fn() -> isize>
{
    // SAFETY: `module` is a loaded module handle and `symbol` is NUL-terminated
    unsafe { GetProcAddress(module, symbol.as_ptr().cast()) }
}

/// Resolve `symbol` in `module` and reinterpret it as `F`
///
/// ## Safety
///
/// `F` must be an `extern "system"` function pointer type matching the real
/// signature of `symbol`.
pub unsafe fn resolve<F: Copy>(module: HMODULE, name: &CStr) -> Option<F>
{
    debug_assert_eq!(
        std::mem::size_of::<F>(),
        std::mem::size_of::<unsafe extern "system" fn() -> isize>()
    );
    // SAFETY: the caller guarantees `F` is the matching function pointer type
    symbol(module, name).map(|address| unsafe { std::mem::transmute_copy(&address) })
}
