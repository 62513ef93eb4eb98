//! # Windows Dump Primitives
//!
//! `MiniDumpWriteDump` against a live process or a Process Snapshotting clone.
//!
//! ## Snapshot dumps
//!
//! `PssCaptureSnapshot` with `VA_CLONE` creates a copy-on-write clone of the
//! target's address space. The snapshot handle (`HPSS`) is then passed to
//! `MiniDumpWriteDump` in place of a process handle, and the dump callback
//! answers `IsProcessSnapshotCallback` with `S_FALSE` so dbghelp reads the
//! snapshot. Afterwards the clone process is queried from the snapshot, the
//! snapshot is freed, and the clone handle closed.
//!
//! ## References
//!
//! - [Using PSS_CAPTURE_FLAGS with MiniDumpWriteDump](https://learn.microsoft.com/en-us/previous-versions/windows/desktop/proc_snap/export-a-process-snapshot-to-a-file)

use std::ffi::c_void;
use std::fs::File;
use std::marker::PhantomData;
use std::mem::size_of;
use std::os::windows::io::{AsRawHandle, OwnedHandle};
use std::ptr;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, trace};
use windows_sys::Win32::Foundation::{BOOL, HANDLE, TRUE};
use windows_sys::Win32::System::Threading::{
    GetCurrentProcess, GetProcessId, PROCESS_ACCESS_RIGHTS, PROCESS_CREATE_PROCESS, PROCESS_DUP_HANDLE,
    PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

use super::error::Win32Error;
use super::ffi::{
    self, Hpss, MiniDumpWriteDumpFn, MinidumpCallbackInformation, MinidumpCallbackInput, MinidumpCallbackOutput,
    PssCaptureSnapshotFn, PssFreeSnapshotFn, PssQuerySnapshotFn, PssVaCloneInformation, IS_PROCESS_SNAPSHOT_CALLBACK,
    MINIDUMP_WITH_FULL_MEMORY, S_FALSE,
};
use super::handle;
use crate::dump::{DumpPlatform, DumpStrategy};
use crate::error::{SnapError, SnapResult};
use crate::platform::pss::{CaptureFlags, QUERY_VA_CLONE_INFORMATION, THREAD_CONTEXT_ALL};
use crate::types::ProcessId;

/// Access needed to dump a live process
const DIRECT_ACCESS: PROCESS_ACCESS_RIGHTS = PROCESS_QUERY_INFORMATION | PROCESS_VM_READ;

/// Access needed to capture a clone of a process
const SNAPSHOT_ACCESS: PROCESS_ACCESS_RIGHTS =
    PROCESS_QUERY_INFORMATION | PROCESS_VM_READ | PROCESS_DUP_HANDLE | PROCESS_CREATE_PROCESS;

/// The three Process Snapshotting entry points we use
#[derive(Debug, Clone, Copy)]
struct PssApi
{
    capture: PssCaptureSnapshotFn,
    query: PssQuerySnapshotFn,
    free: PssFreeSnapshotFn,
}

impl PssApi
{
    fn resolve() -> Option<Self>
    {
        let kernel32 = ffi::loaded_module("kernel32.dll")?;
        // SAFETY: each type alias matches the documented export signature
        unsafe {
            Some(Self {
                capture: ffi::resolve(kernel32, c"PssCaptureSnapshot")?,
                query: ffi::resolve(kernel32, c"PssQuerySnapshot")?,
                free: ffi::resolve(kernel32, c"PssFreeSnapshot")?,
            })
        }
    }
}

/// A captured snapshot (`HPSS`)
///
/// Given back to the platform with [`DumpPlatform::free_snapshot`]; it does
/// not free itself.
#[derive(Debug)]
pub struct Snapshot
{
    hpss: Hpss,
}

/// Windows implementation of [`DumpPlatform`]
///
/// Entry points are resolved once at construction. dbghelp stays loaded for the
/// life of the process.
#[derive(Debug)]
pub struct WindowsDumpPlatform
{
    write_dump: Option<MiniDumpWriteDumpFn>,
    pss: Option<PssApi>,
}

impl Default for WindowsDumpPlatform
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl WindowsDumpPlatform
{
    /// Load dbghelp from System32 and resolve the dump and snapshot entry points
    pub fn new() -> Self
    {
        // SAFETY: MiniDumpWriteDumpFn matches the documented export signature
        let write_dump: Option<MiniDumpWriteDumpFn> = ffi::load_system_module("dbghelp.dll")
            .and_then(|dbghelp| unsafe { ffi::resolve(dbghelp, c"MiniDumpWriteDump") });
        let pss = PssApi::resolve();
        debug!(
            minidump = write_dump.is_some(),
            snapshots = pss.is_some(),
            "resolved dump entry points"
        );
        Self { write_dump, pss }
    }

    fn write_dump(&self, pid: ProcessId) -> SnapResult<MiniDumpWriteDumpFn>
    {
        self.write_dump.ok_or_else(|| SnapError::DumpFailed {
            pid,
            details: "MiniDumpWriteDump is not available (dbghelp.dll missing)".to_string(),
        })
    }

    fn pss(&self) -> SnapResult<PssApi>
    {
        self.pss.ok_or_else(|| {
            SnapError::SnapshotUnavailable(
                "kernel32.dll does not export PssCaptureSnapshot (Windows 8.1 or later required)".to_string(),
            )
        })
    }
}

/// Dump callback for snapshot dumps
///
/// `param` points at the caller's callback counter.
unsafe extern "system" fn snapshot_callback(
    param: *mut c_void,
    input: *const MinidumpCallbackInput,
    output: *mut MinidumpCallbackOutput,
) -> BOOL
{
    if !param.is_null() {
        // SAFETY: `param` is the AtomicU32 borrowed for the duration of the dump
        unsafe { (*param.cast::<AtomicU32>()).fetch_add(1, Ordering::Relaxed) };
    }
    if input.is_null() || output.is_null() {
        return TRUE;
    }
    // SAFETY: dbghelp passes a valid input; the field may be unaligned
    let callback_type = unsafe { ptr::addr_of!((*input).callback_type).read_unaligned() };
    if callback_type == IS_PROCESS_SNAPSHOT_CALLBACK {
        // SAFETY: dbghelp passes a valid output for this callback type
        unsafe { (*output).status = S_FALSE };
    }
    TRUE
}

/// Callback record handed to one `MiniDumpWriteDump` call
///
/// dbghelp keeps the `callback_param` pointer for the whole call, so the
/// counter it points at is borrowed for `'a` and the record cannot outlive it.
struct PinnedCallback<'a>
{
    info: MinidumpCallbackInformation,
    _calls: PhantomData<&'a AtomicU32>,
}

impl<'a> PinnedCallback<'a>
{
    fn new(calls: &'a AtomicU32) -> Self
    {
        Self {
            info: MinidumpCallbackInformation {
                callback_routine: Some(snapshot_callback),
                callback_param: ptr::from_ref(calls).cast_mut().cast(),
            },
            _calls: PhantomData,
        }
    }

    fn as_ptr(&self) -> *const MinidumpCallbackInformation
    {
        &self.info
    }
}

fn file_handle(file: &File) -> HANDLE
{
    file.as_raw_handle().cast()
}

impl DumpPlatform for WindowsDumpPlatform
{
    type Process = OwnedHandle;
    type Snapshot = Snapshot;
    type CloneProcess = OwnedHandle;

    fn ensure_snapshot_support(&self) -> SnapResult<()>
    {
        self.pss().map(|_| ())
    }

    fn open_process(&self, pid: ProcessId, strategy: DumpStrategy) -> SnapResult<OwnedHandle>
    {
        let access = match strategy {
            DumpStrategy::Direct => DIRECT_ACCESS,
            DumpStrategy::Snapshot => SNAPSHOT_ACCESS,
        };
        handle::open_process(pid, access).map_err(|err| handle::open_error(pid, err))
    }

    fn write_process_dump(&self, process: &OwnedHandle, pid: ProcessId, file: &File) -> SnapResult<()>
    {
        let write = self.write_dump(pid)?;
        // SAFETY: both handles are open; the optional parameters are null
        let ok = unsafe {
            write(
                handle::raw(process),
                pid.raw(),
                file_handle(file),
                MINIDUMP_WITH_FULL_MEMORY,
                ptr::null(),
                ptr::null(),
                ptr::null(),
            )
        };
        if ok == 0 {
            return Err(SnapError::DumpFailed {
                pid,
                details: format!("MiniDumpWriteDump: {}", Win32Error::last()),
            });
        }
        Ok(())
    }

    fn capture_snapshot(&self, process: &OwnedHandle, pid: ProcessId) -> SnapResult<Snapshot>
    {
        let pss = self.pss()?;
        let flags = CaptureFlags::for_dump();
        let mut hpss: Hpss = ptr::null_mut();
        // SAFETY: the process handle carries the access the capture needs
        let status = unsafe { (pss.capture)(handle::raw(process), flags.bits(), THREAD_CONTEXT_ALL, &mut hpss) };
        if status != 0 {
            return Err(SnapError::SnapshotFailed {
                pid,
                details: format!("PssCaptureSnapshot: {}", Win32Error::from(status)),
            });
        }
        debug!(%pid, flags = format_args!("{:#x}", flags.bits()), "captured snapshot");
        Ok(Snapshot { hpss })
    }

    fn write_snapshot_dump(&self, snapshot: &Snapshot, pid: ProcessId, file: &File) -> SnapResult<()>
    {
        let write = self.write_dump(pid)?;
        let callbacks = AtomicU32::new(0);
        let callback = PinnedCallback::new(&callbacks);
        // SAFETY: `hpss` is live until freed by the lease, and `callback`
        // borrows its counter across the call
        let ok = unsafe {
            write(
                snapshot.hpss,
                pid.raw(),
                file_handle(file),
                MINIDUMP_WITH_FULL_MEMORY,
                ptr::null(),
                ptr::null(),
                callback.as_ptr(),
            )
        };
        drop(callback);
        trace!(callbacks = callbacks.load(Ordering::Relaxed), "dump callbacks");
        if ok == 0 {
            return Err(SnapError::DumpFailed {
                pid,
                details: format!("MiniDumpWriteDump on snapshot: {}", Win32Error::last()),
            });
        }
        Ok(())
    }

    fn query_clone(&self, snapshot: &Snapshot) -> SnapResult<OwnedHandle>
    {
        let pss = self.pss()?;
        let mut info = PssVaCloneInformation {
            va_clone_handle: ptr::null_mut(),
        };
        // SAFETY: `info` matches the VA clone information class
        let status = unsafe {
            (pss.query)(
                snapshot.hpss,
                QUERY_VA_CLONE_INFORMATION,
                ptr::from_mut(&mut info).cast(),
                size_of::<PssVaCloneInformation>() as u32,
            )
        };
        if status != 0 {
            return Err(Win32Error::from(status).into());
        }
        Ok(handle::own(info.va_clone_handle)?)
    }

    fn clone_process_id(&self, clone: &OwnedHandle) -> Option<ProcessId>
    {
        // SAFETY: the clone handle is open
        let pid = unsafe { GetProcessId(handle::raw(clone)) };
        (pid != 0).then_some(ProcessId(pid))
    }

    fn free_snapshot(&self, snapshot: Snapshot) -> SnapResult<()>
    {
        let pss = self.pss()?;
        // SAFETY: `snapshot` came from PssCaptureSnapshot and is freed only here
        let status = unsafe { (pss.free)(GetCurrentProcess(), snapshot.hpss) };
        if status != 0 {
            return Err(Win32Error::from(status).into());
        }
        Ok(())
    }

    fn close_clone(&self, clone: OwnedHandle)
    {
        trace!("closing snapshot clone process");
        drop(clone);
    }
}
