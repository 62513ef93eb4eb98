//! # Windows Process System
//!
//! Process table, architecture, parent, owner, session and image path queries.
//!
//! Every query opens its own short-lived handle with
//! `PROCESS_QUERY_LIMITED_INFORMATION`, the weakest right that answers it, so a
//! listing can describe protected processes as far as Windows allows.

use std::ffi::c_void;
use std::mem::{size_of, zeroed};
use std::os::windows::io::OwnedHandle;
use std::ptr;

use tracing::{debug, trace};
use windows_sys::Win32::Foundation::{ERROR_NO_MORE_FILES, FILETIME, HANDLE};
use windows_sys::Win32::Security::{GetTokenInformation, LookupAccountSidW, TokenUser, TOKEN_QUERY, TOKEN_USER};
use windows_sys::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W, TH32CS_SNAPPROCESS,
};
use windows_sys::Win32::System::RemoteDesktop::ProcessIdToSessionId;
use windows_sys::Win32::System::SystemInformation::{GetNativeSystemInfo, SYSTEM_INFO};
use windows_sys::Win32::System::Threading::{
    GetProcessTimes, IsWow64Process, OpenProcessToken, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};

use super::error::Win32Error;
use super::ffi::{self, NtQueryInformationProcessFn, ProcessBasicInformation, PROCESS_BASIC_INFORMATION_CLASS};
use super::handle;
use crate::enumerator::ProcessSystem;
use crate::error::{QueryError, SnapResult};
use crate::probe::{ArchitectureProbe, MemoizedArchitecture};
use crate::resolver::{format_account, ProcessInfoSource};
use crate::types::{MachineArchitecture, ProcessEntry, ProcessId};

/// Windows implementation of [`ProcessSystem`]
///
/// The machine architecture is queried once per instance.
#[derive(Debug)]
pub struct WindowsSystem
{
    architecture: MemoizedArchitecture,
    nt_query_information_process: Option<NtQueryInformationProcessFn>,
}

impl Default for WindowsSystem
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl WindowsSystem
{
    /// Create a process system, resolving the ntdll query entry point
    pub fn new() -> Self
    {
        // SAFETY: NtQueryInformationProcessFn matches the exported signature
        let nt_query_information_process: Option<NtQueryInformationProcessFn> = ffi::loaded_module("ntdll.dll")
            .and_then(|ntdll| unsafe { ffi::resolve(ntdll, c"NtQueryInformationProcess") });
        if nt_query_information_process.is_none() {
            debug!("NtQueryInformationProcess unavailable; parent PIDs will read as 0");
        }
        Self {
            architecture: MemoizedArchitecture::new(),
            nt_query_information_process,
        }
    }

    fn open_for_query(pid: ProcessId) -> Result<OwnedHandle, QueryError>
    {
        handle::open_process(pid, PROCESS_QUERY_LIMITED_INFORMATION).map_err(|err| QueryError::OpenFailed {
            pid,
            details: err.to_string(),
        })
    }

    /// Creation time as a `FILETIME` tick count
    fn query_creation_time(pid: ProcessId) -> Option<u64>
    {
        let process = Self::open_for_query(pid).ok()?;
        // SAFETY: FILETIME is plain data
        let (mut created, mut exited, mut kernel, mut user): (FILETIME, FILETIME, FILETIME, FILETIME) =
            unsafe { (zeroed(), zeroed(), zeroed(), zeroed()) };
        // SAFETY: all four out-pointers are valid for writes
        let ok = unsafe { GetProcessTimes(handle::raw(&process), &mut created, &mut exited, &mut kernel, &mut user) };
        (ok != 0).then(|| (u64::from(created.dwHighDateTime) << 32) | u64::from(created.dwLowDateTime))
    }

    fn query_native_architecture() -> MachineArchitecture
    {
        // SAFETY: SYSTEM_INFO is plain data and GetNativeSystemInfo fills it
        let code = unsafe {
            let mut info: SYSTEM_INFO = zeroed();
            GetNativeSystemInfo(&mut info);
            info.Anonymous.Anonymous.wProcessorArchitecture
        };
        let machine = MachineArchitecture::from_processor_code(code);
        debug!(code, %machine, "native machine architecture");
        machine
    }
}

impl ArchitectureProbe for WindowsSystem
{
    fn machine_architecture(&self) -> MachineArchitecture
    {
        self.architecture.get_or_query(Self::query_native_architecture)
    }

    fn is_cross_architecture(&self, pid: ProcessId) -> bool
    {
        let Ok(process) = Self::open_for_query(pid) else {
            return false;
        };
        let mut wow64 = 0;
        // SAFETY: the handle is open and `wow64` is valid for writes
        let ok = unsafe { IsWow64Process(handle::raw(&process), &mut wow64) };
        ok != 0 && wow64 != 0
    }
}

impl ProcessInfoSource for WindowsSystem
{
    fn parent_pid(&self, pid: ProcessId) -> Result<ProcessId, QueryError>
    {
        let query = self.nt_query_information_process.ok_or(QueryError::Unsupported)?;
        let process = Self::open_for_query(pid)?;

        let mut info = ProcessBasicInformation::default();
        let mut returned = 0u32;
        // SAFETY: `info` is a correctly sized PROCESS_BASIC_INFORMATION buffer
        let status = unsafe {
            query(
                handle::raw(&process),
                PROCESS_BASIC_INFORMATION_CLASS,
                ptr::from_mut(&mut info).cast::<c_void>(),
                size_of::<ProcessBasicInformation>() as u32,
                &mut returned,
            )
        };
        // NT_SUCCESS: any non-negative status
        if status < 0 {
            return Err(QueryError::QueryFailed {
                pid,
                status: Win32Error::nt_status(status).code(),
            });
        }
        Ok(ProcessId(info.inherited_from_unique_process_id as u32))
    }

    fn owner(&self, pid: ProcessId) -> Option<String>
    {
        let process = Self::open_for_query(pid).ok()?;
        let mut raw_token: HANDLE = ptr::null_mut();
        // SAFETY: the process handle is open and `raw_token` is valid for writes
        if unsafe { OpenProcessToken(handle::raw(&process), TOKEN_QUERY, &mut raw_token) } == 0 {
            trace!(%pid, "OpenProcessToken failed: {}", Win32Error::last());
            return None;
        }
        let token = handle::own(raw_token).ok()?;

        let mut needed = 0u32;
        // SAFETY: a null buffer with zero length only asks for the size
        unsafe { GetTokenInformation(handle::raw(&token), TokenUser, ptr::null_mut(), 0, &mut needed) };
        if needed == 0 {
            return None;
        }
        // u64 elements keep TOKEN_USER and the SID after it aligned
        let mut buffer = vec![0u64; (needed as usize).div_ceil(size_of::<u64>())];
        // SAFETY: `buffer` holds at least `needed` bytes
        let ok = unsafe {
            GetTokenInformation(
                handle::raw(&token),
                TokenUser,
                buffer.as_mut_ptr().cast(),
                needed,
                &mut needed,
            )
        };
        if ok == 0 {
            trace!(%pid, "GetTokenInformation failed: {}", Win32Error::last());
            return None;
        }
        // SAFETY: the call succeeded, so the buffer starts with a TOKEN_USER
        let sid = unsafe { (*buffer.as_ptr().cast::<TOKEN_USER>()).User.Sid };

        let mut name_len = 0u32;
        let mut domain_len = 0u32;
        let mut kind = 0;
        // SAFETY: zero lengths with null buffers only ask for the sizes
        unsafe {
            LookupAccountSidW(
                ptr::null(),
                sid,
                ptr::null_mut(),
                &mut name_len,
                ptr::null_mut(),
                &mut domain_len,
                &mut kind,
            )
        };
        if name_len == 0 {
            trace!(%pid, "LookupAccountSidW failed: {}", Win32Error::last());
            return None;
        }
        let mut name = vec![0u16; name_len as usize];
        let mut domain = vec![0u16; domain_len.max(1) as usize];
        domain_len = domain.len() as u32;
        // SAFETY: both buffers match the lengths passed alongside them
        let ok = unsafe {
            LookupAccountSidW(
                ptr::null(),
                sid,
                name.as_mut_ptr(),
                &mut name_len,
                domain.as_mut_ptr(),
                &mut domain_len,
                &mut kind,
            )
        };
        if ok == 0 {
            trace!(%pid, "LookupAccountSidW failed: {}", Win32Error::last());
            return None;
        }
        // On success the lengths exclude the terminator
        let name = String::from_utf16_lossy(&name[..name_len as usize]);
        let domain = String::from_utf16_lossy(&domain[..domain_len as usize]);
        Some(format_account(&domain, &name))
    }

    fn session_id(&self, pid: ProcessId) -> Option<u32>
    {
        let mut session = 0u32;
        // SAFETY: `session` is valid for writes
        let ok = unsafe { ProcessIdToSessionId(pid.raw(), &mut session) };
        (ok != 0).then_some(session)
    }

    fn executable_path(&self, pid: ProcessId) -> Option<String>
    {
        let process = Self::open_for_query(pid).ok()?;
        let mut capacity = 260usize;
        loop {
            let mut buffer = vec![0u16; capacity];
            let mut len = capacity as u32;
            // SAFETY: `buffer` holds `len` UTF-16 units
            let ok = unsafe {
                QueryFullProcessImageNameW(handle::raw(&process), PROCESS_NAME_WIN32, buffer.as_mut_ptr(), &mut len)
            };
            if ok != 0 {
                return Some(String::from_utf16_lossy(&buffer[..len as usize]));
            }
            match Win32Error::last() {
                // Long paths top out at 32767 units
                Win32Error::InsufficientBuffer if capacity < 32_768 => capacity *= 4,
                err => {
                    trace!(%pid, "QueryFullProcessImageNameW failed: {err}");
                    return None;
                }
            }
        }
    }
}

impl ProcessSystem for WindowsSystem
{
    fn process_table(&self) -> SnapResult<Vec<ProcessEntry>>
    {
        // SAFETY: no pointer arguments
        let snapshot = handle::own(unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) })?;

        // SAFETY: PROCESSENTRY32W is plain data
        let mut row: PROCESSENTRY32W = unsafe { zeroed() };
        row.dwSize = size_of::<PROCESSENTRY32W>() as u32;

        let mut entries = Vec::new();
        // SAFETY: the snapshot is open and `row.dwSize` is set
        let mut ok = unsafe { Process32FirstW(handle::raw(&snapshot), &mut row) };
        while ok != 0 {
            let len = row.szExeFile.iter().position(|&c| c == 0).unwrap_or(row.szExeFile.len());
            entries.push(ProcessEntry::new(
                row.th32ProcessID,
                String::from_utf16_lossy(&row.szExeFile[..len]),
            ));
            // SAFETY: as above
            ok = unsafe { Process32NextW(handle::raw(&snapshot), &mut row) };
        }

        match Win32Error::last() {
            Win32Error::Other(ERROR_NO_MORE_FILES) => {}
            err => debug!("process table walk ended early: {err}"),
        }
        debug!(count = entries.len(), "read process table");
        Ok(entries)
    }

    fn creation_time(&self, pid: ProcessId) -> Option<u64>
    {
        Self::query_creation_time(pid)
    }
}
