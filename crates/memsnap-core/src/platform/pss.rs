//! # Process Snapshotting Flags
//!
//! Capture flags and thread context flags for `PssCaptureSnapshot`.
//!
//! These are plain values from `processsnapshot.h` and `winnt.h`, kept outside
//! the Windows module so the flag set a dump requests can be checked anywhere.
//!
//! ## References
//!
//! - [PSS_CAPTURE_FLAGS](https://learn.microsoft.com/en-us/previous-versions/windows/desktop/proc_snap/pss-capture-flags)
//! - [PssCaptureSnapshot](https://learn.microsoft.com/en-us/windows/win32/api/processsnapshot/nf-processsnapshot-psscapturesnapshot)

use bitflags::bitflags;

bitflags! {
    /// `PSS_CAPTURE_FLAGS`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CaptureFlags: u32
    {
        /// Clone the virtual address space into a suspended clone process
        const VA_CLONE = 0x0000_0001;
        /// Capture the handle table
        const HANDLES = 0x0000_0004;
        /// Capture handle names
        const HANDLE_NAME_INFORMATION = 0x0000_0008;
        /// Capture basic handle information
        const HANDLE_BASIC_INFORMATION = 0x0000_0010;
        /// Capture type-specific handle information
        const HANDLE_TYPE_SPECIFIC_INFORMATION = 0x0000_0020;
        /// Capture the handle trace
        const HANDLE_TRACE = 0x0000_0040;
        /// Capture thread information
        const THREADS = 0x0000_0080;
        /// Capture thread contexts
        const THREAD_CONTEXT = 0x0000_0100;
        /// Capture extended thread contexts (XSTATE)
        const THREAD_CONTEXT_EXTENDED = 0x0000_0200;
        /// Capture the virtual address space layout
        const VA_SPACE = 0x0000_0800;
        /// Capture section information for the address space
        const VA_SPACE_SECTION_INFORMATION = 0x0000_1000;
        /// Let the clone break away from the parent job if the job allows it
        const CREATE_BREAKAWAY_OPTIONAL = 0x0400_0000;
        /// Break the clone away from the parent job
        const CREATE_BREAKAWAY = 0x0800_0000;
        /// Force the clone out of the parent job
        const CREATE_FORCE_BREAKAWAY = 0x1000_0000;
        /// Back snapshot bookkeeping with virtual memory instead of the heap
        const CREATE_USE_VM_ALLOCATIONS = 0x2000_0000;
        /// Measure capture performance
        const CREATE_MEASURE_PERFORMANCE = 0x4000_0000;
        /// Release the section backing the snapshot once the call returns
        const CREATE_RELEASE_SECTION = 0x8000_0000;
    }
}

impl CaptureFlags
{
    /// The flag set used for full-memory snapshot dumps
    ///
    /// Address-space clone, full handle table, threads with extended context,
    /// a clone detached from the parent job, and VM-backed bookkeeping.
    #[must_use]
    pub const fn for_dump() -> Self
    {
        Self::VA_CLONE
            .union(Self::HANDLES)
            .union(Self::HANDLE_NAME_INFORMATION)
            .union(Self::HANDLE_BASIC_INFORMATION)
            .union(Self::HANDLE_TYPE_SPECIFIC_INFORMATION)
            .union(Self::HANDLE_TRACE)
            .union(Self::THREADS)
            .union(Self::THREAD_CONTEXT)
            .union(Self::THREAD_CONTEXT_EXTENDED)
            .union(Self::CREATE_BREAKAWAY)
            .union(Self::CREATE_BREAKAWAY_OPTIONAL)
            .union(Self::CREATE_USE_VM_ALLOCATIONS)
            .union(Self::CREATE_RELEASE_SECTION)
    }
}

/// `CONTEXT_ALL` for the architecture we are built for
///
/// Passed as the thread context flags of the capture so every register set
/// lands in the dump.
#[cfg(target_arch = "x86_64")]
pub const THREAD_CONTEXT_ALL: u32 = 0x0010_001F;
/// `CONTEXT_ALL` for the architecture we are built for
#[cfg(target_arch = "x86")]
pub const THREAD_CONTEXT_ALL: u32 = 0x0001_003F;
/// `CONTEXT_ALL` for the architecture we are built for
#[cfg(target_arch = "aarch64")]
pub const THREAD_CONTEXT_ALL: u32 = 0x0040_001F;
/// `CONTEXT_ALL` for the architecture we are built for
#[cfg(not(any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")))]
pub const THREAD_CONTEXT_ALL: u32 = 0;

/// `PSS_QUERY_VA_CLONE_INFORMATION`
pub const QUERY_VA_CLONE_INFORMATION: u32 = 1;
