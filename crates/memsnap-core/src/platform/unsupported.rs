//! Stand-in for platforms without a native implementation.
//!
//! [`Unsupported`] has no values, so none of its trait methods can ever run;
//! the only way to "get" one is [`native_system`](super::native_system), which
//! returns [`unsupported`] instead.

use std::fs::File;

use crate::dump::{DumpPlatform, DumpStrategy};
use crate::enumerator::ProcessSystem;
use crate::error::{QueryError, SnapError, SnapResult};
use crate::probe::ArchitectureProbe;
use crate::resolver::ProcessInfoSource;
use crate::types::{MachineArchitecture, ProcessEntry, ProcessId};

/// Uninhabited native platform
#[derive(Debug)]
pub enum Unsupported {}

/// The error every native entry point returns here
pub fn unsupported() -> SnapError
{
    SnapError::UnsupportedPlatform(format!(
        "process dumps are only implemented for Windows, not {}",
        std::env::consts::OS
    ))
}

impl ArchitectureProbe for Unsupported
{
    fn machine_architecture(&self) -> MachineArchitecture
    {
        match *self {}
    }

    fn is_cross_architecture(&self, _pid: ProcessId) -> bool
    {
        match *self {}
    }
}

impl ProcessInfoSource for Unsupported
{
    fn parent_pid(&self, _pid: ProcessId) -> Result<ProcessId, QueryError>
    {
        match *self {}
    }

    fn owner(&self, _pid: ProcessId) -> Option<String>
    {
        match *self {}
    }

    fn session_id(&self, _pid: ProcessId) -> Option<u32>
    {
        match *self {}
    }

    fn executable_path(&self, _pid: ProcessId) -> Option<String>
    {
        match *self {}
    }
}

impl ProcessSystem for Unsupported
{
    fn process_table(&self) -> SnapResult<Vec<ProcessEntry>>
    {
        match *self {}
    }

    fn creation_time(&self, _pid: ProcessId) -> Option<u64>
    {
        match *self {}
    }
}

impl DumpPlatform for Unsupported
{
    type Process = ();
    type Snapshot = ();
    type CloneProcess = ();

    fn ensure_snapshot_support(&self) -> SnapResult<()>
    {
        match *self {}
    }

    fn open_process(&self, _pid: ProcessId, _strategy: DumpStrategy) -> SnapResult<()>
    {
        match *self {}
    }

    fn write_process_dump(&self, _process: &(), _pid: ProcessId, _file: &File) -> SnapResult<()>
    {
        match *self {}
    }

    fn capture_snapshot(&self, _process: &(), _pid: ProcessId) -> SnapResult<()>
    {
        match *self {}
    }

    fn write_snapshot_dump(&self, _snapshot: &(), _pid: ProcessId, _file: &File) -> SnapResult<()>
    {
        match *self {}
    }

    fn query_clone(&self, _snapshot: &()) -> SnapResult<()>
    {
        match *self {}
    }

    fn clone_process_id(&self, _clone: &()) -> Option<ProcessId>
    {
        match *self {}
    }

    fn free_snapshot(&self, _snapshot: ()) -> SnapResult<()>
    {
        match *self {}
    }

    fn close_clone(&self, _clone: ())
    {
        match *self {}
    }
}
