//! Shared in-memory process system for integration tests

#![allow(dead_code)]

use std::cell::RefCell;

use memsnap_core::error::QueryError;
use memsnap_core::probe::ArchitectureProbe;
use memsnap_core::resolver::ProcessInfoSource;
use memsnap_core::{MachineArchitecture, ProcessEntry, ProcessId, ProcessSystem, SnapError, SnapResult};

/// One process in the fake table
#[derive(Debug, Clone)]
pub struct FakeProcess
{
    pub entry: ProcessEntry,
    pub parent: Option<u32>,
    pub owner: Option<String>,
    pub session: Option<u32>,
    pub path: Option<String>,
    pub created: Option<u64>,
    pub wow64: bool,
}

impl FakeProcess
{
    pub fn new(pid: u32, name: &str) -> Self
    {
        Self {
            entry: ProcessEntry::new(pid, name),
            parent: None,
            owner: None,
            session: None,
            path: None,
            created: None,
            wow64: false,
        }
    }

    pub fn parent(mut self, parent: u32) -> Self
    {
        self.parent = Some(parent);
        self
    }

    pub fn owner(mut self, owner: &str) -> Self
    {
        self.owner = Some(owner.to_string());
        self
    }

    pub fn session(mut self, session: u32) -> Self
    {
        self.session = Some(session);
        self
    }

    pub fn path(mut self, path: &str) -> Self
    {
        self.path = Some(path.to_string());
        self
    }

    pub fn created(mut self, ticks: u64) -> Self
    {
        self.created = Some(ticks);
        self
    }

    pub fn wow64(mut self) -> Self
    {
        self.wow64 = true;
        self
    }
}

/// In-memory [`ProcessSystem`]
#[derive(Debug, Default)]
pub struct FakeSystem
{
    pub machine: Option<MachineArchitecture>,
    pub processes: Vec<FakeProcess>,
    pub table_unreadable: bool,
    /// PIDs whose creation time was asked for, in call order
    pub creation_queries: RefCell<Vec<u32>>,
}

impl FakeSystem
{
    pub fn new(processes: Vec<FakeProcess>) -> Self
    {
        Self {
            machine: Some(MachineArchitecture::X64),
            processes,
            table_unreadable: false,
            creation_queries: RefCell::new(Vec::new()),
        }
    }

    fn find(&self, pid: ProcessId) -> Option<&FakeProcess>
    {
        self.processes.iter().find(|p| p.entry.pid == pid)
    }
}

impl ArchitectureProbe for FakeSystem
{
    fn machine_architecture(&self) -> MachineArchitecture
    {
        self.machine.unwrap_or(MachineArchitecture::Unknown)
    }

    fn is_cross_architecture(&self, pid: ProcessId) -> bool
    {
        self.find(pid).is_some_and(|p| p.wow64)
    }
}

impl ProcessInfoSource for FakeSystem
{
    fn parent_pid(&self, pid: ProcessId) -> Result<ProcessId, QueryError>
    {
        match self.find(pid).and_then(|p| p.parent) {
            Some(parent) => Ok(ProcessId(parent)),
            None => Err(QueryError::OpenFailed {
                pid,
                details: "access denied".to_string(),
            }),
        }
    }

    fn owner(&self, pid: ProcessId) -> Option<String>
    {
        self.find(pid).and_then(|p| p.owner.clone())
    }

    fn session_id(&self, pid: ProcessId) -> Option<u32>
    {
        self.find(pid).and_then(|p| p.session)
    }

    fn executable_path(&self, pid: ProcessId) -> Option<String>
    {
        self.find(pid).and_then(|p| p.path.clone())
    }
}

impl ProcessSystem for FakeSystem
{
    fn process_table(&self) -> SnapResult<Vec<ProcessEntry>>
    {
        if self.table_unreadable {
            return Err(SnapError::PermissionDenied("process table".to_string()));
        }
        Ok(self.processes.iter().map(|p| p.entry.clone()).collect())
    }

    fn creation_time(&self, pid: ProcessId) -> Option<u64>
    {
        self.creation_queries.borrow_mut().push(pid.raw());
        self.find(pid).and_then(|p| p.created)
    }
}
