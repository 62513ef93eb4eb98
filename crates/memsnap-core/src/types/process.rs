//! Process identity, table rows, and dump targets.

use std::fmt;

use serde::Serialize;

use super::table::TabularRecord;
use super::MachineArchitecture;

/// Process identifier (PID)
///
/// Windows PIDs are 32-bit values (`DWORD`). Wrapping them keeps a random
/// session id or handle value from being passed where a PID is expected.
///
/// ## Example
///
/// ```rust
/// use memsnap_core::types::ProcessId;
///
/// let pid = ProcessId::from(4);
/// assert_eq!(pid.raw(), 4);
/// assert_eq!(pid.to_string(), "4");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

impl ProcessId
{
    /// Get the raw `u32` value
    #[must_use]
    pub const fn raw(self) -> u32
    {
        self.0
    }
}

impl From<u32> for ProcessId
{
    fn from(pid: u32) -> Self
    {
        ProcessId(pid)
    }
}

impl From<ProcessId> for u32
{
    fn from(pid: ProcessId) -> Self
    {
        pid.0
    }
}

impl fmt::Display for ProcessId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// One raw row of the OS process table
///
/// This is what the platform hands back from a process table snapshot, before
/// any per-process resolution happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry
{
    /// Process identifier
    pub pid: ProcessId,
    /// Image name as reported by the process table (usually with `.exe`)
    pub name: String,
    /// Creation timestamp in platform ticks, when readable
    ///
    /// Used to pick the oldest process when several share a name.
    pub created: Option<u64>,
}

impl ProcessEntry
{
    /// Create an entry without a creation timestamp
    pub fn new(pid: impl Into<ProcessId>, name: impl Into<String>) -> Self
    {
        Self {
            pid: pid.into(),
            name: name.into(),
            created: None,
        }
    }

    /// Image name without a trailing `.exe`
    ///
    /// This is the name used for default dump file names.
    #[must_use]
    pub fn process_name(&self) -> &str
    {
        strip_exe_suffix(&self.name)
    }
}

/// A fully resolved process row
///
/// Produced fresh by every [`list_processes`](crate::enumerator::list_processes)
/// call and never mutated afterwards. Fields that could not be read hold their
/// documented default (`0`, empty string, or [`MachineArchitecture::Unknown`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessRecord
{
    /// Process identifier
    pub pid: ProcessId,
    /// Parent process identifier, `0` when unresolved
    pub parent_pid: u32,
    /// Image name
    pub name: String,
    /// Full path of the main module, empty when inaccessible
    pub executable_path: String,
    /// Terminal services session id
    pub session_id: u32,
    /// `DOMAIN\user`, empty when unresolved
    pub owner_account: String,
    /// Architecture the process executes as
    pub architecture: MachineArchitecture,
}

impl TabularRecord for ProcessRecord
{
    const COLUMNS: &'static [&'static str] =
        &["ProcessName", "ProcessId", "ParentProcessId", "Owner", "SessionId", "Arch", "Path"];

    fn values(&self) -> Vec<String>
    {
        vec![
            self.name.clone(),
            self.pid.to_string(),
            self.parent_pid.to_string(),
            self.owner_account.clone(),
            self.session_id.to_string(),
            self.architecture.to_string(),
            self.executable_path.clone(),
        ]
    }
}

/// The process a dump or lookup should act on
///
/// ## Example
///
/// ```rust
/// use memsnap_core::types::{ProcessId, ProcessTarget};
///
/// assert_eq!("1234".parse::<ProcessTarget>().unwrap(), ProcessTarget::Id(ProcessId(1234)));
/// assert_eq!(
///     "notepad.exe".parse::<ProcessTarget>().unwrap(),
///     ProcessTarget::Name("notepad.exe".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessTarget
{
    /// Address the process by PID
    Id(ProcessId),
    /// Address the process by image name (case-insensitive, `.exe` optional)
    Name(String),
    /// A process that has already been resolved
    Entry(ProcessEntry),
}

impl std::str::FromStr for ProcessTarget
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let s = s.trim();
        if s.is_empty() {
            return Err("process target cannot be empty".to_string());
        }
        match s.parse::<u32>() {
            Ok(pid) => Ok(ProcessTarget::Id(ProcessId(pid))),
            Err(_) => Ok(ProcessTarget::Name(s.to_string())),
        }
    }
}

impl fmt::Display for ProcessTarget
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            ProcessTarget::Id(pid) => write!(f, "pid {pid}"),
            ProcessTarget::Name(name) => write!(f, "'{name}'"),
            ProcessTarget::Entry(entry) => write!(f, "{} (pid {})", entry.name, entry.pid),
        }
    }
}

fn strip_exe_suffix(name: &str) -> &str
{
    let len = name.len();
    if len >= 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".exe") {
        &name[..len - 4]
    } else {
        name
    }
}

/// Normalize a process name for comparison
///
/// Strips a trailing `.exe` (any case) and lowercases the rest, so `LSASS.EXE`,
/// `lsass.exe` and `lsass` all compare equal.
#[must_use]
pub fn normalize_process_name(name: &str) -> String
{
    strip_exe_suffix(name.trim()).to_lowercase()
}
