//! # Process Enumerator
//!
//! Lists every process visible to the caller and resolves dump targets.
//!
//! A listing is best effort per row: the process table is read once, and each
//! row is then resolved on its own. A row whose owner, parent, session or path
//! cannot be read keeps its default for that field and the listing moves on.
//! Only failing to read the process table itself aborts the call.

use tracing::{debug, instrument};

use crate::error::{SnapError, SnapResult};
use crate::probe::{process_architecture, ArchitectureProbe};
use crate::resolver::{get_parent_process_id, get_process_owner, ProcessInfoSource};
use crate::types::{normalize_process_name, ProcessEntry, ProcessId, ProcessRecord, ProcessTarget};

/// Everything the enumerator needs from the operating system
///
/// The Windows implementation is
/// [`WindowsSystem`](crate::platform::windows::WindowsSystem); tests supply
/// their own.
pub trait ProcessSystem: ArchitectureProbe + ProcessInfoSource
{
    /// Read the process table once
    ///
    /// ## Errors
    ///
    /// Returns an error if the table snapshot itself cannot be taken.
    fn process_table(&self) -> SnapResult<Vec<ProcessEntry>>;

    /// Creation timestamp of `pid` in platform ticks, when readable
    ///
    /// Not part of the table walk: only name resolution needs it, and only
    /// when several processes share the name.
    fn creation_time(&self, pid: ProcessId) -> Option<u64>;
}

/// List all processes, ordered by ascending PID
///
/// For each row: the parent PID is resolved first; the executable path is only
/// attempted when a parent was found (an unresolved parent means the process
/// handle is not usable for us). The machine architecture is queried once for
/// the whole listing.
///
/// ## Errors
///
/// Only when the process table cannot be read.
#[instrument(level = "debug", skip_all)]
pub fn list_processes<S>(system: &S) -> SnapResult<Vec<ProcessRecord>>
where
    S: ProcessSystem + ?Sized,
{
    let mut entries = system.process_table()?;
    entries.sort_by_key(|entry| entry.pid);

    let machine = system.machine_architecture();
    debug!(count = entries.len(), %machine, "resolving process table");

    let records = entries
        .into_iter()
        .map(|entry| {
            let parent_pid = get_parent_process_id(system, entry.pid);
            let executable_path = if parent_pid == 0 {
                String::new()
            } else {
                system.executable_path(entry.pid).unwrap_or_default()
            };

            ProcessRecord {
                pid: entry.pid,
                parent_pid,
                executable_path,
                session_id: system.session_id(entry.pid).unwrap_or_default(),
                owner_account: get_process_owner(system, entry.pid),
                architecture: process_architecture(system, machine, entry.pid),
                name: entry.name,
            }
        })
        .collect();

    Ok(records)
}

/// Resolve a [`ProcessTarget`] against the current process table
///
/// - `Id`: must be present in the table.
/// - `Name`: case-insensitive, a trailing `.exe` on either side is ignored;
///   when several processes match, their creation times are read and the one
///   created first wins (unknown creation times sort last, ties fall back to
///   the lower PID).
/// - `Entry`: returned as is.
///
/// ## Errors
///
/// - `ProcessNotFound` / `ProcessNameNotFound` when nothing matches
/// - Any error from reading the process table
pub fn resolve_target<S>(system: &S, target: &ProcessTarget) -> SnapResult<ProcessEntry>
where
    S: ProcessSystem + ?Sized,
{
    match target {
        ProcessTarget::Entry(entry) => Ok(entry.clone()),
        ProcessTarget::Id(pid) => system
            .process_table()?
            .into_iter()
            .find(|entry| entry.pid == *pid)
            .ok_or(SnapError::ProcessNotFound(pid.raw())),
        ProcessTarget::Name(name) => {
            let wanted = normalize_process_name(name);
            if wanted.is_empty() {
                return Err(SnapError::InvalidArgument("process name cannot be empty".to_string()));
            }
            let mut matches: Vec<ProcessEntry> = system
                .process_table()?
                .into_iter()
                .filter(|entry| normalize_process_name(&entry.name) == wanted)
                .collect();
            if matches.len() > 1 {
                for entry in &mut matches {
                    if entry.created.is_none() {
                        entry.created = system.creation_time(entry.pid);
                    }
                }
                debug!(%name, count = matches.len(), "several processes share the name");
            }
            matches
                .into_iter()
                .min_by_key(|entry| (entry.created.is_none(), entry.created, entry.pid))
                .ok_or_else(|| SnapError::ProcessNameNotFound(name.clone()))
        }
    }
}
