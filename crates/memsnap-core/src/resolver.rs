//! # Process Information Resolver
//!
//! Parent PID and owner account lookups.
//!
//! The parent PID comes from the basic-information class of the native process
//! information query. That structure is partially undocumented, so all of its
//! marshaling lives behind [`ProcessInfoSource`] and the sentinel handling lives
//! here, in one place.
//!
//! ## Sentinels
//!
//! - Parent PID: `0` when the process cannot be opened or the query fails.
//!   This is indistinguishable from a real parent of PID 0; the ambiguity is
//!   accepted.
//! - Owner: empty string when the token cannot be opened or the SID cannot be
//!   mapped to an account.

use tracing::trace;

use crate::error::QueryError;
use crate::types::ProcessId;

/// Low-level per-process queries
pub trait ProcessInfoSource
{
    /// Parent PID from the basic process information
    ///
    /// ## Errors
    ///
    /// - `OpenFailed`: the process could not be opened for querying
    /// - `QueryFailed`: the native query returned a failure status
    fn parent_pid(&self, pid: ProcessId) -> Result<ProcessId, QueryError>;

    /// Owning account as `DOMAIN\user`, read from the primary token
    ///
    /// Returns `None` on any failure.
    fn owner(&self, pid: ProcessId) -> Option<String>;

    /// Terminal services session of the process
    fn session_id(&self, pid: ProcessId) -> Option<u32>;

    /// Full path of the main executable
    fn executable_path(&self, pid: ProcessId) -> Option<String>;
}

/// Parent PID of `pid`, or `0` when it cannot be resolved
pub fn get_parent_process_id<S>(source: &S, pid: ProcessId) -> u32
where
    S: ProcessInfoSource + ?Sized,
{
    match source.parent_pid(pid) {
        Ok(parent) => parent.raw(),
        Err(err) => {
            trace!(%pid, "parent pid unresolved: {err}");
            0
        }
    }
}

/// Owning account of `pid` as `DOMAIN\user`, or an empty string
pub fn get_process_owner<S>(source: &S, pid: ProcessId) -> String
where
    S: ProcessInfoSource + ?Sized,
{
    source.owner(pid).unwrap_or_else(|| {
        trace!(%pid, "owner unresolved");
        String::new()
    })
}

/// Join a domain and account name the way Windows displays them
///
/// An empty domain (well-known SIDs without an authority) yields the bare name.
#[must_use]
pub fn format_account(domain: &str, name: &str) -> String
{
    if domain.is_empty() {
        name.to_string()
    } else {
        format!("{domain}\\{name}")
    }
}
