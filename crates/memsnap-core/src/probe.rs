//! # Architecture Probe
//!
//! Classifies the machine and decides which architecture each process runs as.
//!
//! On a 64-bit x86 machine a process is either native (`x64`) or a 32-bit image
//! running under WOW64 (`x86`). On a 32-bit or Itanium machine everything is
//! reported as `x86`, matching what the process table tools on those systems
//! show. Anything else is `Unknown`.

use once_cell::sync::OnceCell;

use crate::types::{MachineArchitecture, ProcessId};

/// Source of architecture facts
///
/// Both queries are infallible by contract: the machine query always yields a
/// value, and the per-process query answers `false` when it cannot tell.
pub trait ArchitectureProbe
{
    /// Architecture of the machine itself
    fn machine_architecture(&self) -> MachineArchitecture;

    /// Whether `pid` runs under an emulation subsystem (WOW64)
    ///
    /// Returns `false` on any failure (access denied, process exited).
    fn is_cross_architecture(&self, pid: ProcessId) -> bool;
}

/// Classify a process from the machine architecture and its emulation state
///
/// ## Example
///
/// ```rust
/// use memsnap_core::probe::classify;
/// use memsnap_core::types::MachineArchitecture;
///
/// assert_eq!(classify(MachineArchitecture::X64, true), MachineArchitecture::X86);
/// assert_eq!(classify(MachineArchitecture::X64, false), MachineArchitecture::X64);
/// ```
#[must_use]
pub const fn classify(machine: MachineArchitecture, emulated: bool) -> MachineArchitecture
{
    match machine {
        MachineArchitecture::X64 if emulated => MachineArchitecture::X86,
        MachineArchitecture::X64 => MachineArchitecture::X64,
        MachineArchitecture::X86 | MachineArchitecture::IA64 => MachineArchitecture::X86,
        MachineArchitecture::Unknown => MachineArchitecture::Unknown,
    }
}

/// Architecture of a single process
///
/// The emulation query is only issued on 64-bit x86 machines, where it changes
/// the answer.
pub fn process_architecture<P>(probe: &P, machine: MachineArchitecture, pid: ProcessId) -> MachineArchitecture
where
    P: ArchitectureProbe + ?Sized,
{
    let emulated = machine.is_64bit_x86() && probe.is_cross_architecture(pid);
    classify(machine, emulated)
}

/// Memoized machine architecture
///
/// The machine architecture cannot change while we run, so the first query is
/// kept. Holders decide the scope: the Windows system object keeps one per
/// instance.
#[derive(Debug, Default)]
pub struct MemoizedArchitecture
{
    cell: OnceCell<MachineArchitecture>,
}

impl MemoizedArchitecture
{
    /// Create an empty memo
    #[must_use]
    pub const fn new() -> Self
    {
        Self { cell: OnceCell::new() }
    }

    /// Return the cached value, running `query` on first use
    pub fn get_or_query(&self, query: impl FnOnce() -> MachineArchitecture) -> MachineArchitecture
    {
        *self.cell.get_or_init(query)
    }
}
