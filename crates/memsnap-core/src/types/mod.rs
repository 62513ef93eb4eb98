//! # Types
//!
//! Platform-agnostic types used throughout memsnap.
//!
//! These types abstract away the Win32 details, allowing the enumerator and
//! the dump engine to work with concepts like "process ID" and "architecture"
//! without knowing how the platform layer produced them.

pub mod architecture;
pub mod process;
pub mod table;

// Re-export all public types
pub use architecture::MachineArchitecture;
pub use process::{normalize_process_name, ProcessEntry, ProcessId, ProcessRecord, ProcessTarget};
pub use table::{Table, TabularRecord};
