//! Common module for library exports

pub use crate::dump::{DumpEngine, DumpOutcome, DumpPlatform, DumpStrategy, MemoryDumper, OutputSpec};
pub use crate::enumerator::{list_processes, resolve_target, ProcessSystem};
pub use crate::error::{SnapError, SnapResult};
pub use crate::platform::{native_dump_platform, native_system, NativeDumpPlatform, NativeSystem};
pub use crate::types::{MachineArchitecture, ProcessEntry, ProcessId, ProcessRecord, ProcessTarget, Table, TabularRecord};
