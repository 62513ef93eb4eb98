//! Machine and process architecture.

use std::fmt;

use serde::Serialize;

/// Native processor code for 32-bit x86 (`PROCESSOR_ARCHITECTURE_INTEL`)
pub const PROCESSOR_CODE_INTEL: u16 = 0;
/// Native processor code for Itanium (`PROCESSOR_ARCHITECTURE_IA64`)
pub const PROCESSOR_CODE_IA64: u16 = 6;
/// Native processor code for x86-64 (`PROCESSOR_ARCHITECTURE_AMD64`)
pub const PROCESSOR_CODE_AMD64: u16 = 9;

/// Architecture of the machine, or of a single process on it
///
/// ## Supported Architectures
///
/// - **X86**: 32-bit x86, or a 32-bit process under WOW64 on a 64-bit machine
/// - **X64**: x86-64
/// - **IA64**: Itanium
/// - **Unknown**: Any processor code we do not map (ARM64 included)
///
/// ## Example
///
/// ```rust
/// use memsnap_core::types::MachineArchitecture;
///
/// assert_eq!(MachineArchitecture::from_processor_code(9), MachineArchitecture::X64);
/// assert_eq!(MachineArchitecture::from_processor_code(12), MachineArchitecture::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MachineArchitecture
{
    /// 32-bit x86
    X86,
    /// 64-bit x86 (Intel/AMD)
    X64,
    /// Intel Itanium
    IA64,
    /// Unmapped processor code
    Unknown,
}

impl MachineArchitecture
{
    /// Map the `wProcessorArchitecture` field of `SYSTEM_INFO`
    #[must_use]
    pub const fn from_processor_code(code: u16) -> Self
    {
        match code {
            PROCESSOR_CODE_INTEL => MachineArchitecture::X86,
            PROCESSOR_CODE_AMD64 => MachineArchitecture::X64,
            PROCESSOR_CODE_IA64 => MachineArchitecture::IA64,
            _ => MachineArchitecture::Unknown,
        }
    }

    /// Whether this is a 64-bit x86 machine, the only one with WOW64 x86 emulation
    #[must_use]
    pub const fn is_64bit_x86(self) -> bool
    {
        matches!(self, MachineArchitecture::X64)
    }
}

impl fmt::Display for MachineArchitecture
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            MachineArchitecture::X86 => write!(f, "x86"),
            MachineArchitecture::X64 => write!(f, "x64"),
            MachineArchitecture::IA64 => write!(f, "IA64"),
            MachineArchitecture::Unknown => write!(f, "Unknown"),
        }
    }
}
