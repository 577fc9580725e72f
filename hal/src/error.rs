//! Error taxonomy for the vCPU HAL (design §7).
//!
//! Guest faults are not represented here: they are routed through
//! [`crate::exception`] straight to the architecturally-correct EL and never
//! surface as a `Result::Err` to the caller. `CoreError` covers everything
//! that is *not* an architectural exception: host-ABI violations and
//! design-time invariant breaks that should abort rather than route.

use core::fmt;

/// Errors raised by the HAL that are not guest-visible architectural
/// exceptions. Guest faults go through [`crate::exception::enter_exception`]
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// A page-table walk (`tlb_fill`) failed to produce a translation and no
    /// abort was raised by the fill path itself.
    TranslationFailed,
    /// An access spans two pages on a fast path that only supports one.
    UnalignedFastPath,
    /// A system-register encoding has no entry in the transposition table.
    UnknownSysReg(u32),
    /// A write targeted a system register the current EL/security state may
    /// not access.
    SysRegTrapped,
    /// `aarch64_pstate_mode` was asked for an exception level the core
    /// doesn't implement for this config.
    IllegalExceptionLevel,
    /// The CPU model id passed at init does not match any known
    /// `ARMCoreConfig`.
    InvalidCpuModel,
    /// A host callback reported failure (allocation, CRC, entropy).
    HostAbiViolation(&'static str),
    /// A design-time invariant was violated; only raised in debug builds,
    /// compiled out in release per the workspace's `debug-assertions` profile
    /// setting.
    InvariantViolation(&'static str),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::TranslationFailed => write!(f, "soft-TLB translation failed"),
            CoreError::UnalignedFastPath => write!(f, "unaligned access on single-page fast path"),
            CoreError::UnknownSysReg(enc) => write!(f, "unknown system register encoding {enc:#x}"),
            CoreError::SysRegTrapped => write!(f, "system register access trapped"),
            CoreError::IllegalExceptionLevel => write!(f, "illegal exception level"),
            CoreError::InvalidCpuModel => write!(f, "invalid CPU model id"),
            CoreError::HostAbiViolation(what) => write!(f, "host ABI violation: {what}"),
            CoreError::InvariantViolation(what) => write!(f, "invariant violated: {what}"),
        }
    }
}
