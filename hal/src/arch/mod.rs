//! Architecture-specific glue that isn't AArch64 (the AArch64 CPU model
//! lives at the crate root: [`crate::state`], [`crate::sysregs`],
//! [`crate::exception`], [`crate::mte`], [`crate::pmsav8`]).

#[cfg(feature = "xtensa")]
pub mod xtensa;
