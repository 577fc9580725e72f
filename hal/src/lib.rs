//! # vCPU HAL
//!
//! Soft-TLB, AArch64 CPU state model, exception engine, and MTE check engine
//! for a dynamic binary translation execution backend. This crate holds the
//! data model and the algorithms that operate on it; it does not decode
//! instructions, generate code, or own physical memory.
//!
//! ## Module map
//! - [`state`]: per-CPU architectural state (§3 of the design: general
//!   registers, PSTATE, banked system registers, feature bitmap, hflags).
//! - [`sysregs`]: the system-register transposition table and banking rule
//!   (§4.3).
//! - [`exception`]: target-EL selection, masking predicates, vector entry
//!   (§4.2).
//! - [`softtlb`]: the per-CPU, per-MMU-index direct-mapped VA→host-addend
//!   cache (§4.1).
//! - [`mte`]: the ARMv8.5 memory-tagging check engine (§4.4).
//! - [`pmsav8`]: PMSAv8 memory-protection regions.
//! - [`arch::xtensa`]: the Xtensa reset/float-control interface (§4.6).

#![no_std]

pub mod arch;
pub mod error;
pub mod exception;
pub mod mte;
pub mod pmsav8;
pub mod softtlb;
pub mod state;
pub mod sysregs;

pub use error::CoreError;
