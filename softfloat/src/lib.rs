//! Portable IEEE-754 software floating-point engine.
//!
//! Every operation takes an explicit [`status::FloatStatus`] rather than
//! reading ambient global state, and every result is a plain bit-pattern
//! newtype (`F16`/`F32`/`F64`/`F80`/`F128`) rather than a host float, so
//! callers decide when (or whether) a value is ever materialized as a
//! native `f32`/`f64`. NaN propagation across two- and three-operand
//! operations follows whichever target policy is selected at build time
//! (see [`policy`]).
#![no_std]

pub mod extended;
pub mod f16;
pub mod f32;
pub mod f64;
pub mod policy;
pub mod status;

pub use extended::{F128, F80};
pub use f16::F16;
pub use f32::{F32, FloatRelation};
pub use f64::F64;
pub use status::{ExceptionFlags, FloatStatus, RoundingMode, Tininess};
