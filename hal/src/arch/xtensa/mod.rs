//! Xtensa FPU control glue (design §4.6).
//!
//! Xtensa's floating-point coprocessor exposes two control/status registers
//! a guest program manipulates directly: `FCR` (rounding mode) and `FSR`
//! (sticky exception flags). Both are thin re-encodings of the shared
//! soft-float engine's [`RoundingMode`]/[`ExceptionFlags`] — this module is
//! the only place that translation happens.

use vcpu_softfloat::{ExceptionFlags, FloatStatus, RoundingMode, F32, F64};

/// `FCR`'s 2-bit rounding-mode field. Xtensa only exposes the four
/// IEEE-mandated modes; `TiesAway` has no encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FcrRounding {
    NearestEven = 0,
    ToZero = 1,
    Up = 2,
    Down = 3,
}

impl FcrRounding {
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::NearestEven,
            1 => Self::ToZero,
            2 => Self::Up,
            _ => Self::Down,
        }
    }

    pub const fn to_rounding_mode(self) -> RoundingMode {
        match self {
            Self::NearestEven => RoundingMode::NearestEven,
            Self::ToZero => RoundingMode::ToZero,
            Self::Up => RoundingMode::Up,
            Self::Down => RoundingMode::Down,
        }
    }

    const fn from_rounding_mode(mode: RoundingMode) -> Self {
        match mode {
            RoundingMode::NearestEven | RoundingMode::TiesAway => Self::NearestEven,
            RoundingMode::ToZero => Self::ToZero,
            RoundingMode::Up => Self::Up,
            RoundingMode::Down => Self::Down,
        }
    }
}

/// `FSR`'s 5-bit flag bitmap, in the target's own bit order: Invalid,
/// divide-by-Zero, Overflow, Underflow, Inexact.
const FSR_I: u32 = 1 << 0;
const FSR_U: u32 = 1 << 1;
const FSR_O: u32 = 1 << 2;
const FSR_Z: u32 = 1 << 3;
const FSR_V: u32 = 1 << 4;

/// Writes to `FCR` decode the rounding-mode field into `status`.
pub fn write_fcr(status: &mut FloatStatus, fcr: u32) {
    status.rounding_mode = FcrRounding::from_bits(fcr).to_rounding_mode();
}

/// Reads back `FCR` from the current rounding mode.
pub fn read_fcr(status: &FloatStatus) -> u32 {
    FcrRounding::from_rounding_mode(status.rounding_mode) as u32
}

/// Writes to `FSR` translate the target's bitmap into soft-float's sticky
/// flags (a write sets exactly the flags named, it does not merge with
/// whatever was already sticky — matching the guest's ability to clear FSR
/// by writing zero).
pub fn write_fsr(status: &mut FloatStatus, fsr: u32) {
    let mut flags = ExceptionFlags::empty();
    if fsr & FSR_V != 0 {
        flags = flags | ExceptionFlags::INVALID;
    }
    if fsr & FSR_Z != 0 {
        flags = flags | ExceptionFlags::DIVBYZERO;
    }
    if fsr & FSR_O != 0 {
        flags = flags | ExceptionFlags::OVERFLOW;
    }
    if fsr & FSR_U != 0 {
        flags = flags | ExceptionFlags::UNDERFLOW;
    }
    if fsr & FSR_I != 0 {
        flags = flags | ExceptionFlags::INEXACT;
    }
    status.exception_flags = flags;
}

/// Reads the accumulated soft-float exception flags, re-encoded into the
/// target's `FSR` bit positions.
pub fn read_fsr(status: &FloatStatus) -> u32 {
    let mut fsr = 0u32;
    if status.test(ExceptionFlags::INVALID) {
        fsr |= FSR_V;
    }
    if status.test(ExceptionFlags::DIVBYZERO) {
        fsr |= FSR_Z;
    }
    if status.test(ExceptionFlags::OVERFLOW) {
        fsr |= FSR_O;
    }
    if status.test(ExceptionFlags::UNDERFLOW) {
        fsr |= FSR_U;
    }
    if status.test(ExceptionFlags::INEXACT) {
        fsr |= FSR_I;
    }
    fsr
}

/// Selects `use_first_nan` from the static core config before every scalar
/// op, per design §4.6. Xtensa's NaN policy is entirely data-driven by this
/// one flag (see `vcpu_softfloat::policy`'s `nan-xtensa` feature), so the
/// helpers below just set it and forward.
fn with_policy(status: &mut FloatStatus, use_first_nan: bool) {
    status.use_first_nan = use_first_nan;
}

pub fn add_s(a: F32, b: F32, status: &mut FloatStatus, use_first_nan: bool) -> F32 {
    with_policy(status, use_first_nan);
    F32::add(a, b, status)
}
pub fn add_d(a: F64, b: F64, status: &mut FloatStatus, use_first_nan: bool) -> F64 {
    with_policy(status, use_first_nan);
    F64::add(a, b, status)
}
pub fn sub_s(a: F32, b: F32, status: &mut FloatStatus, use_first_nan: bool) -> F32 {
    with_policy(status, use_first_nan);
    F32::sub(a, b, status)
}
pub fn sub_d(a: F64, b: F64, status: &mut FloatStatus, use_first_nan: bool) -> F64 {
    with_policy(status, use_first_nan);
    F64::sub(a, b, status)
}
pub fn mul_s(a: F32, b: F32, status: &mut FloatStatus, use_first_nan: bool) -> F32 {
    with_policy(status, use_first_nan);
    F32::mul(a, b, status)
}
pub fn mul_d(a: F64, b: F64, status: &mut FloatStatus, use_first_nan: bool) -> F64 {
    with_policy(status, use_first_nan);
    F64::mul(a, b, status)
}

/// `madd_s/d`: `acc + a*b`, single-step fused.
pub fn madd_s(acc: F32, a: F32, b: F32, status: &mut FloatStatus, use_first_nan: bool) -> F32 {
    with_policy(status, use_first_nan);
    F32::fused_mul_add(a, b, acc, status)
}
pub fn madd_d(acc: F64, a: F64, b: F64, status: &mut FloatStatus, use_first_nan: bool) -> F64 {
    with_policy(status, use_first_nan);
    F64::fused_mul_add(a, b, acc, status)
}

/// `msub_s/d`: `acc - a*b`, implemented as a fused multiply-add against the
/// negated product term (negating `a` is exact and sign-only, so this stays
/// a single rounding step).
pub fn msub_s(acc: F32, a: F32, b: F32, status: &mut FloatStatus, use_first_nan: bool) -> F32 {
    with_policy(status, use_first_nan);
    F32::fused_mul_add(a.chs(), b, acc, status)
}
pub fn msub_d(acc: F64, a: F64, b: F64, status: &mut FloatStatus, use_first_nan: bool) -> F64 {
    with_policy(status, use_first_nan);
    F64::fused_mul_add(a.chs(), b, acc, status)
}

/// `mksadj`/`mkdadj`: the reciprocal-adjustment constant Xtensa's multi-step
/// software division sequence multiplies into its Newton-Raphson iterate.
/// Modeled directly off the single-step soft-float division this engine
/// already provides exactly: `mksadj(b) = 1/b` rounded under the ambient
/// status, rather than the target's piecewise table-lookup approximation.
pub fn mksadj(b: F32, status: &mut FloatStatus) -> F32 {
    F32::div(F32::from_i32(1, status), b, status)
}
pub fn mkdadj(b: F64, status: &mut FloatStatus) -> F64 {
    F64::div(F64::from_i32(1, status), b, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fcr_round_trips_through_rounding_mode() {
        let mut status = FloatStatus::new();
        write_fcr(&mut status, FcrRounding::ToZero as u32);
        assert_eq!(status.rounding_mode, RoundingMode::ToZero);
        assert_eq!(read_fcr(&status), FcrRounding::ToZero as u32);
    }

    #[test]
    fn fsr_round_trips_invalid_and_divbyzero() {
        let mut status = FloatStatus::new();
        write_fsr(&mut status, FSR_V | FSR_Z);
        assert!(status.test(ExceptionFlags::INVALID));
        assert!(status.test(ExceptionFlags::DIVBYZERO));
        assert_eq!(read_fsr(&status), FSR_V | FSR_Z);
    }

    #[test]
    fn madd_s_matches_fused_multiply_add() {
        let mut status = FloatStatus::new();
        let one = F32::from_i32(1, &mut status);
        let two = F32::from_i32(2, &mut status);
        let result = madd_s(one, two, two, &mut status, false);
        let expected = F32::from_i32(5, &mut status);
        assert_eq!(result.to_bits(), expected.to_bits());
    }
}
