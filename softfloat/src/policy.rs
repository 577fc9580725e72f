//! Target-specific NaN propagation policy.
//!
//! Which input NaN (or the default NaN) a two- or three-operand operation
//! returns is architecturally defined per-ISA. The reference implementation
//! this engine is modeled on selects the policy with a `#ifdef TARGET_*` at
//! compile time; we do the same with a Cargo feature per policy
//! (`nan-arm`, `nan-ppc`, `nan-xtensa`, `nan-x87`) so exactly one `pick_nan`
//! body is ever compiled in. This is a deliberate design choice (see
//! DESIGN.md): no runtime target enum, no per-call dispatch.

use crate::status::{ExceptionFlags, FloatStatus};

/// Which of two NaN operands (or neither) an operation should propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick2 {
    A,
    B,
}

/// Which of three NaN operands (or the default NaN) a fused operation
/// should propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick3 {
    A,
    B,
    C,
    Default,
}

/// Two-operand NaN propagation rule.
///
/// `a_larger` is only consulted by the x87 policy's significand tiebreak;
/// other policies ignore it.
#[cfg(feature = "nan-arm")]
pub fn pick_nan(a_qnan: bool, a_snan: bool, _b_qnan: bool, b_snan: bool, _a_larger: bool, _use_first_nan: bool) -> Pick2 {
    if a_snan {
        Pick2::A
    } else if b_snan {
        Pick2::B
    } else if a_qnan {
        Pick2::A
    } else {
        Pick2::B
    }
}

#[cfg(feature = "nan-ppc")]
pub fn pick_nan(a_qnan: bool, a_snan: bool, _b_qnan: bool, _b_snan: bool, _a_larger: bool, _use_first_nan: bool) -> Pick2 {
    if a_snan || a_qnan {
        Pick2::A
    } else {
        Pick2::B
    }
}

#[cfg(feature = "nan-xtensa")]
pub fn pick_nan(a_qnan: bool, a_snan: bool, b_qnan: bool, b_snan: bool, _a_larger: bool, use_first_nan: bool) -> Pick2 {
    if use_first_nan {
        if a_qnan || a_snan {
            Pick2::A
        } else {
            Pick2::B
        }
    } else if b_qnan || b_snan {
        Pick2::B
    } else {
        Pick2::A
    }
}

#[cfg(feature = "nan-x87")]
pub fn pick_nan(a_qnan: bool, a_snan: bool, b_qnan: bool, b_snan: bool, a_larger: bool, _use_first_nan: bool) -> Pick2 {
    if a_snan {
        if b_snan {
            if a_larger {
                Pick2::A
            } else {
                Pick2::B
            }
        } else if b_qnan {
            Pick2::B
        } else {
            Pick2::A
        }
    } else if a_qnan {
        if b_snan || !b_qnan {
            Pick2::A
        } else if a_larger {
            Pick2::A
        } else {
            Pick2::B
        }
    } else {
        Pick2::B
    }
}

/// Three-operand (fused multiply-add) NaN propagation rule. Operand order
/// matches the `a*b + c` convention used throughout this crate, not the
/// `c + a*b` order the ARM pseudocode documents its rule in.
#[cfg(feature = "nan-arm")]
pub fn pick_nan_muladd(
    a_qnan: bool,
    a_snan: bool,
    b_qnan: bool,
    b_snan: bool,
    c_qnan: bool,
    c_snan: bool,
    inf_zero: bool,
    status: &mut FloatStatus,
) -> Pick3 {
    if inf_zero && c_qnan {
        status.raise(ExceptionFlags::INVALID);
        return Pick3::Default;
    }
    if c_snan {
        Pick3::C
    } else if a_snan {
        Pick3::A
    } else if b_snan {
        Pick3::B
    } else if c_qnan {
        Pick3::C
    } else if a_qnan {
        Pick3::A
    } else {
        Pick3::B
    }
}

#[cfg(feature = "nan-ppc")]
pub fn pick_nan_muladd(
    a_qnan: bool,
    a_snan: bool,
    _b_qnan: bool,
    _b_snan: bool,
    c_qnan: bool,
    c_snan: bool,
    inf_zero: bool,
    status: &mut FloatStatus,
) -> Pick3 {
    if inf_zero {
        status.raise(ExceptionFlags::INVALID);
        return Pick3::C;
    }
    if a_snan || a_qnan {
        Pick3::A
    } else if c_snan || c_qnan {
        Pick3::C
    } else {
        Pick3::B
    }
}

#[cfg(feature = "nan-xtensa")]
pub fn pick_nan_muladd(
    a_qnan: bool,
    a_snan: bool,
    b_qnan: bool,
    b_snan: bool,
    c_qnan: bool,
    c_snan: bool,
    inf_zero: bool,
    status: &mut FloatStatus,
) -> Pick3 {
    if inf_zero {
        status.raise(ExceptionFlags::INVALID);
        return Pick3::C;
    }
    if status.use_first_nan {
        if a_qnan || a_snan {
            Pick3::A
        } else if b_qnan || b_snan {
            Pick3::B
        } else {
            Pick3::C
        }
    } else if c_qnan || c_snan {
        Pick3::C
    } else if b_qnan || b_snan {
        Pick3::B
    } else {
        Pick3::A
    }
}

#[cfg(feature = "nan-x87")]
pub fn pick_nan_muladd(
    a_qnan: bool,
    a_snan: bool,
    b_qnan: bool,
    b_snan: bool,
    _c_qnan: bool,
    _c_snan: bool,
    _inf_zero: bool,
    _status: &mut FloatStatus,
) -> Pick3 {
    if a_snan || a_qnan {
        Pick3::A
    } else if b_snan || b_qnan {
        Pick3::B
    } else {
        Pick3::C
    }
}
