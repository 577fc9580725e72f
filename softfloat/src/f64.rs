//! Double-precision (binary64) arithmetic. Structurally identical to
//! [`crate::f32`], scaled up to 64-bit layout.

use crate::f32::{F32, FloatRelation};
use crate::policy::{pick_nan, pick_nan_muladd, Pick2, Pick3};
use crate::status::{ExceptionFlags, FloatStatus, RoundingMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct F64(pub u64);

static_assertions::const_assert_eq!(core::mem::size_of::<F64>(), 8);

const SIGN_SHIFT: u32 = 63;
const EXP_SHIFT: u32 = 52;
const EXP_MASK: u64 = 0x7FF;
const FRAC_MASK: u64 = 0x000F_FFFF_FFFF_FFFF;

impl F64 {
    pub const ZERO: Self = Self(0);
    pub const NEG_ZERO: Self = Self(0x8000_0000_0000_0000);
    pub const INFINITY: Self = Self(0x7FF0_0000_0000_0000);
    pub const NEG_INFINITY: Self = Self(0xFFF0_0000_0000_0000);
    pub const DEFAULT_NAN: Self = Self(0x7FF8_0000_0000_0000);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u64 {
        self.0
    }

    pub const fn sign(self) -> bool {
        (self.0 >> SIGN_SHIFT) != 0
    }

    pub const fn exp(self) -> i32 {
        ((self.0 >> EXP_SHIFT) & EXP_MASK) as i32
    }

    pub const fn frac(self) -> u64 {
        self.0 & FRAC_MASK
    }

    pub const fn is_nan(self) -> bool {
        self.exp() == EXP_MASK as i32 && self.frac() != 0
    }

    pub const fn is_signaling_nan(self) -> bool {
        self.is_nan() && (self.frac() & 0x0008_0000_0000_0000) == 0
    }

    pub const fn is_quiet_nan(self) -> bool {
        self.is_nan() && !self.is_signaling_nan()
    }

    pub const fn is_inf(self) -> bool {
        self.exp() == EXP_MASK as i32 && self.frac() == 0
    }

    pub const fn is_zero(self) -> bool {
        (self.0 & 0x7FFF_FFFF_FFFF_FFFF) == 0
    }

    pub const fn is_denormal(self) -> bool {
        self.exp() == 0 && self.frac() != 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0 & 0x7FFF_FFFF_FFFF_FFFF)
    }

    pub const fn chs(self) -> Self {
        Self(self.0 ^ 0x8000_0000_0000_0000)
    }

    const fn pack(sign: bool, exp: i32, frac: u64) -> Self {
        Self(((sign as u64) << SIGN_SHIFT) | ((exp as u64) << EXP_SHIFT) | (frac & FRAC_MASK))
    }

    fn silence(self) -> Self {
        Self(self.0 | 0x0008_0000_0000_0000)
    }

    pub fn squash_input_denormal(self, status: &mut FloatStatus) -> Self {
        if status.flush_inputs_to_zero && self.is_denormal() {
            status.raise(ExceptionFlags::INPUT_DENORMAL);
            return Self::pack(self.sign(), 0, 0);
        }
        self
    }

    pub fn from_f32(a: F32, status: &mut FloatStatus) -> Self {
        let a = a.squash_input_denormal(status);
        if a.is_nan() {
            return widen_nan(a, status);
        }
        if a.is_inf() {
            return Self::pack(a.sign(), EXP_MASK as i32, 0);
        }
        if a.is_zero() {
            return Self::pack(a.sign(), 0, 0);
        }
        let (sign, exp, sig) = crate::f32::unpack_pub(a);
        // `exp` is biased by 127 (f32's bias); rebias to f64's 1023. `sig` is
        // scaled with its implicit bit at position 30 (f32's convention); widen
        // to position 62 (f64's convention) by shifting up the 32-bit gap.
        normalize_round_and_pack(sign, exp + 896, (sig as u64) << 32, status)
    }
}

fn widen_nan(a: F32, status: &mut FloatStatus) -> F64 {
    if a.is_signaling_nan() {
        status.raise(ExceptionFlags::INVALID);
    }
    if status.default_nan_mode {
        return F64::DEFAULT_NAN;
    }
    let frac = (a.frac() as u64) << 29;
    let widened = F64::pack(a.sign(), EXP_MASK as i32, frac.max(1));
    if a.is_signaling_nan() {
        widened.silence()
    } else {
        widened
    }
}

fn round_and_pack(sign: bool, mut exp: i32, mut sig: u64, status: &mut FloatStatus) -> F64 {
    let rounding_mode = status.rounding_mode;
    let round_nearest_even = rounding_mode == RoundingMode::NearestEven;
    let mut round_increment: u64 = 0x200;
    if !round_nearest_even && rounding_mode != RoundingMode::TiesAway {
        round_increment = match rounding_mode {
            RoundingMode::ToZero => 0,
            RoundingMode::Up if !sign => 0x3FF,
            RoundingMode::Up => 0,
            RoundingMode::Down if sign => 0x3FF,
            RoundingMode::Down => 0,
            _ => 0x3FF,
        };
    }
    let mut round_bits = sig & 0x3FF;

    if exp >= 0x7FD {
        if exp > 0x7FD || (exp == 0x7FD && (sig.wrapping_add(round_increment) as i64) < 0) {
            status.raise(ExceptionFlags::OVERFLOW | ExceptionFlags::INEXACT);
            return F64::pack(sign, EXP_MASK as i32, if round_increment == 0 { FRAC_MASK } else { 0 });
        }
        if exp < 0 {
            if status.flush_to_zero {
                status.raise(ExceptionFlags::OUTPUT_DENORMAL);
                return F64::pack(sign, 0, 0);
            }
            let is_tiny = status.tininess == crate::status::Tininess::BeforeRounding
                || exp < -1
                || sig.wrapping_add(round_increment) < 0x8000_0000_0000_0000;
            sig = shift_right_jamming(sig, (-exp) as u32);
            exp = 0;
            round_bits = sig & 0x3FF;
            if is_tiny && round_bits != 0 {
                status.raise(ExceptionFlags::UNDERFLOW);
            }
        }
    }
    if round_bits != 0 {
        status.raise(ExceptionFlags::INEXACT);
    }
    sig = (sig.wrapping_add(round_increment)) >> 10;
    if round_nearest_even && (round_bits ^ 0x200) == 0 {
        sig &= !1;
    }
    if sig == 0 {
        exp = 0;
    }
    F64::pack(sign, exp, sig)
}

fn normalize_round_and_pack(sign: bool, mut exp: i32, mut sig: u64, status: &mut FloatStatus) -> F64 {
    if sig == 0 {
        return F64::pack(sign, 0, 0);
    }
    if sig & 0x8000_0000_0000_0000 != 0 {
        let sticky = sig & 1;
        sig = (sig >> 1) | sticky;
        exp += 1;
        return round_and_pack(sign, exp, sig, status);
    }
    let shift = sig.leading_zeros() as i32 - 1;
    round_and_pack(sign, exp - shift, sig << shift, status)
}

fn shift_right_jamming(a: u64, count: u32) -> u64 {
    if count == 0 {
        a
    } else if count >= 64 {
        (a != 0) as u64
    } else {
        (a >> count) | (((a << (64 - count)) != 0) as u64)
    }
}

fn normalize_subnormal(sig: u64) -> (i32, u64) {
    let shift = sig.leading_zeros() as i32 - 1;
    (11 - shift, sig << shift)
}

/// Exposes [`unpack`] to sibling width modules (widening/narrowing conversions).
pub(crate) fn unpack_pub(a: F64) -> (bool, i32, u64) {
    unpack(a)
}

pub(crate) fn shift_right_jamming_pub(a: u64, count: u32) -> u64 {
    shift_right_jamming(a, count)
}

fn unpack(a: F64) -> (bool, i32, u64) {
    let sign = a.sign();
    let mut exp = a.exp();
    let mut sig = a.frac();
    if exp == 0 {
        if sig != 0 {
            let (e, s) = normalize_subnormal(sig);
            exp = e;
            sig = s;
        }
    } else {
        sig |= 0x0010_0000_0000_0000;
        sig <<= 10;
    }
    (sign, exp, sig)
}

fn propagate_nan(a: F64, b: F64, status: &mut FloatStatus) -> F64 {
    let a_snan = a.is_signaling_nan();
    let a_qnan = a.is_quiet_nan();
    let b_snan = b.is_signaling_nan();
    let b_qnan = b.is_quiet_nan();
    if a_snan || b_snan {
        status.raise(ExceptionFlags::INVALID);
    }
    if status.default_nan_mode {
        return F64::DEFAULT_NAN;
    }
    let a_larger = a.frac() > b.frac() || (a.frac() == b.frac() && !a.sign() && b.sign());
    match pick_nan(a_qnan, a_snan, b_qnan, b_snan, a_larger, status.use_first_nan) {
        Pick2::A => a.silence(),
        Pick2::B => b.silence(),
    }
}

fn propagate_nan_muladd(a: F64, b: F64, c: F64, inf_zero: bool, status: &mut FloatStatus) -> F64 {
    let a_snan = a.is_signaling_nan();
    let a_qnan = a.is_quiet_nan();
    let b_snan = b.is_signaling_nan();
    let b_qnan = b.is_quiet_nan();
    let c_snan = c.is_signaling_nan();
    let c_qnan = c.is_quiet_nan();
    if a_snan || b_snan || c_snan {
        status.raise(ExceptionFlags::INVALID);
    }
    match pick_nan_muladd(a_qnan, a_snan, b_qnan, b_snan, c_qnan, c_snan, inf_zero, status) {
        Pick3::A => a.silence(),
        Pick3::B => b.silence(),
        Pick3::C => c.silence(),
        Pick3::Default => F64::DEFAULT_NAN,
    }
}

fn add_sig(a: F64, b: F64, result_sign: bool, status: &mut FloatStatus) -> F64 {
    let (_, mut a_exp, mut a_sig) = unpack(a);
    let (_, mut b_exp, mut b_sig) = unpack(b);
    let exp_diff = a_exp - b_exp;

    if exp_diff > 0 {
        b_sig = shift_right_jamming(b_sig, exp_diff as u32);
    } else if exp_diff < 0 {
        a_sig = shift_right_jamming(a_sig, (-exp_diff) as u32);
        a_exp = b_exp;
    } else if a.is_nan() || b.is_nan() {
        return propagate_nan(a, b, status);
    } else if a.is_inf() {
        return a;
    } else if b.is_inf() {
        return F64::pack(result_sign, EXP_MASK as i32, 0);
    } else if a.is_zero() && b.is_zero() {
        return F64::pack(result_sign, 0, 0);
    } else {
        let sig = a_sig + b_sig;
        return round_and_pack(result_sign, a_exp + 1, sig >> 1 | (sig & 1), status);
    }
    let sig = a_sig.wrapping_add(b_sig);
    if a.is_nan() || b.is_nan() {
        return propagate_nan(a, b, status);
    }
    if a.is_inf() || b.is_inf() {
        return F64::pack(result_sign, EXP_MASK as i32, 0);
    }
    normalize_round_and_pack(result_sign, a_exp, sig, status)
}

fn sub_sig(a: F64, b: F64, result_sign: bool, status: &mut FloatStatus) -> F64 {
    let (_, mut a_exp, mut a_sig) = unpack(a);
    let (_, mut b_exp, mut b_sig) = unpack(b);
    a_sig <<= 1;
    b_sig <<= 1;
    let exp_diff = a_exp - b_exp;
    let (sign, exp, sig): (bool, i32, i64);
    if exp_diff > 0 {
        b_sig = shift_right_jamming(b_sig, exp_diff as u32);
        sign = result_sign;
        exp = a_exp;
        sig = a_sig as i64 - b_sig as i64;
    } else if exp_diff < 0 {
        a_sig = shift_right_jamming(a_sig, (-exp_diff) as u32);
        sign = !result_sign;
        exp = b_exp;
        sig = b_sig as i64 - a_sig as i64;
    } else {
        if a.is_nan() || b.is_nan() {
            return propagate_nan(a, b, status);
        }
        if a.is_inf() && b.is_inf() {
            status.raise(ExceptionFlags::INVALID);
            return F64::DEFAULT_NAN;
        }
        if a.is_inf() {
            return a;
        }
        if b.is_inf() {
            return b.chs();
        }
        if a_sig < b_sig {
            return round_and_pack(!result_sign, b_exp, (b_sig - a_sig) >> 1, status);
        } else if b_sig < a_sig {
            return round_and_pack(result_sign, a_exp, (a_sig - b_sig) >> 1, status);
        } else {
            return F64::pack(status.rounding_mode == RoundingMode::Down, 0, 0);
        }
    }
    if a.is_nan() || b.is_nan() {
        return propagate_nan(a, b, status);
    }
    if a.is_inf() || b.is_inf() {
        return F64::pack(result_sign, EXP_MASK as i32, 0);
    }
    normalize_round_and_pack(sign, exp - 1, sig as u64, status)
}

impl F64 {
    pub fn add(a: Self, b: Self, status: &mut FloatStatus) -> Self {
        let a = a.squash_input_denormal(status);
        let b = b.squash_input_denormal(status);
        if a.sign() == b.sign() {
            add_sig(a, b, a.sign(), status)
        } else {
            sub_sig(a, b, a.sign(), status)
        }
    }

    pub fn sub(a: Self, b: Self, status: &mut FloatStatus) -> Self {
        let a = a.squash_input_denormal(status);
        let b = b.squash_input_denormal(status);
        if a.sign() == b.sign() {
            sub_sig(a, b, a.sign(), status)
        } else {
            add_sig(a, b, a.sign(), status)
        }
    }

    pub fn mul(a: Self, b: Self, status: &mut FloatStatus) -> Self {
        let a = a.squash_input_denormal(status);
        let b = b.squash_input_denormal(status);
        let sign = a.sign() ^ b.sign();

        if a.is_nan() || b.is_nan() {
            if (a.is_inf() && b.is_zero()) || (b.is_inf() && a.is_zero()) {
                status.raise(ExceptionFlags::INVALID);
                return Self::DEFAULT_NAN;
            }
            return propagate_nan(a, b, status);
        }
        if a.is_inf() || b.is_inf() {
            if a.is_zero() || b.is_zero() {
                status.raise(ExceptionFlags::INVALID);
                return Self::DEFAULT_NAN;
            }
            return Self::pack(sign, EXP_MASK as i32, 0);
        }
        if a.is_zero() || b.is_zero() {
            return Self::pack(sign, 0, 0);
        }
        let (_, a_exp, a_sig) = unpack(a);
        let (_, b_exp, b_sig) = unpack(b);
        let exp = a_exp + b_exp - 1023;
        let raw = (a_sig as u128) * (b_sig as u128);
        let sig = shift_right_jamming_u128(raw, 62) as u64;
        normalize_round_and_pack(sign, exp, sig, status)
    }

    pub fn div(a: Self, b: Self, status: &mut FloatStatus) -> Self {
        let a = a.squash_input_denormal(status);
        let b = b.squash_input_denormal(status);
        let sign = a.sign() ^ b.sign();

        if a.is_nan() || b.is_nan() {
            if a.is_inf() && b.is_inf() {
                status.raise(ExceptionFlags::INVALID);
                return Self::DEFAULT_NAN;
            }
            return propagate_nan(a, b, status);
        }
        if a.is_inf() {
            if b.is_inf() {
                status.raise(ExceptionFlags::INVALID);
                return Self::DEFAULT_NAN;
            }
            return Self::pack(sign, EXP_MASK as i32, 0);
        }
        if b.is_inf() {
            return Self::pack(sign, 0, 0);
        }
        if b.is_zero() {
            if a.is_zero() {
                status.raise(ExceptionFlags::INVALID);
                return Self::DEFAULT_NAN;
            }
            status.raise(ExceptionFlags::DIVBYZERO);
            return Self::pack(sign, EXP_MASK as i32, 0);
        }
        if a.is_zero() {
            return Self::pack(sign, 0, 0);
        }
        let (_, a_exp, a_sig) = unpack(a);
        let (_, b_exp, b_sig) = unpack(b);
        let exp = a_exp - b_exp + 1023;
        let a_wide = (a_sig as u128) << 64;
        let b_wide = b_sig as u128;
        let quot_wide = a_wide / b_wide;
        let remainder = a_wide % b_wide;
        let quot = shift_right_jamming_u128(quot_wide, 2) as u64 | (remainder != 0) as u64;
        normalize_round_and_pack(sign, exp, quot, status)
    }

    pub fn sqrt(a: Self, status: &mut FloatStatus) -> Self {
        let a = a.squash_input_denormal(status);
        if a.is_nan() {
            return propagate_nan(a, a, status);
        }
        if a.is_zero() {
            return a;
        }
        if a.sign() {
            status.raise(ExceptionFlags::INVALID);
            return Self::DEFAULT_NAN;
        }
        if a.is_inf() {
            return a;
        }
        let (_, a_exp, mut sig) = unpack(a);
        let mut unbiased = a_exp - 1023;
        if unbiased & 1 != 0 {
            sig <<= 1;
            unbiased -= 1;
        }
        let wide = (sig as u128) << 62;
        let mut z = integer_sqrt_approx_u128(wide);
        let rem = wide.wrapping_sub((z as u128) * (z as u128));
        if rem != 0 {
            z |= 1;
        }
        normalize_round_and_pack(false, unbiased / 2 + 1023, z as u64, status)
    }

    pub fn fused_mul_add(a: Self, b: Self, c: Self, status: &mut FloatStatus) -> Self {
        let a = a.squash_input_denormal(status);
        let b = b.squash_input_denormal(status);
        let c = c.squash_input_denormal(status);
        let sign_p = a.sign() ^ b.sign();
        let inf_zero = (a.is_inf() && b.is_zero()) || (a.is_zero() && b.is_inf());

        if a.is_nan() || b.is_nan() || c.is_nan() || inf_zero {
            return propagate_nan_muladd(a, b, c, inf_zero, status);
        }
        if a.is_inf() || b.is_inf() {
            let p_inf = Self::pack(sign_p, EXP_MASK as i32, 0);
            if c.is_inf() && sign_p != c.sign() {
                status.raise(ExceptionFlags::INVALID);
                return Self::DEFAULT_NAN;
            }
            return p_inf;
        }
        if c.is_inf() {
            return c;
        }
        if a.is_zero() || b.is_zero() {
            if c.is_zero() {
                if sign_p == c.sign() {
                    return Self::pack(sign_p, 0, 0);
                }
                return Self::pack(status.rounding_mode == RoundingMode::Down, 0, 0);
            }
            return c;
        }

        let (_, a_exp, a_sig) = unpack(a);
        let (_, b_exp, b_sig) = unpack(b);
        // Product kept at its natural unshifted scale: normalize_round_and_pack_wide's
        // implicit contract is value = sig/2^126 * 2^(exp-1023).
        let p_exp = a_exp + b_exp - 1021;
        let p_sig: u128 = (a_sig as u128) * (b_sig as u128);

        if c.is_zero() {
            return normalize_round_and_pack_wide(sign_p, p_exp, p_sig, status);
        }

        let (_, c_exp, c_sig) = unpack(c);
        let c_sig_wide = (c_sig as u128) << 62;
        let c_exp = c_exp + 2;
        let sign_c = c.sign();
        let exp_diff = p_exp - c_exp;

        if sign_p == sign_c {
            let (exp, sig) = if exp_diff >= 0 {
                (p_exp, p_sig.wrapping_add(shift_right_jamming_u128(c_sig_wide, exp_diff as u32)))
            } else {
                (c_exp, shift_right_jamming_u128(p_sig, (-exp_diff) as u32).wrapping_add(c_sig_wide))
            };
            normalize_round_and_pack_wide(sign_p, exp, sig, status)
        } else {
            let (exp, sig, sign) = if exp_diff > 0 {
                (p_exp, p_sig.wrapping_sub(shift_right_jamming_u128(c_sig_wide, exp_diff as u32)), sign_p)
            } else if exp_diff < 0 {
                (c_exp, c_sig_wide.wrapping_sub(shift_right_jamming_u128(p_sig, (-exp_diff) as u32)), sign_c)
            } else if p_sig >= c_sig_wide {
                (p_exp, p_sig - c_sig_wide, sign_p)
            } else {
                (c_exp, c_sig_wide - p_sig, sign_c)
            };
            if sig == 0 {
                return Self::pack(status.rounding_mode == RoundingMode::Down, 0, 0);
            }
            normalize_round_and_pack_wide(sign, exp, sig, status)
        }
    }

    pub fn compare_quiet(a: Self, b: Self, status: &mut FloatStatus) -> FloatRelation {
        compare_impl(a, b, false, status)
    }

    pub fn compare_signaling(a: Self, b: Self, status: &mut FloatStatus) -> FloatRelation {
        compare_impl(a, b, true, status)
    }

    pub fn eq(a: Self, b: Self, status: &mut FloatStatus) -> bool {
        Self::compare_quiet(a, b, status) == FloatRelation::Equal
    }

    pub fn le(a: Self, b: Self, status: &mut FloatStatus) -> bool {
        matches!(Self::compare_signaling(a, b, status), FloatRelation::Equal | FloatRelation::Less)
    }

    pub fn lt(a: Self, b: Self, status: &mut FloatStatus) -> bool {
        Self::compare_signaling(a, b, status) == FloatRelation::Less
    }

    pub fn unordered(a: Self, b: Self, status: &mut FloatStatus) -> bool {
        Self::compare_quiet(a, b, status) == FloatRelation::Unordered
    }

    pub fn min(a: Self, b: Self, status: &mut FloatStatus) -> Self {
        if a.is_nan() || b.is_nan() {
            return propagate_nan(a, b, status);
        }
        if Self::compare_quiet(a, b, status) == FloatRelation::Less {
            a
        } else {
            b
        }
    }

    pub fn max(a: Self, b: Self, status: &mut FloatStatus) -> Self {
        if a.is_nan() || b.is_nan() {
            return propagate_nan(a, b, status);
        }
        if Self::compare_quiet(a, b, status) == FloatRelation::Greater {
            a
        } else {
            b
        }
    }

    pub fn scalbn(a: Self, n: i32, status: &mut FloatStatus) -> Self {
        if a.is_nan() || a.is_inf() || a.is_zero() {
            return a;
        }
        let (sign, exp, sig) = unpack(a);
        normalize_round_and_pack(sign, exp + n, sig, status)
    }

    pub fn from_i32(a: i32, status: &mut FloatStatus) -> Self {
        if a == 0 {
            return Self::ZERO;
        }
        let sign = a < 0;
        let mag = (a as i64).unsigned_abs();
        normalize_round_and_pack(sign, 1085, mag, status)
    }

    pub fn from_u32(a: u32, status: &mut FloatStatus) -> Self {
        if a == 0 {
            return Self::ZERO;
        }
        normalize_round_and_pack(false, 1085, a as u64, status)
    }

    pub fn from_i64(a: i64, status: &mut FloatStatus) -> Self {
        if a == 0 {
            return Self::ZERO;
        }
        let sign = a < 0;
        normalize_round_and_pack(sign, 1085, a.unsigned_abs(), status)
    }

    pub fn from_u64(a: u64, status: &mut FloatStatus) -> Self {
        if a == 0 {
            return Self::ZERO;
        }
        normalize_round_and_pack(false, 1085, a, status)
    }

    pub fn to_f32(a: Self, status: &mut FloatStatus) -> F32 {
        crate::f32::narrow_from_f64(a, status)
    }

    pub fn to_i32_round_to_zero(a: Self, status: &mut FloatStatus) -> i32 {
        to_int_round_to_zero(a, status, i32::MIN as i64, i32::MAX as i64) as i32
    }

    pub fn to_i64_round_to_zero(a: Self, status: &mut FloatStatus) -> i64 {
        to_int_round_to_zero(a, status, i64::MIN, i64::MAX)
    }
}

fn to_int_round_to_zero(a: F64, status: &mut FloatStatus, min: i64, max: i64) -> i64 {
    if a.is_nan() {
        status.raise(ExceptionFlags::INVALID);
        return max;
    }
    let sign = a.sign();
    let (_, exp, sig) = unpack(a);
    let unbiased = exp - 1023;
    let shift = unbiased - 62;
    let mag: u64 = if shift >= 0 {
        if shift >= 2 {
            status.raise(ExceptionFlags::INVALID);
            return if sign { min } else { max };
        }
        sig << shift
    } else if shift <= -64 {
        if sig != 0 {
            status.raise(ExceptionFlags::INEXACT);
        }
        0
    } else {
        let drop = (-shift) as u32;
        if sig & ((1u64 << drop) - 1) != 0 {
            status.raise(ExceptionFlags::INEXACT);
        }
        sig >> drop
    };
    let signed = if sign {
        if mag == 1u64 << 63 { i64::MIN } else { -(mag as i64) }
    } else {
        if mag >= 1u64 << 63 {
            status.raise(ExceptionFlags::INVALID);
            return max;
        }
        mag as i64
    };
    if signed < min || signed > max {
        status.raise(ExceptionFlags::INVALID);
        return if sign { min } else { max };
    }
    signed
}

fn normalize_round_and_pack_wide(sign: bool, exp: i32, sig: u128, status: &mut FloatStatus) -> F64 {
    if sig == 0 {
        return F64::pack(sign, 0, 0);
    }
    let shift = sig.leading_zeros() as i32 - 1;
    let shifted = if shift >= 0 { sig << shift } else { shift_right_jamming_u128(sig, (-shift) as u32) };
    let top = (shifted >> 64) as u64;
    let sticky = (shifted as u64 & 0x7FFF_FFFF_FFFF_FFFF != 0) as u64;
    round_and_pack(sign, exp - shift, top | sticky, status)
}

fn shift_right_jamming_u128(a: u128, count: u32) -> u128 {
    if count == 0 {
        a
    } else if count >= 128 {
        (a != 0) as u128
    } else {
        (a >> count) | (((a << (128 - count)) != 0) as u128)
    }
}

fn integer_sqrt_approx_u128(a: u128) -> u64 {
    if a == 0 {
        return 0;
    }
    let mut x: u128 = 1u128 << ((128 - a.leading_zeros()) / 2 + 1);
    for _ in 0..12 {
        x = (x + a / x.max(1)) / 2;
    }
    while x * x > a {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= a {
        x += 1;
    }
    x as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st() -> FloatStatus {
        FloatStatus::new()
    }

    #[test]
    fn scalar_add() {
        let mut status = st();
        let one = F64(0x3FF0_0000_0000_0000);
        let r = F64::add(one, one, &mut status);
        assert_eq!(r.0, 0x4000_0000_0000_0000);
    }

    #[test]
    fn div_by_zero_raises_flag() {
        let mut status = st();
        let one = F64(0x3FF0_0000_0000_0000);
        let r = F64::div(one, F64::ZERO, &mut status);
        assert!(r.is_inf());
        assert!(status.test(ExceptionFlags::DIVBYZERO));
    }

    #[test]
    fn widen_from_f32_preserves_value() {
        let mut status = st();
        let half = F32(0x3F00_0000);
        let wide = F64::from_f32(half, &mut status);
        assert_eq!(wide.0, 0x3FE0_0000_0000_0000);
    }

    #[test]
    fn roundtrip_int64() {
        let mut status = st();
        for v in [-1i64, 0, 1, 1_000_000_000_000] {
            let f = F64::from_i64(v, &mut status);
            assert_eq!(F64::to_i64_round_to_zero(f, &mut status), v);
        }
    }
}
