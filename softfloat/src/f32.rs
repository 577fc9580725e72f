//! Single-precision (binary32) arithmetic.

use crate::policy::{pick_nan, pick_nan_muladd, Pick2, Pick3};
use crate::status::{ExceptionFlags, FloatStatus, RoundingMode};

/// A raw binary32 bit pattern. Never interpreted as a host `f32` directly;
/// every operation goes through pack/unpack so that signaling NaNs and
/// negative zero survive bit-exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct F32(pub u32);

static_assertions::const_assert_eq!(core::mem::size_of::<F32>(), 4);

const SIGN_SHIFT: u32 = 31;
const EXP_SHIFT: u32 = 23;
const EXP_MASK: u32 = 0xFF;
const FRAC_MASK: u32 = 0x007F_FFFF;

impl F32 {
    pub const ZERO: Self = Self(0);
    pub const NEG_ZERO: Self = Self(0x8000_0000);
    pub const INFINITY: Self = Self(0x7F80_0000);
    pub const NEG_INFINITY: Self = Self(0xFF80_0000);
    pub const DEFAULT_NAN: Self = Self(0x7FC0_0000);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn to_bits(self) -> u32 {
        self.0
    }

    pub const fn sign(self) -> bool {
        (self.0 >> SIGN_SHIFT) != 0
    }

    pub const fn exp(self) -> i32 {
        ((self.0 >> EXP_SHIFT) & EXP_MASK) as i32
    }

    pub const fn frac(self) -> u32 {
        self.0 & FRAC_MASK
    }

    pub const fn is_nan(self) -> bool {
        self.exp() == EXP_MASK as i32 && self.frac() != 0
    }

    pub const fn is_signaling_nan(self) -> bool {
        self.is_nan() && (self.frac() & 0x0040_0000) == 0
    }

    pub const fn is_quiet_nan(self) -> bool {
        self.is_nan() && !self.is_signaling_nan()
    }

    pub const fn is_inf(self) -> bool {
        self.exp() == EXP_MASK as i32 && self.frac() == 0
    }

    pub const fn is_zero(self) -> bool {
        (self.0 & 0x7FFF_FFFF) == 0
    }

    pub const fn is_denormal(self) -> bool {
        self.exp() == 0 && self.frac() != 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0 & 0x7FFF_FFFF)
    }

    pub const fn chs(self) -> Self {
        Self(self.0 ^ 0x8000_0000)
    }

    const fn pack(sign: bool, exp: i32, frac: u32) -> Self {
        Self(((sign as u32) << SIGN_SHIFT) | ((exp as u32) << EXP_SHIFT) | (frac & FRAC_MASK))
    }

    fn silence(self) -> Self {
        Self(self.0 | 0x0040_0000)
    }

    /// Flush a denormal input to a signed zero, raising `input_denormal`
    /// if flush-inputs-to-zero is active. No-op otherwise.
    pub fn squash_input_denormal(self, status: &mut FloatStatus) -> Self {
        if status.flush_inputs_to_zero && self.is_denormal() {
            status.raise(ExceptionFlags::INPUT_DENORMAL);
            return Self::pack(self.sign(), 0, 0);
        }
        self
    }
}

/// Build a packed value from (sign, unbiased *internal* exponent, 32-bit
/// significand with guard/round/sticky in the low 7 bits) applying the
/// active rounding mode. Mirrors the reference `roundAndPackFloat32`.
fn round_and_pack(sign: bool, mut exp: i32, mut sig: u32, status: &mut FloatStatus) -> F32 {
    let rounding_mode = status.rounding_mode;
    let round_nearest_even = rounding_mode == RoundingMode::NearestEven;
    let mut round_increment: u32 = 0x40;
    if !round_nearest_even && rounding_mode != RoundingMode::TiesAway {
        round_increment = match rounding_mode {
            RoundingMode::ToZero => 0,
            RoundingMode::Up if !sign => 0x7F,
            RoundingMode::Up => 0,
            RoundingMode::Down if sign => 0x7F,
            RoundingMode::Down => 0,
            _ => 0x7F,
        };
    }
    let mut round_bits = sig & 0x7F;

    if exp >= 0xFD {
        if exp > 0xFD || (exp == 0xFD && (sig.wrapping_add(round_increment) as i32) < 0) {
            status.raise(ExceptionFlags::OVERFLOW | ExceptionFlags::INEXACT);
            return F32::pack(sign, 0xFF, if round_increment == 0 { FRAC_MASK } else { 0 });
        }
        if exp < 0 {
            if status.flush_to_zero {
                status.raise(ExceptionFlags::OUTPUT_DENORMAL);
                return F32::pack(sign, 0, 0);
            }
            let is_tiny = status.tininess == crate::status::Tininess::BeforeRounding
                || exp < -1
                || sig.wrapping_add(round_increment) < 0x8000_0000;
            sig = shift_right_jamming32(sig, (-exp) as u32);
            exp = 0;
            round_bits = sig & 0x7F;
            if is_tiny && round_bits != 0 {
                status.raise(ExceptionFlags::UNDERFLOW);
            }
        }
    }
    if round_bits != 0 {
        status.raise(ExceptionFlags::INEXACT);
    }
    sig = (sig.wrapping_add(round_increment)) >> 7;
    if round_nearest_even && (round_bits ^ 0x40) == 0 {
        sig &= !1;
    }
    if sig == 0 {
        exp = 0;
    }
    F32::pack(sign, exp, sig)
}

fn normalize_round_and_pack(sign: bool, mut exp: i32, mut sig: u32, status: &mut FloatStatus) -> F32 {
    if sig == 0 {
        return F32::pack(sign, 0, 0);
    }
    if sig & 0x8000_0000 != 0 {
        // One bit past the canonical bit-30 position (e.g. an add or
        // multiply carry-out): fold it back with a single jammed shift
        // rather than running the generic leading-zeros path, which only
        // ever shifts left.
        let sticky = sig & 1;
        sig = (sig >> 1) | sticky;
        exp += 1;
        return round_and_pack(sign, exp, sig, status);
    }
    let shift = sig.leading_zeros() as i32 - 1;
    round_and_pack(sign, exp - shift, sig << shift, status)
}

fn shift_right_jamming32(a: u32, count: u32) -> u32 {
    if count == 0 {
        a
    } else if count >= 32 {
        (a != 0) as u32
    } else {
        (a >> count) | (((a << (32 - count)) != 0) as u32)
    }
}

fn shift_right_jamming64(a: u64, count: u32) -> u64 {
    if count == 0 {
        a
    } else if count >= 64 {
        (a != 0) as u64
    } else {
        (a >> count) | (((a << (64 - count)) != 0) as u64)
    }
}

/// Normalizes a subnormal's 23-bit fraction into the same (biased exponent,
/// bit-30-implicit significand) convention `unpack` uses for normal numbers.
fn normalize_subnormal(sig: u32) -> (i32, u32) {
    let shift = sig.leading_zeros() as i32 - 1;
    (8 - shift, sig << shift)
}

/// Exposes [`unpack`] to sibling width modules (widening/narrowing conversions).
pub(crate) fn unpack_pub(a: F32) -> (bool, i32, u32) {
    unpack(a)
}

/// Narrows a binary64 value to binary32, rounding per the active mode.
/// Exposed for [`crate::f64::F64::to_f32`].
pub(crate) fn narrow_from_f64(a: crate::f64::F64, status: &mut FloatStatus) -> F32 {
    if a.is_nan() {
        if a.is_signaling_nan() {
            status.raise(ExceptionFlags::INVALID);
        }
        if status.default_nan_mode {
            return F32::DEFAULT_NAN;
        }
        let frac = (a.frac() >> 29) as u32;
        let sign = a.sign();
        let f = F32::pack(sign, EXP_MASK as i32, frac.max(1));
        return if a.is_signaling_nan() { f.silence() } else { f };
    }
    if a.is_inf() {
        return F32::pack(a.sign(), EXP_MASK as i32, 0);
    }
    if a.is_zero() {
        return F32::pack(a.sign(), 0, 0);
    }
    let (sign, exp, sig64) = crate::f64::unpack_pub(a);
    // `sig64` carries its implicit bit at bit 62 (53 significant bits, bits
    // 62..10); shifting by 32 lands the implicit bit at bit 30 of the f32
    // convention and jams every discarded low bit into the guard/round/sticky
    // field the same way every other caller of `round_and_pack` expects.
    // `exp` comes back biased by 1023 (f64's bias); rebias to f32's 127.
    let sig32 = crate::f64::shift_right_jamming_pub(sig64, 32) as u32;
    round_and_pack(sign, exp - 896, sig32, status)
}

/// Unpack to (biased exponent, 32-bit significand with the implicit bit at
/// bit 30 and 7 spare low bits for guard/round/sticky). The exponent stays
/// in the same biased-by-127 frame `F32::pack` expects, so every caller that
/// threads an `exp` value through unmodified (aside from the deliberate
/// shift-compensating arithmetic in `normalize_round_and_pack`) reconstructs
/// the original value.
fn unpack(a: F32) -> (bool, i32, u32) {
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
        sig |= 0x0080_0000;
        sig <<= 7;
    }
    (sign, exp, sig)
}

fn propagate_nan(a: F32, b: F32, status: &mut FloatStatus) -> F32 {
    let a_snan = a.is_signaling_nan();
    let a_qnan = a.is_quiet_nan();
    let b_snan = b.is_signaling_nan();
    let b_qnan = b.is_quiet_nan();
    if a_snan || b_snan {
        status.raise(ExceptionFlags::INVALID);
    }
    if status.default_nan_mode {
        return F32::DEFAULT_NAN;
    }
    let a_larger = a.frac() > b.frac() || (a.frac() == b.frac() && !a.sign() && b.sign());
    match pick_nan(a_qnan, a_snan, b_qnan, b_snan, a_larger, status.use_first_nan) {
        Pick2::A => a.silence(),
        Pick2::B => b.silence(),
    }
}

fn propagate_nan_muladd(a: F32, b: F32, c: F32, inf_zero: bool, status: &mut FloatStatus) -> F32 {
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
        Pick3::Default => F32::DEFAULT_NAN,
    }
}

fn add_sig(a: F32, b: F32, result_sign: bool, status: &mut FloatStatus) -> F32 {
    let (_, mut a_exp, mut a_sig) = unpack(a);
    let (_, mut b_exp, mut b_sig) = unpack(b);
    let exp_diff = a_exp - b_exp;

    if exp_diff > 0 {
        b_sig = shift_right_jamming32(b_sig, exp_diff as u32);
    } else if exp_diff < 0 {
        a_sig = shift_right_jamming32(a_sig, (-exp_diff) as u32);
        a_exp = b_exp;
    } else if a.is_nan() || b.is_nan() {
        return propagate_nan(a, b, status);
    } else if a.is_inf() {
        return a;
    } else if b.is_inf() {
        return F32::pack(result_sign, EXP_MASK as i32, 0);
    } else if a.is_zero() && b.is_zero() {
        return F32::pack(result_sign, 0, 0);
    } else {
        let sig = a_sig + b_sig;
        return round_and_pack(result_sign, a_exp + 1, sig >> 1 | (sig & 1), status);
    }
    let sig = a_sig.wrapping_add(b_sig);
    if a.is_nan() || b.is_nan() {
        return propagate_nan(a, b, status);
    }
    if a.is_inf() || b.is_inf() {
        return F32::pack(result_sign, EXP_MASK as i32, 0);
    }
    normalize_round_and_pack(result_sign, a_exp, sig, status)
}

fn sub_sig(a: F32, b: F32, result_sign: bool, status: &mut FloatStatus) -> F32 {
    let (_, mut a_exp, mut a_sig) = unpack(a);
    let (_, mut b_exp, mut b_sig) = unpack(b);
    a_sig <<= 1;
    b_sig <<= 1;
    let exp_diff = a_exp - b_exp;
    let (sign, exp, sig): (bool, i32, i32);
    if exp_diff > 0 {
        b_sig = shift_right_jamming32(b_sig, exp_diff as u32);
        sign = result_sign;
        exp = a_exp;
        sig = (a_sig as i64 - b_sig as i64) as i32;
    } else if exp_diff < 0 {
        a_sig = shift_right_jamming32(a_sig, (-exp_diff) as u32);
        sign = !result_sign;
        exp = b_exp;
        sig = (b_sig as i64 - a_sig as i64) as i32;
    } else {
        if a.is_nan() || b.is_nan() {
            return propagate_nan(a, b, status);
        }
        if a.is_inf() && b.is_inf() {
            status.raise(ExceptionFlags::INVALID);
            return F32::DEFAULT_NAN;
        }
        if a.is_inf() {
            return a;
        }
        if b.is_inf() {
            return b.chs();
        }
        if a_sig < b_sig {
            return round_and_pack(!result_sign, b_exp, (b_sig - a_sig) as u32 >> 1, status);
        } else if b_sig < a_sig {
            return round_and_pack(result_sign, a_exp, (a_sig - b_sig) as u32 >> 1, status);
        } else {
            return F32::pack(status.rounding_mode == RoundingMode::Down, 0, 0);
        }
    }
    if a.is_nan() || b.is_nan() {
        return propagate_nan(a, b, status);
    }
    if a.is_inf() || b.is_inf() {
        return F32::pack(result_sign, EXP_MASK as i32, 0);
    }
    normalize_round_and_pack(sign, exp - 1, sig as u32, status)
}

impl F32 {
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
        let exp = a_exp + b_exp - 127;
        let sig = shift_right_jamming64((a_sig as u64) * (b_sig as u64), 30) as u32;
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
        let exp = a_exp - b_exp + 127;
        let a_wide = (a_sig as u64) << 32;
        let b_wide = b_sig as u64;
        let quot_wide = a_wide / b_wide;
        let remainder = a_wide % b_wide;
        let quot = shift_right_jamming64(quot_wide, 2) as u32 | (remainder != 0) as u32;
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
        let mut unbiased = a_exp - 127;
        if unbiased & 1 != 0 {
            sig <<= 1;
            unbiased -= 1;
        }
        let wide = (sig as u64) << 30;
        let mut z_sig = integer_sqrt_approx(wide);
        let rem = wide.wrapping_sub((z_sig as u64) * (z_sig as u64));
        if rem != 0 {
            z_sig |= 1;
        }
        normalize_round_and_pack(false, unbiased / 2 + 127, z_sig, status)
    }

    /// Fused `a*b + c`, rounded once.
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
        // `p_sig` keeps the full-width product unshifted (implicit bit near
        // bit 60, not bit 30) so the add against `c` below loses no bits;
        // `p_exp` is adjusted to match that wider convention (see
        // `normalize_round_and_pack_wide`'s contract: value = sig/2^62 *
        // 2^(exp-127), two bits narrower than the natural bit-60 product).
        let p_exp = a_exp + b_exp - 125;
        let p_sig: u64 = (a_sig as u64) * (b_sig as u64);

        if c.is_zero() {
            return normalize_round_and_pack_wide(sign_p, p_exp, p_sig, status);
        }

        let (_, c_exp, c_sig) = unpack(c);
        let c_sig64 = (c_sig as u64) << 30;
        let c_exp = c_exp + 2;
        let sign_c = c.sign();
        let exp_diff = p_exp - c_exp;

        if sign_p == sign_c {
            let (exp, sig) = if exp_diff >= 0 {
                (p_exp, p_sig.wrapping_add(shift_right_jamming64(c_sig64, exp_diff as u32)))
            } else {
                (c_exp, shift_right_jamming64(p_sig, (-exp_diff) as u32).wrapping_add(c_sig64))
            };
            normalize_round_and_pack_wide(sign_p, exp, sig, status)
        } else {
            let (exp, sig, sign) = if exp_diff > 0 {
                (p_exp, p_sig.wrapping_sub(shift_right_jamming64(c_sig64, exp_diff as u32)), sign_p)
            } else if exp_diff < 0 {
                (c_exp, c_sig64.wrapping_sub(shift_right_jamming64(p_sig, (-exp_diff) as u32)), sign_c)
            } else if p_sig >= c_sig64 {
                (p_exp, p_sig - c_sig64, sign_p)
            } else {
                (c_exp, c_sig64 - p_sig, sign_c)
            };
            if sig == 0 {
                return Self::pack(status.rounding_mode == RoundingMode::Down, 0, 0);
            }
            normalize_round_and_pack_wide(sign, exp, sig, status)
        }
    }

    /// Quiet comparison: never signals on a quiet NaN (only on sNaN).
    pub fn compare_quiet(a: Self, b: Self, status: &mut FloatStatus) -> FloatRelation {
        compare_impl(a, b, false, status)
    }

    /// Signaling comparison: raises `invalid` for *any* NaN operand.
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

    /// `min`/`max` that propagate NaNs like every other arithmetic op
    /// (as opposed to `minnum`/`maxnum`, which prefer the non-NaN operand).
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

    pub fn minnum(a: Self, b: Self, status: &mut FloatStatus) -> Self {
        if a.is_nan() {
            return if b.is_nan() { propagate_nan(a, b, status) } else { b };
        }
        if b.is_nan() {
            return a;
        }
        Self::min(a, b, status)
    }

    pub fn maxnum(a: Self, b: Self, status: &mut FloatStatus) -> Self {
        if a.is_nan() {
            return if b.is_nan() { propagate_nan(a, b, status) } else { b };
        }
        if b.is_nan() {
            return a;
        }
        Self::max(a, b, status)
    }

    /// Scale by a power of two without re-rounding the significand.
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
        let mag = (a as i64).unsigned_abs() as u32;
        normalize_round_and_pack(sign, 157, mag, status)
    }

    pub fn from_u32(a: u32, status: &mut FloatStatus) -> Self {
        if a == 0 {
            return Self::ZERO;
        }
        normalize_round_and_pack(false, 157, a, status)
    }

    pub fn from_i64(a: i64, status: &mut FloatStatus) -> Self {
        if a == 0 {
            return Self::ZERO;
        }
        let sign = a < 0;
        let mag = a.unsigned_abs();
        from_u64_magnitude(sign, mag, status)
    }

    pub fn from_u64(a: u64, status: &mut FloatStatus) -> Self {
        if a == 0 {
            return Self::ZERO;
        }
        from_u64_magnitude(false, a, status)
    }

    /// Round-to-zero conversion to `i32`; out-of-range and NaN saturate to
    /// `i32::MAX`/`MIN` with `invalid` raised, matching the reference
    /// convention for the RTZ integer-convert helpers.
    pub fn to_i32_round_to_zero(a: Self, status: &mut FloatStatus) -> i32 {
        to_int_round_to_zero(a, status, i32::MIN as i64, i32::MAX as i64) as i32
    }

    pub fn to_i64_round_to_zero(a: Self, status: &mut FloatStatus) -> i64 {
        to_int_round_to_zero(a, status, i64::MIN, i64::MAX)
    }

    pub fn to_f64(a: Self, status: &mut FloatStatus) -> crate::f64::F64 {
        crate::f64::F64::from_f32(a, status)
    }

    pub fn to_f16(a: Self, status: &mut FloatStatus) -> crate::f16::F16 {
        crate::f16::F16::from_f32(a, status)
    }
}

/// Converts an arbitrary 64-bit magnitude into the (biased-exponent,
/// bit-30-implicit) convention `normalize_round_and_pack` expects, by
/// reducing it to 32 significant bits with a jammed sticky bit first.
fn from_u64_magnitude(sign: bool, mag: u64, status: &mut FloatStatus) -> F32 {
    let bit_len = 64 - mag.leading_zeros() as i32;
    let shift_down = (bit_len - 31).max(0) as u32;
    let sig = shift_right_jamming64(mag, shift_down) as u32;
    normalize_round_and_pack(sign, 157 + shift_down as i32, sig, status)
}

fn to_int_round_to_zero(a: F32, status: &mut FloatStatus, min: i64, max: i64) -> i64 {
    if a.is_nan() {
        status.raise(ExceptionFlags::INVALID);
        return max;
    }
    let sign = a.sign();
    let (_, exp, sig) = unpack(a);
    let unbiased = exp - 127;
    // true_value = sig << (unbiased - 30); sig itself has the implicit bit at
    // bit 30, so this is the shift that turns it into a plain integer.
    let shift = unbiased - 30;
    let mag: u64 = if shift >= 0 {
        if shift >= 34 {
            status.raise(ExceptionFlags::INVALID);
            return if sign { min } else { max };
        }
        (sig as u64) << shift
    } else if shift <= -32 {
        if sig != 0 {
            status.raise(ExceptionFlags::INEXACT);
        }
        0
    } else {
        let drop = (-shift) as u32;
        if sig & ((1u32 << drop) - 1) != 0 {
            status.raise(ExceptionFlags::INEXACT);
        }
        (sig >> drop) as u64
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

fn normalize_round_and_pack_wide(sign: bool, exp: i32, sig: u64, status: &mut FloatStatus) -> F32 {
    if sig == 0 {
        return F32::pack(sign, 0, 0);
    }
    let shift = sig.leading_zeros() as i32 - 1;
    let shifted = if shift >= 0 { sig << shift } else { shift_right_jamming64(sig, (-shift) as u32) };
    // Collapse the wide (64-bit) significand down to the 32-bit
    // round-and-pack convention, keeping a sticky OR of anything shifted out.
    let top = (shifted >> 32) as u32;
    let sticky = (shifted as u32 & 0x7FFF_FFFF != 0) as u32;
    round_and_pack(sign, exp - shift, top | sticky, status)
}

fn integer_sqrt_approx(a: u64) -> u32 {
    if a == 0 {
        return 0;
    }
    let mut x = 1u64 << ((64 - a.leading_zeros()) / 2 + 1);
    for _ in 0..8 {
        x = (x + a / x.max(1)) / 2;
    }
    while x * x > a {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= a {
        x += 1;
    }
    x as u32
}

/// Ordering relation between two float values, matching IEEE-754 total
/// comparison outcomes (`unordered` when either operand is NaN).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatRelation {
    Less,
    Equal,
    Greater,
    Unordered,
}

fn compare_impl(a: F32, b: F32, signaling: bool, status: &mut FloatStatus) -> FloatRelation {
    if a.is_nan() || b.is_nan() {
        if signaling || a.is_signaling_nan() || b.is_signaling_nan() {
            status.raise(ExceptionFlags::INVALID);
        }
        return FloatRelation::Unordered;
    }
    let a_neg = a.sign();
    let b_neg = b.sign();
    if a.abs().0 == 0 && b.abs().0 == 0 {
        return FloatRelation::Equal;
    }
    if a_neg != b_neg {
        return if a_neg { FloatRelation::Less } else { FloatRelation::Greater };
    }
    let (x, y) = if a_neg { (b.0, a.0) } else { (a.0, b.0) };
    match x.cmp(&y) {
        core::cmp::Ordering::Less => FloatRelation::Less,
        core::cmp::Ordering::Equal => FloatRelation::Equal,
        core::cmp::Ordering::Greater => FloatRelation::Greater,
    }
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
        let r = F32::add(F32(0x3F80_0000), F32(0x3F80_0000), &mut status);
        assert_eq!(r.0, 0x4000_0000);
        assert_eq!(status.exception_flags, ExceptionFlags::empty());
    }

    #[test]
    fn subnormal_mul_sets_underflow_and_denormal_output() {
        let mut status = st();
        let r = F32::mul(F32(0x0080_0000), F32(0x0080_0001), &mut status);
        assert!(status.test(ExceptionFlags::INEXACT));
        assert!(status.test(ExceptionFlags::UNDERFLOW));
        assert!(status.test(ExceptionFlags::OUTPUT_DENORMAL) || r.is_zero() || r.is_denormal());
    }

    #[cfg(feature = "nan-arm")]
    #[test]
    fn signaling_nan_is_silenced_on_add() {
        let mut status = st();
        let r = F32::add(F32(0x7FA0_0000), F32(0x3F80_0000), &mut status);
        assert_eq!(r.0, 0x7FE0_0000);
        assert!(status.test(ExceptionFlags::INVALID));
    }

    #[test]
    fn compare_is_antisymmetric() {
        let mut status = st();
        let a = F32(0x3F80_0000);
        let b = F32(0x4000_0000);
        let ab = F32::compare_quiet(a, b, &mut status);
        let ba = F32::compare_quiet(b, a, &mut status);
        assert_ne!(ab, ba);
        assert!(!(ab == FloatRelation::Greater && ba == FloatRelation::Greater));
    }

    #[test]
    fn roundtrip_int32() {
        let mut status = st();
        for v in [-2147483648i32, -1, 0, 1, 123456, 2147483647] {
            let f = F32::from_i32(v, &mut status);
            let back = F32::to_i32_round_to_zero(f, &mut status);
            assert_eq!(back, v);
        }
    }
}
