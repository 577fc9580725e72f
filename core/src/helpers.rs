//! Generated-code helper surface (design §6, second list).
//!
//! Plain functions over `&mut CpuState`, grounded in the soft-TLB,
//! exception, MTE, and soft-float types from `vcpu-hal`/`vcpu-softfloat`.
//! Only the helpers this workspace's scope can give a real body to are
//! implemented; SIMD/NEON lane-wise helpers are declared with their stable
//! name and signature and a `todo!()` body, since vector-lane arithmetic is
//! out of scope (design §1) but the surface generated code calls by name is
//! not.

use vcpu_hal::exception::{self, ExceptionClass};
use vcpu_hal::mte;
use vcpu_hal::softtlb::SoftTlb;
use vcpu_hal::state::{CpuState, Daif, ExceptionLevel};
use vcpu_softfloat::{ExceptionFlags, F16, F32, F64, FloatRelation, FloatStatus, RoundingMode};

// ---------------------------------------------------------------------
// Integer helpers
// ---------------------------------------------------------------------

pub fn udiv64(a: u64, b: u64) -> u64 {
    if b == 0 { 0 } else { a / b }
}

pub fn sdiv64(a: i64, b: i64) -> i64 {
    if b == 0 {
        0
    } else if a == i64::MIN && b == -1 {
        i64::MIN
    } else {
        a / b
    }
}

pub fn rbit64(a: u64) -> u64 {
    a.reverse_bits()
}

// ---------------------------------------------------------------------
// CRC helpers (delegate to the host accelerator)
// ---------------------------------------------------------------------

pub fn crc32_64(host: &mut dyn crate::host::HostCallbacks, data: &[u8]) -> u32 {
    host.crc32(data)
}

pub fn crc32c_64(host: &mut dyn crate::host::HostCallbacks, data: &[u8]) -> u32 {
    host.crc32c(data)
}

// ---------------------------------------------------------------------
// PSTATE ops
// ---------------------------------------------------------------------

/// `MSR SPSel, #imm`: selects SP_ELx vs SP_EL0 for the current EL (a no-op
/// at EL0, which has no SP_ELx).
pub fn msr_i_spsel(state: &mut CpuState, use_spx: bool) {
    if state.current_el != ExceptionLevel::El0 {
        state.sp_uses_elx = use_spx;
    }
}

pub fn msr_i_daifset(state: &mut CpuState, mask: u8) {
    state.daif |= Daif::from_bits_truncate(mask);
}

pub fn msr_i_daifclear(state: &mut CpuState, mask: u8) {
    state.daif.remove(Daif::from_bits_truncate(mask));
}

/// `ERET`: returns from the current exception level to `ELR_ELn`/`SPSR_ELn`.
/// An illegal target (lower privilege than current, unsupported mode, width
/// mismatch) is diverted to [`exception::illegal_exception_return`] rather
/// than performed (design §4.2, §7).
pub fn exception_return(state: &mut CpuState) {
    let spsr = state.sysregs.spsr_el[state.current_el as usize];
    let target_bits = (spsr & 0x3) as u8;
    let Some(target_el) = ExceptionLevel::from_raw((spsr >> 2) as u8 & 0x3) else {
        exception::illegal_exception_return(state, "SPSR encodes an unsupported mode");
        return;
    };
    if target_el.is_higher_than(state.current_el) {
        exception::illegal_exception_return(state, "ERET target is a higher privilege than current EL");
        return;
    }
    state.current_el = target_el;
    state.sp_uses_elx = target_bits & 0x1 != 0;
    state.set_nzcv((spsr & 0xF000_0000) as u32);
    state.daif = Daif::from_bits_truncate(((spsr >> 6) & 0xF) as u8);
    state.regs.pc = state.sysregs.elr_el[target_el as usize];
    state.rebuild_hflags();
}

// ---------------------------------------------------------------------
// Scalar FP compares
// ---------------------------------------------------------------------

pub fn vfp_cmps_a64(a: F32, b: F32, status: &mut FloatStatus) -> FloatRelation {
    F32::compare_quiet(a, b, status)
}
pub fn vfp_cmpes_a64(a: F32, b: F32, status: &mut FloatStatus) -> FloatRelation {
    F32::compare_signaling(a, b, status)
}
pub fn vfp_cmpd_a64(a: F64, b: F64, status: &mut FloatStatus) -> FloatRelation {
    F64::compare_quiet(a, b, status)
}
pub fn vfp_cmped_a64(a: F64, b: F64, status: &mut FloatStatus) -> FloatRelation {
    F64::compare_signaling(a, b, status)
}
/// `F16` has no direct comparator; widen to `F32` first (exact, since every
/// f16 value round-trips losslessly through f32).
pub fn vfp_cmph_a64(a: F16, b: F16, status: &mut FloatStatus) -> FloatRelation {
    F32::compare_quiet(a.to_f32(status), b.to_f32(status), status)
}
pub fn vfp_cmpeh_a64(a: F16, b: F16, status: &mut FloatStatus) -> FloatRelation {
    F32::compare_signaling(a.to_f32(status), b.to_f32(status), status)
}

// ---------------------------------------------------------------------
// Scalar soft-float helpers (FMULX, FRECPS/FRSQRTS, FRECPX, FCVTXN, the
// single-scalar f64 NEON compares, and f16 sqrt) — all pure scalar
// functions over `vcpu-softfloat`'s `F16`/`F32`/`F64`, not vector lanes.
// ---------------------------------------------------------------------

/// `FMULX`: like multiply, except 0\*Inf and Inf\*0 yield ±2.0 (sign from
/// the operand signs) instead of raising Invalid.
fn is_mulx_special(a_is_inf: bool, a_is_zero: bool, b_is_inf: bool, b_is_zero: bool) -> bool {
    (a_is_inf && b_is_zero) || (a_is_zero && b_is_inf)
}

pub fn vfp_mulxs(a: F32, b: F32, status: &mut FloatStatus) -> F32 {
    if is_mulx_special(a.is_inf(), a.is_zero(), b.is_inf(), b.is_zero()) {
        return F32::from_bits(((a.sign() ^ b.sign()) as u32) << 31 | 0x4000_0000);
    }
    F32::mul(a, b, status)
}
pub fn vfp_mulxd(a: F64, b: F64, status: &mut FloatStatus) -> F64 {
    if is_mulx_special(a.is_inf(), a.is_zero(), b.is_inf(), b.is_zero()) {
        return F64::from_bits(((a.sign() ^ b.sign()) as u64) << 63 | 0x4000_0000_0000_0000);
    }
    F64::mul(a, b, status)
}

/// `FCMEQ`/`FCMGE`/`FCMGT` on a single f64 scalar lane. `FCMEQ` quiet-
/// compares (only a signaling NaN raises Invalid); `FCMGE`/`FCMGT`
/// signaling-compare (any NaN operand raises Invalid).
pub fn neon_ceq_f64(a: u64, b: u64, status: &mut FloatStatus) -> u64 {
    let rel = F64::compare_quiet(F64::from_bits(a), F64::from_bits(b), status);
    if rel == FloatRelation::Equal { u64::MAX } else { 0 }
}
pub fn neon_cge_f64(a: u64, b: u64, status: &mut FloatStatus) -> u64 {
    let rel = F64::compare_signaling(F64::from_bits(a), F64::from_bits(b), status);
    if matches!(rel, FloatRelation::Equal | FloatRelation::Greater) { u64::MAX } else { 0 }
}
pub fn neon_cgt_f64(a: u64, b: u64, status: &mut FloatStatus) -> u64 {
    let rel = F64::compare_signaling(F64::from_bits(a), F64::from_bits(b), status);
    if rel == FloatRelation::Greater { u64::MAX } else { 0 }
}

/// `FRECPS`: one Newton-Raphson step toward a reciprocal, `2.0 - a*b`,
/// computed as a single fused rounding (`fma(-a, b, 2.0)`). The 0\*Inf/
/// Inf\*0 case is special-cased to exactly 2.0 rather than raising Invalid.
pub fn recpsf_f32(a: F32, b: F32, status: &mut FloatStatus) -> F32 {
    if is_mulx_special(a.is_inf(), a.is_zero(), b.is_inf(), b.is_zero()) {
        return F32::from_bits(0x4000_0000);
    }
    F32::fused_mul_add(a.chs(), b, F32::from_bits(0x4000_0000), status)
}
pub fn recpsf_f64(a: F64, b: F64, status: &mut FloatStatus) -> F64 {
    if is_mulx_special(a.is_inf(), a.is_zero(), b.is_inf(), b.is_zero()) {
        return F64::from_bits(0x4000_0000_0000_0000);
    }
    F64::fused_mul_add(a.chs(), b, F64::from_bits(0x4000_0000_0000_0000), status)
}
pub fn recpsf_f16(a: F16, b: F16, status: &mut FloatStatus) -> F16 {
    let wa = a.to_f32(status);
    let wb = b.to_f32(status);
    F16::from_f32(recpsf_f32(wa, wb, status), status)
}

/// `FRSQRTS`: one Newton-Raphson step toward a reciprocal square root,
/// `(3.0 - a*b) / 2`, computed as `fma(-a, b, 3.0)` then an exact halving
/// (`scalbn(.., -1)`, no re-rounding). 0\*Inf/Inf\*0 yields exactly 1.5.
pub fn rsqrtsf_f32(a: F32, b: F32, status: &mut FloatStatus) -> F32 {
    if is_mulx_special(a.is_inf(), a.is_zero(), b.is_inf(), b.is_zero()) {
        return F32::from_bits(0x3FC0_0000);
    }
    let step = F32::fused_mul_add(a.chs(), b, F32::from_bits(0x4040_0000), status);
    F32::scalbn(step, -1, status)
}
pub fn rsqrtsf_f64(a: F64, b: F64, status: &mut FloatStatus) -> F64 {
    if is_mulx_special(a.is_inf(), a.is_zero(), b.is_inf(), b.is_zero()) {
        return F64::from_bits(0x3FF8_0000_0000_0000);
    }
    let step = F64::fused_mul_add(a.chs(), b, F64::from_bits(0x4008_0000_0000_0000), status);
    F64::scalbn(step, -1, status)
}
pub fn rsqrtsf_f16(a: F16, b: F16, status: &mut FloatStatus) -> F16 {
    let wa = a.to_f32(status);
    let wb = b.to_f32(status);
    F16::from_f32(rsqrtsf_f32(wa, wb, status), status)
}

/// `FRECPX`: reciprocal-estimate exponent step. NaN passes through quieted;
/// Inf gives a signed zero; zero/denormal gives a signed infinity;
/// otherwise the biased exponent field is bitwise-complemented and the
/// fraction forced to zero (`F32::min(a, a, status)` is this crate's public
/// single-operand NaN-quieting idiom, mirroring `min`/`max`'s own NaN path).
pub fn frecpx_f32(a: F32, status: &mut FloatStatus) -> F32 {
    if a.is_nan() {
        return F32::min(a, a, status);
    }
    let sign = a.sign();
    if a.is_inf() {
        return if sign { F32::NEG_ZERO } else { F32::ZERO };
    }
    if a.exp() == 0 {
        return if sign { F32::NEG_INFINITY } else { F32::INFINITY };
    }
    let not_exp = 0xFFu32 ^ (a.exp() as u32);
    F32::from_bits((sign as u32) << 31 | not_exp << 23)
}
pub fn frecpx_f64(a: F64, status: &mut FloatStatus) -> F64 {
    if a.is_nan() {
        return F64::min(a, a, status);
    }
    let sign = a.sign();
    if a.is_inf() {
        return if sign { F64::NEG_ZERO } else { F64::ZERO };
    }
    if a.exp() == 0 {
        return if sign { F64::NEG_INFINITY } else { F64::INFINITY };
    }
    let not_exp = 0x7FFu64 ^ (a.exp() as u64);
    F64::from_bits((sign as u64) << 63 | not_exp << 52)
}
pub fn frecpx_f16(a: F16, status: &mut FloatStatus) -> F16 {
    let wa = a.to_f32(status);
    F16::from_f32(frecpx_f32(wa, status), status)
}

/// `FCVTXN` (scalar): narrows f64 to f32 rounding to odd — truncate toward
/// zero, then force the result's LSB to 1 if any bits were lost, avoiding a
/// double-rounding bias for a value that is about to be narrowed again.
pub fn fcvtx_f64_to_f32(a: F64, status: &mut FloatStatus) -> F32 {
    let mut scratch = FloatStatus { rounding_mode: RoundingMode::ToZero, exception_flags: ExceptionFlags::empty(), ..*status };
    let result = F64::to_f32(a, &mut scratch);
    status.raise(scratch.exception_flags);
    if !result.is_nan() && scratch.test(ExceptionFlags::INEXACT) {
        F32::from_bits(result.to_bits() | 1)
    } else {
        result
    }
}

/// f16 `FSQRT`: widened through f32 and narrowed back, exact for the same
/// reason `F16::add`/`mul`/`div` are (an 11-bit f16 significand's sqrt
/// needs no more than f32's 24-bit significand to round correctly).
pub fn sqrt_f16(a: F16, status: &mut FloatStatus) -> F16 {
    let wa = a.to_f32(status);
    F16::from_f32(F32::sqrt(wa, status), status)
}

// ---------------------------------------------------------------------
// SIMD/NEON lane-wise helpers — vector-lane semantics are out of scope
// (design §1); the stable names generated code calls are declared so
// `vcpu-core`'s surface matches.
// ---------------------------------------------------------------------

pub fn neon_addlp_s8(_a: u64) -> u64 {
    todo!("NEON pairwise add-long is out of scope")
}
pub fn neon_addlp_u8(_a: u64) -> u64 {
    todo!("NEON pairwise add-long is out of scope")
}
pub fn neon_addlp_s16(_a: u64) -> u64 {
    todo!("NEON pairwise add-long is out of scope")
}
pub fn neon_addlp_u16(_a: u64) -> u64 {
    todo!("NEON pairwise add-long is out of scope")
}

// ---------------------------------------------------------------------
// Exclusive ops
// ---------------------------------------------------------------------

fn cmpxchg64(state: &mut CpuState, expected: u64, new: u64, current: u64) -> (bool, u64) {
    if state.exclusive.is_idle() || state.exclusive.val != expected || current != expected {
        state.exclusive.clear();
        (false, current)
    } else {
        state.exclusive.clear();
        (true, new)
    }
}

pub fn paired_cmpxchg64_le(state: &mut CpuState, expected: u64, new: u64, current: u64) -> (bool, u64) {
    cmpxchg64(state, expected, new, current)
}
pub fn paired_cmpxchg64_be(state: &mut CpuState, expected: u64, new: u64, current: u64) -> (bool, u64) {
    cmpxchg64(state, expected.swap_bytes(), new.swap_bytes(), current.swap_bytes())
}
pub fn paired_cmpxchg64_le_parallel(state: &mut CpuState, expected: u64, new: u64, current: u64) -> (bool, u64) {
    cmpxchg64(state, expected, new, current)
}
pub fn paired_cmpxchg64_be_parallel(state: &mut CpuState, expected: u64, new: u64, current: u64) -> (bool, u64) {
    cmpxchg64(state, expected.swap_bytes(), new.swap_bytes(), current.swap_bytes())
}

pub fn casp_le_parallel(state: &mut CpuState, expected: u128, new: u128, current: u128) -> (bool, u128) {
    let (ok, lo) = cmpxchg64(state, expected as u64, new as u64, current as u64);
    (ok, (lo as u128) | ((current >> 64) << 64))
}
pub fn casp_be_parallel(state: &mut CpuState, expected: u128, new: u128, current: u128) -> (bool, u128) {
    casp_le_parallel(state, expected.swap_bytes(), new.swap_bytes(), current.swap_bytes())
}

// ---------------------------------------------------------------------
// MTE ops
// ---------------------------------------------------------------------

pub fn irg(current_tag: u8, exclude: u16) -> u8 {
    mte::irg_next_tag(current_tag, exclude)
}

pub fn mte_check(
    state: &CpuState,
    va: u64,
    tbi_enabled: bool,
    tcma_allows: bool,
    tag_mem: &[u8],
    start_odd: bool,
    granule_count: u64,
) -> mte::ProbeOutcome {
    mte::mte_probe_int(state, va, tbi_enabled, tcma_allows, tag_mem, start_odd, granule_count)
}

pub fn mte_check_zva(tag_word: u64, ptr_tag: u8, dcz_blocksize: u32) -> Result<(), u32> {
    mte::mte_check_zva(tag_word, ptr_tag, dcz_blocksize)
}

/// Tag-memory read/write/generate helpers require a host-backed tag store
/// (design §1 Non-goals: physical-memory backing store). Declared here so
/// the stable-name surface matches; bodies belong to the host-integrated
/// build that owns tag memory.
pub fn addsubg(_va: u64, _offset: u8, _tag_offset: u8) -> u64 {
    todo!("tag-memory-backed op; requires a host physical-memory binding")
}
pub fn ldg(_va: u64) -> u64 {
    todo!("tag-memory-backed op; requires a host physical-memory binding")
}
pub fn stg(_va: u64, _tag: u8) {
    todo!("tag-memory-backed op; requires a host physical-memory binding")
}
pub fn stg_parallel(_va: u64, _tag: u8) {
    todo!("tag-memory-backed op; requires a host physical-memory binding")
}
pub fn stg_stub(_va: u64, _tag: u8) {
    todo!("tag-memory-backed op; requires a host physical-memory binding")
}
pub fn st2g(_va: u64, _tag: u8) {
    todo!("tag-memory-backed op; requires a host physical-memory binding")
}
pub fn st2g_parallel(_va: u64, _tag: u8) {
    todo!("tag-memory-backed op; requires a host physical-memory binding")
}
pub fn st2g_stub(_va: u64, _tag: u8) {
    todo!("tag-memory-backed op; requires a host physical-memory binding")
}
pub fn ldgm(_va: u64) -> u64 {
    todo!("tag-memory-backed op; requires a host physical-memory binding")
}
pub fn stgm(_va: u64, _tags: u64) {
    todo!("tag-memory-backed op; requires a host physical-memory binding")
}
pub fn stzgm_tags(_va: u64, _tags: u64) {
    todo!("tag-memory-backed op; requires a host physical-memory binding")
}

// ---------------------------------------------------------------------
// Control-flow helpers
// ---------------------------------------------------------------------

/// `DC ZVA`: zeroes a `4 << dcz_blocksize`-byte block. Tag checking for a
/// tagged page is the caller's responsibility via [`mte_check_zva`] before
/// this is invoked (it needs the tag word, which this helper has no access
/// to — only `cpu_physical_memory_rw` does).
pub fn dc_zva(host: &mut dyn crate::host::HostCallbacks, pa: u64, dcz_blocksize: u32) {
    const MAX_BLOCK: usize = 2048; // largest architectural DCZID_EL0.BS
    let len = (4usize << dcz_blocksize).min(MAX_BLOCK);
    let mut zero = [0u8; MAX_BLOCK];
    host.cpu_physical_memory_rw(pa, &mut zero[..len], true);
}

pub fn exception_bkpt_insn(state: &mut CpuState, syndrome: u32) {
    let target = if state.current_el == ExceptionLevel::El0 { ExceptionLevel::El1 } else { state.current_el };
    exception::enter_exception(state, ExceptionClass::Synchronous, target, true, false, Some((syndrome, state.regs.pc)));
}

/// `memory_barrier_assert`: debug-only check that a claimed barrier ordering
/// actually holds; compiled out in release (design §7).
pub fn memory_barrier_assert(condition: bool, what: &'static str) {
    debug_assert!(condition, "memory barrier invariant violated: {what}");
}

pub fn sysreg_tlb_flush(tlbs: &mut [SoftTlb], index: Option<usize>) {
    for tlb in tlbs {
        tlb.tlb_flush(index);
    }
}

pub fn rebuild_hflags_a64(state: &mut CpuState) {
    state.rebuild_hflags();
}

/// AArch32 TB-flag recomputation: refused, matching the engine's broader
/// AArch32-entry refusal (design §1 Non-goals).
pub fn rebuild_hflags_a32(_state: &mut CpuState) {
    todo!("AArch32 is refused, not emulated")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udiv64_by_zero_returns_zero() {
        assert_eq!(udiv64(10, 0), 0);
    }

    #[test]
    fn sdiv64_min_by_neg_one_saturates() {
        assert_eq!(sdiv64(i64::MIN, -1), i64::MIN);
    }

    #[test]
    fn rbit64_reverses_bit_order() {
        assert_eq!(rbit64(1), 1u64 << 63);
    }

    #[test]
    fn vfp_mulxs_of_zero_and_infinity_is_signed_two() {
        let mut status = FloatStatus::new();
        let r = vfp_mulxs(F32::ZERO, F32::INFINITY, &mut status);
        assert_eq!(r, F32::from_bits(0x4000_0000));
        let r = vfp_mulxs(F32::NEG_ZERO, F32::INFINITY, &mut status);
        assert_eq!(r, F32::from_bits(0xC000_0000));
        assert!(!status.test(ExceptionFlags::INVALID));
    }

    #[test]
    fn vfp_mulxs_ordinary_case_matches_mul() {
        let mut status = FloatStatus::new();
        let a = F32::from_i32(3, &mut status);
        let b = F32::from_i32(4, &mut status);
        assert_eq!(vfp_mulxs(a, b, &mut status), F32::mul(a, b, &mut status));
    }

    #[test]
    fn recpsf_f32_one_and_one_is_one() {
        let mut status = FloatStatus::new();
        let one = F32::from_i32(1, &mut status);
        assert_eq!(recpsf_f32(one, one, &mut status), one);
    }

    #[test]
    fn rsqrtsf_f32_one_and_one_is_one() {
        let mut status = FloatStatus::new();
        let one = F32::from_i32(1, &mut status);
        assert_eq!(rsqrtsf_f32(one, one, &mut status), one);
    }

    #[test]
    fn frecpx_f32_complements_the_exponent() {
        let mut status = FloatStatus::new();
        let one = F32::from_i32(1, &mut status);
        let r = frecpx_f32(one, &mut status);
        assert_eq!(r.exp(), 0xFF ^ one.exp());
        assert_eq!(r.frac(), 0);
    }

    #[test]
    fn frecpx_f32_infinity_is_signed_zero() {
        let mut status = FloatStatus::new();
        assert_eq!(frecpx_f32(F32::NEG_INFINITY, &mut status), F32::NEG_ZERO);
    }

    #[test]
    fn frecpx_f32_zero_is_infinity() {
        let mut status = FloatStatus::new();
        assert_eq!(frecpx_f32(F32::ZERO, &mut status), F32::INFINITY);
    }

    #[test]
    fn neon_ceq_f64_true_sets_all_bits() {
        let mut status = FloatStatus::new();
        let one = F64::from_i32(1, &mut status).to_bits();
        assert_eq!(neon_ceq_f64(one, one, &mut status), u64::MAX);
        assert_eq!(neon_ceq_f64(one, F64::from_i32(2, &mut status).to_bits(), &mut status), 0);
    }

    #[test]
    fn neon_cgt_f64_orders_by_magnitude() {
        let mut status = FloatStatus::new();
        let one = F64::from_i32(1, &mut status).to_bits();
        let two = F64::from_i32(2, &mut status).to_bits();
        assert_eq!(neon_cgt_f64(two, one, &mut status), u64::MAX);
        assert_eq!(neon_cgt_f64(one, two, &mut status), 0);
    }

    #[test]
    fn fcvtx_f64_to_f32_sets_lsb_when_inexact() {
        let mut status = FloatStatus::new();
        // 2^-30 below 1.0: exactly representable in f64 but loses bits
        // when truncated to f32's 24-bit significand.
        let a = F64::add(F64::from_i32(1, &mut status), F64::scalbn(F64::from_i32(1, &mut status), -30, &mut status), &mut status);
        let r = fcvtx_f64_to_f32(a, &mut status);
        assert_eq!(r.to_bits() & 1, 1);
        assert!(status.test(ExceptionFlags::INEXACT));
    }

    #[test]
    fn fcvtx_f64_to_f32_exact_value_is_unaffected() {
        let mut status = FloatStatus::new();
        let one = F64::from_i32(1, &mut status);
        assert_eq!(fcvtx_f64_to_f32(one, &mut status), F32::from_i32(1, &mut status));
    }

    #[test]
    fn sqrt_f16_of_four_is_two() {
        let mut status = FloatStatus::new();
        let four = F16::from_f32(F32::from_i32(4, &mut status), &mut status);
        let two = F16::from_f32(F32::from_i32(2, &mut status), &mut status);
        assert_eq!(sqrt_f16(four, &mut status), two);
    }

    #[test]
    fn cmpxchg_succeeds_when_monitor_matches() {
        let config = vcpu_hal::state::ArmCoreConfig {
            midr: 0,
            ctr: 0,
            clidr: 0,
            mpidr: 0,
            reset_sctlr: 0,
            id_aa64pfr0: 0,
            id_aa64pfr1: 0,
            id_aa64isar0: 0,
            id_aa64isar1: 0,
            id_aa64mmfr0: 0,
            id_aa64mmfr1: 0,
            id_aa64mmfr2: 0,
            gic_num_lrs: 4,
            gic_vpribits: 5,
            gic_vprebits: 5,
            features: vcpu_hal::state::CpuFeatures::AARCH64,
            reset_pmcr_el0: 0,
            sve_vl_quadwords: 0,
            sme_svl_quadwords: 0,
        };
        let mut state = CpuState::reset(&config);
        state.exclusive = vcpu_hal::state::ExclusiveMonitor { addr: 0x1000, val: 42, high: 0 };
        let (ok, result) = paired_cmpxchg64_le(&mut state, 42, 99, 42);
        assert!(ok);
        assert_eq!(result, 99);
        assert!(state.exclusive.is_idle());
    }
}
