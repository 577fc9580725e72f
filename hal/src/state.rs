//! Per-CPU architectural state (design §3).
//!
//! `CpuState` is the single record an exception-taking helper, a soft-TLB
//! lookup, or a generated-code helper is handed. Everything it needs to read
//! or mutate lives here or in the immutable [`ArmCoreConfig`] it is paired
//! with; no thread-local globals are introduced, matching the "global
//! mutable state confined to a handful of per-CPU records" design note.

use bitflags::bitflags;

/// ARMv8 exception level, 0 (user) to 3 (secure monitor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ExceptionLevel {
    El0 = 0,
    El1 = 1,
    El2 = 2,
    El3 = 3,
}

impl ExceptionLevel {
    pub const fn from_raw(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::El0),
            1 => Some(Self::El1),
            2 => Some(Self::El2),
            3 => Some(Self::El3),
            _ => None,
        }
    }

    pub const fn is_privileged(self) -> bool {
        !matches!(self, Self::El0)
    }

    /// `true` if `self` is strictly higher privilege than `other`.
    pub const fn is_higher_than(self, other: Self) -> bool {
        (self as u8) > (other as u8)
    }
}

/// AArch64 has two banked AArch32 register files; EL3-in-AArch64 exposes
/// only the non-secure slot (§4.3's access-secure-reg rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityState {
    Secure,
    NonSecure,
}

bitflags! {
    /// PSTATE bits not already kept as DAIF, BTYPE, or the cached NZCV
    /// fields. Current EL and the SP_ELx/SP_EL0 selector are tracked as
    /// explicit `CpuState` fields rather than packed into this word: AArch64
    /// has no `MRS PSTATE`, only per-component accessors (`CurrentEL`,
    /// `SPSel`, `DAIF`, `NZCV`), so there is no wire format this bitflags
    /// type has to match bit-for-bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Pstate: u32 {
        const SS     = 1 << 0;  // single-step
        const IL     = 1 << 1;  // illegal execution state
        const SSBS   = 1 << 2;  // speculative store bypass safe
        const PAN    = 1 << 3;  // privileged access never
        const UAO    = 1 << 4;  // user access override
        const DIT    = 1 << 5;  // data independent timing
        const TCO    = 1 << 6;  // tag check override
        const ALLINT = 1 << 7;  // all IRQ/FIQ interrupt mask
    }
}

bitflags! {
    /// Interrupt mask bits: Debug, SError, IRQ, FIQ.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Daif: u8 {
        const D = 1 << 3;
        const A = 1 << 2;
        const I = 1 << 1;
        const F = 1 << 0;
    }
}

bitflags! {
    /// Streaming-mode/array-storage control for SME register layout carrying
    /// (vector arithmetic itself is out of scope; see [`CpuFeatures::SME`]).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Svcr: u8 {
        const SM = 1 << 0;
        const ZA = 1 << 1;
    }
}

bitflags! {
    /// One bit per architectural feature. Immutable after [`CpuState::reset`]
    /// runs against an [`ArmCoreConfig`]; this is a *guest-configured* model
    /// feature bitmap, not a live hardware ID-register probe.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CpuFeatures: u32 {
        const AARCH64 = 1 << 0;
        const EL2     = 1 << 1;
        const EL3     = 1 << 2;
        const PMU     = 1 << 3;
        const NEON    = 1 << 4;
        const MPU     = 1 << 5;
        const V7      = 1 << 6;
        const V8      = 1 << 7;
        const GIC     = 1 << 8;
        const SVE     = 1 << 9;
        const SME     = 1 << 10;
        const RAS     = 1 << 11;
        const MTE     = 1 << 12;
        const PAUTH   = 1 << 13;
        const BTI     = 1 << 14;
    }
}

bitflags! {
    /// Cached, compressed mirror of PSTATE/SCTLR fields that condition
    /// translation-block generation. Recomputed by [`CpuState::rebuild_hflags`]
    /// after any write that could affect them — never read authoritatively on
    /// its own, only as a fast-path shortcut.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HFlags: u32 {
        const AARCH64     = 1 << 0;
        const SS_ACTIVE   = 1 << 1;
        const PSTATE_SS   = 1 << 2;
        const BE_DATA     = 1 << 3;
        const MMU_ENABLED = 1 << 4;
        const TBI0        = 1 << 5;
        const TBI1        = 1 << 6;
        const MTE_ACTIVE  = 1 << 7;
        const PAN         = 1 << 8;
    }
}

/// Indices into the five generic-timer substates (design §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum TimerId {
    Phys = 0,
    Virt = 1,
    Hyp = 2,
    Sec = 3,
    HypVirt = 4,
}

pub const NUM_TIMERS: usize = 5;

/// One ARM generic timer's compare value and control word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenericTimer {
    pub cval: u64,
    pub ctl: u32,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TimerCtl: u32 {
        const ENABLE = 1 << 0;
        const IMASK  = 1 << 1;
        const ISTATUS = 1 << 2;
    }
}

/// Populated by the fault source, consumed exactly once by the exception
/// engine on entry (design §3: "Exception scratch").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExceptionScratch {
    pub syndrome: u32,
    pub fsr: u32,
    pub vaddress: u64,
    pub target_el: u8,
    pub dabt_syndrome_partial: u32,
}

/// Exclusive-monitor triple backing a guest load-exclusive/store-exclusive
/// pair. `addr == ALL_ONES` iff the monitor is idle (design §3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusiveMonitor {
    pub addr: u64,
    pub val: u64,
    pub high: u64,
}

impl ExclusiveMonitor {
    pub const ALL_ONES: u64 = u64::MAX;

    pub const fn idle() -> Self {
        Self { addr: Self::ALL_ONES, val: 0, high: 0 }
    }

    pub const fn is_idle(&self) -> bool {
        self.addr == Self::ALL_ONES
    }

    pub fn clear(&mut self) {
        *self = Self::idle();
    }
}

/// Constant-after-reset per-model values (design §3). Lifetime = process;
/// many `CpuState`s may share one config by non-owning reference, matching
/// the "arena of CPU records with non-owning indices" design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmCoreConfig {
    pub midr: u64,
    pub ctr: u64,
    pub clidr: u64,
    pub mpidr: u64,
    pub reset_sctlr: u64,
    pub id_aa64pfr0: u64,
    pub id_aa64pfr1: u64,
    pub id_aa64isar0: u64,
    pub id_aa64isar1: u64,
    pub id_aa64mmfr0: u64,
    pub id_aa64mmfr1: u64,
    pub id_aa64mmfr2: u64,
    pub gic_num_lrs: u32,
    pub gic_vpribits: u32,
    pub gic_vprebits: u32,
    pub features: CpuFeatures,
    pub reset_pmcr_el0: u64,
    /// Reset SVE/SME vector length, in quadwords. Register-layout only: no
    /// vector arithmetic is modeled (design §9 — `sve_change_el` is a no-op),
    /// but `hflags` recomputation and EL-transition bookkeeping still need
    /// to know how wide a vector register's layout is.
    pub sve_vl_quadwords: u32,
    pub sme_svl_quadwords: u32,
}

/// Banked system registers, indexed by exception level (design §3;
/// transposition-table descriptors for individual registers live in
/// [`crate::sysregs`] — this struct is the backing storage those descriptors
/// read and write).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysRegBank {
    pub sctlr_el: [u64; 4],
    pub ttbr0_el: [u64; 4],
    pub ttbr1_el: [u64; 4],
    pub tcr_el: [u64; 4],
    pub esr_el: [u64; 4],
    pub far_el: [u64; 4],
    pub vbar_el: [u64; 4],
    pub elr_el: [u64; 4],
    /// `banked_spsr[banked_spsr_index(el)]`, written on exception entry
    /// (design §4.2 step 4).
    pub spsr_el: [u64; 4],
    pub mair_el: [u64; 4],
    pub cpacr_el1: u64,
    pub hcr_el2: u64,
    pub scr_el3: u64,
    pub rgsr_el1: u64,
    pub gcr_el1: u64,
    pub tfsr_el: [u64; 4],
    pub tfsre0_el1: u64,
    /// AArch32 banked registers: `[secure, non-secure]` (design §4.3).
    pub dfsr_banked: [u32; 2],
    pub ifsr_banked: [u32; 2],
    pub dfar_banked: [u32; 2],
    pub ifar_banked: [u32; 2],
}

impl SysRegBank {
    pub const fn reset(reset_sctlr: u64) -> Self {
        Self {
            sctlr_el: [reset_sctlr, reset_sctlr, reset_sctlr, reset_sctlr],
            ttbr0_el: [0; 4],
            ttbr1_el: [0; 4],
            tcr_el: [0; 4],
            esr_el: [0; 4],
            far_el: [0; 4],
            vbar_el: [0; 4],
            elr_el: [0; 4],
            spsr_el: [0; 4],
            mair_el: [0; 4],
            cpacr_el1: 0,
            hcr_el2: 0,
            scr_el3: 0,
            rgsr_el1: 0,
            gcr_el1: 0,
            tfsr_el: [0; 4],
            tfsre0_el1: 0,
            dfsr_banked: [0; 2],
            ifsr_banked: [0; 2],
            dfar_banked: [0; 2],
            ifar_banked: [0; 2],
        }
    }
}

/// General-purpose register file: thirty-two 64-bit X registers (with the
/// mirrored 32-bit `R0..R15` AArch32 view obtained by truncating `x[0..16]`),
/// PC, and the four banked stack pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneralRegisters {
    pub x: [u64; 32],
    pub pc: u64,
    pub sp_el: [u64; 4],
}

impl GeneralRegisters {
    pub const fn reset() -> Self {
        Self { x: [0; 32], pc: 0, sp_el: [0; 4] }
    }

    /// The mirrored 32-bit `Rn` view (AArch32 compatibility, low half of Xn).
    pub const fn r32(&self, n: usize) -> u32 {
        self.x[n] as u32
    }
}

/// Per-logical-CPU architectural state (design §3).
#[derive(Debug, Clone)]
pub struct CpuState {
    pub regs: GeneralRegisters,
    pub pstate: Pstate,
    pub daif: Daif,
    pub btype: u8,
    pub svcr: Svcr,
    pub aarch64: bool,
    pub thumb: bool,
    pub current_el: ExceptionLevel,
    pub security: SecurityState,
    pub sp_uses_elx: bool,

    /// Cached NZCV, split for speed (design §3).
    pub nf: bool,
    pub zf: bool,
    pub cf: bool,
    pub vf: bool,

    pub sysregs: SysRegBank,
    pub timers: [GenericTimer; NUM_TIMERS],
    pub scratch: ExceptionScratch,
    pub features: CpuFeatures,
    pub hflags: HFlags,
    pub exclusive: ExclusiveMonitor,

    /// Current SVE/SME vector length, in quadwords (design §3 EXPANSION).
    /// Set from `ArmCoreConfig` at reset; only [`CpuState::sve_change_el`]
    /// would otherwise touch it, and that is a documented no-op.
    pub sve_vl_quadwords: u32,
    pub sme_svl_quadwords: u32,
}

impl CpuState {
    /// Reset to the power-on state described by `config` (design §8: every
    /// CPU model, after reset, has PSTATE at the highest implemented EL in
    /// handler mode, DAIF all masked, Z set, exclusive monitor idle, PMCR at
    /// its reset value, and `sctlr_el[1..3]` at the config's reset value).
    pub fn reset(config: &ArmCoreConfig) -> Self {
        let highest_el = if config.features.contains(CpuFeatures::EL3) {
            ExceptionLevel::El3
        } else if config.features.contains(CpuFeatures::EL2) {
            ExceptionLevel::El2
        } else {
            ExceptionLevel::El1
        };

        let mut state = Self {
            regs: GeneralRegisters::reset(),
            pstate: Pstate::empty(),
            daif: Daif::D | Daif::A | Daif::I | Daif::F,
            btype: 0,
            svcr: Svcr::empty(),
            aarch64: true,
            thumb: false,
            current_el: highest_el,
            security: SecurityState::Secure,
            sp_uses_elx: true,
            nf: false,
            zf: true,
            cf: false,
            vf: false,
            sysregs: SysRegBank::reset(config.reset_sctlr),
            timers: [GenericTimer::default(); NUM_TIMERS],
            scratch: ExceptionScratch::default(),
            features: config.features,
            hflags: HFlags::AARCH64,
            exclusive: ExclusiveMonitor::idle(),
            sve_vl_quadwords: config.sve_vl_quadwords,
            sme_svl_quadwords: config.sme_svl_quadwords,
        };
        state.rebuild_hflags();
        state
    }

    pub const fn nzcv(&self) -> u32 {
        ((self.nf as u32) << 31) | ((self.zf as u32) << 30) | ((self.cf as u32) << 29) | ((self.vf as u32) << 28)
    }

    pub fn set_nzcv(&mut self, bits: u32) {
        self.nf = bits & (1 << 31) != 0;
        self.zf = bits & (1 << 30) != 0;
        self.cf = bits & (1 << 29) != 0;
        self.vf = bits & (1 << 28) != 0;
    }

    /// Recompute [`HFlags`] from PSTATE/SCTLR. Invariant (design §3): callers
    /// must invoke this after any state change that affects translation-block
    /// generation — it is never updated incrementally.
    pub fn rebuild_hflags(&mut self) {
        let sctlr = self.sysregs.sctlr_el[self.current_el as usize];
        let mut flags = HFlags::empty();
        if self.aarch64 {
            flags |= HFlags::AARCH64;
        }
        if self.pstate.contains(Pstate::SS) {
            flags |= HFlags::PSTATE_SS;
        }
        if sctlr & 1 != 0 {
            flags |= HFlags::MMU_ENABLED;
        }
        if self.pstate.contains(Pstate::PAN) {
            flags |= HFlags::PAN;
        }
        if self.features.contains(CpuFeatures::MTE) && sctlr & (1 << 43) != 0 {
            flags |= HFlags::MTE_ACTIVE;
        }
        self.hflags = flags;
    }

    /// `aarch64_sve_change_el`: deliberately a no-op (design §9 Open
    /// Question — SVE vector-length change across EL transitions is not
    /// modeled; only the register-layout fields in [`ArmCoreConfig`] are
    /// carried).
    pub fn sve_change_el(&mut self, _from: ExceptionLevel, _to: ExceptionLevel) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ArmCoreConfig {
        ArmCoreConfig {
            midr: 0x410f_d083,
            ctr: 0x8444_c004,
            clidr: 0,
            mpidr: 0x8000_0000,
            reset_sctlr: 0x0000_0000_3004_5000,
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
            features: CpuFeatures::AARCH64 | CpuFeatures::EL2 | CpuFeatures::EL3,
            reset_pmcr_el0: 0x4100_3000,
            sve_vl_quadwords: 0,
            sme_svl_quadwords: 0,
        }
    }

    #[test]
    fn reset_matches_universal_invariants() {
        let config = test_config();
        let state = CpuState::reset(&config);
        assert_eq!(state.current_el, ExceptionLevel::El3);
        assert!(state.daif.contains(Daif::D | Daif::A | Daif::I | Daif::F));
        assert!(state.zf);
        assert!(state.exclusive.is_idle());
        assert_eq!(state.sysregs.sctlr_el[1], config.reset_sctlr);
        assert_eq!(state.sysregs.sctlr_el[2], config.reset_sctlr);
        assert_eq!(state.sysregs.sctlr_el[3], config.reset_sctlr);
    }

    #[test]
    fn exclusive_monitor_clear_restores_idle() {
        let mut mon = ExclusiveMonitor { addr: 0x1000, val: 42, high: 0 };
        assert!(!mon.is_idle());
        mon.clear();
        assert!(mon.is_idle());
    }
}
