//! AArch64 exception engine (design §4.2).
//!
//! Given a pending exception class and syndrome, computes the target
//! exception level, applies the masking rules, and performs vector entry.
//! AArch32 exception entry is a stated Non-goal: a request that would need
//! to enter AArch32 is detected and refused, never emulated.

use crate::state::{CpuState, Daif, ExceptionLevel, Pstate};

/// The class of exception being routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionClass {
    Synchronous,
    Irq,
    Fiq,
    SError,
}

/// The `SCR_EL3` fields the target-EL cascade consults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrEl3Fields {
    pub ns: bool,
    pub eel2: bool,
    pub ea: bool,
    pub irq: bool,
    pub fiq: bool,
    pub rw: bool,
}

/// The `HCR_EL2` fields the target-EL cascade consults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HcrEl2Fields {
    pub tge: bool,
    pub amo: bool,
    pub imo: bool,
    pub fmo: bool,
    pub e2h: bool,
    pub rw: bool,
}

/// A field pattern: `None` is a wildcard (matches either value), `Some(b)`
/// requires the field to equal `b`. Mirrors `check_scr_el3`/`check_hcr_el2`'s
/// "matches if every non-wildcard field matches" rule (design §4.2).
fn field_matches(pattern: Option<bool>, actual: bool) -> bool {
    pattern.map_or(true, |want| want == actual)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScrPattern {
    pub ns: Option<bool>,
    pub eel2: Option<bool>,
    pub ea: Option<bool>,
    pub irq: Option<bool>,
    pub fiq: Option<bool>,
    pub rw: Option<bool>,
}

/// `check_scr_el3`: true if every non-wildcard field in `pattern` matches
/// `actual`.
pub fn check_scr_el3(pattern: ScrPattern, actual: ScrEl3Fields) -> bool {
    field_matches(pattern.ns, actual.ns)
        && field_matches(pattern.eel2, actual.eel2)
        && field_matches(pattern.ea, actual.ea)
        && field_matches(pattern.irq, actual.irq)
        && field_matches(pattern.fiq, actual.fiq)
        && field_matches(pattern.rw, actual.rw)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HcrPattern {
    pub tge: Option<bool>,
    pub amo: Option<bool>,
    pub imo: Option<bool>,
    pub fmo: Option<bool>,
    pub e2h: Option<bool>,
    pub rw: Option<bool>,
}

/// `check_hcr_el2`: true if every non-wildcard field in `pattern` matches
/// `actual`. `amo`/`imo`/`fmo` are kept as three independent fields rather
/// than one collapsed "routes to EL2" bit, per `helper.c`'s
/// `arm_phys_excp_target_el`.
pub fn check_hcr_el2(pattern: HcrPattern, actual: HcrEl2Fields) -> bool {
    field_matches(pattern.tge, actual.tge)
        && field_matches(pattern.amo, actual.amo)
        && field_matches(pattern.imo, actual.imo)
        && field_matches(pattern.fmo, actual.fmo)
        && field_matches(pattern.e2h, actual.e2h)
        && field_matches(pattern.rw, actual.rw)
}

/// Outcome of target-EL selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetEl {
    Route(ExceptionLevel),
    /// The IRQ/FIQ is masked at its natural target; nothing happens.
    Ignored,
    /// Routing would require AArch32 entry, which this engine does not
    /// implement (design §1 Non-goals, §9 Open Question).
    RefusedAArch32,
}

/// Selects the target EL for `class` raised while the CPU is at
/// `state.current_el`, given the routing-control fields (design §4.2).
pub fn select_target_el(
    state: &CpuState,
    class: ExceptionClass,
    scr: ScrEl3Fields,
    hcr: HcrEl2Fields,
) -> TargetEl {
    let el2_implemented = state.features.contains(crate::state::CpuFeatures::EL2);
    let el3_implemented = state.features.contains(crate::state::CpuFeatures::EL3);

    let routes_to_el2 = el2_implemented
        && state.current_el <= ExceptionLevel::El1
        && match class {
            ExceptionClass::Irq => hcr.tge || hcr.imo,
            ExceptionClass::Fiq => hcr.tge || hcr.fmo,
            ExceptionClass::SError => hcr.tge || hcr.amo,
            ExceptionClass::Synchronous => hcr.tge,
        };

    let routes_to_el3 = el3_implemented
        && match class {
            ExceptionClass::Irq => scr.irq,
            ExceptionClass::Fiq => scr.fiq,
            ExceptionClass::SError => scr.ea,
            ExceptionClass::Synchronous => false,
        };

    let natural_target = if routes_to_el3 {
        ExceptionLevel::El3
    } else if routes_to_el2 {
        ExceptionLevel::El2
    } else if state.current_el.is_higher_than(ExceptionLevel::El1) {
        state.current_el
    } else {
        ExceptionLevel::El1
    };

    // Entering a lower EL than current is disallowed (design §4.2): clamp
    // up to current_el rather than route down.
    let target = if natural_target.is_higher_than(state.current_el) || natural_target == state.current_el {
        natural_target
    } else {
        state.current_el
    };

    // AArch32 entry is refused (design §1 Non-goals): a target EL whose
    // execution state would have to be AArch32 because neither SCR_EL3.RW
    // nor HCR_EL2.RW selects AArch64 is out of scope.
    if target == ExceptionLevel::El3 && !scr.rw {
        return TargetEl::RefusedAArch32;
    }
    if target == ExceptionLevel::El2 && !hcr.rw && !(target == ExceptionLevel::El3) {
        return TargetEl::RefusedAArch32;
    }
    if target == ExceptionLevel::El1 && !scr.rw && !hcr.rw {
        return TargetEl::RefusedAArch32;
    }

    TargetEl::Route(target)
}

/// `irq_masked` (design §4.2): when `PSTATE.I` is set, an IRQ is unmasked
/// only if NMI is implemented, ALLINT is clear, and the IRQ carries
/// superpriority. When clear, masked iff NMI is implemented and ALLINT set.
pub fn irq_masked(state: &CpuState, nmi_implemented: bool, superpriority: bool, ignore_pstate_aif: bool) -> bool {
    if ignore_pstate_aif {
        return false;
    }
    if state.daif.contains(Daif::I) {
        !(nmi_implemented && !state.pstate.contains(Pstate::ALLINT) && superpriority)
    } else {
        nmi_implemented && state.pstate.contains(Pstate::ALLINT)
    }
}

/// `fiq_masked`, analogous to [`irq_masked`] with `PSTATE.F`.
pub fn fiq_masked(state: &CpuState, nmi_implemented: bool, superpriority: bool, ignore_pstate_aif: bool) -> bool {
    if ignore_pstate_aif {
        return false;
    }
    if state.daif.contains(Daif::F) {
        !(nmi_implemented && !state.pstate.contains(Pstate::ALLINT) && superpriority)
    } else {
        nmi_implemented && state.pstate.contains(Pstate::ALLINT)
    }
}

/// `ignore_pstate_aif` becomes true when the target EL is strictly higher
/// than current and the routing rules (HCR_EL2/SCR_EL3, rules RXBYXL/LMWZH)
/// say PSTATE masks do not apply — i.e. virtualization/secure routing always
/// takes priority over the running EL's own mask bits.
pub fn ignore_pstate_aif(state: &CpuState, target: ExceptionLevel, routed_by_virtualization: bool) -> bool {
    target.is_higher_than(state.current_el) && routed_by_virtualization
}

/// Vector table base offsets (design §4.2 step 5), before the per-class
/// +0x80/+0x100/+0x180 addend.
mod vector_base {
    pub const SAME_EL_SP0: u64 = 0x000;
    pub const SAME_EL_SPX: u64 = 0x200;
    pub const LOWER_AARCH64: u64 = 0x400;
    pub const LOWER_AARCH32: u64 = 0x600;
}

fn class_addend(class: ExceptionClass) -> u64 {
    match class {
        ExceptionClass::Synchronous => 0x000,
        ExceptionClass::Irq => 0x080,
        ExceptionClass::Fiq => 0x100,
        ExceptionClass::SError => 0x180,
    }
}

/// The data an exception entry writes before redirecting the guest PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorEntry {
    pub target_el: ExceptionLevel,
    pub vector_address: u64,
    pub new_pstate_m: (ExceptionLevel, bool),
}

/// Computes `aarch64_pstate_mode(target_el, handler=true)`: the EL and the
/// SP_ELx-vs-SP_EL0 selector a handler enters with. Handler mode always uses
/// SP_ELx except at EL0, which has no SP_ELx.
pub fn aarch64_pstate_mode(target_el: ExceptionLevel) -> (ExceptionLevel, bool) {
    (target_el, target_el != ExceptionLevel::El0)
}

/// Performs the full entry sequence (design §4.2 steps 1-8) for a
/// synchronous exception with `syndrome`/`vaddress`, or an IRQ/FIQ/SError
/// with no syndrome payload. Returns the computed [`VectorEntry`]; the
/// caller is responsible for the actual PC redirect in its execution loop.
#[allow(clippy::too_many_arguments)]
pub fn enter_exception(
    state: &mut CpuState,
    class: ExceptionClass,
    target_el: ExceptionLevel,
    same_el_uses_spx: bool,
    lower_el_aarch32: bool,
    syndrome: Option<(u32, u64)>,
) -> VectorEntry {
    let new_mode = aarch64_pstate_mode(target_el);

    // Step 2: set DAIF, clear TCO, inherit SSBS from SCTLR.DSSBS.
    state.daif |= Daif::D | Daif::A | Daif::I | Daif::F;
    state.pstate.remove(Pstate::TCO);
    let sctlr = state.sysregs.sctlr_el[target_el as usize];
    if sctlr & (1 << 44) != 0 {
        state.pstate.insert(Pstate::SSBS);
    } else {
        state.pstate.remove(Pstate::SSBS);
    }

    // Step 3: PAN inheritance — SCTLR.SPAN controls whether a higher-EL
    // entry preserves or sets PAN. If SPAN is clear, PAN is forced set.
    if sctlr & (1 << 23) == 0 {
        state.pstate.insert(Pstate::PAN);
    }

    // Step 4: bank current PSTATE's NZCV+DAIF summary into SPSR_ELn.
    let spsr_value = (state.nzcv() as u64) | (state.daif.bits() as u64) << 6;
    state.sysregs.spsr_el[target_el as usize] = spsr_value;

    // Step 5: vector address.
    let same_el = target_el == state.current_el;
    let mut base = if same_el {
        if same_el_uses_spx { vector_base::SAME_EL_SPX } else { vector_base::SAME_EL_SP0 }
    } else if lower_el_aarch32 {
        vector_base::LOWER_AARCH32
    } else {
        vector_base::LOWER_AARCH64
    };
    base += class_addend(class);
    let vbar = state.sysregs.vbar_el[target_el as usize];
    let vector_address = vbar + base;

    // Step 6: ELR/ESR/FAR.
    state.sysregs.elr_el[target_el as usize] = state.regs.pc;
    if let Some((syn, vaddr)) = syndrome {
        state.sysregs.esr_el[target_el as usize] = syn as u64;
        state.scratch.syndrome = syn;
        if class == ExceptionClass::Synchronous {
            state.sysregs.far_el[target_el as usize] = vaddr;
            state.scratch.vaddress = vaddr;
        }
    }

    // Step 7: commit new PSTATE.
    state.current_el = new_mode.0;
    state.sp_uses_elx = new_mode.1;
    state.aarch64 = true;
    state.rebuild_hflags();

    // Step 8: jump.
    state.regs.pc = vector_address;

    VectorEntry { target_el, vector_address, new_pstate_m: new_mode }
}

/// An illegal exception return (unsupported mode, lower privilege than
/// current, width mismatch) sets `PSTATE.IL`, resumes at ELR, and logs — it
/// does not raise (design §4.2, §7).
pub fn illegal_exception_return(state: &mut CpuState, reason: &str) {
    log::error!("illegal exception return: {reason}");
    state.pstate.insert(Pstate::IL);
    state.regs.pc = state.sysregs.elr_el[state.current_el as usize];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ArmCoreConfig, CpuFeatures};

    fn config() -> ArmCoreConfig {
        ArmCoreConfig {
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
            features: CpuFeatures::AARCH64 | CpuFeatures::EL2 | CpuFeatures::EL3,
            reset_pmcr_el0: 0,
            sve_vl_quadwords: 0,
            sme_svl_quadwords: 0,
        }
    }

    fn el0_state() -> CpuState {
        let mut s = CpuState::reset(&config());
        s.current_el = ExceptionLevel::El0;
        s
    }

    #[test]
    fn el0_to_el1_without_tge() {
        let state = el0_state();
        let scr = ScrEl3Fields { rw: true, ..Default::default() };
        let hcr = HcrEl2Fields { rw: true, ..Default::default() };
        assert_eq!(select_target_el(&state, ExceptionClass::Irq, scr, hcr), TargetEl::Route(ExceptionLevel::El1));
    }

    #[test]
    fn el0_to_el2_with_tge() {
        let state = el0_state();
        let scr = ScrEl3Fields { ns: true, rw: true, ..Default::default() };
        let hcr = HcrEl2Fields { tge: true, rw: true, ..Default::default() };
        assert_eq!(select_target_el(&state, ExceptionClass::Irq, scr, hcr), TargetEl::Route(ExceptionLevel::El2));
    }

    #[test]
    fn aarch32_only_routing_is_refused() {
        let state = el0_state();
        let scr = ScrEl3Fields { rw: false, ..Default::default() };
        let hcr = HcrEl2Fields { rw: false, ..Default::default() };
        assert_eq!(select_target_el(&state, ExceptionClass::Irq, scr, hcr), TargetEl::RefusedAArch32);
    }

    #[test]
    fn scenario_exception_routing_irq_el0_to_el2() {
        let mut state = el0_state();
        state.sysregs.vbar_el[2] = 0x8000_0000;
        state.regs.pc = 0x4000;
        state.nf = false;
        state.zf = true;
        let entry = enter_exception(
            &mut state,
            ExceptionClass::Irq,
            ExceptionLevel::El2,
            true,
            false,
            None,
        );
        assert_eq!(entry.vector_address, 0x8000_0000 + 0x400 + 0x080);
        assert_eq!(state.sysregs.elr_el[2], 0x4000);
        assert_eq!(state.current_el, ExceptionLevel::El2);
        assert_eq!(state.regs.pc, entry.vector_address);
    }

    #[test]
    fn check_scr_el3_wildcard_matches_either_value() {
        let pattern = ScrPattern { ns: Some(true), ..Default::default() };
        let actual_true = ScrEl3Fields { ns: true, ..Default::default() };
        let actual_false = ScrEl3Fields { ns: false, ..Default::default() };
        assert!(check_scr_el3(pattern, actual_true));
        assert!(!check_scr_el3(pattern, actual_false));
    }
}
