//! Soft-TLB and address translation (design §4.1).
//!
//! A fixed-capacity, direct-mapped cache of guest-VA-to-host-addend
//! mappings, one per (CPU, MMU index). Fills on miss by calling out to an
//! architecture `tlb_fill` callback; invalidation marks entries rather than
//! removing them, so the `Empty -> Resident -> Invalid -> Resident` state
//! machine has no intermediate state visible to callers.

use crate::error::CoreError;

/// Entries per direct-mapped table. Matches the design's `CPU_TLB_SIZE`.
pub const CPU_TLB_SIZE: usize = 256;

pub const PAGE_BITS: u32 = 12;
pub const PAGE_SIZE: u64 = 1 << PAGE_BITS;
pub const PAGE_MASK: u64 = !(PAGE_SIZE - 1);

bitflags::bitflags! {
    /// Flag bits folded into the low bits of a comparator tag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TlbFlags: u64 {
        const INVALID  = 1 << 0;
        const MMIO     = 1 << 1;
        const ONE_SHOT = 1 << 2;
    }
}

const FLAG_MASK: u64 = 0b111;

/// The kind of access a lookup is performed on; the soft-TLB keeps one
/// comparator tag per kind so that, e.g., a page mapped read-only still
/// takes the `tlb_fill` path on a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
    Code,
}

/// Side-table entry carrying MMIO/watchpoint/MTE attributes for a TLB
/// entry. Device/bus semantics are out of scope (design §1 Non-goals); this
/// only records enough to dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoTlbEntry {
    pub is_mmio: bool,
    pub mte_tagged: bool,
}

/// One direct-mapped slot: three comparator tags (flags folded into the low
/// bits) plus the host addend and the MMIO/MTE side-table reference.
#[derive(Debug, Clone, Copy)]
pub struct TlbEntry {
    pub addr_read: u64,
    pub addr_write: u64,
    pub addr_code: u64,
    pub addend: u64,
    pub iotlb: IoTlbEntry,
}

impl TlbEntry {
    pub const fn invalid() -> Self {
        Self {
            addr_read: TlbFlags::INVALID.bits(),
            addr_write: TlbFlags::INVALID.bits(),
            addr_code: TlbFlags::INVALID.bits(),
            addend: 0,
            iotlb: IoTlbEntry { is_mmio: false, mte_tagged: false },
        }
    }

    fn comparator(&self, access: AccessType) -> u64 {
        match access {
            AccessType::Read => self.addr_read,
            AccessType::Write => self.addr_write,
            AccessType::Code => self.addr_code,
        }
    }

    /// Invariant (design §3): `addr_rw & ~(INVALID|MMIO|ONE_SHOT) == va &
    /// PAGE_MASK` iff this entry is authoritative for `access` on this page.
    fn matches(&self, access: AccessType, va: u64) -> bool {
        let cmp = self.comparator(access);
        if cmp & TlbFlags::INVALID.bits() != 0 {
            return false;
        }
        (cmp & !FLAG_MASK) == (va & PAGE_MASK)
    }

    fn is_mmio(&self, access: AccessType) -> bool {
        self.comparator(access) & TlbFlags::MMIO.bits() != 0
    }
}

impl Default for TlbEntry {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Result of a successful translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    HostAddr(u64),
    Mmio(u64),
}

/// Architecture hook invoked on a miss: performs the page-table walk and
/// installs an entry. Returning `Err` means the fill path itself already
/// raised the appropriate abort (design §4.1: "the fast path does not
/// return" in the real engine; here the caller's `Result` models that).
pub trait TlbFill {
    fn tlb_fill(&mut self, va: u64, mmu_idx: usize, access: AccessType, ret_addr: u64) -> Result<TlbEntry, CoreError>;
}

/// One per-CPU, per-MMU-index direct-mapped cache.
#[derive(Debug, Clone)]
pub struct SoftTlb {
    entries: [TlbEntry; CPU_TLB_SIZE],
    #[cfg(feature = "tlb_stats")]
    pub hits: u64,
    #[cfg(feature = "tlb_stats")]
    pub misses: u64,
}

impl SoftTlb {
    pub fn new() -> Self {
        Self {
            entries: [TlbEntry::invalid(); CPU_TLB_SIZE],
            #[cfg(feature = "tlb_stats")]
            hits: 0,
            #[cfg(feature = "tlb_stats")]
            misses: 0,
        }
    }

    fn index(va: u64) -> usize {
        ((va >> PAGE_BITS) as usize) & (CPU_TLB_SIZE - 1)
    }

    /// `translate_and_fill`: translate `va` to a host addend or MMIO marker,
    /// filling via `filler` on miss and retrying once.
    pub fn translate_and_fill(
        &mut self,
        va: u64,
        mmu_idx: usize,
        access: AccessType,
        ret_addr: u64,
        filler: &mut dyn TlbFill,
    ) -> Result<Translation, CoreError> {
        let idx = Self::index(va);
        if self.entries[idx].matches(access, va) {
            #[cfg(feature = "tlb_stats")]
            {
                self.hits += 1;
            }
            return Ok(self.resolve(idx, access, va));
        }

        #[cfg(feature = "tlb_stats")]
        {
            self.misses += 1;
        }

        let filled = filler.tlb_fill(va, mmu_idx, access, ret_addr)?;
        self.entries[idx] = filled;
        if self.entries[idx].matches(access, va) {
            return Ok(self.resolve(idx, access, va));
        }
        Err(CoreError::TranslationFailed)
    }

    fn resolve(&self, idx: usize, access: AccessType, va: u64) -> Translation {
        let entry = &self.entries[idx];
        if entry.is_mmio(access) {
            debug_assert!(entry.addend == 0, "addend must be zero for an MMIO page");
            Translation::Mmio(va)
        } else {
            Translation::HostAddr(va.wrapping_add(entry.addend))
        }
    }

    /// `tlb_flush`: invalidate a single index (`Some(idx)`) or every entry
    /// (`None`). An invalidated entry is replaced with one carrying
    /// `TLB_INVALID`, forcing a refill on next use — it is not removed.
    pub fn tlb_flush(&mut self, index: Option<usize>) {
        match index {
            Some(idx) => self.entries[idx % CPU_TLB_SIZE] = TlbEntry::invalid(),
            None => self.entries = [TlbEntry::invalid(); CPU_TLB_SIZE],
        }
    }

    pub fn install(&mut self, va: u64, entry: TlbEntry) {
        self.entries[Self::index(va)] = entry;
    }
}

impl Default for SoftTlb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFiller {
        addend: u64,
    }

    impl TlbFill for FixedFiller {
        fn tlb_fill(&mut self, va: u64, _mmu_idx: usize, _access: AccessType, _ret_addr: u64) -> Result<TlbEntry, CoreError> {
            let tag = va & PAGE_MASK;
            Ok(TlbEntry {
                addr_read: tag,
                addr_write: tag,
                addr_code: tag,
                addend: self.addend,
                iotlb: IoTlbEntry::default(),
            })
        }
    }

    #[test]
    fn tlb_round_trip_after_fill_and_flush() {
        let mut tlb = SoftTlb::new();
        let mut filler = FixedFiller { addend: 0x1000 };
        let va = 0x8000_1000u64;
        let translation = tlb.translate_and_fill(va, 0, AccessType::Read, 0, &mut filler).unwrap();
        assert_eq!(translation, Translation::HostAddr(va + 0x1000));

        // Scenario 6: translate_u32(0x8000_1004, 1) hits the same page.
        let translation2 = tlb.translate_and_fill(va + 4, 0, AccessType::Read, 0, &mut filler).unwrap();
        assert_eq!(translation2, Translation::HostAddr(va + 4 + 0x1000));

        tlb.tlb_flush(Some(SoftTlb::index(va)));
        // After flush, the fast path no longer matches; fill must run again.
        let idx = SoftTlb::index(va);
        assert!(tlb.entries[idx].comparator(AccessType::Read) & TlbFlags::INVALID.bits() != 0);
    }

    #[test]
    fn mmio_page_returns_va_unchanged() {
        let mut tlb = SoftTlb::new();
        let va = 0x4000_0000u64;
        let tag = va & PAGE_MASK;
        tlb.install(
            va,
            TlbEntry {
                addr_read: tag | TlbFlags::MMIO.bits(),
                addr_write: tag | TlbFlags::MMIO.bits(),
                addr_code: tag | TlbFlags::MMIO.bits(),
                addend: 0,
                iotlb: IoTlbEntry { is_mmio: true, mte_tagged: false },
            },
        );
        let mut filler = FixedFiller { addend: 0 };
        let translation = tlb.translate_and_fill(va, 0, AccessType::Read, 0, &mut filler).unwrap();
        assert_eq!(translation, Translation::Mmio(va));
    }
}
