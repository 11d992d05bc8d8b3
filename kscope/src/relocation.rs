//! # Address Relocation of Copied Kernel Tables
//!
//! A snapshot is a byte-exact copy of a kernel table, so every pointer field
//! inside it still holds a **kernel-space** address. Those addresses mean
//! nothing in our address space. Because all links in one table were written
//! against the same kernel base, a single delta fixes all of them:
//!
//! ```text
//! delta         = local_base - kernel_base
//! local pointer = kernel pointer + delta        (NIL_PTR stays NIL_PTR)
//! ```
//!
//! Relocated pointers are still only numbers. [`LocalTable`] turns them into
//! entry indices of the local copy after checking bounds and alignment, so a
//! corrupt or stale link can never be dereferenced.
//!
//! ## Example
//!
//! ```text
//! kernel proc table at 0x0001_0000, slot size 128
//! local copy at        0x5600_1000
//! delta = 0x55ff_1000
//!
//! slot 1 next_ready = 0x0001_0100 (kernel slot 2)
//!   -> 0x5600_1100 -> local index (0x100 / 128) = 2
//! ```

use kscope_common::{Proc, NIL_PTR};
use log::debug;
use std::fmt;
use std::mem::size_of;

use crate::domain::{KernelAddr, LocalAddr};

/// A kernel structure with pointer fields that need relocating
pub trait Relocatable {
    /// Relocate every pointer field of `self`
    fn relocate_pointers(&mut self, reloc: &Relocation);
}

impl Relocatable for Proc {
    fn relocate_pointers(&mut self, reloc: &Relocation) {
        self.next_ready = reloc.apply(self.next_ready);
    }
}

/// A bare kernel pointer (ready-queue heads)
impl Relocatable for u64 {
    fn relocate_pointers(&mut self, reloc: &Relocation) {
        *self = reloc.apply(*self);
    }
}

/// Relocation context for one snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// `local_base - kernel_base`, two's complement
    delta: u64,
}

impl Relocation {
    #[must_use]
    pub fn new(kernel_base: KernelAddr, local_base: LocalAddr) -> Self {
        let reloc = Self { delta: local_base.0.wrapping_sub(kernel_base.0) };
        debug!("Relocating {kernel_base} -> {local_base} (delta {reloc})");
        reloc
    }

    /// Signed distance between the local copy and the kernel table
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn delta(&self) -> i64 {
        self.delta as i64
    }

    /// Relocate one raw pointer value
    #[must_use]
    pub fn apply(&self, raw: u64) -> u64 {
        if raw == NIL_PTR {
            raw
        } else {
            raw.wrapping_add(self.delta)
        }
    }

    /// Relocate every pointer field of every entry
    pub fn apply_all<T: Relocatable>(&self, entries: &mut [T]) {
        for entry in entries {
            entry.relocate_pointers(self);
        }
    }
}

impl fmt::Display for Relocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let delta = self.delta();
        let sign = if delta < 0 { '-' } else { '+' };
        write!(f, "{sign}{:#x}", delta.unsigned_abs())
    }
}

/// Relocate `entries` from `kernel_base` to `local_base` in place
pub fn relocate<T: Relocatable>(
    entries: &mut [T],
    kernel_base: KernelAddr,
    local_base: LocalAddr,
) -> Relocation {
    let reloc = Relocation::new(kernel_base, local_base);
    reloc.apply_all(entries);
    reloc
}

/// Why a chain of links stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEnd {
    /// Reached `NIL_PTR`
    Nil,
    /// A link pointed outside the table or into the middle of an entry
    Dangling(u64),
    /// A link led back to an entry already visited
    Cycle,
}

/// Entries reached by following a chain of links
#[derive(Debug)]
pub struct Chain<'a, T> {
    pub entries: Vec<(usize, &'a T)>,
    pub end: ChainEnd,
}

/// A local table copy addressed by relocated pointers
#[derive(Debug, Clone, Copy)]
pub struct LocalTable<'a, T> {
    entries: &'a [T],
    base: LocalAddr,
}

impl<'a, T> LocalTable<'a, T> {
    /// View `entries` as if they were located at `base`
    #[must_use]
    pub fn new(entries: &'a [T], base: LocalAddr) -> Self {
        Self { entries, base }
    }

    /// Entry index a relocated pointer refers to
    ///
    /// `None` for `NIL_PTR`, for addresses outside the table and for
    /// addresses that do not fall on an entry boundary.
    #[must_use]
    pub fn index_of(&self, ptr: u64) -> Option<usize> {
        let entry_size = size_of::<T>() as u64;
        if ptr == NIL_PTR || entry_size == 0 {
            return None;
        }
        let offset = ptr.wrapping_sub(self.base.0);
        if offset % entry_size != 0 {
            return None;
        }
        usize::try_from(offset / entry_size).ok().filter(|&index| index < self.entries.len())
    }

    /// Entry a relocated pointer refers to
    #[must_use]
    pub fn resolve(&self, ptr: u64) -> Option<(usize, &'a T)> {
        self.index_of(ptr).map(|index| (index, &self.entries[index]))
    }

    /// Follow links from `head`, reading the next link with `next`
    ///
    /// Stops at `NIL_PTR`, at the first unresolvable link, or at the first
    /// entry reached twice.
    pub fn follow(&self, head: u64, next: impl Fn(&T) -> u64) -> Chain<'a, T> {
        let mut entries = Vec::new();
        let mut seen = vec![false; self.entries.len()];
        let mut ptr = head;
        loop {
            if ptr == NIL_PTR {
                return Chain { entries, end: ChainEnd::Nil };
            }
            let Some((index, entry)) = self.resolve(ptr) else {
                return Chain { entries, end: ChainEnd::Dangling(ptr) };
            };
            if std::mem::replace(&mut seen[index], true) {
                return Chain { entries, end: ChainEnd::Cycle };
            }
            entries.push((index, entry));
            ptr = next(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kscope_common::PROC_SIZE;

    const SIZE: u64 = PROC_SIZE as u64;

    /// Five slots linked 0 -> 3 -> 1 -> NIL, pointers against `kernel_base`
    fn linked_table(kernel_base: u64) -> Vec<Proc> {
        let mut table = vec![Proc::free(); 5];
        table[0].next_ready = kernel_base + 3 * SIZE;
        table[3].next_ready = kernel_base + SIZE;
        table
    }

    fn successors(table: &[Proc], local_base: LocalAddr) -> Vec<Option<usize>> {
        let view = LocalTable::new(table, local_base);
        table.iter().map(|p| view.index_of(p.next_ready)).collect()
    }

    #[test]
    fn test_same_successors_under_different_deltas() {
        let pairs = [
            (0x0001_0000, 0x5600_0000_1000),
            (0x8000_0000, 0x1000),
            (0x4000, 0x4000),
        ];
        let mut expected = None;
        for (kernel_base, local_base) in pairs {
            let mut table = linked_table(kernel_base);
            relocate(&mut table, KernelAddr(kernel_base), LocalAddr(local_base));
            let got = successors(&table, LocalAddr(local_base));
            assert_eq!(got, vec![Some(3), None, None, Some(1), None]);
            if let Some(prev) = &expected {
                assert_eq!(&got, prev);
            }
            expected = Some(got);
        }
    }

    #[test]
    fn test_relocate_against_real_buffer_address() {
        let kernel_base = 0xf000_0000;
        let mut table = linked_table(kernel_base);
        let local = LocalAddr::of_slice(&table);
        relocate(&mut table, KernelAddr(kernel_base), local);

        let view = LocalTable::new(&table, local);
        let chain = view.follow(table[0].next_ready, |p| p.next_ready);
        let indices: Vec<usize> = chain.entries.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![3, 1]);
        assert_eq!(chain.end, ChainEnd::Nil);
    }

    #[test]
    fn test_sentinel_preserved_for_all_deltas() {
        for (kernel_base, local_base) in [(0x1000, 0x1000), (0x1000, 0x9000), (0x9000, 0x1000)] {
            let reloc = Relocation::new(KernelAddr(kernel_base), LocalAddr(local_base));
            assert_eq!(reloc.apply(NIL_PTR), NIL_PTR);
        }
    }

    #[test]
    fn test_negative_delta() {
        let reloc = Relocation::new(KernelAddr(0x9000), LocalAddr(0x1000));
        assert_eq!(reloc.delta(), -0x8000);
        assert_eq!(reloc.to_string(), "-0x8000");
        assert_eq!(reloc.apply(0x9080), 0x1080);
    }

    #[test]
    fn test_zero_delta_is_identity() {
        let reloc = Relocation::new(KernelAddr(0x4000), LocalAddr(0x4000));
        assert_eq!(reloc.delta(), 0);
        assert_eq!(reloc.to_string(), "+0x0");
        assert_eq!(reloc.apply(0x4080), 0x4080);
    }

    #[test]
    fn test_misaligned_and_out_of_range_links() {
        let table = vec![Proc::free(); 4];
        let view = LocalTable::new(&table, LocalAddr(0x1000));
        assert_eq!(view.index_of(0x1000 + SIZE + 8), None);
        assert_eq!(view.index_of(0x1000 + 4 * SIZE), None);
        assert_eq!(view.index_of(0x0800), None);
        assert_eq!(view.index_of(0x1000 + 3 * SIZE), Some(3));
    }

    #[test]
    fn test_follow_detects_cycle() {
        let base = 0x1000;
        let mut table = vec![Proc::free(); 3];
        table[0].next_ready = base + SIZE;
        table[1].next_ready = base;
        let view = LocalTable::new(&table, LocalAddr(base));
        let chain = view.follow(base, |p| p.next_ready);
        assert_eq!(chain.end, ChainEnd::Cycle);
        assert_eq!(chain.entries.len(), 2);
    }

    #[test]
    fn test_follow_reports_dangling_link() {
        let base = 0x1000;
        let mut table = vec![Proc::free(); 2];
        table[0].next_ready = 0xdead_0000;
        let view = LocalTable::new(&table, LocalAddr(base));
        let chain = view.follow(base, |p| p.next_ready);
        assert_eq!(chain.entries.len(), 1);
        assert_eq!(chain.end, ChainEnd::Dangling(0xdead_0000));
    }

    #[test]
    fn test_queue_heads_relocate_like_entries() {
        let mut heads = [0u64, 0x2000 + SIZE];
        relocate(&mut heads, KernelAddr(0x2000), LocalAddr(0x7000));
        assert_eq!(heads, [0, 0x7000 + SIZE]);
    }
}
