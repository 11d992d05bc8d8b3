//! Scheduling queue dump
//!
//! The ready queues are linked lists threaded through the process table by
//! `next_ready`. Both the queue heads and the links are kernel addresses, so
//! the copy is relocated against the kernel's process table address before
//! any link is followed.

use std::io::Write;

use kscope_common::NIL_PTR;
use log::warn;

use super::{metadata, snapshot};
use crate::domain::{DumpError, KernelAddr, LocalAddr, TableKind};
use crate::relocation::{relocate, ChainEnd, LocalTable};
use crate::source::KernelSource;

pub(super) fn render(source: &dyn KernelSource, out: &mut dyn Write) -> Result<(), DumpError> {
    let mut info = snapshot(TableKind::SchedInfo, source.sched_info())?;

    let local_base = LocalAddr::of_slice(&info.procs);
    if TableKind::SchedInfo.descriptor().has_pointers {
        let kinfo = metadata(TableKind::KernelInfo, source.kinfo())?;
        let reloc = relocate(&mut info.procs, KernelAddr(kinfo.proc_addr), local_base);
        reloc.apply_all(&mut info.ready_heads);
    }
    let table = LocalTable::new(&info.procs, local_base);

    writeln!(out, "Dumping scheduling queues.")?;
    for (queue, &head) in info.ready_heads.iter().enumerate() {
        if head == NIL_PTR {
            continue;
        }
        write!(out, "{queue:>2}: ")?;
        let chain = table.follow(head, |p| p.next_ready);
        for (_, p) in &chain.entries {
            write!(out, "{:>3} ", p.nr)?;
        }
        match chain.end {
            ChainEnd::Nil => {}
            ChainEnd::Dangling(_) => {
                warn!("Scheduling queue {queue} has a link outside the process table");
                write!(out, "<bad link>")?;
            }
            ChainEnd::Cycle => {
                warn!("Scheduling queue {queue} loops");
                write!(out, "<loop>")?;
            }
        }
        writeln!(out)?;
    }
    writeln!(out)?;
    Ok(())
}
