//! Memory map dump

use std::io::Write;

use kscope_common::{D, S, T};

use super::{finish_page, is_listed, snapshot};
use crate::domain::{DumpError, TableKind};
use crate::pager::{PageCursor, PageStatus};
use crate::source::KernelSource;

const HEADER: &str = "-nr/name--- --pc--   --sp-- -text---- -data---- -stack--- -cr3-";

pub(super) fn render(
    source: &dyn KernelSource,
    cursor: &mut PageCursor,
    lines: usize,
    out: &mut dyn Write,
) -> Result<PageStatus, DumpError> {
    let procs = snapshot(TableKind::ProcTable, source.proc_table())?;

    writeln!(out, "\n{HEADER}")?;
    let page = cursor.next_page(&procs, lines, is_listed(TableKind::ProcTable));
    for (_, p) in &page.rows {
        let (text, data, stack) = (p.memmap[T], p.memmap[D], p.memmap[S]);
        writeln!(
            out,
            "{:>3} {:<7.7}{:>7x} {:>8x} {:>4x} {:>4x} {:>4x} {:>4x} {:>5x} {:>5x} {:>8x}",
            p.nr,
            p.name(),
            p.pc,
            p.sp,
            text.phys,
            text.len,
            data.phys,
            data.len,
            stack.phys,
            stack.len,
            p.cr3
        )?;
    }
    finish_page(out, page.status)?;
    Ok(page.status)
}
