//! System privileges dump
//!
//! One row per live process. Processes without a privilege structure of
//! their own share the user structure at [`USER_PRIV_ID`].

use std::io::Write;

use kscope_common::{Priv, Proc, USER_PRIV_ID};

use super::{finish_page, is_listed, snapshot};
use crate::bitmask::{format_flags, hex_words, PRIV_FLAGS, TRAP_FLAGS};
use crate::domain::{DumpError, ProcNr, TableKind};
use crate::pager::{PageCursor, PageStatus};
use crate::source::KernelSource;

const HEADER: &str =
    "--nr-id-name---- -flags- -traps- grants -ipc_to-- -ipc_sr-- -system calls--";

/// Shown when even the user structure is missing from the copy
static MISSING_PRIV: Priv = Priv::unused(0);

fn priv_of<'a>(privs: &'a [Priv], proc: &Proc) -> &'a Priv {
    privs
        .iter()
        .find(|sp| sp.proc_nr == proc.nr)
        .or_else(|| privs.get(USER_PRIV_ID))
        .unwrap_or(&MISSING_PRIV)
}

pub(super) fn render(
    source: &dyn KernelSource,
    cursor: &mut PageCursor,
    lines: usize,
    out: &mut dyn Write,
) -> Result<PageStatus, DumpError> {
    let privs = snapshot(TableKind::PrivTable, source.priv_table())?;
    let procs = snapshot(TableKind::ProcTable, source.proc_table())?;

    writeln!(out, "\n{HEADER}")?;
    let page = cursor.next_page(&procs, lines, is_listed(TableKind::ProcTable));
    for (_, p) in &page.rows {
        let sp = priv_of(&privs, p);
        writeln!(
            out,
            "{} ({:02}) {:<7.7} {}   {} {:>7}{}{} {}",
            ProcNr(p.nr),
            sp.id,
            p.name(),
            format_flags(u32::from(sp.flags), PRIV_FLAGS),
            format_flags(sp.trap_mask, TRAP_FLAGS),
            sp.grant_entries,
            hex_words(&sp.ipc_to),
            hex_words(&sp.ipc_sendrec),
            hex_words(&sp.k_call_mask)
        )?;
    }
    finish_page(out, page.status)?;
    Ok(page.status)
}
