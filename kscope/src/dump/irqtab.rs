//! IRQ hook dump

use std::io::Write;

use kscope_common::IRQ_REENABLE;

use super::snapshot;
use crate::domain::{DumpError, TableKind};
use crate::source::KernelSource;

pub(super) fn render(source: &dyn KernelSource, out: &mut dyn Write) -> Result<(), DumpError> {
    let hooks = snapshot(TableKind::IrqHooks, source.irq_hooks())?;
    let actids = snapshot(TableKind::IrqActids, source.irq_actids())?;

    writeln!(out, "IRQ policies dump shows use of kernel's IRQ hooks.")?;
    writeln!(out, "-h.id- -proc.nr- -irq nr- -policy- -notify id-")?;
    for (id, hook) in hooks.iter().enumerate() {
        write!(out, "{id:>3}")?;
        if hook.is_unused() {
            writeln!(out, "    <unused>")?;
            continue;
        }
        let policy = if hook.policy & IRQ_REENABLE != 0 { "reenable" } else { "    -   " };
        write!(out, "{:>10}      ({:02})   {policy}   {}", hook.proc_nr_e, hook.irq, hook.notify_id)?;

        // Bit `id` of the line's active-id word: this hook has the line masked
        let masked = usize::try_from(hook.irq)
            .ok()
            .and_then(|irq| actids.get(irq))
            .is_some_and(|ids| id < 32 && ids & (1 << id) != 0);
        if masked {
            write!(out, " masked")?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;
    Ok(())
}
