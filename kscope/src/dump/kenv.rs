//! Kernel info and machine structure dump

use std::io::Write;

use super::snapshot;
use crate::domain::{DumpError, TableKind};
use crate::source::KernelSource;

pub(super) fn render(source: &dyn KernelSource, out: &mut dyn Write) -> Result<(), DumpError> {
    let kinfo = snapshot(TableKind::KernelInfo, source.kinfo())?;
    let machine = snapshot(TableKind::Machine, source.machine())?;

    writeln!(out, "Dump of kinfo and machine structures.\n")?;
    writeln!(out, "Machine structure:")?;
    writeln!(out, "- pc_at:      {:>3}", machine.pc_at)?;
    writeln!(out, "- ps_mca:     {:>3}", machine.ps_mca)?;
    writeln!(out, "- processor:  {:>3}", machine.processor)?;
    writeln!(out, "- vdu_ega:    {:>3}", machine.vdu_ega)?;
    writeln!(out, "- vdu_vga:    {:>3}\n", machine.vdu_vga)?;
    writeln!(out, "Kernel info structure:")?;
    writeln!(out, "- code_base:  {:>5}", kinfo.code_base)?;
    writeln!(out, "- code_size:  {:>5}", kinfo.code_size)?;
    writeln!(out, "- data_base:  {:>5}", kinfo.data_base)?;
    writeln!(out, "- data_size:  {:>5}", kinfo.data_size)?;
    writeln!(out, "- proc_addr:  {:>5}", kinfo.proc_addr)?;
    writeln!(out, "- bootdev_base:  {:>5}", kinfo.bootdev_base)?;
    writeln!(out, "- bootdev_size:  {:>5}", kinfo.bootdev_size)?;
    writeln!(out, "- ramdev_base:   {:>5}", kinfo.ramdev_base)?;
    writeln!(out, "- ramdev_size:   {:>5}", kinfo.ramdev_size)?;
    writeln!(out, "- nr_procs:     {:>3}", kinfo.nr_procs)?;
    writeln!(out, "- nr_tasks:     {:>3}", kinfo.nr_tasks)?;
    writeln!(out, "- release:      {}", kinfo.release())?;
    writeln!(out, "- version:      {}", kinfo.version())?;
    if kinfo.relocking != 0 {
        writeln!(out, "- relocking:    {}", kinfo.relocking)?;
    }
    writeln!(out)?;
    Ok(())
}
