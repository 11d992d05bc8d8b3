//! Process table dump

use std::io::Write;

use kscope_common::{proc_slot, Proc, RECEIVING, SENDING};

use super::{finish_page, is_listed, snapshot};
use crate::bitmask::{format_flags, RTS_FLAGS};
use crate::domain::{DumpError, Endpoint, ProcNr, TableKind};
use crate::pager::{PageCursor, PageStatus};
use crate::source::KernelSource;

const HEADER: &str = "-nr-----gen---endpoint-name--- -prior-quant- -user----sys--rts flags";

/// Name of the process behind `endpoint`, `ANY` for the wildcard
fn peer_name(procs: &[Proc], endpoint: Endpoint) -> &str {
    if endpoint.is_any() {
        return "ANY";
    }
    proc_slot(endpoint.proc_nr())
        .and_then(|slot| procs.get(slot))
        .filter(|p| !p.is_empty())
        .map_or("?", Proc::name)
}

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
        write!(out, "{} ", ProcNr(p.nr))?;
        write!(out, " {:>5} {:>10} ", Endpoint(p.endpoint).generation(), p.endpoint)?;
        write!(
            out,
            "{:<8.8} {:02}/{:02} {:02}/{:02} {:>6} {:>6} {}",
            p.name(),
            p.priority,
            p.max_priority,
            p.ticks_left,
            p.quantum_size,
            p.user_time,
            p.sys_time,
            format_flags(p.rts_flags, RTS_FLAGS)
        )?;
        if p.rts_flags & (SENDING | RECEIVING) != 0 {
            write!(out, " {:<7.7}", peer_name(&procs, Endpoint(p.getfrom)))?;
        }
        writeln!(out)?;
    }
    finish_page(out, page.status)?;
    Ok(page.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ImageSource;
    use serde_json::json;

    fn run(source: &ImageSource, lines: usize) -> String {
        let mut out = Vec::new();
        render(source, &mut PageCursor::new(), lines, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_row_layout() {
        let source = ImageSource::from_value(json!({
            "proc_table": [{
                "nr": 5, "name": "init", "endpoint": 65541,
                "priority": 7, "max_priority": 7, "ticks_left": 3, "quantum_size": 8,
                "user_time": 12, "sys_time": 340, "rts_flags": 2
            }]
        }))
        .unwrap();
        let text = run(&source, 22);
        let row = text.lines().nth(2).unwrap();
        assert_eq!(row, "  5       2      65541 init     07/07 03/08     12    340 s------");
    }

    #[test]
    fn test_kernel_tasks_are_bracketed() {
        let source = ImageSource::from_value(json!({
            "proc_table": [{ "nr": -4, "name": "IDLE" }, { "nr": -2, "name": "SYSTEM" }]
        }))
        .unwrap();
        let text = run(&source, 22);
        assert!(text.contains("(-4)      0         -4 IDLE"));
        assert!(text.contains("[-2]      0         -2 SYSTEM"));
    }

    #[test]
    fn test_blocked_process_shows_peer() {
        let source = ImageSource::from_value(json!({
            "proc_table": [
                { "nr": 0, "name": "pm", "rts_flags": 8, "getfrom": kscope_common::ANY },
                { "nr": 1, "name": "vfs", "rts_flags": 4, "getfrom": 0 },
                { "nr": 2, "name": "rs", "rts_flags": 4, "getfrom": 77 }
            ]
        }))
        .unwrap();
        let text = run(&source, 22);
        assert!(text.contains("--R---- ANY"));
        assert!(text.contains("-S----- pm"));
        assert!(text.contains("-S----- ?"));
    }

    #[test]
    fn test_long_names_are_truncated() {
        let source = ImageSource::from_value(json!({
            "proc_table": [{ "nr": 3, "name": "verylongname" }]
        }))
        .unwrap();
        assert!(run(&source, 22).contains(" verylong "));
    }

    #[test]
    fn test_free_slots_are_skipped() {
        let source = ImageSource::from_value(json!({ "proc_table": [] })).unwrap();
        let text = run(&source, 22);
        assert_eq!(text, format!("\n{HEADER}\n--end--\n"));
    }

    #[test]
    fn test_garbage_endpoints_render() {
        let source = ImageSource::from_value(json!({
            "proc_table": [
                { "nr": 5, "name": "x", "endpoint": i32::MAX },
                { "nr": 6, "name": "y", "rts_flags": 4, "getfrom": 2_147_483_000 },
                { "nr": 7, "name": "z", "rts_flags": 8, "getfrom": i32::MIN }
            ]
        }))
        .unwrap();
        let text = run(&source, 22);
        assert!(text.contains(&format!(" {} x ", i32::MAX)));
        assert!(text.contains("-S----- ?"));
        assert_eq!(text.lines().filter(|l| l.contains("--R----")).count(), 1);
    }
}
