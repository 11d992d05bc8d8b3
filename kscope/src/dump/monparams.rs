//! Boot monitor parameter dump

use std::io::Write;

use super::snapshot;
use crate::domain::{DumpError, TableKind};
use crate::source::KernelSource;

/// `key=value` strings of a NUL-separated list; an empty string ends it
fn params(buf: &[u8]) -> impl Iterator<Item = &[u8]> {
    buf.split(|&b| b == 0).take_while(|s| !s.is_empty())
}

pub(super) fn render(source: &dyn KernelSource, out: &mut dyn Write) -> Result<(), DumpError> {
    let buf = snapshot(TableKind::MonitorParams, source.monitor_params())?;

    writeln!(out, "Dump of kernel environment strings set by boot monitor.\n")?;
    for param in params(&buf) {
        out.write_all(param)?;
        writeln!(out)?;
    }
    writeln!(out)?;
    Ok(())
}
