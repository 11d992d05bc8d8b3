//! Kernel message log dump

use std::io::Write;

use super::snapshot;
use crate::domain::{DumpError, TableKind};
use crate::ring::RingBuffer;
use crate::source::KernelSource;

pub(super) fn render(source: &dyn KernelSource, out: &mut dyn Write) -> Result<(), DumpError> {
    let kmess = snapshot(TableKind::KMessages, source.kmessages())?;
    let text = RingBuffer::from_kmessages(&kmess).linearize();

    writeln!(out, "Dump of all messages generated by the kernel.\n")?;
    out.write_all(&text)?;
    Ok(())
}
