//! Dump renderers
//!
//! # Architecture
//!
//! Every dump follows the same shape:
//!
//! ```text
//! KernelSource ──copy──▶ snapshot(s) ──relocate / linearize / page──▶ rows ──▶ sink
//!       │
//!       └── Err(Status) ──▶ DumpError ──▶ "warning: ..." line, no table
//! ```
//!
//! All snapshots a dump needs are taken before the first byte of the table is
//! written, so a failed copy never leaves half a table on the sink.
//!
//! # Key Types
//!
//! - [`DumpKind`] - the dumps an operator can ask for
//! - [`Dumper`] - one operator session: the source, the page size and the
//!   resume positions of the paginated dumps

mod image;
mod irqtab;
mod kenv;
mod kmessages;
mod memmap;
mod monparams;
mod privileges;
mod proctab;
mod sched;
mod timing;

use std::fmt;
use std::io::Write;

use clap::ValueEnum;
use kscope_common::Proc;
use log::{debug, warn};

use crate::domain::{DumpError, Status, TableKind};
use crate::pager::{PageCursor, PageStatus};
use crate::source::KernelSource;

/// Page size used when nothing else is configured
pub const DEFAULT_LINES: usize = 22;

/// Dumps an operator can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DumpKind {
    /// Process table (paginated)
    Proctab,
    /// Process memory maps (paginated)
    Memmap,
    /// System privileges (paginated)
    Privileges,
    /// IRQ hooks
    Irqtab,
    /// Boot image table
    Image,
    /// Scheduling queues
    Sched,
    /// Kernel info and machine structs
    Kenv,
    /// Kernel message log
    Kmessages,
    /// Boot monitor parameters
    Monparams,
    /// Lock timing histograms
    Timing,
}

impl DumpKind {
    pub const ALL: [DumpKind; 10] = [
        DumpKind::Proctab,
        DumpKind::Memmap,
        DumpKind::Privileges,
        DumpKind::Irqtab,
        DumpKind::Image,
        DumpKind::Sched,
        DumpKind::Kenv,
        DumpKind::Kmessages,
        DumpKind::Monparams,
        DumpKind::Timing,
    ];

    /// Command name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            DumpKind::Proctab => "proctab",
            DumpKind::Memmap => "memmap",
            DumpKind::Privileges => "privileges",
            DumpKind::Irqtab => "irqtab",
            DumpKind::Image => "image",
            DumpKind::Sched => "sched",
            DumpKind::Kenv => "kenv",
            DumpKind::Kmessages => "kmessages",
            DumpKind::Monparams => "monparams",
            DumpKind::Timing => "timing",
        }
    }

    /// One-line description for help listings
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            DumpKind::Proctab => "process table",
            DumpKind::Memmap => "memory maps of all processes",
            DumpKind::Privileges => "system privileges of all processes",
            DumpKind::Irqtab => "IRQ hooks and policies",
            DumpKind::Image => "processes in the boot image",
            DumpKind::Sched => "scheduling queues",
            DumpKind::Kenv => "kernel info and machine structures",
            DumpKind::Kmessages => "messages generated by the kernel",
            DumpKind::Monparams => "boot monitor parameters",
            DumpKind::Timing => "lock timing histograms",
        }
    }

    /// Whether repeated invocations page through a large table
    #[must_use]
    pub fn is_paginated(self) -> bool {
        matches!(self, DumpKind::Proctab | DumpKind::Memmap | DumpKind::Privileges)
    }

    /// Look a dump up by command name (case insensitive)
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

impl fmt::Display for DumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resume positions of the paginated dumps
#[derive(Debug, Default, Clone, Copy)]
struct Cursors {
    proctab: PageCursor,
    memmap: PageCursor,
    privileges: PageCursor,
}

impl Cursors {
    fn get(&self, kind: DumpKind) -> Option<&PageCursor> {
        match kind {
            DumpKind::Proctab => Some(&self.proctab),
            DumpKind::Memmap => Some(&self.memmap),
            DumpKind::Privileges => Some(&self.privileges),
            _ => None,
        }
    }
}

/// One operator session over a kernel source
///
/// Page positions live here rather than in globals, so two sessions over the
/// same source page independently.
#[derive(Debug)]
pub struct Dumper<S> {
    source: S,
    lines: usize,
    cursors: Cursors,
}

impl<S: KernelSource> Dumper<S> {
    /// Session printing at most `lines` rows per page (at least one)
    pub fn new(source: S, lines: usize) -> Self {
        Self { source, lines: lines.max(1), cursors: Cursors::default() }
    }

    /// Start every paginated dump from the top again
    pub fn reset(&mut self) {
        let Cursors { proctab, memmap, privileges } = &mut self.cursors;
        for cursor in [proctab, memmap, privileges] {
            cursor.reset();
        }
    }

    /// Run one dump, writing it to `out`
    ///
    /// Snapshot and metadata failures are reported on `out` as a `warning:`
    /// line and count as a finished dump; only a failing sink is an error.
    pub fn dump(&mut self, kind: DumpKind, out: &mut dyn Write) -> Result<PageStatus, DumpError> {
        match self.cursors.get(kind) {
            Some(cursor) => debug!("Running {kind} dump from entry {}", cursor.position()),
            None => debug!("Running {kind} dump"),
        }
        match self.render(kind, out) {
            Ok(status) => Ok(status),
            Err(err) if err.is_recoverable() => {
                warn!("{kind} dump failed: {err}");
                writeln!(out, "warning: {err}")?;
                Ok(PageStatus::Complete)
            }
            Err(err) => Err(err),
        }
    }

    /// Run `kind` until its pass completes
    pub fn dump_all(&mut self, kind: DumpKind, out: &mut dyn Write) -> Result<(), DumpError> {
        while self.dump(kind, out)? == PageStatus::More {
            writeln!(out)?;
        }
        Ok(())
    }

    fn render(&mut self, kind: DumpKind, out: &mut dyn Write) -> Result<PageStatus, DumpError> {
        let source: &dyn KernelSource = &self.source;
        let lines = self.lines;
        let complete = |result: Result<(), DumpError>| result.map(|()| PageStatus::Complete);
        match kind {
            DumpKind::Proctab => proctab::render(source, &mut self.cursors.proctab, lines, out),
            DumpKind::Memmap => memmap::render(source, &mut self.cursors.memmap, lines, out),
            DumpKind::Privileges => {
                privileges::render(source, &mut self.cursors.privileges, lines, out)
            }
            DumpKind::Irqtab => complete(irqtab::render(source, out)),
            DumpKind::Image => complete(image::render(source, out)),
            DumpKind::Sched => complete(sched::render(source, out)),
            DumpKind::Kenv => complete(kenv::render(source, out)),
            DumpKind::Kmessages => complete(kmessages::render(source, out)),
            DumpKind::Monparams => complete(monparams::render(source, out)),
            DumpKind::Timing => complete(timing::render(source, out)),
        }
    }
}

/// Which entries of `table` a listing shows: free slots of sparse tables are skipped
fn is_listed(table: TableKind) -> impl Fn(&Proc) -> bool {
    let sparse = table.descriptor().sparse;
    move |p: &Proc| !(sparse && p.is_empty())
}

/// Take a snapshot, naming the table if the copy fails
fn snapshot<T>(table: TableKind, copy: Result<T, Status>) -> Result<T, DumpError> {
    copy.map_err(|status| DumpError::SnapshotUnavailable { table, status })
}

/// Fetch metadata needed to interpret another snapshot
fn metadata<T>(table: TableKind, copy: Result<T, Status>) -> Result<T, DumpError> {
    copy.map_err(|status| DumpError::MetadataUnavailable { table, status })
}

/// Close a page: a continuation prompt without newline, or an end marker
fn finish_page(out: &mut dyn Write, status: PageStatus) -> std::io::Result<()> {
    match status {
        PageStatus::More => write!(out, "--more--\r"),
        PageStatus::Complete => writeln!(out, "--end--"),
    }
}
