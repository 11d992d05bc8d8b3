//! # kscope - Kernel Table Introspection and Dump Reporting
//!
//! kscope renders human-readable reports of a kernel's internal tables: the
//! process table, privilege structures, IRQ hooks, the boot image, the
//! scheduling queues, kernel and machine info, the kernel message log, boot
//! monitor parameters and lock timing histograms. Every report works on a
//! private snapshot copy of a table, never on the live structure.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 Kernel (or a captured image)                  │
//! │        tables in kernel layout, pointers in kernel space      │
//! └──────────────────────────┬───────────────────────────────────┘
//!                            │ KernelSource: copy one table
//!                            ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     kscope (This Crate)                       │
//! │                                                               │
//! │  ┌────────────┐   ┌─────────────┐   ┌──────────────┐         │
//! │  │  Snapshot  │──▶│ Relocation  │──▶│   Renderers  │──▶ sink │
//! │  │   copies   │   │ Ring / Page │   │   (dump::*)  │         │
//! │  └────────────┘   │   Bitmask   │   └──────────────┘         │
//! │                   └─────────────┘          ▲                  │
//! │                                            │                  │
//! │                              ┌─────────────┴─────┐            │
//! │                              │ Dumper / session  │            │
//! │                              │ (page cursors)    │            │
//! │                              └───────────────────┘            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! ### Core Primitives
//!
//! - [`relocation`]: Rewrite kernel-space links inside a snapshot so they point
//!   into the local copy, and follow linked lists with a cycle guard
//! - [`pager`]: Walk a table a page at a time, resuming where the last page
//!   stopped
//! - [`ring`]: Unroll the kernel's circular message buffer into write order
//! - [`bitmask`]: Fixed-width flag columns, bit strings and hex words
//!
//! ### Reports and Sessions
//!
//! - [`dump`]: One renderer per report plus the [`dump::Dumper`] that owns a
//!   session's page cursors
//! - [`session`]: Line-oriented interactive command loop
//! - [`source`]: The [`source::KernelSource`] trait and the JSON image backend
//!
//! ### Support
//!
//! - [`cli`]: Command-line argument parsing
//! - [`preflight`]: Input validation with actionable messages
//! - [`domain`]: Address newtypes, status codes, table descriptors and errors
//!
//! ## Example
//!
//! ```no_run
//! use kscope::dump::{DumpKind, Dumper};
//! use kscope::source::ImageSource;
//!
//! # fn main() -> anyhow::Result<()> {
//! let source = ImageSource::from_file("kernel.json")?;
//! let mut dumper = Dumper::new(source, 22);
//! dumper.dump(DumpKind::Proctab, &mut std::io::stdout())?;
//! # Ok(())
//! # }
//! ```

pub mod bitmask;
pub mod cli;
pub mod domain;
pub mod dump;
pub mod pager;
pub mod preflight;
pub mod relocation;
pub mod ring;
pub mod session;
pub mod source;
