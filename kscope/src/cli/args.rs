//! CLI argument definitions

use clap::builder::TypedValueParser;
use clap::Parser;
use std::path::PathBuf;

use crate::dump::{DumpKind, DEFAULT_LINES};

#[derive(Parser, Debug)]
#[command(
    name = "kscope",
    version,
    about = "Dump kernel tables from a captured kernel image",
    after_help = "\
EXAMPLES:
    kscope -s kernel.json                    Interactive session
    kscope -s kernel.json proctab            First page of the process table
    kscope -s kernel.json proctab --all      Whole process table
    KSCOPE_SOURCE=kernel.json kscope sched   Scheduling queues"
)]
pub struct Args {
    /// Dump to run (omit for an interactive session)
    #[arg(value_enum, value_name = "DUMP")]
    pub dump: Option<DumpKind>,

    /// Kernel image to read tables from
    #[arg(short, long, value_name = "FILE", env = "KSCOPE_SOURCE")]
    pub source: Option<PathBuf>,

    /// Rows per page for paginated dumps
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_LINES,
        value_parser = clap::value_parser!(u16).range(1..).map(usize::from)
    )]
    pub lines: usize,

    /// Keep paging until the whole table is shown
    #[arg(long, requires = "dump")]
    pub all: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
