//! # kscope - Main Entry Point
//!
//! Supports two modes:
//! - **One-shot** (`kscope -s kernel.json proctab`): run a single dump and exit
//! - **Interactive** (`kscope -s kernel.json`): read dump commands from stdin

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::io::{self, IsTerminal, Write};

use kscope::cli::Args;
use kscope::dump::{DumpKind, Dumper};
use kscope::pager::PageStatus;
use kscope::preflight::check_snapshot_source;
use kscope::session;
use kscope::source::{ImageSource, KernelSource};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOINPUT: i32 = 66;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = err.to_string().to_lowercase();
    if msg.contains("missing required argument") {
        EXIT_USAGE
    } else if msg.contains("kernel image not found") {
        EXIT_NOINPUT
    } else {
        EXIT_ERROR
    }
}

/// Run one page of `kind`; this process exits afterwards, so a cut-off
/// listing ends with a pointer to `--all` instead of a continuation prompt
fn dump_once<S: KernelSource>(
    dumper: &mut Dumper<S>,
    kind: DumpKind,
    out: &mut dyn Write,
) -> Result<PageStatus> {
    let status = dumper.dump(kind, out)?;
    if status == PageStatus::More {
        writeln!(out)?;
        writeln!(out, "(more entries follow, run with --all to list them)")?;
    }
    Ok(status)
}

fn run() -> Result<()> {
    let args = Args::parse();

    let Some(path) = args.source.as_deref() else {
        anyhow::bail!(
            "Missing required argument: --source\n\n\
             Usage:\n  \
             kscope -s kernel.json            Interactive session\n  \
             kscope -s kernel.json proctab    Single dump\n\n\
             Run 'kscope --help' for more options"
        );
    };

    check_snapshot_source(path)?;
    let source = ImageSource::from_file(path)
        .with_context(|| format!("Failed to load kernel image {}", path.display()))?;
    let mut dumper = Dumper::new(source, args.lines);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(kind) = args.dump {
        info!("Running {kind} dump ({} lines per page)", args.lines);
        if args.all {
            dumper.dump_all(kind, &mut out)?;
        } else {
            dump_once(&mut dumper, kind, &mut out)?;
        }
        out.flush()?;
        return Ok(());
    }

    let interactive = io::stdin().is_terminal();
    if interactive && !args.quiet {
        writeln!(out, "kscope v{}", env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "Type 'help' for a list of dumps, 'quit' to leave.")?;
    }
    session::run(&mut dumper, io::stdin().lock(), &mut out, interactive)?;
    if interactive {
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dumper(lines: usize) -> Dumper<ImageSource> {
        let source = ImageSource::from_json(
            r#"{ "proc_table": [ { "nr": 0, "name": "pm" }, { "nr": 1, "name": "fs" } ] }"#,
        )
        .unwrap();
        Dumper::new(source, lines)
    }

    #[test]
    fn test_cut_off_listing_points_to_all() {
        let mut out = Vec::new();
        let status = dump_once(&mut dumper(1), DumpKind::Proctab, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(status, PageStatus::More);
        assert!(text.ends_with("--more--\r\n(more entries follow, run with --all to list them)\n"));
    }

    #[test]
    fn test_complete_listing_has_no_hint() {
        let mut out = Vec::new();
        dump_once(&mut dumper(22), DumpKind::Proctab, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("--end--\n"));
        assert!(!text.contains("--all"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&anyhow::anyhow!("Missing required argument: --source")), EXIT_USAGE);
        assert_eq!(exit_code_for(&anyhow::anyhow!("Kernel image not found: x")), EXIT_NOINPUT);
        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), EXIT_ERROR);
    }
}
