//! Interactive operator session
//!
//! Reads one command per line. A dump name runs that dump; running a
//! paginated dump again shows its next page. An empty line repeats the last
//! command, so paging through a long table is just pressing Enter.

use std::io::{BufRead, Write};

use log::debug;

use crate::domain::DumpError;
use crate::dump::{DumpKind, Dumper};
use crate::source::KernelSource;

/// One line of operator input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Dump(DumpKind),
    Help,
    /// Restart every paginated dump from the top
    Reset,
    Quit,
}

impl Command {
    /// Parse a non-empty command word
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "help" | "?" => Some(Command::Help),
            "reset" => Some(Command::Reset),
            "quit" | "exit" | "q" => Some(Command::Quit),
            name => DumpKind::from_name(name).map(Command::Dump),
        }
    }
}

/// Write the list of commands
pub fn write_help(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "Commands:")?;
    for kind in DumpKind::ALL {
        let more = if kind.is_paginated() { " (repeat for next page)" } else { "" };
        writeln!(out, "  {:<11} {}{more}", kind.name(), kind.description())?;
    }
    writeln!(out, "  {:<11} start paginated dumps from the top", "reset")?;
    writeln!(out, "  {:<11} this list", "help")?;
    writeln!(out, "  {:<11} leave", "quit")?;
    writeln!(out, "An empty line repeats the last command.")
}

/// Serve commands from `input` until it ends or the operator quits
pub fn run<S: KernelSource>(
    dumper: &mut Dumper<S>,
    input: impl BufRead,
    out: &mut dyn Write,
    prompt: bool,
) -> Result<(), DumpError> {
    let mut last = None;
    let mut lines = input.lines();
    loop {
        if prompt {
            write!(out, "kscope> ")?;
            out.flush()?;
        }
        let Some(line) = lines.next().transpose()? else {
            break;
        };

        let word = line.trim();
        let command = if word.is_empty() {
            match last {
                Some(command) => command,
                None => continue,
            }
        } else if let Some(command) = Command::parse(word) {
            command
        } else {
            writeln!(out, "unknown command: {word} (try 'help')")?;
            continue;
        };
        debug!("Command {command:?}");

        match command {
            Command::Dump(kind) => {
                dumper.dump(kind, out)?;
            }
            Command::Help => write_help(out)?,
            Command::Reset => dumper.reset(),
            Command::Quit => break,
        }
        out.flush()?;
        last = Some(command);
    }
    Ok(())
}
