//! Boot image dump

use std::io::Write;

use super::snapshot;
use crate::bitmask::{chunk_bits, format_flags, PRIV_FLAGS, TRAP_FLAGS};
use crate::domain::{DumpError, TableKind};
use crate::source::KernelSource;

pub(super) fn render(source: &dyn KernelSource, out: &mut dyn Write) -> Result<(), DumpError> {
    let image = snapshot(TableKind::BootImage, source.boot_image())?;

    writeln!(out, "Image table dump showing all processes included in system image.")?;
    writeln!(out, "---name-- -nr- -flags- -traps- -sq- ----pc- -stack- -ipc_to[0]--------")?;
    for ip in &image {
        writeln!(
            out,
            "{:>8} {:>4}   {}   {}  {:>3} {:>7} {:>7}   {}",
            ip.name(),
            ip.proc_nr,
            format_flags(u32::from(ip.flags), PRIV_FLAGS),
            format_flags(ip.trap_mask, TRAP_FLAGS),
            ip.priority,
            ip.initial_pc,
            ip.stksize,
            chunk_bits(ip.ipc_to).trim_end()
        )?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ImageSource;
    use serde_json::json;

    #[test]
    fn test_image_rows() {
        let source = ImageSource::from_value(json!({
            "boot_image": [
                { "name": "IDLE", "proc_nr": -4, "priority": 15 },
                {
                    "name": "pm", "proc_nr": 0, "flags": 22, "trap_mask": 30,
                    "priority": 3, "stksize": 2048, "ipc_to": 257
                }
            ]
        }))
        .unwrap();
        let mut out = Vec::new();
        render(&source, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[2], "    IDLE   -4   -----   -----   15       0       0   00000000 00000000");
        assert_eq!(lines[3], "      pm    0   P-BS-   S-RBN    3       0    2048   10000000 10000000");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_denied_image() {
        let mut source = ImageSource::from_value(json!({ "boot_image": [] })).unwrap();
        source.deny(TableKind::BootImage);
        let mut out = Vec::new();
        let err = render(&source, &mut out).unwrap_err();
        assert_eq!(
            err.to_string(),
            "couldn't get copy of image table: EPERM (-1)"
        );
    }
}
