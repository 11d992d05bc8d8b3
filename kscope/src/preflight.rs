//! Pre-flight checks for kscope
//!
//! Validates the kernel image path before loading it, with clear, actionable
//! error messages.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Check that `path` names a readable kernel image file
pub fn check_snapshot_source(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!(
            "Kernel image not found: {}\n\n\
             Make sure the path is correct, or set KSCOPE_SOURCE.",
            path.display()
        );
    }
    if !path.is_file() {
        bail!(
            "Not a file: {}\n\n\
             --source must point to a kernel image (JSON), not a directory.",
            path.display()
        );
    }
    std::fs::File::open(path)
        .with_context(|| format!("Failed to open kernel image: {}", path.display()))?;
    Ok(())
}
