//! Lock timing histogram dump

use std::io::Write;

use kscope_common::{TimingData, TIMING_NAME};

use super::snapshot;
use crate::domain::{DumpError, TableKind};
use crate::source::KernelSource;

/// Bins wrap onto a new line before passing this column
const WIDTH: usize = 80;

/// Lines for one category: a summary followed by its non-empty bins
fn category_lines(t: &TimingData) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = format!(
        "{:<width$}: misses {}, resets {}, measurements {}: ",
        t.name(),
        t.misses,
        t.resets,
        t.measurements,
        width = TIMING_NAME
    );
    let start = i64::from(t.lock_timings_range[0]);
    let binsize = i64::from(t.binsize);
    for (bin, &count) in (0i64..).zip(&t.lock_timings) {
        if count == 0 {
            continue;
        }
        let cell = format!(" {:>5}: {:>5}", start + bin * binsize, count);
        if !line.is_empty() && line.len() + cell.len() > WIDTH {
            lines.push(std::mem::take(&mut line));
        }
        line.push_str(&cell);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

pub(super) fn render(source: &dyn KernelSource, out: &mut dyn Write) -> Result<(), DumpError> {
    let timings = snapshot(TableKind::LockTimings, source.lock_timings())?;

    // A zero range or bin size marks an unused category
    let used = timings.iter().filter(|t| t.lock_timings_range[0] != 0 && t.binsize != 0);
    for t in used {
        for line in category_lines(t) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ImageSource;
    use serde_json::json;

    fn timing(counts: &[u32]) -> TimingData {
        let mut t = TimingData::default();
        t.name[..4].copy_from_slice(b"lock");
        t.lock_timings[..counts.len()].copy_from_slice(counts);
        t.lock_timings_range = [100, 0];
        t.binsize = 10;
        t.misses = 2;
        t
    }

    #[test]
    fn test_summary_and_bins() {
        let lines = category_lines(&timing(&[0, 4, 0, 1]));
        assert_eq!(
            lines,
            ["lock      : misses 2, resets 0, measurements 0:    110:     4   130:     1"]
        );
    }

    #[test]
    fn test_wraps_before_column_80() {
        let lines = category_lines(&timing(&[1; 20]));
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= WIDTH));
        let bins: usize = lines.iter().map(|l| l.matches(':').count()).sum();
        // one colon after the name, one per bin, one after the summary
        assert_eq!(bins, 20 + 2);
    }

    #[test]
    fn test_unused_categories_are_skipped() {
        let source = ImageSource::from_value(json!({
            "lock_timings": [
                { "name": "idle", "range_start": 0, "binsize": 10, "lock_timings": [5] },
                { "name": "proc", "range_start": 50, "binsize": 0, "lock_timings": [5] },
                { "name": "queue", "range_start": 50, "binsize": 5, "lock_timings": [0, 3] }
            ]
        }))
        .unwrap();
        let mut out = Vec::new();
        render(&source, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "queue     : misses 0, resets 0, measurements 0:     55:     3\n"
        );
    }
}
