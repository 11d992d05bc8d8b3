//! Fixed-width rendering of kernel flag sets and bitmaps
//!
//! A flag field is rendered through an ordered list of [`FlagColumn`]s: one
//! output character per column, the column's symbol when its bit is set and
//! [`FILLER`] otherwise. Column order is the declared order, which groups
//! related flags and does *not* follow bit positions (see [`TRAP_FLAGS`]).

use kscope_common::{
    BitChunk, BILLABLE, BITCHUNK_BITS, NOTIFY, NO_PRIORITY, NO_PRIV, PREEMPTIBLE, P_STOP,
    RECEIVE, RECEIVING, SEND, SENDA, SENDING, SENDREC, SIGNALED, SIG_PENDING, SYS_PROC,
};
use std::fmt::Write;

/// Character rendered for an unset (or placeholder) column
pub const FILLER: char = '-';

/// One character position in a rendered flag field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagColumn {
    mask: u32,
    symbol: char,
}

impl FlagColumn {
    /// Column shown when any bit of `mask` is set
    #[must_use]
    pub const fn new(mask: u32, symbol: char) -> Self {
        Self { mask, symbol }
    }

    /// Column for bit number `bit`
    #[must_use]
    pub const fn bit(bit: u32, symbol: char) -> Self {
        Self { mask: 1 << bit, symbol }
    }

    /// Reserved column that always renders as [`FILLER`]
    pub const PLACEHOLDER: FlagColumn = FlagColumn { mask: 0, symbol: FILLER };
}

/// Privilege flags: `P-BS-`
///
/// Positions 1 and 4 are reserved and always blank.
pub const PRIV_FLAGS: &[FlagColumn] = &[
    FlagColumn::new(PREEMPTIBLE as u32, 'P'),
    FlagColumn::PLACEHOLDER,
    FlagColumn::new(BILLABLE as u32, 'B'),
    FlagColumn::new(SYS_PROC as u32, 'S'),
    FlagColumn::PLACEHOLDER,
];

/// Allowed IPC traps: `SARBN`
///
/// Both send flavours come first (SEND, SENDA), then RECEIVE, SENDREC and
/// NOTIFY, even though SENDA has the highest trap number.
pub const TRAP_FLAGS: &[FlagColumn] = &[
    FlagColumn::bit(SEND, 'S'),
    FlagColumn::bit(SENDA, 'A'),
    FlagColumn::bit(RECEIVE, 'R'),
    FlagColumn::bit(SENDREC, 'B'),
    FlagColumn::bit(NOTIFY, 'N'),
];

/// Process runtime flags: `sSRIPTp`
///
/// `SLOT_FREE` has no column: free slots are never listed.
pub const RTS_FLAGS: &[FlagColumn] = &[
    FlagColumn::new(NO_PRIORITY, 's'),
    FlagColumn::new(SENDING, 'S'),
    FlagColumn::new(RECEIVING, 'R'),
    FlagColumn::new(SIGNALED, 'I'),
    FlagColumn::new(SIG_PENDING, 'P'),
    FlagColumn::new(P_STOP, 'T'),
    FlagColumn::new(NO_PRIV, 'p'),
];

/// Render `value` through `columns`
///
/// The result is always `columns.len()` characters long.
#[must_use]
pub fn format_flags(value: u32, columns: &[FlagColumn]) -> String {
    columns
        .iter()
        .map(|col| if value & col.mask != 0 { col.symbol } else { FILLER })
        .collect()
}

/// Render the low `bits` bits of `value` as `0`/`1`, least significant
/// first, with a space after every group of `group` bits
#[must_use]
pub fn bit_string(value: u32, bits: usize, group: usize) -> String {
    let mut out = String::with_capacity(bits + bits / group.max(1));
    for i in 0..bits.min(32) {
        out.push(if value & (1 << i) != 0 { '1' } else { '0' });
        if group > 0 && i % group == group - 1 {
            out.push(' ');
        }
    }
    out
}

/// Render one bitmap chunk the way boot image listings show `ipc_to`
#[must_use]
pub fn chunk_bits(chunk: BitChunk) -> String {
    bit_string(u32::from(chunk), BITCHUNK_BITS, 8)
}

/// Render bitmap chunks as ` %04x` words
#[must_use]
pub fn hex_words(chunks: &[BitChunk]) -> String {
    let mut out = String::with_capacity(chunks.len() * 5);
    for chunk in chunks {
        let _ = write!(out, " {chunk:04x}");
    }
    out
}
