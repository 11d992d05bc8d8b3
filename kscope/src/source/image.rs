//! Kernel image files
//!
//! A kernel image is a JSON capture of the kernel tables, one section per
//! table. Tables keep the kernel's layout: pointer fields hold kernel-space
//! addresses and strings are limited to the kernel's field widths.
//!
//! ```json
//! {
//!   "denied": ["priv_table"],
//!   "kinfo": { "proc_addr": 65536, "release": "3", "version": "1.2a" },
//!   "proc_table": [
//!     { "nr": -4, "name": "IDLE", "rts_flags": 0 },
//!     { "nr": 0, "name": "pm", "next_ready": 66048 }
//!   ],
//!   "ready_heads": [0, 0, 0, 65536]
//! }
//! ```
//!
//! Sparse tables list only occupied slots (processes by number, privileges
//! and IRQ hooks by id); the rest of the table is filled with free entries.
//! A section that is absent answers `ENOENT`, a table named in `denied`
//! answers `EPERM`.

use std::collections::HashSet;
use std::path::Path;

use kscope_common::{
    make_endpoint, proc_slot, BitChunk, BootImage, IrqHook, KInfo, KMessages, Machine, MemMap,
    Priv, Proc, TimingData, CALL_MASK_CHUNKS, KMESS_BUF_SIZE, MONPARAMS_SIZE, NIL_PTR, NONE,
    NR_LOCAL_SEGS, NR_SCHED_QUEUES, P_NAME_LEN, SYS_MAP_CHUNKS, TIMING_NAME, TIMING_POINTS,
};
use log::{debug, info};
use serde::Deserialize;

use super::{KernelSource, SchedInfo};
use crate::domain::{SourceError, Status, TableKind};

// ============================================================================
// File Records
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImageFile {
    #[serde(default)]
    denied: Vec<TableKind>,
    kinfo: Option<KInfoRecord>,
    machine: Option<MachineRecord>,
    proc_table: Option<Vec<ProcRecord>>,
    priv_table: Option<Vec<PrivRecord>>,
    irq_hooks: Option<Vec<IrqHookRecord>>,
    irq_actids: Option<Vec<u32>>,
    boot_image: Option<Vec<BootImageRecord>>,
    ready_heads: Option<Vec<u64>>,
    kmessages: Option<KMessagesRecord>,
    monitor_params: Option<Vec<String>>,
    lock_timings: Option<Vec<TimingRecord>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct KInfoRecord {
    code_base: u64,
    code_size: u64,
    data_base: u64,
    data_size: u64,
    proc_addr: u64,
    bootdev_base: u64,
    bootdev_size: u64,
    ramdev_base: u64,
    ramdev_size: u64,
    nr_procs: u32,
    nr_tasks: u32,
    release: String,
    version: String,
    relocking: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MachineRecord {
    pc_at: i32,
    ps_mca: i32,
    processor: i32,
    vdu_ega: i32,
    vdu_vga: i32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MemMapRecord {
    vir: u32,
    phys: u32,
    len: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProcRecord {
    nr: i32,
    name: String,
    /// Defaults to generation 0 of `nr`
    endpoint: Option<i32>,
    #[serde(default)]
    rts_flags: u32,
    getfrom: Option<i32>,
    #[serde(default)]
    priority: u8,
    #[serde(default)]
    max_priority: u8,
    #[serde(default)]
    ticks_left: u8,
    #[serde(default)]
    quantum_size: u8,
    #[serde(default)]
    user_time: u64,
    #[serde(default)]
    sys_time: u64,
    /// Kernel address of the next process on the same ready queue
    #[serde(default)]
    next_ready: u64,
    #[serde(default)]
    pc: u64,
    #[serde(default)]
    sp: u64,
    #[serde(default)]
    cr3: u64,
    /// Text, data and stack segments
    #[serde(default)]
    memmap: [MemMapRecord; NR_LOCAL_SEGS],
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PrivRecord {
    id: u16,
    proc_nr: i32,
    #[serde(default)]
    flags: u16,
    #[serde(default)]
    trap_mask: u32,
    #[serde(default)]
    grant_entries: i32,
    #[serde(default)]
    ipc_to: [BitChunk; SYS_MAP_CHUNKS],
    #[serde(default)]
    ipc_sendrec: [BitChunk; SYS_MAP_CHUNKS],
    #[serde(default)]
    k_call_mask: [BitChunk; CALL_MASK_CHUNKS],
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IrqHookRecord {
    id: usize,
    proc_nr_e: i32,
    irq: i32,
    #[serde(default)]
    policy: u32,
    #[serde(default)]
    notify_id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BootImageRecord {
    name: String,
    proc_nr: i32,
    #[serde(default)]
    flags: u16,
    #[serde(default)]
    trap_mask: u32,
    #[serde(default)]
    ipc_to: BitChunk,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    initial_pc: u64,
    #[serde(default)]
    stksize: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct KMessagesRecord {
    next: u32,
    size: u32,
    /// Raw ring contents starting at index 0
    buf: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TimingRecord {
    name: String,
    misses: u64,
    resets: u64,
    measurements: u64,
    lock_timings: Vec<u32>,
    /// Lower bound of the first bin
    range_start: i32,
    range_end: i32,
    binsize: i32,
}

// ============================================================================
// Conversion
// ============================================================================

/// Copy `text` into a NUL-padded kernel string field
fn fixed_str<const N: usize>(
    table: TableKind,
    field: &'static str,
    text: &str,
) -> Result<[u8; N], SourceError> {
    if text.len() > N {
        return Err(SourceError::FieldTooLong { table, field, len: text.len(), max: N });
    }
    let mut out = [0u8; N];
    out[..text.len()].copy_from_slice(text.as_bytes());
    Ok(out)
}

fn check_capacity(table: TableKind, count: usize, capacity: usize) -> Result<(), SourceError> {
    if count > capacity {
        return Err(SourceError::TableOverflow { table, count, capacity });
    }
    Ok(())
}

/// Lay out slot-addressed records in a full-capacity table
///
/// `entry` returns the slot a record belongs to and its kernel layout;
/// slots nobody claims are filled by `empty`.
fn expand<R, T>(
    table: TableKind,
    records: Vec<R>,
    empty: impl Fn(usize) -> T,
    entry: impl Fn(R) -> Result<(usize, T), SourceError>,
) -> Result<Vec<T>, SourceError> {
    let capacity = table.descriptor().capacity;
    check_capacity(table, records.len(), capacity)?;

    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(capacity).collect();
    for record in records {
        let (slot, value) = entry(record)?;
        let cell = slots.get_mut(slot).ok_or(SourceError::SlotOutOfRange {
            table,
            nr: i64::try_from(slot).unwrap_or(i64::MAX),
        })?;
        if cell.is_some() {
            return Err(SourceError::DuplicateSlot { table, slot });
        }
        *cell = Some(value);
    }
    Ok(slots
        .into_iter()
        .enumerate()
        .map(|(slot, value)| value.unwrap_or_else(|| empty(slot)))
        .collect())
}

fn proc_entry(r: ProcRecord) -> Result<(usize, Proc), SourceError> {
    let table = TableKind::ProcTable;
    let slot = proc_slot(r.nr).ok_or(SourceError::SlotOutOfRange { table, nr: i64::from(r.nr) })?;
    let memmap = r.memmap.map(|m| MemMap { vir: m.vir, phys: m.phys, len: m.len });
    let proc = Proc {
        nr: r.nr,
        endpoint: r.endpoint.unwrap_or_else(|| make_endpoint(0, r.nr)),
        rts_flags: r.rts_flags,
        getfrom: r.getfrom.unwrap_or(NONE),
        priority: r.priority,
        max_priority: r.max_priority,
        ticks_left: r.ticks_left,
        quantum_size: r.quantum_size,
        user_time: r.user_time,
        sys_time: r.sys_time,
        next_ready: r.next_ready,
        pc: r.pc,
        sp: r.sp,
        cr3: r.cr3,
        memmap,
        name: fixed_str::<P_NAME_LEN>(table, "name", &r.name)?,
        ..Proc::free()
    };
    Ok((slot, proc))
}

fn priv_entry(r: PrivRecord) -> (usize, Priv) {
    let entry = Priv {
        proc_nr: r.proc_nr,
        id: r.id,
        flags: r.flags,
        trap_mask: r.trap_mask,
        grant_entries: r.grant_entries,
        ipc_to: r.ipc_to,
        ipc_sendrec: r.ipc_sendrec,
        k_call_mask: r.k_call_mask,
    };
    (usize::from(r.id), entry)
}

fn boot_entry(r: BootImageRecord) -> Result<BootImage, SourceError> {
    Ok(BootImage {
        proc_nr: r.proc_nr,
        flags: r.flags,
        _pad0: 0,
        trap_mask: r.trap_mask,
        ipc_to: r.ipc_to,
        _pad1: 0,
        priority: r.priority,
        initial_pc: r.initial_pc,
        stksize: r.stksize,
        proc_name: fixed_str::<P_NAME_LEN>(TableKind::BootImage, "name", &r.name)?,
    })
}

fn kinfo_entry(r: KInfoRecord) -> Result<KInfo, SourceError> {
    let table = TableKind::KernelInfo;
    Ok(KInfo {
        code_base: r.code_base,
        code_size: r.code_size,
        data_base: r.data_base,
        data_size: r.data_size,
        proc_addr: r.proc_addr,
        bootdev_base: r.bootdev_base,
        bootdev_size: r.bootdev_size,
        ramdev_base: r.ramdev_base,
        ramdev_size: r.ramdev_size,
        nr_procs: r.nr_procs,
        nr_tasks: r.nr_tasks,
        release: fixed_str(table, "release", &r.release)?,
        version: fixed_str(table, "version", &r.version)?,
        relocking: r.relocking,
    })
}

fn kmessages_entry(r: KMessagesRecord) -> Result<KMessages, SourceError> {
    Ok(KMessages {
        next: r.next,
        size: r.size,
        buf: fixed_str::<KMESS_BUF_SIZE>(TableKind::KMessages, "buf", &r.buf)?,
    })
}

fn timing_entry(r: TimingRecord) -> Result<TimingData, SourceError> {
    let table = TableKind::LockTimings;
    check_capacity(table, r.lock_timings.len(), TIMING_POINTS)?;
    let mut lock_timings = [0u32; TIMING_POINTS];
    lock_timings[..r.lock_timings.len()].copy_from_slice(&r.lock_timings);
    Ok(TimingData {
        name: fixed_str::<TIMING_NAME>(table, "name", &r.name)?,
        misses: r.misses,
        resets: r.resets,
        measurements: r.measurements,
        lock_timings,
        lock_timings_range: [r.range_start, r.range_end],
        binsize: r.binsize,
        ..TimingData::default()
    })
}

/// Encode `key=value` strings the way the boot monitor hands them over
fn monitor_params_entry(params: &[String]) -> Result<Vec<u8>, SourceError> {
    let mut buf = Vec::with_capacity(MONPARAMS_SIZE);
    for param in params {
        buf.extend_from_slice(param.as_bytes());
        buf.push(0);
    }
    // An empty string ends the list
    buf.push(0);
    if buf.len() > MONPARAMS_SIZE {
        return Err(SourceError::FieldTooLong {
            table: TableKind::MonitorParams,
            field: "params",
            len: buf.len(),
            max: MONPARAMS_SIZE,
        });
    }
    buf.resize(MONPARAMS_SIZE, 0);
    Ok(buf)
}

/// Fixed-length array of `values`, padded with `fill`
fn padded<T: Copy, const N: usize>(
    table: TableKind,
    values: &[T],
    fill: T,
) -> Result<[T; N], SourceError> {
    check_capacity(table, values.len(), N)?;
    let mut out = [fill; N];
    out[..values.len()].copy_from_slice(values);
    Ok(out)
}

// ============================================================================
// Source
// ============================================================================

/// Kernel tables served from a captured image
#[derive(Debug, Clone, Default)]
pub struct ImageSource {
    denied: HashSet<TableKind>,
    kinfo: Option<KInfo>,
    machine: Option<Machine>,
    procs: Option<Vec<Proc>>,
    privs: Option<Vec<Priv>>,
    irq_hooks: Option<Vec<IrqHook>>,
    irq_actids: Option<Vec<u32>>,
    boot_image: Option<Vec<BootImage>>,
    ready_heads: Option<[u64; NR_SCHED_QUEUES]>,
    kmessages: Option<KMessages>,
    monitor_params: Option<Vec<u8>>,
    lock_timings: Option<Vec<TimingData>>,
}

impl ImageSource {
    /// Load and validate an image file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|error| SourceError::Read { path: path.display().to_string(), error })?;
        let source = Self::from_json(&content)?;
        info!(
            "Loaded kernel image {} ({} live processes, {} bytes of tables, {} tables denied)",
            path.display(),
            source.procs.as_ref().map_or(0, |p| p.iter().filter(|p| !p.is_empty()).count()),
            source.table_bytes(),
            source.denied.len()
        );
        Ok(source)
    }

    /// Parse and validate image JSON
    pub fn from_json(text: &str) -> Result<Self, SourceError> {
        Self::build(serde_json::from_str(text)?)
    }

    /// Build from an already parsed JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, SourceError> {
        Self::build(serde_json::from_value(value)?)
    }

    /// Refuse all further copies of `table` with `EPERM`
    pub fn deny(&mut self, table: TableKind) {
        self.denied.insert(table);
    }

    /// Size of the captured tables in kernel layout
    #[must_use]
    pub fn table_bytes(&self) -> usize {
        fn bytes(table: TableKind, entries: Option<usize>) -> usize {
            entries.map_or(0, |n| n * table.descriptor().entry_size)
        }
        [
            bytes(TableKind::ProcTable, self.procs.as_ref().map(Vec::len)),
            bytes(TableKind::PrivTable, self.privs.as_ref().map(Vec::len)),
            bytes(TableKind::IrqHooks, self.irq_hooks.as_ref().map(Vec::len)),
            bytes(TableKind::IrqActids, self.irq_actids.as_ref().map(Vec::len)),
            bytes(TableKind::BootImage, self.boot_image.as_ref().map(Vec::len)),
            bytes(TableKind::KernelInfo, self.kinfo.map(|_| 1)),
            bytes(TableKind::Machine, self.machine.map(|_| 1)),
            bytes(TableKind::KMessages, self.kmessages.map(|_| 1)),
            bytes(TableKind::MonitorParams, self.monitor_params.as_ref().map(Vec::len)),
            bytes(TableKind::LockTimings, self.lock_timings.as_ref().map(Vec::len)),
        ]
        .iter()
        .sum()
    }

    fn build(file: ImageFile) -> Result<Self, SourceError> {
        let procs = file
            .proc_table
            .map(|records| expand(TableKind::ProcTable, records, |_| Proc::free(), proc_entry))
            .transpose()?;

        let privs = file
            .priv_table
            .map(|records| {
                expand(
                    TableKind::PrivTable,
                    records,
                    |slot| Priv::unused(u16::try_from(slot).unwrap_or(u16::MAX)),
                    |r| Ok(priv_entry(r)),
                )
            })
            .transpose()?;

        let irq_hooks = file
            .irq_hooks
            .map(|records| {
                expand(
                    TableKind::IrqHooks,
                    records,
                    |_| IrqHook::unused(),
                    |r| {
                        let hook = IrqHook {
                            proc_nr_e: r.proc_nr_e,
                            irq: r.irq,
                            policy: r.policy,
                            notify_id: r.notify_id,
                        };
                        Ok((r.id, hook))
                    },
                )
            })
            .transpose()?;

        let irq_actids = file
            .irq_actids
            .map(|ids| {
                let capacity = TableKind::IrqActids.descriptor().capacity;
                check_capacity(TableKind::IrqActids, ids.len(), capacity)?;
                let mut ids = ids;
                ids.resize(capacity, 0);
                Ok::<_, SourceError>(ids)
            })
            .transpose()?;

        let boot_image = file
            .boot_image
            .map(|records| {
                let capacity = TableKind::BootImage.descriptor().capacity;
                check_capacity(TableKind::BootImage, records.len(), capacity)?;
                records.into_iter().map(boot_entry).collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        let ready_heads = file
            .ready_heads
            .map(|heads| padded::<u64, NR_SCHED_QUEUES>(TableKind::SchedInfo, &heads, NIL_PTR))
            .transpose()?;

        let lock_timings = file
            .lock_timings
            .map(|records| {
                let capacity = TableKind::LockTimings.descriptor().capacity;
                check_capacity(TableKind::LockTimings, records.len(), capacity)?;
                let mut entries =
                    records.into_iter().map(timing_entry).collect::<Result<Vec<_>, _>>()?;
                entries.resize_with(capacity, TimingData::default);
                Ok::<_, SourceError>(entries)
            })
            .transpose()?;

        let machine = file.machine.map(|m| Machine {
            pc_at: m.pc_at,
            ps_mca: m.ps_mca,
            processor: m.processor,
            vdu_ega: m.vdu_ega,
            vdu_vga: m.vdu_vga,
        });

        Ok(Self {
            denied: file.denied.into_iter().collect(),
            kinfo: file.kinfo.map(kinfo_entry).transpose()?,
            machine,
            procs,
            privs,
            irq_hooks,
            irq_actids,
            boot_image,
            ready_heads,
            kmessages: file.kmessages.map(kmessages_entry).transpose()?,
            monitor_params: file.monitor_params.as_deref().map(monitor_params_entry).transpose()?,
            lock_timings,
        })
    }

    /// A fresh copy of `data`, as the kernel would hand it out
    fn copy_of<T: Clone>(&self, table: TableKind, data: Option<&T>) -> Result<T, Status> {
        if self.denied.contains(&table) {
            debug!("Copy of {table} refused");
            return Err(Status::PERMISSION_DENIED);
        }
        data.cloned().ok_or(Status::NOT_FOUND)
    }
}

impl KernelSource for ImageSource {
    fn proc_table(&self) -> Result<Vec<Proc>, Status> {
        self.copy_of(TableKind::ProcTable, self.procs.as_ref())
    }

    fn priv_table(&self) -> Result<Vec<Priv>, Status> {
        self.copy_of(TableKind::PrivTable, self.privs.as_ref())
    }

    fn irq_hooks(&self) -> Result<Vec<IrqHook>, Status> {
        self.copy_of(TableKind::IrqHooks, self.irq_hooks.as_ref())
    }

    fn irq_actids(&self) -> Result<Vec<u32>, Status> {
        self.copy_of(TableKind::IrqActids, self.irq_actids.as_ref())
    }

    fn boot_image(&self) -> Result<Vec<BootImage>, Status> {
        self.copy_of(TableKind::BootImage, self.boot_image.as_ref())
    }

    fn sched_info(&self) -> Result<SchedInfo, Status> {
        let procs = self.copy_of(TableKind::SchedInfo, self.procs.as_ref())?;
        let ready_heads = self.copy_of(TableKind::SchedInfo, self.ready_heads.as_ref())?;
        Ok(SchedInfo { procs, ready_heads })
    }

    fn kinfo(&self) -> Result<KInfo, Status> {
        self.copy_of(TableKind::KernelInfo, self.kinfo.as_ref())
    }

    fn machine(&self) -> Result<Machine, Status> {
        self.copy_of(TableKind::Machine, self.machine.as_ref())
    }

    fn kmessages(&self) -> Result<KMessages, Status> {
        self.copy_of(TableKind::KMessages, self.kmessages.as_ref())
    }

    fn monitor_params(&self) -> Result<Vec<u8>, Status> {
        self.copy_of(TableKind::MonitorParams, self.monitor_params.as_ref())
    }

    fn lock_timings(&self) -> Result<Vec<TimingData>, Status> {
        self.copy_of(TableKind::LockTimings, self.lock_timings.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kscope_common::{NR_PROC_SLOTS, NR_SYS_PROCS, NR_TASKS, USER_PRIV_ID};
    use serde_json::json;

    #[test]
    fn test_processes_land_in_their_slots() {
        let source = ImageSource::from_value(json!({
            "proc_table": [
                { "nr": -4, "name": "IDLE" },
                { "nr": 5, "name": "init", "endpoint": 65541 }
            ]
        }))
        .unwrap();

        let procs = source.proc_table().unwrap();
        assert_eq!(procs.len(), NR_PROC_SLOTS);
        assert_eq!(procs[0].name(), "IDLE");
        assert_eq!(procs[NR_TASKS + 5].name(), "init");
        assert_eq!(procs[NR_TASKS + 5].endpoint, 65541);
        assert_eq!(procs.iter().filter(|p| !p.is_empty()).count(), 2);
        assert!(procs[1].is_empty());
    }

    #[test]
    fn test_endpoint_defaults_to_generation_zero() {
        let source =
            ImageSource::from_value(json!({ "proc_table": [{ "nr": 7, "name": "rs" }] })).unwrap();
        let procs = source.proc_table().unwrap();
        assert_eq!(procs[NR_TASKS + 7].endpoint, 7);
        assert_eq!(procs[NR_TASKS + 7].getfrom, NONE);
    }

    #[test]
    fn test_missing_section_is_not_found() {
        let source = ImageSource::from_value(json!({})).unwrap();
        assert_eq!(source.proc_table().unwrap_err(), Status::NOT_FOUND);
        assert_eq!(source.kmessages().unwrap_err(), Status::NOT_FOUND);
    }

    #[test]
    fn test_denied_table_is_permission_denied() {
        let mut source = ImageSource::from_value(json!({
            "denied": ["priv_table"],
            "priv_table": [],
            "kinfo": {}
        }))
        .unwrap();
        assert_eq!(source.priv_table().unwrap_err(), Status::PERMISSION_DENIED);
        assert!(source.kinfo().is_ok());

        source.deny(TableKind::KernelInfo);
        assert_eq!(source.kinfo().unwrap_err(), Status::PERMISSION_DENIED);
    }

    #[test]
    fn test_unused_privileges_fill_the_table() {
        let source = ImageSource::from_value(json!({
            "priv_table": [{ "id": 3, "proc_nr": 0, "flags": 16, "k_call_mask": [1, 0, 0, 0] }]
        }))
        .unwrap();
        let privs = source.priv_table().unwrap();
        assert_eq!(privs.len(), NR_SYS_PROCS);
        assert_eq!(privs[3].flags, 16);
        assert_eq!(privs[USER_PRIV_ID].proc_nr, NONE);
        assert_eq!(privs[9].id, 9);
    }

    #[test]
    fn test_slot_out_of_range() {
        let err = ImageSource::from_value(json!({
            "proc_table": [{ "nr": -9, "name": "ghost" }]
        }))
        .unwrap_err();
        assert!(matches!(err, SourceError::SlotOutOfRange { nr: -9, .. }));

        let err = ImageSource::from_value(json!({
            "proc_table": [{ "nr": i32::MAX, "name": "ghost" }]
        }))
        .unwrap_err();
        assert!(matches!(err, SourceError::SlotOutOfRange { nr, .. } if nr == i64::from(i32::MAX)));

        let err = ImageSource::from_value(json!({
            "irq_hooks": [{ "id": 99, "proc_nr_e": 1, "irq": 1 }]
        }))
        .unwrap_err();
        assert!(matches!(err, SourceError::SlotOutOfRange { table: TableKind::IrqHooks, .. }));
    }

    #[test]
    fn test_extreme_endpoints_load() {
        let source = ImageSource::from_value(json!({
            "proc_table": [
                { "nr": 5, "name": "x", "endpoint": i32::MAX },
                { "nr": 6, "name": "y", "rts_flags": 4, "getfrom": i32::MAX }
            ]
        }))
        .unwrap();
        let procs = source.proc_table().unwrap();
        assert_eq!(procs[NR_TASKS + 5].endpoint, i32::MAX);
        assert_eq!(procs[NR_TASKS + 6].getfrom, i32::MAX);
    }

    #[test]
    fn test_table_bytes_follow_entry_sizes() {
        let source = ImageSource::from_value(json!({
            "proc_table": [],
            "irq_actids": [1, 2]
        }))
        .unwrap();
        assert_eq!(source.table_bytes(), NR_PROC_SLOTS * kscope_common::PROC_SIZE + 16 * 4);
        assert_eq!(ImageSource::default().table_bytes(), 0);
    }

    #[test]
    fn test_duplicate_slot() {
        let err = ImageSource::from_value(json!({
            "proc_table": [{ "nr": 1, "name": "a" }, { "nr": 1, "name": "b" }]
        }))
        .unwrap_err();
        assert!(matches!(err, SourceError::DuplicateSlot { slot, .. } if slot == NR_TASKS + 1));
    }

    #[test]
    fn test_overflow() {
        let actids: Vec<u32> = vec![0; 17];
        let err = ImageSource::from_value(json!({ "irq_actids": actids })).unwrap_err();
        assert!(matches!(err, SourceError::TableOverflow { count: 17, capacity: 16, .. }));
    }

    #[test]
    fn test_field_too_long() {
        let err = ImageSource::from_value(json!({
            "kinfo": { "release": "toolong" }
        }))
        .unwrap_err();
        assert!(matches!(err, SourceError::FieldTooLong { field: "release", max: 6, .. }));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = ImageSource::from_value(json!({ "proc_table": [{ "nr": 1, "name": "a", "pid": 3 }] }))
            .unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[test]
    fn test_monitor_params_encoding() {
        let source = ImageSource::from_value(json!({
            "monitor_params": ["rootdev=c0d0p0s0", "memory=800:92"]
        }))
        .unwrap();
        let params = source.monitor_params().unwrap();
        assert_eq!(params.len(), MONPARAMS_SIZE);
        assert!(params.starts_with(b"rootdev=c0d0p0s0\0memory=800:92\0\0"));
    }

    #[test]
    fn test_ready_heads_padded_with_nil() {
        let source = ImageSource::from_value(json!({
            "proc_table": [],
            "ready_heads": [0, 65536]
        }))
        .unwrap();
        let info = source.sched_info().unwrap();
        assert_eq!(info.ready_heads[1], 65536);
        assert!(info.ready_heads[2..].iter().all(|&h| h == NIL_PTR));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kernel.json");
        std::fs::write(&path, r#"{ "machine": { "processor": 586 } }"#).unwrap();

        let source = ImageSource::from_file(&path).unwrap();
        assert_eq!(source.machine().unwrap().processor, 586);

        let err = ImageSource::from_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SourceError::Read { .. }));
    }
}
