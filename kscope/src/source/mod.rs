//! Snapshot acquisition
//!
//! A [`KernelSource`] hands out byte-exact copies of kernel tables. Every call
//! either returns a complete copy or a kernel status code; there are no
//! partial snapshots. Pointer fields in the returned tables still hold
//! kernel-space addresses (see [`crate::relocation`]).
//!
//! [`ImageSource`] serves tables from a captured kernel image file.

mod image;

pub use image::ImageSource;

use kscope_common::{
    BootImage, IrqHook, KInfo, KMessages, Machine, Priv, Proc, TimingData, NR_SCHED_QUEUES,
};

use crate::domain::Status;

/// Process table copy plus the ready-queue heads, taken together
#[derive(Debug, Clone)]
pub struct SchedInfo {
    pub procs: Vec<Proc>,
    /// Head of each scheduling queue, kernel address or `NIL_PTR`
    pub ready_heads: [u64; NR_SCHED_QUEUES],
}

/// Privileged "copy table T" calls
pub trait KernelSource {
    fn proc_table(&self) -> Result<Vec<Proc>, Status>;

    fn priv_table(&self) -> Result<Vec<Priv>, Status>;

    fn irq_hooks(&self) -> Result<Vec<IrqHook>, Status>;

    /// Per IRQ line, bit `h` set when hook `h` has the line masked
    fn irq_actids(&self) -> Result<Vec<u32>, Status>;

    fn boot_image(&self) -> Result<Vec<BootImage>, Status>;

    fn sched_info(&self) -> Result<SchedInfo, Status>;

    /// Kernel info, including the kernel address of the process table
    fn kinfo(&self) -> Result<KInfo, Status>;

    fn machine(&self) -> Result<Machine, Status>;

    fn kmessages(&self) -> Result<KMessages, Status>;

    /// Boot monitor environment as NUL-separated `key=value` strings
    fn monitor_params(&self) -> Result<Vec<u8>, Status>;

    fn lock_timings(&self) -> Result<Vec<TimingData>, Status>;
}
