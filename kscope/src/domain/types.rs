//! Domain types providing compile-time safety and self-documentation
//!
//! Kernel-space and caller-space addresses are different newtypes so that a
//! copied kernel pointer can never be mistaken for something dereferenceable
//! in our own address space.

use kscope_common::{
    BootImage, IrqHook, KInfo, KMessages, Machine, Priv, Proc, TimingData, EAGAIN, EFAULT,
    EINVAL, ENOENT, EPERM, IDLE, MONPARAMS_SIZE, NR_BOOT_PROCS, NR_IRQ_HOOKS, NR_IRQ_VECTORS,
    NR_PROC_SLOTS, NR_SYS_PROCS, OK, TIMING_CATEGORIES,
};
use serde::Deserialize;
use std::fmt;
use std::mem::size_of;

/// Address in the kernel's address space
///
/// Only meaningful as a base for relocation; never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelAddr(pub u64);

impl fmt::Display for KernelAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k:0x{:x}", self.0)
    }
}

/// Address in kscope's own address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalAddr(pub u64);

impl LocalAddr {
    /// Address of the first element of a local snapshot buffer
    #[must_use]
    pub fn of_slice<T>(entries: &[T]) -> Self {
        LocalAddr(entries.as_ptr() as u64)
    }
}

impl fmt::Display for LocalAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l:0x{:x}", self.0)
    }
}

/// Kernel status code returned by a snapshot request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub i32);

impl Status {
    pub const PERMISSION_DENIED: Status = Status(EPERM);
    pub const NOT_FOUND: Status = Status(ENOENT);

    fn name(self) -> Option<&'static str> {
        match self.0 {
            OK => Some("OK"),
            EPERM => Some("EPERM"),
            ENOENT => Some("ENOENT"),
            EAGAIN => Some("EAGAIN"),
            EFAULT => Some("EFAULT"),
            EINVAL => Some("EINVAL"),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "status {}", self.0),
        }
    }
}

/// Process number as shown in the first column of process listings
///
/// Renders as `(nr)` for the idle task, `[nr]` for other kernel tasks and
/// ` nr ` for everything else, always four characters wide for `|nr| < 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcNr(pub i32);

impl fmt::Display for ProcNr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == IDLE {
            write!(f, "({:>2})", self.0)
        } else if self.0 < 0 {
            write!(f, "[{:>2}]", self.0)
        } else {
            write!(f, " {:>2} ", self.0)
        }
    }
}

/// IPC endpoint (generation number + process number)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint(pub i32);

impl Endpoint {
    #[must_use]
    pub fn generation(self) -> i32 {
        kscope_common::endpoint_generation(self.0)
    }

    #[must_use]
    pub fn proc_nr(self) -> i32 {
        kscope_common::endpoint_proc(self.0)
    }

    #[must_use]
    pub fn is_any(self) -> bool {
        self.0 == kscope_common::ANY
    }
}

/// Every kernel table (or metadata struct) kscope can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    ProcTable,
    PrivTable,
    IrqHooks,
    IrqActids,
    BootImage,
    SchedInfo,
    #[serde(rename = "kinfo")]
    KernelInfo,
    Machine,
    #[serde(rename = "kmessages")]
    KMessages,
    MonitorParams,
    LockTimings,
}

/// Static metadata for a table kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Human readable name used in reports
    pub name: &'static str,
    /// Size of one entry in bytes
    pub entry_size: usize,
    /// Maximum number of entries
    pub capacity: usize,
    /// Entries hold kernel pointers into the same table
    pub has_pointers: bool,
    /// Entries may be free and must be skipped by listings
    pub sparse: bool,
}

impl TableKind {
    #[must_use]
    pub const fn descriptor(self) -> TableDescriptor {
        match self {
            TableKind::ProcTable => TableDescriptor {
                name: "process table",
                entry_size: size_of::<Proc>(),
                capacity: NR_PROC_SLOTS,
                has_pointers: true,
                sparse: true,
            },
            TableKind::PrivTable => TableDescriptor {
                name: "system privileges table",
                entry_size: size_of::<Priv>(),
                capacity: NR_SYS_PROCS,
                has_pointers: false,
                sparse: true,
            },
            TableKind::IrqHooks => TableDescriptor {
                name: "irq hooks",
                entry_size: size_of::<IrqHook>(),
                capacity: NR_IRQ_HOOKS,
                has_pointers: false,
                sparse: true,
            },
            TableKind::IrqActids => TableDescriptor {
                name: "irq mask",
                entry_size: size_of::<u32>(),
                capacity: NR_IRQ_VECTORS,
                has_pointers: false,
                sparse: false,
            },
            TableKind::BootImage => TableDescriptor {
                name: "image table",
                entry_size: size_of::<BootImage>(),
                capacity: NR_BOOT_PROCS,
                has_pointers: false,
                sparse: false,
            },
            TableKind::SchedInfo => TableDescriptor {
                name: "scheduling queues",
                entry_size: size_of::<Proc>(),
                capacity: NR_PROC_SLOTS,
                has_pointers: true,
                sparse: true,
            },
            TableKind::KernelInfo => TableDescriptor {
                name: "kernel info struct",
                entry_size: size_of::<KInfo>(),
                capacity: 1,
                has_pointers: false,
                sparse: false,
            },
            TableKind::Machine => TableDescriptor {
                name: "kernel machine struct",
                entry_size: size_of::<Machine>(),
                capacity: 1,
                has_pointers: false,
                sparse: false,
            },
            TableKind::KMessages => TableDescriptor {
                name: "kmessages",
                entry_size: size_of::<KMessages>(),
                capacity: 1,
                has_pointers: false,
                sparse: false,
            },
            TableKind::MonitorParams => TableDescriptor {
                name: "monitor params",
                entry_size: 1,
                capacity: MONPARAMS_SIZE,
                has_pointers: false,
                sparse: false,
            },
            TableKind::LockTimings => TableDescriptor {
                name: "lock timings",
                entry_size: size_of::<TimingData>(),
                capacity: TIMING_CATEGORIES,
                has_pointers: false,
                sparse: true,
            },
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proc_nr_labels() {
        assert_eq!(ProcNr(IDLE).to_string(), "(-4)");
        assert_eq!(ProcNr(-2).to_string(), "[-2]");
        assert_eq!(ProcNr(7).to_string(), "  7 ");
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::PERMISSION_DENIED.to_string(), "EPERM (-1)");
        assert_eq!(Status(-99).to_string(), "status -99");
        assert_eq!(Status(kscope_common::EFAULT).to_string(), "EFAULT (-14)");
    }

    #[test]
    fn test_endpoint_decode() {
        let ep = Endpoint(kscope_common::make_endpoint(2, 9));
        assert_eq!(ep.generation(), 2);
        assert_eq!(ep.proc_nr(), 9);
        assert!(!ep.is_any());
        assert!(Endpoint(kscope_common::ANY).is_any());
    }

    #[test]
    fn test_linked_tables() {
        assert!(TableKind::SchedInfo.descriptor().has_pointers);
        assert!(TableKind::ProcTable.descriptor().has_pointers);
        assert!(!TableKind::BootImage.descriptor().has_pointers);
        assert_eq!(TableKind::ProcTable.descriptor().entry_size, kscope_common::PROC_SIZE);
    }
}
