//! # Shared Kernel Table Layouts (Kernel ↔ kscope)
//!
//! Defines the in-memory layout of every kernel table kscope can snapshot,
//! together with the kernel constants needed to interpret them. All types
//! use `#[repr(C)]` so that a byte-exact copy taken out of the kernel's
//! address space has the same layout in the caller.
//!
//! ## Pointer Fields
//!
//! Some tables link entries to each other with raw kernel-space addresses
//! (the scheduling ready-queues thread through [`Proc::next_ready`]). Those
//! fields are stored as plain `u64` values: they are *not* valid in the
//! caller's address space until relocated, and [`NIL_PTR`] marks an absent
//! link. Pointer arithmetic over the copied process table depends on
//! [`PROC_SIZE`], which is checked at compile time.
//!
//! ## Key Types
//!
//! - [`Proc`] - Process table slot (sparse, `SLOT_FREE` marks empty slots)
//! - [`Priv`] - System privilege structure
//! - [`IrqHook`] - Interrupt hook (sparse, `NONE` owner marks unused hooks)
//! - [`BootImage`] - Boot image entry
//! - [`KInfo`] / [`Machine`] - Kernel and machine information
//! - [`KMessages`] - Kernel diagnostic message ring
//! - [`TimingData`] - Lock timing histogram

#![no_std]

// ============================================================================
// Table Sizing
// ============================================================================

/// Number of kernel tasks (negative process numbers)
pub const NR_TASKS: usize = 4;

/// Number of user and system process slots
pub const NR_PROCS: usize = 100;

/// Total process table capacity: tasks first, then processes
pub const NR_PROC_SLOTS: usize = NR_TASKS + NR_PROCS;

/// Number of privilege structures for system processes
pub const NR_SYS_PROCS: usize = 32;

/// Number of kernel calls covered by a privilege call mask
pub const NR_SYS_CALLS: usize = 64;

/// Number of interrupt hooks
pub const NR_IRQ_HOOKS: usize = 16;

/// Number of interrupt vectors
pub const NR_IRQ_VECTORS: usize = 16;

/// Number of entries in the boot image table
pub const NR_BOOT_PROCS: usize = 16;

/// Number of scheduling ready-queues (0 is highest priority)
pub const NR_SCHED_QUEUES: usize = 16;

/// Capacity of the kernel message ring in bytes
pub const KMESS_BUF_SIZE: usize = 256;

/// Size of the boot monitor parameter block
pub const MONPARAMS_SIZE: usize = 1024;

/// Number of lock timing categories
pub const TIMING_CATEGORIES: usize = 8;

/// Number of histogram bins per lock timing category
pub const TIMING_POINTS: usize = 20;

/// Width of a lock timing category name
pub const TIMING_NAME: usize = 10;

/// Maximum process name length (NUL padded)
pub const P_NAME_LEN: usize = 16;

// ============================================================================
// Bitmaps
// ============================================================================

/// Unit of kernel bitmaps (IPC send masks, kernel call masks)
pub type BitChunk = u16;

/// Bits per [`BitChunk`]
pub const BITCHUNK_BITS: usize = 16;

/// Chunks in a bitmap covering all system processes
pub const SYS_MAP_CHUNKS: usize = NR_SYS_PROCS.div_ceil(BITCHUNK_BITS);

/// Chunks in a bitmap covering all kernel calls
pub const CALL_MASK_CHUNKS: usize = NR_SYS_CALLS.div_ceil(BITCHUNK_BITS);

// ============================================================================
// Process Numbers and Endpoints
// ============================================================================

/// Idle task
pub const IDLE: i32 = -4;
/// Clock task
pub const CLOCK: i32 = -3;
/// System task
pub const SYSTEM: i32 = -2;
/// Kernel pseudo-task
pub const KERNEL: i32 = -1;

/// Wildcard endpoint ("receive from any")
pub const ANY: i32 = 0x7ace;

/// Endpoint of nobody (unused hooks, unused privilege structures)
pub const NONE: i32 = 0x6ace;

/// Endpoint encoding: generation number lives above this shift
pub const ENDPOINT_GENERATION_SHIFT: u32 = 15;

/// Offset keeping task endpoints non-negative before the generation split
pub const MAX_NR_TASKS: i32 = 1023;

/// Generation number encoded in an endpoint
///
/// Endpoints come from copied tables and may be garbage, so the decoders
/// wrap instead of overflowing. Valid endpoints never reach the wrap.
#[must_use]
pub const fn endpoint_generation(endpoint: i32) -> i32 {
    endpoint.wrapping_add(MAX_NR_TASKS) >> ENDPOINT_GENERATION_SHIFT
}

/// Process number encoded in an endpoint, always in `-1023..=31744`
#[must_use]
pub const fn endpoint_proc(endpoint: i32) -> i32 {
    (endpoint.wrapping_add(MAX_NR_TASKS) & ((1 << ENDPOINT_GENERATION_SHIFT) - 1)) - MAX_NR_TASKS
}

/// Build an endpoint from a generation and a process number
#[must_use]
pub const fn make_endpoint(generation: i32, proc_nr: i32) -> i32 {
    (generation << ENDPOINT_GENERATION_SHIFT).wrapping_add(proc_nr)
}

// ============================================================================
// Flag Bits
// ============================================================================

/// `Proc::rts_flags`: slot is free
pub const SLOT_FREE: u32 = 0x01;
/// `Proc::rts_flags`: process has no scheduling priority yet
pub const NO_PRIORITY: u32 = 0x02;
/// `Proc::rts_flags`: blocked sending a message
pub const SENDING: u32 = 0x04;
/// `Proc::rts_flags`: blocked receiving a message
pub const RECEIVING: u32 = 0x08;
/// `Proc::rts_flags`: new kernel signal arrived
pub const SIGNALED: u32 = 0x10;
/// `Proc::rts_flags`: unready while signal is being processed
pub const SIG_PENDING: u32 = 0x20;
/// `Proc::rts_flags`: stopped by a tracer
pub const P_STOP: u32 = 0x40;
/// `Proc::rts_flags`: privilege structure not yet assigned
pub const NO_PRIV: u32 = 0x80;

/// `Priv::flags`: process may be preempted
pub const PREEMPTIBLE: u16 = 0x02;
/// `Priv::flags`: process time is billed to it
pub const BILLABLE: u16 = 0x04;
/// `Priv::flags`: system process
pub const SYS_PROC: u16 = 0x10;

/// IPC trap number: send
pub const SEND: u32 = 1;
/// IPC trap number: receive
pub const RECEIVE: u32 = 2;
/// IPC trap number: send then receive
pub const SENDREC: u32 = 3;
/// IPC trap number: notify
pub const NOTIFY: u32 = 4;
/// IPC trap number: asynchronous send
pub const SENDA: u32 = 16;

/// `IrqHook::policy`: re-enable the IRQ after the handler ran
pub const IRQ_REENABLE: u32 = 0x001;

/// Privilege structure shared by all ordinary user processes
pub const USER_PRIV_ID: usize = 0;

/// Absent kernel pointer
pub const NIL_PTR: u64 = 0;

// ============================================================================
// Kernel Status Codes
// ============================================================================

/// Request succeeded
pub const OK: i32 = 0;
/// Operation not permitted
pub const EPERM: i32 = -1;
/// No such table or entry
pub const ENOENT: i32 = -2;
/// Resource temporarily unavailable (structure locked)
pub const EAGAIN: i32 = -11;
/// Bad address
pub const EFAULT: i32 = -14;
/// Invalid argument
pub const EINVAL: i32 = -22;

// ============================================================================
// Process Table
// ============================================================================

/// Memory segment indices into [`Proc::memmap`]
pub const T: usize = 0;
/// Data segment
pub const D: usize = 1;
/// Stack segment
pub const S: usize = 2;
/// Number of local memory segments
pub const NR_LOCAL_SEGS: usize = 3;

/// One memory segment, in clicks
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemMap {
    pub vir: u32,
    pub phys: u32,
    pub len: u32,
}

/// Process table slot
///
/// **Memory Layout**: exactly [`PROC_SIZE`] bytes; the kernel links slots
/// through [`Proc::next_ready`], so the slot size is part of the ABI.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Proc {
    /// Process number (negative for kernel tasks)
    pub nr: i32,
    /// Endpoint (generation + process number)
    pub endpoint: i32,
    /// Runtime flags; `SLOT_FREE` marks an empty slot
    pub rts_flags: u32,
    /// Endpoint this process is blocked on when `SENDING`/`RECEIVING`
    pub getfrom: i32,
    /// Current scheduling queue
    pub priority: u8,
    /// Highest scheduling queue allowed
    pub max_priority: u8,
    /// Ticks left in the current quantum
    pub ticks_left: u8,
    /// Quantum size in ticks
    pub quantum_size: u8,
    #[allow(clippy::pub_underscore_fields)]
    pub _pad0: [u8; 4],
    /// User time in ticks
    pub user_time: u64,
    /// System time in ticks
    pub sys_time: u64,
    /// **Kernel pointer** to the next process in the same ready queue
    pub next_ready: u64,
    /// Saved program counter
    pub pc: u64,
    /// Saved stack pointer
    pub sp: u64,
    /// Page table base
    pub cr3: u64,
    /// Text, data and stack segments
    pub memmap: [MemMap; NR_LOCAL_SEGS],
    /// Process name (NUL padded)
    pub name: [u8; P_NAME_LEN],
    #[allow(clippy::pub_underscore_fields)]
    pub _pad1: [u8; 4],
}

/// Size of one process table slot in the kernel
pub const PROC_SIZE: usize = 128;

const _: () = assert!(core::mem::size_of::<Proc>() == PROC_SIZE);

impl Proc {
    /// An empty slot, as the kernel leaves it after process exit
    #[must_use]
    pub const fn free() -> Self {
        Self {
            nr: 0,
            endpoint: NONE,
            rts_flags: SLOT_FREE,
            getfrom: NONE,
            priority: 0,
            max_priority: 0,
            ticks_left: 0,
            quantum_size: 0,
            _pad0: [0; 4],
            user_time: 0,
            sys_time: 0,
            next_ready: NIL_PTR,
            pc: 0,
            sp: 0,
            cr3: 0,
            memmap: [MemMap { vir: 0, phys: 0, len: 0 }; NR_LOCAL_SEGS],
            name: [0; P_NAME_LEN],
            _pad1: [0; 4],
        }
    }

    /// Whether this slot is free
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rts_flags & SLOT_FREE != 0
    }

    /// Process name up to the first NUL
    #[must_use]
    pub fn name(&self) -> &str {
        c_str(&self.name)
    }
}

/// Table slot of a process number (tasks occupy the first slots)
#[must_use]
pub fn proc_slot(nr: i32) -> Option<usize> {
    nr.checked_add(NR_TASKS as i32)
        .and_then(|slot| usize::try_from(slot).ok())
        .filter(|slot| *slot < NR_PROC_SLOTS)
}

// ============================================================================
// Privilege Table
// ============================================================================

/// System privilege structure
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Priv {
    /// Process number owning this structure, `NONE` if unused
    pub proc_nr: i32,
    /// Index of this structure in the privilege table
    pub id: u16,
    /// `PREEMPTIBLE`, `BILLABLE`, `SYS_PROC`
    pub flags: u16,
    /// Allowed IPC traps, bit `1 << trap number`
    pub trap_mask: u32,
    /// Number of grant table entries
    pub grant_entries: i32,
    /// System processes this one may send to
    pub ipc_to: [BitChunk; SYS_MAP_CHUNKS],
    /// System processes this one may `SENDREC` to
    pub ipc_sendrec: [BitChunk; SYS_MAP_CHUNKS],
    /// Allowed kernel calls
    pub k_call_mask: [BitChunk; CALL_MASK_CHUNKS],
}

impl Priv {
    /// An unused privilege structure
    #[must_use]
    pub const fn unused(id: u16) -> Self {
        Self {
            proc_nr: NONE,
            id,
            flags: 0,
            trap_mask: 0,
            grant_entries: 0,
            ipc_to: [0; SYS_MAP_CHUNKS],
            ipc_sendrec: [0; SYS_MAP_CHUNKS],
            k_call_mask: [0; CALL_MASK_CHUNKS],
        }
    }
}

// ============================================================================
// Interrupt Hooks
// ============================================================================

/// Interrupt hook
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct IrqHook {
    /// Owning endpoint, `NONE` if the hook is unused
    pub proc_nr_e: i32,
    /// IRQ line
    pub irq: i32,
    /// `IRQ_REENABLE`
    pub policy: u32,
    /// Id passed back in the notification
    pub notify_id: i32,
}

impl IrqHook {
    /// An unused hook
    #[must_use]
    pub const fn unused() -> Self {
        Self { proc_nr_e: NONE, irq: 0, policy: 0, notify_id: 0 }
    }

    /// Whether nobody owns this hook
    #[must_use]
    pub const fn is_unused(&self) -> bool {
        self.proc_nr_e == NONE
    }
}

// ============================================================================
// Boot Image
// ============================================================================

/// Boot image table entry
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct BootImage {
    pub proc_nr: i32,
    /// `PREEMPTIBLE`, `BILLABLE`, `SYS_PROC`
    pub flags: u16,
    #[allow(clippy::pub_underscore_fields)]
    pub _pad0: u16,
    /// Allowed IPC traps
    pub trap_mask: u32,
    /// Initial send mask (first chunk)
    pub ipc_to: BitChunk,
    #[allow(clippy::pub_underscore_fields)]
    pub _pad1: u16,
    /// Scheduling queue
    pub priority: i32,
    /// Entry point (kernel tasks only, printed raw)
    pub initial_pc: u64,
    /// Stack size in bytes
    pub stksize: u64,
    pub proc_name: [u8; P_NAME_LEN],
}

impl BootImage {
    /// Process name up to the first NUL
    #[must_use]
    pub fn name(&self) -> &str {
        c_str(&self.proc_name)
    }
}

// ============================================================================
// Kernel and Machine Information
// ============================================================================

/// Kernel information structure
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct KInfo {
    pub code_base: u64,
    pub code_size: u64,
    pub data_base: u64,
    pub data_size: u64,
    /// **Kernel address** of the process table
    pub proc_addr: u64,
    pub bootdev_base: u64,
    pub bootdev_size: u64,
    pub ramdev_base: u64,
    pub ramdev_size: u64,
    pub nr_procs: u32,
    pub nr_tasks: u32,
    pub release: [u8; 6],
    pub version: [u8; 6],
    /// Lock re-entry counter (lock debugging builds)
    pub relocking: i32,
}

impl KInfo {
    /// Release string up to the first NUL
    #[must_use]
    pub fn release(&self) -> &str {
        c_str(&self.release)
    }

    /// Version string up to the first NUL
    #[must_use]
    pub fn version(&self) -> &str {
        c_str(&self.version)
    }
}

/// Machine information structure
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct Machine {
    pub pc_at: i32,
    pub ps_mca: i32,
    pub processor: i32,
    pub vdu_ega: i32,
    pub vdu_vga: i32,
}

// ============================================================================
// Kernel Message Ring
// ============================================================================

/// Kernel diagnostic message ring
///
/// The kernel appends at `next`, wrapping at [`KMESS_BUF_SIZE`]; `size` is the
/// number of valid bytes, saturating at the capacity.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct KMessages {
    pub next: u32,
    pub size: u32,
    pub buf: [u8; KMESS_BUF_SIZE],
}

impl KMessages {
    /// An empty ring
    #[must_use]
    pub const fn empty() -> Self {
        Self { next: 0, size: 0, buf: [0; KMESS_BUF_SIZE] }
    }
}

// ============================================================================
// Lock Timings
// ============================================================================

/// Lock timing histogram for one category
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct TimingData {
    pub name: [u8; TIMING_NAME],
    #[allow(clippy::pub_underscore_fields)]
    pub _pad0: [u8; 6],
    pub misses: u64,
    pub resets: u64,
    pub measurements: u64,
    /// Samples per bin
    pub lock_timings: [u32; TIMING_POINTS],
    /// Lower bound of the first bin; 0 means the category is unused
    pub lock_timings_range: [i32; 2],
    /// Width of one bin
    pub binsize: i32,
}

impl TimingData {
    /// Category name up to the first NUL
    #[must_use]
    pub fn name(&self) -> &str {
        c_str(&self.name)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Interpret a NUL-padded kernel string
///
/// Returns `"?"` for bytes that are not valid UTF-8.
#[must_use]
pub fn c_str(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    core::str::from_utf8(&bytes[..end]).unwrap_or("?")
}
