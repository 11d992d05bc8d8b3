//! Domain model for kscope
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time separation of kernel-space and caller-space addresses
//! - Static descriptors for every snapshot-able table
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{Endpoint, KernelAddr, LocalAddr, ProcNr, Status, TableDescriptor, TableKind};

pub use errors::{DumpError, SourceError};
