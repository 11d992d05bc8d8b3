//! Circular buffer linearization
//!
//! The kernel message log is a byte ring: the kernel writes at `next` and
//! wraps at the capacity, so a copy of the ring holds the oldest bytes
//! somewhere in the middle. [`RingBuffer::linearize`] restores write order.

use kscope_common::KMessages;
use log::warn;

/// Borrowed view of a circular byte buffer
#[derive(Debug, Clone, Copy)]
pub struct RingBuffer<'a> {
    buf: &'a [u8],
    size: usize,
    next: usize,
}

impl<'a> RingBuffer<'a> {
    /// Describe a ring holding `size` valid bytes whose next write goes to `next`
    ///
    /// Out-of-range values from a corrupt copy are clamped: `size` to the
    /// capacity and `next` modulo the capacity.
    #[must_use]
    pub fn new(buf: &'a [u8], size: usize, next: usize) -> Self {
        let capacity = buf.len();
        if size > capacity || (capacity > 0 && next >= capacity) {
            warn!(
                "Ring descriptor out of range (size={size}, next={next}, capacity={capacity}), clamping"
            );
        }
        let size = size.min(capacity);
        let next = if capacity == 0 { 0 } else { next % capacity };
        Self { buf, size, next }
    }

    /// View the kernel message ring of a snapshot
    #[must_use]
    pub fn from_kmessages(kmess: &'a KMessages) -> Self {
        Self::new(&kmess.buf, kmess.size as usize, kmess.next as usize)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Index of the oldest valid byte
    #[must_use]
    pub fn start(&self) -> usize {
        match self.capacity() {
            0 => 0,
            capacity => (self.next + capacity - self.size) % capacity,
        }
    }

    /// Valid bytes, oldest first
    #[must_use]
    pub fn linearize(&self) -> Vec<u8> {
        let (head, tail) = self.segments();
        let mut out = Vec::with_capacity(self.size);
        out.extend_from_slice(head);
        out.extend_from_slice(tail);
        out
    }

    /// The valid region as (older, newer) contiguous slices
    fn segments(&self) -> (&'a [u8], &'a [u8]) {
        let start = self.start();
        let end = start + self.size;
        if end <= self.capacity() {
            (&self.buf[start..end], &[])
        } else {
            (&self.buf[start..], &self.buf[..end - self.capacity()])
        }
    }
}
