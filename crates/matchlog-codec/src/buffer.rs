//! The primitive byte region the [`Builder`](crate::Builder) writes into.
//!
//! Data is written back-to-front: the occupied bytes always sit at the
//! tail of the allocation and new bytes are prepended in front of them.
//! Every position handed out is measured from the tail, so growing the
//! allocation (which moves the occupied bytes to the tail of a larger
//! one) never invalidates a position computed earlier.
//!
//! ```text
//!   allocation: [ free ............ | occupied (len bytes) ]
//!                                   ^ head
//! ```

use tracing::trace;

use crate::BuildError;

/// Largest buffer the format can address with signed 32-bit offsets.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 0x7FFF_FFFF;

/// Growable byte region written from the back.
#[derive(Debug, Clone)]
pub struct ByteBuffer {
    /// Backing allocation; occupied bytes are `bytes[head..]`.
    bytes: Vec<u8>,
    /// Index of the first occupied byte.
    head: usize,
    /// Upper bound on the occupied size.
    max_size: usize,
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl ByteBuffer {
    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(DEFAULT_MAX_BUFFER_SIZE);
        Self {
            bytes: vec![0; capacity],
            head: capacity,
            max_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }

    /// Limit the occupied size to `max_size` bytes.
    pub const fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
    }

    /// Largest size the buffer may grow to.
    pub const fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of occupied bytes.
    pub fn len(&self) -> usize {
        self.bytes.len().saturating_sub(self.head)
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the backing allocation.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// The occupied bytes, front to back.
    pub fn data(&self) -> &[u8] {
        self.bytes.get(self.head..).unwrap_or_default()
    }

    /// Reserve `n` zeroed bytes in front of the occupied region and return
    /// them for writing.
    pub fn make_space(&mut self, n: usize) -> Result<&mut [u8], BuildError> {
        let requested = self.len().checked_add(n).ok_or(BuildError::BufferTooLarge {
            requested: usize::MAX,
            max: self.max_size,
        })?;
        if requested > self.max_size {
            return Err(BuildError::BufferTooLarge {
                requested,
                max: self.max_size,
            });
        }
        if self.head < n {
            self.grow(requested)?;
        }
        let start = self
            .head
            .checked_sub(n)
            .ok_or(BuildError::Internal("head underflow after growth"))?;
        self.head = start;
        let end = start
            .checked_add(n)
            .ok_or(BuildError::Internal("space end overflow"))?;
        let space = self
            .bytes
            .get_mut(start..end)
            .ok_or(BuildError::Internal("reserved space outside allocation"))?;
        space.fill(0);
        Ok(space)
    }

    /// Prepend raw bytes.
    pub fn push_bytes(&mut self, src: &[u8]) -> Result<(), BuildError> {
        self.make_space(src.len())?.copy_from_slice(src);
        Ok(())
    }

    /// Prepend `n` zero bytes.
    pub fn pad(&mut self, n: usize) -> Result<(), BuildError> {
        if n > 0 {
            self.make_space(n)?;
        }
        Ok(())
    }

    /// Overwrite already-written bytes starting at tail position `offset`.
    pub fn patch_at(&mut self, offset: usize, src: &[u8]) -> Result<(), BuildError> {
        let start = self
            .bytes
            .len()
            .checked_sub(offset)
            .ok_or(BuildError::Internal("patch position beyond buffer"))?;
        let end = start
            .checked_add(src.len())
            .ok_or(BuildError::Internal("patch end overflow"))?;
        if start < self.head {
            return Err(BuildError::Internal("patch position not yet written"));
        }
        self.bytes
            .get_mut(start..end)
            .ok_or(BuildError::Internal("patch crosses buffer end"))?
            .copy_from_slice(src);
        Ok(())
    }

    /// Borrow `len` already-written bytes starting at tail position `offset`.
    pub fn bytes_at(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let start = self.bytes.len().checked_sub(offset)?;
        if start < self.head {
            return None;
        }
        self.bytes.get(start..start.checked_add(len)?)
    }

    /// Forget everything written, keeping the allocation.
    pub fn clear(&mut self) {
        self.head = self.bytes.len();
    }

    /// Consume the buffer, returning only the occupied bytes.
    pub fn into_vec(self) -> Vec<u8> {
        let mut bytes = self.bytes;
        bytes.drain(..self.head);
        bytes
    }

    /// Move the occupied bytes to the tail of an allocation of at least
    /// `needed` bytes.
    fn grow(&mut self, needed: usize) -> Result<(), BuildError> {
        let used = self.len();
        let mut capacity = self.bytes.len().max(1);
        while capacity < needed {
            capacity = capacity.saturating_mul(2);
        }
        let capacity = capacity.min(self.max_size).max(needed);

        let mut fresh = vec![0; capacity];
        let head = capacity
            .checked_sub(used)
            .ok_or(BuildError::Internal("grown buffer smaller than contents"))?;
        fresh
            .get_mut(head..)
            .ok_or(BuildError::Internal("grown buffer smaller than contents"))?
            .copy_from_slice(self.data());

        trace!(
            old_capacity = self.bytes.len(),
            new_capacity = capacity,
            used,
            "grew build buffer"
        );
        self.bytes = fresh;
        self.head = head;
        Ok(())
    }
}
