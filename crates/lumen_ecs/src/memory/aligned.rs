//! # Aligned Byte Buffer
//!
//! Heap buffer with a caller-chosen alignment that can grow in place while
//! preserving its contents.
//!
//! ## Safety Note
//!
//! This is the only module in the crate that uses unsafe code. Every other
//! module sees the buffer as `&[u8]` / `&mut [u8]`.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;

use thiserror::Error;

/// Why an [`AlignedBuffer`] allocation did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    /// Zero length, an alignment that is not a power of two, or a size
    /// above `isize::MAX` once rounded up to the alignment.
    #[error("invalid buffer layout: {len} bytes aligned to {align}")]
    Layout {
        /// Requested length in bytes.
        len: usize,
        /// Requested alignment.
        align: usize,
    },

    /// The global allocator returned null.
    #[error("out of memory allocating {len} bytes aligned to {align}")]
    OutOfMemory {
        /// Requested length in bytes.
        len: usize,
        /// Requested alignment.
        align: usize,
    },
}

/// A zero-initialized, growable byte buffer with a fixed alignment.
///
/// The buffer never shrinks. Bytes added by [`grow_zeroed`](Self::grow_zeroed)
/// are zero, existing bytes are preserved.
///
/// # Example
///
/// ```rust,ignore
/// let mut buffer = AlignedBuffer::zeroed(64, 16).unwrap();
/// buffer.as_mut_slice()[0] = 7;
/// buffer.grow_zeroed(128)?;
/// assert_eq!(buffer.as_slice()[0], 7);
/// ```
pub struct AlignedBuffer {
    /// Start of the allocation. Always allocated with `layout`.
    ptr: NonNull<u8>,
    /// Layout of the current allocation (size is never zero).
    layout: Layout,
}

// SAFETY: The buffer uniquely owns its allocation and only hands out borrows
// tied to `&self` / `&mut self`, exactly like `Vec<u8>`.
unsafe impl Send for AlignedBuffer {}
// SAFETY: Shared access only produces `&[u8]`.
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocates `len` zeroed bytes aligned to `align`.
    ///
    /// # Errors
    ///
    /// - [`AllocError::Layout`] if `len` is zero or the size/alignment pair
    ///   is not a valid layout.
    /// - [`AllocError::OutOfMemory`] if the allocator cannot satisfy it.
    pub fn zeroed(len: usize, align: usize) -> Result<Self, AllocError> {
        let invalid = AllocError::Layout { len, align };
        if len == 0 {
            return Err(invalid);
        }
        let layout = Layout::from_size_align(len, align).map_err(|_| invalid)?;

        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(AllocError::OutOfMemory { len, align })?;

        Ok(Self { ptr, layout })
    }

    /// Grows the buffer to `new_len` bytes, zero-filling the new tail.
    ///
    /// Does nothing if `new_len` is not larger than the current length.
    /// The allocation may move, so any previously derived pointer is invalid
    /// afterwards (borrows already guarantee this for safe callers).
    ///
    /// # Errors
    ///
    /// - [`AllocError::Layout`] if `new_len` cannot be described with the
    ///   buffer's alignment.
    /// - [`AllocError::OutOfMemory`] if the allocator cannot satisfy it.
    ///
    /// The buffer keeps its old allocation and contents on error.
    pub fn grow_zeroed(&mut self, new_len: usize) -> Result<(), AllocError> {
        let old_len = self.layout.size();
        if new_len <= old_len {
            return Ok(());
        }
        let align = self.layout.align();
        let invalid = AllocError::Layout {
            len: new_len,
            align,
        };
        let new_layout = Layout::from_size_align(new_len, align).map_err(|_| invalid)?;

        // SAFETY: `ptr` was allocated by the global allocator with
        // `self.layout`, `new_len` is non-zero and was validated together
        // with the same alignment above.
        let raw = unsafe { alloc::realloc(self.ptr.as_ptr(), self.layout, new_len) };
        // A failed realloc leaves the old block allocated and untouched.
        let ptr = NonNull::new(raw).ok_or(AllocError::OutOfMemory {
            len: new_len,
            align,
        })?;

        // SAFETY: `old_len..new_len` lies inside the new allocation.
        unsafe {
            ptr.as_ptr().add(old_len).write_bytes(0, new_len - old_len);
        }

        self.ptr = ptr;
        self.layout = new_layout;
        Ok(())
    }

    /// Returns the length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// Always false: zero-length buffers are never constructed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns the alignment of the buffer start.
    #[inline]
    #[must_use]
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    /// Views the whole buffer as bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` is valid for `len` initialized bytes (allocated
        // zeroed, growth zero-fills) and the borrow is tied to `&self`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    /// Views the whole buffer as mutable bytes.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as in `as_slice`, and `&mut self` guarantees uniqueness.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: `ptr` was allocated with exactly `self.layout`.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

impl fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len())
            .field("align", &self.align())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_allocation() {
        let buffer = AlignedBuffer::zeroed(96, 16).unwrap();
        assert_eq!(buffer.len(), 96);
        assert_eq!(buffer.align(), 16);
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
        assert_eq!(buffer.as_slice().as_ptr() as usize % 16, 0);
    }

    #[test]
    fn test_rejects_bad_layouts() {
        assert_eq!(
            AlignedBuffer::zeroed(0, 8).unwrap_err(),
            AllocError::Layout { len: 0, align: 8 }
        );
        assert_eq!(
            AlignedBuffer::zeroed(16, 3).unwrap_err(),
            AllocError::Layout { len: 16, align: 3 }
        );
        assert!(matches!(
            AlignedBuffer::zeroed(usize::MAX, 16),
            Err(AllocError::Layout { .. })
        ));
    }

    #[test]
    fn test_unsatisfiable_allocation_is_an_error() {
        // Valid layout, but larger than any address space.
        let len = 1 << 60;
        assert_eq!(
            AlignedBuffer::zeroed(len, 16).unwrap_err(),
            AllocError::OutOfMemory { len, align: 16 }
        );
    }

    #[test]
    fn test_failed_grow_keeps_buffer() {
        let mut buffer = AlignedBuffer::zeroed(16, 16).unwrap();
        buffer.as_mut_slice()[3] = 42;

        let err = buffer.grow_zeroed(1 << 60).unwrap_err();
        assert_eq!(
            err,
            AllocError::OutOfMemory {
                len: 1 << 60,
                align: 16
            }
        );
        assert_eq!(buffer.len(), 16);
        assert_eq!(buffer.as_slice()[3], 42);

        // Still usable afterwards.
        buffer.grow_zeroed(64).unwrap();
        assert_eq!(buffer.as_slice()[3], 42);
    }

    #[test]
    fn test_grow_preserves_and_zeroes() {
        let mut buffer = AlignedBuffer::zeroed(8, 4).unwrap();
        buffer.as_mut_slice().copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

        buffer.grow_zeroed(64).unwrap();
        assert_eq!(buffer.len(), 64);
        assert_eq!(&buffer.as_slice()[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(buffer.as_slice()[8..].iter().all(|&b| b == 0));
        assert_eq!(buffer.as_slice().as_ptr() as usize % 4, 0);
    }

    #[test]
    fn test_grow_to_smaller_is_noop() {
        let mut buffer = AlignedBuffer::zeroed(32, 1).unwrap();
        buffer.grow_zeroed(16).unwrap();
        assert_eq!(buffer.len(), 32);
    }
}
