use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr;

use crate::{AllocError, Storage, Transfer};

/// A buffer being filled front to back before it replaces an array's storage.
///
/// Slots `[0, filled)` have been written. If the staged buffer is dropped
/// instead of committed (an element constructor or clone panicked), the
/// elements it owns are dropped and the block is freed, so whatever was being
/// built disappears without touching the source.
///
/// Elements that arrived through a non-duplicating transfer are bitwise copies
/// of values the source still owns. Once any such element is present the
/// staged buffer owns nothing and unwinding only frees the block.
pub(crate) struct Staged<T, X> {
    storage: Storage<T>,
    filled: usize,
    relocated: bool,
    _transfer: PhantomData<X>,
}

impl<T, X> Staged<T, X> {
    pub fn with_capacity(capacity: usize) -> Result<Staged<T, X>, AllocError> {
        Ok(Staged {
            storage: Storage::new(capacity)?,
            filled: 0,
            relocated: false,
            _transfer: PhantomData,
        })
    }

    #[inline(always)]
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Writes `value` into the next slot.
    #[inline(always)]
    pub fn push(&mut self, value: T) {
        assert!(self.filled < self.storage.capacity(), "staged buffer is full");
        unsafe { self.storage.slot(self.filled).write(value) };
        self.filled += 1;
    }

    /// Constructs the next element with `f`. A panic in `f` leaves the slot empty.
    #[inline(always)]
    pub fn push_with<F>(&mut self, f: F) where F: FnOnce() -> T {
        let value = f();
        self.push(value);
    }

    /// Hands over the filled block. From here on the caller owns the elements.
    pub fn commit(self) -> Storage<T> {
        let mut this = ManuallyDrop::new(self);
        this.storage.take()
    }
}

impl<T, X: Transfer<T>> Staged<T, X> {
    /// Transfers `count` consecutive elements starting at `src` into the next slots.
    ///
    /// # Safety
    ///
    /// `src..src + count` must be live elements outside this buffer, and the
    /// staged buffer must have room for them.
    pub unsafe fn transfer_from(&mut self, src: *const T, count: usize) {
        debug_assert!(self.filled + count <= self.storage.capacity());
        if !X::DUPLICATES && count > 0 {
            self.relocated = true;
        }
        for i in 0..count {
            X::transfer(src.add(i), self.storage.slot(self.filled));
            self.filled += 1;
        }
    }
}

impl<T, X> Drop for Staged<T, X> {
    fn drop(&mut self) {
        if self.relocated || self.filled == 0 {
            return;
        }
        trace!("unwinding {} staged elements", self.filled);
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.storage.as_mut_ptr(), self.filled));
        }
    }
}
