use std::alloc::{self, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use crate::AllocError;

/// Owner of a block of uninitialized, element-sized slots.
///
/// `Storage` allocates and frees raw memory and nothing else. It has no idea
/// which slots hold live values: constructing, moving and dropping elements
/// is entirely the owner's job. Dropping a `Storage` that still contains live
/// elements frees the block without running their destructors, so they leak.
///
/// The address is the dangling marker if and only if the capacity is zero
/// (zero-sized element types aside, which never allocate).
///
/// Copying is not offered: duplicating a block without knowing which slots
/// are live means nothing. `DynamicArray` does that.
pub struct Storage<T> {
    ptr: NonNull<T>,
    capacity: usize,
    _owns: PhantomData<T>,
}

unsafe impl<T: Send> Send for Storage<T> {}
unsafe impl<T: Sync> Sync for Storage<T> {}

impl<T> Storage<T> {
    /// Storage with no slots. Does not allocate.
    pub const fn empty() -> Storage<T> {
        Storage {
            ptr: NonNull::dangling(),
            capacity: 0,
            _owns: PhantomData,
        }
    }

    /// Allocates room for `capacity` slots.
    ///
    /// A zero capacity yields the empty storage without touching the
    /// allocator. On failure nothing is allocated.
    pub fn new(capacity: usize) -> Result<Storage<T>, AllocError> {
        if capacity == 0 {
            return Ok(Storage::empty());
        }

        let layout = Layout::array::<T>(capacity)
            .map_err(|_| AllocError::CapacityOverflow { capacity })?;

        if layout.size() == 0 {
            return Ok(Storage {
                ptr: NonNull::dangling(),
                capacity,
                _owns: PhantomData,
            });
        }

        let raw = unsafe { alloc::alloc(layout) } as *mut T;
        match NonNull::new(raw) {
            Some(ptr) => {
                trace!("allocated {} slots ({} bytes) at {:?}", capacity, layout.size(), ptr);
                Ok(Storage {
                    ptr,
                    capacity,
                    _owns: PhantomData,
                })
            }
            None => {
                debug!("allocation of {} bytes failed", layout.size());
                Err(AllocError::OutOfMemory { layout })
            }
        }
    }

    /// Number of slots in the block.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if this storage owns no block.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.capacity == 0
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Address of the slot at `offset`.
    ///
    /// `offset == capacity` is allowed and yields the one-past-the-end address.
    ///
    /// # Safety
    ///
    /// `offset` must not exceed the capacity. This is only checked in debug
    /// builds. The returned pointer may refer to uninitialized memory.
    #[inline(always)]
    pub unsafe fn slot(&self, offset: usize) -> *mut T {
        debug_assert!(
            offset <= self.capacity,
            "slot offset {} is past the capacity {}",
            offset,
            self.capacity
        );
        self.ptr.as_ptr().add(offset)
    }

    /// Exchanges blocks with `other`.
    #[inline(always)]
    pub fn swap(&mut self, other: &mut Storage<T>) {
        mem::swap(&mut self.ptr, &mut other.ptr);
        mem::swap(&mut self.capacity, &mut other.capacity);
    }

    /// Moves the block out, leaving this storage empty.
    #[inline(always)]
    pub fn take(&mut self) -> Storage<T> {
        mem::replace(self, Storage::empty())
    }
}

impl<T> Default for Storage<T> {
    fn default() -> Self {
        Storage::empty()
    }
}

impl<T> fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("ptr", &self.ptr)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<T> Drop for Storage<T> {
    fn drop(&mut self) {
        if self.capacity == 0 || mem::size_of::<T>() == 0 {
            return;
        }

        trace!("releasing {} slots at {:?}", self.capacity, self.ptr);
        // Same layout that `new` computed; it was valid then.
        unsafe {
            let layout = Layout::from_size_align_unchecked(
                mem::size_of::<T>() * self.capacity,
                mem::align_of::<T>(),
            );
            alloc::dealloc(self.ptr.as_ptr() as *mut u8, layout);
        }
    }
}
