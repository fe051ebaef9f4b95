use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr;
use std::slice::{self, SliceIndex};

use scopeguard::ScopeGuard;

use crate::staged::Staged;
use crate::{AllocError, IntoIter, Relocate, Storage, Transfer};

/// A contiguous growable array built directly on [`Storage`].
///
/// Slots `[0, len)` hold live elements, slots `[len, capacity)` are
/// uninitialized. Growth doubles the capacity (starting at 1), so pushing `n`
/// elements costs amortized O(1) each.
///
/// The transfer policy `X` decides how live elements reach a new buffer when
/// the array grows: [`Relocate`](crate::Relocate) (the default) moves them,
/// [`Duplicate`](crate::Duplicate) clones them and drops the originals only
/// once the new buffer is complete.
///
/// # Panic safety
///
/// Construction, copying, `reserve`, `resize`, `push_back`/`emplace_back` and
/// `insert`/`emplace` are all-or-nothing: if an element constructor or clone
/// panics, the array keeps the length, capacity and values it had before the
/// call (`resize` keeps the capacity it reserved). Every allocating operation
/// reports [`AllocError`] instead of aborting.
///
/// Positional insertion that has to grow fills the new buffer in three steps
/// (prefix transfer, new element, suffix transfer) and publishes it only after
/// all three succeed. The old buffer is never consumed before that point, so
/// the guarantee stays strong for both policies.
///
/// `assign` and `clone_from` reuse the existing buffer element by element and
/// only promise that the array stays valid if a clone panics partway.
///
/// References and iterators into the array are invalidated by anything that
/// reallocates or shifts elements; the borrow checker enforces that.
pub struct DynamicArray<T, X = Relocate> {
    storage: Storage<T>,
    len: usize,
    _transfer: PhantomData<X>,
}

impl<T, X> DynamicArray<T, X> {
    /// Creates an empty array. Does not allocate.
    pub const fn new() -> DynamicArray<T, X> {
        DynamicArray {
            storage: Storage::empty(),
            len: 0,
            _transfer: PhantomData,
        }
    }

    /// Creates an empty array with room for exactly `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<DynamicArray<T, X>, AllocError> {
        Ok(DynamicArray {
            storage: Storage::new(capacity)?,
            len: 0,
            _transfer: PhantomData,
        })
    }

    fn from_staged(staged: Staged<T, X>) -> DynamicArray<T, X> {
        let len = staged.filled();
        DynamicArray {
            storage: staged.commit(),
            len,
            _transfer: PhantomData,
        }
    }

    /// Creates an array holding clones of `items`, with capacity equal to its length.
    pub fn try_from_slice(items: &[T]) -> Result<DynamicArray<T, X>, AllocError> where T: Clone {
        let mut staged = Staged::with_capacity(items.len())?;
        for item in items {
            staged.push_with(|| item.clone());
        }
        Ok(DynamicArray::from_staged(staged))
    }

    /// Deep copy with a tight capacity.
    pub fn try_clone(&self) -> Result<DynamicArray<T, X>, AllocError> where T: Clone {
        DynamicArray::try_from_slice(self.as_slice())
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.storage.as_ptr(), self.len) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.storage.as_mut_ptr(), self.len) }
    }

    /// Exchanges contents with `other` in O(1).
    pub fn swap(&mut self, other: &mut DynamicArray<T, X>) {
        self.storage.swap(&mut other.storage);
        mem::swap(&mut self.len, &mut other.len);
    }

    /// Moves the contents out in O(1), leaving this array empty with no capacity.
    pub fn take(&mut self) -> DynamicArray<T, X> {
        mem::replace(self, DynamicArray::new())
    }

    /// Drops the last element.
    ///
    /// Calling this on an empty array is a contract violation. Debug builds
    /// assert; release builds do nothing.
    pub fn pop_back(&mut self) {
        debug_assert!(self.len > 0, "pop_back on an empty array");
        if self.len == 0 {
            return;
        }
        self.len -= 1;
        unsafe { ptr::drop_in_place(self.storage.slot(self.len)) };
    }

    /// Removes the last element and returns it, or `None` if empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            Some(unsafe { ptr::read(self.storage.slot(self.len)) })
        }
    }

    /// Removes the element at `position`, shifting the tail left.
    ///
    /// `position == len` is the end offset and is a no-op. Returns the offset
    /// of the element that followed the removed one (the end offset when the
    /// last element was removed).
    ///
    /// # Panics
    ///
    /// If `position > len`.
    pub fn erase(&mut self, position: usize) -> usize {
        assert!(position <= self.len, "erase position {} is past the length {}", position, self.len);
        if position == self.len {
            return position;
        }
        drop(self.remove(position));
        position
    }

    /// Removes the element at `position` and returns it, shifting the tail left.
    ///
    /// # Panics
    ///
    /// If `position >= len`.
    pub fn remove(&mut self, position: usize) -> T {
        assert!(position < self.len, "remove position {} is out of bounds for length {}", position, self.len);
        unsafe {
            let at = self.storage.slot(position);
            let removed = ptr::read(at);
            ptr::copy(at.add(1), at, self.len - position - 1);
            self.len -= 1;
            removed
        }
    }

    /// Drops the elements past `len`. Does nothing if `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let excess = self.len - len;
        self.len = len;
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.storage.slot(len), excess)) };
    }

    /// Drops all elements, keeping the capacity.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Copy-assignment.
    ///
    /// If `rhs` does not fit in the current capacity a fresh copy is built and
    /// replaces this array, which is all-or-nothing. Otherwise the buffer is
    /// reused: the overlapping prefix is assigned element-wise with
    /// `clone_from`, missing elements are cloned into the free slots and excess
    /// ones are dropped. A panicking clone in that path leaves the array valid
    /// but partially assigned.
    pub fn assign(&mut self, rhs: &[T]) -> Result<(), AllocError> where T: Clone {
        if rhs.len() > self.capacity() {
            *self = DynamicArray::try_from_slice(rhs)?;
            return Ok(());
        }

        let shared = self.len.min(rhs.len());
        for (dst, src) in self.as_mut_slice()[..shared].iter_mut().zip(&rhs[..shared]) {
            dst.clone_from(src);
        }
        if rhs.len() > self.len {
            for src in &rhs[self.len..] {
                let value = src.clone();
                unsafe { self.storage.slot(self.len).write(value) };
                self.len += 1;
            }
        } else {
            self.truncate(rhs.len());
        }
        Ok(())
    }
}

impl<T, X: Transfer<T>> DynamicArray<T, X> {
    fn grown_capacity(&self) -> Result<usize, AllocError> {
        match self.len {
            0 => Ok(1),
            len => len
                .checked_mul(2)
                .ok_or(AllocError::CapacityOverflow { capacity: usize::MAX }),
        }
    }

    /// Replaces the storage with a fully staged buffer holding `len` elements.
    ///
    /// With a duplicating transfer the old elements are still alive and are
    /// dropped here; otherwise they were moved out and the old block is just freed.
    fn publish(&mut self, staged: Staged<T, X>, len: usize) {
        let mut retired = staged.commit();
        self.storage.swap(&mut retired);
        debug!("published {} slots holding {} elements", self.storage.capacity(), len);
        let retired_len = mem::replace(&mut self.len, len);
        if X::DUPLICATES {
            unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(retired.as_mut_ptr(), retired_len)) };
        }
    }

    /// Ensures room for at least `new_capacity` elements.
    ///
    /// Does nothing if the capacity is already large enough; otherwise moves
    /// the elements into a buffer of exactly `new_capacity` slots.
    pub fn reserve(&mut self, new_capacity: usize) -> Result<(), AllocError> {
        if new_capacity <= self.capacity() {
            return Ok(());
        }

        debug!("reserve {} -> {} slots", self.capacity(), new_capacity);
        let mut staged = Staged::<T, X>::with_capacity(new_capacity)?;
        unsafe { staged.transfer_from(self.storage.as_ptr(), self.len) };
        let len = self.len;
        self.publish(staged, len);
        Ok(())
    }

    /// Appends the value produced by `f` and returns a reference to it.
    ///
    /// When the array is full a buffer of twice the length (at least 1) is
    /// allocated and the new element is constructed before any existing
    /// element is transferred, so a panicking `f` never touches the old buffer.
    pub fn emplace_back<F>(&mut self, f: F) -> Result<&mut T, AllocError> where F: FnOnce() -> T {
        if self.len < self.capacity() {
            let value = f();
            unsafe { self.storage.slot(self.len).write(value) };
        } else {
            let grown = self.grown_capacity()?;
            let mut staged = Staged::<T, X>::with_capacity(grown)?;
            let value = f();
            unsafe { staged.transfer_from(self.storage.as_ptr(), self.len) };
            staged.push(value);
            let len = self.len;
            self.publish(staged, len);
        }
        self.len += 1;
        Ok(unsafe { &mut *self.storage.slot(self.len - 1) })
    }

    /// Appends `value` and returns a reference to it.
    pub fn push_back(&mut self, value: T) -> Result<&mut T, AllocError> {
        self.emplace_back(move || value)
    }

    /// Inserts the value produced by `f` at `position`, shifting the tail right.
    /// Returns `position`.
    ///
    /// `position == len` appends.
    ///
    /// # Panics
    ///
    /// If `position > len`.
    pub fn emplace<F>(&mut self, position: usize, f: F) -> Result<usize, AllocError> where F: FnOnce() -> T {
        assert!(position <= self.len, "insert position {} is past the length {}", position, self.len);

        if self.len < self.capacity() {
            if position == self.len {
                self.emplace_back(f)?;
                return Ok(position);
            }
            let value = f();
            unsafe {
                let at = self.storage.slot(position);
                ptr::copy(at, at.add(1), self.len - position);
                at.write(value);
            }
            self.len += 1;
            return Ok(position);
        }

        let grown = self.grown_capacity()?;
        let mut staged = Staged::<T, X>::with_capacity(grown)?;
        unsafe {
            staged.transfer_from(self.storage.as_ptr(), position);
            staged.push_with(f);
            staged.transfer_from(self.storage.slot(position), self.len - position);
        }
        let len = self.len + 1;
        self.publish(staged, len);
        Ok(position)
    }

    /// Inserts `value` at `position`, shifting the tail right. Returns `position`.
    pub fn insert(&mut self, position: usize, value: T) -> Result<usize, AllocError> {
        self.emplace(position, move || value)
    }
}

impl<T: Default, X> DynamicArray<T, X> {
    /// Creates an array of `len` default values with capacity exactly `len`.
    pub fn with_len(len: usize) -> Result<DynamicArray<T, X>, AllocError> {
        let mut staged = Staged::with_capacity(len)?;
        for _ in 0..len {
            staged.push_with(T::default);
        }
        Ok(DynamicArray::from_staged(staged))
    }
}

impl<T: Default, X: Transfer<T>> DynamicArray<T, X> {
    /// Sets the length to `new_len`, default-constructing new elements or
    /// dropping excess ones.
    ///
    /// Growing reserves exactly `new_len` slots when the capacity is short. If
    /// a default constructor panics, the elements built so far are dropped and
    /// the length is unchanged; the reserved capacity stays.
    pub fn resize(&mut self, new_len: usize) -> Result<(), AllocError> {
        self.reserve(new_len)?;
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }

        let extra = new_len - self.len;
        let base = unsafe { self.storage.slot(self.len) };
        let mut built = scopeguard::guard(0usize, move |built| unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base, built));
        });
        while *built < extra {
            unsafe { base.add(*built).write(T::default()) };
            *built += 1;
        }
        self.len += ScopeGuard::into_inner(built);
        Ok(())
    }
}

impl<T, X> Drop for DynamicArray<T, X> {
    fn drop(&mut self) {
        unsafe { ptr::drop_in_place(self.as_mut_slice()) };
    }
}

impl<T, X> Default for DynamicArray<T, X> {
    fn default() -> Self {
        DynamicArray::new()
    }
}

impl<T: Clone, X> Clone for DynamicArray<T, X> {
    fn clone(&self) -> Self {
        self.try_clone().unwrap_or_else(|err| err.handle())
    }

    fn clone_from(&mut self, source: &Self) {
        self.assign(source.as_slice()).unwrap_or_else(|err| err.handle())
    }
}

impl<T, X> Deref for DynamicArray<T, X> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, X> DerefMut for DynamicArray<T, X> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, I: SliceIndex<[T]>, X> Index<I> for DynamicArray<T, X> {
    type Output = I::Output;

    #[inline(always)]
    fn index(&self, index: I) -> &I::Output {
        Index::index(self.as_slice(), index)
    }
}

impl<T, I: SliceIndex<[T]>, X> IndexMut<I> for DynamicArray<T, X> {
    #[inline(always)]
    fn index_mut(&mut self, index: I) -> &mut I::Output {
        IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<T, X> AsRef<[T]> for DynamicArray<T, X> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, X> AsMut<[T]> for DynamicArray<T, X> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: fmt::Debug, X> fmt::Debug for DynamicArray<T, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U, X, Y> PartialEq<DynamicArray<U, Y>> for DynamicArray<T, X> where T: PartialEq<U> {
    fn eq(&self, other: &DynamicArray<U, Y>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, X> Eq for DynamicArray<T, X> {}

impl<T, U, X> PartialEq<[U]> for DynamicArray<T, X> where T: PartialEq<U> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U, X> PartialEq<&[U]> for DynamicArray<T, X> where T: PartialEq<U> {
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T, U, X, const N: usize> PartialEq<[U; N]> for DynamicArray<T, X> where T: PartialEq<U> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == &other[..]
    }
}

impl<T: PartialOrd, X> PartialOrd for DynamicArray<T, X> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Ord, X> Ord for DynamicArray<T, X> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Hash, X> Hash for DynamicArray<T, X> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<T, X: Transfer<T>> Extend<T> for DynamicArray<T, X> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        if let Some(wanted) = self.len.checked_add(lower) {
            if wanted > self.capacity() {
                let target = wanted.max(self.len.saturating_mul(2));
                self.reserve(target).unwrap_or_else(|err| err.handle());
            }
        }
        for item in iter {
            self.push_back(item).unwrap_or_else(|err| err.handle());
        }
    }
}

impl<'a, T: Copy + 'a, X: Transfer<T>> Extend<&'a T> for DynamicArray<T, X> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied())
    }
}

impl<T, X: Transfer<T>> FromIterator<T> for DynamicArray<T, X> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = DynamicArray::new();
        array.extend(iter);
        array
    }
}

impl<T, X> IntoIterator for DynamicArray<T, X> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        let mut this = ManuallyDrop::new(self);
        let len = this.len;
        IntoIter::new(this.storage.take(), len)
    }
}

impl<'a, T, X> IntoIterator for &'a DynamicArray<T, X> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> slice::Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T, X> IntoIterator for &'a mut DynamicArray<T, X> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> slice::IterMut<'a, T> {
        self.iter_mut()
    }
}
