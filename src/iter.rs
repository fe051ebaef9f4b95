use std::fmt;
use std::iter::FusedIterator;
use std::ptr;
use std::slice;

use crate::Storage;

/// Owning iterator over the elements of a `DynamicArray`.
///
/// Keeps the array's storage alive; slots `[start, end)` are still live.
/// Elements not yet yielded are dropped with the iterator.
pub struct IntoIter<T> {
    storage: Storage<T>,
    start: usize,
    end: usize,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(storage: Storage<T>, len: usize) -> IntoIter<T> {
        IntoIter {
            storage,
            start: 0,
            end: len,
        }
    }

    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.storage.slot(self.start), self.end - self.start) }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        let item = unsafe { ptr::read(self.storage.slot(self.start)) };
        self.start += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.start;
        (len, Some(len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        Some(unsafe { ptr::read(self.storage.slot(self.end)) })
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

impl<T> FusedIterator for IntoIter<T> {}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        let remaining = self.end - self.start;
        self.end = self.start;
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.storage.slot(self.start), remaining));
        }
    }
}
