//! How live elements get into a new buffer when an array grows.
//!
//! A growing array always builds the new buffer completely before it retires
//! the old one. The policy decides what "getting an element across" means:
//!
//! - [`Relocate`] moves the bits. It cannot fail, and the source slot is
//!   logically uninitialized once the new buffer is published.
//! - [`Duplicate`] clones. A clone may panic, so the source stays alive until
//!   the new buffer is complete, and only then are the originals dropped.
//!
//! `Relocate` is the default and works for every type. `Duplicate` exists for
//! element types whose relocation must go through their own `Clone` impl.

use std::ptr;

/// Transfer policy used whenever live elements are relocated to new storage.
///
/// # Safety
///
/// `DUPLICATES` must describe `transfer` truthfully: when it is `false`,
/// `transfer` must be a plain bitwise move that never panics, and the caller
/// treats the source slot as moved-from. When it is `true`, the source must
/// still hold a valid value afterwards.
pub unsafe trait Transfer<T> {
    /// True when `transfer` leaves the source intact.
    const DUPLICATES: bool;

    /// Constructs a value at `dst` from the value at `src`.
    ///
    /// # Safety
    ///
    /// `src` must point at a live value, `dst` at an uninitialized slot, and
    /// the two must not overlap.
    unsafe fn transfer(src: *const T, dst: *mut T);
}

/// Moves elements bitwise.
#[derive(Debug)]
pub enum Relocate {}

unsafe impl<T> Transfer<T> for Relocate {
    const DUPLICATES: bool = false;

    #[inline(always)]
    unsafe fn transfer(src: *const T, dst: *mut T) {
        ptr::copy_nonoverlapping(src, dst, 1);
    }
}

/// Clones elements, keeping the originals alive until the new buffer is
/// published.
#[derive(Debug)]
pub enum Duplicate {}

unsafe impl<T: Clone> Transfer<T> for Duplicate {
    const DUPLICATES: bool = true;

    #[inline(always)]
    unsafe fn transfer(src: *const T, dst: *mut T) {
        dst.write((*src).clone());
    }
}
