//! A growable array built from first principles on raw, uninitialized storage.
//!
//! Two layers:
//!
//! - [`Storage`] owns a block of uninitialized element slots. It allocates
//!   and frees memory and never constructs or drops an element.
//! - [`DynamicArray`] owns one `Storage` plus the count of live elements and
//!   implements everything users see: construction, copying, growth,
//!   insertion and removal, with strong panic safety and amortized O(1) growth.
//!
//! How elements are carried into a bigger buffer is a type-level choice, see
//! [`Transfer`].
//!
//! Enable the `logging` feature to route allocation and growth events to `log`.

mod logging;

mod array;
mod error;
mod iter;
mod staged;
mod storage;
mod traits;
mod transfer;

pub use array::DynamicArray;
pub use error::AllocError;
pub use iter::IntoIter;
pub use storage::Storage;
pub use traits::ArrayIterator;
pub use transfer::{Duplicate, Relocate, Transfer};

#[cfg(test)]
pub mod dropflag;
