use std::alloc::Layout;
use std::error::Error;
use std::fmt::{self, Display};

/// Raw storage could not be obtained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The byte size of `capacity` slots does not fit in a valid `Layout`.
    CapacityOverflow {
        /// Number of slots requested.
        capacity: usize,
    },
    /// The global allocator returned null for this layout.
    OutOfMemory {
        /// The layout that could not be satisfied.
        layout: Layout,
    },
}

impl AllocError {
    /// Diverges the way the standard collections do: overflow panics, an
    /// exhausted allocator goes through `handle_alloc_error`.
    ///
    /// Used by the trait impls (`Clone`, `Extend`, `FromIterator`) that have
    /// no way to return the error.
    pub fn handle(self) -> ! {
        match self {
            AllocError::CapacityOverflow { .. } => panic!("{}", self),
            AllocError::OutOfMemory { layout } => std::alloc::handle_alloc_error(layout),
        }
    }
}

impl Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::CapacityOverflow { capacity } => {
                write!(f, "capacity overflow: {} slots do not fit in a single allocation", capacity)
            }
            AllocError::OutOfMemory { layout } => {
                write!(f, "out of memory: failed to allocate {} bytes aligned to {}", layout.size(), layout.align())
            }
        }
    }
}

impl Error for AllocError {}
