#![allow(unused_macros)]
#![macro_use]

// Crate-local forwarders to `log`. Without the `logging` feature the
// arguments are never evaluated.

macro_rules! debug {
    (target: $target:expr, $($arg:tt)+) => (
        #[cfg(feature = "logging")]
        log::debug!(target: $target, $($arg)+);
    );
    ($($arg:tt)+) => (
        #[cfg(feature = "logging")]
        log::debug!($($arg)+);
    )
}

macro_rules! trace {
    (target: $target:expr, $($arg:tt)+) => (
        #[cfg(feature = "logging")]
        log::trace!(target: $target, $($arg)+);
    );
    ($($arg:tt)+) => (
        #[cfg(feature = "logging")]
        log::trace!($($arg)+);
    )
}
