//! Logging hooks, forwarded to the `log` facade when the `logging` feature is enabled and compiled out otherwise.
#![allow(unused_macros)]

macro_rules! debug {
    (target: $target:expr, $($arg:tt)+) => (
        cfg_if::cfg_if! {
            if #[cfg(feature = "logging")] {
                log::debug!(target: $target, $($arg)+);
            }
        }
    );
    ($($arg:tt)+) => (
        cfg_if::cfg_if! {
            if #[cfg(feature = "logging")] {
                log::debug!($($arg)+);
            }
        }
    )
}

macro_rules! trace {
    (target: $target:expr, $($arg:tt)+) => (
        cfg_if::cfg_if! {
            if #[cfg(feature = "logging")] {
                log::trace!(target: $target, $($arg)+);
            }
        }
    );
    ($($arg:tt)+) => (
        cfg_if::cfg_if! {
            if #[cfg(feature = "logging")] {
                log::trace!($($arg)+);
            }
        }
    )
}

/// Log target used by the collections
pub(crate) const COLLECTIONS_TARGET: &str = "arka::collections";
