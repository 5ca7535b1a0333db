//! Common building blocks: the allocator capability and the allocator-aware collections built on top of it.

#[macro_use]
mod logging;

pub mod alloc;
pub mod collections;

pub mod prelude;

// Re-exported so `dynarr!` can reach it through `$crate`
#[doc(hidden)]
pub use arka_base::count_exprs;
