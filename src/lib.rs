//! Allocator-aware collections.
//!
//! Re-exports the workspace crates so a single dependency pulls in the whole stack.

pub use arka_base as base;
pub use arka_common as common;

pub use arka_common::{alloc, collections, dynarr};

pub mod prelude {
    pub use arka_common::prelude::*;
}
