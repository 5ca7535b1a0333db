pub use crate::alloc::{Allocator, Mallocator};
pub use crate::collections::{Cursor, DynArr, DynArrError, RevCursor};
pub use crate::dynarr;
