use core::{
    alloc::Layout,
    ptr::NonNull,
};

use crate::alloc::Allocator;

/// Allocator calling directly to the system allocator
///
/// Mallocator uses rust's global allocator to retrieve memory.
///
/// The allocator is zero-sized and all instances compare equal, so any instance can free memory allocated by any other one.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Mallocator;

impl Allocator for Mallocator {
    const PROPAGATE_ON_MOVE_ASSIGN: bool = true;
    const PROPAGATE_ON_SWAP: bool = true;

    unsafe fn alloc(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        NonNull::new(std::alloc::alloc(layout))
    }

    unsafe fn dealloc(&mut self, ptr: NonNull<u8>, layout: Layout) {
        std::alloc::dealloc(ptr.as_ptr(), layout);
    }
}

static_assertions::assert_eq_size!(Mallocator, ());

#[cfg(test)]
mod test {
    use core::alloc::Layout;

    use crate::alloc::*;
    use super::Mallocator;

    #[test]
    fn alloc_dealloc() {
        let mut alloc = Mallocator;
        let layout = Layout::new::<u64>();

        unsafe {
            let ptr = alloc.alloc(layout).unwrap();
            ptr.as_ptr().cast::<u64>().write(0x0123_4567_89AB_CDEF);
            assert_eq!(ptr.as_ptr().cast::<u64>().read(), 0x0123_4567_89AB_CDEF);
            alloc.dealloc(ptr, layout);
        }
    }

    #[test]
    fn construct_destroy() {
        let mut alloc = Mallocator;
        let layout = Layout::new::<String>();

        unsafe {
            let ptr = alloc.alloc(layout).unwrap().cast::<String>();
            alloc.construct(ptr.as_ptr(), String::from("arka"));
            assert_eq!(&*ptr.as_ptr(), "arka");
            alloc.destroy(ptr.as_ptr());
            alloc.dealloc(ptr.cast(), layout);
        }
    }

    #[test]
    fn instances_are_interchangeable() {
        assert_eq!(Mallocator, Mallocator.select_on_copy());
        assert_eq!(Mallocator.max_size(), isize::MAX as usize);
    }
}
