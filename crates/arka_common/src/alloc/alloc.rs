use core::{
    alloc::Layout,
    ptr::{self, NonNull},
};

//------------------------------------------------------------------------------------------------------------------------------

/// Allocator capability used by containers to get access to heap memory, and to construct and destroy the elements living in it.
///
/// An allocator is owned by value by the container using it, and can either be stateless (e.g. [`Mallocator`]), which costs nothing in the container,
/// or stateful, e.g. an allocator carrying a handle to a memory pool.
///
/// Two allocator instances that compare equal must be able to deallocate each other's memory.
/// Containers rely on this to decide whether storage can be handed over directly (*O*(1)), or whether the elements need to be moved one-by-one into new storage.
///
/// [`Mallocator`]: crate::alloc::Mallocator
pub trait Allocator: Clone + PartialEq {
    /// Whether the allocator of the source is moved along with its storage on a move-assignment.
    ///
    /// When `false`, the destination keeps its own allocator, and a move-assignment from a container using a different allocator has to move its elements one at a time.
    const PROPAGATE_ON_MOVE_ASSIGN: bool = false;

    /// Whether allocators are exchanged when two containers are swapped.
    ///
    /// When `false`, containers can only be swapped when their allocators compare equal.
    const PROPAGATE_ON_SWAP: bool = false;

    /// Allocate memory from the allocator
    ///
    /// # Return
    ///
    /// If no memory could be allocated, `None` should be returned.
    ///
    /// # Safety
    ///
    /// `layout` must have a non-zero size.
    unsafe fn alloc(&mut self, layout: Layout) -> Option<NonNull<u8>>;

    /// Deallocate an allocation
    ///
    /// # Safety
    ///
    /// - `ptr` must have been returned by `alloc` on this allocator, or an allocator comparing equal to it.
    /// - `layout` must be the layout that was used to allocate `ptr`.
    unsafe fn dealloc(&mut self, ptr: NonNull<u8>, layout: Layout);

    /// Construct a value in place.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes and properly aligned, any value currently at `ptr` will be overwritten without being dropped.
    #[inline]
    unsafe fn construct<T>(&mut self, ptr: *mut T, value: T) {
        ptr::write(ptr, value)
    }

    /// Destroy a value in place.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live value, which must not be used after this call.
    #[inline]
    unsafe fn destroy<T>(&mut self, ptr: *mut T) {
        ptr::drop_in_place(ptr)
    }

    /// Destroy a contiguous run of values in place.
    ///
    /// # Safety
    ///
    /// `slice` must point to live values, which must not be used after this call.
    #[inline]
    unsafe fn destroy_slice<T>(&mut self, slice: *mut [T]) {
        ptr::drop_in_place(slice)
    }

    /// Get the largest number of bytes a single allocation could ever have.
    ///
    /// Default implementation returns `isize::MAX`, which is the limit any rust allocation has.
    fn max_size(&self) -> usize {
        isize::MAX as usize
    }

    /// Get the allocator a copy of a container should use.
    ///
    /// Default implementation hands out a clone of this allocator.
    fn select_on_copy(&self) -> Self {
        self.clone()
    }
}
