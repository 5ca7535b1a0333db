use core::{
    alloc::Layout,
    marker::PhantomData,
    mem::{self, align_of, size_of},
    ptr::{self, NonNull},
};

use crate::{
    alloc::Allocator,
    collections::{DynArrError, ReserveStrategy},
    logging::COLLECTIONS_TARGET,
};


/// Low level utility for more ergonomically allocating, reallocating, and deallocating
/// a buffer of memory from an allocator without having to worry about all the corner cases involved.
/// In particular:
///
/// - Produces a dangling pointer on zero-sized types.
/// - Produces a dangling pointer on zero-length allocations.
/// - Avoids freeing a dangling pointer.
/// - Catches all overflows in capacity computations (promotes them to `LengthError`s).
/// - Never publishes a new buffer before the old elements have been relocated into it.
///
/// This type does not in anyway inspect the memory it manages. When dropped it *will* free its memory, but it *won't* try to drop its contents.
/// It is up to the user of `RawArray` to handle the actual things *stored* inside of `RawArray`.
///
/// Note that the capacity of a zero-sized type is always infinite, so `capacity()` always returns `usize::MAX`.
pub(crate) struct RawArray<T, A: Allocator, R: ReserveStrategy> {
    ptr:      NonNull<T>,
    cap:      usize,
    alloc:    A,
    _phantom: PhantomData<(T, fn() -> R)>,
}

// Safety: `RawArray` uniquely owns its buffer, just like a `Box<[T]>` would.
unsafe impl<T: Send, A: Allocator + Send, R: ReserveStrategy> Send for RawArray<T, A, R> {}
unsafe impl<T: Sync, A: Allocator + Sync, R: ReserveStrategy> Sync for RawArray<T, A, R> {}

impl<T, A: Allocator, R: ReserveStrategy> RawArray<T, A, R> {
    const IS_ZST: bool = size_of::<T>() == 0;

    /// Creates an empty `RawArray` without allocating.
    #[must_use]
    pub const fn new_in(alloc: A) -> Self {
        Self { ptr: NonNull::dangling(), cap: 0, alloc, _phantom: PhantomData }
    }

    /// Tries to create a `RawArray` with exactly the capacity and alignment requirements for a `[T; capacity]`.
    /// This is equivalent to calling `RawArray::new_in` when `capacity` is `0` or `T` is zero-sized.
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self, DynArrError> {
        let mut arr = Self::new_in(alloc);
        if capacity != 0 && !Self::IS_ZST {
            arr.ptr = arr.allocate_buffer(capacity)?;
            arr.cap = capacity;
        }
        Ok(arr)
    }

    /// Get the capacity of the allocation.
    ///
    /// This will always be `usize::MAX` if `T` is zero-sized.
    #[inline]
    pub const fn capacity(&self) -> usize {
        if Self::IS_ZST {
            usize::MAX
        } else {
            self.cap
        }
    }

    /// Get the maximum number of elements a single buffer can hold, as limited by the allocator and `isize::MAX` bytes.
    pub fn max_len(&self) -> usize {
        if Self::IS_ZST {
            usize::MAX
        } else {
            self.alloc.max_size().min(isize::MAX as usize) / size_of::<T>()
        }
    }

    /// Get the allocator used for the allocation.
    #[inline]
    pub const fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Get mutable access to the allocator, used to construct and destroy elements.
    #[inline]
    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.alloc
    }

    /// Get a raw pointer to the start of the allocation.
    /// Note that this is a dangling pointer when either `capacity() == 0` or `T` is zero-sized.
    #[inline]
    pub const fn ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Get the current allocation and its layout, if there is any.
    pub fn current_memory(&self) -> Option<(NonNull<u8>, Layout)> {
        if Self::IS_ZST || self.cap == 0 {
            None
        } else {
            // Safety: The layout was already validated when the memory was allocated, so it can't overflow.
            unsafe {
                let layout = Layout::from_size_align_unchecked(size_of::<T>() * self.cap, align_of::<T>());
                Some((self.ptr.cast(), layout))
            }
        }
    }

    fn layout_for(&self, capacity: usize) -> Result<Layout, DynArrError> {
        let max = self.max_len();
        if capacity > max {
            debug!(target: COLLECTIONS_TARGET, "requested capacity {capacity} exceeds the maximum of {max} elements");
            return Err(DynArrError::LengthError { requested: capacity, max });
        }
        Layout::array::<T>(capacity).map_err(|_| DynArrError::LengthError { requested: capacity, max })
    }

    /// Allocate a buffer for exactly `capacity` elements from this array's allocator, without installing it.
    ///
    /// The caller is responsible for either installing the buffer using [`RawArray::install_buffer`], or releasing it using [`RawArray::release_buffer`].
    pub fn allocate_buffer(&mut self, capacity: usize) -> Result<NonNull<T>, DynArrError> {
        debug_assert!(capacity != 0 && !Self::IS_ZST, "zero-sized buffers are never allocated");

        let layout = self.layout_for(capacity)?;
        // Safety: `capacity` and `T` are non-zero sized, so is `layout`
        match unsafe { self.alloc.alloc(layout) } {
            Some(ptr) => Ok(ptr.cast()),
            None => {
                debug!(target: COLLECTIONS_TARGET, "allocator failed to provide {} bytes", layout.size());
                Err(DynArrError::AllocError { layout })
            },
        }
    }

    /// Release a buffer allocated with [`RawArray::allocate_buffer`].
    ///
    /// # Safety
    ///
    /// - `ptr` must have been allocated by this array's allocator (or one comparing equal to it), with the same `capacity`.
    /// - No live elements may remain in the buffer, they will not be dropped.
    pub unsafe fn release_buffer(&mut self, ptr: NonNull<T>, capacity: usize) {
        if capacity == 0 || Self::IS_ZST {
            return;
        }
        let layout = Layout::from_size_align_unchecked(size_of::<T>() * capacity, align_of::<T>());
        self.alloc.dealloc(ptr.cast(), layout);
    }

    /// Publish a new buffer and release the current one.
    ///
    /// # Safety
    ///
    /// - `ptr` must have been allocated by [`RawArray::allocate_buffer`] with `capacity`, or be dangling when `capacity` is 0.
    /// - All live elements need to have been relocated out of the current buffer.
    pub unsafe fn install_buffer(&mut self, ptr: NonNull<T>, capacity: usize) {
        trace!(target: COLLECTIONS_TARGET, "buffer relocated, capacity {} -> {}", self.cap, capacity);

        let old_ptr = mem::replace(&mut self.ptr, ptr);
        let old_cap = mem::replace(&mut self.cap, capacity);
        self.release_buffer(old_ptr, old_cap);
    }

    /// Release the buffer, leaving the array with a capacity of 0.
    ///
    /// # Safety
    ///
    /// No live elements may remain in the buffer.
    pub unsafe fn release(&mut self) {
        self.install_buffer(NonNull::dangling(), 0);
    }

    /// Reallocate the buffer to hold exactly `capacity` elements, relocating the first `len` elements in index order.
    ///
    /// Relocating an element is a bitwise move, so once the new buffer is allocated, nothing can fail anymore.
    /// If allocation fails, the array is left untouched.
    pub fn try_reallocate(&mut self, len: usize, capacity: usize) -> Result<(), DynArrError> {
        debug_assert!(len <= capacity, "reallocation would lose live elements");

        if Self::IS_ZST {
            return Ok(());
        }
        if capacity == 0 {
            // Safety: `len` is 0, so there is nothing to relocate
            unsafe { self.release() };
            return Ok(());
        }

        let new_ptr = self.allocate_buffer(capacity)?;
        // Safety:
        // - Both buffers hold at least `len` elements and are distinct allocations.
        // - The old elements are forgotten by the old buffer, as it is released without dropping them.
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), len);
            self.install_buffer(new_ptr, capacity);
        }
        Ok(())
    }

    /// Check if the buffer needs to grow to fit `additional` more elements after `len`.
    #[inline]
    pub fn needs_to_grow(&self, len: usize, additional: usize) -> bool {
        additional > self.capacity().wrapping_sub(len)
    }

    /// Calculate the exact capacity needed to fit `len + additional` elements.
    pub fn required_capacity(&self, len: usize, additional: usize) -> Result<usize, DynArrError> {
        let max = self.max_len();
        match len.checked_add(additional) {
            Some(required) if required <= max => Ok(required),
            _ => {
                debug!(target: COLLECTIONS_TARGET, "{len} + {additional} elements exceed the maximum of {max} elements");
                Err(DynArrError::LengthError { requested: len.saturating_add(additional), max })
            },
        }
    }

    /// Calculate the capacity to grow to, to fit `len + additional` elements, according to the reserve strategy.
    ///
    /// The result is never less than the required capacity, and never more than the maximum length.
    pub fn grown_capacity(&self, len: usize, additional: usize) -> Result<usize, DynArrError> {
        let max = self.max_len();
        let required = self.required_capacity(len, additional)?;
        let new_cap = R::calculate(self.capacity(), required).unwrap_or(max);
        Ok(new_cap.clamp(required, max))
    }

    /// Grow the buffer to fit at least `additional` more elements, with amortized *O*(1) behavior.
    pub fn try_grow_amortized(&mut self, len: usize, additional: usize) -> Result<(), DynArrError> {
        let new_cap = self.grown_capacity(len, additional)?;
        self.try_reallocate(len, new_cap)
    }

    /// Exchange buffers with another array, keeping the allocators in place.
    ///
    /// The allocators need to compare equal for this to be valid, as each array would otherwise end up freeing memory it doesn't own.
    pub fn swap_buffers(&mut self, other: &mut Self) {
        debug_assert!(self.alloc == other.alloc, "buffers can only be exchanged between equal allocators");
        mem::swap(&mut self.ptr, &mut other.ptr);
        mem::swap(&mut self.cap, &mut other.cap);
    }
}

impl<T, A: Allocator, R: ReserveStrategy> Drop for RawArray<T, A, R> {
    fn drop(&mut self) {
        if let Some((ptr, layout)) = self.current_memory() {
            // Safety: memory is only ever returned by `current_memory` if it was allocated from `self.alloc`
            unsafe { self.alloc.dealloc(ptr, layout) }
        }
    }
}

/// Central function for reporting errors from non-fallible operations.
#[cold]
#[track_caller]
pub(crate) fn handle_error(err: DynArrError) -> ! {
    panic!("{err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{alloc::Mallocator, collections::{DoubleOrMinReserveStrategy, Pow2ReserveStrategy}};

    type Raw<T> = RawArray<T, Mallocator, DoubleOrMinReserveStrategy>;

    #[test]
    fn new_does_not_allocate() {
        let arr = Raw::<u32>::new_in(Mallocator);
        assert_eq!(arr.capacity(), 0);
        assert!(arr.current_memory().is_none());
    }

    #[test]
    fn zero_sized_capacity_is_infinite() {
        let arr = Raw::<()>::try_with_capacity_in(10, Mallocator).unwrap();
        assert_eq!(arr.capacity(), usize::MAX);
        assert_eq!(arr.max_len(), usize::MAX);
        assert!(arr.current_memory().is_none());
    }

    #[test]
    fn exact_capacity() {
        let arr = Raw::<u64>::try_with_capacity_in(7, Mallocator).unwrap();
        assert_eq!(arr.capacity(), 7);
        let (_, layout) = arr.current_memory().unwrap();
        assert_eq!(layout, Layout::array::<u64>(7).unwrap());
    }

    #[test]
    fn capacity_overflow_is_a_length_error() {
        let err = Raw::<u64>::try_with_capacity_in(usize::MAX / 2, Mallocator).err().unwrap();
        assert!(matches!(err, DynArrError::LengthError { .. }));

        let arr = Raw::<u64>::new_in(Mallocator);
        assert!(matches!(arr.grown_capacity(usize::MAX, 1), Err(DynArrError::LengthError { .. })));
    }

    #[test]
    fn amortized_growth() {
        let mut arr = Raw::<u32>::new_in(Mallocator);
        assert_eq!(arr.grown_capacity(0, 1).unwrap(), 1);
        arr.try_grow_amortized(0, 1).unwrap();
        assert_eq!(arr.capacity(), 1);
        arr.try_grow_amortized(1, 1).unwrap();
        assert_eq!(arr.capacity(), 2);
        arr.try_grow_amortized(2, 1).unwrap();
        assert_eq!(arr.capacity(), 4);
        // Doubling is not enough, so the exact requirement wins
        assert_eq!(arr.grown_capacity(4, 10).unwrap(), 14);

        let pow2 = RawArray::<u32, Mallocator, Pow2ReserveStrategy>::try_with_capacity_in(3, Mallocator).unwrap();
        assert_eq!(pow2.grown_capacity(3, 2).unwrap(), 8);
    }

    #[test]
    fn reallocate_relocates_elements() {
        let mut arr = Raw::<u32>::try_with_capacity_in(2, Mallocator).unwrap();
        unsafe {
            arr.ptr().write(1);
            arr.ptr().add(1).write(2);
        }
        arr.try_reallocate(2, 16).unwrap();
        assert_eq!(arr.capacity(), 16);
        unsafe {
            assert_eq!(arr.ptr().read(), 1);
            assert_eq!(arr.ptr().add(1).read(), 2);
        }

        arr.try_reallocate(0, 0).unwrap();
        assert_eq!(arr.capacity(), 0);
        assert!(arr.current_memory().is_none());
    }
}
