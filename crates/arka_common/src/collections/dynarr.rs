use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    mem::{self, size_of, ManuallyDrop},
    ops::{Deref, DerefMut, Index, IndexMut},
    ptr,
    slice::{self, SliceIndex},
};

use scopeguard::ScopeGuard;

use crate::{
    alloc::{Allocator, Mallocator},
    logging::COLLECTIONS_TARGET,
};
use super::{
    imp::array::{handle_error, RawArray},
    impl_slice_partial_eq_generic,
    DoubleOrMinReserveStrategy, DynArrError, ReserveStrategy,
};

mod cursor;
mod into_iter;

pub use cursor::{Cursor, RevCursor};
pub use into_iter::IntoIter;

#[cfg(test)]
mod tests;

/// How a bulk insertion sizes a new buffer when the current one is too small.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Growth {
    /// Grow according to the reserve strategy.
    Amortized,
    /// Grow to exactly the required capacity.
    Exact,
}

/// A contiguous growable array type, also known as a dynamic array, or DynArr.
///
/// Dynamic arrays have *O*(1) indexing, amortized *O*(1) push (to the end), and *O*(1) pop (from the back).
/// All memory is requested from, and all elements are constructed and destroyed through, the array's [`Allocator`].
///
/// # Examples
///
/// ```
/// use arka_common::prelude::*;
///
/// let mut arr = DynArr::new();
/// arr.push(1);
/// arr.push(2);
///
/// assert_eq!(arr.len(), 2);
/// assert_eq!(arr[0], 1);
///
/// arr[0] = 7;
/// assert_eq!(arr[0], 7);
///
/// arr.extend([1, 2, 3]);
/// assert_eq!(arr, [7, 2, 1, 2, 3]);
/// ```
///
/// The [`dynarr!`] macro is provided for convenient initialization:
///
/// ```
/// use arka_common::dynarr;
///
/// let mut arr1 = dynarr![1, 2, 3];
/// arr1.push(4);
/// let arr2 = dynarr![1, 2, 3, 4];
/// assert_eq!(arr1, arr2);
///
/// let zeros = dynarr![0; 5];
/// assert_eq!(zeros, [0, 0, 0, 0, 0]);
/// ```
///
/// # Positions
///
/// Besides plain indices, positions can be expressed using a [`Cursor`], which is obtained from [`begin`] or [`end`] and moved using arithmetic.
/// Cursors remember which buffer they were created for, so a cursor that outlived a reallocation is detected instead of reading freed memory.
///
/// # Failure guarantee
///
/// Every operation that adds or replaces elements either succeeds, or leaves the array exactly as it was: same length, same capacity, same elements.
/// This holds both for allocation failures, which the `try_` variants report as a [`DynArrError`], and for panics raised while creating new elements
/// (e.g. a panicking [`Clone`] implementation or iterator).
/// Moving an element is a bitwise copy in rust and can't fail, so relocating the elements into a new buffer never needs to be undone.
///
/// Removal can't be undone. If a destructor panics during [`erase_range`], [`truncate`] or [`clear`], or the predicate of [`retain`], [`retain_mut`] or [`erase_if`] panics,
/// the elements removed so far stay removed, and the remaining elements are kept in order.
///
/// # Capacity and reallocation
///
/// The capacity of a dynamic array is the amount of space allocated for any future elements that will be added onto the dynamic array.
/// This is not to be confused with the *length* of the dynamic array, which specifies the number of actual elements within the dynamic array.
/// If a dynamic array's length exceeds its capacity, its capacity will automatically be increased according to the reserve strategy `R`,
/// which by default doubles the capacity, or grows to what is required if that is more.
///
/// `DynArr` will never automatically shrink itself, even if completely empty.
/// If you wish to free up unused memory use [`shrink_to_fit`] or [`shrink_to`].
///
/// For zero-sized types no memory is ever allocated, and the capacity is always `usize::MAX`.
///
/// [`begin`]: DynArr::begin
/// [`end`]: DynArr::end
/// [`erase_range`]: DynArr::erase_range
/// [`truncate`]: DynArr::truncate
/// [`clear`]: DynArr::clear
/// [`retain`]: DynArr::retain
/// [`retain_mut`]: DynArr::retain_mut
/// [`erase_if`]: DynArr::erase_if
/// [`shrink_to_fit`]: DynArr::shrink_to_fit
/// [`shrink_to`]: DynArr::shrink_to
pub struct DynArr<T, A: Allocator = Mallocator, R: ReserveStrategy = DoubleOrMinReserveStrategy> {
    arr:   RawArray<T, A, R>,
    len:   usize,
    /// Generation of the buffer, bumped whenever the buffer is replaced or exchanged.
    epoch: u32,
}

static_assertions::assert_eq_size!(DynArr<u64>, [usize; 4]);

impl<T> DynArr<T> {
    /// Constructs a new, empty `DynArr<T>` using the global heap.
    ///
    /// The dynamic array will not allocate until elements are pushed onto it.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::new_in(Mallocator)
    }

    /// Constructs a new, empty `DynArr<T>` with exactly the specified capacity, using the global heap.
    ///
    /// # Panics
    ///
    /// Panics if the capacity exceeds [`max_size`](DynArr::max_size), or if the memory could not be allocated.
    #[track_caller]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Mallocator)
    }

    /// Constructs a `DynArr<T>` holding `n` clones of `value`, using the global heap.
    #[track_caller]
    pub fn from_elem(value: T, n: usize) -> Self where
        T: Clone
    {
        Self::from_elem_in(value, n, Mallocator)
    }

    /// Constructs a `DynArr<T>` holding `n` default values, using the global heap.
    #[track_caller]
    pub fn from_default(n: usize) -> Self where
        T: Default
    {
        Self::from_default_in(n, Mallocator)
    }
}

impl<T, A: Allocator, R: ReserveStrategy> DynArr<T, A, R> {
    /// Constructs a new, empty `DynArr<T, A, R>` with the provided allocator.
    ///
    /// The dynamic array will not allocate until elements are pushed onto it.
    #[inline]
    #[must_use]
    pub const fn new_in(alloc: A) -> Self {
        Self { arr: RawArray::new_in(alloc), len: 0, epoch: 0 }
    }

    /// Constructs a new, empty `DynArr<T, A, R>` with exactly the specified capacity, with the provided allocator.
    ///
    /// If `capacity` is 0, or `T` is zero-sized, the dynamic array will not allocate.
    ///
    /// # Panics
    ///
    /// Panics if the capacity exceeds [`max_size`](DynArr::max_size), or if the memory could not be allocated.
    #[track_caller]
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        match Self::try_with_capacity_in(capacity, alloc) {
            Ok(arr) => arr,
            Err(err) => handle_error(err),
        }
    }

    /// Tries to construct a new, empty `DynArr<T, A, R>` with exactly the specified capacity, with the provided allocator.
    ///
    /// # Errors
    ///
    /// Returns a `LengthError` if the capacity exceeds [`max_size`](DynArr::max_size), or an `AllocError` if the allocator reports a failure.
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self, DynArrError> {
        Ok(Self { arr: RawArray::try_with_capacity_in(capacity, alloc)?, len: 0, epoch: 0 })
    }

    /// Constructs a `DynArr<T, A, R>` holding `n` default values, with the provided allocator.
    #[track_caller]
    pub fn from_default_in(n: usize, alloc: A) -> Self where
        T: Default
    {
        match Self::try_from_default_in(n, alloc) {
            Ok(arr) => arr,
            Err(err) => handle_error(err),
        }
    }

    /// Tries to construct a `DynArr<T, A, R>` holding `n` default values, with the provided allocator.
    pub fn try_from_default_in(n: usize, alloc: A) -> Result<Self, DynArrError> where
        T: Default
    {
        let mut arr = Self::try_with_capacity_in(n, alloc)?;
        arr.try_resize_with(n, T::default)?;
        Ok(arr)
    }

    /// Constructs a `DynArr<T, A, R>` from the elements of an iterator, with the provided allocator.
    ///
    /// When the iterator knows its exact length up front, the buffer is allocated once with exactly that capacity,
    /// otherwise the elements are pushed one by one.
    #[track_caller]
    pub fn from_iter_in<I: IntoIterator<Item = T>>(iter: I, alloc: A) -> Self {
        match Self::try_from_iter_in(iter, alloc) {
            Ok(arr) => arr,
            Err(err) => handle_error(err),
        }
    }

    /// Tries to construct a `DynArr<T, A, R>` from the elements of an iterator, with the provided allocator.
    ///
    /// If the iterator panics, or memory can't be allocated, all elements collected so far are destroyed and the buffer is released.
    pub fn try_from_iter_in<I: IntoIterator<Item = T>>(iter: I, alloc: A) -> Result<Self, DynArrError> {
        let iter = iter.into_iter();
        let mut arr = match iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Self::try_with_capacity_in(lower, alloc)?,
            _ => Self::new_in(alloc),
        };
        for value in iter {
            arr.try_push(value)?;
        }
        Ok(arr)
    }

    /// Takes the contents out of the dynamic array, leaving it empty, without any capacity.
    ///
    /// This never allocates, the buffer itself is handed over to the returned array, which uses a clone of this array's allocator.
    #[must_use]
    pub fn take(&mut self) -> Self {
        let alloc = self.arr.allocator().clone();
        self.take_storage(alloc)
    }

    /// Takes the contents out of the dynamic array into a dynamic array using `alloc`, leaving this one empty, without any capacity.
    ///
    /// If `alloc` compares equal to this array's allocator, the buffer is handed over in *O*(1).
    /// Otherwise the elements are moved one by one into a new buffer from `alloc`, after which this array's buffer is released.
    ///
    /// # Panics
    ///
    /// Panics if the new buffer can't be allocated, in which case this array is left untouched.
    #[track_caller]
    #[must_use]
    pub fn take_in(&mut self, alloc: A) -> Self {
        match self.try_take_in(alloc) {
            Ok(arr) => arr,
            Err(err) => handle_error(err),
        }
    }

    /// Tries to take the contents out of the dynamic array into a dynamic array using `alloc`, see [`DynArr::take_in`].
    pub fn try_take_in(&mut self, alloc: A) -> Result<Self, DynArrError> {
        if *self.arr.allocator() == alloc {
            return Ok(self.take_storage(alloc));
        }

        trace!(target: COLLECTIONS_TARGET, "allocators differ, moving {} elements into new storage", self.len);
        let mut taken = Self::try_with_capacity_in(self.len, alloc)?;
        // Safety: `taken` has room for all elements, which are forgotten by `self` by resetting its length before its buffer is released
        unsafe {
            ptr::copy_nonoverlapping(self.arr.ptr(), taken.arr.ptr(), self.len);
            taken.len = mem::replace(&mut self.len, 0);
            self.arr.release();
        }
        self.bump_epoch();
        Ok(taken)
    }

    /// Hand the buffer over to a new array using `alloc`, which must compare equal to this array's allocator.
    fn take_storage(&mut self, alloc: A) -> Self {
        let mut taken = Self::new_in(alloc);
        taken.arr.swap_buffers(&mut self.arr);
        mem::swap(&mut taken.len, &mut self.len);
        self.bump_epoch();
        taken
    }

    /// Replace the contents of this array with `replacement`, including its allocator, dropping the previous contents.
    fn replace_with(&mut self, mut replacement: Self) {
        mem::swap(&mut self.arr, &mut replacement.arr);
        mem::swap(&mut self.len, &mut replacement.len);
        self.bump_epoch();
    }

    #[inline]
    fn bump_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    //--------------------------------------------------------------

    /// Returns the number of elements the dynamic array can hold without reallocating.
    ///
    /// For zero-sized types this is always `usize::MAX`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.arr.capacity()
    }

    /// Returns the number of elements in the dynamic array, also referred to as its 'length'.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the dynamic array contains no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the maximum number of elements the dynamic array could ever hold, as limited by its allocator.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.arr.max_len()
    }

    /// Returns a reference to the underlying allocator.
    #[inline]
    pub const fn allocator(&self) -> &A {
        self.arr.allocator()
    }

    /// Reserves capacity for a total of at least `new_capacity` elements.
    ///
    /// Unlike the implicit growth on insertion, the buffer is reallocated to exactly `new_capacity` elements.
    /// Does nothing if the capacity is already sufficient.
    ///
    /// # Panics
    ///
    /// Panics if `new_capacity` exceeds [`max_size`](DynArr::max_size), or if the memory could not be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use arka_common::dynarr;
    ///
    /// let mut arr = dynarr![1];
    /// arr.reserve(10);
    /// assert_eq!(arr.capacity(), 10);
    /// arr.reserve(4);
    /// assert_eq!(arr.capacity(), 10);
    /// ```
    #[track_caller]
    pub fn reserve(&mut self, new_capacity: usize) {
        if let Err(err) = self.try_reserve(new_capacity) {
            handle_error(err);
        }
    }

    /// Tries to reserve capacity for a total of at least `new_capacity` elements, see [`DynArr::reserve`].
    ///
    /// # Errors
    ///
    /// If the capacity exceeds the maximum size, or the allocator reports a failure, an error is returned and the array is left untouched.
    pub fn try_reserve(&mut self, new_capacity: usize) -> Result<(), DynArrError> {
        let max = self.max_size();
        if new_capacity > max {
            debug!(target: COLLECTIONS_TARGET, "cannot reserve {new_capacity} elements, the maximum is {max}");
            return Err(DynArrError::LengthError { requested: new_capacity, max });
        }
        if new_capacity > self.capacity() {
            self.arr.try_reallocate(self.len, new_capacity)?;
            self.bump_epoch();
        }
        Ok(())
    }

    /// Shrinks the capacity of the dynamic array to its length.
    ///
    /// When the array is empty, its memory is released entirely.
    #[track_caller]
    pub fn shrink_to_fit(&mut self) {
        if let Err(err) = self.try_shrink_to(0) {
            handle_error(err);
        }
    }

    /// Tries to shrink the capacity of the dynamic array to its length, see [`DynArr::shrink_to_fit`].
    pub fn try_shrink_to_fit(&mut self) -> Result<(), DynArrError> {
        self.try_shrink_to(0)
    }

    /// Shrinks the capacity of the dynamic array with a lower bound.
    ///
    /// The capacity will remain at least as large as both the length and the supplied value.
    /// If the current capacity is less than the lower limit, this is a no-op.
    #[track_caller]
    pub fn shrink_to(&mut self, min_capacity: usize) {
        if let Err(err) = self.try_shrink_to(min_capacity) {
            handle_error(err);
        }
    }

    /// Tries to shrink the capacity of the dynamic array with a lower bound, see [`DynArr::shrink_to`].
    pub fn try_shrink_to(&mut self, min_capacity: usize) -> Result<(), DynArrError> {
        let target = min_capacity.max(self.len);
        if size_of::<T>() != 0 && self.capacity() > target {
            self.arr.try_reallocate(self.len, target)?;
            self.bump_epoch();
        }
        Ok(())
    }

    /// Make sure there is room for `additional` more elements, growing with the reserve strategy when needed.
    fn try_grow_for(&mut self, additional: usize) -> Result<(), DynArrError> {
        if self.arr.needs_to_grow(self.len, additional) {
            self.arr.try_grow_amortized(self.len, additional)?;
            self.bump_epoch();
        }
        Ok(())
    }

    //--------------------------------------------------------------

    /// Get a reference to the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `index` is not less than the length.
    pub fn at(&self, index: usize) -> Result<&T, DynArrError> {
        let len = self.len;
        self.as_slice().get(index).ok_or(DynArrError::OutOfRange { index, len })
    }

    /// Get a mutable reference to the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `index` is not less than the length.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, DynArrError> {
        let len = self.len;
        self.as_mut_slice().get_mut(index).ok_or(DynArrError::OutOfRange { index, len })
    }

    /// Get a reference to the first element.
    ///
    /// # Panics
    ///
    /// Panics if the dynamic array is empty.
    #[track_caller]
    pub fn front(&self) -> &T {
        match self.as_slice().first() {
            Some(value) => value,
            None => empty_failed("front"),
        }
    }

    /// Get a mutable reference to the first element.
    ///
    /// # Panics
    ///
    /// Panics if the dynamic array is empty.
    #[track_caller]
    pub fn front_mut(&mut self) -> &mut T {
        match self.as_mut_slice().first_mut() {
            Some(value) => value,
            None => empty_failed("front_mut"),
        }
    }

    /// Get a reference to the last element.
    ///
    /// # Panics
    ///
    /// Panics if the dynamic array is empty.
    #[track_caller]
    pub fn back(&self) -> &T {
        match self.as_slice().last() {
            Some(value) => value,
            None => empty_failed("back"),
        }
    }

    /// Get a mutable reference to the last element.
    ///
    /// # Panics
    ///
    /// Panics if the dynamic array is empty.
    #[track_caller]
    pub fn back_mut(&mut self) -> &mut T {
        match self.as_mut_slice().last_mut() {
            Some(value) => value,
            None => empty_failed("back_mut"),
        }
    }

    /// Returns a raw pointer to the first slot of the buffer, see [`DynArr::as_ptr`].
    #[inline]
    pub fn data(&self) -> *const T {
        self.as_ptr()
    }

    /// Returns a raw pointer to the dynamic array's buffer, or a dangling raw pointer valid for zero sized reads if the dynamic array didn't allocate.
    ///
    /// The caller must ensure that the dynamic array outlives the pointer this function returns, or else it will end up pointing to garbage.
    /// Modifying the dynamic array may cause its buffer to be reallocated, which would also make any pointer to it invalid.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.arr.ptr()
    }

    /// Returns an unsafe mutable pointer to the dynamic array's buffer, or a dangling raw pointer valid for zero sized reads if the dynamic array didn't allocate.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.arr.ptr()
    }

    /// Extracts a slice containing the entire dynamic array.
    ///
    /// Equivalent to `&s[..]`.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // Safety: `[0, len)` are always initialized, and the pointer is aligned and non-null, even when dangling
        unsafe { slice::from_raw_parts(self.arr.ptr(), self.len) }
    }

    /// Extracts a mutable slice of the entire dynamic array.
    ///
    /// Equivalent to `&mut s[..]`.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.arr.ptr(), self.len) }
    }

    //--------------------------------------------------------------

    /// Get a cursor to the first element.
    #[inline]
    pub fn begin(&self) -> Cursor {
        Cursor::new(0, self.epoch)
    }

    /// Get a cursor one past the last element.
    #[inline]
    pub fn end(&self) -> Cursor {
        Cursor::new(self.len, self.epoch)
    }

    /// Get a reverse cursor to the last element.
    #[inline]
    pub fn rbegin(&self) -> RevCursor {
        RevCursor::new(self.end())
    }

    /// Get a reverse cursor one before the first element.
    #[inline]
    pub fn rend(&self) -> RevCursor {
        RevCursor::new(self.begin())
    }

    /// Get a cursor to the element at `index`.
    #[inline]
    pub fn cursor_at(&self, index: usize) -> Cursor {
        Cursor::new(index, self.epoch)
    }

    /// Check if `cursor` can still be used with this dynamic array.
    ///
    /// A cursor is invalidated when the buffer it was created for was replaced, or when it points past the end.
    pub fn is_valid(&self, cursor: Cursor) -> bool {
        cursor.epoch() == self.epoch && cursor.index() <= self.len
    }

    /// Get a reference to the element `cursor` points at, or `None` if it's stale or doesn't point at an element.
    pub fn get_at(&self, cursor: Cursor) -> Option<&T> {
        if cursor.epoch() == self.epoch {
            self.as_slice().get(cursor.index())
        } else {
            None
        }
    }

    /// Get a mutable reference to the element `cursor` points at, or `None` if it's stale or doesn't point at an element.
    pub fn get_at_mut(&mut self, cursor: Cursor) -> Option<&mut T> {
        if cursor.epoch() == self.epoch {
            self.as_mut_slice().get_mut(cursor.index())
        } else {
            None
        }
    }

    /// Get a reference to the element a reverse cursor refers to.
    pub fn get_rev(&self, cursor: RevCursor) -> Option<&T> {
        cursor.target().and_then(|cursor| self.get_at(cursor))
    }

    /// Get the elements in the range `[first, last)`.
    ///
    /// # Panics
    ///
    /// Panics if either cursor is stale or out of range, or if `first` comes after `last`.
    #[track_caller]
    pub fn cursor_slice(&self, first: Cursor, last: Cursor) -> &[T] {
        let start = self.position_index(first);
        let end = self.position_index(last);
        if start > end {
            range_failed(start, end);
        }
        &self.as_slice()[start..end]
    }

    /// Resolve a position passed to an insert or erase.
    #[track_caller]
    fn position_index(&self, pos: Cursor) -> usize {
        #[cold]
        #[track_caller]
        fn stale_failed() -> ! {
            panic!("cursor was created for a buffer that has since been replaced");
        }

        #[cold]
        #[track_caller]
        fn position_failed(index: usize, len: usize) -> ! {
            panic!("cursor position (is {index}) should be <= len (is {len})");
        }

        if pos.epoch() != self.epoch {
            stale_failed();
        }
        if pos.index() > self.len {
            position_failed(pos.index(), self.len);
        }
        pos.index()
    }

    //--------------------------------------------------------------

    /// Insert `count` elements at `index`, each one created by `fill`, shifting all elements after it to the right.
    ///
    /// The new elements are created before anything is moved.
    /// When the buffer needs to grow, they are created directly at their final position in the new buffer,
    /// so the current buffer stays untouched until all of them exist.
    fn try_insert_with<F>(&mut self, index: usize, count: usize, growth: Growth, mut fill: F) -> Result<(), DynArrError> where
        F: FnMut() -> T
    {
        debug_assert!(index <= self.len);
        if count == 0 {
            return Ok(());
        }

        let len = self.len;
        if !self.arr.needs_to_grow(len, count) {
            // Safety:
            // - The spare capacity has room for `count` elements.
            // - Until the rotation, the new elements live outside of `[0, len)`, so a panic only needs to destroy those built so far.
            unsafe {
                let spare = self.arr.ptr().add(len);
                let mut built = scopeguard::guard((&mut self.arr, 0usize), move |(arr, built)| {
                    arr.allocator_mut().destroy_slice(ptr::slice_from_raw_parts_mut(spare, built));
                });
                while built.1 < count {
                    let value = fill();
                    let (arr, n) = &mut *built;
                    arr.allocator_mut().construct(spare.add(*n), value);
                    *n += 1;
                }
                ScopeGuard::into_inner(built);

                // Only moves elements from here on, which can't fail
                slice::from_raw_parts_mut(self.arr.ptr().add(index), len + count - index).rotate_right(count);
            }
            self.len = len + count;
            return Ok(());
        }

        let new_cap = match growth {
            Growth::Amortized => self.arr.grown_capacity(len, count)?,
            Growth::Exact => self.arr.required_capacity(len, count)?,
        };
        let new_ptr = self.arr.allocate_buffer(new_cap)?;
        // Safety:
        // - The new buffer has room for `len + count` elements, and doesn't overlap the current one.
        // - On a panic, the elements built so far are destroyed and the new buffer is released, the current buffer was never touched.
        unsafe {
            let dst = new_ptr.as_ptr();
            let mut built = scopeguard::guard((&mut self.arr, 0usize), move |(arr, built)| {
                arr.allocator_mut().destroy_slice(ptr::slice_from_raw_parts_mut(dst.add(index), built));
                arr.release_buffer(new_ptr, new_cap);
            });
            while built.1 < count {
                let value = fill();
                let (arr, n) = &mut *built;
                arr.allocator_mut().construct(dst.add(index + *n), value);
                *n += 1;
            }
            let (arr, _) = ScopeGuard::into_inner(built);

            let src = arr.ptr();
            ptr::copy_nonoverlapping(src, dst, index);
            ptr::copy_nonoverlapping(src.add(index), dst.add(index + count), len - index);
            arr.install_buffer(new_ptr, new_cap);
        }
        self.len = len + count;
        self.bump_epoch();
        Ok(())
    }

    /// Move all elements of `staged` into this array at `index`.
    fn try_insert_staged(&mut self, index: usize, mut staged: Self) -> Result<(), DynArrError> {
        let count = staged.len;
        self.try_grow_for(count)?;
        // Safety: there is room for `count` more elements, which `staged` forgets about by resetting its length
        unsafe {
            let base = self.arr.ptr();
            ptr::copy(base.add(index), base.add(index + count), self.len - index);
            ptr::copy_nonoverlapping(staged.arr.ptr(), base.add(index), count);
            staged.len = 0;
        }
        self.len += count;
        Ok(())
    }

    /// Inserts an element at `pos`, shifting all elements after it to the right.
    ///
    /// Returns a cursor to the inserted element.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is stale or past the end, if the new capacity exceeds [`max_size`](DynArr::max_size), or if memory could not be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use arka_common::dynarr;
    ///
    /// let mut arr = dynarr![1, 2, 3];
    /// let pos = arr.insert(arr.begin() + 1, 4);
    /// assert_eq!(arr, [1, 4, 2, 3]);
    /// assert_eq!(arr.get_at(pos), Some(&4));
    /// arr.insert(arr.end(), 5);
    /// assert_eq!(arr, [1, 4, 2, 3, 5]);
    /// ```
    ///
    /// # Time complexity
    ///
    /// Takes *O*([`DynArr::len`]) time.
    /// All items after the insertion index must be shifted to the right.
    #[track_caller]
    pub fn insert(&mut self, pos: Cursor, value: T) -> Cursor {
        match self.try_insert(pos, value) {
            Ok(cursor) => cursor,
            Err(err) => handle_error(err),
        }
    }

    /// Tries to insert an element at `pos`, see [`DynArr::insert`].
    ///
    /// # Errors
    ///
    /// When an error is returned, the array is left untouched and `value` is dropped.
    #[track_caller]
    pub fn try_insert(&mut self, pos: Cursor, value: T) -> Result<Cursor, DynArrError> {
        let index = self.position_index(pos);
        self.try_grow_for(1)?;

        let len = self.len;
        // Safety: there is room for one more element, it is written to the spare slot and then rotated into place
        unsafe {
            let slot = self.arr.ptr().add(len);
            self.arr.allocator_mut().construct(slot, value);
            slice::from_raw_parts_mut(self.arr.ptr().add(index), len + 1 - index).rotate_right(1);
        }
        self.len = len + 1;
        Ok(self.cursor_at(index))
    }

    /// Inserts the value returned by `f` at `pos`, see [`DynArr::insert`].
    #[track_caller]
    pub fn emplace<F: FnOnce() -> T>(&mut self, pos: Cursor, f: F) -> Cursor {
        self.insert(pos, f())
    }

    /// Tries to insert the value returned by `f` at `pos`, see [`DynArr::try_insert`].
    #[track_caller]
    pub fn try_emplace<F: FnOnce() -> T>(&mut self, pos: Cursor, f: F) -> Result<Cursor, DynArrError> {
        self.try_insert(pos, f())
    }

    /// Inserts all elements of an iterator at `pos`, keeping their order.
    ///
    /// Returns a cursor to the first inserted element, or `pos` if nothing was inserted.
    #[track_caller]
    pub fn insert_iter<I: IntoIterator<Item = T>>(&mut self, pos: Cursor, iter: I) -> Cursor {
        match self.try_insert_iter(pos, iter) {
            Ok(cursor) => cursor,
            Err(err) => handle_error(err),
        }
    }

    /// Tries to insert all elements of an iterator at `pos`, see [`DynArr::insert_iter`].
    #[track_caller]
    pub fn try_insert_iter<I: IntoIterator<Item = T>>(&mut self, pos: Cursor, iter: I) -> Result<Cursor, DynArrError> {
        let index = self.position_index(pos);
        // Collected up front, so the iterator can't observe or interrupt a half-done insertion
        let staged = Self::try_from_iter_in(iter, self.arr.allocator().clone())?;
        if staged.is_empty() {
            return Ok(pos);
        }
        self.try_insert_staged(index, staged)?;
        Ok(self.cursor_at(index))
    }

    /// Appends an element to the back of the dynamic array.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity exceeds [`max_size`](DynArr::max_size), or if memory could not be allocated.
    #[track_caller]
    pub fn push(&mut self, value: T) {
        if let Err(err) = self.try_push(value) {
            handle_error(err);
        }
    }

    /// Tries to append an element to the back of the dynamic array.
    ///
    /// # Errors
    ///
    /// When an error is returned, the array is left untouched and `value` is dropped.
    pub fn try_push(&mut self, value: T) -> Result<(), DynArrError> {
        let len = self.len;
        if len == self.arr.capacity() {
            self.try_grow_for(1)?;
        }
        unsafe {
            let slot = self.arr.ptr().add(len);
            self.arr.allocator_mut().construct(slot, value);
        }
        self.len = len + 1;
        Ok(())
    }

    /// Appends the value returned by `f` and returns a reference to it.
    #[track_caller]
    pub fn emplace_back<F: FnOnce() -> T>(&mut self, f: F) -> &mut T {
        self.push(f());
        self.back_mut()
    }

    /// Appends an element if there is sufficient spare capacity, otherwise the element is returned.
    ///
    /// Unlike [`push`], this method will never reallocate.
    ///
    /// [`push`]: DynArr::push
    pub fn push_within_capacity(&mut self, value: T) -> Result<(), T> {
        let len = self.len;
        if len == self.arr.capacity() {
            return Err(value);
        }
        unsafe {
            let slot = self.arr.ptr().add(len);
            self.arr.allocator_mut().construct(slot, value);
        }
        self.len = len + 1;
        Ok(())
    }

    //--------------------------------------------------------------

    /// Removes the last element from the dynamic array and returns it, or `None` if it's empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            self.len -= 1;
            // Safety: the element was live, and is no longer part of `[0, len)`
            Some(unsafe { ptr::read(self.arr.ptr().add(self.len)) })
        }
    }

    /// Removes the element at `pos`, shifting all elements after it to the left.
    ///
    /// Returns a cursor to the element that followed the removed element.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is stale, or doesn't point at an element.
    #[track_caller]
    pub fn erase(&mut self, pos: Cursor) -> Cursor {
        let index = self.position_index(pos);
        if index >= self.len {
            erase_failed(index, self.len);
        }
        self.erase_range(pos, pos + 1)
    }

    /// Removes the elements in `[first, last)`, shifting all elements after them to the left.
    /// The capacity is left unchanged.
    ///
    /// Returns a cursor to the element that followed the last removed element, or `last` when the range is empty.
    ///
    /// # Panics
    ///
    /// Panics if either cursor is stale or out of range, or if `first` comes after `last`.
    ///
    /// # Examples
    ///
    /// ```
    /// use arka_common::dynarr;
    ///
    /// let mut arr = dynarr![1, 2, 3, 4, 5];
    /// let next = arr.erase_range(arr.begin() + 1, arr.begin() + 3);
    /// assert_eq!(arr, [1, 4, 5]);
    /// assert_eq!(arr.get_at(next), Some(&4));
    /// ```
    #[track_caller]
    pub fn erase_range(&mut self, first: Cursor, last: Cursor) -> Cursor {
        let start = self.position_index(first);
        let end = self.position_index(last);
        if start > end {
            range_failed(start, end);
        }
        if start == end {
            return last;
        }

        let len = self.len;
        // Safety:
        // - The length is shortened before destroying, so no element is destroyed twice, even when a destructor panics.
        // - The guard shifts the tail down in every case, which restores `[0, len)` to live elements.
        unsafe {
            self.len = start;
            let base = self.arr.ptr();
            let mut tail = scopeguard::guard(&mut *self, move |arr| {
                ptr::copy(base.add(end), base.add(start), len - end);
                arr.len = start + (len - end);
            });
            tail.arr.allocator_mut().destroy_slice(ptr::slice_from_raw_parts_mut(base.add(start), end - start));
        }
        self.cursor_at(start)
    }

    /// Removes and returns the element at position `index` within the dynamic array, shifting all elements after it to the left.
    ///
    /// Note: Because this shifts over the remaining elements, it has a worst-case performance of *O*(*n*).
    /// If you don't need the order of elements to be preserved, use [`swap_remove`] instead.
    ///
    /// [`swap_remove`]: DynArr::swap_remove
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        #[cold]
        #[track_caller]
        fn assert_failed(index: usize, len: usize) -> ! {
            panic!("removal index (is {index}) should be < len (is {len})");
        }

        let len = self.len;
        if index >= len {
            assert_failed(index, len);
        }
        unsafe {
            let ptr = self.arr.ptr().add(index);
            let value = ptr::read(ptr);
            ptr::copy(ptr.add(1), ptr, len - index - 1);
            self.len = len - 1;
            value
        }
    }

    /// Removes an element from the dynamic array and returns it, replacing it with the last element.
    ///
    /// This does not preserve ordering, but is *O*(1).
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[track_caller]
    pub fn swap_remove(&mut self, index: usize) -> T {
        #[cold]
        #[track_caller]
        fn assert_failed(index: usize, len: usize) -> ! {
            panic!("swap_remove index (is {index}) should be < len (is {len})");
        }

        let len = self.len;
        if index >= len {
            assert_failed(index, len);
        }
        unsafe {
            // If the bounds check succeeds there must be a last element, which can be `self[index]` itself
            let base = self.arr.ptr();
            let value = ptr::read(base.add(index));
            ptr::copy(base.add(len - 1), base.add(index), 1);
            self.len = len - 1;
            value
        }
    }

    /// Shortens the dynamic array, keeping the first `len` elements and destroying the rest.
    ///
    /// If `len` is greater or equal to the dynamic array's current length, this has no effect.
    /// This has no effect on the allocated capacity.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        // Safety: the length is shrunk before destroying, so no element is dropped twice if a destructor panics
        unsafe {
            let remaining = ptr::slice_from_raw_parts_mut(self.arr.ptr().add(len), self.len - len);
            self.len = len;
            self.arr.allocator_mut().destroy_slice(remaining);
        }
    }

    /// Clears the dynamic array, removing all values.
    ///
    /// This has no effect on the allocated capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0)
    }

    /// Removes all elements for which `pred` returns `true`, returning how many were removed.
    pub fn erase_if<F>(&mut self, mut pred: F) -> usize where
        F: FnMut(&T) -> bool
    {
        let original_len = self.len;
        self.retain_mut(|value| !pred(value));
        original_len - self.len
    }

    /// Removes all elements equal to `value`, returning how many were removed.
    pub fn erase_value(&mut self, value: &T) -> usize where
        T: PartialEq
    {
        self.erase_if(|elem| elem == value)
    }

    /// Retains only the elements specified by the predicate.
    ///
    /// In other words, remove all elements `e` for which `f(e)` returns `false`.
    /// This method operates in place, visiting each element exactly once in the original order, and preserves the order of the retained elements.
    pub fn retain<F>(&mut self, mut f: F) where
        F: FnMut(&T) -> bool
    {
        self.retain_mut(|elem| f(elem))
    }

    /// Retains only the elements specified by the predicate, passing a mutable reference to it.
    pub fn retain_mut<F>(&mut self, mut f: F) where
        F: FnMut(&mut T) -> bool
    {
        let original_len = self.len;
        // Avoid a double drop if the guard is not executed, since holes are made during the process
        self.len = 0;

        // DynArr: [Kept, Kept, Hole, Hole, Hole, Unchecked, Unchecked]
        //         |<-        processed len     ->| ^- next to check
        //                     |<- deleted cnt  ->|
        //
        // The guard shifts the unchecked elements over the holes and restores the length, also when the predicate or a destructor panics.
        struct BackshiftOnDrop<'a, T, A: Allocator, R: ReserveStrategy> {
            a:             &'a mut DynArr<T, A, R>,
            processed_len: usize,
            deleted_cnt:   usize,
            original_len:  usize,
        }

        impl<T, A: Allocator, R: ReserveStrategy> Drop for BackshiftOnDrop<'_, T, A, R> {
            fn drop(&mut self) {
                if self.deleted_cnt > 0 {
                    // Safety: trailing unchecked items must be valid since they were never touched
                    unsafe {
                        let base = self.a.arr.ptr();
                        ptr::copy(
                            base.add(self.processed_len),
                            base.add(self.processed_len - self.deleted_cnt),
                            self.original_len - self.processed_len
                        );
                    }
                }
                self.a.len = self.original_len - self.deleted_cnt;
            }
        }

        let mut g = BackshiftOnDrop { a: self, processed_len: 0, deleted_cnt: 0, original_len };
        while g.processed_len != original_len {
            // Safety: unchecked elements are live
            let cur = unsafe { g.a.arr.ptr().add(g.processed_len) };
            if !f(unsafe { &mut *cur }) {
                // Advance early to avoid a double drop if the destructor panics
                g.processed_len += 1;
                g.deleted_cnt += 1;
                unsafe { g.a.arr.allocator_mut().destroy(cur) };
                continue;
            }
            if g.deleted_cnt > 0 {
                // Safety: `deleted_cnt > 0`, so the hole can't overlap the current element
                unsafe {
                    let hole = g.a.arr.ptr().add(g.processed_len - g.deleted_cnt);
                    ptr::copy_nonoverlapping(cur, hole, 1);
                }
            }
            g.processed_len += 1;
        }
        drop(g);
    }

    //--------------------------------------------------------------

    /// Resizes the dynamic array in-place so that `len` is equal to `new_len`.
    ///
    /// If `new_len` is greater than `len`, the dynamic array is extended by the difference, with each additional slot filled with the result of calling `f`.
    /// When the buffer needs to grow, it grows to exactly `new_len`.
    /// If `new_len` is less than `len`, the dynamic array is truncated.
    #[track_caller]
    pub fn resize_with<F>(&mut self, new_len: usize, f: F) where
        F: FnMut() -> T
    {
        if let Err(err) = self.try_resize_with(new_len, f) {
            handle_error(err);
        }
    }

    /// Tries to resize the dynamic array, see [`DynArr::resize_with`].
    pub fn try_resize_with<F>(&mut self, new_len: usize, f: F) -> Result<(), DynArrError> where
        F: FnMut() -> T
    {
        let len = self.len;
        if new_len <= len {
            self.truncate(new_len);
            return Ok(());
        }
        self.try_insert_with(len, new_len - len, Growth::Exact, f)
    }

    /// Resizes the dynamic array, filling new slots with default values, see [`DynArr::resize_with`].
    #[track_caller]
    pub fn resize_default(&mut self, new_len: usize) where
        T: Default
    {
        self.resize_with(new_len, T::default)
    }

    //--------------------------------------------------------------

    /// Replaces the contents with the elements of an iterator.
    ///
    /// The new contents are built before the old ones are destroyed, so a failure leaves the array untouched.
    #[track_caller]
    pub fn assign_iter<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        if let Err(err) = self.try_assign_iter(iter) {
            handle_error(err);
        }
    }

    /// Tries to replace the contents with the elements of an iterator, see [`DynArr::assign_iter`].
    pub fn try_assign_iter<I: IntoIterator<Item = T>>(&mut self, iter: I) -> Result<(), DynArrError> {
        let replacement = Self::try_from_iter_in(iter, self.arr.allocator().clone())?;
        self.replace_with(replacement);
        Ok(())
    }

    /// Move-assigns the contents of `other` to this array, leaving `other` empty.
    ///
    /// When the allocator propagates on move-assignment ([`Allocator::PROPAGATE_ON_MOVE_ASSIGN`]), this array takes over both the buffer and the allocator of `other`.
    /// Otherwise this array keeps its allocator: when the allocators compare equal, the buffer is handed over,
    /// if not, the elements are moved one by one into a new buffer from this array's allocator.
    ///
    /// # Panics
    ///
    /// Panics if a new buffer is needed but could not be allocated, in which case both arrays are left untouched.
    #[track_caller]
    pub fn move_assign(&mut self, other: &mut Self) {
        if let Err(err) = self.try_move_assign(other) {
            handle_error(err);
        }
    }

    /// Tries to move-assign the contents of `other` to this array, see [`DynArr::move_assign`].
    pub fn try_move_assign(&mut self, other: &mut Self) -> Result<(), DynArrError> {
        let replacement = if A::PROPAGATE_ON_MOVE_ASSIGN {
            let alloc = other.arr.allocator().clone();
            other.take_storage(alloc)
        } else {
            other.try_take_in(self.arr.allocator().clone())?
        };
        self.replace_with(replacement);
        Ok(())
    }

    /// Exchanges the contents of this array with `other` in *O*(1).
    ///
    /// Allocators are only exchanged when they propagate on swap ([`Allocator::PROPAGATE_ON_SWAP`]).
    ///
    /// # Panics
    ///
    /// Panics if the allocators don't propagate on swap, and don't compare equal.
    #[track_caller]
    pub fn swap_with(&mut self, other: &mut Self) {
        #[cold]
        #[track_caller]
        fn swap_failed() -> ! {
            panic!("cannot swap the contents of dynamic arrays with unequal, non-propagating allocators");
        }

        if A::PROPAGATE_ON_SWAP {
            mem::swap(&mut self.arr, &mut other.arr);
        } else {
            if self.arr.allocator() != other.arr.allocator() {
                swap_failed();
            }
            self.arr.swap_buffers(&mut other.arr);
        }
        mem::swap(&mut self.len, &mut other.len);
        self.bump_epoch();
        other.bump_epoch();
    }
}

impl<T: Clone, A: Allocator, R: ReserveStrategy> DynArr<T, A, R> {
    /// Constructs a `DynArr<T, A, R>` holding `n` clones of `value`, with the provided allocator.
    #[track_caller]
    pub fn from_elem_in(value: T, n: usize, alloc: A) -> Self {
        match Self::try_from_elem_in(value, n, alloc) {
            Ok(arr) => arr,
            Err(err) => handle_error(err),
        }
    }

    /// Tries to construct a `DynArr<T, A, R>` holding `n` clones of `value`, with the provided allocator.
    pub fn try_from_elem_in(value: T, n: usize, alloc: A) -> Result<Self, DynArrError> {
        let mut arr = Self::try_with_capacity_in(n, alloc)?;
        arr.try_insert_with(0, n, Growth::Exact, || value.clone())?;
        Ok(arr)
    }

    /// Constructs a `DynArr<T, A, R>` holding clones of the elements in `values`, with the provided allocator.
    #[track_caller]
    pub fn from_slice_in(values: &[T], alloc: A) -> Self {
        match Self::try_from_slice_in(values, alloc) {
            Ok(arr) => arr,
            Err(err) => handle_error(err),
        }
    }

    /// Tries to construct a `DynArr<T, A, R>` holding clones of the elements in `values`, with the provided allocator.
    pub fn try_from_slice_in(values: &[T], alloc: A) -> Result<Self, DynArrError> {
        let mut arr = Self::try_with_capacity_in(values.len(), alloc)?;
        arr.try_insert_with(0, values.len(), Growth::Exact, clone_each(values))?;
        Ok(arr)
    }

    /// Clones the dynamic array into a dynamic array using `alloc`.
    #[track_caller]
    pub fn clone_in(&self, alloc: A) -> Self {
        Self::from_slice_in(self, alloc)
    }

    /// Tries to clone the dynamic array into a dynamic array using `alloc`.
    pub fn try_clone_in(&self, alloc: A) -> Result<Self, DynArrError> {
        Self::try_from_slice_in(self, alloc)
    }

    /// Tries to clone the dynamic array, using the allocator selected by [`Allocator::select_on_copy`].
    pub fn try_clone(&self) -> Result<Self, DynArrError> {
        self.try_clone_in(self.arr.allocator().select_on_copy())
    }

    /// Inserts `n` clones of `value` at `pos`.
    ///
    /// Returns a cursor to the first inserted element, or `pos` if `n` is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use arka_common::dynarr;
    ///
    /// let mut arr = dynarr![1, 2, 3];
    /// arr.insert_n(arr.begin() + 1, 2, &9);
    /// assert_eq!(arr, [1, 9, 9, 2, 3]);
    /// ```
    #[track_caller]
    pub fn insert_n(&mut self, pos: Cursor, n: usize, value: &T) -> Cursor {
        match self.try_insert_n(pos, n, value) {
            Ok(cursor) => cursor,
            Err(err) => handle_error(err),
        }
    }

    /// Tries to insert `n` clones of `value` at `pos`, see [`DynArr::insert_n`].
    #[track_caller]
    pub fn try_insert_n(&mut self, pos: Cursor, n: usize, value: &T) -> Result<Cursor, DynArrError> {
        let index = self.position_index(pos);
        if n == 0 {
            return Ok(pos);
        }
        self.try_insert_with(index, n, Growth::Amortized, || value.clone())?;
        Ok(self.cursor_at(index))
    }

    /// Inserts clones of all elements in `values` at `pos`.
    ///
    /// Returns a cursor to the first inserted element, or `pos` if `values` is empty.
    #[track_caller]
    pub fn insert_slice(&mut self, pos: Cursor, values: &[T]) -> Cursor {
        match self.try_insert_slice(pos, values) {
            Ok(cursor) => cursor,
            Err(err) => handle_error(err),
        }
    }

    /// Tries to insert clones of all elements in `values` at `pos`, see [`DynArr::insert_slice`].
    #[track_caller]
    pub fn try_insert_slice(&mut self, pos: Cursor, values: &[T]) -> Result<Cursor, DynArrError> {
        let index = self.position_index(pos);
        if values.is_empty() {
            return Ok(pos);
        }
        self.try_insert_with(index, values.len(), Growth::Amortized, clone_each(values))?;
        Ok(self.cursor_at(index))
    }

    /// Clones and appends all elements in a slice to the dynamic array.
    #[track_caller]
    pub fn extend_from_slice(&mut self, values: &[T]) {
        let end = self.end();
        self.insert_slice(end, values);
    }

    /// Resizes the dynamic array in-place so that `len` is equal to `new_len`, filling new slots with clones of `value`.
    ///
    /// When the buffer needs to grow, it grows to exactly `new_len`.
    ///
    /// # Examples
    ///
    /// ```
    /// use arka_common::dynarr;
    ///
    /// let mut arr = dynarr!["hello"];
    /// arr.resize(3, "world");
    /// assert_eq!(arr, ["hello", "world", "world"]);
    /// assert_eq!(arr.capacity(), 3);
    ///
    /// arr.resize(1, "unused");
    /// assert_eq!(arr, ["hello"]);
    /// assert_eq!(arr.capacity(), 3);
    /// ```
    #[track_caller]
    pub fn resize(&mut self, new_len: usize, value: T) {
        if let Err(err) = self.try_resize(new_len, value) {
            handle_error(err);
        }
    }

    /// Tries to resize the dynamic array, see [`DynArr::resize`].
    pub fn try_resize(&mut self, new_len: usize, value: T) -> Result<(), DynArrError> {
        self.try_resize_with(new_len, || value.clone())
    }

    /// Replaces the contents with `n` clones of `value`.
    #[track_caller]
    pub fn assign(&mut self, n: usize, value: &T) {
        if let Err(err) = self.try_assign(n, value) {
            handle_error(err);
        }
    }

    /// Tries to replace the contents with `n` clones of `value`, see [`DynArr::assign`].
    pub fn try_assign(&mut self, n: usize, value: &T) -> Result<(), DynArrError> {
        let replacement = Self::try_from_elem_in(value.clone(), n, self.arr.allocator().clone())?;
        self.replace_with(replacement);
        Ok(())
    }

    /// Replaces the contents with clones of the elements in `values`.
    #[track_caller]
    pub fn assign_slice(&mut self, values: &[T]) {
        if let Err(err) = self.try_assign_slice(values) {
            handle_error(err);
        }
    }

    /// Tries to replace the contents with clones of the elements in `values`, see [`DynArr::assign_slice`].
    pub fn try_assign_slice(&mut self, values: &[T]) -> Result<(), DynArrError> {
        let replacement = Self::try_from_slice_in(values, self.arr.allocator().clone())?;
        self.replace_with(replacement);
        Ok(())
    }
}

/// Yield clones of `values` in order, one per call.
fn clone_each<T: Clone>(values: &[T]) -> impl FnMut() -> T + '_ {
    let mut idx = 0;
    move || {
        let value = values[idx].clone();
        idx += 1;
        value
    }
}

#[cold]
#[track_caller]
fn empty_failed(op: &str) -> ! {
    panic!("`{op}` called on an empty dynamic array");
}

#[cold]
#[track_caller]
fn erase_failed(index: usize, len: usize) -> ! {
    panic!("erase position (is {index}) should be < len (is {len})");
}

#[cold]
#[track_caller]
fn range_failed(start: usize, end: usize) -> ! {
    panic!("range start (is {start}) should be <= range end (is {end})");
}

impl<T, A: Allocator, R: ReserveStrategy> Drop for DynArr<T, A, R> {
    fn drop(&mut self) {
        // Safety: `[0, len)` are live, `RawArray` releases the buffer afterwards
        unsafe {
            let elems = ptr::slice_from_raw_parts_mut(self.arr.ptr(), self.len);
            self.arr.allocator_mut().destroy_slice(elems);
        }
    }
}

impl<T, A: Allocator, R: ReserveStrategy> Deref for DynArr<T, A, R> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: Allocator, R: ReserveStrategy> DerefMut for DynArr<T, A, R> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Clone, A: Allocator, R: ReserveStrategy> Clone for DynArr<T, A, R> {
    #[track_caller]
    fn clone(&self) -> Self {
        self.clone_in(self.arr.allocator().select_on_copy())
    }

    #[track_caller]
    fn clone_from(&mut self, source: &Self) {
        self.assign_slice(source)
    }
}

impl<T: Hash, A: Allocator, R: ReserveStrategy> Hash for DynArr<T, A, R> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        Hash::hash(&**self, state)
    }
}

impl<T, I: SliceIndex<[T]>, A: Allocator, R: ReserveStrategy> Index<I> for DynArr<T, A, R> {
    type Output = I::Output;

    #[inline]
    fn index(&self, index: I) -> &Self::Output {
        Index::index(&**self, index)
    }
}

impl<T, I: SliceIndex<[T]>, A: Allocator, R: ReserveStrategy> IndexMut<I> for DynArr<T, A, R> {
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        IndexMut::index_mut(&mut **self, index)
    }
}

impl<T, A: Allocator + Default, R: ReserveStrategy> FromIterator<T> for DynArr<T, A, R> {
    #[track_caller]
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_iter_in(iter, A::default())
    }
}

impl<T, A: Allocator, R: ReserveStrategy> IntoIterator for DynArr<T, A, R> {
    type Item = T;
    type IntoIter = IntoIter<T, A, R>;

    /// Creates a consuming iterator, that is, one that moves each value out of the dynamic array (from start to end).
    /// The dynamic array cannot be used after calling this.
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        let me = ManuallyDrop::new(self);
        // Safety: `me` is never dropped, so the buffer has a single owner after the read
        let arr = unsafe { ptr::read(&me.arr) };
        IntoIter { arr, start: 0, end: me.len }
    }
}

impl<'a, T, A: Allocator, R: ReserveStrategy> IntoIterator for &'a DynArr<T, A, R> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator, R: ReserveStrategy> IntoIterator for &'a mut DynArr<T, A, R> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, A: Allocator, R: ReserveStrategy> Extend<T> for DynArr<T, A, R> {
    /// Appends all elements of an iterator, see [`DynArr::insert_iter`].
    ///
    /// The elements are collected before the array is touched, so a panicking iterator leaves the array unchanged.
    #[track_caller]
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let end = self.end();
        self.insert_iter(end, iter);
    }
}

impl<'a, T: Copy + 'a, A: Allocator, R: ReserveStrategy> Extend<&'a T> for DynArr<T, A, R> {
    #[track_caller]
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied())
    }
}

impl_slice_partial_eq_generic!([A0: Allocator, A1: Allocator, R0: ReserveStrategy, R1: ReserveStrategy] DynArr<T, A0, R0>, DynArr<U, A1, R1>);
impl_slice_partial_eq_generic!([A: Allocator, R: ReserveStrategy] DynArr<T, A, R>, &[U]);
impl_slice_partial_eq_generic!([A: Allocator, R: ReserveStrategy] DynArr<T, A, R>, &mut [U]);
impl_slice_partial_eq_generic!([A: Allocator, R: ReserveStrategy] &[T], DynArr<U, A, R>);
impl_slice_partial_eq_generic!([A: Allocator, R: ReserveStrategy] DynArr<T, A, R>, [U]);
impl_slice_partial_eq_generic!([A: Allocator, R: ReserveStrategy] [T], DynArr<U, A, R>);
impl_slice_partial_eq_generic!([A: Allocator, R: ReserveStrategy, const N: usize] DynArr<T, A, R>, [U; N]);
impl_slice_partial_eq_generic!([A: Allocator, R: ReserveStrategy, const N: usize] [T; N], DynArr<U, A, R>);

impl<T, A0, A1, R0, R1> PartialOrd<DynArr<T, A1, R1>> for DynArr<T, A0, R0> where
    T: PartialOrd,
    A0: Allocator,
    A1: Allocator,
    R0: ReserveStrategy,
    R1: ReserveStrategy,
{
    #[inline]
    fn partial_cmp(&self, other: &DynArr<T, A1, R1>) -> Option<Ordering> {
        PartialOrd::partial_cmp(&**self, &**other)
    }
}

impl<T: Eq, A: Allocator, R: ReserveStrategy> Eq for DynArr<T, A, R> {}

impl<T: Ord, A: Allocator, R: ReserveStrategy> Ord for DynArr<T, A, R> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(&**self, &**other)
    }
}

impl<T, A: Allocator + Default, R: ReserveStrategy> Default for DynArr<T, A, R> {
    /// Creates an empty `DynArr<T, A, R>`, without allocating.
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: fmt::Debug, A: Allocator, R: ReserveStrategy> fmt::Debug for DynArr<T, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T, A: Allocator, R: ReserveStrategy> AsRef<[T]> for DynArr<T, A, R> {
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T, A: Allocator, R: ReserveStrategy> AsMut<[T]> for DynArr<T, A, R> {
    fn as_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T: Clone, A: Allocator + Default, R: ReserveStrategy> From<&[T]> for DynArr<T, A, R> {
    /// Allocate a `DynArr<T, A, R>` and fill it by cloning `s`'s items.
    #[track_caller]
    fn from(s: &[T]) -> Self {
        Self::from_slice_in(s, A::default())
    }
}

impl<T, A: Allocator + Default, R: ReserveStrategy, const N: usize> From<[T; N]> for DynArr<T, A, R> {
    /// Allocate a `DynArr<T, A, R>` and move `arr`'s items into it.
    #[track_caller]
    fn from(arr: [T; N]) -> Self {
        Self::from_iter_in(arr, A::default())
    }
}

/// Creates a [`DynArr`] containing the arguments.
///
/// `dynarr!` allows `DynArr`s to be defined with the same syntax as array expressions. There are two forms of this macro:
///
/// - Create a [`DynArr`] containing a given list of elements, sized exactly for them:
///
/// ```
/// use arka_common::dynarr;
///
/// let arr = dynarr![1, 2, 3];
/// assert_eq!(arr[0], 1);
/// assert_eq!(arr.capacity(), 3);
/// ```
///
/// - Create a [`DynArr`] from a given element and size, which clones the element:
///
/// ```
/// use arka_common::dynarr;
///
/// let arr = dynarr![1; 3];
/// assert_eq!(arr, [1, 1, 1]);
/// ```
#[macro_export]
macro_rules! dynarr {
    () => {
        $crate::collections::DynArr::new()
    };
    ($elem:expr; $n:expr) => {
        $crate::collections::DynArr::from_elem($elem, $n)
    };
    ($($val:expr),+ $(,)?) => {
        {
            let mut arr = $crate::collections::DynArr::with_capacity($crate::count_exprs!($($val),+));
            $(
                arr.push($val);
            )+
            arr
        }
    };
}
