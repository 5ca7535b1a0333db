use core::{
    fmt,
    iter::FusedIterator,
    ptr,
    slice,
};

use crate::{
    alloc::{Allocator, Mallocator},
    collections::{imp::array::RawArray, DoubleOrMinReserveStrategy, ReserveStrategy},
};

/// An iterator that moves out of a [`DynArr`](super::DynArr).
///
/// This `struct` is created by the `into_iter` method on `DynArr` (provided by the [`IntoIterator`] trait).
/// Elements that were not yielded are destroyed through the allocator when the iterator is dropped, after which the buffer is released.
pub struct IntoIter<T, A: Allocator = Mallocator, R: ReserveStrategy = DoubleOrMinReserveStrategy> {
    pub(super) arr:   RawArray<T, A, R>,
    /// Index of the next element to yield from the front.
    pub(super) start: usize,
    /// One past the index of the next element to yield from the back.
    pub(super) end:   usize,
}

impl<T: fmt::Debug, A: Allocator, R: ReserveStrategy> fmt::Debug for IntoIter<T, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T, A: Allocator, R: ReserveStrategy> IntoIter<T, A, R> {
    /// Returns the remaining items of this iterator as a slice.
    ///
    /// # Examples
    ///
    /// ```
    /// # use arka_common::dynarr;
    /// let arr = dynarr!['a', 'b', 'c'];
    /// let mut into_iter = arr.into_iter();
    /// assert_eq!(into_iter.as_slice(), &['a', 'b', 'c']);
    /// let _ = into_iter.next().unwrap();
    /// assert_eq!(into_iter.as_slice(), &['b', 'c']);
    /// ```
    pub fn as_slice(&self) -> &[T] {
        // Safety: `[start, end)` are the elements that have not been moved out yet
        unsafe { slice::from_raw_parts(self.arr.ptr().add(self.start), self.end - self.start) }
    }

    /// Returns the remaining items of this iterator as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.arr.ptr().add(self.start), self.end - self.start) }
    }

    /// Returns a reference to the underlying allocator.
    pub fn allocator(&self) -> &A {
        self.arr.allocator()
    }
}

impl<T, A: Allocator, R: ReserveStrategy> Iterator for IntoIter<T, A, R> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        // Safety: the element is live, and moving `start` past it makes sure it is never read again
        let value = unsafe { ptr::read(self.arr.ptr().add(self.start)) };
        self.start += 1;
        Some(value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.start;
        (len, Some(len))
    }

    #[inline]
    fn count(self) -> usize {
        self.len()
    }
}

impl<T, A: Allocator, R: ReserveStrategy> DoubleEndedIterator for IntoIter<T, A, R> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.start == self.end {
            return None;
        }
        self.end -= 1;
        // Safety: see `next`
        Some(unsafe { ptr::read(self.arr.ptr().add(self.end)) })
    }
}

impl<T, A: Allocator, R: ReserveStrategy> ExactSizeIterator for IntoIter<T, A, R> {}

impl<T, A: Allocator, R: ReserveStrategy> FusedIterator for IntoIter<T, A, R> {}

impl<T: Clone, A: Allocator, R: ReserveStrategy> Clone for IntoIter<T, A, R> {
    fn clone(&self) -> Self {
        super::DynArr::<T, A, R>::from_slice_in(self.as_slice(), self.arr.allocator().select_on_copy()).into_iter()
    }
}

impl<T, A: Allocator, R: ReserveStrategy> Drop for IntoIter<T, A, R> {
    fn drop(&mut self) {
        let remaining = ptr::slice_from_raw_parts_mut(unsafe { self.arr.ptr().add(self.start) }, self.end - self.start);
        self.start = self.end;
        // Safety: the remaining elements are live, `RawArray`'s drop releases the buffer afterwards
        unsafe { self.arr.allocator_mut().destroy_slice(remaining) };
    }
}
