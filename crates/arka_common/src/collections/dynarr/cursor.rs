use core::{
    cmp::Ordering,
    ops::{Add, AddAssign, Sub, SubAssign},
};

/// A position inside of a [`DynArr`](super::DynArr), the index based counterpart of an iterator.
///
/// A cursor does not borrow the array it was created from. Instead it remembers the array's buffer generation,
/// so that a cursor that outlived a reallocation, swap, or assignment can be detected as stale.
/// Cursors into the same buffer compare by position.
///
/// A cursor stays valid across inserts and erases that don't reallocate, but when those happen at or before
/// the cursor's position, it will refer to whatever element was shifted into that slot.
///
/// The generation is a wrapping 32-bit counter. A cursor that is kept around for exactly a multiple of 2^32
/// buffer replacements is no longer detected as stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor {
    index: usize,
    epoch: u32,
}

impl Cursor {
    pub(crate) const fn new(index: usize, epoch: u32) -> Self {
        Self { index, epoch }
    }

    /// Get the index this cursor points at.
    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }

    pub(crate) const fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Move the cursor by a signed number of elements.
    ///
    /// # Panics
    ///
    /// Panics if the cursor would move before the first element.
    #[track_caller]
    #[must_use]
    pub fn offset(self, delta: isize) -> Self {
        match self.index.checked_add_signed(delta) {
            Some(index) => Self { index, ..self },
            None => cursor_out_of_bounds(self.index, delta),
        }
    }

    /// Get the signed distance from `origin` to this cursor.
    #[inline]
    pub fn distance_from(self, origin: Cursor) -> isize {
        self.index.wrapping_sub(origin.index) as isize
    }
}

impl Add<usize> for Cursor {
    type Output = Cursor;

    #[track_caller]
    fn add(self, rhs: usize) -> Self::Output {
        match self.index.checked_add(rhs) {
            Some(index) => Self { index, ..self },
            None => cursor_out_of_bounds(self.index, rhs as isize),
        }
    }
}

impl AddAssign<usize> for Cursor {
    #[track_caller]
    fn add_assign(&mut self, rhs: usize) {
        *self = *self + rhs;
    }
}

impl Sub<usize> for Cursor {
    type Output = Cursor;

    #[track_caller]
    fn sub(self, rhs: usize) -> Self::Output {
        match self.index.checked_sub(rhs) {
            Some(index) => Self { index, ..self },
            None => cursor_out_of_bounds(self.index, (rhs as isize).wrapping_neg()),
        }
    }
}

impl SubAssign<usize> for Cursor {
    #[track_caller]
    fn sub_assign(&mut self, rhs: usize) {
        *self = *self - rhs;
    }
}

impl Sub for Cursor {
    type Output = isize;

    fn sub(self, rhs: Cursor) -> Self::Output {
        self.distance_from(rhs)
    }
}

//--------------------------------------------------------------

/// A cursor walking a [`DynArr`](super::DynArr) back to front.
///
/// Like a reverse iterator, it wraps a forward [`Cursor`] and refers to the element just before it,
/// so `rbegin()` wraps `end()` and refers to the last element, while `rend()` wraps `begin()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RevCursor {
    base: Cursor,
}

impl RevCursor {
    /// Create a reverse cursor referring to the element before `base`.
    #[inline]
    pub const fn new(base: Cursor) -> Self {
        Self { base }
    }

    /// Get the underlying forward cursor.
    #[inline]
    pub const fn base(&self) -> Cursor {
        self.base
    }

    /// Get the forward cursor to the element this cursor refers to, or `None` for `rend()`.
    pub fn target(&self) -> Option<Cursor> {
        self.base.index.checked_sub(1).map(|index| Cursor { index, ..self.base })
    }
}

impl PartialOrd for RevCursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RevCursor {
    fn cmp(&self, other: &Self) -> Ordering {
        other.base.cmp(&self.base)
    }
}

impl Add<usize> for RevCursor {
    type Output = RevCursor;

    #[track_caller]
    fn add(self, rhs: usize) -> Self::Output {
        Self { base: self.base - rhs }
    }
}

impl AddAssign<usize> for RevCursor {
    #[track_caller]
    fn add_assign(&mut self, rhs: usize) {
        self.base -= rhs;
    }
}

impl Sub<usize> for RevCursor {
    type Output = RevCursor;

    #[track_caller]
    fn sub(self, rhs: usize) -> Self::Output {
        Self { base: self.base + rhs }
    }
}

impl SubAssign<usize> for RevCursor {
    #[track_caller]
    fn sub_assign(&mut self, rhs: usize) {
        self.base += rhs;
    }
}

impl Sub for RevCursor {
    type Output = isize;

    fn sub(self, rhs: RevCursor) -> Self::Output {
        rhs.base - self.base
    }
}

#[cold]
#[track_caller]
fn cursor_out_of_bounds(index: usize, delta: isize) -> ! {
    panic!("moving a cursor at {index} by {delta} leaves the addressable range")
}
