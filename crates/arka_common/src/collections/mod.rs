//! Allocator-aware collections.

mod imp;
mod dynarr;

use core::{alloc::Layout, fmt};

pub use dynarr::*;

//--------------------------------------------------------------

macro_rules! impl_slice_partial_eq_generic {
    ([$($vars:tt)*] $lhs:ty, $rhs:ty $(where $ty:ty: $bound:ident)?) => {
        impl<T, U, $($vars)*> PartialEq<$rhs> for $lhs  where
            T : PartialEq<U>,
            $($ty: $bound)?
        {
            #[inline]
            fn eq(&self, other: &$rhs) -> bool { self[..] == other[..] }
            #[inline]
            fn ne(&self, other: &$rhs) -> bool { self[..] != other[..] }
        }
    };
}
use impl_slice_partial_eq_generic;

//--------------------------------------------------------------

/// Error returned by the fallible operations of the collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DynArrError {
    /// An index was outside of the live elements.
    OutOfRange {
        index: usize,
        len:   usize,
    },
    /// A requested length or capacity exceeds what the allocator can address, or its computation overflowed.
    LengthError {
        requested: usize,
        max:       usize,
    },
    /// The allocator could not provide memory for the given layout.
    AllocError {
        layout: Layout,
    },
}

impl fmt::Display for DynArrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynArrError::OutOfRange { index, len } => write!(f, "index {index} is out of range for an array of length {len}"),
            DynArrError::LengthError { requested, max } => write!(f, "requested length {requested} exceeds the maximum length of {max}"),
            DynArrError::AllocError { layout } => write!(f, "memory allocation of {} bytes (align {}) failed", layout.size(), layout.align()),
        }
    }
}

impl std::error::Error for DynArrError {}

//--------------------------------------------------------------

/// A trait used to define a strategy to reserve additional memory for containers.
pub trait ReserveStrategy {
    /// Calculate the new capacity for a container.
    /// 
    /// `cur_capacity` represents the current capacity of the container.
    /// 
    /// `min_capacity` represents the minimum required capacity to be able to resize.
    /// 
    /// Returns `Err(())` if the capacity were to overflow
    fn calculate(cur_capacity: usize, min_capacity: usize) -> Result<usize, ()>;
}

/// A reserve strategy that will try to either return double the current capacity, or the minimum required capacity, whichever is bigger.
#[derive(Clone, Copy, Debug, Default)]
pub struct DoubleOrMinReserveStrategy;

impl ReserveStrategy for DoubleOrMinReserveStrategy {
    fn calculate(cur_capacity: usize, min_capacity: usize) -> Result<usize, ()> {
        let double_cap = cur_capacity.saturating_mul(2);
        let new_cap = double_cap.max(min_capacity);
        if new_cap <= isize::MAX as usize {
            Ok(new_cap)
        } else {
            Err(())
        }
    }
}

/// A reserve strategy that will return a power of 2 capacity
#[derive(Clone, Copy, Debug, Default)]
pub struct Pow2ReserveStrategy;

impl ReserveStrategy for Pow2ReserveStrategy {
    fn calculate(_cur_capacity: usize, min_capacity: usize) -> Result<usize, ()> {
        min_capacity.checked_next_power_of_two().ok_or(())
    }
}
