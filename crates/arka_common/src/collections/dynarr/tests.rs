use super::*;
use crate::dynarr;

use std::{cell::Cell, rc::Rc};

/// Increments a shared counter when dropped.
struct DropCounter(Rc<Cell<usize>>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn dynarr_new() {
    let arr = DynArr::<i32>::new();
    assert_eq!(arr.capacity(), 0);
    assert_eq!(arr.len(), 0);
    assert!(arr.is_empty());

    let arr = DynArr::<i32>::with_capacity(21);
    assert_eq!(arr.capacity(), 21);
    assert_eq!(arr.len(), 0);

    let arr: DynArr<i32> = DynArr::default();
    assert_eq!(arr.capacity(), 0);
}

#[test]
fn dynarr_fill_constructors() {
    let arr = DynArr::from_elem(7u8, 4);
    assert_eq!(arr, [7, 7, 7, 7]);
    assert_eq!(arr.capacity(), 4);

    let arr = DynArr::<String>::from_default(3);
    assert_eq!(arr.len(), 3);
    assert!(arr.iter().all(String::is_empty));

    let arr = dynarr![1; 3];
    assert_eq!(arr, [1, 1, 1]);

    let arr: DynArr<i32> = dynarr![];
    assert!(arr.is_empty());
    assert_eq!(arr.capacity(), 0);

    let arr = dynarr![1, 2, 3,];
    assert_eq!(arr, [1, 2, 3]);
    assert_eq!(arr.capacity(), 3);

    let arr = DynArr::from_elem(1, 0);
    assert!(arr.is_empty());
    assert_eq!(arr.capacity(), 0);
}

#[test]
fn dynarr_from_iter() {
    // The exact length is known, so the buffer is sized once
    let arr = (0..10).collect::<DynArr<i32>>();
    assert_eq!(arr.len(), 10);
    assert_eq!(arr.capacity(), 10);

    // Unknown length, elements are pushed one by one
    let arr = (0..10).filter(|x| x % 2 == 0).collect::<DynArr<i32>>();
    assert_eq!(arr, [0, 2, 4, 6, 8]);
    assert_eq!(arr.capacity(), 8);

    let arr: DynArr<i32> = DynArr::from([1, 2, 3]);
    assert_eq!(arr, [1, 2, 3]);
    let arr: DynArr<i32> = DynArr::from(&[4, 5][..]);
    assert_eq!(arr, [4, 5]);
}

#[test]
fn dynarr_reserve() {
    let mut arr = DynArr::<i32>::new();
    arr.reserve(21);
    assert_eq!(arr.capacity(), 21);

    arr.reserve(5);
    assert_eq!(arr.capacity(), 21);

    let mut arr = DynArr::<i32>::new();
    assert_eq!(arr.try_reserve(21), Ok(()));
    assert_eq!(arr.capacity(), 21);

    let max = arr.max_size();
    assert_eq!(max, isize::MAX as usize / 4);
    assert_eq!(arr.try_reserve(max + 1), Err(DynArrError::LengthError { requested: max + 1, max }));
    assert_eq!(arr.capacity(), 21);
}

#[test]
#[should_panic]
fn dynarr_reserve_too_much() {
    let mut arr = DynArr::<u64>::new();
    arr.reserve(usize::MAX);
}

#[test]
fn dynarr_push_and_access() {
    let mut arr = DynArr::<i32>::new();

    arr.push(42);
    assert_eq!(arr.capacity(), 1);
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0], 42);

    arr.push(84);
    assert_eq!(arr.capacity(), 2);
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[1], 84);

    let mut caps = DynArr::<usize>::new();
    for i in 0..7 {
        arr.push(i);
        caps.push(arr.capacity());
    }
    assert_eq!(caps, [4, 4, 8, 8, 8, 8, 16]);

    let mut arr = dynarr![1, 2, 3];
    assert_eq!(arr.push_within_capacity(4), Err(4));
    arr.reserve(4);
    assert_eq!(arr.push_within_capacity(4), Ok(()));
    assert_eq!(arr[3], 4);
}

#[test]
fn dynarr_reserve_and_push() {
    let mut arr = DynArr::<i32>::new();
    arr.reserve(10);
    assert_eq!(arr.capacity(), 10);

    arr.push(42);
    arr.push(84);
    assert_eq!(arr.capacity(), 10);
    assert_eq!(arr.len(), 2);
    assert_eq!(arr, [42, 84]);
}

#[test]
fn dynarr_growth_bound() {
    let mut arr = DynArr::<u32>::new();
    let mut reallocations = 0;
    let mut cap = arr.capacity();
    for i in 0..1000 {
        arr.push(i);
        if arr.capacity() != cap {
            assert!(arr.capacity() * 2 >= cap * 3);
            cap = arr.capacity();
            reallocations += 1;
        }
    }
    // ceil(log2(1000)) + 1
    assert!(reallocations <= 11);
}

#[test]
fn dynarr_at() {
    let mut arr = dynarr![1, 2, 3];
    assert_eq!(arr.at(1), Ok(&2));
    assert_eq!(arr.at(3), Err(DynArrError::OutOfRange { index: 3, len: 3 }));

    *arr.at_mut(0).unwrap() = 10;
    assert_eq!(arr[0], 10);
    assert!(arr.at_mut(5).is_err());

    for i in 0..arr.len() {
        assert_eq!(arr.at(i), Ok(&arr[i]));
    }
}

#[test]
fn dynarr_front_back() {
    let mut arr = dynarr![1, 2, 3];
    assert_eq!(*arr.front(), 1);
    assert_eq!(*arr.back(), 3);
    *arr.front_mut() = 4;
    *arr.back_mut() = 6;
    assert_eq!(arr, [4, 2, 6]);
    assert_eq!(arr.data(), arr.as_ptr());
}

#[test]
#[should_panic]
fn dynarr_front_empty() {
    let arr = DynArr::<i32>::new();
    arr.front();
}

#[test]
fn dynarr_shrink() {
    let mut arr = DynArr::<i32>::with_capacity(10);
    arr.extend([1, 2, 3]);
    arr.shrink_to(5);
    assert_eq!(arr.capacity(), 5);
    arr.shrink_to(1);
    assert_eq!(arr.capacity(), 3);

    let mut arr = DynArr::<i32>::with_capacity(10);
    arr.extend([1, 2, 3]);
    arr.shrink_to_fit();
    assert_eq!(arr.capacity(), 3);

    let epoch = arr.epoch;
    arr.shrink_to_fit();
    assert_eq!(arr.capacity(), 3);
    assert_eq!(arr.epoch, epoch);
    assert_eq!(arr, [1, 2, 3]);

    arr.clear();
    arr.shrink_to_fit();
    assert_eq!(arr.capacity(), 0);
}

#[test]
fn dynarr_insert() {
    let mut arr = dynarr![1, 2, 3];
    let pos = arr.insert(arr.begin() + 1, 9);
    assert_eq!(arr, [1, 9, 2, 3]);
    assert_eq!(pos.index(), 1);
    assert_eq!(arr.get_at(pos), Some(&9));

    let pos = arr.insert(arr.end(), 4);
    assert_eq!(arr, [1, 9, 2, 3, 4]);
    assert_eq!(pos.index(), 4);

    arr.insert(arr.begin(), 0);
    assert_eq!(arr, [0, 1, 9, 2, 3, 4]);

    let pos = arr.emplace(arr.begin() + 2, || 5);
    assert_eq!(arr[pos.index()], 5);

    *arr.emplace_back(|| 7) += 1;
    assert_eq!(*arr.back(), 8);
}

#[test]
fn dynarr_insert_n() {
    let mut arr = dynarr![1, 2, 3];
    let pos = arr.insert_n(arr.begin() + 1, 2, &9);
    assert_eq!(arr, [1, 9, 9, 2, 3]);
    assert_eq!(pos.index(), 1);
    // Doubling the capacity of 3 is enough for 5 elements
    assert_eq!(arr.capacity(), 6);

    arr.insert_n(arr.end(), 10, &0);
    assert_eq!(arr.len(), 15);
    // Doubling is not enough, so the exact requirement is used
    assert_eq!(arr.capacity(), 15);

    let before = arr.begin();
    let cap = arr.capacity();
    let pos = arr.insert_n(before, 0, &1);
    assert_eq!(pos, before);
    assert_eq!(arr.capacity(), cap);
    assert!(arr.is_valid(before));
}

#[test]
fn dynarr_insert_slice_and_iter() {
    let mut arr = dynarr![1, 2, 3];
    arr.reserve(10);
    let pos = arr.insert_slice(arr.begin() + 1, &[7, 8]);
    assert_eq!(arr, [1, 7, 8, 2, 3]);
    assert_eq!(pos.index(), 1);
    assert_eq!(arr.capacity(), 10);

    let pos = arr.insert_iter(arr.begin(), (4..7).filter(|x| x % 2 == 0));
    assert_eq!(arr, [4, 6, 1, 7, 8, 2, 3]);
    assert_eq!(pos.index(), 0);

    let end = arr.end();
    let pos = arr.insert_iter(end, core::iter::empty());
    assert_eq!(pos, end);

    arr.extend_from_slice(&[0, 0]);
    assert_eq!(arr.len(), 9);
    arr.extend(&[1, 1]);
    assert_eq!(arr, [4, 6, 1, 7, 8, 2, 3, 0, 0, 1, 1]);
}

#[test]
fn dynarr_erase() {
    let mut arr = dynarr![1, 2, 3, 4, 5];
    let next = arr.erase_range(arr.begin() + 1, arr.begin() + 3);
    assert_eq!(arr, [1, 4, 5]);
    assert_eq!(arr.len(), 3);
    assert_eq!(arr.capacity(), 5);
    assert_eq!(arr.get_at(next), Some(&4));

    let last = arr.begin() + 2;
    assert_eq!(arr.erase_range(arr.begin() + 2, last), last);
    assert_eq!(arr, [1, 4, 5]);

    let next = arr.erase(arr.begin());
    assert_eq!(arr, [4, 5]);
    assert_eq!(next, arr.begin());

    let next = arr.erase(arr.begin() + 1);
    assert_eq!(next, arr.end());
    assert_eq!(arr, [4]);
}

#[test]
#[should_panic]
fn dynarr_erase_end() {
    let mut arr = dynarr![1, 2, 3];
    arr.erase(arr.end());
}

#[test]
fn dynarr_erase_drops() {
    let drops = Rc::new(Cell::new(0));
    let mut arr = DynArr::new();
    for _ in 0..5 {
        arr.push(DropCounter(drops.clone()));
    }
    arr.erase_range(arr.begin(), arr.begin() + 3);
    assert_eq!(drops.get(), 3);
    arr.truncate(1);
    assert_eq!(drops.get(), 4);
    drop(arr);
    assert_eq!(drops.get(), 5);
}

#[test]
fn dynarr_remove() {
    let mut arr = dynarr![1, 2, 3, 4];
    assert_eq!(arr.remove(1), 2);
    assert_eq!(arr, [1, 3, 4]);
    assert_eq!(arr.swap_remove(0), 1);
    assert_eq!(arr, [4, 3]);
    assert_eq!(arr.pop(), Some(3));
    assert_eq!(arr.pop(), Some(4));
    assert_eq!(arr.pop(), None);
    assert_eq!(arr.capacity(), 4);
}

#[test]
fn dynarr_erase_if() {
    let mut arr = dynarr![1, 2, 3, 2, 5, 2];
    assert_eq!(arr.erase_value(&2), 3);
    assert_eq!(arr, [1, 3, 5]);

    assert_eq!(arr.erase_if(|x| *x > 2), 2);
    assert_eq!(arr, [1]);

    let mut arr = dynarr![1, 2, 3, 4, 5];
    let keep = [false, true, true, false, true];
    let mut iter = keep.iter();
    arr.retain(|_| *iter.next().unwrap());
    assert_eq!(arr, [2, 3, 5]);

    arr.retain_mut(|x| if *x <= 3 {
        *x += 1;
        true
    } else {
        false
    });
    assert_eq!(arr, [3, 4]);
}

#[test]
fn dynarr_resize() {
    let mut arr = dynarr![1, 2, 3];
    arr.resize(6, 5);
    assert_eq!(arr, [1, 2, 3, 5, 5, 5]);
    assert_eq!(arr.capacity(), 6);

    arr.resize(2, 5);
    assert_eq!(arr, [1, 2]);
    assert_eq!(arr.capacity(), 6);

    arr.resize(2, 0);
    assert_eq!(arr, [1, 2]);

    let mut counter = 0;
    arr.resize_with(4, || {
        counter += 1;
        counter * 10
    });
    assert_eq!(arr, [1, 2, 10, 20]);

    arr.resize_default(5);
    assert_eq!(arr, [1, 2, 10, 20, 0]);

    let max = arr.max_size();
    assert!(matches!(arr.try_resize(max + 1, 0), Err(DynArrError::LengthError { .. })));
    assert_eq!(arr.len(), 5);
}

#[test]
fn dynarr_assign() {
    let mut arr = dynarr![1, 2, 3];
    arr.assign(2, &7);
    assert_eq!(arr, [7, 7]);

    arr.assign_slice(&[1, 2, 3, 4]);
    assert_eq!(arr, [1, 2, 3, 4]);

    arr.assign_iter((0..3).map(|x| x * 2));
    assert_eq!(arr, [0, 2, 4]);

    let source = dynarr![9, 8];
    arr.clone_from(&source);
    assert_eq!(arr, source);

    let copy = arr.clone();
    assert_eq!(copy, arr);
    assert_eq!(copy.capacity(), copy.len());
}

#[test]
fn dynarr_take_and_move() {
    let mut arr = dynarr![1, 2, 3];
    let ptr = arr.as_ptr();
    let taken = arr.take();
    assert_eq!(taken, [1, 2, 3]);
    assert_eq!(taken.as_ptr(), ptr);
    assert!(arr.is_empty());
    assert_eq!(arr.capacity(), 0);

    let mut dst = dynarr![4];
    let mut src = taken;
    dst.move_assign(&mut src);
    assert_eq!(dst, [1, 2, 3]);
    assert_eq!(dst.as_ptr(), ptr);
    assert!(src.is_empty());
    assert_eq!(src.capacity(), 0);

    let taken = dst.take_in(Mallocator);
    assert_eq!(taken, [1, 2, 3]);
    assert!(dst.is_empty());
}

#[test]
fn dynarr_swap() {
    let mut a = dynarr![1, 2, 3];
    let mut b = dynarr![4];
    let (a_ptr, b_ptr) = (a.as_ptr(), b.as_ptr());
    a.swap_with(&mut b);
    assert_eq!(a, [4]);
    assert_eq!(b, [1, 2, 3]);
    assert_eq!(a.as_ptr(), b_ptr);
    assert_eq!(b.as_ptr(), a_ptr);
    assert_eq!(a.capacity(), 1);
    assert_eq!(b.capacity(), 3);

    // The slice method is still reachable
    b.swap(0, 2);
    assert_eq!(b, [3, 2, 1]);
}

#[test]
fn dynarr_cursor_invalidation() {
    let mut arr = dynarr![1, 2, 3];
    let cursor = arr.begin();
    assert!(arr.is_valid(cursor));

    // The capacity is exhausted, so this reallocates
    arr.push(4);
    assert!(!arr.is_valid(cursor));
    assert_eq!(arr.get_at(cursor), None);
    assert_ne!(cursor, arr.begin());

    let mut other = dynarr![5];
    let cursor = arr.begin();
    arr.swap_with(&mut other);
    assert!(!arr.is_valid(cursor));

    let cursor = arr.end();
    arr.assign(1, &0);
    assert!(!arr.is_valid(cursor));
}

#[test]
fn dynarr_epoch_wraps() {
    let mut arr = dynarr![1];
    arr.epoch = u32::MAX;
    let cursor = arr.begin();

    arr.push(2);
    assert_eq!(arr.epoch, 0);
    assert!(!arr.is_valid(cursor));
    assert!(arr.is_valid(arr.begin()));
    assert_eq!(arr.get_at(arr.begin() + 1), Some(&2));
}

#[test]
fn dynarr_retain_panicking_predicate() {
    let mut arr = dynarr![1, 2, 3, 4, 5];
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        arr.retain(|&v| {
            if v == 4 {
                panic!("predicate failed");
            }
            v % 2 == 1
        })
    }));
    assert!(result.is_err());
    assert_eq!(arr, [1, 3, 4, 5]);
    assert_eq!(arr.capacity(), 5);

    arr.retain(|&v| v != 4);
    assert_eq!(arr, [1, 3, 5]);
}

#[test]
fn dynarr_cursor_shifts() {
    let mut arr = dynarr![1, 2, 3, 4];
    arr.reserve(10);
    let cursor = arr.begin() + 2;
    assert_eq!(arr.get_at(cursor), Some(&3));

    // No reallocation, so the cursor stays valid, but now refers to the shifted-in element
    arr.insert(arr.begin(), 0);
    assert!(arr.is_valid(cursor));
    assert_eq!(arr.get_at(cursor), Some(&2));

    arr.erase(arr.begin());
    assert_eq!(arr.get_at(cursor), Some(&3));

    if let Some(value) = arr.get_at_mut(cursor) {
        *value = 30;
    }
    assert_eq!(arr, [1, 2, 30, 4]);
}

#[test]
#[should_panic]
fn dynarr_stale_cursor_insert() {
    let mut arr = dynarr![1];
    let cursor = arr.begin();
    arr.push(2);
    arr.insert(cursor, 0);
}

#[test]
fn dynarr_cursor_iteration() {
    let arr = dynarr![1, 2, 3, 4];
    assert_eq!(arr.end() - arr.begin(), 4);
    assert_eq!(arr.get_at(arr.begin() + 3), Some(&4));
    assert_eq!(arr.get_at(arr.end()), None);
    assert_eq!(arr.cursor_slice(arr.begin() + 1, arr.end()), &[2, 3, 4]);

    let mut reversed = DynArr::new();
    let mut cur = arr.rbegin();
    while cur != arr.rend() {
        reversed.push(*arr.get_rev(cur).unwrap());
        cur += 1;
    }
    assert_eq!(reversed, [4, 3, 2, 1]);
    assert_eq!(arr.get_rev(arr.rend()), None);
    assert_eq!(arr.rend() - arr.rbegin(), 4);

    // Iteration can be restarted
    assert_eq!(arr.iter().sum::<i32>(), 10);
    assert_eq!(arr.iter().sum::<i32>(), 10);
    assert_eq!(arr.iter().rev().copied().collect::<DynArr<_>>(), [4, 3, 2, 1]);
}

#[test]
fn dynarr_into_iter() {
    let arr = dynarr![1, 2, 3, 4];
    let mut iter = arr.into_iter();
    assert_eq!(iter.len(), 4);
    assert_eq!(iter.next(), Some(1));
    assert_eq!(iter.next_back(), Some(4));
    assert_eq!(iter.as_slice(), &[2, 3]);
    assert_eq!(iter.clone().collect::<DynArr<_>>(), [2, 3]);
    assert_eq!(iter.next(), Some(2));
    assert_eq!(iter.next(), Some(3));
    assert_eq!(iter.next(), None);

    let drops = Rc::new(Cell::new(0));
    let mut arr = DynArr::new();
    for _ in 0..4 {
        arr.push(DropCounter(drops.clone()));
    }
    let mut iter = arr.into_iter();
    drop(iter.next());
    assert_eq!(drops.get(), 1);
    drop(iter);
    assert_eq!(drops.get(), 4);

    let mut arr = dynarr![1, 2];
    for value in &mut arr {
        *value *= 2;
    }
    let mut sum = 0;
    for value in &arr {
        sum += value;
    }
    assert_eq!(sum, 6);
}

#[test]
fn dynarr_zero_sized() {
    let mut arr = DynArr::<()>::new();
    assert_eq!(arr.capacity(), usize::MAX);
    for _ in 0..10 {
        arr.push(());
    }
    assert_eq!(arr.len(), 10);
    assert_eq!(arr.capacity(), usize::MAX);
    arr.shrink_to_fit();
    assert_eq!(arr.capacity(), usize::MAX);
    arr.insert_n(arr.begin(), 5, &());
    assert_eq!(arr.len(), 15);
    assert_eq!(arr.into_iter().count(), 15);
}

#[test]
fn dynarr_comparison() {
    let a = dynarr![1, 2, 3];
    let b = dynarr![1, 2, 4];
    assert!(a < b);
    assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    assert_eq!(a, &[1, 2, 3][..]);
    assert_eq!([1, 2, 3], a);
    assert_ne!(a, b);
    assert_eq!(format!("{a:?}"), "[1, 2, 3]");

    use std::collections::hash_map::DefaultHasher;
    let hash = |arr: &DynArr<i32>| {
        let mut hasher = DefaultHasher::new();
        arr.hash(&mut hasher);
        hasher.finish()
    };
    assert_eq!(hash(&a), hash(&a.clone()));
}
