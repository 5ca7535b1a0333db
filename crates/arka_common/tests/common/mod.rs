//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::{
    alloc::Layout,
    cell::Cell,
    panic::{self, AssertUnwindSafe},
    ptr::NonNull,
    rc::Rc,
    sync::Arc,
};

use arka_common::alloc::{Allocator, Mallocator};
use parking_lot::Mutex;

/// Bookkeeping shared between all clones of a [`CountingAlloc`].
#[derive(Debug, Default)]
pub struct AllocStats {
    pub allocs:     usize,
    pub deallocs:   usize,
    pub live_bytes: usize,
    /// Number of allocations that still succeed, `None` for no limit.
    pub budget:     Option<usize>,
}

/// A stateful allocator forwarding to the global heap, which counts its allocations and can be told to fail.
///
/// Clones share their stats and compare equal, independently created allocators don't.
/// `PROPAGATE` controls both propagation constants.
#[derive(Debug)]
pub struct CountingAlloc<const PROPAGATE: bool = false> {
    stats: Arc<Mutex<AllocStats>>,
}

impl<const PROPAGATE: bool> CountingAlloc<PROPAGATE> {
    pub fn new() -> Self {
        Self { stats: Arc::new(Mutex::new(AllocStats::default())) }
    }

    pub fn allocs(&self) -> usize {
        self.stats.lock().allocs
    }

    pub fn deallocs(&self) -> usize {
        self.stats.lock().deallocs
    }

    pub fn live_bytes(&self) -> usize {
        self.stats.lock().live_bytes
    }

    /// Let the next `count` allocations succeed, and fail every allocation after that.
    pub fn fail_after(&self, count: usize) {
        self.stats.lock().budget = Some(count);
    }

    pub fn stop_failing(&self) {
        self.stats.lock().budget = None;
    }
}

impl<const PROPAGATE: bool> Clone for CountingAlloc<PROPAGATE> {
    fn clone(&self) -> Self {
        Self { stats: self.stats.clone() }
    }
}

impl<const PROPAGATE: bool> PartialEq for CountingAlloc<PROPAGATE> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.stats, &other.stats)
    }
}

impl<const PROPAGATE: bool> Allocator for CountingAlloc<PROPAGATE> {
    const PROPAGATE_ON_MOVE_ASSIGN: bool = PROPAGATE;
    const PROPAGATE_ON_SWAP: bool = PROPAGATE;

    unsafe fn alloc(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        let mut stats = self.stats.lock();
        match stats.budget {
            Some(0) => return None,
            Some(ref mut budget) => *budget -= 1,
            None => {},
        }
        let ptr = Mallocator.alloc(layout)?;
        stats.allocs += 1;
        stats.live_bytes += layout.size();
        Some(ptr)
    }

    unsafe fn dealloc(&mut self, ptr: NonNull<u8>, layout: Layout) {
        let mut stats = self.stats.lock();
        stats.deallocs += 1;
        stats.live_bytes -= layout.size();
        Mallocator.dealloc(ptr, layout);
    }

    /// Copies get an allocator of their own.
    fn select_on_copy(&self) -> Self {
        Self::new()
    }
}

/// An element that panics when cloned once its shared fuse runs out, and tracks how many instances are alive.
#[derive(Debug)]
pub struct Bomb {
    pub value: i32,
    fuse:      Rc<Cell<usize>>,
    live:      Rc<Cell<isize>>,
}

/// Creates [`Bomb`]s sharing a fuse and a live counter.
pub struct BombFactory {
    pub fuse: Rc<Cell<usize>>,
    pub live: Rc<Cell<isize>>,
}

impl BombFactory {
    pub fn new() -> Self {
        Self { fuse: Rc::new(Cell::new(usize::MAX)), live: Rc::new(Cell::new(0)) }
    }

    pub fn make(&self, value: i32) -> Bomb {
        self.live.set(self.live.get() + 1);
        Bomb { value, fuse: self.fuse.clone(), live: self.live.clone() }
    }

    /// Allow `clones` more clones, the clone after that panics.
    pub fn arm(&self, clones: usize) {
        self.fuse.set(clones);
    }

    pub fn disarm(&self) {
        self.fuse.set(usize::MAX);
    }

    pub fn live(&self) -> isize {
        self.live.get()
    }
}

impl Clone for Bomb {
    fn clone(&self) -> Self {
        let fuse = self.fuse.get();
        if fuse == 0 {
            panic!("bomb {} went off while being cloned", self.value);
        }
        self.fuse.set(fuse - 1);
        self.live.set(self.live.get() + 1);
        Bomb { value: self.value, fuse: self.fuse.clone(), live: self.live.clone() }
    }
}

impl Drop for Bomb {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

impl PartialEq<i32> for Bomb {
    fn eq(&self, other: &i32) -> bool {
        self.value == *other
    }
}

/// Run `f`, expecting it to panic.
pub fn expect_panic<F: FnOnce()>(f: F) {
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    assert!(result.is_err(), "expected a panic");
}
