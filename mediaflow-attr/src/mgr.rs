//! Pooled dictionary manager
//!
//! Dictionary buffers are recycled through a LIFO pool to keep allocator
//! traffic low when dictionaries are allocated and dropped at frame rate.

use std::sync::{Arc, Mutex};

use crate::dict::Dict;
use crate::types::AttrType;

/// Default minimal buffer size of a dictionary.
pub const DICT_MIN_SIZE: usize = 128;
/// Default extra space added when a dictionary buffer is expanded.
pub const DICT_EXTRA_SIZE: usize = 64;

/// Manager handle. Clones share the same pool; the pool is destroyed when the
/// last handle and the last outstanding dictionary are dropped.
#[derive(Clone)]
pub struct DictMgr {
    inner: Arc<Inner>,
}

struct Inner {
    min_size: usize,
    extra_size: usize,
    pool_depth: usize,
    pool: Mutex<Vec<Vec<u8>>>,
}

impl DictMgr {
    /// Create a manager with default minimum size and grow headroom.
    pub fn new(pool_depth: usize) -> Self {
        Self::with_sizes(pool_depth, DICT_MIN_SIZE, DICT_EXTRA_SIZE)
    }

    /// Create a manager with explicit minimum size and grow headroom.
    pub fn with_sizes(pool_depth: usize, min_size: usize, extra_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                min_size: min_size.max(1),
                extra_size,
                pool_depth,
                pool: Mutex::new(Vec::with_capacity(pool_depth)),
            }),
        }
    }

    /// Allocate a dictionary with space for at least `hint_size` bytes of
    /// attributes, reusing a pooled buffer when one is available.
    pub fn alloc(&self, hint_size: usize) -> Dict {
        let want = hint_size.max(self.inner.min_size);
        let mut buf = self.lock_pool().pop().unwrap_or_default();
        if buf.len() < want {
            buf.resize(want, 0);
        }
        buf[0] = AttrType::End as u8;
        Dict::from_raw(self.clone(), buf)
    }

    /// Release every buffer currently kept in the pool.
    pub fn vacuum(&self) {
        self.lock_pool().clear();
    }

    pub(crate) fn extra_size(&self) -> usize {
        self.inner.extra_size
    }

    pub(crate) fn recycle(&self, buf: Vec<u8>) {
        if buf.is_empty() {
            return;
        }
        let mut pool = self.lock_pool();
        if pool.len() < self.inner.pool_depth {
            pool.push(buf);
        }
    }

    fn lock_pool(&self) -> std::sync::MutexGuard<'_, Vec<Vec<u8>>> {
        // A poisoned pool only holds recyclable buffers, keep using it.
        self.inner.pool.lock().unwrap_or_else(|err| err.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_respects_min_size() {
        let mgr = DictMgr::new(2);
        let dict = mgr.alloc(0);
        assert!(dict.capacity() >= DICT_MIN_SIZE);
        assert_eq!(dict.size(), 1);
    }

    #[test]
    fn test_alloc_respects_hint() {
        let mgr = DictMgr::new(2);
        let dict = mgr.alloc(4096);
        assert!(dict.capacity() >= 4096);
    }

    #[test]
    fn test_pool_reuse_is_lifo() {
        let mgr = DictMgr::with_sizes(2, 16, 8);
        let first = mgr.alloc(100);
        let second = mgr.alloc(200);
        let first_cap = first.capacity();
        let second_cap = second.capacity();
        drop(first);
        drop(second);
        // The last returned buffer comes back first. Keep the reallocated
        // dictionaries alive so they do not slip back into the pool.
        let reused_second = mgr.alloc(0);
        let reused_first = mgr.alloc(0);
        assert_eq!(reused_second.capacity(), second_cap);
        assert_eq!(reused_first.capacity(), first_cap);
    }

    #[test]
    fn test_pool_depth_bounds_retention() {
        let mgr = DictMgr::with_sizes(1, 16, 8);
        let a = mgr.alloc(300);
        let b = mgr.alloc(400);
        drop(a);
        drop(b); // pool full, buffer discarded
        let reused = mgr.alloc(0);
        let fresh = mgr.alloc(0);
        assert_eq!(reused.capacity(), 300);
        assert_eq!(fresh.capacity(), 16);
    }

    #[test]
    fn test_vacuum_drains_pool() {
        let mgr = DictMgr::with_sizes(4, 16, 8);
        drop(mgr.alloc(500));
        mgr.vacuum();
        assert_eq!(mgr.alloc(0).capacity(), 16);
    }
}
