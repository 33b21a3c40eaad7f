//! Heap region of the tape: first-fit allocation over a sorted free list.
//!
//! The free list and the allocation map partition `[0, heap_high)`. The list
//! is re-sorted and merged after every insertion, and a free block that ends
//! at `heap_high` pulls the high-water mark back down.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct HeapAlloc {
    /// `(start, length)`, sorted by start, adjacent blocks merged.
    free_list: Vec<(i32, i32)>,
    /// start -> length of live allocations.
    alloc_map: HashMap<i32, i32>,
    heap_high: i32,
}

impl HeapAlloc {
    pub fn new() -> Self {
        Self::default()
    }

    /// First-fit allocation; extends the heap when no free block is large
    /// enough. Ties between equal-length blocks go to the lower address
    /// because the list is sorted.
    pub fn alloc(&mut self, count: i32) -> i32 {
        if count <= 0 {
            return self.heap_high;
        }

        for i in 0..self.free_list.len() {
            let (start, len) = self.free_list[i];
            if len >= count {
                if len == count {
                    self.free_list.remove(i);
                } else {
                    self.free_list[i] = (start + count, len - count);
                }
                self.alloc_map.insert(start, count);
                return start;
            }
        }

        let start = self.heap_high;
        self.heap_high += count;
        self.alloc_map.insert(start, count);
        start
    }

    /// Release a previous allocation. Returns the freed length, or `None`
    /// when `addr` is not a live allocation start.
    pub fn free(&mut self, addr: i32) -> Option<i32> {
        let len = self.alloc_map.remove(&addr)?;
        self.add_free_block(addr, len);
        Some(len)
    }

    fn add_free_block(&mut self, start: i32, len: i32) {
        if len <= 0 {
            return;
        }
        self.free_list.push((start, len));
        self.free_list.sort_unstable_by_key(|&(s, _)| s);

        let mut merged: Vec<(i32, i32)> = Vec::with_capacity(self.free_list.len());
        for &(s, l) in &self.free_list {
            match merged.last_mut() {
                Some((ms, ml)) if s <= *ms + *ml => {
                    let end = (*ms + *ml).max(s + l);
                    *ml = end - *ms;
                }
                _ => merged.push((s, l)),
            }
        }
        self.free_list = merged;

        if let Some(&(s, l)) = self.free_list.last()
            && s + l == self.heap_high
        {
            self.heap_high = s;
            self.free_list.pop();
        }
    }

    pub fn heap_high(&self) -> i32 {
        self.heap_high
    }

    pub fn free_list(&self) -> &[(i32, i32)] {
        &self.free_list
    }

    pub fn live_allocations(&self) -> usize {
        self.alloc_map.len()
    }

    pub fn reset(&mut self) {
        self.free_list.clear();
        self.alloc_map.clear();
        self.heap_high = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_allocations_grow_upward() {
        let mut heap = HeapAlloc::new();
        assert_eq!(heap.alloc(1), 0);
        assert_eq!(heap.alloc(2), 1);
        assert_eq!(heap.alloc(1), 3);
        assert_eq!(heap.heap_high(), 4);
    }

    #[test]
    fn first_fit_reuses_lowest_hole() {
        let mut heap = HeapAlloc::new();
        let a = heap.alloc(1);
        let b = heap.alloc(1);
        let c = heap.alloc(1);
        let _ = heap.alloc(1); // keep the heap occupied above c
        heap.free(a);
        heap.free(c);
        // two one-cell holes at 0 and 2: first fit picks the lower
        assert_eq!(heap.alloc(1), a);
        assert_eq!(heap.alloc(1), c);
        let _ = b;
    }

    #[test]
    fn free_blocks_coalesce() {
        let mut heap = HeapAlloc::new();
        let a = heap.alloc(1);
        let b = heap.alloc(1);
        let c = heap.alloc(1);
        let _top = heap.alloc(1);
        heap.free(a);
        heap.free(c);
        assert_eq!(heap.free_list().len(), 2);
        heap.free(b);
        // holes 0..1, 1..2, 2..3 merge into 0..3
        assert_eq!(heap.free_list(), &[(0, 3)]);
        // a 3-cell request now fits in the merged hole
        assert_eq!(heap.alloc(3), 0);
    }

    #[test]
    fn top_free_pulls_heap_high_down() {
        let mut heap = HeapAlloc::new();
        let a = heap.alloc(2);
        let b = heap.alloc(3);
        heap.free(b);
        assert_eq!(heap.heap_high(), 2);
        heap.free(a);
        assert_eq!(heap.heap_high(), 0);
        assert!(heap.free_list().is_empty());
    }

    #[test]
    fn balanced_alloc_free_returns_to_empty() {
        let mut heap = HeapAlloc::new();
        let addrs: Vec<_> = (0..8).map(|i| heap.alloc(i % 3 + 1)).collect();
        // free in a scrambled order
        for &i in &[3usize, 0, 7, 5, 1, 6, 2, 4] {
            assert!(heap.free(addrs[i]).is_some());
        }
        assert_eq!(heap.heap_high(), 0);
        assert!(heap.free_list().is_empty());
        assert_eq!(heap.live_allocations(), 0);
    }

    #[test]
    fn double_free_is_detected() {
        let mut heap = HeapAlloc::new();
        let a = heap.alloc(1);
        assert!(heap.free(a).is_some());
        assert!(heap.free(a).is_none());
        assert!(heap.free(99).is_none());
    }

    #[test]
    fn zero_count_is_noop() {
        let mut heap = HeapAlloc::new();
        assert_eq!(heap.alloc(0), 0);
        assert_eq!(heap.heap_high(), 0);
        assert_eq!(heap.live_allocations(), 0);
    }
}
