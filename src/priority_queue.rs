// An owning priority queue on top of the paged heap primitives.

use std::fmt::Debug;

use crate::heap::PagedHeap;

/// A growable max-priority queue over a paged heap with fanout `D` and `P`
/// chunks per page.
///
/// The queue owns its elements: `pop` hands them back one at a time and
/// dropping the queue drops everything still held, so element cleanup is
/// ordinary drop glue and runs exactly once per element.
///
/// The comparator `F` is any strict weak ordering; the element with no
/// greater element under it is served first.
///
/// ```
/// use paged_heap::priority_queue::PriorityQueue;
///
/// let mut q = PriorityQueue::<u32, _, 4, 1>::from_vec(vec![5, 1, 4, 2, 3], |a, b| a < b);
/// assert_eq!(q.pop(), Some(5));
/// q.push(6);
/// assert_eq!(q.pop(), Some(6));
/// assert_eq!(q.len(), 3);
/// ```
pub struct PriorityQueue<T, F, const D: usize = 2, const P: usize = 1> {
    data: Vec<T>,
    less: F,
}

/// A [`PriorityQueue`] ordering its elements by `Ord`.
pub type MaxQueue<T, const D: usize = 2, const P: usize = 1> =
    PriorityQueue<T, fn(&T, &T) -> bool, D, P>;

impl<T, F, const D: usize, const P: usize> PriorityQueue<T, F, D, P>
where
    F: FnMut(&T, &T) -> bool,
{
    /// An empty queue using `less` for ordering.
    pub fn new(less: F) -> Self {
        debug_assert!(D >= 1 && P >= 1, "heap shape constants must be positive");
        Self {
            data: Vec::new(),
            less,
        }
    }

    pub fn with_capacity(capacity: usize, less: F) -> Self {
        debug_assert!(D >= 1 && P >= 1, "heap shape constants must be positive");
        Self {
            data: Vec::with_capacity(capacity),
            less,
        }
    }

    /// Takes ownership of `data` and heapifies it in place.
    pub fn from_vec(data: Vec<T>, less: F) -> Self {
        let mut queue = Self { data, less };
        PagedHeap::<D, P>::make_heap_by(&mut queue.data, &mut queue.less);
        queue
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The current maximum, if any.
    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    /// Inserts `item`.
    pub fn push(&mut self, item: T) {
        self.data.push(item);
        PagedHeap::<D, P>::push_heap_by(&mut self.data, &mut self.less);
    }

    /// Removes and returns the maximum, or `None` on an empty queue.
    pub fn pop(&mut self) -> Option<T> {
        if self.data.is_empty() {
            return None;
        }
        PagedHeap::<D, P>::pop_heap_by(&mut self.data, &mut self.less);
        self.data.pop()
    }

    /// Drops all elements.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// The underlying buffer, in heap order.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// The underlying buffer, sorted ascending.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        PagedHeap::<D, P>::sort_heap_by(&mut self.data, &mut self.less);
        self.data
    }
}

impl<T: Ord, const D: usize, const P: usize> PriorityQueue<T, fn(&T, &T) -> bool, D, P> {
    /// An empty queue ordering by `Ord`.
    pub fn new_ord() -> Self {
        Self::new(T::lt)
    }

    /// Heapifies `data` into a queue ordering by `Ord`.
    pub fn from_vec_ord(data: Vec<T>) -> Self {
        Self::from_vec(data, T::lt)
    }
}

impl<T: Ord, const D: usize, const P: usize> Default for PriorityQueue<T, fn(&T, &T) -> bool, D, P> {
    fn default() -> Self {
        Self::new_ord()
    }
}

impl<T: Ord, const D: usize, const P: usize> FromIterator<T>
    for PriorityQueue<T, fn(&T, &T) -> bool, D, P>
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec_ord(iter.into_iter().collect())
    }
}

impl<T, F, const D: usize, const P: usize> Extend<T> for PriorityQueue<T, F, D, P>
where
    F: FnMut(&T, &T) -> bool,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T: Debug, F, const D: usize, const P: usize> Debug for PriorityQueue<T, F, D, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn interleaved_push_pop() {
        let mut q = MaxQueue::<u32, 2, 1>::from_vec_ord(vec![5, 1, 4, 2, 3]);
        assert_eq!(q.pop(), Some(5));
        q.push(6);
        assert_eq!(q.pop(), Some(6));
        assert_eq!(q.pop(), Some(4));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn pops_come_out_non_increasing() {
        let mut q = MaxQueue::<u32, 3, 2>::new_ord();
        for x in [4u32, 9, 1, 9, 0, 7, 3] {
            q.push(x);
        }
        assert_eq!(q.len(), 7);
        assert_eq!(q.peek(), Some(&9));
        let mut out = Vec::new();
        while let Some(x) = q.pop() {
            out.push(x);
        }
        assert_eq!(out, [9, 9, 7, 4, 3, 1, 0]);
    }

    #[test]
    fn custom_comparator_makes_a_min_queue() {
        let mut q = PriorityQueue::<u32, _, 4, 1>::new(|a: &u32, b: &u32| b < a);
        q.extend([4u32, 9, 1, 7]);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(4));
        assert_eq!(q.pop(), Some(7));
        assert_eq!(q.pop(), Some(9));
    }

    #[test]
    fn into_sorted_vec_sorts() {
        let q: MaxQueue<u32, 2, 2> = [3u32, 1, 4, 1, 5, 9, 2, 6].into_iter().collect();
        assert_eq!(q.into_sorted_vec(), [1, 1, 2, 3, 4, 5, 6, 9]);
    }

    #[test]
    fn empty_queue_behaves() {
        let mut q = MaxQueue::<u32, 2, 1>::new_ord();
        assert!(q.is_empty());
        assert_eq!(q.peek(), None);
        assert_eq!(q.pop(), None);
    }

    #[derive(Clone)]
    struct Tracked {
        key: u32,
        drops: Arc<AtomicUsize>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn every_element_is_dropped_exactly_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let make = |key| Tracked {
            key,
            drops: Arc::clone(&drops),
        };

        let mut q = PriorityQueue::<Tracked, _, 3, 1>::new(|a: &Tracked, b: &Tracked| a.key < b.key);
        for key in 0..10 {
            q.push(make(key));
        }
        // Popped elements leave the queue and are dropped by the caller.
        let popped = q.pop().unwrap();
        assert_eq!(popped.key, 9);
        drop(popped);
        assert_eq!(drops.load(Ordering::Relaxed), 1);

        // Dropping the queue releases everything still held.
        drop(q);
        assert_eq!(drops.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn from_vec_heapifies() {
        let q = PriorityQueue::<u32, _, 2, 2>::from_vec(vec![2, 8, 5, 1, 9, 3], |a, b| a < b);
        assert_eq!(q.peek(), Some(&9));
        let heaped = q.into_vec();
        assert!(crate::heap::PagedHeap::<2, 2>::is_heap(&heaped));
    }
}
