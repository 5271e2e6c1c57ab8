// Paged d-ary max-heap primitives over caller-owned slices.
//
// Every operation works on the heap window `a[0..heap_size]` that the caller
// passes in as a slice. Operations that export an element (`pop_heap`,
// `remove_from_heap`) write it into the last slot of the slice and leave a
// valid heap in the prefix, so the caller can shrink the window by one and
// keep going.
//
// The layout is controlled by two shape constants. `D` is the fanout. `P`
// groups chunks of `D` siblings into pages of `D * P` contiguous slots so
// that a parent and its children usually share a page (see `crate::index`).
// `P = 1` is the classical d-ary heap.

use core::mem::ManuallyDrop;
use core::ptr;

use crate::index::{child_index, parent_index};

/// Max-heap operations for the paged layout with fanout `D` and `P` chunks
/// per page.
///
/// All functions ordering by `Ord` have a `*_by` twin taking a strict-weak
/// ordering `less` closure; min-heap behavior is obtained by inverting it.
///
/// ```
/// use paged_heap::heap::PagedHeap;
///
/// let mut a = [5, 2, 9, 1, 5, 6];
/// PagedHeap::<4, 2>::make_heap(&mut a);
/// assert!(PagedHeap::<4, 2>::is_heap(&a));
/// PagedHeap::<4, 2>::sort_heap(&mut a);
/// assert_eq!(a, [1, 2, 5, 5, 6, 9]);
/// ```
pub struct PagedHeap<const D: usize = 2, const P: usize = 1>;

impl<const D: usize, const P: usize> PagedHeap<D, P> {
    pub const FANOUT: usize = D;
    pub const PAGE_CHUNKS: usize = P;
    pub const PAGE_SIZE: usize = D * P;

    /// Returns the smallest index `k` such that `a[0..k]` is a valid heap
    /// and either `k == a.len()` or the edge ending at `k` violates order.
    pub fn is_heap_until_by<T, F>(a: &[T], mut less: F) -> usize
    where
        F: FnMut(&T, &T) -> bool,
    {
        debug_assert!(D >= 1 && P >= 1);

        let n = a.len();
        if n < 2 {
            return n;
        }

        // Walk page by page: the first chunk of each page hangs off a node
        // in an earlier page, the remaining chunks off in-page parents.
        let mut b = 1;
        loop {
            let page_parent = parent_index::<D, P>(b);
            let count = D.min(n - b);
            for i in 0..count {
                if less(&a[page_parent], &a[b + i]) {
                    return b + i;
                }
            }

            if P > 1 {
                let mut rel_child = D;
                let mut rel_parent = 0;
                while rel_child < Self::PAGE_SIZE && b + rel_child < n {
                    let count = D.min(n - (b + rel_child));
                    for i in 0..count {
                        if less(&a[b + rel_parent], &a[b + rel_child + i]) {
                            return b + rel_child + i;
                        }
                    }
                    rel_child += D;
                    rel_parent += 1;
                }
            }

            b += Self::PAGE_SIZE;
            if b >= n {
                return n;
            }
        }
    }

    /// Whether the whole slice is a valid max-heap.
    pub fn is_heap_by<T, F>(a: &[T], less: F) -> bool
    where
        F: FnMut(&T, &T) -> bool,
    {
        Self::is_heap_until_by(a, less) == a.len()
    }

    /// Reorders the slice into a valid max-heap.
    ///
    /// Sifts down from high indices. For `P > 1` the leaf slots are visited
    /// too; the paged layout has no cheap leaf test.
    pub fn make_heap_by<T, F>(a: &mut [T], mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        let n = a.len();
        if n > 1 {
            let mut i = if P == 1 { (n - 2) / D } else { n - 2 };
            loop {
                // SAFETY: i < n, and the hole is dropped before the next one
                // is created.
                let mut hole = unsafe { Hole::new(a, i) };
                Self::sift_down(&mut hole, &mut less);
                drop(hole);
                if i == 0 {
                    break;
                }
                i -= 1;
            }
        }

        Self::verify_heap(a, &mut less);
    }

    /// Pushes `a[n-1]` into the heap `a[0..n-1]`.
    pub fn push_heap_by<T, F>(a: &mut [T], mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        let n = a.len();
        debug_assert!(n > 0, "push_heap needs the pushed item in the slice");
        Self::verify_heap(&a[..n - 1], &mut less);

        if n > 1 {
            // SAFETY: n - 1 < n.
            let mut hole = unsafe { Hole::new(a, n - 1) };
            Self::sift_up(&mut hole, 0, &mut less);
        }

        Self::verify_heap(a, &mut less);
    }

    /// Moves the maximum into `a[n-1]` and restores the heap `a[0..n-1]`.
    ///
    /// A two-element heap is handled by a plain swap.
    ///
    /// ```
    /// use paged_heap::PagedHeap;
    ///
    /// let mut a = [9, 5, 7, 1];
    /// assert!(PagedHeap::<2, 1>::is_heap(&a));
    /// PagedHeap::<2, 1>::pop_heap(&mut a);
    /// assert_eq!(a[3], 9);
    /// assert!(PagedHeap::<2, 1>::is_heap(&a[..3]));
    /// ```
    pub fn pop_heap_by<T, F>(a: &mut [T], mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        let n = a.len();
        debug_assert!(n > 0, "pop_heap needs a non-empty heap");
        Self::verify_heap(a, &mut less);

        if n > 2 {
            Self::pop_max_item(a, n - 1, &mut less);
        } else if n == 2 {
            a.swap(0, 1);
        }

        Self::verify_heap(&a[..n - 1], &mut less);
    }

    /// Sorts a valid max-heap ascending, in place.
    pub fn sort_heap_by<T, F>(a: &mut [T], mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        let n = a.len();
        let mut i = n;
        while i > 2 {
            Self::pop_max_item(a, i - 1, &mut less);
            i -= 1;
        }
        if n > 1 {
            a.swap(0, 1);
        }
    }

    /// Exchanges `*item` with the maximum `a[0]` and re-sifts the incoming
    /// item down, yielding the old maximum to the caller.
    pub fn swap_max_item_by<T, F>(a: &mut [T], item: &mut T, mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        let n = a.len();
        debug_assert!(n > 0, "swap_max_item needs a non-empty heap");
        Self::verify_heap(a, &mut less);

        core::mem::swap(item, &mut a[0]);
        if n > 1 {
            // SAFETY: 0 < n.
            let mut hole = unsafe { Hole::new(a, 0) };
            Self::sift_down(&mut hole, &mut less);
        }

        Self::verify_heap(a, &mut less);
    }

    /// Restores the invariant after `a[i]`'s key rose: sifts `a[i]` up.
    ///
    /// Requires `a[0..i]` to be a valid heap.
    ///
    /// ```
    /// use paged_heap::PagedHeap;
    ///
    /// let mut a = [9, 5, 7, 1];
    /// a[3] = 8;
    /// PagedHeap::<2, 1>::restore_heap_after_item_increase(&mut a, 3);
    /// assert_eq!(a, [9, 8, 7, 5]);
    /// ```
    pub fn restore_heap_after_item_increase_by<T, F>(a: &mut [T], i: usize, mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        debug_assert!(i < a.len(), "restore index {i} is out of the heap window");
        Self::verify_heap(&a[..i], &mut less);

        if i > 0 {
            // SAFETY: i < a.len().
            let mut hole = unsafe { Hole::new(a, i) };
            Self::sift_up(&mut hole, 0, &mut less);
        }

        Self::verify_heap(a, &mut less);
    }

    /// Restores the invariant after `a[i]`'s key fell: sifts `a[i]` down.
    pub fn restore_heap_after_item_decrease_by<T, F>(a: &mut [T], i: usize, mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        debug_assert!(i < a.len(), "restore index {i} is out of the heap window");
        Self::verify_heap(&a[..i], &mut less);

        if a.len() > 1 {
            // SAFETY: i < a.len().
            let mut hole = unsafe { Hole::new(a, i) };
            Self::sift_down(&mut hole, &mut less);
        }

        Self::verify_heap(a, &mut less);
    }

    /// Extracts `a[i]` into `a[n-1]` and repairs the heap `a[0..n-1]` by
    /// re-inserting the former last element at `i`, sifting it down or up
    /// depending on how it compares to the extracted one.
    pub fn remove_from_heap_by<T, F>(a: &mut [T], i: usize, mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        let n = a.len();
        debug_assert!(n > 0, "remove_from_heap needs a non-empty heap");
        debug_assert!(i < n, "remove index {i} is out of the heap window");
        Self::verify_heap(a, &mut less);

        let last = n - 1;
        if i < last {
            a.swap(i, last);
            let descends = less(&a[i], &a[last]);
            let window = &mut a[..last];
            // SAFETY: i < window.len() since i < last.
            let mut hole = unsafe { Hole::new(window, i) };
            if descends {
                Self::sift_down(&mut hole, &mut less);
            } else {
                Self::sift_up(&mut hole, 0, &mut less);
            }
        }

        Self::verify_heap(&a[..last], &mut less);
    }

    // Ord-ordered flavors.

    pub fn is_heap_until<T: Ord>(a: &[T]) -> usize {
        Self::is_heap_until_by(a, T::lt)
    }

    pub fn is_heap<T: Ord>(a: &[T]) -> bool {
        Self::is_heap_by(a, T::lt)
    }

    pub fn make_heap<T: Ord>(a: &mut [T]) {
        Self::make_heap_by(a, T::lt)
    }

    pub fn push_heap<T: Ord>(a: &mut [T]) {
        Self::push_heap_by(a, T::lt)
    }

    pub fn pop_heap<T: Ord>(a: &mut [T]) {
        Self::pop_heap_by(a, T::lt)
    }

    pub fn sort_heap<T: Ord>(a: &mut [T]) {
        Self::sort_heap_by(a, T::lt)
    }

    pub fn swap_max_item<T: Ord>(a: &mut [T], item: &mut T) {
        Self::swap_max_item_by(a, item, T::lt)
    }

    pub fn restore_heap_after_item_increase<T: Ord>(a: &mut [T], i: usize) {
        Self::restore_heap_after_item_increase_by(a, i, T::lt)
    }

    pub fn restore_heap_after_item_decrease<T: Ord>(a: &mut [T], i: usize) {
        Self::restore_heap_after_item_decrease_by(a, i, T::lt)
    }

    pub fn remove_from_heap<T: Ord>(a: &mut [T], i: usize) {
        Self::remove_from_heap_by(a, i, T::lt)
    }

    // Implementation.

    /// Climbs the hole toward `root`, pulling lesser ancestors down, until
    /// the held item is in order. The ancestor chain of the hole always
    /// passes through `root`.
    fn sift_up<T, F>(hole: &mut Hole<'_, T>, root: usize, less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        while hole.at() > root {
            let parent = parent_index::<D, P>(hole.at());
            debug_assert!(parent >= root);
            // SAFETY: parent < hole.at() < len.
            if !less(unsafe { hole.slot(parent) }, hole.item()) {
                break;
            }
            // SAFETY: same bounds as above.
            unsafe { hole.shift_to(parent) };
        }
    }

    /// Walks the hole down to a leaf, always promoting the maximum child,
    /// then repairs with a terminal sift-up from the original position. The
    /// later of equal children wins.
    fn sift_down<T, F>(hole: &mut Hole<'_, T>, less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        let n = hole.len();
        debug_assert!(hole.at() < n);

        let root = hole.at();
        loop {
            let first = match child_index::<D, P>(hole.at()) {
                Some(c) if c.get() < n => c.get(),
                _ => break,
            };
            let count = D.min(n - first);
            let mut max_child = first;
            for c in first + 1..first + count {
                // SAFETY: children are in range and strictly below the hole.
                if !less(unsafe { hole.slot(c) }, unsafe { hole.slot(max_child) }) {
                    max_child = c;
                }
            }
            // SAFETY: max_child < n and max_child > hole.at().
            unsafe { hole.shift_to(max_child) };
        }
        Self::sift_up(hole, root, less);
    }

    /// Pops the maximum of the heap `a[0..heap_size]` into `a[heap_size]`.
    fn pop_max_item<T, F>(a: &mut [T], heap_size: usize, less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        debug_assert!(heap_size > 0 && heap_size < a.len());

        // SAFETY: the slot at heap_size is read into the hole element and
        // immediately overwritten by the old maximum; the hole then owns the
        // window prefix and refills position 0's subtree on drop.
        unsafe {
            let base = a.as_mut_ptr();
            let item = ptr::read(base.add(heap_size));
            ptr::copy_nonoverlapping(base, base.add(heap_size), 1);
            let mut hole = Hole::with_item(&mut a[..heap_size], 0, item);
            Self::sift_down(&mut hole, less);
        }
    }

    #[cfg(not(feature = "verify"))]
    #[inline(always)]
    fn verify_heap<T, F>(_a: &[T], _less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
    }

    #[cfg(feature = "verify")]
    fn verify_heap<T, F>(a: &[T], less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        let k = Self::is_heap_until_by(a, &mut *less);
        assert!(
            k == a.len(),
            "heap invariant broken at index {k} of {}",
            a.len(),
        );
    }
}

/// A slot of the heap window whose value has been lifted out into `item`
/// while a sift rearranges the rest. Dropping the hole settles the item into
/// whatever position the hole ended up at, so the window holds every value
/// exactly once again even if a comparator panics mid-sift.
struct Hole<'a, T> {
    window: &'a mut [T],
    item: ManuallyDrop<T>,
    at: usize,
}

impl<'a, T> Hole<'a, T> {
    /// Opens a hole at `at` by lifting its value out.
    ///
    /// # Safety
    ///
    /// `at` must be within the window.
    #[inline]
    unsafe fn new(window: &'a mut [T], at: usize) -> Self {
        debug_assert!(at < window.len(), "hole position {at} is out of the window");
        let item = unsafe { ptr::read(window.as_ptr().add(at)) };
        Hole {
            window,
            item: ManuallyDrop::new(item),
            at,
        }
    }

    /// Opens a hole at `at` carrying an externally supplied item.
    ///
    /// # Safety
    ///
    /// `at` must be within the window and its current value must already
    /// have been moved out.
    #[inline]
    unsafe fn with_item(window: &'a mut [T], at: usize, item: T) -> Self {
        debug_assert!(at < window.len(), "hole position {at} is out of the window");
        Hole {
            window,
            item: ManuallyDrop::new(item),
            at,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.window.len()
    }

    #[inline]
    fn at(&self) -> usize {
        self.at
    }

    /// The lifted-out item.
    #[inline]
    fn item(&self) -> &T {
        &self.item
    }

    /// The value in the window slot at `index`.
    ///
    /// # Safety
    ///
    /// `index` must be within the window and must not be the hole itself.
    #[inline]
    unsafe fn slot(&self, index: usize) -> &T {
        debug_assert!(index != self.at, "the hole slot {index} holds no value");
        debug_assert!(index < self.window.len(), "slot {index} is out of the window");
        unsafe { &*self.window.as_ptr().add(index) }
    }

    /// Fills the hole with the value at `src` and reopens the hole there.
    ///
    /// # Safety
    ///
    /// `src` must be within the window and must not be the hole itself.
    #[inline]
    unsafe fn shift_to(&mut self, src: usize) {
        debug_assert!(src != self.at, "a slot cannot refill itself");
        debug_assert!(src < self.window.len(), "shift source {src} is out of the window");
        unsafe {
            let base = self.window.as_mut_ptr();
            ptr::copy_nonoverlapping(base.add(src), base.add(self.at), 1);
        }
        self.at = src;
    }
}

impl<T> Drop for Hole<'_, T> {
    #[inline]
    fn drop(&mut self) {
        // Settle the carried item into the hole's final position.
        unsafe {
            let dst = self.window.as_mut_ptr().add(self.at);
            ptr::copy_nonoverlapping(&*self.item, dst, 1);
        }
    }
}
