// Sorting algorithms: heapsort, partial sort, and N-way mergesort.

use core::ptr;

use crate::heap::PagedHeap;

use super::merge::MergeInput;
use super::HeapAlgorithms;

/// Default run length sorted by the small-range sorter in
/// [`HeapAlgorithms::nway_mergesort_by`].
pub const SMALL_RANGE_SIZE: usize = 32;

/// Default number of runs merged per [`HeapAlgorithms::nway_mergesort_by`]
/// merge step.
pub const SUBRANGES_COUNT: usize = 15;

impl<const D: usize, const P: usize> HeapAlgorithms<D, P> {
    /// Sorts the slice ascending: `make_heap` then `sort_heap`.
    pub fn heapsort_by<T, F>(a: &mut [T], mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        PagedHeap::<D, P>::make_heap_by(a, &mut less);
        PagedHeap::<D, P>::sort_heap_by(a, &mut less);
    }

    pub fn heapsort<T: Ord>(a: &mut [T]) {
        Self::heapsort_by(a, T::lt)
    }

    /// Partial sort: `a[0..middle]` ends up sorted ascending and no larger
    /// than anything in `a[middle..]`.
    ///
    /// Keeps the `middle` smallest elements in a max-heap and replaces the
    /// maximum whenever a smaller element shows up in the tail.
    ///
    /// ```
    /// use paged_heap::algorithms::HeapAlgorithms;
    ///
    /// let mut a = [7, 3, 5, 1, 9, 2, 8, 4];
    /// HeapAlgorithms::<2, 1>::partial_sort(&mut a, 3);
    /// assert_eq!(&a[..3], &[1, 2, 3]);
    /// ```
    pub fn partial_sort_by<T, F>(a: &mut [T], middle: usize, mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        debug_assert!(
            middle <= a.len(),
            "partial_sort middle {middle} exceeds the slice length {}",
            a.len(),
        );

        if middle > 0 {
            let (heap, rest) = a.split_at_mut(middle);
            PagedHeap::<D, P>::make_heap_by(heap, &mut less);
            for item in rest.iter_mut() {
                if less(item, &heap[0]) {
                    PagedHeap::<D, P>::swap_max_item_by(heap, item, &mut less);
                }
            }
            PagedHeap::<D, P>::sort_heap_by(heap, &mut less);
        }
    }

    pub fn partial_sort<T: Ord>(a: &mut [T], middle: usize) {
        Self::partial_sort_by(a, middle, T::lt)
    }

    /// Insertion sort; the default small-range sorter of the mergesort.
    pub fn insertion_sort_by<T, F>(a: &mut [T], mut less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        for i in 1..a.len() {
            let mut hole = i;
            while hole > 0 && less(&a[hole], &a[hole - 1]) {
                a.swap(hole, hole - 1);
                hole -= 1;
            }
        }
    }

    pub fn insertion_sort<T: Ord>(a: &mut [T]) {
        Self::insertion_sort_by(a, T::lt)
    }

    /// N-way mergesort with the default run length and merge width.
    ///
    /// `scratch` is caller-supplied working storage; its contents are
    /// cleared and only its capacity is used, so any vector will do.
    ///
    /// ```
    /// use paged_heap::algorithms::HeapAlgorithms;
    ///
    /// let mut a = [5, 2, 9, 1, 5, 6];
    /// let mut scratch = Vec::new();
    /// HeapAlgorithms::<2, 1>::nway_mergesort(&mut a, &mut scratch);
    /// assert_eq!(a, [1, 2, 5, 5, 6, 9]);
    /// ```
    pub fn nway_mergesort_by<T, F>(a: &mut [T], scratch: &mut Vec<T>, less: F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        Self::nway_mergesort_with_by(
            a,
            scratch,
            SMALL_RANGE_SIZE,
            SUBRANGES_COUNT,
            |run, less| Self::insertion_sort_by(run, &mut *less),
            less,
        )
    }

    pub fn nway_mergesort<T: Ord>(a: &mut [T], scratch: &mut Vec<T>) {
        Self::nway_mergesort_by(a, scratch, T::lt)
    }

    /// N-way mergesort with explicit knobs.
    ///
    /// Phase 1 splits the slice into runs of `small_range_size` (the last
    /// run may be shorter) and sorts each with `small_sorter`. Phase 2
    /// repeatedly merges groups of `subranges_count` consecutive runs into
    /// `scratch` and moves the result back, growing the run length by a
    /// factor of `subranges_count` per pass, until a single run remains.
    pub fn nway_mergesort_with_by<T, F, S>(
        a: &mut [T],
        scratch: &mut Vec<T>,
        small_range_size: usize,
        subranges_count: usize,
        mut small_sorter: S,
        mut less: F,
    ) where
        F: FnMut(&T, &T) -> bool,
        S: FnMut(&mut [T], &mut F),
    {
        debug_assert!(small_range_size > 0, "runs must be non-empty");
        debug_assert!(subranges_count > 1, "merging needs at least two runs");

        let n = a.len();

        // Phase 1: sort the runs.
        let mut it = 0;
        let last_full = n - n % small_range_size;
        while it < last_full {
            small_sorter(&mut a[it..it + small_range_size], &mut less);
            it += small_range_size;
        }
        if it < n {
            small_sorter(&mut a[it..], &mut less);
        }
        if n <= small_range_size {
            return;
        }

        // Phase 2: merge passes through the scratch buffer.
        scratch.clear();
        scratch.reserve(n);
        // The scratch vector's length stays zero: merged elements are
        // written into its spare capacity and copied back into `a` at the
        // end of every pass, so each value is owned by exactly one slot of
        // `a` at any pass boundary.
        let out_base = scratch.spare_capacity_mut().as_mut_ptr().cast::<T>();

        let mut runs: Vec<Run<T>> = Vec::with_capacity(subranges_count);
        let mut subrange_size = small_range_size;
        loop {
            let base = a.as_ptr();
            let mut written = 0usize;
            let mut out = |item: T| {
                debug_assert!(written < n);
                // SAFETY: at most n items are produced per pass and the
                // scratch has capacity for n.
                unsafe { out_base.add(written).write(item) };
                written += 1;
            };

            let mut it = 0;
            // Merge full groups of subranges_count runs.
            if subrange_size <= n / subranges_count {
                let group_size = subrange_size * subranges_count;
                let last = n - n % group_size;
                while it < last {
                    runs.clear();
                    for _ in 0..subranges_count {
                        // SAFETY: the run [it, it + subrange_size) is in
                        // bounds and disjoint from every other run.
                        runs.push(unsafe { Run::new(base.add(it), subrange_size) });
                        it += subrange_size;
                    }
                    Self::nway_merge_by(&mut runs, &mut less, &mut out);
                }
            }

            // Merge the tail group: fewer than subranges_count runs, the
            // last possibly short.
            if it < n {
                runs.clear();
                let full_runs = (n - it) / subrange_size;
                for _ in 0..full_runs {
                    // SAFETY: as above.
                    runs.push(unsafe { Run::new(base.add(it), subrange_size) });
                    it += subrange_size;
                }
                if it < n {
                    // SAFETY: as above.
                    runs.push(unsafe { Run::new(base.add(it), n - it) });
                }
                Self::nway_merge_by(&mut runs, &mut less, &mut out);
            }

            drop(out);
            debug_assert_eq!(written, n);
            // SAFETY: exactly n merged items sit in the scratch; move them
            // back. The buffers do not overlap.
            unsafe { ptr::copy_nonoverlapping(out_base.cast_const(), a.as_mut_ptr(), n) };

            if subrange_size > n / subranges_count {
                break;
            }
            subrange_size *= subranges_count;
        }
    }
}

/// A cursor over one sorted run of the buffer being merged. Items are moved
/// out by `next`; the vacated slots are refilled when the pass copies the
/// merged output back.
struct Run<T> {
    cur: *const T,
    end: *const T,
}

impl<T> Run<T> {
    /// # Safety
    ///
    /// `[start, start + len)` must be readable and not aliased by any other
    /// live `Run` or reference for the cursor's lifetime.
    unsafe fn new(start: *const T, len: usize) -> Self {
        Self {
            cur: start,
            end: unsafe { start.add(len) },
        }
    }
}

impl<T> MergeInput for Run<T> {
    type Item = T;

    #[inline]
    fn peek(&self) -> Option<&T> {
        if self.cur == self.end {
            None
        } else {
            // SAFETY: cur is in bounds and points at a live item.
            Some(unsafe { &*self.cur })
        }
    }

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.cur == self.end {
            None
        } else {
            // SAFETY: cur is in bounds; the item is read out exactly once.
            let item = unsafe { ptr::read(self.cur) };
            self.cur = unsafe { self.cur.add(1) };
            Some(item)
        }
    }
}
