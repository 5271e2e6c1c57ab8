// Property cross-checks of every heap operation against the std
// equivalents, over a grid of heap shapes.

use proptest::prelude::*;
use std::collections::BinaryHeap as StdHeap;

use paged_heap::algorithms::{HeapAlgorithms, IterInput};
use paged_heap::{MaxQueue, PagedHeap};

// Runs a closure for each (fanout, page_chunks) shape in the grid. The
// shapes are const generics, so the grid is spelled out by a macro.
macro_rules! for_each_shape {
    ($run:ident) => {
        $run::<1, 1>();
        $run::<2, 1>();
        $run::<3, 1>();
        $run::<4, 1>();
        $run::<8, 1>();
        $run::<1, 2>();
        $run::<2, 2>();
        $run::<3, 2>();
        $run::<4, 4>();
        $run::<2, 8>();
    };
}

fn small_vecs() -> impl Strategy<Value = Vec<u16>> {
    proptest::collection::vec(0u16..500, 0..260)
}

fn sorted_of(v: &[u16]) -> Vec<u16> {
    let mut s = v.to_vec();
    s.sort();
    s
}

proptest! {
    #[test]
    fn make_heap_is_a_permutation_and_a_heap(v in small_vecs()) {
        fn run<const D: usize, const P: usize>(v: &[u16]) {
            let mut a = v.to_vec();
            PagedHeap::<D, P>::make_heap(&mut a);
            assert!(PagedHeap::<D, P>::is_heap(&a));
            assert_eq!(sorted_of(&a), sorted_of(v));
        }
        run::<1, 1>(&v);
        run::<2, 1>(&v);
        run::<3, 1>(&v);
        run::<4, 1>(&v);
        run::<8, 1>(&v);
        run::<1, 2>(&v);
        run::<2, 2>(&v);
        run::<3, 2>(&v);
        run::<4, 4>(&v);
        run::<2, 8>(&v);
    }

    #[test]
    fn heapsort_agrees_with_std_sort(v in small_vecs()) {
        fn run<const D: usize, const P: usize>(v: &[u16], expected: &[u16]) {
            let mut a = v.to_vec();
            HeapAlgorithms::<D, P>::heapsort(&mut a);
            assert_eq!(a, expected);
        }
        let expected = sorted_of(&v);
        run::<1, 1>(&v, &expected);
        run::<2, 1>(&v, &expected);
        run::<3, 1>(&v, &expected);
        run::<4, 1>(&v, &expected);
        run::<8, 1>(&v, &expected);
        run::<1, 2>(&v, &expected);
        run::<2, 2>(&v, &expected);
        run::<3, 2>(&v, &expected);
        run::<4, 4>(&v, &expected);
        run::<2, 8>(&v, &expected);
    }

    #[test]
    fn heapsort_descending_mirrors_ascending(v in small_vecs()) {
        let mut expected = sorted_of(&v);
        expected.reverse();
        let mut a = v.clone();
        HeapAlgorithms::<3, 2>::heapsort_by(&mut a, |x, y| y < x);
        assert_eq!(a, expected);
    }

    #[test]
    fn queue_pops_agree_with_std_binary_heap(v in small_vecs()) {
        let mut std_heap: StdHeap<u16> = v.iter().copied().collect();
        let mut q: MaxQueue<u16, 4, 2> = v.iter().copied().collect();
        loop {
            match (std_heap.pop(), q.pop()) {
                (None, None) => break,
                (expected, got) => assert_eq!(got, expected),
            }
        }
    }

    #[test]
    fn queue_interleaved_ops_agree_with_std(ops in proptest::collection::vec(
        prop_oneof![ (0u16..500).prop_map(Some), Just(None) ], 0..200))
    {
        let mut std_heap = StdHeap::new();
        let mut q = MaxQueue::<u16, 3, 1>::new_ord();
        for op in ops {
            match op {
                Some(x) => {
                    std_heap.push(x);
                    q.push(x);
                }
                None => assert_eq!(q.pop(), std_heap.pop()),
            }
            assert_eq!(q.len(), std_heap.len());
            assert_eq!(q.peek(), std_heap.peek());
        }
        assert_eq!(q.into_sorted_vec(), std_heap.into_sorted_vec());
    }

    #[test]
    fn partial_sort_prefix_is_the_smallest(v in small_vecs(), cut in 0usize..300) {
        let middle = cut.min(v.len());
        let expected = sorted_of(&v);

        let mut a = v.clone();
        HeapAlgorithms::<2, 2>::partial_sort(&mut a, middle);
        assert_eq!(&a[..middle], &expected[..middle]);
        assert_eq!(sorted_of(&a), expected);
        if middle > 0 {
            for x in &a[middle..] {
                assert!(*x >= a[middle - 1]);
            }
        }
    }

    #[test]
    fn nway_merge_agrees_with_sorting_the_union(
        inputs in proptest::collection::vec(
            proptest::collection::vec(0u16..500, 1..40), 1..12))
    {
        let mut expected: Vec<u16> = inputs.iter().flatten().copied().collect();
        expected.sort();

        let mut handles: Vec<_> = inputs
            .iter()
            .map(|v| {
                let mut sorted = v.clone();
                sorted.sort();
                IterInput::new(sorted.into_iter())
            })
            .collect();
        let mut out = Vec::with_capacity(expected.len());
        HeapAlgorithms::<2, 2>::nway_merge(&mut handles, |x| out.push(x));
        assert_eq!(out, expected);
    }

    #[test]
    fn mergesort_agrees_with_std_sort(v in small_vecs()) {
        let expected = sorted_of(&v);
        let mut scratch = Vec::new();

        let mut a = v.clone();
        HeapAlgorithms::<2, 1>::nway_mergesort(&mut a, &mut scratch);
        assert_eq!(a, expected);

        let mut a = v.clone();
        HeapAlgorithms::<4, 2>::nway_mergesort_with_by(
            &mut a,
            &mut scratch,
            4,
            3,
            |run, less| HeapAlgorithms::<4, 2>::insertion_sort_by(run, &mut *less),
            u16::lt,
        );
        assert_eq!(a, expected);
    }

    #[test]
    fn push_then_pop_returns_sorted_windows(v in small_vecs()) {
        fn run<const D: usize, const P: usize>(v: &[u16], expected: &[u16]) {
            let mut a = v.to_vec();
            let n = a.len();
            for i in 1..=n {
                PagedHeap::<D, P>::push_heap(&mut a[..i]);
            }
            assert!(PagedHeap::<D, P>::is_heap(&a));
            for i in (1..=n).rev() {
                PagedHeap::<D, P>::pop_heap(&mut a[..i]);
            }
            assert_eq!(a, expected);
        }
        let expected = sorted_of(&v);
        run::<2, 1>(&v, &expected);
        run::<3, 2>(&v, &expected);
        run::<2, 4>(&v, &expected);
    }

    #[test]
    fn remove_from_heap_extracts_the_indexed_item(v in small_vecs(), seed in any::<u64>()) {
        if !v.is_empty() {
            let mut a = v.clone();
            PagedHeap::<3, 2>::make_heap(&mut a);
            let mut size = a.len();
            let mut state = seed | 1;
            while size > 0 {
                // Cheap xorshift to pick removal positions.
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                let at = (state as usize) % size;
                let expected = a[at];
                PagedHeap::<3, 2>::remove_from_heap(&mut a[..size], at);
                assert_eq!(a[size - 1], expected);
                size -= 1;
                assert!(PagedHeap::<3, 2>::is_heap(&a[..size]));
            }
            assert_eq!(sorted_of(&a), sorted_of(&v));
        }
    }
}

#[test]
fn shape_grid_smoke() {
    fn run<const D: usize, const P: usize>() {
        let mut a = [5u32, 2, 9, 1, 5, 6, 0, 8, 8, 3];
        HeapAlgorithms::<D, P>::heapsort(&mut a);
        assert_eq!(a, [0, 1, 2, 3, 5, 5, 6, 8, 8, 9]);
    }
    for_each_shape!(run);
}
