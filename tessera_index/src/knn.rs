// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded "k best so far" collector shared by the nearest-neighbor searches.

use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Ordering;

use kurbo::Point;

struct Candidate<T> {
    distance: f64,
    at: Point,
    seq: u64,
    item: T,
}

impl<T> Candidate<T> {
    /// Order by distance, then by position, ignoring offer order.
    fn rank(&self, distance: f64, at: Point) -> Ordering {
        self.distance
            .total_cmp(&distance)
            .then(self.at.x.total_cmp(&at.x))
            .then(self.at.y.total_cmp(&at.y))
    }
}

impl<T> PartialEq for Candidate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Candidate<T> {}

impl<T> PartialOrd for Candidate<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Candidate<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank(other.distance, other.at)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Max-heap holding at most `k` candidates; the root is the current worst.
///
/// Candidates rank by distance, then by `x`, then by `y`, so equidistant
/// points resolve the same way whatever order a structure offers them in.
/// Only candidates at the very same position fall back to offer order, the
/// earlier one winning.
pub(crate) struct KBest<T> {
    k: usize,
    seq: u64,
    heap: BinaryHeap<Candidate<T>>,
}

impl<T> KBest<T> {
    pub(crate) fn new(k: usize) -> Self {
        Self {
            k,
            seq: 0,
            heap: BinaryHeap::with_capacity(k.min(64)),
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.heap.len() >= self.k
    }

    /// Largest distance a candidate can have and still be admitted; infinite
    /// until full.
    pub(crate) fn bound(&self) -> f64 {
        if self.is_full() {
            self.heap.peek().map_or(f64::INFINITY, |c| c.distance)
        } else {
            f64::INFINITY
        }
    }

    /// Offer `item`, stored at `at`, lying `distance` from the target.
    pub(crate) fn offer(&mut self, distance: f64, at: Point, item: T) {
        if self.k == 0 {
            return;
        }
        self.seq += 1;
        let candidate = Candidate {
            distance,
            at,
            seq: self.seq,
            item,
        };
        if !self.is_full() {
            self.heap.push(candidate);
        } else if self
            .heap
            .peek()
            .is_some_and(|worst| worst.rank(distance, at) == Ordering::Greater)
        {
            self.heap.pop();
            self.heap.push(candidate);
        }
    }

    /// Candidates in ascending rank order.
    pub(crate) fn into_sorted(self) -> Vec<(f64, T)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| (c.distance, c.item))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_k_smallest() {
        let mut best = KBest::new(3);
        for (i, d) in [5.0, 1.0, 4.0, 2.0, 3.0].into_iter().enumerate() {
            best.offer(d, Point::new(d, 0.0), i);
        }
        let got: Vec<_> = best.into_sorted().into_iter().map(|(_, i)| i).collect();
        assert_eq!(got, [1, 3, 4]);
    }

    #[test]
    fn equal_distance_prefers_the_lower_position() {
        for order in [['a', 'b', 'c'], ['c', 'b', 'a'], ['b', 'c', 'a']] {
            let mut best = KBest::new(2);
            for c in order {
                let at = match c {
                    'a' => Point::new(-2.0, 0.0),
                    'b' => Point::new(0.0, -2.0),
                    _ => Point::new(0.0, 2.0),
                };
                best.offer(2.0, at, c);
            }
            let got: Vec<char> = best.into_sorted().into_iter().map(|(_, c)| c).collect();
            assert_eq!(got, ['a', 'b'], "offered as {order:?}");
        }
    }

    #[test]
    fn coincident_points_keep_the_earlier_offer() {
        let mut best = KBest::new(1);
        best.offer(2.0, Point::new(1.0, 1.0), 'a');
        best.offer(2.0, Point::new(1.0, 1.0), 'b');
        assert_eq!(best.into_sorted(), [(2.0, 'a')]);
    }

    #[test]
    fn zero_k_collects_nothing() {
        let mut best = KBest::new(0);
        best.offer(1.0, Point::ORIGIN, ());
        assert!(best.into_sorted().is_empty());
    }
}
