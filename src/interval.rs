//! Ordered interval map over buffer positions
//!
//! Every position in `[0, len)` belongs to exactly one run, runs never
//! overlap, and adjacent runs always carry different values. Region tags,
//! lexical syntax classes and faces are all stored this way instead of as
//! per-character attributes.

use std::collections::BTreeMap;
use std::ops::Range;

/// Gap-free map from `[start, end)` runs to values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalMap<V> {
    /// Total length covered
    len: usize,
    /// Run start -> (run end, value)
    runs: BTreeMap<usize, (usize, V)>,
}

impl<V: Copy + Eq> IntervalMap<V> {
    /// Create a map covering `[0, len)` with a single value
    pub fn new(len: usize, fill: V) -> Self {
        let mut runs = BTreeMap::new();
        if len > 0 {
            runs.insert(0, (len, fill));
        }
        Self { len, runs }
    }

    /// Length covered by the map
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the map covers nothing
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of runs
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Value at a position
    pub fn get(&self, pos: usize) -> Option<V> {
        self.region(pos).map(|(_, value)| value)
    }

    /// The maximal run containing a position
    pub fn region(&self, pos: usize) -> Option<(Range<usize>, V)> {
        if pos >= self.len {
            return None;
        }
        self.runs
            .range(..=pos)
            .next_back()
            .map(|(&start, &(end, value))| (start..end, value))
    }

    /// First position after `pos` whose value differs (or `len`)
    pub fn next_change(&self, pos: usize) -> usize {
        self.region(pos).map_or(self.len, |(range, _)| range.end)
    }

    /// Start of the run containing the position just before `pos` (or 0)
    pub fn previous_change(&self, pos: usize) -> usize {
        if pos == 0 {
            return 0;
        }
        self.region(pos.min(self.len) - 1)
            .map_or(0, |(range, _)| range.start)
    }

    /// Set every position in `range` to `value`
    pub fn assign(&mut self, range: Range<usize>, value: V) {
        let start = range.start.min(self.len);
        let end = range.end.min(self.len);
        if start >= end {
            return;
        }

        self.split_at(start);
        self.split_at(end);
        let covered: Vec<usize> = self.runs.range(start..end).map(|(&s, _)| s).collect();
        for s in covered {
            self.runs.remove(&s);
        }
        self.runs.insert(start, (end, value));

        self.coalesce_at(end);
        self.coalesce_at(start);
    }

    /// Open a gap of `count` positions at `pos`, shifting later runs right
    pub fn insert_gap(&mut self, pos: usize, count: usize, fill: V) {
        if count == 0 {
            return;
        }
        let pos = pos.min(self.len);

        self.split_at(pos);
        let tail = self.runs.split_off(&pos);
        self.len += count;
        for (start, (end, value)) in tail {
            self.runs.insert(start + count, (end + count, value));
        }
        self.runs.insert(pos, (pos + count, fill));

        self.coalesce_at(pos + count);
        self.coalesce_at(pos);
    }

    /// Remove the positions in `range`, shifting later runs left
    pub fn remove(&mut self, range: Range<usize>) {
        let start = range.start.min(self.len);
        let end = range.end.min(self.len);
        if start >= end {
            return;
        }

        self.split_at(start);
        self.split_at(end);
        let mut tail = self.runs.split_off(&start);
        let after = tail.split_off(&end);

        let count = end - start;
        self.len -= count;
        for (s, (e, value)) in after {
            self.runs.insert(s - count, (e - count, value));
        }

        self.coalesce_at(start);
    }

    /// Iterate over all runs in order
    pub fn iter(&self) -> impl Iterator<Item = (Range<usize>, V)> + '_ {
        self.runs.iter().map(|(&start, &(end, value))| (start..end, value))
    }

    /// Iterate over runs overlapping `range`, clipped to it
    pub fn iter_range(&self, range: Range<usize>) -> impl Iterator<Item = (Range<usize>, V)> + '_ {
        let start = range.start.min(self.len);
        let end = range.end.min(self.len);
        let first = self
            .runs
            .range(..=start)
            .next_back()
            .map_or(start, |(&s, _)| s);
        self.runs
            .range(first..end)
            .filter(move |(s, (e, _))| **s < end && *e > start)
            .map(move |(&s, &(e, value))| (s.max(start)..e.min(end), value))
    }

    /// Make sure a run starts exactly at `pos`
    fn split_at(&mut self, pos: usize) {
        if pos == 0 || pos >= self.len {
            return;
        }
        let Some((&start, &(end, value))) = self.runs.range(..=pos).next_back() else {
            return;
        };
        if start == pos {
            return;
        }
        self.runs.insert(start, (pos, value));
        self.runs.insert(pos, (end, value));
    }

    /// Merge the run starting at `pos` into its predecessor if they match
    fn coalesce_at(&mut self, pos: usize) {
        if pos == 0 || pos >= self.len {
            return;
        }
        let Some(&(end, value)) = self.runs.get(&pos) else {
            return;
        };
        let Some((&prev_start, &(prev_end, prev_value))) = self.runs.range(..pos).next_back() else {
            return;
        };
        if prev_end == pos && prev_value == value {
            self.runs.remove(&pos);
            self.runs.insert(prev_start, (end, value));
        }
    }
}

#[cfg(test)]
pub(crate) fn assert_well_formed<V: Copy + Eq + std::fmt::Debug>(map: &IntervalMap<V>) {
    let mut expected_start = 0;
    let mut prev: Option<V> = None;
    for (range, value) in map.iter() {
        assert_eq!(range.start, expected_start, "gap or overlap before {:?}", range);
        assert!(range.start < range.end, "empty run {:?}", range);
        assert_ne!(prev, Some(value), "uncoalesced run at {:?}", range);
        prev = Some(value);
        expected_start = range.end;
    }
    assert_eq!(expected_start, map.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_and_get() {
        let map = IntervalMap::new(10, 'h');
        assert_eq!(map.get(0), Some('h'));
        assert_eq!(map.get(9), Some('h'));
        assert_eq!(map.get(10), None);
        assert_eq!(map.run_count(), 1);
    }

    #[test]
    fn test_assign_splits_and_coalesces() {
        let mut map = IntervalMap::new(10, 'h');
        map.assign(3..6, 's');
        assert_eq!(map.region(4), Some((3..6, 's')));
        assert_eq!(map.region(0), Some((0..3, 'h')));
        assert_eq!(map.region(8), Some((6..10, 'h')));

        map.assign(3..6, 'h');
        assert_eq!(map.run_count(), 1);
        assert_well_formed(&map);
    }

    #[test]
    fn test_boundaries() {
        let mut map = IntervalMap::new(10, 'h');
        map.assign(3..6, 's');
        assert_eq!(map.next_change(0), 3);
        assert_eq!(map.next_change(3), 6);
        assert_eq!(map.next_change(7), 10);
        assert_eq!(map.previous_change(5), 3);
        assert_eq!(map.previous_change(6), 3);
        assert_eq!(map.previous_change(7), 6);
        assert_eq!(map.previous_change(0), 0);
    }

    #[test]
    fn test_insert_gap_shifts() {
        let mut map = IntervalMap::new(10, 'h');
        map.assign(3..6, 's');
        map.insert_gap(4, 2, 's');
        assert_eq!(map.len(), 12);
        assert_eq!(map.region(4), Some((3..8, 's')));
        map.insert_gap(0, 1, 'x');
        assert_eq!(map.region(0), Some((0..1, 'x')));
        assert_eq!(map.region(5), Some((4..9, 's')));
        assert_well_formed(&map);
    }

    #[test]
    fn test_remove_shifts_and_merges() {
        let mut map = IntervalMap::new(10, 'h');
        map.assign(3..6, 's');
        map.remove(2..7);
        assert_eq!(map.len(), 5);
        assert_eq!(map.run_count(), 1);
        assert_well_formed(&map);
    }

    #[test]
    fn test_empty_map_grows() {
        let mut map = IntervalMap::new(0, 'h');
        assert!(map.is_empty());
        map.insert_gap(0, 3, 's');
        assert_eq!(map.region(1), Some((0..3, 's')));
    }

    #[test]
    fn test_iter_range_clips() {
        let mut map = IntervalMap::new(10, 'h');
        map.assign(3..6, 's');
        let runs: Vec<_> = map.iter_range(4..8).collect();
        assert_eq!(runs, vec![(4..6, 's'), (6..8, 'h')]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Assign(usize, usize, u8),
        Insert(usize, usize, u8),
        Remove(usize, usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..40usize, 0..40usize, 0..3u8).prop_map(|(a, b, v)| Op::Assign(a, b, v)),
            (0..40usize, 0..8usize, 0..3u8).prop_map(|(a, n, v)| Op::Insert(a, n, v)),
            (0..40usize, 0..40usize).prop_map(|(a, b)| Op::Remove(a, b)),
        ]
    }

    proptest! {
        #[test]
        fn test_mutations_keep_map_gap_free(ops in proptest::collection::vec(op_strategy(), 0..30)) {
            let mut map = IntervalMap::new(20, 0u8);
            let mut shadow = vec![0u8; 20];
            for op in ops {
                match op {
                    Op::Assign(a, b, v) => {
                        let (s, e) = (a.min(b).min(shadow.len()), a.max(b).min(shadow.len()));
                        map.assign(s..e, v);
                        for slot in &mut shadow[s..e] {
                            *slot = v;
                        }
                    }
                    Op::Insert(a, n, v) => {
                        let a = a.min(shadow.len());
                        map.insert_gap(a, n, v);
                        for _ in 0..n {
                            shadow.insert(a, v);
                        }
                    }
                    Op::Remove(a, b) => {
                        let (s, e) = (a.min(b).min(shadow.len()), a.max(b).min(shadow.len()));
                        map.remove(s..e);
                        shadow.drain(s..e);
                    }
                }
                assert_well_formed(&map);
                prop_assert_eq!(map.len(), shadow.len());
                for (pos, value) in shadow.iter().enumerate() {
                    prop_assert_eq!(map.get(pos), Some(*value));
                }
            }
        }
    }
}
