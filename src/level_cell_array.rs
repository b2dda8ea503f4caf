use core::fmt;
use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::interval::{Coords, Interval, RowKey};
use crate::level_cell_list::LevelCellList;
use crate::overlap;




/**
 * The frozen, compressed set of cells of one refinement level. Cells are
 * stored as rows of sorted, disjoint, non-adjacent x-intervals; rows are
 * sorted by key and only non-empty rows are stored.
 *
 * Each interval carries an `index` chosen so that the cells of the level
 * map onto a contiguous range of buffer positions: walking the rows in key
 * order and the intervals in x order, the position of coordinate `x` in
 * interval `i` is `i.index + x`. Positions start at zero, unless the array
 * has been shifted with [`LevelCellArray::shift_indices`].
 */
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCellArray {
    dim: usize,
    level: usize,
    rows: Vec<RowKey>,
    offsets: Vec<usize>,
    intervals: Vec<Interval>,
    nb_cells: usize,
}




// ============================================================================
impl LevelCellArray {


    /**
     * Create an array with no cells.
     */
    pub fn empty(dim: usize, level: usize) -> Self {
        Self {
            dim,
            level,
            rows: Vec::new(),
            offsets: vec![0],
            intervals: Vec::new(),
            nb_cells: 0,
        }
    }


    /**
     * Build an array from rows of intervals given in any order. Rows may be
     * repeated and intervals may overlap; they are merged here.
     */
    pub fn from_rows<I>(dim: usize, level: usize, rows: I) -> Self
    where
        I: IntoIterator<Item = (RowKey, Vec<Interval>)>
    {
        let mut sorted: BTreeMap<RowKey, Vec<Interval>> = BTreeMap::new();

        for (key, intervals) in rows {
            sorted.entry(key).or_default().extend(intervals)
        }
        Self::from_sorted_rows(dim, level, sorted)
    }


    /**
     * Freeze a cell list into an array.
     */
    pub fn from_list(list: LevelCellList) -> Self {
        let (dim, level) = (list.dim(), list.level());
        Self::from_sorted_rows(dim, level, list.into_rows())
    }

    fn from_sorted_rows(dim: usize, level: usize, sorted: BTreeMap<RowKey, Vec<Interval>>) -> Self {
        let mut result = Self::empty(dim, level);
        let mut position = 0;

        for (key, intervals) in sorted {
            let merged = overlap::coalesce(intervals);

            if merged.is_empty() {
                continue
            }
            for i in merged {
                result.intervals.push(i.with_index(position - i.start));
                position += i.end - i.start;
            }
            result.rows.push(key);
            result.offsets.push(result.intervals.len());
        }
        result.nb_cells = position as usize;
        result
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn nb_cells(&self) -> usize {
        self.nb_cells
    }

    pub fn nb_intervals(&self) -> usize {
        self.intervals.len()
    }

    pub fn nb_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nb_cells == 0
    }

    pub fn row_keys(&self) -> &[RowKey] {
        &self.rows
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }


    /**
     * Add a constant to the index of every interval, so that the positions
     * of this level start at `base` instead of zero.
     */
    pub fn shift_indices(&mut self, base: i64) {
        for i in &mut self.intervals {
            i.index += base
        }
    }


    /**
     * Iterate over the stored rows in key order.
     */
    pub fn rows(&self) -> impl Iterator<Item = (RowKey, &[Interval])> {
        self.rows.iter().enumerate().map(move |(n, key)| {
            (*key, &self.intervals[self.offsets[n]..self.offsets[n + 1]])
        })
    }


    /**
     * Return the intervals of the given row, which is empty if the row is
     * not stored.
     */
    pub fn row(&self, key: &RowKey) -> &[Interval] {
        match self.rows.binary_search(key) {
            Ok(n) => &self.intervals[self.offsets[n]..self.offsets[n + 1]],
            Err(_) => &[],
        }
    }


    /**
     * Return the interval containing the cell at `x` in the given row.
     */
    pub fn find(&self, x: i64, key: &RowKey) -> Option<&Interval> {
        let row = self.row(key);
        let n = row.partition_point(|i| i.end <= x);
        row.get(n).filter(|i| i.start <= x)
    }


    /**
     * Return the interval containing all of `x` in the given row.
     */
    pub fn find_interval(&self, x: &Interval, key: &RowKey) -> Option<&Interval> {
        self.find(x.start, key).filter(|i| i.end >= x.end)
    }


    /**
     * Iterate over the parts of `x` stored in the given row, in x order. Each
     * part lies within one interval of the row.
     */
    pub fn overlapping<'a>(&'a self, x: &Interval, key: &RowKey) -> impl Iterator<Item = Interval> + 'a {
        let x = *x;
        let row = self.row(key);
        let n = row.partition_point(|i| i.end <= x.start);

        row[n..]
            .iter()
            .take_while(move |i| overlap::overlaps(i, &x))
            .map(move |i| Interval::new(i.start.max(x.start), i.end.min(x.end)))
    }


    /**
     * Return the buffer position of the cell with the given coordinates.
     */
    pub fn index_of(&self, coords: &Coords) -> Option<usize> {
        self.find(coords[0], &RowKey::from_coords(coords)).map(|i| (i.index + coords[0]) as usize)
    }

    pub fn contains(&self, coords: &Coords) -> bool {
        self.find(coords[0], &RowKey::from_coords(coords)).is_some()
    }


    /**
     * Replace the index of every interval with the index of the interval of
     * `reference` that contains it, so that positions computed in this
     * array address the buffer of `reference`. Return false if some
     * interval is not contained in `reference`.
     */
    pub fn copy_indices_from(&mut self, reference: &LevelCellArray) -> bool {
        let mut complete = true;

        for n in 0..self.rows.len() {
            let key = self.rows[n];

            for i in &mut self.intervals[self.offsets[n]..self.offsets[n + 1]] {
                match reference.find_interval(i, &key) {
                    Some(r) => i.index = r.index,
                    None => complete = false,
                }
            }
        }
        complete
    }

    pub fn for_each_interval<F>(&self, mut f: F)
    where
        F: FnMut(&Interval, &RowKey)
    {
        for (key, row) in self.rows() {
            for i in row {
                f(i, &key)
            }
        }
    }


    /**
     * Call `f` with the coordinates and buffer position of every cell.
     */
    pub fn for_each_cell<F>(&self, mut f: F)
    where
        F: FnMut(Coords, usize)
    {
        self.for_each_interval(|i, key| {
            for x in i.start..i.end {
                f(key.coords(x), (i.index + x) as usize)
            }
        })
    }


    /**
     * Return the smallest box `[lo, hi)` containing every cell, or `None`
     * if the array is empty.
     */
    pub fn bounds(&self) -> Option<(Coords, Coords)> {
        if self.is_empty() {
            return None
        }
        let mut lo = [i64::MAX; 3];
        let mut hi = [i64::MIN; 3];

        self.for_each_interval(|i, key| {
            let c = [(i.start, i.end), (key.y(), key.y() + 1), (key.z(), key.z() + 1)];

            for a in 0..3 {
                lo[a] = lo[a].min(c[a].0);
                hi[a] = hi[a].max(c[a].1);
            }
        });
        Some((lo, hi))
    }
}

impl From<LevelCellList> for LevelCellArray {
    fn from(list: LevelCellList) -> Self {
        Self::from_list(list)
    }
}

impl fmt::Display for LevelCellArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, row) in self.rows() {
            write!(f, "{}:", key)?;

            for i in row {
                write!(f, " {}", i)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::LevelCellArray;
    use crate::interval::{Interval, RowKey};
    use crate::level_cell_list::LevelCellList;
    use proptest::prelude::*;

    fn example() -> LevelCellArray {
        let mut list = LevelCellList::new(2, 3);
        list.add_interval(RowKey::new(1, 0), Interval::new(7, 9));
        list.add_interval(RowKey::new(1, 0), Interval::new(0, 3));
        list.add_interval(RowKey::new(1, 0), Interval::new(2, 5));
        list.add_interval(RowKey::new(-2, 0), Interval::new(-4, -1));
        list.into()
    }

    #[test]
    fn rows_are_coalesced_and_sorted() {
        let lca = example();
        assert_eq!(lca.row(&RowKey::new(1, 0)).len(), 2);
        assert_eq!(lca.row(&RowKey::new(1, 0))[0].end, 5);
        assert_eq!(lca.row_keys(), &[RowKey::new(-2, 0), RowKey::new(1, 0)]);
        assert_eq!(lca.nb_cells(), 10);
        assert!(lca.row(&RowKey::new(0, 0)).is_empty());
    }

    #[test]
    fn indices_partition_the_buffer() {
        let lca = example();
        let mut seen = vec![0; lca.nb_cells()];
        lca.for_each_cell(|_, n| seen[n] += 1);
        assert!(seen.iter().all(|&n| n == 1));
        assert_eq!(lca.index_of(&[-4, -2, 0]), Some(0));
        assert_eq!(lca.index_of(&[0, 1, 0]), Some(3));
        assert_eq!(lca.index_of(&[8, 1, 0]), Some(9));
        assert_eq!(lca.index_of(&[5, 1, 0]), None);
    }

    #[test]
    fn indices_can_be_copied_from_a_superset() {
        let reference = example();
        let mut sub = LevelCellArray::from_rows(2, 3, vec![(RowKey::new(1, 0), vec![Interval::new(3, 4), Interval::new(8, 9)])]);
        assert!(sub.copy_indices_from(&reference));
        assert_eq!(sub.index_of(&[3, 1, 0]), Some(6));
        assert_eq!(sub.index_of(&[8, 1, 0]), Some(9));

        let mut outside = LevelCellArray::from_rows(2, 3, vec![(RowKey::new(1, 0), vec![Interval::new(4, 6)])]);
        assert!(!outside.copy_indices_from(&reference));
    }

    #[test]
    fn overlapping_parts_are_clipped() {
        let lca = example();
        let key = RowKey::new(1, 0);
        let parts: Vec<_> = lca.overlapping(&Interval::new(1, 8), &key).collect();
        assert_eq!(parts, vec![Interval::new(1, 5), Interval::new(7, 8)]);
        assert_eq!(lca.overlapping(&Interval::new(5, 7), &key).count(), 0);
        assert_eq!(lca.overlapping(&Interval::new(0, 9), &RowKey::new(0, 0)).count(), 0);
    }

    #[test]
    fn bounds_cover_all_cells() {
        assert_eq!(example().bounds(), Some(([-4, -2, 0], [9, 2, 1])));
        assert_eq!(LevelCellArray::empty(1, 0).bounds(), None);
    }

    proptest! {
        #[test]
        fn every_cell_gets_a_unique_position(cells in prop::collection::vec((-10i64..10, -3i64..3, -2i64..2), 0..40)) {
            let mut list = LevelCellList::new(3, 0);
            for &(x, y, z) in &cells {
                list.add_point([x, y, z]);
            }
            let lca = LevelCellArray::from(list);
            let mut seen = vec![false; lca.nb_cells()];
            lca.for_each_cell(|c, n| {
                assert!(!seen[n]);
                assert_eq!(lca.index_of(&c), Some(n));
                seen[n] = true;
            });
            prop_assert!(seen.into_iter().all(|s| s));
            for &(x, y, z) in &cells {
                prop_assert!(lca.contains(&[x, y, z]));
            }
        }
    }
}
