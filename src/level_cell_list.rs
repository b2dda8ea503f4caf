use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};
use crate::interval::{Coords, Interval, RowKey};




/**
 * A mutable builder for the cells of one refinement level. Intervals may be
 * added in any order and may overlap; they are only sorted and merged when
 * the list is frozen into a `LevelCellArray`.
 */
#[derive(Clone, Debug, Default)]
pub struct LevelCellList {
    dim: usize,
    level: usize,
    rows: BTreeMap<RowKey, Vec<Interval>>,
}




// ============================================================================
impl LevelCellList {

    pub fn new(dim: usize, level: usize) -> Self {
        Self { dim, level, rows: BTreeMap::new() }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }


    /**
     * Add the interval `x` to the row `key`. Empty intervals are ignored.
     */
    pub fn add_interval(&mut self, key: RowKey, x: Interval) {
        debug_assert!(self.dim > 2 || key.z() == 0, "z component given to a {}D list", self.dim);
        debug_assert!(self.dim > 1 || key.y() == 0, "y component given to a 1D list");

        if x.is_valid() {
            self.rows.entry(key).or_default().push(Interval::new(x.start, x.end))
        }
    }


    /**
     * Add a single cell.
     */
    pub fn add_point(&mut self, coords: Coords) {
        self.add_interval(RowKey::from_coords(&coords), Interval::new(coords[0], coords[0] + 1))
    }


    /**
     * Add the box `[lo, hi)`, restricted to the axes of this list.
     */
    pub fn add_box(&mut self, lo: Coords, hi: Coords) {
        let (jl, jh) = if self.dim > 1 { (lo[1], hi[1]) } else { (0, 1) };
        let (kl, kh) = if self.dim > 2 { (lo[2], hi[2]) } else { (0, 1) };

        for k in kl..kh {
            for j in jl..jh {
                self.add_interval(RowKey::new(j, k), Interval::new(lo[0], hi[0]))
            }
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&RowKey, &Vec<Interval>)> {
        self.rows.iter()
    }

    pub(crate) fn into_rows(self) -> BTreeMap<RowKey, Vec<Interval>> {
        self.rows
    }
}




/**
 * One `LevelCellList` per level, from level 0 up to the maximum refinement
 * level of a mesh.
 */
#[derive(Clone, Debug)]
pub struct CellList {
    levels: Vec<LevelCellList>,
}




// ============================================================================
impl CellList {

    pub fn new(dim: usize, max_level: usize) -> Self {
        Self { levels: (0..=max_level).map(|level| LevelCellList::new(dim, level)).collect() }
    }

    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn into_levels(self) -> Vec<LevelCellList> {
        self.levels
    }
}

impl Index<usize> for CellList {
    type Output = LevelCellList;

    fn index(&self, level: usize) -> &Self::Output {
        &self.levels[level]
    }
}

impl IndexMut<usize> for CellList {
    fn index_mut(&mut self, level: usize) -> &mut Self::Output {
        &mut self.levels[level]
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{CellList, LevelCellList};
    use crate::interval::{Interval, RowKey};

    #[test]
    fn empty_intervals_are_ignored() {
        let mut list = LevelCellList::new(1, 0);
        list.add_interval(RowKey::default(), Interval::new(3, 3));
        assert!(list.is_empty());
    }

    #[test]
    fn boxes_ignore_unused_axes() {
        let mut list = LevelCellList::new(2, 1);
        list.add_box([0, 0, 5], [4, 2, 9]);
        assert_eq!(list.rows().count(), 2);
        assert!(list.rows().all(|(key, _)| key.z() == 0));
    }

    #[test]
    fn cell_list_spans_all_levels() {
        let mut cl = CellList::new(2, 3);
        cl[2].add_point([1, 1, 0]);
        assert_eq!(cl.max_level(), 3);
        assert!(!cl[2].is_empty());
        assert!(cl[3].is_empty());
    }
}
