use core::fmt;
use std::ops::{Index, IndexMut};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::interval::{Interval, RowKey};
use crate::level_cell_array::LevelCellArray;
use crate::level_cell_list::CellList;




/**
 * One `LevelCellArray` per level, from level 0 up to a maximum level. Levels
 * without cells are stored as empty arrays.
 */
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellArray {
    dim: usize,
    levels: Vec<LevelCellArray>,
}




// ============================================================================
impl CellArray {

    pub fn new(dim: usize, max_level: usize) -> Self {
        Self { dim, levels: (0..=max_level).map(|level| LevelCellArray::empty(dim, level)).collect() }
    }


    /**
     * Freeze every level of a cell list. Levels are independent, so they are
     * built in parallel.
     */
    pub fn from_cell_list(dim: usize, cell_list: CellList) -> Self {
        let levels = cell_list
            .into_levels()
            .into_par_iter()
            .map(LevelCellArray::from_list)
            .collect();
        Self { dim, levels }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn max_level(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn nb_cells(&self) -> usize {
        self.levels.iter().map(LevelCellArray::nb_cells).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(LevelCellArray::is_empty)
    }


    /**
     * Return the coarsest and finest levels holding cells.
     */
    pub fn level_range(&self) -> Option<(usize, usize)> {
        let mut non_empty = self.levels.iter().filter(|lca| !lca.is_empty()).map(LevelCellArray::level);
        let min = non_empty.next()?;
        let max = non_empty.last().unwrap_or(min);
        Some((min, max))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelCellArray> {
        self.levels.iter()
    }

    pub fn for_each_interval<F>(&self, mut f: F)
    where
        F: FnMut(usize, &Interval, &RowKey)
    {
        for lca in &self.levels {
            lca.for_each_interval(|i, key| f(lca.level(), i, key))
        }
    }
}

impl Index<usize> for CellArray {
    type Output = LevelCellArray;

    fn index(&self, level: usize) -> &Self::Output {
        &self.levels[level]
    }
}

impl IndexMut<usize> for CellArray {
    fn index_mut(&mut self, level: usize) -> &mut Self::Output {
        &mut self.levels[level]
    }
}

impl fmt::Display for CellArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for lca in self.levels.iter().filter(|lca| !lca.is_empty()) {
            writeln!(f, "level {}", lca.level())?;
            write!(f, "{}", lca)?;
        }
        Ok(())
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::CellArray;
    use crate::level_cell_list::CellList;

    #[test]
    fn cell_array_counts_all_levels() {
        let mut cl = CellList::new(1, 4);
        cl[2].add_box([0, 0, 0], [3, 1, 1]);
        cl[4].add_box([20, 0, 0], [24, 1, 1]);
        let ca = CellArray::from_cell_list(1, cl);
        assert_eq!(ca.nb_cells(), 7);
        assert_eq!(ca.level_range(), Some((2, 4)));
        assert_eq!(ca[2].level(), 2);
        assert!(ca[3].is_empty());
    }

    #[test]
    fn empty_cell_array_has_no_levels() {
        let ca = CellArray::new(2, 3);
        assert!(ca.is_empty());
        assert_eq!(ca.level_range(), None);
    }
}
