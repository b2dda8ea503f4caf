use core::ops::Range;
use serde::{Deserialize, Serialize};
use crate::config::MAX_DIM;
use crate::error::{Error, Result};
use crate::interval::{Coords, Interval, RowKey};
use crate::level_cell_array::LevelCellArray;




/**
 * Represents a rectangular region in a discrete index space of one to three
 * dimensions. Axes beyond the dimension span the single index zero.
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSpace {
    dim: usize,
    ranges: [Range<i64>; 3],
}




/**
 * Describes a rectangular index space. The index type is signed 64-bit integer.
 */
impl IndexSpace {


    pub fn new(ranges: &[Range<i64>]) -> Self {

        assert!(
            !ranges.is_empty() && ranges.len() <= MAX_DIM,
            "index space must have one to three axes");

        assert!(
            ranges.iter().all(|r| r.start <= r.end),
            "index space has negative volume");

        let mut all = [0..1, 0..1, 0..1];

        for (a, r) in ranges.iter().enumerate() {
            all[a] = r.clone();
        }
        Self { dim: ranges.len(), ranges: all }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }


    /**
     * Return the number of indexes on each axis.
     */
    pub fn shape(&self) -> [usize; 3] {
        [0, 1, 2].map(|a| (self.ranges[a].end - self.ranges[a].start) as usize)
    }


    /**
     * Return the number of elements in this index space.
     */
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }


    /**
     * Return the minimum index (inclusive).
     */
    pub fn start(&self) -> Coords {
        [0, 1, 2].map(|a| self.ranges[a].start)
    }


    /**
     * Return the maximum index (exclusive).
     */
    pub fn end(&self) -> Coords {
        [0, 1, 2].map(|a| self.ranges[a].end)
    }

    pub fn axis(&self, a: usize) -> &Range<i64> {
        &self.ranges[a]
    }


    /**
     * Determine whether this index space contains the given index.
     */
    pub fn contains(&self, index: &Coords) -> bool {
        (0..3).all(|a| self.ranges[a].contains(&index[a]))
    }


    /**
     * Determine whether another index space is a subset of this one.
     */
    pub fn contains_space(&self, other: &Self) -> bool {
        (0..self.dim).all(|a| {
            other.ranges[a].start >= self.ranges[a].start &&
            other.ranges[a].end <= self.ranges[a].end
        })
    }


    /**
     * Expand this index space by the given number of elements on each axis.
     */
    pub fn extend_all(&self, delta: i64) -> Self {
        let ranges: Vec<_> = self.ranges[..self.dim]
            .iter()
            .map(|r| r.start - delta..(r.end + delta).max(r.start - delta))
            .collect();
        Self::new(&ranges)
    }


    /**
     * Trim this index space by the given number of elements on each axis.
     */
    pub fn trim_all(&self, delta: i64) -> Self {
        self.extend_all(-delta)
    }


    /**
     * Increase the size of this index space by the given factor, expressing
     * it on a finer level when the factor is a power of two.
     */
    pub fn scale(&self, factor: i64) -> Self {
        let ranges: Vec<_> = self.ranges[..self.dim]
            .iter()
            .map(|r| r.start * factor..r.end * factor)
            .collect();
        Self::new(&ranges)
    }


    /**
     * Return an iterator which traverses the index space with the first
     * index increasing fastest, matching the row order of a
     * `LevelCellArray`.
     */
    pub fn iter(&self) -> impl Iterator<Item = Coords> + '_ {
        let [di, dj, dk] = self.ranges.clone();
        dk.flat_map(move |k| {
            let di = di.clone();
            dj.clone().flat_map(move |j| di.clone().map(move |i| [i, j, k]))
        })
    }


    /**
     * Return the cells of this index space as a level cell array: one
     * interval per row.
     */
    pub fn to_level_cell_array(&self, level: usize) -> LevelCellArray {
        if self.is_empty() {
            return LevelCellArray::empty(self.dim, level)
        }
        let x = Interval::new(self.ranges[0].start, self.ranges[0].end);
        let rows = self.ranges[2].clone().flat_map(|k| {
            self.ranges[1].clone().map(move |j| (RowKey::new(j, k), vec![x]))
        });
        LevelCellArray::from_rows(self.dim, level, rows)
    }
}




/**
 * An axis-aligned physical box. Cells at level `L` have length `1 / 2^L`
 * along each axis.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}




// ============================================================================
impl BoundingBox {

    pub fn new(min: &[f64], max: &[f64]) -> Self {
        Self { min: min.to_vec(), max: max.to_vec() }
    }

    pub fn dim(&self) -> usize {
        self.min.len()
    }


    /**
     * Return the cells of the given level covering this box. Cells cut by
     * the box boundary are included.
     */
    pub fn index_space(&self, level: usize) -> Result<IndexSpace> {
        if self.dim() == 0 || self.dim() > MAX_DIM || self.max.len() != self.dim() {
            return Err(Error::UnsupportedDimension(self.dim()))
        }
        let n = (1u64 << level) as f64;
        let ranges: Vec<_> = self.min
            .iter()
            .zip(&self.max)
            .map(|(lo, hi)| (lo * n).floor() as i64..(hi * n).ceil() as i64)
            .collect();

        if ranges.iter().any(|r| r.start >= r.end) {
            return Err(Error::EmptyDomain)
        }
        Ok(IndexSpace::new(&ranges))
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{BoundingBox, IndexSpace};
    use crate::error::Error;

    #[test]
    fn index_space_iterates_with_x_fastest() {
        let space = IndexSpace::new(&[0..2, 5..7]);
        let cells: Vec<_> = space.iter().collect();
        assert_eq!(cells, vec![[0, 5, 0], [1, 5, 0], [0, 6, 0], [1, 6, 0]]);
        assert_eq!(space.len(), 4);
    }

    #[test]
    fn index_space_extends_and_scales() {
        let space = IndexSpace::new(&[0..2, 0..3]).extend_all(1).scale(2);
        assert_eq!(space.start(), [-2, -2, 0]);
        assert_eq!(space.end(), [6, 8, 1]);
        assert!(space.contains_space(&IndexSpace::new(&[0..4, 0..6])));
    }

    #[test]
    fn index_space_converts_to_level_cell_array() {
        let lca = IndexSpace::new(&[-1..3, 0..2, 0..2]).to_level_cell_array(4);
        assert_eq!(lca.nb_cells(), 16);
        assert_eq!(lca.nb_intervals(), 4);
        assert_eq!(lca.level(), 4);
    }

    #[test]
    fn bounding_box_covers_partial_cells() {
        let bbox = BoundingBox::new(&[0.0, 0.0], &[1.0, 0.3]);
        let space = bbox.index_space(2).unwrap();
        assert_eq!(space.end(), [4, 2, 1]);
        assert_eq!(BoundingBox::new(&[0.5], &[0.5]).index_space(3), Err(Error::EmptyDomain));
    }
}
