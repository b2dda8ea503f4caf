use core::cmp::Ordering;
use core::fmt;
use core::ops::{Add, Shl, Shr, Sub};
use serde::{Deserialize, Serialize};




/// Integer cell coordinates (x, y, z). Trailing axes beyond the mesh
/// dimension are zero.
pub type Coords = [i64; 3];




/**
 * A half-open run `[start, end)` of integer cell coordinates along the x
 * axis, visited with the given step. The `index` member is an additive
 * offset into a data buffer: the buffer position of coordinate `x` in the
 * run is `index + x`.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
    pub step: i64,
    pub index: i64,
}




// ============================================================================
impl Interval {

    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end, step: 1, index: 0 }
    }

    pub fn with_index(self, index: i64) -> Self {
        Self { index, ..self }
    }


    /**
     * Return the number of coordinates visited by this interval.
     */
    pub fn len(&self) -> usize {
        if self.is_valid() {
            let step = self.step.max(1);
            ((self.end - self.start + step - 1) / step) as usize
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.is_valid()
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }


    /**
     * Determine whether the given coordinate is visited by this interval.
     */
    pub fn contains(&self, x: i64) -> bool {
        self.start <= x && x < self.end && (x - self.start) % self.step.max(1) == 0
    }


    /**
     * Determine whether another interval lies inside this one (steps are
     * ignored).
     */
    pub fn contains_interval(&self, other: &Self) -> bool {
        other.start >= self.start && other.end <= self.end
    }


    /**
     * Return the even coordinates of this interval, with a step of 2. The
     * result is invalid if there are none.
     */
    pub fn even_elements(&self) -> Self {
        Self { start: self.start + (self.start & 1), step: 2, ..*self }
    }


    /**
     * Return the odd coordinates of this interval, with a step of 2.
     */
    pub fn odd_elements(&self) -> Self {
        Self { start: self.start + ((self.start & 1) ^ 1), step: 2, ..*self }
    }


    /**
     * Express this interval on a level `shift` times coarser. A coarse
     * coordinate is included whenever any of its children is, so the result
     * is never empty when this interval is not.
     */
    pub fn coarsen(&self, shift: u32) -> Self {
        Self {
            start: self.start >> shift,
            end: ((self.end - 1) >> shift) + 1,
            step: 1,
            index: self.index,
        }
    }


    /**
     * Express this interval on a level `shift` times finer.
     */
    pub fn refine(&self, shift: u32) -> Self {
        Self {
            start: self.start << shift,
            end: self.end << shift,
            step: 1,
            index: self.index,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> {
        (self.start..self.end).step_by(self.step.max(1) as usize)
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{})@{}:{}", self.start, self.end, self.index, self.step)
    }
}

impl Add<i64> for Interval {
    type Output = Self;

    fn add(self, dx: i64) -> Self {
        Self { start: self.start + dx, end: self.end + dx, ..self }
    }
}

impl Sub<i64> for Interval {
    type Output = Self;

    fn sub(self, dx: i64) -> Self {
        self + (-dx)
    }
}

/// `i >> s` is [`Interval::coarsen`].
impl Shr<u32> for Interval {
    type Output = Self;

    fn shr(self, shift: u32) -> Self {
        self.coarsen(shift)
    }
}

/// `i << s` is [`Interval::refine`].
impl Shl<u32> for Interval {
    type Output = Self;

    fn shl(self, shift: u32) -> Self {
        self.refine(shift)
    }
}




/**
 * The coordinates `(y, z)` identifying one row of x-intervals. Rows are
 * ordered by `z` first, then `y`, so that traversal in key order keeps x
 * the fastest axis and z the slowest. Components beyond the mesh dimension
 * are zero.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowKey(pub [i64; 2]);




// ============================================================================
impl RowKey {

    pub fn new(y: i64, z: i64) -> Self {
        Self([y, z])
    }

    pub fn from_coords(coords: &Coords) -> Self {
        Self([coords[1], coords[2]])
    }

    pub fn y(&self) -> i64 {
        self.0[0]
    }

    pub fn z(&self) -> i64 {
        self.0[1]
    }

    pub fn translate(&self, dy: i64, dz: i64) -> Self {
        Self([self.0[0] + dy, self.0[1] + dz])
    }

    pub fn coarsen(&self, shift: u32) -> Self {
        Self([self.0[0] >> shift, self.0[1] >> shift])
    }

    pub fn refine(&self, shift: u32) -> Self {
        Self([self.0[0] << shift, self.0[1] << shift])
    }

    /**
     * Return the full coordinates of the cell at `x` in this row.
     */
    pub fn coords(&self, x: i64) -> Coords {
        [x, self.0[0], self.0[1]]
    }


    /**
     * Iterate over the keys of the rows `shift` levels finer that lie under
     * this row, in key order. Only the first `dim - 1` components fan out.
     */
    pub fn children(&self, shift: u32, dim: usize) -> impl Iterator<Item = RowKey> {
        let base = self.refine(shift);
        let n = 1i64 << shift;
        let ny = if dim > 1 { n } else { 1 };
        let nz = if dim > 2 { n } else { 1 };
        (0..nz).flat_map(move |k| (0..ny).map(move |j| base.translate(j, k)))
    }
}

impl Ord for RowKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.0[1], self.0[0]).cmp(&(other.0[1], other.0[0]))
    }
}

impl PartialOrd for RowKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0[0], self.0[1])
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{Interval, RowKey};

    #[test]
    fn coarsening_covers_partial_cells() {
        assert_eq!(Interval::new(0, 3).coarsen(1), Interval::new(0, 2));
        assert_eq!(Interval::new(1, 2).coarsen(1), Interval::new(0, 1));
        assert_eq!(Interval::new(-3, 5).coarsen(2), Interval::new(-1, 2));
        assert_eq!(Interval::new(5, 6) >> 4, Interval::new(0, 1));
    }

    #[test]
    fn refinement_scales_bounds() {
        assert_eq!(Interval::new(-1, 2) << 2, Interval::new(-4, 8));
    }

    #[test]
    fn even_and_odd_elements_split_the_interval() {
        let i = Interval::new(3, 10);
        let even = i.even_elements();
        let odd = i.odd_elements();
        assert_eq!(even.iter().collect::<Vec<_>>(), vec![4, 6, 8]);
        assert_eq!(odd.iter().collect::<Vec<_>>(), vec![3, 5, 7, 9]);
        assert_eq!(even.len() + odd.len(), i.len());
        assert!(!Interval::new(4, 5).odd_elements().is_valid());
        assert!(Interval::new(-3, -2).odd_elements().contains(-3));
    }

    #[test]
    fn zero_step_visits_every_coordinate() {
        let i = Interval { step: 0, ..Interval::new(2, 6) };
        assert_eq!(i.len(), 4);
        assert!(i.contains(3));
        assert!(!i.contains(6));
        assert_eq!(i.iter().count(), i.len());
    }

    #[test]
    fn translation_moves_both_ends() {
        assert_eq!(Interval::new(2, 5) + 3, Interval::new(5, 8));
        assert_eq!(Interval::new(2, 5) - 3, Interval::new(-1, 2));
    }

    #[test]
    fn row_keys_order_by_z_then_y() {
        let mut keys = vec![RowKey::new(1, 0), RowKey::new(0, 1), RowKey::new(0, 0), RowKey::new(-1, 1)];
        keys.sort();
        assert_eq!(keys, vec![RowKey::new(0, 0), RowKey::new(1, 0), RowKey::new(-1, 1), RowKey::new(0, 1)]);
    }

    #[test]
    fn row_children_fan_out_per_dimension() {
        assert_eq!(RowKey::new(0, 0).children(1, 1).count(), 1);
        assert_eq!(RowKey::new(1, 0).children(1, 2).collect::<Vec<_>>(), vec![RowKey::new(2, 0), RowKey::new(3, 0)]);
        assert_eq!(RowKey::new(1, 1).children(1, 3).count(), 4);
        assert_eq!(RowKey::new(-1, 0).coarsen(1), RowKey::new(-1, 0));
    }
}
