use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign};
use serde::{Deserialize, Serialize};
use crate::interval::{Coords, Interval, RowKey};




/**
 * Return the length of a cell edge at the given level, for a unit-length
 * level-zero cell.
 */
pub fn cell_length(level: usize) -> f64 {
    1.0 / (1u64 << level) as f64
}




/**
 * A handle to one cell of a mesh: its level, its integer coordinates, and
 * its position in the buffer of any field defined on the mesh.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub dim: usize,
    pub level: usize,
    pub indices: Coords,
    pub index: usize,
    pub length: f64,
}




// ============================================================================
impl Cell {

    pub fn new(dim: usize, level: usize, indices: Coords, index: usize) -> Self {
        Self { dim, level, indices, index, length: cell_length(level) }
    }


    /**
     * Return the physical center of the cell. Axes beyond the dimension are
     * zero.
     */
    pub fn center(&self) -> [f64; 3] {
        let mut center = [0.0; 3];

        for a in 0..self.dim {
            center[a] = (self.indices[a] as f64 + 0.5) * self.length
        }
        center
    }


    /**
     * Return the lower corner of the cell.
     */
    pub fn corner(&self) -> [f64; 3] {
        let mut corner = [0.0; 3];

        for a in 0..self.dim {
            corner[a] = self.indices[a] as f64 * self.length
        }
        corner
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {} {:?} @ {}", self.level, &self.indices[..self.dim], self.index)
    }
}




/**
 * An interval of cells on one level and row, with the physical cell length
 * of that level.
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshInterval {
    pub level: usize,
    pub i: Interval,
    pub key: RowKey,
    pub cell_length: f64,
}




// ============================================================================
impl MeshInterval {

    pub fn new(level: usize, i: Interval, key: RowKey) -> Self {
        Self { level, i, key, cell_length: cell_length(level) }
    }
}




/**
 * A set of adaptation flags attached to a cell. A cell is coarsened only if
 * it carries `COARSEN` and neither `KEEP` nor `REFINE`.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellFlag(pub u8);




// ============================================================================
impl CellFlag {

    pub const NONE: CellFlag = CellFlag(0);
    pub const KEEP: CellFlag = CellFlag(1);
    pub const COARSEN: CellFlag = CellFlag(2);
    pub const REFINE: CellFlag = CellFlag(4);

    pub fn contains(self, other: CellFlag) -> bool {
        self & other == other && other != Self::NONE
    }

    pub fn remove(&mut self, other: CellFlag) {
        self.0 &= !other.0
    }

    pub fn is_coarsening(self) -> bool {
        self.contains(Self::COARSEN) && !self.contains(Self::KEEP) && !self.contains(Self::REFINE)
    }

    pub fn is_refining(self) -> bool {
        self.contains(Self::REFINE)
    }
}

impl BitOr for CellFlag {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOrAssign for CellFlag {
    fn bitor_assign(&mut self, other: Self) {
        self.0 |= other.0
    }
}

impl BitAnd for CellFlag {
    type Output = Self;

    fn bitand(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }
}
