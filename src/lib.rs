//! Latticework is the mesh core of an adaptive multiresolution solver. A mesh
//! is a leaf partition of a domain into cells of varying refinement levels,
//! stored level by level as run-length encoded rows of intervals. Set
//! algebra on those rows (intersection, union, difference, translation,
//! contraction and projection across levels) drives everything else: the
//! derivation of ghost and halo sub-meshes, the prediction and projection of
//! field values between levels, the 2:1 graduation of adaptation flags, and
//! the resolution of stencils into field buffer positions.
//!
//! Meshes are never edited in place. Adaptation builds a new mesh from the
//! flags of the old one, and fields are transferred onto it.

pub mod adapt;
pub mod cell;
pub mod cell_array;
pub mod config;
pub mod error;
pub mod field;
pub mod ghosts;
pub mod graduation;
pub mod index_space;
pub mod interval;
pub mod level_cell_array;
pub mod level_cell_list;
pub mod mesh;
pub mod overlap;
pub mod prediction;
pub mod projection;
pub mod stencil;
pub mod subset;

pub use cell::{Cell, CellFlag, MeshInterval};
pub use cell_array::CellArray;
pub use config::MeshConfig;
pub use error::{Error, Result};
pub use field::{Field, FieldOperator};
pub use index_space::{BoundingBox, IndexSpace};
pub use interval::{Coords, Interval, RowKey};
pub use level_cell_array::LevelCellArray;
pub use level_cell_list::{CellList, LevelCellList};
pub use mesh::{Mesh, MeshId};
pub use stencil::Stencil;
pub use subset::Subset;
