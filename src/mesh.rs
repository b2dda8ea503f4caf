use core::fmt;
use std::ops::Index;
use log::debug;
use serde::{Deserialize, Serialize};
use crate::cell::Cell;
use crate::cell_array::CellArray;
use crate::config::MeshConfig;
use crate::error::{Error, Result};
use crate::index_space::BoundingBox;
use crate::interval::{Coords, Interval, RowKey};
use crate::level_cell_array::LevelCellArray;
use crate::level_cell_list::{CellList, LevelCellList};
use crate::subset::{difference, intersection, union_, Subset};




/**
 * Names the sub-meshes held by a `Mesh`. The leaf partition is `Cells`;
 * every other sub-mesh is derived from it by `Mesh::update_sub_mesh`.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshId {
    /// The leaves: each point of the domain is in exactly one of them.
    Cells,
    /// Leaves plus the halos needed by the scheme and by the prediction.
    CellsAndGhosts,
    /// Non-leaf positions covered by finer leaves, filled by projection.
    ProjCells,
    /// Ghost positions under coarser leaves, filled by prediction.
    PredCells,
    /// Every position that holds field data.
    AllCells,
    /// The region covered by strictly finer leaves, on each level.
    Union,
}




// ============================================================================
impl MeshId {

    /// The sub-mesh that owns the field buffer positions.
    pub const REFERENCE: MeshId = MeshId::AllCells;

    pub const ALL: [MeshId; 6] = [
        MeshId::Cells,
        MeshId::CellsAndGhosts,
        MeshId::ProjCells,
        MeshId::PredCells,
        MeshId::AllCells,
        MeshId::Union,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeshId::Cells          => "cells",
            MeshId::CellsAndGhosts => "cells and ghosts",
            MeshId::ProjCells      => "proj cells",
            MeshId::PredCells      => "pred cells",
            MeshId::AllCells       => "all cells",
            MeshId::Union          => "union cells",
        };
        write!(f, "{}", name)
    }
}




/**
 * An adaptive mesh: a leaf partition of a domain into cells of levels
 * between `min_level` and `max_level`, with the derived sub-meshes listed in
 * `MeshId`. A mesh is never edited in place; adaptation builds a new one.
 */
#[derive(Clone, Debug)]
pub struct Mesh {
    config: MeshConfig,
    min_level: usize,
    max_level: usize,
    domain: LevelCellArray,
    cells: [CellArray; 6],
}




// ============================================================================
impl Mesh {


    /**
     * Create a mesh covering a physical box with a uniform layer of cells at
     * `start_level`.
     */
    pub fn new(config: MeshConfig, bbox: &BoundingBox, start_level: usize, min_level: usize, max_level: usize) -> Result<Self> {
        config.validate()?;
        config.validate_levels(min_level, max_level)?;

        if bbox.dim() != config.dim {
            return Err(Error::DimensionMismatch { left: config.dim, right: bbox.dim() })
        }
        if start_level < min_level || start_level > max_level {
            return Err(Error::InvalidLevels { min: start_level, max: max_level, limit: config.max_refinement_level })
        }
        let domain = bbox.index_space(start_level)?.to_level_cell_array(start_level);
        let mut cells = CellArray::new(config.dim, max_level);
        cells[start_level] = domain.clone();

        Ok(Self::with_leaves(config, domain, cells, min_level, max_level))
    }


    /**
     * Create a mesh from an explicit list of leaves. The leaves must
     * partition the domain and lie between `min_level` and `max_level`.
     */
    pub fn from_cell_list(config: MeshConfig, cell_list: CellList, domain: LevelCellArray, min_level: usize, max_level: usize) -> Result<Self> {
        config.validate()?;
        config.validate_levels(min_level, max_level)?;

        if domain.dim() != config.dim {
            return Err(Error::DimensionMismatch { left: config.dim, right: domain.dim() })
        }
        if domain.is_empty() {
            return Err(Error::EmptyDomain)
        }
        let leaves = CellArray::from_cell_list(config.dim, cell_list);
        let mut cells = CellArray::new(config.dim, max_level);

        if let Some((lo, hi)) = leaves.level_range() {
            if lo < min_level || hi > max_level {
                return Err(Error::InvalidLevels { min: lo, max: hi, limit: max_level })
            }
            for level in lo..=hi {
                cells[level] = leaves[level].clone()
            }
        }
        Ok(Self::with_leaves(config, domain, cells, min_level, max_level))
    }


    /**
     * Create a mesh with the same configuration, domain and level bounds as
     * this one, but different leaves.
     */
    pub fn with_cells(&self, cells: CellArray) -> Self {
        Self::with_leaves(self.config.clone(), self.domain.clone(), cells, self.min_level, self.max_level)
    }

    fn with_leaves(config: MeshConfig, domain: LevelCellArray, cells: CellArray, min_level: usize, max_level: usize) -> Self {
        let empty = CellArray::new(config.dim, max_level);
        let mut mesh = Self {
            config,
            min_level,
            max_level,
            domain,
            cells: [cells, empty.clone(), empty.clone(), empty.clone(), empty.clone(), empty],
        };
        mesh.update_sub_mesh();
        mesh
    }


    /**
     * Recompute every derived sub-mesh from the leaves, and assign the
     * buffer positions of the reference sub-mesh.
     */
    pub fn update_sub_mesh(&mut self) {
        let dim = self.config.dim;
        let (gw, pw) = (self.config.ghost_width, self.config.prediction_width);
        let (min, max) = (self.min_level, self.max_level);
        let mut cells = self.cells[MeshId::Cells.slot()].clone();


        // Leaves with the scheme halo, a star along each axis, and the
        // prediction halo, a box.
        let mut cag = CellList::new(dim, max);

        cells.for_each_interval(|level, i, key| {
            let lcl = &mut cag[level];
            lcl.add_interval(*key, Interval::new(i.start - gw, i.end + gw));
            for_each_row_offset(dim, gw, |dy, dz| {
                if dy == 0 || dz == 0 {
                    lcl.add_interval(key.translate(dy, dz), *i)
                }
            });
            add_prediction_halo(lcl, dim, pw, i, key);
        });


        // Positions covered by finer leaves.
        let mut union = CellArray::new(dim, max);

        for level in ((min + 1)..=max).rev() {
            let coarse = union_(&cells[level], &union[level]).on(level - 1).to_level_cell_array();
            union[level - 1] = coarse;
        }


        // Prediction cells, finest level first: the coarse halo that feeds
        // the prediction on a level is added to the ghosts of the level
        // below before that level is frozen.
        let mut cag = cag.into_levels();
        let mut ghosts = CellArray::new(dim, max);
        let mut pred = CellArray::new(dim, max);

        for level in (min..=max).rev() {
            let lca = LevelCellArray::from_list(std::mem::take(&mut cag[level]));
            let p = intersection(difference(&lca, union_(&union[level], &cells[level])), &self.domain)
                .on(level)
                .to_level_cell_array();

            if level > min {
                let lcl = &mut cag[level - 1];
                Subset::from(&p).on(level - 1).for_each_interval(|_, i, key| {
                    add_prediction_halo(lcl, dim, pw, i, key)
                });
            }
            ghosts[level] = lca;
            pred[level] = p;
        }


        // Projection cells, coarsest level first.
        let mut proj = CellArray::new(dim, max);

        for level in min..=max {
            let p = if level == 0 {
                intersection(&ghosts[level], &union[level]).to_level_cell_array()
            } else {
                intersection(union_(&ghosts[level], &proj[level - 1]), &union[level])
                    .on(level)
                    .to_level_cell_array()
            };
            proj[level] = p;
        }


        // The reference sub-mesh, with levels stacked in the field buffer.
        let mut all = CellArray::new(dim, max);
        let mut base = 0;

        for level in 0..=max {
            let mut lca = union_(&ghosts[level], &proj[level]).to_level_cell_array();
            lca.shift_indices(base);
            base += lca.nb_cells() as i64;
            all[level] = lca;
        }

        let mut complete = true;

        for level in 0..=max {
            complete &= cells[level].copy_indices_from(&all[level]);
            complete &= ghosts[level].copy_indices_from(&all[level]);
            complete &= proj[level].copy_indices_from(&all[level]);
            complete &= pred[level].copy_indices_from(&all[level]);
        }
        debug_assert!(complete, "a sub-mesh is not contained in the reference mesh");

        debug!(
            "sub-meshes rebuilt: {} cells, {} with ghosts, {} proj, {} pred, {} total",
            cells.nb_cells(),
            ghosts.nb_cells(),
            proj.nb_cells(),
            pred.nb_cells(),
            all.nb_cells());

        self.cells = [cells, ghosts, proj, pred, all, union];
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    pub fn dim(&self) -> usize {
        self.config.dim
    }

    pub fn min_level(&self) -> usize {
        self.min_level
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    pub fn domain(&self) -> &LevelCellArray {
        &self.domain
    }

    pub fn nb_cells(&self, id: MeshId) -> usize {
        self[id].nb_cells()
    }

    pub fn nb_cells_on_level(&self, id: MeshId, level: usize) -> usize {
        self[id][level].nb_cells()
    }


    /**
     * Return the size of the buffer of a field defined on this mesh.
     */
    pub fn nb_total_cells(&self) -> usize {
        self.nb_cells(MeshId::REFERENCE)
    }


    /**
     * Determine whether the whole of `i` is stored in one interval of the
     * given sub-mesh.
     */
    pub fn exists(&self, id: MeshId, level: usize, i: &Interval, key: &RowKey) -> bool {
        level <= self.max_level && self[id][level].find_interval(i, key).is_some()
    }


    /**
     * Return the reference interval holding `i`, whose index addresses the
     * field buffer.
     */
    pub fn get_interval(&self, level: usize, i: &Interval, key: &RowKey) -> Option<&Interval> {
        if level > self.max_level {
            return None
        }
        self[MeshId::REFERENCE][level].find_interval(i, key)
    }


    /**
     * Return the buffer position of a cell.
     */
    pub fn get_index(&self, level: usize, coords: &Coords) -> Option<usize> {
        if level > self.max_level {
            return None
        }
        self[MeshId::REFERENCE][level].index_of(coords)
    }

    pub fn cell(&self, level: usize, coords: &Coords) -> Option<Cell> {
        self.get_index(level, coords).map(|index| Cell::new(self.dim(), level, *coords, index))
    }


    /**
     * Determine whether a position of the given level overlaps the domain.
     */
    pub fn in_domain(&self, level: usize, coords: &Coords) -> bool {
        let key = RowKey::from_coords(coords);
        Subset::from(&self.domain)
            .on(level)
            .eval_row(level, &key)
            .iter()
            .any(|i| i.contains(coords[0]))
    }

    pub fn for_each_level<F>(&self, id: MeshId, mut f: F)
    where
        F: FnMut(usize, &LevelCellArray)
    {
        for lca in self[id].iter().filter(|lca| !lca.is_empty()) {
            f(lca.level(), lca)
        }
    }

    pub fn for_each_interval<F>(&self, id: MeshId, f: F)
    where
        F: FnMut(usize, &Interval, &RowKey)
    {
        self[id].for_each_interval(f)
    }

    pub fn for_each_cell<F>(&self, id: MeshId, mut f: F)
    where
        F: FnMut(&Cell)
    {
        for level in 0..=self.max_level {
            self.for_each_cell_on_level(id, level, &mut f)
        }
    }

    pub fn for_each_cell_on_level<F>(&self, id: MeshId, level: usize, mut f: F)
    where
        F: FnMut(&Cell)
    {
        let dim = self.dim();
        self[id][level].for_each_cell(|coords, index| f(&Cell::new(dim, level, coords, index)))
    }
}

impl Index<MeshId> for Mesh {
    type Output = CellArray;

    fn index(&self, id: MeshId) -> &Self::Output {
        &self.cells[id.slot()]
    }
}

impl fmt::Display for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mesh: dim {}, levels {}..={}", self.dim(), self.min_level, self.max_level)?;

        for id in MeshId::ALL {
            writeln!(f, "{} ({} cells)", id, self.nb_cells(id))?;
            write!(f, "{}", self[id])?;
        }
        Ok(())
    }
}




/**
 * Call `f` with every (y, z) offset within `width` on the axes other than
 * x.
 */
pub(crate) fn for_each_row_offset<F>(dim: usize, width: i64, mut f: F)
where
    F: FnMut(i64, i64)
{
    let wy = if dim > 1 { width } else { 0 };
    let wz = if dim > 2 { width } else { 0 };

    for dz in -wz..=wz {
        for dy in -wy..=wy {
            f(dy, dz)
        }
    }
}

fn add_prediction_halo(lcl: &mut LevelCellList, dim: usize, pw: i64, i: &Interval, key: &RowKey) {
    for_each_row_offset(dim, pw, |dy, dz| {
        lcl.add_interval(key.translate(dy, dz), Interval::new(i.start - pw, i.end + pw))
    })
}
