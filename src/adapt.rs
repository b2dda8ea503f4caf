use log::info;
use crate::cell::CellFlag;
use crate::cell_array::CellArray;
use crate::error::Result;
use crate::field::{Field, FieldOperator};
use crate::interval::{Coords, Interval, RowKey};
use crate::level_cell_list::CellList;
use crate::mesh::{Mesh, MeshId};
use crate::prediction::{children, coefficients_for, Prediction};
use crate::projection::Projection;
use crate::stencil::cartesian_directions;
use crate::subset::{intersection, translate, Subset};




/**
 * Applied to parent positions. When all the children of a parent are leaves
 * and their values stay within `eps` of their mean, the children are tagged
 * for coarsening. The children are visited one fine row at a time, over the
 * runs of leaves under the parent interval.
 */
struct Coarsening<'a, 'u, 't> {
    field: &'a Field<'u, f64>,
    tag: &'a mut Field<'t, CellFlag>,
    eps: f64,
    leaves: Vec<usize>,
    sums: Vec<f64>,
    details: Vec<f64>,
}

impl<'a, 'u, 't> FieldOperator for Coarsening<'a, 'u, 't> {
    fn apply(&mut self, level: usize, i: &Interval, key: &RowKey) {
        let mesh = self.field.mesh();
        let dim = mesh.dim();
        let cells = &mesh[MeshId::Cells][level + 1];
        let fine = *i << 1;
        let siblings = 1 << dim;
        let parent = |x: i64| ((x >> 1) - i.start) as usize;

        self.leaves.clear();
        self.leaves.resize(i.len(), 0);
        self.sums.clear();
        self.sums.resize(i.len(), 0.0);
        self.details.clear();
        self.details.resize(i.len(), 0.0);

        for child_key in key.children(1, dim) {
            for run in cells.overlapping(&fine, &child_key) {
                for (x, u) in run.iter().zip(self.field.interval(level + 1, &run, &child_key)) {
                    self.leaves[parent(x)] += 1;
                    self.sums[parent(x)] += u;
                }
            }
        }

        for child_key in key.children(1, dim) {
            for run in cells.overlapping(&fine, &child_key) {
                for (x, u) in run.iter().zip(self.field.interval(level + 1, &run, &child_key)) {
                    let mean = self.sums[parent(x)] / siblings as f64;
                    let detail = &mut self.details[parent(x)];
                    *detail = detail.max((u - mean).abs());
                }
            }
        }

        for child_key in key.children(1, dim) {
            for run in cells.overlapping(&fine, &child_key) {
                for (x, t) in run.iter().zip(self.tag.interval_mut(level + 1, &run, &child_key)) {
                    if self.leaves[parent(x)] == siblings && self.details[parent(x)] < self.eps {
                        *t = CellFlag::COARSEN
                    }
                }
            }
        }
    }
}




/**
 * Applied to the leaves whose neighbor at `p + offset` is stored on the same
 * level inside the domain. A leaf is tagged for refinement when its value
 * jumps by more than `eps` to that neighbor.
 */
struct Refinement<'a, 'u, 't> {
    field: &'a Field<'u, f64>,
    tag: &'a mut Field<'t, CellFlag>,
    eps: f64,
    offset: Coords,
}

impl<'a, 'u, 't> FieldOperator for Refinement<'a, 'u, 't> {
    fn apply(&mut self, level: usize, i: &Interval, key: &RowKey) {
        let [dx, dy, dz] = self.offset;
        let u = self.field.interval(level, i, key);
        let neighbors = self.field.interval(level, &(*i + dx), &key.translate(dy, dz));

        for ((t, u), n) in self.tag.interval_mut(level, i, key).iter_mut().zip(u).zip(neighbors) {
            if (n - u).abs() > self.eps {
                *t |= CellFlag::REFINE
            }
        }
    }
}




/**
 * Reset the tags of the leaves to `KEEP`, then tag for coarsening every
 * complete group of sibling leaves whose largest detail, the distance of a
 * child value to the group mean, is below `eps`.
 */
pub fn coarsening_criterion(field: &Field<f64>, tag: &mut Field<CellFlag>, eps: f64) {
    let mesh = field.mesh();
    let cells = &mesh[MeshId::Cells];

    tag.fill(CellFlag::NONE);
    tag.fill_with(MeshId::Cells, |_| CellFlag::KEEP);

    for level in (mesh.min_level() + 1)..=mesh.max_level() {
        intersection(&cells[level], &cells[level])
            .on(level - 1)
            .apply_op(&mut Coarsening {
                field,
                tag: &mut *tag,
                eps,
                leaves: Vec::new(),
                sums: Vec::new(),
                details: Vec::new(),
            });
    }
}


/**
 * Tag for refinement the leaves below the finest level whose value jumps by
 * more than `eps` to a same-level face neighbor. Neighbors that are not
 * leaves are read from the ghost positions, so the field should have been
 * brought up to date with `update_ghost_mr` first.
 */
pub fn refinement_criterion(field: &Field<f64>, tag: &mut Field<CellFlag>, eps: f64) {
    let mesh = field.mesh();

    for level in mesh.min_level()..mesh.max_level() {
        for offset in cartesian_directions(mesh.dim()) {
            let back = offset.map(|d| -d);
            let neighbors = intersection(
                translate(&mesh[MeshId::REFERENCE][level], back),
                translate(Subset::from(mesh.domain()).on(level), back));

            intersection(&mesh[MeshId::Cells][level], neighbors)
                .apply_op(&mut Refinement { field, tag: &mut *tag, eps, offset });
        }
    }
}


/**
 * Build the mesh described by the tags of the leaves. A leaf tagged for
 * refinement below the finest level is replaced by its children. A complete
 * group of sibling leaves, all tagged for coarsening above the coarsest
 * level, is replaced by its parent. Every other leaf is kept.
 */
pub fn update_mesh(tag: &Field<CellFlag>) -> Mesh {
    let mesh = tag.mesh();
    let dim = mesh.dim();
    let (min, max) = (mesh.min_level(), mesh.max_level());
    let cells = &mesh[MeshId::Cells];
    let mut cl = CellList::new(dim, max);
    let (mut refined, mut coarsened) = (0, 0);

    mesh.for_each_cell(MeshId::Cells, |cell| {
        let level = cell.level;
        let flag = tag[cell];

        if flag.is_refining() && level < max {
            children(dim, &cell.indices).for_each(|c| cl[level + 1].add_point(c));
            refined += 1;
            return
        }
        if flag.is_coarsening() && level > min {
            let parent = cell.indices.map(|x| x >> 1);
            let complete = children(dim, &parent).all(|c| {
                cells[level].contains(&c) && tag.at(level, &c).is_coarsening()
            });

            if complete {
                cl[level - 1].add_point(parent);
                coarsened += 1;
                return
            }
        }
        cl[level].add_point(cell.indices)
    });

    let adapted = mesh.with_cells(CellArray::from_cell_list(dim, cl));

    info!(
        "mesh adapted: {} leaves refined, {} coarsened, {} -> {} leaves",
        refined,
        coarsened,
        mesh.nb_cells(MeshId::Cells),
        adapted.nb_cells(MeshId::Cells));

    adapted
}


/**
 * Transfer the leaf values of a field onto an adapted mesh. Leaves present
 * in both meshes are copied, new leaves under an old leaf are predicted
 * from it with the given order, and new leaves over old leaves are
 * projected from them. The old field must have its ghosts up to date; the
 * ghosts of the new field are left for `update_ghost_mr`.
 */
pub fn update_field<'n>(old: &Field<f64>, new_mesh: &'n Mesh, order: usize) -> Result<Field<'n, f64>> {
    let old_mesh = old.mesh();
    let (min, max) = (new_mesh.min_level(), new_mesh.max_level());
    let mut new = Field::new(old.name(), new_mesh);

    coefficients_for(old_mesh, order)?;

    for level in min..=max {
        let leaves = &new_mesh[MeshId::Cells][level];

        if leaves.is_empty() {
            continue
        }
        intersection(leaves, &old_mesh[MeshId::Cells][level]).for_each_interval(|level, i, key| {
            new.interval_mut(level, i, key).copy_from_slice(old.interval(level, i, key))
        });

        if level > min {
            intersection(leaves, &old_mesh[MeshId::Cells][level - 1])
                .on(level)
                .apply_op(&mut Prediction::from_field(order, false, &mut new, old)?);
        }
        if level < max {
            intersection(leaves, &old_mesh[MeshId::Cells][level + 1])
                .on(level)
                .apply_op(&mut Projection::from_field(&mut new, old));
        }
    }
    Ok(new)
}


/**
 * Transfer a field onto an adapted mesh with the prediction order set in
 * the configuration of that mesh.
 */
pub fn transfer_field<'n>(old: &Field<f64>, new_mesh: &'n Mesh) -> Result<Field<'n, f64>> {
    update_field(old, new_mesh, new_mesh.config().prediction_order)
}
