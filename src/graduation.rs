use log::debug;
use crate::cell::CellFlag;
use crate::field::{Field, FieldOperator};
use crate::interval::{Coords, Interval, RowKey};
use crate::mesh::{Mesh, MeshId};
use crate::stencil::{diagonal_directions, moore_directions};
use crate::subset::{intersection, translate, Subset};




/**
 * Adds a flag to every position of the intervals it is applied to.
 */
struct TagWith<'a, 'm> {
    tag: &'a mut Field<'m, CellFlag>,
    flag: CellFlag,
}

impl<'a, 'm> FieldOperator for TagWith<'a, 'm> {
    fn apply(&mut self, level: usize, i: &Interval, key: &RowKey) {
        for t in self.tag.interval_mut(level, i, key) {
            *t |= self.flag
        }
    }
}




/**
 * Removes a flag from every position of the intervals it is applied to.
 */
struct Untag<'a, 'm> {
    tag: &'a mut Field<'m, CellFlag>,
    flag: CellFlag,
}

impl<'a, 'm> FieldOperator for Untag<'a, 'm> {
    fn apply(&mut self, level: usize, i: &Interval, key: &RowKey) {
        for t in self.tag.interval_mut(level, i, key) {
            t.remove(self.flag)
        }
    }
}




/**
 * Keeps a leaf whose neighbor at `p - offset`, on the same level, is to be
 * refined. The neighbors of an interval form one run of the row
 * `key - offset`, copied aside before the interval is written.
 */
struct KeepNextToRefined<'a, 'm> {
    tag: &'a mut Field<'m, CellFlag>,
    offset: Coords,
    neighbors: Vec<CellFlag>,
}

impl<'a, 'm> FieldOperator for KeepNextToRefined<'a, 'm> {
    fn apply(&mut self, level: usize, i: &Interval, key: &RowKey) {
        let [dx, dy, dz] = self.offset;

        self.neighbors.clear();
        self.neighbors.extend_from_slice(self.tag.interval(level, &(*i - dx), &key.translate(-dy, -dz)));

        for (t, n) in self.tag.interval_mut(level, i, key).iter_mut().zip(&self.neighbors) {
            if n.is_refining() {
                *t |= CellFlag::KEEP
            }
        }
    }
}




/**
 * Applied to parent positions: siblings are coarsened together or not at
 * all. If any child of a parent is absent from the reference mesh or is not
 * to be coarsened, every child present is kept.
 */
struct KeepChildrenTogether<'a, 'm> {
    tag: &'a mut Field<'m, CellFlag>,
    present: Vec<usize>,
    blocked: Vec<bool>,
}

impl<'a, 'm> FieldOperator for KeepChildrenTogether<'a, 'm> {
    fn apply(&mut self, level: usize, i: &Interval, key: &RowKey) {
        let mesh = self.tag.mesh();
        let dim = mesh.dim();
        let reference = &mesh[MeshId::REFERENCE][level + 1];
        let fine = *i << 1;
        let parent = |x: i64| ((x >> 1) - i.start) as usize;

        self.present.clear();
        self.present.resize(i.len(), 0);
        self.blocked.clear();
        self.blocked.resize(i.len(), false);

        for child_key in key.children(1, dim) {
            for run in reference.overlapping(&fine, &child_key) {
                for (x, t) in run.iter().zip(self.tag.interval(level + 1, &run, &child_key)) {
                    self.present[parent(x)] += 1;
                    self.blocked[parent(x)] |= !t.is_coarsening();
                }
            }
        }

        let siblings = 1 << dim;

        for child_key in key.children(1, dim) {
            for run in reference.overlapping(&fine, &child_key) {
                for (x, t) in run.iter().zip(self.tag.interval_mut(level + 1, &run, &child_key)) {
                    if self.blocked[parent(x)] || self.present[parent(x)] < siblings {
                        *t |= CellFlag::KEEP
                    }
                }
            }
        }
    }
}




/**
 * Applied to fine positions `p` that lie in a coarser leaf and next to a
 * fine leaf `p - offset`. The coarse leaf is refined when its fine neighbor
 * is refined, and kept when its fine neighbor stays.
 */
struct Graduate<'a, 'm> {
    tag: &'a mut Field<'m, CellFlag>,
    offset: Coords,
    neighbors: Vec<CellFlag>,
}

impl<'a, 'm> FieldOperator for Graduate<'a, 'm> {
    fn apply(&mut self, level: usize, i: &Interval, key: &RowKey) {
        let [dx, dy, dz] = self.offset;
        let coarse = i.coarsen(1);

        self.neighbors.clear();
        self.neighbors.extend_from_slice(self.tag.interval(level, &(*i - dx), &key.translate(-dy, -dz)));

        let flags = self.tag.interval_mut(level - 1, &coarse, &key.coarsen(1));

        for (x, fine) in i.iter().zip(&self.neighbors) {
            let t = &mut flags[((x >> 1) - coarse.start) as usize];

            if fine.is_refining() {
                *t |= CellFlag::REFINE
            } else if !fine.is_coarsening() {
                *t |= CellFlag::KEEP
            }
        }
    }
}




/**
 * Amend the adaptation flags of the leaves so that the adapted mesh is
 * graded: two leaves that touch, even by a corner, differ by at most one
 * level. Refinement is dropped on the finest level and coarsening on the
 * coarsest. The levels are visited from the finest down, and each one only
 * raises flags on its own level and on the level below, so a single pass
 * suffices and a second pass changes nothing.
 */
pub fn graduation(tag: &mut Field<CellFlag>) {
    let mesh = tag.mesh();
    let dim = mesh.dim();
    let (min, max) = (mesh.min_level(), mesh.max_level());
    let cells = &mesh[MeshId::Cells];

    Subset::from(&cells[max]).apply_op(&mut Untag { tag: &mut *tag, flag: CellFlag::REFINE });
    Subset::from(&cells[min]).apply_op(&mut Untag { tag: &mut *tag, flag: CellFlag::COARSEN });

    for level in ((min + 1)..=max).rev() {
        if cells[level].is_empty() {
            continue
        }

        // Non-leaf positions above finer leaves are never coarsened.
        intersection(&cells[level], &mesh[MeshId::REFERENCE][level - 1])
            .on(level - 1)
            .apply_op(&mut TagWith { tag: &mut *tag, flag: CellFlag::KEEP });

        for offset in moore_directions(dim) {
            intersection(translate(&cells[level], offset), &cells[level])
                .apply_op(&mut KeepNextToRefined { tag: &mut *tag, offset, neighbors: Vec::new() });
        }

        intersection(&cells[level], &cells[level])
            .on(level - 1)
            .apply_op(&mut KeepChildrenTogether { tag: &mut *tag, present: Vec::new(), blocked: Vec::new() });

        for offset in diagonal_directions(dim) {
            intersection(translate(&cells[level], offset), &cells[level - 1])
                .on(level)
                .apply_op(&mut Graduate { tag: &mut *tag, offset, neighbors: Vec::new() });
        }
        debug!("graduation of {}: level {} done", tag.name(), level);
    }
}


/**
 * Determine whether every pair of touching leaves differs by at most one
 * level.
 */
pub fn is_graded(mesh: &Mesh) -> bool {
    let cells = &mesh[MeshId::Cells];
    let (min, max) = (mesh.min_level(), mesh.max_level());
    let offsets = moore_directions(mesh.dim());

    for level in min..=max {
        for coarse in min..level.saturating_sub(1) {
            for offset in &offsets {
                if !intersection(translate(&cells[level], *offset), &cells[coarse]).is_empty() {
                    return false
                }
            }
        }
    }
    true
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::config::MeshConfig;
    use crate::index_space::{BoundingBox, IndexSpace};
    use crate::level_cell_list::CellList;

    fn mesh() -> Mesh {
        let mut cl = CellList::new(1, 3);
        cl[1].add_interval(RowKey::default(), Interval::new(0, 2));
        cl[1].add_interval(RowKey::default(), Interval::new(3, 4));
        cl[2].add_interval(RowKey::default(), Interval::new(4, 6));
        let domain = IndexSpace::new(&[0..4]).to_level_cell_array(1);
        Mesh::from_cell_list(MeshConfig::new(1), cl, domain, 0, 3).unwrap()
    }

    fn tagged(mesh: &Mesh) -> Field<CellFlag> {
        let mut tag = Field::new("tag", mesh);
        tag.fill_with(MeshId::Cells, |_| CellFlag::COARSEN);
        *tag.at_mut(2, &[4, 0, 0]) = CellFlag::KEEP;
        *tag.at_mut(2, &[5, 0, 0]) = CellFlag::REFINE;
        tag
    }

    #[test]
    fn refinement_spreads_to_coarse_neighbors() {
        let mesh = mesh();
        let mut tag = tagged(&mesh);
        graduation(&mut tag);

        assert!(tag.at(1, &[3, 0, 0]).is_refining());
        assert!(tag.at(2, &[5, 0, 0]).is_refining());
        assert!(!tag.at(1, &[0, 0, 0]).is_coarsening());
        assert!(!tag.at(1, &[1, 0, 0]).is_coarsening());
    }

    #[test]
    fn graduation_is_idempotent() {
        let mesh = mesh();
        let mut tag = tagged(&mesh);
        graduation(&mut tag);
        let once = tag.array().to_vec();
        graduation(&mut tag);
        assert_eq!(tag.array(), &once[..]);
    }

    #[test]
    fn flags_beyond_the_level_bounds_are_dropped() {
        let bbox = BoundingBox::new(&[0.0, 0.0], &[1.0, 1.0]);
        let mesh = Mesh::new(MeshConfig::new(2), &bbox, 2, 2, 2).unwrap();
        let mut tag = Field::new("tag", &mesh);
        tag.fill_with(MeshId::Cells, |_| CellFlag::REFINE | CellFlag::COARSEN);
        graduation(&mut tag);
        assert!(tag.data(MeshId::Cells).iter().all(|t| *t == CellFlag::NONE));
    }

    #[test]
    fn corner_refinement_in_3d_keeps_its_siblings() {
        let bbox = BoundingBox::new(&[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0]);
        let mesh = Mesh::new(MeshConfig::new(3), &bbox, 2, 1, 3).unwrap();
        let mut tag = Field::new("tag", &mesh);
        tag.fill_with(MeshId::Cells, |_| CellFlag::COARSEN);
        *tag.at_mut(2, &[0, 0, 0]) = CellFlag::REFINE;
        graduation(&mut tag);

        assert!(tag.at(2, &[0, 0, 0]).is_refining());
        assert!(!tag.at(2, &[1, 1, 1]).is_coarsening());
        assert!(tag.at(2, &[2, 0, 0]).is_coarsening());
        assert!(tag.at(2, &[3, 3, 3]).is_coarsening());

        let adapted = crate::adapt::update_mesh(&tag);
        assert_eq!(adapted.nb_cells_on_level(MeshId::Cells, 3), 8);
        assert_eq!(adapted.nb_cells_on_level(MeshId::Cells, 2), 7);
        assert_eq!(adapted.nb_cells_on_level(MeshId::Cells, 1), 7);
        assert!(is_graded(&adapted));
    }

    #[test]
    fn two_level_jumps_are_not_graded() {
        let mut cl = CellList::new(1, 3);
        cl[1].add_point([0, 0, 0]);
        cl[3].add_interval(RowKey::default(), Interval::new(4, 8));
        let domain = IndexSpace::new(&[0..2]).to_level_cell_array(1);
        let mesh = Mesh::from_cell_list(MeshConfig::new(1), cl, domain, 1, 3).unwrap();
        assert!(!is_graded(&mesh));
    }

    #[test]
    fn one_level_steps_are_graded() {
        let mut cl = CellList::new(1, 3);
        cl[1].add_point([0, 0, 0]);
        cl[2].add_point([2, 0, 0]);
        cl[3].add_interval(RowKey::default(), Interval::new(6, 8));
        let domain = IndexSpace::new(&[0..2]).to_level_cell_array(1);
        let mesh = Mesh::from_cell_list(MeshConfig::new(1), cl, domain, 1, 3).unwrap();
        assert!(is_graded(&mesh));
        assert!(is_graded(&self::mesh()));
    }
}
