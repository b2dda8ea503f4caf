use log::error;
use crate::cell::{Cell, MeshInterval};
use crate::config::MAX_DIM;
use crate::error::{Error, Result};
use crate::interval::{Coords, Interval, RowKey};
use crate::mesh::{Mesh, MeshId};




/**
 * Return the unit vectors `-e_a` and `e_a`, ordered so that the opposite of
 * the direction at position `k` is at position `k + dim`.
 */
pub fn cartesian_directions(dim: usize) -> Vec<Coords> {
    let mut directions = vec![[0; 3]; 2 * dim];

    for a in 0..dim {
        directions[a][dim - 1 - a] = -1;
        directions[a + dim][dim - 1 - a] = 1;
    }
    directions
}


/**
 * Return the corners `{-1, 1}^dim` of the unit box.
 */
pub fn diagonal_directions(dim: usize) -> Vec<Coords> {
    (0..1usize << dim)
        .map(|m| {
            let mut d = [0; 3];
            for a in 0..dim {
                d[a] = if m >> a & 1 == 1 { 1 } else { -1 };
            }
            d
        })
        .collect()
}


/**
 * Return every non-zero offset of the box `[-1, 1]^dim`.
 */
pub fn moore_directions(dim: usize) -> Vec<Coords> {
    (0..3usize.pow(dim as u32))
        .map(|mut m| {
            let mut d = [0; 3];
            for a in 0..dim {
                d[a] = (m % 3) as i64 - 1;
                m /= 3;
            }
            d
        })
        .filter(|d| d.iter().any(|&x| x != 0))
        .collect()
}




/**
 * A fixed geometric stencil: a list of integer offsets, one of which is the
 * zero vector (the origin).
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stencil {
    dim: usize,
    offsets: Vec<Coords>,
    origin: usize,
}




// ============================================================================
impl Stencil {


    /**
     * Create a stencil from offsets of `dim` components each. Fails if an
     * offset has the wrong number of components or if the zero vector is
     * missing.
     */
    pub fn new<S: AsRef<[i64]>>(dim: usize, offsets: &[S]) -> Result<Self> {
        if dim == 0 || dim > MAX_DIM {
            return Err(Error::UnsupportedDimension(dim))
        }
        let mut points = Vec::with_capacity(offsets.len());

        for offset in offsets {
            let offset = offset.as_ref();

            if offset.len() != dim {
                return Err(Error::StencilDimension { expected: dim, found: offset.len() })
            }
            let mut d = [0; 3];
            d[..dim].copy_from_slice(offset);
            points.push(d);
        }
        let origin = points
            .iter()
            .position(|d| *d == [0; 3])
            .ok_or(Error::MissingStencilOrigin)?;

        Ok(Self { dim, offsets: points, origin })
    }

    fn from_points(dim: usize, offsets: Vec<Coords>, origin: usize) -> Self {
        Self { dim, offsets, origin }
    }


    /**
     * The `2 dim + 1` point stencil: the origin and its face neighbors.
     */
    pub fn star(dim: usize) -> Self {
        let mut offsets = vec![[0; 3]];
        offsets.extend(cartesian_directions(dim));
        Self::from_points(dim, offsets, 0)
    }

    pub fn center_only(dim: usize) -> Self {
        Self::from_points(dim, vec![[0; 3]], 0)
    }


    /**
     * The two point stencil going from a cell to its neighbor across the
     * face with the given outward normal.
     */
    pub fn in_out(dim: usize, normal: Coords) -> Self {
        Self::from_points(dim, vec![[0; 3], normal], 0)
    }

    pub fn out_in(dim: usize, normal: Coords) -> Self {
        Self::from_points(dim, vec![[0; 3], normal.map(|x| -x)], 0)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn offsets(&self) -> &[Coords] {
        &self.offsets
    }

    pub fn origin(&self) -> usize {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}




/**
 * Resolves the buffer indices of the points of a stencil, for each cell of
 * an interval in turn. The points are looked up once in `init`; `move_next`
 * then steps each point along its row, looking it up again only when it
 * leaves the reference interval it was found in.
 */
pub struct StencilIndices<'m, 's> {
    mesh: &'m Mesh,
    stencil: &'s Stencil,
    level: usize,
    origin: Coords,
    found: Vec<Interval>,
    indices: Vec<usize>,
}




// ============================================================================
impl<'m, 's> StencilIndices<'m, 's> {

    pub fn new(mesh: &'m Mesh, stencil: &'s Stencil) -> Self {
        debug_assert_eq!(mesh.dim(), stencil.dim(), "stencil and mesh dimensions differ");
        Self {
            mesh,
            stencil,
            level: 0,
            origin: [0; 3],
            found: vec![Interval::default(); stencil.len()],
            indices: vec![0; stencil.len()],
        }
    }

    pub fn init(&mut self, mi: &MeshInterval) {
        self.level = mi.level;
        self.origin = mi.key.coords(mi.i.start);

        for k in 0..self.stencil.len() {
            self.locate(k)
        }
    }

    pub fn move_next(&mut self) {
        self.origin[0] += 1;

        for k in 0..self.stencil.len() {
            let x = self.origin[0] + self.stencil.offsets[k][0];

            if self.found[k].contains(x) {
                self.indices[k] += 1
            } else {
                self.locate(k)
            }
        }
    }

    pub fn origin(&self) -> &Coords {
        &self.origin
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    fn point(&self, k: usize) -> Coords {
        let d = &self.stencil.offsets[k];
        [self.origin[0] + d[0], self.origin[1] + d[1], self.origin[2] + d[2]]
    }

    fn locate(&mut self, k: usize) {
        let p = self.point(k);
        let i = Interval::new(p[0], p[0] + 1);

        match self.mesh.get_interval(self.level, &i, &RowKey::from_coords(&p)) {
            Some(r) => {
                self.found[k] = *r;
                self.indices[k] = (r.index + p[0]) as usize;
            }
            None => {
                error!(
                    "stencil point {:?} of cell {:?} on level {} is not stored in the mesh",
                    p, self.origin, self.level);
                panic!("stencil point {:?} on level {} is missing from the mesh", p, self.level)
            }
        }
    }
}




/**
 * Like `StencilIndices`, but yields full cell descriptors.
 */
pub struct StencilCells<'m, 's> {
    indices: StencilIndices<'m, 's>,
    cells: Vec<Cell>,
}




// ============================================================================
impl<'m, 's> StencilCells<'m, 's> {

    pub fn new(mesh: &'m Mesh, stencil: &'s Stencil) -> Self {
        let indices = StencilIndices::new(mesh, stencil);
        let cells = vec![Cell::new(stencil.dim(), 0, [0; 3], 0); stencil.len()];
        Self { indices, cells }
    }

    pub fn init(&mut self, mi: &MeshInterval) {
        self.indices.init(mi);
        self.update();
    }

    pub fn move_next(&mut self) {
        self.indices.move_next();
        self.update();
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    fn update(&mut self) {
        let it = &self.indices;
        let dim = it.stencil.dim();

        for (k, cell) in self.cells.iter_mut().enumerate() {
            *cell = Cell::new(dim, it.level, it.point(k), it.indices[k]);
        }
    }
}




/**
 * Call `f` for each cell of an interval with the x coordinate of the cell
 * and the buffer indices of the stencil points around it.
 */
pub fn for_each_stencil<F>(mesh: &Mesh, mi: &MeshInterval, stencil: &Stencil, mut f: F)
where
    F: FnMut(i64, &[usize])
{
    if mi.i.is_empty() {
        return
    }
    let mut it = StencilIndices::new(mesh, stencil);
    it.init(mi);
    f(mi.i.start, it.indices());

    for x in (mi.i.start + 1)..mi.i.end {
        it.move_next();
        f(x, it.indices());
    }
}


/**
 * Call `f` with the coordinates and stencil indices of every cell of a
 * sub-mesh on one level.
 */
pub fn for_each_stencil_on_level<F>(mesh: &Mesh, id: MeshId, level: usize, stencil: &Stencil, mut f: F)
where
    F: FnMut(&Coords, &[usize])
{
    mesh[id][level].for_each_interval(|i, key| {
        let mi = MeshInterval::new(level, *i, *key);
        for_each_stencil(mesh, &mi, stencil, |x, indices| f(&key.coords(x), indices))
    })
}

pub fn for_each_stencil_cells<F>(mesh: &Mesh, mi: &MeshInterval, stencil: &Stencil, mut f: F)
where
    F: FnMut(&[Cell])
{
    if mi.i.is_empty() {
        return
    }
    let mut it = StencilCells::new(mesh, stencil);
    it.init(mi);
    f(it.cells());

    for _ in 1..mi.i.len() {
        it.move_next();
        f(it.cells());
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::*;
    use crate::config::MeshConfig;
    use crate::index_space::{BoundingBox, IndexSpace};
    use crate::level_cell_list::CellList;

    fn uniform() -> Mesh {
        let bbox = BoundingBox::new(&[0.0, 0.0], &[1.0, 1.0]);
        Mesh::new(MeshConfig::new(2), &bbox, 2, 2, 2).unwrap()
    }

    #[test]
    fn stencil_without_origin_is_rejected() {
        let offsets: [[i64; 2]; 2] = [[1, 0], [0, 1]];
        assert_eq!(Stencil::new(2, &offsets), Err(Error::MissingStencilOrigin));
    }

    #[test]
    fn stencil_offsets_must_match_the_dimension() {
        let offsets: [[i64; 3]; 1] = [[0, 0, 0]];
        assert_eq!(Stencil::new(2, &offsets), Err(Error::StencilDimension { expected: 2, found: 3 }));
        assert_eq!(Stencil::new(4, &offsets), Err(Error::UnsupportedDimension(4)));
    }

    #[test]
    fn origin_may_be_anywhere() {
        let offsets: [[i64; 2]; 3] = [[-1, 0], [0, 0], [1, 0]];
        let stencil = Stencil::new(2, &offsets).unwrap();
        assert_eq!(stencil.origin(), 1);
        assert_eq!(stencil.len(), 3);
    }

    #[test]
    fn directions_have_the_expected_shape() {
        assert_eq!(cartesian_directions(1), vec![[-1, 0, 0], [1, 0, 0]]);
        assert_eq!(cartesian_directions(2), vec![[0, -1, 0], [-1, 0, 0], [0, 1, 0], [1, 0, 0]]);
        assert_eq!(diagonal_directions(2), vec![[-1, -1, 0], [1, -1, 0], [-1, 1, 0], [1, 1, 0]]);
        assert_eq!(moore_directions(1), vec![[-1, 0, 0], [1, 0, 0]]);
        assert_eq!(moore_directions(2).len(), 8);
        assert_eq!(moore_directions(3).len(), 26);
        assert_eq!(Stencil::star(3).len(), 7);
        assert_eq!(Stencil::out_in(2, [1, 0, 0]).offsets()[1], [-1, 0, 0]);
    }

    #[test]
    fn star_indices_follow_the_buffer_layout() {
        let mesh = uniform();
        let stencil = Stencil::star(2);
        let mi = MeshInterval::new(2, Interval::new(0, 4), RowKey::new(1, 0));
        let mut visited = Vec::new();

        for_each_stencil(&mesh, &mi, &stencil, |x, indices| {
            for (k, d) in stencil.offsets().iter().enumerate() {
                assert_eq!(Some(indices[k]), mesh.get_index(2, &[x + d[0], 1 + d[1], 0]));
            }
            visited.push(x);
        });
        assert_eq!(visited, vec![0, 1, 2, 3]);

        let mut first = Vec::new();
        for_each_stencil(&mesh, &mi, &stencil, |x, indices| if x == 0 { first = indices.to_vec() });
        assert_eq!(first, vec![13, 7, 12, 19, 14]);
    }

    #[test]
    fn stencils_reach_across_a_level_jump() {
        let mut cl = CellList::new(2, 2);
        cl[1].add_point([0, 0, 0]);
        cl[1].add_point([1, 0, 0]);
        cl[1].add_point([0, 1, 0]);
        cl[2].add_box([2, 2, 0], [4, 4, 1]);
        let domain = IndexSpace::new(&[0..2, 0..2]).to_level_cell_array(1);
        let mesh = Mesh::from_cell_list(MeshConfig::new(2), cl, domain, 1, 2).unwrap();
        let stencil = Stencil::star(2);
        let mut count = 0;

        for_each_stencil_on_level(&mesh, MeshId::Cells, 2, &stencil, |c, indices| {
            for (k, d) in stencil.offsets().iter().enumerate() {
                assert_eq!(Some(indices[k]), mesh.get_index(2, &[c[0] + d[0], c[1] + d[1], 0]));
            }
            count += 1;
        });
        assert_eq!(count, 4);
    }

    #[test]
    fn stencil_cells_carry_coordinates() {
        let mesh = uniform();
        let stencil = Stencil::star(2);
        let mi = MeshInterval::new(2, Interval::new(1, 3), RowKey::new(2, 0));
        let mut centers = Vec::new();

        for_each_stencil_cells(&mesh, &mi, &stencil, |cells| {
            assert_eq!(cells.len(), 5);
            assert!(cells.iter().all(|c| c.level == 2 && c.length == 0.25));
            assert_eq!(cells[1].indices, [cells[0].indices[0], 1, 0]);
            assert_eq!(cells[3].indices, [cells[0].indices[0], 3, 0]);
            assert_eq!(Some(cells[4].index), mesh.get_index(2, &cells[4].indices));
            centers.push(cells[0].indices[0]);
        });
        assert_eq!(centers, vec![1, 2]);
    }

    #[test]
    #[should_panic]
    fn points_outside_the_mesh_are_fatal() {
        let mesh = uniform();
        let offsets: [[i64; 2]; 2] = [[0, 0], [3, 0]];
        let stencil = Stencil::new(2, &offsets).unwrap();
        let mi = MeshInterval::new(2, Interval::new(0, 4), RowKey::new(0, 0));
        for_each_stencil(&mesh, &mi, &stencil, |_, _| {});
    }
}
