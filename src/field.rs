use std::ops::{Index, IndexMut, Range};
use log::error;
use crate::cell::Cell;
use crate::interval::{Coords, Interval, RowKey};
use crate::mesh::{Mesh, MeshId};




/**
 * An operation applied to a field, one interval at a time. Set-algebra
 * expressions drive these through `Subset::apply_op`.
 */
pub trait FieldOperator {
    fn apply(&mut self, level: usize, i: &Interval, key: &RowKey);
}




/**
 * Values attached to every position of the reference sub-mesh of a mesh.
 * The field borrows its mesh, which therefore outlives it; a field must be
 * rebuilt when its mesh is adapted.
 */
#[derive(Clone, Debug)]
pub struct Field<'m, T> {
    name: String,
    mesh: &'m Mesh,
    data: Vec<T>,
}




// ============================================================================
impl<'m, T: Copy + Default> Field<'m, T> {

    pub fn new(name: &str, mesh: &'m Mesh) -> Self {
        Self {
            name: name.to_string(),
            mesh,
            data: vec![T::default(); mesh.nb_total_cells()],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &'m Mesh {
        self.mesh
    }

    pub fn array(&self) -> &[T] {
        &self.data
    }

    pub fn array_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|x| *x = value)
    }


    /**
     * Set the value of every cell of a sub-mesh from a function of the cell.
     */
    pub fn fill_with<F>(&mut self, id: MeshId, mut f: F)
    where
        F: FnMut(&Cell) -> T
    {
        let data = &mut self.data;
        self.mesh.for_each_cell(id, |cell| data[cell.index] = f(cell))
    }


    /**
     * Return the values of a sub-mesh, in traversal order.
     */
    pub fn data(&self, id: MeshId) -> Vec<T> {
        let mut values = Vec::with_capacity(self.mesh.nb_cells(id));
        self.mesh.for_each_cell(id, |cell| values.push(self.data[cell.index]));
        values
    }

    pub fn nb_cells(&self, id: MeshId) -> usize {
        self.mesh.nb_cells(id)
    }

    fn resolve(&self, level: usize, i: &Interval, key: &RowKey) -> Range<usize> {
        match self.mesh.get_interval(level, i, key) {
            Some(r) => (r.index + i.start) as usize..(r.index + i.end) as usize,
            None => {
                let found = if level <= self.mesh.max_level() {
                    self.mesh[MeshId::REFERENCE][level].find(i.start, key).copied()
                } else {
                    None
                };
                error!(
                    "field {}: level {}, row {}: requested {}, resolved {:?}",
                    self.name, level, key, i, found);
                panic!("field {} has no storage for {} in row {} on level {}", self.name, i, key, level)
            }
        }
    }


    /**
     * Return the values of the cells `[i.start, i.end)` in a row. The whole
     * range must be stored in one interval of the mesh.
     */
    pub fn interval(&self, level: usize, i: &Interval, key: &RowKey) -> &[T] {
        let range = self.resolve(level, i, key);
        &self.data[range]
    }

    pub fn interval_mut(&mut self, level: usize, i: &Interval, key: &RowKey) -> &mut [T] {
        let range = self.resolve(level, i, key);
        &mut self.data[range]
    }


    /**
     * Return the value of a single cell.
     */
    pub fn at(&self, level: usize, coords: &Coords) -> T {
        let i = Interval::new(coords[0], coords[0] + 1);
        self.interval(level, &i, &RowKey::from_coords(coords))[0]
    }

    pub fn at_mut(&mut self, level: usize, coords: &Coords) -> &mut T {
        let i = Interval::new(coords[0], coords[0] + 1);
        &mut self.interval_mut(level, &i, &RowKey::from_coords(coords))[0]
    }
}

impl<'m, T> Index<&Cell> for Field<'m, T> {
    type Output = T;

    fn index(&self, cell: &Cell) -> &T {
        &self.data[cell.index]
    }
}

impl<'m, T> IndexMut<&Cell> for Field<'m, T> {
    fn index_mut(&mut self, cell: &Cell) -> &mut T {
        &mut self.data[cell.index]
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::Field;
    use crate::config::MeshConfig;
    use crate::index_space::BoundingBox;
    use crate::interval::{Interval, RowKey};
    use crate::mesh::{Mesh, MeshId};

    fn mesh() -> Mesh {
        let bbox = BoundingBox::new(&[0.0, 0.0], &[1.0, 1.0]);
        Mesh::new(MeshConfig::new(2), &bbox, 2, 2, 3).unwrap()
    }

    #[test]
    fn field_is_sized_to_the_reference_mesh() {
        let mesh = mesh();
        let u = Field::<f64>::new("u", &mesh);
        assert_eq!(u.array().len(), mesh.nb_total_cells());
        assert_eq!(u.nb_cells(MeshId::Cells), 16);
        assert_eq!(u.name(), "u");
    }

    #[test]
    fn interval_access_is_contiguous() {
        let mesh = mesh();
        let mut u = Field::new("u", &mesh);
        u.fill_with(MeshId::Cells, |cell| cell.indices[0] + 10 * cell.indices[1]);

        let key = RowKey::new(2, 0);
        assert_eq!(u.interval(2, &Interval::new(0, 4), &key), &[20, 21, 22, 23]);

        u.interval_mut(2, &Interval::new(1, 3), &key).iter_mut().for_each(|x| *x = -1);
        assert_eq!(u.at(2, &[1, 2, 0]), -1);
        assert_eq!(u.at(2, &[3, 2, 0]), 23);
    }

    #[test]
    fn cells_index_the_field() {
        let mesh = mesh();
        let mut u = Field::new("u", &mesh);
        mesh.for_each_cell(MeshId::Cells, |cell| u[cell] = 1.0);
        assert_eq!(u.data(MeshId::Cells).iter().sum::<f64>(), 16.0);
        assert_eq!(u.data(MeshId::CellsAndGhosts).iter().sum::<f64>(), 16.0);
    }

    #[test]
    #[should_panic]
    fn missing_cells_are_fatal() {
        let mesh = mesh();
        let u = Field::<f64>::new("u", &mesh);
        u.interval(2, &Interval::new(0, 9), &RowKey::new(0, 0));
    }
}
