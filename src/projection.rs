use crate::field::{Field, FieldOperator};
use crate::interval::{Interval, RowKey};




/**
 * Field operator setting each coarse cell to the mean of its `2^dim`
 * children. It is applied to intervals of the coarse level, and reads the
 * children one fine row at a time: the fine run under `[s, e)` is
 * `[2s, 2e)`, and each coarse cell sums a pair of it. As with `Prediction`,
 * the children are read from a second field if one is given, otherwise from
 * the destination field itself.
 */
pub struct Projection<'a, 'm, 's> {
    dest: &'a mut Field<'m, f64>,
    src: Option<&'a Field<'s, f64>>,
    sums: Vec<f64>,
}




// ============================================================================
impl<'a, 'm, 's> Projection<'a, 'm, 's> {

    pub fn new(field: &'a mut Field<'m, f64>) -> Self {
        Self { dest: field, src: None, sums: Vec::new() }
    }

    pub fn from_field(dest: &'a mut Field<'m, f64>, src: &'a Field<'s, f64>) -> Self {
        Self { dest, src: Some(src), sums: Vec::new() }
    }
}

impl<'a, 'm, 's> FieldOperator for Projection<'a, 'm, 's> {
    fn apply(&mut self, level: usize, i: &Interval, key: &RowKey) {
        let dim = self.dest.mesh().dim();
        let fine = *i << 1;

        self.sums.clear();
        self.sums.resize(i.len(), 0.0);

        let src: &Field<f64> = match self.src {
            Some(src) => src,
            None => &*self.dest,
        };

        for child_key in key.children(1, dim) {
            let children = src.interval(level + 1, &fine, &child_key);

            for (sum, pair) in self.sums.iter_mut().zip(children.chunks_exact(2)) {
                *sum += pair[0] + pair[1]
            }
        }

        let n = (1 << dim) as f64;

        for (u, sum) in self.dest.interval_mut(level, i, key).iter_mut().zip(&self.sums) {
            *u = sum / n
        }
    }
}
