use crate::error::{Error, Result};
use crate::field::{Field, FieldOperator};
use crate::interval::{Coords, Interval, RowKey};
use crate::mesh::Mesh;




/**
 * Interpolation weights of the prediction, by order. The order-s correction
 * along an axis is `Qs(i) = sum_k c[k-1] * (u(i + k) - u(i - k))`, for
 * `k = 1..=s`.
 */
const COEFFICIENTS: [&[f64]; 6] = [
    &[],
    &[-1. / 8.],
    &[-22. / 128., 3. / 128.],
    &[-201. / 1024., 11. / 256., -5. / 1024.],
    &[-3461. / 16384., 949. / 16384., -185. / 16384., 35. / 32768.],
    &[-29011. / 131072., 569. / 8192., -4661. / 262144., 49. / 16384., -63. / 262144.],
];




/**
 * Return the prediction coefficients of the given order.
 */
pub fn coefficients(order: usize) -> Result<&'static [f64]> {
    COEFFICIENTS.get(order).copied().ok_or(Error::PredictionOrder(order))
}


/**
 * Return the prediction coefficients of the given order, checking that the
 * prediction halo of the mesh holds every coarse neighbor they read.
 */
pub fn coefficients_for(mesh: &Mesh, order: usize) -> Result<&'static [f64]> {
    let coeffs = coefficients(order)?;
    let width = mesh.config().prediction_width;

    if order as i64 > width {
        return Err(Error::PredictionWidth { order, width: width.max(0) as usize })
    }
    Ok(coeffs)
}




/**
 * Return the mixed correction of `u` at a coarse position along the given
 * axes. With a single axis this is `Qs`; with several axes the corrections
 * are nested, one axis inside the other.
 */
pub fn correction<F>(u: &F, coeffs: &[f64], center: Coords, axes: &[usize]) -> f64
where
    F: Fn(&Coords) -> f64
{
    match axes.split_first() {
        None => u(&center),
        Some((&a, rest)) => coeffs
            .iter()
            .zip(1..)
            .map(|(c, k)| {
                let (mut plus, mut minus) = (center, center);
                plus[a] += k;
                minus[a] -= k;
                c * (correction(u, coeffs, plus, rest) - correction(u, coeffs, minus, rest))
            })
            .sum(),
    }
}




/**
 * Predict the value of the fine cell `child` from the coarse values `u`
 * around its parent. The value is the tensor product of the 1D rule
 * `u + Qs` for even children and `u - Qs` for odd children, so the children
 * of a coarse cell always average to the coarse value.
 */
pub fn predict<F>(u: &F, coeffs: &[f64], dim: usize, child: &Coords) -> f64
where
    F: Fn(&Coords) -> f64
{
    let parent = child.map(|x| x >> 1);
    let mut axes = [0; 3];
    let mut value = 0.0;

    for mask in 0..1usize << dim {
        if coeffs.is_empty() && mask != 0 {
            continue
        }
        let mut n = 0;
        let mut sign = 1.0;

        for a in (0..dim).filter(|a| mask >> a & 1 == 1) {
            axes[n] = a;
            n += 1;
            if child[a] & 1 == 1 {
                sign = -sign
            }
        }
        value += sign * correction(u, coeffs, parent, &axes[..n]);
    }
    value
}




/**
 * Return the coordinates of the `2^dim` children of a coarse cell.
 */
pub fn children(dim: usize, parent: &Coords) -> impl Iterator<Item = Coords> + '_ {
    (0..1i64 << dim).map(move |bits| {
        let mut child = *parent;
        for a in 0..dim {
            child[a] = (parent[a] << 1) + (bits >> a & 1)
        }
        child
    })
}




/**
 * Field operator filling fine cells by prediction from the level below.
 *
 * With `dest_on_level` set, the operator is applied to intervals of the
 * coarse level and writes the children of each cell. Otherwise it is applied
 * to intervals of the fine level and reads the parents. The source values
 * come from a second field if one is given, possibly defined on a different
 * mesh; otherwise the destination field predicts from itself.
 *
 * Work is done one fine row at a time. The coarse rows within the
 * prediction reach of the parent row are resolved once, widened by the
 * reach along x, and every child of the row reads from those slices.
 */
pub struct Prediction<'a, 'm, 's> {
    coeffs: &'static [f64],
    dest_on_level: bool,
    dest: &'a mut Field<'m, f64>,
    src: Option<&'a Field<'s, f64>>,
    values: Vec<f64>,
}




// ============================================================================
impl<'a, 'm, 's> Prediction<'a, 'm, 's> {

    pub fn new(order: usize, dest_on_level: bool, field: &'a mut Field<'m, f64>) -> Result<Self> {
        Ok(Self { coeffs: coefficients(order)?, dest_on_level, dest: field, src: None, values: Vec::new() })
    }

    pub fn from_field(order: usize, dest_on_level: bool, dest: &'a mut Field<'m, f64>, src: &'a Field<'s, f64>) -> Result<Self> {
        Ok(Self { coeffs: coefficients(order)?, dest_on_level, dest, src: Some(src), values: Vec::new() })
    }

    fn predict_row(&mut self, fine_level: usize, fine: &Interval, key: &RowKey) {
        let dim = self.dest.mesh().dim();
        let reach = self.coeffs.len() as i64;
        let ry = if dim > 1 { reach } else { 0 };
        let rz = if dim > 2 { reach } else { 0 };

        let parent_key = key.coarsen(1);
        let parents = fine.coarsen(1);
        let stencil = Interval::new(parents.start - reach, parents.end + reach);

        let src: &Field<f64> = match self.src {
            Some(src) => src,
            None => &*self.dest,
        };
        let rows: Vec<&[f64]> = (-rz..=rz)
            .flat_map(|dz| (-ry..=ry).map(move |dy| parent_key.translate(dy, dz)))
            .map(|row| src.interval(fine_level - 1, &stencil, &row))
            .collect();

        let width = (2 * ry + 1) as usize;
        let u = |c: &Coords| {
            let row = (c[2] - parent_key.z() + rz) as usize * width + (c[1] - parent_key.y() + ry) as usize;
            rows[row][(c[0] - stencil.start) as usize]
        };

        self.values.clear();
        self.values.extend(fine.iter().map(|x| predict(&u, self.coeffs, dim, &key.coords(x))));
        self.dest.interval_mut(fine_level, fine, key).copy_from_slice(&self.values)
    }
}

impl<'a, 'm, 's> FieldOperator for Prediction<'a, 'm, 's> {
    fn apply(&mut self, level: usize, i: &Interval, key: &RowKey) {
        if self.dest_on_level {
            let dim = self.dest.mesh().dim();
            for child_key in key.children(1, dim) {
                self.predict_row(level + 1, &(*i << 1), &child_key)
            }
        } else {
            assert!(level > 0, "prediction onto level 0 has no parent level");
            self.predict_row(level, i, key)
        }
    }
}
