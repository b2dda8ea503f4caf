use log::trace;
use crate::error::Error;
use crate::field::FieldOperator;
use crate::interval::{Coords, Interval, RowKey};
use crate::level_cell_array::LevelCellArray;
use crate::overlap;




/**
 * A lazy set-algebra expression over level cell arrays. Nothing is computed
 * when an expression is built; rows are evaluated one at a time, on request,
 * at any level.
 *
 * Every node has a native level: a leaf lives on its array's level, binary
 * nodes on the finer of their operands, translations and contractions on
 * their operand's level, and projections on the level they name. Evaluating
 * a node on a level finer than its native level refines it exactly.
 * Evaluating it on a coarser level coarsens the native result, keeping a
 * coarse cell whenever any of its children is present.
 */
#[derive(Clone, Debug)]
pub enum Subset<'a> {
    Leaf(&'a LevelCellArray),
    Intersection(Box<Subset<'a>>, Box<Subset<'a>>),
    Union(Box<Subset<'a>>, Box<Subset<'a>>),
    Difference(Box<Subset<'a>>, Box<Subset<'a>>),
    Translate(Box<Subset<'a>>, Coords),
    Contraction(Box<Subset<'a>>, i64),
    Projection(Box<Subset<'a>>, usize),
}




// ============================================================================
impl<'a> From<&'a LevelCellArray> for Subset<'a> {
    fn from(lca: &'a LevelCellArray) -> Self {
        Subset::Leaf(lca)
    }
}




// ============================================================================
pub fn intersection<'a>(a: impl Into<Subset<'a>>, b: impl Into<Subset<'a>>) -> Subset<'a> {
    let (a, b) = operands(a.into(), b.into());
    Subset::Intersection(a, b)
}

pub fn union_<'a>(a: impl Into<Subset<'a>>, b: impl Into<Subset<'a>>) -> Subset<'a> {
    let (a, b) = operands(a.into(), b.into());
    Subset::Union(a, b)
}

pub fn difference<'a>(a: impl Into<Subset<'a>>, b: impl Into<Subset<'a>>) -> Subset<'a> {
    let (a, b) = operands(a.into(), b.into());
    Subset::Difference(a, b)
}


/**
 * Shift a set by a fixed offset, expressed in cells of the operand's native
 * level.
 */
pub fn translate<'a>(a: impl Into<Subset<'a>>, offset: Coords) -> Subset<'a> {
    Subset::Translate(Box::new(a.into()), offset)
}


/**
 * Remove the cells of a set that lie within one cell of its boundary.
 */
pub fn contraction<'a>(a: impl Into<Subset<'a>>) -> Subset<'a> {
    contraction_by(a, 1)
}

pub fn contraction_by<'a>(a: impl Into<Subset<'a>>, width: i64) -> Subset<'a> {
    Subset::Contraction(Box::new(a.into()), width)
}


/**
 * Re-express a set on the given level.
 */
pub fn projection<'a>(level: usize, a: impl Into<Subset<'a>>) -> Subset<'a> {
    Subset::Projection(Box::new(a.into()), level)
}

fn operands<'a>(a: Subset<'a>, b: Subset<'a>) -> (Box<Subset<'a>>, Box<Subset<'a>>) {
    if a.dim() != b.dim() {
        panic!("{}", Error::DimensionMismatch { left: a.dim(), right: b.dim() })
    }
    (Box::new(a), Box::new(b))
}




// ============================================================================
impl<'a> Subset<'a> {

    pub fn dim(&self) -> usize {
        match self {
            Subset::Leaf(lca) => lca.dim(),
            Subset::Intersection(a, _) | Subset::Union(a, _) | Subset::Difference(a, _) => a.dim(),
            Subset::Translate(a, _) | Subset::Contraction(a, _) | Subset::Projection(a, _) => a.dim(),
        }
    }


    /**
     * Return the native level of this expression.
     */
    pub fn level(&self) -> usize {
        match self {
            Subset::Leaf(lca) => lca.level(),
            Subset::Intersection(a, b) | Subset::Union(a, b) | Subset::Difference(a, b) => a.level().max(b.level()),
            Subset::Translate(a, _) | Subset::Contraction(a, _) => a.level(),
            Subset::Projection(_, level) => *level,
        }
    }


    /**
     * Evaluate this expression on the given level rather than its native one.
     */
    pub fn on(self, level: usize) -> Self {
        Subset::Projection(Box::new(self), level)
    }


    /**
     * Return the sorted keys of the rows that may be non-empty when this
     * expression is evaluated on the given level.
     */
    pub fn rows(&self, level: usize) -> Vec<RowKey> {
        let native = self.level();

        if level < native {
            let s = (native - level) as u32;
            sorted(self.rows_at(native).into_iter().map(|key| key.coarsen(s)).collect())
        } else {
            self.rows_at(level)
        }
    }


    /**
     * Evaluate one row of this expression on the given level. The result is
     * sorted and coalesced; the interval indexes are zero.
     */
    pub fn eval_row(&self, level: usize, key: &RowKey) -> Vec<Interval> {
        let native = self.level();

        if level < native {
            let s = (native - level) as u32;
            let fine: Vec<_> = key
                .children(s, self.dim())
                .flat_map(|k| self.eval_at(native, &k))
                .collect();
            overlap::coarsen(&fine, s)
        } else {
            self.eval_at(level, key)
        }
    }

    fn rows_at(&self, level: usize) -> Vec<RowKey> {
        let s = (level - self.level()) as u32;

        match self {
            Subset::Leaf(lca) => {
                sorted(lca.row_keys().iter().flat_map(|key| key.children(s, lca.dim())).collect())
            }
            Subset::Intersection(a, b) => {
                let rb = b.rows(level);
                a.rows(level).into_iter().filter(|key| rb.binary_search(key).is_ok()).collect()
            }
            Subset::Union(a, b) => {
                let mut keys = a.rows(level);
                keys.extend(b.rows(level));
                sorted(keys)
            }
            Subset::Difference(a, _) | Subset::Contraction(a, _) => {
                a.rows(level)
            }
            Subset::Translate(a, offset) => {
                let d = scaled(offset, s);
                a.rows(level).into_iter().map(|key| key.translate(d[1], d[2])).collect()
            }
            Subset::Projection(a, target) => {
                let dim = a.dim();
                sorted(a.rows(*target).into_iter().flat_map(|key| key.children(s, dim)).collect())
            }
        }
    }

    fn eval_at(&self, level: usize, key: &RowKey) -> Vec<Interval> {
        let s = (level - self.level()) as u32;

        match self {
            Subset::Leaf(lca) => {
                overlap::refine(lca.row(&key.coarsen(s)), s)
            }
            Subset::Intersection(a, b) => {
                overlap::intersect(&a.eval_row(level, key), &b.eval_row(level, key))
            }
            Subset::Union(a, b) => {
                overlap::union(&a.eval_row(level, key), &b.eval_row(level, key))
            }
            Subset::Difference(a, b) => {
                overlap::difference(&a.eval_row(level, key), &b.eval_row(level, key))
            }
            Subset::Translate(a, offset) => {
                let d = scaled(offset, s);
                a.eval_row(level, &key.translate(-d[1], -d[2]))
                    .into_iter()
                    .map(|i| i + d[0])
                    .collect()
            }
            Subset::Contraction(a, width) => {
                let w = width << s;
                let mut row: Vec<_> = a
                    .eval_row(level, key)
                    .into_iter()
                    .map(|i| Interval::new(i.start + w, i.end - w))
                    .filter(Interval::is_valid)
                    .collect();

                for axis in 1..self.dim() {
                    for m in (1..=w).flat_map(|m| [m, -m]) {
                        if row.is_empty() {
                            return row
                        }
                        let neighbor = if axis == 1 { key.translate(m, 0) } else { key.translate(0, m) };
                        row = overlap::intersect(&row, &a.eval_row(level, &neighbor));
                    }
                }
                row
            }
            Subset::Projection(a, target) => {
                overlap::refine(&a.eval_row(*target, &key.coarsen(s)), s)
            }
        }
    }


    /**
     * Visit every interval of this expression on its native level.
     */
    pub fn for_each_interval<F>(&self, mut f: F)
    where
        F: FnMut(usize, &Interval, &RowKey)
    {
        let level = self.level();
        let rows = self.rows(level);

        trace!("evaluating subset on level {} over {} candidate rows", level, rows.len());

        for key in rows {
            for i in self.eval_row(level, &key) {
                f(level, &i, &key)
            }
        }
    }


    /**
     * Apply a field operator to every interval of this expression.
     */
    pub fn apply_op<O: FieldOperator>(&self, op: &mut O) {
        self.for_each_interval(|level, i, key| op.apply(level, i, key))
    }


    /**
     * Materialize this expression on its native level.
     */
    pub fn to_level_cell_array(&self) -> LevelCellArray {
        let level = self.level();
        let rows = self.rows(level).into_iter().map(|key| (key, self.eval_row(level, &key)));
        LevelCellArray::from_rows(self.dim(), level, rows)
    }

    pub fn is_empty(&self) -> bool {
        let level = self.level();
        self.rows(level).iter().all(|key| self.eval_row(level, key).is_empty())
    }
}

fn scaled(offset: &Coords, shift: u32) -> Coords {
    offset.map(|d| d << shift)
}

fn sorted(mut keys: Vec<RowKey>) -> Vec<RowKey> {
    keys.sort_unstable();
    keys.dedup();
    keys
}
