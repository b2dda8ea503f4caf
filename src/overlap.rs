use crate::interval::Interval;




/**
 * Determine whether two intervals overlap. Two intervals that line up
 * end-to-end do not overlap. Steps and indexes are ignored.
 */
pub fn overlaps(a: &Interval, b: &Interval) -> bool {
    a.start.max(b.start) < a.end.min(b.end)
}




/**
 * Sort a collection of intervals and merge those that overlap or touch. The
 * result is sorted, pairwise disjoint and non-adjacent, and covers exactly the
 * coordinates covered by the input. Invalid intervals are dropped; indexes
 * and steps are reset.
 */
pub fn coalesce<I>(intervals: I) -> Vec<Interval>
where
    I: IntoIterator<Item = Interval>
{
    let mut input: Vec<_> = intervals.into_iter().filter(Interval::is_valid).collect();
    input.sort_unstable_by_key(|i| i.start);

    let mut result: Vec<Interval> = Vec::with_capacity(input.len());

    for i in input {
        match result.last_mut() {
            Some(last) if i.start <= last.end => last.end = last.end.max(i.end),
            _ => result.push(Interval::new(i.start, i.end)),
        }
    }
    result
}




/**
 * Intersect two sorted lists of disjoint intervals.
 */
pub fn intersect(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut result = Vec::new();
    let (mut m, mut n) = (0, 0);

    while m < a.len() && n < b.len() {
        if overlaps(&a[m], &b[n]) {
            result.push(Interval::new(a[m].start.max(b[n].start), a[m].end.min(b[n].end)));
        }
        if a[m].end < b[n].end {
            m += 1;
        } else {
            n += 1;
        }
    }
    result
}




/**
 * Merge two sorted lists of disjoint intervals.
 */
pub fn union(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    coalesce(a.iter().chain(b).cloned())
}




/**
 * Remove the coordinates covered by `b` from the sorted list `a`.
 */
pub fn difference(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut result = Vec::new();
    let mut n = 0;

    for i in a {
        let mut start = i.start;

        while n < b.len() && b[n].end <= start {
            n += 1;
        }
        let mut k = n;

        while k < b.len() && b[k].start < i.end {
            if b[k].start > start {
                result.push(Interval::new(start, b[k].start));
            }
            start = start.max(b[k].end);
            k += 1;
        }
        if start < i.end {
            result.push(Interval::new(start, i.end));
        }
    }
    result
}




/**
 * Express a sorted row on a level `shift` times coarser, keeping every coarse
 * cell with at least one child in the row.
 */
pub fn coarsen(row: &[Interval], shift: u32) -> Vec<Interval> {
    coalesce(row.iter().map(|i| i.coarsen(shift)))
}




/**
 * Express a sorted row on a level `shift` times finer.
 */
pub fn refine(row: &[Interval], shift: u32) -> Vec<Interval> {
    row.iter().map(|i| Interval::new(i.start << shift, i.end << shift)).collect()
}
