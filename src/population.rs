use std::hash::Hash;

use ahash::AHashMap;

use crate::attributes::Attributes;
use crate::types::AgeRange;

/// A sparse population ledger: `(segment, age range) -> count` cells,
/// parametric over the segment key type.
///
/// Cells for the same segment may overlap or be disjoint; the ledger is never
/// normalized or merged. Re-putting the exact same `(segment, range)` key
/// overwrites that cell only. Count queries prorate cells that only partially
/// overlap the requested window, so band boundaries need not line up between
/// ledgers.
#[derive(Debug, Clone, PartialEq)]
pub struct Population<S: Eq + Hash> {
    /// Cells per segment, in insertion order.
    cells: AHashMap<S, Vec<(AgeRange, u32)>>,
    attributes: Attributes,
}

impl<S: Eq + Hash> Default for Population<S> {
    fn default() -> Self {
        Self { cells: AHashMap::new(), attributes: Attributes::new() }
    }
}

impl<S: Eq + Hash + Clone> Population<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the count for the exact `(segment, range)` cell, inserting or
    /// overwriting. Does not merge with other cells.
    pub fn put(&mut self, segment: S, range: AgeRange, count: u32) {
        let rows = self.cells.entry(segment).or_default();
        match rows.iter_mut().find(|(r, _)| *r == range) {
            Some(row) => row.1 = count,
            None => rows.push((range, count)),
        }
    }

    /// People in the window across all segments, rounded down.
    pub fn get_count(&self, window: AgeRange) -> u32 {
        let total: f64 = self
            .cells()
            .map(|(_, range, count)| contribution(range, count, window))
            .sum();
        total as u32
    }

    /// People in the window for one segment, rounded down.
    pub fn get_count_for(&self, segment: &S, window: AgeRange) -> u32 {
        let Some(rows) = self.cells.get(segment) else {
            return 0;
        };
        let total: f64 = rows
            .iter()
            .map(|&(range, count)| contribution(range, count, window))
            .sum();
        total as u32
    }

    /// True if any stored cell for the segment has a non-empty intersection
    /// with the window. Adjacent bands do not count. Useful for detecting
    /// duplicate entries while encoding a population.
    pub fn has_overlap(&self, segment: &S, window: AgeRange) -> bool {
        self.cells.get(segment).is_some_and(|rows| {
            rows.iter()
                .any(|(range, _)| range.intersection(&window).is_some_and(|ix| !ix.is_empty()))
        })
    }

    /// A new ledger with exactly this ledger's cell boundaries, where each
    /// cell's count has been reduced by `other`'s total contribution over
    /// that cell's extent, floored at zero. A left-anti-join-style
    /// subtraction: if `other` is broken down more finely than this ledger,
    /// the amounts come off this ledger's cruder bands.
    pub fn excluding(&self, other: &Population<S>) -> Population<S> {
        let mut result = Population::new();
        for (segment, range, _) in self.cells() {
            result.put(segment.clone(), range, self.get_count_for(segment, range));
        }
        result.attributes = self.attributes.clone();

        for (segment, range, _) in self.cells() {
            let kept = result.get_count_for(segment, range);
            let removed = other.get_count_for(segment, range);
            result.put(segment.clone(), range, kept.saturating_sub(removed));
        }
        result
    }

    /// True if this ledger can absorb all of `other`: every cell of `other`
    /// overlaps some same-segment cell here, and subtracting `other`'s
    /// contribution over each of this ledger's cell extents from a working
    /// copy never goes negative.
    pub fn entirely_contains(&self, other: &Population<S>) -> bool {
        for (segment, range, _) in other.cells() {
            if !self.has_overlap(segment, range) {
                return false;
            }
        }

        let mut working = Population::new();
        for (segment, range, _) in self.cells() {
            working.put(segment.clone(), range, self.get_count_for(segment, range));
        }
        for (segment, range, _) in self.cells() {
            let available = working.get_count_for(segment, range);
            let removed = other.get_count_for(segment, range);
            if removed > available {
                return false;
            }
            working.put(segment.clone(), range, available - removed);
        }
        true
    }

    /// Raw sum of all stored cell counts.
    pub fn size(&self) -> u32 {
        self.cells().map(|(_, _, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Iterates over all stored cells as `(segment, range, count)`.
    pub fn cells(&self) -> impl Iterator<Item = (&S, AgeRange, u32)> {
        self.cells
            .iter()
            .flat_map(|(segment, rows)| rows.iter().map(move |&(range, count)| (segment, range, count)))
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

/// A single cell's (possibly fractional) contribution to a count query.
///
/// Disjoint cells contribute nothing. A cell the window encloses contributes
/// its full stored count; a cell enclosing the window is prorated by the
/// window's share of the cell's span; a partial overlap is prorated by the
/// overlap's share.
fn contribution(cell: AgeRange, count: u32, window: AgeRange) -> f64 {
    let Some(overlap) = cell.intersection(&window) else {
        return 0.0;
    };
    if window.encloses(&cell) {
        count as f64
    } else if cell.encloses(&window) {
        count as f64 * window.span() as f64 / cell.span() as f64
    } else {
        count as f64 * overlap.span() as f64 / cell.span() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32) -> AgeRange {
        AgeRange::new(start, end).unwrap()
    }

    /// Five disjoint 20-year bands of 40 people each.
    fn five_bands() -> Population<&'static str> {
        let mut pop = Population::new();
        for start in (0..100).step_by(20) {
            pop.put("All", range(start, start + 20), 40);
        }
        pop
    }

    #[test]
    fn disjoint_cover_matches_size() {
        let pop = five_bands();
        assert_eq!(pop.size(), 200);
        assert_eq!(pop.get_count(range(0, 100)), 200);
        assert_eq!(pop.get_count_for(&"All", range(0, 100)), 200);
    }

    #[test]
    fn cell_inside_window_contributes_full_count() {
        // A strict-subset cell is never prorated.
        let mut pop = Population::new();
        pop.put("All", range(10, 20), 30);
        assert_eq!(pop.get_count(range(0, 100)), 30);
    }

    #[test]
    fn window_inside_cell_is_prorated() {
        let mut pop = Population::new();
        pop.put("All", range(0, 100), 100);
        assert_eq!(pop.get_count(range(10, 20)), 10);
        // An empty window takes no share.
        assert_eq!(pop.get_count(range(50, 50)), 0);
    }

    #[test]
    fn partial_overlap_is_prorated_by_cell_span() {
        let mut pop = Population::new();
        pop.put("All", range(0, 30), 15);
        assert_eq!(pop.get_count(range(20, 40)), 5);
    }

    #[test]
    fn fractional_contributions_floor() {
        let mut pop = Population::new();
        pop.put("All", range(0, 3), 10);
        // 10 * 2/3 = 6.67 -> 6
        assert_eq!(pop.get_count(range(0, 2)), 6);
    }

    #[test]
    fn counts_are_per_segment() {
        let mut pop = Population::new();
        pop.put("Male", range(0, 50), 30);
        pop.put("Female", range(0, 50), 34);

        assert_eq!(pop.get_count(range(0, 50)), 64);
        assert_eq!(pop.get_count_for(&"Male", range(0, 50)), 30);
        assert_eq!(pop.get_count_for(&"Other", range(0, 50)), 0);
    }

    #[test]
    fn put_overwrites_exact_key_only() {
        let mut pop = Population::new();
        pop.put("All", range(0, 10), 5);
        pop.put("All", range(0, 10), 9);
        pop.put("All", range(0, 20), 1);

        assert_eq!(pop.size(), 10);
        assert_eq!(pop.cells().count(), 2);
    }

    #[test]
    fn overlap_detection_ignores_adjacency() {
        let mut pop = Population::new();
        pop.put("All", range(10, 20), 5);

        assert!(pop.has_overlap(&"All", range(15, 25)));
        assert!(pop.has_overlap(&"All", range(0, 11)));
        assert!(!pop.has_overlap(&"All", range(20, 30)));
        assert!(!pop.has_overlap(&"All", range(0, 10)));
        assert!(!pop.has_overlap(&"Male", range(10, 20)));
    }

    #[test]
    fn excluding_is_a_left_anti_join() {
        let a = five_bands();

        let mut b = Population::new();
        b.put("All", range(0, 30), 15);
        b.put("All", range(40, 60), 500);
        b.put("All", range(80, 90), 5);
        b.put("All", range(90, 100), 15);

        let result = a.excluding(&b);
        assert_eq!(result.get_count(range(0, 20)), 30);
        assert_eq!(result.get_count(range(20, 40)), 35);
        assert_eq!(result.get_count(range(40, 60)), 0);
        assert_eq!(result.get_count(range(60, 80)), 40);
        assert_eq!(result.get_count(range(80, 100)), 20);

        // The receiver is untouched.
        for start in (0..100).step_by(20) {
            assert_eq!(a.get_count(range(start, start + 20)), 40);
        }
    }

    #[test]
    fn excluding_larger_population_empties() {
        let mut a = Population::new();
        for start in (0..80).step_by(20) {
            a.put("All", range(start, start + 20), 40);
        }
        let mut b = Population::new();
        b.put("All", range(0, 20), 10);
        b.put("All", range(20, 40), 10);

        assert!(b.excluding(&a).is_empty());
    }

    #[test]
    fn excluding_ignores_disjoint_ranges() {
        let mut a = Population::new();
        a.put("All", range(0, 20), 40);
        let mut b = Population::new();
        b.put("All", range(50, 60), 100);

        assert_eq!(a.excluding(&b).get_count(range(0, 20)), 40);
    }

    #[test]
    fn excluding_carries_attributes() {
        let mut a = Population::new();
        a.put("All", range(0, 20), 40);
        a.attributes_mut().set("Is Rural", "true");

        let result = a.excluding(&Population::new());
        assert!(result.attributes().get_bool("Is Rural"));
    }

    #[test]
    fn entirely_contains_finer_breakdown() {
        let mut a = Population::new();
        for start in (0..80).step_by(20) {
            a.put("All", range(start, start + 20), 40);
        }
        let mut b = Population::new();
        b.put("All", range(0, 10), 10);
        b.put("All", range(10, 15), 10);
        b.put("All", range(20, 40), 10);

        assert!(a.entirely_contains(&b));
    }

    #[test]
    fn entirely_contains_detects_joint_excess() {
        let mut a = Population::new();
        for start in (0..80).step_by(20) {
            a.put("All", range(start, start + 20), 40);
        }
        // The first two cells jointly exceed A's [0, 20) band of 40.
        let mut b = Population::new();
        b.put("All", range(0, 10), 30);
        b.put("All", range(10, 20), 30);
        b.put("All", range(40, 60), 10);
        b.put("All", range(60, 80), 10);

        assert!(!a.entirely_contains(&b));
    }

    #[test]
    fn entirely_contains_requires_segment_overlap() {
        let mut a = Population::new();
        a.put("All", range(0, 80), 100);

        let mut outside = Population::new();
        outside.put("All", range(90, 100), 1);
        assert!(!a.entirely_contains(&outside));

        let mut other_segment = Population::new();
        other_segment.put("Male", range(0, 10), 1);
        assert!(!a.entirely_contains(&other_segment));
    }
}
