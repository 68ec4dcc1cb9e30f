//! Triplicate grouping in plate-reader order.
//!
//! Each physical sample is dispensed into three adjacent columns of one row.
//! Groups are enumerated column-triplet first (1-3, 4-6, 7-9, 10-12) and row
//! second (A–H), so the first eight groups are always the standard series in
//! columns 1-3 and unknown samples follow from column 4 onwards.
use crate::plate::{Reading, Well, PLATE_COLUMNS, PLATE_ROWS};

/// Readings per physical sample.
pub const REPLICATES: usize = 3;

/// Groups on a fully populated plate.
pub const MAX_GROUPS: usize = (PLATE_COLUMNS / REPLICATES) * PLATE_ROWS;

/// Three readings that belong to one physical sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplicateGroup {
    /// 0-based position in the enumeration order.
    pub ordinal: usize,
    pub wells: [Well; REPLICATES],
    pub readings: [f64; REPLICATES],
}

impl ReplicateGroup {
    /// Arithmetic mean of the three readings.
    pub fn mean(&self) -> f64 {
        self.readings.iter().sum::<f64>() / REPLICATES as f64
    }

    /// Well of the first replicate; used as the group's label in reports.
    pub fn first_well(&self) -> Well { self.wells[0] }
}

/// Group a flat row-major sequence of readings into triplicates.
///
/// A group whose readings run past the end of `readings` is dropped, so a
/// sequence short by one or two trailing values yields 31 groups instead of 32.
pub fn group_replicates(readings: &[Reading]) -> Vec<ReplicateGroup> {
    let mut groups = Vec::with_capacity(MAX_GROUPS);
    for col_offset in (0..PLATE_COLUMNS).step_by(REPLICATES) {
        for row in 0..PLATE_ROWS {
            let start = row * PLATE_COLUMNS + col_offset;
            let Some(window) = readings.get(start..start + REPLICATES) else { continue };
            groups.push(ReplicateGroup {
                ordinal: groups.len(),
                wells: [window[0].well, window[1].well, window[2].well],
                readings: [window[0].absorbance, window[1].absorbance, window[2].absorbance],
            });
        }
    }
    tracing::debug!(groups = groups.len(), readings = readings.len(), "grouped replicates");
    groups
}

#[cfg(test)]
mod grouping_tests {
    use super::*;
    use crate::plate::AbsorbanceGrid;

    fn indexed_plate() -> Vec<Reading> {
        let rows = (0..PLATE_ROWS).map(|r| (0..PLATE_COLUMNS).map(|c| (r * PLATE_COLUMNS + c) as f64).collect()).collect();
        AbsorbanceGrid::from_values(rows).unwrap().readings()
    }

    #[test]
    fn full_plate_yields_32_groups_in_triplet_then_row_order() {
        let groups = group_replicates(&indexed_plate());
        assert_eq!(groups.len(), MAX_GROUPS);
        // group 0 = A1..A3, group 1 = B1..B3, group 8 = A4..A6
        assert_eq!(groups[0].readings, [0.0, 1.0, 2.0]);
        assert_eq!(groups[1].readings, [12.0, 13.0, 14.0]);
        assert_eq!(groups[8].wells.map(|w| w.to_string()), ["A4", "A5", "A6"]);
        assert_eq!(groups[31].wells.map(|w| w.to_string()), ["H10", "H11", "H12"]);
        assert!(groups.iter().enumerate().all(|(i, g)| g.ordinal == i));
    }

    #[test]
    fn short_tail_drops_the_partial_group() {
        let mut flat = indexed_plate();
        flat.truncate(94);
        let groups = group_replicates(&flat);
        assert_eq!(groups.len(), 31);
        assert_eq!(groups.last().map(|g| g.first_well().to_string()).as_deref(), Some("G10"));
    }

    #[test]
    fn empty_input_is_not_an_error() {
        assert!(group_replicates(&[]).is_empty());
    }

    #[test]
    fn mean_averages_the_triplicate() {
        let groups = group_replicates(&indexed_plate());
        assert!((groups[0].mean() - 1.0).abs() < 1e-12);
    }
}
