//! Well-position mapping for source tubes, destination plates and the assay plate.
//!
//! These are pure functions so protocol variants can reuse them with different
//! sample counts and row/column caps.
//!
//! # Examples
//! ```
//! use bcanorm::layout::{destination_well, source_well, DestinationLayout, SourceLayout};
//! let src = SourceLayout::default();
//! assert_eq!(source_well(6, &src).unwrap().to_string(), "C1");
//! assert_eq!(destination_well(8, &DestinationLayout::default()).unwrap().to_string(), "A2");
//! ```
use serde::{Deserialize, Serialize};

use crate::plate::{Well, PLATE_COLUMNS, PLATE_ROWS};
use crate::replicate::{MAX_GROUPS, REPLICATES};

/// Row-major block of sample tubes on the source rack (default: B1–D6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLayout {
    /// Row letter of the first sample tube.
    pub first_row: char,
    /// Tubes per row.
    pub columns: u8,
    /// Rows of tubes.
    pub rows: u8,
}

impl Default for SourceLayout {
    fn default() -> Self { Self { first_row: 'B', columns: 6, rows: 3 } }
}

impl SourceLayout {
    pub fn capacity(&self) -> usize { self.columns as usize * self.rows as usize }
}

/// Column-major fill of the destination plate (default: 8 rows, 12 columns).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationLayout {
    pub rows: u8,
    pub columns: u8,
}

impl Default for DestinationLayout {
    fn default() -> Self { Self { rows: PLATE_ROWS as u8, columns: PLATE_COLUMNS as u8 } }
}

impl DestinationLayout {
    pub fn capacity(&self) -> usize { self.columns as usize * self.rows as usize }
}

/// Source tube for the `index`-th sample, or `None` past the rack capacity or
/// below row `H`.
pub fn source_well(index: usize, layout: &SourceLayout) -> Option<Well> {
    if layout.columns == 0 || index >= layout.capacity() {
        return None;
    }
    let first = usize::from((layout.first_row.to_ascii_uppercase() as u8).checked_sub(b'A')?);
    let columns = usize::from(layout.columns);
    plate_well(first.checked_add(index / columns)?, index % columns + 1)
}

/// Destination well for the `index`-th sample, or `None` past the plate capacity
/// or below row `H`.
pub fn destination_well(index: usize, layout: &DestinationLayout) -> Option<Well> {
    if layout.rows == 0 || index >= layout.capacity() {
        return None;
    }
    let rows = usize::from(layout.rows);
    plate_well(index % rows, index / rows + 1)
}

fn plate_well(row: usize, column: usize) -> Option<Well> {
    if row >= PLATE_ROWS || column > PLATE_COLUMNS {
        return None;
    }
    Some(Well::new(u8::try_from(row).ok()?, u8::try_from(column).ok()?))
}

/// Assay-plate wells holding replicate group `ordinal`.
///
/// Groups 0..8 are the standards in columns 1-3; the `i`-th unknown is group
/// `8 + i`, so unknowns 0..8 sit in columns 4-6, 8..16 in 7-9 and 16.. in 10-12.
pub fn replicate_wells(ordinal: usize) -> Option<[Well; REPLICATES]> {
    if ordinal >= MAX_GROUPS {
        return None;
    }
    let row = (ordinal % PLATE_ROWS) as u8;
    let first_col = ((ordinal / PLATE_ROWS) * REPLICATES) as u8 + 1;
    Some([Well::new(row, first_col), Well::new(row, first_col + 1), Well::new(row, first_col + 2)])
}

/// Destination columns touched by `samples` samples filled column-major.
pub fn columns_spanned(samples: usize, rows: u8) -> usize {
    if rows == 0 { return 0; }
    samples.div_ceil(rows as usize)
}

#[cfg(test)]
mod mapping_tests {
    use super::*;
    use crate::plate::AbsorbanceGrid;
    use crate::replicate::group_replicates;

    fn labels(ws: &[Well]) -> Vec<String> { ws.iter().map(ToString::to_string).collect() }

    #[test]
    fn source_fills_rows_b_to_d() {
        let l = SourceLayout::default();
        let got: Vec<Well> = [0, 5, 6, 11, 12, 17].iter().filter_map(|i| source_well(*i, &l)).collect();
        assert_eq!(labels(&got), ["B1", "B6", "C1", "C6", "D1", "D6"]);
        assert_eq!(source_well(18, &l), None);
    }

    #[test]
    fn source_layout_variants() {
        let l = SourceLayout { first_row: 'a', columns: 4, rows: 2 };
        assert_eq!(l.capacity(), 8);
        assert_eq!(source_well(4, &l).unwrap().to_string(), "B1");
        assert_eq!(source_well(7, &l).unwrap().to_string(), "B4");
        assert_eq!(source_well(8, &l), None);
    }

    #[test]
    fn destination_fills_columns() {
        let l = DestinationLayout::default();
        let got: Vec<Well> = [0, 7, 8, 95].iter().filter_map(|i| destination_well(*i, &l)).collect();
        assert_eq!(labels(&got), ["A1", "H1", "A2", "H12"]);
        assert_eq!(destination_well(96, &l), None);
    }

    #[test]
    fn short_columns_wrap_earlier() {
        let l = DestinationLayout { rows: 4, columns: 3 };
        assert_eq!(destination_well(4, &l).unwrap().to_string(), "A2");
        assert_eq!(destination_well(12, &l), None);
    }

    #[test]
    fn wells_past_row_h_are_not_mapped() {
        let src = SourceLayout { first_row: 'G', columns: 6, rows: 3 };
        assert_eq!(source_well(11, &src).unwrap().to_string(), "H6");
        assert_eq!(source_well(12, &src), None);
        assert_eq!(source_well(240, &SourceLayout { first_row: 'Z', columns: 1, rows: 255 }), None);
        assert_eq!(source_well(0, &SourceLayout { first_row: '1', columns: 1, rows: 1 }), None);

        let dst = DestinationLayout { rows: 20, columns: 1 };
        assert_eq!(destination_well(7, &dst).unwrap().to_string(), "H1");
        assert_eq!(destination_well(8, &dst), None);
        assert_eq!(destination_well(19, &dst), None);
    }

    #[test]
    fn replicate_wells_match_grouping() {
        let grid = AbsorbanceGrid::from_values(vec![vec![0.0; 12]; 8]).unwrap();
        for g in group_replicates(&grid.readings()) {
            assert_eq!(replicate_wells(g.ordinal), Some(g.wells));
        }
        assert_eq!(labels(&replicate_wells(8).unwrap()), ["A4", "A5", "A6"]);
        assert_eq!(labels(&replicate_wells(8 + 16).unwrap()), ["A10", "A11", "A12"]);
        assert_eq!(replicate_wells(32), None);
    }

    #[test]
    fn columns_round_up() {
        assert_eq!(columns_spanned(0, 8), 0);
        assert_eq!(columns_spanned(8, 8), 1);
        assert_eq!(columns_spanned(10, 8), 2);
        assert_eq!(columns_spanned(18, 8), 3);
    }
}
