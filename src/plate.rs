//! Core types for **wells** and the **absorbance grid**.
//!
//! A 96-well plate is addressed by row letter (`A`–`H`) and 1-based column
//! (`1`–`12`). The [`AbsorbanceGrid`] is the immutable matrix of optical
//! densities read from one plate; it is produced once per run and only read
//! afterwards.
//!
//! # Examples
//! ```
//! use bcanorm::plate::{AbsorbanceGrid, Well};
//! let grid = AbsorbanceGrid::from_values(vec![vec![0.1; 12]; 8]).unwrap();
//! let first = grid.readings()[0];
//! assert_eq!(first.well, "A1".parse::<Well>().unwrap());
//! ```
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NormalizeError, Result};

/// Rows on a 96-well plate.
pub const PLATE_ROWS: usize = 8;
/// Columns on a 96-well plate.
pub const PLATE_COLUMNS: usize = 12;
/// Number of wells on a 96-well plate.
pub const PLATE_WELLS: usize = PLATE_ROWS * PLATE_COLUMNS;

/// A single well position. `row` is 0-based (`0` = `A`), `column` is 1-based.
///
/// Parsing only accepts labels on a 96-well plate (`A1`–`H12`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Well {
    pub row: u8,
    pub column: u8,
}

impl Well {
    /// Build a well from a 0-based row and a 1-based column.
    pub const fn new(row: u8, column: u8) -> Self { Self { row, column } }

    /// Row letter (`'A'` for row 0).
    pub fn row_letter(&self) -> char { (b'A' + self.row) as char }

    /// Position of this well in the row-major plate order (A1 = 0, A2 = 1, …, H12 = 95).
    pub fn plate_index(&self) -> usize {
        self.row as usize * PLATE_COLUMNS + (self.column as usize - 1)
    }
}

impl fmt::Display for Well {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.column)
    }
}

impl FromStr for Well {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars.next().ok_or_else(|| "empty well label".to_string())?.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() || usize::from(letter as u8 - b'A') >= PLATE_ROWS {
            return Err(format!("invalid row in well label: {s}"));
        }
        let column: u8 = chars.as_str().parse().map_err(|_| format!("invalid column in well label: {s}"))?;
        if column == 0 || usize::from(column) > PLATE_COLUMNS {
            return Err(format!("column out of range 1-{PLATE_COLUMNS}: {s}"));
        }
        Ok(Well { row: letter as u8 - b'A', column })
    }
}

impl Serialize for Well {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Well {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One optical-density reading labelled with its well.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    pub well: Well,
    pub absorbance: f64,
}

/// An 8×12 matrix of finite absorbance values, in plate order.
#[derive(Clone, Debug, PartialEq)]
pub struct AbsorbanceGrid {
    values: [[f64; PLATE_COLUMNS]; PLATE_ROWS],
}

impl AbsorbanceGrid {
    /// Build a grid from numeric rows.
    ///
    /// Fails when the extents are not 8×12 or a value is NaN/infinite.
    pub fn from_values(rows: Vec<Vec<f64>>) -> Result<Self> {
        check_shape(rows.len(), rows.iter().map(Vec::len))?;
        let mut values = [[0.0; PLATE_COLUMNS]; PLATE_ROWS];
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                if !v.is_finite() {
                    return Err(NormalizeError::InvalidReading {
                        well: Well::new(r as u8, c as u8 + 1).to_string(),
                        value: v.to_string(),
                    });
                }
                values[r][c] = *v;
            }
        }
        Ok(Self { values })
    }

    /// Build a grid from text cells as exported by a plate reader.
    ///
    /// Cells are trimmed before parsing; an empty or non-numeric cell is an error
    /// naming the well it came from.
    pub fn from_cells<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self> {
        check_shape(rows.len(), rows.iter().map(Vec::len))?;
        let mut values = [[0.0; PLATE_COLUMNS]; PLATE_ROWS];
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let text = cell.as_ref().trim();
                let parsed = text.parse::<f64>().ok().filter(|v| v.is_finite());
                values[r][c] = parsed.ok_or_else(|| NormalizeError::InvalidReading {
                    well: Well::new(r as u8, c as u8 + 1).to_string(),
                    value: text.to_string(),
                })?;
            }
        }
        Ok(Self { values })
    }

    /// Absorbance at `well`, or `None` if the well is off the plate.
    pub fn get(&self, well: Well) -> Option<f64> {
        let c = (well.column as usize).checked_sub(1)?;
        self.values.get(well.row as usize)?.get(c).copied()
    }

    /// Flatten to the plate-reader order: A1…A12, B1…B12, …, H1…H12.
    pub fn readings(&self) -> Vec<Reading> {
        let mut out = Vec::with_capacity(PLATE_WELLS);
        for (r, row) in self.values.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                out.push(Reading { well: Well::new(r as u8, c as u8 + 1), absorbance: *v });
            }
        }
        out
    }
}

fn check_shape(rows: usize, mut widths: impl Iterator<Item = usize>) -> Result<()> {
    if rows != PLATE_ROWS {
        let columns = widths.next().unwrap_or(0);
        return Err(NormalizeError::GridShape { rows, columns });
    }
    if let Some(columns) = widths.find(|w| *w != PLATE_COLUMNS) {
        return Err(NormalizeError::GridShape { rows, columns });
    }
    Ok(())
}


#[cfg(test)]
mod grid_tests {
    use super::*;

    fn numbered() -> Vec<Vec<f64>> {
        (0..PLATE_ROWS).map(|r| (0..PLATE_COLUMNS).map(|c| (r * PLATE_COLUMNS + c) as f64).collect()).collect()
    }

    #[test]
    fn readings_are_row_major_and_labelled() {
        let grid = AbsorbanceGrid::from_values(numbered()).unwrap();
        let flat = grid.readings();
        assert_eq!(flat.len(), PLATE_WELLS);
        assert_eq!(flat[1].well.to_string(), "A2");
        assert_eq!(flat[12].well.to_string(), "B1");
        assert_eq!(flat[95].well.to_string(), "H12");
        assert!(flat.iter().enumerate().all(|(i, r)| r.absorbance == i as f64 && r.well.plate_index() == i));
    }

    #[test]
    fn wrong_row_count_is_a_shape_error() {
        let mut rows = numbered();
        rows.pop();
        let err = AbsorbanceGrid::from_values(rows).unwrap_err();
        assert!(matches!(err, NormalizeError::GridShape { rows: 7, columns: 12 }));
    }

    #[test]
    fn ragged_row_is_a_shape_error() {
        let mut rows = numbered();
        rows[4].push(1.0);
        let err = AbsorbanceGrid::from_values(rows).unwrap_err();
        assert!(matches!(err, NormalizeError::GridShape { rows: 8, columns: 13 }));
    }

    #[test]
    fn unparseable_cell_names_its_well() {
        let mut cells: Vec<Vec<String>> = vec![vec!["0.25".to_string(); 12]; 8];
        cells[2][3] = "OVRFLW".to_string();
        match AbsorbanceGrid::from_cells(&cells).unwrap_err() {
            NormalizeError::InvalidReading { well, value } => {
                assert_eq!(well, "C4");
                assert_eq!(value, "OVRFLW");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cells_are_trimmed_and_nan_rejected() {
        let mut cells: Vec<Vec<&str>> = vec![vec![" 0.5 "; 12]; 8];
        let grid = AbsorbanceGrid::from_cells(&cells).unwrap();
        assert_eq!(grid.get(Well::new(7, 12)), Some(0.5));
        cells[0][0] = "NaN";
        assert!(AbsorbanceGrid::from_cells(&cells).is_err());
    }
}
