//! Plate-reader export ingestion (CSV / TSV).
//!
//! Reader software writes a block of run metadata above the absorbance table,
//! then one line per plate row with a row label before the data cells. The
//! table is located with a fixed header offset and a spreadsheet column window:
//! by default data starts after 6 lines and in column `C`, spanning `C:N`.
//!
//! ### Errors
//! Short files, short rows and non-numeric cells surface as format errors; IO
//! and CSV errors are bubbled up unchanged.
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NormalizeError, Result};
use crate::plate::{AbsorbanceGrid, PLATE_COLUMNS, PLATE_ROWS};

/// Where the absorbance table sits inside an export file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Records above the first plate row (metadata plus the column header).
    /// Blank lines are not records and are not counted.
    pub skip_rows: usize,
    /// Spreadsheet column letter of the `1` column (e.g. `"C"`).
    pub first_column: String,
    /// Field delimiter; inferred from the file extension when `None`.
    pub delimiter: Option<char>,
}

impl Default for ReaderOptions {
    fn default() -> Self { Self { skip_rows: 6, first_column: "C".to_string(), delimiter: None } }
}

/// 0-based index of a spreadsheet column label (`A` = 0, `Z` = 25, `AA` = 26).
pub fn column_index(label: &str) -> Option<usize> {
    let label = label.trim();
    if label.is_empty() { return None; }
    let mut idx = 0usize;
    for ch in label.chars() {
        if !ch.is_ascii_alphabetic() { return None; }
        idx = idx * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(idx - 1)
}

/// Read an export file from disk.
///
/// Tab-delimited for `.tsv` / `.txt`, comma-delimited otherwise, unless
/// [`ReaderOptions::delimiter`] is set.
pub fn read_grid<P: AsRef<Path>>(path: P, opts: &ReaderOptions) -> Result<AbsorbanceGrid> {
    let p = path.as_ref();
    let delim = opts.delimiter.unwrap_or_else(|| {
        match p.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("tsv") | Some("txt") => '\t',
            _ => ',',
        }
    });
    let file = std::fs::File::open(p)?;
    tracing::debug!(path = %p.display(), delimiter = ?delim, "reading absorbance export");
    parse_grid(file, &ReaderOptions { delimiter: Some(delim), ..opts.clone() })
}

/// Parse an export from any reader. Defaults to comma-delimited.
pub fn parse_grid<R: Read>(input: R, opts: &ReaderOptions) -> Result<AbsorbanceGrid> {
    let first = column_index(&opts.first_column)
        .ok_or_else(|| NormalizeError::config("reader.first_column", format!("not a column label: {:?}", opts.first_column)))?;
    let delim = opts.delimiter.unwrap_or(',');
    if !delim.is_ascii() {
        return Err(NormalizeError::config("reader.delimiter", "must be a single ASCII character"));
    }
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delim as u8)
        .from_reader(input);

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(PLATE_ROWS);
    for rec in rdr.records().skip(opts.skip_rows).take(PLATE_ROWS) {
        let r = rec?;
        let cells: Vec<String> = r.iter().skip(first).take(PLATE_COLUMNS).map(str::to_string).collect();
        rows.push(cells);
    }
    AbsorbanceGrid::from_cells(&rows)
}
