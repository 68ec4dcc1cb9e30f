//! Tabular and JSON reports of a [`NormalizationRun`].
//!
//! The table is a polars `DataFrame` so the CLI can pretty-print it and write
//! CSV with the same column set. Volumes appear twice: in the configured unit
//! and in µL, the unit pipette commands are issued in.
use std::io::Write;

use polars::prelude::*;

use crate::error::Result;
use crate::NormalizationRun;

/// One row per normalized sample.
pub fn samples_frame(run: &NormalizationRun) -> PolarsResult<DataFrame> {
    let unit = run.volume_unit;
    let s = &run.samples;
    df!(
        "sample"              => s.iter().map(|r| r.label()).collect::<Vec<_>>(),
        "assay_wells"         => s.iter().map(|r| r.assay_wells.map(|w| w.to_string()).join("/")).collect::<Vec<_>>(),
        "mean_absorbance"     => s.iter().map(|r| r.mean_absorbance).collect::<Vec<_>>(),
        "concentration_mg_ml" => s.iter().map(|r| r.concentration).collect::<Vec<_>>(),
        "sample_volume"       => s.iter().map(|r| r.sample_volume).collect::<Vec<_>>(),
        "diluent_volume"      => s.iter().map(|r| r.diluent_volume).collect::<Vec<_>>(),
        "volume_unit"         => s.iter().map(|_| unit.as_str()).collect::<Vec<_>>(),
        "sample_ul"           => s.iter().map(|r| unit.to_microlitres(r.sample_volume)).collect::<Vec<_>>(),
        "diluent_ul"          => s.iter().map(|r| unit.to_microlitres(r.diluent_volume)).collect::<Vec<_>>(),
        "clamped"             => s.iter().map(|r| r.clamped).collect::<Vec<_>>(),
        "source_well"         => s.iter().map(|r| r.source_well.to_string()).collect::<Vec<_>>(),
        "destination_well"    => s.iter().map(|r| r.destination_well.to_string()).collect::<Vec<_>>(),
    )
}

/// One row per standard of the fitted curve, with the absorbance the line predicts.
pub fn standards_frame(run: &NormalizationRun) -> PolarsResult<DataFrame> {
    let m = run.calibration;
    let s = &run.standards;
    df!(
        "concentration_mg_ml" => s.iter().map(|p| p.concentration).collect::<Vec<_>>(),
        "mean_absorbance"     => s.iter().map(|p| p.mean_absorbance).collect::<Vec<_>>(),
        "fitted_absorbance"   => s.iter().map(|p| m.slope * p.concentration + m.intercept).collect::<Vec<_>>(),
        "wells"               => s.iter().map(|p| p.wells.map(|w| w.to_string()).join("/")).collect::<Vec<_>>(),
    )
}

/// Write the samples table as CSV with a header row.
pub fn write_csv<W: Write>(run: &NormalizationRun, writer: W) -> Result<()> {
    let mut df = samples_frame(run)?;
    CsvWriter::new(writer).include_header(true).finish(&mut df)?;
    Ok(())
}

/// Write the whole run (calibration, standards, samples) as pretty JSON.
pub fn write_json<W: Write>(run: &NormalizationRun, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, run)?;
    Ok(())
}
