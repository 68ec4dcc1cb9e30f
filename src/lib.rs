#![forbid(unsafe_code)]
//! # bcanorm
//!
//! Standard-curve fitting and protein **normalization** for BCA assays read on a
//! 96-well plate. Given the plate-reader absorbance grid and the number of
//! unknown samples, the crate estimates each sample's protein concentration and
//! the sample/diluent volumes that bring it to a target concentration in a fixed
//! final volume, together with the source tube and destination well for each
//! transfer.
//!
//! ## Pipeline
//! ingest ([`plate`], [`reader`]) → group triplicates ([`replicate`]) → fit the
//! standard curve ([`calibration`]) → derive volumes ([`dilution`]) → map wells
//! ([`layout`]) → report ([`report`]).
//!
//! Every stage is a pure function over owned data; nothing here drives hardware.
//! The robot layer consumes [`NormalizationRun::samples`].
//!
//! ## Plate layout
//! - Columns 1-3, rows A–H: the BSA standard series in triplicate (10 → 0 mg/mL).
//! - Columns 4-12: unknown samples in triplicate, filled A4-A6, B4-B6, … then A7-A9, ….
//!
//! ## Examples
//! ```rust
//! use bcanorm::{normalize, plate::AbsorbanceGrid, config::NormalizeConfig};
//! let standards = [2.0, 1.1, 0.6, 0.35, 0.2, 0.12, 0.08, 0.02];
//! let mut rows = vec![vec![0.5; 12]; 8];
//! for (r, a) in standards.iter().enumerate() { rows[r][..3].fill(*a); }
//! let grid = AbsorbanceGrid::from_values(rows).unwrap();
//! let config = NormalizeConfig { sample_count: 2, ..Default::default() };
//! let run = normalize(&grid, &config).unwrap();
//! assert!(run.calibration.r_squared > 0.99);
//! assert_eq!(run.samples[1].source_well.to_string(), "B2");
//! ```

pub mod error;
pub mod plate;
pub mod reader;
pub mod replicate;
pub mod calibration;
pub mod dilution;
pub mod layout;
pub mod config;
pub mod report;

use std::path::Path;

use serde::Serialize;

use calibration::{CalibrationModel, STANDARD_COUNT};
use config::NormalizeConfig;
use dilution::{DilutionTarget, UnknownSample, VolumeUnit};
use error::{NormalizeError, Result};
use plate::{AbsorbanceGrid, Well};
use replicate::REPLICATES;

/// Crate version string (from `CARGO_PKG_VERSION`).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One standard of the fitted curve, for reporting.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StandardSummary {
    pub concentration: f64,
    pub mean_absorbance: f64,
    pub wells: [Well; REPLICATES],
}

/// Per-sample result handed to the pipetting layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedSample {
    /// 0-based position among the unknowns.
    pub index: usize,
    /// Assay-plate wells the triplicate was read from.
    pub assay_wells: [Well; REPLICATES],
    pub mean_absorbance: f64,
    /// Estimated concentration in mg/mL.
    pub concentration: f64,
    pub sample_volume: f64,
    pub diluent_volume: f64,
    /// Too dilute to reach the target; used undiluted.
    pub clamped: bool,
    pub source_well: Well,
    pub destination_well: Well,
}

impl NormalizedSample {
    fn new(unknown: &UnknownSample, source_well: Well, destination_well: Well) -> Self {
        Self {
            index: unknown.index,
            assay_wells: unknown.group.wells,
            mean_absorbance: unknown.group.mean(),
            concentration: unknown.concentration,
            sample_volume: unknown.dilution.sample_volume,
            diluent_volume: unknown.dilution.diluent_volume,
            clamped: unknown.dilution.clamped,
            source_well,
            destination_well,
        }
    }

    /// Human-facing sample name (`"Sample 1"` for index 0).
    pub fn label(&self) -> String { format!("Sample {}", self.index + 1) }
}

/// Outcome of one normalization run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizationRun {
    pub calibration: CalibrationModel,
    /// R² fell below the configured `min_r_squared`. Informational only.
    pub low_fit: bool,
    pub target: DilutionTarget,
    pub volume_unit: VolumeUnit,
    pub standards: Vec<StandardSummary>,
    pub samples: Vec<NormalizedSample>,
}

/// Run the full pipeline on an in-memory grid.
///
/// The config is validated first. Any failing sample aborts the run: no sample
/// is skipped and no default volume is substituted.
pub fn normalize(grid: &AbsorbanceGrid, config: &NormalizeConfig) -> Result<NormalizationRun> {
    config.validate()?;
    let groups = replicate::group_replicates(&grid.readings());
    let required = STANDARD_COUNT + config.sample_count;
    if groups.len() < required {
        return Err(NormalizeError::MissingGroups { found: groups.len(), required });
    }

    let points = config.standards.pair(&groups)?;
    let model = CalibrationModel::fit(&points)?;
    let low_fit = config.min_r_squared.is_some_and(|min| model.r_squared < min);
    if low_fit {
        tracing::warn!(r_squared = model.r_squared, min = ?config.min_r_squared, "standard curve below R² threshold; review before pipetting");
    }

    let target = config.target();
    let mut samples = Vec::with_capacity(config.sample_count);
    for (index, group) in groups[STANDARD_COUNT..required].iter().enumerate() {
        let unknown = dilution::derive_sample(index, *group, &model, &target)?;
        let source = layout::source_well(index, &config.source)
            .ok_or_else(|| NormalizeError::config("source", format!("no source position for sample {}", index + 1)))?;
        let destination = layout::destination_well(index, &config.destination)
            .ok_or_else(|| NormalizeError::config("destination", format!("no destination well for sample {}", index + 1)))?;
        samples.push(NormalizedSample::new(&unknown, source, destination));
    }
    tracing::info!(samples = samples.len(), clamped = samples.iter().filter(|s| s.clamped).count(), "normalized samples");

    Ok(NormalizationRun {
        calibration: model,
        low_fit,
        target,
        volume_unit: config.volume_unit,
        standards: points
            .iter()
            .map(|p| StandardSummary { concentration: p.concentration, mean_absorbance: p.mean_absorbance(), wells: p.group.wells })
            .collect(),
        samples,
    })
}

/// Read a plate-reader export with `config.reader` and normalize it.
pub fn normalize_file<P: AsRef<Path>>(path: P, config: &NormalizeConfig) -> Result<NormalizationRun> {
    let grid = reader::read_grid(path, &config.reader)?;
    normalize(&grid, config)
}
