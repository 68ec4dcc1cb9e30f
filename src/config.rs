//! Run configuration with layered resolution.
//!
//! Resolution order (highest priority first):
//! 1. CLI flags (applied via [`NormalizeConfig::apply_overrides`])
//! 2. A TOML file passed with `--config`
//! 3. Compiled defaults (1 mg/mL in 0.5 mL, 10 samples, B1–D6 source rack)
//!
//! ```toml
//! sample_count = 12
//! target_concentration = 1.0
//! final_volume = 0.44
//! volume_unit = "mL"
//! min_r_squared = 0.98
//!
//! [reader]
//! skip_rows = 6
//! first_column = "C"
//! ```
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calibration::{StandardSeries, STANDARD_COUNT};
use crate::dilution::{DilutionTarget, VolumeUnit};
use crate::error::{NormalizeError, Result};
use crate::layout::{DestinationLayout, SourceLayout};
use crate::plate::{PLATE_COLUMNS, PLATE_ROWS};
use crate::reader::{column_index, ReaderOptions};
use crate::replicate::MAX_GROUPS;

/// Everything a normalization run needs besides the absorbance grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Unknown samples on the plate, after the standards.
    pub sample_count: usize,
    /// Target concentration in mg/mL.
    pub target_concentration: f64,
    /// Final volume per normalized sample, in `volume_unit`.
    pub final_volume: f64,
    pub volume_unit: VolumeUnit,
    /// Reference concentrations of the standard series (mg/mL).
    pub standards: StandardSeries,
    /// R² below which a warning is logged. The run continues regardless.
    pub min_r_squared: Option<f64>,
    pub reader: ReaderOptions,
    pub source: SourceLayout,
    pub destination: DestinationLayout,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            sample_count: 10,
            target_concentration: 1.0,
            final_volume: 0.5,
            volume_unit: VolumeUnit::Millilitre,
            standards: StandardSeries::default(),
            min_r_squared: None,
            reader: ReaderOptions::default(),
            source: SourceLayout::default(),
            destination: DestinationLayout::default(),
        }
    }
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub sample_count: Option<usize>,
    pub target_concentration: Option<f64>,
    pub final_volume: Option<f64>,
    pub volume_unit: Option<VolumeUnit>,
    pub skip_rows: Option<usize>,
    pub first_column: Option<String>,
    pub min_r_squared: Option<f64>,
}

impl NormalizeConfig {
    /// Load from an optional TOML file, apply CLI overrides, then validate.
    pub fn load(path: Option<&Path>, overrides: Option<&CliOverrides>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)?;
                Self::from_toml(&text).map_err(|e| match e {
                    NormalizeError::Configuration { message, .. } => NormalizeError::config(p.display().to_string(), message),
                    other => other,
                })?
            }
            None => Self::default(),
        };
        if let Some(cli) = overrides {
            config.apply_overrides(cli);
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document. Missing keys take their defaults; no validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| NormalizeError::config("<toml>", e.to_string()))
    }

    pub fn apply_overrides(&mut self, cli: &CliOverrides) {
        if let Some(n) = cli.sample_count { self.sample_count = n; }
        if let Some(c) = cli.target_concentration { self.target_concentration = c; }
        if let Some(v) = cli.final_volume { self.final_volume = v; }
        if let Some(u) = cli.volume_unit { self.volume_unit = u; }
        if let Some(s) = cli.skip_rows { self.reader.skip_rows = s; }
        if let Some(c) = &cli.first_column { self.reader.first_column = c.clone(); }
        if let Some(r) = cli.min_r_squared { self.min_r_squared = Some(r); }
    }

    pub fn target(&self) -> DilutionTarget {
        DilutionTarget::new(self.target_concentration, self.final_volume)
    }

    /// Largest sample count the plate, the source rack and the destination plate all hold.
    pub fn max_samples(&self) -> usize {
        (MAX_GROUPS - STANDARD_COUNT).min(self.source.capacity()).min(self.destination.capacity())
    }

    /// Check every value a run depends on.
    pub fn validate(&self) -> Result<()> {
        let max = self.max_samples();
        if self.sample_count == 0 || self.sample_count > max {
            return Err(NormalizeError::config("sample_count", format!("must be between 1 and {max}, got {}", self.sample_count)));
        }
        if !(self.target_concentration.is_finite() && self.target_concentration > 0.0) {
            return Err(NormalizeError::config("target_concentration", format!("must be positive, got {}", self.target_concentration)));
        }
        if !(self.final_volume.is_finite() && self.final_volume > 0.0) {
            return Err(NormalizeError::config("final_volume", format!("must be positive, got {}", self.final_volume)));
        }
        let standards = self.standards.concentrations();
        if standards.len() != STANDARD_COUNT {
            return Err(NormalizeError::config("standards", format!("expected {STANDARD_COUNT} concentrations, got {}", standards.len())));
        }
        if let Some(bad) = standards.iter().find(|c| !c.is_finite() || **c < 0.0) {
            return Err(NormalizeError::config("standards", format!("concentrations must be finite and non-negative, got {bad}")));
        }
        if let Some(r) = self.min_r_squared {
            if !(0.0..=1.0).contains(&r) {
                return Err(NormalizeError::config("min_r_squared", "must be between 0.0 and 1.0"));
            }
        }
        if column_index(&self.reader.first_column).is_none() {
            return Err(NormalizeError::config("reader.first_column", format!("not a column label: {:?}", self.reader.first_column)));
        }
        if !self.source.first_row.is_ascii_alphabetic() {
            return Err(NormalizeError::config("source.first_row", format!("not a row letter: {:?}", self.source.first_row)));
        }
        let first_row = usize::from(self.source.first_row.to_ascii_uppercase() as u8 - b'A');
        if first_row + usize::from(self.source.rows) > PLATE_ROWS || usize::from(self.source.columns) > PLATE_COLUMNS {
            return Err(NormalizeError::config(
                "source",
                format!("{} x {} block from row {} does not fit on the plate", self.source.rows, self.source.columns, self.source.first_row),
            ));
        }
        if usize::from(self.destination.rows) > PLATE_ROWS {
            return Err(NormalizeError::config("destination.rows", format!("at most {PLATE_ROWS}, got {}", self.destination.rows)));
        }
        if usize::from(self.destination.columns) > PLATE_COLUMNS {
            return Err(NormalizeError::config("destination.columns", format!("at most {PLATE_COLUMNS}, got {}", self.destination.columns)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = NormalizeConfig::default();
        c.validate().unwrap();
        assert_eq!(c.max_samples(), 18);
        assert_eq!(c.target(), DilutionTarget::new(1.0, 0.5));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = NormalizeConfig::from_toml("sample_count = 4\nfinal_volume = 0.44\n[source]\nfirst_row = 'A'\n").unwrap();
        assert_eq!(c.sample_count, 4);
        assert_eq!(c.final_volume, 0.44);
        assert_eq!(c.target_concentration, 1.0);
        assert_eq!(c.source.first_row, 'A');
        assert_eq!(c.source.columns, 6);
        assert_eq!(c.reader.first_column, "C");
    }

    #[test]
    fn unit_and_standards_from_toml() {
        let c = NormalizeConfig::from_toml("volume_unit = \"uL\"\nfinal_volume = 440.0\nstandards = [8.0, 4.0, 2.0, 1.0, 0.5, 0.25, 0.125, 0.0]\n").unwrap();
        assert_eq!(c.volume_unit, VolumeUnit::Microlitre);
        assert_eq!(c.standards.concentrations()[0], 8.0);
        c.validate().unwrap();
    }

    #[test]
    fn cli_overrides_win() {
        let mut c = NormalizeConfig::default();
        c.apply_overrides(&CliOverrides { sample_count: Some(18), target_concentration: Some(2.0), ..Default::default() });
        assert_eq!(c.sample_count, 18);
        assert_eq!(c.target_concentration, 2.0);
        assert_eq!(c.final_volume, 0.5);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            (NormalizeConfig { sample_count: 0, ..Default::default() }, "sample_count"),
            (NormalizeConfig { sample_count: 19, ..Default::default() }, "sample_count"),
            (NormalizeConfig { final_volume: 0.0, ..Default::default() }, "final_volume"),
            (NormalizeConfig { target_concentration: -1.0, ..Default::default() }, "target_concentration"),
            (NormalizeConfig { standards: StandardSeries(vec![1.0; 7]), ..Default::default() }, "standards"),
            (NormalizeConfig { min_r_squared: Some(1.5), ..Default::default() }, "min_r_squared"),
            (NormalizeConfig { source: SourceLayout { first_row: 'G', columns: 6, rows: 3 }, ..Default::default() }, "source"),
            (NormalizeConfig { source: SourceLayout { first_row: 'B', columns: 13, rows: 1 }, ..Default::default() }, "source"),
            (NormalizeConfig { destination: DestinationLayout { rows: 20, columns: 1 }, ..Default::default() }, "destination.rows"),
        ];
        for (cfg, field) in cases {
            match cfg.validate() {
                Err(NormalizeError::Configuration { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected config error for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_toml_is_a_configuration_error() {
        let err = NormalizeConfig::from_toml("sample_count = \"ten\"").unwrap_err();
        assert_eq!(err.code(), crate::error::codes::CONFIGURATION_ERROR);
    }

    #[test]
    fn load_reads_file_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, "sample_count = 30\n").unwrap();
        assert!(NormalizeConfig::load(Some(&path), None).is_err());
        let fixed = CliOverrides { sample_count: Some(6), ..Default::default() };
        assert_eq!(NormalizeConfig::load(Some(&path), Some(&fixed)).unwrap().sample_count, 6);
    }
}
