//! Error type shared by every stage of the normalization pipeline.
//!
//! All variants are terminal for the run being processed: the inputs are
//! deterministic snapshots, so nothing here is retried. Each variant carries
//! enough context (well, sample ordinal, config field) for an operator to halt
//! the physical run before any pipetting happens.

/// Stable category strings returned by [`NormalizeError::code`].
pub mod codes {
    pub const FORMAT_ERROR: &str = "FORMAT_ERROR";
    pub const DEGENERATE_CALIBRATION: &str = "DEGENERATE_CALIBRATION";
    pub const NON_POSITIVE_CONCENTRATION: &str = "NON_POSITIVE_CONCENTRATION";
    pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";
    pub const IO_ERROR: &str = "IO_ERROR";
}

/// Errors raised while ingesting, calibrating or normalizing a plate.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("format error: expected an 8x12 absorbance grid, found {rows} rows x {columns} columns")]
    GridShape { rows: usize, columns: usize },

    #[error("format error: reading at {well} is not a number: {value:?}")]
    InvalidReading { well: String, value: String },

    #[error("format error: plate yields {found} replicate groups, {required} required")]
    MissingGroups { found: usize, required: usize },

    #[error("degenerate calibration: {0}")]
    DegenerateCalibration(String),

    #[error("sample {sample} ({well}) has non-positive concentration {concentration} mg/mL")]
    NonPositiveConcentration { sample: usize, well: String, concentration: f64 },

    #[error("invalid configuration for {field}: {message}")]
    Configuration { field: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl NormalizeError {
    /// Shorthand for a [`NormalizeError::Configuration`] error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration { field: field.into(), message: message.into() }
    }

    /// Category of the error, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Self::GridShape { .. } | Self::InvalidReading { .. } | Self::MissingGroups { .. } => codes::FORMAT_ERROR,
            Self::Csv(_) => codes::FORMAT_ERROR,
            Self::DegenerateCalibration(_) => codes::DEGENERATE_CALIBRATION,
            Self::NonPositiveConcentration { .. } => codes::NON_POSITIVE_CONCENTRATION,
            Self::Configuration { .. } => codes::CONFIGURATION_ERROR,
            Self::Io(_) | Self::Polars(_) | Self::Json(_) => codes::IO_ERROR,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T, E = NormalizeError> = std::result::Result<T, E>;

#[cfg(test)]
mod code_tests {
    use super::*;

    #[test]
    fn format_family_shares_one_code() {
        let shape = NormalizeError::GridShape { rows: 7, columns: 12 };
        let cell = NormalizeError::InvalidReading { well: "C4".into(), value: "OVER".into() };
        assert_eq!(shape.code(), codes::FORMAT_ERROR);
        assert_eq!(cell.code(), codes::FORMAT_ERROR);
        assert!(cell.to_string().contains("C4"));
    }

    #[test]
    fn config_helper_names_the_field() {
        let e = NormalizeError::config("sample_count", "must be at least 1");
        assert_eq!(e.code(), codes::CONFIGURATION_ERROR);
        assert_eq!(e.to_string(), "invalid configuration for sample_count: must be at least 1");
    }
}
