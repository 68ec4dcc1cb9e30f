//! BSA standard curve: reference series, explicit pairing, least-squares fit.
//!
//! The first eight replicate groups on the plate are a two-fold serial
//! dilution of BSA. Each group is paired with its reference concentration as a
//! [`StandardPoint`] and a straight line `absorbance = slope * concentration +
//! intercept` is fitted by ordinary least squares.
//!
//! R² is reported for the operator; it never blocks a run.
//!
//! # Examples
//! ```
//! use bcanorm::calibration::{CalibrationModel, StandardPoint};
//! use bcanorm::plate::Well;
//! use bcanorm::replicate::ReplicateGroup;
//! let points: Vec<StandardPoint> = [10.0, 5.0, 0.0].iter().enumerate().map(|(i, c)| {
//!     let a = 0.1 * c + 0.02;
//!     let w = Well::new(i as u8, 1);
//!     StandardPoint { concentration: *c, group: ReplicateGroup { ordinal: i, wells: [w; 3], readings: [a; 3] } }
//! }).collect();
//! let model = CalibrationModel::fit(&points).unwrap();
//! assert!((model.slope - 0.1).abs() < 1e-9);
//! ```
use serde::{Deserialize, Serialize};

use crate::error::{NormalizeError, Result};
use crate::replicate::ReplicateGroup;

/// Number of points in the standard series.
pub const STANDARD_COUNT: usize = 8;

/// Default two-fold BSA dilution series in mg/mL, highest first.
pub const DEFAULT_STANDARDS: [f64; STANDARD_COUNT] = [10.0, 5.0, 2.5, 1.25, 0.625, 0.3125, 0.15625, 0.0];

/// Reference concentrations (mg/mL) of the standard series, in dilution order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StandardSeries(pub Vec<f64>);

impl Default for StandardSeries {
    fn default() -> Self { Self(DEFAULT_STANDARDS.to_vec()) }
}

impl StandardSeries {
    pub fn concentrations(&self) -> &[f64] { &self.0 }

    /// Pair each reference concentration with the group measured for it.
    ///
    /// The leading groups are consumed in order; the remainder is left for
    /// the unknowns. Fewer groups than standards is a format error.
    pub fn pair(&self, groups: &[ReplicateGroup]) -> Result<Vec<StandardPoint>> {
        if groups.len() < self.0.len() {
            return Err(NormalizeError::MissingGroups { found: groups.len(), required: self.0.len() });
        }
        Ok(self.0.iter().zip(groups).map(|(c, g)| StandardPoint { concentration: *c, group: *g }).collect())
    }
}

/// A known concentration together with the triplicate measured for it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StandardPoint {
    pub concentration: f64,
    pub group: ReplicateGroup,
}

impl StandardPoint {
    pub fn mean_absorbance(&self) -> f64 { self.group.mean() }
}

/// Linear standard curve with its goodness of fit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationModel {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl CalibrationModel {
    /// Ordinary least-squares fit of mean absorbance against concentration.
    ///
    /// Fails with [`NormalizeError::DegenerateCalibration`] when all
    /// concentrations or all absorbances are identical, or when the fitted
    /// slope is zero.
    pub fn fit(points: &[StandardPoint]) -> Result<Self> {
        if points.len() < 2 {
            return Err(NormalizeError::DegenerateCalibration(format!("{} standard point(s), need at least 2", points.len())));
        }
        let xs: Vec<f64> = points.iter().map(|p| p.concentration).collect();
        let ys: Vec<f64> = points.iter().map(StandardPoint::mean_absorbance).collect();
        if all_equal(&xs) {
            return Err(NormalizeError::DegenerateCalibration(format!("all standard concentrations equal {}", xs[0])));
        }
        if all_equal(&ys) {
            return Err(NormalizeError::DegenerateCalibration(format!("all standard absorbances equal {}", ys[0])));
        }

        let n = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;
        let (mut sxx, mut sxy) = (0.0, 0.0);
        for (x, y) in xs.iter().zip(&ys) {
            sxx += (x - mean_x) * (x - mean_x);
            sxy += (x - mean_x) * (y - mean_y);
        }
        let slope = sxy / sxx;
        if slope == 0.0 || !slope.is_finite() {
            return Err(NormalizeError::DegenerateCalibration(format!("fitted slope is {slope}")));
        }
        let intercept = mean_y - slope * mean_x;

        let (mut ss_res, mut ss_tot) = (0.0, 0.0);
        for (x, y) in xs.iter().zip(&ys) {
            let predicted = slope * x + intercept;
            ss_res += (y - predicted) * (y - predicted);
            ss_tot += (y - mean_y) * (y - mean_y);
        }
        let model = Self { slope, intercept, r_squared: 1.0 - ss_res / ss_tot };
        tracing::info!(slope = model.slope, intercept = model.intercept, r_squared = model.r_squared, "fitted standard curve");
        Ok(model)
    }

    /// Concentration (mg/mL) for a mean absorbance, by inverting the line.
    pub fn concentration_for(&self, absorbance: f64) -> f64 {
        (absorbance - self.intercept) / self.slope
    }
}

fn all_equal(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}
