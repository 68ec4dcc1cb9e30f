//! Concentration and pipetting-volume derivation for unknown samples.
//!
//! Every volume shares the unit of [`DilutionTarget::final_volume`]. A sample
//! that is too dilute to reach the target within the final volume is used
//! undiluted: the sample volume is clamped to the final volume, the diluent is
//! zero and [`Dilution::clamped`] is set.
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationModel;
use crate::error::{NormalizeError, Result};
use crate::replicate::ReplicateGroup;

/// Unit shared by the final, sample and diluent volumes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeUnit {
    #[default]
    #[serde(rename = "mL", alias = "ml")]
    Millilitre,
    #[serde(rename = "uL", alias = "ul", alias = "µL")]
    Microlitre,
}

impl VolumeUnit {
    /// Convert `volume` in this unit to microlitres, the unit pipettes are driven in.
    pub fn to_microlitres(self, volume: f64) -> f64 {
        match self {
            Self::Millilitre => volume * 1000.0,
            Self::Microlitre => volume,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Millilitre => "mL",
            Self::Microlitre => "uL",
        }
    }
}

impl std::str::FromStr for VolumeUnit {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ml" => Ok(Self::Millilitre),
            "ul" | "µl" => Ok(Self::Microlitre),
            other => Err(format!("Unknown volume unit: {}", other)),
        }
    }
}

/// Concentration every sample is brought to, in a fixed final volume.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DilutionTarget {
    /// Target concentration in mg/mL.
    pub concentration: f64,
    pub final_volume: f64,
}

impl DilutionTarget {
    pub fn new(concentration: f64, final_volume: f64) -> Self { Self { concentration, final_volume } }
}

/// Volumes to combine for one sample. `sample_volume + diluent_volume == final_volume`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dilution {
    pub sample_volume: f64,
    pub diluent_volume: f64,
    /// The sample was too dilute and is used undiluted.
    pub clamped: bool,
}

/// Volumes needed to bring a sample at `concentration` to `target`.
///
/// Returns `None` when `concentration` is zero, negative or not finite.
///
/// # Examples
/// ```
/// use bcanorm::dilution::{dilution_for, DilutionTarget};
/// let d = dilution_for(2.0, &DilutionTarget::new(1.0, 0.5)).unwrap();
/// assert_eq!((d.sample_volume, d.diluent_volume), (0.25, 0.25));
/// ```
pub fn dilution_for(concentration: f64, target: &DilutionTarget) -> Option<Dilution> {
    if !(concentration.is_finite() && concentration > 0.0) {
        return None;
    }
    let sample_volume = target.concentration * target.final_volume / concentration;
    if sample_volume > target.final_volume {
        return Some(Dilution { sample_volume: target.final_volume, diluent_volume: 0.0, clamped: true });
    }
    Some(Dilution { sample_volume, diluent_volume: target.final_volume - sample_volume, clamped: false })
}

/// An unknown sample with its derived concentration and volumes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnknownSample {
    /// 0-based position among the unknowns.
    pub index: usize,
    pub group: ReplicateGroup,
    pub concentration: f64,
    pub dilution: Dilution,
}

/// Derive concentration and volumes for the `index`-th unknown.
///
/// A non-positive concentration is an error naming the sample and its wells;
/// it is never replaced by a default.
pub fn derive_sample(index: usize, group: ReplicateGroup, model: &CalibrationModel, target: &DilutionTarget) -> Result<UnknownSample> {
    let concentration = model.concentration_for(group.mean());
    let dilution = dilution_for(concentration, target).ok_or_else(|| NormalizeError::NonPositiveConcentration {
        sample: index + 1,
        well: group.first_well().to_string(),
        concentration,
    })?;
    if dilution.clamped {
        tracing::warn!(
            sample = index + 1,
            well = %group.first_well(),
            concentration,
            target = target.concentration,
            "sample below target concentration; using it undiluted"
        );
    }
    Ok(UnknownSample { index, group, concentration, dilution })
}
