// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::QfaError;

/// Default base sensitivity (gain). Tuned as a robust universal value for
/// survey-cadence photometry: filters active-star noise while the fast
/// decays still catch shallow transits.
pub const DEFAULT_SENSITIVITY: f64 = 0.03;

/// Default memory horizons for the parallel recursive filters, ordered from
/// short memory (~5 samples, narrow dips) to long memory (~100 samples,
/// wide dips).
pub const DEFAULT_DECAYS: [f64; 5] = [0.2, 0.1, 0.05, 0.025, 0.01];

/// Configuration for one fidelity scan.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct ScanConfig {
    /// Base gain. Higher detects fainter signals but amplifies noise.
    pub sensitivity: f64,
    /// Decay constants of the scale bank, each in the open interval (0, 1).
    /// Smaller decay means longer memory.
    pub decays: Vec<f64>,
    /// Saturating noise-aware mapping from flux value to rotation angle,
    /// bounding the per-step perturbation regardless of outlier size.
    pub gain_autoscaling: bool,
    /// Run the kernel forward and on the reversed stream, combining the
    /// fidelity traces with a pointwise max to cancel directional lag.
    pub bidirectional: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            decays: DEFAULT_DECAYS.to_vec(),
            gain_autoscaling: true,
            bidirectional: true,
        }
    }
}

impl ScanConfig {
    /// Validates the configuration.
    ///
    /// An empty scale bank is rejected: the aggregation divides by the
    /// number of scales, and a no-scales trace has no defined meaning.
    pub fn validate(&self) -> Result<(), QfaError> {
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(QfaError::invalid_input(format!(
                "sensitivity must be finite and > 0, got {}",
                self.sensitivity
            )));
        }
        if self.decays.is_empty() {
            return Err(QfaError::invalid_input(
                "decays must contain at least one scale",
            ));
        }
        if let Some((idx, decay)) = self
            .decays
            .iter()
            .copied()
            .enumerate()
            .find(|(_, d)| !d.is_finite() || *d <= 0.0 || *d >= 1.0)
        {
            return Err(QfaError::invalid_input(format!(
                "decays must lie in the open interval (0, 1): index {idx} has {decay}"
            )));
        }
        Ok(())
    }
}

/// Configuration for the augmented-binning selector.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct SelectorConfig {
    /// Target density of the uniform baseline, percent of the input length.
    pub baseline_pct: f64,
    /// Target density of lowest-fidelity detail points, percent of the
    /// input length. Zero disables anomaly points entirely.
    pub anomaly_pct: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            baseline_pct: 15.0,
            anomaly_pct: 5.0,
        }
    }
}

impl SelectorConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), QfaError> {
        if !self.baseline_pct.is_finite()
            || self.baseline_pct <= 0.0
            || self.baseline_pct > 100.0
        {
            return Err(QfaError::invalid_input(format!(
                "baseline_pct must lie in (0, 100], got {}",
                self.baseline_pct
            )));
        }
        if !self.anomaly_pct.is_finite() || self.anomaly_pct < 0.0 || self.anomaly_pct > 100.0 {
            return Err(QfaError::invalid_input(format!(
                "anomaly_pct must lie in [0, 100], got {}",
                self.anomaly_pct
            )));
        }
        Ok(())
    }
}
