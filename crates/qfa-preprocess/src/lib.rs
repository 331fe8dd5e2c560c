// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Flux conditioning applied before the fidelity scan: median NaN
//! imputation, robust (median/MAD) normalization, and the noise-adaptive
//! gain rescaling. All operations are pure functions over in-memory slices.

use qfa_core::QfaError;

/// Consistency factor mapping the MAD of Gaussian data onto its standard
/// deviation.
const NORMAL_CONSISTENCY: f64 = 1.4826;

/// Floor applied to the MAD during normalization so constant series do not
/// divide by zero.
const NORMALIZE_MAD_EPSILON: f64 = 1.0e-12;

/// Floor applied to the MAD inside the adaptive-gain ratio.
const GAIN_MAD_FLOOR: f64 = 0.1;

/// Clamp bounds for the adaptive-gain noise factor.
const NOISE_FACTOR_MIN: f64 = 0.5;
const NOISE_FACTOR_MAX: f64 = 2.0;

/// Median of a non-empty slice; NaN values sort last via `total_cmp`.
fn median_of_slice(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) * 0.5)
    }
}

/// Normal-scaled median absolute deviation: for Gaussian data this
/// approximates the standard deviation.
pub fn normal_mad(values: &[f64]) -> Result<f64, QfaError> {
    let median = median_of_slice(values)
        .ok_or_else(|| QfaError::invalid_input("normal_mad requires a non-empty slice"))?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
    let mad = median_of_slice(&deviations)
        .ok_or_else(|| QfaError::invalid_input("normal_mad could not compute deviations"))?;
    Ok(mad * NORMAL_CONSISTENCY)
}

/// Replaces NaN flux samples with the median of the non-NaN samples.
///
/// A series with no finite samples is left untouched; the caller's view
/// validation is expected to have rejected it earlier.
pub fn impute_nan_with_median(flux: &mut [f64]) {
    let valid: Vec<f64> = flux.iter().copied().filter(|v| !v.is_nan()).collect();
    let Some(median) = median_of_slice(&valid) else {
        return;
    };
    for value in flux.iter_mut() {
        if value.is_nan() {
            *value = median;
        }
    }
}

/// Centers the flux on its median and scales by the normal-MAD, floored at
/// [`NORMALIZE_MAD_EPSILON`] so a constant series maps to all zeros instead
/// of blowing up.
pub fn normalize_robust(flux: &[f64]) -> Result<Vec<f64>, QfaError> {
    let median = median_of_slice(flux)
        .ok_or_else(|| QfaError::invalid_input("normalize_robust requires a non-empty slice"))?;
    let centered: Vec<f64> = flux.iter().map(|v| v - median).collect();
    let mad = normal_mad(&centered)?.max(NORMALIZE_MAD_EPSILON);
    Ok(centered.into_iter().map(|v| v / mad).collect())
}

/// Rescales a base gain by the inverse noise level of the series.
///
/// Noisier data gets a lower gain to avoid triggering on noise; quieter
/// data gets a boost, capped at 2x. A constant series (MAD = 0) hits the
/// 0.1 floor and therefore the maximum boost.
pub fn adaptive_sensitivity(flux: &[f64], base_sensitivity: f64) -> Result<f64, QfaError> {
    if !base_sensitivity.is_finite() || base_sensitivity <= 0.0 {
        return Err(QfaError::invalid_input(format!(
            "base sensitivity must be finite and > 0, got {base_sensitivity}"
        )));
    }
    let mad = normal_mad(flux)?;
    let noise_factor = (1.0 / mad.max(GAIN_MAD_FLOOR)).clamp(NOISE_FACTOR_MIN, NOISE_FACTOR_MAX);
    Ok(base_sensitivity * noise_factor)
}

#[cfg(test)]
mod tests {
    use super::{
        adaptive_sensitivity, impute_nan_with_median, median_of_slice, normal_mad,
        normalize_robust,
    };

    #[test]
    fn median_handles_odd_and_even_lengths() {
        assert_eq!(median_of_slice(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median_of_slice(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median_of_slice(&[]), None);
    }

    #[test]
    fn normal_mad_matches_gaussian_scale_on_symmetric_data() {
        // deviations from the median 0 are all 1, so MAD = 1 and the
        // normal-scaled value is the consistency factor itself
        let values = [-1.0, 0.0, 1.0, -1.0, 1.0];
        let mad = normal_mad(&values).expect("mad should compute");
        assert!((mad - 1.4826).abs() < 1e-12);
    }

    #[test]
    fn impute_replaces_nan_with_median_of_valid_samples() {
        let mut flux = [1.0, f64::NAN, 3.0, f64::NAN, 2.0];
        impute_nan_with_median(&mut flux);
        assert_eq!(flux, [1.0, 2.0, 3.0, 2.0, 2.0]);
    }

    #[test]
    fn impute_leaves_all_nan_series_untouched() {
        let mut flux = [f64::NAN, f64::NAN];
        impute_nan_with_median(&mut flux);
        assert!(flux.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn normalize_robust_centers_and_scales() {
        let flux = [10.0, 11.0, 9.0, 10.0, 12.0, 8.0, 10.0];
        let normalized = normalize_robust(&flux).expect("normalization should succeed");
        assert_eq!(normalized.len(), flux.len());
        let median = {
            let mut sorted = normalized.clone();
            sorted.sort_by(|a, b| a.total_cmp(b));
            sorted[sorted.len() / 2]
        };
        assert!(median.abs() < 1e-12);
    }

    #[test]
    fn normalize_robust_maps_constant_series_to_zeros() {
        let flux = [5.0; 16];
        let normalized = normalize_robust(&flux).expect("constant series should normalize");
        assert!(normalized.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn adaptive_sensitivity_halves_gain_for_mad_of_two() {
        // the median deviation from the median is 2/1.4826, giving a
        // normal-scaled MAD of 2.0
        let step = 2.0 / 1.4826;
        let flux = [-step, 0.0, step, -step, step];
        let sensitivity =
            adaptive_sensitivity(&flux, 0.03).expect("sensitivity should compute");
        assert!((sensitivity - 0.015).abs() < 1e-12);
    }

    #[test]
    fn adaptive_sensitivity_caps_boost_for_constant_input() {
        let flux = [1.0; 32];
        let sensitivity =
            adaptive_sensitivity(&flux, 0.03).expect("sensitivity should compute");
        assert!((sensitivity - 0.06).abs() < 1e-12);
    }

    #[test]
    fn adaptive_sensitivity_rejects_bad_base() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(adaptive_sensitivity(&[1.0, 2.0], bad).is_err());
        }
    }

    #[test]
    fn adaptive_sensitivity_clamps_noisy_series_at_half() {
        // normal-scaled MAD well above 2.0 keeps the ratio below the lower
        // clamp bound
        let flux: Vec<f64> = (0..64).map(|i| if i % 2 == 0 { -10.0 } else { 10.0 }).collect();
        let sensitivity =
            adaptive_sensitivity(&flux, 0.03).expect("sensitivity should compute");
        assert!((sensitivity - 0.015).abs() < 1e-12);
    }
}
